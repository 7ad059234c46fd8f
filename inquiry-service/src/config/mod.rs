use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct InquiryConfig {
    pub common: core_config::Config,
    pub store: StoreConfig,
    pub cors: CorsConfig,
    pub otlp_endpoint: Option<String>,
}

/// Which backend serves the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown STORE_BACKEND '{}'. Must be one of: mongo, memory",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// `None` leaves the store unconfigured; the service still starts.
    pub uri: Option<Secret<String>>,
    pub database: String,
    pub collection: String,
    /// Whether the database name came from the environment rather than the default.
    pub database_name_set: bool,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl InquiryConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let uri = first_env(&["MONGODB_URI", "DATABASE_URL"]);
        if uri.is_none() && is_prod {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MONGODB_URI is required in production but not set"
            )));
        }

        let database = first_env(&["MONGODB_DATABASE", "DATABASE_NAME"]);
        let database_name_set = database.is_some();

        let backend = match env::var("STORE_BACKEND") {
            Ok(val) => val.parse()?,
            Err(_) => StoreBackend::Mongo,
        };

        let log_level = env::var("LOG_LEVEL").unwrap_or(common_config.log_level.clone());

        Ok(InquiryConfig {
            common: core_config::Config {
                log_level,
                ..common_config
            },
            store: StoreConfig {
                backend,
                uri: uri.map(Secret::new),
                database: database.unwrap_or_else(|| "inquiry_db".to_string()),
                collection: env::var("INQUIRY_COLLECTION")
                    .ok()
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| "inquiry".to_string()),
                database_name_set,
            },
            cors: CorsConfig {
                allowed_origins: parse_origins(
                    &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default(),
                ),
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT")
                .ok()
                .filter(|e| !e.trim().is_empty()),
        })
    }
}

fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| env::var(key).ok())
        .find(|val| !val.trim().is_empty())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty() && *o != "*")
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_backend() {
        assert_eq!("mongo".parse::<StoreBackend>().unwrap(), StoreBackend::Mongo);
        assert_eq!(" Memory ".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("redis".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn wildcard_origin_means_any() {
        assert!(parse_origins("*").is_empty());
        assert!(parse_origins("").is_empty());
        assert_eq!(
            parse_origins("https://a.example, https://b.example"),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }
}
