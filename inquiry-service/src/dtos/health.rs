use serde::Serialize;

use crate::services::{StoreHealth, StoreState};

/// Body of `GET /health`. Field names follow the probe's public contract.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub backend: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub database: String,
    pub available: bool,
    pub connected: bool,
    pub state: StoreState,
    pub database_name: Option<String>,
    pub database_url_set: bool,
    pub database_name_set: bool,
    pub reachable_collections: Vec<String>,
}

impl HealthResponse {
    pub fn new(health: StoreHealth, database_url_set: bool, database_name_set: bool) -> Self {
        Self {
            backend: "Running",
            service: "inquiry-service",
            version: env!("CARGO_PKG_VERSION"),
            database: health.database,
            available: health.available,
            connected: health.connected,
            state: health.state,
            database_name: health.database_name,
            database_url_set,
            database_name_set,
            reachable_collections: health.reachable_collections,
        }
    }
}
