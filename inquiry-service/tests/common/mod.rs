#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use inquiry_service::config::{CorsConfig, InquiryConfig, StoreBackend, StoreConfig};
use inquiry_service::services::{InMemoryStore, StoreHandle};
use inquiry_service::startup::{build_router, AppState, Application};
use secrecy::Secret;
use serde_json::Value;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const COLLECTION: &str = "inquiry";

pub fn test_config(backend: StoreBackend, uri: Option<String>, database: String) -> InquiryConfig {
    InquiryConfig {
        common: CoreConfig {
            port: 0,
            log_level: "error".to_string(),
        },
        store: StoreConfig {
            backend,
            uri: uri.map(Secret::new),
            database,
            collection: COLLECTION.to_string(),
            database_name_set: true,
        },
        cors: CorsConfig {
            allowed_origins: Vec::new(),
        },
        otlp_endpoint: None,
    }
}

/// Router over a fresh in-memory store, plus the store for fault injection.
pub async fn memory_app() -> (Router, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new("inquiry_test"));
    let handle = StoreHandle::configuring(store.clone());
    handle.verify().await;

    let state = AppState {
        config: test_config(StoreBackend::Memory, None, "inquiry_test".to_string()),
        store: handle,
    };
    (build_router(state), store)
}

/// Router with no store configured at all.
pub fn unconfigured_app() -> Router {
    let state = AppState {
        config: test_config(StoreBackend::Mongo, None, "inquiry_test".to_string()),
        store: StoreHandle::unconfigured(),
    };
    build_router(state)
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request");

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

/// A real server backed by MongoDB at `TEST_MONGODB_URI`.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub database: String,
    pub uri: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let uri = std::env::var("TEST_MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let database = format!("inquiry_test_{}", uuid::Uuid::new_v4().simple());
        let config = test_config(StoreBackend::Mongo, Some(uri.clone()), database.clone());

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling the liveness endpoint
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client.get(&address).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            database,
            uri,
        }
    }

    pub async fn teardown(&self) {
        let client = mongodb::Client::with_uri_str(&self.uri).await.unwrap();
        client.database(&self.database).drop(None).await.unwrap();
    }
}
