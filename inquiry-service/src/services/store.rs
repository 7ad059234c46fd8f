//! Document Store Adapter.
//!
//! Wraps an optional [`DocumentStore`] backend and exposes insert, list and a
//! health probe. Store-native identifiers never leave this module: inserted
//! ids come back as strings, a listed document's `_id` is rendered with the
//! same rule whatever its BSON type, and every nested `ObjectId` is rewritten
//! to its hex form.

use async_trait::async_trait;
use mongodb::bson::{
    doc, oid::ObjectId, spec::BinarySubtype, to_document, Binary, Bson, Document, Uuid,
};
use serde::Serialize;
use service_core::error::AppError;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use thiserror::Error;

use super::metrics::record_store_operation;

/// Longest store diagnostic that is allowed to reach a caller.
pub const MAX_DIAGNOSTIC_CHARS: usize = 50;

/// Upper bound on collection names reported by the health probe.
pub const MAX_REPORTED_COLLECTIONS: usize = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database not configured")]
    Unavailable,

    #[error("Store write failed: {0}")]
    Write(String),

    #[error("Store read failed: {0}")]
    Read(String),

    #[error("Invalid document id: {0}")]
    InvalidId(String),
}

impl StoreError {
    pub fn write(err: impl fmt::Display) -> Self {
        StoreError::Write(truncate_diagnostic(&err.to_string()))
    }

    pub fn read(err: impl fmt::Display) -> Self {
        StoreError::Read(truncate_diagnostic(&err.to_string()))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable => {
                AppError::ConfigError(anyhow::anyhow!("Database not configured"))
            }
            StoreError::Write(_) | StoreError::Read(_) => {
                AppError::DatabaseError(anyhow::anyhow!(err.to_string()))
            }
            StoreError::InvalidId(id) => {
                AppError::NotFound(anyhow::anyhow!("Document not found: {}", id))
            }
        }
    }
}

/// Cut a diagnostic to [`MAX_DIAGNOSTIC_CHARS`] characters.
pub fn truncate_diagnostic(message: &str) -> String {
    match message.char_indices().nth(MAX_DIAGNOSTIC_CHARS) {
        Some((idx, _)) => message[..idx].to_string(),
        None => message.to_string(),
    }
}

/// Backend capability contract: named collections with insert-one,
/// find-with-filter-and-limit and collection enumeration.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert one document and return the store-assigned `_id`.
    async fn insert_one(&self, collection: &str, document: Document) -> anyhow::Result<Bson>;

    /// Up to `limit` documents matching `filter`, in natural order. `limit` is
    /// always positive.
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        limit: i64,
    ) -> anyhow::Result<Vec<Document>>;

    async fn list_collection_names(&self) -> anyhow::Result<Vec<String>>;

    async fn ping(&self) -> anyhow::Result<()>;

    fn database_name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreState {
    Unconfigured,
    Configuring,
    Connected,
    Degraded,
}

impl StoreState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => StoreState::Configuring,
            2 => StoreState::Connected,
            3 => StoreState::Degraded,
            _ => StoreState::Unconfigured,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            StoreState::Unconfigured => 0,
            StoreState::Configuring => 1,
            StoreState::Connected => 2,
            StoreState::Degraded => 3,
        }
    }
}

impl fmt::Display for StoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreState::Unconfigured => write!(f, "unconfigured"),
            StoreState::Configuring => write!(f, "configuring"),
            StoreState::Connected => write!(f, "connected"),
            StoreState::Degraded => write!(f, "degraded"),
        }
    }
}

/// Result of [`StoreHandle::health`]. Never an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreHealth {
    pub available: bool,
    pub connected: bool,
    pub state: StoreState,
    pub database: String,
    pub database_name: Option<String>,
    pub reachable_collections: Vec<String>,
}

/// Process-wide handle to the document store.
///
/// Built once at startup and shared read-only by handlers. The state cell is
/// the only thing that changes afterwards, and only the adapter writes it.
#[derive(Clone)]
pub struct StoreHandle {
    store: Option<Arc<dyn DocumentStore>>,
    state: Arc<AtomicU8>,
}

impl StoreHandle {
    pub fn unconfigured() -> Self {
        Self {
            store: None,
            state: Arc::new(AtomicU8::new(StoreState::Unconfigured.as_u8())),
        }
    }

    /// Wrap a backend whose connectivity has not been confirmed yet.
    pub fn configuring(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store: Some(store),
            state: Arc::new(AtomicU8::new(StoreState::Configuring.as_u8())),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    pub fn state(&self) -> StoreState {
        StoreState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Ping the backend once and settle into Connected or Degraded.
    pub async fn verify(&self) -> StoreState {
        if let Some(store) = &self.store {
            let outcome = store.ping().await;
            if let Err(e) = &outcome {
                tracing::error!("Document store ping failed: {}", e);
            }
            self.record(outcome.is_ok());
        }
        self.state()
    }

    fn backend(&self) -> Result<&Arc<dyn DocumentStore>, StoreError> {
        self.store.as_ref().ok_or(StoreError::Unavailable)
    }

    fn record(&self, success: bool) {
        let next = if success {
            StoreState::Connected
        } else {
            StoreState::Degraded
        };
        let previous = StoreState::from_u8(self.state.swap(next.as_u8(), Ordering::SeqCst));
        if previous != next {
            match next {
                StoreState::Degraded => {
                    tracing::warn!(from = %previous, "Document store degraded")
                }
                _ => tracing::info!(from = %previous, "Document store connected"),
            }
        }
    }

    /// Insert `record` into `collection` and return the new id as a string.
    pub async fn insert<T: Serialize>(
        &self,
        collection: &str,
        record: &T,
    ) -> Result<String, StoreError> {
        let store = self.backend()?;

        let document = to_document(record).map_err(|e| {
            tracing::error!("Failed to serialize document for {}: {}", collection, e);
            record_store_operation("insert", "error");
            StoreError::write(e)
        })?;

        match store.insert_one(collection, document).await {
            Ok(id) => {
                self.record(true);
                record_store_operation("insert", "success");
                Ok(id_to_string(&id))
            }
            Err(e) => {
                tracing::error!("Failed to insert into {}: {}", collection, e);
                self.record(false);
                record_store_operation("insert", "error");
                Err(StoreError::write(e))
            }
        }
    }

    /// Up to `limit` documents from `collection` matching `filter`, with `_id`
    /// and every nested `ObjectId` rendered as strings. An empty filter
    /// matches everything.
    pub async fn list(
        &self,
        collection: &str,
        filter: Document,
        limit: u32,
    ) -> Result<Vec<Document>, StoreError> {
        let store = self.backend()?;

        // The driver reads a zero limit as "no limit".
        if limit == 0 {
            return Ok(Vec::new());
        }

        match store.find(collection, filter, i64::from(limit)).await {
            Ok(documents) => {
                self.record(true);
                record_store_operation("list", "success");
                Ok(documents
                    .into_iter()
                    .take(limit as usize)
                    .map(stringify_ids)
                    .collect())
            }
            Err(e) => {
                tracing::error!("Failed to list {}: {}", collection, e);
                self.record(false);
                record_store_operation("list", "error");
                Err(StoreError::read(e))
            }
        }
    }

    /// Probe the store and report. Probe failures end up in the `database`
    /// text instead of being returned.
    pub async fn health(&self) -> StoreHealth {
        let Some(store) = &self.store else {
            return StoreHealth {
                available: false,
                connected: false,
                state: StoreState::Unconfigured,
                database: "Not Available".to_string(),
                database_name: None,
                reachable_collections: Vec::new(),
            };
        };

        let database_name = Some(store.database_name().to_string());

        match store.list_collection_names().await {
            Ok(mut names) => {
                self.record(true);
                names.truncate(MAX_REPORTED_COLLECTIONS);
                StoreHealth {
                    available: true,
                    connected: true,
                    state: self.state(),
                    database: "Connected & Working".to_string(),
                    database_name,
                    reachable_collections: names,
                }
            }
            Err(e) => {
                tracing::warn!("Document store health probe failed: {}", e);
                self.record(false);
                StoreHealth {
                    available: true,
                    connected: false,
                    state: self.state(),
                    database: format!(
                        "Connected but Error: {}",
                        truncate_diagnostic(&e.to_string())
                    ),
                    database_name,
                    reachable_collections: Vec::new(),
                }
            }
        }
    }

    /// Filter selecting the document whose id was returned by [`insert`] or
    /// listed by [`list`].
    ///
    /// The string form does not say which BSON type the stored `_id` has, so
    /// the filter matches every type that renders to `id`.
    ///
    /// [`insert`]: StoreHandle::insert
    /// [`list`]: StoreHandle::list
    pub fn id_filter(id: &str) -> Result<Document, StoreError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(doc! { "_id": { "$in": id_candidates(id) } })
    }
}

/// Every stored `_id` value that [`id_to_string`] renders as `id`.
fn id_candidates(id: &str) -> Vec<Bson> {
    let mut candidates = vec![Bson::String(id.to_string())];

    if let Ok(oid) = ObjectId::parse_str(id) {
        candidates.push(Bson::ObjectId(oid));
    }
    if let Ok(n) = id.parse::<i64>() {
        if n.to_string() == id {
            if let Ok(small) = i32::try_from(n) {
                candidates.push(Bson::Int32(small));
            }
            candidates.push(Bson::Int64(n));
        }
    }
    if let Ok(uuid) = Uuid::parse_str(id) {
        if uuid.to_string() == id {
            candidates.push(Bson::Binary(Binary::from_uuid(uuid)));
        }
    }
    if let Ok(bytes) = hex::decode(id) {
        if hex::encode(&bytes) == id {
            candidates.push(Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes,
            }));
        }
    }

    candidates
}

/// String form of a store identifier of any BSON type.
fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        Bson::Int32(n) => n.to_string(),
        Bson::Int64(n) => n.to_string(),
        Bson::Binary(binary) => match binary.to_uuid() {
            Ok(uuid) => uuid.to_string(),
            Err(_) => hex::encode(&binary.bytes),
        },
        other => other.to_string(),
    }
}

/// Render `_id` with [`id_to_string`] and every other `ObjectId`, at any
/// depth, as its hex string.
pub fn stringify_ids(document: Document) -> Document {
    document
        .into_iter()
        .map(|(key, value)| {
            let value = if key == "_id" {
                Bson::String(id_to_string(&value))
            } else {
                stringify_bson(value)
            };
            (key, value)
        })
        .collect()
}

fn stringify_object_ids(document: Document) -> Document {
    document
        .into_iter()
        .map(|(key, value)| (key, stringify_bson(value)))
        .collect()
}

fn stringify_bson(value: Bson) -> Bson {
    match value {
        Bson::ObjectId(oid) => Bson::String(oid.to_hex()),
        Bson::Document(doc) => Bson::Document(stringify_object_ids(doc)),
        Bson::Array(items) => Bson::Array(items.into_iter().map(stringify_bson).collect()),
        other => other,
    }
}
