use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Database, IndexModel,
};
use service_core::error::AppError;

use super::store::DocumentStore;

/// MongoDB-backed [`DocumentStore`].
#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    /// Build a client for `uri`. The driver connects lazily, so this only
    /// fails on a malformed connection string or unresolvable SRV record.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        Ok(Self { client, db })
    }

    /// Index the inquiry timestamp for time-ordered admin queries.
    pub async fn initialize_indexes(&self, collection: &str) -> Result<(), AppError> {
        tracing::info!(collection = %collection, "Creating MongoDB indexes");

        let timestamp_index = IndexModel::builder()
            .keys(doc! { "timestamp": -1 })
            .options(
                IndexOptions::builder()
                    .name("timestamp_idx".to_string())
                    .build(),
            )
            .build();

        self.db
            .collection::<Document>(collection)
            .create_index(timestamp_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create timestamp index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        tracing::info!("Successfully created MongoDB indexes");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_one(&self, collection: &str, document: Document) -> anyhow::Result<Bson> {
        let result = self
            .db
            .collection::<Document>(collection)
            .insert_one(document, None)
            .await?;
        Ok(result.inserted_id)
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        limit: i64,
    ) -> anyhow::Result<Vec<Document>> {
        let find_options = FindOptions::builder().limit(limit).build();

        let cursor = self
            .db
            .collection::<Document>(collection)
            .find(filter, find_options)
            .await?;

        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }

    async fn list_collection_names(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.db.list_collection_names(None).await?)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    fn database_name(&self) -> &str {
        self.db.name()
    }
}
