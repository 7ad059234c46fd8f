use async_trait::async_trait;
use dashmap::DashMap;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use std::sync::atomic::{AtomicBool, Ordering};

use super::store::DocumentStore;

/// In-process document store for local runs and tests.
///
/// Keeps insertion order per collection and supports top-level equality and
/// `$in` filters only.
pub struct InMemoryStore {
    database: String,
    collections: DashMap<String, Vec<Document>>,
    unreachable: AtomicBool,
}

impl InMemoryStore {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collections: DashMap::new(),
            unreachable: AtomicBool::new(false),
        }
    }

    /// Make every operation fail as if the server went away.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn check_reachable(&self) -> anyhow::Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            anyhow::bail!(
                "connection refused: in-memory store '{}' is unreachable",
                self.database
            );
        }
        Ok(())
    }
}

fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| {
        let actual = document.get(key);
        match expected {
            Bson::Document(op) if op.len() == 1 && op.contains_key("$in") => match op.get("$in") {
                Some(Bson::Array(values)) => actual.is_some_and(|v| values.contains(v)),
                _ => false,
            },
            _ => actual == Some(expected),
        }
    })
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert_one(&self, collection: &str, mut document: Document) -> anyhow::Result<Bson> {
        self.check_reachable()?;

        let id = match document.get("_id") {
            Some(existing) => existing.clone(),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                document.insert("_id", id.clone());
                id
            }
        };

        let mut docs = self.collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|d| d.get("_id") == Some(&id)) {
            anyhow::bail!("E11000 duplicate key error collection: {}", collection);
        }
        docs.push(document);

        Ok(id)
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        limit: i64,
    ) -> anyhow::Result<Vec<Document>> {
        self.check_reachable()?;

        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| matches_filter(d, &filter))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_collection_names(&self) -> anyhow::Result<Vec<String>> {
        self.check_reachable()?;

        let mut names: Vec<String> = self
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.check_reachable()
    }

    fn database_name(&self) -> &str {
        &self.database
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn assigns_object_id_and_keeps_insertion_order() {
        let store = InMemoryStore::new("test");
        let first = store.insert_one("c", doc! { "n": 1 }).await.unwrap();
        store.insert_one("c", doc! { "n": 2 }).await.unwrap();

        assert!(matches!(first, Bson::ObjectId(_)));
        let docs = store.find("c", Document::new(), 10).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].get_i32("n").unwrap(), 1);
        assert_eq!(docs[0].get("_id"), Some(&first));
    }

    #[tokio::test]
    async fn rejects_duplicate_ids() {
        let store = InMemoryStore::new("test");
        assert!(store.is_empty("c"));
        store.insert_one("c", doc! { "_id": "a" }).await.unwrap();
        assert!(store.insert_one("c", doc! { "_id": "a" }).await.is_err());
        assert_eq!(store.len("c"), 1);
    }

    #[tokio::test]
    async fn filters_on_top_level_equality() {
        let store = InMemoryStore::new("test");
        store.insert_one("c", doc! { "kind": "a" }).await.unwrap();
        store.insert_one("c", doc! { "kind": "b" }).await.unwrap();

        let docs = store.find("c", doc! { "kind": "b" }, 10).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get_str("kind").unwrap(), "b");
    }

    #[tokio::test]
    async fn filters_on_membership() {
        let store = InMemoryStore::new("test");
        for id in [1, 2, 3] {
            store.insert_one("c", doc! { "_id": id }).await.unwrap();
        }

        let docs = store
            .find("c", doc! { "_id": { "$in": [3, "1"] } }, 10)
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get_i32("_id").unwrap(), 3);
    }

    #[tokio::test]
    async fn unreachable_store_fails_every_operation() {
        let store = InMemoryStore::new("test");
        store.set_unreachable(true);

        assert!(store.ping().await.is_err());
        assert!(store.insert_one("c", doc! {}).await.is_err());
        assert!(store.find("c", doc! {}, 1).await.is_err());
        assert!(store.list_collection_names().await.is_err());
    }
}
