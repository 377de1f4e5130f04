//! In-memory document store for tests and local development

use crate::server::database::{ensure_id, matches, Collection, Document, DocumentStore, Filter, StoreError, UpdateResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Collections kept in insertion order behind a RwLock.
#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_failed(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend {
        reason: format!("failed to acquire lock: {}", e),
    }
}

impl DocumentStore for MemoryStore {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().map_err(lock_failed)?;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| matches(doc, filter)))
            .cloned())
    }

    async fn find_many(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().map_err(lock_failed)?;
        Ok(collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|doc| matches(doc, filter)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert_one(&self, collection: Collection, mut document: Document) -> Result<String, StoreError> {
        let id = ensure_id(&mut document);
        let mut collections = self.collections.write().map_err(lock_failed)?;
        collections.entry(collection).or_default().push(document);
        Ok(id)
    }

    async fn insert_many(&self, collection: Collection, mut documents: Vec<Document>) -> Result<Vec<String>, StoreError> {
        let ids = documents.iter_mut().map(ensure_id).collect::<Vec<_>>();
        let mut collections = self.collections.write().map_err(lock_failed)?;
        collections.entry(collection).or_default().extend(documents);
        Ok(ids)
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
        upsert: bool,
    ) -> Result<UpdateResult, StoreError> {
        let mut collections = self.collections.write().map_err(lock_failed)?;
        let docs = collections.entry(collection).or_default();

        if let Some(doc) = docs.iter_mut().find(|doc| matches(doc, filter)) {
            let before = doc.clone();
            doc.extend(set);
            return Ok(UpdateResult {
                matched_count: 1,
                modified_count: u64::from(*doc != before),
                upserted_id: None,
            });
        }

        if !upsert {
            return Ok(UpdateResult::default());
        }
        let mut doc = filter
            .iter()
            .filter(|(path, _)| !path.contains('.'))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Document>();
        doc.extend(set);
        let id = ensure_id(&mut doc);
        docs.push(doc);
        Ok(UpdateResult {
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(id),
        })
    }
}

impl MemoryStore {
    /// number of documents in a collection
    #[cfg(test)]
    pub fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .map(|c| c.get(&collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// raw documents of a collection, used to assert on writes
    #[cfg(test)]
    pub fn dump(&self, collection: Collection) -> Vec<serde_json::Value> {
        self.collections
            .read()
            .map(|c| {
                c.get(&collection)
                    .map(|docs| docs.iter().cloned().map(serde_json::Value::Object).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::database::{filter_eq, ID_FIELD};
    use serde_json::{json, Value};

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_and_find() {
        let store = MemoryStore::new();
        let id = store
            .insert_one(Collection::Table, doc(json!({"table_id": "T1", "table_number": 4})))
            .await
            .unwrap();

        let found = store.find_one(Collection::Table, &filter_eq("table_id", "T1")).await.unwrap().unwrap();
        assert_eq!(found[ID_FIELD], json!(id));
        assert_eq!(found["table_number"], json!(4));
        assert!(store.find_one(Collection::Table, &filter_eq("table_id", "T2")).await.unwrap().is_none());
        assert!(store.find_one(Collection::Food, &Filter::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_many_keeps_insertion_order() {
        let store = MemoryStore::new();
        let ids = store
            .insert_many(
                Collection::OrderItem,
                (0..5).map(|i| doc(json!({"order_id": "O1", "n": i}))).collect(),
            )
            .await
            .unwrap();
        assert_eq!(ids.len(), 5);

        let found = store.find_many(Collection::OrderItem, &filter_eq("order_id", "O1")).await.unwrap();
        let ns = found.iter().map(|d| d["n"].as_i64().unwrap()).collect::<Vec<_>>();
        assert_eq!(ns, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn keeps_supplied_id() {
        let store = MemoryStore::new();
        let id = store
            .insert_one(Collection::Order, doc(json!({"_id": "abc", "order_id": "abc"})))
            .await
            .unwrap();
        assert_eq!(id, "abc");
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = MemoryStore::new();
        store
            .insert_one(Collection::Invoice, doc(json!({"invoice_id": "I1", "payment_status": "PENDING"})))
            .await
            .unwrap();

        let result = store
            .update_one(
                Collection::Invoice,
                &filter_eq("invoice_id", "I1"),
                doc(json!({"payment_status": "PAID"})),
                true,
            )
            .await
            .unwrap();

        assert_eq!(result, UpdateResult { matched_count: 1, modified_count: 1, upserted_id: None });
        let stored = store.find_one(Collection::Invoice, &filter_eq("invoice_id", "I1")).await.unwrap().unwrap();
        assert_eq!(stored["payment_status"], json!("PAID"));
        assert_eq!(store.count(Collection::Invoice), 1);
    }

    #[tokio::test]
    async fn update_without_change() {
        let store = MemoryStore::new();
        store
            .insert_one(Collection::Invoice, doc(json!({"invoice_id": "I1", "payment_status": "PAID"})))
            .await
            .unwrap();

        let result = store
            .update_one(Collection::Invoice, &filter_eq("invoice_id", "I1"), doc(json!({"payment_status": "PAID"})), false)
            .await
            .unwrap();

        assert_eq!(result.matched_count, 1);
        assert_eq!(result.modified_count, 0);
    }

    #[tokio::test]
    async fn upsert_inserts_filter_and_set() {
        let store = MemoryStore::new();

        let missed = store
            .update_one(Collection::Invoice, &filter_eq("invoice_id", "I9"), doc(json!({"payment_method": "CARD"})), false)
            .await
            .unwrap();
        assert_eq!(missed, UpdateResult::default());
        assert_eq!(store.count(Collection::Invoice), 0);

        let upserted = store
            .update_one(Collection::Invoice, &filter_eq("invoice_id", "I9"), doc(json!({"payment_method": "CARD"})), true)
            .await
            .unwrap();
        let id = upserted.upserted_id.unwrap();
        let stored = store.dump(Collection::Invoice);
        assert_eq!(stored, vec![json!({"_id": id, "invoice_id": "I9", "payment_method": "CARD"})]);
    }
}
