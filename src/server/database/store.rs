//! Store handle shared by the handlers: picks a backend and bounds every call.

use crate::server::database::memory::MemoryStore;
use crate::server::database::pipeline::Pipeline;
use crate::server::database::postgres::PgDocumentStore;
use crate::server::database::{Collection, Document, DocumentStore, Filter, StoreError, UpdateResult};
use log::warn;
use std::future::Future;
use std::time::Duration;
use tokio::time;

#[derive(Clone)]
pub(crate) enum Backend {
    Postgres(PgDocumentStore),
    Memory(MemoryStore),
}

impl DocumentStore for Backend {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError> {
        match self {
            Backend::Postgres(store) => store.find_one(collection, filter).await,
            Backend::Memory(store) => store.find_one(collection, filter).await,
        }
    }

    async fn find_many(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        match self {
            Backend::Postgres(store) => store.find_many(collection, filter).await,
            Backend::Memory(store) => store.find_many(collection, filter).await,
        }
    }

    async fn insert_one(&self, collection: Collection, document: Document) -> Result<String, StoreError> {
        match self {
            Backend::Postgres(store) => store.insert_one(collection, document).await,
            Backend::Memory(store) => store.insert_one(collection, document).await,
        }
    }

    async fn insert_many(&self, collection: Collection, documents: Vec<Document>) -> Result<Vec<String>, StoreError> {
        match self {
            Backend::Postgres(store) => store.insert_many(collection, documents).await,
            Backend::Memory(store) => store.insert_many(collection, documents).await,
        }
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
        upsert: bool,
    ) -> Result<UpdateResult, StoreError> {
        match self {
            Backend::Postgres(store) => store.update_one(collection, filter, set, upsert).await,
            Backend::Memory(store) => store.update_one(collection, filter, set, upsert).await,
        }
    }
}

/// Backend plus the per call time budget.
///
/// Each operation gets a fresh budget, an aggregate counts as one operation.
/// Nothing is retried and the backend call is simply dropped on timeout.
#[derive(Clone)]
pub(crate) struct Store {
    backend: Backend,
    timeout: Duration,
}

impl Store {
    pub fn new(backend: Backend, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn memory(timeout: Duration) -> Self {
        Self::new(Backend::Memory(MemoryStore::new()), timeout)
    }

    async fn bounded<T>(&self, op: &str, fut: impl Future<Output = Result<T, StoreError>>) -> Result<T, StoreError> {
        bounded(self.timeout, op, fut).await
    }
}

pub(crate) async fn bounded<T>(
    timeout: Duration,
    op: &str,
    fut: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    let sleep = time::sleep(timeout);
    tokio::pin!(sleep);
    tokio::pin!(fut);
    tokio::select! {
        result = &mut fut => result,
        _ = &mut sleep => {
            warn!("timeout during store {}", op);
            Err(StoreError::Timeout { after: timeout })
        }
    }
}

impl DocumentStore for Store {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError> {
        self.bounded("find_one", self.backend.find_one(collection, filter)).await
    }

    async fn find_many(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        self.bounded("find_many", self.backend.find_many(collection, filter)).await
    }

    async fn insert_one(&self, collection: Collection, document: Document) -> Result<String, StoreError> {
        self.bounded("insert_one", self.backend.insert_one(collection, document)).await
    }

    async fn insert_many(&self, collection: Collection, documents: Vec<Document>) -> Result<Vec<String>, StoreError> {
        self.bounded("insert_many", self.backend.insert_many(collection, documents)).await
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
        upsert: bool,
    ) -> Result<UpdateResult, StoreError> {
        self.bounded("update_one", self.backend.update_one(collection, filter, set, upsert))
            .await
    }

    async fn aggregate(&self, collection: Collection, pipeline: &Pipeline) -> Result<Vec<Document>, StoreError> {
        self.bounded("aggregate", self.backend.aggregate(collection, pipeline)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::database::filter_eq;
    use serde_json::json;

    #[tokio::test]
    async fn slow_call_times_out() {
        let after = Duration::from_millis(10);
        let result: Result<(), StoreError> = bounded(after, "test", std::future::pending()).await;
        match result {
            Err(StoreError::Timeout { after: elapsed }) => assert_eq!(elapsed, after),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn fast_call_passes_through() {
        let result = bounded(Duration::from_secs(1), "test", async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn dispatches_to_backend() {
        let store = Store::memory(Duration::from_secs(1));
        let doc = json!({"table_id": "T1"}).as_object().cloned().unwrap();
        store.insert_one(Collection::Table, doc).await.unwrap();
        let found = store.find_many(Collection::Table, &filter_eq("table_id", "T1")).await.unwrap();
        assert_eq!(found.len(), 1);
    }
}
