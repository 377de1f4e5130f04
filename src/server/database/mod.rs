//! document store access

pub(crate) mod memory;
pub(crate) mod pipeline;
pub(crate) mod pool;
pub(crate) mod postgres;
pub(crate) mod store;

use crate::server::database::pipeline::Pipeline;
use crate::server::util::id::new_object_id;
use derive_more::{Display, Error};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

/// A stored JSON object.
pub(crate) type Document = Map<String, Value>;

/// Field equality filter, every entry must match.
pub(crate) type Filter = Map<String, Value>;

pub(crate) const ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Collection {
    Food,
    Order,
    OrderItem,
    Table,
    Invoice,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Food => "food",
            Collection::Order => "order",
            Collection::OrderItem => "orderItem",
            Collection::Table => "table",
            Collection::Invoice => "invoice",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub(crate) struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<String>,
}

#[derive(Debug, Display, Error)]
pub(crate) enum StoreError {
    #[display("store did not respond within {after:?}")]
    Timeout { after: Duration },
    #[display("no store connection available")]
    Busy,
    #[display("postgres error: {source}")]
    Postgres { source: tokio_postgres::Error },
    #[display("malformed document: {source}")]
    Malformed { source: serde_json::Error },
    #[display("store failure: {reason}")]
    Backend { reason: String },
    #[display("arithmetic overflow: {reason}")]
    Overflow { reason: String },
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(source: tokio_postgres::Error) -> Self {
        StoreError::Postgres { source }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(source: serde_json::Error) -> Self {
        StoreError::Malformed { source }
    }
}

/// Access to named document collections.
///
/// `aggregate` has a default implementation which runs the pipeline in
/// process on top of `find_many`.
pub(crate) trait DocumentStore {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError>;

    /// matching documents in insertion order
    async fn find_many(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    async fn insert_one(&self, collection: Collection, document: Document) -> Result<String, StoreError>;

    /// all documents are written or none
    async fn insert_many(&self, collection: Collection, documents: Vec<Document>) -> Result<Vec<String>, StoreError>;

    /// merge `set` into the first match, or insert `filter` + `set` when nothing matches and `upsert` is on
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
        upsert: bool,
    ) -> Result<UpdateResult, StoreError>;

    async fn aggregate(&self, collection: Collection, pipeline: &Pipeline) -> Result<Vec<Document>, StoreError> {
        pipeline::execute(self, collection, pipeline).await
    }
}

/// Single field equality filter.
pub(crate) fn filter_eq(field: &str, value: impl Into<Value>) -> Filter {
    let mut filter = Filter::new();
    filter.insert(field.to_string(), value.into());
    filter
}

pub(crate) fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::Backend {
            reason: format!("expected an object, got {}", other),
        }),
    }
}

pub(crate) fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// Returns the `_id` of the document, assigning a fresh one when absent.
pub(crate) fn ensure_id(doc: &mut Document) -> String {
    match doc.get(ID_FIELD) {
        Some(Value::String(id)) => id.clone(),
        Some(other) => other.to_string(),
        None => {
            let id = new_object_id();
            doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
            id
        }
    }
}

/// Resolve a dotted path such as `order.table_id`.
pub(crate) fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// True when every filter entry equals the value found at its path.
pub(crate) fn matches(doc: &Document, filter: &Filter) -> bool {
    filter
        .iter()
        .all(|(path, expected)| get_path(doc, path).is_some_and(|found| found == expected))
}
