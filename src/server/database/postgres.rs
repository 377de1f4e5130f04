//! Document store on top of a single postgres JSONB table.
//!
//! Filters are translated into JSONB containment (`body @> filter`), so
//! filter keys are top level fields here.

use crate::server::database::pool::{Connection, Pool};
use crate::server::database::{ensure_id, Collection, Document, DocumentStore, Filter, StoreError, UpdateResult};
use serde_json::Value;
use std::time::Duration;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Row};

#[derive(Clone)]
pub(crate) struct PgDocumentStore {
    pool: Pool<Client>,
    acquire_timeout: Duration,
}

impl PgDocumentStore {
    pub fn new(pool: Pool<Client>, acquire_timeout: Duration) -> Self {
        Self { pool, acquire_timeout }
    }

    async fn connection(&self) -> Result<Connection<Client>, StoreError> {
        self.pool.acquire(self.acquire_timeout).await.ok_or(StoreError::Busy)
    }
}

/// collection, doc_id, body
const COLUMN_LEN: usize = 3;
/// bind parameter limit of a single postgres statement
const MAX_BIND_PARAMS: usize = u16::MAX as usize;

/// Multi-row insert for `rows` documents with numbered placeholders.
fn insert_statement(rows: usize) -> String {
    let mut stmt = "INSERT INTO document(collection, doc_id, body) VALUES".to_string();
    for i in 0..rows {
        let idx = i * COLUMN_LEN + 1;
        let maybe_comma = if i != rows - 1 { "," } else { "" };
        stmt.push_str(&format!(" (${}, ${}, ${}){}", idx, idx + 1, idx + 2, maybe_comma));
    }
    stmt
}

fn body(row: &Row) -> Result<Document, StoreError> {
    match row.try_get::<&str, Value>("body")? {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::Backend {
            reason: format!("stored body is not an object: {}", other),
        }),
    }
}

impl DocumentStore for PgDocumentStore {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let conn = self.connection().await?;
        let filter = Value::Object(filter.clone());
        let rows = conn
            .query(
                r#"
                SELECT body
                FROM document
                WHERE collection = $1 AND body @> $2
                ORDER BY seq
                LIMIT 1
                "#,
                &[&collection.as_str(), &filter],
            )
            .await?;
        rows.first().map(body).transpose()
    }

    async fn find_many(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let conn = self.connection().await?;
        let filter = Value::Object(filter.clone());
        let rows = conn
            .query(
                r#"
                SELECT body
                FROM document
                WHERE collection = $1 AND body @> $2
                ORDER BY seq
                "#,
                &[&collection.as_str(), &filter],
            )
            .await?;
        rows.iter().map(body).collect()
    }

    async fn insert_one(&self, collection: Collection, document: Document) -> Result<String, StoreError> {
        let mut ids = self.insert_many(collection, vec![document]).await?;
        ids.pop().ok_or_else(|| StoreError::Backend {
            reason: "insert returned no id".to_string(),
        })
    }

    async fn insert_many(&self, collection: Collection, mut documents: Vec<Document>) -> Result<Vec<String>, StoreError> {
        if documents.is_empty() {
            return Ok(vec![]);
        }
        if documents.len() * COLUMN_LEN > MAX_BIND_PARAMS {
            return Err(StoreError::Backend {
                reason: format!("batch of {} documents exceeds one statement", documents.len()),
            });
        }
        let ids = documents.iter_mut().map(ensure_id).collect::<Vec<_>>();
        let bodies = documents.into_iter().map(Value::Object).collect::<Vec<_>>();
        let name = collection.as_str();

        // one statement, so the batch is written or rejected as a whole
        let stmt = insert_statement(bodies.len());
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(bodies.len() * COLUMN_LEN);
        for (id, body) in ids.iter().zip(bodies.iter()) {
            params.extend([&name as &(dyn ToSql + Sync), id as &(dyn ToSql + Sync), body as &(dyn ToSql + Sync)]);
        }

        let conn = self.connection().await?;
        conn.execute(stmt.as_str(), params.as_slice()).await?;
        Ok(ids)
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
        upsert: bool,
    ) -> Result<UpdateResult, StoreError> {
        let filter_value = Value::Object(filter.clone());
        let set_value = Value::Object(set.clone());
        let conn = self.connection().await?;
        let changed = conn
            .query(
                r#"
                WITH target AS (
                    SELECT seq, body AS before
                    FROM document
                    WHERE collection = $1 AND body @> $2
                    ORDER BY seq
                    LIMIT 1
                    FOR UPDATE
                )
                UPDATE document d
                SET body = d.body || $3
                FROM target
                WHERE d.seq = target.seq
                RETURNING target.before IS DISTINCT FROM d.body AS modified
                "#,
                &[&collection.as_str(), &filter_value, &set_value],
            )
            .await?;

        if let Some(row) = changed.first() {
            let modified: bool = row.try_get("modified")?;
            return Ok(UpdateResult {
                matched_count: 1,
                modified_count: u64::from(modified),
                upserted_id: None,
            });
        }
        if !upsert {
            return Ok(UpdateResult::default());
        }
        drop(conn);

        let mut doc = filter.clone();
        doc.extend(set);
        let id = self.insert_one(collection, doc).await?;
        Ok(UpdateResult {
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(id),
        })
    }
}
