//! Postgres-backed document store.
//!
//! All collections share one `documents` table keyed by `(collection, id)`,
//! with a partial unique index on `(collection, unique_key)`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (serialization failure / deadlock) | `40001` / `40P01` | `Concurrency` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed, Io, other | N/A | `Backend` |
//!
//! ## Optimistic Concurrency
//!
//! `commit()` runs in one transaction. Every update and delete first locks
//! its row with `SELECT … FOR UPDATE` and compares the stored version with
//! the expectation; any mismatch rolls the whole transaction back.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{Span, instrument};
use uuid::Uuid;

use laundry_core::{DocumentId, ExpectedVersion};

use super::{DocumentStore, StoreError, StoredDocument, WriteOp};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection  TEXT        NOT NULL,
        id          UUID        NOT NULL,
        version     BIGINT      NOT NULL CHECK (version > 0),
        unique_key  TEXT        NULL,
        body        JSONB       NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (collection, id)
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS documents_collection_unique_key
        ON documents (collection, unique_key)
        WHERE unique_key IS NOT NULL
    "#,
];

/// Postgres-backed document store.
///
/// Uses the SQLx connection pool, which is `Send + Sync`; the store can be
/// shared across handlers.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: Arc<PgPool>,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    async fn apply(tx: &mut Transaction<'_, Postgres>, op: WriteOp) -> Result<(), StoreError> {
        match op {
            WriteOp::Insert {
                collection,
                id,
                unique_key,
                body,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO documents (collection, id, version, unique_key, body)
                    VALUES ($1, $2, 1, $3, $4)
                    "#,
                )
                .bind(collection)
                .bind(id.as_uuid())
                .bind(&unique_key)
                .bind(&body)
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("insert_document", e))?;
            }
            WriteOp::Update {
                collection,
                id,
                expected,
                unique_key,
                body,
            } => {
                lock_and_check(tx, collection, id, expected).await?;
                sqlx::query(
                    r#"
                    UPDATE documents
                    SET version = version + 1, unique_key = $3, body = $4, updated_at = now()
                    WHERE collection = $1 AND id = $2
                    "#,
                )
                .bind(collection)
                .bind(id.as_uuid())
                .bind(&unique_key)
                .bind(&body)
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("update_document", e))?;
            }
            WriteOp::Delete {
                collection,
                id,
                expected,
            } => {
                lock_and_check(tx, collection, id, expected).await?;
                sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                    .bind(collection)
                    .bind(id.as_uuid())
                    .execute(&mut **tx)
                    .await
                    .map_err(|e| map_sqlx_error("delete_document", e))?;
            }
        }
        Ok(())
    }
}

async fn lock_and_check(
    tx: &mut Transaction<'_, Postgres>,
    collection: &str,
    id: DocumentId,
    expected: ExpectedVersion,
) -> Result<(), StoreError> {
    let row = sqlx::query("SELECT version FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE")
        .bind(collection)
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("lock_document", e))?;

    let Some(row) = row else {
        return Err(StoreError::Missing(format!("{collection}/{id}")));
    };
    let current: i64 = row
        .try_get("version")
        .map_err(|e| map_sqlx_error("lock_document", e))?;
    let current = current as u64;

    if !expected.matches(current) {
        return Err(StoreError::Concurrency(format!(
            "{collection}/{id}: expected {expected:?}, found {current}"
        )));
    }
    Ok(())
}

fn row_to_document(row: &PgRow) -> Result<StoredDocument, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Serialization(format!("failed to decode document row: {e}"));

    let id: Uuid = row.try_get("id").map_err(decode)?;
    let version: i64 = row.try_get("version").map_err(decode)?;
    Ok(StoredDocument {
        id: DocumentId::from_uuid(id),
        version: version as u64,
        unique_key: row.try_get("unique_key").map_err(decode)?,
        body: row.try_get("body").map_err(decode)?,
    })
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[instrument(skip(self), err)]
    async fn get(&self, collection: &str, id: DocumentId) -> Result<Option<StoredDocument>, StoreError> {
        let row = sqlx::query(
            "SELECT id, version, unique_key, body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_document", e))?;

        row.as_ref().map(row_to_document).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_by_key(&self, collection: &str, key: &str) -> Result<Option<StoredDocument>, StoreError> {
        let row = sqlx::query(
            "SELECT id, version, unique_key, body FROM documents WHERE collection = $1 AND unique_key = $2",
        )
        .bind(collection)
        .bind(key)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_key", e))?;

        row.as_ref().map(row_to_document).transpose()
    }

    #[instrument(skip(self), fields(document_count = tracing::field::Empty), err)]
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, version, unique_key, body FROM documents WHERE collection = $1 ORDER BY id ASC",
        )
        .bind(collection)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_documents", e))?;

        let docs = rows.iter().map(row_to_document).collect::<Result<Vec<_>, _>>()?;
        Span::current().record("document_count", docs.len());
        Ok(docs)
    }

    #[instrument(skip(self, batch), fields(write_count = batch.len()), err)]
    async fn commit(&self, batch: Vec<WriteOp>) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for op in batch {
            if let Err(err) = Self::apply(&mut tx, op).await {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(err);
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(msg),
                Some("40001") | Some("40P01") => StoreError::Concurrency(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
