//! Versioned document store boundary.
//!
//! Every record lives as one JSON document in a named collection, carries a
//! version that increases on each committed update, and may declare a key
//! that must be unique within its collection.
//!
//! ## Batch Semantics
//!
//! `commit()` applies a whole batch or nothing:
//! - `Insert` fails with `Duplicate` if the id or unique key is taken
//! - `Update` / `Delete` fail with `Missing` if the document is gone and with
//!   `Concurrency` if its version no longer matches the expectation
//!
//! Workflows rely on this to keep multi-document changes (stock withdrawals
//! plus the request status) consistent without in-process locks.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

use laundry_core::{DocumentId, ExpectedVersion};

pub use in_memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;

/// A document as persisted: identity, version and raw JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub version: u64,
    pub unique_key: Option<String>,
    pub body: JsonValue,
}

/// One write inside an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Insert {
        collection: &'static str,
        id: DocumentId,
        unique_key: Option<String>,
        body: JsonValue,
    },
    Update {
        collection: &'static str,
        id: DocumentId,
        expected: ExpectedVersion,
        unique_key: Option<String>,
        body: JsonValue,
    },
    Delete {
        collection: &'static str,
        id: DocumentId,
        expected: ExpectedVersion,
    },
}

impl WriteOp {
    pub fn collection(&self) -> &'static str {
        match self {
            WriteOp::Insert { collection, .. }
            | WriteOp::Update { collection, .. }
            | WriteOp::Delete { collection, .. } => collection,
        }
    }

    pub fn id(&self) -> DocumentId {
        match self {
            WriteOp::Insert { id, .. } | WriteOp::Update { id, .. } | WriteOp::Delete { id, .. } => *id,
        }
    }
}

/// Document store operation error.
///
/// These are infrastructure errors. Workflows translate them into the
/// application taxonomy (`WorkflowError`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A version expectation failed; the batch was not applied.
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// An insert or update collided with an existing id or unique key.
    #[error("duplicate document: {0}")]
    Duplicate(String),

    /// An update or delete targeted a document that does not exist.
    #[error("document missing: {0}")]
    Missing(String),

    #[error("document serialization failed: {0}")]
    Serialization(String),

    /// The backend itself failed (connection, SQL, poisoned lock).
    #[error("document store backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: DocumentId) -> Result<Option<StoredDocument>, StoreError>;

    /// Look a document up by its unique key.
    async fn find_by_key(&self, collection: &str, key: &str) -> Result<Option<StoredDocument>, StoreError>;

    /// All documents of a collection, ordered by id (ids are time-ordered).
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError>;

    /// Apply a batch atomically.
    async fn commit(&self, batch: Vec<WriteOp>) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn get(&self, collection: &str, id: DocumentId) -> Result<Option<StoredDocument>, StoreError> {
        (**self).get(collection, id).await
    }

    async fn find_by_key(&self, collection: &str, key: &str) -> Result<Option<StoredDocument>, StoreError> {
        (**self).find_by_key(collection, key).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        (**self).list(collection).await
    }

    async fn commit(&self, batch: Vec<WriteOp>) -> Result<(), StoreError> {
        (**self).commit(batch).await
    }
}
