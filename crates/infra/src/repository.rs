//! Typed access to the document store.
//!
//! `Documents` turns raw `StoredDocument`s into domain records (and back),
//! and `Batch` collects typed writes for one atomic commit.

use std::sync::Arc;

use laundry_core::{Document, DocumentId, ExpectedVersion, Versioned};

use crate::store::{DocumentStore, StoreError, StoredDocument, WriteOp};

/// Shared handle over a `DocumentStore` with typed reads.
#[derive(Clone)]
pub struct Documents {
    store: Arc<dyn DocumentStore>,
}

impl Documents {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get<T: Document>(&self, id: DocumentId) -> Result<Option<Versioned<T>>, StoreError> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(decode::<T>)
            .transpose()
    }

    pub async fn find_by_key<T: Document>(&self, key: &str) -> Result<Option<Versioned<T>>, StoreError> {
        self.store
            .find_by_key(T::COLLECTION, key)
            .await?
            .map(decode::<T>)
            .transpose()
    }

    pub async fn list<T: Document>(&self) -> Result<Vec<Versioned<T>>, StoreError> {
        self.store
            .list(T::COLLECTION)
            .await?
            .into_iter()
            .map(decode::<T>)
            .collect()
    }

    pub async fn commit(&self, batch: Batch) -> Result<(), StoreError> {
        self.store.commit(batch.ops).await
    }
}

impl core::fmt::Debug for Documents {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Documents").finish_non_exhaustive()
    }
}

fn decode<T: Document>(doc: StoredDocument) -> Result<Versioned<T>, StoreError> {
    let value = serde_json::from_value::<T>(doc.body).map_err(|e| {
        StoreError::Serialization(format!("{}/{}: {e}", T::COLLECTION, doc.id))
    })?;
    Ok(Versioned::new(doc.version, value))
}

fn encode<T: Document>(doc: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(doc)
        .map_err(|e| StoreError::Serialization(format!("{}/{}: {e}", T::COLLECTION, doc.document_id())))
}

/// Writes that commit together or not at all.
#[derive(Debug, Default, Clone)]
pub struct Batch {
    ops: Vec<WriteOp>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Document>(&mut self, doc: &T) -> Result<&mut Self, StoreError> {
        self.ops.push(WriteOp::Insert {
            collection: T::COLLECTION,
            id: doc.document_id(),
            unique_key: doc.unique_key(),
            body: encode(doc)?,
        });
        Ok(self)
    }

    pub fn update<T: Document>(&mut self, doc: &T, expected: ExpectedVersion) -> Result<&mut Self, StoreError> {
        self.ops.push(WriteOp::Update {
            collection: T::COLLECTION,
            id: doc.document_id(),
            expected,
            unique_key: doc.unique_key(),
            body: encode(doc)?,
        });
        Ok(self)
    }

    pub fn delete<T: Document>(&mut self, id: DocumentId, expected: ExpectedVersion) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection: T::COLLECTION,
            id,
            expected,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
