use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use laundry_core::DocumentId;

use super::{DocumentStore, StoreError, StoredDocument, WriteOp};

#[derive(Debug, Clone)]
struct Entry {
    version: u64,
    unique_key: Option<String>,
    body: JsonValue,
}

type Collection = BTreeMap<DocumentId, Entry>;

/// In-memory document store.
///
/// Intended for tests/dev. Not optimized for performance: a commit stages
/// the batch against a copy of the touched collections and swaps it in under
/// one write lock.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<&'static str, Collection>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn to_stored(id: DocumentId, entry: &Entry) -> StoredDocument {
        StoredDocument {
            id,
            version: entry.version,
            unique_key: entry.unique_key.clone(),
            body: entry.body.clone(),
        }
    }

    fn key_taken(collection: &Collection, key: Option<&str>, except: DocumentId) -> bool {
        let Some(key) = key else {
            return false;
        };
        collection
            .iter()
            .any(|(id, e)| *id != except && e.unique_key.as_deref() == Some(key))
    }

    fn apply(staged: &mut Collection, op: WriteOp) -> Result<(), StoreError> {
        match op {
            WriteOp::Insert {
                collection,
                id,
                unique_key,
                body,
            } => {
                if staged.contains_key(&id) {
                    return Err(StoreError::Duplicate(format!("{collection}/{id} already exists")));
                }
                if Self::key_taken(staged, unique_key.as_deref(), id) {
                    return Err(StoreError::Duplicate(format!(
                        "{collection} key {:?} already exists",
                        unique_key.unwrap_or_default()
                    )));
                }
                staged.insert(
                    id,
                    Entry {
                        version: 1,
                        unique_key,
                        body,
                    },
                );
            }
            WriteOp::Update {
                collection,
                id,
                expected,
                unique_key,
                body,
            } => {
                if Self::key_taken(staged, unique_key.as_deref(), id) {
                    return Err(StoreError::Duplicate(format!(
                        "{collection} key {:?} already exists",
                        unique_key.unwrap_or_default()
                    )));
                }
                let entry = staged
                    .get_mut(&id)
                    .ok_or_else(|| StoreError::Missing(format!("{collection}/{id}")))?;
                if !expected.matches(entry.version) {
                    return Err(StoreError::Concurrency(format!(
                        "{collection}/{id}: expected {expected:?}, found {}",
                        entry.version
                    )));
                }
                entry.version += 1;
                entry.unique_key = unique_key;
                entry.body = body;
            }
            WriteOp::Delete {
                collection,
                id,
                expected,
            } => {
                let entry = staged
                    .get(&id)
                    .ok_or_else(|| StoreError::Missing(format!("{collection}/{id}")))?;
                if !expected.matches(entry.version) {
                    return Err(StoreError::Concurrency(format!(
                        "{collection}/{id}: expected {expected:?}, found {}",
                        entry.version
                    )));
                }
                staged.remove(&id);
            }
        }
        Ok(())
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: DocumentId) -> Result<Option<StoredDocument>, StoreError> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(&id))
            .map(|e| Self::to_stored(id, e)))
    }

    async fn find_by_key(&self, collection: &str, key: &str) -> Result<Option<StoredDocument>, StoreError> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        Ok(collections.get(collection).and_then(|c| {
            c.iter()
                .find(|(_, e)| e.unique_key.as_deref() == Some(key))
                .map(|(id, e)| Self::to_stored(*id, e))
        }))
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        Ok(collections
            .get(collection)
            .map(|c| c.iter().map(|(id, e)| Self::to_stored(*id, e)).collect())
            .unwrap_or_default())
    }

    async fn commit(&self, batch: Vec<WriteOp>) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut collections = self.collections.write().map_err(|_| poisoned())?;

        let mut staged: HashMap<&'static str, Collection> = HashMap::new();
        for op in batch {
            let name = op.collection();
            let collection = staged
                .entry(name)
                .or_insert_with(|| collections.get(name).cloned().unwrap_or_default());
            Self::apply(collection, op)?;
        }

        collections.extend(staged);
        Ok(())
    }
}
