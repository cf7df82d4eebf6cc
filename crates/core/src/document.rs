//! Stored-document contract: identity, collection and optimistic versioning.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::id::DocumentId;

/// A domain record persisted as one document in a keyed collection.
///
/// Domain crates implement this on their records; the document store only
/// sees the collection name, the id, the optional unique key and the JSON body.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection (table / bucket) the record lives in.
    const COLLECTION: &'static str;

    /// Stable identity of the record.
    fn document_id(&self) -> DocumentId;

    /// Value that must be unique within the collection, if any.
    fn unique_key(&self) -> Option<String> {
        None
    }
}

/// A document together with the version it was read at.
///
/// Versions start at 1 on insert and increase by one on every committed update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: u64,
    pub doc: T,
}

impl<T> Versioned<T> {
    pub fn new(version: u64, doc: T) -> Self {
        Self { version, doc }
    }

    /// The expectation to attach when writing back a change derived from this read.
    pub fn expected(&self) -> ExpectedVersion {
        ExpectedVersion::Exact(self.version)
    }

    pub fn into_inner(self) -> T {
        self.doc
    }
}

/// Optimistic concurrency expectation for a document write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (last writer wins).
    Any,
    /// Require the document to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_expectation_only_matches_same_version() {
        assert!(ExpectedVersion::Exact(3).matches(3));
        assert!(!ExpectedVersion::Exact(3).matches(4));
        assert!(ExpectedVersion::Any.matches(42));
    }

    #[test]
    fn versioned_expectation_tracks_read_version() {
        let v = Versioned::new(7, "doc");
        assert_eq!(v.expected(), ExpectedVersion::Exact(7));
        assert_eq!(v.into_inner(), "doc");
    }
}
