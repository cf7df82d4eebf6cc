//! `laundry-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod document;
pub mod error;
pub mod id;

pub use document::{Document, ExpectedVersion, Versioned};
pub use error::{DomainError, DomainResult};
pub use id::{DocumentId, UserId};
