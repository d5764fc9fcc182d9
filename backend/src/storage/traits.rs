//! # Storage Traits
//!
//! The keyed storage abstraction the domain layer is written against.
//! Values are opaque serialized documents; typing happens one layer up in
//! [`EntityStore`](super::EntityStore).

use async_trait::async_trait;

use crate::error::Result;

/// Transformation applied by [`KeyValueStorage::mutate`]. Receives the stored
/// document (or `None` when the key is absent) and returns the document to persist.
pub type MutateFn = Box<dyn FnOnce(Option<String>) -> Result<String> + Send>;

/// Trait defining a string-keyed document store with secondary indexes
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read the document stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Unconditionally overwrite the document stored under `key`
    async fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the document under `key`.
    /// Returns true if a document was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Atomically read, transform and write the document under `key`.
    ///
    /// Mutations of the same key are serialized: each transformation observes
    /// the result of the previous one. If the transformation fails nothing is
    /// written. Returns the persisted document.
    async fn mutate(&self, key: &str, f: MutateFn) -> Result<String>;

    /// Append `id` to an index. Adding an id that is already present is a no-op.
    async fn index_add(&self, index: &str, id: &str) -> Result<()>;

    /// Remove `id` from an index. Returns true if it was present.
    async fn index_remove(&self, index: &str, id: &str) -> Result<bool>;

    /// List the ids of an index in insertion order
    async fn index_list(&self, index: &str) -> Result<Vec<String>>;
}
