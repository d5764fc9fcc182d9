//! # Storage Module
//!
//! Keyed entity storage used by the domain layer.
//!
//! - **traits**: the raw string-keyed document store contract
//! - **entity_store**: typed entities and indexes on top of any store
//!
//! The SQLite implementation lives in [`crate::db`].

pub mod entity_store;
pub mod traits;

pub use entity_store::{Entity, EntityStore, Index};
pub use traits::{KeyValueStorage, MutateFn};
