//! Typed entities on top of a [`KeyValueStorage`].
//!
//! Each entity type owns a key namespace (`<entity_name>:<id>`) and declares
//! the state it starts from when nothing has been stored yet. States are
//! stored as JSON documents.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{ChartError, Result};
use crate::storage::KeyValueStorage;

/// A document type persisted under its own key namespace
pub trait Entity: Serialize + DeserializeOwned + Send + 'static {
    const ENTITY_NAME: &'static str;

    /// State observed for an id that has never been written
    fn initial_state(id: &str) -> Self;

    fn storage_key(id: &str) -> String {
        format!("{}:{}", Self::ENTITY_NAME, id)
    }
}

/// Typed access to entities and indexes
#[derive(Clone)]
pub struct EntityStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl EntityStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Load an entity if it has been stored
    pub async fn find<T: Entity>(&self, id: &str) -> Result<Option<T>> {
        match self.storage.get(&T::storage_key(id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Load an entity, synthesizing its initial state when absent.
    /// Nothing is persisted by this call.
    pub async fn get<T: Entity>(&self, id: &str) -> Result<T> {
        Ok(self.find(id).await?.unwrap_or_else(|| T::initial_state(id)))
    }

    pub async fn exists<T: Entity>(&self, id: &str) -> Result<bool> {
        Ok(self.storage.get(&T::storage_key(id)).await?.is_some())
    }

    /// Unconditionally overwrite an entity
    pub async fn save<T: Entity>(&self, id: &str, state: &T) -> Result<()> {
        let raw = serde_json::to_string(state)?;
        self.storage.save(&T::storage_key(id), &raw).await
    }

    pub async fn delete<T: Entity>(&self, id: &str) -> Result<bool> {
        self.storage.delete(&T::storage_key(id)).await
    }

    /// Atomically transform an entity, starting from its initial state when absent
    pub async fn mutate<T, F>(&self, id: &str, f: F) -> Result<T>
    where
        T: Entity,
        F: FnOnce(T) -> Result<T> + Send + 'static,
    {
        let owned_id = id.to_string();
        self.mutate_with(id, move |current: Option<T>| {
            f(current.unwrap_or_else(|| T::initial_state(&owned_id)))
        })
        .await
    }

    /// Atomically transform an entity, letting the transformation see whether
    /// it exists. Returning an error aborts the mutation without writing.
    pub async fn mutate_with<T, F>(&self, id: &str, f: F) -> Result<T>
    where
        T: Entity,
        F: FnOnce(Option<T>) -> Result<T> + Send + 'static,
    {
        let raw = self
            .storage
            .mutate(
                &T::storage_key(id),
                Box::new(move |current: Option<String>| -> Result<String> {
                    let current = match current {
                        Some(raw) => Some(serde_json::from_str::<T>(&raw)?),
                        None => None,
                    };
                    let next = f(current)?;
                    Ok(serde_json::to_string(&next)?)
                }),
            )
            .await?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Atomically transform an entity and hand back a value computed from the
    /// state the transformation observed. The value is only returned when the
    /// new state was committed.
    pub async fn mutate_returning<T, R, F>(&self, id: &str, f: F) -> Result<(T, R)>
    where
        T: Entity,
        R: Send + 'static,
        F: FnOnce(T) -> Result<(T, R)> + Send + 'static,
    {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let state = self
            .mutate(id, move |current: T| {
                let (next, output) = f(current)?;
                // The receiver is held until the mutation completes
                let _ = tx.send(output);
                Ok(next)
            })
            .await?;

        let output = rx.await.map_err(|_| {
            ChartError::Internal(format!(
                "mutation of {} committed without an output",
                T::storage_key(id)
            ))
        })?;
        Ok((state, output))
    }

    pub fn index(&self, name: impl Into<String>) -> Index {
        Index {
            storage: self.storage.clone(),
            name: name.into(),
        }
    }
}

/// An ordered list of ids, e.g. every child or the children of one parent
#[derive(Clone)]
pub struct Index {
    storage: Arc<dyn KeyValueStorage>,
    name: String,
}

impl Index {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn add(&self, id: &str) -> Result<()> {
        self.storage.index_add(&self.name, id).await
    }

    pub async fn remove(&self, id: &str) -> Result<bool> {
        self.storage.index_remove(&self.name, id).await
    }

    pub async fn list(&self) -> Result<Vec<String>> {
        self.storage.index_list(&self.name).await
    }
}
