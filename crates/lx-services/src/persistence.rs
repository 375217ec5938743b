//! Persistence boundary
//!
//! The document persistence API is reached only through [`PersistenceApi`].
//! [`MemoryPersistence`] backs tests and the operator CLI.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lx_core::error::ErrorKind;
use lx_core::traits::{EntityId, Identifiable};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Record not found: {0}")]
    NotFound(EntityId),
    #[error("Save rejected: {0}")]
    Rejected(String),
    #[error("Persistence unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Persistence
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Where a save goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    Create,
    Update(EntityId),
}

/// Entity together with the id the API stored it under
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedEntity<E> {
    pub id: EntityId,
    #[serde(flatten)]
    pub entity: E,
}

impl<E> Identifiable for PersistedEntity<E> {
    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

/// Document persistence API
#[async_trait]
pub trait PersistenceApi<E>: Send + Sync
where
    E: Send + Sync + 'static,
{
    /// Load an entity for the edit flow
    async fn fetch(&self, id: &str) -> PersistenceResult<E>;

    /// Create or update an entity
    async fn save(&self, target: SaveTarget, payload: E) -> PersistenceResult<PersistedEntity<E>>;
}

/// In-memory persistence for testing
pub struct MemoryPersistence<E> {
    records: RwLock<HashMap<EntityId, E>>,
    save_calls: AtomicUsize,
    fail_next: Mutex<Option<PersistenceError>>,
}

impl<E> Default for MemoryPersistence<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> MemoryPersistence<E> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            save_calls: AtomicUsize::new(0),
            fail_next: Mutex::new(None),
        }
    }

    /// Number of `save` calls, failed ones included
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Make the next `save` fail with `error`
    pub async fn fail_next_save(&self, error: PersistenceError) {
        *self.fail_next.lock().await = Some(error);
    }

    /// Seed a record, returning its id
    pub async fn insert(&self, entity: E) -> EntityId {
        let id = uuid::Uuid::new_v4().to_string();
        self.records.write().await.insert(id.clone(), entity);
        id
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl<E: Clone> MemoryPersistence<E> {
    pub async fn get(&self, id: &str) -> Option<E> {
        self.records.read().await.get(id).cloned()
    }
}

#[async_trait]
impl<E> PersistenceApi<E> for MemoryPersistence<E>
where
    E: Clone + Send + Sync + 'static,
{
    async fn fetch(&self, id: &str) -> PersistenceResult<E> {
        self.get(id)
            .await
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
    }

    async fn save(&self, target: SaveTarget, payload: E) -> PersistenceResult<PersistedEntity<E>> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.fail_next.lock().await.take() {
            return Err(error);
        }

        let mut records = self.records.write().await;
        let id = match target {
            SaveTarget::Create => uuid::Uuid::new_v4().to_string(),
            SaveTarget::Update(id) => {
                if !records.contains_key(&id) {
                    return Err(PersistenceError::NotFound(id));
                }
                id
            }
        };
        records.insert(id.clone(), payload.clone());
        debug!(id = %id, "Record saved");

        Ok(PersistedEntity {
            id,
            entity: payload,
        })
    }
}
