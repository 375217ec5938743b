//! Form draft abstraction
//!
//! A draft is an immutable value. Every edit is a field message applied with
//! [`FormDraft::apply`], which returns the next draft.

use lx_core::types::AssetCategory;
use serde::{de::DeserializeOwned, Serialize};

/// Editable state of one create/edit screen
pub trait FormDraft: Clone + Default + Send + Sync + 'static {
    /// Entity sent to and returned by the persistence API
    type Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Field-level update message
    type Field: Send;

    /// Human-readable entity name for logs and messages
    const ENTITY_NAME: &'static str;

    /// Destination folder for this entity's uploaded asset
    const ASSET_CATEGORY: AssetCategory;

    /// Apply one field update, returning the new draft
    fn apply(self, field: Self::Field) -> Self;

    /// Current asset reference (empty when there is none)
    fn asset_reference(&self) -> &str;

    /// Replace the asset reference
    fn with_asset_reference(self, reference: impl Into<String>) -> Self;

    /// Draft for the edit flow, populated from a fetched entity
    fn from_entity(entity: &Self::Entity) -> Self;

    /// Normalized entity for submission
    fn to_entity(&self) -> Self::Entity;
}
