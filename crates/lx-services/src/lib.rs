//! # lx-services
//!
//! Form orchestration for Lexportal.
//!
//! An [`AssetForm`] holds a draft and its asset state; the
//! [`SaveCoordinator`] submits it: contract check, upload of a pending file,
//! then persistence through a [`PersistenceApi`].

pub mod form;
pub mod persistence;
pub mod save;

pub use form::{AssetForm, FormMode};
pub use persistence::{
    MemoryPersistence, PersistedEntity, PersistenceApi, PersistenceError, PersistenceResult,
    SaveTarget,
};
pub use save::{SaveCoordinator, SaveError};
