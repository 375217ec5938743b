//! # lx-core
//!
//! Core types shared by every Lexportal crate:
//! - Error taxonomy and validation error collection
//! - Result type aliases
//! - Identifier traits
//! - Asset categories
//! - Configuration types

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::*;
pub use result::*;
pub use traits::*;
pub use types::*;
