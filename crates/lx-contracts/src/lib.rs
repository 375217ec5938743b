//! # lx-contracts
//!
//! Required-field contracts checked on submit, before any upload or save.

pub mod base;
pub mod client;
pub mod lawyer;
pub mod news;

pub use base::*;
pub use client::ClientProfileContract;
pub use lawyer::LawyerProfileContract;
pub use news::NewsArticleContract;
