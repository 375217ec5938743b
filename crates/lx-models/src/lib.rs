//! # lx-models
//!
//! Entities and form drafts for the Lexportal admin screens.
//!
//! Each screen edits a draft ([`FormDraft`]) that is turned into its entity
//! only on submission.

pub use lx_core::types::AssetCategory;

pub mod client;
pub mod draft;
pub mod lawyer;
pub mod list_buffer;
pub mod news;

pub use client::{ClientProfile, ClientProfileDraft, ClientProfileField};
pub use draft::FormDraft;
pub use lawyer::{LawyerProfile, LawyerProfileDraft, LawyerProfileField};
pub use list_buffer::{parse_list, ListEditBuffer};
pub use news::{NewsArticle, NewsArticleDraft, NewsArticleField};
