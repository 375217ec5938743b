//! Contract for news articles

use lx_core::error::ValidationErrors;
use lx_models::NewsArticle;
use validator::Validate;

use crate::base::{
    merge_derived, validate_asset_present, validate_present, Contract, SubmitContext,
    ValidationResult,
};

/// Title, category and a cover image are required
#[derive(Debug, Clone, Copy, Default)]
pub struct NewsArticleContract;

impl Contract<NewsArticle> for NewsArticleContract {
    fn validate(&self, entity: &NewsArticle, context: &SubmitContext) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        validate_present("title", &entity.title, &mut errors);
        validate_present("category", &entity.category, &mut errors);
        validate_asset_present("image_url", &entity.image_url, context, &mut errors);
        merge_derived(entity.validate(), &mut errors);

        errors.into_result()
    }
}
