//! News article model

use lx_core::types::AssetCategory;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::draft::FormDraft;

/// News article as stored by the persistence API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    #[validate(length(max = 200))]
    pub title: String,

    pub category: String,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub author: String,

    /// Locator of the cover image
    #[serde(default)]
    pub image_url: String,

    #[serde(default)]
    pub published: bool,
}

/// Field update messages for [`NewsArticleDraft`]
#[derive(Debug, Clone, PartialEq)]
pub enum NewsArticleField {
    Title(String),
    Category(String),
    Summary(String),
    Content(String),
    Author(String),
    Published(bool),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsArticleDraft {
    pub title: String,
    pub category: String,
    pub summary: String,
    pub content: String,
    pub author: String,
    pub image_url: String,
    pub published: bool,
}

impl FormDraft for NewsArticleDraft {
    type Entity = NewsArticle;
    type Field = NewsArticleField;

    const ENTITY_NAME: &'static str = "news article";
    const ASSET_CATEGORY: AssetCategory = AssetCategory::News;

    fn apply(self, field: NewsArticleField) -> Self {
        match field {
            NewsArticleField::Title(title) => Self { title, ..self },
            NewsArticleField::Category(category) => Self { category, ..self },
            NewsArticleField::Summary(summary) => Self { summary, ..self },
            NewsArticleField::Content(content) => Self { content, ..self },
            NewsArticleField::Author(author) => Self { author, ..self },
            NewsArticleField::Published(published) => Self { published, ..self },
        }
    }

    fn asset_reference(&self) -> &str {
        &self.image_url
    }

    fn with_asset_reference(self, reference: impl Into<String>) -> Self {
        Self {
            image_url: reference.into(),
            ..self
        }
    }

    fn from_entity(entity: &NewsArticle) -> Self {
        Self {
            title: entity.title.clone(),
            category: entity.category.clone(),
            summary: entity.summary.clone(),
            content: entity.content.clone(),
            author: entity.author.clone(),
            image_url: entity.image_url.clone(),
            published: entity.published,
        }
    }

    fn to_entity(&self) -> NewsArticle {
        NewsArticle {
            title: self.title.trim().to_string(),
            category: self.category.trim().to_string(),
            summary: self.summary.clone(),
            content: self.content.clone(),
            author: self.author.trim().to_string(),
            image_url: self.image_url.trim().to_string(),
            published: self.published,
        }
    }
}
