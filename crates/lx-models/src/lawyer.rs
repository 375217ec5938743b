//! Lawyer profile model

use lx_core::types::AssetCategory;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::draft::FormDraft;
use crate::list_buffer::ListEditBuffer;

/// Lawyer profile as stored by the persistence API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LawyerProfile {
    #[validate(length(max = 120))]
    pub full_name: String,

    #[validate(email)]
    pub email: String,

    /// Professional title, e.g. "Senior Partner"
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub bio: String,

    #[serde(default)]
    pub practice_areas: Vec<String>,

    #[serde(default)]
    pub languages: Vec<String>,

    #[serde(default)]
    pub education: Vec<String>,

    /// Locator of the profile photo
    #[serde(default)]
    pub photo_url: String,
}

/// Field update messages for [`LawyerProfileDraft`]
///
/// List fields carry raw text; they are parsed once on submission.
#[derive(Debug, Clone, PartialEq)]
pub enum LawyerProfileField {
    FullName(String),
    Email(String),
    Title(String),
    Bio(String),
    PracticeAreas(String),
    Languages(String),
    Education(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LawyerProfileDraft {
    pub full_name: String,
    pub email: String,
    pub title: String,
    pub bio: String,
    pub practice_areas: ListEditBuffer,
    pub languages: ListEditBuffer,
    pub education: ListEditBuffer,
    pub photo_url: String,
}

impl FormDraft for LawyerProfileDraft {
    type Entity = LawyerProfile;
    type Field = LawyerProfileField;

    const ENTITY_NAME: &'static str = "lawyer profile";
    const ASSET_CATEGORY: AssetCategory = AssetCategory::Lawyers;

    fn apply(self, field: LawyerProfileField) -> Self {
        match field {
            LawyerProfileField::FullName(full_name) => Self { full_name, ..self },
            LawyerProfileField::Email(email) => Self { email, ..self },
            LawyerProfileField::Title(title) => Self { title, ..self },
            LawyerProfileField::Bio(bio) => Self { bio, ..self },
            LawyerProfileField::PracticeAreas(raw) => Self {
                practice_areas: self.practice_areas.with_raw(raw),
                ..self
            },
            LawyerProfileField::Languages(raw) => Self {
                languages: self.languages.with_raw(raw),
                ..self
            },
            LawyerProfileField::Education(raw) => Self {
                education: self.education.with_raw(raw),
                ..self
            },
        }
    }

    fn asset_reference(&self) -> &str {
        &self.photo_url
    }

    fn with_asset_reference(self, reference: impl Into<String>) -> Self {
        Self {
            photo_url: reference.into(),
            ..self
        }
    }

    fn from_entity(entity: &LawyerProfile) -> Self {
        Self {
            full_name: entity.full_name.clone(),
            email: entity.email.clone(),
            title: entity.title.clone(),
            bio: entity.bio.clone(),
            practice_areas: ListEditBuffer::from_items(&entity.practice_areas),
            languages: ListEditBuffer::from_items(&entity.languages),
            education: ListEditBuffer::from_items(&entity.education),
            photo_url: entity.photo_url.clone(),
        }
    }

    fn to_entity(&self) -> LawyerProfile {
        LawyerProfile {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            title: self.title.trim().to_string(),
            bio: self.bio.clone(),
            practice_areas: self.practice_areas.items(),
            languages: self.languages.items(),
            education: self.education.items(),
            photo_url: self.photo_url.trim().to_string(),
        }
    }
}
