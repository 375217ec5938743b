//! Client profile model

use lx_core::types::AssetCategory;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::draft::FormDraft;

/// Client profile as stored by the persistence API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfile {
    #[validate(length(max = 120))]
    pub full_name: String,

    #[validate(email)]
    pub email: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub company: String,

    /// Locator of the profile photo
    #[serde(default)]
    pub photo_url: String,
}

/// Field update messages for [`ClientProfileDraft`]
#[derive(Debug, Clone, PartialEq)]
pub enum ClientProfileField {
    FullName(String),
    Email(String),
    Phone(String),
    Company(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientProfileDraft {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub photo_url: String,
}

impl FormDraft for ClientProfileDraft {
    type Entity = ClientProfile;
    type Field = ClientProfileField;

    const ENTITY_NAME: &'static str = "client profile";
    const ASSET_CATEGORY: AssetCategory = AssetCategory::Clients;

    fn apply(self, field: ClientProfileField) -> Self {
        match field {
            ClientProfileField::FullName(full_name) => Self { full_name, ..self },
            ClientProfileField::Email(email) => Self { email, ..self },
            ClientProfileField::Phone(phone) => Self { phone, ..self },
            ClientProfileField::Company(company) => Self { company, ..self },
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

    fn from_entity(entity: &ClientProfile) -> Self {
        Self {
            full_name: entity.full_name.clone(),
            email: entity.email.clone(),
            phone: entity.phone.clone(),
            company: entity.company.clone(),
            photo_url: entity.photo_url.clone(),
        }
    }

    fn to_entity(&self) -> ClientProfile {
        ClientProfile {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: self.phone.trim().to_string(),
            company: self.company.trim().to_string(),
            photo_url: self.photo_url.trim().to_string(),
        }
    }
}
