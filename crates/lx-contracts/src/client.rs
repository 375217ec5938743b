//! Contract for client profiles

use std::sync::LazyLock;

use lx_core::error::ValidationErrors;
use lx_models::ClientProfile;
use regex::Regex;
use validator::Validate;

use crate::base::{merge_derived, validate_present, Contract, SubmitContext, ValidationResult};

/// Digits with optional leading `+`, spaces, dashes and parentheses
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 ()\-]{6,20}$").unwrap());

/// Name and a valid email are required; the photo is optional
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientProfileContract;

impl ClientProfileContract {
    /// Phone is optional but must look like a number when given
    fn validate_phone(&self, phone: &str, errors: &mut ValidationErrors) {
        if !phone.is_empty() && !PHONE_PATTERN.is_match(phone) {
            errors.add("phone", "is invalid");
        }
    }
}

impl Contract<ClientProfile> for ClientProfileContract {
    fn validate(&self, entity: &ClientProfile, _context: &SubmitContext) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        validate_present("full_name", &entity.full_name, &mut errors);
        if entity.email.is_empty() {
            errors.add("email", "can't be blank");
        } else {
            merge_derived(entity.validate(), &mut errors);
        }
        self.validate_phone(&entity.phone, &mut errors);

        errors.into_result()
    }
}
