//! Contract for lawyer profiles

use lx_core::error::ValidationErrors;
use lx_models::LawyerProfile;
use validator::Validate;

use crate::base::{merge_derived, validate_present, Contract, SubmitContext, ValidationResult};

/// Name, valid email and at least one practice area are required
#[derive(Debug, Clone, Copy, Default)]
pub struct LawyerProfileContract;

impl Contract<LawyerProfile> for LawyerProfileContract {
    fn validate(&self, entity: &LawyerProfile, _context: &SubmitContext) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        validate_present("full_name", &entity.full_name, &mut errors);
        if entity.email.is_empty() {
            errors.add("email", "can't be blank");
        } else {
            merge_derived(entity.validate(), &mut errors);
        }
        if entity.practice_areas.is_empty() {
            errors.add("practice_areas", "must list at least one area");
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lx_models::{FormDraft, LawyerProfileDraft, LawyerProfileField};

    #[test]
    fn test_blank_list_text_fails() {
        // Only separators: parses to an empty list
        let entity = LawyerProfileDraft::default()
            .apply(LawyerProfileField::FullName("Marc Diallo".into()))
            .apply(LawyerProfileField::Email("marc@example.com".into()))
            .apply(LawyerProfileField::PracticeAreas(" , ".into()))
            .to_entity();

        let errors = LawyerProfileContract
            .validate(&entity, &SubmitContext::default())
            .unwrap_err();
        assert!(errors.has_error("practice_areas"));
        assert!(!errors.has_error("full_name"));
    }

    #[test]
    fn test_complete_profile_passes() {
        let entity = LawyerProfile {
            full_name: "Marc Diallo".into(),
            email: "marc@example.com".into(),
            practice_areas: vec!["Tax".into()],
            ..Default::default()
        };
        assert!(LawyerProfileContract
            .validate(&entity, &SubmitContext::default())
            .is_ok());
    }
}
