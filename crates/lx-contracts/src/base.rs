//! Base contract system
//!
//! Contracts hold the required-field checks that run before any network call
//! on submit.

use lx_core::error::ValidationErrors;

pub use lx_core::result::ValidationResult;

/// What the form knows about its asset at submit time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitContext {
    /// A local file is selected and will be uploaded before persisting
    pub asset_pending: bool,
}

impl SubmitContext {
    pub fn with_pending_asset() -> Self {
        Self {
            asset_pending: true,
        }
    }
}

/// Base contract trait
pub trait Contract<T>: Send + Sync {
    /// Validate the entity
    fn validate(&self, entity: &T, context: &SubmitContext) -> ValidationResult;
}

/// Validate that a text attribute is present
pub fn validate_present(attribute: &str, value: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(attribute, "can't be blank");
    }
}

/// Validate the asset reference, counting a pending upload as present
pub fn validate_asset_present(
    attribute: &str,
    reference: &str,
    context: &SubmitContext,
    errors: &mut ValidationErrors,
) {
    if !context.asset_pending && reference.trim().is_empty() {
        errors.add(attribute, "can't be blank");
    }
}

/// Copy derive-level `validator` failures into the field error collection
pub fn merge_derived(
    result: Result<(), validator::ValidationErrors>,
    errors: &mut ValidationErrors,
) {
    let Err(derived) = result else {
        return;
    };

    for (field, field_errors) in derived.field_errors() {
        for error in field_errors {
            let message = match error.code.as_ref() {
                "email" => "is invalid".to_string(),
                "length" => match error.params.get("max") {
                    Some(max) => format!("is too long (maximum is {} characters)", max),
                    None => "has an invalid length".to_string(),
                },
                other => format!("is invalid ({})", other),
            };
            errors.add(field, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(email)]
        email: String,
        #[validate(length(max = 3))]
        code: String,
    }

    #[test]
    fn test_validate_present() {
        let mut errors = ValidationErrors::new();
        validate_present("title", "   ", &mut errors);
        validate_present("category", "Firm", &mut errors);
        assert!(errors.has_error("title"));
        assert!(!errors.has_error("category"));
    }

    #[test]
    fn test_pending_asset_counts_as_present() {
        let mut errors = ValidationErrors::new();
        validate_asset_present("image_url", "", &SubmitContext::with_pending_asset(), &mut errors);
        assert!(errors.is_empty());

        validate_asset_present("image_url", "", &SubmitContext::default(), &mut errors);
        assert!(errors.has_error("image_url"));
    }

    #[test]
    fn test_merge_derived_messages() {
        let sample = Sample {
            email: "not-an-email".into(),
            code: "ABCDE".into(),
        };
        let mut errors = ValidationErrors::new();
        merge_derived(sample.validate(), &mut errors);

        assert_eq!(errors.get("email"), Some(&vec!["is invalid".to_string()]));
        assert_eq!(
            errors.get("code"),
            Some(&vec!["is too long (maximum is 3 characters)".to_string()])
        );
    }
}
