//! Result type aliases

use crate::error::ValidationErrors;

/// Result of a contract check
pub type ValidationResult = Result<(), ValidationErrors>;
