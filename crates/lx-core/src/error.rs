//! Core error types for Lexportal
//!
//! Every fallible step of the asset pipeline reports one of four kinds of
//! failure. Crate-level errors expose their kind so callers can react without
//! matching on every concrete variant.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Broad classification of a failure in the save pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad file metadata or missing form fields. Never reaches the network.
    Validation,
    /// Byte transfer or durable locator resolution failed.
    Transfer,
    /// The final create/update call failed.
    Persistence,
    /// A locator string could not be turned back into a storage path.
    ReferenceParse,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transfer => "transfer",
            Self::Persistence => "persistence",
            Self::ReferenceParse => "reference_parse",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type
#[derive(Error, Debug)]
pub enum LxError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Transfer failed: {message}")]
    Transfer { message: String },

    #[error("Save failed: {message}")]
    Persistence { message: String },

    #[error("Invalid reference: {locator}")]
    ReferenceParse { locator: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LxError {
    /// Kind of pipeline failure, if this error came out of the pipeline
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            LxError::Validation(_) => Some(ErrorKind::Validation),
            LxError::Transfer { .. } => Some(ErrorKind::Transfer),
            LxError::Persistence { .. } => Some(ErrorKind::Persistence),
            LxError::ReferenceParse { .. } => Some(ErrorKind::ReferenceParse),
            LxError::Config(_) | LxError::Internal(_) => None,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            LxError::Validation(_) => "validation_failed",
            LxError::Transfer { .. } => "transfer_failed",
            LxError::Persistence { .. } => "persistence_failed",
            LxError::ReferenceParse { .. } => "invalid_reference",
            LxError::Config(_) => "configuration_error",
            LxError::Internal(_) => "internal_error",
        }
    }
}

/// Validation errors collection keyed by form field
#[derive(Error, Debug, Default, Clone, PartialEq, Eq)]
#[error("{}", self.full_messages().join(", "))]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> messages
    pub errors: BTreeMap<String, Vec<String>>,
    /// Errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Check if there are errors for a specific field
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Get errors for a specific field
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    /// Turn the collection into a result: `Ok` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }
}
