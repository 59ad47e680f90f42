// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (records are rebuilt from user input on retry)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    // ========================================================================
    // Record construction
    // ========================================================================
    #[error("required field missing: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value '{value}' for field '{field}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    // ========================================================================
    // Manifests
    // ========================================================================
    #[error("invalid compose manifest: {reason}")]
    InvalidManifest { reason: String },

    // ========================================================================
    // Paths
    // ========================================================================
    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },
}

impl DomainError {
    pub(crate) fn invalid(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MissingField { field } => vec![
                format!("Provide a value for '{field}'"),
                "Every backend needs at least a driver, e.g. driver=redis".into(),
            ],
            Self::InvalidField { field, reason, .. } => vec![
                format!("Fix the value of '{field}': {reason}"),
                "Run with --help to see accepted drivers".into(),
            ],
            Self::InvalidManifest { reason } => vec![
                format!("The compose manifest could not be parsed: {reason}"),
                "Fix the YAML by hand; rigger never overwrites an unreadable manifest".into(),
            ],
            Self::AbsolutePathNotAllowed { path } => vec![
                format!("'{path}' must be relative to the project root"),
                "Drop the leading '/'".into(),
            ],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingField { .. } | Self::InvalidField { .. } => ErrorCategory::Validation,
            Self::AbsolutePathNotAllowed { .. } => ErrorCategory::Validation,
            Self::InvalidManifest { .. } => ErrorCategory::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Internal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_names_the_key() {
        let err = DomainError::MissingField { field: "driver" };
        assert_eq!(err.to_string(), "required field missing: driver");
        assert!(err.suggestions()[0].contains("driver"));
    }

    #[test]
    fn invalid_field_is_validation() {
        let err = DomainError::invalid("port", "abc", "not a port number");
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.to_string().contains("abc"));
    }
}
