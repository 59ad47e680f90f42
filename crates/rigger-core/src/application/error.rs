//! Application layer errors.
//!
//! These errors represent failures in orchestration and I/O, not business
//! rules. Business rule violations are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur while driving ports.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// No manifest fragment exists for a service key.
    #[error("No manifest template for service '{service}'")]
    TemplateNotFound { service: String },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// The configuration writer does not know the file's format.
    #[error("Unsupported configuration format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// A value cannot be represented in the target format.
    #[error("Cannot write '{key}' to {path}: {reason}")]
    UnsupportedValue {
        path: PathBuf,
        key: String,
        reason: String,
    },

    /// An existing configuration file could not be parsed or serialized.
    #[error("Failed to process {path}: {reason}")]
    WriterError { path: PathBuf, reason: String },

    /// An operations document could not be decoded.
    #[error("Invalid operations document: {reason}")]
    InvalidOperations { reason: String },

    /// In-memory adapter state is unavailable (lock poisoned).
    #[error("Adapter state lock poisoned")]
    StoreLockError,
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::TemplateNotFound { service } => vec![
                format!("No built-in compose fragment for '{service}'"),
                "Use --no-docker to provision against a local installation".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
                "Ensure the parent directory exists".into(),
            ],
            Self::UnsupportedFormat { path } => vec![
                format!("Cannot edit {}", path.display()),
                "Supported: .env files, .json, .yaml/.yml and .toml".into(),
            ],
            Self::UnsupportedValue { key, .. } => vec![
                format!("'{key}' holds a nested value"),
                "Environment files only take scalar values".into(),
            ],
            Self::WriterError { path, .. } => vec![
                format!("Check that {} is well-formed", path.display()),
            ],
            Self::InvalidOperations { .. } => vec![
                "Expected a JSON array of {\"action\", \"file\", \"values\"} objects".into(),
                "action must be one of set, append or merge".into(),
            ],
            Self::StoreLockError => vec!["Try again in a moment".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TemplateNotFound { .. } => ErrorCategory::NotFound,
            Self::UnsupportedFormat { .. }
            | Self::UnsupportedValue { .. }
            | Self::InvalidOperations { .. } => ErrorCategory::Validation,
            Self::FilesystemError { .. } | Self::WriterError { .. } | Self::StoreLockError => {
                ErrorCategory::Internal
            }
        }
    }
}
