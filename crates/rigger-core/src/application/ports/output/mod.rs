//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what provisioning needs from the outside world.
//! The `rigger-adapters` crate provides implementations.

use std::path::Path;
use std::time::Duration;

use crate::domain::{config_ops::ConfigOperation, manifest::RenderVariables};
use crate::error::RiggerResult;

/// Port for running external commands.
///
/// Implemented by:
/// - `rigger_adapters::process::SystemProcessRunner` (production)
/// - `rigger_adapters::process::ScriptedProcessRunner` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait ProcessRunner: Send + Sync {
    /// Run `argv` in `working_dir`.
    ///
    /// `true` only for a zero exit within `timeout`. Spawn failures, non-zero
    /// exits and timeouts are all `false`; callers never see an error.
    fn succeeds(&self, argv: &[String], working_dir: &Path, timeout: Option<Duration>) -> bool;
}

/// Port for filesystem operations.
///
/// Implemented by:
/// - `rigger_adapters::filesystem::LocalFilesystem` (production)
/// - `rigger_adapters::filesystem::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Read a UTF-8 file.
    fn read_to_string(&self, path: &Path) -> RiggerResult<String>;

    /// Write content to a file, replacing it.
    fn write_file(&self, path: &Path, content: &str) -> RiggerResult<()>;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> RiggerResult<()>;
}

/// Port for compose manifest fragments.
///
/// Implemented by `rigger_adapters::renderer::BuiltinManifestRenderer`.
#[cfg_attr(test, mockall::automock)]
pub trait ManifestRenderer: Send + Sync {
    /// Render the fragment declaring `service_key`.
    ///
    /// Fails with `ApplicationError::TemplateNotFound` when no fragment
    /// exists for the key.
    fn render(&self, service_key: &str, variables: &RenderVariables) -> RiggerResult<String>;
}

/// Port for applying configuration operations to files.
///
/// Implemented by `rigger_adapters::config_writer::FileConfigWriter`.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigWriter: Send + Sync {
    /// Apply one operation to the file it names, relative to `project_root`.
    fn apply(&self, project_root: &Path, operation: &ConfigOperation) -> RiggerResult<()>;
}

/// Port for the blocking wait between readiness attempts.
#[cfg_attr(test, mockall::automock)]
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}
