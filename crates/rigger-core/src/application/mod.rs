//! Application layer for rigger.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (ProvisioningService, ConfigService, ProvisioningPipeline)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! business rules itself. Records, manifests and operation semantics live in
//! `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

pub use services::{
    ConfigService, Fallback, InfrastructurePlan, ManifestStatus, PipelineReport,
    ProvisionSettings, ProvisioningPipeline, ProvisioningService, ServiceSummary,
    StrategyOutcome,
};

pub use ports::{ConfigWriter, Filesystem, ManifestRenderer, ProcessRunner, Sleeper};

pub use error::ApplicationError;
