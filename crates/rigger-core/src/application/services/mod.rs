//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "provision a cache" or "apply these edits".

pub mod config_service;
pub mod pipeline;
pub mod provisioning_service;

pub use config_service::ConfigService;
pub use pipeline::{
    DEFAULT_ENV_FILE, InfrastructurePlan, PipelineReport, ProvisioningPipeline, ServiceSummary,
};
pub use provisioning_service::{
    Fallback, ManifestStatus, ProvisionSettings, ProvisioningService, StrategyOutcome,
};
