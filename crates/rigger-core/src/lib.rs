//! rigger core - hexagonal architecture implementation
//!
//! This crate provides the domain and application layers for rigger's
//! infrastructure provisioning, following hexagonal (ports and adapters)
//! architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            rigger-cli (CLI)             │
//! │      (Implements Driving Ports)         │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │          Application Services           │
//! │ (ProvisioningPipeline, ConfigService)   │
//! │          Orchestrates Use Cases         │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │       Application Ports (Traits)        │
//! │ (ProcessRunner, Filesystem, Renderer,   │
//! │       ConfigWriter, Sleeper)            │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     rigger-adapters (Infrastructure)    │
//! │ (SystemProcessRunner, FileConfigWriter) │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │        Domain Layer (Pure Logic)        │
//! │ (service records, ComposeManifest,      │
//! │           ConfigOperation)              │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rigger_core::prelude::*;
//!
//! # fn run(service: ProvisioningService) -> RiggerResult<()> {
//! let cache = CacheConfig::from_mapping(&field_map([("driver", "redis"), ("docker", "true")]))?;
//! let resolved = service.provision(cache, std::path::Path::new("./shop"));
//! println!("{}", resolved.endpoint());
//! # Ok(())
//! # }
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        ConfigService, Fallback, InfrastructurePlan, ProvisionSettings, ProvisioningPipeline,
        ProvisioningService, ServiceSummary, StrategyOutcome,
        ports::{ConfigWriter, Filesystem, ManifestRenderer, ProcessRunner, Sleeper},
    };
    pub use crate::domain::{
        BackendKind, CacheConfig, CacheDriver, ComposeManifest, ConfigAction, ConfigOperation,
        ConfigValues, DatabaseConfig, DatabaseDriver, FieldMap, QueueConfig, QueueDriver,
        Readiness, RelativePath, RenderVariables, SearchConfig, SearchDriver, ServiceConfig,
        StorageConfig, StorageDriver, config_values, field_map,
    };
    pub use crate::error::{RiggerError, RiggerResult};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
