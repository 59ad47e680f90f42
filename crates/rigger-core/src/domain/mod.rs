//! Core domain layer for rigger.
//!
//! Pure value types and the rules that govern them. All I/O (processes,
//! files, templates, sleeping) is handled via ports defined in the
//! application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or process calls
//! - **No logging**: Only the application layer emits tracing events
//! - **Immutable records**: Every transformation returns a new value
//! - **Serde at the edges**: Operations and manifests are plain data

pub mod common;
pub mod config_ops;
pub mod error;
pub mod manifest;
pub mod services;

pub use common::{RelativePath, project_slug};
pub use config_ops::{ConfigAction, ConfigOperation, ConfigValues, apply_to_tree, config_values};
pub use error::{DomainError, ErrorCategory};
pub use manifest::{ComposeManifest, RenderVariables};
pub use services::{
    BackendKind, CacheConfig, CacheDriver, DatabaseConfig, DatabaseDriver, FieldMap,
    ProvisionContext, QueueConfig, QueueDriver, Readiness, SearchConfig, SearchDriver,
    ServiceConfig, StorageConfig, StorageDriver, field_map,
};
