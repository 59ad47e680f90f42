//! Service configuration records.
//!
//! One immutable record per backend kind an application can depend on:
//!
//! | Kind     | Record            |
//! |----------|-------------------|
//! | database | [`DatabaseConfig`] |
//! | cache    | [`CacheConfig`]    |
//! | queue    | [`QueueConfig`]    |
//! | search   | [`SearchConfig`]   |
//! | storage  | [`StorageConfig`]  |
//!
//! Records never change after construction. Every transformation
//! (`with_local_defaults`, `with_container_endpoint`, `with_readiness`)
//! returns a new record; the provisioning service hands the new one back to
//! its caller and the input is dropped.
//!
//! The [`ServiceConfig`] trait is the seam the generic provisioning service
//! works through, so adding a backend kind means adding a record here and
//! a manifest fragment in the adapters. Nothing else changes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{
    common::project_slug, config_ops::ConfigValues, error::DomainError,
    manifest::RenderVariables,
};

pub mod cache;
pub mod database;
pub mod fields;
pub mod queue;
pub mod search;
pub mod storage;

pub use cache::{CacheConfig, CacheDriver};
pub use database::{DatabaseConfig, DatabaseDriver};
pub use fields::{FieldMap, field_map};
pub use queue::{QueueConfig, QueueDriver};
pub use search::{SearchConfig, SearchDriver};
pub use storage::{StorageConfig, StorageDriver};

/// Host every local default points at.
pub const LOCAL_HOST: &str = "127.0.0.1";
/// Region used for cloud-managed drivers when none was given.
pub const DEFAULT_REGION: &str = "us-east-1";
/// Credentials written into container manifests when the caller gave none.
pub const CONTAINER_USERNAME: &str = "rigger";
pub const CONTAINER_PASSWORD: &str = "password";

// ── BackendKind ───────────────────────────────────────────────────────────────

/// Category of infrastructure an application may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Database,
    Cache,
    Queue,
    Search,
    Storage,
}

impl BackendKind {
    pub const ALL: [BackendKind; 5] = [
        Self::Database,
        Self::Cache,
        Self::Queue,
        Self::Search,
        Self::Storage,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Cache => "cache",
            Self::Queue => "queue",
            Self::Search => "search",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Readiness ─────────────────────────────────────────────────────────────────

/// Whether a containerized backend answered the readiness probe.
///
/// `Assumed` means the poll ran out of attempts: the endpoint is the
/// intended one but may not accept connections yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Readiness {
    #[default]
    NotChecked,
    Confirmed,
    Assumed,
}

impl Readiness {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotChecked => "not-checked",
            Self::Confirmed => "confirmed",
            Self::Assumed => "assumed",
        }
    }

    /// `NotChecked` is the default and is omitted from mappings.
    pub(crate) fn serialized(&self) -> Option<&'static str> {
        match self {
            Self::NotChecked => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Readiness {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not-checked" | "" => Ok(Self::NotChecked),
            "confirmed" => Ok(Self::Confirmed),
            "assumed" => Ok(Self::Assumed),
            other => Err(DomainError::invalid(
                "readiness",
                other,
                "expected not-checked, confirmed or assumed",
            )),
        }
    }
}

// ── ProvisionContext ──────────────────────────────────────────────────────────

/// Per-project facts the records need when filling defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionContext {
    slug: String,
}

impl ProvisionContext {
    /// Build from the project directory name (normalized with [`project_slug`]).
    pub fn new(project_name: &str) -> Self {
        Self {
            slug: project_slug(project_name),
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }
}

// ── ServiceConfig ─────────────────────────────────────────────────────────────

/// Behaviour shared by every service configuration record.
pub trait ServiceConfig: Clone + fmt::Debug + PartialEq + Sized {
    /// The backend kind this record configures.
    const KIND: BackendKind;

    /// Build a record from a flat mapping.
    ///
    /// Fails with [`DomainError::MissingField`] naming the first absent
    /// required key, or [`DomainError::InvalidField`] when a value cannot be
    /// coerced. Never returns a partially populated record.
    fn from_mapping(map: &FieldMap) -> Result<Self, DomainError>;

    /// Serialize every field that is set. Optional fields are omitted when
    /// unset; the `docker` flag is always present.
    fn to_mapping(&self) -> FieldMap;

    /// Driver name as it appears in mappings.
    fn driver_name(&self) -> &'static str;

    /// `false` for in-process drivers (sync queue, array cache, ...).
    fn needs_backend(&self) -> bool;

    /// Managed container flag.
    fn wants_container(&self) -> bool;

    /// Manifest service key for drivers that run in a container.
    fn container_service(&self) -> Option<&'static str>;

    fn readiness(&self) -> Readiness;

    fn with_readiness(self, readiness: Readiness) -> Self;

    /// Containerized resolution: `docker = true`, defaults only for unset
    /// fields, auxiliary ports always set.
    fn with_container_endpoint(&self, ctx: &ProvisionContext) -> Self;

    /// Local resolution: `docker = false`, defaults only for unset fields.
    fn with_local_defaults(&self, ctx: &ProvisionContext) -> Self;

    /// Variables for the manifest fragment of [`Self::container_service`].
    fn manifest_variables(&self, ctx: &ProvisionContext) -> RenderVariables;

    /// Environment entries implied by this record.
    fn env_values(&self) -> ConfigValues;

    /// Short human-readable endpoint, e.g. `redis:6379`.
    fn endpoint(&self) -> String;
}

pub(crate) fn host_port(host: Option<&String>, port: Option<u16>) -> String {
    match (host, port) {
        (Some(h), Some(p)) => format!("{h}:{p}"),
        (Some(h), None) => h.clone(),
        (None, Some(p)) => format!(":{p}"),
        (None, None) => "-".to_string(),
    }
}

pub(crate) fn or_default(value: &Option<String>, default: impl Into<String>) -> Option<String> {
    Some(value.clone().unwrap_or_else(|| default.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readiness_parses_and_omits_default() {
        assert_eq!("confirmed".parse::<Readiness>().unwrap(), Readiness::Confirmed);
        assert_eq!("ASSUMED".parse::<Readiness>().unwrap(), Readiness::Assumed);
        assert!("ready".parse::<Readiness>().is_err());
        assert_eq!(Readiness::NotChecked.serialized(), None);
        assert_eq!(Readiness::Assumed.serialized(), Some("assumed"));
    }

    #[test]
    fn context_normalizes_project_name() {
        assert_eq!(ProvisionContext::new("My Shop").slug(), "my-shop");
    }

    #[test]
    fn backend_kind_display() {
        let names: Vec<_> = BackendKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(names, ["database", "cache", "queue", "search", "storage"]);
    }
}
