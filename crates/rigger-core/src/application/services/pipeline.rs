//! Provisioning pipeline - every backend an application declares.
//!
//! Backends are provisioned one after the other in a fixed order
//! (database, cache, queue, search, storage). Each resolved record implies a
//! `set` operation on the environment file; those operations are applied
//! after every backend has been provisioned.

use std::path::Path;

use tracing::{info, instrument};

use crate::{
    application::services::{ConfigService, ProvisioningService},
    domain::{
        common::RelativePath,
        config_ops::{ConfigOperation, ConfigValues},
        services::{
            BackendKind, CacheConfig, DatabaseConfig, QueueConfig, Readiness, SearchConfig,
            ServiceConfig, StorageConfig,
        },
    },
    error::RiggerResult,
};

/// Default environment file operations target.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// The backends an application asked for. Absent kinds are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfrastructurePlan {
    pub database: Option<DatabaseConfig>,
    pub cache: Option<CacheConfig>,
    pub queue: Option<QueueConfig>,
    pub search: Option<SearchConfig>,
    pub storage: Option<StorageConfig>,
}

impl InfrastructurePlan {
    pub fn is_empty(&self) -> bool {
        self.summaries().is_empty()
    }

    /// One line per requested backend, before provisioning.
    pub fn summaries(&self) -> Vec<ServiceSummary> {
        let mut out = Vec::new();
        push_summary(&mut out, self.database.as_ref());
        push_summary(&mut out, self.cache.as_ref());
        push_summary(&mut out, self.queue.as_ref());
        push_summary(&mut out, self.search.as_ref());
        push_summary(&mut out, self.storage.as_ref());
        out
    }

    /// Environment operations the records imply as given.
    pub fn env_operations(&self, env_file: &RelativePath) -> Vec<ConfigOperation> {
        let mut entries = Vec::new();
        push_env(&mut entries, env_file, self.database.as_ref());
        push_env(&mut entries, env_file, self.cache.as_ref());
        push_env(&mut entries, env_file, self.queue.as_ref());
        push_env(&mut entries, env_file, self.search.as_ref());
        push_env(&mut entries, env_file, self.storage.as_ref());
        ConfigOperation::set_bulk(entries)
    }
}

/// Display row for one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSummary {
    pub kind: BackendKind,
    pub driver: &'static str,
    pub endpoint: String,
    pub container: bool,
    pub readiness: Readiness,
}

impl ServiceSummary {
    pub fn of<C: ServiceConfig>(config: &C) -> Self {
        Self {
            kind: C::KIND,
            driver: config.driver_name(),
            endpoint: config.endpoint(),
            container: config.wants_container(),
            readiness: config.readiness(),
        }
    }
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Resolved records, replacing the requested ones.
    pub resolved: InfrastructurePlan,
    /// Environment operations derived from the resolved records.
    pub env_operations: Vec<ConfigOperation>,
    /// How many of them were written (zero when env writing is off).
    pub applied: usize,
}

/// Runs [`ProvisioningService`] over a plan, then writes the environment.
pub struct ProvisioningPipeline {
    provisioning: ProvisioningService,
    config: ConfigService,
    env_file: Option<RelativePath>,
}

impl ProvisioningPipeline {
    pub fn new(provisioning: ProvisioningService, config: ConfigService) -> Self {
        Self {
            provisioning,
            config,
            env_file: Some(RelativePath::from(DEFAULT_ENV_FILE)),
        }
    }

    /// Environment file to write, or `None` to skip writing it.
    pub fn with_env_file(mut self, env_file: Option<RelativePath>) -> Self {
        self.env_file = env_file;
        self
    }

    #[instrument(skip_all, fields(project = %project_dir.display()))]
    pub fn run(
        &self,
        plan: InfrastructurePlan,
        project_dir: &Path,
    ) -> RiggerResult<PipelineReport> {
        let resolved = InfrastructurePlan {
            database: plan.database.map(|c| self.provisioning.provision(c, project_dir)),
            cache: plan.cache.map(|c| self.provisioning.provision(c, project_dir)),
            queue: plan.queue.map(|c| self.provisioning.provision(c, project_dir)),
            search: plan.search.map(|c| self.provisioning.provision(c, project_dir)),
            storage: plan.storage.map(|c| self.provisioning.provision(c, project_dir)),
        };

        let env_file = self
            .env_file
            .clone()
            .unwrap_or_else(|| RelativePath::from(DEFAULT_ENV_FILE));
        let env_operations = resolved.env_operations(&env_file);

        let applied = match &self.env_file {
            Some(_) => self.config.apply(project_dir, &env_operations)?,
            None => 0,
        };

        info!(
            backends = resolved.summaries().len(),
            applied, "Provisioning pipeline finished"
        );

        Ok(PipelineReport {
            resolved,
            env_operations,
            applied,
        })
    }
}

fn push_summary<C: ServiceConfig>(out: &mut Vec<ServiceSummary>, config: Option<&C>) {
    if let Some(config) = config {
        out.push(ServiceSummary::of(config));
    }
}

fn push_env<C: ServiceConfig>(
    out: &mut Vec<(RelativePath, ConfigValues)>,
    env_file: &RelativePath,
    config: Option<&C>,
) {
    if let Some(config) = config {
        out.push((env_file.clone(), config.env_values()));
    }
}
