//! Provisioning Service - per-backend infrastructure setup.
//!
//! Given a service configuration record and a project directory, decides
//! how the application will reach its backend and performs the side effects
//! that make it true:
//!
//! 1. Drivers that need no backend are returned untouched.
//! 2. The container strategy writes the compose manifest, starts the
//!    container and polls until it answers.
//! 3. The local strategy fills local defaults. It always succeeds and is
//!    the fallback whenever the container strategy cannot finish.
//!
//! Provisioning never returns an error: every recoverable failure becomes a
//! [`Fallback`] logged at WARN.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{Filesystem, ManifestRenderer, ProcessRunner, Sleeper},
    },
    domain::{
        manifest::{ComposeManifest, RenderVariables},
        services::{ProvisionContext, Readiness, ServiceConfig},
    },
    error::RiggerError,
};

/// Timeouts, retry counts and engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionSettings {
    /// Container engine argv prefix, e.g. `["docker", "compose"]`.
    pub engine: Vec<String>,
    /// Manifest file name relative to the project directory.
    pub manifest_file: String,
    /// Upper bound for `up -d`.
    pub start_timeout: Duration,
    /// Spacing between readiness attempt starts; also each probe's timeout.
    pub poll_interval: Duration,
    pub poll_attempts: u32,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            engine: vec!["docker".to_string(), "compose".to_string()],
            manifest_file: "docker-compose.yml".to_string(),
            start_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(2),
            poll_attempts: 30,
        }
    }
}

impl ProvisionSettings {
    fn engine_command(&self, args: &[&str]) -> Vec<String> {
        self.engine
            .iter()
            .cloned()
            .chain(args.iter().map(|a| a.to_string()))
            .collect()
    }
}

/// Result of one strategy attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome<T> {
    Resolved(T),
    TryNext(Fallback),
}

/// Why the container strategy handed over to the local one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    /// The driver is cloud-managed and has no container image.
    NoContainerImage { driver: &'static str },
    /// No manifest fragment exists for the service key.
    TemplateNotFound { service: String },
    /// The fragment rendered but could not be used.
    TemplateInvalid { service: String, reason: String },
    /// The manifest exists but could not be read or parsed. It is left as-is.
    ManifestUnreadable { path: PathBuf, reason: String },
    ManifestWriteFailed { path: PathBuf, reason: String },
    /// `up -d` exited non-zero, timed out or could not be spawned.
    EngineFailed { service: String },
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoContainerImage { driver } => {
                write!(f, "'{driver}' is cloud-managed and has no container image")
            }
            Self::TemplateNotFound { service } => {
                write!(f, "no manifest template for '{service}'")
            }
            Self::TemplateInvalid { service, reason } => {
                write!(f, "manifest template for '{service}' is invalid: {reason}")
            }
            Self::ManifestUnreadable { path, reason } => {
                write!(f, "cannot read {}: {reason}", path.display())
            }
            Self::ManifestWriteFailed { path, reason } => {
                write!(f, "cannot write {}: {reason}", path.display())
            }
            Self::EngineFailed { service } => {
                write!(f, "container engine failed to start '{service}'")
            }
        }
    }
}

/// What manifest generation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestStatus {
    /// The manifest did not exist and was written.
    Created,
    /// New `section.entry` names were merged into an existing manifest.
    Extended { added: Vec<String> },
    /// `services.<key>` was already present; nothing was written.
    AlreadyDeclared,
}

/// Infrastructure setup orchestrator.
pub struct ProvisioningService {
    runner: Box<dyn ProcessRunner>,
    filesystem: Box<dyn Filesystem>,
    renderer: Box<dyn ManifestRenderer>,
    sleeper: Box<dyn Sleeper>,
    settings: ProvisionSettings,
}

impl ProvisioningService {
    /// Create a provisioning service with default settings.
    pub fn new(
        runner: Box<dyn ProcessRunner>,
        filesystem: Box<dyn Filesystem>,
        renderer: Box<dyn ManifestRenderer>,
        sleeper: Box<dyn Sleeper>,
    ) -> Self {
        Self {
            runner,
            filesystem,
            renderer,
            sleeper,
            settings: ProvisionSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ProvisionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ProvisionSettings {
        &self.settings
    }

    /// Resolve `config` against `project_dir`.
    ///
    /// The returned record replaces the input. Never fails: a container
    /// strategy that cannot finish falls back to local defaults.
    #[instrument(
        skip_all,
        fields(
            backend = %C::KIND,
            driver = config.driver_name(),
            project = %project_dir.display()
        )
    )]
    pub fn provision<C: ServiceConfig>(&self, config: C, project_dir: &Path) -> C {
        if !config.needs_backend() {
            debug!("Driver runs in-process, nothing to provision");
            return config;
        }

        let ctx = ProvisionContext::new(&project_name(project_dir));

        if config.wants_container() {
            match self.try_container(&config, &ctx, project_dir) {
                StrategyOutcome::Resolved(resolved) => {
                    info!(
                        endpoint = %resolved.endpoint(),
                        readiness = %resolved.readiness(),
                        "Backend running in container"
                    );
                    return resolved;
                }
                StrategyOutcome::TryNext(fallback) => {
                    warn!(%fallback, "Container strategy failed, using local installation");
                }
            }
        }

        let resolved = config.with_local_defaults(&ctx);
        info!(endpoint = %resolved.endpoint(), "Using local installation");
        resolved
    }

    /// Containerized strategy: manifest, start, readiness.
    pub fn try_container<C: ServiceConfig>(
        &self,
        config: &C,
        ctx: &ProvisionContext,
        project_dir: &Path,
    ) -> StrategyOutcome<C> {
        let Some(service) = config.container_service() else {
            return StrategyOutcome::TryNext(Fallback::NoContainerImage {
                driver: config.driver_name(),
            });
        };

        let candidate = config.with_container_endpoint(ctx);

        match self.ensure_manifest(service, &candidate.manifest_variables(ctx), project_dir) {
            Ok(status) => debug!(service, ?status, "Manifest ready"),
            Err(fallback) => return StrategyOutcome::TryNext(fallback),
        }

        if !self.start_container(service, project_dir) {
            return StrategyOutcome::TryNext(Fallback::EngineFailed {
                service: service.to_string(),
            });
        }

        let readiness = self.wait_until_ready(service, project_dir);
        StrategyOutcome::Resolved(candidate.with_readiness(readiness))
    }

    /// Make sure the manifest declares `service`, writing it when needed.
    ///
    /// Idempotent: a manifest that already declares the service is not
    /// touched. A manifest that cannot be parsed is never rewritten. New
    /// entries are spliced into the existing text so hand-written comments
    /// survive.
    pub fn ensure_manifest(
        &self,
        service: &str,
        variables: &RenderVariables,
        project_dir: &Path,
    ) -> Result<ManifestStatus, Fallback> {
        let path = project_dir.join(&self.settings.manifest_file);

        let existing = if self.filesystem.exists(&path) {
            Some(self.read_manifest(&path)?)
        } else {
            None
        };

        if existing
            .as_ref()
            .is_some_and(|(_, manifest)| manifest.declares_service(service))
        {
            return Ok(ManifestStatus::AlreadyDeclared);
        }

        let write_failed = |reason: String| Fallback::ManifestWriteFailed {
            path: path.clone(),
            reason,
        };

        let fragment = self.render_fragment(service, variables)?;
        let (text, status) = match existing {
            Some((original, mut manifest)) => {
                let added = manifest.merge_fragment(&fragment);
                let text = manifest
                    .to_yaml_extending(&original, &added)
                    .map_err(|e| write_failed(e.to_string()))?;
                (text, ManifestStatus::Extended { added })
            }
            None => {
                let text = fragment.to_yaml().map_err(|e| write_failed(e.to_string()))?;
                (text, ManifestStatus::Created)
            }
        };

        self.filesystem
            .write_file(&path, &text)
            .map_err(|e| write_failed(e.to_string()))?;

        info!(service, path = %path.display(), "Manifest written");
        Ok(status)
    }

    /// `<engine> up -d <service>` within the start timeout.
    pub fn start_container(&self, service: &str, project_dir: &Path) -> bool {
        let argv = self.settings.engine_command(&["up", "-d", service]);
        debug!(service, "Starting container");
        self.runner
            .succeeds(&argv, project_dir, Some(self.settings.start_timeout))
    }

    /// Poll `<engine> exec -T <service> echo ready` until it succeeds or the
    /// attempts run out.
    ///
    /// Attempt starts are spaced by the poll interval and each probe is
    /// bounded by it, so the poll ends within `interval * attempts`.
    pub fn wait_until_ready(&self, service: &str, project_dir: &Path) -> Readiness {
        let argv = self
            .settings
            .engine_command(&["exec", "-T", service, "echo", "ready"]);
        let interval = self.settings.poll_interval;
        let attempts = self.settings.poll_attempts;

        for attempt in 1..=attempts {
            let started = Instant::now();
            if self.runner.succeeds(&argv, project_dir, Some(interval)) {
                info!(service, attempt, "Backend is ready");
                return Readiness::Confirmed;
            }
            debug!(service, attempt, "Backend not ready yet");

            if attempt < attempts {
                if let Some(remaining) = interval.checked_sub(started.elapsed()) {
                    self.sleeper.sleep(remaining);
                }
            }
        }

        warn!(service, attempts, "Backend did not report ready, assuming it will be");
        Readiness::Assumed
    }

    fn read_manifest(&self, path: &Path) -> Result<(String, ComposeManifest), Fallback> {
        let unreadable = |reason: String| Fallback::ManifestUnreadable {
            path: path.to_path_buf(),
            reason,
        };
        let text = self
            .filesystem
            .read_to_string(path)
            .map_err(|e| unreadable(e.to_string()))?;
        let manifest = ComposeManifest::parse(&text).map_err(|e| unreadable(e.to_string()))?;
        Ok((text, manifest))
    }

    fn render_fragment(
        &self,
        service: &str,
        variables: &RenderVariables,
    ) -> Result<ComposeManifest, Fallback> {
        let text = self
            .renderer
            .render(service, variables)
            .map_err(|e| match e {
                RiggerError::Application(ApplicationError::TemplateNotFound { service }) => {
                    Fallback::TemplateNotFound { service }
                }
                other => Fallback::TemplateInvalid {
                    service: service.to_string(),
                    reason: other.to_string(),
                },
            })?;

        ComposeManifest::parse(&text).map_err(|e| Fallback::TemplateInvalid {
            service: service.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Name of the project directory; `.` and other relative forms resolve
/// against the working directory first.
fn project_name(project_dir: &Path) -> String {
    let resolved = std::path::absolute(project_dir).unwrap_or_else(|_| project_dir.to_path_buf());
    resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
