//! Built-in compose fragment renderer.

use std::path::PathBuf;

use rigger_core::{
    application::{ApplicationError, ports::ManifestRenderer},
    domain::RenderVariables,
    error::RiggerResult,
};
use tracing::{debug, instrument};

use super::fragments;

/// Renders the fragments compiled into rigger.
///
/// With a stubs directory set, `<service>.yml` in that directory replaces the
/// built-in fragment of the same key, and can declare services rigger does
/// not ship.
#[derive(Debug, Clone, Default)]
pub struct BuiltinManifestRenderer {
    stubs_dir: Option<PathBuf>,
}

impl BuiltinManifestRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for overriding fragments in `dir` first.
    pub fn with_stubs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.stubs_dir = Some(dir.into());
        self
    }

    /// Keys with a built-in fragment.
    pub fn services() -> impl Iterator<Item = &'static str> {
        fragments::ALL.iter().map(|(key, _)| *key)
    }

    fn builtin(service_key: &str) -> Option<&'static str> {
        fragments::ALL
            .iter()
            .find(|(key, _)| *key == service_key)
            .map(|(_, fragment)| *fragment)
    }

    fn stub(&self, service_key: &str) -> RiggerResult<Option<String>> {
        let Some(dir) = &self.stubs_dir else {
            return Ok(None);
        };

        let path = dir.join(format!("{service_key}.yml"));
        if !path.is_file() {
            return Ok(None);
        }

        debug!(path = %path.display(), "Using stub override");
        std::fs::read_to_string(&path).map(Some).map_err(|e| {
            ApplicationError::FilesystemError {
                path,
                reason: format!("Failed to read stub: {e}"),
            }
            .into()
        })
    }
}

impl ManifestRenderer for BuiltinManifestRenderer {
    #[instrument(skip_all, fields(service = %service_key))]
    fn render(&self, service_key: &str, variables: &RenderVariables) -> RiggerResult<String> {
        let template = match self.stub(service_key)? {
            Some(text) => text,
            None => Self::builtin(service_key)
                .ok_or_else(|| ApplicationError::TemplateNotFound {
                    service: service_key.to_string(),
                })?
                .to_string(),
        };

        Ok(variables.render(&template))
    }
}
