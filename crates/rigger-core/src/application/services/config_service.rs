//! Config Service - applies configuration operations.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::{
    application::{ApplicationError, ports::ConfigWriter},
    domain::config_ops::ConfigOperation,
    error::RiggerResult,
};

/// Hands operations to the [`ConfigWriter`] port, in order.
pub struct ConfigService {
    writer: Box<dyn ConfigWriter>,
}

impl ConfigService {
    pub fn new(writer: Box<dyn ConfigWriter>) -> Self {
        Self { writer }
    }

    /// Apply `operations` to files under `project_root`.
    ///
    /// Stops at the first failing operation; earlier ones stay applied.
    /// Returns the number of operations applied.
    #[instrument(skip_all, fields(project = %project_root.display(), count = operations.len()))]
    pub fn apply(
        &self,
        project_root: &Path,
        operations: &[ConfigOperation],
    ) -> RiggerResult<usize> {
        for operation in operations {
            debug!(%operation, "Applying");
            self.writer.apply(project_root, operation)?;
        }

        info!("Configuration operations applied");
        Ok(operations.len())
    }

    /// Decode a JSON array of operations.
    pub fn decode(document: &str) -> RiggerResult<Vec<ConfigOperation>> {
        serde_json::from_str(document).map_err(|e| {
            ApplicationError::InvalidOperations {
                reason: e.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockConfigWriter;
    use crate::domain::config_ops::{ConfigAction, config_values};
    use mockall::Sequence;
    use std::path::PathBuf;

    #[test]
    fn applies_in_construction_order() {
        let mut seq = Sequence::new();
        let mut writer = MockConfigWriter::new();
        for file in [".env", "package.json", ".env"] {
            writer
                .expect_apply()
                .withf(move |_, op| op.file().to_string() == file)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }

        let ops = vec![
            ConfigOperation::set(".env", config_values([("APP_ENV", "local")])),
            ConfigOperation::merge("package.json", config_values([("private", true)])),
            ConfigOperation::append(".env", config_values([("APP_DEBUG", "true")])),
        ];

        let applied = ConfigService::new(Box::new(writer))
            .apply(&PathBuf::from("/work/shop"), &ops)
            .unwrap();
        assert_eq!(applied, 3);
    }

    #[test]
    fn stops_at_first_failure() {
        let mut writer = MockConfigWriter::new();
        writer.expect_apply().times(1).returning(|_, op| {
            Err(ApplicationError::UnsupportedFormat {
                path: op.file().as_path().to_path_buf(),
            }
            .into())
        });

        let ops = vec![
            ConfigOperation::set("settings.ini", config_values([("a", 1)])),
            ConfigOperation::set(".env", config_values([("A", "1")])),
        ];

        let err = ConfigService::new(Box::new(writer))
            .apply(Path::new("/work/shop"), &ops)
            .unwrap_err();
        assert!(err.to_string().contains("settings.ini"));
    }

    #[test]
    fn decodes_operation_documents() {
        let ops = ConfigService::decode(
            r#"[
                {"action": "set", "file": ".env", "values": {"APP_NAME": "shop"}},
                {"action": "merge", "file": "composer.json", "values": {"require": {"php": "^8.3"}}}
            ]"#,
        )
        .unwrap();

        assert_eq!(ops.len(), 2);
        assert_eq!(ops[1].action(), ConfigAction::Merge);
    }

    #[test]
    fn rejects_absolute_targets_and_bad_actions() {
        let absolute = r#"[{"action": "set", "file": "/etc/hosts", "values": {}}]"#;
        let unknown = r#"[{"action": "replace", "file": ".env", "values": {}}]"#;
        assert!(ConfigService::decode(absolute).is_err());
        assert!(ConfigService::decode(unknown).is_err());
    }
}
