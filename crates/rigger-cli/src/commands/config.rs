//! `rigger config`: read and write configuration values.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    cli::{ConfigCommands, GlobalArgs},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Keys whose value is a whitespace-separated list.
const LIST_KEYS: [&str; 1] = ["provisioning.engine"];

/// Dispatch to the correct config subcommand.
#[instrument(skip_all)]
pub fn execute(
    cmd: ConfigCommands,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    match cmd {
        ConfigCommands::Get { key } => {
            let value = get_config_value(&config, &key)?;
            output.print(&value)?;
        }

        ConfigCommands::Set { key, value } => {
            let path = AppConfig::active_path(global.config.as_ref());
            set_config_value(&path, &key, &value)?;
            output.success(&format!("Set {key} = {value} in {}", path.display()))?;
        }

        ConfigCommands::List => {
            output.header("Current Configuration:")?;
            let serialised = toml::to_string_pretty(&config).map_err(|e| {
                config_error(format!("Failed to serialise config: {e}"), Some(Box::new(e)))
            })?;
            output.print(&serialised)?;
        }

        ConfigCommands::Path => {
            output.print(&AppConfig::active_path(global.config.as_ref()).display().to_string())?;
        }
    }

    Ok(())
}

// ── helpers ───────────────────────────────────────────────────────────────────

fn get_config_value(config: &AppConfig, key: &str) -> CliResult<String> {
    let tree = serde_json::to_value(config)
        .map_err(|e| config_error(format!("Failed to serialise config: {e}"), Some(Box::new(e))))?;

    let value = lookup(&tree, key).ok_or_else(|| unknown_key(key))?;
    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map_or_else(|| item.to_string(), str::to_owned))
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    })
}

fn lookup<'a>(tree: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(tree, |node, segment| node.get(segment))
}

/// Write `key = raw` into the TOML file at `path`, creating it if needed.
fn set_config_value(path: &Path, key: &str, raw: &str) -> CliResult<()> {
    let (section, field) = key.split_once('.').ok_or_else(|| unknown_key(key))?;

    let defaults = serde_json::to_value(AppConfig::default())
        .map_err(|e| config_error(format!("Failed to serialise config: {e}"), Some(Box::new(e))))?;
    let known = defaults
        .get(section)
        .and_then(Value::as_object)
        .is_some_and(|fields| fields.contains_key(field) || key == "provisioning.stubs_dir");
    if !known {
        return Err(unknown_key(key));
    }

    let mut table = read_table(path)?;
    let section_table = table
        .entry(section)
        .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    let toml::Value::Table(section_table) = section_table else {
        return Err(config_error(
            format!("'{section}' in {} is not a table", path.display()),
            None,
        ));
    };
    section_table.insert(field.to_string(), typed_value(key, raw));

    let text = toml::to_string_pretty(&table)
        .map_err(|e| config_error(format!("Failed to serialise config: {e}"), Some(Box::new(e))))?;
    AppConfig::parse(&text).map_err(|e| {
        config_error(format!("'{key}' does not accept '{raw}': {e:#}"), None)
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_cli_context(|| {
            format!("Failed to create config directory '{}'", parent.display())
        })?;
    }
    std::fs::write(path, text)
        .with_cli_context(|| format!("Failed to write config to '{}'", path.display()))?;
    debug!(key, path = %path.display(), "Config value updated");
    Ok(())
}

fn read_table(path: &Path) -> CliResult<toml::Table> {
    if !path.exists() {
        return Ok(toml::Table::new());
    }
    let text = std::fs::read_to_string(path)
        .with_cli_context(|| format!("Failed to read config '{}'", path.display()))?;
    toml::from_str(&text).map_err(|e| {
        config_error(format!("'{}' is not valid TOML", path.display()), Some(Box::new(e)))
    })
}

fn typed_value(key: &str, raw: &str) -> toml::Value {
    if LIST_KEYS.contains(&key) {
        return toml::Value::Array(
            raw.split_whitespace()
                .map(|part| toml::Value::String(part.to_string()))
                .collect(),
        );
    }
    match raw {
        "true" => toml::Value::Boolean(true),
        "false" => toml::Value::Boolean(false),
        _ => raw
            .parse::<i64>()
            .map_or_else(|_| toml::Value::String(raw.to_string()), toml::Value::Integer),
    }
}

fn unknown_key(key: &str) -> CliError {
    config_error(format!("Unknown config key: '{key}'"), None)
}

fn config_error(
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
) -> CliError {
    CliError::ConfigError { message, source }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_scalar_and_list_keys() {
        let cfg = AppConfig::default();
        assert_eq!(get_config_value(&cfg, "provisioning.poll_attempts").unwrap(), "30");
        assert_eq!(get_config_value(&cfg, "provisioning.engine").unwrap(), "docker compose");
        assert_eq!(get_config_value(&cfg, "env.file").unwrap(), ".env");
        assert_eq!(get_config_value(&cfg, "output.no_color").unwrap(), "false");
    }

    #[test]
    fn get_unknown_key_is_error() {
        let cfg = AppConfig::default();
        assert!(matches!(
            get_config_value(&cfg, "does.not.exist"),
            Err(CliError::ConfigError { .. })
        ));
    }

    #[test]
    fn set_creates_file_with_typed_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        set_config_value(&path, "provisioning.use_containers", "false").unwrap();
        set_config_value(&path, "provisioning.poll_attempts", "5").unwrap();
        set_config_value(&path, "provisioning.engine", "podman compose").unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert!(!cfg.provisioning.use_containers);
        assert_eq!(cfg.provisioning.poll_attempts, 5);
        assert_eq!(cfg.provisioning.engine, ["podman", "compose"]);
    }

    #[test]
    fn set_keeps_unrelated_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[env]\nfile = \".env.local\"\n").unwrap();

        set_config_value(&path, "env.write", "false").unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.env.file, ".env.local");
        assert!(!cfg.env.write);
    }

    #[test]
    fn set_rejects_mistyped_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let err = set_config_value(&path, "provisioning.poll_attempts", "many").unwrap_err();
        assert!(matches!(err, CliError::ConfigError { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn set_unknown_key_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let err = set_config_value(&path, "provisioning.colour", "blue").unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(!path.exists());
    }
}
