//! Applies configuration operations to project files.
//!
//! The format is chosen from the file name:
//!
//! | File | Format |
//! |------|--------|
//! | `.env`, `.env.*`, `*.env` | `KEY=VALUE` lines |
//! | `*.json` | JSON object |
//! | `*.yaml`, `*.yml` | YAML mapping |
//! | `*.toml` | TOML table |
//!
//! JSON and YAML files are read into a `serde_json` tree, changed with
//! [`apply_to_tree`], then written back. TOML files stay `toml::Table`s so
//! datetimes and other TOML-only values survive; only the incoming values
//! are converted. Env files keep every line they do not change, comments
//! and `export` prefixes included, and gain new keys at the end.

use std::path::{Path, PathBuf};

use rigger_core::{
    application::{ApplicationError, ports::{ConfigWriter, Filesystem}},
    domain::{ConfigAction, ConfigOperation, ConfigValues, RelativePath, apply_to_tree},
    error::{RiggerError, RiggerResult},
};
use serde_json::Value;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Env,
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    fn detect(file: &RelativePath) -> Option<Self> {
        let name = file.file_name()?;
        if name == ".env" || name.starts_with(".env.") {
            return Some(Self::Env);
        }

        match file.extension()?.as_str() {
            "env" => Some(Self::Env),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// [`ConfigWriter`] over any [`Filesystem`].
#[derive(Debug, Clone)]
pub struct FileConfigWriter<F: Filesystem> {
    filesystem: F,
}

impl<F: Filesystem> FileConfigWriter<F> {
    pub fn new(filesystem: F) -> Self {
        Self { filesystem }
    }

    fn read_existing(&self, path: &Path) -> RiggerResult<Option<String>> {
        if self.filesystem.exists(path) {
            self.filesystem.read_to_string(path).map(Some)
        } else {
            Ok(None)
        }
    }
}

impl<F: Filesystem> ConfigWriter for FileConfigWriter<F> {
    #[instrument(skip_all, fields(file = %operation.file(), action = %operation.action()))]
    fn apply(&self, project_root: &Path, operation: &ConfigOperation) -> RiggerResult<()> {
        let path = project_root.join(operation.file());
        let format = FileFormat::detect(operation.file())
            .ok_or_else(|| ApplicationError::UnsupportedFormat { path: path.clone() })?;

        let existing = self.read_existing(&path)?;
        debug!(?format, exists = existing.is_some(), "Applying operation");

        let existing = existing.unwrap_or_default();
        let action = operation.action();
        let values = operation.values();

        let updated = match format {
            FileFormat::Env => env::apply(&path, &existing, action, values)?,
            FileFormat::Json => {
                let mut tree = parse_tree(&path, &existing, |text| {
                    serde_json::from_str(text).map_err(|e| e.to_string())
                })?;
                apply_to_tree(action, &mut tree, values);
                let mut text = serde_json::to_string_pretty(&Value::Object(tree))
                    .map_err(|e| writer_error(&path, e))?;
                text.push('\n');
                text
            }
            FileFormat::Yaml => {
                let mut tree = parse_tree(&path, &existing, |text| {
                    serde_yaml::from_str(text).map_err(|e| e.to_string())
                })?;
                apply_to_tree(action, &mut tree, values);
                serde_yaml::to_string(&Value::Object(tree)).map_err(|e| writer_error(&path, e))?
            }
            FileFormat::Toml => toml_file::apply(&path, &existing, action, values)?,
        };

        self.filesystem.write_file(&path, &updated)
    }
}

/// Parse `text` into a map; blank files are empty maps.
fn parse_tree(
    path: &Path,
    text: &str,
    parse: impl FnOnce(&str) -> Result<Value, String>,
) -> RiggerResult<ConfigValues> {
    if text.trim().is_empty() {
        return Ok(ConfigValues::new());
    }

    match parse(text).map_err(|reason| writer_error(path, reason))? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(ConfigValues::new()),
        _ => Err(writer_error(path, "top level must be a mapping")),
    }
}

fn reject_nulls(path: &Path, values: &ConfigValues) -> RiggerResult<()> {
    fn has_null(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Array(items) => items.iter().any(has_null),
            Value::Object(map) => map.values().any(has_null),
            _ => false,
        }
    }

    match values.iter().find(|(_, value)| has_null(value)) {
        Some((key, _)) => Err(ApplicationError::UnsupportedValue {
            path: path.to_path_buf(),
            key: key.clone(),
            reason: "TOML has no null".into(),
        }
        .into()),
        None => Ok(()),
    }
}

fn writer_error(path: &Path, reason: impl ToString) -> RiggerError {
    ApplicationError::WriterError {
        path: PathBuf::from(path),
        reason: reason.to_string(),
    }
    .into()
}

mod toml_file {
    use super::*;
    use toml::{Table, Value as TomlValue};

    /// Same semantics as [`apply_to_tree`], on native TOML values.
    pub(super) fn apply(
        path: &Path,
        existing: &str,
        action: ConfigAction,
        values: &ConfigValues,
    ) -> RiggerResult<String> {
        reject_nulls(path, values)?;

        let mut table: Table = if existing.trim().is_empty() {
            Table::new()
        } else {
            toml::from_str(existing).map_err(|e| writer_error(path, e))?
        };

        for (key, value) in values {
            let incoming = TomlValue::try_from(value).map_err(|e| writer_error(path, e))?;
            match action {
                ConfigAction::Set => {
                    table.insert(key.clone(), incoming);
                }
                ConfigAction::Append => {
                    if !table.contains_key(key) {
                        table.insert(key.clone(), incoming);
                    }
                }
                ConfigAction::Merge => match table.get_mut(key) {
                    Some(current) => merge_value(current, incoming),
                    None => {
                        table.insert(key.clone(), incoming);
                    }
                },
            }
        }

        toml::to_string(&table).map_err(|e| writer_error(path, e))
    }

    fn merge_value(current: &mut TomlValue, incoming: TomlValue) {
        match (current, incoming) {
            (TomlValue::Table(current), TomlValue::Table(new)) => {
                for (key, value) in new {
                    match current.get_mut(&key) {
                        Some(slot) => merge_value(slot, value),
                        None => {
                            current.insert(key, value);
                        }
                    }
                }
            }
            (TomlValue::Array(current), TomlValue::Array(new)) => {
                for item in new {
                    if !current.contains(&item) {
                        current.push(item);
                    }
                }
            }
            (slot, new) => *slot = new,
        }
    }
}

mod env {
    use super::*;

    enum Line {
        Entry {
            key: String,
            raw: String,
            exported: bool,
        },
        Other(String),
    }

    pub(super) fn apply(
        path: &Path,
        existing: &str,
        action: ConfigAction,
        values: &ConfigValues,
    ) -> RiggerResult<String> {
        for (key, value) in values {
            if matches!(value, Value::Array(_) | Value::Object(_)) {
                return Err(ApplicationError::UnsupportedValue {
                    path: path.to_path_buf(),
                    key: key.clone(),
                    reason: "env files hold flat values only".into(),
                }
                .into());
            }
        }

        let lines: Vec<Line> = existing.lines().map(parse_line).collect();

        let mut before = ConfigValues::new();
        for line in &lines {
            if let Line::Entry { key, raw, .. } = line {
                before.insert(key.clone(), Value::String(unquote(value_part(raw))));
            }
        }

        let mut after = before.clone();
        apply_to_tree(action, &mut after, values);

        let mut out = String::with_capacity(existing.len() + 64);
        for line in &lines {
            match line {
                Line::Entry { key, exported, .. } if after.get(key) != before.get(key) => {
                    if let Some(value) = after.get(key) {
                        let prefix = if *exported { "export " } else { "" };
                        out.push_str(&format!("{prefix}{key}={}\n", encode(value)));
                    }
                }
                Line::Entry { raw, .. } | Line::Other(raw) => {
                    out.push_str(raw);
                    out.push('\n');
                }
            }
        }

        for (key, value) in &after {
            if !before.contains_key(key) {
                out.push_str(&format!("{key}={}\n", encode(value)));
            }
        }

        Ok(out)
    }

    fn parse_line(raw: &str) -> Line {
        let trimmed = raw.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Line::Other(raw.to_string());
        }

        let body = trimmed.strip_prefix("export ");
        let exported = body.is_some();
        match body.unwrap_or(trimmed).split_once('=') {
            Some((key, _)) if !key.trim().is_empty() => Line::Entry {
                key: key.trim().to_string(),
                raw: raw.to_string(),
                exported,
            },
            _ => Line::Other(raw.to_string()),
        }
    }

    fn value_part(raw: &str) -> &str {
        raw.split_once('=').map(|(_, v)| v.trim()).unwrap_or("")
    }

    fn unquote(value: &str) -> String {
        let stripped = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')));

        match stripped {
            Some(inner) => inner.replace("\\\"", "\""),
            None => value.to_string(),
        }
    }

    fn encode(value: &Value) -> String {
        let text = match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        if text.chars().any(|c| c.is_whitespace() || c == '#' || c == '"') {
            format!("\"{}\"", text.replace('"', "\\\""))
        } else {
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::MemoryFilesystem;
    use rigger_core::domain::config_values;
    use serde_json::json;

    const ROOT: &str = "/project";

    fn writer(fs: &MemoryFilesystem) -> FileConfigWriter<MemoryFilesystem> {
        FileConfigWriter::new(fs.clone())
    }

    fn obj(value: Value) -> ConfigValues {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn read(fs: &MemoryFilesystem, file: &str) -> String {
        fs.read_file(&Path::new(ROOT).join(file)).unwrap()
    }

    #[test]
    fn env_set_overwrites_and_append_keeps() {
        let fs = MemoryFilesystem::new().with_file("/project/.env", "A=0\n");
        let writer = writer(&fs);

        writer
            .apply(
                Path::new(ROOT),
                &ConfigOperation::append(".env", config_values([("A", "1")])),
            )
            .unwrap();
        assert_eq!(read(&fs, ".env"), "A=0\n");

        writer
            .apply(
                Path::new(ROOT),
                &ConfigOperation::set(".env", config_values([("A", "1")])),
            )
            .unwrap();
        assert_eq!(read(&fs, ".env"), "A=1\n");
    }

    #[test]
    fn env_keeps_comments_and_untouched_lines() {
        let fs = MemoryFilesystem::new().with_file(
            "/project/.env",
            "# app\nAPP_NAME=shop\n\nDB_HOST=localhost\n",
        );

        writer(&fs)
            .apply(
                Path::new(ROOT),
                &ConfigOperation::set(
                    ".env",
                    config_values([("DB_HOST", "pgsql"), ("DB_PORT", "5432")]),
                ),
            )
            .unwrap();

        assert_eq!(
            read(&fs, ".env"),
            "# app\nAPP_NAME=shop\n\nDB_HOST=pgsql\nDB_PORT=5432\n"
        );
    }

    #[test]
    fn env_rewrite_keeps_export_prefix() {
        let fs = MemoryFilesystem::new().with_file("/project/.env", "export A=0\nB=1\n");

        writer(&fs)
            .apply(
                Path::new(ROOT),
                &ConfigOperation::set(".env", config_values([("A", "1"), ("B", "2")])),
            )
            .unwrap();

        assert_eq!(read(&fs, ".env"), "export A=1\nB=2\n");
    }

    #[test]
    fn env_quotes_values_with_spaces() {
        let fs = MemoryFilesystem::new();
        writer(&fs)
            .apply(
                Path::new(ROOT),
                &ConfigOperation::set(".env.example", config_values([("APP_NAME", "My Shop")])),
            )
            .unwrap();

        assert_eq!(read(&fs, ".env.example"), "APP_NAME=\"My Shop\"\n");
    }

    #[test]
    fn env_rejects_nested_values() {
        let fs = MemoryFilesystem::new();
        let err = writer(&fs)
            .apply(
                Path::new(ROOT),
                &ConfigOperation::set(".env", obj(json!({"DB": {"HOST": "x"}}))),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            RiggerError::Application(ApplicationError::UnsupportedValue { ref key, .. })
                if key == "DB"
        ));
        assert_eq!(fs.write_count(), 0);
    }

    #[test]
    fn json_merge_unions_lists() {
        let fs = MemoryFilesystem::new().with_file(
            "/project/composer.json",
            r#"{"name":"acme/shop","require":{"php":"^8.3"},"keywords":["a","b"]}"#,
        );

        writer(&fs)
            .apply(
                Path::new(ROOT),
                &ConfigOperation::merge(
                    "composer.json",
                    obj(json!({
                        "require": {"predis/predis": "^2.0"},
                        "keywords": ["b", "c"]
                    })),
                ),
            )
            .unwrap();

        let written: Value = serde_json::from_str(&read(&fs, "composer.json")).unwrap();
        assert_eq!(
            written,
            json!({
                "name": "acme/shop",
                "require": {"php": "^8.3", "predis/predis": "^2.0"},
                "keywords": ["a", "b", "c"]
            })
        );
    }

    #[test]
    fn json_set_replaces_nested_maps() {
        let fs = MemoryFilesystem::new()
            .with_file("/project/app.json", r#"{"db":{"host":"a","port":1}}"#);

        writer(&fs)
            .apply(
                Path::new(ROOT),
                &ConfigOperation::set("app.json", obj(json!({"db": {"host": "b"}}))),
            )
            .unwrap();

        let written: Value = serde_json::from_str(&read(&fs, "app.json")).unwrap();
        assert_eq!(written, json!({"db": {"host": "b"}}));
    }

    #[test]
    fn yaml_append_creates_missing_file() {
        let fs = MemoryFilesystem::new();
        writer(&fs)
            .apply(
                Path::new(ROOT),
                &ConfigOperation::append("config/queue.yml", obj(json!({"driver": "redis"}))),
            )
            .unwrap();

        let written: Value = serde_yaml::from_str(&read(&fs, "config/queue.yml")).unwrap();
        assert_eq!(written, json!({"driver": "redis"}));
    }

    #[test]
    fn toml_merge_keeps_existing_tables() {
        let fs = MemoryFilesystem::new().with_file(
            "/project/config.toml",
            "[server]\nport = 8080\n",
        );

        writer(&fs)
            .apply(
                Path::new(ROOT),
                &ConfigOperation::merge(
                    "config.toml",
                    obj(json!({"server": {"host": "0.0.0.0"}, "cache": {"driver": "redis"}})),
                ),
            )
            .unwrap();

        let written: Value = toml::from_str(&read(&fs, "config.toml")).unwrap();
        assert_eq!(
            written,
            json!({"server": {"port": 8080, "host": "0.0.0.0"}, "cache": {"driver": "redis"}})
        );
    }

    #[test]
    fn toml_set_keeps_datetimes_it_does_not_touch() {
        let fs = MemoryFilesystem::new().with_file(
            "/project/deploy.toml",
            "when = 1979-05-27T07:32:00Z\n",
        );

        writer(&fs)
            .apply(
                Path::new(ROOT),
                &ConfigOperation::set("deploy.toml", config_values([("name", "x")])),
            )
            .unwrap();

        let text = read(&fs, "deploy.toml");
        assert!(!text.contains("$__toml_private_datetime"));
        let table: toml::Table = toml::from_str(&text).unwrap();
        assert_eq!(table["name"].as_str(), Some("x"));
        let when = table["when"].as_datetime().unwrap();
        assert_eq!(when.to_string(), "1979-05-27T07:32:00Z");
    }

    #[test]
    fn toml_merge_unions_arrays() {
        let fs = MemoryFilesystem::new()
            .with_file("/project/tool.toml", "[lint]
rules = [\"a\", \"b\"]
");

        writer(&fs)
            .apply(
                Path::new(ROOT),
                &ConfigOperation::merge("tool.toml", obj(json!({"lint": {"rules": ["b", "c"]}}))),
            )
            .unwrap();

        let table: toml::Table = toml::from_str(&read(&fs, "tool.toml")).unwrap();
        let rules: Vec<_> = table["lint"]["rules"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(rules, ["a", "b", "c"]);
    }

    #[test]
    fn toml_rejects_null() {
        let fs = MemoryFilesystem::new();
        let err = writer(&fs)
            .apply(
                Path::new(ROOT),
                &ConfigOperation::set("config.toml", obj(json!({"key": null}))),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            RiggerError::Application(ApplicationError::UnsupportedValue { .. })
        ));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let fs = MemoryFilesystem::new();
        let err = writer(&fs)
            .apply(
                Path::new(ROOT),
                &ConfigOperation::set("settings.ini", config_values([("a", "b")])),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            RiggerError::Application(ApplicationError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn malformed_file_is_a_writer_error_and_untouched() {
        let fs = MemoryFilesystem::new().with_file("/project/app.json", "{not json");
        let err = writer(&fs)
            .apply(
                Path::new(ROOT),
                &ConfigOperation::set("app.json", config_values([("a", "b")])),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            RiggerError::Application(ApplicationError::WriterError { .. })
        ));
        assert_eq!(read(&fs, "app.json"), "{not json");
    }
}
