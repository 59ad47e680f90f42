//! Declarative configuration operations.
//!
//! A [`ConfigOperation`] describes one mutation of one file in a generated
//! project. Operations are plain data: nothing here touches the filesystem
//! or checks that the target exists. A `ConfigWriter` adapter applies them
//! in construction order once the project's files have been written.
//!
//! # Actions
//!
//! | Action   | Existing key          | Missing key | Nested maps        |
//! |----------|-----------------------|-------------|--------------------|
//! | `set`    | overwritten           | created     | replaced wholesale |
//! | `append` | left untouched        | created     | left untouched     |
//! | `merge`  | leaf: new value wins  | created     | merged key by key  |
//!
//! For every action keys not mentioned in `values` are left alone and the
//! target file is created when absent.
//!
//! ## Lists under `merge`
//!
//! When both sides hold a list, the result is the existing list followed by
//! every new item that is not already present (order preserved, no
//! duplicates introduced). A list meeting a non-list is a leaf conflict and
//! the new value wins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{common::RelativePath, error::DomainError};

/// Insertion-ordered payload of an operation.
pub type ConfigValues = serde_json::Map<String, Value>;

/// The three mutation semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigAction {
    Set,
    Append,
    Merge,
}

impl ConfigAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Append => "append",
            Self::Merge => "merge",
        }
    }
}

impl fmt::Display for ConfigAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "set" => Ok(Self::Set),
            "append" => Ok(Self::Append),
            "merge" => Ok(Self::Merge),
            other => Err(DomainError::invalid(
                "action",
                other,
                "expected set, append or merge",
            )),
        }
    }
}

/// One file-scoped mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigOperation {
    action: ConfigAction,
    file: RelativePath,
    values: ConfigValues,
}

impl ConfigOperation {
    pub fn new(action: ConfigAction, file: impl Into<RelativePath>, values: ConfigValues) -> Self {
        Self {
            action,
            file: file.into(),
            values,
        }
    }

    pub fn set(file: impl Into<RelativePath>, values: ConfigValues) -> Self {
        Self::new(ConfigAction::Set, file, values)
    }

    pub fn append(file: impl Into<RelativePath>, values: ConfigValues) -> Self {
        Self::new(ConfigAction::Append, file, values)
    }

    pub fn merge(file: impl Into<RelativePath>, values: ConfigValues) -> Self {
        Self::new(ConfigAction::Merge, file, values)
    }

    /// One `set` operation per entry, in iteration order.
    pub fn set_bulk<I, F>(entries: I) -> Vec<Self>
    where
        I: IntoIterator<Item = (F, ConfigValues)>,
        F: Into<RelativePath>,
    {
        Self::bulk(ConfigAction::Set, entries)
    }

    /// One `append` operation per entry, in iteration order.
    pub fn append_bulk<I, F>(entries: I) -> Vec<Self>
    where
        I: IntoIterator<Item = (F, ConfigValues)>,
        F: Into<RelativePath>,
    {
        Self::bulk(ConfigAction::Append, entries)
    }

    /// One `merge` operation per entry, in iteration order.
    pub fn merge_bulk<I, F>(entries: I) -> Vec<Self>
    where
        I: IntoIterator<Item = (F, ConfigValues)>,
        F: Into<RelativePath>,
    {
        Self::bulk(ConfigAction::Merge, entries)
    }

    fn bulk<I, F>(action: ConfigAction, entries: I) -> Vec<Self>
    where
        I: IntoIterator<Item = (F, ConfigValues)>,
        F: Into<RelativePath>,
    {
        entries
            .into_iter()
            .map(|(file, values)| Self::new(action, file, values))
            .collect()
    }

    pub fn action(&self) -> ConfigAction {
        self.action
    }

    pub fn file(&self) -> &RelativePath {
        &self.file
    }

    pub fn values(&self) -> &ConfigValues {
        &self.values
    }
}

impl fmt::Display for ConfigOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({} keys)",
            self.action,
            self.file,
            self.values.len()
        )
    }
}

// ── Semantics ─────────────────────────────────────────────────────────────────
//
// JSON and YAML writers convert the file into a `serde_json::Value` tree and
// call `apply_to_tree`; line-oriented writers call it on a flat map. TOML is
// edited in its own value model so datetimes survive.

/// Apply `values` to an in-memory tree following `action`'s semantics.
pub fn apply_to_tree(action: ConfigAction, target: &mut ConfigValues, values: &ConfigValues) {
    match action {
        ConfigAction::Set => {
            for (key, value) in values {
                target.insert(key.clone(), value.clone());
            }
        }
        ConfigAction::Append => {
            for (key, value) in values {
                if !target.contains_key(key) {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        ConfigAction::Merge => merge_maps(target, values),
    }
}

fn merge_maps(target: &mut ConfigValues, values: &ConfigValues) {
    for (key, incoming) in values {
        match target.get_mut(key) {
            Some(existing) => merge_value(existing, incoming),
            None => {
                target.insert(key.clone(), incoming.clone());
            }
        }
    }
}

fn merge_value(existing: &mut Value, incoming: &Value) {
    match (existing, incoming) {
        (Value::Object(current), Value::Object(new)) => merge_maps(current, new),
        (Value::Array(current), Value::Array(new)) => {
            for item in new {
                if !current.contains(item) {
                    current.push(item.clone());
                }
            }
        }
        (slot, new) => *slot = new.clone(),
    }
}

/// Build [`ConfigValues`] from `(key, value)` pairs.
pub fn config_values<I, K, V>(pairs: I) -> ConfigValues
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> ConfigValues {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn constructors_fix_the_action() {
        let values = config_values([("APP_NAME", "shop")]);
        assert_eq!(ConfigOperation::set(".env", values.clone()).action(), ConfigAction::Set);
        assert_eq!(
            ConfigOperation::append(".env", values.clone()).action(),
            ConfigAction::Append
        );
        assert_eq!(ConfigOperation::merge(".env", values).action(), ConfigAction::Merge);
    }

    #[test]
    fn merge_bulk_preserves_input_order() {
        let ops = ConfigOperation::merge_bulk([
            ("f1", obj(json!({"a": 1}))),
            ("f2", obj(json!({"b": 2}))),
        ]);

        assert_eq!(ops.len(), 2);
        assert!(ops.iter().all(|op| op.action() == ConfigAction::Merge));
        assert_eq!(ops[0].file().to_string(), "f1");
        assert_eq!(ops[1].file().to_string(), "f2");
    }

    #[test]
    fn same_file_twice_is_not_deduplicated() {
        let mut ops = ConfigOperation::set_bulk([(".env", config_values([("A", "1")]))]);
        ops.extend(ConfigOperation::append_bulk([(".env", config_values([("A", "2")]))]));

        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].action(), ConfigAction::Set);
        assert_eq!(ops[1].action(), ConfigAction::Append);
    }

    #[test]
    fn set_overwrites_and_append_keeps() {
        let mut set_target = config_values([("A", "0"), ("B", "keep")]);
        apply_to_tree(ConfigAction::Set, &mut set_target, &config_values([("A", "1")]));
        assert_eq!(set_target, config_values([("A", "1"), ("B", "keep")]));

        let mut append_target = config_values([("A", "0")]);
        apply_to_tree(
            ConfigAction::Append,
            &mut append_target,
            &config_values([("A", "1"), ("C", "new")]),
        );
        assert_eq!(append_target, config_values([("A", "0"), ("C", "new")]));
    }

    #[test]
    fn merge_is_recursive_and_new_leaf_wins() {
        let mut target = obj(json!({
            "scripts": {"build": "vite build", "lint": "eslint ."},
            "name": "old"
        }));
        apply_to_tree(
            ConfigAction::Merge,
            &mut target,
            &obj(json!({"scripts": {"build": "rigger build"}, "name": "new"})),
        );

        assert_eq!(
            Value::Object(target),
            json!({
                "scripts": {"build": "rigger build", "lint": "eslint ."},
                "name": "new"
            })
        );
    }

    #[test]
    fn merge_unions_lists_without_duplicates() {
        let mut target = obj(json!({"workspaces": ["apps/*", "packages/*"]}));
        apply_to_tree(
            ConfigAction::Merge,
            &mut target,
            &obj(json!({"workspaces": ["packages/*", "tools/*"]})),
        );
        assert_eq!(
            Value::Object(target),
            json!({"workspaces": ["apps/*", "packages/*", "tools/*"]})
        );
    }

    #[test]
    fn merge_list_against_scalar_takes_new_value() {
        let mut target = obj(json!({"paths": "src"}));
        apply_to_tree(
            ConfigAction::Merge,
            &mut target,
            &obj(json!({"paths": ["src", "tests"]})),
        );
        assert_eq!(Value::Object(target), json!({"paths": ["src", "tests"]}));
    }

    #[test]
    fn operation_serializes_with_lowercase_action() {
        let op = ConfigOperation::merge("composer.json", obj(json!({"require": {"php": "^8.3"}})));
        let text = serde_json::to_string(&op).unwrap();
        assert!(text.contains("\"action\":\"merge\""));
        assert!(text.contains("\"file\":\"composer.json\""));

        let back: ConfigOperation = serde_json::from_str(&text).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn action_parses_case_insensitively() {
        assert_eq!("MERGE".parse::<ConfigAction>().unwrap(), ConfigAction::Merge);
        assert!("replace".parse::<ConfigAction>().is_err());
    }
}
