//! Container-orchestration manifest model.
//!
//! Two value objects:
//!
//! - [`RenderVariables`]: `{{VARIABLE}}` substitution for manifest fragments.
//! - [`ComposeManifest`]: a structured view over a compose file, keyed by
//!   top-level section (`services`, `volumes`, `networks`) and then by entry
//!   name.
//!
//! Idempotency is decided on the parsed structure: a service counts as
//! declared when `services.<key>` exists, regardless of formatting or of
//! comments that happen to mention the key. Fragments are composed
//! additively. Entries already present in the manifest are never replaced,
//! so provisioning several backends into one project accumulates services
//! in a single file.
//!
//! When an existing manifest is extended, the added entries are spliced
//! under their section headers and the rest of the text is left as written,
//! comments included. If the splice does not reparse to the merged
//! structure (flow-style sections, multiple documents) the whole manifest
//! is reserialized instead, which keeps every entry but drops comments.

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};

use crate::domain::error::DomainError;

/// Top-level sections merged entry by entry.
const KEYED_SECTIONS: [&str; 3] = ["services", "volumes", "networks"];

// ── RenderVariables ───────────────────────────────────────────────────────────

/// Variables available to a manifest fragment.
///
/// Built-in variables:
///
/// | Variable | Example |
/// |----------|---------|
/// | `PROJECT_SLUG` | `my-shop` |
/// | `SERVICE` | `redis` |
///
/// Records add their own (`PORT`, `USERNAME`, `PASSWORD`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderVariables {
    variables: BTreeMap<String, String>,
}

impl RenderVariables {
    pub fn new(project_slug: &str, service: &str) -> Self {
        let mut variables = BTreeMap::new();
        variables.insert("PROJECT_SLUG".to_string(), project_slug.to_string());
        variables.insert("SERVICE".to_string(), service.to_string());
        Self { variables }
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.variables.insert(key.into(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace every `{{VARIABLE}}` placeholder.
    ///
    /// Unknown placeholders are left as-is.
    pub fn render(&self, template: &str) -> String {
        let mut result = template.to_string();

        for (key, value) in &self.variables {
            let placeholder = format!("{{{{{key}}}}}");
            result = result.replace(&placeholder, value);
        }

        result
    }
}

// ── ComposeManifest ───────────────────────────────────────────────────────────

/// Parsed compose manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposeManifest {
    root: Mapping,
}

impl ComposeManifest {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse manifest text. Blank documents parse to an empty manifest.
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        let value: Value =
            serde_yaml::from_str(text).map_err(|e| DomainError::InvalidManifest {
                reason: e.to_string(),
            })?;

        match value {
            Value::Null => Ok(Self::empty()),
            Value::Mapping(root) => Ok(Self { root }),
            _ => Err(DomainError::InvalidManifest {
                reason: "top level must be a mapping".into(),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Whether `services.<key>` exists.
    pub fn declares_service(&self, key: &str) -> bool {
        self.section("services")
            .is_some_and(|services| services.contains_key(key))
    }

    /// Declared service names, in file order.
    pub fn service_names(&self) -> Vec<String> {
        self.section("services")
            .map(|services| {
                services
                    .keys()
                    .filter_map(|k| k.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Additively merge `fragment` into this manifest.
    ///
    /// Keyed sections are merged entry by entry; existing entries win.
    /// Other top-level keys are copied only when absent. Returns the
    /// `section.entry` names that were added.
    pub fn merge_fragment(&mut self, fragment: &ComposeManifest) -> Vec<String> {
        let mut added = Vec::new();

        for (key, value) in &fragment.root {
            let keyed = key
                .as_str()
                .is_some_and(|k| KEYED_SECTIONS.contains(&k));

            match self.root.get_mut(key) {
                None => {
                    if keyed {
                        if let Some(entries) = value.as_mapping() {
                            added.extend(entries.keys().map(|e| entry_name(key, e)));
                        }
                    }
                    self.root.insert(key.clone(), value.clone());
                }
                Some(Value::Mapping(existing)) if keyed => {
                    let Some(entries) = value.as_mapping() else {
                        continue;
                    };
                    for (entry, body) in entries {
                        if !existing.contains_key(entry) {
                            added.push(entry_name(key, entry));
                            existing.insert(entry.clone(), body.clone());
                        }
                    }
                }
                // `services: ~` written by hand: adopt the fragment's section.
                Some(slot @ Value::Null) if keyed => {
                    if let Some(entries) = value.as_mapping() {
                        added.extend(entries.keys().map(|e| entry_name(key, e)));
                    }
                    *slot = value.clone();
                }
                Some(_) => {}
            }
        }

        added
    }

    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> Result<String, DomainError> {
        serde_yaml::to_string(&self.root).map_err(|e| DomainError::InvalidManifest {
            reason: e.to_string(),
        })
    }

    /// Serialize as an edit of `original`, the text this manifest was parsed
    /// from before `added` entries were merged in.
    pub fn to_yaml_extending(
        &self,
        original: &str,
        added: &[String],
    ) -> Result<String, DomainError> {
        match splice_entries(original, &self.root, added) {
            Some(text) if Self::parse(&text).is_ok_and(|spliced| spliced == *self) => Ok(text),
            _ => self.to_yaml(),
        }
    }

    fn section(&self, name: &str) -> Option<&Mapping> {
        self.root.get(name).and_then(Value::as_mapping)
    }
}

/// Insert each `section.entry` from `root` at the end of its section in
/// `original`, appending the section when the text has no header for it.
fn splice_entries(original: &str, root: &Mapping, added: &[String]) -> Option<String> {
    let mut lines: Vec<String> = original.lines().map(str::to_owned).collect();

    for name in added {
        let (section, entry) = name.split_once('.')?;
        let body = root.get(section)?.get(entry)?;

        let mut single = Mapping::new();
        single.insert(Value::String(entry.to_string()), body.clone());
        let block = serde_yaml::to_string(&single).ok()?;

        match lines.iter().position(|line| is_section_header(line, section)) {
            Some(header) => {
                let pad = " ".repeat(child_indent(&lines[header + 1..]).unwrap_or(2));
                let at = section_end(&lines, header);
                let tail = lines.split_off(at);
                lines.extend(block.lines().map(|line| format!("{pad}{line}")));
                lines.extend(tail);
            }
            None => {
                lines.push(format!("{section}:"));
                lines.extend(block.lines().map(|line| format!("  {line}")));
            }
        }
    }

    let mut text = lines.join("\n");
    text.push('\n');
    Some(text)
}

/// `section:` at column zero, optionally followed by a comment.
fn is_section_header(line: &str, section: &str) -> bool {
    line.strip_prefix(section)
        .and_then(|rest| rest.strip_prefix(':'))
        .is_some_and(|rest| {
            let rest = rest.trim();
            rest.is_empty() || rest.starts_with('#')
        })
}

fn is_top_level(line: &str) -> bool {
    !line.is_empty() && !line.starts_with(char::is_whitespace) && !line.starts_with('#')
}

fn is_filler(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Indentation of the first entry under a header, if the section has one.
fn child_indent(after_header: &[String]) -> Option<usize> {
    let first = after_header.iter().find(|line| !is_filler(line))?;
    let indent = first.len() - first.trim_start().len();
    (indent > 0).then_some(indent)
}

/// Index just past the last entry line of the section opened at `header`.
/// Blank lines and column-zero comments that lead into the next section
/// stay with it.
fn section_end(lines: &[String], header: usize) -> usize {
    let mut end = lines[header + 1..]
        .iter()
        .position(|line| is_top_level(line))
        .map_or(lines.len(), |offset| header + 1 + offset);

    while end > header + 1 && leads_into_next(&lines[end - 1]) {
        end -= 1;
    }
    end
}

fn leads_into_next(line: &str) -> bool {
    line.trim().is_empty() || line.starts_with('#')
}

fn entry_name(section: &Value, entry: &Value) -> String {
    format!(
        "{}.{}",
        section.as_str().unwrap_or("?"),
        entry.as_str().unwrap_or("?")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const REDIS: &str = "\
services:
  redis:
    image: 'redis:alpine'
    networks:
      - app
volumes:
  app-redis:
    driver: local
networks:
  app:
    driver: bridge
";

    const PGSQL: &str = "\
services:
  pgsql:
    image: 'postgres:17'
    networks:
      - app
volumes:
  app-pgsql:
    driver: local
networks:
  app:
    driver: bridge
";

    #[test]
    fn render_replaces_known_variables_only() {
        let vars = RenderVariables::new("shop", "redis").with_variable("PORT", 6379);
        assert_eq!(
            vars.render("{{SERVICE}}:{{PORT}} {{PROJECT_SLUG}} {{UNKNOWN}}"),
            "redis:6379 shop {{UNKNOWN}}"
        );
        assert_eq!(vars.get("PORT"), Some("6379"));
    }

    #[test]
    fn blank_manifest_parses_empty() {
        assert!(ComposeManifest::parse("").unwrap().is_empty());
        assert!(ComposeManifest::parse("# nothing yet\n").unwrap().is_empty());
    }

    #[test]
    fn non_mapping_manifest_is_invalid() {
        assert!(matches!(
            ComposeManifest::parse("- a\n- b\n"),
            Err(DomainError::InvalidManifest { .. })
        ));
        assert!(ComposeManifest::parse("services: [unclosed").is_err());
    }

    #[test]
    fn declares_service_ignores_comments() {
        let text = "# redis is coming later\nservices:\n  mysql:\n    image: mysql\n";
        let manifest = ComposeManifest::parse(text).unwrap();
        assert!(manifest.declares_service("mysql"));
        assert!(!manifest.declares_service("redis"));
    }

    #[test]
    fn merge_into_empty_adds_everything() {
        let mut manifest = ComposeManifest::empty();
        let added = manifest.merge_fragment(&ComposeManifest::parse(REDIS).unwrap());
        assert_eq!(
            added,
            ["services.redis", "volumes.app-redis", "networks.app"]
        );
        assert!(manifest.declares_service("redis"));
    }

    #[test]
    fn merge_composes_services_additively() {
        let mut manifest = ComposeManifest::parse(REDIS).unwrap();
        let added = manifest.merge_fragment(&ComposeManifest::parse(PGSQL).unwrap());

        assert_eq!(added, ["services.pgsql", "volumes.app-pgsql"]);
        assert_eq!(manifest.service_names(), ["redis", "pgsql"]);
    }

    #[test]
    fn merge_never_overwrites_existing_entries() {
        let custom = "services:\n  redis:\n    image: 'redis:7'\n";
        let mut manifest = ComposeManifest::parse(custom).unwrap();
        manifest.merge_fragment(&ComposeManifest::parse(REDIS).unwrap());

        let yaml = manifest.to_yaml().unwrap();
        assert!(yaml.contains("redis:7"));
        assert!(!yaml.contains("redis:alpine"));
    }

    #[test]
    fn merge_fills_null_section() {
        let mut manifest = ComposeManifest::parse("services:\n").unwrap();
        manifest.merge_fragment(&ComposeManifest::parse(REDIS).unwrap());
        assert!(manifest.declares_service("redis"));
    }

    #[test]
    fn extending_keeps_comments_and_existing_entries() {
        let original = "\
# Local services for the shop.
services:
    # pinned for the legacy importer
    redis:
        image: 'redis:7'

# shared volumes
volumes:
    app-redis:
        driver: local
";
        let mut manifest = ComposeManifest::parse(original).unwrap();
        let added = manifest.merge_fragment(&ComposeManifest::parse(PGSQL).unwrap());
        let text = manifest.to_yaml_extending(original, &added).unwrap();

        assert!(text.starts_with("# Local services for the shop.\n"));
        assert!(text.contains("    # pinned for the legacy importer\n    redis:\n"));
        assert!(text.contains("# shared volumes\n"));
        assert!(text.contains("redis:7"));

        let reparsed = ComposeManifest::parse(&text).unwrap();
        assert_eq!(reparsed, manifest);
        assert_eq!(reparsed.service_names(), ["redis", "pgsql"]);
    }

    #[test]
    fn extending_flow_style_manifest_reserializes() {
        let original = "services: {mysql: {image: mysql}}\n";
        let mut manifest = ComposeManifest::parse(original).unwrap();
        let added = manifest.merge_fragment(&ComposeManifest::parse(REDIS).unwrap());
        let text = manifest.to_yaml_extending(original, &added).unwrap();

        let reparsed = ComposeManifest::parse(&text).unwrap();
        assert_eq!(reparsed, manifest);
        assert_eq!(reparsed.service_names(), ["mysql", "redis"]);
    }

    #[test]
    fn serialized_manifest_parses_back() {
        let manifest = ComposeManifest::parse(REDIS).unwrap();
        let reparsed = ComposeManifest::parse(&manifest.to_yaml().unwrap()).unwrap();
        assert_eq!(manifest, reparsed);
    }
}
