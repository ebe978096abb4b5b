//! Diagram configuration: YAML file, then `GOUML_*` environment, then CLI flags

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uml::{Category, RenderingOptions};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    #[serde(flatten)]
    pub options: RenderingOptions,
    /// Deepest package path rendered, e.g. 3 for `project.internal.store`
    pub max_depth: Option<usize>,
    /// Directory names skipped during recursive scans
    pub ignore: Vec<String>,
    /// Free-function buckets, first match wins
    pub categories: Vec<Category>,
}

impl DiagramConfig {
    /// Load from `path` if given, defaults otherwise
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("GOUML_TITLE") {
            self.options.title = Some(v);
        }

        if let Some(v) = var("GOUML_NOTES") {
            self.options.notes = Some(v);
        }

        if let Some(v) = var("GOUML_MAX_DEPTH") {
            if let Ok(depth) = v.parse() {
                self.max_depth = Some(depth);
            }
        }

        if let Some(v) = var("GOUML_IGNORE") {
            self.ignore = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        let options = &mut self.options;
        let flags: [(&str, &mut bool); 11] = [
            ("GOUML_SHOW_AGGREGATIONS", &mut options.show_aggregations),
            ("GOUML_SHOW_COMPOSITIONS", &mut options.show_compositions),
            ("GOUML_SHOW_IMPLEMENTATIONS", &mut options.show_implementations),
            ("GOUML_SHOW_ALIASES", &mut options.show_aliases),
            ("GOUML_SHOW_CONNECTION_LABELS", &mut options.show_connection_labels),
            ("GOUML_AGGREGATE_PRIVATE_MEMBERS", &mut options.aggregate_private_members),
            ("GOUML_HIDE_PRIVATE_MEMBERS", &mut options.hide_private_members),
            ("GOUML_HIDE_FIELDS", &mut options.hide_fields),
            ("GOUML_HIDE_METHODS", &mut options.hide_methods),
            ("GOUML_SHOW_FUNCTIONS", &mut options.show_functions),
            ("GOUML_SHOW_OPTIONS_AS_NOTE", &mut options.show_options_as_note),
        ];
        for (key, flag) in flags {
            if let Some(value) = var(key).as_deref().and_then(parse_bool) {
                *flag = value;
            }
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_path_gives_defaults() {
        let config = DiagramConfig::load(None).unwrap();
        assert_eq!(config, DiagramConfig::default());
        assert!(config.options.show_compositions);
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gouml.yaml");
        std::fs::write(
            &path,
            r#"
title: Services
show_aggregations: true
show_aliases: false
max_depth: 3
ignore: [vendor, testdata]
categories:
  - name: Parsing
    keywords: [parse, lex]
  - name: IO
"#,
        )
        .unwrap();

        let config = DiagramConfig::load(Some(&path)).unwrap();
        assert_eq!(config.options.title.as_deref(), Some("Services"));
        assert!(config.options.show_aggregations);
        assert!(!config.options.show_aliases);
        assert!(config.options.show_compositions);
        assert_eq!(config.max_depth, Some(3));
        assert_eq!(config.ignore, vec!["vendor", "testdata"]);
        assert_eq!(config.categories[0], Category::new("Parsing", &["parse", "lex"]));
        assert!(config.categories[1].keywords.is_empty());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "max_depth: [not, a, number]\n").unwrap();
        assert!(DiagramConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = DiagramConfig::default();
        config.apply_vars(env(&[
            ("GOUML_TITLE", "From env"),
            ("GOUML_MAX_DEPTH", "4"),
            ("GOUML_IGNORE", "vendor, third_party,"),
            ("GOUML_SHOW_ALIASES", "false"),
            ("GOUML_HIDE_FIELDS", "1"),
        ]));
        assert_eq!(config.options.title.as_deref(), Some("From env"));
        assert_eq!(config.max_depth, Some(4));
        assert_eq!(config.ignore, vec!["vendor", "third_party"]);
        assert!(!config.options.show_aliases);
        assert!(config.options.hide_fields);
    }

    #[test]
    fn test_env_ignores_garbage() {
        let mut config = DiagramConfig::default();
        config.apply_vars(env(&[("GOUML_MAX_DEPTH", "deep"), ("GOUML_SHOW_ALIASES", "maybe")]));
        assert_eq!(config.max_depth, None);
        assert!(config.options.show_aliases);
    }
}
