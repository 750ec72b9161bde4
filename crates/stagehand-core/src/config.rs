//! Top-level config aggregate

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};
use crate::source::Source;
use crate::structure::{structure_source, unstructure_source};

/// A parsed deployment-source config
///
/// Owns an ordered list of sources; order is significant (fetch order,
/// and override order for later phases). The list may be empty but the
/// `sources` field itself is required in the document.
///
/// Parsing is fail-fast: the first bad element aborts the whole parse,
/// with the offending index attached to the error.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    sources: Vec<Source>,
}

impl Config {
    /// Build a config from already-constructed sources
    pub fn new(sources: Vec<Source>) -> Self {
        Self { sources }
    }

    /// Structure a config from an untyped document tree
    pub fn from_value(doc: Value) -> Result<Self> {
        let mut map = match doc {
            Value::Object(map) => map,
            _ => {
                return Err(ConfigError::InvalidFieldType {
                    field: "config".to_string(),
                    expected: "a mapping",
                });
            }
        };

        let entries = match map.remove("sources") {
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(ConfigError::InvalidFieldType {
                    field: "sources".to_string(),
                    expected: "a sequence",
                });
            }
            None => {
                return Err(ConfigError::MissingField {
                    field: "sources".to_string(),
                });
            }
        };

        if let Some(field) = map.keys().next() {
            return Err(ConfigError::UnknownField {
                field: field.clone(),
            });
        }

        let mut sources = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let source = structure_source(entry).map_err(|e| e.at_index(index))?;
            sources.push(source);
        }

        Ok(Self { sources })
    }

    /// Parse a config from a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let doc: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(doc)
    }

    /// Load a config from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Convert back to the untyped document tree
    pub fn to_value(&self) -> Value {
        let entries: Vec<Value> = self.sources.iter().map(unstructure_source).collect();
        let mut map = Map::new();
        map.insert("sources".to_string(), Value::Array(entries));
        Value::Object(map)
    }

    /// Serialize back to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_value())?)
    }

    /// The sources, in document order
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Look up a source by name (first match in document order)
    pub fn get(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name() == name)
    }
}

// Serde support delegates to the untyped tree, so `Config` works with
// any serde format while keeping the manual structuring (and its typed
// errors) as the single validation path.

impl serde::Serialize for Config {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Config {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let doc = Value::deserialize(deserializer)?;
        Config::from_value(doc).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_doc() -> Value {
        json!({
            "sources": [
                {
                    "type": "manifest",
                    "name": "web",
                    "url": "https://example.com/web.yaml",
                },
                {
                    "type": "chart",
                    "name": "db",
                    "repo": "https://charts.example.com",
                    "version": "1.2.3",
                    "templatevars": {"replicas": "3"},
                    "releasevars": {"name": "db", "namespace": "prod"},
                },
                {
                    "type": "archive",
                    "name": "bundle",
                    "url": "https://example.com/bundle.tgz",
                    "paths": [
                        {"path": "logs/**"},
                        {"path": "*.yaml", "dest": "out/"},
                    ],
                },
            ]
        })
    }

    #[test]
    fn test_roundtrip_law() {
        let doc = sample_doc();
        let config = Config::from_value(doc.clone()).unwrap();
        assert_eq!(config.to_value(), doc);
    }

    #[test]
    fn test_structure_idempotent() {
        let config = Config::from_value(sample_doc()).unwrap();
        let again = Config::from_value(config.to_value()).unwrap();
        assert_eq!(config, again);
    }

    #[test]
    fn test_source_order_preserved() {
        let config = Config::from_value(sample_doc()).unwrap();
        let names: Vec<&str> = config.sources().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["web", "db", "bundle"]);
    }

    #[test]
    fn test_sources_may_be_empty_but_not_absent() {
        let config = Config::from_value(json!({"sources": []})).unwrap();
        assert!(config.is_empty());

        let err = Config::from_value(json!({})).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field } if field == "sources"));
    }

    #[test]
    fn test_unknown_top_level_field() {
        let err = Config::from_value(json!({"sources": [], "surces": []})).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownField { field } if field == "surces"));
    }

    #[test]
    fn test_fail_fast_reports_offending_index() {
        let err = Config::from_value(json!({
            "sources": [
                {"type": "manifest", "name": "a", "url": "u"},
                {"type": "manifest", "name": "b", "url": "u"},
                {"name": "c", "url": "u"},
            ]
        }))
        .unwrap_err();

        match err {
            ConfigError::SourceAt { index, error } => {
                assert_eq!(index, 2);
                assert!(matches!(*error, ConfigError::MissingTypeTag));
            }
            other => panic!("expected SourceAt, got {other:?}"),
        }
    }

    #[test]
    fn test_from_yaml() {
        let config = Config::from_yaml(
            r#"
sources:
  - type: manifest
    name: web
    url: https://example.com/web.yaml
  - type: chart
    name: db
    repo: https://charts.example.com
    version: 1.2.3
"#,
        )
        .unwrap();

        assert_eq!(config.len(), 2);
        assert_eq!(config.get("db").unwrap().display_name(), "chart:db");
        assert!(config.get("missing").is_none());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = Config::from_value(sample_doc()).unwrap();
        let yaml = config.to_yaml().unwrap();
        let reparsed = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config, reparsed);
    }

    #[test]
    fn test_serde_integration() {
        let config: Config = serde_yaml::from_str(
            "sources:\n  - type: manifest\n    name: web\n    url: u\n",
        )
        .unwrap();
        assert_eq!(config.len(), 1);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json, config.to_value());

        let err = serde_yaml::from_str::<Config>("sources:\n  - type: nope\n    name: x\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.yaml");
        std::fs::write(
            &path,
            "sources:\n  - type: manifest\n    name: web\n    url: u\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.len(), 1);
    }
}
