//! Deployment source variants
//!
//! A source is one entry of the config's `sources` list: something that
//! can be fetched into a destination directory. The variant set is closed
//! (`manifest`, `chart`, `archive`) and each variant is immutable once
//! constructed — fields are private and no mutators exist.
//!
//! The `type` tag is a property of the variant, not stored state: it is
//! stripped from the payload during structuring and re-derived from the
//! variant's identity during serialization.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};
use crate::fields::RawFields;
use crate::glob;

/// Type tag of a source variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Manifest,
    Chart,
    Archive,
}

/// Registry mapping type tags to source variants
static SOURCE_KINDS: phf::Map<&'static str, SourceKind> = phf::phf_map! {
    "manifest" => SourceKind::Manifest,
    "chart" => SourceKind::Chart,
    "archive" => SourceKind::Archive,
};

impl SourceKind {
    /// Resolve a type tag, failing on anything outside the variant set
    pub fn from_tag(tag: &str) -> Result<Self> {
        SOURCE_KINDS
            .get(tag)
            .copied()
            .ok_or_else(|| ConfigError::UnknownSourceType {
                tag: tag.to_string(),
            })
    }

    /// The tag string written back out during serialization
    pub fn tag(&self) -> &'static str {
        match self {
            SourceKind::Manifest => "manifest",
            SourceKind::Chart => "chart",
            SourceKind::Archive => "archive",
        }
    }
}

/// Write-once slot for the lazily created per-source logging span
///
/// The span is derived state, not part of the source's identity: clones
/// start empty and equality ignores the slot entirely.
#[derive(Debug, Default)]
struct LogCell(OnceLock<tracing::Span>);

impl LogCell {
    fn get_or_init(&self, display_name: &str) -> &tracing::Span {
        self.0
            .get_or_init(|| tracing::info_span!("source", source = %display_name))
    }
}

impl Clone for LogCell {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl PartialEq for LogCell {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

/// A deployment source, polymorphic over the fixed variant set
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Manifest(Manifest),
    Chart(HelmChart),
    Archive(Archive),
}

impl Source {
    /// The variant's type tag
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Manifest(_) => SourceKind::Manifest,
            Source::Chart(_) => SourceKind::Chart,
            Source::Archive(_) => SourceKind::Archive,
        }
    }

    /// The source's identifier (unique within a config by convention;
    /// uniqueness is enforced by the consumer, not this model)
    pub fn name(&self) -> &str {
        match self {
            Source::Manifest(m) => m.name(),
            Source::Chart(c) => c.name(),
            Source::Archive(a) => a.name(),
        }
    }

    /// `"{type}:{name}"`, used for diagnostics and log scoping
    pub fn display_name(&self) -> String {
        format!("{}:{}", self.kind().tag(), self.name())
    }

    /// Scoped logging span for this source, created on first use
    pub fn logger(&self) -> &tracing::Span {
        let cell = match self {
            Source::Manifest(m) => &m.log,
            Source::Chart(c) => &c.log,
            Source::Archive(a) => &a.log,
        };
        cell.get_or_init(&self.display_name())
    }
}

fn require_name(name: String) -> Result<String> {
    if name.is_empty() {
        return Err(ConfigError::InvalidFieldType {
            field: "name".to_string(),
            expected: "a non-empty string",
        });
    }
    Ok(name)
}

/// A file fetched as-is, assumed to contain YAML
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    name: String,
    url: String,
    log: LogCell,
}

impl Manifest {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: require_name(name.into())?,
            url: url.into(),
            log: LogCell::default(),
        })
    }

    /// Construct from the raw fields of a source entry (type tag removed)
    pub(crate) fn from_fields(mut raw: RawFields) -> Result<Self> {
        let name = require_name(raw.take_string("name")?)?;
        let url = raw.take_string("url")?;
        raw.finish()?;
        Ok(Self {
            name,
            url,
            log: LogCell::default(),
        })
    }

    pub(crate) fn unstructure(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert("url".to_string(), Value::String(self.url.clone()));
        map
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Release-level settings Helm wants that are not template variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HelmChartReleaseVars {
    name: Option<String>,
    namespace: Option<String>,
}

impl HelmChartReleaseVars {
    pub fn new(name: Option<String>, namespace: Option<String>) -> Self {
        Self { name, namespace }
    }

    pub(crate) fn from_fields(mut raw: RawFields) -> Result<Self> {
        let name = raw.take_string_opt("name")?;
        let namespace = raw.take_string_opt("namespace")?;
        raw.finish()?;
        Ok(Self { name, namespace })
    }

    pub(crate) fn unstructure(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(name) = &self.name {
            map.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(namespace) = &self.namespace {
            map.insert("namespace".to_string(), Value::String(namespace.clone()));
        }
        map
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Command-line flags for `helm template`, for the values present
    pub fn helm_template_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(name) = &self.name {
            args.push("--name-template".to_string());
            args.push(name.clone());
        }
        if let Some(namespace) = &self.namespace {
            args.push("--namespace".to_string());
            args.push(namespace.clone());
        }
        args
    }
}

/// A Helm chart fetched from a chart repository
#[derive(Debug, Clone, PartialEq)]
pub struct HelmChart {
    name: String,
    repo: String,
    version: String,
    templatevars: BTreeMap<String, String>,
    releasevars: HelmChartReleaseVars,
    log: LogCell,
}

impl HelmChart {
    pub fn new(
        name: impl Into<String>,
        repo: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            name: require_name(name.into())?,
            repo: repo.into(),
            version: version.into(),
            templatevars: BTreeMap::new(),
            releasevars: HelmChartReleaseVars::default(),
            log: LogCell::default(),
        })
    }

    pub(crate) fn from_fields(mut raw: RawFields) -> Result<Self> {
        let name = require_name(raw.take_string("name")?)?;
        let repo = raw.take_string("repo")?;
        let version = raw.take_string("version")?;

        let mut templatevars = BTreeMap::new();
        if let Some(vars) = raw.take_map_opt("templatevars")? {
            for (key, value) in vars {
                match value {
                    Value::String(s) => {
                        templatevars.insert(key, s);
                    }
                    _ => {
                        return Err(ConfigError::InvalidFieldType {
                            field: format!("templatevars.{key}"),
                            expected: "a string",
                        });
                    }
                }
            }
        }

        let releasevars = match raw.take_map_opt("releasevars")? {
            Some(map) => HelmChartReleaseVars::from_fields(RawFields::new(map))?,
            None => HelmChartReleaseVars::default(),
        };

        raw.finish()?;
        Ok(Self {
            name,
            repo,
            version,
            templatevars,
            releasevars,
            log: LogCell::default(),
        })
    }

    pub(crate) fn unstructure(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert("repo".to_string(), Value::String(self.repo.clone()));
        map.insert("version".to_string(), Value::String(self.version.clone()));
        if !self.templatevars.is_empty() {
            let vars: Map<String, Value> = self
                .templatevars
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            map.insert("templatevars".to_string(), Value::Object(vars));
        }
        let releasevars = self.releasevars.unstructure();
        if !releasevars.is_empty() {
            map.insert("releasevars".to_string(), Value::Object(releasevars));
        }
        map
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn templatevars(&self) -> &BTreeMap<String, String> {
        &self.templatevars
    }

    pub fn releasevars(&self) -> &HelmChartReleaseVars {
        &self.releasevars
    }

    /// Override the template variables (builder-style, consumes self)
    pub fn with_templatevars(mut self, vars: BTreeMap<String, String>) -> Self {
        self.templatevars = vars;
        self
    }

    /// Override the release variables (builder-style, consumes self)
    pub fn with_releasevars(mut self, releasevars: HelmChartReleaseVars) -> Self {
        self.releasevars = releasevars;
        self
    }
}

/// One extraction rule of an archive source
///
/// `path` is a glob pattern over the `/`-separated entry paths inside
/// the archive; `dest` rewrites where matching entries land. An empty
/// `dest` keeps the entry at its original relative location.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivePath {
    path: String,
    dest: String,
}

impl ArchivePath {
    /// Construct an extraction rule, validating `**` placement eagerly
    pub fn new(path: impl Into<String>, dest: impl Into<String>) -> Result<Self> {
        let path = path.into();
        glob::validate(&path)?;
        Ok(Self {
            path,
            dest: dest.into(),
        })
    }

    pub(crate) fn from_fields(mut raw: RawFields) -> Result<Self> {
        let path = raw.take_string("path")?;
        let dest = raw.take_string_opt("dest")?.unwrap_or_default();
        raw.finish()?;
        Self::new(path, dest)
    }

    pub(crate) fn unstructure(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("path".to_string(), Value::String(self.path.clone()));
        if !self.dest.is_empty() {
            map.insert("dest".to_string(), Value::String(self.dest.clone()));
        }
        map
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn dest(&self) -> &str {
        &self.dest
    }

    /// Match a candidate entry path against this rule
    ///
    /// Returns the destination path the entry should be written to, or
    /// `None` if the entry does not match the pattern.
    pub fn match_path(&self, candidate: &str) -> Option<String> {
        let tail = glob::match_segments(&self.path, candidate)?;
        if self.dest.is_empty() {
            return Some(candidate.to_string());
        }
        let prefix = self.dest.trim_end_matches('/');
        if tail.is_empty() {
            return Some(prefix.to_string());
        }
        Some(format!("{}/{}", prefix, tail.join("/")))
    }
}

/// An archive whose contents (or a glob-selected subset) are extracted
#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
    name: String,
    url: String,
    paths: Vec<ArchivePath>,
    log: LogCell,
}

impl Archive {
    /// An empty `paths` list means "extract everything"
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        paths: Vec<ArchivePath>,
    ) -> Result<Self> {
        Ok(Self {
            name: require_name(name.into())?,
            url: url.into(),
            paths,
            log: LogCell::default(),
        })
    }

    pub(crate) fn from_fields(mut raw: RawFields) -> Result<Self> {
        let name = require_name(raw.take_string("name")?)?;
        let url = raw.take_string("url")?;

        let mut paths = Vec::new();
        if let Some(entries) = raw.take_seq_opt("paths")? {
            for entry in entries {
                match entry {
                    Value::Object(map) => {
                        paths.push(ArchivePath::from_fields(RawFields::new(map))?);
                    }
                    _ => {
                        return Err(ConfigError::InvalidFieldType {
                            field: "paths".to_string(),
                            expected: "a sequence of mappings",
                        });
                    }
                }
            }
        }

        raw.finish()?;
        Ok(Self {
            name,
            url,
            paths,
            log: LogCell::default(),
        })
    }

    pub(crate) fn unstructure(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert("url".to_string(), Value::String(self.url.clone()));
        if !self.paths.is_empty() {
            let paths: Vec<Value> = self
                .paths
                .iter()
                .map(|p| Value::Object(p.unstructure()))
                .collect();
            map.insert("paths".to_string(), Value::Array(paths));
        }
        map
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn paths(&self) -> &[ArchivePath] {
        &self.paths
    }

    /// Route an archive entry through the extraction rules, first match
    /// wins. With no rules every entry keeps its original path.
    pub fn route(&self, entry_path: &str) -> Option<String> {
        if self.paths.is_empty() {
            return Some(entry_path.to_string());
        }
        self.paths.iter().find_map(|p| p.match_path(entry_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_resolves_known_tags() {
        assert_eq!(SourceKind::from_tag("chart").unwrap(), SourceKind::Chart);
        assert_eq!(
            SourceKind::from_tag("manifest").unwrap(),
            SourceKind::Manifest
        );
        assert_eq!(
            SourceKind::from_tag("archive").unwrap(),
            SourceKind::Archive
        );
    }

    #[test]
    fn test_registry_rejects_unknown_tag() {
        let err = SourceKind::from_tag("unknown").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownSourceType { tag } if tag == "unknown"
        ));
    }

    #[test]
    fn test_display_name() {
        let source = Source::Manifest(Manifest::new("web", "https://example.com/web.yaml").unwrap());
        assert_eq!(source.display_name(), "manifest:web");
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(Manifest::new("", "https://example.com").is_err());
    }

    #[test]
    fn test_logger_is_memoized_and_ignored_by_equality() {
        let a = Source::Manifest(Manifest::new("web", "u").unwrap());
        let b = a.clone();

        // Initializing the span on one side must not break equality.
        let first = a.logger().clone();
        let second = a.logger().clone();
        assert_eq!(first.id(), second.id());
        assert_eq!(a, b);
    }

    #[test]
    fn test_archive_path_rejects_inner_globstar() {
        assert!(ArchivePath::new("a/**/b", "").is_err());
        assert!(ArchivePath::new("**/b", "").is_err());
        assert!(ArchivePath::new("a/b/**", "").is_ok());
        assert!(ArchivePath::new("a/*/c", "").is_ok());
    }

    #[test]
    fn test_match_path_same_relative_location() {
        let rule = ArchivePath::new("logs/**", "").unwrap();
        assert_eq!(
            rule.match_path("logs/app/error.log").as_deref(),
            Some("logs/app/error.log")
        );
        assert_eq!(rule.match_path("bin/app"), None);
    }

    #[test]
    fn test_match_path_dest_rewrite() {
        let rule = ArchivePath::new("logs/**", "collected").unwrap();
        assert_eq!(
            rule.match_path("logs/app/error.log").as_deref(),
            Some("collected/app/error.log")
        );

        let rule = ArchivePath::new("*.yaml", "out/").unwrap();
        assert_eq!(
            rule.match_path("config.yaml").as_deref(),
            Some("out/config.yaml")
        );
        assert_eq!(rule.match_path("nested/config.yaml"), None);
    }

    #[test]
    fn test_archive_route_first_match_wins() {
        let archive = Archive::new(
            "bundle",
            "https://example.com/bundle.tgz",
            vec![
                ArchivePath::new("logs/**", "a").unwrap(),
                ArchivePath::new("**", "b").unwrap(),
            ],
        )
        .unwrap();

        assert_eq!(archive.route("logs/x").as_deref(), Some("a/x"));
        assert_eq!(archive.route("other/x").as_deref(), Some("b/other/x"));
    }

    #[test]
    fn test_archive_route_empty_rules_keep_everything() {
        let archive = Archive::new("bundle", "u", Vec::new()).unwrap();
        assert_eq!(archive.route("any/path").as_deref(), Some("any/path"));
    }

    #[test]
    fn test_helm_template_args() {
        let vars = HelmChartReleaseVars::new(Some("web".into()), Some("prod".into()));
        assert_eq!(
            vars.helm_template_args(),
            vec!["--name-template", "web", "--namespace", "prod"]
        );
        assert!(HelmChartReleaseVars::default().helm_template_args().is_empty());
    }
}
