//! Stagehand Core - Deployment-source configuration model
//!
//! Parses an untyped YAML/JSON document describing a list of
//! heterogeneous deployment sources into strongly validated, immutable
//! entities, and serializes them back to the same shape:
//! - `Config`: the aggregate root, an ordered list of sources
//! - `Source`: discriminated union over `manifest`, `chart` and `archive`
//! - `ArchivePath`: glob-based extraction rules with eager validation
//!
//! Fetching the sources' content is the job of `stagehand-fetch`; this
//! crate is pure data transformation with no I/O beyond the file-loading
//! convenience constructors.

pub mod config;
pub mod error;
pub mod glob;
pub mod source;
pub mod structure;

mod fields;

pub use config::Config;
pub use error::{ConfigError, Result};
pub use source::{Archive, ArchivePath, HelmChart, HelmChartReleaseVars, Manifest, Source, SourceKind};
pub use structure::{structure_source, unstructure_source};
