//! Conversion between the untyped document tree and source entities
//!
//! One raw element of the `sources` sequence is structured by extracting
//! its `type` tag, resolving the variant through the registry and handing
//! the remaining fields to that variant's constructor. The constructor
//! owns the recursive structuring of its nested sub-objects (archive
//! `paths`, chart `releasevars`), so this dispatch layer stays free of
//! variant-specific field knowledge.

use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};
use crate::fields::RawFields;
use crate::source::{Archive, HelmChart, Manifest, Source, SourceKind};

/// Structure one raw element of the `sources` sequence
pub fn structure_source(value: Value) -> Result<Source> {
    let mut map = match value {
        Value::Object(map) => map,
        _ => {
            return Err(ConfigError::InvalidFieldType {
                field: "sources".to_string(),
                expected: "a sequence of mappings",
            });
        }
    };

    // The tag is consumed here and never reaches the constructor.
    let tag = match map.remove("type") {
        Some(Value::String(tag)) => tag,
        Some(_) | None => return Err(ConfigError::MissingTypeTag),
    };

    let raw = RawFields::new(map);
    match SourceKind::from_tag(&tag)? {
        SourceKind::Manifest => Manifest::from_fields(raw).map(Source::Manifest),
        SourceKind::Chart => HelmChart::from_fields(raw).map(Source::Chart),
        SourceKind::Archive => Archive::from_fields(raw).map(Source::Archive),
    }
}

/// Convert a source back to its untyped shape
///
/// The `type` tag is re-derived from the variant's identity, not stored
/// state, so a structured entity serializes back to what was parsed.
/// Fields equal to their defaults are omitted.
pub fn unstructure_source(source: &Source) -> Value {
    let mut map = Map::new();
    map.insert(
        "type".to_string(),
        Value::String(source.kind().tag().to_string()),
    );
    let fields = match source {
        Source::Manifest(m) => m.unstructure(),
        Source::Chart(c) => c.unstructure(),
        Source::Archive(a) => a.unstructure(),
    };
    map.extend(fields);
    Value::Object(map)
}
