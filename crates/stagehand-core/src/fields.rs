//! Field extraction helpers for manual structuring
//!
//! Variant constructors consume a raw JSON mapping field by field. Every
//! accessor removes the field it reads, so whatever is left over when
//! [`RawFields::finish`] runs is by definition unknown input.

use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};

/// A raw mapping being consumed by a variant constructor
pub(crate) struct RawFields {
    map: Map<String, Value>,
}

impl RawFields {
    pub(crate) fn new(map: Map<String, Value>) -> Self {
        Self { map }
    }

    /// Remove and return a field, if present
    pub(crate) fn take(&mut self, field: &str) -> Option<Value> {
        self.map.remove(field)
    }

    /// Remove a required string field
    pub(crate) fn take_string(&mut self, field: &str) -> Result<String> {
        match self.take(field) {
            Some(value) => expect_string(field, value),
            None => Err(ConfigError::MissingField {
                field: field.to_string(),
            }),
        }
    }

    /// Remove an optional string field
    pub(crate) fn take_string_opt(&mut self, field: &str) -> Result<Option<String>> {
        match self.take(field) {
            Some(Value::Null) | None => Ok(None),
            Some(value) => expect_string(field, value).map(Some),
        }
    }

    /// Remove an optional mapping field
    pub(crate) fn take_map_opt(&mut self, field: &str) -> Result<Option<Map<String, Value>>> {
        match self.take(field) {
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(ConfigError::InvalidFieldType {
                field: field.to_string(),
                expected: "a mapping",
            }),
            None => Ok(None),
        }
    }

    /// Remove an optional sequence field
    pub(crate) fn take_seq_opt(&mut self, field: &str) -> Result<Option<Vec<Value>>> {
        match self.take(field) {
            Some(Value::Array(seq)) => Ok(Some(seq)),
            Some(_) => Err(ConfigError::InvalidFieldType {
                field: field.to_string(),
                expected: "a sequence",
            }),
            None => Ok(None),
        }
    }

    /// Fail if any fields were left unconsumed
    ///
    /// A leftover `type` tag means the dispatch layer did not strip it
    /// before handing the mapping to a constructor, which is reported
    /// separately from a plain typo.
    pub(crate) fn finish(self) -> Result<()> {
        if let Some(field) = self.map.keys().next() {
            if field == "type" {
                return Err(ConfigError::UnexpectedField {
                    field: field.clone(),
                });
            }
            return Err(ConfigError::UnknownField {
                field: field.clone(),
            });
        }
        Ok(())
    }
}

fn expect_string(field: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(ConfigError::InvalidFieldType {
            field: field.to_string(),
            expected: "a string",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> RawFields {
        match value {
            Value::Object(map) => RawFields::new(map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_take_string_required() {
        let mut raw = fields(json!({"url": "https://example.com"}));
        assert_eq!(raw.take_string("url").unwrap(), "https://example.com");

        let err = raw.take_string("url").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
    }

    #[test]
    fn test_take_string_wrong_type() {
        let mut raw = fields(json!({"url": 42}));
        let err = raw.take_string("url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFieldType { .. }));
    }

    #[test]
    fn test_finish_rejects_leftovers() {
        let raw = fields(json!({"uurl": "typo"}));
        let err = raw.finish().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownField { field } if field == "uurl"));
    }

    #[test]
    fn test_finish_reports_type_tag_separately() {
        let raw = fields(json!({"type": "manifest"}));
        let err = raw.finish().unwrap_err();
        assert!(matches!(err, ConfigError::UnexpectedField { field } if field == "type"));
    }

    #[test]
    fn test_finish_ok_when_empty() {
        let mut raw = fields(json!({"name": "web"}));
        raw.take_string("name").unwrap();
        assert!(raw.finish().is_ok());
    }
}
