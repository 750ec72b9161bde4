//! Error types for config parsing and validation

use thiserror::Error;

/// Errors raised while structuring a config document
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("unknown field: {field}")]
    UnknownField { field: String },

    #[error("unexpected field: {field}")]
    UnexpectedField { field: String },

    #[error("field {field} must be {expected}")]
    InvalidFieldType {
        field: String,
        expected: &'static str,
    },

    #[error("source entry is missing a `type` tag")]
    MissingTypeTag,

    #[error("unknown source type: {tag}")]
    UnknownSourceType { tag: String },

    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidGlobSyntax { pattern: String, message: String },

    /// Wraps a structuring error with the position of the offending
    /// element in the `sources` sequence.
    #[error("sources[{index}]: {error}")]
    SourceAt {
        index: usize,
        #[source]
        error: Box<ConfigError>,
    },

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Attach the index of the source element this error originated from
    pub(crate) fn at_index(self, index: usize) -> Self {
        ConfigError::SourceAt {
            index,
            error: Box::new(self),
        }
    }
}

/// Result type for config operations
pub type Result<T> = std::result::Result<T, ConfigError>;
