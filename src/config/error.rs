use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

use super::massager::MassagerKey;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse '{origin}' at line {line}: {message}")]
    ParseError {
        origin: String,
        line: usize,
        message: String,
    },

    #[error("invalid section name '{0}', expected 'name' or 'group:name'")]
    InvalidSectionName(String),

    #[error("'{0}' is a reserved key")]
    ReservedKey(String),

    #[error("unknown value '{value}' for {key} in {group}:{section}")]
    InvalidValue {
        value: String,
        key: String,
        group: String,
        section: String,
    },

    #[error("invalid integer '{value}' for {key} in {group}:{section}: {source}")]
    InvalidInteger {
        value: String,
        key: String,
        group: String,
        section: String,
        source: ParseIntError,
    },

    #[error("no option '{key}' in section {group}:{section}")]
    MissingKey {
        key: String,
        group: String,
        section: String,
    },

    #[error("massager for option '{}' in section group '{}' already registered", .0.key(), .0.group_label())]
    DuplicateMassager(MassagerKey),

    #[error("circular macro expansion at {group}:{section}")]
    CircularMacro { group: String, section: String },

    #[error("section {group}:{section} not found")]
    UnknownSection { group: String, section: String },

    #[error("malformed massager declaration '{0}', expected 'group:key = dotted.Name'")]
    MalformedMassagerSpec(String),

    #[error("cannot resolve '{name}': {reason}")]
    UnresolvableName { name: String, reason: String },

    #[error("cannot determine the current user: {0}")]
    UnknownUser(String),

    #[error("option '{key}' is not {expected}")]
    UnexpectedType { key: String, expected: &'static str },

    #[error("option '{0}' has no scalar representation")]
    NonScalarValue(String),

    #[error("failed to deserialize section: {0}")]
    DeserializeError(#[from] toml::de::Error),
}
