use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::hooks::Hooks;
use super::massager::Massager;
use super::ConfigError;

/// A startup script reference, optionally gzip-compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupScript {
    pub path: PathBuf,
    pub gzip: bool,
}

/// A value read from a section, after massaging.
#[derive(Clone)]
pub enum Value {
    /// The raw stored string, or a massager result that is text.
    String(String),
    Bool(bool),
    Integer(i64),
    Path(PathBuf),
    Hooks(Hooks),
    Massagers(Vec<Massager>),
    StartupScript(StartupScript),
    /// Result of a user-defined massager.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p.as_path()),
            _ => None,
        }
    }

    pub fn as_hooks(&self) -> Option<&Hooks> {
        match self {
            Self::Hooks(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_massagers(&self) -> Option<&[Massager]> {
        match self {
            Self::Massagers(m) => Some(m.as_slice()),
            _ => None,
        }
    }

    pub fn as_startup_script(&self) -> Option<&StartupScript> {
        match self {
            Self::StartupScript(s) => Some(s),
            _ => None,
        }
    }

    /// Downcasts a custom value.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(value) => value.downcast_ref(),
            _ => None,
        }
    }

    /// Converts a scalar value to TOML for serde deserialization.
    pub(crate) fn to_toml(&self, key: &str) -> Result<toml::Value, ConfigError> {
        match self {
            Self::String(s) => Ok(toml::Value::String(s.clone())),
            Self::Bool(b) => Ok(toml::Value::Boolean(*b)),
            Self::Integer(i) => Ok(toml::Value::Integer(*i)),
            Self::Path(p) => Ok(toml::Value::String(p.display().to_string())),
            Self::StartupScript(script) => {
                let mut table = toml::Table::new();
                table.insert(
                    "path".into(),
                    toml::Value::String(script.path.display().to_string()),
                );
                table.insert("gzip".into(), toml::Value::Boolean(script.gzip));
                Ok(toml::Value::Table(table))
            }
            Self::Hooks(_) | Self::Massagers(_) | Self::Custom(_) => {
                Err(ConfigError::NonScalarValue(key.to_string()))
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Integer(i) => f.debug_tuple("Integer").field(i).finish(),
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::Hooks(h) => f.debug_tuple("Hooks").field(h).finish(),
            Self::Massagers(m) => f.debug_tuple("Massagers").field(m).finish(),
            Self::StartupScript(s) => f.debug_tuple("StartupScript").field(s).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Compares by content; hook collections and custom values are never equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Path(a), Self::Path(b)) => a == b,
            (Self::Massagers(a), Self::Massagers(b)) => a == b,
            (Self::StartupScript(a), Self::StartupScript(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}
