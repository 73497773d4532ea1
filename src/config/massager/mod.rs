//! Typed value conversion ("massaging").
//!
//! A [`Massager`] is bound to a `(group, key)` pair and turns the raw string
//! stored under that key into a typed [`Value`] when the key is read. Nothing
//! is cached; every read runs the conversion again.

mod builtin;
mod registry;

use std::fmt;
use std::sync::Arc;

pub use registry::MassagerRegistry;

use super::section::Section;
use super::value::Value;
use super::ConfigError;

/// Group label matching every section group.
pub const ANY_GROUP: &str = "*";

/// The `(group, key)` pair a massager is bound to. A `None` group matches
/// sections of any group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MassagerKey {
    group: Option<String>,
    key: String,
}

impl MassagerKey {
    pub fn new(group: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            key: key.into(),
        }
    }

    pub fn any_group(key: impl Into<String>) -> Self {
        Self {
            group: None,
            key: key.into(),
        }
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn group_label(&self) -> &str {
        self.group.as_deref().unwrap_or(ANY_GROUP)
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for MassagerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_label(), self.key)
    }
}

/// Extension point for conversions not covered by [`MassagerKind`].
pub trait CustomMassager: fmt::Debug + Send + Sync {
    /// Converts `raw`, the value stored under the massager's key in `section`.
    fn massage(&self, raw: &str, section: &Section, section_name: &str)
        -> Result<Value, ConfigError>;
}

/// The conversion a massager performs.
#[derive(Debug, Clone)]
pub enum MassagerKind {
    /// Returns the raw string unchanged.
    Raw,
    /// `true`/`yes`/`on` and `false`/`no`/`off`, case-insensitive.
    Boolean,
    /// Base-10 integer.
    Integer,
    /// Path with `~` expanded, relative paths joined to the config base path.
    Path,
    /// Whitespace-separated hook names, instantiated in order.
    Hooks,
    /// Newline-separated `group:key = dotted.Name` declarations.
    Massagers,
    /// Path optionally prefixed with `gzip:`.
    StartupScript,
    /// `*` means the user running the process.
    User,
    Custom(Arc<dyn CustomMassager>),
}

impl MassagerKind {
    pub const BUILTIN: [MassagerKind; 8] = [
        MassagerKind::Raw,
        MassagerKind::Boolean,
        MassagerKind::Integer,
        MassagerKind::Path,
        MassagerKind::Hooks,
        MassagerKind::Massagers,
        MassagerKind::StartupScript,
        MassagerKind::User,
    ];

    /// Name the kind is registered under in the builtin namespace.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Raw => "BaseMassager",
            Self::Boolean => "BooleanMassager",
            Self::Integer => "IntegerMassager",
            Self::Path => "PathMassager",
            Self::Hooks => "HooksMassager",
            Self::Massagers => "MassagersMassager",
            Self::StartupScript => "StartupScriptMassager",
            Self::User => "UserMassager",
            Self::Custom(_) => "CustomMassager",
        }
    }
}

impl PartialEq for MassagerKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            (Self::Custom(_), _) | (_, Self::Custom(_)) => false,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

/// A typed converter bound to a `(group, key)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Massager {
    key: MassagerKey,
    kind: MassagerKind,
}

impl Massager {
    pub fn new(key: MassagerKey, kind: MassagerKind) -> Self {
        Self { key, kind }
    }

    pub fn custom(key: MassagerKey, massager: impl CustomMassager + 'static) -> Self {
        Self::new(key, MassagerKind::Custom(Arc::new(massager)))
    }

    pub fn key(&self) -> &MassagerKey {
        &self.key
    }

    pub fn kind(&self) -> &MassagerKind {
        &self.kind
    }

    /// Converts the raw value stored under this massager's key in `section`.
    pub fn apply(&self, section: &Section, section_name: &str) -> Result<Value, ConfigError> {
        let key = self.key.key();
        let raw = section.raw(key).ok_or_else(|| ConfigError::MissingKey {
            key: key.to_string(),
            group: section.group().to_string(),
            section: section_name.to_string(),
        })?;

        match &self.kind {
            MassagerKind::Raw => Ok(Value::String(raw.to_string())),
            MassagerKind::Boolean => builtin::boolean(raw).map(Value::Bool).ok_or_else(|| {
                ConfigError::InvalidValue {
                    value: raw.to_string(),
                    key: key.to_string(),
                    group: section.group().to_string(),
                    section: section_name.to_string(),
                }
            }),
            MassagerKind::Integer => raw.trim().parse().map(Value::Integer).map_err(|source| {
                ConfigError::InvalidInteger {
                    value: raw.to_string(),
                    key: key.to_string(),
                    group: section.group().to_string(),
                    section: section_name.to_string(),
                    source,
                }
            }),
            MassagerKind::Path => Ok(Value::Path(builtin::absolute_path(
                raw,
                section.base_path().as_deref(),
            ))),
            MassagerKind::Hooks => builtin::hooks(raw, &section.names()).map(Value::Hooks),
            MassagerKind::Massagers => {
                builtin::massager_list(raw, &section.names()).map(Value::Massagers)
            }
            MassagerKind::StartupScript => Ok(Value::StartupScript(builtin::startup_script(
                raw,
                section.base_path().as_deref(),
            ))),
            MassagerKind::User => builtin::user(raw).map(Value::String),
            MassagerKind::Custom(custom) => custom.massage(raw, section, section_name),
        }
    }
}
