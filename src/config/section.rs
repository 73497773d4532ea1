//! A named collection of raw key/value entries.

use std::path::PathBuf;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use super::massager::{Massager, MassagerRegistry};
use super::names::Names;
use super::root::ConfigContext;
use super::value::Value;
use super::ConfigError;

/// Pseudo-key resolving to the section's group name.
pub const GROUPNAME_KEY: &str = "__groupname__";
/// Pseudo-key resolving to the section's name.
pub const NAME_KEY: &str = "__name__";

/// One configuration section, such as `[host:web]`.
///
/// Values are stored as raw strings and converted on every read by the
/// massager cascade (see [`get`](Self::get)). Writes are never validated.
///
/// A section parsed from a [`Config`](super::Config) keeps a non-owning
/// reference to it. Once the config is dropped the section behaves like a
/// freestanding one and only its own massagers apply.
#[derive(Debug)]
pub struct Section {
    group: String,
    name: String,
    values: IndexMap<String, String>,
    config: Weak<ConfigContext>,
    massagers: MassagerRegistry,
}

impl Section {
    /// Creates a freestanding section, not attached to any config.
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self::attached(group, name, Weak::new())
    }

    pub(crate) fn attached(
        group: impl Into<String>,
        name: impl Into<String>,
        config: Weak<ConfigContext>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            values: IndexMap::new(),
            config,
            massagers: MassagerRegistry::new(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a massager on this section only.
    ///
    /// Section massagers rank below the config's massagers for the same key.
    pub fn add_massager(&mut self, massager: Massager) -> Result<(), ConfigError> {
        self.massagers.add(massager)
    }

    /// Reads `key`, applying the first massager found in this order:
    ///
    /// 1. the config's massager for `(group, key)`
    /// 2. the config's any-group massager for `key`
    /// 3. this section's massager for `(group, key)`
    ///
    /// Without a massager the raw string is returned. `__groupname__` and
    /// `__name__` resolve to the section's identity.
    pub fn get(&self, key: &str) -> Result<Value, ConfigError> {
        match key {
            GROUPNAME_KEY => return Ok(Value::String(self.group.clone())),
            NAME_KEY => return Ok(Value::String(self.name.clone())),
            _ => {}
        }

        let Some(raw) = self.values.get(key) else {
            return Err(ConfigError::MissingKey {
                key: key.to_string(),
                group: self.group.clone(),
                section: self.name.clone(),
            });
        };

        if let Some(config) = self.config.upgrade() {
            // Clone out so the lock is not held while the massager runs.
            let massager = {
                let registry = config.massagers.read();
                registry
                    .get(Some(self.group.as_str()), key)
                    .or_else(|| registry.get(None, key))
                    .cloned()
            };
            if let Some(massager) = massager {
                return massager.apply(self, &self.name);
            }
        }

        if let Some(massager) = self.massagers.get(Some(self.group.as_str()), key) {
            return massager.apply(self, &self.name);
        }

        Ok(Value::String(raw.clone()))
    }

    pub fn get_str(&self, key: &str) -> Result<String, ConfigError> {
        match self.get(key)? {
            Value::String(s) => Ok(s),
            _ => Err(unexpected(key, "a string")),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        self.get(key)?
            .as_bool()
            .ok_or_else(|| unexpected(key, "a boolean"))
    }

    pub fn get_integer(&self, key: &str) -> Result<i64, ConfigError> {
        self.get(key)?
            .as_integer()
            .ok_or_else(|| unexpected(key, "an integer"))
    }

    pub fn get_path(&self, key: &str) -> Result<PathBuf, ConfigError> {
        match self.get(key)? {
            Value::Path(path) => Ok(path),
            _ => Err(unexpected(key, "a path")),
        }
    }

    /// Returns the stored string without massaging.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn raw_values(&self) -> &IndexMap<String, String> {
        &self.values
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Stores a raw value. Reserved pseudo-keys are rejected.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let key = key.into();
        if key == GROUPNAME_KEY || key == NAME_KEY {
            return Err(ConfigError::ReservedKey(key));
        }
        self.values.insert(key, value.into());
        Ok(())
    }

    /// Stores every pair, later pairs overriding earlier ones.
    pub fn update<I, K, V>(&mut self, values: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in values {
            self.set(key, value)?;
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns a detached snapshot with the same values, identity and
    /// config reference. Massagers added to this section are not carried
    /// over.
    pub fn copy(&self) -> Self {
        Self {
            group: self.group.clone(),
            name: self.name.clone(),
            values: self.values.clone(),
            config: self.config.clone(),
            massagers: MassagerRegistry::new(),
        }
    }

    /// Reads every key through the massager cascade and deserializes the
    /// result into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        let mut table = toml::Table::new();
        for key in self.values.keys() {
            table.insert(key.clone(), self.get(key)?.to_toml(key)?);
        }
        toml::Value::Table(table)
            .try_into()
            .map_err(ConfigError::DeserializeError)
    }

    pub(crate) fn base_path(&self) -> Option<PathBuf> {
        self.config.upgrade().map(|config| config.path.clone())
    }

    pub(crate) fn names(&self) -> Arc<Names> {
        self.config
            .upgrade()
            .map(|config| Arc::clone(&config.names))
            .unwrap_or_else(|| Arc::new(Names::builtin()))
    }
}

fn unexpected(key: &str, expected: &'static str) -> ConfigError {
    ConfigError::UnexpectedType {
        key: key.to_string(),
        expected,
    }
}
