use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::{Massager, MassagerKey};
use crate::config::ConfigError;

/// Massagers indexed by the `(group, key)` pair they are bound to.
///
/// At most one massager may be bound to a pair; a second registration fails
/// and leaves the first in place.
#[derive(Debug, Clone, Default)]
pub struct MassagerRegistry {
    massagers: HashMap<MassagerKey, Massager>,
}

impl MassagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, massager: Massager) -> Result<(), ConfigError> {
        match self.massagers.entry(massager.key().clone()) {
            Entry::Occupied(entry) => Err(ConfigError::DuplicateMassager(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(massager);
                Ok(())
            }
        }
    }

    /// Looks up the massager for `key` in `group`; a `None` group looks up
    /// the any-group registration.
    pub fn get(&self, group: Option<&str>, key: &str) -> Option<&Massager> {
        let lookup = match group {
            Some(group) => MassagerKey::new(group, key),
            None => MassagerKey::any_group(key),
        };
        self.massagers.get(&lookup)
    }

    pub fn len(&self) -> usize {
        self.massagers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.massagers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Massager> {
        self.massagers.values()
    }
}
