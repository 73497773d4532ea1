use std::collections::HashMap;
use std::fmt;
use std::ops::Index;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::ini::Options;
use super::massager::{Massager, MassagerKey, MassagerKind, MassagerRegistry};
use super::names::Names;
use super::plugin::MacroCleaner;
use super::section::Section;
use super::source::RawEntry;
use super::value::Value;
use super::ConfigError;

/// Group dropped after parsing; it is no longer used.
const LEGACY_PLUGIN_GROUP: &str = "plugin";

/// Key declaring massagers from within the configuration.
pub const MASSAGERS_KEY: &str = "massagers";

/// State shared between a [`Config`] and its sections.
#[derive(Debug)]
pub(crate) struct ConfigContext {
    pub(crate) path: PathBuf,
    pub(crate) names: Arc<Names>,
    pub(crate) massagers: RwLock<MassagerRegistry>,
}

/// Sections of one group, keyed by section name.
#[derive(Debug, Default)]
pub struct SectionGroup {
    sections: IndexMap<String, Section>,
}

impl SectionGroup {
    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections.iter().map(|(name, section)| (name.as_str(), section))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl Index<&str> for SectionGroup {
    type Output = Section;

    fn index(&self, name: &str) -> &Section {
        self.get(name)
            .unwrap_or_else(|| panic!("no section named '{name}'"))
    }
}

/// The parsed configuration: section groups, the massager registry and the
/// base path relative filesystem values are resolved against.
///
/// Built by [`ConfigBuilder::parse`](super::ConfigBuilder::parse).
pub struct Config {
    groups: IndexMap<String, SectionGroup>,
    context: Arc<ConfigContext>,
    pub(super) macro_cleaners: HashMap<String, MacroCleaner>,
}

impl Config {
    pub(super) fn empty(path: PathBuf, names: Names) -> Self {
        Self {
            groups: IndexMap::new(),
            context: Arc::new(ConfigContext {
                path,
                names: Arc::new(names),
                massagers: RwLock::new(MassagerRegistry::new()),
            }),
            macro_cleaners: HashMap::new(),
        }
    }

    /// Base directory for relative path values.
    pub fn path(&self) -> &Path {
        &self.context.path
    }

    pub fn group(&self, name: &str) -> Option<&SectionGroup> {
        self.groups.get(name)
    }

    pub fn contains_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &SectionGroup)> {
        self.groups.iter().map(|(name, group)| (name.as_str(), group))
    }

    pub fn section(&self, group: &str, name: &str) -> Option<&Section> {
        self.groups.get(group)?.get(name)
    }

    pub fn section_mut(&mut self, group: &str, name: &str) -> Option<&mut Section> {
        self.groups.get_mut(group)?.get_mut(name)
    }

    /// Registers a massager for every section of its group, or of every
    /// group for an any-group key.
    pub fn add_massager(&self, massager: Massager) -> Result<(), ConfigError> {
        debug!(key = %massager.key(), kind = massager.kind().type_name(), "registering massager");
        self.context.massagers.write().add(massager)
    }

    /// Returns a copy of the section with `overrides` stored over its values.
    ///
    /// The section in the configuration is left untouched. Pass an empty
    /// collection for no overrides.
    pub fn get_section_with_overrides<I, K, V>(
        &self,
        group: &str,
        name: &str,
        overrides: I,
    ) -> Result<Section, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut section = self
            .section(group, name)
            .ok_or_else(|| ConfigError::UnknownSection {
                group: group.to_string(),
                section: name.to_string(),
            })?
            .copy();
        section.update(overrides)?;
        Ok(section)
    }

    /// Merges one source entry, creating the group and section on first use.
    pub(super) fn ingest(&mut self, entry: RawEntry) -> Result<(), ConfigError> {
        let group = self.groups.entry(entry.group.clone()).or_default();
        let section = group
            .sections
            .entry(entry.name.clone())
            .or_insert_with(|| {
                Section::attached(entry.group, entry.name, Arc::downgrade(&self.context))
            });
        section.update(entry.options)
    }

    /// Fills the keys a section lacks from the merged `DEFAULT` values of
    /// every source.
    pub(super) fn apply_defaults(&mut self, defaults: &Options) -> Result<(), ConfigError> {
        for group in self.groups.values_mut() {
            for section in group.sections.values_mut() {
                for (key, value) in defaults {
                    if !section.contains_key(key) {
                        section.set(key.as_str(), value.as_str())?;
                    }
                }
            }
        }
        Ok(())
    }

    pub(super) fn drop_legacy_groups(&mut self) {
        if self.groups.shift_remove(LEGACY_PLUGIN_GROUP).is_some() {
            warn!(
                group = LEGACY_PLUGIN_GROUP,
                "the 'plugin' section group isn't used anymore and was ignored"
            );
        }
    }

    /// Registers the massagers every section declares under `massagers`.
    pub(super) fn register_declared_massagers(&self) -> Result<(), ConfigError> {
        let mut declared = Vec::new();
        for group in self.groups.values() {
            for section in group.sections.values() {
                if !section.contains_key(MASSAGERS_KEY) {
                    continue;
                }
                let list = Massager::new(
                    MassagerKey::new(section.group(), MASSAGERS_KEY),
                    MassagerKind::Massagers,
                );
                if let Value::Massagers(massagers) = list.apply(section, section.name())? {
                    declared.extend(massagers);
                }
            }
        }

        for massager in declared {
            self.add_massager(massager)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("groups", &self.groups)
            .field("context", &self.context)
            .field("macro_cleaners", &self.macro_cleaners.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Index<&str> for Config {
    type Output = SectionGroup;

    fn index(&self, group: &str) -> &SectionGroup {
        self.group(group)
            .unwrap_or_else(|| panic!("no section group named '{group}'"))
    }
}
