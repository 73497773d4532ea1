//! Macro expansion.
//!
//! A section can inherit values from other sections by listing them under
//! the `<` key, separated by whitespace. A bare `name` refers to a section in
//! the same group, `group:name` to a section in another group:
//!
//! ```ini
//! [host:base]
//! user = deploy
//! port = 22
//!
//! [host:web]
//! < = base
//! port = 80
//! ```
//!
//! Only keys the section does not define are copied, and earlier macros win
//! over later ones. Macros that declare macros themselves are expanded first.

use std::collections::HashSet;

use tracing::debug;

use super::root::Config;
use super::ConfigError;

/// Key listing the macros a section inherits from.
pub const MACRO_KEY: &str = "<";

type Visited = HashSet<(String, String)>;

impl Config {
    /// Expands every section that declares macros and removes the `<` key.
    ///
    /// Running it again on an expanded config does nothing.
    pub fn expand_macros(&mut self) -> Result<(), ConfigError> {
        let pending: Vec<(String, String)> = self
            .groups()
            .flat_map(|(group, sections)| {
                sections
                    .iter()
                    .filter(|(_, section)| section.contains_key(MACRO_KEY))
                    .map(move |(name, _)| (group.to_string(), name.to_string()))
            })
            .collect();

        for (group, name) in pending {
            // Sections used as a macro earlier are already expanded.
            let still_pending = self
                .section(&group, &name)
                .is_some_and(|section| section.contains_key(MACRO_KEY));
            if still_pending {
                self.expand_section(&group, &name, &mut Visited::new())?;
            }
        }
        Ok(())
    }

    fn expand_section(
        &mut self,
        group: &str,
        name: &str,
        visited: &mut Visited,
    ) -> Result<(), ConfigError> {
        if !visited.insert((group.to_string(), name.to_string())) {
            return Err(ConfigError::CircularMacro {
                group: group.to_string(),
                section: name.to_string(),
            });
        }

        let references = self
            .section(group, name)
            .and_then(|section| section.raw(MACRO_KEY))
            .unwrap_or_default()
            .to_string();

        for reference in references.split_whitespace() {
            let (macro_group, macro_name) = reference.split_once(':').unwrap_or((group, reference));
            let unknown = || ConfigError::UnknownSection {
                group: macro_group.to_string(),
                section: macro_name.to_string(),
            };

            let nested = self
                .section(macro_group, macro_name)
                .ok_or_else(unknown)?
                .contains_key(MACRO_KEY);
            if nested {
                self.expand_section(macro_group, macro_name, visited)?;
            }

            let mut inherited = self
                .section(macro_group, macro_name)
                .ok_or_else(unknown)?
                .raw_values()
                .clone();
            if let Some(cleaner) = self.macro_cleaners.get(group) {
                cleaner(&mut inherited);
            }

            let section = self
                .section_mut(group, name)
                .ok_or_else(|| ConfigError::UnknownSection {
                    group: group.to_string(),
                    section: name.to_string(),
                })?;
            for (key, value) in inherited {
                if !section.contains_key(&key) {
                    section.set(key, value)?;
                }
            }
            debug!(group, section = name, %reference, "expanded macro");
        }

        // Removed only after the recursive expansion so cycles through this
        // section are still detected.
        if let Some(section) = self.section_mut(group, name) {
            section.remove(MACRO_KEY);
        }
        Ok(())
    }
}
