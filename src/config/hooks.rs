//! Lifecycle hooks configured through the `hooks` massager.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::section::Section;

/// A user-supplied hook.
///
/// All callbacks default to doing nothing, so a hook only implements the
/// events it cares about.
pub trait Hook: fmt::Debug + Send + Sync {
    fn before_start(&self, _server: &Section) {}

    fn after_start(&self, _server: &Section) {}

    /// Adjusts the options a startup script is rendered with.
    fn startup_script_options(&self, _options: &mut IndexMap<String, String>) {}
}

/// Ordered collection of hooks; every callback is dispatched to each hook
/// in the order the hooks were added.
#[derive(Debug, Clone, Default)]
pub struct Hooks {
    hooks: Vec<Arc<dyn Hook>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, hook: Arc<dyn Hook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Hook>> {
        self.hooks.iter()
    }

    pub fn before_start(&self, server: &Section) {
        for hook in &self.hooks {
            hook.before_start(server);
        }
    }

    pub fn after_start(&self, server: &Section) {
        for hook in &self.hooks {
            hook.after_start(server);
        }
    }

    pub fn startup_script_options(&self, options: &mut IndexMap<String, String>) {
        for hook in &self.hooks {
            hook.startup_script_options(options);
        }
    }
}
