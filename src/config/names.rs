//! Dotted-name resolution.
//!
//! Massager and hook types are referenced from configuration text by dotted
//! names such as `ploy.config.BooleanMassager`. Instead of loading code at
//! runtime, every name is registered up front with a factory; resolution
//! splits the name at its last `.` into a namespace and an attribute.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::hooks::Hook;
use super::massager::{Massager, MassagerKey, MassagerKind};
use super::ConfigError;

/// Namespace under which the built-in massagers are registered.
pub const BUILTIN_NAMESPACE: &str = "ploy.config";

/// Constructs a massager bound to a `(group, key)` pair.
pub type MassagerFactory = Arc<dyn Fn(MassagerKey) -> Massager + Send + Sync>;

/// Constructs a hook with no arguments.
pub type HookFactory = Arc<dyn Fn() -> Arc<dyn Hook> + Send + Sync>;

/// Registry of named items, addressed by dotted names.
#[derive(Clone)]
pub struct Resolver<T> {
    units: HashMap<String, T>,
    namespaces: HashMap<String, HashMap<String, T>>,
}

impl<T> Default for Resolver<T> {
    fn default() -> Self {
        Self {
            units: HashMap::new(),
            namespaces: HashMap::new(),
        }
    }
}

impl<T: Clone> Resolver<T> {
    /// Registers `item` under `dotted`, replacing any earlier registration.
    pub fn register(&mut self, dotted: &str, item: T) {
        match dotted.rsplit_once('.') {
            Some((namespace, name)) => {
                self.namespaces
                    .entry(namespace.to_string())
                    .or_default()
                    .insert(name.to_string(), item);
            }
            None => {
                self.units.insert(dotted.to_string(), item);
            }
        }
    }

    /// Looks up a dotted name.
    pub fn resolve(&self, dotted: &str) -> Result<T, ConfigError> {
        let unresolvable = |reason: String| ConfigError::UnresolvableName {
            name: dotted.to_string(),
            reason,
        };

        match dotted.rsplit_once('.') {
            Some((namespace, name)) => {
                let items = self
                    .namespaces
                    .get(namespace)
                    .ok_or_else(|| unresolvable(format!("no namespace '{namespace}'")))?;
                items
                    .get(name)
                    .cloned()
                    .ok_or_else(|| unresolvable(format!("'{namespace}' has no attribute '{name}'")))
            }
            None => self
                .units
                .get(dotted)
                .cloned()
                .ok_or_else(|| unresolvable("no such unit".to_string())),
        }
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.units.keys().cloned().collect();
        for (namespace, items) in &self.namespaces {
            names.extend(items.keys().map(|name| format!("{namespace}.{name}")));
        }
        names.sort();
        names
    }
}

impl<T: Clone> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// The resolvers consulted while massaging values.
#[derive(Debug, Clone)]
pub struct Names {
    pub massagers: Resolver<MassagerFactory>,
    pub hooks: Resolver<HookFactory>,
}

impl Names {
    /// Creates the registry with every built-in massager registered.
    pub fn builtin() -> Self {
        let mut massagers: Resolver<MassagerFactory> = Resolver::default();
        for kind in MassagerKind::BUILTIN {
            let name = format!("{BUILTIN_NAMESPACE}.{}", kind.type_name());
            let factory: MassagerFactory =
                Arc::new(move |key: MassagerKey| Massager::new(key, kind.clone()));
            massagers.register(&name, factory);
        }
        Self {
            massagers,
            hooks: Resolver::default(),
        }
    }
}

impl Default for Names {
    fn default() -> Self {
        Self::builtin()
    }
}
