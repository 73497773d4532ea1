use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::file::FileSource;
use super::hooks::Hook;
use super::ini::Options;
use super::massager::{Massager, MassagerKey};
use super::names::Names;
use super::plugin::Plugin;
use super::root::Config;
use super::source::ConfigSource;
use super::ConfigError;

/// Builder for loading a sectioned INI configuration.
///
/// Sources are read in registration order. Sections named `group:name` are
/// placed in `group`, plain `name` sections in the `global` group. When a
/// later source declares a section again, its values are stored over the
/// existing ones.
///
/// ## Macros
///
/// A section inherits the keys it lacks from the sections listed under `<`:
///
/// ```ini
/// [host:base]
/// user = deploy
///
/// [host:web]
/// < = base
/// ip = 10.0.0.5
/// ```
///
/// ## Massagers
///
/// Values are converted on read by massagers, declared in any section:
///
/// ```ini
/// [global:global]
/// massagers =
///     host:port = ploy.config.IntegerMassager
///     host:keyfile = ploy.config.PathMassager
/// ```
///
/// ## Example
///
/// ```no_run
/// use ploy_config::Config;
///
/// let config = Config::builder()
///     .with_file("etc/ploy.conf", true)
///     .with_file("etc/ploy.local.conf", false)
///     .parse()?;
///
/// let port = config["host"]["web"].get_integer("port")?;
/// # Ok::<(), ploy_config::ConfigError>(())
/// ```
#[must_use = "builders do nothing until .parse() is called"]
pub struct ConfigBuilder {
    sources: Vec<ConfigSource>,
    path: Option<PathBuf>,
    plugins: Vec<Box<dyn Plugin>>,
    names: Names,
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            sources: Vec::new(),
            path: None,
            plugins: Vec::new(),
            names: Names::builtin(),
        }
    }
}

impl ConfigBuilder {
    /// Adds an INI file to be loaded.
    ///
    /// If `required` is `true`, parsing fails if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.sources
            .push(ConfigSource::File(FileSource::new(path, required)));
        self
    }

    /// Adds INI text. `origin` names the text in parse errors.
    pub fn with_str(mut self, origin: impl Into<String>, content: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Text {
            origin: origin.into(),
            content: content.into(),
        });
        self
    }

    /// Sets the directory relative path values are resolved against.
    ///
    /// Defaults to the directory of the first file source.
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Makes a massager type available to `massagers` declarations under
    /// `dotted_name`.
    pub fn with_massager_type<F>(mut self, dotted_name: &str, factory: F) -> Self
    where
        F: Fn(MassagerKey) -> Massager + Send + Sync + 'static,
    {
        self.names.massagers.register(dotted_name, Arc::new(factory));
        self
    }

    /// Makes a hook type available to hooks massagers under `dotted_name`.
    pub fn with_hook_type<F>(mut self, dotted_name: &str, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Hook> + Send + Sync + 'static,
    {
        self.names.hooks.register(dotted_name, Arc::new(factory));
        self
    }

    /// Loads all sources, expands macros and registers massagers.
    ///
    /// Every call reads the sources again.
    pub fn parse(&self) -> Result<Config, ConfigError> {
        let mut config = Config::empty(self.base_path(), self.names.clone());

        for plugin in &self.plugins {
            for massager in plugin.massagers() {
                config.add_massager(massager)?;
            }
            let cleaners = plugin.macro_cleaners(&config);
            config.macro_cleaners.extend(cleaners);
        }

        let mut defaults = Options::new();
        for source in &self.sources {
            let contents = source.read()?;
            defaults.extend(contents.defaults);
            for entry in contents.entries {
                config.ingest(entry)?;
            }
        }
        config.apply_defaults(&defaults)?;

        config.drop_legacy_groups();
        config.expand_macros()?;
        config.register_declared_massagers()?;

        debug!(
            groups = config.groups().count(),
            path = %config.path().display(),
            "parsed configuration"
        );
        Ok(config)
    }

    fn base_path(&self) -> PathBuf {
        self.path
            .clone()
            .or_else(|| {
                self.sources
                    .iter()
                    .find_map(ConfigSource::directory)
                    .map(Path::to_path_buf)
            })
            .unwrap_or_default()
    }
}
