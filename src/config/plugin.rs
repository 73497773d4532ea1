use std::sync::Arc;

use super::ini::Options;
use super::massager::Massager;
use super::root::Config;

/// Rewrites a macro's values before they are merged into an inheriting
/// section. Cleaners are registered per group of the inheriting section and
/// always receive a copy, never the macro section itself.
pub type MacroCleaner = Arc<dyn Fn(&mut Options) + Send + Sync>;

/// Extends the configuration with massagers and macro cleaners.
pub trait Plugin {
    /// Massagers registered before the configuration's own declarations.
    fn massagers(&self) -> Vec<Massager> {
        Vec::new()
    }

    /// Macro cleaners keyed by section group name.
    fn macro_cleaners(&self, _config: &Config) -> Vec<(String, MacroCleaner)> {
        Vec::new()
    }
}
