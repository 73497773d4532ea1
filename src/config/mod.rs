//! Configuration loading, macro expansion and typed value access.

mod builder;
mod error;
mod file;
mod hooks;
mod ini;
pub mod massager;
mod names;
mod plugin;
mod resolve;
mod root;
mod section;
mod source;
mod value;

pub use builder::ConfigBuilder;
pub use error::ConfigError;
pub use hooks::{Hook, Hooks};
pub use ini::Options;
pub use massager::{CustomMassager, Massager, MassagerKey, MassagerKind};
pub use names::{HookFactory, MassagerFactory, Names, Resolver, BUILTIN_NAMESPACE};
pub use plugin::{MacroCleaner, Plugin};
pub use resolve::MACRO_KEY;
pub use root::{Config, SectionGroup, MASSAGERS_KEY};
pub use section::{Section, GROUPNAME_KEY, NAME_KEY};
pub use source::GLOBAL_GROUP;
pub use value::{StartupScript, Value};
