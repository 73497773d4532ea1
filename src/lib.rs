pub mod config;

pub use config::{Config, ConfigBuilder, ConfigError, Section, Value};
