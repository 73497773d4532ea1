//! File-based configuration source.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::ini::{self, IniDocument};
use super::ConfigError;

/// An INI file to load.
///
/// Files can be marked as required or optional. Required files that don't exist
/// cause an error; optional files that don't exist are silently skipped.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
}

impl FileSource {
    /// Creates a new file source.
    ///
    /// If `required` is true, parsing will fail if the file doesn't exist.
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and tokenizes the file.
    ///
    /// Returns `Ok(None)` if the file doesn't exist and is optional.
    pub fn load(&self) -> Result<Option<IniDocument>, ConfigError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let doc = ini::parse(&self.path.display().to_string(), &contents)?;
                debug!(path = %self.path.display(), sections = doc.len(), "loaded config file");
                Ok(Some(doc))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if self.required {
                    Err(ConfigError::FileNotFound(self.path.clone()))
                } else {
                    debug!(path = %self.path.display(), "optional config file not found, skipping");
                    Ok(None)
                }
            }
            Err(e) => Err(ConfigError::ReadError {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}
