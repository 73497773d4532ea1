use std::path::Path;

use super::file::FileSource;
use super::ini::{self, IniDocument, Options};
use super::ConfigError;

/// Group assigned to sections declared without a `group:` prefix.
pub const GLOBAL_GROUP: &str = "global";

/// Options for one `(group, section)` pair as read from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub group: String,
    pub name: String,
    pub options: Options,
}

impl RawEntry {
    /// Splits a section header into group and name.
    pub fn from_header(header: &str, options: Options) -> Result<Self, ConfigError> {
        let (group, name) = match header.split_once(':') {
            Some((_, name)) if name.contains(':') => {
                return Err(ConfigError::InvalidSectionName(header.to_string()));
            }
            Some((group, name)) => (group, name),
            None => (GLOBAL_GROUP, header),
        };
        Ok(Self {
            group: group.to_string(),
            name: name.to_string(),
            options,
        })
    }
}

/// What one source contributes: its `DEFAULT` values and its sections.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SourceContents {
    pub defaults: Options,
    pub entries: Vec<RawEntry>,
}

/// A configuration source in the loading pipeline.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    File(FileSource),
    Text { origin: String, content: String },
}

impl ConfigSource {
    /// Directory of a file source, used as the default base path.
    pub fn directory(&self) -> Option<&Path> {
        match self {
            Self::File(file) => file.path().parent(),
            Self::Text { .. } => None,
        }
    }

    /// Reads the source. A missing optional file contributes nothing.
    pub fn read(&self) -> Result<SourceContents, ConfigError> {
        let doc = match self {
            Self::File(file) => match file.load()? {
                Some(doc) => doc,
                None => return Ok(SourceContents::default()),
            },
            Self::Text { origin, content } => ini::parse(origin, content)?,
        };
        contents_of(&doc)
    }
}

fn contents_of(doc: &IniDocument) -> Result<SourceContents, ConfigError> {
    let entries = doc
        .sections()
        .map(|(header, options)| RawEntry::from_header(header, options.clone()))
        .collect::<Result<_, _>>()?;
    Ok(SourceContents {
        defaults: doc.defaults().clone(),
        entries,
    })
}
