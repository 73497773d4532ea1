//! Raw INI tokenizer.
//!
//! Produces an ordered `section -> {option: value}` document without any
//! interpretation of the values. The dialect follows the classic
//! `RawConfigParser` rules:
//!
//! - `[name]` starts a section, `[DEFAULT]` holds values shared by all sections
//! - options are `key = value` or `key: value`, option names keep their case
//! - indented lines continue the previous value, joined with `\n`
//! - `#` and `;` start full-line comments; the first `;` of a value starts
//!   an inline comment if whitespace precedes it

use indexmap::IndexMap;

use super::ConfigError;

const DEFAULT_SECTION: &str = "DEFAULT";

/// Options of one physical section, in source order.
pub type Options = IndexMap<String, String>;

/// A tokenized INI document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IniDocument {
    defaults: Options,
    sections: IndexMap<String, Options>,
}

impl IniDocument {
    /// Values of the `DEFAULT` section.
    ///
    /// They are not merged into [`sections`](Self::sections); the loader
    /// applies the defaults of all sources once every source is read.
    pub fn defaults(&self) -> &Options {
        &self.defaults
    }

    /// Iterates over every section with its own values only.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Options)> {
        self.sections.iter().map(|(name, options)| (name.as_str(), options))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }
}

/// Position of the option a continuation line appends to.
enum Cursor {
    None,
    Defaults(String),
    Section(String, String),
}

/// Tokenizes `text`. `origin` names the source in error messages.
pub fn parse(origin: &str, text: &str) -> Result<IniDocument, ConfigError> {
    let mut doc = IniDocument::default();
    let mut current: Option<String> = None;
    let mut cursor = Cursor::None;

    for (index, line) in text.lines().enumerate() {
        let lineno = index + 1;
        let error = |message: &str| ConfigError::ParseError {
            origin: origin.to_string(),
            line: lineno,
            message: message.to_string(),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if line.starts_with(char::is_whitespace) {
            let target = match &cursor {
                Cursor::None => return Err(error("continuation line without an option")),
                Cursor::Defaults(key) => doc.defaults.get_mut(key),
                Cursor::Section(section, key) => doc
                    .sections
                    .get_mut(section)
                    .and_then(|options| options.get_mut(key)),
            };
            if let Some(value) = target {
                value.push('\n');
                value.push_str(trimmed);
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let name = rest
                .find(']')
                .map(|end| &rest[..end])
                .filter(|name| !name.is_empty())
                .ok_or_else(|| error("malformed section header"))?;
            if name != DEFAULT_SECTION {
                doc.sections.entry(name.to_string()).or_default();
            }
            current = Some(name.to_string());
            cursor = Cursor::None;
            continue;
        }

        let (key, value) = split_option(line).ok_or_else(|| error("expected 'key = value'"))?;
        match current.as_deref() {
            None => return Err(error("option outside of a section")),
            Some(DEFAULT_SECTION) => {
                doc.defaults.insert(key.clone(), value);
                cursor = Cursor::Defaults(key);
            }
            Some(section) => {
                doc.sections
                    .entry(section.to_string())
                    .or_default()
                    .insert(key.clone(), value);
                cursor = Cursor::Section(section.to_string(), key);
            }
        }
    }

    Ok(doc)
}

/// Splits an option line on the first `=` or `:`.
fn split_option(line: &str) -> Option<(String, String)> {
    let split = line.find(['=', ':'])?;
    let key = line[..split].trim_end();
    if key.is_empty() {
        return None;
    }

    let mut value = line[split + 1..].trim_start();
    if let Some(pos) = value.find(';') {
        if value[..pos].ends_with(char::is_whitespace) {
            value = &value[..pos];
        }
    }
    let value = match value.trim() {
        "\"\"" => "",
        other => other,
    };

    Some((key.to_string(), value.to_string()))
}
