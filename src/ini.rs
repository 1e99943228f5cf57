//! Minimal INI-style section reader.
//!
//! Produces an ordered tree of named sections. Every section keeps both its
//! ordered `key = value` pairs and its raw body lines, so that sections such
//! as `bgp_communities` (whose keys contain `:`) can be re-read line by line.
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use tracing::warn;

use crate::LgError;

/// A named section of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    name: String,
    keys: Vec<(String, String)>,
    body: Vec<String>,
}

impl Section {
    fn new(name: &str) -> Self {
        Section {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Key/value pairs in declaration order.
    pub fn keys(&self) -> &[(String, String)] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.keys
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get a value, falling back to `default` when the key is unset.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// Parse a value into `T`.
    ///
    /// Unset keys keep `default`. Values that fail to parse keep `default` as
    /// well and are reported as a warning.
    pub fn parse_or<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            None => default,
            Some(raw) => match raw.parse::<T>() {
                Ok(v) => v,
                Err(e) => {
                    warn!(
                        "ignoring invalid value for {}.{} ({}): {}",
                        self.name, key, raw, e
                    );
                    default
                }
            },
        }
    }

    /// The raw section body, one line per entry.
    pub fn body(&self) -> String {
        self.body.join("\n")
    }

    fn set(&mut self, key: String, value: String) {
        match self.keys.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.keys.push((key, value)),
        }
    }
}

static EMPTY_SECTION: Section = Section {
    name: String::new(),
    keys: Vec::new(),
    body: Vec::new(),
};

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniFile {
    sections: Vec<Section>,
}

impl IniFile {
    /// Read and parse the file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LgError> {
        let content = std::fs::read_to_string(path)?;
        Ok(parse(content.as_str()))
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Like [IniFile::section], but an absent section reads as an empty one.
    pub fn section_or_empty(&self, name: &str) -> &Section {
        self.section(name).unwrap_or(&EMPTY_SECTION)
    }

    /// All sections nested below `name`, i.e. named `<name>.<something>`.
    pub fn child_sections(&self, name: &str) -> Vec<&Section> {
        let prefix = format!("{}.", name);
        self.sections
            .iter()
            .filter(|s| s.name.starts_with(prefix.as_str()))
            .collect()
    }
}

impl FromStr for IniFile {
    type Err = LgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse(s))
    }
}

fn parse(content: &str) -> IniFile {
    let mut sections = vec![Section::new("")];
    let mut current = 0;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim();
            // re-opening a section appends to it
            current = match sections.iter().position(|s| s.name == name) {
                Some(idx) => idx,
                None => {
                    sections.push(Section::new(name));
                    sections.len() - 1
                }
            };
            continue;
        }

        let section = &mut sections[current];
        section.body.push(line.to_string());
        if let Some((key, value)) = line.split_once('=') {
            let value = strip_inline_comment(value.trim());
            section.set(key.trim().to_string(), unquote(value).to_string());
        }
    }

    IniFile { sections }
}

/// Cut a trailing `;` or `#` comment preceded by whitespace. Quoted values
/// end at their closing quote.
fn strip_inline_comment(value: &str) -> &str {
    if let Some(end) = value.strip_prefix('"').and_then(|v| v.find('"')) {
        return &value[..end + 2];
    }
    let mut prev_is_space = false;
    for (idx, c) in value.char_indices() {
        if prev_is_space && (c == ';' || c == '#') {
            return value[..idx].trim_end();
        }
        prev_is_space = c.is_whitespace();
    }
    value
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
