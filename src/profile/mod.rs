//! Reading and writing the profile-based AWS files (`credentials`, `config`).
//!
//! The format is the loose INI dialect AWS tooling uses. Reading is lenient:
//! anything that is not a section header or a `key = value` line inside a
//! section is dropped.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

pub mod expiry;
pub mod writer;

pub use expiry::{Expiry, ProfileStatus, find_profile, is_expired};
pub use writer::{DefaultProfile, RewriteOptions, RewriteReport, rewrite};

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ProfileError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One `[name]` section and its attributes, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    pub name: String,
    attributes: Vec<(String, String)>,
}

impl ProfileEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Builder form of [`ProfileEntry::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set an attribute. An existing key keeps its position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    fn clear(&mut self) {
        self.attributes.clear();
    }
}

impl fmt::Display for ProfileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.name)?;
        for (key, value) in self.attributes() {
            writeln!(f, "{key} = {value}")?;
        }
        writeln!(f)
    }
}

/// Parsed contents of a profile file, sections in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFile {
    sections: Vec<ProfileEntry>,
}

impl ProfileFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse file contents. Never fails; malformed lines are skipped.
    pub fn parse(raw: &str) -> Self {
        let mut file = Self::new();
        let mut current: Option<usize> = None;

        for line in raw.trim_start_matches('\u{feff}').lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line.len() >= 2 && line.starts_with('[') && line.ends_with(']') {
                let name = &line[1..line.len() - 1];
                current = Some(file.open_section(name));
                continue;
            }

            let Some(index) = current else {
                continue;
            };

            match line.find('=') {
                Some(pos) if pos > 0 => {
                    let key = line[..pos].trim();
                    let value = line[pos + 1..].trim();
                    file.sections[index].set(key, value);
                }
                _ => debug!("Skipping malformed line in section {}", file.sections[index].name),
            }
        }

        file
    }

    /// Read and parse `path`. A missing file is an empty profile file and
    /// bytes that are not UTF-8 are replaced rather than rejected.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        match fs::read(path) {
            Ok(raw) => Ok(Self::parse(&String::from_utf8_lossy(&raw))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} does not exist yet", path.display());
                Ok(Self::new())
            }
            Err(e) => Err(ProfileError::io(path, e)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ProfileEntry> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProfileEntry> {
        self.sections.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Re-opening a section starts it over at its original position.
    fn open_section(&mut self, name: &str) -> usize {
        match self.sections.iter().position(|s| s.name == name) {
            Some(index) => {
                self.sections[index].clear();
                index
            }
            None => {
                self.sections.push(ProfileEntry::new(name));
                self.sections.len() - 1
            }
        }
    }
}

impl fmt::Display for ProfileFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            write!(f, "{section}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[default]
aws_access_key_id = AKIADEFAULT
aws_secret_access_key = secret/with=equals

[work]
aws_access_key_id=AKIAWORK
region = eu-west-1
";

    #[test]
    fn test_parse_sections_in_order() {
        let file = ProfileFile::parse(SAMPLE);
        assert_eq!(file.names().collect::<Vec<_>>(), vec!["default", "work"]);

        let default = file.get("default").unwrap();
        assert_eq!(default.get("aws_access_key_id"), Some("AKIADEFAULT"));
        assert_eq!(
            default.get("aws_secret_access_key"),
            Some("secret/with=equals")
        );

        let work = file.get("work").unwrap();
        assert_eq!(work.get("aws_access_key_id"), Some("AKIAWORK"));
        assert_eq!(work.get("region"), Some("eu-west-1"));
    }

    #[test]
    fn test_parse_crlf_and_whitespace() {
        let raw = "  [work]  \r\n\r\n   region   =   us-east-2  \r\n\toutput= json\r\n";
        let file = ProfileFile::parse(raw);
        let work = file.get("work").unwrap();
        assert_eq!(work.get("region"), Some("us-east-2"));
        assert_eq!(work.get("output"), Some("json"));
        assert_eq!(work.len(), 2);
    }

    #[test]
    fn test_parse_drops_malformed_lines() {
        let raw = "\
orphan = value
[work]
no equals sign here
= leading equals
key =
region = us-west-2
";
        let file = ProfileFile::parse(raw);
        assert_eq!(file.len(), 1);

        let work = file.get("work").unwrap();
        assert_eq!(
            work.attributes().collect::<Vec<_>>(),
            vec![("key", ""), ("region", "us-west-2")]
        );
    }

    #[test]
    fn test_parse_section_names_are_not_validated() {
        let file = ProfileFile::parse("[profile my work]\na = 1\n[]\nb = 2\n");
        assert_eq!(
            file.names().collect::<Vec<_>>(),
            vec!["profile my work", ""]
        );
        assert_eq!(file.get("").unwrap().get("b"), Some("2"));
    }

    #[test]
    fn test_parse_reopened_section_last_write_wins() {
        let raw = "[a]\nx = 1\ny = 2\n[b]\nz = 3\n[a]\nx = 9\n";
        let file = ProfileFile::parse(raw);
        assert_eq!(file.names().collect::<Vec<_>>(), vec!["a", "b"]);

        let a = file.get("a").unwrap();
        assert_eq!(a.get("x"), Some("9"));
        assert_eq!(a.get("y"), None);
    }

    #[test]
    fn test_parse_duplicate_key_keeps_last_value() {
        let file = ProfileFile::parse("[a]\nx = 1\nx = 2\n");
        let a = file.get("a").unwrap();
        assert_eq!(a.get("x"), Some("2"));
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(ProfileFile::parse("").is_empty());
        assert!(ProfileFile::parse("\n\n   \r\n").is_empty());
    }

    #[test]
    fn test_serialize_then_parse_preserves_content() {
        let original = ProfileFile::parse(SAMPLE);
        let reparsed = ProfileFile::parse(&original.to_string());
        assert_eq!(original, reparsed);

        let crlf = SAMPLE.replace('\n', "\r\n");
        assert_eq!(ProfileFile::parse(&crlf), original);
    }

    #[test]
    fn test_entry_display() {
        let entry = ProfileEntry::new("profile work")
            .with("region", "eu-central-1")
            .with("output", "json");
        assert_eq!(
            entry.to_string(),
            "[profile work]\nregion = eu-central-1\noutput = json\n\n"
        );
    }

    #[test]
    fn test_entry_set_replaces_in_place() {
        let mut entry = ProfileEntry::new("a").with("x", "1").with("y", "2");
        entry.set("x", "3");
        assert_eq!(
            entry.attributes().collect::<Vec<_>>(),
            vec![("x", "3"), ("y", "2")]
        );
    }

    #[test]
    fn test_parse_skips_leading_byte_order_mark() {
        let file = ProfileFile::parse(
            "\u{feff}[default]\naws_access_key_id = AKIAPERM\n\n[other]\nk = v\n",
        );
        assert_eq!(file.names().collect::<Vec<_>>(), vec!["default", "other"]);
        assert_eq!(
            file.get("default").unwrap().get("aws_access_key_id"),
            Some("AKIAPERM")
        );
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = ProfileFile::load(&dir.path().join("credentials")).unwrap();
        assert!(file.is_empty());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");
        fs::write(&path, SAMPLE).unwrap();

        let file = ProfileFile::load(&path).unwrap();
        assert_eq!(file, ProfileFile::parse(SAMPLE));
    }

    #[test]
    fn test_load_tolerates_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");
        fs::write(&path, b"[static]\naws_access_key_id = AKIA\n# caf\xE9\n").unwrap();

        let file = ProfileFile::load(&path).unwrap();
        assert_eq!(file.names().collect::<Vec<_>>(), vec!["static"]);
        assert_eq!(
            file.get("static").unwrap().get("aws_access_key_id"),
            Some("AKIA")
        );
    }

    #[test]
    fn test_load_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ProfileFile::load(dir.path()),
            Err(ProfileError::Io { .. })
        ));
    }
}
