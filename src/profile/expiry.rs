use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, warn};

use super::{ProfileEntry, ProfileError, ProfileFile};

/// Attribute holding the session expiry in the credentials file
pub const EXPIRATION_KEY: &str = "expiration";

/// RFC 1123 with a numeric zone, e.g. `Mon, 02 Jan 2006 15:04:05 -0700`
pub const EXPIRATION_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

pub fn format_expiration(at: &DateTime<Utc>) -> String {
    at.format(EXPIRATION_FORMAT).to_string()
}

pub fn parse_expiration(text: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_str(text.trim(), EXPIRATION_FORMAT)
}

/// What a profile's `expiration` attribute says at a given instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiry {
    Missing,
    Valid(DateTime<FixedOffset>),
    Expired(DateTime<FixedOffset>),
    Unparseable(String),
}

impl Expiry {
    pub fn of(entry: &ProfileEntry) -> Self {
        Self::at(entry, Utc::now())
    }

    pub fn at(entry: &ProfileEntry, now: DateTime<Utc>) -> Self {
        let Some(text) = entry.get(EXPIRATION_KEY) else {
            return Self::Missing;
        };

        match parse_expiration(text) {
            Ok(at) if now > at => Self::Expired(at),
            Ok(at) => Self::Valid(at),
            Err(e) => {
                warn!(
                    "Profile {} has an unreadable expiration '{}': {}",
                    entry.name, text, e
                );
                Self::Unparseable(text.to_string())
            }
        }
    }

    /// An unreadable timestamp counts as expired so it never blocks a refresh.
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired(_) | Self::Unparseable(_))
    }
}

pub fn is_expired(entry: &ProfileEntry) -> bool {
    Expiry::of(entry).is_expired()
}

/// Result of looking a profile up in the credentials file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileStatus {
    /// No such section, or a section without an `expiration`.
    NotFound,
    Expired,
    Valid { expiration: String },
}

impl ProfileStatus {
    /// Whether fresh credentials are needed. Unknown is treated as yes.
    pub fn needs_refresh(&self) -> bool {
        !matches!(self, Self::Valid { .. })
    }

    pub fn expiration(&self) -> Option<&str> {
        match self {
            Self::Valid { expiration } => Some(expiration),
            _ => None,
        }
    }

    pub fn of(file: &ProfileFile, name: &str, now: DateTime<Utc>) -> Self {
        let Some(entry) = file.get(name) else {
            debug!("Profile {} not present", name);
            return Self::NotFound;
        };

        match Expiry::at(entry, now) {
            Expiry::Missing => Self::NotFound,
            Expiry::Valid(_) => Self::Valid {
                expiration: entry.get(EXPIRATION_KEY).unwrap_or_default().to_string(),
            },
            Expiry::Expired(_) | Expiry::Unparseable(_) => Self::Expired,
        }
    }
}

/// Read `path` and report whether profile `name` still holds live credentials.
pub fn find_profile(path: &Path, name: &str) -> Result<ProfileStatus, ProfileError> {
    let file = ProfileFile::load(path)?;
    Ok(ProfileStatus::of(&file, name, Utc::now()))
}
