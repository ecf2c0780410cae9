use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::Path,
};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{
    ProfileEntry, ProfileError, ProfileFile,
    expiry::{EXPIRATION_KEY, Expiry},
};

/// Section name AWS tooling expects to find in the config file
pub const DEFAULT_CONFIG_SECTION: &str = "profile default";

/// Name of the profile that needs no synthesized default
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// A `[profile default]` section to add to a config file that lacks one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultProfile {
    /// Base profile being written; `default` itself needs no copy.
    pub base_profile: String,
    pub region: String,
}

impl DefaultProfile {
    fn entry(&self) -> ProfileEntry {
        ProfileEntry::new(DEFAULT_CONFIG_SECTION)
            .with("region", &self.region)
            .with("output", "json")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Drop carried-over sections whose `expiration` is in the past.
    pub prune_expired: bool,
    /// Synthesize `[profile default]` when it is missing.
    pub default_profile: Option<DefaultProfile>,
    /// Owner-only permissions (0600 on unix) before any content is written.
    pub private: bool,
}

impl RewriteOptions {
    pub fn credentials() -> Self {
        Self {
            prune_expired: true,
            default_profile: None,
            private: true,
        }
    }

    pub fn config(base_profile: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            prune_expired: false,
            default_profile: Some(DefaultProfile {
                base_profile: base_profile.into(),
                region: region.into(),
            }),
            private: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunedProfile {
    pub name: String,
    pub expiration: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    pub written: Vec<String>,
    pub carried_over: Vec<String>,
    pub pruned: Vec<PrunedProfile>,
}

/// Full replacement text for a profile file plus what went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub text: String,
    pub report: RewriteReport,
}

/// Compute the new file contents: `new_entries` first, then the optional
/// default section, then every existing section that was not replaced and,
/// when pruning, has not expired.
pub fn merge(
    existing: &ProfileFile,
    new_entries: &[ProfileEntry],
    options: &RewriteOptions,
    now: DateTime<Utc>,
) -> Merged {
    let mut text = String::new();
    let mut report = RewriteReport::default();

    let mut header: Vec<ProfileEntry> = new_entries.to_vec();
    if let Some(default) = &options.default_profile {
        if default.base_profile != DEFAULT_PROFILE_NAME
            && !existing.contains(DEFAULT_CONFIG_SECTION)
            && !header.iter().any(|e| e.name == DEFAULT_CONFIG_SECTION)
        {
            debug!("Adding [{}] to config", DEFAULT_CONFIG_SECTION);
            header.push(default.entry());
        }
    }

    for entry in &header {
        text.push_str(&entry.to_string());
        report.written.push(entry.name.clone());
    }

    for section in existing.iter() {
        if report.written.iter().any(|name| *name == section.name) {
            continue;
        }

        if options.prune_expired {
            if let Expiry::Expired(_) = Expiry::at(section, now) {
                let expiration = section.get(EXPIRATION_KEY).unwrap_or_default().to_string();
                info!(
                    "Credentials for {} expired at {}. Removing this profile",
                    section.name, expiration
                );
                report.pruned.push(PrunedProfile {
                    name: section.name.clone(),
                    expiration,
                });
                continue;
            }
        }

        text.push_str(&section.to_string());
        report.carried_over.push(section.name.clone());
    }

    Merged { text, report }
}

/// Replace the file at `path` with the merge of `existing` and `new_entries`.
///
/// The content is built in memory before the file is touched. The write is a
/// truncate-and-write, not an atomic rename.
pub fn rewrite(
    path: &Path,
    existing: &ProfileFile,
    new_entries: &[ProfileEntry],
    options: &RewriteOptions,
) -> Result<RewriteReport, ProfileError> {
    let Merged { text, report } = merge(existing, new_entries, options, Utc::now());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ProfileError::io(parent, e))?;
    }

    let mut file =
        open_truncated(path, options.private).map_err(|e| ProfileError::io(path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| ProfileError::io(path, e))?;
    file.sync_all().map_err(|e| ProfileError::io(path, e))?;

    debug!(
        "Wrote {} ({} new, {} kept, {} pruned)",
        path.display(),
        report.written.len(),
        report.carried_over.len(),
        report.pruned.len()
    );
    Ok(report)
}

fn open_truncated(path: &Path, private: bool) -> std::io::Result<fs::File> {
    let mut open = OpenOptions::new();
    open.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        if private {
            // mode() only applies to newly created files
            let file = open.mode(0o600).open(path)?;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
            return Ok(file);
        }
    }
    #[cfg(not(unix))]
    let _ = private;

    open.open(path)
}
