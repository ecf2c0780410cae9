use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::{Credential, assumed_role_profile_name, user_arn_from_device};
use crate::profile::{
    ProfileEntry, ProfileFile, RewriteOptions, RewriteReport,
    expiry::{EXPIRATION_KEY, format_expiration},
    rewrite,
};

const TRUST_POLICY_TEMPLATE: &str = r#"
    "Statement": [
        {
            "Effect": "Allow",
            "Principal": {
                "AWS": "{{user_arn}}"
            },
            "Action": "sts:AssumeRole"
        },
        ...
    ]"#;

const SEPARATOR: &str = "==================================================";

/// Config file section name for a profile
pub fn config_section_name(profile: &str) -> String {
    format!("profile {profile}")
}

/// Sections for the credentials file: the session itself, then the
/// assumed-role alias when a role ARN is given.
pub fn credentials_entries(creds: &Credential, role_arn: Option<&str>) -> Vec<ProfileEntry> {
    let mut entries = vec![
        ProfileEntry::new(&creds.profile_name)
            .with("aws_access_key_id", &creds.access_key_id)
            .with("aws_secret_access_key", &creds.secret_access_key)
            .with("aws_session_token", &creds.session_token)
            .with("aws_security_token", &creds.session_token)
            .with(EXPIRATION_KEY, format_expiration(&creds.expiration)),
    ];

    if let Some(role_arn) = role_arn {
        entries.push(
            ProfileEntry::new(assumed_role_profile_name(&creds.profile_name, role_arn))
                .with("role_arn", role_arn)
                .with("source_profile", &creds.profile_name),
        );
    }

    entries
}

/// Sections for the config file, mirroring [`credentials_entries`].
pub fn config_entries(profile: &str, role_arn: Option<&str>, region: &str) -> Vec<ProfileEntry> {
    let section = |name: &str| {
        ProfileEntry::new(config_section_name(name))
            .with("region", region)
            .with("output", "json")
    };

    let mut entries = vec![section(profile)];
    if let Some(role_arn) = role_arn {
        entries.push(section(&assumed_role_profile_name(profile, role_arn)));
    }
    entries
}

/// Save credentials to AWS credentials file, dropping expired profiles
pub async fn save_credentials(
    path: &Path,
    creds: &Credential,
    role_arn: Option<&str>,
) -> Result<RewriteReport> {
    let existing = ProfileFile::load(path).context("Failed to read AWS credentials file")?;
    let entries = credentials_entries(creds, role_arn);

    let report = rewrite(path, &existing, &entries, &RewriteOptions::credentials())
        .context("Failed to write AWS credentials file")?;

    info!("Credentials saved to profile: {}", creds.profile_name);
    Ok(report)
}

/// Save region and output settings to AWS config file
pub async fn save_config(
    path: &Path,
    profile: &str,
    role_arn: Option<&str>,
    region: &str,
) -> Result<RewriteReport> {
    let existing = ProfileFile::load(path).context("Failed to read AWS config file")?;
    let entries = config_entries(profile, role_arn, region);

    let report = rewrite(
        path,
        &existing,
        &entries,
        &RewriteOptions::config(profile, region),
    )
    .context("Failed to write AWS config file")?;

    info!("Config saved for profile: {}", profile);
    Ok(report)
}

pub fn confirmation(creds: &Credential, path: &Path) -> String {
    format!(
        "\n{SEPARATOR}\n\nCredentials saved in profile [{}] in file {}.\nToken will expire at {}\n\n{SEPARATOR}",
        creds.profile_name,
        path.display(),
        format_expiration(&creds.expiration)
    )
}

/// What the operator must set up for the assumed-role profile to work.
pub fn trust_policy_guidance(profile: &str, role_arn: &str, device_arn: &str) -> String {
    let role_profile = assumed_role_profile_name(profile, role_arn);
    let user_arn = user_arn_from_device(device_arn);

    format!(
        "A new profile [{role_profile}] which assumes role {role_arn} is created. \
         You can assume this role by appending '--profile {role_profile}' to cli commands.\n\
         Make sure that {user_arn} is authorized for sts:AssumeRole on {role_arn} \
         and this role's trust relationship policy has:\n{}\n{SEPARATOR}",
        TRUST_POLICY_TEMPLATE.replacen("{{user_arn}}", &user_arn, 1)
    )
}
