use crate::{
    constants::{
        self, DEFAULT_AWS_REGION, DEFAULT_SESSION_DURATION_SECONDS, MAX_SESSION_DURATION_SECONDS,
        MIN_SESSION_DURATION_SECONDS,
    },
    crypto::{self, CipherKey, StoredSecret},
    profile::{ProfileStatus, find_profile},
};
use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, Password, theme::ColorfulTheme};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Locations of the files one run reads and writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsPaths {
    pub credentials: PathBuf,
    pub config: PathBuf,
    pub defaults: PathBuf,
}

impl AwsPaths {
    pub fn resolve() -> Result<Self> {
        Ok(Self {
            credentials: constants::get_aws_credentials_path()
                .context("Failed to determine AWS credentials path")?,
            config: constants::get_aws_config_path()
                .context("Failed to determine AWS config path")?,
            defaults: constants::get_defaults_path()
                .context("Failed to determine defaults file path")?,
        })
    }

    /// Create the directories holding the AWS files
    pub async fn ensure_dirs(&self) -> Result<()> {
        for path in [&self.credentials, &self.config] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }
        Ok(())
    }
}

/// Values remembered between runs. Device ARN and the permanent keys are
/// stored encrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    #[serde(rename = "profileName")]
    pub profile_name: String,
    #[serde(rename = "deviceARN")]
    pub device_arn: String,
    #[serde(rename = "accessKeyID")]
    pub access_key_id: String,
    #[serde(rename = "secretKey")]
    pub secret_key: String,
    pub token: String,
    #[serde(rename = "durationInSeconds")]
    pub duration_in_seconds: i64,
    #[serde(rename = "awsRegion")]
    pub aws_region: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            profile_name: String::new(),
            device_arn: String::new(),
            access_key_id: String::new(),
            secret_key: String::new(),
            token: String::new(),
            duration_in_seconds: DEFAULT_SESSION_DURATION_SECONDS,
            aws_region: String::new(),
        }
    }
}

/// Defaults with the encrypted fields opened
#[derive(Clone, PartialEq, Eq)]
pub struct Secrets {
    pub device_arn: String,
    pub access_key_id: String,
    pub secret_key: String,
}

impl Defaults {
    /// A fresh record whose secret fields hold encrypted empty strings
    pub fn empty(key: &CipherKey) -> Result<Self> {
        let empty = crypto::encrypt("", key)?;
        Ok(Self {
            device_arn: empty.clone(),
            access_key_id: empty.clone(),
            secret_key: empty,
            ..Self::default()
        })
    }

    /// Encrypt any secret field still holding plaintext. Returns whether
    /// anything changed.
    pub fn seal_legacy(&mut self, key: &CipherKey) -> Result<bool> {
        let mut changed = false;
        for (name, field) in [
            ("deviceARN", &mut self.device_arn),
            ("accessKeyID", &mut self.access_key_id),
            ("secretKey", &mut self.secret_key),
        ] {
            let stored = StoredSecret::classify(field, key);
            if stored.is_legacy() {
                info!("Encrypting plaintext {} in defaults", name);
                *field = stored.into_blob(key)?;
                changed = true;
            }
        }
        Ok(changed)
    }

    pub fn secrets(&self, key: &CipherKey) -> Result<Secrets> {
        Ok(Secrets {
            device_arn: crypto::decrypt(&self.device_arn, key)
                .context("Failed to decrypt stored device ARN")?,
            access_key_id: crypto::decrypt(&self.access_key_id, key)
                .context("Failed to decrypt stored access key")?,
            secret_key: crypto::decrypt(&self.secret_key, key)
                .context("Failed to decrypt stored secret key")?,
        })
    }

    pub fn set_secrets(&mut self, secrets: &Secrets, key: &CipherKey) -> Result<()> {
        self.device_arn = crypto::encrypt(&secrets.device_arn, key)?;
        self.access_key_id = crypto::encrypt(&secrets.access_key_id, key)?;
        self.secret_key = crypto::encrypt(&secrets.secret_key, key)?;
        Ok(())
    }

    pub fn region(&self) -> &str {
        if self.aws_region.is_empty() {
            DEFAULT_AWS_REGION
        } else {
            &self.aws_region
        }
    }
}

/// Load the defaults file, creating it when missing and encrypting any
/// plaintext secrets left by older versions.
pub async fn load(path: &Path, key: &CipherKey) -> Result<Defaults> {
    if !path.exists() {
        info!("Creating defaults file at {}", path.display());
        let defaults = Defaults::empty(key)?;
        save(path, &defaults).await?;
        return Ok(defaults);
    }

    let mut defaults = read(path).await?;
    if defaults.seal_legacy(key)? {
        save(path, &defaults).await?;
    }

    Ok(defaults)
}

/// Parse the defaults file as it is on disk, without creating or migrating it.
pub async fn read(path: &Path) -> Result<Defaults> {
    let raw = fs::read(path)
        .await
        .with_context(|| format!("Failed to read defaults file: {}", path.display()))?;
    serde_json::from_slice(&raw)
        .with_context(|| format!("Failed to parse defaults file: {}", path.display()))
}

pub async fn save(path: &Path, defaults: &Defaults) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json = serde_json::to_vec_pretty(defaults).context("Failed to serialize defaults")?;
    fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write defaults to {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = fs::metadata(path).await?;
        let mut permissions = metadata.permissions();
        permissions.set_mode(0o600);
        fs::set_permissions(path, permissions).await?;
    }

    debug!("Defaults saved to {}", path.display());
    Ok(())
}

pub fn is_valid_duration(seconds: i64) -> bool {
    (MIN_SESSION_DURATION_SECONDS..=MAX_SESSION_DURATION_SECONDS).contains(&seconds)
}

pub fn is_valid_token_code(code: &str) -> bool {
    code.len() == constants::MFA_TOKEN_LENGTH && code.chars().all(|c| c.is_ascii_digit())
}

/// Outcome of the interactive parameter prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Continue,
    /// Stored credentials are still valid and the operator kept them
    KeepExisting,
}

/// Read one line; Enter keeps `current` unless it is empty.
fn ask(theme: &ColorfulTheme, prompt: &str, current: &str) -> Result<String> {
    let mut input = Input::<String>::with_theme(theme).with_prompt(prompt);
    if !current.is_empty() {
        input = input.default(current.to_string());
    }
    input
        .interact_text()
        .with_context(|| format!("Failed to read {}", prompt.to_lowercase()))
}

/// Ask for every remembered value, Enter keeps the current one. Mirrors
/// what is asked before fetching a new session.
pub fn prompt_parameters(
    defaults: &mut Defaults,
    key: &CipherKey,
    credentials_path: &Path,
    check_existing: bool,
) -> Result<(PromptOutcome, bool)> {
    let theme = ColorfulTheme::default();
    let original = defaults.clone();
    let mut secrets = defaults.secrets(key)?;

    defaults.aws_region = ask(&theme, "Region", defaults.region())?;
    secrets.device_arn = ask(&theme, "MFA device ARN", &secrets.device_arn)?;
    secrets.access_key_id = ask(&theme, "Permanent AWS Access Key", &secrets.access_key_id)?;

    let secret_key = Password::with_theme(&theme)
        .with_prompt(if secrets.secret_key.is_empty() {
            "Permanent AWS Secret Key"
        } else {
            "Permanent AWS Secret Key (Enter keeps current)"
        })
        .allow_empty_password(!secrets.secret_key.is_empty())
        .interact()
        .context("Failed to read secret key")?;
    if !secret_key.is_empty() {
        secrets.secret_key = secret_key;
    }

    defaults.profile_name = ask(
        &theme,
        "Profile name for temporary credentials",
        if defaults.profile_name.is_empty() {
            "default"
        } else {
            &defaults.profile_name
        },
    )?;

    if check_existing {
        let status = find_profile(credentials_path, &defaults.profile_name)?;
        if let ProfileStatus::Valid { expiration } = status {
            let refresh = Confirm::with_theme(&theme)
                .with_prompt(format!(
                    "Your credentials for the profile [{}] are not expired yet! They will expire at {}. Would you like to refresh them?",
                    defaults.profile_name, expiration
                ))
                .default(false)
                .interact()
                .context("Failed to read answer")?;
            if !refresh {
                return Ok((PromptOutcome::KeepExisting, false));
            }
        }
    }

    defaults.duration_in_seconds = Input::<i64>::with_theme(&theme)
        .with_prompt(format!(
            "Duration in seconds [{MIN_SESSION_DURATION_SECONDS}-{MAX_SESSION_DURATION_SECONDS}]"
        ))
        .default(defaults.duration_in_seconds)
        .validate_with(|input: &i64| {
            if is_valid_duration(*input) {
                Ok(())
            } else {
                Err("Please enter a value between 900 and 129600")
            }
        })
        .interact_text()
        .context("Failed to read session duration")?;

    let secrets_changed = secrets != original.secrets(key)?;
    if secrets_changed {
        defaults.set_secrets(&secrets, key)?;
    }

    let changed = secrets_changed
        || defaults.aws_region != original.aws_region
        || defaults.profile_name != original.profile_name
        || defaults.duration_in_seconds != original.duration_in_seconds;

    Ok((PromptOutcome::Continue, changed))
}

/// Ask whether changed values should be written back to the defaults file
pub fn confirm_save() -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("You have changed the configuration value(s). Save changes to defaults?")
        .default(false)
        .interact()
        .context("Failed to read answer")
}

/// Ask for the 6-digit code shown by the MFA device
pub fn prompt_token_code() -> Result<String> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Token code from your MFA device")
        .validate_with(|input: &String| {
            if is_valid_token_code(input) {
                Ok(())
            } else {
                Err("Please enter a valid 6 digit token code from your MFA device")
            }
        })
        .interact_text()
        .context("Failed to read MFA token code")
}

pub async fn configure_interactive(paths: &AwsPaths, key: &CipherKey) -> Result<()> {
    println!("Configuring defaults in {}", paths.defaults.display());
    println!("Press Enter to keep current values, or type new values.");
    println!();

    let mut defaults = load(&paths.defaults, key).await?;
    let (_, changed) = prompt_parameters(&mut defaults, key, &paths.credentials, false)?;

    if changed {
        save(&paths.defaults, &defaults).await?;
        println!("\nConfiguration saved successfully.");
    } else {
        println!("\nNothing changed.");
    }
    Ok(())
}
