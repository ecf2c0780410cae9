use std::{env, path::PathBuf};

/// Directory name under `~/.config` holding the tool's own files
pub const CONFIG_DIR_NAME: &str = "sts-mfa";

/// Defaults file name
pub const DEFAULTS_FILE_NAME: &str = "defaults.json";

/// AWS configuration directory name
pub const AWS_CONFIG_DIR_NAME: &str = ".aws";

/// AWS configuration file name
pub const AWS_CONFIG_FILE_NAME: &str = "config";

/// AWS shared credentials file name
pub const AWS_CREDENTIALS_FILE_NAME: &str = "credentials";

/// Overrides the defaults file location
pub const DEFAULTS_FILE_ENV: &str = "STS_MFA_DEFAULTS_FILE";

/// 64 hex characters used as the at-rest encryption key
pub const ENCRYPTION_KEY_ENV: &str = "STS_MFA_ENC_KEY";

/// Shortest session AWS STS will issue, in seconds (15 minutes)
pub const MIN_SESSION_DURATION_SECONDS: i64 = 900;

/// Longest session AWS STS will issue for IAM users, in seconds (36 hours)
pub const MAX_SESSION_DURATION_SECONDS: i64 = 129_600;

/// Session duration offered when nothing is stored yet
pub const DEFAULT_SESSION_DURATION_SECONDS: i64 = 43_200;

/// Region used for STS when none is configured
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Number of digits in an MFA token code
pub const MFA_TOKEN_LENGTH: usize = 6;

/// Shortest role ARN accepted by `--role`
pub const MIN_ROLE_ARN_LENGTH: usize = 32;

/// Get the defaults file path
/// Respects STS_MFA_DEFAULTS_FILE environment variable if set
pub fn get_defaults_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(DEFAULTS_FILE_ENV) {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| {
        home.join(".config")
            .join(CONFIG_DIR_NAME)
            .join(DEFAULTS_FILE_NAME)
    })
}

/// Get the AWS config file path
/// Respects AWS_CONFIG_FILE environment variable if set
pub fn get_aws_config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("AWS_CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| home.join(AWS_CONFIG_DIR_NAME).join(AWS_CONFIG_FILE_NAME))
}

/// Get the AWS credentials file path
/// Respects AWS_SHARED_CREDENTIALS_FILE environment variable if set
pub fn get_aws_credentials_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("AWS_SHARED_CREDENTIALS_FILE") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| {
        home.join(AWS_CONFIG_DIR_NAME)
            .join(AWS_CREDENTIALS_FILE_NAME)
    })
}
