use chrono::{DateTime, Utc};

pub mod credentials;
pub mod sts;

/// Temporary credentials minted for one profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub profile_name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

/// Name of the profile that assumes `role_arn` on top of `profile`.
///
/// `arn:aws:iam::123456789012:role/DeployRole` with `work` gives
/// `work-assumed-DeployRole`.
pub fn assumed_role_profile_name(profile: &str, role_arn: &str) -> String {
    let segment = role_arn.rsplit('/').next().unwrap_or(role_arn);
    format!("{profile}-assumed-{segment}")
}

/// IAM user ARN behind an MFA device ARN (`...:mfa/name` -> `...:user/name`)
pub fn user_arn_from_device(device_arn: &str) -> String {
    device_arn.replacen("mfa", "user", 1)
}
