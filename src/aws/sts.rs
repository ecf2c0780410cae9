use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sts::{Client as StsClient, config::Credentials as StaticCredentials};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::Credential;

/// Permanent IAM user credentials and MFA device used to request a session
#[derive(Clone)]
pub struct SessionRequest {
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Optional session token accompanying the permanent keys
    pub token: Option<String>,
    pub device_arn: String,
    pub token_code: String,
    pub duration_seconds: i32,
    pub region: String,
}

/// Call AWS STS GetSessionToken with an MFA code
pub async fn get_session_token(profile: &str, request: &SessionRequest) -> Result<Credential> {
    info!("Calling AWS STS GetSessionToken");
    debug!("Profile: {}", profile);
    debug!("Device ARN: {}", request.device_arn);
    debug!("Region: {}", request.region);
    debug!("Duration: {} seconds", request.duration_seconds);

    let static_credentials = StaticCredentials::new(
        &request.access_key_id,
        &request.secret_access_key,
        request.token.clone(),
        None,
        "sts-mfa",
    );

    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(request.region.clone()))
        .credentials_provider(static_credentials)
        .load()
        .await;

    let client = StsClient::new(&config);

    let response = client
        .get_session_token()
        .serial_number(&request.device_arn)
        .token_code(&request.token_code)
        .duration_seconds(request.duration_seconds)
        .send()
        .await
        .context("Failed to get session token from AWS STS")?;

    let sts_creds = response
        .credentials()
        .context("AWS STS returned no credentials")?;

    let credential = Credential {
        profile_name: profile.to_string(),
        access_key_id: sts_creds.access_key_id().to_string(),
        secret_access_key: sts_creds.secret_access_key().to_string(),
        session_token: sts_creds.session_token().to_string(),
        expiration: to_chrono(sts_creds.expiration())?,
    };

    info!("Successfully obtained AWS credentials");
    Ok(credential)
}

fn to_chrono(at: &aws_smithy_types::DateTime) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(at.secs(), at.subsec_nanos())
        .with_context(|| format!("AWS STS returned an out of range expiration: {at:?}"))
}
