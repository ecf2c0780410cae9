use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::{
    aws::{self, sts::SessionRequest},
    config::{self, AwsPaths, PromptOutcome},
    constants::{MFA_TOKEN_LENGTH, MIN_ROLE_ARN_LENGTH},
    crypto::CipherKey,
};

#[derive(Debug, Clone, Default, Args)]
pub struct SessionCommand {
    #[arg(short = 't', long, value_parser = parse_token_code, help = "6 digit code from the MFA device")]
    pub token: Option<String>,

    #[arg(short = 'r', long, value_parser = parse_role_arn, help = "Also create a profile assuming this role ARN")]
    pub role: Option<String>,

    #[arg(short = 's', long, help = "Skip prompts and use the stored defaults")]
    pub skip: bool,
}

fn parse_token_code(value: &str) -> Result<String, String> {
    let value = value.trim();
    if config::is_valid_token_code(value) {
        Ok(value.to_string())
    } else {
        Err(format!(
            "token from MFA device must be {MFA_TOKEN_LENGTH} digits long"
        ))
    }
}

fn parse_role_arn(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.len() >= MIN_ROLE_ARN_LENGTH {
        Ok(value.to_string())
    } else {
        Err(format!(
            "role ARN must be at least {MIN_ROLE_ARN_LENGTH} characters long"
        ))
    }
}

impl SessionCommand {
    pub async fn execute(self, key: &CipherKey) -> Result<()> {
        let paths = AwsPaths::resolve()?;
        paths.ensure_dirs().await?;

        let mut defaults = config::load(&paths.defaults, key)
            .await
            .context("Failed to load defaults")?;

        if !self.skip {
            let (outcome, changed) =
                config::prompt_parameters(&mut defaults, key, &paths.credentials, true)?;

            if outcome == PromptOutcome::KeepExisting {
                println!(
                    "Exiting because existing token is still valid and you chose not to refresh it."
                );
                return Ok(());
            }

            if changed && config::confirm_save()? {
                config::save(&paths.defaults, &defaults).await?;
            }
        }

        anyhow::ensure!(
            !defaults.profile_name.is_empty(),
            "No profile name configured. Run without --skip or use `sts-mfa configure`"
        );
        anyhow::ensure!(
            config::is_valid_duration(defaults.duration_in_seconds),
            "Stored duration {} is outside the allowed range",
            defaults.duration_in_seconds
        );

        let token_code = match self.token {
            Some(token) => token,
            None => config::prompt_token_code()?,
        };

        let secrets = defaults.secrets(key)?;
        let request = SessionRequest {
            access_key_id: secrets.access_key_id,
            secret_access_key: secrets.secret_key,
            token: Some(defaults.token.clone()).filter(|t| !t.is_empty()),
            device_arn: secrets.device_arn.clone(),
            token_code,
            duration_seconds: i32::try_from(defaults.duration_in_seconds)
                .context("Session duration out of range")?,
            region: defaults.region().to_string(),
        };

        info!(
            "Requesting session credentials for profile: {}",
            defaults.profile_name
        );

        let credentials = aws::sts::get_session_token(&defaults.profile_name, &request)
            .await
            .context("Failed to get session token")?;

        let role = self.role.as_deref();

        let report = aws::credentials::save_credentials(&paths.credentials, &credentials, role)
            .await
            .context("Failed to save AWS credentials")?;
        for pruned in &report.pruned {
            println!(
                "Credentials for {} expired at {}. Removed this profile.",
                pruned.name, pruned.expiration
            );
        }

        aws::credentials::save_config(
            &paths.config,
            &defaults.profile_name,
            role,
            defaults.region(),
        )
        .await
        .context("Failed to save AWS config")?;

        println!(
            "{}",
            aws::credentials::confirmation(&credentials, &paths.credentials)
        );
        if let Some(role_arn) = role {
            println!(
                "{}",
                aws::credentials::trust_policy_guidance(
                    &defaults.profile_name,
                    role_arn,
                    &secrets.device_arn
                )
            );
        }

        Ok(())
    }
}
