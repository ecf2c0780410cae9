use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use crate::{
    config,
    profile::{ProfileStatus, find_profile},
};

#[derive(Debug, Clone, Args)]
pub struct StatusCommand {
    #[arg(
        short = 'p',
        long,
        help = "Profile to check (defaults to the stored profile name)"
    )]
    pub profile: Option<String>,
}

impl StatusCommand {
    pub async fn execute(self) -> Result<()> {
        let paths = config::AwsPaths::resolve()?;

        let profile = match self.profile {
            Some(profile) => profile,
            None => stored_profile_name(&paths.defaults).await?,
        };
        anyhow::ensure!(
            !profile.is_empty(),
            "No profile given and none stored. Use --profile or run `sts-mfa configure`"
        );

        let status = find_profile(&paths.credentials, &profile)
            .context("Failed to read AWS credentials file")?;
        println!("{}", describe(&profile, &status));
        if status.needs_refresh() {
            println!("Run `sts-mfa session` to get a new session.");
        }
        Ok(())
    }
}

/// Profile name from the defaults file, read as-is. Missing file means none.
async fn stored_profile_name(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }
    Ok(config::read(path).await?.profile_name)
}

fn describe(profile: &str, status: &ProfileStatus) -> String {
    match status {
        ProfileStatus::NotFound => {
            format!("No session credentials found for profile [{profile}]")
        }
        ProfileStatus::Expired => format!("Credentials for profile [{profile}] have expired"),
        ProfileStatus::Valid { expiration } => {
            format!("Credentials for profile [{profile}] are valid until {expiration}")
        }
    }
}
