use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::{
    commands::{CompletionsCommand, ConfigureCommand, SessionCommand, StatusCommand},
    crypto::{self, CipherKey, KeySource},
};

#[derive(Debug, Clone, Parser)]
#[command(name = "sts-mfa", version, about = "Fetch MFA-backed AWS session credentials into your AWS profiles", long_about = None)]
pub struct Cli {
    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[arg(
        long,
        global = true,
        help = "Fail instead of falling back to the built-in encryption key"
    )]
    pub strict_key: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Get a new MFA session and write it to the AWS profile files")]
    Session(SessionCommand),
    #[command(about = "Edit the stored defaults without requesting a session")]
    Configure(ConfigureCommand),
    #[command(about = "Show whether the session credentials of a profile are still valid")]
    Status(StatusCommand),
    #[command(about = "Generate shell completion scripts for sts-mfa")]
    Completions(CompletionsCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let strict_key = self.strict_key;
        let command = self
            .command
            .unwrap_or_else(|| Commands::Session(SessionCommand::default()));

        match command {
            Commands::Session(cmd) => cmd.execute(&encryption_key(strict_key)?).await,
            Commands::Configure(cmd) => cmd.execute(&encryption_key(strict_key)?).await,
            Commands::Status(cmd) => cmd.execute().await,
            Commands::Completions(cmd) => {
                cmd.execute();
                Ok(())
            }
        }
    }
}

fn encryption_key(strict: bool) -> Result<CipherKey> {
    let (key, source) = crypto::resolve_key(strict)?;
    if source == KeySource::Builtin {
        eprintln!("Using default encryption key...");
    }
    Ok(key)
}
