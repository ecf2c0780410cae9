use anyhow::Result;
use clap::Args;

use crate::{config, crypto::CipherKey};

#[derive(Debug, Clone, Args)]
pub struct ConfigureCommand {}

impl ConfigureCommand {
    pub async fn execute(self, key: &CipherKey) -> Result<()> {
        let paths = config::AwsPaths::resolve()?;
        config::configure_interactive(&paths, key).await
    }
}
