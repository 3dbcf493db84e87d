use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;

use bookcat_auth::TokenManager;
use bookcat_types::claim::{ApiClaim, Role};

use crate::commands::Executor;

#[derive(Parser, Debug)]
pub struct IssueTokenCmd {
    #[arg(
        long,
        env = "BOOKCAT_TOKEN_SECRET",
        help = "Secret for signing API tokens, default is read from [data-dir]/secret"
    )]
    secret: Option<String>,
    #[arg(
        long,
        env = "BOOKCAT_DATA_DIR",
        help = "Data directory holding the token secret, default is system default like ~/.local/share/bookcat"
    )]
    data_dir: Option<PathBuf>,
    #[arg(short, long, help = "Token subject (client name)")]
    subject: String,
    #[arg(short, long, num_args=0..,
        value_delimiter = ',', help = "Roles of the token, comma separated or used multiple times")]
    roles: Vec<Role>,
    #[arg(
        long,
        default_value = "1 day",
        help = "Token validity in human friendly format (e.g. 1d, 1h, 1m, 1s - or combined)",
        value_parser = humantime::parse_duration
    )]
    validity: std::time::Duration,
}

impl IssueTokenCmd {
    fn secret(&self) -> anyhow::Result<Vec<u8>> {
        if let Some(secret) = &self.secret {
            return Ok(secret.clone().into_bytes());
        }
        let data_dir = self
            .data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("bookcat")))
            .context("Cannot determine data directory")?;
        let secret_file = data_dir.join("secret");
        std::fs::read(&secret_file)
            .with_context(|| format!("Failed to read secret from {}", secret_file.display()))
    }
}

impl Executor for IssueTokenCmd {
    async fn run(self) -> anyhow::Result<()> {
        let secret = self.secret()?;
        let tokens = TokenManager::new(&secret, self.validity);
        let claim = ApiClaim::new(self.subject, self.roles);
        let token = tokens.issue(claim)?;
        println!("{token}");
        Ok(())
    }
}
