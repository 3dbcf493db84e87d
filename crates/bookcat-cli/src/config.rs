use clap::{Parser, Subcommand};

use crate::commands::{issue_token::IssueTokenCmd, seed::SeedCmd};

#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "CLI for bookcat - provides commands to manage the book catalog server."
)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    IssueToken(IssueTokenCmd),
    Seed(SeedCmd),
}

impl crate::commands::Executor for Command {
    async fn run(self) -> anyhow::Result<()> {
        match self {
            Command::IssueToken(cmd) => cmd.run().await,
            Command::Seed(cmd) => cmd.run().await,
        }
    }
}
