use bookcat_cli::{config::CliConfig, run::run};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let config = CliConfig::parse();

    run(config).await
}
