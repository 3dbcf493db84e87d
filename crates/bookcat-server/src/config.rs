use core::panic;
use std::{fs, path::PathBuf, time::Duration};

use crate::error::Result;
pub use clap::Parser;
use url::Url;

#[derive(Debug, Clone, clap::Parser)]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 3000,
        env = "BOOKCAT_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "BOOKCAT_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        long,
        env = "BOOKCAT_BASE_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of the server, as visible to clients"
    )]
    pub base_url: Url,

    #[arg(
        long,
        env = "BOOKCAT_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/bookcat.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "BOOKCAT_DATA_DIR",
        help = "Data directory (database, token secret), default is system default like ~/.local/share/bookcat",
        default_value_t = default_data_dir()
    )]
    data_dir: String,

    #[arg(
        long,
        env = "BOOKCAT_TOKEN_SECRET",
        help = "Secret for signing API tokens, default is read from (or generated into) [data-dir]/secret"
    )]
    pub token_secret: Option<String>,

    #[arg(
        long,
        env = "BOOKCAT_TOKEN_VALIDITY",
        default_value = "1 day",
        help = "Default token validity in human friendly format (e.g. 1d, 1h, 1m, 1s - or combined)",
        value_parser = humantime::parse_duration
    )]
    pub token_validity: Duration,

    #[arg(long, env = "BOOKCAT_NO_CORS", help = "Disable CORS")]
    pub no_cors: bool,
}

fn default_data_dir() -> String {
    let dir = dirs::data_dir()
        .map(|p| p.join("bookcat"))
        .unwrap_or_else(|| PathBuf::from("bookcat"));

    if !fs::exists(&dir).expect("Failed to check if data directory exists") {
        fs::create_dir_all(&dir).expect("Failed to create data directory");
    } else if !dir.is_dir() {
        panic!("Data directory is not a directory",)
    }

    dir.to_string_lossy().to_string()
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/bookcat.db", self.data_dir))
    }
}
