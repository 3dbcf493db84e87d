pub mod rest;

use anyhow::{anyhow, Result};
use bookcat_server::config::{Parser, ServerConfig};
use bookcat_types::claim::{ApiClaim, Role};
use rand::Rng as _;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tempfile::TempDir;
use url::Url;

/// Secret shared by the spawned server and the test token mint.
pub const TEST_SECRET: &str = "e2e-tests-secret";

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
}

pub fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix(format!("{}_", test_name))?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?;
    let port = port.to_string();
    let base_url = format!("http://localhost:{}", port);
    let args = &[
        "bookcat-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--base-url",
        &base_url,
        "--token-secret",
        TEST_SECRET,
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

/// Spawns the server and waits until it answers on /health.
pub async fn launch_env(args: ServerConfig) -> Result<Url> {
    let base_url = args.base_url.clone();
    tokio::spawn(async move {
        bookcat_server::run(args).await.unwrap();
    });

    let client = reqwest::Client::new();
    let health_url = base_url.join("health")?;
    for _ in 0..50 {
        if let Ok(response) = client.get(health_url.clone()).send().await {
            if response.status().is_success() {
                return Ok(base_url);
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    Err(anyhow!("Server did not come up"))
}

pub fn issue_token(roles: impl IntoIterator<Item = Role>) -> Result<String> {
    let tokens =
        bookcat_auth::TokenManager::new(TEST_SECRET, std::time::Duration::from_secs(3600));
    let token = tokens.issue(ApiClaim::new("e2e-tests", roles))?;
    Ok(token)
}

/// Client sending the bearer token with every request.
pub fn client_with_roles(roles: impl IntoIterator<Item = Role>) -> Result<reqwest::Client> {
    let token = issue_token(roles)?;
    let mut headers = HeaderMap::new();
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
    value.set_sensitive(true);
    headers.insert(AUTHORIZATION, value);
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .build()?;
    Ok(client)
}
