use std::sync::Arc;

use bookcat_auth::TokenManager;
use bookcat_dal::Pool;
use url::Url;

use crate::error::Result;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, tokens: TokenManager, pool: Pool) -> Self {
        AppState {
            state: Arc::new(AppStateInner {
                app_config,
                tokens,
                pool,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.state.tokens
    }

    pub fn build_url(&self, relative_url: &str) -> Result<Url> {
        let base = &self.config().base_url;
        let url = base.join(relative_url)?;
        Ok(url)
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }
}

// Empty garde validation context, required by the `axum_valid::Garde` extractor.
impl axum::extract::FromRef<AppState> for () {
    fn from_ref(_: &AppState) {}
}

struct AppStateInner {
    pool: Pool,
    tokens: TokenManager,
    app_config: AppConfig,
}

pub struct AppConfig {
    pub base_url: Url,
}
