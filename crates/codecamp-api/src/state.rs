//! Shared application state for the API server.
//!
//! Holds the repository and the configuration store. Both are shared by
//! every request; nothing else is.

use std::sync::Arc;

use codecamp_core::{ConfigStore, Links, TokenService};
use codecamp_db::CampRepository;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Persistence gateway.
    pub repo: Arc<dyn CampRepository>,
    /// Reloadable settings.
    pub config: Arc<ConfigStore>,
}

impl AppState {
    /// Bundle a repository and configuration store.
    pub fn new(repo: Arc<dyn CampRepository>, config: Arc<ConfigStore>) -> Self {
        Self { repo, config }
    }

    /// Link builder for the current public URL.
    pub async fn links(&self) -> Links {
        Links::new(&self.config.current().await.server.public_url)
    }

    /// Token service for the current token settings.
    pub async fn tokens(&self) -> TokenService {
        TokenService::new(&self.config.current().await.tokens)
    }
}
