use std::sync::Arc;

use crate::config::Config;
use catalog::QuizCatalog;
use http_catalog::HttpCatalog;
use json_catalog::JsonFileCatalog;
use session_service::SessionService;

pub struct AppState {
    pub config: Config,
    pub catalog: Arc<dyn QuizCatalog>,
    pub session: SessionService,
}

impl AppState {
    /// Picks the catalog from configuration and starts the session dispatcher.
    pub fn new(config: Config) -> Self {
        let catalog: Arc<dyn QuizCatalog> = match config.catalog.remote_url.as_deref() {
            Some(url) => {
                tracing::info!("Using remote quiz catalog at {}", url);
                Arc::new(HttpCatalog::new(url))
            }
            None => {
                tracing::info!("Using JSON quiz catalog at {}", config.catalog.path.display());
                Arc::new(JsonFileCatalog::new(config.catalog.path.clone()))
            }
        };

        Self::with_catalog(config, catalog)
    }

    pub fn with_catalog(config: Config, catalog: Arc<dyn QuizCatalog>) -> Self {
        let session = SessionService::spawn(config.tick_interval());
        Self {
            config,
            catalog,
            session,
        }
    }
}

pub mod catalog;
pub mod countdown;
pub mod http_catalog;
pub mod json_catalog;
pub mod randomizer;
pub mod session_engine;
pub mod session_service;
