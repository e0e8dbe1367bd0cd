use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_CATALOG_PATH: &str = "db.json";
const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// JSON document holding the `results` array.
    pub path: PathBuf,
    /// When set, quizzes are read from another storage API instead of `path`.
    #[serde(default)]
    pub remote_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Length of one countdown "second". Only tests should change this.
    pub tick_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: DEFAULT_BIND_ADDR.to_string(),
            },
            catalog: CatalogConfig {
                path: PathBuf::from(DEFAULT_CATALOG_PATH),
                remote_url: None,
            },
            session: SessionConfig {
                tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load environment variables from a local .env if present
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Defaults, then config/*.toml, then APP__SECTION__KEY overrides
        let settings = config::Config::builder()
            .set_default("server.bind_addr", DEFAULT_BIND_ADDR)?
            .set_default("catalog.path", DEFAULT_CATALOG_PATH)?
            .set_default("session.tick_interval_ms", DEFAULT_TICK_INTERVAL_MS as i64)?
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = settings.try_deserialize()?;

        // Plain PORT is what most hosting platforms hand out
        if let Ok(port) = env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                let host = config
                    .server
                    .bind_addr
                    .rsplit_once(':')
                    .map(|(host, _)| host.to_string())
                    .unwrap_or_else(|| "0.0.0.0".to_string());
                config.server.bind_addr = format!("{}:{}", host, port);
            }
        }

        if config.session.tick_interval_ms == 0 {
            tracing::warn!(
                "session.tick_interval_ms must be positive, using {}ms",
                DEFAULT_TICK_INTERVAL_MS
            );
            config.session.tick_interval_ms = DEFAULT_TICK_INTERVAL_MS;
        }

        if config
            .catalog
            .remote_url
            .as_deref()
            .is_some_and(|url| url.trim().is_empty())
        {
            config.catalog.remote_url = None;
        }

        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.session.tick_interval_ms)
    }
}
