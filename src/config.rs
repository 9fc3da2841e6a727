use anyhow::Result;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub websocket: WebSocketConfig,
    pub game: GameConfig,
    pub redis: RedisConfig,
    pub log: LogConfig,
    pub cors: CorsConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub http_port: Option<u16>, // falls back to port when absent
    pub ws_port: Option<u16>,   // falls back to port when absent
}

#[derive(Debug, Deserialize)]
pub struct WebSocketConfig {
    pub ping_interval: u64,
}

#[derive(Debug, Deserialize)]
pub struct GameConfig {
    /// Number of campaign levels the client may offer.
    pub level_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CorsConfig {
    pub allow_all_origins: Option<bool>,
    pub allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub file_path: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config"))
            .build()?;

        Ok(config.try_deserialize::<Config>()?)
    }

    /// Initialize the global configuration.
    pub fn init() -> Result<()> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| anyhow::anyhow!("configuration already initialized"))?;
        Ok(())
    }

    /// Global configuration instance.
    pub fn get() -> &'static Config {
        CONFIG
            .get()
            .expect("configuration not initialized, call Config::init() first")
    }

    pub fn http_addr(&self) -> SocketAddr {
        let port = self.server.http_port.unwrap_or(self.server.port);
        format!("{}:{}", self.server.host, port)
            .parse()
            .expect("Invalid HTTP server address")
    }

    pub fn ws_addr(&self) -> SocketAddr {
        let port = self.server.ws_port.unwrap_or(self.server.port);
        format!("{}:{}", self.server.host, port)
            .parse()
            .expect("Invalid WebSocket server address")
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.websocket.ping_interval)
    }

    pub fn level_count(&self) -> u32 {
        self.game.level_count
    }

    pub fn log_filter(&self) -> String {
        format!("gallows={}", self.log.level)
    }
}
