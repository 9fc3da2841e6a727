pub mod catalog;
pub mod config;
pub mod game;
pub mod mask;
pub mod message;
pub mod network;
pub mod progress;
pub mod sanitize;
pub mod storage;
pub mod table;

pub use catalog::WordCatalog;
pub use config::Config;
pub use game::{GameSession, GuessEvent, LevelId, Outcome, Secret};
pub use message::GameMessage;
pub use network::GameServer;
pub use progress::CampaignProgress;
pub use storage::Storage;
pub use table::Table;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] anyhow::Error),
    #[error("empty catalog: {0}")]
    EmptyCatalog(String),
    #[error("invalid secret: {0}")]
    InvalidSecret(String),
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
