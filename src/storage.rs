use crate::Result;
use crate::game::{LevelId, Outcome};
use crate::progress::CampaignProgress;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Hash field holding the campaign frontier. This name is the stable
/// key-value contract; nothing else writes it.
pub const PROGRESS_FIELD: &str = "highestLevelUnlocked";

/// Finished games kept per player.
const HISTORY_LIMIT: isize = 100;

/// A finished game, appended to the player's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub phrase: String,
    pub outcome: Outcome,
    pub attempts_remaining: u32,
    /// Campaign level, absent for two-player games.
    pub level: Option<LevelId>,
    pub finished_at: DateTime<Utc>,
}

pub struct Storage {
    manager: Arc<Mutex<ConnectionManager>>,
}

impl Storage {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client =
            Client::open(redis_url).map_err(|e| crate::Error::Storage(e.to_string()))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| crate::Error::Storage(e.to_string()))?;
        Ok(Storage {
            manager: Arc::new(Mutex::new(manager)),
        })
    }

    /// Load a player's campaign progress. An absent or zero value means
    /// first launch: level 1 is unlocked and persisted as such.
    pub async fn load_progress(&self, player_id: &str) -> Result<CampaignProgress> {
        let key = player_key(player_id);
        let mut conn = self.manager.lock().await;
        let stored: Option<u32> = conn
            .hget(&key, PROGRESS_FIELD)
            .await
            .map_err(|e| crate::Error::Storage(e.to_string()))?;

        let progress = CampaignProgress::from_stored(stored.unwrap_or(0));
        if stored.unwrap_or(0) == 0 {
            conn.hset::<_, _, _, ()>(&key, PROGRESS_FIELD, progress.highest_level_unlocked())
                .await
                .map_err(|e| crate::Error::Storage(e.to_string()))?;
        }

        Ok(progress)
    }

    pub async fn save_progress(
        &self,
        player_id: &str,
        progress: &CampaignProgress,
    ) -> Result<()> {
        let key = player_key(player_id);
        let mut conn = self.manager.lock().await;
        conn.hset::<_, _, _, ()>(&key, PROGRESS_FIELD, progress.highest_level_unlocked())
            .await
            .map_err(|e| crate::Error::Storage(e.to_string()))?;
        Ok(())
    }

    /// Append a finished game to the player's history, keeping the most
    /// recent [`HISTORY_LIMIT`] entries.
    pub async fn append_record(&self, player_id: &str, record: &GameRecord) -> Result<()> {
        let key = history_key(player_id);
        let value =
            serde_json::to_string(record).map_err(|e| crate::Error::Storage(e.to_string()))?;

        let mut conn = self.manager.lock().await;
        conn.rpush::<_, _, ()>(&key, value)
            .await
            .map_err(|e| crate::Error::Storage(e.to_string()))?;
        conn.ltrim::<_, ()>(&key, -HISTORY_LIMIT, -1)
            .await
            .map_err(|e| crate::Error::Storage(e.to_string()))?;

        Ok(())
    }

    pub async fn recent_records(&self, player_id: &str, limit: usize) -> Result<Vec<GameRecord>> {
        let key = history_key(player_id);
        let mut conn = self.manager.lock().await;
        let raw: Vec<String> = conn
            .lrange(&key, -(limit as isize), -1)
            .await
            .map_err(|e| crate::Error::Storage(e.to_string()))?;

        let mut records = Vec::new();
        for json in raw {
            if let Ok(record) = serde_json::from_str::<GameRecord>(&json) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

fn player_key(player_id: &str) -> String {
    format!("player:{}", player_id)
}

fn history_key(player_id: &str) -> String {
    format!("history:{}", player_id)
}
