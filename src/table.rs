use crate::Result;
use crate::catalog::WordCatalog;
use crate::game::{GameSession, LevelId, Outcome};
use crate::message::{
    ErrorCode, GameMessage, GuessPayload, SessionSnapshot, StartDuelPayload, StartLevelPayload,
};
use crate::progress::CampaignProgress;
use crate::sanitize;
use crate::storage::{GameRecord, Storage};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error};

/// How a table's active game was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Campaign { level: LevelId },
    Duel,
}

struct ActiveGame {
    session: GameSession,
    mode: GameMode,
}

/// One player's seat at the game: the active session, cached campaign
/// progress, and the connection back to the client. Commands are serialized
/// behind the state lock, so each one fully completes (including storage
/// writes) before the next is processed.
pub struct Table {
    id: String,
    player_id: String,
    game: Arc<RwLock<Option<ActiveGame>>>,
    progress: Arc<RwLock<CampaignProgress>>,
    catalog: Arc<WordCatalog>,
    storage: Arc<Storage>,
    channel: Arc<RwLock<Option<mpsc::Sender<GameMessage>>>>,
    last_activity: Arc<RwLock<DateTime<Utc>>>,
}

impl Table {
    pub fn new(
        id: String,
        player_id: String,
        catalog: Arc<WordCatalog>,
        storage: Arc<Storage>,
    ) -> Self {
        Table {
            id,
            player_id,
            game: Arc::new(RwLock::new(None)),
            progress: Arc::new(RwLock::new(CampaignProgress::default())),
            catalog,
            storage,
            channel: Arc::new(RwLock::new(None)),
            last_activity: Arc::new(RwLock::new(Utc::now())),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Dispatch one client command.
    pub async fn handle_message(
        &self,
        message: GameMessage,
        player_tx: Option<mpsc::Sender<GameMessage>>,
    ) -> Result<()> {
        self.update_activity().await;

        match message.type_.as_str() {
            "join" => {
                let tx = player_tx.ok_or_else(|| {
                    crate::Error::InvalidOperation("join requires a connection".to_string())
                })?;
                self.handle_join(tx).await
            }
            "start_level" => {
                let payload: StartLevelPayload = parse_payload(message.data)?;
                self.handle_start_level(payload.level).await
            }
            "start_duel" => {
                let payload: StartDuelPayload = parse_payload(message.data)?;
                self.handle_start_duel(&payload.phrase).await
            }
            "guess" => {
                let payload: GuessPayload = parse_payload(message.data)?;
                self.handle_guess(payload.letter).await
            }
            "reset" => self.handle_reset().await,
            "next_level" => self.handle_next_level().await,
            "leave" => self.handle_leave().await,
            other => Err(crate::Error::InvalidOperation(format!(
                "unknown message type: {}",
                other
            ))),
        }
    }

    /// Register the client channel and bring the client up to date.
    async fn handle_join(&self, tx: mpsc::Sender<GameMessage>) -> Result<()> {
        *self.channel.write().await = Some(tx);

        match self.storage.load_progress(&self.player_id).await {
            Ok(progress) => {
                *self.progress.write().await = progress;
            }
            Err(e) => {
                // Keep the cached value; the player can still play level 1.
                error!("loading progress for {} failed: {}", self.player_id, e);
            }
        }

        let progress = *self.progress.read().await;
        self.send(GameMessage::progress(progress.highest_level_unlocked()))
            .await;

        if let Some(snapshot) = self.snapshot().await {
            self.send(GameMessage::snapshot(&snapshot)).await;
        }
        Ok(())
    }

    async fn handle_start_level(&self, level: LevelId) -> Result<()> {
        let level_count = crate::config::Config::get().level_count();
        let progress = *self.progress.read().await;

        if level > level_count || !progress.is_playable(level) {
            self.send(GameMessage::error(
                ErrorCode::LevelLocked,
                &format!("level {} is locked", level),
            ))
            .await;
            return Ok(());
        }

        let secret = match self.catalog.pick() {
            Ok(secret) => secret,
            Err(e) => {
                error!("catalog draw failed: {}", e);
                self.send(GameMessage::error(ErrorCode::EmptyCatalog, &e.to_string()))
                    .await;
                return Ok(());
            }
        };

        debug!("player {} starting level {}", self.player_id, level);
        {
            let mut game = self.game.write().await;
            *game = Some(ActiveGame {
                session: GameSession::new(secret),
                mode: GameMode::Campaign { level },
            });
        }

        self.send_snapshot().await;
        Ok(())
    }

    async fn handle_start_duel(&self, phrase: &str) -> Result<()> {
        let secret = match sanitize::sanitized_secret(phrase) {
            Ok(secret) => secret,
            Err(e) => {
                self.send(GameMessage::error(ErrorCode::InvalidSecret, &e.to_string()))
                    .await;
                return Ok(());
            }
        };

        debug!("player {} starting a duel", self.player_id);
        {
            let mut game = self.game.write().await;
            *game = Some(ActiveGame {
                session: GameSession::new(secret),
                mode: GameMode::Duel,
            });
        }

        self.send_snapshot().await;
        Ok(())
    }

    async fn handle_guess(&self, letter: char) -> Result<()> {
        let result = {
            let mut game = self.game.write().await;
            match game.as_mut() {
                None => Err((
                    ErrorCode::NoActiveGame,
                    "start a game before guessing".to_string(),
                )),
                Some(active) => match active.session.guess(letter) {
                    Ok(event) => Ok((event, active.mode)),
                    Err(e) => Err((ErrorCode::InvalidOperation, e.to_string())),
                },
            }
        };

        let (event, mode) = match result {
            Ok(hit) => hit,
            Err((code, message)) => {
                self.send(GameMessage::error(code, &message)).await;
                return Ok(());
            }
        };

        self.send(GameMessage::guess_result(&event)).await;

        if let Some(outcome) = event.outcome() {
            if outcome != Outcome::InProgress {
                self.finish_game(outcome, mode).await;
            }
        }

        self.send_snapshot().await;
        Ok(())
    }

    /// Terminal bookkeeping: history append always, frontier unlock on a
    /// campaign win. Persistence failures are logged and never touch the
    /// session state the player just saw.
    async fn finish_game(&self, outcome: Outcome, mode: GameMode) {
        let record = {
            let game = self.game.read().await;
            game.as_ref().map(|active| GameRecord {
                phrase: active.session.secret().to_string(),
                outcome,
                attempts_remaining: active.session.attempts_remaining(),
                level: match mode {
                    GameMode::Campaign { level } => Some(level),
                    GameMode::Duel => None,
                },
                finished_at: Utc::now(),
            })
        };

        if let Some(record) = record {
            if let Err(e) = self.storage.append_record(&self.player_id, &record).await {
                error!("recording finished game for {} failed: {}", self.player_id, e);
            }
        }

        if outcome == Outcome::Won {
            if let GameMode::Campaign { level } = mode {
                self.unlock_if_frontier(level).await;
            }
        }
    }

    async fn unlock_if_frontier(&self, completed: LevelId) {
        let unlocked = {
            let mut progress = self.progress.write().await;
            progress.unlock_if_frontier(completed).then(|| *progress)
        };

        if let Some(progress) = unlocked {
            if let Err(e) = self.storage.save_progress(&self.player_id, &progress).await {
                error!("persisting progress for {} failed: {}", self.player_id, e);
            }
            self.send(GameMessage::progress(progress.highest_level_unlocked()))
                .await;
        }
    }

    /// "Try again": redraw a fresh secret for the same campaign level. A duel
    /// needs a newly entered phrase instead.
    async fn handle_reset(&self) -> Result<()> {
        let mode = {
            let game = self.game.read().await;
            game.as_ref().map(|active| active.mode)
        };

        match mode {
            None => {
                self.send(GameMessage::error(
                    ErrorCode::NoActiveGame,
                    "nothing to reset",
                ))
                .await;
            }
            Some(GameMode::Duel) => {
                self.send(GameMessage::error(
                    ErrorCode::InvalidOperation,
                    "enter a new phrase to play again",
                ))
                .await;
            }
            Some(GameMode::Campaign { .. }) => match self.catalog.pick() {
                Err(e) => {
                    self.send(GameMessage::error(ErrorCode::EmptyCatalog, &e.to_string()))
                        .await;
                }
                Ok(secret) => {
                    {
                        let mut game = self.game.write().await;
                        if let Some(active) = game.as_mut() {
                            active.session.reset(secret);
                        }
                    }
                    self.send_snapshot().await;
                }
            },
        }
        Ok(())
    }

    /// Advance to the next campaign level. Only valid after a win, and the
    /// target must already be unlocked; finishing at the frontier has just
    /// advanced it by one, so skipping ahead is impossible.
    async fn handle_next_level(&self) -> Result<()> {
        let next = {
            let game = self.game.read().await;
            match game.as_ref() {
                None => Err((ErrorCode::NoActiveGame, "no game in progress")),
                Some(active) => match active.mode {
                    GameMode::Duel => {
                        Err((ErrorCode::InvalidOperation, "duels have no levels"))
                    }
                    GameMode::Campaign { level } => {
                        if active.session.outcome() == Outcome::Won {
                            Ok(level + 1)
                        } else {
                            Err((
                                ErrorCode::InvalidOperation,
                                "finish the current level first",
                            ))
                        }
                    }
                },
            }
        };

        match next {
            Ok(level) => self.handle_start_level(level).await,
            Err((code, message)) => {
                self.send(GameMessage::error(code, message)).await;
                Ok(())
            }
        }
    }

    async fn handle_leave(&self) -> Result<()> {
        debug!("player {} left table {}", self.player_id, self.id);
        self.clear_channel().await;
        Ok(())
    }

    pub async fn clear_channel(&self) {
        *self.channel.write().await = None;
    }

    async fn send(&self, message: GameMessage) {
        let tx = self.channel.read().await.clone();
        if let Some(tx) = tx {
            if let Err(e) = tx.send(message).await {
                error!("sending to player {} failed: {}", self.player_id, e);
                self.clear_channel().await;
            }
        }
    }

    async fn send_snapshot(&self) {
        if let Some(snapshot) = self.snapshot().await {
            self.send(GameMessage::snapshot(&snapshot)).await;
        }
    }

    async fn snapshot(&self) -> Option<SessionSnapshot> {
        let progress = *self.progress.read().await;
        let game = self.game.read().await;
        game.as_ref().map(|active| {
            let session = &active.session;
            SessionSnapshot {
                mode: match active.mode {
                    GameMode::Campaign { .. } => "campaign".to_string(),
                    GameMode::Duel => "duel".to_string(),
                },
                level: match active.mode {
                    GameMode::Campaign { level } => Some(level),
                    GameMode::Duel => None,
                },
                outcome: session.outcome(),
                guessed_letters: session.guessed_letters().iter().copied().collect(),
                attempts_remaining: session.attempts_remaining(),
                masked_words: session.masked_words(),
                revealed_secret: if session.is_over() {
                    Some(session.secret().to_string())
                } else {
                    None
                },
                highest_level_unlocked: progress.highest_level_unlocked(),
            }
        })
    }

    pub async fn update_activity(&self) {
        *self.last_activity.write().await = Utc::now();
    }

    pub async fn idle_seconds(&self) -> i64 {
        let last = *self.last_activity.read().await;
        (Utc::now() - last).num_seconds()
    }

    /// (has an active game, that game is over, seconds since last command)
    pub async fn status(&self) -> (bool, bool, i64) {
        let game = self.game.read().await;
        let has_game = game.is_some();
        let is_over = game
            .as_ref()
            .map(|active| active.session.is_over())
            .unwrap_or(false);
        drop(game);
        (has_game, is_over, self.idle_seconds().await)
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(data: serde_json::Value) -> Result<T> {
    serde_json::from_value(data)
        .map_err(|e| crate::Error::InvalidOperation(format!("bad payload: {}", e)))
}
