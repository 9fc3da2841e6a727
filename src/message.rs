use crate::game::{GuessEvent, LevelId, Outcome};
use serde::{Deserialize, Serialize};

/// Wire envelope: every client command and server notification is one of
/// these, with the payload shape keyed by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMessage {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ErrorCode {
    LevelLocked,
    EmptyCatalog,
    InvalidSecret,
    InvalidOperation,
    NoActiveGame,
    ParseError,
    StorageError,
    InternalError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartLevelPayload {
    pub level: LevelId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartDuelPayload {
    pub phrase: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuessPayload {
    pub letter: char,
}

/// The observable session surface published after every command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<LevelId>,
    pub outcome: Outcome,
    pub guessed_letters: Vec<char>,
    pub attempts_remaining: u32,
    pub masked_words: Vec<String>,
    /// Only present once the game is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revealed_secret: Option<String>,
    pub highest_level_unlocked: LevelId,
}

impl GameMessage {
    pub fn new(type_: &str, data: serde_json::Value) -> Self {
        GameMessage {
            type_: type_.to_string(),
            data,
        }
    }

    pub fn error(code: ErrorCode, message: &str) -> Self {
        GameMessage::new(
            "error",
            serde_json::json!({
                "code": code,
                "message": message,
            }),
        )
    }

    pub fn snapshot(snapshot: &SessionSnapshot) -> Self {
        GameMessage::new(
            "session",
            serde_json::to_value(snapshot).unwrap_or_default(),
        )
    }

    pub fn progress(highest_level_unlocked: LevelId) -> Self {
        GameMessage::new(
            "progress",
            serde_json::json!({
                "highestLevelUnlocked": highest_level_unlocked,
            }),
        )
    }

    pub fn guess_result(event: &GuessEvent) -> Self {
        let data = match event {
            GuessEvent::Hit { letter, outcome } => serde_json::json!({
                "result": "hit",
                "letter": letter,
                "outcome": outcome,
            }),
            GuessEvent::Miss {
                letter,
                attempts_remaining,
                outcome,
            } => serde_json::json!({
                "result": "miss",
                "letter": letter,
                "attempts_remaining": attempts_remaining,
                "outcome": outcome,
            }),
            GuessEvent::AlreadyGuessed { letter } => serde_json::json!({
                "result": "repeat",
                "letter": letter,
            }),
        };
        GameMessage::new("guess_result", data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_uses_a_type_field() {
        let msg = GameMessage::progress(4);
        let text = serde_json::to_string(&msg).unwrap();
        assert!(text.contains("\"type\":\"progress\""));
        assert!(text.contains("\"highestLevelUnlocked\":4"));
    }

    #[test]
    fn guess_payload_accepts_a_single_letter() {
        let msg: GameMessage =
            serde_json::from_str(r#"{"type":"guess","data":{"letter":"A"}}"#).unwrap();
        let payload: GuessPayload = serde_json::from_value(msg.data).unwrap();
        assert_eq!(payload.letter, 'A');
    }

    #[test]
    fn missing_data_defaults_to_null() {
        let msg: GameMessage = serde_json::from_str(r#"{"type":"reset"}"#).unwrap();
        assert_eq!(msg.type_, "reset");
        assert!(msg.data.is_null());
    }

    #[test]
    fn terminal_snapshot_reveals_the_secret() {
        let snapshot = SessionSnapshot {
            mode: "campaign".to_string(),
            level: Some(3),
            outcome: Outcome::Lost,
            guessed_letters: vec!['A', 'B'],
            attempts_remaining: 0,
            masked_words: vec!["_ A _".to_string()],
            revealed_secret: Some("CAB".to_string()),
            highest_level_unlocked: 5,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["revealed_secret"], "CAB");
        assert_eq!(value["outcome"], "Lost");
    }
}
