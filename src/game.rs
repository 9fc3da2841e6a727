use crate::mask;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Campaign level number, 1-based.
pub type LevelId = u32;

/// Wrong guesses allowed before the game is lost.
pub const STARTING_ATTEMPTS: u32 = 8;

/// The word or phrase being guessed. Tokens are the whitespace-separated
/// words, uppercased at construction; a secret is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    tokens: Vec<String>,
}

impl Secret {
    pub fn new(phrase: &str) -> crate::Result<Self> {
        let tokens: Vec<String> = phrase
            .to_uppercase()
            .split_whitespace()
            .map(|t| t.to_string())
            .collect();

        if tokens.is_empty() {
            return Err(crate::Error::InvalidSecret(
                "secret must contain at least one word".to_string(),
            ));
        }

        Ok(Secret { tokens })
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Whether the letter appears anywhere in the phrase.
    pub fn contains(&self, letter: char) -> bool {
        self.tokens.iter().any(|token| token.contains(letter))
    }

    /// The distinct A-Z letters a player would have to guess to reveal
    /// everything that is not a pass-through symbol.
    pub fn distinct_letters(&self) -> BTreeSet<char> {
        self.tokens
            .iter()
            .flat_map(|token| token.chars())
            .filter(|c| c.is_ascii_uppercase())
            .collect()
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}

/// Session outcome. `Won` and `Lost` are terminal: nothing leaves them
/// except `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    InProgress,
    Won,
    Lost,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::InProgress => write!(f, "in_progress"),
            Outcome::Won => write!(f, "won"),
            Outcome::Lost => write!(f, "lost"),
        }
    }
}

/// What a single guess did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessEvent {
    Hit { letter: char, outcome: Outcome },
    Miss {
        letter: char,
        attempts_remaining: u32,
        outcome: Outcome,
    },
    /// The letter was guessed earlier this session; nothing changed.
    AlreadyGuessed { letter: char },
}

impl GuessEvent {
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            GuessEvent::Hit { outcome, .. } => Some(*outcome),
            GuessEvent::Miss { outcome, .. } => Some(*outcome),
            GuessEvent::AlreadyGuessed { .. } => None,
        }
    }
}

/// One game of guessing a single secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    secret: Secret,
    guessed: BTreeSet<char>,
    attempts_remaining: u32,
    outcome: Outcome,
}

impl GameSession {
    pub fn new(secret: Secret) -> Self {
        GameSession {
            secret,
            guessed: BTreeSet::new(),
            attempts_remaining: STARTING_ATTEMPTS,
            outcome: Outcome::InProgress,
        }
    }

    /// Process one guessed letter.
    ///
    /// A repeat of an earlier guess never costs an attempt. Outcome is
    /// evaluated lose-first: hitting zero attempts loses even if the same
    /// turn would have completed the word.
    pub fn guess(&mut self, letter: char) -> crate::Result<GuessEvent> {
        if self.outcome != Outcome::InProgress {
            return Err(crate::Error::InvalidOperation(format!(
                "session is already {}",
                self.outcome
            )));
        }

        let letter = letter.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return Err(crate::Error::InvalidOperation(format!(
                "guess must be a letter A-Z, got {:?}",
                letter
            )));
        }

        if self.guessed.contains(&letter) {
            return Ok(GuessEvent::AlreadyGuessed { letter });
        }
        self.guessed.insert(letter);

        if self.secret.contains(letter) {
            self.evaluate_outcome();
            return Ok(GuessEvent::Hit {
                letter,
                outcome: self.outcome,
            });
        }

        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        self.evaluate_outcome();
        Ok(GuessEvent::Miss {
            letter,
            attempts_remaining: self.attempts_remaining,
            outcome: self.outcome,
        })
    }

    fn evaluate_outcome(&mut self) {
        if self.attempts_remaining == 0 {
            self.outcome = Outcome::Lost;
        } else if mask::is_fully_revealed(&self.secret, &self.guessed) {
            self.outcome = Outcome::Won;
        }
    }

    /// Start over with a fresh secret ("try again" / "next level").
    pub fn reset(&mut self, secret: Secret) {
        self.secret = secret;
        self.guessed.clear();
        self.attempts_remaining = STARTING_ATTEMPTS;
        self.outcome = Outcome::InProgress;
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome != Outcome::InProgress
    }

    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    pub fn guessed_letters(&self) -> &BTreeSet<char> {
        &self.guessed
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    /// The player-visible rendering, one string per word.
    pub fn masked_words(&self) -> Vec<String> {
        mask::masked_tokens(&self.secret, &self.guessed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(phrase: &str) -> GameSession {
        GameSession::new(Secret::new(phrase).unwrap())
    }

    #[test]
    fn secret_is_uppercased_and_tokenized() {
        let secret = Secret::new("hello world").unwrap();
        assert_eq!(secret.tokens(), &["HELLO".to_string(), "WORLD".to_string()]);
        assert!(secret.contains('H'));
        assert!(!secret.contains('Z'));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            Secret::new("   "),
            Err(crate::Error::InvalidSecret(_))
        ));
        assert!(matches!(Secret::new(""), Err(crate::Error::InvalidSecret(_))));
    }

    #[test]
    fn cat_scenario_three_misses_then_win() {
        let mut game = session("CAT");
        for wrong in ['Z', 'X', 'Q'] {
            game.guess(wrong).unwrap();
        }
        assert_eq!(game.attempts_remaining(), 5);
        assert_eq!(game.outcome(), Outcome::InProgress);

        game.guess('C').unwrap();
        game.guess('A').unwrap();
        let event = game.guess('T').unwrap();
        assert_eq!(event.outcome(), Some(Outcome::Won));
        assert_eq!(game.outcome(), Outcome::Won);
        assert_eq!(game.attempts_remaining(), 5);
    }

    #[test]
    fn dog_scenario_eight_misses_loses() {
        let mut game = session("DOG");
        let wrong = ['A', 'B', 'C', 'E', 'F', 'H', 'I', 'J'];
        for (i, letter) in wrong.iter().enumerate() {
            let event = game.guess(*letter).unwrap();
            match event {
                GuessEvent::Miss {
                    attempts_remaining, ..
                } => assert_eq!(attempts_remaining as usize, 7 - i),
                other => panic!("expected a miss, got {:?}", other),
            }
        }
        assert_eq!(game.outcome(), Outcome::Lost);
        assert_eq!(game.attempts_remaining(), 0);
    }

    #[test]
    fn hits_never_cost_attempts() {
        let mut game = session("BANANA");
        for letter in ['B', 'A', 'N'] {
            game.guess(letter).unwrap();
        }
        assert_eq!(game.outcome(), Outcome::Won);
        assert_eq!(game.attempts_remaining(), STARTING_ATTEMPTS);
    }

    #[test]
    fn repeated_wrong_letter_costs_exactly_one_attempt() {
        let mut game = session("CAT");
        game.guess('Z').unwrap();
        let event = game.guess('Z').unwrap();
        assert_eq!(event, GuessEvent::AlreadyGuessed { letter: 'Z' });
        assert_eq!(game.attempts_remaining(), STARTING_ATTEMPTS - 1);
    }

    #[test]
    fn lowercase_guesses_are_normalized() {
        let mut game = session("CAT");
        game.guess('c').unwrap();
        let event = game.guess('C').unwrap();
        assert_eq!(event, GuessEvent::AlreadyGuessed { letter: 'C' });
    }

    #[test]
    fn non_letter_guess_is_rejected_without_state_change() {
        let mut game = session("CAT");
        assert!(matches!(
            game.guess('!'),
            Err(crate::Error::InvalidOperation(_))
        ));
        assert!(game.guessed_letters().is_empty());
        assert_eq!(game.attempts_remaining(), STARTING_ATTEMPTS);
    }

    #[test]
    fn guessing_after_terminal_state_is_an_error() {
        let mut game = session("A");
        game.guess('A').unwrap();
        assert_eq!(game.outcome(), Outcome::Won);
        assert!(matches!(
            game.guess('B'),
            Err(crate::Error::InvalidOperation(_))
        ));
        assert_eq!(game.outcome(), Outcome::Won);
    }

    #[test]
    fn punctuation_never_blocks_a_win() {
        let mut game = session("DON'T");
        for letter in ['D', 'O', 'N', 'T'] {
            game.guess(letter).unwrap();
        }
        assert_eq!(game.outcome(), Outcome::Won);
    }

    #[test]
    fn attempts_never_go_below_zero() {
        let mut game = session("XYZ");
        for letter in ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'] {
            game.guess(letter).unwrap();
        }
        assert_eq!(game.attempts_remaining(), 0);
        assert_eq!(game.outcome(), Outcome::Lost);
        assert!(game.guess('I').is_err());
        assert_eq!(game.attempts_remaining(), 0);
    }

    #[test]
    fn reset_starts_a_fresh_session() {
        let mut game = session("CAT");
        game.guess('Z').unwrap();
        game.guess('C').unwrap();

        game.reset(Secret::new("DOG").unwrap());
        assert_eq!(game.outcome(), Outcome::InProgress);
        assert!(game.guessed_letters().is_empty());
        assert_eq!(game.attempts_remaining(), STARTING_ATTEMPTS);
        assert_eq!(game.secret().to_string(), "DOG");
    }

    #[test]
    fn full_letter_coverage_always_wins() {
        let mut game = session("NEVER GONNA GIVE YOU UP");
        let letters: Vec<char> = game.secret().distinct_letters().into_iter().collect();
        for letter in letters {
            game.guess(letter).unwrap();
        }
        assert_eq!(game.outcome(), Outcome::Won);
        assert_eq!(game.attempts_remaining(), STARTING_ATTEMPTS);
    }
}
