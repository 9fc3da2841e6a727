use crate::game::Secret;

/// Most spaces a player-entered phrase may keep (six words).
pub const MAX_SPACES: usize = 5;

/// Normalize free-text phrase entry from the two-player popup.
///
/// The input is uppercased, then filtered in place: only `A-Z` and the space
/// character survive, everything else is dropped without replacement. Once a
/// sixth space would be appended the scan stops, so at most [`MAX_SPACES`]
/// spaces remain and nothing after that point is kept.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut spaces = 0;

    for c in raw.to_uppercase().chars() {
        if c.is_ascii_uppercase() {
            out.push(c);
        } else if c == ' ' {
            if spaces == MAX_SPACES {
                break;
            }
            spaces += 1;
            out.push(c);
        }
    }

    out
}

/// Sanitize player input and build the secret for a two-player game.
/// Empty or whitespace-only input is rejected; the caller re-prompts.
pub fn sanitized_secret(raw: &str) -> crate::Result<Secret> {
    let cleaned = sanitize(raw);
    if cleaned.trim().is_empty() {
        return Err(crate::Error::InvalidSecret(
            "enter at least one letter".to_string(),
        ));
    }
    Secret::new(&cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uppercases_and_drops_punctuation_in_place() {
        assert_eq!(sanitize("hello   world!!!"), "HELLO   WORLD");
    }

    #[test]
    fn trailing_space_is_kept_not_collapsed() {
        assert_eq!(sanitize("hello   world!!! "), "HELLO   WORLD ");
    }

    #[test]
    fn dropped_characters_leave_no_gap() {
        assert_eq!(sanitize("it's a trap"), "ITS A TRAP");
        assert_eq!(sanitize("up-to-date"), "UPTODATE");
    }

    #[test]
    fn digits_and_symbols_are_dropped() {
        assert_eq!(sanitize("route 66!"), "ROUTE ");
        assert_eq!(sanitize("123"), "");
    }

    #[test]
    fn truncates_before_the_sixth_space() {
        assert_eq!(sanitize("a b c d e f g h"), "A B C D E F");
        assert_eq!(sanitize("one two three four five six"), "ONE TWO THREE FOUR FIVE SIX");
    }

    #[test]
    fn seven_spaces_keep_exactly_five() {
        let out = sanitize("w x y z a b c d");
        assert_eq!(out.chars().filter(|c| *c == ' ').count(), MAX_SPACES);
        assert_eq!(out, "W X Y Z A B");
    }

    #[test]
    fn empty_input_cannot_start_a_session() {
        assert!(matches!(
            sanitized_secret(""),
            Err(crate::Error::InvalidSecret(_))
        ));
        assert!(matches!(
            sanitized_secret("   "),
            Err(crate::Error::InvalidSecret(_))
        ));
        assert!(matches!(
            sanitized_secret("123!?"),
            Err(crate::Error::InvalidSecret(_))
        ));
    }

    #[test]
    fn valid_input_becomes_a_secret() {
        let secret = sanitized_secret("  big cat  ").unwrap();
        assert_eq!(secret.tokens(), &["BIG".to_string(), "CAT".to_string()]);
    }
}
