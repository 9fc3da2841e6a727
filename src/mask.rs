use crate::game::Secret;
use std::collections::BTreeSet;

/// Symbols shown literally without ever being guessed.
pub const PASS_THROUGH: [char; 5] = ['-', '\'', '?', '!', '\u{2019}'];

/// Glyph standing in for a letter that has not been guessed yet.
pub const PLACEHOLDER: char = '_';

fn is_pass_through(c: char) -> bool {
    PASS_THROUGH.contains(&c)
}

/// Player-visible rendering of the secret, one string per token. Characters
/// inside a token are joined by single spaces; this is display convention
/// only, the secret itself keeps no spaces within a token.
pub fn masked_tokens(secret: &Secret, guessed: &BTreeSet<char>) -> Vec<String> {
    secret
        .tokens()
        .iter()
        .map(|token| {
            let shown: Vec<String> = token
                .chars()
                .map(|c| {
                    if guessed.contains(&c) || is_pass_through(c) {
                        c.to_string()
                    } else {
                        PLACEHOLDER.to_string()
                    }
                })
                .collect();
            shown.join(" ")
        })
        .collect()
}

/// The authoritative win test: the secret counts as revealed once no
/// placeholder appears in any token's rendering. Pass-through punctuation
/// therefore never blocks a win.
pub fn is_fully_revealed(secret: &Secret, guessed: &BTreeSet<char>) -> bool {
    masked_tokens(secret, guessed)
        .iter()
        .all(|token| !token.contains(PLACEHOLDER))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guessed(letters: &[char]) -> BTreeSet<char> {
        letters.iter().copied().collect()
    }

    #[test]
    fn unguessed_letters_are_placeholders() {
        let secret = Secret::new("CAT").unwrap();
        assert_eq!(masked_tokens(&secret, &guessed(&[])), vec!["_ _ _"]);
        assert_eq!(masked_tokens(&secret, &guessed(&['A'])), vec!["_ A _"]);
    }

    #[test]
    fn tokens_render_separately() {
        let secret = Secret::new("BIG CAT").unwrap();
        let words = masked_tokens(&secret, &guessed(&['B', 'C']));
        assert_eq!(words, vec!["B _ _", "C _ _"]);
    }

    #[test]
    fn pass_through_symbols_show_without_being_guessed() {
        let secret = Secret::new("DON'T-STOP! WHY? IT\u{2019}S").unwrap();
        let words = masked_tokens(&secret, &guessed(&[]));
        assert_eq!(words[0], "_ _ _ ' _ - _ _ _ _ !");
        assert_eq!(words[1], "_ _ _ ?");
        assert_eq!(words[2], "_ _ \u{2019} _");
    }

    #[test]
    fn fully_revealed_iff_no_placeholder() {
        let secret = Secret::new("NO-ONE").unwrap();
        let mut letters = guessed(&['N', 'O']);
        assert!(!is_fully_revealed(&secret, &letters));
        letters.insert('E');
        assert!(is_fully_revealed(&secret, &letters));
    }

    #[test]
    fn extra_guesses_do_not_affect_reveal() {
        let secret = Secret::new("HI").unwrap();
        let letters = guessed(&['H', 'I', 'Q', 'Z']);
        assert!(is_fully_revealed(&secret, &letters));
    }
}
