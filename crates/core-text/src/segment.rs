//! Paste normalization.
//!
//! Contract:
//! - Input: raw text from a bracketed paste (may carry CRLF endings, tabs,
//!   terminal control bytes, decomposed accents).
//! - Output: NFC text containing only `\n` line breaks and printable runes;
//!   tabs become single spaces so column math stays honest.
//! - Safety: does not log content.

use unicode_normalization::UnicodeNormalization;

pub fn normalize_paste(input: &str) -> String {
    strip_controls(input).nfc().collect()
}

/// Unify line endings, turn tabs into spaces and drop every other control
/// rune. Applied to server-supplied text before it can reach the terminal.
pub fn strip_controls(input: &str) -> String {
    input
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter_map(|c| match c {
            '\n' => Some('\n'),
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}
