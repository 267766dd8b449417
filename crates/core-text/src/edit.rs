//! Rune-capped buffer edits.
//!
//! All limits count Unicode scalar values, never bytes, so multi-byte text
//! behaves the same as ASCII. Edits only ever append or remove at the tail:
//! the composer has no mid-buffer cursor.

/// Maximum composer length in runes.
pub const MAX_INPUT_RUNES: usize = 2000;

/// Text-level meaning of one input event. Keys that carry no text (arrows,
/// function keys, chords) arrive as `Ignored` and leave the buffer untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInput<'a> {
    Rune(char),
    Paste(&'a str),
    Newline,
    Backspace,
    Ignored,
}

pub fn rune_len(s: &str) -> usize {
    s.chars().count()
}

/// Runes still available under `cap`.
pub fn remaining(text: &str, cap: usize) -> usize {
    cap.saturating_sub(rune_len(text))
}

/// Apply one input to `text`, honoring `cap`. Returns whether the text changed.
pub fn apply(text: &mut String, input: TextInput<'_>, cap: usize) -> bool {
    match input {
        TextInput::Rune(c) => push_rune(text, c, cap),
        TextInput::Paste(s) => insert_clamped(text, s, cap) > 0,
        TextInput::Newline => push_rune(text, '\n', cap),
        TextInput::Backspace => backspace(text).is_some(),
        TextInput::Ignored => false,
    }
}

/// Append a single rune if there is room.
pub fn push_rune(text: &mut String, c: char, cap: usize) -> bool {
    if remaining(text, cap) == 0 {
        return false;
    }
    text.push(c);
    true
}

/// Append as much of `s` as fits under `cap`; returns the number of runes
/// appended. A buffer already at cap drops the paste entirely.
pub fn insert_clamped(text: &mut String, s: &str, cap: usize) -> usize {
    let room = remaining(text, cap);
    if room == 0 || s.is_empty() {
        return 0;
    }
    let cut = s.char_indices().nth(room).map_or(s.len(), |(idx, _)| idx);
    let taken = &s[..cut];
    text.push_str(taken);
    rune_len(taken)
}

/// Remove exactly one trailing rune.
pub fn backspace(text: &mut String) -> Option<char> {
    text.pop()
}
