//! Composition state machine for the chat input row.
//!
//! One [`Composer`] value holds the shared buffer plus the current
//! [`ComposeMode`]; the autocomplete sub-modes carry their own query, matches
//! and cursor. Every transition replaces the mode wholesale, so there are no
//! loose flags that can disagree with each other.
//!
//! Sub-mode invariant: while `Mention` or `Project` is active the buffer ends
//! with `sigil + query` and the candidate list is non-empty. Any edit that
//! would break either collapses back to `Normal`.

pub mod autocomplete;
pub mod slash;

pub use autocomplete::{Autocomplete, POPUP_ROWS, Sigil};
pub use slash::{SLASH_COMMANDS, SlashCommand, creates_project, slash_hints};

use core_events::{KeyCode, KeyEvent, KeyModifiers};
use core_text::MAX_INPUT_RUNES;
use core_text::edit::{self, TextInput};
use tracing::debug;

/// Candidate pools and identity consulted by the composer.
pub trait ComposeContext {
    fn known_logins(&self) -> Vec<String>;
    fn project_names(&self) -> Vec<String>;
    fn has_identity(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ComposeMode {
    #[default]
    Normal,
    Mention(Autocomplete),
    Project(Autocomplete),
}

impl ComposeMode {
    fn with(ac: Autocomplete) -> Self {
        match ac.sigil() {
            Sigil::Mention => Self::Mention(ac),
            Sigil::Project => Self::Project(ac),
        }
    }

    pub fn autocomplete(&self) -> Option<&Autocomplete> {
        match self {
            Self::Normal => None,
            Self::Mention(ac) | Self::Project(ac) => Some(ac),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Mention(_) => "mention",
            Self::Project(_) => "project",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeOutcome {
    Unchanged,
    Edited,
    /// Trimmed body to send; the buffer has been cleared.
    Submitted(String),
    /// Submit attempted without an identity; the buffer is kept.
    AuthRequired,
    /// Esc in normal mode: hand focus back to the log.
    Unfocus,
}

#[derive(Debug, Clone)]
pub struct Composer {
    text: String,
    mode: ComposeMode,
    cap: usize,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    pub fn new() -> Self {
        Self::with_cap(MAX_INPUT_RUNES)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            text: String::new(),
            mode: ComposeMode::Normal,
            cap,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mode(&self) -> &ComposeMode {
        &self.mode
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replace the buffer (used to seed `/` when focusing). Closes any popup.
    pub fn set_text(&mut self, text: &str) {
        self.text.clear();
        edit::insert_clamped(&mut self.text, text, self.cap);
        self.mode = ComposeMode::Normal;
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.mode = ComposeMode::Normal;
    }

    /// Slash hints for the current buffer.
    pub fn hints(&self) -> Vec<&'static SlashCommand> {
        slash_hints(&self.text)
    }

    /// Append pasted text, truncated to the remaining capacity. A paste ends
    /// any autocomplete since the buffer no longer ends in `sigil + query`.
    pub fn paste(&mut self, text: &str) -> ComposeOutcome {
        self.mode = ComposeMode::Normal;
        if edit::apply(&mut self.text, TextInput::Paste(text), self.cap) {
            ComposeOutcome::Edited
        } else {
            ComposeOutcome::Unchanged
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent, ctx: &impl ComposeContext) -> ComposeOutcome {
        match std::mem::take(&mut self.mode) {
            ComposeMode::Normal => self.normal_key(key, ctx),
            ComposeMode::Mention(ac) | ComposeMode::Project(ac) => self.autocomplete_key(ac, key, ctx),
        }
    }

    fn pool(sigil: Sigil, ctx: &impl ComposeContext) -> Vec<String> {
        match sigil {
            Sigil::Mention => ctx.known_logins(),
            Sigil::Project => ctx.project_names(),
        }
    }

    fn autocomplete_key(
        &mut self,
        mut ac: Autocomplete,
        key: &KeyEvent,
        ctx: &impl ComposeContext,
    ) -> ComposeOutcome {
        let plain_enter = key.code == KeyCode::Enter
            && !key.mods.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT);
        match key.code {
            KeyCode::Tab => self.accept(&ac),
            _ if plain_enter => self.accept(&ac),
            KeyCode::Up => {
                ac.move_up();
                self.mode = ComposeMode::with(ac);
                ComposeOutcome::Edited
            }
            KeyCode::Down => {
                ac.move_down();
                self.mode = ComposeMode::with(ac);
                ComposeOutcome::Edited
            }
            KeyCode::Esc => ComposeOutcome::Edited,
            KeyCode::Backspace => {
                let pool = Self::pool(ac.sigil(), ctx);
                match ac.pop_query(&pool) {
                    None => {
                        if self.text.ends_with(ac.sigil().as_char()) {
                            edit::backspace(&mut self.text);
                        }
                    }
                    Some(still_matching) => {
                        edit::backspace(&mut self.text);
                        if still_matching {
                            self.mode = ComposeMode::with(ac);
                        }
                    }
                }
                ComposeOutcome::Edited
            }
            _ => match key.printable() {
                Some(' ') => {
                    edit::push_rune(&mut self.text, ' ', self.cap);
                    ComposeOutcome::Edited
                }
                Some(c) => {
                    if !edit::push_rune(&mut self.text, c, self.cap) {
                        self.mode = ComposeMode::with(ac);
                        return ComposeOutcome::Unchanged;
                    }
                    let pool = Self::pool(ac.sigil(), ctx);
                    if ac.push_query(c, &pool) {
                        self.mode = ComposeMode::with(ac);
                    }
                    ComposeOutcome::Edited
                }
                None => {
                    self.mode = ComposeMode::with(ac);
                    ComposeOutcome::Unchanged
                }
            },
        }
    }

    /// Replace the trailing `sigil + query` with the selected completion.
    fn accept(&mut self, ac: &Autocomplete) -> ComposeOutcome {
        let Some(completion) = ac.completion() else {
            return ComposeOutcome::Edited;
        };
        let typed_len = ac.sigil().as_char().len_utf8() + ac.query().len();
        if self.text.len() >= typed_len {
            self.text.truncate(self.text.len() - typed_len);
        }
        edit::insert_clamped(&mut self.text, &completion, self.cap);
        ComposeOutcome::Edited
    }

    fn normal_key(&mut self, key: &KeyEvent, ctx: &impl ComposeContext) -> ComposeOutcome {
        match key.code {
            KeyCode::Esc => ComposeOutcome::Unfocus,
            KeyCode::Enter if key.mods.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
                self.edit(TextInput::Newline)
            }
            KeyCode::Enter => self.submit(ctx),
            KeyCode::Backspace => self.edit(TextInput::Backspace),
            _ => match key.printable() {
                Some(c) => match Sigil::from_char(c) {
                    Some(sigil) => self.open(sigil, ctx),
                    None => self.edit(TextInput::Rune(c)),
                },
                None => ComposeOutcome::Unchanged,
            },
        }
    }

    fn edit(&mut self, input: TextInput<'_>) -> ComposeOutcome {
        if edit::apply(&mut self.text, input, self.cap) {
            ComposeOutcome::Edited
        } else {
            ComposeOutcome::Unchanged
        }
    }

    /// Insert the sigil and enter its sub-mode when candidates exist.
    fn open(&mut self, sigil: Sigil, ctx: &impl ComposeContext) -> ComposeOutcome {
        if !edit::push_rune(&mut self.text, sigil.as_char(), self.cap) {
            return ComposeOutcome::Unchanged;
        }
        if let Some(ac) = Autocomplete::open(sigil, &Self::pool(sigil, ctx)) {
            self.mode = ComposeMode::with(ac);
        }
        ComposeOutcome::Edited
    }

    fn submit(&mut self, ctx: &impl ComposeContext) -> ComposeOutcome {
        let body = self.text.trim();
        if body.is_empty() {
            return ComposeOutcome::Unchanged;
        }
        if !ctx.has_identity() {
            debug!(target: "compose.submit", "rejected: no identity");
            return ComposeOutcome::AuthRequired;
        }
        let body = body.to_string();
        debug!(target: "compose.submit", runes = edit::rune_len(&body), "submit");
        self.clear();
        ComposeOutcome::Submitted(body)
    }
}
