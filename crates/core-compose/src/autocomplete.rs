//! Candidate filtering and selection for the `@` and `#` sub-modes.

/// Rows an autocomplete popup shows at once.
pub const POPUP_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sigil {
    Mention,
    Project,
}

impl Sigil {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '@' => Some(Self::Mention),
            '#' => Some(Self::Project),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Mention => '@',
            Self::Project => '#',
        }
    }

    /// Mentions match a case-insensitive prefix, projects a substring. An
    /// empty query matches everything.
    pub fn matches(self, candidate: &str, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let c = candidate.to_lowercase();
        let q = query.to_lowercase();
        match self {
            Self::Mention => c.starts_with(&q),
            Self::Project => c.contains(&q),
        }
    }
}

/// Mode-local fields of an autocomplete sub-state. Never constructed with an
/// empty candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Autocomplete {
    sigil: Sigil,
    query: String,
    matches: Vec<String>,
    cursor: usize,
}

impl Autocomplete {
    /// Open with an empty query; `None` when the pool has no candidates.
    pub fn open(sigil: Sigil, pool: &[String]) -> Option<Self> {
        let mut ac = Self {
            sigil,
            query: String::new(),
            matches: Vec::new(),
            cursor: 0,
        };
        ac.refilter(pool).then_some(ac)
    }

    pub fn sigil(&self) -> Sigil {
        self.sigil
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[String] {
        &self.matches
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&str> {
        self.matches.get(self.cursor).map(String::as_str)
    }

    /// Re-run the filter and reset the selection; false when nothing matches.
    pub fn refilter(&mut self, pool: &[String]) -> bool {
        self.matches = pool
            .iter()
            .filter(|c| self.sigil.matches(c, &self.query))
            .cloned()
            .collect();
        self.cursor = 0;
        !self.matches.is_empty()
    }

    pub fn push_query(&mut self, c: char, pool: &[String]) -> bool {
        self.query.push(c);
        self.refilter(pool)
    }

    /// Drop the last query rune. Returns `None` when the query was already empty.
    pub fn pop_query(&mut self, pool: &[String]) -> Option<bool> {
        self.query.pop()?;
        Some(self.refilter(pool))
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.matches.len() {
            self.cursor += 1;
        }
    }

    /// Text replacing the typed `sigil+query`. Projects insert the first word
    /// of their name.
    pub fn completion(&self) -> Option<String> {
        let selected = self.selected()?;
        let word = match self.sigil {
            Sigil::Mention => selected,
            Sigil::Project => selected.split_whitespace().next()?,
        };
        Some(format!("{}{} ", self.sigil.as_char(), word))
    }

    /// Popup rows: offset of the first visible candidate and the visible
    /// slice, scrolled so the cursor stays on screen.
    pub fn visible(&self) -> (usize, &[String]) {
        let rows = POPUP_ROWS.min(self.matches.len());
        let start = (self.cursor + 1).saturating_sub(rows);
        (start, &self.matches[start..start + rows])
    }

    pub fn popup_height(&self) -> usize {
        POPUP_ROWS.min(self.matches.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn mention_prefix_is_case_insensitive() {
        assert!(Sigil::Mention.matches("Alice", "al"));
        assert!(!Sigil::Mention.matches("malice", "al"));
        assert!(Sigil::Mention.matches("anyone", ""));
    }

    #[test]
    fn project_substring() {
        assert!(Sigil::Project.matches("Grimoire Loom", "LOOM"));
        assert!(!Sigil::Project.matches("Forge", "x"));
    }

    #[test]
    fn open_requires_candidates() {
        assert!(Autocomplete::open(Sigil::Mention, &[]).is_none());
        let ac = Autocomplete::open(Sigil::Mention, &pool(&["a", "b"])).unwrap();
        assert_eq!(ac.matches().len(), 2);
        assert_eq!(ac.selected(), Some("a"));
    }

    #[test]
    fn cursor_is_clamped_without_wrap() {
        let mut ac = Autocomplete::open(Sigil::Mention, &pool(&["a", "b"])).unwrap();
        ac.move_up();
        assert_eq!(ac.cursor(), 0);
        ac.move_down();
        ac.move_down();
        assert_eq!(ac.cursor(), 1);
    }

    #[test]
    fn project_completion_uses_first_word() {
        let ac = Autocomplete::open(Sigil::Project, &pool(&["Loom Engine v2"])).unwrap();
        assert_eq!(ac.completion().as_deref(), Some("#Loom "));
    }

    #[test]
    fn blank_project_name_has_no_completion() {
        let ac = Autocomplete::open(Sigil::Project, &pool(&["   "])).unwrap();
        assert_eq!(ac.completion(), None);
    }

    #[test]
    fn popup_scrolls_to_keep_cursor_visible() {
        let names = pool(&["a", "b", "c", "d", "e", "f", "g"]);
        let mut ac = Autocomplete::open(Sigil::Mention, &names).unwrap();
        assert_eq!(ac.visible().0, 0);
        assert_eq!(ac.popup_height(), 5);
        for _ in 0..6 {
            ac.move_down();
        }
        let (start, rows) = ac.visible();
        assert_eq!(start, 2);
        assert_eq!(rows.last().map(String::as_str), Some("g"));
    }

    #[test]
    fn pop_on_empty_query_reports_none() {
        let mut ac = Autocomplete::open(Sigil::Mention, &pool(&["a"])).unwrap();
        assert_eq!(ac.pop_query(&pool(&["a"])), None);
        assert!(ac.push_query('a', &pool(&["a"])));
        assert_eq!(ac.pop_query(&pool(&["a"])), Some(true));
    }
}
