//! Text primitives shared by every text-entry and text-display surface:
//! rune-capped edits, display width, word + hard wrapping, and link/mention
//! detection.
//!
//! Length limits are counted in Unicode scalar values (runes); layout is
//! measured in terminal cells via [`egc_width`].

pub mod edit;
pub mod link;
pub mod segment;
pub mod width;
pub mod wrap;

pub use edit::{MAX_INPUT_RUNES, TextInput, rune_len};
pub use width::{egc_width, str_width, truncate_to_width};
pub use wrap::{VisualLine, hard_wrap, unwrap_lines, wrap};

/// Shorten to at most `max` runes, replacing the tail with `…` when cut.
pub fn truncate_runes(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    out
}

/// Flatten a title for one-line display: drop leading markdown header
/// markers and collapse all whitespace runs to single spaces.
pub fn clean_title(raw: &str) -> String {
    let mut s = raw.trim_start();
    while let Some(rest) = s.strip_prefix('#') {
        s = rest.trim_start_matches('#').trim_start();
    }
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub mod grapheme {
    use crate::egc_width;
    use unicode_segmentation::UnicodeSegmentation;

    /// Iterate grapheme clusters in a line.
    pub fn iter(line: &str) -> impl Iterator<Item = &str> {
        line.graphemes(true)
    }

    /// Width in terminal cells of this grapheme cluster.
    pub fn cluster_width(g: &str) -> usize {
        egc_width(g) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_runes_cases() {
        assert_eq!(truncate_runes("hello", 10), "hello");
        assert_eq!(truncate_runes("hello", 5), "hello");
        assert_eq!(truncate_runes("hello world", 5), "hell…");
        assert_eq!(truncate_runes("", 5), "");
        assert_eq!(truncate_runes("ab", 1), "…");
        assert_eq!(truncate_runes("ab", 0), "");
        assert_eq!(truncate_runes("😀😁😂", 2), "😀…");
        assert_eq!(truncate_runes("你好世界", 3), "你好…");
        assert_eq!(truncate_runes("cafés are nice", 5), "café…");
    }

    #[test]
    fn clean_title_strips_headers_and_collapses() {
        assert_eq!(clean_title("# Header Name"), "Header Name");
        assert_eq!(clean_title("### deep\n\nheader"), "deep header");
        assert_eq!(clean_title("  plain\r\ntitle  "), "plain title");
        assert_eq!(clean_title("#"), "");
        assert_eq!(clean_title("a # b"), "a # b");
    }

    #[test]
    fn grapheme_iter_keeps_clusters_whole() {
        let clusters: Vec<_> = grapheme::iter("e\u{0301}x").collect();
        assert_eq!(clusters, vec!["e\u{0301}", "x"]);
        assert_eq!(grapheme::cluster_width("x"), 1);
    }
}
