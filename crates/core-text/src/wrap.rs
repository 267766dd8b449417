//! Word-aware soft wrap followed by a hard-wrap pass.
//!
//! Each `\n`-separated logical line is wrapped greedily at whitespace. Any
//! visual line still wider than the target (a long URL, a run of CJK with no
//! spaces) is then sliced at grapheme boundaries. Wrapping never drops
//! content: whitespace consumed by a soft break is kept on the line record so
//! [`unwrap_lines`] can rebuild the exact input.

use crate::width::{egc_width, str_width};
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualLine {
    /// Displayed text.
    pub text: String,
    /// Byte offset of `text` within the wrapped source.
    pub start: usize,
    /// Whitespace swallowed by the soft break that ends this line.
    pub swallowed: String,
    /// True when the next visual line continues the same logical line.
    pub soft_break: bool,
}

impl VisualLine {
    /// Byte range of `text` within the wrapped source.
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.text.len()
    }
}

/// Wrap `text` into visual lines no wider than `width` cells. A single
/// cluster wider than `width` still gets its own line, so a zero width
/// degrades to one cluster per line instead of looping.
pub fn wrap(text: &str, width: usize) -> Vec<VisualLine> {
    let mut out = Vec::new();
    let mut offset = 0usize;
    for logical in text.split('\n') {
        word_wrap_into(logical, offset, width, &mut out);
        offset += logical.len() + 1;
    }
    out
}

/// Rebuild the wrapped source from its visual lines.
pub fn unwrap_lines(lines: &[VisualLine]) -> String {
    let mut out = String::new();
    for (idx, line) in lines.iter().enumerate() {
        out.push_str(&line.text);
        out.push_str(&line.swallowed);
        if !line.soft_break && idx + 1 < lines.len() {
            out.push('\n');
        }
    }
    out
}

/// Slice a single line into pieces of at most `width` cells.
pub fn hard_wrap(line: &str, width: usize) -> Vec<String> {
    hard_split(line, width)
        .into_iter()
        .map(|r| line[r].to_string())
        .collect()
}

fn hard_split(line: &str, width: usize) -> Vec<Range<usize>> {
    if str_width(line) <= width {
        return vec![0..line.len()];
    }
    let mut pieces = Vec::new();
    let mut start = 0usize;
    let mut used = 0usize;
    for (idx, g) in line.grapheme_indices(true) {
        let w = egc_width(g) as usize;
        if used + w > width && idx > start {
            pieces.push(start..idx);
            start = idx;
            used = 0;
        }
        used += w;
    }
    if start < line.len() {
        pieces.push(start..line.len());
    }
    pieces
}

fn emit(
    out: &mut Vec<VisualLine>,
    src: &str,
    base: usize,
    text: Range<usize>,
    swallowed: Range<usize>,
    soft_break: bool,
    width: usize,
) {
    let piece_src = &src[text.clone()];
    let pieces = hard_split(piece_src, width);
    let last = pieces.len().saturating_sub(1);
    for (i, piece) in pieces.into_iter().enumerate() {
        let is_last = i == last;
        out.push(VisualLine {
            text: piece_src[piece.clone()].to_string(),
            start: base + text.start + piece.start,
            swallowed: if is_last {
                src[swallowed.clone()].to_string()
            } else {
                String::new()
            },
            soft_break: if is_last { soft_break } else { true },
        });
    }
}

fn word_wrap_into(line: &str, base: usize, width: usize, out: &mut Vec<VisualLine>) {
    if str_width(line) <= width {
        emit(out, line, base, 0..line.len(), line.len()..line.len(), false, width);
        return;
    }

    // Current visual line spans line_start..line_end; pending whitespace
    // follows it up to pend_end and is only committed when a word joins it.
    let mut line_start = 0usize;
    let mut line_end = 0usize;
    let mut pend_end = 0usize;
    let mut cur_w = 0usize;
    let mut pend_w = 0usize;

    for (range, is_space) in runs(line) {
        let w = str_width(&line[range.clone()]);
        if is_space {
            pend_end = range.end;
            pend_w += w;
            continue;
        }
        if line_end == line_start && pend_w > 0 && pend_w + w > width {
            // Leading indent that cannot share a line with the first word.
            emit(out, line, base, line_start..pend_end, pend_end..pend_end, true, width);
            line_start = range.start;
            cur_w = w;
        } else if line_end == line_start || cur_w + pend_w + w <= width {
            cur_w += pend_w + w;
        } else {
            emit(out, line, base, line_start..line_end, line_end..pend_end, true, width);
            line_start = range.start;
            cur_w = w;
        }
        line_end = range.end;
        pend_end = range.end;
        pend_w = 0;
    }

    emit(out, line, base, line_start..pend_end.max(line_end), line.len()..line.len(), false, width);
}

/// Alternating runs of whitespace / non-whitespace with their byte ranges.
fn runs(line: &str) -> Vec<(Range<usize>, bool)> {
    let mut out: Vec<(Range<usize>, bool)> = Vec::new();
    for (idx, c) in line.char_indices() {
        let space = c.is_whitespace();
        let end = idx + c.len_utf8();
        match out.last_mut() {
            Some((range, kind)) if *kind == space => range.end = end,
            _ => out.push((idx..end, space)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(lines: &[VisualLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn short_line_is_untouched() {
        let lines = wrap("hello", 60);
        assert_eq!(texts(&lines), vec!["hello"]);
        assert!(!lines[0].soft_break);
    }

    #[test]
    fn empty_input_is_one_empty_line() {
        let lines = wrap("", 10);
        assert_eq!(texts(&lines), vec![""]);
        assert_eq!(unwrap_lines(&lines), "");
    }

    #[test]
    fn breaks_at_spaces_and_swallows_them() {
        let lines = wrap("aaa bbb ccc", 7);
        assert_eq!(texts(&lines), vec!["aaa bbb", "ccc"]);
        assert_eq!(lines[0].swallowed, " ");
        assert!(lines[0].soft_break);
        assert_eq!(lines[1].start, 8);
    }

    #[test]
    fn explicit_newlines_are_hard_breaks() {
        let lines = wrap("line1\nline2", 60);
        assert_eq!(texts(&lines), vec!["line1", "line2"]);
        assert!(!lines[0].soft_break);
        assert_eq!(lines[1].start, 6);
        assert_eq!(unwrap_lines(&lines), "line1\nline2");
    }

    #[test]
    fn long_token_is_hard_wrapped_into_three() {
        let token = "x".repeat(100);
        let lines = wrap(&token, 40);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| str_width(&l.text) <= 40));
        let joined: String = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(joined, token);
    }

    #[test]
    fn long_url_after_words_starts_fresh_line() {
        let url = format!("https://example.test/{}", "p".repeat(30));
        let text = format!("see {url} ok");
        let lines = wrap(&text, 20);
        assert_eq!(lines[0].text, "see");
        assert!(lines.iter().all(|l| str_width(&l.text) <= 20));
        assert_eq!(unwrap_lines(&lines), text);
    }

    #[test]
    fn cjk_wraps_by_cells() {
        let lines = wrap("你好世界你好", 5);
        assert_eq!(texts(&lines), vec!["你好", "世界", "你好"]);
    }

    #[test]
    fn zero_width_makes_progress() {
        let lines = wrap("abc", 0);
        assert_eq!(texts(&lines), vec!["a", "b", "c"]);
        assert_eq!(unwrap_lines(&lines), "abc");
    }

    #[test]
    fn trailing_spaces_are_preserved() {
        let lines = wrap("hello   ", 80);
        assert_eq!(texts(&lines), vec!["hello   "]);
    }

    #[test]
    fn leading_indent_is_kept() {
        let lines = wrap("    indented words here", 12);
        assert_eq!(lines[0].text, "    indented");
        assert_eq!(unwrap_lines(&lines), "    indented words here");
    }

    #[test]
    fn oversized_indent_breaks_before_the_first_word() {
        let lines = wrap("     abc", 3);
        assert_eq!(texts(&lines), vec!["   ", "  ", "abc"]);
        assert!(lines[..2].iter().all(|l| l.soft_break));
        assert_eq!(lines[2].start, 5);
        assert_eq!(unwrap_lines(&lines), "     abc");

        let lines = wrap("  abcd efg", 4);
        assert_eq!(texts(&lines), vec!["  ", "abcd", "efg"]);
        assert_eq!(unwrap_lines(&lines), "  abcd efg");
    }

    #[test]
    fn hard_wrap_slices_by_width() {
        assert_eq!(hard_wrap("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(hard_wrap("", 4), vec![""]);
        assert_eq!(hard_wrap("漢字", 1), vec!["漢", "字"]);
    }

    #[test]
    fn counts_visual_lines_like_the_input_row() {
        assert_eq!(wrap("short\n", 60).len(), 2);
        let long = "y".repeat(120);
        assert_eq!(wrap(&format!("short\n{long}"), 60).len(), 3);
    }
}
