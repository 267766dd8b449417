//! Grapheme cluster display width.
//!
//! `egc_width` is the single authority for how many terminal cells a cluster
//! occupies. It starts from `unicode_width` and widens emoji compositions the
//! baseline under-measures (VS16 presentation, ZWJ sequences, flags, keycaps,
//! skin tones). Over-estimation only leaves a blank cell; under-estimation
//! makes every later column drift, so ties go wide.
//!
//! Invariants:
//! - Layout code measures through `egc_width` / `str_width`, never `len()`.
//! - Segmentation happens here once per string; callers pass whole strings.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const ZWJ: char = '\u{200D}';
const VS16: char = '\u{FE0F}';
const KEYCAP_COMBINING: char = '\u{20E3}';

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

fn is_skin_tone_modifier(c: char) -> bool {
    ('\u{1F3FB}'..='\u{1F3FF}').contains(&c)
}

fn is_extended_pictographic(c: char) -> bool {
    ('\u{1F300}'..='\u{1FAFF}').contains(&c) || ('\u{2600}'..='\u{27BF}').contains(&c)
}

/// Terminal cell width of one extended grapheme cluster.
pub fn egc_width(egc: &str) -> u16 {
    let mut chars = egc.chars();
    let Some(first) = chars.next() else {
        return 0;
    };
    if egc.len() == 1 {
        // ASCII fast path; control characters occupy nothing.
        return if first.is_ascii_control() { 0 } else { 1 };
    }

    let base = UnicodeWidthStr::width(egc) as u16;
    let has = |pred: &dyn Fn(char) -> bool| egc.chars().any(pred);

    let emoji_sequence = has(&|c| c == ZWJ)
        || has(&|c| c == KEYCAP_COMBINING)
        || has(&is_skin_tone_modifier)
        || (is_regional_indicator(first) && egc.chars().filter(|c| is_regional_indicator(*c)).count() == 2)
        || (is_extended_pictographic(first) && has(&|c| c == VS16));

    if emoji_sequence {
        return 2;
    }
    base.min(2)
}

/// Total display width of `s` in terminal cells.
pub fn str_width(s: &str) -> usize {
    if s.is_ascii() {
        return s.bytes().filter(|b| !b.is_ascii_control()).count();
    }
    s.graphemes(true).map(|g| egc_width(g) as usize).sum()
}

/// Fit `s` into `max` cells. When it does not fit, keep the longest cluster
/// prefix that leaves one cell for a trailing `…`.
pub fn truncate_to_width(s: &str, max: usize) -> String {
    if str_width(s) <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let budget = max - 1;
    let mut used = 0usize;
    let mut out = String::new();
    for g in s.graphemes(true) {
        let w = egc_width(g) as usize;
        if used + w > budget {
            break;
        }
        used += w;
        out.push_str(g);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_and_controls() {
        assert_eq!(egc_width("a"), 1);
        assert_eq!(egc_width("\t"), 0);
        assert_eq!(str_width("hello"), 5);
        assert_eq!(str_width(""), 0);
    }

    #[test]
    fn cjk_is_double_width() {
        assert_eq!(egc_width("漢"), 2);
        assert_eq!(str_width("你好"), 4);
    }

    #[test]
    fn emoji_compositions_are_wide() {
        assert_eq!(egc_width("😀"), 2);
        assert_eq!(egc_width("👍🏽"), 2);
        assert_eq!(egc_width("👨\u{200D}👩\u{200D}👧"), 2);
        assert_eq!(egc_width("🇺🇸"), 2);
        assert_eq!(egc_width("1\u{FE0F}\u{20E3}"), 2);
        assert_eq!(egc_width("❤\u{FE0F}"), 2);
    }

    #[test]
    fn combining_marks_take_base_width() {
        assert_eq!(egc_width("e\u{0301}"), 1);
    }

    #[test]
    fn truncate_to_width_reserves_ellipsis_cell() {
        assert_eq!(truncate_to_width("https://x.test/abc", 100), "https://x.test/abc");
        assert_eq!(truncate_to_width("abcdefgh", 5), "abcd…");
        assert_eq!(truncate_to_width("你好世界", 5), "你好…");
        assert_eq!(truncate_to_width("abc", 0), "");
        assert_eq!(truncate_to_width("abc", 1), "…");
    }
}
