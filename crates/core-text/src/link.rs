//! Hyperlink and mention detection for message bodies.
//!
//! [`linkify`] rewrites a body into display text plus annotated byte spans.
//! URLs wider than the available column budget are shortened with `…` in the
//! display text while the span keeps the full target for OSC 8 hyperlinks.
//! Mentions are only recognised outside link spans, so a `@` inside a URL is
//! never highlighted.

use crate::width::{str_width, truncate_to_width};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static URL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<>\[\]()\p{Cc}]+").ok());
static MENTION_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"@(\w+)").ok());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanKind {
    Link { target: String },
    Mention { login: String },
}

/// Annotated byte range within [`Linkified::display`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub range: Range<usize>,
    pub kind: SpanKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Linkified {
    pub display: String,
    /// Non-overlapping, ordered by start.
    pub spans: Vec<TextSpan>,
}

impl Linkified {
    /// Spans intersecting `range`, clipped to it and rebased to its start.
    pub fn spans_in(&self, range: Range<usize>) -> Vec<TextSpan> {
        self.spans
            .iter()
            .filter(|s| s.range.start < range.end && s.range.end > range.start)
            .map(|s| TextSpan {
                range: s.range.start.max(range.start) - range.start
                    ..s.range.end.min(range.end) - range.start,
                kind: s.kind.clone(),
            })
            .collect()
    }
}

/// Detect links and mentions in `body`. Links wider than `max_link_width`
/// cells are shortened for display.
pub fn linkify(body: &str, max_link_width: usize) -> Linkified {
    let mut out = Linkified::default();
    let mut last = 0usize;
    for m in URL_RE.iter().flat_map(|re| re.find_iter(body)) {
        push_text(&mut out, &body[last..m.start()]);
        let target = m.as_str();
        let shown = if str_width(target) <= max_link_width {
            target.to_string()
        } else {
            truncate_to_width(target, max_link_width)
        };
        let start = out.display.len();
        out.display.push_str(&shown);
        out.spans.push(TextSpan {
            range: start..out.display.len(),
            kind: SpanKind::Link {
                target: target.to_string(),
            },
        });
        last = m.end();
    }
    push_text(&mut out, &body[last..]);
    out
}

fn push_text(out: &mut Linkified, text: &str) {
    let base = out.display.len();
    for caps in MENTION_RE.iter().flat_map(|re| re.captures_iter(text)) {
        let (Some(whole), Some(login)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.spans.push(TextSpan {
            range: base + whole.start()..base + whole.end(),
            kind: SpanKind::Mention {
                login: login.as_str().to_string(),
            },
        });
    }
    out.display.push_str(text);
}

/// OSC 8 hyperlink escape wrapping `text` with `target`.
pub fn osc8(target: &str, text: &str) -> String {
    format!("\x1b]8;;{target}\x07{text}\x1b]8;;\x07")
}
