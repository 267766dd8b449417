//! Styled screen lines.
//!
//! A [`Line`] is an ordered run of [`Span`]s. Geometry (width, truncation) is
//! measured in terminal cells over grapheme clusters, so a span never splits a
//! cluster. Link targets ride along on spans and only reach the terminal as
//! OSC 8 sequences in the writer.

use crate::style::{Style, StyleKey, style};
use core_text::grapheme;
use core_text::str_width;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
    pub link: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blank() -> Self {
        Self::default()
    }

    pub fn styled(text: impl Into<String>, key: StyleKey) -> Self {
        let mut l = Self::new();
        l.push(text, key);
        l
    }

    pub fn push(&mut self, text: impl Into<String>, key: StyleKey) -> &mut Self {
        self.push_style(text, style(key))
    }

    pub fn push_style(&mut self, text: impl Into<String>, style: Style) -> &mut Self {
        let text = text.into();
        if !text.is_empty() {
            self.spans.push(Span {
                text,
                style,
                link: None,
            });
        }
        self
    }

    pub fn push_link(&mut self, text: impl Into<String>, style: Style, target: &str) -> &mut Self {
        let text = text.into();
        if !text.is_empty() {
            self.spans.push(Span {
                text,
                style,
                link: Some(target.to_string()),
            });
        }
        self
    }

    pub fn append(&mut self, other: Line) -> &mut Self {
        self.spans.extend(other.spans);
        self
    }

    /// Unstyled text content.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn width(&self) -> usize {
        self.spans.iter().map(|s| str_width(&s.text)).sum()
    }

    /// Clip to `max` cells, ending in `…` when anything was cut.
    pub fn fit(self, max: usize) -> Self {
        if self.width() <= max {
            return self;
        }
        if max == 0 {
            return Self::new();
        }
        let budget = max - 1;
        let mut used = 0usize;
        let mut out = Self::new();
        let mut last_style = Style::PLAIN;
        'spans: for span in self.spans {
            last_style = span.style;
            let mut kept = String::new();
            for g in grapheme::iter(&span.text) {
                let w = grapheme::cluster_width(g);
                if used + w > budget {
                    push_kept(&mut out, kept, &span);
                    break 'spans;
                }
                used += w;
                kept.push_str(g);
            }
            push_kept(&mut out, kept, &span);
        }
        out.push_style("…", last_style);
        out
    }
}

fn push_kept(out: &mut Line, kept: String, span: &Span) {
    if kept.is_empty() {
        return;
    }
    out.spans.push(Span {
        text: kept,
        style: span.style,
        link: span.link.clone(),
    });
}
