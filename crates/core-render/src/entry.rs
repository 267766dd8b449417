//! Per-kind entry layout.
//!
//! Each [`EntryKind`] has one layout function producing one or more screen
//! lines; unknown kinds use the plain layout. A reaction summary adds one dim
//! line. Every produced line is clipped to the viewport width so the line
//! count computed here is exactly what reaches the terminal.

use crate::line::Line;
use crate::style::{GOLD, Rgb, Style, StyleKey, guild_style, potency_style, style};
use chrono::{DateTime, FixedOffset, Utc};
use core_state::{ChatEntry, EntryKind};
use core_text::link::{SpanKind, linkify};
use core_text::segment::strip_controls;
use core_text::{clean_title, str_width, truncate_runes, wrap};

/// `" " + HH:MM (8) + "  "`.
const TIME_COLUMN: usize = 11;
const NAME_SEPARATOR: &str = " · ";
const MIN_BODY_WIDTH: usize = 20;
const CAST_PREFIX_WIDTH: usize = 13;
const REACTION_INDENT: usize = 15;
const TITLE_MAX: usize = 50;
const SEEK_MAX: usize = 60;
const SELF_LABEL: &str = "you";

pub struct EntryContext<'a> {
    pub width: usize,
    pub my_login: Option<&'a str>,
    pub now: DateTime<FixedOffset>,
}

/// `H:MM` on the same calendar day, otherwise `Nd ago` (at least 1).
pub fn format_time(t: DateTime<Utc>, now: &DateTime<FixedOffset>) -> String {
    let local = t.with_timezone(now.offset());
    if local.date_naive() == now.date_naive() {
        return local.format("%-H:%M").to_string();
    }
    let days = (now.with_timezone(&Utc) - t).num_hours() / 24;
    format!("{}d ago", days.max(1))
}

pub fn entry_lines(entry: &ChatEntry, ctx: &EntryContext<'_>) -> Vec<Line> {
    let mut lines = if entry.is_system {
        vec![system_line(&entry.body, ctx.width)]
    } else {
        match &entry.kind {
            EntryKind::Plain | EntryKind::Other(_) => plain_lines(entry, ctx),
            EntryKind::BuildStart => vec![build_start_line(entry)],
            EntryKind::BuildUpdate => vec![build_update_line(entry)],
            EntryKind::Ship => ship_card(entry, ctx.width),
            EntryKind::Seek => vec![seek_line(entry)],
            EntryKind::Verdict => vec![verdict_line(entry)],
            EntryKind::Cast => cast_lines(entry, ctx),
        }
    };
    if !entry.reactions.is_empty() {
        lines.push(reaction_line(entry));
    }
    lines.into_iter().map(|l| l.fit(ctx.width)).collect()
}

fn system_line(text: &str, width: usize) -> Line {
    let label = format!("— {text} —");
    let pad = (width.saturating_sub(str_width(&label)) / 2).max(1);
    Line::styled(format!("{}{label}", " ".repeat(pad)), StyleKey::System)
}

fn plain_lines(entry: &ChatEntry, ctx: &EntryContext<'_>) -> Vec<Line> {
    let (name, name_style) = if entry.is_mine {
        (SELF_LABEL, style(StyleKey::SelfName))
    } else if entry.sender_group.is_empty() {
        (entry.sender_login.as_str(), style(StyleKey::Text))
    } else {
        (entry.sender_login.as_str(), guild_style(&entry.sender_group))
    };
    let prefix_width = TIME_COLUMN + str_width(name) + str_width(NAME_SEPARATOR);
    let body_width = ctx.width.saturating_sub(prefix_width).max(MIN_BODY_WIDTH);
    let base = if entry.is_mine { StyleKey::SelfText } else { StyleKey::Text };

    let mut head = Line::new();
    head.push(" ", StyleKey::Plain)
        .push(format!("{:>8}", format_time(entry.created_at, &ctx.now)), StyleKey::Meta)
        .push("  ", StyleKey::Plain)
        .push_style(name, name_style)
        .push(NAME_SEPARATOR, StyleKey::Separator);
    with_hanging_indent(head, prefix_width, body_lines(&entry.body, body_width, base, ctx.my_login))
}

fn cast_lines(entry: &ChatEntry, ctx: &EntryContext<'_>) -> Vec<Line> {
    let body_width = ctx.width.saturating_sub(CAST_PREFIX_WIDTH).max(MIN_BODY_WIDTH);
    let mut head = Line::new();
    head.push(" ", StyleKey::Plain)
        .push("✦", StyleKey::Cast)
        .push(" ", StyleKey::Plain)
        .push("Grimoire:", StyleKey::GoldBold)
        .push(" ", StyleKey::Plain);
    with_hanging_indent(
        head,
        CAST_PREFIX_WIDTH,
        body_lines(&entry.body, body_width, StyleKey::GrimVoice, ctx.my_login),
    )
}

/// First body line joins `head`; the rest are indented under it.
fn with_hanging_indent(mut head: Line, indent: usize, body: Vec<Line>) -> Vec<Line> {
    let mut body = body.into_iter();
    if let Some(first) = body.next() {
        head.append(first);
    }
    let mut out = vec![head];
    for line in body {
        let mut l = Line::styled(" ".repeat(indent), StyleKey::Plain);
        l.append(line);
        out.push(l);
    }
    out
}

/// Wrap a message body, highlighting mentions and carrying link targets.
pub fn body_lines(body: &str, width: usize, base: StyleKey, my_login: Option<&str>) -> Vec<Line> {
    let linked = linkify(&strip_controls(body), width);
    wrap(&linked.display, width)
        .into_iter()
        .map(|visual| {
            let mut line = Line::new();
            let mut cursor = 0usize;
            for span in linked.spans_in(visual.range()) {
                line.push(&visual.text[cursor..span.range.start], base);
                let text = &visual.text[span.range.clone()];
                match &span.kind {
                    SpanKind::Link { target } => {
                        line.push_link(text, style(StyleKey::Link), target);
                    }
                    SpanKind::Mention { login } => {
                        let is_me = my_login.is_some_and(|me| me.eq_ignore_ascii_case(login));
                        line.push(text, if is_me { StyleKey::MentionSelf } else { StyleKey::Mention });
                    }
                }
                cursor = span.range.end;
            }
            line.push(&visual.text[cursor..], base);
            line
        })
        .collect()
}

fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn build_start_line(entry: &ChatEntry) -> Line {
    let mut l = Line::new();
    l.push(" ", StyleKey::Plain)
        .push("🔨", StyleKey::Forge)
        .push(" ", StyleKey::Plain)
        .push(entry.sender_login.as_str(), StyleKey::Forge)
        .push(" started a build · ", StyleKey::Plain)
        .push(truncate_runes(&clean_title(entry.title()), TITLE_MAX), StyleKey::Dim);
    l
}

fn build_update_line(entry: &ChatEntry) -> Line {
    let mut l = Line::new();
    l.push("   ", StyleKey::Plain)
        .push("⚡", StyleKey::Accent)
        .push(" ", StyleKey::Plain)
        .push(entry.sender_login.as_str(), StyleKey::Accent)
        .push(" · ", StyleKey::Plain)
        .push(one_line(&entry.body), StyleKey::Dim);
    l
}

fn seek_line(entry: &ChatEntry) -> Line {
    let mut l = Line::new();
    l.push(" ", StyleKey::Plain)
        .push("✧", StyleKey::Dim)
        .push(" ", StyleKey::Plain)
        .push(entry.sender_login.as_str(), StyleKey::Gold)
        .push(" seeks · ", StyleKey::Plain)
        .push(truncate_runes(&one_line(&entry.body), SEEK_MAX), StyleKey::Text);
    l
}

fn verdict_line(entry: &ChatEntry) -> Line {
    let mut l = Line::new();
    l.push(" ", StyleKey::Plain)
        .push("⚡", StyleKey::Accent)
        .push(" ", StyleKey::Plain)
        .push(entry.sender_login.as_str(), StyleKey::Accent)
        .push(" forged · ", StyleKey::Plain)
        .push(
            format!("\"{}\"", truncate_runes(&clean_title(entry.title()), TITLE_MAX)),
            StyleKey::Gold,
        );
    if let Some(p) = entry.meta("potency") {
        l.push(" ", StyleKey::Plain).push_style(format!("P{p}"), potency_style(p));
    }
    l
}

const SHIP_LABEL: &str = "✦ SHIPPED";

fn ship_card(entry: &ChatEntry, width: usize) -> Vec<Line> {
    let w = width.saturating_sub(4).max(10);
    let frame = entry.is_animating().then_some(entry.anim_frame);

    let mut top = Line::new();
    top.push(" ┌ ", StyleKey::Gold).push(SHIP_LABEL, StyleKey::Gold).push(" ", StyleKey::Plain);
    let header_width = 3 + str_width(SHIP_LABEL) + 1;
    let dashes = (w + 2).saturating_sub(header_width).max(1);
    push_border(&mut top, &"─".repeat(dashes), frame, dashes);

    let mut body = Line::new();
    body.push(" │", StyleKey::Gold)
        .push("  ", StyleKey::Plain)
        .push(format!("{} shipped ", entry.sender_login), StyleKey::Gold)
        .push(
            format!("\"{}\"", truncate_runes(&clean_title(entry.title()), TITLE_MAX)),
            StyleKey::GoldBold,
        );

    let mut bottom = Line::new();
    push_border(&mut bottom, &format!(" └{}", "─".repeat(w)), frame, w);

    vec![top, body, bottom]
}

/// Border text, either static gold or a brightness wave while animating.
fn push_border(line: &mut Line, text: &str, frame: Option<u8>, span: usize) {
    let Some(frame) = frame else {
        line.push(text, StyleKey::Gold);
        return;
    };
    for (i, ch) in text.chars().enumerate() {
        line.push_style(ch.to_string(), Style::fg(wave(GOLD, frame, i, span)));
    }
}

/// Sine-wave brightness between 40% and full `base` travelling along a border.
pub fn wave(base: Rgb, frame: u8, i: usize, span: usize) -> Rgb {
    let x = i as f64 / span.max(1) as f64;
    let phase = f64::from(frame) * 0.3 - x * 4.0;
    let b = (phase.sin() * 0.5 + 0.5).powf(1.5);
    base.scale(0.4).lerp(base, b)
}

fn reaction_line(entry: &ChatEntry) -> Line {
    let summary = entry
        .reactions
        .iter()
        .map(|r| format!("{}{}", r.emoji, r.count))
        .collect::<Vec<_>>()
        .join(" ");
    let mut l = Line::styled(" ".repeat(REACTION_INDENT), StyleKey::Plain);
    l.push(summary, StyleKey::Dim);
    l
}
