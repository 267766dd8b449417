//! Terminal writer.
//!
//! Frames are translated into an ordered command list and flushed once.
//! Styles are set per span and reset at the end of every row so no colour
//! bleeds into cleared cells. Link spans are wrapped in OSC 8 open/close
//! sequences; terminals without hyperlink support print the text only.
//!
//! Invariants:
//! * Commands preserve ordering; nothing is flushed mid-frame.
//! * Positions are absolute with a (0,0) origin; the caller bounds them.

use crate::line::Line;
use crate::style::Style;
use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::{Write, stdout};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MoveTo(u16, u16),
    ClearLine,
    ClearAll,
    SetStyle(Style),
    ResetStyle,
    LinkStart(String),
    LinkEnd,
    Print(String),
}

#[derive(Debug, Default)]
pub struct Writer {
    cmds: Vec<Command>,
}

impl Writer {
    pub fn new() -> Self {
        Self { cmds: Vec::new() }
    }

    pub fn commands(&self) -> &[Command] {
        &self.cmds
    }

    pub fn move_to(&mut self, x: u16, y: u16) {
        self.cmds.push(Command::MoveTo(x, y));
    }

    pub fn clear_line(&mut self) {
        self.cmds.push(Command::ClearLine);
    }

    pub fn clear_all(&mut self) {
        self.cmds.push(Command::ClearAll);
    }

    pub fn print<S: Into<String>>(&mut self, s: S) {
        let s: String = s.into();
        if !s.is_empty() {
            self.cmds.push(Command::Print(s));
        }
    }

    /// Clear row `y` and paint `line` into it.
    pub fn paint_row(&mut self, y: u16, line: &Line) {
        self.move_to(0, y);
        self.clear_line();
        for span in &line.spans {
            if span.style != Style::PLAIN {
                self.cmds.push(Command::SetStyle(span.style));
            }
            match &span.link {
                Some(target) => {
                    self.cmds.push(Command::LinkStart(target.clone()));
                    self.print(span.text.as_str());
                    self.cmds.push(Command::LinkEnd);
                }
                None => self.print(span.text.as_str()),
            }
            if span.style != Style::PLAIN {
                self.cmds.push(Command::ResetStyle);
            }
        }
    }

    pub fn flush(self) -> Result<()> {
        let mut out = stdout();
        self.flush_to(&mut out)
    }

    pub fn flush_to<W: Write>(self, out: &mut W) -> Result<()> {
        for c in self.cmds {
            match c {
                Command::MoveTo(x, y) => queue!(out, MoveTo(x, y))?,
                Command::ClearLine => queue!(out, Clear(ClearType::CurrentLine))?,
                Command::ClearAll => queue!(out, Clear(ClearType::All))?,
                Command::SetStyle(style) => {
                    if let Some(c) = style.fg {
                        queue!(out, SetForegroundColor(Color::Rgb { r: c.0, g: c.1, b: c.2 }))?;
                    }
                    if style.bold {
                        queue!(out, SetAttribute(Attribute::Bold))?;
                    }
                }
                Command::ResetStyle => {
                    queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
                }
                Command::LinkStart(target) => queue!(out, Print(format!("\x1b]8;;{target}\x07")))?,
                Command::LinkEnd => queue!(out, Print("\x1b]8;;\x07"))?,
                Command::Print(s) => queue!(out, Print(s))?,
            }
        }
        out.flush()?;
        Ok(())
    }
}
