use chrono::Utc;
use crossterm::cursor::MoveToColumn;
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use tracing::warn;

use crate::core::badge::IndicatorSink;
use crate::core::models::badge::{BadgeColor, BadgeFace};

fn to_crossterm(color: BadgeColor) -> Color {
    Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// Dark text on light badges, light text on dark ones.
fn text_color_for(background: BadgeColor) -> Color {
    let luma = 0.299 * background.r as f64
        + 0.587 * background.g as f64
        + 0.114 * background.b as f64;
    if luma > 150.0 {
        Color::Black
    } else {
        Color::White
    }
}

/// Redraws a single terminal line in place with the current badge.
pub struct TerminalIndicator<W: Write + Send> {
    out: Mutex<W>,
    use_color: bool,
}

impl<W: Write + Send> TerminalIndicator<W> {
    pub fn new(out: W, use_color: bool) -> Self {
        Self {
            out: Mutex::new(out),
            use_color,
        }
    }

    fn draw(&self, face: &BadgeFace) -> std::io::Result<()> {
        let mut out = self.out.lock();
        out.queue(MoveToColumn(0))?;
        out.queue(Clear(ClearType::CurrentLine))?;
        if !face.is_cleared() {
            match face.color {
                Some(color) if self.use_color => {
                    out.queue(SetBackgroundColor(to_crossterm(color)))?;
                    out.queue(SetForegroundColor(text_color_for(color)))?;
                    out.queue(Print(format!(" {} ", face.text)))?;
                    out.queue(ResetColor)?;
                }
                _ => {
                    out.queue(Print(format!("[{}]", face.text)))?;
                }
            }
        }
        out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> IndicatorSink for TerminalIndicator<W> {
    fn set_indicator(&self, face: &BadgeFace) {
        if let Err(e) = self.draw(face) {
            warn!("Failed to draw badge: {}", e);
        }
    }
}

#[derive(Serialize)]
struct BadgeEvent<'a> {
    at: chrono::DateTime<Utc>,
    #[serde(flatten)]
    face: &'a BadgeFace,
}

/// Emits one JSON object per badge write, for piping into other tools.
pub struct JsonLinesIndicator<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesIndicator<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> IndicatorSink for JsonLinesIndicator<W> {
    fn set_indicator(&self, face: &BadgeFace) {
        let event = BadgeEvent {
            at: Utc::now(),
            face,
        };
        let mut out = self.out.lock();
        let result = serde_json::to_string(&event)
            .map_err(std::io::Error::from)
            .and_then(|line| writeln!(out, "{}", line))
            .and_then(|_| out.flush());
        if let Err(e) = result {
            warn!("Failed to write badge event: {}", e);
        }
    }
}
