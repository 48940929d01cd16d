// src/present.rs

//! Transcript formatting.
//!
//! Solution lines are printed as-is at column 0; interactor lines are shifted
//! right by a fixed padding and coloured, which turns the interleaved output
//! into a two-column conversation:
//!
//! ```text
//! +-------------------------------------------+
//! |      Solution        |     Interactor     |
//! +-------------------------------------------+
//!                         10
//! ? 5
//!                         >
//! ```
//!
//! Everything here is pure: functions return strings and never write.

use crate::config::DisplaySection;
use crate::types::{Rgb, Side};

const HEADER_RULE: &str = "+-------------------------------------------+";

/// Wrap `text` in a 24-bit foreground colour escape sequence.
pub fn colored(text: &str, color: Rgb) -> String {
    format!(
        "\x1b[38;2;{};{};{}m{}\x1b[0m",
        color.r, color.g, color.b, text
    )
}

/// Split a raw line into its content and its line terminator.
fn split_terminator(raw: &str) -> (&str, &str) {
    if let Some(body) = raw.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = raw.strip_suffix('\n') {
        (body, "\n")
    } else {
        (raw, "")
    }
}

/// Immutable styling settings for one session's transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presenter {
    color: bool,
    padding: usize,
    interactor_color: Rgb,
    error_color: Rgb,
}

impl Presenter {
    pub fn new(display: &DisplaySection) -> Self {
        Self {
            color: display.color,
            padding: display.padding,
            interactor_color: display.interactor_color,
            error_color: display.error_color,
        }
    }

    pub fn error_color(&self) -> Rgb {
        self.error_color
    }

    fn paint(&self, text: &str, color: Rgb) -> String {
        if self.color && !text.is_empty() {
            colored(text, color)
        } else {
            text.to_string()
        }
    }

    /// Format one line of process output for the terminal.
    ///
    /// The result always ends with exactly one `\n`, even when the process
    /// wrote a final line without a terminator.
    pub fn line(&self, raw: &str, side: Side) -> String {
        let (body, _) = split_terminator(raw);
        match side {
            Side::Solution => format!("{body}\n"),
            Side::Interactor => format!(
                "{}{}\n",
                " ".repeat(self.padding),
                self.paint(body, self.interactor_color)
            ),
        }
    }

    /// Boxed column header printed before the first relayed line.
    pub fn header(&self) -> String {
        format!(
            "{HEADER_RULE}\n|      Solution        |     {}     |\n{HEADER_RULE}\n",
            self.paint("Interactor", self.interactor_color)
        )
    }

    /// Diagnostic line for fatal errors and session failures.
    pub fn error(&self, message: &str) -> String {
        format!("{}\n", self.paint(message, self.error_color))
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new(&DisplaySection::default())
    }
}
