//! Formatting of chat messages and status lines.
//!
//! A message renders as `[DD.MM.YYYY HH:mm:ss] author: body`, timestamp in
//! the viewer's time zone. Colors are applied per field when writing; the
//! plain text is the same with or without them.

use std::{borrow::Cow, fmt, io::Write};

use chrono::{DateTime, TimeZone, Utc};
use crossterm::{
    queue,
    style::{Color, Print, PrintStyledContent, Stylize},
};
use parlor_app::{Notice, Tone};
use parlor_core::Message;

/// `DD.MM.YYYY HH:mm:ss`
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Format `at` in the time zone `tz`.
pub fn format_timestamp<Tz>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    at.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string()
}

/// `text` with every line break written as `\r\n`.
///
/// Raw mode does not return the cursor on `\n`, so multi-line server errors
/// and message bodies would otherwise print as a staircase.
pub fn raw_line_breaks(text: &str) -> Cow<'_, str> {
    if !text.contains('\n') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.lines().collect::<Vec<_>>().join("\r\n"))
}

/// A message ready to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLine {
    timestamp: String,
    author: String,
    body: String,
}

impl MessageLine {
    /// Lay out `message` with its timestamp in `tz`.
    pub fn new<Tz>(message: &Message, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self {
            timestamp: format_timestamp(message.sent_at(), tz),
            author: message.author_email().to_owned(),
            body: message.body().to_owned(),
        }
    }

    /// Queue the line with per-field colors. No line terminator is written.
    pub fn queue_styled(&self, out: &mut impl Write) -> std::io::Result<()> {
        let body = raw_line_breaks(&self.body);
        queue!(
            out,
            PrintStyledContent(format!("[{}]", self.timestamp).yellow()),
            Print(' '),
            PrintStyledContent(format!("{}:", self.author).red()),
            Print(' '),
            PrintStyledContent((&*body).green()),
        )
    }
}

impl fmt::Display for MessageLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.timestamp, self.author, self.body)
    }
}

/// Color for a status line.
pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Prompt => Color::Blue,
        Tone::Progress | Tone::Warning => Color::Yellow,
        Tone::Success => Color::Green,
        Tone::Error => Color::Red,
    }
}

/// Queue a status line in its tone's color. No line terminator is written.
pub fn queue_notice(out: &mut impl Write, notice: &Notice) -> std::io::Result<()> {
    let text = raw_line_breaks(&notice.text);
    queue!(out, PrintStyledContent((&*text).with(tone_color(notice.tone))))
}
