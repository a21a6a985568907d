//! Driver trait for abstracting terminal I/O.
//!
//! The [`Driver`] trait decouples the session runtime from a specific
//! terminal. Each frontend implements the trait to provide platform-specific
//! I/O, while the generic [`crate::Runtime`] handles all orchestration.

use std::future::Future;

use chrono::{DateTime, Utc};
use parlor_core::Message;

use crate::Notice;

/// Result of waiting for a line.
#[derive(Clone, PartialEq, Eq)]
pub enum LineInput {
    /// The user submitted a line. Carries the real text even when echo was
    /// masked.
    Line(String),
    /// The user interrupted input (Ctrl-C).
    Interrupted,
    /// No more input will arrive (end of stream, Ctrl-D).
    Closed,
}

impl std::fmt::Debug for LineInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Line(line) => write!(f, "Line(<{} chars>)", line.chars().count()),
            Self::Interrupted => f.write_str("Interrupted"),
            Self::Closed => f.write_str("Closed"),
        }
    }
}

/// Abstracts terminal I/O for the session runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the production terminal and in
/// simulation.
///
/// # Implementations
///
/// - **Terminal**: crossterm raw mode with a line editor, or plain stdin lines
///   when input is piped
/// - **Simulation**: scripted lines and a recorded transcript
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Wait for the next line.
    ///
    /// Must be cancel-safe: the runtime races this against the live feed and
    /// drops the future when a feed event wins. Partially typed input must
    /// survive that.
    fn next_line(&mut self) -> impl Future<Output = Result<LineInput, Self::Error>> + Send;

    /// Mask or unmask echo of subsequently typed characters.
    ///
    /// The delivered line is never altered by masking.
    fn set_masked_echo(&mut self, masked: bool) -> Result<(), Self::Error>;

    /// Print a status line.
    fn show_notice(&mut self, notice: &Notice) -> Result<(), Self::Error>;

    /// Print a chat message.
    fn show_message(&mut self, message: &Message) -> Result<(), Self::Error>;

    /// Current wall-clock time, used to stamp outgoing messages.
    fn now(&self) -> DateTime<Utc>;
}
