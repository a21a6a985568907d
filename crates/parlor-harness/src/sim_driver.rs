//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as `TerminalDriver` but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`parlor_app::Runtime`] orchestration code runs in both production and
//! simulation.

use std::{collections::VecDeque, fmt};

use chrono::{DateTime, TimeZone, Utc};
use parlor_app::{Driver, LineInput, Notice};
use parlor_core::Message;

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// One step of scripted input.
pub enum ScriptStep {
    /// Deliver a line.
    Line(String),
    /// Deliver an interrupt.
    Interrupt,
    /// Fail the read with a driver error.
    Fail(String),
    /// Run a side effect, then continue with the next step.
    ///
    /// Useful for acting as another client between two lines, for example
    /// seeding a message into the backend.
    Hook(Box<dyn FnOnce() + Send>),
}

impl fmt::Debug for ScriptStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(_) => f.write_str("Line(..)"),
            Self::Interrupt => f.write_str("Interrupt"),
            Self::Fail(reason) => f.debug_tuple("Fail").field(reason).finish(),
            Self::Hook(_) => f.write_str("Hook"),
        }
    }
}

/// Something the runtime made visible, or a line it consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    /// A status line.
    Notice(Notice),
    /// A chat message.
    Message(Message),
    /// Echo masking switched.
    Mask(bool),
    /// A line was delivered. Records only whether echo was masked.
    Read {
        /// Echo masking at the time of the read.
        masked: bool,
    },
}

/// Everything the driver recorded, in order.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// All entries in order.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Texts of all notices.
    pub fn notices(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                TranscriptEntry::Notice(notice) => Some(notice.text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// All printed chat messages.
    pub fn messages(&self) -> Vec<&Message> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                TranscriptEntry::Message(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Whether a notice with exactly this text was shown.
    pub fn has_notice(&self, text: &str) -> bool {
        self.notices().contains(&text)
    }

    /// Index of the first notice with this text.
    pub fn position_of(&self, text: &str) -> Option<usize> {
        self.entries.iter().position(
            |entry| matches!(entry, TranscriptEntry::Notice(notice) if notice.text == text),
        )
    }
}

/// Simulation driver for deterministic testing.
///
/// Lines come from a script; once the script is exhausted, input reports
/// closed. The clock is fixed so stamped messages are reproducible.
pub struct SimDriver {
    script: VecDeque<ScriptStep>,
    transcript: Transcript,
    masked: bool,
    clock: DateTime<Utc>,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    /// Create a driver with an empty script.
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            transcript: Transcript::default(),
            masked: false,
            clock: Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default(),
        }
    }

    /// Create a driver that delivers `lines` in order.
    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut driver = Self::new();
        for line in lines {
            driver.push_line(line);
        }
        driver
    }

    /// Stamp outgoing messages with `clock`.
    #[must_use]
    pub fn at(mut self, clock: DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Queue a line.
    pub fn push_line(&mut self, line: impl Into<String>) {
        self.script.push_back(ScriptStep::Line(line.into()));
    }

    /// Queue an arbitrary step.
    pub fn push_step(&mut self, step: ScriptStep) {
        self.script.push_back(step);
    }

    /// Queue a side effect to run before the next line is delivered.
    pub fn push_hook(&mut self, hook: impl FnOnce() + Send + 'static) {
        self.script.push_back(ScriptStep::Hook(Box::new(hook)));
    }

    /// Recorded output.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Whether echo is currently masked.
    pub fn is_masked(&self) -> bool {
        self.masked
    }

    /// Number of script steps not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn next_line(&mut self) -> Result<LineInput, Self::Error> {
        loop {
            let Some(step) = self.script.pop_front() else {
                return Ok(LineInput::Closed);
            };

            match step {
                ScriptStep::Line(line) => {
                    self.transcript.entries.push(TranscriptEntry::Read { masked: self.masked });
                    return Ok(LineInput::Line(line));
                },
                ScriptStep::Interrupt => return Ok(LineInput::Interrupted),
                ScriptStep::Fail(reason) => return Err(SimDriverError(reason)),
                ScriptStep::Hook(hook) => hook(),
            }
        }
    }

    fn set_masked_echo(&mut self, masked: bool) -> Result<(), Self::Error> {
        self.masked = masked;
        self.transcript.entries.push(TranscriptEntry::Mask(masked));
        Ok(())
    }

    fn show_notice(&mut self, notice: &Notice) -> Result<(), Self::Error> {
        self.transcript.entries.push(TranscriptEntry::Notice(notice.clone()));
        Ok(())
    }

    fn show_message(&mut self, message: &Message) -> Result<(), Self::Error> {
        tracing::trace!(author = message.author_email(), "message shown");
        self.transcript.entries.push(TranscriptEntry::Message(message.clone()));
        Ok(())
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    use super::*;

    #[tokio::test]
    async fn lines_then_closed() {
        let mut driver = SimDriver::with_lines(["a", "b"]);

        assert_eq!(driver.next_line().await.unwrap(), LineInput::Line("a".into()));
        assert_eq!(driver.next_line().await.unwrap(), LineInput::Line("b".into()));
        assert_eq!(driver.next_line().await.unwrap(), LineInput::Closed);
    }

    #[tokio::test]
    async fn reads_record_mask_state() {
        let mut driver = SimDriver::with_lines(["secret1"]);
        driver.set_masked_echo(true).unwrap();
        driver.next_line().await.unwrap();

        assert_eq!(
            driver.transcript().entries(),
            [TranscriptEntry::Mask(true), TranscriptEntry::Read { masked: true }]
        );
    }

    #[tokio::test]
    async fn hooks_run_before_next_line() {
        let ran = Arc::new(AtomicBool::new(false));
        let mut driver = SimDriver::new();
        let flag = Arc::clone(&ran);
        driver.push_hook(move || flag.store(true, Ordering::SeqCst));
        driver.push_line("after");

        assert_eq!(driver.next_line().await.unwrap(), LineInput::Line("after".into()));
        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(driver.remaining(), 0);
    }

    #[tokio::test]
    async fn scripted_failure() {
        let mut driver = SimDriver::new();
        driver.push_step(ScriptStep::Fail("tty gone".into()));

        assert!(driver.next_line().await.is_err());
    }

    #[test]
    fn transcript_queries() {
        let mut driver = SimDriver::new();
        driver.show_notice(&Notice::prompt("Enter email")).unwrap();
        driver.show_notice(&Notice::error("Email is not valid")).unwrap();

        let transcript = driver.transcript();
        assert_eq!(transcript.notices(), ["Enter email", "Email is not valid"]);
        assert!(transcript.has_notice("Email is not valid"));
        assert_eq!(transcript.position_of("Email is not valid"), Some(1));
        assert!(transcript.messages().is_empty());
    }
}
