//! Terminal driver for the chat client.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm. On a
//! terminal, stdin is put in raw mode and keys go through a [`LineEditor`], so
//! masking is applied as the user types and partially typed input is redrawn
//! after incoming messages. When stdin is not a terminal, lines are read as
//! they come and nothing is echoed.

use std::io::{self, IsTerminal, Stdout, Write, stdout};

use chrono::{DateTime, Local, Utc};
use crossterm::{
    cursor::MoveToColumn,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::Print,
    terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use parlor_app::{Driver, EditOutcome, KeyInput, LineEditor, LineInput, Notice};
use parlor_core::Message;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::presenter::{self, MessageLine};

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Where lines come from.
enum Input {
    /// Interactive terminal in raw mode.
    Raw { events: EventStream, editor: LineEditor },
    /// Piped or redirected stdin.
    Piped { lines: Lines<BufReader<Stdin>> },
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Owns stdout and the input source. Raw mode is left on drop.
pub struct TerminalDriver {
    out: Stdout,
    input: Input,
}

impl TerminalDriver {
    /// Create a driver for the current process's terminal.
    ///
    /// Enables raw mode when stdin is a terminal.
    pub fn new() -> Result<Self, TerminalError> {
        let input = if io::stdin().is_terminal() {
            enable_raw_mode()?;
            Input::Raw { events: EventStream::new(), editor: LineEditor::new() }
        } else {
            Input::Piped { lines: BufReader::new(tokio::io::stdin()).lines() }
        };

        Ok(Self { out: stdout(), input })
    }

    /// Convert a crossterm key event to `KeyInput`.
    fn convert_key(event: KeyEvent) -> Option<KeyInput> {
        let control = event.modifiers.contains(KeyModifiers::CONTROL);
        match event.code {
            KeyCode::Char('c') if control => Some(KeyInput::Interrupt),
            KeyCode::Char('d') if control => Some(KeyInput::EndOfInput),
            KeyCode::Char(c) if !control => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            _ => None,
        }
    }

    /// Clear the line being typed so output can take its place.
    fn clear_input_line(&mut self) -> io::Result<()> {
        if let Input::Raw { editor, .. } = &self.input
            && !editor.is_empty()
        {
            queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        }
        Ok(())
    }

    /// Redraw the line being typed after output.
    fn redraw_input_line(&mut self) -> io::Result<()> {
        if let Input::Raw { editor, .. } = &self.input {
            queue!(
                self.out,
                MoveToColumn(0),
                Clear(ClearType::CurrentLine),
                Print(editor.display())
            )?;
        }
        self.out.flush()
    }

    /// Print one full line of output above the input line.
    fn print_line(
        &mut self,
        write: impl FnOnce(&mut Stdout) -> io::Result<()>,
    ) -> Result<(), TerminalError> {
        self.clear_input_line()?;
        write(&mut self.out)?;
        queue!(self.out, Print("\r\n"))?;
        self.redraw_input_line()?;
        Ok(())
    }

    async fn next_raw_line(
        out: &mut Stdout,
        events: &mut EventStream,
        editor: &mut LineEditor,
    ) -> Result<LineInput, TerminalError> {
        loop {
            let key = match events.next().await {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => key,
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TerminalError::Io(e)),
                None => return Ok(LineInput::Closed),
            };
            let Some(key) = Self::convert_key(key) else {
                continue;
            };

            match editor.handle_key(key) {
                EditOutcome::Edited => {
                    queue!(
                        out,
                        MoveToColumn(0),
                        Clear(ClearType::CurrentLine),
                        Print(editor.display())
                    )?;
                    out.flush()?;
                },
                EditOutcome::Unchanged => {},
                EditOutcome::Submitted(line) => {
                    queue!(out, Print("\r\n"))?;
                    out.flush()?;
                    return Ok(LineInput::Line(line));
                },
                EditOutcome::Interrupted => return Ok(LineInput::Interrupted),
                EditOutcome::Closed => return Ok(LineInput::Closed),
            }
        }
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn next_line(&mut self) -> Result<LineInput, Self::Error> {
        match &mut self.input {
            Input::Raw { events, editor } => {
                Self::next_raw_line(&mut self.out, events, editor).await
            },
            Input::Piped { lines } => Ok(match lines.next_line().await? {
                Some(line) => LineInput::Line(line),
                None => LineInput::Closed,
            }),
        }
    }

    fn set_masked_echo(&mut self, masked: bool) -> Result<(), Self::Error> {
        if let Input::Raw { editor, .. } = &mut self.input {
            editor.set_masked(masked);
            self.redraw_input_line()?;
        }
        Ok(())
    }

    fn show_notice(&mut self, notice: &Notice) -> Result<(), Self::Error> {
        self.print_line(|out| presenter::queue_notice(out, notice))
    }

    fn show_message(&mut self, message: &Message) -> Result<(), Self::Error> {
        let line = MessageLine::new(message, &Local);
        self.print_line(|out| line.queue_styled(out))
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        if matches!(self.input, Input::Raw { .. }) {
            let _ = disable_raw_mode();
        }
        let _ = self.out.flush();
    }
}
