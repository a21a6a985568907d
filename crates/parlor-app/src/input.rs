//! Terminal-agnostic line editing.
//!
//! [`LineEditor`] turns key presses into submitted lines. It owns the partial
//! line and the cursor, and knows whether echo is masked, so a driver can
//! redraw the line after unrelated output without losing what the user typed.

use std::borrow::Cow;

/// Character drawn in place of each typed character while echo is masked.
pub const MASK_CHAR: char = '*';

/// Keyboard input abstraction.
///
/// Decouples line editing from terminal libraries (crossterm, termion,
/// etc.) enabling deterministic simulation testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key (delete character before cursor).
    Backspace,
    /// Delete key (delete character at cursor).
    Delete,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Home key (cursor to start).
    Home,
    /// End key (cursor to end).
    End,
    /// Ctrl-C.
    Interrupt,
    /// Ctrl-D.
    EndOfInput,
}

/// What a key press did to the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Buffer or cursor changed; redraw.
    Edited,
    /// Nothing changed.
    Unchanged,
    /// Enter was pressed. Carries the submitted line.
    Submitted(String),
    /// The user interrupted input.
    Interrupted,
    /// The user closed input on an empty line.
    Closed,
}

/// Single-line editor with optional masked echo.
#[derive(Debug, Default)]
pub struct LineEditor {
    /// Text typed so far.
    buffer: String,
    /// Cursor position, in characters.
    cursor: usize,
    /// Whether echo shows [`MASK_CHAR`] instead of the text.
    masked: bool,
}

impl LineEditor {
    /// Create an empty, unmasked editor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text in the buffer. Never masked.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether echo is masked.
    pub fn is_masked(&self) -> bool {
        self.masked
    }

    /// Mask or unmask echo. Idempotent. The buffer is left untouched.
    pub fn set_masked(&mut self, masked: bool) {
        self.masked = masked;
    }

    /// Text as it should appear on screen.
    pub fn display(&self) -> Cow<'_, str> {
        if self.masked {
            Cow::Owned(std::iter::repeat_n(MASK_CHAR, self.char_len()).collect())
        } else {
            Cow::Borrowed(&self.buffer)
        }
    }

    /// Whether nothing has been typed.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyInput) -> EditOutcome {
        match key {
            KeyInput::Char(c) => {
                let at = self.byte_offset(self.cursor);
                self.buffer.insert(at, c);
                self.cursor = self.cursor.saturating_add(1);
                EditOutcome::Edited
            },
            KeyInput::Backspace => {
                if self.cursor == 0 {
                    return EditOutcome::Unchanged;
                }
                self.cursor = self.cursor.saturating_sub(1);
                let at = self.byte_offset(self.cursor);
                self.buffer.remove(at);
                EditOutcome::Edited
            },
            KeyInput::Delete => {
                if self.cursor >= self.char_len() {
                    return EditOutcome::Unchanged;
                }
                let at = self.byte_offset(self.cursor);
                self.buffer.remove(at);
                EditOutcome::Edited
            },
            KeyInput::Left => self.move_cursor_to(self.cursor.saturating_sub(1)),
            KeyInput::Right => self.move_cursor_to(self.cursor.saturating_add(1)),
            KeyInput::Home => self.move_cursor_to(0),
            KeyInput::End => self.move_cursor_to(self.char_len()),
            KeyInput::Enter => {
                self.cursor = 0;
                EditOutcome::Submitted(std::mem::take(&mut self.buffer))
            },
            KeyInput::Interrupt => EditOutcome::Interrupted,
            KeyInput::EndOfInput if self.buffer.is_empty() => EditOutcome::Closed,
            KeyInput::EndOfInput => EditOutcome::Unchanged,
        }
    }

    fn move_cursor_to(&mut self, position: usize) -> EditOutcome {
        let position = position.min(self.char_len());
        if position == self.cursor {
            return EditOutcome::Unchanged;
        }
        self.cursor = position;
        EditOutcome::Edited
    }

    fn char_len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.buffer.char_indices().nth(chars).map_or(self.buffer.len(), |(i, _)| i)
    }
}
