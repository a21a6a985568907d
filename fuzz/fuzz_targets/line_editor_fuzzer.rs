//! Fuzz target for the line editor and input validators
//!
//! # Strategy
//!
//! - Arbitrary key sequences, including multi-byte characters and cursor
//!   movement past either end of the buffer
//! - Masking toggled mid-line
//! - Every submitted line run through the email and password checks
//!
//! # Invariants
//!
//! - Cursor never leaves the buffer
//! - Masked display has exactly one mask char per typed char
//! - Masking never changes the submitted text
//! - NEVER panic on any key sequence

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use parlor_app::{
    EditOutcome, KeyInput, LineEditor, MASK_CHAR,
    validate::{is_valid_email, is_valid_password},
};

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    EndOfInput,
    Mask(bool),
}

fuzz_target!(|ops: Vec<Op>| {
    let mut editor = LineEditor::new();
    let mut shadow = String::new();

    for op in ops {
        let key = match op {
            Op::Mask(masked) => {
                editor.set_masked(masked);
                continue;
            },
            Op::Char(c) => KeyInput::Char(c),
            Op::Enter => KeyInput::Enter,
            Op::Backspace => KeyInput::Backspace,
            Op::Delete => KeyInput::Delete,
            Op::Left => KeyInput::Left,
            Op::Right => KeyInput::Right,
            Op::Home => KeyInput::Home,
            Op::End => KeyInput::End,
            Op::EndOfInput => KeyInput::EndOfInput,
        };

        let before = editor.buffer().to_owned();
        match editor.handle_key(key) {
            EditOutcome::Submitted(line) => {
                assert_eq!(line, before);
                let _ = is_valid_email(&line);
                let _ = is_valid_password(&line);
                shadow.clear();
            },
            EditOutcome::Closed => assert!(before.is_empty()),
            _ => shadow = editor.buffer().to_owned(),
        }

        let chars = editor.buffer().chars().count();
        assert!(editor.cursor() <= chars);
        if editor.is_masked() {
            assert!(editor.display().chars().all(|c| c == MASK_CHAR));
            assert_eq!(editor.display().chars().count(), chars);
        } else {
            assert_eq!(editor.display(), shadow);
        }
    }
});
