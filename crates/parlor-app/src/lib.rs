//! Session layer for Parlor
//!
//! Pure state machine and generic runtime for the sign-in and chat flow,
//! enabling deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`Controller`]: session state machine (prompts, auth flow, chat)
//! - [`Session`] / [`MessageLog`]: session store and de-duplicated messages
//! - [`LineEditor`]: key-by-key line editing with masked echo
//! - [`Driver`]: Trait for platform-specific terminal I/O
//! - [`Runtime`]: Generic orchestration loop using Driver and Gateway

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod controller;
mod driver;
mod event;
mod input;
mod notice;
mod runtime;
mod session;
mod state;
pub mod validate;

pub use action::{ControllerAction, MessageDraft};
pub use controller::{Controller, QUIT_COMMAND};
pub use driver::{Driver, LineInput};
pub use event::ControllerEvent;
pub use input::{EditOutcome, KeyInput, LineEditor, MASK_CHAR};
pub use notice::{Notice, Tone};
pub use runtime::{Exit, Runtime, RuntimeError};
pub use session::{MessageLog, Session};
pub use state::SessionState;
