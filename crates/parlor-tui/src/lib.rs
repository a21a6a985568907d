//! Terminal frontend for Parlor.
//!
//! Provides the crossterm [`TerminalDriver`], the message and status line
//! [`presenter`], and the command-line [`config`] for the `parlor` binary.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod presenter;
pub mod terminal;

pub use config::{Args, BackendKind, ConfigError};
pub use terminal::{TerminalDriver, TerminalError};
