//! Deterministic simulation harness for Parlor session testing.
//!
//! [`SimDriver`] implements the app's `Driver` trait with a scripted input
//! queue and a recorded [`Transcript`], so the production `Runtime` can be run
//! against the in-memory backend without a terminal.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties of a finished or paused session
//! (every known message printed exactly once, echo unmasked right after the
//! password is read) rather than specific scenarios. Use
//! [`InvariantRegistry::standard()`] for the common set.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod invariants;
pub mod sim_driver;

pub use invariants::{
    EchoMatchesController, Invariant, InvariantRegistry, InvariantResult, KnownMessagesPrintedOnce,
    SessionSnapshot, UnmaskedAfterPassword, Violation,
};
pub use sim_driver::{ScriptStep, SimDriver, SimDriverError, Transcript, TranscriptEntry};
