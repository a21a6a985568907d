//! Backend gateways for Parlor.
//!
//! # Implementations
//!
//! - [`MemoryBackend`]: in-process accounts and topics with fault injection,
//!   used by simulation and tests
//! - [`FirebaseBackend`]: Identity Toolkit and Realtime Database REST APIs

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod firebase;
mod memory;
pub mod sse;

pub use firebase::{FirebaseBackend, FirebaseConfig, FirebaseError, classify_auth_error};
pub use memory::{Fault, MemoryBackend, VerificationMode};
