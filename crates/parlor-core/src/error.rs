//! Error types for backend operations.
//!
//! Auth calls and data calls fail differently: auth failures are classified
//! so the session flow can branch on them (an existing account is recovered by
//! signing in instead), while data-store failures are plain I/O outcomes that
//! the caller surfaces.

use thiserror::Error;

/// Failures of identity provider calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Sign-up for an email that already has an account.
    #[error("email already in use")]
    EmailInUse,

    /// Unknown email or wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// No user is signed in.
    #[error("no signed-in user")]
    NoCurrentUser,

    /// Provider refused the request for another reason.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Provider could not be reached or answered garbage.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl AuthError {
    /// Whether this failure means the account already exists.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::EmailInUse)
    }
}

/// Failures of data store calls (load, subscribe, push).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Request could not be completed.
    #[error("I/O failure: {0}")]
    Io(String),

    /// Store answered with data that does not decode.
    #[error("malformed store data: {0}")]
    Decode(String),

    /// Live feed ended.
    #[error("live feed closed")]
    FeedClosed,
}
