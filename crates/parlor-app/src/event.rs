//! Controller input events.
//!
//! This module defines [`ControllerEvent`], the inputs that drive the
//! [`crate::Controller`].
//!
//! Events come from three places:
//! - Lines submitted at the terminal.
//! - Outcomes of backend calls the controller asked for.
//! - The live message feed, independently of both.

use std::fmt;

use parlor_core::{AuthError, BackendError, FeedEvent, MessageKey, StoredMessage, UserRecord};

/// Events processed by the Controller.
#[derive(Clone)]
pub enum ControllerEvent {
    /// A line submitted at the terminal, without the line terminator.
    Line(String),

    /// Outcome of `SignUp`.
    SignedUp(Result<UserRecord, AuthError>),

    /// Outcome of `SignIn`.
    SignedIn(Result<UserRecord, AuthError>),

    /// Outcome of `FetchCurrentUser`.
    CurrentUser(Result<UserRecord, AuthError>),

    /// Outcome of `SendVerification`.
    VerificationSent(Result<(), AuthError>),

    /// Outcome of `LoadHistory`, in store order.
    HistoryLoaded(Result<Vec<StoredMessage>, BackendError>),

    /// Outcome of `Subscribe`.
    Subscribed(Result<(), BackendError>),

    /// Outcome of `Push`.
    Pushed(Result<MessageKey, BackendError>),

    /// Delivery from the live feed.
    Feed(FeedEvent),
}

// Lines may be passwords, so only their length is ever formatted.
impl fmt::Debug for ControllerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(line) => write!(f, "Line(<{} chars>)", line.chars().count()),
            Self::SignedUp(r) => f.debug_tuple("SignedUp").field(r).finish(),
            Self::SignedIn(r) => f.debug_tuple("SignedIn").field(r).finish(),
            Self::CurrentUser(r) => f.debug_tuple("CurrentUser").field(r).finish(),
            Self::VerificationSent(r) => f.debug_tuple("VerificationSent").field(r).finish(),
            Self::HistoryLoaded(r) => f.debug_tuple("HistoryLoaded").field(r).finish(),
            Self::Subscribed(r) => f.debug_tuple("Subscribed").field(r).finish(),
            Self::Pushed(r) => f.debug_tuple("Pushed").field(r).finish(),
            Self::Feed(e) => f.debug_tuple("Feed").field(e).finish(),
        }
    }
}

impl From<FeedEvent> for ControllerEvent {
    fn from(event: FeedEvent) -> Self {
        Self::Feed(event)
    }
}
