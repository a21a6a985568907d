//! Controller side-effects and intents.
//!
//! This module defines the [`ControllerAction`] enum, the instructions
//! produced by the [`crate::Controller`] state machine for the runtime to
//! execute. Backend actions are answered with exactly one
//! [`crate::ControllerEvent`] carrying the outcome.

use parlor_core::{BackendError, Credentials, Message, UserRecord};

use crate::Notice;

/// Actions produced by the Controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerAction {
    /// Print a status line.
    Show(Notice),

    /// Print a chat message.
    ShowMessage(Message),

    /// Turn masked echo on or off for subsequently typed characters.
    SetMaskedEcho(bool),

    /// Create an account. Answered by `SignedUp`.
    SignUp(Credentials),

    /// Sign in. Answered by `SignedIn`.
    SignIn(Credentials),

    /// Look up the signed-in user. Answered by `CurrentUser`.
    FetchCurrentUser,

    /// Send a verification email. Answered by `VerificationSent`.
    SendVerification(UserRecord),

    /// Load the full chat history. Answered by `HistoryLoaded`.
    LoadHistory,

    /// Subscribe to new chat messages. Answered by `Subscribed`.
    Subscribe,

    /// Push a chat message, stamped with the current time. Answered by
    /// `Pushed`.
    Push(MessageDraft),

    /// Exit the process.
    Quit,

    /// Stop the runtime because a backend call failed.
    Halt(BackendError),
}

/// A chat message before it has a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    /// Sender's email.
    pub author_email: String,
    /// Message text.
    pub body: String,
}
