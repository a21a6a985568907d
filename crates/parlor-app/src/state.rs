//! Session states of the controller.

use std::fmt;

/// Where the controller is in the sign-in and chat flow.
///
/// Exactly one state is current at any instant. States marked "awaits input"
/// wait for a terminal line (see [`SessionState::awaits_input`]); every other
/// state runs its entry action and advances on a backend outcome. Lines that
/// arrive in any other state are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Prompt for an email address.
    RequestEmail,
    /// Awaits input: the email address.
    GetEmail,
    /// Prompt for a password and mask echo.
    RequestPassword,
    /// Awaits input: the password.
    GetPassword,
    /// Create the account, or sign in if it exists.
    FetchUser,
    /// Sign in again to read the current verification flag.
    CheckEmailVerification,
    /// Send a verification email. Awaits input: any line re-checks.
    RequestEmailVerification,
    /// Load history, subscribe to the live feed, greet the user.
    StartChat,
    /// Ready for the next chat line.
    RequestMessage,
    /// Awaits input: a chat line or `/quit`.
    GetMessage,
}

impl SessionState {
    /// Whether the controller waits for a terminal line in this state.
    pub fn awaits_input(self) -> bool {
        matches!(
            self,
            Self::GetEmail | Self::GetPassword | Self::RequestEmailVerification | Self::GetMessage
        )
    }

    /// Upper snake case name, as used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequestEmail => "REQUEST_EMAIL",
            Self::GetEmail => "GET_EMAIL",
            Self::RequestPassword => "REQUEST_PASSWORD",
            Self::GetPassword => "GET_PASSWORD",
            Self::FetchUser => "FETCH_USER",
            Self::CheckEmailVerification => "CHECK_EMAIL_VERIFICATION",
            Self::RequestEmailVerification => "REQUEST_EMAIL_VERIFICATION",
            Self::StartChat => "START_CHAT",
            Self::RequestMessage => "REQUEST_MESSAGE",
            Self::GetMessage => "GET_MESSAGE",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
