//! Identity types exchanged with the identity provider.

use std::fmt;

use zeroize::Zeroizing;

/// A password entered at the terminal.
///
/// Backed by zeroizing storage so the plaintext is wiped when the last copy is
/// dropped. There is no `Display` impl and `Debug` is redacted, so a password
/// cannot end up in logs or on screen by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Take ownership of a plaintext password.
    pub fn new(plaintext: String) -> Self {
        Self(Zeroizing::new(plaintext))
    }

    /// Plaintext, for handing to the identity provider.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Email and password pair used for both sign-up and sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: Password,
}

impl Credentials {
    /// Pair an email with a password.
    pub fn new(email: impl Into<String>, password: Password) -> Self {
        Self { email: email.into(), password }
    }
}

/// The identity provider's view of a user at the time of the call.
///
/// Records go stale: `email_verified` reflects the moment the record was
/// issued, so callers that need the current flag must authenticate again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Provider-assigned user id.
    pub uid: String,
    /// Account email.
    pub email: String,
    /// Whether the email address has been verified.
    pub email_verified: bool,
}
