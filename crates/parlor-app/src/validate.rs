//! Input shape checks for the sign-in prompts.
//!
//! Both checks are deliberately coarse. The identity provider does the real
//! validation; these only catch obvious typos before a round trip.

/// Minimum password length in characters.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Whether `input` looks like an email address.
///
/// Accepts any string with an `@` that has at least one character before it,
/// followed later by a `.` with at least one character between the two and at
/// least one character after the `.`.
pub fn is_valid_email(input: &str) -> bool {
    input
        .char_indices()
        .filter(|&(_, c)| c == '@')
        .any(|(at, _)| at > 0 && has_dotted_tail(&input[at + 1..]))
}

fn has_dotted_tail(domain: &str) -> bool {
    domain.char_indices().any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Whether `input` is long enough to be a password.
pub fn is_valid_password(input: &str) -> bool {
    input.chars().count() >= MIN_PASSWORD_CHARS
}
