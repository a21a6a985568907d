//! Status lines shown to the user.

/// How a status line should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    /// Asks the user for input.
    Prompt,
    /// Something is in flight.
    Progress,
    /// Something worked.
    Success,
    /// Something needs the user's attention but nothing failed.
    Warning,
    /// Something failed.
    Error,
}

/// A status line: text plus a tone for the presenter to style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Styling hint.
    pub tone: Tone,
    /// Line text, without trailing newline.
    pub text: String,
}

impl Notice {
    /// Create a notice.
    pub fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self { tone, text: text.into() }
    }

    /// Input prompt.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::new(Tone::Prompt, text)
    }

    /// In-flight operation.
    pub fn progress(text: impl Into<String>) -> Self {
        Self::new(Tone::Progress, text)
    }

    /// Completed operation.
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(Tone::Success, text)
    }

    /// Attention needed.
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Tone::Warning, text)
    }

    /// Failure.
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Tone::Error, text)
    }
}
