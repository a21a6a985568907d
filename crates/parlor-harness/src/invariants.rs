//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must hold whenever the runtime is idle,
//! whatever script got it there. A [`SessionSnapshot`] pairs the controller's
//! view of the session with the driver's transcript, and registered
//! [`Invariant`] checks run against it.
//!
//! # Usage
//!
//! ```ignore
//! let snapshot = SessionSnapshot::capture(runtime.controller(), runtime.driver());
//! InvariantRegistry::standard().assert_all(&snapshot, "after quit");
//! ```

use parlor_app::{Controller, SessionState};

use crate::{SimDriver, Transcript, TranscriptEntry};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// Observable session state at one point in time.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Controller state.
    pub state: SessionState,
    /// Masking the controller believes is in effect.
    pub controller_masked: bool,
    /// Masking the driver actually applies.
    pub driver_masked: bool,
    /// Size of the known-message set, once chat has started.
    pub known_messages: Option<usize>,
    /// Everything shown so far.
    pub transcript: Transcript,
}

impl SessionSnapshot {
    /// Capture controller and driver state.
    pub fn capture(controller: &Controller, driver: &SimDriver) -> Self {
        Self {
            state: controller.state(),
            controller_masked: controller.masked_echo(),
            driver_masked: driver.is_masked(),
            known_messages: controller.known_messages().map(|log| log.len()),
            transcript: driver.transcript().clone(),
        }
    }
}

/// An invariant that can be checked against session state.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against a snapshot.
    fn check(&self, snapshot: &SessionSnapshot) -> InvariantResult;
}

/// Every known message was printed, and nothing else was.
///
/// History and the live feed overlap; a message reaching the screen twice or
/// a key in the set without a print both break this.
pub struct KnownMessagesPrintedOnce;

impl Invariant for KnownMessagesPrintedOnce {
    fn name(&self) -> &'static str {
        "known_messages_printed_once"
    }

    fn check(&self, snapshot: &SessionSnapshot) -> InvariantResult {
        let printed = snapshot.transcript.messages().len();
        let known = snapshot.known_messages.unwrap_or(0);
        if printed == known {
            return Ok(());
        }
        Err(Violation {
            invariant: self.name(),
            message: format!("{printed} messages printed but {known} known"),
        })
    }
}

/// A line read under masked echo is followed by unmasking, before any output.
pub struct UnmaskedAfterPassword;

impl Invariant for UnmaskedAfterPassword {
    fn name(&self) -> &'static str {
        "unmasked_after_password"
    }

    fn check(&self, snapshot: &SessionSnapshot) -> InvariantResult {
        let entries = snapshot.transcript.entries();
        for (index, pair) in entries.windows(2).enumerate() {
            if pair[0] == (TranscriptEntry::Read { masked: true })
                && pair[1] != TranscriptEntry::Mask(false)
            {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("masked read at {index} followed by {:?}", pair[1]),
                });
            }
        }
        Ok(())
    }
}

/// Driver masking agrees with the controller.
pub struct EchoMatchesController;

impl Invariant for EchoMatchesController {
    fn name(&self) -> &'static str {
        "echo_matches_controller"
    }

    fn check(&self, snapshot: &SessionSnapshot) -> InvariantResult {
        if snapshot.controller_masked == snapshot.driver_masked {
            return Ok(());
        }
        Err(Violation {
            invariant: self.name(),
            message: format!(
                "controller masked={} but driver masked={} in {}",
                snapshot.controller_masked, snapshot.driver_masked, snapshot.state
            ),
        })
    }
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with every session invariant.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(KnownMessagesPrintedOnce);
        registry.add(UnmaskedAfterPassword);
        registry.add(EchoMatchesController);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants, collecting every violation.
    pub fn check_all(&self, snapshot: &SessionSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(snapshot).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with every violation found.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, snapshot: &SessionSnapshot, context: &str) {
        if let Err(violations) = self.check_all(snapshot) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use parlor_app::{Driver, Notice};
    use parlor_core::Message;

    use super::*;

    fn snapshot(driver: &SimDriver) -> SessionSnapshot {
        SessionSnapshot::capture(&Controller::new(), driver)
    }

    #[test]
    fn fresh_session_holds() {
        let driver = SimDriver::new();
        assert!(InvariantRegistry::standard().check_all(&snapshot(&driver)).is_ok());
    }

    #[test]
    fn unexpected_print_is_caught() {
        let mut driver = SimDriver::new();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        driver.show_message(&Message::new("a@b.cd", "hi", at)).unwrap();

        let violations = InvariantRegistry::standard().check_all(&snapshot(&driver)).unwrap_err();
        assert_eq!(violations[0].invariant, "known_messages_printed_once");
    }

    #[tokio::test]
    async fn output_under_mask_is_caught() {
        let mut driver = SimDriver::with_lines(["secret1"]);
        driver.set_masked_echo(true).unwrap();
        driver.next_line().await.unwrap();
        driver.show_notice(&Notice::progress("Trying to create new user...")).unwrap();

        let result = UnmaskedAfterPassword.check(&snapshot(&driver));
        assert!(result.is_err());
        assert!(EchoMatchesController.check(&snapshot(&driver)).is_err());
    }
}
