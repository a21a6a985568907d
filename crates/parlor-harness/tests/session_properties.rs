//! Property-based tests for whole sessions.
//!
//! Arbitrary scripts of typed lines and concurrent pushes by another client
//! run through the real runtime against the in-memory backend. Whatever the
//! script, the session invariants must hold when the runtime stops.

use chrono::{TimeZone, Utc};
use parlor_app::Runtime;
use parlor_backend::{MemoryBackend, VerificationMode};
use parlor_core::Message;
use parlor_harness::{InvariantRegistry, SessionSnapshot, SimDriver};
use proptest::prelude::*;

const TOPIC: &str = "messages";

/// One thing happening while the session runs.
#[derive(Debug, Clone)]
enum Step {
    /// The user types a line.
    Type(String),
    /// Another client posts a message.
    OtherClientPosts(String),
}

/// Lines biased toward the ones that move the flow forward.
fn line_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => Just("bob@x.co".to_owned()),
        3 => Just("secret1".to_owned()),
        2 => Just(String::new()),
        1 => Just("not-an-email".to_owned()),
        1 => Just("short".to_owned()),
        2 => "[a-z ]{1,10}",
    ]
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => line_strategy().prop_map(Step::Type),
        1 => "[a-z]{1,6}".prop_map(Step::OtherClientPosts),
    ]
}

fn build_driver(steps: &[Step], backend: &MemoryBackend) -> SimDriver {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let mut driver = SimDriver::new();
    for step in steps.iter().cloned() {
        match step {
            Step::Type(line) => driver.push_line(line),
            Step::OtherClientPosts(body) => {
                let other = backend.clone();
                driver.push_hook(move || {
                    other.seed(TOPIC, Message::new("alice@x.co", body, at));
                });
            },
        }
    }
    driver
}

fn run_session(steps: &[Step], backend: MemoryBackend) -> SessionSnapshot {
    let driver = build_driver(steps, &backend);
    let mut runtime = Runtime::new(driver, backend, TOPIC);

    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    rt.block_on(runtime.run()).unwrap();

    SessionSnapshot::capture(runtime.controller(), runtime.driver())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Invariants hold for new accounts under arbitrary scripts.
    #[test]
    fn invariants_hold_for_new_accounts(steps in prop::collection::vec(step_strategy(), 0..30)) {
        let backend = MemoryBackend::with_verification(VerificationMode::OnSend);
        let snapshot = run_session(&steps, backend);

        prop_assert!(InvariantRegistry::standard().check_all(&snapshot).is_ok());
    }

    /// Invariants hold when history already exists.
    #[test]
    fn invariants_hold_with_history(
        steps in prop::collection::vec(step_strategy(), 0..30),
        history in prop::collection::vec("[a-z]{1,6}", 0..5),
    ) {
        let backend = MemoryBackend::new();
        backend.register("bob@x.co", "secret1", true);
        let at = Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap();
        for body in history {
            backend.seed(TOPIC, Message::new("carol@x.co", body, at));
        }

        let snapshot = run_session(&steps, backend);

        prop_assert!(InvariantRegistry::standard().check_all(&snapshot).is_ok());
    }
}
