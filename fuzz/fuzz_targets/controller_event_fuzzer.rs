//! Fuzz target for the session state machine
//!
//! # Strategy
//!
//! - Arbitrary interleavings of typed lines, backend outcomes (including ones
//!   that do not match the current state), and live feed deliveries
//!
//! # Invariants
//!
//! - Echo is masked exactly while the password is awaited
//! - A message is shown at most once per key
//! - NEVER panic on any event order

#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use parlor_app::{Controller, ControllerAction, ControllerEvent, SessionState};
use parlor_core::{
    AuthError, BackendError, FeedEvent, Message, MessageKey, StoredMessage, UserRecord,
};

#[derive(Debug, Clone, Arbitrary)]
enum Event {
    Line(String),
    SignUp(Outcome),
    SignIn { outcome: Outcome, verified: bool },
    CurrentUser(Outcome),
    VerificationSent(bool),
    History(Vec<u8>),
    Subscribed(bool),
    Pushed(bool),
    FeedItem(u8),
    FeedLost,
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Outcome {
    Ok,
    InUse,
    Invalid,
}

fn user(verified: bool) -> UserRecord {
    UserRecord { uid: "u".into(), email: "bob@x.co".into(), email_verified: verified }
}

fn auth(outcome: Outcome, verified: bool) -> Result<UserRecord, AuthError> {
    match outcome {
        Outcome::Ok => Ok(user(verified)),
        Outcome::InUse => Err(AuthError::EmailInUse),
        Outcome::Invalid => Err(AuthError::InvalidCredentials),
    }
}

fn stored(key: u8) -> StoredMessage {
    let at = Utc.timestamp_opt(0, 0).single().unwrap_or_default();
    StoredMessage::new(format!("k{key}"), Message::new("alice@x.co", format!("m{key}"), at))
}

fn io<T>(ok: bool, value: T) -> Result<T, BackendError> {
    if ok { Ok(value) } else { Err(BackendError::Io("fuzz".into())) }
}

fuzz_target!(|events: Vec<Event>| {
    let mut controller = Controller::new();
    let mut shown = HashSet::new();
    controller.start();

    for event in events {
        // A loaded history starts a fresh message set.
        if matches!(event, Event::History(_)) {
            shown.clear();
        }

        let event = match event {
            Event::Line(line) => ControllerEvent::Line(line),
            Event::SignUp(outcome) => ControllerEvent::SignedUp(auth(outcome, false)),
            Event::SignIn { outcome, verified } => {
                ControllerEvent::SignedIn(auth(outcome, verified))
            },
            Event::CurrentUser(outcome) => ControllerEvent::CurrentUser(auth(outcome, false)),
            Event::VerificationSent(ok) => ControllerEvent::VerificationSent(
                if ok { Ok(()) } else { Err(AuthError::Transport("fuzz".into())) },
            ),
            Event::History(keys) => {
                ControllerEvent::HistoryLoaded(Ok(keys.into_iter().map(stored).collect()))
            },
            Event::Subscribed(ok) => ControllerEvent::Subscribed(io(ok, ())),
            Event::Pushed(ok) => ControllerEvent::Pushed(io(ok, MessageKey::from("p"))),
            Event::FeedItem(key) => ControllerEvent::Feed(FeedEvent::Item(stored(key))),
            Event::FeedLost => ControllerEvent::Feed(FeedEvent::Lost(BackendError::FeedClosed)),
        };

        for action in controller.handle(event) {
            if let ControllerAction::ShowMessage(message) = action {
                assert!(shown.insert(message.body().to_owned()), "shown twice");
            }
        }
        assert_eq!(controller.masked_echo(), controller.state() == SessionState::GetPassword);
    }
});
