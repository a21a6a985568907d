//! Session store.
//!
//! Plain data owned by the [`crate::Controller`]: what the user typed, who the
//! provider says they are, and which chat messages have been shown. No logic
//! beyond keeping the message set free of duplicates.

use std::collections::HashMap;

use parlor_core::{Credentials, Message, MessageKey, Password, StoredMessage, UserRecord};

/// Mutable state of one client session.
#[derive(Debug, Default)]
pub struct Session {
    /// Email entered at the prompt.
    pub email: Option<String>,
    /// Password entered at the prompt. Set only after it passed validation.
    pub password: Option<Password>,
    /// Signed-in user, as of the last sign-in or current-user lookup.
    pub user: Option<UserRecord>,
    /// Messages shown so far. `None` until chat history is first loaded.
    pub known_messages: Option<MessageLog>,
}

impl Session {
    /// Email and password, if both have been entered.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Some(Credentials::new(email.clone(), password.clone())),
            _ => None,
        }
    }

    /// Drop everything learned during sign-in.
    pub fn forget_identity(&mut self) {
        self.email = None;
        self.password = None;
        self.user = None;
    }
}

/// Set of known messages keyed by store key, in the order they were shown.
#[derive(Debug, Default, Clone)]
pub struct MessageLog {
    entries: HashMap<MessageKey, Message>,
    order: Vec<MessageKey>,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message unless its key is already known.
    ///
    /// Returns the message if it was new, i.e. if it should be shown.
    pub fn insert(&mut self, stored: StoredMessage) -> Option<&Message> {
        if self.contains(&stored.key) {
            return None;
        }
        self.order.push(stored.key.clone());
        let key = stored.key;
        Some(self.entries.entry(key).or_insert(stored.message))
    }

    /// Whether a message with `key` is known.
    pub fn contains(&self, key: &MessageKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Message stored under `key`.
    pub fn get(&self, key: &MessageKey) -> Option<&Message> {
        self.entries.get(key)
    }

    /// Number of known messages.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no message is known.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys in the order their messages were shown.
    pub fn keys(&self) -> &[MessageKey] {
        &self.order
    }
}
