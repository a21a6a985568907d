#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

use parlor_core::{
    AuthError, BackendError, Credentials, FeedEvent, FeedSink, Gateway, Message, MessageKey,
    Password, StoredMessage, Subscription, UserRecord,
};

/// When a sent verification email counts as clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationMode {
    /// The account is verified as soon as the email is sent.
    #[default]
    OnSend,
    /// The account stays unverified until [`MemoryBackend::mark_verified`].
    Manual,
}

/// A backend call that can be made to fail once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// Next `load_all` fails.
    Load,
    /// Next `subscribe` fails.
    Subscribe,
    /// Next `push` fails.
    Push,
    /// Next `send_verification_email` fails.
    Verification,
    /// Next `current_user` fails.
    CurrentUser,
}

/// In-memory backend for simulation and tests
///
/// Accounts are keyed by email and topics are append-only lists with
/// zero-padded keys, so key order equals push order. Subscribers are fed
/// synchronously from inside `subscribe` and `push`; nothing runs in the
/// background. All state is wrapped in Arc<Mutex<>> so clones share it and a
/// test can inspect or fault the backend while a runtime owns a clone.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryBackendInner>>,
}

#[derive(Default)]
struct MemoryBackendInner {
    /// Accounts by email
    accounts: HashMap<String, Account>,

    /// Email of the last successful sign-up or sign-in
    current: Option<String>,

    verification: VerificationMode,

    /// Recipients of every verification email, in send order
    verification_emails: Vec<String>,

    /// Messages per topic, in push order
    topics: HashMap<String, Vec<StoredMessage>>,

    /// Live subscribers as (topic, sink)
    subscribers: Vec<(String, FeedSink)>,

    /// Calls that fail the next time they are made
    faults: HashSet<Fault>,

    next_uid: u64,
    next_key: u64,
}

struct Account {
    uid: String,
    password: Password,
    verified: bool,
}

impl MemoryBackendInner {
    fn record(&self, email: &str) -> Option<UserRecord> {
        self.accounts.get(email).map(|account| UserRecord {
            uid: account.uid.clone(),
            email: email.to_owned(),
            email_verified: account.verified,
        })
    }

    fn take_fault(&mut self, fault: Fault) -> bool {
        self.faults.remove(&fault)
    }

    fn create_account(&mut self, email: &str, password: Password, verified: bool) -> UserRecord {
        self.next_uid += 1;
        let uid = format!("user-{}", self.next_uid);
        self.accounts.insert(email.to_owned(), Account { uid: uid.clone(), password, verified });
        UserRecord { uid, email: email.to_owned(), email_verified: verified }
    }

    fn append(&mut self, topic: &str, message: Message) -> MessageKey {
        self.next_key += 1;
        let key = MessageKey::new(format!("msg-{:08}", self.next_key));
        let stored = StoredMessage::new(key.clone(), message);

        self.topics.entry(topic.to_owned()).or_default().push(stored.clone());
        self.subscribers.retain(|(subscribed, sink)| {
            subscribed != topic || sink.send(FeedEvent::Item(stored.clone())).is_ok()
        });

        key
    }
}

impl MemoryBackend {
    /// Create an empty backend that verifies accounts on send.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty backend with the given verification policy.
    pub fn with_verification(mode: VerificationMode) -> Self {
        let backend = Self::new();
        backend.lock().verification = mode;
        backend
    }

    #[allow(clippy::expect_used)]
    fn lock(&self) -> MutexGuard<'_, MemoryBackendInner> {
        self.inner.lock().expect("Mutex poisoned")
    }

    /// Create an account without signing it in.
    pub fn register(&self, email: &str, password: &str, verified: bool) -> UserRecord {
        self.lock().create_account(email, Password::new(password.to_owned()), verified)
    }

    /// Mark an account's email as verified. Returns false for unknown emails.
    pub fn mark_verified(&self, email: &str) -> bool {
        match self.lock().accounts.get_mut(email) {
            Some(account) => {
                account.verified = true;
                true
            },
            None => false,
        }
    }

    /// Append a message as if another client pushed it.
    pub fn seed(&self, topic: &str, message: Message) -> MessageKey {
        self.lock().append(topic, message)
    }

    /// Make the next call of the given kind fail.
    pub fn inject_fault(&self, fault: Fault) {
        self.lock().faults.insert(fault);
    }

    /// End every live subscription with [`FeedEvent::Lost`].
    pub fn drop_subscribers(&self) {
        let subscribers = std::mem::take(&mut self.lock().subscribers);
        for (_, sink) in subscribers {
            let _ = sink.send(FeedEvent::Lost(BackendError::FeedClosed));
        }
    }

    /// Messages stored in `topic`, in push order.
    pub fn messages(&self, topic: &str) -> Vec<StoredMessage> {
        self.lock().topics.get(topic).cloned().unwrap_or_default()
    }

    /// Recipients of every verification email sent so far.
    pub fn verification_emails(&self) -> Vec<String> {
        self.lock().verification_emails.clone()
    }

    /// Whether the account exists and is verified.
    pub fn is_verified(&self, email: &str) -> bool {
        self.lock().accounts.get(email).is_some_and(|account| account.verified)
    }

    /// Number of subscribers whose sink is still open.
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain(|(_, sink)| !sink.is_closed());
        inner.subscribers.len()
    }
}

impl Gateway for MemoryBackend {
    async fn sign_up(&self, credentials: &Credentials) -> Result<UserRecord, AuthError> {
        let mut inner = self.lock();
        if inner.accounts.contains_key(&credentials.email) {
            return Err(AuthError::EmailInUse);
        }

        let record = inner.create_account(&credentials.email, credentials.password.clone(), false);
        inner.current = Some(credentials.email.clone());
        tracing::debug!(uid = %record.uid, "account created");
        Ok(record)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<UserRecord, AuthError> {
        let mut inner = self.lock();
        let matches = inner
            .accounts
            .get(&credentials.email)
            .is_some_and(|account| account.password == credentials.password);
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        inner.current = Some(credentials.email.clone());
        inner.record(&credentials.email).ok_or(AuthError::InvalidCredentials)
    }

    async fn current_user(&self) -> Result<UserRecord, AuthError> {
        let mut inner = self.lock();
        if inner.take_fault(Fault::CurrentUser) {
            return Err(AuthError::Transport("injected fault".into()));
        }

        inner.current.as_deref().and_then(|email| inner.record(email)).ok_or(AuthError::NoCurrentUser)
    }

    async fn send_verification_email(&self, user: &UserRecord) -> Result<(), AuthError> {
        let mut inner = self.lock();
        if inner.take_fault(Fault::Verification) {
            return Err(AuthError::Transport("injected fault".into()));
        }

        let mode = inner.verification;
        let Some(account) = inner.accounts.get_mut(&user.email) else {
            return Err(AuthError::Rejected("USER_NOT_FOUND".into()));
        };
        if mode == VerificationMode::OnSend {
            account.verified = true;
        }
        inner.verification_emails.push(user.email.clone());
        Ok(())
    }

    async fn load_all(&self, topic: &str) -> Result<Vec<StoredMessage>, BackendError> {
        let mut inner = self.lock();
        if inner.take_fault(Fault::Load) {
            return Err(BackendError::Io("injected fault".into()));
        }
        Ok(inner.topics.get(topic).cloned().unwrap_or_default())
    }

    async fn subscribe(&self, topic: &str, sink: FeedSink) -> Result<Subscription, BackendError> {
        let mut inner = self.lock();
        if inner.take_fault(Fault::Subscribe) {
            return Err(BackendError::Io("injected fault".into()));
        }

        for stored in inner.topics.get(topic).into_iter().flatten() {
            sink.send(FeedEvent::Item(stored.clone())).map_err(|_| BackendError::FeedClosed)?;
        }
        inner.subscribers.push((topic.to_owned(), sink));
        Ok(Subscription::inline())
    }

    async fn push(&self, topic: &str, message: &Message) -> Result<MessageKey, BackendError> {
        let mut inner = self.lock();
        if inner.take_fault(Fault::Push) {
            return Err(BackendError::Io("injected fault".into()));
        }
        Ok(inner.append(topic, message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use parlor_core::feed_channel;

    use super::*;

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials::new(email, Password::new(password.into()))
    }

    fn message(body: &str) -> Message {
        Message::new("bob@x.co", body, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn duplicate_sign_up_is_a_conflict() {
        let backend = MemoryBackend::new();
        backend.sign_up(&credentials("bob@x.co", "secret1")).await.unwrap();

        let err = backend.sign_up(&credentials("bob@x.co", "other12")).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn sign_in_checks_password() {
        let backend = MemoryBackend::new();
        backend.register("bob@x.co", "secret1", true);

        assert_eq!(
            backend.sign_in(&credentials("bob@x.co", "wrong12")).await,
            Err(AuthError::InvalidCredentials)
        );
        let user = backend.sign_in(&credentials("bob@x.co", "secret1")).await.unwrap();
        assert!(user.email_verified);
        assert_eq!(backend.current_user().await.unwrap(), user);
    }

    #[tokio::test]
    async fn no_current_user_before_auth() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.current_user().await, Err(AuthError::NoCurrentUser));
    }

    #[tokio::test]
    async fn records_are_snapshots() {
        let backend = MemoryBackend::with_verification(VerificationMode::Manual);
        let user = backend.sign_up(&credentials("bob@x.co", "secret1")).await.unwrap();

        backend.send_verification_email(&user).await.unwrap();
        assert!(!backend.is_verified("bob@x.co"));

        assert!(backend.mark_verified("bob@x.co"));
        assert!(!user.email_verified);
        assert!(backend.sign_in(&credentials("bob@x.co", "secret1")).await.unwrap().email_verified);
    }

    #[tokio::test]
    async fn keys_follow_push_order() {
        let backend = MemoryBackend::new();
        let first = backend.push("messages", &message("one")).await.unwrap();
        let second = backend.push("messages", &message("two")).await.unwrap();

        assert!(first < second);
        let bodies: Vec<_> =
            backend.load_all("messages").await.unwrap().into_iter().map(|s| s.message).collect();
        assert_eq!(bodies, [message("one"), message("two")]);
    }

    #[tokio::test]
    async fn subscribe_replays_then_streams() {
        let backend = MemoryBackend::new();
        let old = backend.seed("messages", message("old"));
        let (sink, mut feed) = feed_channel();

        let _subscription = backend.subscribe("messages", sink).await.unwrap();
        let new = backend.push("messages", &message("new")).await.unwrap();
        backend.push("elsewhere", &message("ignored")).await.unwrap();

        let keys: Vec<_> = std::iter::from_fn(|| feed.try_recv().ok())
            .map(|event| match event {
                FeedEvent::Item(stored) => stored.key,
                FeedEvent::Lost(err) => panic!("unexpected loss: {err}"),
            })
            .collect();
        assert_eq!(keys, [old, new]);
    }

    #[tokio::test]
    async fn faults_fire_once() {
        let backend = MemoryBackend::new();
        backend.inject_fault(Fault::Push);

        assert!(backend.push("messages", &message("lost")).await.is_err());
        assert!(backend.push("messages", &message("kept")).await.is_ok());
        assert_eq!(backend.messages("messages").len(), 1);
    }

    #[tokio::test]
    async fn closed_sinks_are_pruned() {
        let backend = MemoryBackend::new();
        let (sink, feed) = feed_channel();
        let _subscription = backend.subscribe("messages", sink).await.unwrap();
        assert_eq!(backend.subscriber_count(), 1);

        drop(feed);
        backend.push("messages", &message("after")).await.unwrap();
        assert_eq!(backend.subscriber_count(), 0);
    }
}
