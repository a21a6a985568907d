//! Backend gateway contract.
//!
//! The [`Gateway`] trait decouples the session flow from a concrete backend.
//! Production uses a hosted identity provider and realtime store; simulation
//! and tests use an in-process implementation. The same
//! runtime drives both.
//!
//! # Live feed
//!
//! A subscription is a second producer of messages. Instead of invoking a
//! callback on whatever task the backend happens to run, the backend pushes
//! [`FeedEvent`]s into a [`FeedSink`]; the runtime owns the single
//! [`FeedReceiver`] and applies events between state handlers, so the message
//! set is never mutated from two places at once.

use std::future::Future;

use tokio::{sync::mpsc, task::AbortHandle};

use crate::{AuthError, BackendError, Credentials, Message, MessageKey, StoredMessage, UserRecord};

/// Event delivered by a live subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// A message appeared in the subscribed topic. May repeat messages the
    /// subscriber already knows about.
    Item(StoredMessage),

    /// The feed stopped delivering and will not resume.
    Lost(BackendError),
}

/// Producer half of the live feed queue.
pub type FeedSink = mpsc::UnboundedSender<FeedEvent>;

/// Consumer half of the live feed queue.
pub type FeedReceiver = mpsc::UnboundedReceiver<FeedEvent>;

/// Create a live feed queue.
pub fn feed_channel() -> (FeedSink, FeedReceiver) {
    mpsc::unbounded_channel()
}

/// Handle to an active subscription.
///
/// Dropping the handle stops any background task feeding the sink.
#[derive(Debug, Default)]
pub struct Subscription {
    task: Option<AbortHandle>,
}

impl Subscription {
    /// Subscription driven by a background task.
    pub fn with_task(task: AbortHandle) -> Self {
        Self { task: Some(task) }
    }

    /// Subscription fed synchronously by the backend itself.
    pub fn inline() -> Self {
        Self { task: None }
    }

    /// Stop delivering events.
    pub fn stop(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Auth and data-store operations the session flow depends on.
///
/// Every call is asynchronous and may fail. Calls are never cancelled once
/// issued.
///
/// # Implementations
///
/// - **Memory**: in-process accounts and topics for simulation and tests
/// - **Firebase**: Identity Toolkit and Realtime Database REST APIs
pub trait Gateway: Send + Sync {
    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// [`AuthError::EmailInUse`] if an account with this email exists.
    fn sign_up(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<UserRecord, AuthError>> + Send;

    /// Sign in to an existing account. Returns a freshly issued record.
    fn sign_in(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<UserRecord, AuthError>> + Send;

    /// The user of the most recent successful sign-up or sign-in.
    ///
    /// # Errors
    ///
    /// [`AuthError::NoCurrentUser`] if nobody has signed in yet.
    fn current_user(&self) -> impl Future<Output = Result<UserRecord, AuthError>> + Send;

    /// Ask the provider to email a verification link to `user`.
    fn send_verification_email(
        &self,
        user: &UserRecord,
    ) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Every message in `topic`, in store order.
    fn load_all(
        &self,
        topic: &str,
    ) -> impl Future<Output = Result<Vec<StoredMessage>, BackendError>> + Send;

    /// Start delivering messages of `topic` into `sink`.
    ///
    /// Existing messages are delivered first, then new ones as they are
    /// pushed. Delivery continues until the returned handle is dropped.
    fn subscribe(
        &self,
        topic: &str,
        sink: FeedSink,
    ) -> impl Future<Output = Result<Subscription, BackendError>> + Send;

    /// Append `message` to `topic`. Returns the store-assigned key.
    fn push(
        &self,
        topic: &str,
        message: &Message,
    ) -> impl Future<Output = Result<MessageKey, BackendError>> + Send;
}
