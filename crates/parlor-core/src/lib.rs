//! Core types for Parlor
//!
//! The vocabulary shared by every other crate: chat messages and their store
//! keys, sign-in credentials, user records, the error taxonomy of the remote
//! backend, and the [`Gateway`] trait that backends implement.
//!
//! # Components
//!
//! - [`Message`] / [`StoredMessage`]: immutable chat messages and their keys
//! - [`Credentials`] / [`Password`]: sign-in input, zeroized on drop
//! - [`UserRecord`]: identity provider's view of the signed-in user
//! - [`Gateway`]: async contract for auth and data-store operations
//! - [`FeedEvent`] / [`Subscription`]: live message feed plumbing

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod auth;
mod error;
mod gateway;
mod message;

pub use auth::{Credentials, Password, UserRecord};
pub use error::{AuthError, BackendError};
pub use gateway::{FeedEvent, FeedReceiver, FeedSink, Gateway, Subscription, feed_channel};
pub use message::{Message, MessageKey, StoredMessage};
