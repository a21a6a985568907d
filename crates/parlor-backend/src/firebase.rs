//! Firebase gateway over the Identity Toolkit and Realtime Database REST APIs.
//!
//! Auth calls post JSON to `accounts:*` endpoints with the project API key.
//! Data calls address `{database_url}/{topic}.json` with the signed-in user's
//! ID token. A subscription holds a streaming `GET` open and turns the
//! server-sent `put`/`patch` events into feed items on a background task.
//!
//! ID tokens expire after an hour. A data call answered with 401 exchanges
//! the refresh token for a new ID token and is sent once more. A stream that
//! reports `auth_revoked` is reopened the same way.

#![allow(clippy::disallowed_types, reason = "Session token guarded by a short critical section")]

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use futures::StreamExt;
use parlor_core::{
    AuthError, BackendError, Credentials, FeedEvent, FeedSink, Gateway, Message, MessageKey,
    StoredMessage, Subscription, UserRecord,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::sse::{SseEvent, SseParser};

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";

/// Project settings needed to reach Firebase.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// Web API key of the project.
    pub api_key: String,
    /// Realtime Database root, e.g. `https://project.firebaseio.com`.
    pub database_url: String,
}

/// Failures of a single REST call, before classification.
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// Request did not complete.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with an error status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// Response status code.
        status: u16,
        /// Error code or body reported by the server.
        message: String,
    },

    /// Response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Data call made before any sign-in.
    #[error("not signed in")]
    NotSignedIn,
}

impl From<FirebaseError> for AuthError {
    fn from(err: FirebaseError) -> Self {
        match err {
            FirebaseError::Status { message, .. } => classify_auth_error(&message),
            FirebaseError::NotSignedIn => Self::NoCurrentUser,
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<FirebaseError> for BackendError {
    fn from(err: FirebaseError) -> Self {
        match err {
            FirebaseError::Decode(e) => Self::Decode(e.to_string()),
            other => Self::Io(other.to_string()),
        }
    }
}

/// Map an Identity Toolkit error message to an [`AuthError`].
///
/// Messages look like `EMAIL_EXISTS` or `WEAK_PASSWORD : Password should be at
/// least 6 characters`; only the code before ` : ` is significant.
pub fn classify_auth_error(message: &str) -> AuthError {
    let code = message.split(" : ").next().unwrap_or(message).trim();
    match code {
        "EMAIL_EXISTS" => AuthError::EmailInUse,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            AuthError::InvalidCredentials
        },
        _ => AuthError::Rejected(message.to_owned()),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    id_token: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeRequest<'a> {
    request_type: &'a str,
    id_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    id_token: String,
    refresh_token: String,
    local_id: String,
    email: String,
}

/// Secure Token API request. Unlike Identity Toolkit, fields are snake case.
#[derive(Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'a str,
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: String,
    #[serde(default)]
    email_verified: bool,
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Payload of a streaming `put` or `patch` event.
#[derive(Deserialize)]
struct StreamPayload {
    path: String,
    data: Value,
}

#[derive(Debug, Clone)]
struct AuthSession {
    id_token: String,
    refresh_token: String,
    user: UserRecord,
}

impl AuthSession {
    fn new(auth: AuthResponse, user: UserRecord) -> Self {
        Self { id_token: auth.id_token, refresh_token: auth.refresh_token, user }
    }

    /// Same user, new token pair.
    fn renewed(self, tokens: RefreshResponse) -> Self {
        Self { id_token: tokens.id_token, refresh_token: tokens.refresh_token, ..self }
    }
}

/// Gateway backed by a Firebase project.
///
/// Cloning is cheap and clones share the signed-in session, so a stream task
/// can renew the token it reconnects with.
#[derive(Clone)]
pub struct FirebaseBackend {
    inner: Arc<FirebaseInner>,
}

struct FirebaseInner {
    client: reqwest::Client,
    config: FirebaseConfig,
    session: Mutex<Option<AuthSession>>,
}

impl FirebaseBackend {
    /// Create a gateway for the given project.
    pub fn new(config: FirebaseConfig) -> Self {
        let inner =
            FirebaseInner { client: reqwest::Client::new(), config, session: Mutex::new(None) };
        Self { inner: Arc::new(inner) }
    }
}

impl FirebaseInner {
    fn identity_url(&self, method: &str) -> String {
        format!("{IDENTITY_TOOLKIT_URL}/accounts:{method}?key={}", self.config.api_key)
    }

    fn topic_url(&self, topic: &str, id_token: &str) -> String {
        format!("{}/{topic}.json?auth={id_token}", self.config.database_url.trim_end_matches('/'))
    }

    #[allow(clippy::expect_used)]
    fn lock_session(&self) -> MutexGuard<'_, Option<AuthSession>> {
        self.session.lock().expect("Mutex poisoned")
    }

    fn session(&self) -> Option<AuthSession> {
        self.lock_session().clone()
    }

    fn store_session(&self, session: AuthSession) {
        *self.lock_session() = Some(session);
    }

    fn id_token(&self) -> Result<String, FirebaseError> {
        self.session().map(|s| s.id_token).ok_or(FirebaseError::NotSignedIn)
    }

    async fn post_identity<B, R>(&self, method: &str, body: &B) -> Result<R, FirebaseError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self.client.post(self.identity_url(method)).json(body).send().await?;
        decode(response).await
    }

    async fn lookup(&self, id_token: &str) -> Result<UserRecord, FirebaseError> {
        let response: LookupResponse =
            self.post_identity("lookup", &TokenRequest { id_token }).await?;
        let user = response.users.into_iter().next().ok_or(FirebaseError::NotSignedIn)?;
        Ok(UserRecord { uid: user.local_id, email: user.email, email_verified: user.email_verified })
    }

    /// Exchange the refresh token for a new ID token and keep it.
    async fn refresh(&self) -> Result<String, FirebaseError> {
        let session = self.session().ok_or(FirebaseError::NotSignedIn)?;
        let request =
            RefreshRequest { grant_type: "refresh_token", refresh_token: &session.refresh_token };
        let url = format!("{SECURE_TOKEN_URL}?key={}", self.config.api_key);
        let response = self.client.post(url).json(&request).send().await?;
        let tokens: RefreshResponse = decode(response).await?;

        let session = session.renewed(tokens);
        let id_token = session.id_token.clone();
        self.store_session(session);
        tracing::debug!("ID token refreshed");
        Ok(id_token)
    }

    /// Send a data request, renewing the token once if the database rejects it.
    async fn send_authorized<F>(&self, build: F) -> Result<reqwest::Response, FirebaseError>
    where
        F: Fn(&str) -> reqwest::RequestBuilder,
    {
        let response = build(&self.id_token()?).send().await?;
        if response.status() != reqwest::StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::info!("database rejected ID token, refreshing");
        let id_token = self.refresh().await?;
        Ok(build(&id_token).send().await?)
    }

    /// Open the event stream for `topic`.
    async fn open_stream(&self, topic: &str) -> Result<reqwest::Response, FirebaseError> {
        let response = self
            .send_authorized(|id_token| {
                self.client
                    .get(self.topic_url(topic, id_token))
                    .header(reqwest::header::ACCEPT, "text/event-stream")
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FirebaseError::Status { status: status.as_u16(), message });
        }
        Ok(response)
    }

    async fn password_auth(
        &self,
        method: &str,
        credentials: &Credentials,
    ) -> Result<AuthResponse, FirebaseError> {
        let request = PasswordRequest {
            email: &credentials.email,
            password: credentials.password.expose(),
            return_secure_token: true,
        };
        self.post_identity(method, &request).await
    }
}

/// Decode a JSON body, or turn an error status into [`FirebaseError::Status`].
async fn decode<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, FirebaseError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .or_else(|_| serde_json::from_str::<Value>(&body).map(|v| error_field(&v)))
            .unwrap_or(body);
        return Err(FirebaseError::Status { status: status.as_u16(), message });
    }

    Ok(serde_json::from_str(&body)?)
}

/// The database reports errors as `{"error": "..."}`.
fn error_field(value: &Value) -> String {
    value.get("error").and_then(Value::as_str).map_or_else(|| value.to_string(), str::to_owned)
}

/// Decode a `{key: message}` map, skipping entries that are not messages.
fn decode_children(children: Value) -> Result<Vec<StoredMessage>, BackendError> {
    let children: Option<BTreeMap<String, Value>> =
        serde_json::from_value(children).map_err(|e| BackendError::Decode(e.to_string()))?;

    Ok(children.into_iter().flatten().filter_map(|(key, value)| decode_child(key, value)).collect())
}

fn decode_child(key: String, value: Value) -> Option<StoredMessage> {
    match serde_json::from_value::<Message>(value) {
        Ok(message) => Some(StoredMessage::new(key, message)),
        Err(err) => {
            tracing::warn!(%key, %err, "skipping malformed message");
            None
        },
    }
}

/// What a stream event means for the feed.
#[derive(Debug, PartialEq, Eq)]
enum StreamUpdate {
    Items(Vec<StoredMessage>),
    Idle,
    Revoked,
    Closed(BackendError),
}

fn decode_stream_event(event: &SseEvent) -> StreamUpdate {
    match event.event.as_str() {
        "put" | "patch" => match serde_json::from_str::<StreamPayload>(&event.data) {
            Ok(payload) => StreamUpdate::Items(decode_payload(payload)),
            Err(err) => StreamUpdate::Closed(BackendError::Decode(err.to_string())),
        },
        "cancel" => StreamUpdate::Closed(BackendError::Io("stream cancelled by server".into())),
        "auth_revoked" => StreamUpdate::Revoked,
        _ => StreamUpdate::Idle,
    }
}

/// Root-path payloads carry a map of children; child paths carry one message.
fn decode_payload(payload: StreamPayload) -> Vec<StoredMessage> {
    let path = payload.path.trim_matches('/');
    if path.is_empty() {
        return decode_children(payload.data).unwrap_or_else(|err| {
            tracing::warn!(%err, "ignoring undecodable stream snapshot");
            Vec::new()
        });
    }
    if path.contains('/') || payload.data.is_null() {
        return Vec::new();
    }
    decode_child(path.to_owned(), payload.data).into_iter().collect()
}

/// Why one stream connection ended.
enum StreamEnd {
    /// The receiver went away.
    Unsubscribed,
    /// The server revoked the token; `fresh` if items arrived since connecting.
    Revoked { fresh: bool },
    Lost(BackendError),
}

async fn pump_connection(response: reqwest::Response, sink: &FeedSink) -> StreamEnd {
    let mut parser = SseParser::new();
    let mut stream = std::pin::pin!(response.bytes_stream());
    let mut fresh = false;

    loop {
        let chunk = match stream.next().await {
            Some(Ok(chunk)) => chunk,
            Some(Err(err)) => return StreamEnd::Lost(BackendError::Io(err.to_string())),
            None => return StreamEnd::Lost(BackendError::FeedClosed),
        };

        for event in parser.feed(&chunk) {
            match decode_stream_event(&event) {
                StreamUpdate::Items(items) => {
                    fresh = true;
                    for item in items {
                        if sink.send(FeedEvent::Item(item)).is_err() {
                            return StreamEnd::Unsubscribed;
                        }
                    }
                },
                StreamUpdate::Idle => {},
                StreamUpdate::Revoked => return StreamEnd::Revoked { fresh },
                StreamUpdate::Closed(reason) => return StreamEnd::Lost(reason),
            }
        }
    }
}

/// Forward stream events until the subscriber leaves or the feed is lost.
///
/// A revoked token is refreshed and the stream reopened. The reopened stream
/// starts with a full snapshot, which the subscriber de-duplicates. Two
/// revocations in a row with nothing received in between end the feed.
async fn pump_stream(
    inner: Arc<FirebaseInner>,
    topic: String,
    mut response: reqwest::Response,
    sink: FeedSink,
) {
    let reason = loop {
        match pump_connection(response, &sink).await {
            StreamEnd::Unsubscribed => return,
            StreamEnd::Lost(reason) => break reason,
            StreamEnd::Revoked { fresh: false } => {
                break BackendError::Io("auth token revoked".into());
            },
            StreamEnd::Revoked { fresh: true } => {
                tracing::info!(%topic, "live feed token revoked, reconnecting");
                let reopened = match inner.refresh().await {
                    Ok(_) => inner.open_stream(&topic).await,
                    Err(err) => Err(err),
                };
                match reopened {
                    Ok(next) => response = next,
                    Err(err) => break err.into(),
                }
            },
        }
    };

    tracing::warn!(%reason, "live feed ended");
    let _ = sink.send(FeedEvent::Lost(reason));
}

impl Gateway for FirebaseBackend {
    async fn sign_up(&self, credentials: &Credentials) -> Result<UserRecord, AuthError> {
        let auth = self.inner.password_auth("signUp", credentials).await?;
        let user = UserRecord {
            uid: auth.local_id.clone(),
            email: auth.email.clone(),
            email_verified: false,
        };
        self.inner.store_session(AuthSession::new(auth, user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<UserRecord, AuthError> {
        let auth = self.inner.password_auth("signInWithPassword", credentials).await?;
        let user = self.inner.lookup(&auth.id_token).await?;
        self.inner.store_session(AuthSession::new(auth, user.clone()));
        Ok(user)
    }

    async fn current_user(&self) -> Result<UserRecord, AuthError> {
        self.inner.session().map(|session| session.user).ok_or(AuthError::NoCurrentUser)
    }

    async fn send_verification_email(&self, _user: &UserRecord) -> Result<(), AuthError> {
        let id_token = self.inner.id_token()?;
        let request = OobCodeRequest { request_type: "VERIFY_EMAIL", id_token: &id_token };
        let _: Value = self.inner.post_identity("sendOobCode", &request).await?;
        Ok(())
    }

    async fn load_all(&self, topic: &str) -> Result<Vec<StoredMessage>, BackendError> {
        let inner = &self.inner;
        let response = inner
            .send_authorized(|id_token| inner.client.get(inner.topic_url(topic, id_token)))
            .await?;
        let children: Value = decode(response).await?;
        decode_children(children)
    }

    async fn subscribe(&self, topic: &str, sink: FeedSink) -> Result<Subscription, BackendError> {
        let response = self.inner.open_stream(topic).await?;
        let task =
            tokio::spawn(pump_stream(Arc::clone(&self.inner), topic.to_owned(), response, sink));
        Ok(Subscription::with_task(task.abort_handle()))
    }

    async fn push(&self, topic: &str, message: &Message) -> Result<MessageKey, BackendError> {
        let inner = &self.inner;
        let response = inner
            .send_authorized(|id_token| {
                inner.client.post(inner.topic_url(topic, id_token)).json(message)
            })
            .await?;
        let pushed: PushResponse = decode(response).await?;
        Ok(MessageKey::new(pushed.name))
    }
}
