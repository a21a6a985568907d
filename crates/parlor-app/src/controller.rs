//! Session state machine.
//!
//! This module defines the [`Controller`], which walks the user from sign-in
//! through email verification into the chat, completely decoupled from the
//! terminal and the backend.
//!
//! This is a pure state machine: it consumes [`crate::ControllerEvent`]
//! inputs and produces [`crate::ControllerAction`] instructions for the
//! runtime to execute. Every backend action is answered by exactly one
//! outcome event, and the runtime feeds that event back before executing
//! anything else, so handlers never overlap.
//!
//! # Responsibilities
//!
//! - Dispatches each line to the handler of the current [`SessionState`].
//! - Runs entry actions of states that take no input in the same step as the
//!   transition into them.
//! - Tracks masked echo so it is toggled exactly when it changes.
//! - Merges chat history and live deliveries into one de-duplicated log.

use parlor_core::{
    AuthError, BackendError, FeedEvent, MessageKey, Password, StoredMessage, UserRecord,
};

use crate::{
    ControllerAction, ControllerEvent, MessageDraft, MessageLog, Notice, Session, SessionState,
    validate,
};

/// Line that leaves the chat.
pub const QUIT_COMMAND: &str = "/quit";

/// Session state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug)]
pub struct Controller {
    /// Current state. The only piece of control state.
    state: SessionState,
    /// Data gathered along the way.
    session: Session,
    /// Whether typed characters are currently masked.
    masked_echo: bool,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    /// Create a controller positioned before the email prompt.
    pub fn new() -> Self {
        Self { state: SessionState::RequestEmail, session: Session::default(), masked_echo: false }
    }

    /// Run the entry action of the initial state.
    pub fn start(&mut self) -> Vec<ControllerAction> {
        self.transition(SessionState::RequestEmail)
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: ControllerEvent) -> Vec<ControllerAction> {
        match event {
            ControllerEvent::Line(line) => self.handle_line(line),
            ControllerEvent::SignedUp(result) => self.on_signed_up(result),
            ControllerEvent::SignedIn(result) => self.on_signed_in(result),
            ControllerEvent::CurrentUser(result) => self.on_current_user(result),
            ControllerEvent::VerificationSent(result) => self.on_verification_sent(result),
            ControllerEvent::HistoryLoaded(result) => self.on_history_loaded(result),
            ControllerEvent::Subscribed(result) => self.on_subscribed(result),
            ControllerEvent::Pushed(result) => self.on_pushed(result),
            ControllerEvent::Feed(FeedEvent::Item(stored)) => self.merge_live(stored),
            ControllerEvent::Feed(FeedEvent::Lost(error)) => {
                tracing::warn!(%error, "live feed lost");
                vec![ControllerAction::Show(Notice::warning(format!(
                    "Live updates stopped: {error}"
                )))]
            },
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Session data gathered so far.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Whether typed characters are currently masked.
    pub fn masked_echo(&self) -> bool {
        self.masked_echo
    }

    /// Messages shown so far. `None` until history has loaded.
    pub fn known_messages(&self) -> Option<&MessageLog> {
        self.session.known_messages.as_ref()
    }

    fn transition(&mut self, next: SessionState) -> Vec<ControllerAction> {
        tracing::debug!(from = %self.state, to = %next, "transition");
        self.state = next;
        self.enter()
    }

    fn enter(&mut self) -> Vec<ControllerAction> {
        match self.state {
            SessionState::RequestEmail => {
                self.session.forget_identity();
                let mut actions = vec![ControllerAction::Show(Notice::prompt("Enter email"))];
                actions.extend(self.transition(SessionState::GetEmail));
                actions
            },
            SessionState::RequestPassword => {
                let mut actions =
                    vec![ControllerAction::Show(Notice::prompt("Enter your password"))];
                actions.extend(self.set_masked_echo(true));
                actions.extend(self.transition(SessionState::GetPassword));
                actions
            },
            SessionState::FetchUser => match self.session.credentials() {
                Some(credentials) => vec![
                    ControllerAction::Show(Notice::progress("Trying to create new user...")),
                    ControllerAction::SignUp(credentials),
                ],
                None => self.auth_failure(&AuthError::InvalidCredentials),
            },
            // The record from FETCH_USER may predate verification, so sign in
            // again to read the flag as it is now.
            SessionState::CheckEmailVerification => match self.session.credentials() {
                Some(credentials) => vec![ControllerAction::SignIn(credentials)],
                None => self.auth_failure(&AuthError::InvalidCredentials),
            },
            SessionState::RequestEmailVerification | SessionState::StartChat => {
                vec![ControllerAction::FetchCurrentUser]
            },
            SessionState::RequestMessage => self.transition(SessionState::GetMessage),
            SessionState::GetEmail | SessionState::GetPassword | SessionState::GetMessage => {
                vec![]
            },
        }
    }

    fn handle_line(&mut self, line: String) -> Vec<ControllerAction> {
        if !self.state.awaits_input() {
            tracing::debug!(state = %self.state, "line ignored, state takes no input");
            return vec![];
        }

        match self.state {
            SessionState::GetEmail => self.on_email(line),
            SessionState::GetPassword => self.on_password(line),
            SessionState::RequestEmailVerification => {
                self.transition(SessionState::CheckEmailVerification)
            },
            _ => self.on_chat_line(line),
        }
    }

    fn on_email(&mut self, line: String) -> Vec<ControllerAction> {
        if validate::is_valid_email(&line) {
            self.session.email = Some(line);
            self.transition(SessionState::RequestPassword)
        } else {
            self.show_then(Notice::error("Email is not valid"), SessionState::RequestEmail)
        }
    }

    fn on_password(&mut self, line: String) -> Vec<ControllerAction> {
        let password = Password::new(line);
        let mut actions = self.set_masked_echo(false);

        if validate::is_valid_password(password.expose()) {
            self.session.password = Some(password);
            actions.extend(self.transition(SessionState::FetchUser));
        } else {
            actions.extend(self.show_then(
                Notice::error(format!(
                    "The password must be {} characters long or more",
                    validate::MIN_PASSWORD_CHARS
                )),
                SessionState::RequestPassword,
            ));
        }
        actions
    }

    fn on_signed_up(&mut self, result: Result<UserRecord, AuthError>) -> Vec<ControllerAction> {
        if self.state != SessionState::FetchUser {
            return self.unexpected("SignedUp");
        }

        match result {
            Ok(user) => {
                self.session.user = Some(user);
                self.show_then(
                    Notice::success("New user created"),
                    SessionState::CheckEmailVerification,
                )
            },
            Err(AuthError::EmailInUse) => match self.session.credentials() {
                Some(credentials) => vec![
                    ControllerAction::Show(Notice::progress(
                        "User already exists, trying to sign in...",
                    )),
                    ControllerAction::SignIn(credentials),
                ],
                None => self.auth_failure(&AuthError::InvalidCredentials),
            },
            Err(error) => self.auth_failure(&error),
        }
    }

    fn on_signed_in(&mut self, result: Result<UserRecord, AuthError>) -> Vec<ControllerAction> {
        match (self.state, result) {
            (SessionState::FetchUser, Ok(user)) => {
                self.session.user = Some(user);
                self.show_then(
                    Notice::success("Signed in successfully"),
                    SessionState::CheckEmailVerification,
                )
            },
            (SessionState::CheckEmailVerification, Ok(user)) => {
                let verified = user.email_verified;
                self.session.user = Some(user);
                if verified {
                    self.show_then(Notice::success("Your email is verified"), SessionState::StartChat)
                } else {
                    self.show_then(
                        Notice::warning("Your email is not verified"),
                        SessionState::RequestEmailVerification,
                    )
                }
            },
            (SessionState::FetchUser | SessionState::CheckEmailVerification, Err(error)) => {
                self.auth_failure(&error)
            },
            _ => self.unexpected("SignedIn"),
        }
    }

    fn on_current_user(&mut self, result: Result<UserRecord, AuthError>) -> Vec<ControllerAction> {
        match (self.state, result) {
            (SessionState::RequestEmailVerification, Ok(user)) => {
                self.session.user = Some(user.clone());
                vec![
                    ControllerAction::Show(Notice::progress("Sending verification email...")),
                    ControllerAction::SendVerification(user),
                ]
            },
            (SessionState::StartChat, Ok(user)) => {
                self.session.user = Some(user);
                vec![ControllerAction::LoadHistory]
            },
            (SessionState::RequestEmailVerification | SessionState::StartChat, Err(error)) => {
                self.auth_failure(&error)
            },
            _ => self.unexpected("CurrentUser"),
        }
    }

    fn on_verification_sent(&mut self, result: Result<(), AuthError>) -> Vec<ControllerAction> {
        if self.state != SessionState::RequestEmailVerification {
            return self.unexpected("VerificationSent");
        }

        let mut actions = Vec::new();
        if let Err(error) = result {
            tracing::warn!(%error, "verification email not sent");
            actions.push(ControllerAction::Show(Notice::error(format!(
                "Could not send verification email: {error}"
            ))));
        }
        actions.push(ControllerAction::Show(Notice::prompt("Verify your email and press Enter")));
        actions
    }

    fn on_history_loaded(
        &mut self,
        result: Result<Vec<StoredMessage>, BackendError>,
    ) -> Vec<ControllerAction> {
        if self.state != SessionState::StartChat {
            return self.unexpected("HistoryLoaded");
        }

        match result {
            Ok(history) => {
                let mut log = MessageLog::new();
                let mut actions: Vec<_> = history
                    .into_iter()
                    .filter_map(|stored| log.insert(stored).cloned())
                    .map(ControllerAction::ShowMessage)
                    .collect();
                tracing::debug!(count = log.len(), "history loaded");
                self.session.known_messages = Some(log);
                actions.push(ControllerAction::Subscribe);
                actions
            },
            Err(error) => self.backend_failure("Could not load messages", error),
        }
    }

    fn on_subscribed(&mut self, result: Result<(), BackendError>) -> Vec<ControllerAction> {
        if self.state != SessionState::StartChat {
            return self.unexpected("Subscribed");
        }

        match result {
            Ok(()) => {
                let mut actions = vec![
                    ControllerAction::Show(Notice::success("Welcome to the chat")),
                    ControllerAction::Show(Notice::warning(format!(
                        "Type \"{QUIT_COMMAND}\" to exit"
                    ))),
                ];
                actions.extend(self.transition(SessionState::RequestMessage));
                actions
            },
            Err(error) => self.backend_failure("Could not subscribe to new messages", error),
        }
    }

    fn on_chat_line(&mut self, line: String) -> Vec<ControllerAction> {
        if line == QUIT_COMMAND {
            return vec![ControllerAction::Quit];
        }

        match &self.session.user {
            Some(user) => vec![ControllerAction::Push(MessageDraft {
                author_email: user.email.clone(),
                body: line,
            })],
            None => self.auth_failure(&AuthError::NoCurrentUser),
        }
    }

    fn on_pushed(&mut self, result: Result<MessageKey, BackendError>) -> Vec<ControllerAction> {
        if self.state != SessionState::GetMessage {
            return self.unexpected("Pushed");
        }

        match result {
            Ok(key) => {
                tracing::debug!(%key, "message pushed");
                self.transition(SessionState::RequestMessage)
            },
            Err(error) => {
                tracing::warn!(%error, "push failed");
                self.show_then(
                    Notice::error(format!("Message was not sent: {error}")),
                    SessionState::RequestMessage,
                )
            },
        }
    }

    /// Apply a live delivery. Shown only if its key is new.
    fn merge_live(&mut self, stored: StoredMessage) -> Vec<ControllerAction> {
        let Some(log) = self.session.known_messages.as_mut() else {
            tracing::debug!(key = %stored.key, "feed item before history, dropped");
            return vec![];
        };

        log.insert(stored).cloned().map(ControllerAction::ShowMessage).into_iter().collect()
    }

    fn set_masked_echo(&mut self, masked: bool) -> Vec<ControllerAction> {
        if self.masked_echo == masked {
            return vec![];
        }
        self.masked_echo = masked;
        vec![ControllerAction::SetMaskedEcho(masked)]
    }

    fn show_then(&mut self, notice: Notice, next: SessionState) -> Vec<ControllerAction> {
        let mut actions = vec![ControllerAction::Show(notice)];
        actions.extend(self.transition(next));
        actions
    }

    fn auth_failure(&mut self, error: &AuthError) -> Vec<ControllerAction> {
        tracing::warn!(%error, state = %self.state, "authentication failed, restarting");
        self.show_then(Notice::error(format!("Sign in failed: {error}")), SessionState::RequestEmail)
    }

    fn backend_failure(&self, context: &str, error: BackendError) -> Vec<ControllerAction> {
        tracing::error!(%error, state = %self.state, "{context}");
        vec![
            ControllerAction::Show(Notice::error(format!("{context}: {error}"))),
            ControllerAction::Halt(error),
        ]
    }

    fn unexpected(&self, event: &'static str) -> Vec<ControllerAction> {
        tracing::warn!(state = %self.state, event, "event does not apply to current state");
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use parlor_core::{Credentials, Message};

    use super::*;
    use crate::Tone;

    fn user(verified: bool) -> UserRecord {
        UserRecord { uid: "u1".into(), email: "bob@x.co".into(), email_verified: verified }
    }

    fn stored(key: &str, body: &str) -> StoredMessage {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        StoredMessage::new(key, Message::new("alice@x.co", body, at))
    }

    fn line(controller: &mut Controller, text: &str) -> Vec<ControllerAction> {
        controller.handle(ControllerEvent::Line(text.into()))
    }

    /// Controller that has just asked to sign up `bob@x.co`.
    fn fetching_user() -> Controller {
        let mut controller = Controller::new();
        let _ = controller.start();
        let _ = line(&mut controller, "bob@x.co");
        let _ = line(&mut controller, "longenough");
        assert_eq!(controller.state(), SessionState::FetchUser);
        controller
    }

    /// Controller sitting at the chat prompt with history `k1`, `k2`.
    fn chatting() -> Controller {
        let mut controller = fetching_user();
        let _ = controller.handle(ControllerEvent::SignedUp(Ok(user(true))));
        let _ = controller.handle(ControllerEvent::SignedIn(Ok(user(true))));
        let _ = controller.handle(ControllerEvent::CurrentUser(Ok(user(true))));
        let _ = controller.handle(ControllerEvent::HistoryLoaded(Ok(vec![
            stored("k1", "one"),
            stored("k2", "two"),
        ])));
        let _ = controller.handle(ControllerEvent::Subscribed(Ok(())));
        assert_eq!(controller.state(), SessionState::GetMessage);
        controller
    }

    fn shown_bodies(actions: &[ControllerAction]) -> Vec<String> {
        actions
            .iter()
            .filter_map(|a| match a {
                ControllerAction::ShowMessage(m) => Some(m.body().to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn start_prompts_for_email() {
        let mut controller = Controller::new();
        let actions = controller.start();

        assert!(matches!(actions.as_slice(), [ControllerAction::Show(Notice {
            tone: Tone::Prompt,
            ..
        })]));
        assert_eq!(controller.state(), SessionState::GetEmail);
    }

    #[test]
    fn email_then_password_scenario() {
        let mut controller = Controller::new();
        let _ = controller.start();

        let actions = line(&mut controller, "bob");
        assert!(actions.contains(&ControllerAction::Show(Notice::error("Email is not valid"))));
        assert!(actions.contains(&ControllerAction::Show(Notice::prompt("Enter email"))));
        assert_eq!(controller.state(), SessionState::GetEmail);

        let actions = line(&mut controller, "bob@x.co");
        assert!(actions.contains(&ControllerAction::SetMaskedEcho(true)));
        assert_eq!(controller.state(), SessionState::GetPassword);

        let actions = line(&mut controller, "short");
        assert_eq!(actions.first(), Some(&ControllerAction::SetMaskedEcho(false)));
        assert_eq!(actions.last(), Some(&ControllerAction::SetMaskedEcho(true)));
        assert_eq!(controller.state(), SessionState::GetPassword);
        assert!(controller.session().password.is_none());

        let actions = line(&mut controller, "longenough");
        assert_eq!(controller.state(), SessionState::FetchUser);
        assert!(!controller.masked_echo());
        assert!(matches!(
            actions.last(),
            Some(ControllerAction::SignUp(Credentials { email, .. })) if email == "bob@x.co"
        ));
    }

    #[test]
    fn existing_account_signs_in_without_asking() {
        let mut controller = fetching_user();

        let actions = controller.handle(ControllerEvent::SignedUp(Err(AuthError::EmailInUse)));
        let Some(ControllerAction::SignIn(credentials)) = actions.last() else {
            panic!("expected sign-in, got {actions:?}");
        };
        assert_eq!(credentials.email, "bob@x.co");
        assert_eq!(credentials.password.expose(), "longenough");
        assert!(!actions.iter().any(|a| matches!(a, ControllerAction::Show(n) if n.tone == Tone::Prompt)));

        let actions = controller.handle(ControllerEvent::SignedIn(Ok(user(false))));
        assert_eq!(controller.state(), SessionState::CheckEmailVerification);
        assert!(matches!(actions.last(), Some(ControllerAction::SignIn(_))));
    }

    #[test]
    fn other_sign_up_failure_restarts_and_forgets_password() {
        let mut controller = fetching_user();

        let actions = controller
            .handle(ControllerEvent::SignedUp(Err(AuthError::Rejected("WEAK_PASSWORD".into()))));

        assert_eq!(controller.state(), SessionState::GetEmail);
        assert!(controller.session().password.is_none());
        assert!(matches!(&actions[0], ControllerAction::Show(n) if n.tone == Tone::Error));
    }

    #[test]
    fn failed_fallback_sign_in_restarts() {
        let mut controller = fetching_user();
        let _ = controller.handle(ControllerEvent::SignedUp(Err(AuthError::EmailInUse)));
        let _ = controller.handle(ControllerEvent::SignedIn(Err(AuthError::InvalidCredentials)));

        assert_eq!(controller.state(), SessionState::GetEmail);
    }

    #[test]
    fn unverified_email_requests_verification_then_rechecks() {
        let mut controller = fetching_user();
        let _ = controller.handle(ControllerEvent::SignedUp(Ok(user(false))));

        let actions = controller.handle(ControllerEvent::SignedIn(Ok(user(false))));
        assert_eq!(controller.state(), SessionState::RequestEmailVerification);
        assert_eq!(actions.last(), Some(&ControllerAction::FetchCurrentUser));

        let actions = controller.handle(ControllerEvent::CurrentUser(Ok(user(false))));
        assert_eq!(actions.last(), Some(&ControllerAction::SendVerification(user(false))));

        let actions = controller.handle(ControllerEvent::VerificationSent(Ok(())));
        assert!(matches!(actions.as_slice(), [ControllerAction::Show(n)] if n.tone == Tone::Prompt));

        let actions = line(&mut controller, "");
        assert_eq!(controller.state(), SessionState::CheckEmailVerification);
        assert!(matches!(actions.as_slice(), [ControllerAction::SignIn(_)]));
    }

    #[test]
    fn verification_send_failure_still_prompts() {
        let mut controller = fetching_user();
        let _ = controller.handle(ControllerEvent::SignedUp(Ok(user(false))));
        let _ = controller.handle(ControllerEvent::SignedIn(Ok(user(false))));
        let _ = controller.handle(ControllerEvent::CurrentUser(Ok(user(false))));

        let actions = controller.handle(ControllerEvent::VerificationSent(Err(
            AuthError::Rejected("TOO_MANY_ATTEMPTS_TRY_LATER".into()),
        )));

        assert_eq!(actions.len(), 2);
        assert_eq!(controller.state(), SessionState::RequestEmailVerification);
    }

    #[test]
    fn history_then_live_merge() {
        let mut controller = fetching_user();
        let _ = controller.handle(ControllerEvent::SignedUp(Ok(user(true))));
        let _ = controller.handle(ControllerEvent::SignedIn(Ok(user(true))));
        let _ = controller.handle(ControllerEvent::CurrentUser(Ok(user(true))));

        let actions = controller.handle(ControllerEvent::HistoryLoaded(Ok(vec![
            stored("k1", "m1"),
            stored("k2", "m2"),
        ])));
        assert_eq!(shown_bodies(&actions), ["m1", "m2"]);
        assert_eq!(actions.last(), Some(&ControllerAction::Subscribe));

        let _ = controller.handle(ControllerEvent::Subscribed(Ok(())));

        let actions = controller.handle(FeedEvent::Item(stored("k3", "m3")).into());
        assert_eq!(shown_bodies(&actions), ["m3"]);

        let actions = controller.handle(FeedEvent::Item(stored("k1", "m1")).into());
        assert!(actions.is_empty());

        let keys: Vec<_> =
            controller.known_messages().unwrap().keys().iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["k1", "k2", "k3"]);
    }

    #[test]
    fn chat_line_is_pushed_with_author() {
        let mut controller = chatting();

        let actions = line(&mut controller, "hello");
        assert_eq!(actions, vec![ControllerAction::Push(MessageDraft {
            author_email: "bob@x.co".into(),
            body: "hello".into(),
        })]);

        let actions = controller.handle(ControllerEvent::Pushed(Ok("k9".into())));
        assert!(actions.is_empty());
        assert_eq!(controller.state(), SessionState::GetMessage);
    }

    #[test]
    fn quit_only_from_chat() {
        let mut controller = Controller::new();
        let _ = controller.start();
        let actions = line(&mut controller, QUIT_COMMAND);
        assert!(!actions.contains(&ControllerAction::Quit));
        assert_eq!(controller.state(), SessionState::GetEmail);

        let mut controller = chatting();
        assert_eq!(line(&mut controller, QUIT_COMMAND), vec![ControllerAction::Quit]);
    }

    #[test]
    fn quit_is_a_short_password() {
        let mut controller = Controller::new();
        let _ = controller.start();
        let _ = line(&mut controller, "bob@x.co");
        assert_eq!(controller.state(), SessionState::GetPassword);

        let actions = line(&mut controller, QUIT_COMMAND);

        assert!(!actions.contains(&ControllerAction::Quit));
        assert!(
            actions.iter().any(|a| matches!(a, ControllerAction::Show(n) if n.tone == Tone::Error))
        );
        assert_eq!(controller.state(), SessionState::GetPassword);
    }

    #[test]
    fn quit_while_unverified_rechecks() {
        let mut controller = fetching_user();
        let _ = controller.handle(ControllerEvent::SignedUp(Ok(user(false))));
        let _ = controller.handle(ControllerEvent::SignedIn(Ok(user(false))));
        let _ = controller.handle(ControllerEvent::CurrentUser(Ok(user(false))));
        let _ = controller.handle(ControllerEvent::VerificationSent(Ok(())));
        assert_eq!(controller.state(), SessionState::RequestEmailVerification);

        let actions = line(&mut controller, QUIT_COMMAND);

        assert!(!actions.contains(&ControllerAction::Quit));
        assert!(matches!(actions.as_slice(), [ControllerAction::SignIn(_)]));
        assert_eq!(controller.state(), SessionState::CheckEmailVerification);
    }

    #[test]
    fn lines_only_handled_where_input_is_awaited() {
        let mut controller = fetching_user();
        assert!(!controller.state().awaits_input());
        assert!(line(&mut controller, "bob@x.co").is_empty());
        assert_eq!(controller.state(), SessionState::FetchUser);

        let mut controller = Controller::new();
        let _ = controller.start();
        assert!(controller.state().awaits_input());
        assert!(!line(&mut controller, "bob@x.co").is_empty());

        assert!(chatting().state().awaits_input());
    }

    #[test]
    fn push_failure_returns_to_prompt() {
        let mut controller = chatting();
        let _ = line(&mut controller, "hello");

        let actions =
            controller.handle(ControllerEvent::Pushed(Err(BackendError::Io("offline".into()))));

        assert!(matches!(&actions[0], ControllerAction::Show(n) if n.tone == Tone::Error));
        assert_eq!(controller.state(), SessionState::GetMessage);
    }

    #[test]
    fn load_failure_halts() {
        let mut controller = fetching_user();
        let _ = controller.handle(ControllerEvent::SignedUp(Ok(user(true))));
        let _ = controller.handle(ControllerEvent::SignedIn(Ok(user(true))));
        let _ = controller.handle(ControllerEvent::CurrentUser(Ok(user(true))));

        let error = BackendError::Io("offline".into());
        let actions = controller.handle(ControllerEvent::HistoryLoaded(Err(error.clone())));

        assert_eq!(actions.last(), Some(&ControllerAction::Halt(error)));
    }

    #[test]
    fn feed_before_history_is_dropped() {
        let mut controller = fetching_user();
        let actions = controller.handle(FeedEvent::Item(stored("k1", "early")).into());

        assert!(actions.is_empty());
        assert!(controller.known_messages().is_none());
    }

    #[test]
    fn outcome_for_other_state_is_ignored() {
        let mut controller = Controller::new();
        let _ = controller.start();

        let actions = controller.handle(ControllerEvent::SignedIn(Ok(user(true))));

        assert!(actions.is_empty());
        assert_eq!(controller.state(), SessionState::GetEmail);
    }
}
