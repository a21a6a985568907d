//! Generic runtime for session orchestration.
//!
//! The Runtime drives the session event loop, coordinating between:
//! - [`Controller`]: session state machine
//! - [`Gateway`]: auth and data-store backend
//! - [`Driver`]: platform-specific terminal I/O
//!
//! Two producers feed the controller: the driver's line input and the live
//! message feed. The runtime is their single consumer. It waits on both only
//! while the action queue is empty, so a feed event is never applied while a
//! handler's backend call is in flight.

use std::collections::VecDeque;

use parlor_core::{
    BackendError, FeedReceiver, FeedSink, Gateway, Message, Subscription, feed_channel,
};
use thiserror::Error;

use crate::{Controller, ControllerAction, ControllerEvent, Driver, LineInput};

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError<E: std::error::Error + 'static> {
    /// Terminal I/O failed.
    #[error("driver error: {0}")]
    Driver(#[source] E),

    /// A data-store call failed and the session cannot continue.
    #[error("backend failure: {0}")]
    Backend(#[from] BackendError),
}

/// Why the runtime stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The user typed the quit command.
    Quit,
    /// The user interrupted input.
    Interrupted,
    /// Input ended.
    InputClosed,
}

impl Exit {
    /// Process exit status for this outcome.
    pub fn code(self) -> i32 {
        match self {
            Self::Quit => 0,
            Self::Interrupted | Self::InputClosed => 130,
        }
    }
}

/// What executing one action produced.
enum Step {
    /// Nothing for the controller.
    Done,
    /// A backend outcome the controller must see next.
    Outcome(ControllerEvent),
    /// Stop the runtime.
    Exit(Exit),
}

/// Generic runtime that orchestrates Controller, Gateway, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific terminal driver
/// - `G`: Backend gateway
pub struct Runtime<D, G>
where
    D: Driver,
    G: Gateway,
{
    driver: D,
    gateway: G,
    controller: Controller,
    topic: String,
    feed_sink: FeedSink,
    feed: FeedReceiver,
    subscription: Option<Subscription>,
}

impl<D, G> Runtime<D, G>
where
    D: Driver,
    G: Gateway,
{
    /// Create a runtime chatting in `topic`.
    pub fn new(driver: D, gateway: G, topic: impl Into<String>) -> Self {
        let (feed_sink, feed) = feed_channel();
        Self {
            driver,
            gateway,
            controller: Controller::new(),
            topic: topic.into(),
            feed_sink,
            feed,
            subscription: None,
        }
    }

    /// Run the session until the user quits or input ends.
    ///
    /// This is the core orchestration loop that:
    /// 1. Runs the controller's entry action
    /// 2. Waits for either a line or a live feed event
    /// 3. Hands the event to the controller
    /// 4. Executes the resulting actions, awaiting each backend call and
    ///    feeding its outcome back before anything else runs
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails, or if a data-store call fails in
    /// a way the session cannot recover from.
    pub async fn run(&mut self) -> Result<Exit, RuntimeError<D::Error>> {
        let actions = self.controller.start();
        if let Some(exit) = self.process_actions(actions).await? {
            return Ok(self.stop(exit));
        }

        loop {
            let event = tokio::select! {
                biased;

                Some(feed_event) = self.feed.recv() => ControllerEvent::Feed(feed_event),

                input = self.driver.next_line() => match input.map_err(RuntimeError::Driver)? {
                    LineInput::Line(line) => ControllerEvent::Line(line),
                    LineInput::Interrupted => return Ok(self.stop(Exit::Interrupted)),
                    LineInput::Closed => return Ok(self.stop(Exit::InputClosed)),
                },
            };

            let actions = self.controller.handle(event);
            if let Some(exit) = self.process_actions(actions).await? {
                return Ok(self.stop(exit));
            }
        }
    }

    /// Process actions returned by the controller.
    ///
    /// Follow-up actions of a backend outcome run before the remaining ones,
    /// so chained states complete in the order the controller entered them.
    async fn process_actions(
        &mut self,
        initial_actions: Vec<ControllerAction>,
    ) -> Result<Option<Exit>, RuntimeError<D::Error>> {
        let mut pending: VecDeque<ControllerAction> = initial_actions.into();

        while let Some(action) = pending.pop_front() {
            match self.execute(action).await? {
                Step::Done => {},
                Step::Exit(exit) => return Ok(Some(exit)),
                Step::Outcome(event) => {
                    let follow_up = self.controller.handle(event);
                    for action in follow_up.into_iter().rev() {
                        pending.push_front(action);
                    }
                },
            }
        }
        Ok(None)
    }

    async fn execute(&mut self, action: ControllerAction) -> Result<Step, RuntimeError<D::Error>> {
        let outcome = match action {
            ControllerAction::Show(notice) => {
                self.driver.show_notice(&notice).map_err(RuntimeError::Driver)?;
                return Ok(Step::Done);
            },
            ControllerAction::ShowMessage(message) => {
                self.driver.show_message(&message).map_err(RuntimeError::Driver)?;
                return Ok(Step::Done);
            },
            ControllerAction::SetMaskedEcho(masked) => {
                self.driver.set_masked_echo(masked).map_err(RuntimeError::Driver)?;
                return Ok(Step::Done);
            },
            ControllerAction::Quit => return Ok(Step::Exit(Exit::Quit)),
            ControllerAction::Halt(error) => return Err(RuntimeError::Backend(error)),

            ControllerAction::SignUp(credentials) => {
                ControllerEvent::SignedUp(self.gateway.sign_up(&credentials).await)
            },
            ControllerAction::SignIn(credentials) => {
                ControllerEvent::SignedIn(self.gateway.sign_in(&credentials).await)
            },
            ControllerAction::FetchCurrentUser => {
                ControllerEvent::CurrentUser(self.gateway.current_user().await)
            },
            ControllerAction::SendVerification(user) => {
                ControllerEvent::VerificationSent(self.gateway.send_verification_email(&user).await)
            },
            ControllerAction::LoadHistory => {
                ControllerEvent::HistoryLoaded(self.gateway.load_all(&self.topic).await)
            },
            ControllerAction::Subscribe => {
                let result = self.gateway.subscribe(&self.topic, self.feed_sink.clone()).await;
                ControllerEvent::Subscribed(result.map(|subscription| {
                    self.subscription = Some(subscription);
                }))
            },
            ControllerAction::Push(draft) => {
                let message = Message::new(draft.author_email, draft.body, self.driver.now());
                ControllerEvent::Pushed(self.gateway.push(&self.topic, &message).await)
            },
        };

        tracing::debug!(?outcome, "backend call finished");
        Ok(Step::Outcome(outcome))
    }

    fn stop(&mut self, exit: Exit) -> Exit {
        tracing::info!(?exit, state = %self.controller.state(), "session ended");
        if let Some(subscription) = self.subscription.take() {
            subscription.stop();
        }
        exit
    }

    /// The session state machine.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// The terminal driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The backend gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}
