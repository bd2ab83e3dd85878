//! Session client: heartbeats, lost-contact handling and dispatch.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use view_session_core::{
    HeartbeatOutcome, LivenessState, LostContactNotifier, Payload, Response, SessionConfig,
    TracingNotifier, Transport, TransportError, ViewIdentity, protocol::HEARTBEAT_METHOD,
};

use crate::{DispatchError, PollSchedule, RequestDispatcher};

/// Settings for one application call.
#[derive(Debug, Clone, Default)]
pub struct RequestSettings {
    /// Explicit address. Defaults to `view_name/method_name`.
    pub address: Option<String>,
    /// Request payload. The session tag is added on send.
    pub payload: Payload,
}

impl RequestSettings {
    /// Empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Send to `address` instead of the derived one.
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Add a payload field.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }
}

type SuccessHandler = Box<dyn FnOnce(Response) + Send>;
type ErrorHandler = Box<dyn FnOnce(TransportError) + Send>;

/// Completion callbacks for [`SessionClient::dispatch`].
#[derive(Default)]
pub struct ResponseHandlers {
    on_success: Option<SuccessHandler>,
    on_error: Option<ErrorHandler>,
}

impl ResponseHandlers {
    /// No callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once with the final response.
    #[must_use]
    pub fn on_success(mut self, f: impl FnOnce(Response) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Called if the initial exchange fails.
    #[must_use]
    pub fn on_error(mut self, f: impl FnOnce(TransportError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

/// Builder for [`SessionClient`].
pub struct SessionClientBuilder {
    identity: ViewIdentity,
    config: SessionConfig,
    notifier: Option<Arc<dyn LostContactNotifier>>,
}

impl SessionClientBuilder {
    /// Start building a client for `view_name`.
    #[must_use]
    pub fn new(view_name: impl Into<String>) -> Self {
        Self {
            identity: ViewIdentity::new(view_name),
            config: SessionConfig::default(),
            notifier: None,
        }
    }

    /// Track the view under `session_id`.
    #[must_use]
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.identity.session_id = Some(session_id.into());
        self
    }

    /// Override timing and thresholds.
    #[must_use]
    pub const fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the lost-contact notifier. Defaults to [`TracingNotifier`].
    #[must_use]
    pub fn notifier(mut self, notifier: impl LostContactNotifier + 'static) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Build the client and start heartbeating if the view is tracked.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn build<T: Transport + 'static>(self, transport: Arc<T>) -> SessionClient {
        let lost_contact = CancellationToken::new();
        let dispatcher = RequestDispatcher::new(
            self.identity,
            transport,
            PollSchedule::from_config(&self.config),
            lost_contact.clone(),
        );

        let inner = Arc::new(Inner {
            dispatcher,
            config: self.config,
            state: Mutex::new(LivenessState::Active),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
            lost_contact,
        });

        let heartbeat = inner
            .dispatcher
            .identity()
            .is_tracked()
            .then(|| tokio::spawn(run_heartbeat(Arc::clone(&inner))));

        SessionClient { inner, heartbeat }
    }
}

struct Inner {
    dispatcher: RequestDispatcher,
    config: SessionConfig,
    state: Mutex<LivenessState>,
    notifier: Arc<dyn LostContactNotifier>,
    lost_contact: CancellationToken,
}

impl Inner {
    fn liveness(&self) -> LivenessState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a heartbeat outcome, returning the previous and new state.
    fn record(&self, outcome: HeartbeatOutcome) -> (LivenessState, LivenessState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = *state;
        *state = previous.on_heartbeat(outcome, self.config.max_failures);
        (previous, *state)
    }

    fn lose_contact(&self) {
        self.lost_contact.cancel();
        let identity = self.dispatcher.identity();
        tracing::error!(
            view = %identity.view_name,
            max_failures = self.config.max_failures,
            "Lost contact with server"
        );
        self.notifier.contact_lost(identity);
    }

    async fn call(&self, method: &str, settings: RequestSettings) -> Result<Response, DispatchError> {
        if self.liveness().is_lost_contact() {
            tracing::debug!(method, "Suppressing call after lost contact");
            return Err(DispatchError::LostContact);
        }

        let address = settings
            .address
            .unwrap_or_else(|| self.dispatcher.identity().address_of(method));
        self.dispatcher.send(&address, settings.payload).await
    }
}

async fn run_heartbeat(inner: Arc<Inner>) {
    let address = inner.dispatcher.identity().address_of(HEARTBEAT_METHOD);
    let mut delay = std::time::Duration::ZERO;

    loop {
        tokio::time::sleep(delay).await;

        let outcome = match inner.dispatcher.exchange(&address, Payload::new()).await {
            Ok(_) => HeartbeatOutcome::Succeeded,
            Err(e) => {
                tracing::warn!("Heartbeat failed: {e}");
                HeartbeatOutcome::Failed
            }
        };

        let (previous, next) = inner.record(outcome);
        tracing::debug!(?previous, ?next, "Heartbeat recorded");

        match next.next_heartbeat_in(&inner.config) {
            Some(next_delay) => delay = next_delay,
            None => {
                if !previous.is_lost_contact() {
                    inner.lose_contact();
                }
                break;
            }
        }
    }
}

/// Client for one server-bound view.
///
/// Keeps the view's session alive with heartbeats and routes application
/// calls to it, resolving deferred responses before returning. After too
/// many consecutive heartbeat failures the client loses contact for good:
/// the notifier is told once and all further traffic is refused.
///
/// Dropping the client stops the heartbeat.
pub struct SessionClient {
    inner: Arc<Inner>,
    heartbeat: Option<JoinHandle<()>>,
}

impl SessionClient {
    /// Start building a client for `view_name`.
    #[must_use]
    pub fn builder(view_name: impl Into<String>) -> SessionClientBuilder {
        SessionClientBuilder::new(view_name)
    }

    /// Identity of the view.
    #[must_use]
    pub fn identity(&self) -> &ViewIdentity {
        self.inner.dispatcher.identity()
    }

    /// Current liveness.
    #[must_use]
    pub fn liveness(&self) -> LivenessState {
        self.inner.liveness()
    }

    /// Whether contact with the server has been lost.
    #[must_use]
    pub fn is_lost_contact(&self) -> bool {
        self.liveness().is_lost_contact()
    }

    /// Call `method` on the view and wait for its final response.
    ///
    /// # Errors
    /// Returns `LostContact` if contact is lost before or during the call,
    /// or the transport error if the initial exchange fails.
    pub async fn call(&self, method: &str, settings: RequestSettings) -> Result<Response, DispatchError> {
        self.inner.call(method, settings).await
    }

    /// Call `method` in the background, reporting through `handlers`.
    ///
    /// Returns `None` without sending anything once contact is lost.
    /// Otherwise `on_success` runs exactly once with the final response,
    /// or `on_error` runs if the initial exchange fails. A chain abandoned
    /// by a later loss of contact calls neither.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn dispatch(
        &self,
        method: &str,
        settings: RequestSettings,
        handlers: ResponseHandlers,
    ) -> Option<JoinHandle<()>> {
        if self.is_lost_contact() {
            tracing::debug!(method, "Suppressing dispatch after lost contact");
            return None;
        }

        let inner = Arc::clone(&self.inner);
        let method = method.to_string();
        Some(tokio::spawn(async move {
            match inner.call(&method, settings).await {
                Ok(response) => {
                    if let Some(on_success) = handlers.on_success {
                        on_success(response);
                    }
                }
                Err(DispatchError::Transport(e)) => {
                    if let Some(on_error) = handlers.on_error {
                        on_error(e);
                    }
                }
                Err(DispatchError::LostContact) => {
                    tracing::debug!(method = %method, "Dispatch abandoned after lost contact");
                }
            }
        }))
    }
}

impl Drop for SessionClient {
    fn drop(&mut self) {
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.abort();
        }
    }
}
