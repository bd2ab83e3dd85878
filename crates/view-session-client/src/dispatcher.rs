//! Single request/response exchanges against a view endpoint.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use view_session_core::{
    Classification, Payload, Response, Transport, TransportError, ViewIdentity,
    protocol::SESSION_ID_KEY,
};

use crate::poller::{DeferredJobPoller, PollSchedule};

/// Dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Lost contact with the server")]
    LostContact,
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Issues exchanges for one view and resolves deferred responses.
///
/// Every outgoing payload is tagged with the session id when the view is
/// tracked. Once `lost_contact` is cancelled nothing further is sent.
pub struct RequestDispatcher {
    identity: ViewIdentity,
    transport: Arc<dyn Transport>,
    lost_contact: CancellationToken,
    poller: DeferredJobPoller,
}

impl RequestDispatcher {
    /// Create a new dispatcher.
    #[must_use]
    pub fn new(
        identity: ViewIdentity,
        transport: Arc<dyn Transport>,
        schedule: PollSchedule,
        lost_contact: CancellationToken,
    ) -> Self {
        let poller = DeferredJobPoller::new(schedule, lost_contact.clone());
        Self {
            identity,
            transport,
            lost_contact,
            poller,
        }
    }

    /// Identity requests are sent for.
    #[must_use]
    pub const fn identity(&self) -> &ViewIdentity {
        &self.identity
    }

    /// Stamp `payload` with the session id, if there is one.
    pub fn tag(&self, payload: &mut Payload) {
        if let Some(id) = self.identity.session_id() {
            payload.insert(SESSION_ID_KEY.to_string(), id.into());
        }
    }

    /// Perform one tagged exchange without deferred resolution.
    ///
    /// # Errors
    /// Returns `LostContact` if contact was lost before sending, or the
    /// transport error if the exchange failed.
    pub async fn exchange(&self, address: &str, mut payload: Payload) -> Result<Response, DispatchError> {
        if self.lost_contact.is_cancelled() {
            return Err(DispatchError::LostContact);
        }

        self.tag(&mut payload);
        tracing::trace!(address, "Sending request");
        Ok(self.transport.exchange(address, &payload).await?)
    }

    /// Perform one exchange and return its final response.
    ///
    /// A deferred response is not returned; the job it names is polled
    /// until a final response arrives.
    ///
    /// # Errors
    /// Returns the transport error if the initial exchange failed, or
    /// `LostContact` if contact was lost before a final response arrived.
    pub async fn send(&self, address: &str, payload: Payload) -> Result<Response, DispatchError> {
        let response = self.exchange(address, payload).await?;

        match response.classify() {
            Classification::Final => Ok(response),
            Classification::Deferred { job_id } => {
                tracing::debug!(address, job_id = %job_id, "Response deferred");
                self.poller.resolve(self, job_id).await
            }
        }
    }
}
