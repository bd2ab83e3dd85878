//! Polling of deferred-execution jobs.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use view_session_core::{
    Classification, Response, SessionConfig,
    protocol::{DEFERRED_RESPONSE_METHOD, deferred_status_payload},
};

use crate::{DispatchError, RequestDispatcher};

/// Why the next poll is being scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// First poll after the original response was deferred.
    Initial,
    /// The previous poll was deferred again.
    StillDeferred,
    /// The previous poll failed at the transport level.
    TransportFailed,
}

/// Delay before each poll, keyed by [`PollStep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub initial: Duration,
    pub still_deferred: Duration,
    pub transport_failed: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

impl PollSchedule {
    /// Schedule from the deferred-poll settings of `config`.
    #[must_use]
    pub const fn from_config(config: &SessionConfig) -> Self {
        Self {
            initial: config.deferred_fast_poll,
            still_deferred: config.deferred_poll,
            transport_failed: config.deferred_error_poll,
        }
    }

    /// Delay before a poll made for `step`.
    #[must_use]
    pub const fn delay(&self, step: PollStep) -> Duration {
        match step {
            PollStep::Initial => self.initial,
            PollStep::StillDeferred => self.still_deferred,
            PollStep::TransportFailed => self.transport_failed,
        }
    }
}

/// One outstanding deferred job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredJob {
    /// Job id named by the deferred response.
    pub job_id: String,
    /// Delay before the next poll.
    pub poll_interval: Duration,
    /// Polls issued so far.
    pub attempts: u32,
}

impl DeferredJob {
    /// Job awaiting its first poll.
    #[must_use]
    pub fn new(job_id: impl Into<String>, schedule: &PollSchedule) -> Self {
        Self {
            job_id: job_id.into(),
            poll_interval: schedule.delay(PollStep::Initial),
            attempts: 0,
        }
    }

    fn reschedule(&mut self, schedule: &PollSchedule, step: PollStep) {
        self.poll_interval = schedule.delay(step);
    }
}

/// Polls deferred jobs until they produce a final response.
///
/// There is no retry limit. A chain stops on a final response or when the
/// session loses contact, in which case the pending wait is cut short and
/// the job is abandoned.
pub struct DeferredJobPoller {
    schedule: PollSchedule,
    lost_contact: CancellationToken,
}

impl DeferredJobPoller {
    /// Create a new poller.
    #[must_use]
    pub const fn new(schedule: PollSchedule, lost_contact: CancellationToken) -> Self {
        Self {
            schedule,
            lost_contact,
        }
    }

    /// Poll `job_id` through `dispatcher` until a final response arrives.
    ///
    /// # Errors
    /// Returns `LostContact` if contact was lost first. Transport errors are
    /// retried, never returned.
    pub async fn resolve(
        &self,
        dispatcher: &RequestDispatcher,
        job_id: String,
    ) -> Result<Response, DispatchError> {
        let address = dispatcher.identity().address_of(DEFERRED_RESPONSE_METHOD);
        let mut job = DeferredJob::new(job_id, &self.schedule);

        loop {
            tokio::select! {
                () = self.lost_contact.cancelled() => {
                    tracing::debug!(job_id = %job.job_id, attempts = job.attempts, "Abandoning deferred job");
                    return Err(DispatchError::LostContact);
                }
                () = tokio::time::sleep(job.poll_interval) => {}
            }

            job.attempts += 1;
            let outcome = dispatcher
                .exchange(&address, deferred_status_payload(&job.job_id))
                .await;

            let step = match outcome {
                Ok(response) => match response.classify() {
                    Classification::Final => {
                        tracing::debug!(job_id = %job.job_id, attempts = job.attempts, "Deferred job resolved");
                        return Ok(response);
                    }
                    Classification::Deferred { .. } => PollStep::StillDeferred,
                },
                Err(DispatchError::Transport(e)) => {
                    tracing::warn!(job_id = %job.job_id, "Deferred poll failed: {e}");
                    PollStep::TransportFailed
                }
                Err(DispatchError::LostContact) => return Err(DispatchError::LostContact),
            };

            job.reschedule(&self.schedule, step);
            tracing::trace!(job_id = %job.job_id, ?step, delay = ?job.poll_interval, "Polling again");
        }
    }
}
