//! Heartbeat-driven view session client.
//!
//! Provides:
//! - `SessionClient` - Keeps a view session alive and dispatches calls
//! - `RequestDispatcher` - Tags requests and resolves deferred responses
//! - `DeferredJobPoller` - Polls a deferred job until its result is ready

pub mod dispatcher;
pub mod poller;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::{DispatchError, RequestDispatcher};
pub use poller::{DeferredJob, DeferredJobPoller, PollSchedule, PollStep};
pub use session::{RequestSettings, ResponseHandlers, SessionClient, SessionClientBuilder};
