//! Core types for view session liveness and deferred responses.
//!
//! This crate provides the fundamental building blocks:
//! - `ViewIdentity` - View name plus optional server-side session id
//! - `Response` / `Payload` - Wire shapes and deferred-execution classification
//! - `LivenessState` - Heartbeat state machine as pure transitions
//! - `SessionConfig` - Heartbeat and polling intervals
//! - `Transport` and `LostContactNotifier` traits

pub mod config;
pub mod identity;
pub mod liveness;
pub mod notifier;
pub mod protocol;
pub mod traits;

pub use config::SessionConfig;
pub use identity::ViewIdentity;
pub use liveness::{HeartbeatOutcome, LivenessState};
pub use notifier::{LostContactNotifier, TracingNotifier};
pub use protocol::{Classification, Payload, Response};
pub use traits::{Transport, TransportError};
