//! Heartbeat liveness state machine.
//!
//! `Active -> Retrying(1..=max) -> LostContact` on consecutive failures,
//! `Retrying(n) -> Active` on any success. `LostContact` is absorbing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::SessionConfig;

/// Result of one heartbeat exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatOutcome {
    Succeeded,
    Failed,
}

/// Liveness of a tracked session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LivenessState {
    /// Last heartbeat succeeded.
    #[default]
    Active,
    /// `failures` consecutive heartbeats have failed.
    Retrying { failures: u32 },
    /// Too many consecutive failures. No further traffic.
    LostContact,
}

impl LivenessState {
    /// State after a heartbeat with `outcome`.
    #[must_use]
    pub const fn on_heartbeat(self, outcome: HeartbeatOutcome, max_failures: u32) -> Self {
        match (self, outcome) {
            (Self::LostContact, _) => Self::LostContact,
            (_, HeartbeatOutcome::Succeeded) => Self::Active,
            (Self::Active, HeartbeatOutcome::Failed) => Self::escalate(1, max_failures),
            (Self::Retrying { failures }, HeartbeatOutcome::Failed) => {
                Self::escalate(failures.saturating_add(1), max_failures)
            }
        }
    }

    const fn escalate(failures: u32, max_failures: u32) -> Self {
        if failures <= max_failures {
            Self::Retrying { failures }
        } else {
            Self::LostContact
        }
    }

    /// Consecutive failures counted so far, or `None` once contact is lost.
    #[must_use]
    pub const fn failures(self) -> Option<u32> {
        match self {
            Self::Active => Some(0),
            Self::Retrying { failures } => Some(failures),
            Self::LostContact => None,
        }
    }

    /// Whether contact has been lost.
    #[must_use]
    pub const fn is_lost_contact(self) -> bool {
        matches!(self, Self::LostContact)
    }

    /// Delay before the next heartbeat, or `None` once contact is lost.
    #[must_use]
    pub const fn next_heartbeat_in(self, config: &SessionConfig) -> Option<Duration> {
        match self {
            Self::Active => Some(config.normal_interval),
            Self::Retrying { .. } => Some(config.retry_interval),
            Self::LostContact => None,
        }
    }
}
