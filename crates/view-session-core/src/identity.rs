//! Identity of a server-bound view.

use serde::{Deserialize, Serialize};

/// Identity of a view instance on the server.
///
/// A view without a session id is not tracked server-side: the client
/// sends no heartbeats for it and never tags its payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewIdentity {
    /// Name of the view, used as the first address segment.
    pub view_name: String,

    /// Server-side session id, if the view is tracked.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ViewIdentity {
    /// Create an identity for an untracked view.
    #[must_use]
    pub fn new(view_name: impl Into<String>) -> Self {
        Self {
            view_name: view_name.into(),
            session_id: None,
        }
    }

    /// Create an identity for a view tracked under `session_id`.
    #[must_use]
    pub fn with_session_id(view_name: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            view_name: view_name.into(),
            session_id: Some(session_id.into()),
        }
    }

    /// Session id, if any. Empty ids count as absent.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Whether the server tracks this view.
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.session_id().is_some()
    }

    /// Address of `method_name` on this view.
    #[must_use]
    pub fn address_of(&self, method_name: &str) -> String {
        format!("{}/{method_name}", self.view_name)
    }
}
