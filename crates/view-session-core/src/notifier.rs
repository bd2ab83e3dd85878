//! Lost-contact notification.

use crate::ViewIdentity;

/// Message shown when contact with the server is lost.
pub const LOST_CONTACT_MESSAGE: &str =
    "Lost contact with the server. Reload the page to reconnect.";

/// Trait for surfacing a lost session to the user.
///
/// Implement this trait to put a blocking, non-dismissible indicator in
/// front of the user. The client calls it at most once per lifetime.
pub trait LostContactNotifier: Send + Sync {
    /// Contact with the server behind `identity` has been lost.
    fn contact_lost(&self, identity: &ViewIdentity);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

impl LostContactNotifier for TracingNotifier {
    fn contact_lost(&self, identity: &ViewIdentity) {
        tracing::error!(
            view = %identity.view_name,
            session_id = identity.session_id().unwrap_or_default(),
            "{LOST_CONTACT_MESSAGE}"
        );
    }
}

impl<F> LostContactNotifier for F
where
    F: Fn(&ViewIdentity) + Send + Sync,
{
    fn contact_lost(&self, identity: &ViewIdentity) {
        self(identity);
    }
}
