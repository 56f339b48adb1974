use chrono::{DateTime, Utc};

use crate::model::{UserId, Username};

/// Who is signed in on a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: Username,
}

/// Per-client authentication state.
///
/// Anonymous when `identity` is `None`. The session guard owns every
/// transition; this type only stores the state between interactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<Identity>,
    last_active: Option<DateTime<Utc>>,
}

impl Session {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn last_active(&self) -> Option<DateTime<Utc>> {
        self.last_active
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Enter the authenticated state and start the activity clock.
    pub fn sign_in(&mut self, identity: Identity, at: DateTime<Utc>) {
        self.identity = Some(identity);
        self.last_active = Some(at);
    }

    /// Record activity without changing the identity.
    pub fn mark_active(&mut self, at: DateTime<Utc>) {
        self.last_active = Some(at);
    }

    /// Return to the anonymous state.
    pub fn clear(&mut self) {
        self.identity = None;
        self.last_active = None;
    }
}
