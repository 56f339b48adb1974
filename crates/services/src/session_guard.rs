use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use fitness_core::model::{Identity, Session, UserId, Username};
use storage::repository::UserRepository;
use tracing::{info, warn};

use crate::config::SessionPolicy;
use crate::credentials::CredentialStore;
use crate::error::AuthError;

/// Compared against when the username is unknown, so a miss costs one bcrypt
/// verification like a wrong password does.
const DUMMY_PASSWORD: &str = "fitness-tracker-dummy-password";

/// Proof that a session passed the inactivity check.
///
/// Only [`SessionGuard::touch`] hands these out, and every user-scoped
/// service call takes one. The token borrows the session it came from, so
/// the session cannot be logged out or touched again while it is held.
///
/// ```compile_fail
/// # use chrono::{DateTime, Utc};
/// # use fitness_core::model::Session;
/// # use services::SessionGuard;
/// fn use_after_logout(guard: &SessionGuard, session: &mut Session, now: DateTime<Utc>) {
///     let active = guard.touch(session, now).unwrap();
///     guard.logout(session);
///     let _ = active.user_id();
/// }
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct ActiveUser<'s> {
    identity: Identity,
    _session: PhantomData<&'s Session>,
}

impl ActiveUser<'_> {
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }

    #[must_use]
    pub fn username(&self) -> &Username {
        &self.identity.username
    }
}

#[cfg(test)]
impl ActiveUser<'static> {
    pub(crate) fn for_tests(user_id: UserId, username: &str) -> Self {
        Self {
            identity: Identity {
                user_id,
                username: Username::new(username).expect("test username"),
            },
            _session: PhantomData,
        }
    }
}

/// Drives `Session` through sign-in, activity checks and sign-out.
#[derive(Clone)]
pub struct SessionGuard {
    users: Arc<dyn UserRepository>,
    credentials: CredentialStore,
    policy: SessionPolicy,
    dummy_hash: OnceLock<String>,
}

impl SessionGuard {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        credentials: CredentialStore,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            users,
            credentials,
            policy,
            dummy_hash: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Sign `session` in as `username` if the password matches.
    ///
    /// The session is left untouched on failure.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown user or a wrong
    /// password alike, and `AuthError::Storage` if the lookup fails.
    pub async fn authenticate(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Identity, AuthError> {
        let user = match self.users.find_by_username(username.trim()).await? {
            Some(user) => self
                .credentials
                .verify(password, user.password_hash())
                .then_some(user),
            None => {
                let _ = self.credentials.verify(password, self.dummy_hash());
                None
            }
        };
        let Some(user) = user else {
            warn!(username = username.trim(), "failed sign-in attempt");
            return Err(AuthError::InvalidCredentials);
        };

        let identity = Identity {
            user_id: user.id(),
            username: user.username().clone(),
        };
        session.sign_in(identity.clone(), now);
        info!(user_id = %identity.user_id, "signed in");
        Ok(identity)
    }

    /// Check inactivity and record activity at `now`.
    ///
    /// An idle gap strictly longer than the policy timeout clears the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` for an anonymous session and
    /// `AuthError::SessionExpired` when the timeout has passed.
    pub fn touch<'s>(
        &self,
        session: &'s mut Session,
        now: DateTime<Utc>,
    ) -> Result<ActiveUser<'s>, AuthError> {
        let Some(identity) = session.identity().cloned() else {
            return Err(AuthError::NotAuthenticated);
        };

        if let Some(last_active) = session.last_active() {
            if now - last_active > self.policy.timeout() {
                session.clear();
                info!(user_id = %identity.user_id, "session expired after inactivity");
                return Err(AuthError::SessionExpired);
            }
        }

        session.mark_active(now);
        Ok(ActiveUser {
            identity,
            _session: PhantomData,
        })
    }

    /// Return the session to anonymous. Safe to call on an anonymous session.
    pub fn logout(&self, session: &mut Session) {
        if let Some(identity) = session.identity() {
            info!(user_id = %identity.user_id, "signed out");
        }
        session.clear();
    }

    fn dummy_hash(&self) -> &str {
        self.dummy_hash
            .get_or_init(|| self.credentials.hash(DUMMY_PASSWORD).unwrap_or_default())
    }
}
