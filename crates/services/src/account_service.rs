use std::sync::Arc;

use fitness_core::model::{
    Email, User, UserId, Username, normalize_full_name, validate_new_password,
};
use storage::repository::{NewUserRecord, UniqueField, UserRepository};
use tracing::info;

use crate::Clock;
use crate::credentials::CredentialStore;
use crate::error::AccountError;
use crate::session_guard::ActiveUser;

/// Input of the sign-up form.
#[derive(Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

impl std::fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

/// Registration and self-service profile management.
#[derive(Clone)]
pub struct AccountService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    credentials: CredentialStore,
}

impl AccountService {
    #[must_use]
    pub fn new(clock: Clock, users: Arc<dyn UserRepository>, credentials: CredentialStore) -> Self {
        Self {
            clock,
            users,
            credentials,
        }
    }

    /// Create an account. Nothing is stored unless every check passes.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Validation` for a blank username, a malformed
    /// email, or a short or mismatched password.
    /// Returns `AccountError::Conflict` if the username or email is taken.
    pub async fn register(&self, form: RegistrationForm) -> Result<UserId, AccountError> {
        let username = Username::new(form.username)?;
        let email = Email::parse(form.email)?;
        validate_new_password(&form.password, &form.confirm_password)?;

        if self.users.find_by_username(username.as_str()).await?.is_some() {
            return Err(AccountError::Conflict(UniqueField::Username));
        }
        if self.users.find_by_email(email.as_str()).await?.is_some() {
            return Err(AccountError::Conflict(UniqueField::Email));
        }

        let password_hash = self.credentials.hash(&form.password)?;
        let user_id = self
            .users
            .insert_user(NewUserRecord {
                username: username.clone(),
                email,
                full_name: normalize_full_name(form.full_name),
                password_hash,
                created_at: self.clock.now(),
            })
            .await?;

        info!(%user_id, username = username.as_str(), "registered account");
        Ok(user_id)
    }

    /// # Errors
    ///
    /// Returns `AccountError::NotFound` if the account no longer exists.
    pub async fn profile(&self, user: &ActiveUser<'_>) -> Result<User, AccountError> {
        self.users
            .get_user(user.user_id())
            .await?
            .ok_or(AccountError::NotFound)
    }

    /// Change display name and email.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Validation` for a malformed email and
    /// `AccountError::Conflict` if another account already uses it.
    pub async fn update_profile(
        &self,
        user: &ActiveUser<'_>,
        full_name: Option<String>,
        email: &str,
    ) -> Result<User, AccountError> {
        let email = Email::parse(email)?;
        if let Some(owner) = self.users.find_by_email(email.as_str()).await? {
            if owner.id() != user.user_id() {
                return Err(AccountError::Conflict(UniqueField::Email));
            }
        }

        self.users
            .update_profile(user.user_id(), normalize_full_name(full_name), &email)
            .await?;
        self.profile(user).await
    }

    /// Replace the password after re-checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidCredentials` if `current` is wrong, and
    /// `AccountError::Validation` if the new password is too short or its
    /// confirmation differs.
    pub async fn change_password(
        &self,
        user: &ActiveUser<'_>,
        current: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<(), AccountError> {
        let stored = self.profile(user).await?;
        if !self.credentials.verify(current, stored.password_hash()) {
            return Err(AccountError::InvalidCredentials);
        }
        validate_new_password(new_password, confirmation)?;

        let password_hash = self.credentials.hash(new_password)?;
        self.users
            .update_password_hash(user.user_id(), &password_hash)
            .await?;
        info!(user_id = %user.user_id(), "changed password");
        Ok(())
    }
}
