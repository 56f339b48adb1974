use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;

use crate::model::ids::UserId;

/// Minimum accepted length for a new password, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Longest password bcrypt can tell apart, in bytes. Later bytes are ignored.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("username cannot be empty")]
    EmptyUsername,

    #[error("email cannot be empty")]
    EmptyEmail,

    #[error("email address is not valid")]
    InvalidEmail,

    #[error("password cannot be empty")]
    EmptyPassword,

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("password must be at most {max} bytes")]
    PasswordTooLong { max: usize },

    #[error("password confirmation does not match")]
    PasswordMismatch,
}

/// Trimmed, non-empty login name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// # Errors
    ///
    /// Returns `UserError::EmptyUsername` if the name is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, UserError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserError::EmptyUsername);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Syntactically valid email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// # Errors
    ///
    /// Returns `UserError::EmptyEmail` for blank input and
    /// `UserError::InvalidEmail` when the address does not look like `local@domain.tld`.
    pub fn parse(value: impl Into<String>) -> Result<Self, UserError> {
        static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserError::EmptyEmail);
        }
        let regex = EMAIL_REGEX.get_or_init(|| {
            Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").expect("email regex should compile")
        });
        if !regex.is_match(trimmed) {
            return Err(UserError::InvalidEmail);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks a new password and its confirmation before it is hashed.
///
/// # Errors
///
/// Returns `EmptyPassword`, `PasswordTooShort`, `PasswordTooLong` or
/// `PasswordMismatch`.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), UserError> {
    if password.is_empty() {
        return Err(UserError::EmptyPassword);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(UserError::PasswordTooLong {
            max: MAX_PASSWORD_BYTES,
        });
    }
    if password != confirmation {
        return Err(UserError::PasswordMismatch);
    }
    Ok(())
}

/// A registered account.
///
/// The password hash is kept out of `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: Username,
    email: Email,
    full_name: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl User {
    /// Rehydrate a user from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if the stored username or email no longer validates.
    pub fn from_persisted(
        id: UserId,
        username: impl Into<String>,
        email: impl Into<String>,
        full_name: Option<String>,
        password_hash: String,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        Ok(Self {
            id,
            username: Username::new(username)?,
            email: Email::parse(email)?,
            full_name: normalize_full_name(full_name),
            password_hash,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> &Username {
        &self.username
    }

    #[must_use]
    pub fn email(&self) -> &Email {
        &self.email
    }

    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    #[must_use]
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Blank names are stored as absent.
#[must_use]
pub fn normalize_full_name(value: Option<String>) -> Option<String> {
    value
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}
