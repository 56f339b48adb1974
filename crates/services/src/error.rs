//! Shared error types for the services crate.
//!
//! Every error reports an [`ErrorKind`] so callers can branch on the category
//! without matching each service's variants.

use thiserror::Error;

use fitness_core::model::{
    BodyMetricError, ExerciseError, FoodError, GoalError, MealLogError, UserError, WorkoutError,
};
use storage::repository::{StorageError, UniqueField};
use storage::sqlite::SqliteInitError;

/// Caller-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad credentials or no session.
    AuthFailure,
    /// Inactivity timeout; the session was cleared.
    SessionExpired,
    /// Malformed input, rejected before any write.
    Validation,
    /// Uniqueness violation on `field`, or `None` when other rows still
    /// reference the target.
    Conflict { field: Option<UniqueField> },
    /// Missing, or owned by someone else.
    NotFound,
    /// Backend failure; nothing was written.
    Storage,
}

fn storage_kind(err: &StorageError) -> ErrorKind {
    match err {
        StorageError::NotFound => ErrorKind::NotFound,
        StorageError::Conflict(field) => ErrorKind::Conflict {
            field: Some(*field),
        },
        StorageError::Referenced => ErrorKind::Conflict { field: None },
        _ => ErrorKind::Storage,
    }
}

/// Implements `From<$src>` for a service error by routing through its
/// `Validation(fitness_core::Error)` variant.
macro_rules! validation_from {
    ($target:ty: $($src:ty),+ $(,)?) => {
        $(
            impl From<$src> for $target {
                fn from(err: $src) -> Self {
                    Self::Validation(fitness_core::Error::from(err))
                }
            }
        )+
    };
}

/// Errors emitted by `CredentialStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("password must be at most {max} bytes")]
    PasswordTooLong { max: usize },
}

/// Errors emitted by `SessionGuard`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("not signed in")]
    NotAuthenticated,
    #[error("session expired, please sign in again")]
    SessionExpired,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AuthError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials | AuthError::NotAuthenticated => ErrorKind::AuthFailure,
            AuthError::SessionExpired => ErrorKind::SessionExpired,
            AuthError::Storage(err) => storage_kind(err),
        }
    }
}

/// Errors emitted by `AccountService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AccountError {
    #[error("current password is incorrect")]
    InvalidCredentials,
    #[error(transparent)]
    Validation(fitness_core::Error),
    #[error("{0} already in use")]
    Conflict(UniqueField),
    #[error("account not found")]
    NotFound,
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Storage(StorageError),
}

validation_from!(AccountError: UserError);

impl From<StorageError> for AccountError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(field) => Self::Conflict(field),
            StorageError::NotFound => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

impl AccountError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::InvalidCredentials => ErrorKind::AuthFailure,
            AccountError::Validation(_) => ErrorKind::Validation,
            AccountError::Conflict(field) => ErrorKind::Conflict {
                field: Some(*field),
            },
            AccountError::NotFound => ErrorKind::NotFound,
            AccountError::Credential(CredentialError::PasswordTooLong { .. }) => {
                ErrorKind::Validation
            }
            AccountError::Credential(_) => ErrorKind::Storage,
            AccountError::Storage(err) => storage_kind(err),
        }
    }
}

/// Errors emitted by the metric, exercise, workout, nutrition and dashboard
/// services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackingError {
    #[error(transparent)]
    Validation(fitness_core::Error),
    #[error("record not found")]
    NotFound,
    #[error("still in use by logged entries")]
    InUse,
    #[error(transparent)]
    Storage(StorageError),
}

validation_from!(
    TrackingError: BodyMetricError,
    ExerciseError,
    WorkoutError,
    FoodError,
    MealLogError,
);

impl From<StorageError> for TrackingError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::NotFound,
            StorageError::Referenced => Self::InUse,
            other => Self::Storage(other),
        }
    }
}

impl TrackingError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackingError::Validation(_) => ErrorKind::Validation,
            TrackingError::NotFound => ErrorKind::NotFound,
            TrackingError::InUse => ErrorKind::Conflict { field: None },
            TrackingError::Storage(err) => storage_kind(err),
        }
    }
}

/// Errors emitted by `GoalService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GoalServiceError {
    #[error(transparent)]
    Validation(fitness_core::Error),
    #[error("goal not found")]
    NotFound,
    #[error(transparent)]
    Storage(StorageError),
}

validation_from!(GoalServiceError: GoalError);

impl From<StorageError> for GoalServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

impl GoalServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            GoalServiceError::Validation(_) => ErrorKind::Validation,
            GoalServiceError::NotFound => ErrorKind::NotFound,
            GoalServiceError::Storage(err) => storage_kind(err),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
