use std::env;

use chrono::Duration;

use crate::credentials::{MAX_HASH_COST, MIN_HASH_COST};

pub const DEFAULT_DATABASE_URL: &str = "sqlite:fitness.sqlite3";
pub const DEFAULT_SESSION_TIMEOUT_SECS: i64 = 5 * 60;

/// How long a session may stay idle before `touch` expires it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    timeout: Duration,
}

impl SessionPolicy {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_SESSION_TIMEOUT_SECS))
    }
}

/// Runtime configuration for [`crate::AppServices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionPolicy,
    pub hash_cost: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.into(),
            session: SessionPolicy::default(),
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl AppConfig {
    /// Read `FITNESS_DB_URL`, `FITNESS_SESSION_TIMEOUT_SECS` and
    /// `FITNESS_BCRYPT_COST`. Unset or unparsable values fall back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let database_url = lookup("FITNESS_DB_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.database_url);
        let session = lookup("FITNESS_SESSION_TIMEOUT_SECS")
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(defaults.session, |secs| {
                SessionPolicy::new(Duration::seconds(secs))
            });
        let hash_cost = lookup("FITNESS_BCRYPT_COST")
            .and_then(|value| value.trim().parse::<u32>().ok())
            .filter(|cost| (MIN_HASH_COST..=MAX_HASH_COST).contains(cost))
            .unwrap_or(defaults.hash_cost);

        Self {
            database_url,
            session,
            hash_cost,
        }
    }
}
