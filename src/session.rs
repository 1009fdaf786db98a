//! Session wrapper with dual expiration policies
//!
//! Wraps a [`SessionStore`] collaborator with key/value access and two
//! independent expiration timers: an absolute max age and a rolling
//! last-activity timeout.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Result, SessionError};
use crate::store::SessionStore;

/// One hour in seconds.
pub const HOUR: i64 = 3600;
/// One day in seconds.
pub const DAY: i64 = 86_400;
/// One week in seconds.
pub const WEEK: i64 = 604_800;

/// Mapping key holding the epoch seconds of the first max-age observation.
pub const CREATED_TIME_KEY: &str = "session_created_time";
/// Mapping key holding the epoch seconds of the most recent store open.
pub const LAST_ACTIVITY_TIME_KEY: &str = "session_last_activity_time";

/// Validated expiration timer configuration.
///
/// Both values are in seconds; zero disables the corresponding timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    max_age_secs: u64,
    last_activity_timeout_secs: u64,
}

impl SessionConfig {
    /// Validate a timer pair.
    ///
    /// # Errors
    ///
    /// Fails when either value is negative, or when both are nonzero and
    /// the max age is shorter than the last activity timeout.
    pub fn new(max_age_secs: i64, last_activity_timeout_secs: i64) -> Result<Self> {
        if max_age_secs < 0 {
            return Err(SessionError::NegativeMaxAge);
        }
        if last_activity_timeout_secs < 0 {
            return Err(SessionError::NegativeLastActivityTimeout);
        }
        if max_age_secs != 0
            && last_activity_timeout_secs != 0
            && max_age_secs < last_activity_timeout_secs
        {
            return Err(SessionError::MaxAgeBelowActivityTimeout);
        }

        Ok(Self {
            max_age_secs: max_age_secs as u64,
            last_activity_timeout_secs: last_activity_timeout_secs as u64,
        })
    }

    /// Absolute session lifetime in seconds; zero disables the check.
    #[must_use]
    pub fn max_age_secs(&self) -> u64 {
        self.max_age_secs
    }

    /// Rolling inactivity window in seconds; zero disables the check.
    #[must_use]
    pub fn last_activity_timeout_secs(&self) -> u64 {
        self.last_activity_timeout_secs
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 30 * 60,               // 30 minutes
            last_activity_timeout_secs: 30 * 60, // 30 minutes
        }
    }
}

/// Thin orchestrator over a [`SessionStore`].
///
/// Every operation that touches the mapping opens the store, stamps
/// [`LAST_ACTIVITY_TIME_KEY`] with the current time, performs its work, and
/// closes the store again. Opening rotates the session identity, so every
/// operation also refreshes the client-visible token.
pub struct Session {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl Session {
    /// Wrapper with the default timer configuration.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self::with_config(store, SessionConfig::default())
    }

    /// Wrapper with an explicit timer configuration.
    #[must_use]
    pub fn with_config(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// Active timer configuration.
    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Read the value stored under `key`.
    ///
    /// An empty key reads as absent without touching the store.
    pub async fn read(&self, key: &str) -> Result<Option<Value>> {
        if key.is_empty() {
            return Ok(None);
        }

        self.open_session().await?;
        let value = self.store.get(key).await?;
        self.store.close().await?;
        Ok(value)
    }

    /// Serialize `value` and store it under `key`.
    ///
    /// # Errors
    ///
    /// [`SessionError::EmptyKey`] when `key` is empty; the store is not
    /// touched in that case. Unserializable values fail with
    /// [`SessionError::Serialization`].
    pub async fn write(&self, key: &str, value: impl Serialize) -> Result<()> {
        if key.is_empty() {
            return Err(SessionError::EmptyKey);
        }
        let value = serde_json::to_value(value)?;

        self.open_session().await?;
        self.store.insert(key, value).await?;
        self.store.close().await?;
        Ok(())
    }

    /// Remove `key` from the session mapping. Absent keys are not an error.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.open_session().await?;
        self.store.remove(key).await?;
        self.store.close().await?;
        Ok(())
    }

    /// Whether the absolute session lifetime has elapsed.
    ///
    /// Always `false` when the configured max age is zero. The first
    /// observation stamps [`CREATED_TIME_KEY`] and reports `false`; later
    /// checks report `true` once `now - created >= max_age`.
    pub async fn is_max_age_expired(&self) -> Result<bool> {
        let max_age = self.config.max_age_secs();
        if max_age == 0 {
            return Ok(false);
        }
        self.timer_expired(CREATED_TIME_KEY, max_age).await
    }

    /// Whether the rolling last-activity window has elapsed.
    ///
    /// Always `false` when the configured timeout is zero; the first
    /// observation establishes the baseline and reports `false`. The open
    /// step stamps [`LAST_ACTIVITY_TIME_KEY`] before the check reads it, so
    /// a check through this wrapper observes its own fresh stamp; a stale
    /// value is only observable when it was written outside the wrapper's
    /// open step.
    pub async fn is_last_activity_expired(&self) -> Result<bool> {
        let timeout = self.config.last_activity_timeout_secs();
        if timeout == 0 {
            return Ok(false);
        }
        self.timer_expired(LAST_ACTIVITY_TIME_KEY, timeout).await
    }

    /// Tear the session down via [`SessionStore::destroy`].
    ///
    /// Afterwards no prior key is readable and no timer baseline persists.
    pub async fn destroy(&self) -> Result<()> {
        self.store.destroy().await?;
        info!("Session destroyed");
        Ok(())
    }

    /// Open bracket shared by every mapping operation: resume the store
    /// (rotating the identity) and stamp the activity time.
    async fn open_session(&self) -> Result<()> {
        self.store.open().await?;
        self.store
            .insert(LAST_ACTIVITY_TIME_KEY, Value::from(current_timestamp()))
            .await?;
        Ok(())
    }

    async fn timer_expired(&self, key: &'static str, window_secs: u64) -> Result<bool> {
        self.open_session().await?;
        let expired = match self.store.get(key).await? {
            None => {
                self.store
                    .insert(key, Value::from(current_timestamp()))
                    .await?;
                debug!(key, "Expiration baseline established");
                false
            }
            Some(value) => {
                // Non-numeric baselines coerce to 0 and read as expired
                let baseline = value.as_u64().unwrap_or(0);
                current_timestamp().saturating_sub(baseline) >= window_secs
            }
        };
        self.store.close().await?;
        Ok(expired)
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}
