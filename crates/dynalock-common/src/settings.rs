//! Lock settings
//!
//! Settings are resolved once when a lock handle is built. The lease override
//! is expressed in milliseconds and rounded up to whole minutes, matching how
//! deployments historically configured `DYNAMO_LOCK_OVERRIDE_EXPIRATION_TIME`.

use std::time::Duration;

use config::{Config, Environment};
use tracing::warn;

use crate::error::Result;
use crate::{
    DEFAULT_KEY_PREFIX, DEFAULT_LEASE_MINUTES, DEFAULT_TABLE_NAME, ENV_PREFIX, KEY_PREFIX_KEY,
    OVERRIDE_EXPIRATION_TIME_KEY, TABLE_NAME_KEY,
};

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Values that mean "not set" when they arrive through the environment
const UNSET_SENTINELS: &[&str] = &["", "undefined", "null"];

/// Settings shared by every handle built from them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSettings {
    /// Table holding the lock records
    pub table_name: String,
    /// Prefix prepended to the lock name to form the record key
    pub key_prefix: String,
    /// Lease granted by each obtain/refresh
    pub lease: Duration,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            lease: default_lease(),
        }
    }
}

impl LockSettings {
    /// Load settings from `DYNAMO_LOCK_*` environment variables.
    ///
    /// Never fails: anything that cannot be read falls back to defaults.
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read lock settings from environment, using defaults");
            Self::default()
        })
    }

    /// Like [`LockSettings::from_env`], but reports an unreadable environment.
    pub fn try_from_env() -> Result<Self> {
        let config = Config::builder()
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;
        Ok(Self::from_config(&config))
    }

    /// Extract settings from an already layered configuration.
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();

        let table_name = config
            .get_string(TABLE_NAME_KEY)
            .ok()
            .filter(|v| !is_unset(v))
            .unwrap_or(defaults.table_name);
        let key_prefix = config
            .get_string(KEY_PREFIX_KEY)
            .ok()
            .filter(|v| !is_unset(v))
            .unwrap_or(defaults.key_prefix);
        let raw_override = config.get_string(OVERRIDE_EXPIRATION_TIME_KEY).ok();

        Self {
            table_name,
            key_prefix,
            lease: lease_from_override_ms(raw_override.as_deref()),
        }
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    /// Use an exact lease; no minute rounding is applied here.
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    /// Key under which the record for `lock_name` is stored
    pub fn record_key(&self, lock_name: &str) -> String {
        format!("{}{}", self.key_prefix, lock_name)
    }
}

/// Resolve a lease from a raw millisecond override.
///
/// The value is rounded up to whole minutes. Absent, sentinel, unparseable and
/// non-positive values fall back to the 60 minute default.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use dynalock_common::lease_from_override_ms;
///
/// assert_eq!(lease_from_override_ms(Some("1800000")), Duration::from_secs(30 * 60));
/// assert_eq!(lease_from_override_ms(Some("12000")), Duration::from_secs(60));
/// assert_eq!(lease_from_override_ms(Some("undefined")), Duration::from_secs(60 * 60));
/// assert_eq!(lease_from_override_ms(None), Duration::from_secs(60 * 60));
/// ```
pub fn lease_from_override_ms(raw: Option<&str>) -> Duration {
    let Some(raw) = raw.map(str::trim).filter(|v| !is_unset(v)) else {
        return default_lease();
    };

    match raw.parse::<f64>() {
        Ok(ms) if ms.is_finite() && ms > 0.0 => {
            let minutes = (ms / MILLIS_PER_MINUTE).ceil() as u64;
            Duration::from_secs(minutes.saturating_mul(60))
        }
        _ => {
            warn!(value = %raw, "Ignoring invalid lease override, using default lease");
            default_lease()
        }
    }
}

fn default_lease() -> Duration {
    Duration::from_secs(DEFAULT_LEASE_MINUTES * 60)
}

fn is_unset(value: &str) -> bool {
    let value = value.trim();
    UNSET_SENTINELS
        .iter()
        .any(|sentinel| value.eq_ignore_ascii_case(sentinel))
}
