//! Lease arithmetic
//!
//! Expirations are whole Unix seconds. A record whose expiration is at or
//! before the current second is logically free, whatever the TTL sweep has done.

use std::time::Duration;

use chrono::DateTime;

use dynalock_common::current_epoch_seconds;

/// Expiration of a lease granted at `now`
pub fn expiration_after(now: i64, lease: Duration) -> i64 {
    let secs = i64::try_from(lease.as_secs()).unwrap_or(i64::MAX);
    now.saturating_add(secs)
}

/// Expiration of a lease granted right now
pub fn next_expiration(lease: Duration) -> i64 {
    expiration_after(current_epoch_seconds(), lease)
}

/// Render an expiration for log output
pub fn format_expiration(epoch: i64) -> String {
    DateTime::from_timestamp(epoch, 0)
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| epoch.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiration_after() {
        assert_eq!(
            expiration_after(1_700_000_000, Duration::from_secs(3600)),
            1_700_003_600
        );
        // Sub-second remainders are dropped
        assert_eq!(expiration_after(100, Duration::from_millis(1_999)), 101);
        assert_eq!(expiration_after(100, Duration::ZERO), 100);
    }

    #[test]
    fn test_expiration_saturates() {
        assert_eq!(expiration_after(i64::MAX - 1, Duration::MAX), i64::MAX);
    }

    #[test]
    fn test_next_expiration() {
        let before = current_epoch_seconds();
        let expiration = next_expiration(Duration::from_secs(60));
        let after = current_epoch_seconds();
        assert!(expiration >= before + 60);
        assert!(expiration <= after + 60);
    }

    #[test]
    fn test_format_expiration() {
        assert_eq!(format_expiration(0), "1970-01-01T00:00:00+00:00");
        assert_eq!(format_expiration(i64::MAX), i64::MAX.to_string());
    }
}
