//! Utility functions for Dynalock

use chrono::Utc;

/// Current wall-clock time as Unix seconds
///
/// # Examples
///
/// ```
/// use dynalock_common::current_epoch_seconds;
///
/// assert!(current_epoch_seconds() > 1_600_000_000);
/// ```
pub fn current_epoch_seconds() -> i64 {
    Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_epoch_seconds_is_monotonic_enough() {
        let first = current_epoch_seconds();
        let second = current_epoch_seconds();
        assert!(second >= first);
    }
}
