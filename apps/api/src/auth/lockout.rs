use chrono::{DateTime, Duration, Utc};

use crate::models::user::UserRow;

/// Consecutive failures that lock an account.
pub const MAX_FAILED_ATTEMPTS: i32 = 5;
pub const LOCKOUT_MINUTES: i64 = 15;

/// Counter values to persist after a failed login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailedLogin {
    pub attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
}

/// Returns the lock expiry if the account is locked at `now`.
pub fn locked_until(user: &UserRow, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    user.locked_until.filter(|until| *until > now)
}

/// Counts one more failure. A lock that has already expired starts the
/// count over; reaching [`MAX_FAILED_ATTEMPTS`] sets a new lock.
pub fn record_failure(user: &UserRow, now: DateTime<Utc>) -> FailedLogin {
    let previous = match user.locked_until {
        Some(until) if until <= now => 0,
        _ => user.failed_login_attempts,
    };
    let attempts = previous + 1;
    let locked_until =
        (attempts >= MAX_FAILED_ATTEMPTS).then(|| now + Duration::minutes(LOCKOUT_MINUTES));
    FailedLogin {
        attempts,
        locked_until,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(attempts: i32, locked_until: Option<DateTime<Utc>>) -> UserRow {
        let now = Utc::now();
        UserRow {
            id: Uuid::new_v4(),
            email: "jane@example.com".to_string(),
            full_name: "Jane Doe".to_string(),
            password_hash: String::new(),
            role: "user".to_string(),
            email_verified: true,
            verification_token: None,
            failed_login_attempts: attempts,
            locked_until,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_fifth_failure_locks_for_fifteen_minutes() {
        let now = Utc::now();
        let outcome = record_failure(&user(4, None), now);
        assert_eq!(outcome.attempts, 5);
        assert_eq!(outcome.locked_until, Some(now + Duration::minutes(15)));
    }

    #[test]
    fn test_early_failures_do_not_lock() {
        let outcome = record_failure(&user(2, None), Utc::now());
        assert_eq!(outcome.attempts, 3);
        assert!(outcome.locked_until.is_none());
    }

    #[test]
    fn test_expired_lock_restarts_count() {
        let now = Utc::now();
        let outcome = record_failure(&user(5, Some(now - Duration::minutes(1))), now);
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.locked_until.is_none());
    }

    #[test]
    fn test_locked_until_only_reports_active_locks() {
        let now = Utc::now();
        let future = now + Duration::minutes(5);
        assert_eq!(locked_until(&user(5, Some(future)), now), Some(future));
        assert_eq!(locked_until(&user(5, Some(now - Duration::seconds(1))), now), None);
        assert_eq!(locked_until(&user(0, None), now), None);
    }
}
