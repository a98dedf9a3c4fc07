//! Engagement Ledger - cooldown-gated point accrual
//!
//! The ledger is the only owner of engagement points and accrual
//! timestamps. Points are monotonically non-decreasing; duplicate event
//! delivery inside the cooldown window awards nothing.

#![deny(unsafe_code)]

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;
use turnstile_types::{AccrualOutcome, Cohort, EngagementRecord, UserId};

/// Accrual tuning: points per post and the per-user cooldown
#[derive(Clone, Copy, Debug)]
pub struct AccrualPolicy {
    pub xp_per_post: u64,
    pub cooldown_seconds: u64,
}

/// Per-user engagement accrual ledger
pub struct EngagementLedger {
    policy: AccrualPolicy,
    records: RwLock<HashMap<UserId, EngagementRecord>>,
}

impl EngagementLedger {
    /// Create a ledger with the given accrual policy
    pub fn new(policy: AccrualPolicy) -> Self {
        Self {
            policy,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Record one observed activity for a user.
    ///
    /// `cohort` is the user's current seat as reported by the allocator;
    /// unseated users earn nothing and the caller suppresses the message.
    /// The decision and the mutation happen under one write lock, so a
    /// racing duplicate delivery cannot double-accrue.
    pub fn record_activity(
        &self,
        user_id: &UserId,
        cohort: Option<Cohort>,
        has_qualifying_content: bool,
        now: DateTime<Utc>,
    ) -> Result<AccrualOutcome, LedgerError> {
        if cohort.is_none() {
            return Ok(AccrualOutcome::NotEligible);
        }
        if !has_qualifying_content {
            return Ok(AccrualOutcome::InvalidContent);
        }

        let mut records = self.records.write().map_err(|_| LedgerError::LockError)?;
        let record = records.entry(user_id.clone()).or_default();

        if let Some(last) = record.last_accrual {
            let elapsed_ms = now.signed_duration_since(last).num_milliseconds();
            let cooldown_ms = self.policy.cooldown_seconds as i64 * 1000;
            if elapsed_ms < cooldown_ms {
                // Exact remaining wait, rounded up to whole seconds
                let remaining_ms = cooldown_ms - elapsed_ms;
                let remaining_secs = (remaining_ms as u64).div_ceil(1000);
                debug!(user = %user_id, remaining_secs, "Accrual rejected by cooldown");
                return Ok(AccrualOutcome::Cooldown { remaining_secs });
            }
        }

        record.points += self.policy.xp_per_post;
        record.last_accrual = Some(now);
        debug!(user = %user_id, total = record.points, "Engagement points accrued");

        Ok(AccrualOutcome::Accepted {
            total: record.points,
        })
    }

    /// Current engagement record for a user
    pub fn record_for(&self, user_id: &UserId) -> Result<EngagementRecord, LedgerError> {
        let records = self.records.read().map_err(|_| LedgerError::LockError)?;
        Ok(records.get(user_id).copied().unwrap_or_default())
    }

    /// Current point total for a user
    pub fn points_for(&self, user_id: &UserId) -> Result<u64, LedgerError> {
        Ok(self.record_for(user_id)?.points)
    }
}

/// Ledger-related errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Lock error")]
    LockError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ledger() -> EngagementLedger {
        EngagementLedger::new(AccrualPolicy {
            xp_per_post: 10,
            cooldown_seconds: 120,
        })
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn unseated_user_earns_nothing() {
        let ledger = ledger();
        let outcome = ledger
            .record_activity(&UserId::new("a"), None, true, at(0))
            .unwrap();
        assert_eq!(outcome, AccrualOutcome::NotEligible);
        assert_eq!(ledger.points_for(&UserId::new("a")).unwrap(), 0);
    }

    #[test]
    fn non_qualifying_content_earns_nothing() {
        let ledger = ledger();
        let outcome = ledger
            .record_activity(&UserId::new("a"), Some(Cohort::Waitlist), false, at(0))
            .unwrap();
        assert_eq!(outcome, AccrualOutcome::InvalidContent);
    }

    #[test]
    fn accrual_awards_points_and_stamps_time() {
        let ledger = ledger();
        let user = UserId::new("a");

        let outcome = ledger
            .record_activity(&user, Some(Cohort::EarlyAccess), true, at(0))
            .unwrap();
        assert_eq!(outcome, AccrualOutcome::Accepted { total: 10 });

        let record = ledger.record_for(&user).unwrap();
        assert_eq!(record.points, 10);
        assert_eq!(record.last_accrual, Some(at(0)));
    }

    #[test]
    fn second_accrual_within_cooldown_awards_once() {
        let ledger = ledger();
        let user = UserId::new("a");

        ledger
            .record_activity(&user, Some(Cohort::Waitlist), true, at(0))
            .unwrap();
        let outcome = ledger
            .record_activity(&user, Some(Cohort::Waitlist), true, at(30))
            .unwrap();

        assert_eq!(outcome, AccrualOutcome::Cooldown { remaining_secs: 90 });
        // No points awarded, timestamp unchanged
        let record = ledger.record_for(&user).unwrap();
        assert_eq!(record.points, 10);
        assert_eq!(record.last_accrual, Some(at(0)));
    }

    #[test]
    fn cooldown_remaining_is_ceiling_of_millisecond_delta() {
        let ledger = ledger();
        let user = UserId::new("a");

        ledger
            .record_activity(&user, Some(Cohort::Waitlist), true, at(0))
            .unwrap();

        // 119.5s elapsed -> 500ms remaining -> reported as 1s
        let almost = at(119) + chrono::Duration::milliseconds(500);
        let outcome = ledger
            .record_activity(&user, Some(Cohort::Waitlist), true, almost)
            .unwrap();
        assert_eq!(outcome, AccrualOutcome::Cooldown { remaining_secs: 1 });
    }

    #[test]
    fn accrual_resumes_once_cooldown_elapses() {
        let ledger = ledger();
        let user = UserId::new("a");

        ledger
            .record_activity(&user, Some(Cohort::Waitlist), true, at(0))
            .unwrap();
        let outcome = ledger
            .record_activity(&user, Some(Cohort::Waitlist), true, at(120))
            .unwrap();
        assert_eq!(outcome, AccrualOutcome::Accepted { total: 20 });
    }

    #[test]
    fn points_are_monotonically_non_decreasing() {
        let ledger = ledger();
        let user = UserId::new("a");
        let mut previous = 0;

        for i in 0..10 {
            let _ = ledger
                .record_activity(&user, Some(Cohort::Waitlist), i % 3 != 0, at(i * 90))
                .unwrap();
            let total = ledger.points_for(&user).unwrap();
            assert!(total >= previous);
            previous = total;
        }
    }

    #[test]
    fn users_cool_down_independently() {
        let ledger = ledger();

        ledger
            .record_activity(&UserId::new("a"), Some(Cohort::Waitlist), true, at(0))
            .unwrap();
        let outcome = ledger
            .record_activity(&UserId::new("b"), Some(Cohort::Waitlist), true, at(1))
            .unwrap();
        assert_eq!(outcome, AccrualOutcome::Accepted { total: 10 });
    }
}
