//! Operation outcomes shared across components
//!
//! Expected terminal states (capacity full, cooldown, unseated) are
//! outcomes, not errors: they are surfaced to the user as information.

use crate::{Cohort, UserId};
use serde::{Deserialize, Serialize};

/// Result of admitting a form-complete user into a cohort
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationOutcome {
    EarlyAccess,
    /// Seated on the waitlist; carries Early-Access occupancy at decision
    /// time for user-facing messaging
    Waitlist { early_access_count: u32 },
    /// Both cohorts full - the user stays form-complete but unseated
    Unseated,
}

impl AllocationOutcome {
    /// The cohort marker this outcome seats the user into, if any
    pub fn cohort(&self) -> Option<Cohort> {
        match self {
            AllocationOutcome::EarlyAccess => Some(Cohort::EarlyAccess),
            AllocationOutcome::Waitlist { .. } => Some(Cohort::Waitlist),
            AllocationOutcome::Unseated => None,
        }
    }
}

/// Result of the Waitlist -> EarlyAccess upgrade path
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromotionOutcome {
    Promoted,
    /// Early Access is at capacity; the user stays on the waitlist and the
    /// check re-runs on their next qualifying activity
    CapacityFull,
    /// The user does not currently hold Waitlist (including the case where
    /// a prior call already promoted them)
    NotEligible,
}

/// Result of a cooldown-gated engagement accrual
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccrualOutcome {
    /// Points awarded; carries the new total for the promotion check
    Accepted { total: u64 },
    /// Still cooling down; no points awarded, timestamp unchanged
    Cooldown { remaining_secs: u64 },
    /// The user holds no cohort and earns nothing
    NotEligible,
    /// The content does not match the qualifying-post pattern
    InvalidContent,
}

/// Moderation classification for a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Clean,
    Violation(ViolationReason),
}

/// Why a message was flagged
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationReason {
    SuspiciousContent,
    UnauthorizedLink,
}

impl std::fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationReason::SuspiciousContent => write!(f, "suspicious-content"),
            ViolationReason::UnauthorizedLink => write!(f, "unauthorized-link"),
        }
    }
}

/// A user-facing notification produced by the engine and delivered
/// best-effort by the platform adapter
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: UserId,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_outcome_maps_to_cohort() {
        assert_eq!(AllocationOutcome::EarlyAccess.cohort(), Some(Cohort::EarlyAccess));
        assert_eq!(
            AllocationOutcome::Waitlist { early_access_count: 500 }.cohort(),
            Some(Cohort::Waitlist)
        );
        assert_eq!(AllocationOutcome::Unseated.cohort(), None);
    }

    #[test]
    fn violation_reason_display() {
        assert_eq!(format!("{}", ViolationReason::UnauthorizedLink), "unauthorized-link");
        assert_eq!(format!("{}", ViolationReason::SuspiciousContent), "suspicious-content");
    }
}
