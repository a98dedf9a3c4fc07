//! Promotion Evaluator - threshold check for the Waitlist upgrade path
//!
//! Runs on every qualifying activity once a member is on the waitlist.
//! There is no background sweep: a member who reaches the threshold and
//! then never posts again stays where they are, even if capacity later
//! frees up. Safe to call repeatedly because the allocator's promote is
//! itself idempotent.

#![deny(unsafe_code)]

use thiserror::Error;
use tracing::info;
use turnstile_allocator::{AllocationError, CohortAllocator};
use turnstile_types::{Cohort, PromotionOutcome, UserId};

/// Threshold-gated promotion evaluator
pub struct PromotionEvaluator {
    threshold: u64,
}

impl PromotionEvaluator {
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }

    /// Decide whether a member has earned promotion and, if so, take the
    /// allocator's upgrade path.
    ///
    /// `current_points` is the total the ledger just returned for the
    /// activity that triggered this check.
    pub fn check_promotion(
        &self,
        allocator: &CohortAllocator,
        user_id: &UserId,
        current_points: u64,
    ) -> Result<PromotionOutcome, PromotionError> {
        if allocator.cohort_of(user_id)? != Some(Cohort::Waitlist) {
            return Ok(PromotionOutcome::NotEligible);
        }
        if current_points < self.threshold {
            return Ok(PromotionOutcome::NotEligible);
        }

        let outcome = allocator.promote(user_id)?;
        if outcome == PromotionOutcome::Promoted {
            info!(user = %user_id, points = current_points, "Promoted via engagement");
        }
        Ok(outcome)
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }
}

/// Promotion-related errors
#[derive(Debug, Error)]
pub enum PromotionError {
    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnstile_allocator::CohortCaps;

    fn allocator(early_max: u32) -> CohortAllocator {
        CohortAllocator::new(CohortCaps {
            early_access_max: early_max,
            waitlist_max: 100,
        })
    }

    /// Seat `user` on the waitlist by filling Early Access first
    fn waitlist(allocator: &CohortAllocator, user: &UserId, fillers: u32) {
        for i in 0..fillers {
            allocator.allocate(&UserId::new(format!("filler-{i}"))).unwrap();
        }
        allocator.allocate(user).unwrap();
    }

    #[test]
    fn below_threshold_is_not_eligible() {
        let allocator = allocator(1);
        let evaluator = PromotionEvaluator::new(1000);
        let user = UserId::new("a");
        waitlist(&allocator, &user, 1);

        let outcome = evaluator.check_promotion(&allocator, &user, 990).unwrap();
        assert_eq!(outcome, PromotionOutcome::NotEligible);
        assert_eq!(allocator.cohort_of(&user).unwrap(), Some(Cohort::Waitlist));
    }

    #[test]
    fn threshold_met_but_capacity_full_stays_waitlisted() {
        let allocator = allocator(1);
        let evaluator = PromotionEvaluator::new(1000);
        let user = UserId::new("a");
        waitlist(&allocator, &user, 1);

        let outcome = evaluator.check_promotion(&allocator, &user, 1000).unwrap();
        assert_eq!(outcome, PromotionOutcome::CapacityFull);
        assert_eq!(allocator.cohort_of(&user).unwrap(), Some(Cohort::Waitlist));
    }

    #[test]
    fn promotes_when_threshold_and_capacity_align() {
        let allocator = allocator(1);
        let evaluator = PromotionEvaluator::new(1000);
        let user = UserId::new("a");
        waitlist(&allocator, &user, 1);

        allocator.release(&UserId::new("filler-0")).unwrap();
        let outcome = evaluator.check_promotion(&allocator, &user, 1000).unwrap();
        assert_eq!(outcome, PromotionOutcome::Promoted);
        assert_eq!(
            allocator.cohort_of(&user).unwrap(),
            Some(Cohort::EarlyAccess)
        );
    }

    #[test]
    fn repeated_checks_after_promotion_are_noops() {
        let allocator = allocator(2);
        let evaluator = PromotionEvaluator::new(1000);
        let user = UserId::new("a");
        waitlist(&allocator, &user, 2);

        allocator.release(&UserId::new("filler-0")).unwrap();
        assert_eq!(
            evaluator.check_promotion(&allocator, &user, 1200).unwrap(),
            PromotionOutcome::Promoted
        );
        assert_eq!(
            evaluator.check_promotion(&allocator, &user, 1210).unwrap(),
            PromotionOutcome::NotEligible
        );
        assert_eq!(allocator.occupancy().unwrap().waitlist, 0);
    }

    #[test]
    fn early_access_member_short_circuits() {
        let allocator = allocator(1);
        let evaluator = PromotionEvaluator::new(1000);
        let user = UserId::new("a");
        allocator.allocate(&user).unwrap();

        let outcome = evaluator.check_promotion(&allocator, &user, 5000).unwrap();
        assert_eq!(outcome, PromotionOutcome::NotEligible);
    }
}
