//! Cohort Allocator - capacity-gated assignment into Early Access / Waitlist
//!
//! The allocator is the only owner of cohort markers and occupancy
//! counters. Every decision is a read-check-increment inside one write
//! lock, so two callers racing for the last seat can never both take it.

#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use tracing::info;
use turnstile_types::{AllocationOutcome, Cohort, Occupancy, PromotionOutcome, UserId};

/// Capacity limits for both cohorts
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CohortCaps {
    pub early_access_max: u32,
    pub waitlist_max: u32,
}

/// Cohort membership and derived occupancy counters.
///
/// Counters always equal the number of users holding the marker; both are
/// mutated together under the same write lock.
#[derive(Debug, Default)]
struct SeatMap {
    cohorts: HashMap<UserId, Cohort>,
    early_access_count: u32,
    waitlist_count: u32,
}

/// Capacity-gated allocator for cohort seats
pub struct CohortAllocator {
    caps: CohortCaps,
    seats: RwLock<SeatMap>,
}

impl CohortAllocator {
    /// Create an allocator with the given capacity limits
    pub fn new(caps: CohortCaps) -> Self {
        Self {
            caps,
            seats: RwLock::new(SeatMap::default()),
        }
    }

    /// Admit a form-complete user into a cohort.
    ///
    /// Preconditions (enforced by the caller): the user's form is accepted
    /// and they hold no cohort. A user already holding a cohort is a caller
    /// bug or duplicate event delivery and fails with `AlreadyAllocated`
    /// without touching any counter.
    pub fn allocate(&self, user_id: &UserId) -> Result<AllocationOutcome, AllocationError> {
        let mut seats = self.seats.write().map_err(|_| AllocationError::LockError)?;

        if let Some(held) = seats.cohorts.get(user_id) {
            return Err(AllocationError::AlreadyAllocated {
                user_id: user_id.clone(),
                cohort: *held,
            });
        }

        let outcome = if seats.early_access_count < self.caps.early_access_max {
            seats.cohorts.insert(user_id.clone(), Cohort::EarlyAccess);
            seats.early_access_count += 1;
            info!(
                user = %user_id,
                occupancy = seats.early_access_count,
                max = self.caps.early_access_max,
                "Seated in Early Access"
            );
            AllocationOutcome::EarlyAccess
        } else if seats.waitlist_count < self.caps.waitlist_max {
            seats.cohorts.insert(user_id.clone(), Cohort::Waitlist);
            seats.waitlist_count += 1;
            info!(
                user = %user_id,
                occupancy = seats.waitlist_count,
                max = self.caps.waitlist_max,
                "Seated on Waitlist"
            );
            AllocationOutcome::Waitlist {
                early_access_count: seats.early_access_count,
            }
        } else {
            info!(user = %user_id, "Both cohorts full, user left unseated");
            AllocationOutcome::Unseated
        };

        Ok(outcome)
    }

    /// Move a Waitlist member into Early Access if a seat is free.
    ///
    /// Idempotent: a second call on an already-promoted user (or any user
    /// not currently on the waitlist) returns `NotEligible` and never
    /// double-decrements the waitlist counter.
    pub fn promote(&self, user_id: &UserId) -> Result<PromotionOutcome, AllocationError> {
        let mut seats = self.seats.write().map_err(|_| AllocationError::LockError)?;

        match seats.cohorts.get(user_id) {
            Some(Cohort::Waitlist) => {}
            _ => return Ok(PromotionOutcome::NotEligible),
        }

        if seats.early_access_count >= self.caps.early_access_max {
            return Ok(PromotionOutcome::CapacityFull);
        }

        seats.cohorts.insert(user_id.clone(), Cohort::EarlyAccess);
        seats.waitlist_count -= 1;
        seats.early_access_count += 1;
        info!(
            user = %user_id,
            occupancy = seats.early_access_count,
            "Promoted from Waitlist to Early Access"
        );

        Ok(PromotionOutcome::Promoted)
    }

    /// Free the seat of a departing member.
    ///
    /// Returns the cohort they held, if any. Their engagement history is
    /// untouched; only the seat and counter change.
    pub fn release(&self, user_id: &UserId) -> Result<Option<Cohort>, AllocationError> {
        let mut seats = self.seats.write().map_err(|_| AllocationError::LockError)?;

        let held = seats.cohorts.remove(user_id);
        match held {
            Some(Cohort::EarlyAccess) => seats.early_access_count -= 1,
            Some(Cohort::Waitlist) => seats.waitlist_count -= 1,
            None => {}
        }
        if let Some(cohort) = held {
            info!(user = %user_id, %cohort, "Seat released");
        }

        Ok(held)
    }

    /// The cohort a user currently holds, if any
    pub fn cohort_of(&self, user_id: &UserId) -> Result<Option<Cohort>, AllocationError> {
        let seats = self.seats.read().map_err(|_| AllocationError::LockError)?;
        Ok(seats.cohorts.get(user_id).copied())
    }

    /// Current occupancy of both cohorts
    pub fn occupancy(&self) -> Result<Occupancy, AllocationError> {
        let seats = self.seats.read().map_err(|_| AllocationError::LockError)?;
        Ok(Occupancy {
            early_access: seats.early_access_count,
            waitlist: seats.waitlist_count,
        })
    }

    /// The configured capacity limits
    pub fn caps(&self) -> CohortCaps {
        self.caps
    }
}

/// Allocation-related errors
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("User {user_id} already holds cohort {cohort}")]
    AlreadyAllocated { user_id: UserId, cohort: Cohort },

    #[error("Lock error")]
    LockError,
}
