//! Cohort markers and per-user engagement state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mutually-exclusive access tier a seated user occupies.
///
/// A user holds at most one cohort at any time; the absence of a cohort
/// is modeled as `Option<Cohort>` being `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cohort {
    EarlyAccess,
    Waitlist,
}

impl std::fmt::Display for Cohort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cohort::EarlyAccess => write!(f, "early-access"),
            Cohort::Waitlist => write!(f, "waitlist"),
        }
    }
}

/// Verification state of a member
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationState {
    Unverified,
    Verified,
}

/// Intake form state of a member
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormState {
    NotSubmitted,
    Submitted,
}

/// Current occupancy of both cohorts, as seen by the capacity oracle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    pub early_access: u32,
    pub waitlist: u32,
}

/// Per-user engagement accrual state.
///
/// `points` is monotonically non-decreasing; only the ledger mutates
/// either field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementRecord {
    pub points: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_accrual: Option<DateTime<Utc>>,
}

impl EngagementRecord {
    pub fn new() -> Self {
        Self::default()
    }
}
