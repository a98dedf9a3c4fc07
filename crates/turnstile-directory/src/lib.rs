//! Member Directory - verification and form state per user
//!
//! Records are created on first observed event and never deleted; a
//! departing member keeps their history for audit. The directory owns
//! only verification and form state - cohort markers belong to the
//! allocator, engagement points to the ledger.

#![deny(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use tracing::info;
use turnstile_types::{FormState, UserId, VerificationState};

/// A member known to the directory
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemberRecord {
    pub user_id: UserId,
    pub verification: VerificationState,
    pub form: FormState,
    pub registered_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departed_at: Option<DateTime<Utc>>,
}

impl MemberRecord {
    fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            verification: VerificationState::Unverified,
            form: FormState::NotSubmitted,
            registered_at: now,
            verified_at: None,
            departed_at: None,
        }
    }
}

/// Result of a verification attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationOutcome {
    Verified,
    AlreadyVerified,
    /// Account is younger than the configured minimum
    AccountTooNew { required_days: u32 },
}

/// Member directory keyed by user identity
pub struct MemberDirectory {
    min_account_age_days: u32,
    members: RwLock<HashMap<UserId, MemberRecord>>,
}

impl MemberDirectory {
    pub fn new(min_account_age_days: u32) -> Self {
        Self {
            min_account_age_days,
            members: RwLock::new(HashMap::new()),
        }
    }

    /// Mark a member verified, creating their record if this is the first
    /// event observed for them. Accounts younger than the minimum age are
    /// turned away to deter alt accounts.
    pub fn mark_verified(
        &self,
        user_id: &UserId,
        account_age_days: u32,
        now: DateTime<Utc>,
    ) -> Result<VerificationOutcome, DirectoryError> {
        if account_age_days < self.min_account_age_days {
            return Ok(VerificationOutcome::AccountTooNew {
                required_days: self.min_account_age_days,
            });
        }

        let mut members = self.members.write().map_err(|_| DirectoryError::LockError)?;
        let record = members
            .entry(user_id.clone())
            .or_insert_with(|| MemberRecord::new(user_id.clone(), now));

        if record.verification == VerificationState::Verified {
            return Ok(VerificationOutcome::AlreadyVerified);
        }

        record.verification = VerificationState::Verified;
        record.verified_at = Some(now);
        info!(user = %user_id, "Member verified");

        Ok(VerificationOutcome::Verified)
    }

    /// Mark a member's form as submitted.
    ///
    /// Callers check the accept decision first; this only flips the state.
    pub fn mark_form_submitted(&self, user_id: &UserId) -> Result<(), DirectoryError> {
        let mut members = self.members.write().map_err(|_| DirectoryError::LockError)?;
        let record = members
            .get_mut(user_id)
            .ok_or_else(|| DirectoryError::NotFound(user_id.clone()))?;
        record.form = FormState::Submitted;
        Ok(())
    }

    /// Record a departure. The record stays for audit; only the timestamp
    /// is added.
    pub fn mark_departed(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), DirectoryError> {
        let mut members = self.members.write().map_err(|_| DirectoryError::LockError)?;
        if let Some(record) = members.get_mut(user_id) {
            record.departed_at = Some(now);
        }
        Ok(())
    }

    /// Look up a member record
    pub fn lookup(&self, user_id: &UserId) -> Result<Option<MemberRecord>, DirectoryError> {
        let members = self.members.read().map_err(|_| DirectoryError::LockError)?;
        Ok(members.get(user_id).cloned())
    }

    /// Whether a member is verified
    pub fn is_verified(&self, user_id: &UserId) -> Result<bool, DirectoryError> {
        Ok(self
            .lookup(user_id)?
            .map(|r| r.verification == VerificationState::Verified)
            .unwrap_or(false))
    }
}

/// Directory-related errors
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Member not found: {0}")]
    NotFound(UserId),

    #[error("Lock error")]
    LockError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn young_accounts_are_turned_away() {
        let directory = MemberDirectory::new(7);
        let outcome = directory
            .mark_verified(&UserId::new("a"), 3, Utc::now())
            .unwrap();
        assert_eq!(
            outcome,
            VerificationOutcome::AccountTooNew { required_days: 7 }
        );
        assert!(!directory.is_verified(&UserId::new("a")).unwrap());
    }

    #[test]
    fn verification_creates_record_and_is_idempotent() {
        let directory = MemberDirectory::new(7);
        let user = UserId::new("a");
        let now = Utc::now();

        assert_eq!(
            directory.mark_verified(&user, 30, now).unwrap(),
            VerificationOutcome::Verified
        );
        assert_eq!(
            directory.mark_verified(&user, 30, now).unwrap(),
            VerificationOutcome::AlreadyVerified
        );

        let record = directory.lookup(&user).unwrap().unwrap();
        assert_eq!(record.verification, VerificationState::Verified);
        assert_eq!(record.form, FormState::NotSubmitted);
    }

    #[test]
    fn form_state_requires_existing_member() {
        let directory = MemberDirectory::new(7);
        let user = UserId::new("a");

        let err = directory.mark_form_submitted(&user).unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound(_)));

        directory.mark_verified(&user, 30, Utc::now()).unwrap();
        directory.mark_form_submitted(&user).unwrap();
        let record = directory.lookup(&user).unwrap().unwrap();
        assert_eq!(record.form, FormState::Submitted);
    }

    #[test]
    fn departure_keeps_the_record() {
        let directory = MemberDirectory::new(7);
        let user = UserId::new("a");
        directory.mark_verified(&user, 30, Utc::now()).unwrap();
        directory.mark_departed(&user, Utc::now()).unwrap();

        let record = directory.lookup(&user).unwrap().unwrap();
        assert!(record.departed_at.is_some());
        assert_eq!(record.verification, VerificationState::Verified);
    }
}
