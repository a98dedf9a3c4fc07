//! Form Intake - field validation and one-shot submission recording
//!
//! All field violations are collected and reported together so the user
//! sees every problem at once. At most one accepted submission exists per
//! user; the duplicate check and the insert happen under one write lock
//! so a racing retry cannot slip in a second record.

#![deny(unsafe_code)]

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use tracing::info;
use turnstile_types::{FieldError, FormFields, FormSubmission, SubmissionId, UserId};

const MIN_WALLET_LEN: usize = 10;

/// Intake service holding accepted submissions
pub struct FormIntake {
    submissions: RwLock<HashMap<UserId, FormSubmission>>,
    email_pattern: Regex,
}

impl FormIntake {
    pub fn new() -> Self {
        Self {
            submissions: RwLock::new(HashMap::new()),
            // local@domain.tld shape, no whitespace or extra @
            email_pattern: Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
                .expect("email pattern is valid"),
        }
    }

    /// Validate fields without recording anything.
    ///
    /// Returns every violation, not just the first.
    pub fn validate(&self, fields: &FormFields) -> Vec<FieldError> {
        let mut errors = vec![];

        if fields.wallet.trim().is_empty() || fields.wallet.len() < MIN_WALLET_LEN {
            errors.push(FieldError::WalletTooShort);
        }
        if !self.email_pattern.is_match(&fields.email) {
            errors.push(FieldError::InvalidEmail);
        }
        if !fields.twitter_handle.starts_with('@') {
            errors.push(FieldError::TwitterHandleMissingAt);
        }
        if !fields.telegram_handle.starts_with('@') {
            errors.push(FieldError::TelegramHandleMissingAt);
        }
        if !fields.confirmation.eq_ignore_ascii_case("yes") {
            errors.push(FieldError::ConfirmationNotAffirmed);
        }

        errors
    }

    /// Validate and record a submission.
    ///
    /// Rejections and duplicates leave no state behind; an accepted
    /// submission is immutable once recorded.
    pub fn submit(
        &self,
        user_id: &UserId,
        fields: FormFields,
        now: DateTime<Utc>,
    ) -> Result<IntakeOutcome, IntakeError> {
        let errors = self.validate(&fields);
        if !errors.is_empty() {
            return Ok(IntakeOutcome::Rejected { errors });
        }

        let mut submissions = self
            .submissions
            .write()
            .map_err(|_| IntakeError::LockError)?;

        if submissions.contains_key(user_id) {
            return Ok(IntakeOutcome::Duplicate);
        }

        let submission = FormSubmission {
            submission_id: SubmissionId::generate(),
            user_id: user_id.clone(),
            wallet: fields.wallet,
            email: fields.email,
            twitter_handle: fields.twitter_handle,
            telegram_handle: fields.telegram_handle,
            confirmed: true,
            submitted_at: now,
        };

        submissions.insert(user_id.clone(), submission.clone());
        info!(user = %user_id, submission = %submission.submission_id, "Form accepted");

        Ok(IntakeOutcome::Accepted(submission))
    }

    /// Whether a user already has an accepted submission
    pub fn has_submitted(&self, user_id: &UserId) -> Result<bool, IntakeError> {
        let submissions = self.submissions.read().map_err(|_| IntakeError::LockError)?;
        Ok(submissions.contains_key(user_id))
    }

    /// Look up the accepted submission for a user
    pub fn submission_for(
        &self,
        user_id: &UserId,
    ) -> Result<Option<FormSubmission>, IntakeError> {
        let submissions = self.submissions.read().map_err(|_| IntakeError::LockError)?;
        Ok(submissions.get(user_id).cloned())
    }
}

impl Default for FormIntake {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a submission attempt
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum IntakeOutcome {
    Accepted(FormSubmission),
    Rejected { errors: Vec<FieldError> },
    Duplicate,
}

/// Intake-related errors
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Lock error")]
    LockError,
}
