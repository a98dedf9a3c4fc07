//! Intake form fields and accepted submissions

use crate::{SubmissionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw fields submitted through the intake form, prior to validation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormFields {
    pub wallet: String,
    pub email: String,
    pub twitter_handle: String,
    pub telegram_handle: String,
    /// Free-text confirmation; must read "YES" (case-insensitive)
    pub confirmation: String,
}

/// An accepted form submission. At most one exists per user identity,
/// and it is immutable once recorded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormSubmission {
    pub submission_id: SubmissionId,
    pub user_id: UserId,
    pub wallet: String,
    pub email: String,
    pub twitter_handle: String,
    pub telegram_handle: String,
    pub confirmed: bool,
    pub submitted_at: DateTime<Utc>,
}

/// A single field violation found during intake validation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldError {
    WalletTooShort,
    InvalidEmail,
    TwitterHandleMissingAt,
    TelegramHandleMissingAt,
    ConfirmationNotAffirmed,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldError::WalletTooShort => write!(f, "Invalid wallet address"),
            FieldError::InvalidEmail => write!(f, "Invalid email format"),
            FieldError::TwitterHandleMissingAt => {
                write!(f, "Twitter handle must start with @")
            }
            FieldError::TelegramHandleMissingAt => {
                write!(f, "Telegram handle must start with @")
            }
            FieldError::ConfirmationNotAffirmed => {
                write!(f, "You must confirm that you understand never to share private keys")
            }
        }
    }
}
