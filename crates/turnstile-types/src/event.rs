//! Inbound domain events consumed by the engine
//!
//! Schema only - transport and delivery belong to the platform adapter.

use crate::{ChannelId, FormFields, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A domain event delivered from the platform adapter.
///
/// Events for one user are assumed to arrive in submission order; no
/// ordering is guaranteed across users.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum InboundEvent {
    /// A member completed identity verification upstream
    UserVerified {
        user_id: UserId,
        account_age_days: u32,
    },
    /// A member submitted the intake form
    FormSubmitted {
        user_id: UserId,
        fields: FormFields,
    },
    /// A message was posted in the engagement channel
    ActivityObserved {
        user_id: UserId,
        channel_id: ChannelId,
        content: String,
        timestamp: DateTime<Utc>,
    },
    /// Any message, anywhere, for moderation
    MessageObserved {
        channel_id: ChannelId,
        author_id: UserId,
        content: String,
    },
    /// A member left the platform; their seat is freed
    MemberDeparted { user_id: UserId },
}
