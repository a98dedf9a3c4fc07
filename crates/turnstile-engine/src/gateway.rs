//! Collaborator traits for platform side effects
//!
//! Everything here is best-effort: the engine commits its decision first
//! and dispatches these calls afterwards. A failed call is logged, never
//! retried by the core, and never rolls back committed state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use turnstile_types::{ChannelId, Cohort, Notification, UserId, ViolationReason};

/// How long a violating author is timed out
pub const VIOLATION_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Assigns and removes cohort roles on the platform
#[async_trait]
pub trait RoleGateway: Send + Sync {
    async fn assign_cohort_role(
        &self,
        user_id: &UserId,
        cohort: Cohort,
    ) -> Result<(), GatewayError>;

    async fn remove_cohort_role(
        &self,
        user_id: &UserId,
        cohort: Cohort,
    ) -> Result<(), GatewayError>;
}

/// Delivers user-facing notifications (e.g. direct messages)
#[async_trait]
pub trait UserNotifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), GatewayError>;
}

/// Acts on moderation violations
#[async_trait]
pub trait ModerationGateway: Send + Sync {
    async fn delete_message(
        &self,
        channel_id: &ChannelId,
        author_id: &UserId,
    ) -> Result<(), GatewayError>;

    async fn timeout_user(
        &self,
        user_id: &UserId,
        duration: Duration,
    ) -> Result<(), GatewayError>;

    async fn report_incident(&self, report: IncidentReport) -> Result<(), GatewayError>;
}

/// A security report filed when a message is flagged
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IncidentReport {
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub reason: ViolationReason,
    /// First 500 characters of the offending message
    pub excerpt: String,
}

/// A collaborator call failed; the engine's state is already committed
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
}
