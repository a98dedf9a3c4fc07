//! Mock collaborators for testing
//!
//! Recording variants capture every call for assertions; the failing
//! variants prove that collaborator outages never touch engine state.

use crate::{GatewayError, IncidentReport, ModerationGateway, RoleGateway, UserNotifier};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use turnstile_types::{ChannelId, Cohort, Notification, UserId};

/// Records role assignments and removals
#[derive(Default)]
pub struct RecordingRoleGateway {
    pub assigned: Mutex<Vec<(UserId, Cohort)>>,
    pub removed: Mutex<Vec<(UserId, Cohort)>>,
}

impl RecordingRoleGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleGateway for RecordingRoleGateway {
    async fn assign_cohort_role(
        &self,
        user_id: &UserId,
        cohort: Cohort,
    ) -> Result<(), GatewayError> {
        self.assigned
            .lock()
            .unwrap()
            .push((user_id.clone(), cohort));
        Ok(())
    }

    async fn remove_cohort_role(
        &self,
        user_id: &UserId,
        cohort: Cohort,
    ) -> Result<(), GatewayError> {
        self.removed.lock().unwrap().push((user_id.clone(), cohort));
        Ok(())
    }
}

/// Records delivered notifications
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserNotifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), GatewayError> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Records moderation actions
#[derive(Default)]
pub struct RecordingModerationGateway {
    pub deleted: Mutex<Vec<(ChannelId, UserId)>>,
    pub timeouts: Mutex<Vec<(UserId, Duration)>>,
    pub reports: Mutex<Vec<IncidentReport>>,
}

impl RecordingModerationGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModerationGateway for RecordingModerationGateway {
    async fn delete_message(
        &self,
        channel_id: &ChannelId,
        author_id: &UserId,
    ) -> Result<(), GatewayError> {
        self.deleted
            .lock()
            .unwrap()
            .push((channel_id.clone(), author_id.clone()));
        Ok(())
    }

    async fn timeout_user(
        &self,
        user_id: &UserId,
        duration: Duration,
    ) -> Result<(), GatewayError> {
        self.timeouts
            .lock()
            .unwrap()
            .push((user_id.clone(), duration));
        Ok(())
    }

    async fn report_incident(&self, report: IncidentReport) -> Result<(), GatewayError> {
        self.reports.lock().unwrap().push(report);
        Ok(())
    }
}

/// Every call fails; for proving side-effect failures are swallowed
pub struct FailingGateway;

#[async_trait]
impl RoleGateway for FailingGateway {
    async fn assign_cohort_role(&self, _: &UserId, _: Cohort) -> Result<(), GatewayError> {
        Err(GatewayError::Unavailable("role service down".to_string()))
    }

    async fn remove_cohort_role(&self, _: &UserId, _: Cohort) -> Result<(), GatewayError> {
        Err(GatewayError::Unavailable("role service down".to_string()))
    }
}

#[async_trait]
impl UserNotifier for FailingGateway {
    async fn notify(&self, _: Notification) -> Result<(), GatewayError> {
        Err(GatewayError::Unavailable("user has DMs disabled".to_string()))
    }
}

#[async_trait]
impl ModerationGateway for FailingGateway {
    async fn delete_message(&self, _: &ChannelId, _: &UserId) -> Result<(), GatewayError> {
        Err(GatewayError::Unavailable("message already gone".to_string()))
    }

    async fn timeout_user(&self, _: &UserId, _: Duration) -> Result<(), GatewayError> {
        Err(GatewayError::Unavailable("missing permission".to_string()))
    }

    async fn report_incident(&self, _: IncidentReport) -> Result<(), GatewayError> {
        Err(GatewayError::Unavailable("reports channel missing".to_string()))
    }
}
