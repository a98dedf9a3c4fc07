//! Turnstile Engine - the unified access-tiering service
//!
//! Consumes the platform's domain events and orchestrates the directory,
//! intake, allocator, ledger, promotion evaluator, and moderation filter.
//! Decision steps are synchronous and committed before any side effect;
//! role assignment, notifications, and moderation actions run as detached
//! best-effort tasks.

#![deny(unsafe_code)]

mod gateway;
pub mod mocks;

pub use gateway::{
    GatewayError, IncidentReport, ModerationGateway, RoleGateway, UserNotifier,
    VIOLATION_TIMEOUT,
};

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use turnstile_allocator::{AllocationError, CohortAllocator, CohortCaps};
use turnstile_directory::{DirectoryError, MemberDirectory, MemberRecord, VerificationOutcome};
use turnstile_intake::{FormIntake, IntakeError, IntakeOutcome};
use turnstile_ledger::{AccrualPolicy, EngagementLedger, LedgerError};
use turnstile_moderation::{ModerationError, ModerationFilter};
use turnstile_promotion::{PromotionError, PromotionEvaluator};
use turnstile_types::{
    AccrualOutcome, AllocationOutcome, ChannelId, Cohort, EngagementRecord, EngineConfig,
    FieldError, FormFields, InboundEvent, Notification, Occupancy, PromotionOutcome, UserId,
    Verdict,
};

const REPORT_EXCERPT_LEN: usize = 500;

/// The access-tiering engine
pub struct TurnstileEngine {
    config: EngineConfig,
    directory: MemberDirectory,
    intake: FormIntake,
    allocator: CohortAllocator,
    ledger: EngagementLedger,
    promotion: PromotionEvaluator,
    moderation: ModerationFilter,
    roles: Arc<dyn RoleGateway>,
    notifier: Arc<dyn UserNotifier>,
    actions: Arc<dyn ModerationGateway>,
}

impl TurnstileEngine {
    /// Build an engine from configuration and platform collaborators
    pub fn new(
        config: EngineConfig,
        roles: Arc<dyn RoleGateway>,
        notifier: Arc<dyn UserNotifier>,
        actions: Arc<dyn ModerationGateway>,
    ) -> Result<Self, EngineError> {
        let moderation = ModerationFilter::new(
            config.engagement_channel.clone(),
            &config.post_link_pattern,
            config.suspicious_patterns.clone(),
        )?;

        Ok(Self {
            directory: MemberDirectory::new(config.min_account_age_days),
            intake: FormIntake::new(),
            allocator: CohortAllocator::new(CohortCaps {
                early_access_max: config.early_access_max,
                waitlist_max: config.waitlist_max,
            }),
            ledger: EngagementLedger::new(AccrualPolicy {
                xp_per_post: config.xp_per_post,
                cooldown_seconds: config.cooldown_seconds,
            }),
            promotion: PromotionEvaluator::new(config.promotion_threshold),
            moderation,
            config,
            roles,
            notifier,
            actions,
        })
    }

    /// Dispatch one inbound event
    pub async fn handle_event(&self, event: InboundEvent) -> Result<EventDisposition, EngineError> {
        match event {
            InboundEvent::UserVerified {
                user_id,
                account_age_days,
            } => Ok(EventDisposition::Verification(
                self.handle_verified(&user_id, account_age_days).await?,
            )),
            InboundEvent::FormSubmitted { user_id, fields } => Ok(EventDisposition::Submission(
                self.handle_form(&user_id, fields).await?,
            )),
            InboundEvent::ActivityObserved {
                user_id,
                channel_id,
                content,
                timestamp,
            } => Ok(EventDisposition::Activity(
                self.handle_activity(&user_id, &channel_id, &content, timestamp)
                    .await?,
            )),
            InboundEvent::MessageObserved {
                channel_id,
                author_id,
                content,
            } => Ok(EventDisposition::Moderation(
                self.handle_message(&channel_id, &author_id, &content).await?,
            )),
            InboundEvent::MemberDeparted { user_id } => Ok(EventDisposition::Departure(
                self.handle_departure(&user_id).await?,
            )),
        }
    }

    /// Record an upstream verification
    pub async fn handle_verified(
        &self,
        user_id: &UserId,
        account_age_days: u32,
    ) -> Result<VerificationOutcome, EngineError> {
        let outcome = self
            .directory
            .mark_verified(user_id, account_age_days, Utc::now())?;

        match outcome {
            VerificationOutcome::Verified => {
                self.send_notice(
                    user_id,
                    "You are verified. Next step: submit the access form.".to_string(),
                );
            }
            VerificationOutcome::AccountTooNew { required_days } => {
                self.send_notice(
                    user_id,
                    format!(
                        "Account must be at least {required_days} days old to verify."
                    ),
                );
            }
            VerificationOutcome::AlreadyVerified => {}
        }

        Ok(outcome)
    }

    /// Validate a form submission and, on acceptance, seat the user
    pub async fn handle_form(
        &self,
        user_id: &UserId,
        fields: FormFields,
    ) -> Result<SubmissionDisposition, EngineError> {
        if !self.directory.is_verified(user_id)? {
            return Ok(SubmissionDisposition::NotVerified);
        }

        match self.intake.submit(user_id, fields, Utc::now())? {
            IntakeOutcome::Rejected { errors } => {
                self.send_notice(user_id, Self::rejection_message(&errors));
                Ok(SubmissionDisposition::Rejected { errors })
            }
            IntakeOutcome::Duplicate => {
                self.send_notice(
                    user_id,
                    "You have already submitted the form. Only one submission per user is allowed."
                        .to_string(),
                );
                Ok(SubmissionDisposition::Duplicate)
            }
            IntakeOutcome::Accepted(_submission) => {
                self.directory.mark_form_submitted(user_id)?;
                let outcome = self.allocator.allocate(user_id)?;
                self.dispatch_allocation_effects(user_id, outcome);
                Ok(SubmissionDisposition::Allocated(outcome))
            }
        }
    }

    /// Process a post in the engagement channel: accrue points and run the
    /// promotion check
    pub async fn handle_activity(
        &self,
        user_id: &UserId,
        channel_id: &ChannelId,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<ActivityDisposition, EngineError> {
        if channel_id != self.moderation.engagement_channel() {
            return Ok(ActivityDisposition::Ignored);
        }

        let cohort = self.allocator.cohort_of(user_id)?;
        let qualifying = self.moderation.is_qualifying_post(content);
        let accrual = self
            .ledger
            .record_activity(user_id, cohort, qualifying, timestamp)?;

        match accrual {
            AccrualOutcome::NotEligible | AccrualOutcome::InvalidContent => {
                // Per channel policy: unseated users and off-format posts
                // are removed
                self.suppress_message(channel_id, user_id);
                if accrual == AccrualOutcome::InvalidContent {
                    self.send_notice(
                        user_id,
                        "Only platform post links are allowed in this channel.".to_string(),
                    );
                }
                Ok(ActivityDisposition::Accrual {
                    outcome: accrual,
                    promotion: None,
                })
            }
            AccrualOutcome::Cooldown { remaining_secs } => {
                self.send_notice(user_id, format!("Cooldown: {remaining_secs}s remaining"));
                Ok(ActivityDisposition::Accrual {
                    outcome: accrual,
                    promotion: None,
                })
            }
            AccrualOutcome::Accepted { total } => {
                let promotion = self
                    .promotion
                    .check_promotion(&self.allocator, user_id, total)?;
                if promotion == PromotionOutcome::Promoted {
                    self.dispatch_promotion_effects(user_id, total);
                }
                Ok(ActivityDisposition::Accrual {
                    outcome: accrual,
                    promotion: Some(promotion),
                })
            }
        }
    }

    /// Classify any message and act on a violation
    pub async fn handle_message(
        &self,
        channel_id: &ChannelId,
        author_id: &UserId,
        content: &str,
    ) -> Result<Verdict, EngineError> {
        let verdict = self.moderation.evaluate(channel_id, content);

        if let Verdict::Violation(reason) = verdict {
            warn!(author = %author_id, channel = %channel_id, %reason, "Message flagged");

            self.suppress_message(channel_id, author_id);

            let actions = Arc::clone(&self.actions);
            let author = author_id.clone();
            spawn_best_effort("timeout_user", async move {
                actions.timeout_user(&author, VIOLATION_TIMEOUT).await
            });

            let actions = Arc::clone(&self.actions);
            let report = IncidentReport {
                channel_id: channel_id.clone(),
                author_id: author_id.clone(),
                reason,
                excerpt: content.chars().take(REPORT_EXCERPT_LEN).collect(),
            };
            spawn_best_effort("report_incident", async move {
                actions.report_incident(report).await
            });
        }

        Ok(verdict)
    }

    /// Free a departing member's seat; their history is kept
    pub async fn handle_departure(&self, user_id: &UserId) -> Result<Option<Cohort>, EngineError> {
        let held = self.allocator.release(user_id)?;
        self.directory.mark_departed(user_id, Utc::now())?;

        if let Some(cohort) = held {
            let roles = Arc::clone(&self.roles);
            let user = user_id.clone();
            spawn_best_effort("remove_cohort_role", async move {
                roles.remove_cohort_role(&user, cohort).await
            });
        }

        Ok(held)
    }

    // ============ Queries ============

    /// Composed view of one user across all components
    pub fn snapshot(&self, user_id: &UserId) -> Result<UserSnapshot, EngineError> {
        Ok(UserSnapshot {
            member: self.directory.lookup(user_id)?,
            cohort: self.allocator.cohort_of(user_id)?,
            engagement: self.ledger.record_for(user_id)?,
        })
    }

    /// Current cohort occupancy
    pub fn occupancy(&self) -> Result<Occupancy, EngineError> {
        Ok(self.allocator.occupancy()?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ============ Side-effect dispatch ============

    fn dispatch_allocation_effects(&self, user_id: &UserId, outcome: AllocationOutcome) {
        if let Some(cohort) = outcome.cohort() {
            let roles = Arc::clone(&self.roles);
            let user = user_id.clone();
            spawn_best_effort("assign_cohort_role", async move {
                roles.assign_cohort_role(&user, cohort).await
            });
        }

        let message = match outcome {
            AllocationOutcome::EarlyAccess => {
                "Early Access granted. Welcome aboard!".to_string()
            }
            AllocationOutcome::Waitlist { early_access_count } => format!(
                "Early Access is full ({}/{}). You are on the waitlist - post in the engagement channel to earn points and upgrade.",
                early_access_count, self.config.early_access_max
            ),
            AllocationOutcome::Unseated => {
                "No cohort is currently available.".to_string()
            }
        };
        self.send_notice(user_id, message);
    }

    fn dispatch_promotion_effects(&self, user_id: &UserId, total: u64) {
        let roles = Arc::clone(&self.roles);
        let user = user_id.clone();
        spawn_best_effort("remove_cohort_role", async move {
            roles.remove_cohort_role(&user, Cohort::Waitlist).await
        });

        let roles = Arc::clone(&self.roles);
        let user = user_id.clone();
        spawn_best_effort("assign_cohort_role", async move {
            roles.assign_cohort_role(&user, Cohort::EarlyAccess).await
        });

        self.send_notice(
            user_id,
            format!("Congratulations! You reached {total} points and have been promoted to Early Access."),
        );
    }

    fn suppress_message(&self, channel_id: &ChannelId, author_id: &UserId) {
        let actions = Arc::clone(&self.actions);
        let channel = channel_id.clone();
        let author = author_id.clone();
        spawn_best_effort("delete_message", async move {
            actions.delete_message(&channel, &author).await
        });
    }

    /// Notifications are silently ignored on failure - the user may simply
    /// have direct messages disabled
    fn send_notice(&self, user_id: &UserId, message: String) {
        let notifier = Arc::clone(&self.notifier);
        let notification = Notification {
            user_id: user_id.clone(),
            message,
        };
        tokio::spawn(async move {
            if let Err(error) = notifier.notify(notification).await {
                debug!(%error, "Notification dropped");
            }
        });
    }

    fn rejection_message(errors: &[FieldError]) -> String {
        let mut message = String::from("Form validation failed:");
        for error in errors {
            message.push_str("\n- ");
            message.push_str(&error.to_string());
        }
        message
    }
}

/// Spawn a detached task for a committed side effect; failures are logged
/// and never propagated
fn spawn_best_effort<F>(what: &'static str, effect: F)
where
    F: Future<Output = Result<(), GatewayError>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(error) = effect.await {
            warn!(%error, task = what, "Collaborator call failed");
        }
    });
}

/// What the engine did with one inbound event
#[derive(Clone, Debug)]
pub enum EventDisposition {
    Verification(VerificationOutcome),
    Submission(SubmissionDisposition),
    Activity(ActivityDisposition),
    Moderation(Verdict),
    Departure(Option<Cohort>),
}

/// Outcome of a form-submission event
#[derive(Clone, Debug)]
pub enum SubmissionDisposition {
    /// Sender has not passed verification; nothing recorded
    NotVerified,
    Rejected { errors: Vec<FieldError> },
    Duplicate,
    Allocated(AllocationOutcome),
}

/// Outcome of an engagement-channel activity event
#[derive(Clone, Debug)]
pub enum ActivityDisposition {
    /// Event was for a different channel
    Ignored,
    Accrual {
        outcome: AccrualOutcome,
        promotion: Option<PromotionOutcome>,
    },
}

/// Composed per-user view
#[derive(Clone, Debug)]
pub struct UserSnapshot {
    pub member: Option<MemberRecord>,
    pub cohort: Option<Cohort>,
    pub engagement: EngagementRecord,
}

/// Engine errors composed from component failures
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),

    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Promotion error: {0}")]
    Promotion(#[from] PromotionError),

    #[error("Moderation error: {0}")]
    Moderation(#[from] ModerationError),
}
