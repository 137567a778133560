use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicantReference, ApplicationId, ApplicationNote, ApplicationPriority, AuditEntry,
    ExperienceLevel, ReferenceStatus, VettingApplication, VettingStatus,
};
use crate::identity::UserId;
use crate::workflows::RepositoryError;

/// Storage abstraction for applications, their notes, and the audit trail.
pub trait VettingRepository: Send + Sync {
    fn insert(&self, application: VettingApplication)
        -> Result<VettingApplication, RepositoryError>;
    fn update(&self, application: VettingApplication) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<VettingApplication>, RepositoryError>;
    fn for_user(&self, user: &UserId) -> Result<Vec<VettingApplication>, RepositoryError>;
    fn all(&self) -> Result<Vec<VettingApplication>, RepositoryError>;
    fn count_submitted_on(&self, day: NaiveDate) -> Result<usize, RepositoryError>;
    fn append_audit(&self, entry: AuditEntry) -> Result<(), RepositoryError>;
    fn audit_trail(&self, id: &ApplicationId) -> Result<Vec<AuditEntry>, RepositoryError>;
    fn append_note(&self, note: ApplicationNote) -> Result<ApplicationNote, RepositoryError>;
    fn notes(&self, id: &ApplicationId) -> Result<Vec<ApplicationNote>, RepositoryError>;
}

/// Outbound e-mail hook for applicant status updates.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: StatusNotification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationTemplate {
    ApplicationReceived,
    InterviewApproved,
    InterviewScheduled,
    Approved,
    Denied,
    OnHold,
    StatusUpdate,
}

impl NotificationTemplate {
    pub fn for_status(status: VettingStatus) -> Self {
        match status {
            VettingStatus::InterviewApproved => Self::InterviewApproved,
            VettingStatus::InterviewScheduled => Self::InterviewScheduled,
            VettingStatus::Approved => Self::Approved,
            VettingStatus::Denied => Self::Denied,
            VettingStatus::OnHold => Self::OnHold,
            VettingStatus::UnderReview | VettingStatus::FinalReview | VettingStatus::Withdrawn => {
                Self::StatusUpdate
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNotification {
    pub template: NotificationTemplate,
    pub application_id: ApplicationId,
    pub recipient: String,
    pub scene_name: String,
    pub status: VettingStatus,
    pub note: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("email transport unavailable: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceProgress {
    pub total_references: usize,
    pub contacted_references: usize,
    pub responded_references: usize,
    pub all_references_complete: bool,
}

impl ReferenceProgress {
    pub fn from_references(references: &[ApplicantReference]) -> Self {
        let contacted = references
            .iter()
            .filter(|reference| reference.status != ReferenceStatus::NotContacted)
            .count();
        let responded = references
            .iter()
            .filter(|reference| reference.status == ReferenceStatus::Responded)
            .count();

        Self {
            total_references: references.len(),
            contacted_references: contacted,
            responded_references: responded,
            all_references_complete: responded == references.len(),
        }
    }
}

/// Row shown in the reviewer dashboard grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummary {
    pub id: ApplicationId,
    pub application_number: String,
    pub status: VettingStatus,
    pub scene_name: String,
    pub experience_level: ExperienceLevel,
    pub years_experience: u8,
    pub is_anonymous: bool,
    pub priority: ApplicationPriority,
    pub assigned_reviewer: Option<UserId>,
    pub submitted_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub days_in_current_status: i64,
    pub skills_tags: Vec<String>,
    pub reference_status: ReferenceProgress,
}

impl ApplicationSummary {
    pub fn from_application(application: &VettingApplication, now: DateTime<Utc>) -> Self {
        Self {
            id: application.id.clone(),
            application_number: application.application_number.clone(),
            status: application.status,
            scene_name: application.display_scene_name().to_string(),
            experience_level: application.experience_level,
            years_experience: application.years_experience,
            is_anonymous: application.is_anonymous,
            priority: application.priority,
            assigned_reviewer: application.assigned_reviewer.clone(),
            submitted_at: application.submitted_at,
            last_activity_at: application.updated_at,
            days_in_current_status: (now - application.updated_at).num_days().max(0),
            skills_tags: application.skills_interests.clone(),
            reference_status: ReferenceProgress::from_references(&application.references),
        }
    }
}

/// Full reviewer view of one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetail {
    pub application: VettingApplication,
    pub reference_status: ReferenceProgress,
    pub allowed_transitions: Vec<VettingStatus>,
    pub notes: Vec<ApplicationNote>,
    pub audit_trail: Vec<AuditEntry>,
}

/// Result of a successful reviewer decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOutcome {
    pub application_id: ApplicationId,
    pub previous_status: VettingStatus,
    pub status: VettingStatus,
    pub updated_at: DateTime<Utc>,
    pub notification_sent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub updated_at: DateTime<Utc>,
    pub status: Option<VettingStatus>,
    pub message: String,
}

/// Applicant's own view of their latest application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyApplicationStatus {
    pub application_id: ApplicationId,
    pub application_number: String,
    pub status: VettingStatus,
    pub status_description: &'static str,
    pub submitted_at: DateTime<Utc>,
    pub last_update_at: DateTime<Utc>,
    pub estimated_days_remaining: Option<i64>,
    pub recent_updates: Vec<StatusUpdate>,
}
