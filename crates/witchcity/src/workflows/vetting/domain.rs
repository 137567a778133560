use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// Identifier wrapper for vetting applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stage of a vetting application. Persisted and serialized by name, never by ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VettingStatus {
    UnderReview,
    InterviewApproved,
    InterviewScheduled,
    FinalReview,
    Approved,
    Denied,
    OnHold,
    Withdrawn,
}

impl VettingStatus {
    pub const ALL: [VettingStatus; 8] = [
        VettingStatus::UnderReview,
        VettingStatus::InterviewApproved,
        VettingStatus::InterviewScheduled,
        VettingStatus::FinalReview,
        VettingStatus::Approved,
        VettingStatus::Denied,
        VettingStatus::OnHold,
        VettingStatus::Withdrawn,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            VettingStatus::UnderReview => "UnderReview",
            VettingStatus::InterviewApproved => "InterviewApproved",
            VettingStatus::InterviewScheduled => "InterviewScheduled",
            VettingStatus::FinalReview => "FinalReview",
            VettingStatus::Approved => "Approved",
            VettingStatus::Denied => "Denied",
            VettingStatus::OnHold => "OnHold",
            VettingStatus::Withdrawn => "Withdrawn",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            VettingStatus::Approved | VettingStatus::Denied | VettingStatus::Withdrawn
        )
    }

    /// Applicant-facing explanation of the stage.
    pub const fn description(self) -> &'static str {
        match self {
            VettingStatus::UnderReview => {
                "Your application is currently under review by our vetting team."
            }
            VettingStatus::InterviewApproved => {
                "You have been approved for an interview. We will reach out to schedule it."
            }
            VettingStatus::InterviewScheduled => {
                "Your interview has been scheduled. Check your email for details."
            }
            VettingStatus::FinalReview => "Your application is in final review.",
            VettingStatus::Approved => "Congratulations! Your application has been approved.",
            VettingStatus::Denied => "Your application was not approved at this time.",
            VettingStatus::OnHold => {
                "Your application is on hold. Please contact the vetting team to continue."
            }
            VettingStatus::Withdrawn => "You withdrew this application.",
        }
    }
}

impl std::fmt::Display for VettingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for VettingStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        VettingStatus::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown vetting status '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApplicationPriority {
    Standard,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceStatus {
    NotContacted,
    Contacted,
    Responded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSubmission {
    pub name: String,
    pub email: String,
    pub relationship: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantReference {
    pub name: String,
    pub email: String,
    pub relationship: String,
    pub status: ReferenceStatus,
}

/// Applicant-provided form content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSubmission {
    pub scene_name: String,
    pub real_name: String,
    pub email: String,
    #[serde(default)]
    pub pronouns: Option<String>,
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub years_experience: u8,
    pub experience_description: String,
    #[serde(default)]
    pub safety_knowledge: String,
    #[serde(default)]
    pub consent_understanding: String,
    pub why_join: String,
    #[serde(default)]
    pub skills_interests: Vec<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub references: Vec<ReferenceSubmission>,
}

/// Stored vetting application; the single source of truth for an applicant's standing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VettingApplication {
    pub id: ApplicationId,
    pub application_number: String,
    pub user_id: UserId,
    pub scene_name: String,
    pub real_name: String,
    pub email: String,
    pub pronouns: Option<String>,
    pub experience_level: ExperienceLevel,
    pub years_experience: u8,
    pub experience_description: String,
    pub safety_knowledge: String,
    pub consent_understanding: String,
    pub why_join: String,
    pub skills_interests: Vec<String>,
    pub is_anonymous: bool,
    pub priority: ApplicationPriority,
    pub assigned_reviewer: Option<UserId>,
    pub references: Vec<ApplicantReference>,
    pub status: VettingStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VettingApplication {
    /// Anything but a withdrawn application blocks a second submission by the same user.
    pub fn is_active(&self) -> bool {
        self.status != VettingStatus::Withdrawn
    }

    /// Orders by submission time, then id; the greatest is the most recent.
    pub fn recency(left: &Self, right: &Self) -> std::cmp::Ordering {
        left.submitted_at
            .cmp(&right.submitted_at)
            .then_with(|| left.id.cmp(&right.id))
    }

    pub fn display_scene_name(&self) -> &str {
        if self.is_anonymous {
            "Anonymous"
        } else {
            &self.scene_name
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Submitted,
    StatusChange,
    NoteAdded,
    AccessDenied,
}

/// Append-only audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub application_id: ApplicationId,
    pub action: AuditAction,
    pub old_value: Option<VettingStatus>,
    pub new_value: Option<VettingStatus>,
    pub performed_by: UserId,
    pub performed_at: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationNote {
    pub id: String,
    pub application_id: ApplicationId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Reviewer request to move an application to a new stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDecision {
    pub status: VettingStatus,
    #[serde(default)]
    pub note: Option<String>,
}
