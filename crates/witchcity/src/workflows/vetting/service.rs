use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::domain::{
    ApplicantReference, ApplicationId, ApplicationNote, ApplicationPriority, ApplicationSubmission,
    AuditAction, AuditEntry, ReferenceStatus, ReviewDecision, VettingApplication, VettingStatus,
};
use super::query::{ApplicationFilter, PagedResult};
use super::repository::{
    ApplicationDetail, ApplicationSummary, DecisionOutcome, MyApplicationStatus,
    NotificationPublisher, NotificationTemplate, ReferenceProgress, StatusNotification,
    StatusUpdate, VettingRepository,
};
use super::workflow::{
    ensure_reviewer_transition, ensure_withdrawal, reviewer_targets, TransitionError,
};
use crate::api::{Classify, ErrorKind};
use crate::config::VettingConfig;
use crate::identity::{MemberDirectory, Role, UserId};
use crate::workflows::RepositoryError;

const RECENT_UPDATE_LIMIT: usize = 3;

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static NOTE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("vet-{id:06}"))
}

fn next_note_id() -> String {
    let id = NOTE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("note-{id:06}")
}

/// Service owning every mutation of an application's workflow status.
pub struct VettingService<R, D, N> {
    repository: Arc<R>,
    directory: Arc<D>,
    notifications: Arc<N>,
    config: VettingConfig,
}

impl<R, D, N> VettingService<R, D, N>
where
    R: VettingRepository + 'static,
    D: MemberDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(
        repository: Arc<R>,
        directory: Arc<D>,
        notifications: Arc<N>,
        config: VettingConfig,
    ) -> Self {
        Self {
            repository,
            directory,
            notifications,
            config,
        }
    }

    pub fn repository(&self) -> Arc<R> {
        self.repository.clone()
    }

    /// Create a new application in `UnderReview` for `user`.
    pub fn submit(
        &self,
        user: &UserId,
        submission: ApplicationSubmission,
        now: DateTime<Utc>,
    ) -> Result<VettingApplication, VettingError> {
        validate_submission(&submission)?;

        let has_active = self
            .repository
            .for_user(user)?
            .iter()
            .any(VettingApplication::is_active);
        if has_active {
            return Err(VettingError::AlreadyActive);
        }

        let day = now.date_naive();
        let sequence = self.repository.count_submitted_on(day)? + 1;
        let application = VettingApplication {
            id: next_application_id(),
            application_number: format!("VET-{}-{sequence:04}", day.format("%Y%m%d")),
            user_id: user.clone(),
            scene_name: submission.scene_name.trim().to_string(),
            real_name: submission.real_name.trim().to_string(),
            email: submission.email.trim().to_string(),
            pronouns: submission.pronouns,
            experience_level: submission.experience_level,
            years_experience: submission.years_experience,
            experience_description: submission.experience_description,
            safety_knowledge: submission.safety_knowledge,
            consent_understanding: submission.consent_understanding,
            why_join: submission.why_join,
            skills_interests: submission.skills_interests,
            is_anonymous: submission.is_anonymous,
            priority: ApplicationPriority::Standard,
            assigned_reviewer: None,
            references: submission
                .references
                .into_iter()
                .map(|reference| ApplicantReference {
                    name: reference.name,
                    email: reference.email,
                    relationship: reference.relationship,
                    status: ReferenceStatus::NotContacted,
                })
                .collect(),
            status: VettingStatus::UnderReview,
            submitted_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(application)?;
        self.repository.append_audit(AuditEntry {
            application_id: stored.id.clone(),
            action: AuditAction::Submitted,
            old_value: None,
            new_value: Some(stored.status),
            performed_by: user.clone(),
            performed_at: now,
            note: None,
        })?;

        tracing::info!(
            application_id = %stored.id,
            application_number = %stored.application_number,
            user_id = %user,
            "vetting application submitted"
        );
        self.notify(&stored, NotificationTemplate::ApplicationReceived, None);

        Ok(stored)
    }

    /// Applicant-initiated withdrawal.
    pub fn withdraw(
        &self,
        id: &ApplicationId,
        user: &UserId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<VettingApplication, VettingError> {
        let mut application = self.load(id)?;
        if &application.user_id != user {
            return Err(VettingError::Forbidden(
                "Only the applicant can withdraw this application".to_string(),
            ));
        }
        ensure_withdrawal(application.status)?;

        let previous = application.status;
        application.status = VettingStatus::Withdrawn;
        application.updated_at = now;
        self.repository.update(application.clone())?;
        self.repository.append_audit(AuditEntry {
            application_id: id.clone(),
            action: AuditAction::StatusChange,
            old_value: Some(previous),
            new_value: Some(VettingStatus::Withdrawn),
            performed_by: user.clone(),
            performed_at: now,
            note: reason.filter(|reason| !reason.trim().is_empty()),
        })?;

        tracing::info!(application_id = %id, from = %previous, "vetting application withdrawn");
        Ok(application)
    }

    pub fn applications_for_review(
        &self,
        filter: &ApplicationFilter,
        reviewer: &UserId,
        now: DateTime<Utc>,
    ) -> Result<PagedResult<ApplicationSummary>, VettingError> {
        self.ensure_reviewer(reviewer)?;

        let mut applications: Vec<VettingApplication> = self
            .repository
            .all()?
            .into_iter()
            .filter(|application| filter.matches(application, reviewer))
            .collect();
        applications.sort_by(|left, right| filter.compare(left, right));

        let summaries = applications
            .iter()
            .map(|application| ApplicationSummary::from_application(application, now))
            .collect();

        Ok(PagedResult::paginate(
            summaries,
            filter.effective_page(),
            filter.effective_page_size(),
        ))
    }

    pub fn application_detail(
        &self,
        id: &ApplicationId,
        reviewer: &UserId,
    ) -> Result<ApplicationDetail, VettingError> {
        self.ensure_reviewer(reviewer)?;
        let application = self.load(id)?;

        Ok(ApplicationDetail {
            reference_status: ReferenceProgress::from_references(&application.references),
            allowed_transitions: reviewer_targets(application.status).to_vec(),
            notes: self.repository.notes(id)?,
            audit_trail: self.repository.audit_trail(id)?,
            application,
        })
    }

    /// Apply a reviewer decision. Illegal targets are rejected, never coerced.
    pub fn submit_review_decision(
        &self,
        id: &ApplicationId,
        decision: ReviewDecision,
        reviewer: &UserId,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, VettingError> {
        self.ensure_reviewer(reviewer)?;
        let mut application = self.load(id)?;
        let previous = application.status;
        ensure_reviewer_transition(previous, decision.status)?;

        let note = decision.note.filter(|note| !note.trim().is_empty());
        application.status = decision.status;
        application.updated_at = now;
        if application.assigned_reviewer.is_none() {
            application.assigned_reviewer = Some(reviewer.clone());
        }
        self.repository.update(application.clone())?;
        self.repository.append_audit(AuditEntry {
            application_id: id.clone(),
            action: AuditAction::StatusChange,
            old_value: Some(previous),
            new_value: Some(decision.status),
            performed_by: reviewer.clone(),
            performed_at: now,
            note: note.clone(),
        })?;

        tracing::info!(
            application_id = %id,
            from = %previous,
            to = %decision.status,
            reviewer = %reviewer,
            "vetting status changed"
        );
        let notification_sent = self.notify(
            &application,
            NotificationTemplate::for_status(decision.status),
            note,
        );

        Ok(DecisionOutcome {
            application_id: id.clone(),
            previous_status: previous,
            status: decision.status,
            updated_at: now,
            notification_sent,
        })
    }

    pub fn add_note(
        &self,
        id: &ApplicationId,
        content: &str,
        reviewer: &UserId,
        now: DateTime<Utc>,
    ) -> Result<ApplicationNote, VettingError> {
        self.ensure_reviewer(reviewer)?;
        let content = content.trim();
        if content.is_empty() {
            return Err(VettingError::Validation(
                "Note content is required".to_string(),
            ));
        }
        let application = self.load(id)?;

        let note = self.repository.append_note(ApplicationNote {
            id: next_note_id(),
            application_id: id.clone(),
            author_id: reviewer.clone(),
            content: content.to_string(),
            created_at: now,
        })?;
        self.repository.append_audit(AuditEntry {
            application_id: id.clone(),
            action: AuditAction::NoteAdded,
            old_value: Some(application.status),
            new_value: Some(application.status),
            performed_by: reviewer.clone(),
            performed_at: now,
            note: Some(content.to_string()),
        })?;

        Ok(note)
    }

    /// Latest application of `user`, as the applicant sees it.
    pub fn status_for_user(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<MyApplicationStatus, VettingError> {
        let application = self
            .repository
            .for_user(user)?
            .into_iter()
            .max_by(VettingApplication::recency)
            .ok_or(VettingError::NoApplication)?;

        let mut history: Vec<AuditEntry> = self
            .repository
            .audit_trail(&application.id)?
            .into_iter()
            .filter(|entry| {
                matches!(
                    entry.action,
                    AuditAction::Submitted | AuditAction::StatusChange
                )
            })
            .collect();
        history.sort_by(|left, right| right.performed_at.cmp(&left.performed_at));
        let recent_updates = history
            .into_iter()
            .take(RECENT_UPDATE_LIMIT)
            .map(|entry| StatusUpdate {
                updated_at: entry.performed_at,
                status: entry.new_value,
                message: entry
                    .note
                    .or_else(|| entry.new_value.map(|status| status.description().to_string()))
                    .unwrap_or_default(),
            })
            .collect();

        let estimated_days_remaining = if application.status.is_terminal() {
            None
        } else {
            Duration::try_days(self.config.estimated_review_days)
                .and_then(|window| application.submitted_at.checked_add_signed(window))
                .map(|due| (due - now).num_days().max(0))
        };

        Ok(MyApplicationStatus {
            application_id: application.id.clone(),
            application_number: application.application_number.clone(),
            status: application.status,
            status_description: application.status.description(),
            submitted_at: application.submitted_at,
            last_update_at: application.updated_at,
            estimated_days_remaining,
            recent_updates,
        })
    }

    fn load(&self, id: &ApplicationId) -> Result<VettingApplication, VettingError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| VettingError::NotFound(id.clone()))
    }

    fn ensure_reviewer(&self, reviewer: &UserId) -> Result<(), VettingError> {
        let permitted = self
            .directory
            .member(reviewer)
            .is_some_and(|member| member.has_role(Role::can_review_applications));
        if permitted {
            Ok(())
        } else {
            tracing::warn!(user_id = %reviewer, "reviewer access refused");
            Err(VettingError::Forbidden(
                "Reviewer or administrator role required".to_string(),
            ))
        }
    }

    fn notify(
        &self,
        application: &VettingApplication,
        template: NotificationTemplate,
        note: Option<String>,
    ) -> bool {
        let notification = StatusNotification {
            template,
            application_id: application.id.clone(),
            recipient: application.email.clone(),
            scene_name: application.scene_name.clone(),
            status: application.status,
            note,
        };

        match self.notifications.publish(notification) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(
                    application_id = %application.id,
                    error = %error,
                    "status notification failed"
                );
                false
            }
        }
    }
}

fn validate_submission(submission: &ApplicationSubmission) -> Result<(), VettingError> {
    let required = [
        ("Scene name", &submission.scene_name),
        ("Real name", &submission.real_name),
        ("Email", &submission.email),
        ("Experience description", &submission.experience_description),
        ("Why join", &submission.why_join),
    ];
    if let Some((label, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(VettingError::Validation(format!("{label} is required")));
    }
    if !submission.email.contains('@') {
        return Err(VettingError::Validation(
            "Email must be a valid address".to_string(),
        ));
    }
    Ok(())
}

/// Error raised by the vetting service.
#[derive(Debug, thiserror::Error)]
pub enum VettingError {
    #[error("{0}")]
    Validation(String),
    #[error("User already has an active vetting application")]
    AlreadyActive,
    #[error("Application {0} not found")]
    NotFound(ApplicationId),
    #[error("No vetting application found for this user")]
    NoApplication,
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl Classify for VettingError {
    fn kind(&self) -> ErrorKind {
        match self {
            VettingError::Validation(_)
            | VettingError::AlreadyActive
            | VettingError::Transition(_) => ErrorKind::Validation,
            VettingError::NotFound(_) | VettingError::NoApplication => ErrorKind::NotFound,
            VettingError::Forbidden(_) => ErrorKind::Forbidden,
            VettingError::Repository(error) => error.kind(),
        }
    }
}
