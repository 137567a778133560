use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::config::VettingConfig;
use crate::identity::{Member, Role, UserId};
use crate::store::{MemoryDirectory, MemoryVettingRepository, RecordingNotifications};
use crate::workflows::vetting::domain::{
    ApplicationId, ApplicationNote, ApplicationSubmission, AuditEntry, ExperienceLevel,
    ReferenceSubmission, VettingApplication,
};
use crate::workflows::vetting::repository::{
    NotificationError, NotificationPublisher, StatusNotification, VettingRepository,
};
use crate::workflows::vetting::{vetting_router, VettingService};
use crate::workflows::RepositoryError;

pub(super) const APPLICANT: &str = "member-applicant";
pub(super) const REVIEWER: &str = "member-reviewer";

pub(super) type MemoryVettingService =
    VettingService<MemoryVettingRepository, MemoryDirectory, RecordingNotifications>;

pub(super) fn user(id: &str) -> UserId {
    UserId(id.to_string())
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 10, 15, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn submitted_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 10).expect("valid date")
}

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        scene_name: "Hemp Hollow".to_string(),
        real_name: "Jordan Reyes".to_string(),
        email: "jordan@example.com".to_string(),
        pronouns: Some("they/them".to_string()),
        experience_level: ExperienceLevel::Intermediate,
        years_experience: 3,
        experience_description: "Three years of floor work and partial suspension.".to_string(),
        safety_knowledge: "Shears on hand, nerve-path awareness.".to_string(),
        consent_understanding: "Negotiation before every scene.".to_string(),
        why_join: "Looking for a community with structured classes.".to_string(),
        skills_interests: vec!["Floor work".to_string()],
        is_anonymous: false,
        references: vec![ReferenceSubmission {
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            relationship: "Rope partner".to_string(),
        }],
    }
}

pub(super) fn directory() -> MemoryDirectory {
    MemoryDirectory::with_members([
        Member {
            id: user(APPLICANT),
            display_name: "Hemp Hollow".to_string(),
            pronounced_name: None,
            pronouns: Some("they/them".to_string()),
            email: "jordan@example.com".to_string(),
            roles: vec![Role::Member],
        },
        Member {
            id: user(REVIEWER),
            display_name: "Vetting Lead".to_string(),
            pronounced_name: None,
            pronouns: None,
            email: "vetting@example.com".to_string(),
            roles: vec![Role::VettingReviewer],
        },
    ])
}

pub(super) fn build_service() -> (
    MemoryVettingService,
    Arc<MemoryVettingRepository>,
    Arc<RecordingNotifications>,
) {
    let repository = Arc::new(MemoryVettingRepository::default());
    let notifications = Arc::new(RecordingNotifications::default());
    let service = VettingService::new(
        repository.clone(),
        Arc::new(directory()),
        notifications.clone(),
        VettingConfig::default(),
    );
    (service, repository, notifications)
}

pub(super) fn submitted(service: &MemoryVettingService) -> VettingApplication {
    service
        .submit(&user(APPLICANT), submission(), now())
        .expect("submission succeeds")
}

pub(super) fn vetting_router_with_service(service: MemoryVettingService) -> axum::Router {
    vetting_router(Arc::new(service))
}

pub(super) struct FailingNotifications;

impl NotificationPublisher for FailingNotifications {
    fn publish(&self, _notification: StatusNotification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl VettingRepository for UnavailableRepository {
    fn insert(
        &self,
        _application: VettingApplication,
    ) -> Result<VettingApplication, RepositoryError> {
        offline()
    }

    fn update(&self, _application: VettingApplication) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<VettingApplication>, RepositoryError> {
        offline()
    }

    fn for_user(&self, _user: &UserId) -> Result<Vec<VettingApplication>, RepositoryError> {
        offline()
    }

    fn all(&self) -> Result<Vec<VettingApplication>, RepositoryError> {
        offline()
    }

    fn count_submitted_on(&self, _day: NaiveDate) -> Result<usize, RepositoryError> {
        offline()
    }

    fn append_audit(&self, _entry: AuditEntry) -> Result<(), RepositoryError> {
        offline()
    }

    fn audit_trail(&self, _id: &ApplicationId) -> Result<Vec<AuditEntry>, RepositoryError> {
        offline()
    }

    fn append_note(&self, _note: ApplicationNote) -> Result<ApplicationNote, RepositoryError> {
        offline()
    }

    fn notes(&self, _id: &ApplicationId) -> Result<Vec<ApplicationNote>, RepositoryError> {
        offline()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
