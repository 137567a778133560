use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;

use super::domain::{
    ApplicationId, ApplicationNote, ApplicationSubmission, ReviewDecision, VettingApplication,
};
use super::query::{ApplicationFilter, PagedResult};
use super::repository::{
    ApplicationDetail, ApplicationSummary, DecisionOutcome, MyApplicationStatus,
    NotificationPublisher, VettingRepository,
};
use super::service::VettingService;
use crate::api::{ApiError, ApiJson, Envelope, OptionalApiJson};
use crate::identity::{ActingUser, MemberDirectory};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WithdrawRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoteRequest {
    pub note: String,
}

/// Router exposing applicant and reviewer endpoints for vetting.
pub fn vetting_router<R, D, N>(service: Arc<VettingService<R, D, N>>) -> Router
where
    R: VettingRepository + 'static,
    D: MemberDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/vetting/applications", post(submit_handler::<R, D, N>))
        .route(
            "/api/vetting/applications/me",
            get(my_status_handler::<R, D, N>),
        )
        .route(
            "/api/vetting/applications/:application_id/withdraw",
            post(withdraw_handler::<R, D, N>),
        )
        .route(
            "/api/vetting/reviewer/applications",
            post(review_queue_handler::<R, D, N>),
        )
        .route(
            "/api/vetting/reviewer/applications/:application_id",
            get(detail_handler::<R, D, N>),
        )
        .route(
            "/api/vetting/reviewer/applications/:application_id/decisions",
            post(decision_handler::<R, D, N>),
        )
        .route(
            "/api/vetting/reviewer/applications/:application_id/notes",
            post(note_handler::<R, D, N>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<R, D, N>(
    State(service): State<Arc<VettingService<R, D, N>>>,
    ActingUser(user): ActingUser,
    ApiJson(submission): ApiJson<ApplicationSubmission>,
) -> Result<Envelope<VettingApplication>, ApiError>
where
    R: VettingRepository + 'static,
    D: MemberDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    service
        .submit(&user, submission, Utc::now())
        .map(Envelope::created)
        .map_err(ApiError::from_error)
}

pub(crate) async fn my_status_handler<R, D, N>(
    State(service): State<Arc<VettingService<R, D, N>>>,
    ActingUser(user): ActingUser,
) -> Result<Envelope<MyApplicationStatus>, ApiError>
where
    R: VettingRepository + 'static,
    D: MemberDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    service
        .status_for_user(&user, Utc::now())
        .map(Envelope::ok)
        .map_err(ApiError::from_error)
}

pub(crate) async fn withdraw_handler<R, D, N>(
    State(service): State<Arc<VettingService<R, D, N>>>,
    ActingUser(user): ActingUser,
    Path(application_id): Path<String>,
    OptionalApiJson(request): OptionalApiJson<WithdrawRequest>,
) -> Result<Envelope<VettingApplication>, ApiError>
where
    R: VettingRepository + 'static,
    D: MemberDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    let reason = request.and_then(|request| request.reason);
    service
        .withdraw(&ApplicationId(application_id), &user, reason, Utc::now())
        .map(|application| Envelope::ok(application).with_message("Application withdrawn"))
        .map_err(ApiError::from_error)
}

pub(crate) async fn review_queue_handler<R, D, N>(
    State(service): State<Arc<VettingService<R, D, N>>>,
    ActingUser(reviewer): ActingUser,
    ApiJson(filter): ApiJson<ApplicationFilter>,
) -> Result<Envelope<PagedResult<ApplicationSummary>>, ApiError>
where
    R: VettingRepository + 'static,
    D: MemberDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    service
        .applications_for_review(&filter, &reviewer, Utc::now())
        .map(Envelope::ok)
        .map_err(ApiError::from_error)
}

pub(crate) async fn detail_handler<R, D, N>(
    State(service): State<Arc<VettingService<R, D, N>>>,
    ActingUser(reviewer): ActingUser,
    Path(application_id): Path<String>,
) -> Result<Envelope<ApplicationDetail>, ApiError>
where
    R: VettingRepository + 'static,
    D: MemberDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    service
        .application_detail(&ApplicationId(application_id), &reviewer)
        .map(Envelope::ok)
        .map_err(ApiError::from_error)
}

pub(crate) async fn decision_handler<R, D, N>(
    State(service): State<Arc<VettingService<R, D, N>>>,
    ActingUser(reviewer): ActingUser,
    Path(application_id): Path<String>,
    ApiJson(decision): ApiJson<ReviewDecision>,
) -> Result<Envelope<DecisionOutcome>, ApiError>
where
    R: VettingRepository + 'static,
    D: MemberDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    service
        .submit_review_decision(
            &ApplicationId(application_id),
            decision,
            &reviewer,
            Utc::now(),
        )
        .map(Envelope::ok)
        .map_err(ApiError::from_error)
}

pub(crate) async fn note_handler<R, D, N>(
    State(service): State<Arc<VettingService<R, D, N>>>,
    ActingUser(reviewer): ActingUser,
    Path(application_id): Path<String>,
    ApiJson(request): ApiJson<NoteRequest>,
) -> Result<Envelope<ApplicationNote>, ApiError>
where
    R: VettingRepository + 'static,
    D: MemberDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    service
        .add_note(
            &ApplicationId(application_id),
            &request.note,
            &reviewer,
            Utc::now(),
        )
        .map(Envelope::created)
        .map_err(ApiError::from_error)
}
