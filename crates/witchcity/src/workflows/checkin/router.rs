use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::Utc;

use super::domain::{CheckInRequest, CheckInResult};
use super::repository::{CheckInRepository, SyncQueueRepository};
use super::roster::ROSTER_CONTENT_TYPE;
use super::service::CheckInService;
use super::sync::{OfflineAction, StageOfflineRequest, SyncReport};
use super::views::{AttendeeList, AttendeeQuery, CheckInDashboard};
use crate::api::{ApiError, ApiJson, ApiQuery, Envelope};
use crate::identity::{ActingUser, MemberDirectory};
use crate::workflows::events::{EventId, EventRepository};

/// Router exposing the door-side check-in endpoints.
pub fn checkin_router<C, E, D, Q>(service: Arc<CheckInService<C, E, D, Q>>) -> Router
where
    C: CheckInRepository + 'static,
    E: EventRepository + 'static,
    D: MemberDirectory + 'static,
    Q: SyncQueueRepository + 'static,
{
    Router::new()
        .route(
            "/api/checkin/events/:event_id/checkin",
            post(check_in_handler::<C, E, D, Q>),
        )
        .route(
            "/api/checkin/events/:event_id/attendees",
            get(attendees_handler::<C, E, D, Q>),
        )
        .route(
            "/api/checkin/events/:event_id/dashboard",
            get(dashboard_handler::<C, E, D, Q>),
        )
        .route(
            "/api/checkin/events/:event_id/roster.csv",
            get(roster_handler::<C, E, D, Q>),
        )
        .route(
            "/api/checkin/events/:event_id/offline",
            post(stage_offline_handler::<C, E, D, Q>),
        )
        .route("/api/checkin/sync", post(sync_handler::<C, E, D, Q>))
        .with_state(service)
}

pub(crate) async fn check_in_handler<C, E, D, Q>(
    State(service): State<Arc<CheckInService<C, E, D, Q>>>,
    ActingUser(staff): ActingUser,
    Path(event_id): Path<String>,
    ApiJson(request): ApiJson<CheckInRequest>,
) -> Result<Envelope<CheckInResult>, ApiError>
where
    C: CheckInRepository + 'static,
    E: EventRepository + 'static,
    D: MemberDirectory + 'static,
    Q: SyncQueueRepository + 'static,
{
    service
        .check_in_attendee(&EventId(event_id), &request, &staff, Utc::now())
        .map(|result| {
            let message = result.message.clone();
            Envelope::ok(result).with_message(message)
        })
        .map_err(ApiError::from_error)
}

pub(crate) async fn attendees_handler<C, E, D, Q>(
    State(service): State<Arc<CheckInService<C, E, D, Q>>>,
    ActingUser(staff): ActingUser,
    Path(event_id): Path<String>,
    ApiQuery(query): ApiQuery<AttendeeQuery>,
) -> Result<Envelope<AttendeeList>, ApiError>
where
    C: CheckInRepository + 'static,
    E: EventRepository + 'static,
    D: MemberDirectory + 'static,
    Q: SyncQueueRepository + 'static,
{
    service
        .list_attendees(&EventId(event_id), &query, &staff)
        .map(Envelope::ok)
        .map_err(ApiError::from_error)
}

pub(crate) async fn dashboard_handler<C, E, D, Q>(
    State(service): State<Arc<CheckInService<C, E, D, Q>>>,
    ActingUser(staff): ActingUser,
    Path(event_id): Path<String>,
) -> Result<Envelope<CheckInDashboard>, ApiError>
where
    C: CheckInRepository + 'static,
    E: EventRepository + 'static,
    D: MemberDirectory + 'static,
    Q: SyncQueueRepository + 'static,
{
    service
        .dashboard(&EventId(event_id), &staff, Utc::now())
        .map(Envelope::ok)
        .map_err(ApiError::from_error)
}

pub(crate) async fn roster_handler<C, E, D, Q>(
    State(service): State<Arc<CheckInService<C, E, D, Q>>>,
    ActingUser(staff): ActingUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: CheckInRepository + 'static,
    E: EventRepository + 'static,
    D: MemberDirectory + 'static,
    Q: SyncQueueRepository + 'static,
{
    let csv = service
        .roster_csv(&EventId(event_id), &staff)
        .map_err(ApiError::from_error)?;
    Ok(([(header::CONTENT_TYPE, ROSTER_CONTENT_TYPE.as_ref().to_string())], csv))
}

pub(crate) async fn stage_offline_handler<C, E, D, Q>(
    State(service): State<Arc<CheckInService<C, E, D, Q>>>,
    ActingUser(staff): ActingUser,
    Path(event_id): Path<String>,
    ApiJson(request): ApiJson<StageOfflineRequest>,
) -> Result<Envelope<OfflineAction>, ApiError>
where
    C: CheckInRepository + 'static,
    E: EventRepository + 'static,
    D: MemberDirectory + 'static,
    Q: SyncQueueRepository + 'static,
{
    service
        .stage_offline(&EventId(event_id), &staff, request, Utc::now())
        .map(Envelope::created)
        .map_err(ApiError::from_error)
}

pub(crate) async fn sync_handler<C, E, D, Q>(
    State(service): State<Arc<CheckInService<C, E, D, Q>>>,
    ActingUser(staff): ActingUser,
) -> Result<Envelope<SyncReport>, ApiError>
where
    C: CheckInRepository + 'static,
    E: EventRepository + 'static,
    D: MemberDirectory + 'static,
    Q: SyncQueueRepository + 'static,
{
    service
        .authorize_staff(&staff)
        .and_then(|_| service.reconcile(Utc::now()))
        .map(Envelope::ok)
        .map_err(ApiError::from_error)
}
