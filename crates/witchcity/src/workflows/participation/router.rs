use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::Utc;

use super::domain::{
    CancelRequest, ParticipationStatusDto, ParticipationSummary, RsvpRequest,
    TicketPurchaseRequest,
};
use super::repository::ParticipationRepository;
use super::service::ParticipationService;
use crate::api::{ApiError, Envelope, OptionalApiJson};
use crate::identity::ActingUser;
use crate::workflows::events::{EventId, EventRepository};
use crate::workflows::vetting::VettingRepository;

/// Router exposing RSVP, ticket purchase, and cancellation endpoints.
pub fn participation_router<P, E, V>(service: Arc<ParticipationService<P, E, V>>) -> Router
where
    P: ParticipationRepository + 'static,
    E: EventRepository + 'static,
    V: VettingRepository + 'static,
{
    Router::new()
        .route("/api/events/:event_id/rsvp", post(rsvp_handler::<P, E, V>))
        .route(
            "/api/events/:event_id/tickets",
            post(ticket_handler::<P, E, V>),
        )
        .route(
            "/api/events/:event_id/participation",
            get(status_handler::<P, E, V>).delete(cancel_handler::<P, E, V>),
        )
        .with_state(service)
}

pub(crate) async fn rsvp_handler<P, E, V>(
    State(service): State<Arc<ParticipationService<P, E, V>>>,
    ActingUser(user): ActingUser,
    Path(event_id): Path<String>,
    OptionalApiJson(request): OptionalApiJson<RsvpRequest>,
) -> Result<Envelope<ParticipationStatusDto>, ApiError>
where
    P: ParticipationRepository + 'static,
    E: EventRepository + 'static,
    V: VettingRepository + 'static,
{
    let request = request.unwrap_or_default();
    service
        .create_rsvp(&EventId(event_id), &user, request, Utc::now())
        .map(|dto| Envelope::created(dto).with_message("RSVP confirmed"))
        .map_err(ApiError::from_error)
}

pub(crate) async fn ticket_handler<P, E, V>(
    State(service): State<Arc<ParticipationService<P, E, V>>>,
    ActingUser(user): ActingUser,
    Path(event_id): Path<String>,
    OptionalApiJson(request): OptionalApiJson<TicketPurchaseRequest>,
) -> Result<Envelope<ParticipationStatusDto>, ApiError>
where
    P: ParticipationRepository + 'static,
    E: EventRepository + 'static,
    V: VettingRepository + 'static,
{
    let request = request.unwrap_or_default();
    service
        .purchase_ticket(&EventId(event_id), &user, request, Utc::now())
        .map(|dto| Envelope::created(dto).with_message("Ticket purchased"))
        .map_err(ApiError::from_error)
}

pub(crate) async fn cancel_handler<P, E, V>(
    State(service): State<Arc<ParticipationService<P, E, V>>>,
    ActingUser(user): ActingUser,
    Path(event_id): Path<String>,
    OptionalApiJson(request): OptionalApiJson<CancelRequest>,
) -> Result<StatusCode, ApiError>
where
    P: ParticipationRepository + 'static,
    E: EventRepository + 'static,
    V: VettingRepository + 'static,
{
    let reason = request.and_then(|request| request.reason);
    service
        .cancel(&EventId(event_id), &user, reason, Utc::now())
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(ApiError::from_error)
}

pub(crate) async fn status_handler<P, E, V>(
    State(service): State<Arc<ParticipationService<P, E, V>>>,
    ActingUser(user): ActingUser,
    Path(event_id): Path<String>,
) -> Result<Envelope<ParticipationSummary>, ApiError>
where
    P: ParticipationRepository + 'static,
    E: EventRepository + 'static,
    V: VettingRepository + 'static,
{
    service
        .status(&EventId(event_id), &user)
        .map(Envelope::ok)
        .map_err(ApiError::from_error)
}
