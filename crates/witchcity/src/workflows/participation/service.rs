use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::domain::{
    CapacityView, HistoryAction, Participation, ParticipationHistory, ParticipationId,
    ParticipationStatus, ParticipationStatusDto, ParticipationSummary, ParticipationType,
    RsvpRequest, TicketPurchaseRequest,
};
use super::guard::{AccessDecision, AccessKind, ParticipationGuard};
use super::repository::ParticipationRepository;
use crate::api::{Classify, ErrorKind};
use crate::identity::UserId;
use crate::workflows::events::{
    CapacitySnapshot, Event, EventId, EventRepository, EventType, TicketType, TicketTypeId,
};
use crate::workflows::vetting::{VettingRepository, VettingStatus};
use crate::workflows::RepositoryError;

static PARTICIPATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_participation_id() -> ParticipationId {
    let id = PARTICIPATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ParticipationId(format!("part-{id:06}"))
}

/// RSVP, ticket purchase, and cancellation, each gated by the vetting guard.
pub struct ParticipationService<P, E, V> {
    participations: Arc<P>,
    events: Arc<E>,
    guard: ParticipationGuard<V>,
}

impl<P, E, V> ParticipationService<P, E, V>
where
    P: ParticipationRepository + 'static,
    E: EventRepository + 'static,
    V: VettingRepository + 'static,
{
    pub fn new(participations: Arc<P>, events: Arc<E>, vetting: Arc<V>) -> Self {
        Self {
            participations,
            events,
            guard: ParticipationGuard::new(vetting),
        }
    }

    pub fn create_rsvp(
        &self,
        event_id: &EventId,
        user: &UserId,
        request: RsvpRequest,
        now: DateTime<Utc>,
    ) -> Result<ParticipationStatusDto, ParticipationError> {
        self.ensure_access(user, event_id, AccessKind::Rsvp, now)?;
        let event = self.load_event(event_id)?;
        if event.event_type != EventType::Social {
            return Err(ParticipationError::WrongEventType(
                "RSVPs are only available for social events",
            ));
        }
        let snapshot = self.ensure_open_slot(&event, user)?;
        if !snapshot.can_claim(&event, None) {
            return Err(ParticipationError::AtCapacity);
        }

        let participation = Participation {
            id: next_participation_id(),
            event_id: event_id.clone(),
            user_id: user.clone(),
            participation_type: ParticipationType::Rsvp,
            status: ParticipationStatus::Active,
            ticket_type_id: None,
            amount_cents: None,
            payment_method_id: None,
            notes: request.notes,
            created_at: now,
            cancelled_at: None,
            cancellation_reason: None,
        };

        self.record_creation(participation, user, now)
    }

    pub fn purchase_ticket(
        &self,
        event_id: &EventId,
        user: &UserId,
        request: TicketPurchaseRequest,
        now: DateTime<Utc>,
    ) -> Result<ParticipationStatusDto, ParticipationError> {
        self.ensure_access(user, event_id, AccessKind::TicketPurchase, now)?;
        let event = self.load_event(event_id)?;
        if event.event_type != EventType::Class {
            return Err(ParticipationError::WrongEventType(
                "Tickets can only be purchased for class events",
            ));
        }
        let snapshot = self.ensure_open_slot(&event, user)?;

        let ticket_type = resolve_ticket_type(&event, request.ticket_type_id.as_ref())?;
        let amount = request
            .amount_cents
            .unwrap_or_else(|| ticket_type.pricing.default_amount());
        if !ticket_type.pricing.accepts(amount) {
            return Err(ParticipationError::InvalidAmount {
                ticket_type: ticket_type.id.clone(),
                amount_cents: amount,
            });
        }
        if !snapshot.can_claim(&event, Some(ticket_type)) {
            return Err(ParticipationError::AtCapacity);
        }

        let participation = Participation {
            id: next_participation_id(),
            event_id: event_id.clone(),
            user_id: user.clone(),
            participation_type: ParticipationType::Ticket,
            status: ParticipationStatus::Active,
            ticket_type_id: Some(ticket_type.id.clone()),
            amount_cents: Some(amount),
            payment_method_id: request.payment_method_id,
            notes: request.notes,
            created_at: now,
            cancelled_at: None,
            cancellation_reason: None,
        };

        self.record_creation(participation, user, now)
    }

    pub fn cancel(
        &self,
        event_id: &EventId,
        user: &UserId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ParticipationError> {
        self.load_event(event_id)?;
        let mut participation = self
            .participations
            .active_for(event_id, user)?
            .ok_or(ParticipationError::NoActiveParticipation)?;

        let reason = reason.filter(|reason| !reason.trim().is_empty());
        participation.status = ParticipationStatus::Cancelled;
        participation.cancelled_at = Some(now);
        participation.cancellation_reason = reason.clone();
        self.participations.update(participation.clone())?;
        self.participations.append_history(ParticipationHistory {
            participation_id: participation.id.clone(),
            action: HistoryAction::Cancelled,
            old_status: Some(ParticipationStatus::Active),
            new_status: ParticipationStatus::Cancelled,
            performed_by: user.clone(),
            performed_at: now,
            reason,
        })?;

        tracing::info!(
            participation_id = %participation.id,
            event_id = %event_id,
            user_id = %user,
            "participation cancelled"
        );
        Ok(())
    }

    pub fn status(
        &self,
        event_id: &EventId,
        user: &UserId,
    ) -> Result<ParticipationSummary, ParticipationError> {
        let event = self.load_event(event_id)?;
        let participations = self.participations.for_event(event_id)?;
        let snapshot = snapshot_of(&event, &participations);
        let mine = participations
            .iter()
            .find(|participation| participation.is_active() && &participation.user_id == user);

        let active_type = mine.map(|participation| participation.participation_type);
        let has_rsvp = active_type == Some(ParticipationType::Rsvp);
        let has_ticket = active_type == Some(ParticipationType::Ticket);

        let can_rsvp = event.event_type == EventType::Social
            && mine.is_none()
            && snapshot.can_claim(&event, None)
            && self.guard.decide(user, AccessKind::Rsvp)?.is_allowed();
        let can_purchase_ticket = event.event_type == EventType::Class
            && mine.is_none()
            && event
                .ticket_types
                .iter()
                .any(|ticket| snapshot.can_claim(&event, Some(ticket)))
            && self
                .guard
                .decide(user, AccessKind::TicketPurchase)?
                .is_allowed();

        Ok(ParticipationSummary {
            event_id: event_id.clone(),
            has_rsvp,
            has_ticket,
            can_rsvp,
            can_purchase_ticket,
            participation: mine.map(ParticipationStatusDto::from),
            capacity: CapacityView {
                current: snapshot.current,
                total: snapshot.total,
                available: snapshot.available,
            },
        })
    }

    fn ensure_access(
        &self,
        user: &UserId,
        event_id: &EventId,
        kind: AccessKind,
        now: DateTime<Utc>,
    ) -> Result<(), ParticipationError> {
        match self.guard.check(user, event_id, kind, now)? {
            AccessDecision::Allowed { .. } => Ok(()),
            AccessDecision::Denied {
                vetting_status,
                user_message,
                ..
            } => Err(ParticipationError::AccessDenied {
                status: vetting_status,
                message: user_message,
            }),
        }
    }

    fn load_event(&self, event_id: &EventId) -> Result<Event, ParticipationError> {
        self.events
            .fetch(event_id)?
            .ok_or_else(|| ParticipationError::EventNotFound(event_id.clone()))
    }

    /// Rejects a second active participation and returns the current capacity picture.
    fn ensure_open_slot(
        &self,
        event: &Event,
        user: &UserId,
    ) -> Result<CapacitySnapshot, ParticipationError> {
        let participations = self.participations.for_event(&event.id)?;
        if participations
            .iter()
            .any(|participation| participation.is_active() && &participation.user_id == user)
        {
            return Err(ParticipationError::AlreadyParticipating);
        }
        Ok(snapshot_of(event, &participations))
    }

    fn record_creation(
        &self,
        participation: Participation,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<ParticipationStatusDto, ParticipationError> {
        let stored = self.participations.insert(participation)?;
        self.participations.append_history(ParticipationHistory {
            participation_id: stored.id.clone(),
            action: HistoryAction::Created,
            old_status: None,
            new_status: stored.status,
            performed_by: user.clone(),
            performed_at: now,
            reason: None,
        })?;

        tracing::info!(
            participation_id = %stored.id,
            event_id = %stored.event_id,
            user_id = %user,
            participation_type = ?stored.participation_type,
            "participation created"
        );
        Ok(ParticipationStatusDto::from(&stored))
    }
}

fn snapshot_of(event: &Event, participations: &[Participation]) -> CapacitySnapshot {
    CapacitySnapshot::compute(
        event,
        participations
            .iter()
            .filter(|participation| participation.is_active())
            .map(|participation| participation.ticket_type_id.as_ref()),
    )
}

fn resolve_ticket_type<'a>(
    event: &'a Event,
    requested: Option<&TicketTypeId>,
) -> Result<&'a TicketType, ParticipationError> {
    match requested {
        Some(id) => event
            .ticket_type(id)
            .ok_or_else(|| ParticipationError::TicketTypeNotFound(id.clone())),
        None => event
            .ticket_types
            .first()
            .ok_or(ParticipationError::NoTicketTypes),
    }
}

/// Error raised by the participation service.
#[derive(Debug, thiserror::Error)]
pub enum ParticipationError {
    #[error("{message} (Vetting status: {status})")]
    AccessDenied {
        status: VettingStatus,
        message: &'static str,
    },
    #[error("Event {0} not found")]
    EventNotFound(EventId),
    #[error("{0}")]
    WrongEventType(&'static str),
    #[error("User already has an active participation for this event")]
    AlreadyParticipating,
    #[error("Event is at full capacity")]
    AtCapacity,
    #[error("Ticket type {0} not found")]
    TicketTypeNotFound(TicketTypeId),
    #[error("Event has no ticket types available")]
    NoTicketTypes,
    #[error("Amount {amount_cents} is not valid for ticket type {ticket_type}")]
    InvalidAmount {
        ticket_type: TicketTypeId,
        amount_cents: u32,
    },
    #[error("No active participation found for this event")]
    NoActiveParticipation,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl Classify for ParticipationError {
    fn kind(&self) -> ErrorKind {
        match self {
            ParticipationError::AccessDenied { .. } => ErrorKind::Forbidden,
            ParticipationError::EventNotFound(_) | ParticipationError::TicketTypeNotFound(_) => {
                ErrorKind::NotFound
            }
            ParticipationError::WrongEventType(_)
            | ParticipationError::NoTicketTypes
            | ParticipationError::InvalidAmount { .. }
            | ParticipationError::NoActiveParticipation => ErrorKind::Validation,
            ParticipationError::AlreadyParticipating | ParticipationError::AtCapacity => {
                ErrorKind::Conflict
            }
            ParticipationError::Repository(error) => error.kind(),
        }
    }
}
