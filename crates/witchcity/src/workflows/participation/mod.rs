//! Event participation (RSVPs and tickets) behind the vetting access guard.

pub mod domain;
pub mod guard;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    CancelRequest, CapacityView, HistoryAction, Participation, ParticipationHistory,
    ParticipationId, ParticipationStatus, ParticipationStatusDto, ParticipationSummary,
    ParticipationType, RsvpRequest, TicketPurchaseRequest,
};
pub use guard::{AccessDecision, AccessKind, ParticipationGuard};
pub use repository::ParticipationRepository;
pub use router::participation_router;
pub use service::{ParticipationError, ParticipationService};
