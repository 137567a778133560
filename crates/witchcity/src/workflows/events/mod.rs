//! Event / session / ticket-type schedule and the capacity arithmetic built on it.

pub mod availability;
pub mod domain;
pub mod repository;

pub use availability::{CapacitySnapshot, SessionAvailability, TicketTypeAvailability};
pub use domain::{
    Event, EventId, EventType, PricingModel, Session, SessionId, TicketType, TicketTypeId,
};
pub use repository::EventRepository;
