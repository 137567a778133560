use std::collections::HashMap;

use serde::Serialize;

use super::domain::{Event, SessionId, TicketType, TicketTypeId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAvailability {
    pub session_id: SessionId,
    pub name: String,
    pub capacity: u32,
    pub reserved: u32,
    pub available: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketTypeAvailability {
    pub ticket_type_id: TicketTypeId,
    pub name: String,
    pub sold: u32,
    pub quantity_limit: Option<u32>,
    pub remaining: Option<u32>,
}

/// Remaining room for one event, derived from its active participations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacitySnapshot {
    pub total: u32,
    pub current: u32,
    pub available: u32,
    pub sessions: Vec<SessionAvailability>,
    pub ticket_types: Vec<TicketTypeAvailability>,
}

impl CapacitySnapshot {
    /// Each item of `claims` is one active participation, carrying its ticket type when it
    /// is a ticket.
    pub fn compute<'a>(
        event: &Event,
        claims: impl IntoIterator<Item = Option<&'a TicketTypeId>>,
    ) -> Self {
        let mut current = 0u32;
        let mut per_session: HashMap<&SessionId, u32> = HashMap::new();
        let mut per_ticket: HashMap<&TicketTypeId, u32> = HashMap::new();

        for claim in claims {
            current += 1;
            let ticket_type = claim.and_then(|id| event.ticket_type(id));
            if let Some(ticket) = ticket_type {
                *per_ticket.entry(&ticket.id).or_default() += 1;
            }
            for session in event.sessions_for(ticket_type) {
                *per_session.entry(&session.id).or_default() += 1;
            }
        }

        let sessions = event
            .sessions
            .iter()
            .map(|session| {
                let reserved = per_session.get(&session.id).copied().unwrap_or(0);
                SessionAvailability {
                    session_id: session.id.clone(),
                    name: session.name.clone(),
                    capacity: session.capacity,
                    reserved,
                    available: session.capacity.saturating_sub(reserved),
                }
            })
            .collect();

        let ticket_types = event
            .ticket_types
            .iter()
            .map(|ticket| {
                let sold = per_ticket.get(&ticket.id).copied().unwrap_or(0);
                TicketTypeAvailability {
                    ticket_type_id: ticket.id.clone(),
                    name: ticket.name.clone(),
                    sold,
                    quantity_limit: ticket.quantity_limit,
                    remaining: ticket.quantity_limit.map(|limit| limit.saturating_sub(sold)),
                }
            })
            .collect();

        Self {
            total: event.capacity,
            current,
            available: event.capacity.saturating_sub(current),
            sessions,
            ticket_types,
        }
    }

    /// Whether one more claim for `ticket_type` (or an RSVP when `None`) fits.
    pub fn can_claim(&self, event: &Event, ticket_type: Option<&TicketType>) -> bool {
        if let Some(ticket) = ticket_type {
            let sold_out = self
                .ticket_types
                .iter()
                .find(|entry| entry.ticket_type_id == ticket.id)
                .and_then(|entry| entry.remaining)
                .is_some_and(|remaining| remaining == 0);
            if sold_out {
                return false;
            }
        }

        if event.sessions.is_empty() {
            return self.available > 0;
        }

        event.sessions_for(ticket_type).iter().all(|session| {
            self.sessions
                .iter()
                .find(|entry| entry.session_id == session.id)
                .is_some_and(|entry| entry.available > 0)
        })
    }
}
