use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;
use crate::workflows::events::{EventId, TicketTypeId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipationId(pub String);

impl std::fmt::Display for ParticipationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipationType {
    Rsvp,
    Ticket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipationStatus {
    Active,
    Cancelled,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participation {
    pub id: ParticipationId,
    pub event_id: EventId,
    pub user_id: UserId,
    pub participation_type: ParticipationType,
    pub status: ParticipationStatus,
    pub ticket_type_id: Option<TicketTypeId>,
    pub amount_cents: Option<u32>,
    pub payment_method_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

impl Participation {
    pub fn is_active(&self) -> bool {
        self.status == ParticipationStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryAction {
    Created,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationHistory {
    pub participation_id: ParticipationId,
    pub action: HistoryAction,
    pub old_status: Option<ParticipationStatus>,
    pub new_status: ParticipationStatus,
    pub performed_by: UserId,
    pub performed_at: DateTime<Utc>,
    pub reason: Option<String>,
}

/// Participation as returned to the caller after an RSVP or purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationStatusDto {
    pub id: ParticipationId,
    pub event_id: EventId,
    pub user_id: UserId,
    pub participation_type: ParticipationType,
    pub status: ParticipationStatus,
    pub ticket_type_id: Option<TicketTypeId>,
    pub amount_cents: Option<u32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub can_cancel: bool,
}

impl From<&Participation> for ParticipationStatusDto {
    fn from(participation: &Participation) -> Self {
        Self {
            id: participation.id.clone(),
            event_id: participation.event_id.clone(),
            user_id: participation.user_id.clone(),
            participation_type: participation.participation_type,
            status: participation.status,
            ticket_type_id: participation.ticket_type_id.clone(),
            amount_cents: participation.amount_cents,
            notes: participation.notes.clone(),
            created_at: participation.created_at,
            can_cancel: participation.is_active(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityView {
    pub current: u32,
    pub total: u32,
    pub available: u32,
}

/// Caller's standing for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationSummary {
    pub event_id: EventId,
    pub has_rsvp: bool,
    pub has_ticket: bool,
    pub can_rsvp: bool,
    pub can_purchase_ticket: bool,
    pub participation: Option<ParticipationStatusDto>,
    pub capacity: CapacityView,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RsvpRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketPurchaseRequest {
    pub ticket_type_id: Option<TicketTypeId>,
    pub amount_cents: Option<u32>,
    pub payment_method_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CancelRequest {
    pub reason: Option<String>,
}
