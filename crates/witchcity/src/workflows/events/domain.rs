use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(EventId);
string_id!(SessionId);
string_id!(TicketTypeId);

/// Classes are ticketed; socials take free RSVPs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Class,
    Social,
}

/// Prices are whole cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "camelCase")]
pub enum PricingModel {
    #[serde(rename_all = "camelCase")]
    Fixed { price_cents: u32 },
    #[serde(rename_all = "camelCase")]
    SlidingScale { min_cents: u32, max_cents: u32 },
}

impl PricingModel {
    pub fn accepts(&self, amount_cents: u32) -> bool {
        match *self {
            PricingModel::Fixed { price_cents } => amount_cents == price_cents,
            PricingModel::SlidingScale {
                min_cents,
                max_cents,
            } => (min_cents..=max_cents).contains(&amount_cents),
        }
    }

    /// Amount charged when the buyer does not name one.
    pub fn default_amount(&self) -> u32 {
        match *self {
            PricingModel::Fixed { price_cents } => price_cents,
            PricingModel::SlidingScale { min_cents, .. } => min_cents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketType {
    pub id: TicketTypeId,
    pub name: String,
    pub pricing: PricingModel,
    /// Sessions admitted by the ticket; empty admits every session.
    #[serde(default)]
    pub session_ids: Vec<SessionId>,
    #[serde(default)]
    pub quantity_limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub event_type: EventType,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub capacity: u32,
    #[serde(default)]
    pub checked_in_count: u32,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub ticket_types: Vec<TicketType>,
}

impl Event {
    pub fn ticket_type(&self, id: &TicketTypeId) -> Option<&TicketType> {
        self.ticket_types.iter().find(|ticket| &ticket.id == id)
    }

    /// Sessions a claim occupies. RSVPs (no ticket type) occupy every session.
    pub fn sessions_for(&self, ticket_type: Option<&TicketType>) -> Vec<&Session> {
        match ticket_type {
            Some(ticket) if !ticket.session_ids.is_empty() => self
                .sessions
                .iter()
                .filter(|session| ticket.session_ids.contains(&session.id))
                .collect(),
            _ => self.sessions.iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliding_scale_accepts_inclusive_bounds() {
        let pricing = PricingModel::SlidingScale {
            min_cents: 1500,
            max_cents: 4000,
        };
        assert!(pricing.accepts(1500));
        assert!(pricing.accepts(4000));
        assert!(!pricing.accepts(1499));
        assert!(!pricing.accepts(4001));
        assert_eq!(pricing.default_amount(), 1500);
    }

    #[test]
    fn fixed_price_requires_exact_amount() {
        let pricing = PricingModel::Fixed { price_cents: 2500 };
        assert!(pricing.accepts(2500));
        assert!(!pricing.accepts(2000));
    }

    #[test]
    fn pricing_serializes_with_model_tag() {
        let json = serde_json::to_value(PricingModel::Fixed { price_cents: 2500 })
            .expect("pricing serializes");
        assert_eq!(json["model"], serde_json::json!("fixed"));
        assert_eq!(json["priceCents"], serde_json::json!(2500));
    }
}
