use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::identity::UserId;
use crate::store::{MemoryEventRepository, MemoryParticipationRepository, MemoryVettingRepository};
use crate::workflows::events::{
    Event, EventId, EventRepository, EventType, PricingModel, Session, SessionId, TicketType,
    TicketTypeId,
};
use crate::workflows::participation::{participation_router, ParticipationService};
use crate::workflows::vetting::{
    ApplicationId, ApplicationPriority, ExperienceLevel, VettingApplication, VettingRepository,
    VettingStatus,
};

pub(super) const MEMBER: &str = "member-1";
pub(super) const SOCIAL: &str = "evt-social";
pub(super) const CLASS: &str = "evt-class";

pub(super) type MemoryParticipationService = ParticipationService<
    MemoryParticipationRepository,
    MemoryEventRepository,
    MemoryVettingRepository,
>;

pub(super) struct Fixture {
    pub(super) service: MemoryParticipationService,
    pub(super) participations: Arc<MemoryParticipationRepository>,
    pub(super) vetting: Arc<MemoryVettingRepository>,
}

pub(super) fn user(id: &str) -> UserId {
    UserId(id.to_string())
}

pub(super) fn event_id(id: &str) -> EventId {
    EventId(id.to_string())
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn social_event(capacity: u32) -> Event {
    let starts_at = now() + Duration::days(10);
    Event {
        id: event_id(SOCIAL),
        title: "Monthly Rope Social".to_string(),
        event_type: EventType::Social,
        starts_at,
        ends_at: starts_at + Duration::hours(4),
        capacity,
        checked_in_count: 0,
        sessions: Vec::new(),
        ticket_types: Vec::new(),
    }
}

pub(super) fn class_event(capacity: u32) -> Event {
    let starts_at = now() + Duration::days(14);
    let day_one = Session {
        id: SessionId("s1".to_string()),
        name: "Day one".to_string(),
        starts_at,
        ends_at: starts_at + Duration::hours(3),
        capacity,
    };
    let day_two = Session {
        id: SessionId("s2".to_string()),
        name: "Day two".to_string(),
        starts_at: starts_at + Duration::days(1),
        ends_at: starts_at + Duration::days(1) + Duration::hours(3),
        capacity,
    };

    Event {
        id: event_id(CLASS),
        title: "Intro to Suspension".to_string(),
        event_type: EventType::Class,
        starts_at,
        ends_at: day_two.ends_at,
        capacity,
        checked_in_count: 0,
        sessions: vec![day_one, day_two],
        ticket_types: vec![
            TicketType {
                id: TicketTypeId("full".to_string()),
                name: "Full series".to_string(),
                pricing: PricingModel::SlidingScale {
                    min_cents: 5_000,
                    max_cents: 9_000,
                },
                session_ids: Vec::new(),
                quantity_limit: None,
            },
            TicketType {
                id: TicketTypeId("day-one".to_string()),
                name: "Day one only".to_string(),
                pricing: PricingModel::Fixed { price_cents: 3_500 },
                session_ids: vec![SessionId("s1".to_string())],
                quantity_limit: Some(1),
            },
        ],
    }
}

pub(super) fn fixture_with_capacity(capacity: u32) -> Fixture {
    let participations = Arc::new(MemoryParticipationRepository::default());
    let events = Arc::new(MemoryEventRepository::default());
    let vetting = Arc::new(MemoryVettingRepository::default());
    events
        .insert(social_event(capacity))
        .expect("social event seeded");
    events
        .insert(class_event(capacity))
        .expect("class event seeded");

    Fixture {
        service: ParticipationService::new(participations.clone(), events, vetting.clone()),
        participations,
        vetting,
    }
}

pub(super) fn fixture() -> Fixture {
    fixture_with_capacity(20)
}

/// Store an application for `user_id` directly, bypassing the review workflow.
pub(super) fn seed_application(
    vetting: &MemoryVettingRepository,
    user_id: &str,
    status: VettingStatus,
    submitted_at: DateTime<Utc>,
) -> VettingApplication {
    let application = VettingApplication {
        id: ApplicationId(format!("vet-{user_id}-{}", submitted_at.timestamp())),
        application_number: "VET-20260201-0001".to_string(),
        user_id: user(user_id),
        scene_name: "Knot Tying".to_string(),
        real_name: "Robin Vale".to_string(),
        email: "robin@example.com".to_string(),
        pronouns: None,
        experience_level: ExperienceLevel::Beginner,
        years_experience: 1,
        experience_description: "Workshops".to_string(),
        safety_knowledge: String::new(),
        consent_understanding: String::new(),
        why_join: "Community".to_string(),
        skills_interests: Vec::new(),
        is_anonymous: false,
        priority: ApplicationPriority::Standard,
        assigned_reviewer: None,
        references: Vec::new(),
        status,
        submitted_at,
        updated_at: submitted_at,
    };
    vetting
        .insert(application)
        .expect("application seeded")
}

pub(super) fn participation_router_with_service(
    service: MemoryParticipationService,
) -> axum::Router {
    participation_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
