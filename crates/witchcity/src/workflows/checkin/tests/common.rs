use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::config::CheckInConfig;
use crate::identity::{Member, Role, UserId};
use crate::store::{
    MemoryCheckInRepository, MemoryDirectory, MemoryEventRepository, MemorySyncQueue,
};
use crate::workflows::checkin::{
    checkin_router, AttendeeId, AttendeeIdentifier, CheckInRepository, CheckInRequest,
    CheckInService, EmergencyContact, EventAttendee, RegistrationStatus,
};
use crate::workflows::events::{Event, EventId, EventRepository, EventType};

pub(super) const EVENT: &str = "evt-jam";
pub(super) const STAFF: &str = "staff-door";
pub(super) const MEMBER: &str = "member-plain";

pub(super) type MemoryCheckInService = CheckInService<
    MemoryCheckInRepository,
    MemoryEventRepository,
    MemoryDirectory,
    MemorySyncQueue,
>;

pub(super) struct Fixture {
    pub(super) service: MemoryCheckInService,
    pub(super) attendees: Arc<MemoryCheckInRepository>,
    pub(super) events: Arc<MemoryEventRepository>,
    pub(super) queue: Arc<MemorySyncQueue>,
}

pub(super) fn user(id: &str) -> UserId {
    UserId(id.to_string())
}

pub(super) fn event_id() -> EventId {
    EventId(EVENT.to_string())
}

pub(super) fn starts_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 18, 19, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn event(capacity: u32) -> Event {
    Event {
        id: event_id(),
        title: "Spring Rope Jam".to_string(),
        event_type: EventType::Social,
        starts_at: starts_at(),
        ends_at: starts_at() + Duration::hours(4),
        capacity,
        checked_in_count: 0,
        sessions: Vec::new(),
        ticket_types: Vec::new(),
    }
}

pub(super) fn attendee(id: &str, user_id: &str, code: &str) -> EventAttendee {
    EventAttendee {
        id: AttendeeId(id.to_string()),
        event_id: event_id(),
        user_id: user(user_id),
        scene_name: format!("Scene {id}"),
        email: format!("{user_id}@example.com"),
        pronouns: Some("she/her".to_string()),
        registration_status: RegistrationStatus::Confirmed,
        ticket_number: Some(format!("T-{id}")),
        confirmation_code: code.to_string(),
        waitlist_position: None,
        dietary_restrictions: None,
        accessibility_needs: None,
        emergency_contact: Some(EmergencyContact {
            name: "Alex".to_string(),
            phone: "555-0100".to_string(),
        }),
        has_completed_waiver: true,
        is_first_time: false,
        checked_in_at: None,
        checked_in_by: None,
    }
}

pub(super) fn directory() -> MemoryDirectory {
    MemoryDirectory::with_members([
        Member {
            id: user(STAFF),
            display_name: "Door Captain".to_string(),
            pronounced_name: None,
            pronouns: None,
            email: "door@example.com".to_string(),
            roles: vec![Role::CheckInStaff],
        },
        Member {
            id: user(MEMBER),
            display_name: "Plain Member".to_string(),
            pronounced_name: None,
            pronouns: None,
            email: "member@example.com".to_string(),
            roles: vec![Role::Member],
        },
        Member {
            id: user("member-siobhan"),
            display_name: "Siobhan".to_string(),
            pronounced_name: Some("shiv-AWN".to_string()),
            pronouns: None,
            email: "siobhan@example.com".to_string(),
            roles: vec![Role::Member],
        },
    ])
}

pub(super) fn fixture_with(capacity: u32, attendees: Vec<EventAttendee>) -> Fixture {
    fixture_configured(capacity, attendees, CheckInConfig::default())
}

pub(super) fn fixture_configured(
    capacity: u32,
    attendees: Vec<EventAttendee>,
    config: CheckInConfig,
) -> Fixture {
    let repository = Arc::new(MemoryCheckInRepository::default());
    let events = Arc::new(MemoryEventRepository::default());
    let queue = Arc::new(MemorySyncQueue::default());
    events.insert(event(capacity)).expect("event seeded");
    for attendee in attendees {
        repository
            .insert_attendee(attendee)
            .expect("attendee seeded");
    }

    Fixture {
        service: CheckInService::new(
            repository.clone(),
            events.clone(),
            Arc::new(directory()),
            queue.clone(),
            config,
        ),
        attendees: repository,
        events,
        queue,
    }
}

pub(super) fn fixture() -> Fixture {
    fixture_with(
        40,
        vec![
            attendee("att-1", "member-ada", "WCR-1001"),
            attendee("att-2", "member-siobhan", "WCR-1002"),
        ],
    )
}

pub(super) fn by_code(code: &str) -> CheckInRequest {
    CheckInRequest {
        identifier: AttendeeIdentifier {
            confirmation_code: Some(code.to_string()),
            ..AttendeeIdentifier::default()
        },
        ..CheckInRequest::default()
    }
}

pub(super) fn checkin_router_with_service(service: MemoryCheckInService) -> axum::Router {
    checkin_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
