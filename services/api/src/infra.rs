use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use witchcity::config::{CheckInConfig, VettingConfig};
use witchcity::identity::{Member, Role, UserId};
use witchcity::store::{
    MemoryCheckInRepository, MemoryDirectory, MemoryEventRepository,
    MemoryParticipationRepository, MemorySyncQueue, MemoryVettingRepository,
    RecordingNotifications,
};
use witchcity::workflows::checkin::{
    AttendeeId, CheckInRepository, CheckInService, EmergencyContact, EventAttendee,
    RegistrationStatus,
};
use witchcity::workflows::events::{
    Event, EventId, EventRepository, EventType, PricingModel, Session, SessionId, TicketType,
    TicketTypeId,
};
use witchcity::workflows::participation::ParticipationService;
use witchcity::workflows::vetting::VettingService;
use witchcity::workflows::RepositoryError;

pub(crate) const DEMO_ADMIN: &str = "admin-morgan";
pub(crate) const DEMO_REVIEWER: &str = "reviewer-quinn";
pub(crate) const DEMO_DOOR_STAFF: &str = "staff-rowan";
pub(crate) const DEMO_APPLICANT: &str = "member-ember";
pub(crate) const DEMO_GUEST: &str = "member-sage";
pub(crate) const DEMO_SOCIAL: &str = "evt-rope-jam";
pub(crate) const DEMO_CLASS: &str = "evt-suspension-101";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type AppVettingService =
    VettingService<MemoryVettingRepository, MemoryDirectory, RecordingNotifications>;
pub(crate) type AppParticipationService = ParticipationService<
    MemoryParticipationRepository,
    MemoryEventRepository,
    MemoryVettingRepository,
>;
pub(crate) type AppCheckInService = CheckInService<
    MemoryCheckInRepository,
    MemoryEventRepository,
    MemoryDirectory,
    MemorySyncQueue,
>;

/// In-process stores shared by every workflow service.
#[derive(Default, Clone)]
pub(crate) struct Stores {
    pub(crate) vetting: Arc<MemoryVettingRepository>,
    pub(crate) directory: Arc<MemoryDirectory>,
    pub(crate) notifications: Arc<RecordingNotifications>,
    pub(crate) events: Arc<MemoryEventRepository>,
    pub(crate) participations: Arc<MemoryParticipationRepository>,
    pub(crate) attendees: Arc<MemoryCheckInRepository>,
    pub(crate) queue: Arc<MemorySyncQueue>,
}

pub(crate) struct Services {
    pub(crate) vetting: Arc<AppVettingService>,
    pub(crate) participation: Arc<AppParticipationService>,
    pub(crate) checkin: Arc<AppCheckInService>,
}

impl Stores {
    pub(crate) fn services(&self, vetting: VettingConfig, checkin: CheckInConfig) -> Services {
        Services {
            vetting: Arc::new(VettingService::new(
                self.vetting.clone(),
                self.directory.clone(),
                self.notifications.clone(),
                vetting,
            )),
            participation: Arc::new(ParticipationService::new(
                self.participations.clone(),
                self.events.clone(),
                self.vetting.clone(),
            )),
            checkin: Arc::new(CheckInService::new(
                self.attendees.clone(),
                self.events.clone(),
                self.directory.clone(),
                self.queue.clone(),
                checkin,
            )),
        }
    }

    /// Seed members, two upcoming events, and door registrations relative to `now`.
    pub(crate) fn seed(&self, now: DateTime<Utc>) -> Result<(), RepositoryError> {
        for member in demo_members() {
            self.directory.add(member);
        }

        let social_start = now + Duration::minutes(15);
        self.events.insert(Event {
            id: EventId(DEMO_SOCIAL.to_string()),
            title: "Friday Rope Jam".to_string(),
            event_type: EventType::Social,
            starts_at: social_start,
            ends_at: social_start + Duration::hours(3),
            capacity: 30,
            checked_in_count: 0,
            sessions: Vec::new(),
            ticket_types: Vec::new(),
        })?;

        let class_start = now + Duration::days(7);
        self.events.insert(Event {
            id: EventId(DEMO_CLASS.to_string()),
            title: "Suspension Fundamentals".to_string(),
            event_type: EventType::Class,
            starts_at: class_start,
            ends_at: class_start + Duration::days(1) + Duration::hours(3),
            capacity: 12,
            checked_in_count: 0,
            sessions: vec![
                Session {
                    id: SessionId("sus-day-1".to_string()),
                    name: "Ties and safety".to_string(),
                    starts_at: class_start,
                    ends_at: class_start + Duration::hours(3),
                    capacity: 12,
                },
                Session {
                    id: SessionId("sus-day-2".to_string()),
                    name: "First lifts".to_string(),
                    starts_at: class_start + Duration::days(1),
                    ends_at: class_start + Duration::days(1) + Duration::hours(3),
                    capacity: 10,
                },
            ],
            ticket_types: vec![TicketType {
                id: TicketTypeId("sus-full".to_string()),
                name: "Both days".to_string(),
                pricing: PricingModel::SlidingScale {
                    min_cents: 6_000,
                    max_cents: 12_000,
                },
                session_ids: Vec::new(),
                quantity_limit: None,
            }],
        })?;

        for attendee in demo_attendees() {
            self.attendees.insert_attendee(attendee)?;
        }
        Ok(())
    }
}

fn member(id: &str, name: &str, roles: Vec<Role>) -> Member {
    Member {
        id: UserId(id.to_string()),
        display_name: name.to_string(),
        pronounced_name: None,
        pronouns: None,
        email: format!("{id}@witchcityrope.example"),
        roles,
    }
}

fn demo_members() -> Vec<Member> {
    let mut guest = member(DEMO_GUEST, "Saoirse", vec![Role::Member]);
    guest.pronounced_name = Some("SEER-sha".to_string());
    guest.pronouns = Some("she/her".to_string());

    vec![
        member(DEMO_ADMIN, "Morgan", vec![Role::Administrator]),
        member(DEMO_REVIEWER, "Quinn", vec![Role::VettingReviewer]),
        member(DEMO_DOOR_STAFF, "Rowan", vec![Role::CheckInStaff]),
        member(DEMO_APPLICANT, "Ember", vec![Role::Member]),
        guest,
    ]
}

fn demo_attendees() -> Vec<EventAttendee> {
    let event_id = EventId(DEMO_SOCIAL.to_string());
    let registration = |id: &str, user: &str, name: &str, code: &str| EventAttendee {
        id: AttendeeId(id.to_string()),
        event_id: event_id.clone(),
        user_id: UserId(user.to_string()),
        scene_name: name.to_string(),
        email: format!("{user}@witchcityrope.example"),
        pronouns: None,
        registration_status: RegistrationStatus::Confirmed,
        ticket_number: Some(format!("JAM-{code}")),
        confirmation_code: format!("WCR-{code}"),
        waitlist_position: None,
        dietary_restrictions: None,
        accessibility_needs: None,
        emergency_contact: Some(EmergencyContact {
            name: "Front desk".to_string(),
            phone: "555-0199".to_string(),
        }),
        has_completed_waiver: true,
        is_first_time: false,
        checked_in_at: None,
        checked_in_by: None,
    };

    let mut guest = registration("att-sage", DEMO_GUEST, "Saoirse", "2001");
    guest.is_first_time = true;
    guest.accessibility_needs = Some("Seating near the exit".to_string());

    let mut unsigned = registration("att-lark", "member-lark", "Lark", "2002");
    unsigned.has_completed_waiver = false;

    let mut waitlisted = registration("att-wren", "member-wren", "Wren", "2003");
    waitlisted.registration_status = RegistrationStatus::Waitlist;
    waitlisted.waitlist_position = Some(1);

    let mut regular = registration("att-fern", "member-fern", "Fern", "2004");
    regular.dietary_restrictions = Some("Vegan".to_string());

    vec![guest, unsigned, waitlisted, regular]
}
