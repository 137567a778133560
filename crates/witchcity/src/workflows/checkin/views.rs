use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AttendeeId, EventAttendee, RegistrationStatus};
use crate::api::PagedResult;
use crate::identity::UserId;
use crate::workflows::events::{Event, EventId};

pub const DEFAULT_ATTENDEE_PAGE_SIZE: usize = 50;
pub const MAX_ATTENDEE_PAGE_SIZE: usize = 100;

/// Door-side attendee search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttendeeQuery {
    pub search: Option<String>,
    pub status: Option<RegistrationStatus>,
    pub page: usize,
    pub page_size: usize,
}

impl Default for AttendeeQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            page: 1,
            page_size: DEFAULT_ATTENDEE_PAGE_SIZE,
        }
    }
}

impl AttendeeQuery {
    pub fn matches(&self, attendee: &EventAttendee) -> bool {
        if self
            .status
            .is_some_and(|status| status != attendee.registration_status)
        {
            return false;
        }

        match self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
        {
            Some(term) => {
                let needle = term.to_lowercase();
                attendee.scene_name.to_lowercase().contains(&needle)
                    || attendee.email.to_lowercase().contains(&needle)
                    || attendee
                        .ticket_number
                        .as_deref()
                        .is_some_and(|ticket| ticket.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeSummary {
    pub attendee_id: AttendeeId,
    pub user_id: UserId,
    pub scene_name: String,
    pub email: String,
    pub pronouns: Option<String>,
    pub registration_status: RegistrationStatus,
    pub ticket_number: Option<String>,
    pub check_in_time: Option<DateTime<Utc>>,
    pub is_first_time: bool,
    pub dietary_restrictions: Option<String>,
    pub accessibility_needs: Option<String>,
    pub has_completed_waiver: bool,
    pub waitlist_position: Option<u32>,
}

impl From<&EventAttendee> for AttendeeSummary {
    fn from(attendee: &EventAttendee) -> Self {
        Self {
            attendee_id: attendee.id.clone(),
            user_id: attendee.user_id.clone(),
            scene_name: attendee.scene_name.clone(),
            email: attendee.email.clone(),
            pronouns: attendee.pronouns.clone(),
            registration_status: attendee.registration_status,
            ticket_number: attendee.ticket_number.clone(),
            check_in_time: attendee.checked_in_at,
            is_first_time: attendee.is_first_time,
            dietary_restrictions: attendee.dietary_restrictions.clone(),
            accessibility_needs: attendee.accessibility_needs.clone(),
            has_completed_waiver: attendee.has_completed_waiver,
            waitlist_position: attendee.waitlist_position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoorCapacity {
    pub total: u32,
    pub checked_in: u32,
    pub waitlist: u32,
    pub available: u32,
}

impl DoorCapacity {
    pub fn of(event: &Event, attendees: &[EventAttendee]) -> Self {
        let waitlist = attendees
            .iter()
            .filter(|attendee| attendee.registration_status == RegistrationStatus::Waitlist)
            .count();

        Self {
            total: event.capacity,
            checked_in: event.checked_in_count,
            waitlist: u32::try_from(waitlist).unwrap_or(u32::MAX),
            available: event.capacity.saturating_sub(event.checked_in_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeList {
    pub event_id: EventId,
    pub event_title: String,
    pub starts_at: DateTime<Utc>,
    pub capacity: DoorCapacity,
    pub attendees: PagedResult<AttendeeSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventPhase {
    Upcoming,
    Active,
    Ended,
}

impl EventPhase {
    pub fn at(event: &Event, now: DateTime<Utc>) -> Self {
        if now < event.starts_at {
            EventPhase::Upcoming
        } else if now > event.ends_at {
            EventPhase::Ended
        } else {
            EventPhase::Active
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentCheckIn {
    pub attendee_id: AttendeeId,
    pub scene_name: String,
    pub check_in_time: DateTime<Utc>,
    pub staff_member_name: String,
    pub is_manual_entry: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub pending: usize,
    pub conflicts: usize,
    pub failed: usize,
    pub last_synced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInDashboard {
    pub event_id: EventId,
    pub event_title: String,
    pub starts_at: DateTime<Utc>,
    pub event_status: EventPhase,
    pub capacity: DoorCapacity,
    pub recent_check_ins: Vec<RecentCheckIn>,
    pub sync: SyncSummary,
}
