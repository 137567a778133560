use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;
use crate::workflows::events::EventId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttendeeId(pub String);

impl std::fmt::Display for AttendeeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistrationStatus {
    Confirmed,
    Waitlist,
    CheckedIn,
    NoShow,
    Cancelled,
}

impl RegistrationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Waitlist => "waitlist",
            RegistrationStatus::CheckedIn => "checked-in",
            RegistrationStatus::NoShow => "no-show",
            RegistrationStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
}

/// A user's registration for one event, as seen at the door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAttendee {
    pub id: AttendeeId,
    pub event_id: EventId,
    pub user_id: UserId,
    pub scene_name: String,
    pub email: String,
    pub pronouns: Option<String>,
    pub registration_status: RegistrationStatus,
    pub ticket_number: Option<String>,
    pub confirmation_code: String,
    pub waitlist_position: Option<u32>,
    pub dietary_restrictions: Option<String>,
    pub accessibility_needs: Option<String>,
    pub emergency_contact: Option<EmergencyContact>,
    pub has_completed_waiver: bool,
    pub is_first_time: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_in_by: Option<UserId>,
}

impl EventAttendee {
    pub fn is_checked_in(&self) -> bool {
        self.checked_in_at.is_some() || self.registration_status == RegistrationStatus::CheckedIn
    }
}

/// One recorded arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub id: String,
    pub attendee_id: AttendeeId,
    pub event_id: EventId,
    pub check_in_time: DateTime<Utc>,
    pub staff_member_id: UserId,
    pub is_manual_entry: bool,
    pub override_capacity: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckInAuditAction {
    CheckIn,
    ManualEntry,
    CapacityOverride,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInAuditEntry {
    pub event_id: EventId,
    pub attendee_id: AttendeeId,
    pub action: CheckInAuditAction,
    pub description: String,
    pub staff_member_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// How staff located the attendee. Fields are tried in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttendeeIdentifier {
    pub confirmation_code: Option<String>,
    /// `<event_id>:<attendee_id>` as printed on the ticket QR code.
    pub qr_code: Option<String>,
    pub user_id: Option<UserId>,
}

impl AttendeeIdentifier {
    pub fn is_empty(&self) -> bool {
        let blank = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .map_or(true, str::is_empty)
        };
        blank(&self.confirmation_code)
            && blank(&self.qr_code)
            && self
                .user_id
                .as_ref()
                .map_or(true, |user| user.0.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckInRequest {
    #[serde(flatten)]
    pub identifier: AttendeeIdentifier,
    pub override_restrictions: bool,
    pub is_manual_entry: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckInStatus {
    Success,
    AlreadyCheckedIn,
    NotRegistered,
    EventNotStarted,
    EventEnded,
    WaiverRequired,
    CapacityOverrideRequired,
}

impl CheckInStatus {
    pub const fn message(self) -> &'static str {
        match self {
            CheckInStatus::Success => "Check-in successful",
            CheckInStatus::AlreadyCheckedIn => "Attendee already checked in",
            CheckInStatus::NotRegistered => "No registration found for this event",
            CheckInStatus::EventNotStarted => "Check-in is not open yet for this event",
            CheckInStatus::EventEnded => "This event has already ended",
            CheckInStatus::WaiverRequired => "Waiver must be completed before check-in",
            CheckInStatus::CapacityOverrideRequired => {
                "Event at capacity. Override required for waitlist check-in."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeDetails {
    pub attendee_id: AttendeeId,
    pub user_id: UserId,
    pub scene_name: String,
    pub pronouns: Option<String>,
    pub ticket_number: Option<String>,
    pub registration_status: RegistrationStatus,
    pub is_first_time: bool,
    pub has_completed_waiver: bool,
}

impl From<&EventAttendee> for AttendeeDetails {
    fn from(attendee: &EventAttendee) -> Self {
        Self {
            attendee_id: attendee.id.clone(),
            user_id: attendee.user_id.clone(),
            scene_name: attendee.scene_name.clone(),
            pronouns: attendee.pronouns.clone(),
            ticket_number: attendee.ticket_number.clone(),
            registration_status: attendee.registration_status,
            is_first_time: attendee.is_first_time,
            has_completed_waiver: attendee.has_completed_waiver,
        }
    }
}

/// Outcome of a check-in attempt. Every door-side rejection is reported here rather than
/// as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResult {
    pub status: CheckInStatus,
    pub message: String,
    pub attendee: Option<AttendeeDetails>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub special_notes: Option<String>,
}

impl CheckInResult {
    pub fn rejected(status: CheckInStatus, attendee: Option<&EventAttendee>) -> Self {
        Self {
            status,
            message: status.message().to_string(),
            attendee: attendee.map(AttendeeDetails::from),
            checked_in_at: attendee.and_then(|attendee| attendee.checked_in_at),
            special_notes: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CheckInStatus::Success
    }
}
