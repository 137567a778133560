//! CSV roster export carried by door staff when connectivity is unreliable.

use serde::Serialize;

use super::domain::EventAttendee;

pub const ROSTER_CONTENT_TYPE: mime::Mime = mime::TEXT_CSV_UTF_8;

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to encode roster row: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush roster: {0}")]
    Flush(String),
    #[error("roster is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Serialize)]
struct RosterRow<'a> {
    attendee_id: &'a str,
    scene_name: &'a str,
    email: &'a str,
    pronouns: &'a str,
    registration_status: &'static str,
    ticket_number: &'a str,
    confirmation_code: &'a str,
    waiver_complete: bool,
    first_time: bool,
    dietary_restrictions: &'a str,
    accessibility_needs: &'a str,
    emergency_contact: String,
    checked_in_at: String,
}

impl<'a> From<&'a EventAttendee> for RosterRow<'a> {
    fn from(attendee: &'a EventAttendee) -> Self {
        Self {
            attendee_id: &attendee.id.0,
            scene_name: &attendee.scene_name,
            email: &attendee.email,
            pronouns: attendee.pronouns.as_deref().unwrap_or_default(),
            registration_status: attendee.registration_status.label(),
            ticket_number: attendee.ticket_number.as_deref().unwrap_or_default(),
            confirmation_code: &attendee.confirmation_code,
            waiver_complete: attendee.has_completed_waiver,
            first_time: attendee.is_first_time,
            dietary_restrictions: attendee.dietary_restrictions.as_deref().unwrap_or_default(),
            accessibility_needs: attendee.accessibility_needs.as_deref().unwrap_or_default(),
            emergency_contact: attendee
                .emergency_contact
                .as_ref()
                .map(|contact| format!("{} ({})", contact.name, contact.phone))
                .unwrap_or_default(),
            checked_in_at: attendee
                .checked_in_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

/// Render `attendees` as CSV with a header row, preserving their order.
pub fn write_roster(attendees: &[EventAttendee]) -> Result<String, RosterError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for attendee in attendees {
        writer.serialize(RosterRow::from(attendee))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| RosterError::Flush(err.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::UserId;
    use crate::workflows::checkin::domain::{AttendeeId, RegistrationStatus};
    use crate::workflows::events::EventId;

    fn attendee() -> EventAttendee {
        EventAttendee {
            id: AttendeeId("att-1".to_string()),
            event_id: EventId("evt-1".to_string()),
            user_id: UserId("member-1".to_string()),
            scene_name: "Knotty, Jr.".to_string(),
            email: "knotty@example.com".to_string(),
            pronouns: Some("they/them".to_string()),
            registration_status: RegistrationStatus::Confirmed,
            ticket_number: Some("T-100".to_string()),
            confirmation_code: "WCR-100".to_string(),
            waitlist_position: None,
            dietary_restrictions: None,
            accessibility_needs: Some("Step-free entry".to_string()),
            emergency_contact: None,
            has_completed_waiver: true,
            is_first_time: false,
            checked_in_at: None,
            checked_in_by: None,
        }
    }

    #[test]
    fn roster_has_header_and_quoted_fields() {
        let csv = write_roster(&[attendee()]).expect("roster renders");
        let mut lines = csv.lines();

        let header = lines.next().expect("header row");
        assert!(header.starts_with("attendee_id,scene_name,email"));

        let row = lines.next().expect("data row");
        assert!(row.contains("\"Knotty, Jr.\""));
        assert!(row.contains("confirmed"));
        assert!(row.contains("Step-free entry"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn empty_roster_is_empty() {
        let csv = write_roster(&[]).expect("roster renders");
        assert!(csv.is_empty());
    }
}
