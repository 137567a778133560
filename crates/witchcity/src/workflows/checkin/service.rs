use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::domain::{
    AttendeeDetails, AttendeeIdentifier, CheckIn, CheckInAuditAction, CheckInAuditEntry,
    CheckInRequest, CheckInResult, CheckInStatus, EventAttendee, RegistrationStatus,
};
use super::repository::{CheckInRepository, SyncQueueRepository};
use super::roster::{self, RosterError};
use super::sync::SyncStatus;
use super::views::{
    AttendeeList, AttendeeQuery, AttendeeSummary, CheckInDashboard, DoorCapacity, EventPhase,
    RecentCheckIn, SyncSummary, MAX_ATTENDEE_PAGE_SIZE,
};
use crate::api::{Classify, ErrorKind, PagedResult};
use crate::config::CheckInConfig;
use crate::identity::{Member, MemberDirectory, Role, UserId};
use crate::workflows::events::{Event, EventId, EventRepository};
use crate::workflows::RepositoryError;

const RECENT_CHECK_IN_LIMIT: usize = 5;
const NOTE_SEPARATOR: &str = " | ";

static CHECK_IN_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_check_in_id() -> String {
    let id = CHECK_IN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("chk-{id:06}")
}

/// Door-side check-in, attendee lookup, and the offline queue.
pub struct CheckInService<C, E, D, Q> {
    pub(super) attendees: Arc<C>,
    pub(super) events: Arc<E>,
    pub(super) directory: Arc<D>,
    pub(super) queue: Arc<Q>,
    pub(super) config: CheckInConfig,
}

impl<C, E, D, Q> CheckInService<C, E, D, Q>
where
    C: CheckInRepository + 'static,
    E: EventRepository + 'static,
    D: MemberDirectory + 'static,
    Q: SyncQueueRepository + 'static,
{
    pub fn new(
        attendees: Arc<C>,
        events: Arc<E>,
        directory: Arc<D>,
        queue: Arc<Q>,
        config: CheckInConfig,
    ) -> Self {
        Self {
            attendees,
            events,
            directory,
            queue,
            config,
        }
    }

    /// Check an attendee in at `now`. Only missing records, missing permission, and an empty
    /// identifier are errors; every other refusal comes back as a [`CheckInResult`].
    pub fn check_in_attendee(
        &self,
        event_id: &EventId,
        request: &CheckInRequest,
        staff_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<CheckInResult, CheckInError> {
        let event = self.load_event(event_id)?;
        let staff = self.authorize_staff(staff_id)?;
        if request.identifier.is_empty() {
            return Err(CheckInError::MissingIdentifier);
        }

        let Some(mut attendee) = self.resolve_attendee(&event, &request.identifier)? else {
            tracing::info!(event_id = %event_id, staff_id = %staff_id, "no registration matched");
            return Ok(CheckInResult::rejected(CheckInStatus::NotRegistered, None));
        };

        if attendee.is_checked_in() {
            return Ok(CheckInResult::rejected(
                CheckInStatus::AlreadyCheckedIn,
                Some(&attendee),
            ));
        }

        let needs_capacity_override = attendee.registration_status
            == RegistrationStatus::Waitlist
            && event.checked_in_count >= event.capacity;

        if !request.override_restrictions {
            let opens_at = self.config.opens_at(event.starts_at);
            let refusal = if now < opens_at {
                Some(CheckInStatus::EventNotStarted)
            } else if now > event.ends_at {
                Some(CheckInStatus::EventEnded)
            } else if !attendee.has_completed_waiver {
                Some(CheckInStatus::WaiverRequired)
            } else if needs_capacity_override {
                Some(CheckInStatus::CapacityOverrideRequired)
            } else {
                None
            };
            if let Some(status) = refusal {
                return Ok(CheckInResult::rejected(status, Some(&attendee)));
            }
        }

        attendee.checked_in_at = Some(now);
        attendee.checked_in_by = Some(staff_id.clone());
        attendee.registration_status = RegistrationStatus::CheckedIn;
        self.attendees.update_attendee(attendee.clone())?;
        self.attendees.record_check_in(CheckIn {
            id: next_check_in_id(),
            attendee_id: attendee.id.clone(),
            event_id: event_id.clone(),
            check_in_time: now,
            staff_member_id: staff_id.clone(),
            is_manual_entry: request.is_manual_entry,
            override_capacity: request.override_restrictions,
            notes: request.notes.clone(),
        })?;
        let checked_in_count = self.events.increment_checked_in(event_id)?;

        let action = if request.is_manual_entry {
            CheckInAuditAction::ManualEntry
        } else {
            CheckInAuditAction::CheckIn
        };
        self.attendees.append_audit(CheckInAuditEntry {
            event_id: event_id.clone(),
            attendee_id: attendee.id.clone(),
            action,
            description: format!("Check-in completed for {}", attendee.scene_name),
            staff_member_id: staff_id.clone(),
            created_at: now,
        })?;
        if request.override_restrictions && needs_capacity_override {
            self.attendees.append_audit(CheckInAuditEntry {
                event_id: event_id.clone(),
                attendee_id: attendee.id.clone(),
                action: CheckInAuditAction::CapacityOverride,
                description: format!(
                    "Capacity override by {} for waitlisted {}",
                    staff.display_name, attendee.scene_name
                ),
                staff_member_id: staff_id.clone(),
                created_at: now,
            })?;
        }

        tracing::info!(
            event_id = %event_id,
            attendee_id = %attendee.id,
            staff_id = %staff_id,
            checked_in_count,
            override_restrictions = request.override_restrictions,
            "attendee checked in"
        );

        let member = self.directory.member(&attendee.user_id);
        Ok(CheckInResult {
            status: CheckInStatus::Success,
            message: CheckInStatus::Success.message().to_string(),
            special_notes: special_notes(&attendee, member.as_ref()),
            attendee: Some(AttendeeDetails::from(&attendee)),
            checked_in_at: Some(now),
        })
    }

    pub fn list_attendees(
        &self,
        event_id: &EventId,
        query: &AttendeeQuery,
        staff_id: &UserId,
    ) -> Result<AttendeeList, CheckInError> {
        let event = self.load_event(event_id)?;
        self.authorize_staff(staff_id)?;
        let attendees = self.attendees.attendees(event_id)?;
        let capacity = DoorCapacity::of(&event, &attendees);

        let mut matching: Vec<&EventAttendee> = attendees
            .iter()
            .filter(|attendee| query.matches(attendee))
            .collect();
        matching.sort_by(|left, right| {
            left.registration_status
                .cmp(&right.registration_status)
                .then_with(|| {
                    left.waitlist_position
                        .unwrap_or(0)
                        .cmp(&right.waitlist_position.unwrap_or(0))
                })
                .then_with(|| {
                    left.scene_name
                        .to_lowercase()
                        .cmp(&right.scene_name.to_lowercase())
                })
        });

        let summaries = matching.into_iter().map(AttendeeSummary::from).collect();
        Ok(AttendeeList {
            event_id: event.id.clone(),
            event_title: event.title.clone(),
            starts_at: event.starts_at,
            capacity,
            attendees: PagedResult::paginate(
                summaries,
                query.page,
                query.page_size.clamp(1, MAX_ATTENDEE_PAGE_SIZE),
            ),
        })
    }

    pub fn dashboard(
        &self,
        event_id: &EventId,
        staff_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<CheckInDashboard, CheckInError> {
        let event = self.load_event(event_id)?;
        self.authorize_staff(staff_id)?;
        let attendees = self.attendees.attendees(event_id)?;
        let mut check_ins = self.attendees.check_ins(event_id)?;
        check_ins.sort_by(|left, right| right.check_in_time.cmp(&left.check_in_time));

        let recent_check_ins = check_ins
            .into_iter()
            .take(RECENT_CHECK_IN_LIMIT)
            .map(|check_in| {
                let scene_name = attendees
                    .iter()
                    .find(|attendee| attendee.id == check_in.attendee_id)
                    .map(|attendee| attendee.scene_name.clone())
                    .unwrap_or_default();
                let staff_member_name = self
                    .directory
                    .member(&check_in.staff_member_id)
                    .map(|member| member.display_name)
                    .unwrap_or_else(|| check_in.staff_member_id.to_string());
                RecentCheckIn {
                    attendee_id: check_in.attendee_id,
                    scene_name,
                    check_in_time: check_in.check_in_time,
                    staff_member_name,
                    is_manual_entry: check_in.is_manual_entry,
                }
            })
            .collect();

        let queued: Vec<_> = self
            .queue
            .all()?
            .into_iter()
            .filter(|action| &action.event_id == event_id)
            .collect();
        let count = |status: SyncStatus| {
            queued
                .iter()
                .filter(|action| action.sync_status == status)
                .count()
        };

        Ok(CheckInDashboard {
            event_id: event.id.clone(),
            event_title: event.title.clone(),
            starts_at: event.starts_at,
            event_status: EventPhase::at(&event, now),
            capacity: DoorCapacity::of(&event, &attendees),
            recent_check_ins,
            sync: SyncSummary {
                pending: count(SyncStatus::Pending),
                conflicts: count(SyncStatus::Conflict),
                failed: count(SyncStatus::Failed),
                last_synced_at: queued.iter().filter_map(|action| action.synced_at).max(),
            },
        })
    }

    /// CSV roster of every registration for offline use at the door.
    pub fn roster_csv(
        &self,
        event_id: &EventId,
        staff_id: &UserId,
    ) -> Result<String, CheckInError> {
        self.load_event(event_id)?;
        self.authorize_staff(staff_id)?;
        let mut attendees = self.attendees.attendees(event_id)?;
        attendees.sort_by(|left, right| {
            left.scene_name
                .to_lowercase()
                .cmp(&right.scene_name.to_lowercase())
        });
        Ok(roster::write_roster(&attendees)?)
    }

    pub(super) fn load_event(&self, event_id: &EventId) -> Result<Event, CheckInError> {
        self.events
            .fetch(event_id)?
            .ok_or_else(|| CheckInError::EventNotFound(event_id.clone()))
    }

    pub fn authorize_staff(&self, staff_id: &UserId) -> Result<Member, CheckInError> {
        let staff = self
            .directory
            .member(staff_id)
            .ok_or_else(|| CheckInError::StaffNotFound(staff_id.clone()))?;
        if staff.has_role(Role::can_check_in_attendees) {
            Ok(staff)
        } else {
            tracing::warn!(staff_id = %staff_id, "check-in refused for non-staff member");
            Err(CheckInError::NotStaff)
        }
    }

    fn resolve_attendee(
        &self,
        event: &Event,
        identifier: &AttendeeIdentifier,
    ) -> Result<Option<EventAttendee>, CheckInError> {
        let registrations: Vec<EventAttendee> = self
            .attendees
            .attendees(&event.id)?
            .into_iter()
            .filter(|attendee| attendee.registration_status != RegistrationStatus::Cancelled)
            .collect();

        let by_code = non_blank(identifier.confirmation_code.as_deref()).and_then(|code| {
            registrations
                .iter()
                .find(|attendee| attendee.confirmation_code.eq_ignore_ascii_case(code))
        });
        let by_qr = || {
            let payload = non_blank(identifier.qr_code.as_deref())?;
            let (event_part, attendee_part) = payload.split_once(':')?;
            if event_part.trim() != event.id.0 {
                return None;
            }
            registrations
                .iter()
                .find(|attendee| attendee.id.0 == attendee_part.trim())
        };
        let by_user = || {
            let user = identifier.user_id.as_ref()?;
            registrations
                .iter()
                .find(|attendee| attendee.user_id == *user)
        };

        Ok(by_code.or_else(by_qr).or_else(by_user).cloned())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Notes read aloud by door staff, joined with `" | "`.
pub fn special_notes(attendee: &EventAttendee, member: Option<&Member>) -> Option<String> {
    let mut notes = Vec::new();
    if attendee.is_first_time {
        notes.push("FIRST TIME ATTENDEE - Please provide extra welcome!".to_string());
    }
    if let Some(needs) = non_blank(attendee.accessibility_needs.as_deref()) {
        notes.push(format!("Accessibility needs: {needs}"));
    }
    if let Some(diet) = non_blank(attendee.dietary_restrictions.as_deref()) {
        notes.push(format!("Dietary restrictions: {diet}"));
    }
    if let Some(member) = member {
        if let Some(pronounced) = non_blank(member.pronounced_name.as_deref()) {
            if pronounced != member.display_name {
                notes.push(format!("Name pronounced: {pronounced}"));
            }
        }
    }

    (!notes.is_empty()).then(|| notes.join(NOTE_SEPARATOR))
}

/// Error raised by the check-in service.
#[derive(Debug, thiserror::Error)]
pub enum CheckInError {
    #[error("Event {0} not found")]
    EventNotFound(EventId),
    #[error("Staff member {0} not found")]
    StaffNotFound(UserId),
    #[error("Check-in staff, organizer, or administrator role required")]
    NotStaff,
    #[error("A confirmation code, QR code, or user id is required")]
    MissingIdentifier,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl Classify for CheckInError {
    fn kind(&self) -> ErrorKind {
        match self {
            CheckInError::EventNotFound(_) | CheckInError::StaffNotFound(_) => ErrorKind::NotFound,
            CheckInError::NotStaff => ErrorKind::Forbidden,
            CheckInError::MissingIdentifier | CheckInError::Validation(_) => ErrorKind::Validation,
            CheckInError::Roster(_) => ErrorKind::Unhandled,
            CheckInError::Repository(error) => error.kind(),
        }
    }
}
