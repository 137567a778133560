//! In-memory repositories backing the API binary, demos, and tests.
//!
//! Every store wraps its state in `Arc<Mutex<..>>` so clones share data. A poisoned lock
//! surfaces as [`RepositoryError::Unavailable`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;

use crate::identity::{Member, MemberDirectory, UserId};
use crate::workflows::checkin::{
    AttendeeId, CheckIn, CheckInAuditEntry, CheckInRepository, EventAttendee, OfflineAction,
    OfflineActionId, SyncQueueRepository,
};
use crate::workflows::events::{Event, EventId, EventRepository};
use crate::workflows::participation::{
    Participation, ParticipationHistory, ParticipationId, ParticipationRepository,
};
use crate::workflows::vetting::{
    ApplicationId, ApplicationNote, AuditEntry, NotificationError, NotificationPublisher,
    StatusNotification, VettingApplication, VettingRepository,
};
use crate::workflows::RepositoryError;

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{name} mutex poisoned")))
}

#[derive(Default, Clone)]
pub struct MemoryVettingRepository {
    applications: Arc<Mutex<HashMap<ApplicationId, VettingApplication>>>,
    audit: Arc<Mutex<Vec<AuditEntry>>>,
    notes: Arc<Mutex<Vec<ApplicationNote>>>,
}

impl VettingRepository for MemoryVettingRepository {
    fn insert(
        &self,
        application: VettingApplication,
    ) -> Result<VettingApplication, RepositoryError> {
        let mut guard = lock(&self.applications, "vetting")?;
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, application: VettingApplication) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.applications, "vetting")?;
        if !guard.contains_key(&application.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(application.id.clone(), application);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<VettingApplication>, RepositoryError> {
        Ok(lock(&self.applications, "vetting")?.get(id).cloned())
    }

    fn for_user(&self, user: &UserId) -> Result<Vec<VettingApplication>, RepositoryError> {
        Ok(lock(&self.applications, "vetting")?
            .values()
            .filter(|application| &application.user_id == user)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<VettingApplication>, RepositoryError> {
        Ok(lock(&self.applications, "vetting")?
            .values()
            .cloned()
            .collect())
    }

    fn count_submitted_on(&self, day: NaiveDate) -> Result<usize, RepositoryError> {
        Ok(lock(&self.applications, "vetting")?
            .values()
            .filter(|application| application.submitted_at.date_naive() == day)
            .count())
    }

    fn append_audit(&self, entry: AuditEntry) -> Result<(), RepositoryError> {
        lock(&self.audit, "audit")?.push(entry);
        Ok(())
    }

    fn audit_trail(&self, id: &ApplicationId) -> Result<Vec<AuditEntry>, RepositoryError> {
        Ok(lock(&self.audit, "audit")?
            .iter()
            .filter(|entry| &entry.application_id == id)
            .cloned()
            .collect())
    }

    fn append_note(&self, note: ApplicationNote) -> Result<ApplicationNote, RepositoryError> {
        lock(&self.notes, "notes")?.push(note.clone());
        Ok(note)
    }

    fn notes(&self, id: &ApplicationId) -> Result<Vec<ApplicationNote>, RepositoryError> {
        Ok(lock(&self.notes, "notes")?
            .iter()
            .filter(|note| &note.application_id == id)
            .cloned()
            .collect())
    }
}

/// Member lookup seeded in-process.
#[derive(Default, Clone)]
pub struct MemoryDirectory {
    members: Arc<Mutex<HashMap<UserId, Member>>>,
}

impl MemoryDirectory {
    pub fn with_members(members: impl IntoIterator<Item = Member>) -> Self {
        let directory = Self::default();
        for member in members {
            directory.add(member);
        }
        directory
    }

    pub fn add(&self, member: Member) {
        if let Ok(mut guard) = self.members.lock() {
            guard.insert(member.id.clone(), member);
        }
    }
}

impl MemberDirectory for MemoryDirectory {
    fn member(&self, id: &UserId) -> Option<Member> {
        self.members.lock().ok()?.get(id).cloned()
    }
}

/// Captures notifications instead of sending mail; each one is also logged.
#[derive(Default, Clone)]
pub struct RecordingNotifications {
    sent: Arc<Mutex<Vec<StatusNotification>>>,
}

impl RecordingNotifications {
    pub fn sent(&self) -> Vec<StatusNotification> {
        self.sent
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl NotificationPublisher for RecordingNotifications {
    fn publish(&self, notification: StatusNotification) -> Result<(), NotificationError> {
        tracing::info!(
            application_id = %notification.application_id,
            template = ?notification.template,
            recipient = %notification.recipient,
            "status notification queued"
        );
        self.sent
            .lock()
            .map_err(|_| NotificationError::Transport("outbox mutex poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct MemoryEventRepository {
    events: Arc<Mutex<HashMap<EventId, Event>>>,
}

impl EventRepository for MemoryEventRepository {
    fn insert(&self, event: Event) -> Result<Event, RepositoryError> {
        let mut guard = lock(&self.events, "event")?;
        if guard.contains_key(&event.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    fn fetch(&self, id: &EventId) -> Result<Option<Event>, RepositoryError> {
        Ok(lock(&self.events, "event")?.get(id).cloned())
    }

    fn increment_checked_in(&self, id: &EventId) -> Result<u32, RepositoryError> {
        let mut guard = lock(&self.events, "event")?;
        let event = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        event.checked_in_count = event.checked_in_count.saturating_add(1);
        Ok(event.checked_in_count)
    }
}

#[derive(Default, Clone)]
pub struct MemoryParticipationRepository {
    participations: Arc<Mutex<HashMap<ParticipationId, Participation>>>,
    history: Arc<Mutex<Vec<ParticipationHistory>>>,
}

impl ParticipationRepository for MemoryParticipationRepository {
    fn insert(&self, participation: Participation) -> Result<Participation, RepositoryError> {
        let mut guard = lock(&self.participations, "participation")?;
        if guard.contains_key(&participation.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(participation.id.clone(), participation.clone());
        Ok(participation)
    }

    fn update(&self, participation: Participation) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.participations, "participation")?;
        if !guard.contains_key(&participation.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(participation.id.clone(), participation);
        Ok(())
    }

    fn fetch(&self, id: &ParticipationId) -> Result<Option<Participation>, RepositoryError> {
        Ok(lock(&self.participations, "participation")?.get(id).cloned())
    }

    fn for_event(&self, event: &EventId) -> Result<Vec<Participation>, RepositoryError> {
        let mut rows: Vec<Participation> = lock(&self.participations, "participation")?
            .values()
            .filter(|participation| &participation.event_id == event)
            .cloned()
            .collect();
        rows.sort_by(|left, right| left.created_at.cmp(&right.created_at));
        Ok(rows)
    }

    fn append_history(&self, entry: ParticipationHistory) -> Result<(), RepositoryError> {
        lock(&self.history, "history")?.push(entry);
        Ok(())
    }

    fn history(&self, id: &ParticipationId) -> Result<Vec<ParticipationHistory>, RepositoryError> {
        Ok(lock(&self.history, "history")?
            .iter()
            .filter(|entry| &entry.participation_id == id)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct MemoryCheckInRepository {
    attendees: Arc<Mutex<HashMap<AttendeeId, EventAttendee>>>,
    check_ins: Arc<Mutex<Vec<CheckIn>>>,
    audit: Arc<Mutex<Vec<CheckInAuditEntry>>>,
}

impl CheckInRepository for MemoryCheckInRepository {
    fn insert_attendee(&self, attendee: EventAttendee) -> Result<EventAttendee, RepositoryError> {
        let mut guard = lock(&self.attendees, "attendee")?;
        if guard.contains_key(&attendee.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(attendee.id.clone(), attendee.clone());
        Ok(attendee)
    }

    fn update_attendee(&self, attendee: EventAttendee) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.attendees, "attendee")?;
        if !guard.contains_key(&attendee.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(attendee.id.clone(), attendee);
        Ok(())
    }

    fn attendee(&self, id: &AttendeeId) -> Result<Option<EventAttendee>, RepositoryError> {
        Ok(lock(&self.attendees, "attendee")?.get(id).cloned())
    }

    fn attendees(&self, event: &EventId) -> Result<Vec<EventAttendee>, RepositoryError> {
        let mut rows: Vec<EventAttendee> = lock(&self.attendees, "attendee")?
            .values()
            .filter(|attendee| &attendee.event_id == event)
            .cloned()
            .collect();
        rows.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(rows)
    }

    fn record_check_in(&self, check_in: CheckIn) -> Result<(), RepositoryError> {
        lock(&self.check_ins, "check-in")?.push(check_in);
        Ok(())
    }

    fn check_ins(&self, event: &EventId) -> Result<Vec<CheckIn>, RepositoryError> {
        Ok(lock(&self.check_ins, "check-in")?
            .iter()
            .filter(|check_in| &check_in.event_id == event)
            .cloned()
            .collect())
    }

    fn append_audit(&self, entry: CheckInAuditEntry) -> Result<(), RepositoryError> {
        lock(&self.audit, "check-in audit")?.push(entry);
        Ok(())
    }

    fn audit_log(&self, event: &EventId) -> Result<Vec<CheckInAuditEntry>, RepositoryError> {
        Ok(lock(&self.audit, "check-in audit")?
            .iter()
            .filter(|entry| &entry.event_id == event)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct MemorySyncQueue {
    actions: Arc<Mutex<HashMap<OfflineActionId, OfflineAction>>>,
}

impl SyncQueueRepository for MemorySyncQueue {
    fn enqueue(&self, action: OfflineAction) -> Result<OfflineAction, RepositoryError> {
        let mut guard = lock(&self.actions, "sync queue")?;
        if guard.contains_key(&action.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(action.id.clone(), action.clone());
        Ok(action)
    }

    fn update(&self, action: OfflineAction) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.actions, "sync queue")?;
        if !guard.contains_key(&action.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(action.id.clone(), action);
        Ok(())
    }

    fn fetch(&self, id: &OfflineActionId) -> Result<Option<OfflineAction>, RepositoryError> {
        Ok(lock(&self.actions, "sync queue")?.get(id).cloned())
    }

    fn all(&self) -> Result<Vec<OfflineAction>, RepositoryError> {
        let mut rows: Vec<OfflineAction> = lock(&self.actions, "sync queue")?
            .values()
            .cloned()
            .collect();
        rows.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::events::EventType;
    use chrono::{TimeZone, Utc};

    fn event() -> Event {
        let starts_at = Utc.with_ymd_and_hms(2026, 3, 14, 19, 0, 0).unwrap();
        Event {
            id: EventId("evt-1".to_string()),
            title: "Rope Jam".to_string(),
            event_type: EventType::Social,
            starts_at,
            ends_at: starts_at + chrono::Duration::hours(3),
            capacity: 20,
            checked_in_count: 0,
            sessions: Vec::new(),
            ticket_types: Vec::new(),
        }
    }

    #[test]
    fn clones_share_state() {
        let events = MemoryEventRepository::default();
        let clone = events.clone();
        events.insert(event()).expect("insert succeeds");

        assert_eq!(
            clone
                .increment_checked_in(&EventId("evt-1".to_string()))
                .expect("event exists"),
            1
        );
        let stored = events
            .fetch(&EventId("evt-1".to_string()))
            .expect("fetch succeeds")
            .expect("event present");
        assert_eq!(stored.checked_in_count, 1);
    }

    #[test]
    fn duplicate_insert_conflicts() {
        let events = MemoryEventRepository::default();
        events.insert(event()).expect("first insert");
        assert!(matches!(
            events.insert(event()),
            Err(RepositoryError::Conflict)
        ));
    }

    #[test]
    fn increment_on_missing_event_is_not_found() {
        let events = MemoryEventRepository::default();
        assert!(matches!(
            events.increment_checked_in(&EventId("missing".to_string())),
            Err(RepositoryError::NotFound)
        ));
    }
}
