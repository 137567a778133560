use super::domain::{AttendeeId, CheckIn, CheckInAuditEntry, EventAttendee};
use super::sync::{OfflineAction, OfflineActionId};
use crate::workflows::events::EventId;
use crate::workflows::RepositoryError;

/// Storage abstraction for registrations, arrivals, and the door-side audit log.
pub trait CheckInRepository: Send + Sync {
    fn insert_attendee(&self, attendee: EventAttendee) -> Result<EventAttendee, RepositoryError>;
    fn update_attendee(&self, attendee: EventAttendee) -> Result<(), RepositoryError>;
    fn attendee(&self, id: &AttendeeId) -> Result<Option<EventAttendee>, RepositoryError>;
    fn attendees(&self, event: &EventId) -> Result<Vec<EventAttendee>, RepositoryError>;
    fn record_check_in(&self, check_in: CheckIn) -> Result<(), RepositoryError>;
    fn check_ins(&self, event: &EventId) -> Result<Vec<CheckIn>, RepositoryError>;
    fn append_audit(&self, entry: CheckInAuditEntry) -> Result<(), RepositoryError>;
    fn audit_log(&self, event: &EventId) -> Result<Vec<CheckInAuditEntry>, RepositoryError>;
}

/// Storage for check-in actions captured while the door device was offline.
pub trait SyncQueueRepository: Send + Sync {
    fn enqueue(&self, action: OfflineAction) -> Result<OfflineAction, RepositoryError>;
    fn update(&self, action: OfflineAction) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &OfflineActionId) -> Result<Option<OfflineAction>, RepositoryError>;
    fn all(&self) -> Result<Vec<OfflineAction>, RepositoryError>;
}
