//! Event check-in at the door, including the offline sync queue.
//!
//! Refusals such as an early arrival or a missing waiver are reported in
//! [`CheckInResult`]; only missing records and permission failures are errors.

pub mod domain;
pub mod repository;
pub mod roster;
pub mod router;
pub mod service;
pub mod sync;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    AttendeeDetails, AttendeeId, AttendeeIdentifier, CheckIn, CheckInAuditAction,
    CheckInAuditEntry, CheckInRequest, CheckInResult, CheckInStatus, EmergencyContact,
    EventAttendee, RegistrationStatus,
};
pub use repository::{CheckInRepository, SyncQueueRepository};
pub use roster::{write_roster, RosterError};
pub use router::checkin_router;
pub use service::{special_notes, CheckInError, CheckInService};
pub use sync::{
    OfflineAction, OfflineActionId, OfflineActionType, StageOfflineRequest, SyncOutcome,
    SyncReport, SyncStatus, SyncedAction,
};
pub use views::{
    AttendeeList, AttendeeQuery, AttendeeSummary, CheckInDashboard, DoorCapacity, EventPhase,
    RecentCheckIn, SyncSummary,
};
