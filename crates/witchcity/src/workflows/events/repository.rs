use super::domain::{Event, EventId};
use crate::workflows::RepositoryError;

/// Storage abstraction for scheduled events.
pub trait EventRepository: Send + Sync {
    fn insert(&self, event: Event) -> Result<Event, RepositoryError>;
    fn fetch(&self, id: &EventId) -> Result<Option<Event>, RepositoryError>;
    /// Bump the arrival counter and return the new value.
    fn increment_checked_in(&self, id: &EventId) -> Result<u32, RepositoryError>;
}
