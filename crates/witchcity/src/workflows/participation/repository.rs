use super::domain::{Participation, ParticipationHistory, ParticipationId};
use crate::identity::UserId;
use crate::workflows::events::EventId;
use crate::workflows::RepositoryError;

/// Storage abstraction for RSVPs and tickets.
pub trait ParticipationRepository: Send + Sync {
    fn insert(&self, participation: Participation) -> Result<Participation, RepositoryError>;
    fn update(&self, participation: Participation) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ParticipationId) -> Result<Option<Participation>, RepositoryError>;
    fn for_event(&self, event: &EventId) -> Result<Vec<Participation>, RepositoryError>;
    fn append_history(&self, entry: ParticipationHistory) -> Result<(), RepositoryError>;
    fn history(&self, id: &ParticipationId) -> Result<Vec<ParticipationHistory>, RepositoryError>;

    fn active_for(
        &self,
        event: &EventId,
        user: &UserId,
    ) -> Result<Option<Participation>, RepositoryError> {
        Ok(self
            .for_event(event)?
            .into_iter()
            .find(|participation| participation.is_active() && &participation.user_id == user))
    }
}
