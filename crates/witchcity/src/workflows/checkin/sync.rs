//! Offline check-in queue and its reconciliation pass.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{CheckInRequest, CheckInResult, CheckInStatus};
use super::repository::{CheckInRepository, SyncQueueRepository};
use super::service::{CheckInError, CheckInService};
use crate::config::SYNC_RETRY_CEILING;
use crate::identity::{MemberDirectory, UserId};
use crate::workflows::events::{EventId, EventRepository};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OfflineActionId(pub String);

impl std::fmt::Display for OfflineActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncStatus {
    Pending,
    Syncing,
    Completed,
    Failed,
    Conflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OfflineActionType {
    CheckIn,
    ManualEntry,
}

/// A check-in recorded by a door device while it had no connectivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineAction {
    pub id: OfflineActionId,
    pub event_id: EventId,
    pub staff_member_id: UserId,
    pub action_type: OfflineActionType,
    /// Serialized [`CheckInRequest`].
    pub action_data: serde_json::Value,
    pub local_timestamp: DateTime<Utc>,
    pub sync_status: SyncStatus,
    pub retry_count: u32,
    pub synced_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageOfflineRequest {
    pub action_type: OfflineActionType,
    pub action_data: serde_json::Value,
    pub local_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncOutcome {
    Completed,
    Conflict,
    Retrying,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedAction {
    pub id: OfflineActionId,
    pub outcome: SyncOutcome,
    pub retry_count: u32,
    pub error_message: Option<String>,
}

/// Counts per outcome for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub processed: usize,
    pub completed: usize,
    pub conflicts: usize,
    pub retrying: usize,
    pub failed: usize,
    pub actions: Vec<SyncedAction>,
}

impl SyncReport {
    fn record(&mut self, action: &OfflineAction, outcome: SyncOutcome) {
        self.processed += 1;
        match outcome {
            SyncOutcome::Completed => self.completed += 1,
            SyncOutcome::Conflict => self.conflicts += 1,
            SyncOutcome::Retrying => self.retrying += 1,
            SyncOutcome::Failed => self.failed += 1,
        }
        self.actions.push(SyncedAction {
            id: action.id.clone(),
            outcome,
            retry_count: action.retry_count,
            error_message: action.error_message.clone(),
        });
    }
}

static OFFLINE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_offline_id() -> OfflineActionId {
    let id = OFFLINE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    OfflineActionId(format!("sync-{id:06}"))
}

impl<C, E, D, Q> CheckInService<C, E, D, Q>
where
    C: CheckInRepository + 'static,
    E: EventRepository + 'static,
    D: MemberDirectory + 'static,
    Q: SyncQueueRepository + 'static,
{
    /// Queue an action captured offline. The payload is validated now so reconciliation
    /// only ever sees replayable requests.
    pub fn stage_offline(
        &self,
        event_id: &EventId,
        staff_id: &UserId,
        request: StageOfflineRequest,
        now: DateTime<Utc>,
    ) -> Result<OfflineAction, CheckInError> {
        self.load_event(event_id)?;
        self.authorize_staff(staff_id)?;

        let parsed: CheckInRequest = serde_json::from_value(request.action_data.clone())
            .map_err(|err| CheckInError::Validation(format!("Invalid action data: {err}")))?;
        if parsed.identifier.is_empty() {
            return Err(CheckInError::MissingIdentifier);
        }

        let action = self.queue.enqueue(OfflineAction {
            id: next_offline_id(),
            event_id: event_id.clone(),
            staff_member_id: staff_id.clone(),
            action_type: request.action_type,
            action_data: request.action_data,
            local_timestamp: request.local_timestamp,
            sync_status: SyncStatus::Pending,
            retry_count: 0,
            synced_at: None,
            error_message: None,
            created_at: now,
        })?;

        tracing::info!(
            action_id = %action.id,
            event_id = %event_id,
            staff_id = %staff_id,
            "offline action staged"
        );
        Ok(action)
    }

    /// Replay every pending action, oldest local timestamp first.
    ///
    /// Actions still marked `Syncing` were left behind by a pass that stopped before storing
    /// their outcome; they are replayed again alongside the pending ones.
    pub fn reconcile(&self, now: DateTime<Utc>) -> Result<SyncReport, CheckInError> {
        let max_retries = self.config.max_sync_retries.clamp(1, SYNC_RETRY_CEILING);
        let mut pending: Vec<OfflineAction> = self
            .queue
            .all()?
            .into_iter()
            .filter(|action| {
                matches!(action.sync_status, SyncStatus::Pending | SyncStatus::Syncing)
            })
            .collect();

        pending.sort_by(|left, right| {
            left.local_timestamp
                .cmp(&right.local_timestamp)
                .then_with(|| left.id.cmp(&right.id))
        });

        let mut report = SyncReport::default();
        for mut action in pending {
            let resumed = action.sync_status == SyncStatus::Syncing;
            if resumed {
                tracing::warn!(action_id = %action.id, "resuming interrupted offline action");
            }
            action.sync_status = SyncStatus::Syncing;
            self.queue.update(action.clone())?;

            let outcome = match self.replay(&action) {
                Ok(result) if result.is_success() => {
                    action.sync_status = SyncStatus::Completed;
                    action.synced_at = Some(now);
                    action.error_message = None;
                    SyncOutcome::Completed
                }
                // An interrupted pass may already have applied this action.
                Ok(result)
                    if resumed
                        && result.status == CheckInStatus::AlreadyCheckedIn
                        && result.checked_in_at == Some(action.local_timestamp) =>
                {
                    action.sync_status = SyncStatus::Completed;
                    action.synced_at = Some(now);
                    action.error_message = None;
                    SyncOutcome::Completed
                }
                Ok(result) if result.status == CheckInStatus::AlreadyCheckedIn => {
                    let existing = result
                        .checked_in_at
                        .map(|at| at.to_rfc3339())
                        .unwrap_or_else(|| "an unknown time".to_string());
                    action.sync_status = SyncStatus::Conflict;
                    action.error_message =
                        Some(format!("Attendee already checked in at {existing}"));
                    SyncOutcome::Conflict
                }
                Ok(result) => retry(&mut action, result.message, max_retries),
                Err(error) => retry(&mut action, error.to_string(), max_retries),
            };

            self.queue.update(action.clone())?;
            tracing::info!(
                action_id = %action.id,
                outcome = ?outcome,
                retry_count = action.retry_count,
                "offline action reconciled"
            );
            report.record(&action, outcome);
        }

        Ok(report)
    }

    fn replay(&self, action: &OfflineAction) -> Result<CheckInResult, CheckInError> {
        let mut request: CheckInRequest = serde_json::from_value(action.action_data.clone())
            .map_err(|err| CheckInError::Validation(format!("Invalid action data: {err}")))?;
        request.override_restrictions = true;
        request.is_manual_entry = action.action_type == OfflineActionType::ManualEntry;

        self.check_in_attendee(
            &action.event_id,
            &request,
            &action.staff_member_id,
            action.local_timestamp,
        )
    }
}

fn retry(action: &mut OfflineAction, message: String, max_retries: u32) -> SyncOutcome {
    action.retry_count += 1;
    action.error_message = Some(message);
    if action.retry_count >= max_retries {
        action.sync_status = SyncStatus::Failed;
        SyncOutcome::Failed
    } else {
        action.sync_status = SyncStatus::Pending;
        SyncOutcome::Retrying
    }
}
