use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Duration;
use serde_json::json;

use super::common::*;
use crate::api::{Classify, ErrorKind};
use crate::config::CheckInConfig;
use crate::store::MemorySyncQueue;
use crate::workflows::checkin::{
    CheckInError, CheckInRepository, CheckInService, CheckInStatus, OfflineAction,
    OfflineActionId, OfflineActionType, StageOfflineRequest, SyncOutcome, SyncQueueRepository,
    SyncStatus,
};
use crate::workflows::events::EventRepository;
use crate::workflows::RepositoryError;

/// Queue whose Nth `update` call fails, leaving the stored row as it was.
struct InterruptingQueue {
    inner: MemorySyncQueue,
    fail_on_update: usize,
    updates: AtomicUsize,
}

impl InterruptingQueue {
    fn failing_update(fail_on_update: usize) -> Self {
        Self {
            inner: MemorySyncQueue::default(),
            fail_on_update,
            updates: AtomicUsize::new(0),
        }
    }
}

impl SyncQueueRepository for InterruptingQueue {
    fn enqueue(&self, action: OfflineAction) -> Result<OfflineAction, RepositoryError> {
        self.inner.enqueue(action)
    }

    fn update(&self, action: OfflineAction) -> Result<(), RepositoryError> {
        let call = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on_update {
            return Err(RepositoryError::Unavailable("queue write timed out".to_string()));
        }
        self.inner.update(action)
    }

    fn fetch(&self, id: &OfflineActionId) -> Result<Option<OfflineAction>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn all(&self) -> Result<Vec<OfflineAction>, RepositoryError> {
        self.inner.all()
    }
}

fn offline_request(code: &str, minutes_after_start: i64) -> StageOfflineRequest {
    StageOfflineRequest {
        action_type: OfflineActionType::CheckIn,
        action_data: json!({ "confirmationCode": code }),
        local_timestamp: starts_at() + Duration::minutes(minutes_after_start),
    }
}

#[test]
fn staged_actions_replay_in_local_timestamp_order() {
    let fixture = fixture();
    let later = fixture
        .service
        .stage_offline(&event_id(), &user(STAFF), offline_request("WCR-1002", 20), starts_at())
        .expect("stage succeeds");
    let earlier = fixture
        .service
        .stage_offline(&event_id(), &user(STAFF), offline_request("WCR-1001", 5), starts_at())
        .expect("stage succeeds");
    assert_eq!(later.sync_status, SyncStatus::Pending);

    let report = fixture
        .service
        .reconcile(starts_at() + Duration::hours(1))
        .expect("reconcile runs");

    assert_eq!(report.processed, 2);
    assert_eq!(report.completed, 2);
    assert_eq!(report.actions[0].id, earlier.id);
    assert_eq!(report.actions[1].id, later.id);

    let check_ins = fixture
        .attendees
        .check_ins(&event_id())
        .expect("check-ins load");
    let first = check_ins
        .iter()
        .find(|check_in| check_in.attendee_id.0 == "att-1")
        .expect("att-1 checked in");
    assert_eq!(first.check_in_time, starts_at() + Duration::minutes(5));
    assert!(first.override_capacity);

    let stored = fixture
        .queue
        .fetch(&earlier.id)
        .expect("fetch succeeds")
        .expect("action present");
    assert_eq!(stored.sync_status, SyncStatus::Completed);
    assert_eq!(stored.synced_at, Some(starts_at() + Duration::hours(1)));
}

#[test]
fn replay_of_online_check_in_is_a_conflict() {
    let fixture = fixture();
    let online = fixture
        .service
        .check_in_attendee(
            &event_id(),
            &by_code("WCR-1001"),
            &user(STAFF),
            starts_at() + Duration::minutes(2),
        )
        .expect("online check-in");
    assert_eq!(online.status, CheckInStatus::Success);
    let action = fixture
        .service
        .stage_offline(&event_id(), &user(STAFF), offline_request("WCR-1001", 4), starts_at())
        .expect("stage succeeds");

    let report = fixture
        .service
        .reconcile(starts_at() + Duration::hours(1))
        .expect("reconcile runs");

    assert_eq!(report.conflicts, 1);
    assert_eq!(report.actions[0].outcome, SyncOutcome::Conflict);
    let stored = fixture
        .queue
        .fetch(&action.id)
        .expect("fetch succeeds")
        .expect("action present");
    assert_eq!(stored.sync_status, SyncStatus::Conflict);
    assert!(stored
        .error_message
        .as_deref()
        .expect("conflict message")
        .starts_with("Attendee already checked in at"));
    assert_eq!(
        fixture
            .events
            .fetch(&event_id())
            .expect("fetch succeeds")
            .expect("event present")
            .checked_in_count,
        1
    );

    let second = fixture
        .service
        .reconcile(starts_at() + Duration::hours(2))
        .expect("reconcile runs");
    assert_eq!(second.processed, 0);
}

#[test]
fn unresolvable_actions_retry_until_the_ceiling() {
    let repository = Arc::new(crate::store::MemoryCheckInRepository::default());
    let events = Arc::new(crate::store::MemoryEventRepository::default());
    let queue = Arc::new(MemorySyncQueue::default());
    events.insert(event(40)).expect("event seeded");
    let service = CheckInService::new(
        repository,
        events,
        Arc::new(directory()),
        queue.clone(),
        CheckInConfig {
            max_sync_retries: 3,
            ..CheckInConfig::default()
        },
    );
    let action = service
        .stage_offline(&event_id(), &user(STAFF), offline_request("WCR-0000", 5), starts_at())
        .expect("stage succeeds");

    for attempt in 1..=2 {
        let report = service
            .reconcile(starts_at() + Duration::hours(attempt))
            .expect("reconcile runs");
        assert_eq!(report.retrying, 1);
        let stored = queue
            .fetch(&action.id)
            .expect("fetch succeeds")
            .expect("action present");
        assert_eq!(stored.retry_count, attempt as u32);
        assert_eq!(stored.sync_status, SyncStatus::Pending);
        assert_eq!(
            stored.error_message.as_deref(),
            Some(CheckInStatus::NotRegistered.message())
        );
    }

    let report = service
        .reconcile(starts_at() + Duration::hours(3))
        .expect("reconcile runs");
    assert_eq!(report.failed, 1);
    let stored = queue
        .fetch(&action.id)
        .expect("fetch succeeds")
        .expect("action present");
    assert_eq!(stored.sync_status, SyncStatus::Failed);
    assert_eq!(stored.retry_count, 3);

    let after = service
        .reconcile(starts_at() + Duration::hours(4))
        .expect("reconcile runs");
    assert_eq!(after.processed, 0);
}

#[test]
fn retry_ceiling_is_capped() {
    let fixture = fixture();
    let capped = CheckInConfig {
        max_sync_retries: 50,
        ..CheckInConfig::default()
    };
    let service = CheckInService::new(
        fixture.attendees.clone(),
        fixture.events.clone(),
        Arc::new(directory()),
        fixture.queue.clone(),
        capped,
    );
    let action = service
        .stage_offline(&event_id(), &user(STAFF), offline_request("WCR-0000", 5), starts_at())
        .expect("stage succeeds");

    for attempt in 0..10 {
        service
            .reconcile(starts_at() + Duration::minutes(attempt))
            .expect("reconcile runs");
    }

    let stored = fixture
        .queue
        .fetch(&action.id)
        .expect("fetch succeeds")
        .expect("action present");
    assert_eq!(stored.sync_status, SyncStatus::Failed);
    assert_eq!(stored.retry_count, 10);
}

#[test]
fn staging_validates_payload_and_staff() {
    let fixture = fixture();

    let malformed = fixture
        .service
        .stage_offline(
            &event_id(),
            &user(STAFF),
            StageOfflineRequest {
                action_type: OfflineActionType::ManualEntry,
                action_data: json!({ "confirmationCode": 42 }),
                local_timestamp: starts_at(),
            },
            starts_at(),
        )
        .expect_err("malformed payload");
    assert!(matches!(malformed, CheckInError::Validation(_)));

    let empty = fixture
        .service
        .stage_offline(
            &event_id(),
            &user(STAFF),
            StageOfflineRequest {
                action_type: OfflineActionType::CheckIn,
                action_data: json!({}),
                local_timestamp: starts_at(),
            },
            starts_at(),
        )
        .expect_err("identifier required");
    assert!(matches!(empty, CheckInError::MissingIdentifier));

    let member = fixture
        .service
        .stage_offline(&event_id(), &user(MEMBER), offline_request("WCR-1001", 0), starts_at())
        .expect_err("members cannot stage");
    assert_eq!(member.kind(), ErrorKind::Forbidden);

    assert!(fixture.queue.all().expect("queue loads").is_empty());
}

#[test]
fn dashboard_counts_queue_states() {
    let fixture = fixture();
    fixture
        .service
        .stage_offline(&event_id(), &user(STAFF), offline_request("WCR-1001", 1), starts_at())
        .expect("stage succeeds");
    fixture
        .service
        .stage_offline(&event_id(), &user(STAFF), offline_request("WCR-1001", 2), starts_at())
        .expect("stage succeeds");
    fixture
        .service
        .reconcile(starts_at() + Duration::minutes(30))
        .expect("reconcile runs");
    fixture
        .service
        .stage_offline(&event_id(), &user(STAFF), offline_request("WCR-1002", 3), starts_at())
        .expect("stage succeeds");

    let dashboard = fixture
        .service
        .dashboard(&event_id(), &user(STAFF), starts_at() + Duration::minutes(40))
        .expect("dashboard loads");

    assert_eq!(dashboard.sync.pending, 1);
    assert_eq!(dashboard.sync.conflicts, 1);
    assert_eq!(dashboard.sync.failed, 0);
    assert_eq!(
        dashboard.sync.last_synced_at,
        Some(starts_at() + Duration::minutes(30))
    );
}

#[test]
fn interrupted_pass_is_resumed_without_a_false_conflict() {
    let fixture = fixture();
    let queue = Arc::new(InterruptingQueue::failing_update(2));
    let service = CheckInService::new(
        fixture.attendees.clone(),
        fixture.events.clone(),
        Arc::new(directory()),
        queue.clone(),
        CheckInConfig::default(),
    );
    let action = service
        .stage_offline(&event_id(), &user(STAFF), offline_request("WCR-1001", 5), starts_at())
        .expect("stage succeeds");

    match service.reconcile(starts_at() + Duration::hours(1)) {
        Err(CheckInError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected the outcome write to fail, got {other:?}"),
    }
    let stranded = queue
        .fetch(&action.id)
        .expect("fetch succeeds")
        .expect("action present");
    assert_eq!(stranded.sync_status, SyncStatus::Syncing);

    let report = service
        .reconcile(starts_at() + Duration::hours(2))
        .expect("reconcile runs");
    assert_eq!(report.processed, 1);
    assert_eq!(report.completed, 1);
    assert_eq!(report.conflicts, 0);

    let stored = queue
        .fetch(&action.id)
        .expect("fetch succeeds")
        .expect("action present");
    assert_eq!(stored.sync_status, SyncStatus::Completed);
    assert_eq!(
        fixture
            .attendees
            .check_ins(&event_id())
            .expect("check-ins load")
            .len(),
        1
    );
}

#[test]
fn stranded_retry_keeps_counting_after_resume() {
    let fixture = fixture();
    let queue = Arc::new(InterruptingQueue::failing_update(4));
    let service = CheckInService::new(
        fixture.attendees.clone(),
        fixture.events.clone(),
        Arc::new(directory()),
        queue.clone(),
        CheckInConfig::default(),
    );
    let action = service
        .stage_offline(&event_id(), &user(STAFF), offline_request("WCR-0000", 5), starts_at())
        .expect("stage succeeds");

    let first = service
        .reconcile(starts_at() + Duration::hours(1))
        .expect("first pass runs");
    assert_eq!(first.retrying, 1);
    assert!(service.reconcile(starts_at() + Duration::hours(2)).is_err());

    let report = service
        .reconcile(starts_at() + Duration::hours(3))
        .expect("reconcile runs");
    assert_eq!(report.processed, 1);
    let stored = queue
        .fetch(&action.id)
        .expect("fetch succeeds")
        .expect("action present");
    assert_eq!(stored.retry_count, 2);
    assert_eq!(stored.sync_status, SyncStatus::Pending);
}
