//! Timestamp transition, debounce and undo tests.

use super::support::{Harness, harness, harness_with};
use crate::config::ControllerConfig;
use crate::task::{
    domain::{Priority, TaskDomainError, TaskPatch, TaskStatus, UndoAction, User},
    ports::{FailureKind, Intent},
    services::{CreateTaskRequest, TaskLifecycleError, UpdateOutcome},
};
use chrono::Utc;
use rstest::rstest;

async fn active_task(harness: &Harness) -> crate::task::domain::TaskId {
    let task = harness
        .service
        .create_task(CreateTaskRequest::new())
        .await
        .expect("task creation should succeed");
    harness
        .service
        .update_task(task.id(), TaskPatch::new().with_status(TaskStatus::Active))
        .await
        .expect("activation should succeed");
    task.id()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn picking_up_moves_status_and_notifies_once(harness: Harness) {
    let id = active_task(&harness).await;

    let first = harness
        .service
        .mark_picked_up(id, Some(Utc::now()))
        .await
        .expect("first mark should succeed");
    let second = harness
        .service
        .mark_picked_up(id, Some(Utc::now()))
        .await
        .expect("second mark should succeed");

    assert!(first.notification().is_some());
    assert!(second.is_applied());
    assert_eq!(second.notification(), None);
    assert_eq!(harness.local(id).status(), TaskStatus::PickedUp);
    let notifications = harness.sink.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].message, "Task marked picked up");
    assert_eq!(notifications[0].undo, vec![UndoAction::ClearPickedUp { task_id: id }]);
    assert_eq!(notifications[0].view_link, Some(format!("/task/{id}")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delivering_before_pickup_is_rejected(harness: Harness) {
    let id = active_task(&harness).await;

    let result = harness.service.mark_dropped_off(id, Some(Utc::now())).await;

    assert!(matches!(
        result,
        Err(TaskLifecycleError::Domain(TaskDomainError::InvalidStateTransition {
            from: TaskStatus::Active,
            to: TaskStatus::DroppedOff,
        }))
    ));
    let failures = harness.sink.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].intent, Intent::MarkDroppedOff);
    assert_eq!(failures[0].kind, FailureKind::Validation);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn full_delivery_ends_completed(harness: Harness) {
    let id = active_task(&harness).await;

    harness
        .service
        .mark_picked_up(id, Some(Utc::now()))
        .await
        .expect("pickup should succeed");
    let delivered = harness
        .service
        .mark_dropped_off(id, Some(Utc::now()))
        .await
        .expect("delivery should succeed");
    harness
        .service
        .mark_rider_home(id)
        .await
        .expect("rider home should succeed");

    assert!(delivered.notification().is_some());
    let task = harness.local(id);
    assert_eq!(task.status(), TaskStatus::Completed);
    assert!(task.time_rider_home().is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rider_home_requires_a_delivered_task(harness: Harness) {
    let id = active_task(&harness).await;

    let result = harness.service.mark_rider_home(id).await;

    assert!(matches!(
        result,
        Err(TaskLifecycleError::Domain(TaskDomainError::InvalidStateTransition { .. }))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn undoing_a_cancel_sends_only_the_cleared_time(harness: Harness) {
    let legs = harness.relay(2).await;
    let middle = legs[1].id();
    let outcome = harness
        .service
        .mark_cancelled(middle, Some(Utc::now()))
        .await
        .expect("cancel should succeed");
    assert_eq!(harness.local(legs[0].id()).relay_next(), Some(legs[2].id()));
    assert_eq!(harness.local(middle).relay_next(), None);

    harness
        .service
        .undo(outcome.notification().expect("cancel should notify"))
        .await
        .expect("undo should succeed");

    let patches = harness.store.sent_patches(middle).expect("store readable");
    assert_eq!(
        patches.last(),
        Some(&TaskPatch::new().with_time_cancelled(None))
    );
    let reopened = harness.local(middle);
    assert_eq!(reopened.time_cancelled(), None);
    assert_eq!(reopened.status(), TaskStatus::New);
    assert!(reopened.is_relay_active());
    let chain_len = [legs[0].id(), middle, legs[2].id()]
        .iter()
        .filter(|id| harness.local(**id).is_relay_active())
        .count();
    assert_eq!(chain_len, 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejecting_a_middle_leg_closes_the_gap(harness: Harness) {
    let legs = harness.relay(2).await;
    let (a, b, c) = (legs[0].id(), legs[1].id(), legs[2].id());

    harness
        .service
        .mark_rejected(b, Some(Utc::now()))
        .await
        .expect("reject should succeed");

    assert_eq!(harness.local(a).relay_next(), Some(c));
    assert_eq!(harness.local(c).relay_previous_uuid(), Some(a));
    assert_eq!(harness.local(c).order_in_relay(), 2);
    assert_eq!(harness.local(b).status(), TaskStatus::Rejected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn clearing_a_time_does_not_notify(harness: Harness) {
    let id = active_task(&harness).await;
    harness
        .service
        .mark_picked_up(id, Some(Utc::now()))
        .await
        .expect("pickup should succeed");

    let cleared = harness
        .service
        .mark_picked_up(id, None)
        .await
        .expect("clearing should succeed");

    assert_eq!(cleared.notification(), None);
    assert_eq!(harness.local(id).time_picked_up(), None);
    assert_eq!(harness.sink.notifications().len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rapid_edits_to_one_field_collapse_into_the_last() {
    let harness = harness_with(ControllerConfig {
        text_field_debounce_ms: 50,
        ..ControllerConfig::default()
    });
    let id = harness
        .service
        .create_task(CreateTaskRequest::new())
        .await
        .expect("task creation should succeed")
        .id();

    let (first, second) = tokio::join!(
        harness.service.update_priority(id, Some(Priority::Low)),
        async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            harness.service.update_priority(id, Some(Priority::High)).await
        },
    );

    assert_eq!(first.expect("first edit should settle"), UpdateOutcome::Superseded);
    assert!(second.expect("second edit should apply").is_applied());
    assert_eq!(harness.local(id).priority(), Some(Priority::High));
    assert_eq!(harness.store.sent_patches(id).expect("store readable").len(), 1);
    assert!(!harness.service.activity().is_updating_priority());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn saved_locations_are_applied_through_the_directory(harness: Harness) {
    let id = active_task(&harness).await;
    let depot = crate::task::domain::Location::named("Depot");
    harness
        .directory
        .add_location(depot.clone())
        .expect("directory writable");

    harness
        .service
        .update_pickup_from_saved(id, depot.id)
        .await
        .expect("saved pickup should apply");

    assert_eq!(harness.local(id).pickup_location(), Some(&depot));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rider_label_refreshes_from_the_latest_record(harness: Harness) {
    let id = active_task(&harness).await;
    for label in ["North", "South"] {
        harness
            .store
            .push_rider_record(
                id,
                crate::task::ports::PatchRecord {
                    patch: label.to_owned(),
                    patch_id: None,
                },
            )
            .expect("store writable");
    }

    harness
        .service
        .refresh_rider_responsibility(id)
        .await
        .expect("refresh should succeed");

    assert_eq!(harness.local(id).rider_responsibility(), Some("South"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_patches_are_refused(harness: Harness) {
    let id = active_task(&harness).await;

    let result = harness.service.update_task(id, TaskPatch::new()).await;

    assert!(matches!(
        result,
        Err(TaskLifecycleError::Domain(TaskDomainError::EmptyPatch(_)))
    ));
}

async fn task_with_rider(harness: &Harness) -> crate::task::domain::TaskId {
    let task = harness
        .service
        .create_task(CreateTaskRequest::new())
        .await
        .expect("task creation should succeed");
    let rider = User::new("Ada");
    harness
        .directory
        .add_user(rider.clone())
        .expect("directory writable");
    harness
        .service
        .assign_rider(task.id(), rider.id)
        .await
        .expect("rider assignment should succeed");
    task.id()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn undoing_a_cancel_reopens_the_task_for_riders(harness: Harness) {
    let id = harness
        .service
        .create_task(CreateTaskRequest::new())
        .await
        .expect("task creation should succeed")
        .id();
    let cancelled = harness
        .service
        .mark_cancelled(id, Some(Utc::now()))
        .await
        .expect("cancel should succeed");
    harness
        .service
        .undo(cancelled.notification().expect("cancel should notify"))
        .await
        .expect("undo should succeed");

    assert_eq!(harness.local(id).status(), TaskStatus::New);
    let stored = harness
        .store
        .stored(id)
        .expect("store readable")
        .expect("task stored");
    assert_eq!(stored.status(), TaskStatus::New);

    let rider = User::new("Grace");
    harness
        .directory
        .add_user(rider.clone())
        .expect("directory writable");
    harness
        .service
        .assign_rider(id, rider.id)
        .await
        .expect("a reopened task takes riders");
    assert_eq!(harness.local(id).status(), TaskStatus::Active);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn undoing_a_pickup_returns_the_task_to_active(harness: Harness) {
    let id = task_with_rider(&harness).await;
    let picked = harness
        .service
        .mark_picked_up(id, Some(Utc::now()))
        .await
        .expect("pickup should succeed");

    harness
        .service
        .undo(picked.notification().expect("pickup should notify"))
        .await
        .expect("undo should succeed");

    let local = harness.local(id);
    assert_eq!(local.time_picked_up(), None);
    assert_eq!(local.status(), TaskStatus::Active);
    let stored = harness
        .store
        .stored(id)
        .expect("store readable")
        .expect("task stored");
    assert_eq!(stored.status(), TaskStatus::Active);
    assert_eq!(
        harness.store.sent_patches(id).expect("store readable").last(),
        Some(&TaskPatch::new().with_time_picked_up(None))
    );

    let delivered = harness.service.mark_dropped_off(id, Some(Utc::now())).await;
    assert!(matches!(
        delivered,
        Err(TaskLifecycleError::Domain(
            TaskDomainError::InvalidStateTransition {
                from: TaskStatus::Active,
                to: TaskStatus::DroppedOff,
            }
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn generic_updates_refuse_milestones(harness: Harness) {
    let legs = harness.relay(1).await;
    let (head, tail) = (legs[0].id(), legs[1].id());

    let closing = harness
        .service
        .update_task(head, TaskPatch::new().with_time_cancelled(Some(Utc::now())))
        .await;
    let completing = harness
        .service
        .update_task(head, TaskPatch::new().with_status(TaskStatus::Completed))
        .await;

    assert!(matches!(
        closing,
        Err(TaskLifecycleError::Domain(TaskDomainError::MilestoneInPatch(id))) if id == head
    ));
    assert!(matches!(
        completing,
        Err(TaskLifecycleError::Domain(TaskDomainError::MilestoneInPatch(_)))
    ));
    assert_eq!(harness.local(head).relay_next(), Some(tail));
    assert!(harness.store.sent_patches(head).expect("store readable").is_empty());
    let failures = harness.sink.failures();
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|failure| failure.intent == Intent::UpdateTask
        && failure.kind == FailureKind::Validation));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn generic_status_changes_follow_the_lifecycle(harness: Harness) {
    let id = task_with_rider(&harness).await;

    let result = harness
        .service
        .update_task(id, TaskPatch::new().with_status(TaskStatus::New))
        .await;
    assert!(result.is_ok());

    harness
        .service
        .mark_cancelled(id, Some(Utc::now()))
        .await
        .expect("cancel should succeed");
    let reactivated = harness
        .service
        .update_task(id, TaskPatch::new().with_status(TaskStatus::Active))
        .await;

    assert!(matches!(
        reactivated,
        Err(TaskLifecycleError::Domain(
            TaskDomainError::InvalidStateTransition { .. }
        ))
    ));
}
