//! Several controllers sharing one remote store.

use super::helpers::{SharedStore, client, store};
use courier_relay::task::{
    domain::{AssigneeRole, Location, TaskPatch, User},
    ports::{RemoteStoreError, TaskRemoteStore},
    services::{CreateTaskRequest, TaskLifecycleError},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_client_sees_the_relay_after_fetching(
    store: SharedStore,
) -> Result<(), eyre::Report> {
    let dispatcher = User::new("Dispatch");
    let writer = client(&store, dispatcher.clone());
    let reader = client(&store, dispatcher.clone());
    let head = writer
        .controller
        .create_task(CreateTaskRequest::new().with_dropoff_location(Location::named("Clinic")))
        .await?;
    let tail = writer.controller.create_relay_leg(head.id()).await?;

    let fetched = reader
        .controller
        .fetch_tasks(dispatcher.id, AssigneeRole::Coordinator)
        .await?;

    eyre::ensure!(fetched.len() == 2, "expected both legs, got {}", fetched.len());
    let head_copy = fetched
        .get(head.id())
        .ok_or_else(|| eyre::eyre!("head missing"))?;
    eyre::ensure!(
        head_copy.relay_next() == Some(tail.id()),
        "head is not linked to the tail"
    );
    eyre::ensure!(
        head_copy.parent_id() == tail.parent_id(),
        "legs are in different relays"
    );
    let tail_copy = fetched
        .get(tail.id())
        .ok_or_else(|| eyre::eyre!("tail missing"))?;
    let dropoff = tail_copy
        .dropoff_location()
        .and_then(|location| location.name.as_deref());
    eyre::ensure!(dropoff == Some("Clinic"), "tail delivers to {dropoff:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn outdated_client_is_told_its_write_is_stale(
    store: SharedStore,
) -> Result<(), eyre::Report> {
    let dispatcher = User::new("Dispatch");
    let first = client(&store, dispatcher.clone());
    let second = client(&store, dispatcher.clone());
    let task = first.controller.create_task(CreateTaskRequest::new()).await?;
    second.controller.fetch_task(task.id()).await?;

    first
        .controller
        .update_task(
            task.id(),
            TaskPatch::new().with_rider_responsibility(Some("East".to_owned())),
        )
        .await?;
    let result = second
        .controller
        .update_task(task.id(), TaskPatch::new().with_rider_responsibility(None))
        .await;

    eyre::ensure!(
        matches!(
            result,
            Err(TaskLifecycleError::Remote(RemoteStoreError::StaleWrite(_)))
        ),
        "expected a stale write, got {result:?}"
    );
    second.controller.fetch_task(task.id()).await?;
    second
        .controller
        .update_task(task.id(), TaskPatch::new().with_rider_responsibility(None))
        .await?;
    let stored = store
        .get_task(task.id())
        .await
        .map_err(|err| eyre::eyre!("read stored task: {err}"))?;
    eyre::ensure!(
        stored.rider_responsibility().is_none(),
        "retried write did not land"
    );
    Ok(())
}
