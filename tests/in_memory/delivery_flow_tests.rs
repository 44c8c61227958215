//! End-to-end relay delivery through the controller.

use super::helpers::{Client, SharedStore, dispatcher};
use chrono::Utc;
use courier_relay::task::{
    domain::{Location, Priority, RequesterContact, TaskStatus, User},
    services::CreateTaskRequest,
};
use eyre::WrapErr;
use rstest::rstest;

fn add_rider(client: &Client, name: &str, label: &str) -> Result<User, eyre::Report> {
    let rider = User::new(name).with_rider_responsibility(label);
    client
        .directory
        .add_user(rider.clone())
        .wrap_err("register rider")?;
    Ok(rider)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn two_leg_relay_is_delivered_end_to_end(
    dispatcher: (SharedStore, Client),
) -> Result<(), eyre::Report> {
    let (_store, client) = dispatcher;
    let controller = &client.controller;
    let first_rider = add_rider(&client, "Ada", "North")?;
    let second_rider = add_rider(&client, "Grace", "South")?;

    let first = controller
        .create_task(
            CreateTaskRequest::new()
                .with_requester_contact(RequesterContact::new("Pantry", "0113 496 0000"))
                .with_priority(Priority::High)
                .with_pickup_location(Location::named("Warehouse"))
                .with_dropoff_location(Location::named("Shelter")),
        )
        .await
        .wrap_err("create first leg")?;
    let second = controller
        .create_relay_leg(first.id())
        .await
        .wrap_err("create second leg")?;
    controller
        .assign_rider(first.id(), first_rider.id)
        .await
        .wrap_err("assign first rider")?;
    controller
        .assign_rider(second.id(), second_rider.id)
        .await
        .wrap_err("assign second rider")?;

    for leg in [first.id(), second.id()] {
        controller.mark_picked_up(leg, Some(Utc::now())).await?;
        controller.mark_dropped_off(leg, Some(Utc::now())).await?;
        controller.mark_rider_home(leg).await?;
    }

    let snapshot = controller.snapshot();
    for leg in [first.id(), second.id()] {
        let task = snapshot
            .get(leg)
            .ok_or_else(|| eyre::eyre!("leg {leg} missing"))?;
        eyre::ensure!(
            task.status() == TaskStatus::Completed,
            "leg {leg} ended {}",
            task.status()
        );
    }
    let head = snapshot
        .get(first.id())
        .ok_or_else(|| eyre::eyre!("first leg missing"))?;
    eyre::ensure!(
        head.rider_responsibility() == Some("North"),
        "first leg label is {:?}",
        head.rider_responsibility()
    );
    eyre::ensure!(
        head.relay_next() == Some(second.id()),
        "completed legs stay chained"
    );
    eyre::ensure!(
        head.dropoff_location().is_none(),
        "dropoff should have moved to the second leg"
    );
    eyre::ensure!(
        client.sink.notifications().len() == 4,
        "expected one notification per pickup and delivery"
    );
    eyre::ensure!(
        client.sink.failures().is_empty(),
        "unexpected failures: {:?}",
        client.sink.failures()
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_leg_can_be_reopened_and_delivered(
    dispatcher: (SharedStore, Client),
) -> Result<(), eyre::Report> {
    let (_store, client) = dispatcher;
    let controller = &client.controller;
    let task = controller.create_task(CreateTaskRequest::new()).await?;
    let cancelled = controller
        .mark_cancelled(task.id(), Some(Utc::now()))
        .await?;
    let notification = cancelled
        .notification()
        .ok_or_else(|| eyre::eyre!("cancel should be undoable"))?;

    controller.undo(notification).await?;

    let reopened = controller
        .task(task.id())
        .ok_or_else(|| eyre::eyre!("task missing"))?;
    eyre::ensure!(
        reopened.time_cancelled().is_none(),
        "cancelled time should be cleared"
    );
    eyre::ensure!(!reopened.is_closed(), "task should be open again");
    Ok(())
}
