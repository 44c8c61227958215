//! When steps for relay relinking BDD scenarios.

use super::world::{RelayWorld, run_async};
use chrono::Utc;
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when("leg {position:usize} is cancelled")]
fn leg_is_cancelled(world: &mut RelayWorld, position: usize) -> Result<(), eyre::Report> {
    let id = world.leg_id(position)?;
    run_async(world.service.mark_cancelled(id, Some(Utc::now())))
        .wrap_err_with(|| format!("cancel leg {position}"))?;
    Ok(())
}

#[when("leg {position:usize} is rejected")]
fn leg_is_rejected(world: &mut RelayWorld, position: usize) -> Result<(), eyre::Report> {
    let id = world.leg_id(position)?;
    run_async(world.service.mark_rejected(id, Some(Utc::now())))
        .wrap_err_with(|| format!("reject leg {position}"))?;
    Ok(())
}

#[when("leg {position:usize} is deleted")]
fn leg_is_deleted(world: &mut RelayWorld, position: usize) -> Result<(), eyre::Report> {
    let id = world.leg_id(position)?;
    run_async(world.service.delete_task(id))
        .wrap_err_with(|| format!("delete leg {position}"))?;
    Ok(())
}

#[when("leg {position:usize} is restored")]
fn leg_is_restored(world: &mut RelayWorld, position: usize) -> Result<(), eyre::Report> {
    let id = world.leg_id(position)?;
    run_async(world.service.restore_task(id))
        .wrap_err_with(|| format!("restore leg {position}"))?;
    Ok(())
}

#[when("the last notification is undone")]
fn last_notification_undone(world: &mut RelayWorld) -> Result<(), eyre::Report> {
    let notification = world
        .sink
        .notifications()
        .pop()
        .ok_or_else(|| eyre::eyre!("no notification was emitted"))?;
    run_async(world.service.undo(notification.id)).wrap_err("undo last notification")?;
    Ok(())
}
