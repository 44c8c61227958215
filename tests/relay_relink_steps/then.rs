//! Then steps for relay relinking BDD scenarios.

use super::world::RelayWorld;
use courier_relay::task::domain::TaskPatch;
use rstest_bdd_macros::then;

#[then("leg {first:usize} is followed by leg {second:usize}")]
fn leg_followed_by(
    world: &RelayWorld,
    first: usize,
    second: usize,
) -> Result<(), eyre::Report> {
    let before = world.leg(first)?;
    let after = world.leg(second)?;

    eyre::ensure!(
        before.relay_next() == Some(after.id()),
        "leg {first} points at {:?}, expected leg {second}",
        before.relay_next()
    );
    eyre::ensure!(
        after.relay_previous_uuid() == Some(before.id()),
        "leg {second} points back at {:?}, expected leg {first}",
        after.relay_previous_uuid()
    );
    Ok(())
}

#[then("leg {position:usize} has no relay links")]
fn leg_has_no_links(world: &RelayWorld, position: usize) -> Result<(), eyre::Report> {
    let leg = world.leg(position)?;

    eyre::ensure!(
        leg.relay_previous_uuid().is_none() && leg.relay_next().is_none(),
        "leg {position} is still linked"
    );
    eyre::ensure!(leg.parent_id().is_some(), "leg {position} lost its parent");
    Ok(())
}

#[then("leg {position:usize} is at position {expected:u32}")]
fn leg_at_position(
    world: &RelayWorld,
    position: usize,
    expected: u32,
) -> Result<(), eyre::Report> {
    let order = world.leg(position)?.order_in_relay();

    eyre::ensure!(
        order == expected,
        "leg {position} is at position {order}, expected {expected}"
    );
    Ok(())
}

#[then("the relay chain has {count:usize} active legs")]
fn relay_chain_length(world: &RelayWorld, count: usize) -> Result<(), eyre::Report> {
    let mut active = 0;
    for position in 1..=world.legs.len() {
        if world.leg(position)?.is_relay_active() {
            active += 1;
        }
    }

    eyre::ensure!(active == count, "found {active} active legs, expected {count}");
    Ok(())
}

#[then(r#"leg {position:usize} delivers to "{location}""#)]
fn leg_delivers_to(
    world: &RelayWorld,
    position: usize,
    location: String,
) -> Result<(), eyre::Report> {
    let leg = world.leg(position)?;
    let name = leg.dropoff_location().and_then(|dropoff| dropoff.name.clone());

    eyre::ensure!(
        name.as_deref() == Some(location.as_str()),
        "leg {position} delivers to {name:?}, expected {location}"
    );
    Ok(())
}

#[then("the last undo cleared only the cancelled time of leg {position:usize}")]
fn undo_sent_cleared_time(world: &RelayWorld, position: usize) -> Result<(), eyre::Report> {
    let id = world.leg_id(position)?;
    let patches = world
        .store
        .sent_patches(id)
        .map_err(|err| eyre::eyre!("read sent patches: {err}"))?;

    eyre::ensure!(
        patches.last() == Some(&TaskPatch::new().with_time_cancelled(None)),
        "last patch for leg {position} was {:?}",
        patches.last()
    );
    Ok(())
}
