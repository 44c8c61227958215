//! Given steps for relay relinking BDD scenarios.

use super::world::{RelayWorld, run_async};
use courier_relay::task::{domain::Location, services::CreateTaskRequest};
use eyre::WrapErr;
use rstest_bdd_macros::given;

fn build_relay(
    world: &mut RelayWorld,
    count: usize,
    request: CreateTaskRequest,
) -> Result<(), eyre::Report> {
    let head = run_async(world.service.create_task(request)).wrap_err("create relay head")?;
    world.legs = vec![head.id()];
    for position in 2..=count {
        let previous = world.leg_id(position - 1)?;
        let next = run_async(world.service.create_relay_leg(previous))
            .wrap_err_with(|| format!("create relay leg {position}"))?;
        world.legs.push(next.id());
    }
    Ok(())
}

#[given("a relay of {count:usize} legs")]
fn relay_of_legs(world: &mut RelayWorld, count: usize) -> Result<(), eyre::Report> {
    build_relay(world, count, CreateTaskRequest::new())
}

#[given(r#"a relay of {count:usize} legs delivering to "{location}""#)]
fn relay_delivering_to(
    world: &mut RelayWorld,
    count: usize,
    location: String,
) -> Result<(), eyre::Report> {
    build_relay(
        world,
        count,
        CreateTaskRequest::new().with_dropoff_location(Location::named(location)),
    )
}
