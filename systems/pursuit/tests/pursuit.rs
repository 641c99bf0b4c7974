use std::time::Duration;

use overrun_core::{AgentKind, Command, Event, GroundPoint};
use overrun_system_pursuit::{Config, Pursuit};
use overrun_world::{self as world, query, World};

const TICK: Duration = Duration::from_millis(16);

fn spawn(world: &mut World, kind: AgentKind, x: f32, z: f32) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnAgent {
            kind,
            position: GroundPoint::new(x, z),
        },
        &mut events,
    );
    assert!(
        matches!(events.as_slice(), [Event::AgentSpawned { .. }]),
        "spawn must be accepted"
    );
}

fn run_ticks(world: &mut World, pursuit: &mut Pursuit, count: usize) {
    for _ in 0..count {
        let mut events = Vec::new();
        world::apply(world, Command::Tick { dt: TICK }, &mut events);

        let mut commands = Vec::new();
        pursuit.handle(
            &events,
            &query::agent_view(world),
            &query::defender(world),
            &mut commands,
        );
        for command in commands {
            world::apply(world, command, &mut events);
        }
    }
}

#[test]
fn agents_converge_on_the_defender_and_hold_at_range() {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartWave, &mut events);
    spawn(&mut world, AgentKind::Walker, 0.0, 30.0);
    spawn(&mut world, AgentKind::Runner, -25.0, 10.0);

    let mut pursuit = Pursuit::new(Config::new(0x7ea));
    // 40 simulated seconds is ample for the slowest kind to cross the ring.
    run_ticks(&mut world, &mut pursuit, 2_500);

    let defender = query::defender(&world).position;
    for snapshot in query::agent_view(&world).iter() {
        let distance = snapshot.position.distance_to(defender);
        let range = snapshot.kind.stats().attack_range;
        assert!(
            distance <= range + 1e-3,
            "{:?} still {distance} units out (range {range})",
            snapshot.kind
        );
    }
}

#[test]
fn facing_tracks_the_defender_every_tick() {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartWave, &mut events);
    spawn(&mut world, AgentKind::Walker, 20.0, 0.0);

    let mut pursuit = Pursuit::new(Config::new(1));
    run_ticks(&mut world, &mut pursuit, 10);

    let view = query::agent_view(&world);
    let snapshot = view.iter().next().expect("agent alive");
    // Defender sits at the origin, agent approaches from +x: facing -pi/2.
    assert!((snapshot.facing - (-std::f32::consts::FRAC_PI_2)).abs() < 1e-2);
}

#[test]
fn a_packed_cluster_spreads_around_the_defender()
{
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartWave, &mut events);
    for index in 0..6 {
        let offset = index as f32 * 0.4;
        spawn(&mut world, AgentKind::Walker, offset - 1.0, 8.0 + offset * 0.1);
    }

    let mut pursuit = Pursuit::new(Config::new(0xc0ffee));
    run_ticks(&mut world, &mut pursuit, 1_500);

    // After converging, the pack should cover a spread of bearings instead
    // of stacking on the single approach lane they started on.
    let defender = query::defender(&world).position;
    let mut bearings: Vec<f32> = query::agent_view(&world)
        .iter()
        .map(|snapshot| {
            let dx = snapshot.position.x() - defender.x();
            let dz = snapshot.position.z() - defender.z();
            dx.atan2(dz)
        })
        .collect();
    bearings.sort_by(|a, b| a.partial_cmp(b).expect("finite bearings"));
    let spread = bearings.last().expect("agents") - bearings.first().expect("agents");
    assert!(
        spread > 0.8,
        "agents remained clumped within {spread} radians"
    );
}
