#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Overrun encounter.
//!
//! The adapter owns the fixed-timestep loop and stands in for the excluded
//! presentation and input layers: it strafes the defender on a slow circle,
//! fires its weapon at the nearest hostile, forwards resolved hits into the
//! world, and prints the scoring tally when the run ends.

use std::time::Duration;

use anyhow::{ensure, Result};
use clap::Parser;
use overrun_core::{Command, Event, GroundPoint, WeaponDischarge};
use overrun_system_assault::Assault;
use overrun_system_combat::{CombatResolver, Config as CombatConfig};
use overrun_system_pursuit::{Config as PursuitConfig, Pursuit};
use overrun_system_scoring::Scoring;
use overrun_system_wave_scheduling::{Config as SchedulingConfig, WaveScheduling};
use overrun_world::{self as world, query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Fixed simulation timestep; every consumer sees the same delta.
const TICK: Duration = Duration::from_millis(16);

const PURSUIT_SEED_SALT: u64 = 0x70ab_39d1_5c24_e88f;
const COMBAT_SEED_SALT: u64 = 0x11c6_84f2_9db0_3a67;

/// Radius of the defender's slow strafing circle around the origin.
const STRAFE_RADIUS: f32 = 3.0;
const STRAFE_ANGULAR_SPEED: f32 = 0.4;

const FIRE_INTERVAL: Duration = Duration::from_millis(600);
const WEAPON_RANGE: f32 = 40.0;
const RIFLE_DAMAGE: u32 = 40;
const RIFLE_ACCURACY: f32 = 0.9;
const SHOTGUN_DAMAGE: u32 = 12;
const SHOTGUN_PELLETS: u32 = 6;
const SHOTGUN_ACCURACY: f32 = 0.7;
const AIM_JITTER: f32 = 0.02;

/// Headless horde-encounter runner.
#[derive(Debug, Parser)]
#[command(name = "overrun")]
struct Args {
    /// Seed shared by every randomized subsystem.
    #[arg(long, default_value_t = 0x0dd5_eed5)]
    seed: u64,
    /// Number of fixed 16ms ticks to simulate.
    #[arg(long, default_value_t = 22_500)]
    ticks: u64,
    /// Print every broadcast event while running.
    #[arg(long)]
    trace: bool,
}

/// Entry point for the Overrun command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    ensure!(args.ticks > 0, "tick budget must be positive");
    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let mut world = World::new();
    let mut scheduling = WaveScheduling::new(SchedulingConfig::new(args.seed));
    let mut pursuit = Pursuit::new(PursuitConfig::new(args.seed ^ PURSUIT_SEED_SALT));
    let mut assault = Assault::new();
    let mut resolver = CombatResolver::new(CombatConfig::new(args.seed ^ COMBAT_SEED_SALT));
    let mut scoring = Scoring::new();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let mut inboxes = Inboxes::default();
    let mut fresh = Vec::new();
    let mut commands = Vec::new();
    let mut hits = Vec::new();

    world::apply(&mut world, Command::StartWave, &mut fresh);
    inboxes.dispatch(&mut fresh, args.trace);

    let mut clock = Duration::ZERO;
    let mut next_shot_at = FIRE_INTERVAL;

    for _ in 0..args.ticks {
        clock = clock.saturating_add(TICK);

        // Input sync and time advance first; spawning precedes agent updates.
        world::apply(
            &mut world,
            Command::SetDefenderPosition {
                position: strafe_position(clock),
            },
            &mut fresh,
        );
        world::apply(&mut world, Command::Tick { dt: TICK }, &mut fresh);
        inboxes.dispatch(&mut fresh, args.trace);

        scheduling.handle(&inboxes.scheduling, &query::defender(&world), &mut commands);
        inboxes.scheduling.clear();
        apply_all(&mut world, &mut commands, &mut fresh);
        inboxes.dispatch(&mut fresh, args.trace);

        pursuit.handle(
            &inboxes.pursuit,
            &query::agent_view(&world),
            &query::defender(&world),
            &mut commands,
        );
        inboxes.pursuit.clear();
        apply_all(&mut world, &mut commands, &mut fresh);

        assault.handle(
            &query::agent_view(&world),
            &query::defender(&world),
            &mut commands,
        );
        apply_all(&mut world, &mut commands, &mut fresh);
        inboxes.dispatch(&mut fresh, args.trace);

        let defender = query::defender(&world);
        if !defender.is_dead && clock >= next_shot_at {
            next_shot_at = clock.saturating_add(FIRE_INTERVAL);
            if let Some(discharge) = aim_at_nearest(&world, defender.position, &mut rng) {
                resolver.resolve(&discharge, &query::agent_view(&world), &mut hits);
                for hit in hits.drain(..) {
                    world::apply(
                        &mut world,
                        Command::HitAgent {
                            agent: hit.agent,
                            damage: hit.damage,
                        },
                        &mut fresh,
                    );
                }
                inboxes.dispatch(&mut fresh, args.trace);
            }
        }

        // Completion detection runs after every agent update of the tick.
        scheduling.detect_completion(
            &query::agent_view(&world),
            &query::wave_status(&world),
            &mut commands,
        );
        apply_all(&mut world, &mut commands, &mut fresh);
        inboxes.dispatch(&mut fresh, args.trace);

        scoring.handle(&inboxes.scoring);
        inboxes.scoring.clear();

        if query::defender(&world).is_dead {
            break;
        }
    }

    print_summary(&world, &scoring, clock);
    Ok(())
}

/// Per-system event queues so each batch is consumed exactly once.
#[derive(Debug, Default)]
struct Inboxes {
    scheduling: Vec<Event>,
    pursuit: Vec<Event>,
    scoring: Vec<Event>,
}

impl Inboxes {
    fn dispatch(&mut self, fresh: &mut Vec<Event>, trace: bool) {
        for event in fresh.drain(..) {
            if trace {
                println!("[event] {event:?}");
            }
            self.scheduling.push(event.clone());
            self.pursuit.push(event.clone());
            self.scoring.push(event);
        }
    }
}

fn apply_all(world: &mut World, commands: &mut Vec<Command>, fresh: &mut Vec<Event>) {
    for command in commands.drain(..) {
        world::apply(world, command, fresh);
    }
}

fn strafe_position(clock: Duration) -> GroundPoint {
    let angle = clock.as_secs_f32() * STRAFE_ANGULAR_SPEED;
    GroundPoint::new(STRAFE_RADIUS * angle.cos(), STRAFE_RADIUS * angle.sin())
}

/// Builds a discharge aimed at the closest live agent, or `None` when the
/// field is clear.
fn aim_at_nearest(
    world: &World,
    origin: GroundPoint,
    rng: &mut ChaCha8Rng,
) -> Option<WeaponDischarge> {
    let view = query::agent_view(world);
    let mut nearest: Option<(f32, GroundPoint)> = None;
    for snapshot in view.iter() {
        let distance = origin.distance_to(snapshot.position);
        if nearest.map_or(true, |(best, _)| distance < best) {
            nearest = Some((distance, snapshot.position));
        }
    }

    let (_, target) = nearest?;
    let direction = (target.x() - origin.x()).atan2(target.z() - origin.z())
        + rng.gen_range(-AIM_JITTER..AIM_JITTER);

    let discharge = if rng.gen_bool(0.25) {
        WeaponDischarge {
            origin,
            direction,
            range: WEAPON_RANGE,
            pellet_count: SHOTGUN_PELLETS,
            accuracy: SHOTGUN_ACCURACY,
            damage_per_hit: SHOTGUN_DAMAGE,
        }
    } else {
        WeaponDischarge {
            origin,
            direction,
            range: WEAPON_RANGE,
            pellet_count: 1,
            accuracy: RIFLE_ACCURACY,
            damage_per_hit: RIFLE_DAMAGE,
        }
    };
    Some(discharge)
}

fn print_summary(world: &World, scoring: &Scoring, clock: Duration) {
    let report = scoring.report();
    let defender = query::defender(world);
    let status = query::wave_status(world);

    println!("encounter ended after {:.1}s simulated", clock.as_secs_f32());
    println!(
        "score {} from {} kills; highest wave cleared {}",
        report.score,
        report.kills,
        report.highest_wave_cleared.get()
    );
    println!(
        "defender {} at {}/{} health; wave {} {}",
        if defender.is_dead { "down" } else { "standing" },
        defender.health.get(),
        defender.max_health.get(),
        status.wave.get(),
        if status.active { "in progress" } else { "idle" },
    );
}
