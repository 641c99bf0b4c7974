#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic steering system that proposes agent movement.
//!
//! Each tick the system reads the start-of-tick agent view plus the defender
//! snapshot and emits one `Command::MoveAgent` per pursuing agent. Movement
//! decisions never depend on sibling updates made during the same tick, only
//! on the captured view, so update order across agents cannot change the
//! outcome.

use std::time::Duration;

use glam::Vec2;
use overrun_core::{AgentSnapshot, AgentView, Command, DefenderSnapshot, Event, GroundPoint};

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;

const TAU: f64 = std::f64::consts::PI * 2.0;

/// Radius around an agent's prospective position that counts as crowded.
const AVOIDANCE_RADIUS: f32 = 2.5;
/// More than this many crowding neighbours triggers formation mode.
const CONGESTION_NEIGHBOUR_LIMIT: usize = 2;
/// Formation mode only applies this close to the defender.
const NEAR_DEFENDER_RANGE: f32 = 10.0;
/// Floor on the surround-formation circle radius.
const FORMATION_RADIUS_MIN: f32 = 3.0;
const FORMATION_RADIUS_SCALE: f32 = 0.7;
/// Baseline separation agents keep from one another.
const MIN_SEPARATION_BASE: f32 = 1.5;
/// Separation widens by this much per unit of distance to the defender.
const SEPARATION_DISTANCE_SCALE: f32 = 0.08;
/// Speed retained while shouldering away from a close neighbour.
const REPULSION_SPEED_FACTOR: f32 = 0.7;
/// Fraction of the remaining gap covered when a full step would overshoot
/// the attack range.
const OVERSHOOT_GUARD: f32 = 0.9;
const JITTER_MAGNITUDE: f32 = 0.2;

/// Configuration parameters required to construct the pursuit system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    jitter_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided jitter seed.
    #[must_use]
    pub const fn new(jitter_seed: u64) -> Self {
        Self { jitter_seed }
    }
}

/// Pure system that reacts to elapsed time and emits movement commands.
#[derive(Debug)]
pub struct Pursuit {
    jitter_state: u64,
}

impl Pursuit {
    /// Creates a new pursuit system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            jitter_state: config.jitter_seed,
        }
    }

    /// Consumes events and immutable views to emit movement commands.
    ///
    /// A dead defender suspends steering for the tick; the agents simply
    /// hold position rather than failing the update.
    pub fn handle(
        &mut self,
        events: &[Event],
        agents: &AgentView,
        defender: &DefenderSnapshot,
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                elapsed = elapsed.saturating_add(*dt);
            }
        }

        if elapsed.is_zero() || defender.is_dead {
            return;
        }

        let dt = elapsed.as_secs_f32();
        let target = to_vec2(defender.position);

        for snapshot in agents.iter() {
            let stats = snapshot.kind.stats();
            let here = to_vec2(snapshot.position);
            let offset = target - here;
            let distance = offset.length();

            if distance > stats.detection_range {
                continue;
            }

            let facing = offset.x.atan2(offset.y);

            if distance <= stats.attack_range {
                out.push(Command::MoveAgent {
                    agent: snapshot.id,
                    to: snapshot.position,
                    facing,
                });
                continue;
            }

            let step = stats.speed * dt;
            let direction = offset / distance;
            let prospective = here + direction * step;

            let crowd = survey_neighbours(snapshot, agents, prospective);
            let destination = if crowd.count > CONGESTION_NEIGHBOUR_LIMIT
                && distance < NEAR_DEFENDER_RANGE
            {
                formation_step(snapshot, here, target, distance, step)
            } else if let Some(neighbour) = crowd.nearest {
                if neighbour.distance < min_separation(distance) {
                    self.repulsion_step(here, direction, prospective, neighbour.position, step)
                } else {
                    direct_step(here, direction, distance, stats.attack_range, step)
                }
            } else {
                direct_step(here, direction, distance, stats.attack_range, step)
            };

            out.push(Command::MoveAgent {
                agent: snapshot.id,
                to: GroundPoint::new(destination.x, destination.y),
                facing,
            });
        }
    }

    /// Blends pursuit with repulsion away from the closest neighbour at a
    /// reduced pace, perturbing slightly to break symmetric deadlocks.
    fn repulsion_step(
        &mut self,
        here: Vec2,
        direction: Vec2,
        prospective: Vec2,
        neighbour: Vec2,
        step: f32,
    ) -> Vec2 {
        let away = (prospective - neighbour)
            .try_normalize()
            .unwrap_or_else(|| Vec2::new(direction.y, -direction.x));
        let jitter = Vec2::new(self.next_jitter(), self.next_jitter());
        let blended = (direction + away + jitter)
            .try_normalize()
            .unwrap_or(direction);
        here + blended * (REPULSION_SPEED_FACTOR * step)
    }

    fn next_jitter(&mut self) -> f32 {
        self.jitter_state = self
            .jitter_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        let unit = (self.jitter_state >> 11) as f32 / (1u64 << 53) as f32;
        (unit * 2.0 - 1.0) * JITTER_MAGNITUDE
    }
}

/// Crowding information gathered around a prospective position.
#[derive(Clone, Copy, Debug, Default)]
struct CrowdSurvey {
    count: usize,
    nearest: Option<Neighbour>,
}

#[derive(Clone, Copy, Debug)]
struct Neighbour {
    position: Vec2,
    distance: f32,
}

fn survey_neighbours(subject: &AgentSnapshot, agents: &AgentView, prospective: Vec2) -> CrowdSurvey {
    let mut survey = CrowdSurvey::default();

    for other in agents.iter() {
        if other.id == subject.id {
            continue;
        }

        let position = to_vec2(other.position);
        let distance = prospective.distance(position);
        if distance <= AVOIDANCE_RADIUS {
            survey.count += 1;
        }
        if survey
            .nearest
            .map_or(true, |nearest| distance < nearest.distance)
        {
            survey.nearest = Some(Neighbour { position, distance });
        }
    }

    survey
}

/// Steers toward a stable slot on a circle around the defender so crowded
/// agents surround the target instead of stacking at the chokepoint.
fn formation_step(
    snapshot: &AgentSnapshot,
    here: Vec2,
    target: Vec2,
    distance: f32,
    step: f32,
) -> Vec2 {
    let radius = (FORMATION_RADIUS_SCALE * distance).max(FORMATION_RADIUS_MIN);
    let angle = formation_angle(snapshot.steer_seed);
    let slot = target + Vec2::new(angle.sin(), angle.cos()) * radius;

    let to_slot = slot - here;
    let span = to_slot.length();
    if span <= f32::EPSILON {
        return here;
    }
    here + (to_slot / span) * step.min(span)
}

fn direct_step(here: Vec2, direction: Vec2, distance: f32, attack_range: f32, step: f32) -> Vec2 {
    let gap = distance - attack_range;
    let travel = if step > gap { OVERSHOOT_GUARD * gap } else { step };
    here + direction * travel
}

fn min_separation(distance_to_defender: f32) -> f32 {
    MIN_SEPARATION_BASE + SEPARATION_DISTANCE_SCALE * distance_to_defender
}

/// Maps the agent's spawn-time seed onto a stable angle in `[0, 2π)`.
fn formation_angle(steer_seed: u64) -> f32 {
    ((steer_seed as f64 / u64::MAX as f64) * TAU) as f32
}

fn to_vec2(point: GroundPoint) -> Vec2 {
    Vec2::new(point.x(), point.z())
}
