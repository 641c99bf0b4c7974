#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combat resolver that converts weapon discharges into hit reports.
//!
//! Each pellet casts a ray from the muzzle along a direction perturbed
//! inside an accuracy cone, looking for the nearest live hitbox. Thin or
//! grazing targets that slip between rays are caught by a distance-based
//! fallback along the same ray. Damage bookkeeping is local to a discharge:
//! the pellet that empties a target's health reports the kill and removes
//! the target from the remaining pellets' candidate set. Authoritative
//! damage application stays with the world; callers forward each
//! [`ResolvedHit`] as a `Command::HitAgent`.

use glam::Vec2;
use overrun_core::{AgentId, AgentView, ResolvedHit, WeaponDischarge};

/// Cone half-angle in radians at perfect accuracy; widens as accuracy drops.
const BASE_CONE_HALF_ANGLE: f32 = 0.02;
const MIN_ACCURACY: f32 = 0.05;
/// Maximum perpendicular miss distance accepted by the fallback test.
const FALLBACK_TOLERANCE: f32 = 0.75;

/// Configuration parameters required to construct the resolver.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided pellet-spread seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Resolver that reuses scratch buffers across discharges.
#[derive(Debug)]
pub struct CombatResolver {
    rng: SplitMix64,
    candidates: Vec<Candidate>,
}

impl CombatResolver {
    /// Creates a new resolver using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: SplitMix64::new(config.rng_seed),
            candidates: Vec::new(),
        }
    }

    /// Resolves one discharge against the live agents.
    ///
    /// The output buffer is cleared before populating it with one
    /// [`ResolvedHit`] per pellet that connected.
    pub fn resolve(
        &mut self,
        discharge: &WeaponDischarge,
        agents: &AgentView,
        out: &mut Vec<ResolvedHit>,
    ) {
        out.clear();
        self.prepare_candidates(agents);
        if self.candidates.is_empty() {
            return;
        }

        let origin = Vec2::new(discharge.origin.x(), discharge.origin.z());
        let half_angle = cone_half_angle(discharge.accuracy);
        let pellets = discharge.pellet_count.max(1);

        for _ in 0..pellets {
            let perturbation = (self.rng.next_unit() * 2.0 - 1.0) as f32 * half_angle;
            let theta = discharge.direction + perturbation;
            let direction = Vec2::new(theta.sin(), theta.cos());

            let selected = self
                .cast_ray(origin, direction, discharge.range)
                .or_else(|| self.distance_fallback(origin, direction, discharge.range));

            let Some(index) = selected else {
                continue;
            };
            let candidate = &mut self.candidates[index];
            let damage = discharge.damage_per_hit;
            let killed = candidate.remaining > 0 && candidate.remaining <= damage;
            candidate.remaining = candidate.remaining.saturating_sub(damage);
            out.push(ResolvedHit {
                agent: candidate.id,
                damage,
                killed,
            });
        }
    }

    fn prepare_candidates(&mut self, agents: &AgentView) {
        self.candidates.clear();
        let (lower, _) = agents.iter().size_hint();
        self.candidates.reserve(lower);

        for snapshot in agents.iter() {
            self.candidates.push(Candidate {
                id: snapshot.id,
                center: Vec2::new(snapshot.position.x(), snapshot.position.z()),
                radius: snapshot.kind.stats().hitbox_radius,
                remaining: snapshot.health.get(),
            });
        }
    }

    /// Finds the candidate whose hitbox the ray enters first.
    fn cast_ray(&self, origin: Vec2, direction: Vec2, range: f32) -> Option<usize> {
        let mut best: Option<BestCandidate> = None;

        for (index, candidate) in self.candidates.iter().enumerate() {
            if candidate.remaining == 0 {
                continue;
            }

            let relative = candidate.center - origin;
            let along = relative.dot(direction);
            let perp_sq = relative.length_squared() - along * along;
            let radius_sq = candidate.radius * candidate.radius;
            if perp_sq > radius_sq {
                continue;
            }

            let penetration = (radius_sq - perp_sq).sqrt();
            let entry = if relative.length_squared() <= radius_sq {
                0.0
            } else {
                along - penetration
            };
            if entry < 0.0 || entry > range {
                continue;
            }

            let current = BestCandidate {
                distance: entry,
                id: candidate.id,
                index,
            };
            match &mut best {
                Some(existing) => {
                    if current.precedes(existing) {
                        *existing = current;
                    }
                }
                None => best = Some(current),
            }
        }

        best.map(|candidate| candidate.index)
    }

    /// Accepts the nearest candidate whose perpendicular distance to the ray
    /// is within tolerance, for hitboxes a discrete ray can slip past.
    fn distance_fallback(&self, origin: Vec2, direction: Vec2, range: f32) -> Option<usize> {
        let mut best: Option<BestCandidate> = None;

        for (index, candidate) in self.candidates.iter().enumerate() {
            if candidate.remaining == 0 {
                continue;
            }

            let relative = candidate.center - origin;
            let along = relative.dot(direction);
            if along < 0.0 || along > range {
                continue;
            }

            let perp_sq = relative.length_squared() - along * along;
            if perp_sq > FALLBACK_TOLERANCE * FALLBACK_TOLERANCE {
                continue;
            }

            let current = BestCandidate {
                distance: along,
                id: candidate.id,
                index,
            };
            match &mut best {
                Some(existing) => {
                    if current.precedes(existing) {
                        *existing = current;
                    }
                }
                None => best = Some(current),
            }
        }

        best.map(|candidate| candidate.index)
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    id: AgentId,
    center: Vec2,
    radius: f32,
    remaining: u32,
}

#[derive(Clone, Copy, Debug)]
struct BestCandidate {
    distance: f32,
    id: AgentId,
    index: usize,
}

impl BestCandidate {
    fn precedes(&self, other: &Self) -> bool {
        if self.distance != other.distance {
            return self.distance < other.distance;
        }
        self.id < other.id
    }
}

fn cone_half_angle(accuracy: f32) -> f32 {
    BASE_CONE_HALF_ANGLE / accuracy.clamp(MIN_ACCURACY, 1.0)
}

#[derive(Debug)]
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed };
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    fn next_unit(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / ((1u64 << 53) as f64);
        let value = self.next_u64() >> 11;
        (value as f64) * SCALE
    }
}
