#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Overrun encounter engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Label for the RNG stream that selects agent kinds during spawning.
pub const RNG_STREAM_KIND: &str = "kind-selection";
/// Label for the RNG stream that places spawn points on the ring.
pub const RNG_STREAM_RING: &str = "ring-placement";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Synchronizes the defender's position from the external input layer.
    SetDefenderPosition {
        /// Ground-plane position the defender occupies this tick.
        position: GroundPoint,
    },
    /// Begins the next wave, incrementing the wave number.
    StartWave,
    /// Ends the active wave once its agents are exhausted and cleared.
    CompleteWave,
    /// Requests that a new hostile agent enter the encounter.
    SpawnAgent {
        /// Kind of agent to instantiate.
        kind: AgentKind,
        /// Ground-plane position the agent spawns at.
        position: GroundPoint,
    },
    /// Repositions a live agent and updates its facing.
    MoveAgent {
        /// Identifier of the agent to move.
        agent: AgentId,
        /// Destination position for this tick.
        to: GroundPoint,
        /// Facing angle in radians after the move.
        facing: f32,
    },
    /// Requests that an agent deliver its melee strike to the defender.
    StrikeDefender {
        /// Identifier of the striking agent.
        agent: AgentId,
    },
    /// Applies weapon or melee damage to a live agent.
    HitAgent {
        /// Identifier of the damaged agent.
        agent: AgentId,
        /// Damage to subtract from the agent's health.
        damage: u32,
    },
    /// Returns the encounter to its pre-first-wave state.
    ResetEncounter,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a new wave began.
    WaveStarted {
        /// Number of the wave that just started.
        wave: WaveNumber,
    },
    /// Announces that the active wave was fully spawned and cleared.
    WaveCompleted {
        /// Number of the wave that completed.
        wave: WaveNumber,
    },
    /// Confirms that an agent entered the encounter.
    AgentSpawned {
        /// Identifier assigned to the new agent.
        agent: AgentId,
        /// Kind of the spawned agent.
        kind: AgentKind,
        /// Position the agent spawned at.
        position: GroundPoint,
    },
    /// Reports that an agent's health reached zero.
    AgentKilled {
        /// Identifier of the killed agent.
        agent: AgentId,
        /// Position the agent died at.
        position: GroundPoint,
        /// Score awarded for the kill.
        score_value: u32,
    },
    /// Reports that the defender absorbed damage.
    DefenderDamaged {
        /// Damage applied after the swarm multiplier and cap.
        amount: u32,
        /// Defender health remaining, as a fraction of maximum.
        health_fraction: f32,
    },
    /// Announces that the defender's health reached zero.
    GameOver,
    /// Confirms that the encounter returned to its initial state.
    EncounterReset,
}

/// Unique identifier assigned to a hostile agent.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Number of a scheduled wave, starting at zero before the first wave.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct WaveNumber(u32);

impl WaveNumber {
    /// Creates a new wave number wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying wave index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the wave number that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Hit points carried by an agent or the defender, never negative.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Health(u32);

impl Health {
    /// Creates a new health value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the remaining hit points.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Reports whether no hit points remain.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtracts damage, flooring at zero.
    #[must_use]
    pub const fn saturating_sub(self, damage: u32) -> Self {
        Self(self.0.saturating_sub(damage))
    }
}

/// Position on the ground plane expressed as x and z world coordinates.
///
/// The vertical axis is owned by the presentation layer; the simulation is
/// entirely planar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundPoint {
    x: f32,
    z: f32,
}

impl GroundPoint {
    /// Creates a new ground-plane position.
    #[must_use]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Coordinate along the world x axis.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Coordinate along the world z axis.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.z
    }

    /// Euclidean distance to another point on the plane.
    #[must_use]
    pub fn distance_to(self, other: GroundPoint) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }
}

/// Kinds of hostile agents that can be spawned into the encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    /// Baseline agent with balanced speed and durability.
    Walker,
    /// Fast, fragile agent that closes distance quickly.
    Runner,
    /// Slow, heavily armored agent that hits hard.
    Tank,
}

impl AgentKind {
    /// Every agent kind, in weighted-selection order.
    pub const ALL: [AgentKind; 3] = [AgentKind::Walker, AgentKind::Runner, AgentKind::Tank];

    /// Returns the fixed stat block for the kind.
    ///
    /// Stats are static per kind; no per-instance randomization is applied
    /// at spawn time.
    #[must_use]
    pub const fn stats(self) -> KindStats {
        match self {
            Self::Walker => KindStats {
                max_health: Health::new(100),
                melee_damage: 10,
                speed: 2.0,
                attack_range: 1.8,
                attack_cooldown: Duration::from_millis(1_000),
                detection_range: 60.0,
                score_value: 10,
                hitbox_radius: 0.6,
            },
            Self::Runner => KindStats {
                max_health: Health::new(60),
                melee_damage: 5,
                speed: 3.5,
                attack_range: 1.6,
                attack_cooldown: Duration::from_millis(700),
                detection_range: 60.0,
                score_value: 15,
                hitbox_radius: 0.5,
            },
            Self::Tank => KindStats {
                max_health: Health::new(300),
                melee_damage: 25,
                speed: 1.2,
                attack_range: 2.2,
                attack_cooldown: Duration::from_millis(1_600),
                detection_range: 60.0,
                score_value: 30,
                hitbox_radius: 1.0,
            },
        }
    }
}

/// Fixed stat block shared by every agent of a kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KindStats {
    /// Hit points the agent spawns with.
    pub max_health: Health,
    /// Damage dealt by one melee strike before swarm scaling.
    pub melee_damage: u32,
    /// Nominal movement speed in world units per second.
    pub speed: f32,
    /// Distance at which the agent stops advancing and strikes.
    pub attack_range: f32,
    /// Minimum time between successive strikes.
    pub attack_cooldown: Duration,
    /// Distance within which the agent notices the defender.
    pub detection_range: f32,
    /// Score awarded when the agent is killed.
    pub score_value: u32,
    /// Radius of the agent's cylindrical hitbox on the ground plane.
    pub hitbox_radius: f32,
}

/// Proportions of each agent kind within a wave, summing to one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KindMix {
    walker: f32,
    runner: f32,
    tank: f32,
}

impl KindMix {
    /// Creates a new kind mix from explicit proportions.
    #[must_use]
    pub const fn new(walker: f32, runner: f32, tank: f32) -> Self {
        Self {
            walker,
            runner,
            tank,
        }
    }

    /// Proportion of walkers in the wave.
    #[must_use]
    pub const fn walker(&self) -> f32 {
        self.walker
    }

    /// Proportion of runners in the wave.
    #[must_use]
    pub const fn runner(&self) -> f32 {
        self.runner
    }

    /// Proportion of tanks in the wave.
    #[must_use]
    pub const fn tank(&self) -> f32 {
        self.tank
    }

    /// Sum of all proportions; one for every valid mix.
    #[must_use]
    pub fn sum(&self) -> f32 {
        self.walker + self.runner + self.tank
    }
}

/// Composition and cadence computed for a single wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    total_spawns: u32,
    spawn_interval: Duration,
    mix: KindMix,
}

impl WaveConfig {
    /// Creates a new wave configuration.
    #[must_use]
    pub const fn new(total_spawns: u32, spawn_interval: Duration, mix: KindMix) -> Self {
        Self {
            total_spawns,
            spawn_interval,
            mix,
        }
    }

    /// Total number of agents the wave spawns before it can complete.
    #[must_use]
    pub const fn total_spawns(&self) -> u32 {
        self.total_spawns
    }

    /// Time between successive spawns.
    #[must_use]
    pub const fn spawn_interval(&self) -> Duration {
        self.spawn_interval
    }

    /// Kind proportions used for weighted spawn selection.
    #[must_use]
    pub const fn mix(&self) -> KindMix {
        self.mix
    }
}

/// Immutable representation of a single live agent used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Unique identifier assigned to the agent.
    pub id: AgentId,
    /// Kind of the agent.
    pub kind: AgentKind,
    /// Ground-plane position at the start of the tick.
    pub position: GroundPoint,
    /// Facing angle in radians.
    pub facing: f32,
    /// Remaining hit points.
    pub health: Health,
    /// Stable per-agent seed assigned at spawn, used for steering spread.
    pub steer_seed: u64,
    /// Indicates the strike cooldown has fully elapsed.
    pub ready_to_strike: bool,
    /// Indicates the strike display window is still open.
    pub is_attacking: bool,
}

/// Read-only snapshot describing all live agents in the encounter.
#[derive(Clone, Debug, Default)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AgentSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured agent snapshots in deterministic order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Number of live agents captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no live agents remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AgentSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of the defender used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenderSnapshot {
    /// Ground-plane position synced from the input layer.
    pub position: GroundPoint,
    /// Remaining hit points.
    pub health: Health,
    /// Hit points the defender started with.
    pub max_health: Health,
    /// Indicates the defender's health reached zero.
    pub is_dead: bool,
    /// Remaining invincibility window after the last damage application.
    pub invincible_for: Duration,
}

/// Wave bookkeeping captured from the authoritative world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveStatus {
    /// Number of the current (or most recent) wave.
    pub wave: WaveNumber,
    /// Indicates a wave is currently spawning or being fought.
    pub active: bool,
    /// Agents spawned so far during the active wave.
    pub spawned: u32,
}

/// One weapon discharge submitted by the external input layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponDischarge {
    /// Muzzle position on the ground plane.
    pub origin: GroundPoint,
    /// Aim direction in radians on the ground plane.
    pub direction: f32,
    /// Maximum distance a pellet travels.
    pub range: f32,
    /// Number of independent pellets in the discharge.
    pub pellet_count: u32,
    /// Weapon accuracy in the range 0.0..=1.0; higher narrows the cone.
    pub accuracy: f32,
    /// Damage applied by each pellet that connects.
    pub damage_per_hit: u32,
}

/// Outcome of a single pellet connecting with an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedHit {
    /// Identifier of the agent the pellet struck.
    pub agent: AgentId,
    /// Damage the pellet carries.
    pub damage: u32,
    /// Indicates this pellet drove the agent's health to zero.
    pub killed: bool,
}

/// Running tally published for the excluded UI and leaderboard layers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Total score accumulated from kills.
    pub score: u32,
    /// Number of agents killed.
    pub kills: u32,
    /// Highest wave number that was fully cleared.
    pub highest_wave_cleared: WaveNumber,
}
