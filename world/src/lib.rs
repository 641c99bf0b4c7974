#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative encounter state management for Overrun.
//!
//! The world owns the hostile-agent registry, the defender's damage model,
//! and wave bookkeeping. Systems never mutate this state directly; they
//! submit [`Command`] values through [`apply`] and observe the resulting
//! [`Event`] broadcasts plus the read-only views exposed by [`query`].

use std::time::Duration;

use overrun_core::{AgentId, AgentKind, Command, Event, GroundPoint, Health, WaveNumber};

/// Half-extent of the square explorable arena centered on the origin.
const ARENA_HALF_EXTENT: f32 = 60.0;

const DEFENDER_MAX_HEALTH: Health = Health::new(100);
/// Largest amount a single hit can remove from the defender.
const DAMAGE_CAP: u32 = 30;
/// Window after a successful damage application during which further damage
/// is fully suppressed.
const INVINCIBILITY_WINDOW: Duration = Duration::from_millis(750);
/// Radius around the defender inside which agents contribute swarm pressure.
const SWARM_RADIUS: f32 = 5.0;
const SWARM_MULTIPLIER_STEP: f32 = 0.1;
const SWARM_MULTIPLIER_MAX: f32 = 3.0;
/// How long the strike pose stays visible to the presentation layer.
const STRIKE_DISPLAY_WINDOW: Duration = Duration::from_millis(400);
/// How long a corpse lingers for the external death animation before the
/// registry slot is reclaimed.
const DESPAWN_WINDOW: Duration = Duration::from_millis(800);

const STEER_SEED_STATE: u64 = 0x9d4e_f1a3_62b8_0c55;

/// Represents the authoritative Overrun encounter state.
#[derive(Debug)]
pub struct World {
    agents: Vec<Agent>,
    next_agent_id: u32,
    steer_seed_state: u64,
    defender: Defender,
    wave: WaveNumber,
    wave_active: bool,
    spawned_in_wave: u32,
}

impl World {
    /// Creates a new encounter world in its pre-first-wave state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            next_agent_id: 0,
            steer_seed_state: STEER_SEED_STATE,
            defender: Defender::new(),
            wave: WaveNumber::new(0),
            wave_active: false,
            spawned_in_wave: 0,
        }
    }

    fn advance_time(&mut self, dt: Duration) {
        self.defender.invincible_for = self.defender.invincible_for.saturating_sub(dt);

        for agent in &mut self.agents {
            match agent.fate {
                Fate::Alive => {
                    agent.strike_cooldown = agent.strike_cooldown.saturating_sub(dt);
                    agent.strike_display = agent.strike_display.saturating_sub(dt);
                }
                Fate::Dead { ref mut despawn_in } => {
                    *despawn_in = despawn_in.saturating_sub(dt);
                }
            }
        }

        self.agents.retain(|agent| match agent.fate {
            Fate::Alive => true,
            Fate::Dead { despawn_in } => !despawn_in.is_zero(),
        });
    }

    fn spawn_agent(&mut self, kind: AgentKind, position: GroundPoint, out_events: &mut Vec<Event>) {
        if !self.wave_active {
            return;
        }

        let id = AgentId::new(self.next_agent_id);
        self.next_agent_id = self.next_agent_id.saturating_add(1);
        let steer_seed = self.next_steer_seed();
        let position = clamp_to_arena(position);

        self.agents.push(Agent::spawned(id, kind, position, steer_seed));
        self.spawned_in_wave = self.spawned_in_wave.saturating_add(1);
        out_events.push(Event::AgentSpawned {
            agent: id,
            kind,
            position,
        });
    }

    fn move_agent(&mut self, id: AgentId, to: GroundPoint, facing: f32) {
        if let Some(agent) = self.live_agent_mut(id) {
            agent.position = clamp_to_arena(to);
            agent.facing = facing;
        }
    }

    fn strike_defender(&mut self, id: AgentId, out_events: &mut Vec<Event>) {
        if self.defender.dead {
            return;
        }

        let defender_position = self.defender.position;
        let nearby = self.live_agents_within(defender_position, SWARM_RADIUS);

        let Some(agent) = self.live_agent_mut(id) else {
            return;
        };
        if !agent.strike_cooldown.is_zero() {
            return;
        }

        let stats = agent.kind.stats();
        if agent.position.distance_to(defender_position) > stats.attack_range {
            return;
        }

        agent.strike_cooldown = stats.attack_cooldown;
        agent.strike_display = STRIKE_DISPLAY_WINDOW;

        let scaled = scale_by_swarm(stats.melee_damage, nearby);
        self.defender.absorb(scaled, out_events);
    }

    fn hit_agent(&mut self, id: AgentId, damage: u32, out_events: &mut Vec<Event>) {
        let Some(agent) = self.live_agent_mut(id) else {
            return;
        };

        agent.health = agent.health.saturating_sub(damage);
        if agent.health.is_zero() {
            agent.fate = Fate::Dead {
                despawn_in: DESPAWN_WINDOW,
            };
            out_events.push(Event::AgentKilled {
                agent: agent.id,
                position: agent.position,
                score_value: agent.kind.stats().score_value,
            });
        }
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        self.agents.clear();
        self.next_agent_id = 0;
        self.steer_seed_state = STEER_SEED_STATE;
        self.defender.restore();
        self.wave = WaveNumber::new(0);
        self.wave_active = false;
        self.spawned_in_wave = 0;
        out_events.push(Event::EncounterReset);
    }

    fn live_agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents
            .iter_mut()
            .find(|agent| agent.id == id && agent.is_live())
    }

    fn live_agents_within(&self, point: GroundPoint, radius: f32) -> u32 {
        let mut count = 0;
        for agent in &self.agents {
            if agent.is_live() && agent.position.distance_to(point) <= radius {
                count += 1;
            }
        }
        count
    }

    fn next_steer_seed(&mut self) -> u64 {
        self.steer_seed_state = self
            .steer_seed_state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1);
        self.steer_seed_state
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.advance_time(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SetDefenderPosition { position } => {
            world.defender.position = clamp_to_arena(position);
        }
        Command::StartWave => {
            world.wave = world.wave.next();
            world.wave_active = true;
            world.spawned_in_wave = 0;
            out_events.push(Event::WaveStarted { wave: world.wave });
        }
        Command::CompleteWave => {
            if world.wave_active {
                world.wave_active = false;
                out_events.push(Event::WaveCompleted { wave: world.wave });
            }
        }
        Command::SpawnAgent { kind, position } => {
            world.spawn_agent(kind, position, out_events);
        }
        Command::MoveAgent { agent, to, facing } => {
            world.move_agent(agent, to, facing);
        }
        Command::StrikeDefender { agent } => {
            world.strike_defender(agent, out_events);
        }
        Command::HitAgent { agent, damage } => {
            world.hit_agent(agent, damage, out_events);
        }
        Command::ResetEncounter => {
            world.reset(out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use overrun_core::{
        AgentId, AgentSnapshot, AgentView, DefenderSnapshot, GroundPoint, WaveStatus,
    };

    use super::World;

    /// Captures a read-only view of every live agent, ordered by identifier.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        let snapshots: Vec<AgentSnapshot> = world
            .agents
            .iter()
            .filter(|agent| agent.is_live())
            .map(|agent| AgentSnapshot {
                id: agent.id,
                kind: agent.kind,
                position: agent.position,
                facing: agent.facing,
                health: agent.health,
                steer_seed: agent.steer_seed,
                ready_to_strike: agent.strike_cooldown.is_zero(),
                is_attacking: !agent.strike_display.is_zero(),
            })
            .collect();
        AgentView::from_snapshots(snapshots)
    }

    /// Captures the defender's current damage-model state.
    #[must_use]
    pub fn defender(world: &World) -> DefenderSnapshot {
        DefenderSnapshot {
            position: world.defender.position,
            health: world.defender.health,
            max_health: super::DEFENDER_MAX_HEALTH,
            is_dead: world.defender.dead,
            invincible_for: world.defender.invincible_for,
        }
    }

    /// Captures the wave bookkeeping used by the scheduling system.
    #[must_use]
    pub fn wave_status(world: &World) -> WaveStatus {
        WaveStatus {
            wave: world.wave,
            active: world.wave_active,
            spawned: world.spawned_in_wave,
        }
    }

    /// Enumerates live agents within `radius` of `point`, for melee sweeps.
    #[must_use]
    pub fn agents_within(world: &World, point: GroundPoint, radius: f32) -> Vec<AgentId> {
        world
            .agents
            .iter()
            .filter(|agent| agent.is_live() && agent.position.distance_to(point) <= radius)
            .map(|agent| agent.id)
            .collect()
    }

    /// Number of corpses still inside their despawn window.
    #[must_use]
    pub fn corpse_count(world: &World) -> usize {
        world
            .agents
            .iter()
            .filter(|agent| !agent.is_live())
            .count()
    }
}

#[derive(Clone, Debug)]
struct Agent {
    id: AgentId,
    kind: AgentKind,
    position: GroundPoint,
    facing: f32,
    health: Health,
    steer_seed: u64,
    strike_cooldown: Duration,
    strike_display: Duration,
    fate: Fate,
}

impl Agent {
    fn spawned(id: AgentId, kind: AgentKind, position: GroundPoint, steer_seed: u64) -> Self {
        Self {
            id,
            kind,
            position,
            facing: 0.0,
            health: kind.stats().max_health,
            steer_seed,
            strike_cooldown: Duration::ZERO,
            strike_display: Duration::ZERO,
            fate: Fate::Alive,
        }
    }

    fn is_live(&self) -> bool {
        matches!(self.fate, Fate::Alive)
    }
}

#[derive(Clone, Copy, Debug)]
enum Fate {
    Alive,
    Dead { despawn_in: Duration },
}

#[derive(Clone, Copy, Debug)]
struct Defender {
    position: GroundPoint,
    health: Health,
    invincible_for: Duration,
    dead: bool,
}

impl Defender {
    fn new() -> Self {
        Self {
            position: GroundPoint::new(0.0, 0.0),
            health: DEFENDER_MAX_HEALTH,
            invincible_for: Duration::ZERO,
            dead: false,
        }
    }

    fn restore(&mut self) {
        self.health = DEFENDER_MAX_HEALTH;
        self.invincible_for = Duration::ZERO;
        self.dead = false;
    }

    /// Runs one damage application through the cap and invincibility rules.
    fn absorb(&mut self, raw: u32, out_events: &mut Vec<Event>) {
        if self.dead || !self.invincible_for.is_zero() {
            return;
        }

        let amount = raw.min(DAMAGE_CAP);
        self.health = self.health.saturating_sub(amount);
        out_events.push(Event::DefenderDamaged {
            amount,
            health_fraction: self.health.get() as f32 / DEFENDER_MAX_HEALTH.get() as f32,
        });

        if self.health.is_zero() {
            self.dead = true;
            out_events.push(Event::GameOver);
        } else {
            self.invincible_for = INVINCIBILITY_WINDOW;
        }
    }
}

fn scale_by_swarm(base: u32, nearby: u32) -> u32 {
    let multiplier =
        (1.0 + SWARM_MULTIPLIER_STEP * nearby as f32).min(SWARM_MULTIPLIER_MAX);
    (base as f32 * multiplier).round() as u32
}

fn clamp_to_arena(position: GroundPoint) -> GroundPoint {
    GroundPoint::new(
        position.x().clamp(-ARENA_HALF_EXTENT, ARENA_HALF_EXTENT),
        position.z().clamp(-ARENA_HALF_EXTENT, ARENA_HALF_EXTENT),
    )
}
