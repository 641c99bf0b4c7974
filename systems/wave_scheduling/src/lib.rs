#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduling system.
//!
//! Computes per-wave composition, drives the spawn cadence, detects wave
//! completion, and arms the inter-wave intermission. All randomness flows
//! from labeled streams derived with SHA-256 from the global seed and the
//! wave number, so identical seeds replay identical encounters.

use std::time::Duration;

use overrun_core::{
    AgentKind, AgentView, Command, DefenderSnapshot, Event, GroundPoint, KindMix, WaveConfig,
    WaveNumber, WaveStatus, RNG_STREAM_KIND, RNG_STREAM_RING,
};
use sha2::{Digest, Sha256};

const TWO_PI: f64 = std::f64::consts::PI * 2.0;

const BASE_SPAWN_COUNT: u32 = 5;
const SPAWN_COUNT_PER_WAVE: u32 = 2;
const BASE_SPAWN_RATE: f32 = 1.0;
const SPAWN_RATE_PER_WAVE: f32 = 0.2;
/// Ceiling on the spawn rate regardless of wave number.
const SPAWN_RATE_CAP: f32 = 3.0;

/// Inner edge of the spawn ring around the defender.
const SPAWN_RING_MIN: f32 = 20.0;
/// Outer edge of the spawn ring around the defender.
const SPAWN_RING_MAX: f32 = 35.0;

/// Pause between a cleared wave and the next one starting.
const INTERMISSION: Duration = Duration::from_secs(4);

/// Computes the deterministic configuration for the provided wave number.
///
/// The agent count grows linearly, the spawn rate grows linearly until it
/// reaches [`SPAWN_RATE_CAP`], and the kind mix steps through fixed tiers
/// that introduce runners and tanks as waves progress.
#[must_use]
pub fn config_for_wave(wave: WaveNumber) -> WaveConfig {
    let number = wave.get();
    let total_spawns = BASE_SPAWN_COUNT + SPAWN_COUNT_PER_WAVE * number;
    let rate = (BASE_SPAWN_RATE + SPAWN_RATE_PER_WAVE * number as f32).min(SPAWN_RATE_CAP);
    let spawn_interval = Duration::from_secs_f32(1.0 / rate);

    let mix = match number {
        0..=2 => KindMix::new(1.0, 0.0, 0.0),
        3..=4 => KindMix::new(0.8, 0.2, 0.0),
        5..=7 => KindMix::new(0.6, 0.3, 0.1),
        _ => KindMix::new(0.5, 0.3, 0.2),
    };

    WaveConfig::new(total_spawns, spawn_interval, mix)
}

/// Configuration parameters required to construct the scheduling system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    global_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided global seed.
    #[must_use]
    pub const fn new(global_seed: u64) -> Self {
        Self { global_seed }
    }
}

/// Pure system that deterministically emits spawn and wave-lifecycle commands.
#[derive(Debug)]
pub struct WaveScheduling {
    global_seed: u64,
    active: Option<ActiveWave>,
    intermission: Option<Duration>,
    completion_sent: bool,
}

impl WaveScheduling {
    /// Creates a new scheduling system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            global_seed: config.global_seed,
            active: None,
            intermission: None,
            completion_sent: false,
        }
    }

    /// Consumes events and the defender snapshot to emit spawn commands and
    /// drive the inter-wave intermission.
    ///
    /// Spawn commands emitted here precede the tick's agent updates; the
    /// caller applies them before running the steering systems.
    pub fn handle(
        &mut self,
        events: &[Event],
        defender: &DefenderSnapshot,
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    elapsed = elapsed.saturating_add(*dt);
                }
                Event::WaveStarted { wave } => self.begin_wave(*wave),
                Event::WaveCompleted { .. } => {
                    self.active = None;
                    self.intermission = Some(INTERMISSION);
                }
                Event::EncounterReset => {
                    self.active = None;
                    self.intermission = None;
                    self.completion_sent = false;
                }
                _ => {}
            }
        }

        if elapsed.is_zero() {
            return;
        }

        if let Some(active) = &mut self.active {
            active.accumulator = active.accumulator.saturating_add(elapsed);
            let interval = active.config.spawn_interval();
            while active.accumulator >= interval && active.spawned < active.config.total_spawns()
            {
                active.accumulator -= interval;
                let kind = select_kind(active.config.mix(), &mut active.kind_rng);
                let position = sample_ring_position(defender.position, &mut active.ring_rng);
                out.push(Command::SpawnAgent { kind, position });
                active.spawned += 1;
            }
        }

        if let Some(remaining) = &mut self.intermission {
            *remaining = remaining.saturating_sub(elapsed);
            if remaining.is_zero() {
                self.intermission = None;
                if !defender.is_dead {
                    out.push(Command::StartWave);
                }
            }
        }
    }

    /// Emits `Command::CompleteWave` once the active wave has spawned its
    /// full complement and the live set is empty.
    ///
    /// Invoked after the tick's agent updates so completion observes the
    /// final live count.
    pub fn detect_completion(
        &mut self,
        agents: &AgentView,
        status: &WaveStatus,
        out: &mut Vec<Command>,
    ) {
        let Some(active) = &self.active else {
            return;
        };
        if !status.active || self.completion_sent {
            return;
        }

        if active.spawned >= active.config.total_spawns() && agents.is_empty() {
            out.push(Command::CompleteWave);
            self.completion_sent = true;
        }
    }

    fn begin_wave(&mut self, wave: WaveNumber) {
        let base_seed = derive_wave_seed(self.global_seed, wave);
        self.active = Some(ActiveWave {
            config: config_for_wave(wave),
            spawned: 0,
            accumulator: Duration::ZERO,
            kind_rng: SplitMix64::new(derive_labeled_seed(base_seed, RNG_STREAM_KIND)),
            ring_rng: SplitMix64::new(derive_labeled_seed(base_seed, RNG_STREAM_RING)),
        });
        self.intermission = None;
        self.completion_sent = false;
    }
}

#[derive(Debug)]
struct ActiveWave {
    config: WaveConfig,
    spawned: u32,
    accumulator: Duration,
    kind_rng: SplitMix64,
    ring_rng: SplitMix64,
}

fn select_kind(mix: KindMix, rng: &mut SplitMix64) -> AgentKind {
    let roll = rng.next_unit();
    if roll < f64::from(mix.walker()) {
        AgentKind::Walker
    } else if roll < f64::from(mix.walker() + mix.runner()) {
        AgentKind::Runner
    } else {
        AgentKind::Tank
    }
}

fn sample_ring_position(center: GroundPoint, rng: &mut SplitMix64) -> GroundPoint {
    let angle = rng.next_unit() * TWO_PI;
    let radius = SPAWN_RING_MIN + rng.next_unit() as f32 * (SPAWN_RING_MAX - SPAWN_RING_MIN);
    GroundPoint::new(
        center.x() + radius * angle.cos() as f32,
        center.z() + radius * angle.sin() as f32,
    )
}

fn derive_wave_seed(global_seed: u64, wave: WaveNumber) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(wave.get().to_le_bytes());
    finalize_seed(hasher)
}

fn derive_labeled_seed(base: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
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

#[cfg(test)]
mod tests {
    use super::*;
    use overrun_core::Health;

    fn alive_defender() -> DefenderSnapshot {
        DefenderSnapshot {
            position: GroundPoint::new(0.0, 0.0),
            health: Health::new(100),
            max_health: Health::new(100),
            is_dead: false,
            invincible_for: Duration::ZERO,
        }
    }

    fn dead_defender() -> DefenderSnapshot {
        DefenderSnapshot {
            is_dead: true,
            health: Health::new(0),
            ..alive_defender()
        }
    }

    fn time_advanced(millis: u64) -> Event {
        Event::TimeAdvanced {
            dt: Duration::from_millis(millis),
        }
    }

    #[test]
    fn mix_sums_to_one_and_rate_stays_capped() {
        for number in 1..=40 {
            let config = config_for_wave(WaveNumber::new(number));
            assert!(
                (config.mix().sum() - 1.0).abs() < 1e-6,
                "wave {number} mix must sum to one"
            );
            let rate = 1.0 / config.spawn_interval().as_secs_f32();
            assert!(
                rate <= SPAWN_RATE_CAP + 1e-3,
                "wave {number} rate {rate} exceeds the cap"
            );
        }
    }

    #[test]
    fn wave_one_matches_expected_cadence() {
        let config = config_for_wave(WaveNumber::new(1));
        assert_eq!(config.total_spawns(), 7);
        let interval_ms = config.spawn_interval().as_millis();
        assert!(
            (832..=834).contains(&interval_ms),
            "expected ~833ms, got {interval_ms}ms"
        );
    }

    #[test]
    fn early_waves_spawn_only_walkers() {
        let mut system = WaveScheduling::new(Config::new(0xfeed));
        let mut commands = Vec::new();
        system.handle(
            &[Event::WaveStarted {
                wave: WaveNumber::new(1),
            }],
            &alive_defender(),
            &mut commands,
        );
        system.handle(&[time_advanced(60_000)], &alive_defender(), &mut commands);

        assert_eq!(commands.len(), 7);
        for command in &commands {
            match command {
                Command::SpawnAgent { kind, .. } => assert_eq!(*kind, AgentKind::Walker),
                other => panic!("unexpected command: {other:?}"),
            }
        }
    }

    #[test]
    fn cadence_halts_after_the_full_complement() {
        let mut system = WaveScheduling::new(Config::new(1));
        let mut commands = Vec::new();
        system.handle(
            &[Event::WaveStarted {
                wave: WaveNumber::new(1),
            }],
            &alive_defender(),
            &mut commands,
        );

        system.handle(&[time_advanced(10_000)], &alive_defender(), &mut commands);
        assert_eq!(commands.len(), 7);

        system.handle(&[time_advanced(10_000)], &alive_defender(), &mut commands);
        assert_eq!(commands.len(), 7, "cadence must halt at the wave total");
    }

    #[test]
    fn spawn_positions_stay_on_the_ring() {
        let mut system = WaveScheduling::new(Config::new(0xabcd_ef01));
        let mut commands = Vec::new();
        let defender = alive_defender();
        system.handle(
            &[Event::WaveStarted {
                wave: WaveNumber::new(9),
            }],
            &defender,
            &mut commands,
        );
        system.handle(&[time_advanced(120_000)], &defender, &mut commands);

        assert!(!commands.is_empty());
        for command in &commands {
            if let Command::SpawnAgent { position, .. } = command {
                let distance = defender.position.distance_to(*position);
                assert!(
                    (SPAWN_RING_MIN..=SPAWN_RING_MAX).contains(&distance),
                    "spawn distance {distance} outside the ring"
                );
            }
        }
    }

    #[test]
    fn identical_seeds_replay_identical_spawns() {
        let run = |seed: u64| {
            let mut system = WaveScheduling::new(Config::new(seed));
            let mut commands = Vec::new();
            system.handle(
                &[Event::WaveStarted {
                    wave: WaveNumber::new(8),
                }],
                &alive_defender(),
                &mut commands,
            );
            for _ in 0..60 {
                system.handle(&[time_advanced(500)], &alive_defender(), &mut commands);
            }
            commands
        };

        assert_eq!(run(42), run(42));
        assert_ne!(run(42), run(43), "different seeds should diverge");
    }

    #[test]
    fn restarting_a_wave_cancels_the_previous_cadence() {
        let mut system = WaveScheduling::new(Config::new(7));
        let mut commands = Vec::new();
        system.handle(
            &[Event::WaveStarted {
                wave: WaveNumber::new(1),
            }],
            &alive_defender(),
            &mut commands,
        );
        system.handle(&[time_advanced(2_000)], &alive_defender(), &mut commands);
        let spawned_before = commands.len();
        assert!(spawned_before > 0);

        commands.clear();
        system.handle(
            &[Event::WaveStarted {
                wave: WaveNumber::new(2),
            }],
            &alive_defender(),
            &mut commands,
        );
        system.handle(&[time_advanced(60_000)], &alive_defender(), &mut commands);

        let total = config_for_wave(WaveNumber::new(2)).total_spawns() as usize;
        assert_eq!(commands.len(), total, "only the restarted wave spawns");
    }

    #[test]
    fn intermission_starts_the_next_wave() {
        let mut system = WaveScheduling::new(Config::new(3));
        let mut commands = Vec::new();
        system.handle(
            &[Event::WaveCompleted {
                wave: WaveNumber::new(1),
            }],
            &alive_defender(),
            &mut commands,
        );
        system.handle(&[time_advanced(3_999)], &alive_defender(), &mut commands);
        assert!(commands.is_empty(), "intermission still pending");

        system.handle(&[time_advanced(1)], &alive_defender(), &mut commands);
        assert_eq!(commands, vec![Command::StartWave]);
    }

    #[test]
    fn defender_death_suppresses_the_next_wave() {
        let mut system = WaveScheduling::new(Config::new(3));
        let mut commands = Vec::new();
        system.handle(
            &[Event::WaveCompleted {
                wave: WaveNumber::new(1),
            }],
            &alive_defender(),
            &mut commands,
        );
        system.handle(&[time_advanced(10_000)], &dead_defender(), &mut commands);
        assert!(commands.is_empty());

        system.handle(&[time_advanced(10_000)], &alive_defender(), &mut commands);
        assert!(commands.is_empty(), "suppression is permanent");
    }

    #[test]
    fn reset_drops_all_cadence_state() {
        let mut system = WaveScheduling::new(Config::new(11));
        let mut commands = Vec::new();
        system.handle(
            &[Event::WaveStarted {
                wave: WaveNumber::new(1),
            }],
            &alive_defender(),
            &mut commands,
        );
        system.handle(
            &[Event::EncounterReset, time_advanced(60_000)],
            &alive_defender(),
            &mut commands,
        );
        assert!(commands.is_empty(), "no spawns survive a reset");
    }

    #[test]
    fn completion_requires_full_spawn_and_empty_live_set() {
        let mut system = WaveScheduling::new(Config::new(5));
        let mut commands = Vec::new();
        system.handle(
            &[Event::WaveStarted {
                wave: WaveNumber::new(1),
            }],
            &alive_defender(),
            &mut commands,
        );

        let status = WaveStatus {
            wave: WaveNumber::new(1),
            active: true,
            spawned: 0,
        };
        let empty = AgentView::default();

        let mut out = Vec::new();
        system.detect_completion(&empty, &status, &mut out);
        assert!(out.is_empty(), "nothing spawned yet");

        system.handle(&[time_advanced(60_000)], &alive_defender(), &mut commands);
        system.detect_completion(&empty, &status, &mut out);
        assert_eq!(out, vec![Command::CompleteWave]);

        out.clear();
        system.detect_completion(&empty, &status, &mut out);
        assert!(out.is_empty(), "completion is emitted once per wave");
    }
}
