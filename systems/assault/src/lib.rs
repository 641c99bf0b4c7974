#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that queues melee strike commands for ready agents.

use overrun_core::{AgentView, Command, DefenderSnapshot};

/// Assault system that emits strike commands for agents in reach.
#[derive(Debug, Default)]
pub struct Assault {
    scratch: Vec<Command>,
}

impl Assault {
    /// Creates a new assault system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::StrikeDefender` entries for agents whose cooldown has
    /// elapsed and whose target sits within attack range.
    ///
    /// Striking never blocks movement; the same agent may be repositioned by
    /// the steering system on the next tick.
    pub fn handle(&mut self, agents: &AgentView, defender: &DefenderSnapshot, out: &mut Vec<Command>) {
        if defender.is_dead || agents.is_empty() {
            return;
        }

        self.scratch.clear();

        for snapshot in agents.iter() {
            if !snapshot.ready_to_strike {
                continue;
            }

            let reach = snapshot.kind.stats().attack_range;
            if snapshot.position.distance_to(defender.position) <= reach {
                self.scratch.push(Command::StrikeDefender { agent: snapshot.id });
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overrun_core::{AgentId, AgentKind, AgentSnapshot, GroundPoint, Health};
    use std::time::Duration;

    fn snapshot(id: u32, kind: AgentKind, x: f32, z: f32, ready: bool) -> AgentSnapshot {
        AgentSnapshot {
            id: AgentId::new(id),
            kind,
            position: GroundPoint::new(x, z),
            facing: 0.0,
            health: kind.stats().max_health,
            steer_seed: 0,
            ready_to_strike: ready,
            is_attacking: false,
        }
    }

    fn defender() -> DefenderSnapshot {
        DefenderSnapshot {
            position: GroundPoint::new(0.0, 0.0),
            health: Health::new(100),
            max_health: Health::new(100),
            is_dead: false,
            invincible_for: Duration::ZERO,
        }
    }

    #[test]
    fn ready_agents_in_reach_strike() {
        let mut system = Assault::new();
        let agents = AgentView::from_snapshots(vec![
            snapshot(1, AgentKind::Walker, 1.0, 0.0, true),
            snapshot(2, AgentKind::Tank, 0.0, 2.0, true),
        ]);
        let mut out = Vec::new();
        system.handle(&agents, &defender(), &mut out);

        assert_eq!(
            out,
            vec![
                Command::StrikeDefender {
                    agent: AgentId::new(1)
                },
                Command::StrikeDefender {
                    agent: AgentId::new(2)
                },
            ]
        );
    }

    #[test]
    fn cooling_down_agents_are_skipped() {
        let mut system = Assault::new();
        let agents = AgentView::from_snapshots(vec![
            snapshot(1, AgentKind::Walker, 1.0, 0.0, false),
            snapshot(2, AgentKind::Walker, 0.5, 0.5, true),
        ]);
        let mut out = Vec::new();
        system.handle(&agents, &defender(), &mut out);

        assert_eq!(
            out,
            vec![Command::StrikeDefender {
                agent: AgentId::new(2)
            }]
        );
    }

    #[test]
    fn out_of_reach_agents_are_skipped() {
        let mut system = Assault::new();
        let agents =
            AgentView::from_snapshots(vec![snapshot(1, AgentKind::Runner, 10.0, 0.0, true)]);
        let mut out = Vec::new();
        system.handle(&agents, &defender(), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn dead_defender_is_left_alone() {
        let mut system = Assault::new();
        let agents = AgentView::from_snapshots(vec![snapshot(1, AgentKind::Walker, 1.0, 0.0, true)]);
        let mut dead = defender();
        dead.is_dead = true;
        dead.health = Health::new(0);

        let mut out = Vec::new();
        system.handle(&agents, &dead, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn reach_respects_kind_specific_range() {
        let mut system = Assault::new();
        // 2.0 units out: within a tank's 2.2 reach, beyond a walker's 1.8.
        let agents = AgentView::from_snapshots(vec![
            snapshot(1, AgentKind::Walker, 2.0, 0.0, true),
            snapshot(2, AgentKind::Tank, 0.0, 2.0, true),
        ]);
        let mut out = Vec::new();
        system.handle(&agents, &defender(), &mut out);

        assert_eq!(
            out,
            vec![Command::StrikeDefender {
                agent: AgentId::new(2)
            }]
        );
    }
}
