#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure scoring system that folds kill and wave events into a tally.

use overrun_core::{Event, ScoreReport};

/// Scoring system consumed by the external UI and leaderboard layers.
#[derive(Debug, Default)]
pub struct Scoring {
    report: ScoreReport,
}

impl Scoring {
    /// Creates a new scoring system with a zeroed tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds the provided events into the running tally.
    ///
    /// Each event batch must be presented exactly once; the system keeps no
    /// record of what it has already seen.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::AgentKilled { score_value, .. } => {
                    self.report.score = self.report.score.saturating_add(*score_value);
                    self.report.kills = self.report.kills.saturating_add(1);
                }
                Event::WaveCompleted { wave } => {
                    if *wave > self.report.highest_wave_cleared {
                        self.report.highest_wave_cleared = *wave;
                    }
                }
                Event::EncounterReset => {
                    self.report = ScoreReport::default();
                }
                _ => {}
            }
        }
    }

    /// Returns the current tally.
    #[must_use]
    pub const fn report(&self) -> ScoreReport {
        self.report
    }
}
