//! Round progression, saucer cadence and score

use serde::{Deserialize, Serialize};

use super::saucer::SaucerSize;
use crate::consts::{BONUS_LIFE_INTERVAL, ROUND_START_DELAY};

/// Large asteroids per round, indexed by round - 1; the last entry repeats
pub const WAVE_TABLE: [usize; 5] = [4, 6, 8, 10, 11];

/// Saucers never appear before this round
pub const SAUCER_MIN_ROUND: u32 = 3;
/// Saucer wait is `BASE + asteroids * PER_ASTEROID` seconds
pub const SAUCER_BASE_INTERVAL: f32 = 10.0;
pub const SAUCER_INTERVAL_PER_ASTEROID: f32 = 0.75;
/// Small (accurate) saucers from this score or round on
pub const SMALL_SAUCER_SCORE: u64 = 10_000;
pub const SMALL_SAUCER_ROUND: u32 = 8;

/// Large asteroids spawned at the start of `round` (1-based)
pub fn wave_size(round: u32) -> usize {
    let index = (round.max(1) - 1) as usize;
    WAVE_TABLE[index.min(WAVE_TABLE.len() - 1)]
}

/// Seconds to wait before a saucer given the current field
pub fn saucer_interval(asteroids: usize) -> f32 {
    SAUCER_BASE_INTERVAL + asteroids as f32 * SAUCER_INTERVAL_PER_ASTEROID
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundScheduler {
    round: u32,
    score: u64,
    /// Countdown to the next round, running while the field is empty
    round_start_timer: Option<f32>,
    /// Seconds since the last saucer check reset
    saucer_timer: f32,
}

impl RoundScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// The between-rounds countdown is running
    pub fn is_round_starting(&self) -> bool {
        self.round_start_timer.is_some()
    }

    pub fn saucer_timer(&self) -> f32 {
        self.saucer_timer
    }

    /// Advance to the next round; returns how many large asteroids to spawn
    pub fn new_round(&mut self) -> usize {
        self.round += 1;
        self.saucer_timer = 0.0;
        self.round_start_timer = None;
        let count = wave_size(self.round);
        log::info!("Round {} begins with {} asteroids", self.round, count);
        count
    }

    /// Run the between-rounds countdown; true when a new round should start
    ///
    /// The countdown arms when the field empties and is cancelled if
    /// asteroids reappear before it expires.
    pub fn round_start_update(&mut self, dt: f32, asteroids: usize) -> bool {
        if asteroids > 0 {
            self.round_start_timer = None;
            return false;
        }
        let timer = self.round_start_timer.get_or_insert(ROUND_START_DELAY);
        *timer -= dt;
        if *timer > 0.0 {
            return false;
        }
        self.round_start_timer = None;
        true
    }

    /// Advance the saucer clock; returns the class to spawn when one is due
    pub fn saucer_update(&mut self, dt: f32, asteroids: usize, saucer_alive: bool) -> Option<SaucerSize> {
        if asteroids == 0 {
            self.saucer_timer = 0.0;
            return None;
        }
        if self.round < SAUCER_MIN_ROUND {
            return None;
        }

        self.saucer_timer += dt;
        if self.saucer_timer < saucer_interval(asteroids) || saucer_alive {
            return None;
        }

        self.saucer_timer = 0.0;
        let size = if self.score >= SMALL_SAUCER_SCORE || self.round >= SMALL_SAUCER_ROUND {
            SaucerSize::Small
        } else {
            SaucerSize::Large
        };
        log::info!("Saucer due ({size:?}) in round {}", self.round);
        Some(size)
    }

    /// Add points; returns the number of bonus lives earned
    ///
    /// One life per multiple of `BONUS_LIFE_INTERVAL` crossed, so a single
    /// large award can grant more than one.
    pub fn add_score(&mut self, delta: u64) -> u32 {
        let before = self.score / BONUS_LIFE_INTERVAL;
        self.score = self.score.saturating_add(delta);
        let after = self.score / BONUS_LIFE_INTERVAL;
        let granted = (after - before) as u32;
        if granted > 0 {
            log::info!("Bonus life x{} at score {}", granted, self.score);
        }
        granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wave_table_plateaus() {
        assert_eq!(wave_size(1), 4);
        assert_eq!(wave_size(5), 11);
        assert_eq!(wave_size(6), wave_size(5));
        assert_eq!(wave_size(40), wave_size(5));
        // Round 0 is treated as the first round
        assert_eq!(wave_size(0), 4);
    }

    #[test]
    fn test_new_round_increments_and_resets_saucer_clock() {
        let mut rounds = RoundScheduler::new();
        rounds.round = SAUCER_MIN_ROUND;
        rounds.saucer_update(3.0, 5, false);
        assert!(rounds.saucer_timer() > 0.0);

        let count = rounds.new_round();
        assert_eq!(rounds.round(), SAUCER_MIN_ROUND + 1);
        assert_eq!(count, wave_size(SAUCER_MIN_ROUND + 1));
        assert_eq!(rounds.saucer_timer(), 0.0);
    }

    #[test]
    fn test_round_start_waits_for_delay() {
        let mut rounds = RoundScheduler::new();
        assert!(!rounds.round_start_update(1.0, 0));
        assert!(rounds.is_round_starting());
        assert!(!rounds.round_start_update(2.0, 0));
        assert!(rounds.round_start_update(1.5, 0));
        assert!(!rounds.is_round_starting());
    }

    #[test]
    fn test_round_start_cancelled_by_asteroids() {
        let mut rounds = RoundScheduler::new();
        rounds.round_start_update(3.0, 0);
        assert!(!rounds.round_start_update(0.1, 2));
        assert!(!rounds.is_round_starting());
        // Countdown restarts from the full delay
        assert!(!rounds.round_start_update(3.0, 0));
    }

    #[test]
    fn test_no_saucer_before_min_round() {
        let mut rounds = RoundScheduler::new();
        rounds.new_round();
        assert_eq!(rounds.saucer_update(1000.0, 4, false), None);
    }

    #[test]
    fn test_saucer_timer_resets_on_empty_field() {
        let mut rounds = RoundScheduler::new();
        rounds.round = SAUCER_MIN_ROUND;
        rounds.saucer_update(5.0, 4, false);
        assert_eq!(rounds.saucer_update(1.0, 0, false), None);
        assert_eq!(rounds.saucer_timer(), 0.0);
    }

    #[test]
    fn test_denser_field_waits_longer() {
        assert!(saucer_interval(20) > saucer_interval(2));

        let mut rounds = RoundScheduler::new();
        rounds.round = SAUCER_MIN_ROUND;
        let due = saucer_interval(4);
        assert_eq!(rounds.saucer_update(due - 0.5, 4, false), None);
        assert_eq!(rounds.saucer_update(1.0, 4, false), Some(SaucerSize::Large));
        assert_eq!(rounds.saucer_timer(), 0.0);
    }

    #[test]
    fn test_live_saucer_blocks_spawn() {
        let mut rounds = RoundScheduler::new();
        rounds.round = SAUCER_MIN_ROUND;
        assert_eq!(rounds.saucer_update(100.0, 4, true), None);
        assert_eq!(rounds.saucer_update(0.0, 4, false), Some(SaucerSize::Large));
    }

    #[test]
    fn test_small_saucer_thresholds() {
        let mut rounds = RoundScheduler::new();
        rounds.round = SMALL_SAUCER_ROUND;
        assert_eq!(rounds.saucer_update(100.0, 1, false), Some(SaucerSize::Small));

        let mut rounds = RoundScheduler::new();
        rounds.round = SAUCER_MIN_ROUND;
        rounds.add_score(SMALL_SAUCER_SCORE);
        assert_eq!(rounds.saucer_update(100.0, 1, false), Some(SaucerSize::Small));
    }

    #[test]
    fn test_bonus_life_per_crossed_multiple() {
        let mut rounds = RoundScheduler::new();
        assert_eq!(rounds.add_score(9_980), 0);
        assert_eq!(rounds.add_score(20), 1);
        assert_eq!(rounds.add_score(50), 0);
        // One award crossing two thresholds grants two lives
        assert_eq!(rounds.add_score(20_000), 2);
        assert_eq!(rounds.score(), 30_050);
    }
}
