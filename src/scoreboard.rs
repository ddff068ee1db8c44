//! Leaderboard of finished runs
//!
//! Kept sorted best-first and capped at ten entries. Only the JSON form is
//! handled here; where it is stored is up to the caller.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Maximum number of entries to keep
pub const MAX_ENTRIES: usize = 10;
/// Names are cut to this many characters
pub const MAX_NAME_LEN: usize = 12;

/// A single finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u64,
    /// Round reached
    pub round: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Scoreboard {
    pub entries: Vec<ScoreEntry>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Parse a stored board, re-sorting and trimming whatever was saved
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let mut board: Scoreboard = serde_json::from_str(json)?;
        board.normalize();
        Ok(board)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check if a score would make the board
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_ENTRIES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Record a run; returns the rank achieved (1-indexed) or None
    ///
    /// Ties keep the older entry ahead.
    pub fn submit(&mut self, name: &str, score: u64, round: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let name: String = name.trim().chars().take(MAX_NAME_LEN).collect();
        let entry = ScoreEntry { name, score, round };

        let pos = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(MAX_ENTRIES);

        log::info!("Scoreboard: {} takes rank {}", score, pos + 1);
        Some(pos + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    fn normalize(&mut self) {
        // Stable sort keeps saved order among ties
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_ENTRIES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_ranks_descending() {
        let mut board = Scoreboard::new();
        assert_eq!(board.submit("ann", 500, 2), Some(1));
        assert_eq!(board.submit("bob", 900, 3), Some(1));
        assert_eq!(board.submit("cat", 700, 2), Some(2));

        let scores: Vec<_> = board.entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![900, 700, 500]);
        assert_eq!(board.top_score(), Some(900));
    }

    #[test]
    fn test_capped_at_ten() {
        let mut board = Scoreboard::new();
        for i in 1..=12u64 {
            board.submit("p", i * 100, 1);
        }
        assert_eq!(board.entries.len(), MAX_ENTRIES);
        assert_eq!(board.entries.last().unwrap().score, 300);
        assert!(!board.qualifies(300));
        assert!(board.qualifies(301));
        assert_eq!(board.submit("late", 50, 1), None);
    }

    #[test]
    fn test_zero_never_qualifies() {
        let board = Scoreboard::new();
        assert!(!board.qualifies(0));
    }

    #[test]
    fn test_tie_goes_behind_existing() {
        let mut board = Scoreboard::new();
        board.submit("first", 400, 1);
        assert_eq!(board.submit("second", 400, 1), Some(2));
        assert_eq!(board.entries[0].name, "first");
    }

    #[test]
    fn test_long_names_are_cut() {
        let mut board = Scoreboard::new();
        board.submit("  a-very-long-player-name  ", 10, 1);
        assert_eq!(board.entries[0].name.chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn test_loaded_board_is_sorted_and_trimmed() {
        let entries: Vec<_> = (0..15)
            .map(|i| format!(r#"{{ "name": "p{i}", "score": {}, "round": 1 }}"#, i * 10))
            .collect();
        let json = format!(r#"{{ "entries": [{}] }}"#, entries.join(","));

        let board = Scoreboard::from_json(&json).unwrap();
        assert_eq!(board.entries.len(), MAX_ENTRIES);
        assert_eq!(board.top_score(), Some(140));

        let again = Scoreboard::from_json(&board.to_json().unwrap()).unwrap();
        assert_eq!(again, board);
    }
}
