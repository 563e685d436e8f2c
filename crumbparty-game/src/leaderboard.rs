//! Per-minigame score records and the leaderboard data shape.
//!
//! Where the leaderboard is stored is up to the platform; this module only
//! owns ordering and capping.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Default number of entries kept per minigame.
pub const DEFAULT_CAPACITY: usize = 10;

/// Which direction of score is an improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreOrder {
    /// Times and other costs.
    LowerIsBetter,
    /// Counts and survival.
    HigherIsBetter,
}

impl ScoreOrder {
    /// Ordering that sorts the better score first.
    #[must_use]
    pub fn rank(self, a: u32, b: u32) -> Ordering {
        match self {
            Self::LowerIsBetter => a.cmp(&b),
            Self::HigherIsBetter => b.cmp(&a),
        }
    }
}

/// A single score produced when a minigame completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub minigame: String,
    pub player: String,
    pub score: u32,
    pub order: ScoreOrder,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player: String,
    pub score: u32,
}

/// Best scores for one minigame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub order: ScoreOrder,
    #[serde(default)]
    pub entries: Vec<LeaderboardEntry>,
}

/// Best scores keyed by minigame name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    #[serde(default = "Leaderboard::default_capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub tables: BTreeMap<String, Table>,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Leaderboard {
    #[must_use]
    pub const fn default_capacity() -> usize {
        DEFAULT_CAPACITY
    }

    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            tables: BTreeMap::new(),
        }
    }

    /// Insert a record, keeping the table sorted best-first and capped.
    ///
    /// Returns the 0-based rank the record landed at, or `None` when it did
    /// not make the cut. Equal scores keep their arrival order.
    pub fn submit(&mut self, record: &ScoreRecord) -> Option<usize> {
        let table = self
            .tables
            .entry(record.minigame.clone())
            .or_insert_with(|| Table {
                order: record.order,
                entries: Vec::new(),
            });
        let order = table.order;
        let rank = table
            .entries
            .iter()
            .position(|e| order.rank(record.score, e.score) == Ordering::Less)
            .unwrap_or(table.entries.len());
        if rank >= self.capacity {
            return None;
        }
        table.entries.insert(
            rank,
            LeaderboardEntry {
                player: record.player.clone(),
                score: record.score,
            },
        );
        table.entries.truncate(self.capacity);
        Some(rank)
    }

    /// Best `n` entries for a minigame.
    #[must_use]
    pub fn top(&self, minigame: &str, n: usize) -> &[LeaderboardEntry] {
        self.tables
            .get(minigame)
            .map_or(&[][..], |t| &t.entries[..n.min(t.entries.len())])
    }

    /// Parse a stored leaderboard.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON is malformed.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
