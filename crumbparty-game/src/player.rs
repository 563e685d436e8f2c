//! Player resources, board position and the session roster.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fewest players a session can be configured with.
pub const MIN_PLAYERS: usize = 2;
/// Most players a session can be configured with.
pub const MAX_PLAYERS: usize = 6;
/// Tile every player starts on.
pub const START_TILE: usize = 0;

/// One-based player identifier in `1..=MAX_PLAYERS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(u8);

impl PlayerId {
    /// Build an id, rejecting values outside `1..=MAX_PLAYERS`.
    #[must_use]
    pub fn new(value: u8) -> Option<Self> {
        (1..=MAX_PLAYERS).contains(&usize::from(value)).then_some(Self(value))
    }

    /// Id for the player at a zero-based roster slot.
    #[must_use]
    pub fn from_slot(slot: usize) -> Option<Self> {
        u8::try_from(slot + 1).ok().and_then(Self::new)
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Zero-based roster slot for this id.
    #[must_use]
    pub const fn slot(self) -> usize {
        self.0 as usize - 1
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// A participant in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub fruit: u32,
    pub crumbs: u32,
    pub wins: u32,
    pub current_tile: usize,
    /// Tile the player arrived from; `None` while still on the start tile.
    pub previous_tile: Option<usize>,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            fruit: 0,
            crumbs: 0,
            wins: 0,
            current_tile: START_TILE,
            previous_tile: None,
        }
    }

    pub fn add_crumbs(&mut self, amount: u32) {
        self.crumbs = self.crumbs.saturating_add(amount);
    }

    /// Remove crumbs, stopping at zero.
    pub fn remove_crumbs(&mut self, amount: u32) {
        self.crumbs = self.crumbs.saturating_sub(amount);
    }

    pub fn add_fruit(&mut self, amount: u32) {
        self.fruit = self.fruit.saturating_add(amount);
    }

    /// Remove fruit, stopping at zero.
    pub fn remove_fruit(&mut self, amount: u32) {
        self.fruit = self.fruit.saturating_sub(amount);
    }

    pub fn add_win(&mut self) {
        self.wins = self.wins.saturating_add(1);
    }

    /// Remove wins, stopping at zero.
    pub fn remove_wins(&mut self, amount: u32) {
        self.wins = self.wins.saturating_sub(amount);
    }

    /// Zero every counter and return to the start tile.
    pub fn reset(&mut self) {
        self.fruit = 0;
        self.crumbs = 0;
        self.wins = 0;
        self.current_tile = START_TILE;
        self.previous_tile = None;
    }
}

/// Session-scoped list of players, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    /// Build a roster of `count` players, naming them from `names` and
    /// falling back to "Player N". Counts above `MAX_PLAYERS` are truncated.
    #[must_use]
    pub fn with_names(count: usize, names: &[String]) -> Self {
        let players = (0..count.min(MAX_PLAYERS))
            .filter_map(|slot| {
                let id = PlayerId::from_slot(slot)?;
                let name = names
                    .get(slot)
                    .map(|n| n.trim())
                    .filter(|n| !n.is_empty())
                    .map_or_else(|| default_name(id), str::to_string);
                Some(Player::new(id, name))
            })
            .collect();
        Self { players }
    }

    /// Roster with default names.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self::with_names(count, &[])
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.slot()).filter(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id.slot()).filter(|p| p.id == id)
    }

    /// Display name for an optional id, "Unknown" when absent.
    #[must_use]
    pub fn name_or_unknown(&self, id: Option<PlayerId>) -> String {
        id.and_then(|id| self.player(id))
            .map_or_else(|| UNKNOWN_PLAYER.to_string(), |p| p.name.clone())
    }

    /// Reset every player for a fresh session.
    pub fn reset(&mut self) {
        for player in &mut self.players {
            player.reset();
        }
    }
}

/// Placeholder used wherever a placement entry is missing.
pub const UNKNOWN_PLAYER: &str = "Unknown";

fn default_name(id: PlayerId) -> String {
    format!("Player {}", id.get())
}
