//! Board topology: tiles, adjacency, junctions and movement resolution.
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::VecDeque;
use thiserror::Error;

use crate::player::Player;

pub mod layouts;
pub use layouts::{BoardSpec, ColorMap, TileSpec};

/// Neighbor lists stay inline for ordinary tiles and junctions.
pub type Neighbors = SmallVec<[usize; 4]>;

/// What landing on a tile triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    Shop,
    Minigame,
    Regular,
}

/// Authoring color used by board files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileColor {
    Green,
    Red,
    Blue,
}

/// Immutable tile; its index is its position in the board's tile list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardTile {
    /// Normalized horizontal position in `[0, 1]`.
    pub x: f32,
    /// Normalized vertical position in `[0, 1]`, growing downward.
    pub y: f32,
    pub kind: TileType,
}

impl BoardTile {
    #[must_use]
    pub const fn new(x: f32, y: f32, kind: TileType) -> Self {
        Self { x, y, kind }
    }
}

/// Errors raised while building or traversing a board.
#[derive(Debug, Error, PartialEq)]
pub enum BoardError {
    #[error("tile {index} does not exist (board has {len} tiles)")]
    MissingTile { index: usize, len: usize },
    #[error("tile {index} cannot connect to itself")]
    SelfLoop { index: usize },
    #[error("tile {index} position ({x:.2}, {y:.2}) lies outside the unit square")]
    OutOfBounds { index: usize, x: f32, y: f32 },
    #[error("tile {index} declares neither a type nor a color")]
    UntypedTile { index: usize },
    #[error("tile {index} has no neighbors to move to")]
    Stranded { index: usize },
    #[error("board has no tiles")]
    Empty,
    #[error("a move needs at least one step")]
    NoSteps,
    #[error("unknown board '{name}'")]
    UnknownBoard { name: String },
    #[error("board '{name}' could not be parsed: {message}")]
    Parse { name: String, message: String },
}

/// Where a token stands and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoardPosition {
    pub current: usize,
    pub previous: Option<usize>,
}

impl BoardPosition {
    #[must_use]
    pub const fn new(current: usize, previous: Option<usize>) -> Self {
        Self { current, previous }
    }

    #[must_use]
    pub const fn of(player: &Player) -> Self {
        Self::new(player.current_tile, player.previous_tile)
    }
}

/// Result of moving a token a number of steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub start: usize,
    /// Every tile entered, in order; the last entry is the landing tile.
    pub path: Vec<usize>,
    pub position: BoardPosition,
    pub trigger: TileType,
}

impl MoveOutcome {
    #[must_use]
    pub const fn landed(&self) -> usize {
        self.position.current
    }
}

/// Policy picking one tile when several forward moves are possible.
pub trait JunctionChooser {
    /// Return one of `candidates` (always two or more) for a token at `at`.
    fn choose(&mut self, board: &BoardGraph, at: usize, candidates: &[usize]) -> usize;
}

/// Always take the lowest-numbered forward tile.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstCandidate;

impl JunctionChooser for FirstCandidate {
    fn choose(&mut self, _board: &BoardGraph, _at: usize, candidates: &[usize]) -> usize {
        candidates.iter().copied().min().unwrap_or_default()
    }
}

/// Pick uniformly among forward tiles.
#[derive(Debug)]
pub struct RandomChoice<'a, R: Rng> {
    rng: &'a mut R,
}

impl<'a, R: Rng> RandomChoice<'a, R> {
    pub fn new(rng: &'a mut R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> JunctionChooser for RandomChoice<'_, R> {
    fn choose(&mut self, _board: &BoardGraph, _at: usize, candidates: &[usize]) -> usize {
        let pick = self.rng.gen_range(0..candidates.len().max(1));
        candidates.get(pick).copied().unwrap_or_default()
    }
}

/// Follow the direction the moving player is holding.
///
/// The candidate whose bearing from the junction best lines up with the held
/// axis wins; with nothing held the lowest-numbered candidate is taken.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectionalChoice {
    axis: (f32, f32),
}

impl DirectionalChoice {
    #[must_use]
    pub const fn new(axis: (f32, f32)) -> Self {
        Self { axis }
    }
}

impl JunctionChooser for DirectionalChoice {
    fn choose(&mut self, board: &BoardGraph, at: usize, candidates: &[usize]) -> usize {
        let (ax, ay) = self.axis;
        if ax == 0.0 && ay == 0.0 {
            return FirstCandidate.choose(board, at, candidates);
        }
        let Some(origin) = board.tile_at(at) else {
            return FirstCandidate.choose(board, at, candidates);
        };
        let score = |index: usize| {
            board.tile_at(index).map_or(f32::MIN, |tile| {
                let (dx, dy) = (tile.x - origin.x, tile.y - origin.y);
                let len = dx.hypot(dy);
                if len == 0.0 {
                    f32::MIN
                } else {
                    (dx * ax + dy * ay) / len
                }
            })
        };
        candidates
            .iter()
            .copied()
            .fold(None, |best: Option<(usize, f32)>, index| {
                let s = score(index);
                match best {
                    Some((_, best_score)) if best_score >= s => best,
                    _ => Some((index, s)),
                }
            })
            .map_or_else(|| FirstCandidate.choose(board, at, candidates), |(i, _)| i)
    }
}

/// Tiles plus the undirected adjacency relation between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardGraph {
    name: String,
    tiles: Vec<BoardTile>,
    adjacency: Vec<Neighbors>,
}

impl BoardGraph {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a tile, returning its index.
    pub fn add_tile(&mut self, tile: BoardTile) -> usize {
        self.tiles.push(tile);
        self.adjacency.push(Neighbors::new());
        self.tiles.len() - 1
    }

    /// Join two tiles in both directions. Repeated edges are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error when either index is outside the tile list or both
    /// indices name the same tile.
    pub fn connect(&mut self, a: usize, b: usize) -> Result<(), BoardError> {
        let len = self.tiles.len();
        for index in [a, b] {
            if index >= len {
                return Err(BoardError::MissingTile { index, len });
            }
        }
        if a == b {
            return Err(BoardError::SelfLoop { index: a });
        }
        if !self.adjacency[a].contains(&b) {
            self.adjacency[a].push(b);
            self.adjacency[b].push(a);
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[must_use]
    pub fn tiles(&self) -> &[BoardTile] {
        &self.tiles
    }

    #[must_use]
    pub fn tile_at(&self, index: usize) -> Option<&BoardTile> {
        self.tiles.get(index)
    }

    /// Neighbors of a tile in declaration order; empty for unknown indices.
    #[must_use]
    pub fn neighbors_of(&self, index: usize) -> &[usize] {
        self.adjacency
            .get(index)
            .map(SmallVec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the tile needs a direction choice when passed through.
    #[must_use]
    pub fn is_junction(&self, index: usize) -> bool {
        self.neighbors_of(index).len() > 2
    }

    /// Legal next tiles: every neighbor except the one just left, unless
    /// that is the only way out.
    #[must_use]
    pub fn candidates(&self, position: BoardPosition) -> Neighbors {
        let neighbors = self.neighbors_of(position.current);
        let forward: Neighbors = neighbors
            .iter()
            .copied()
            .filter(|&n| Some(n) != position.previous)
            .collect();
        if forward.is_empty() {
            neighbors.iter().copied().collect()
        } else {
            forward
        }
    }

    /// Move a single step.
    ///
    /// # Errors
    ///
    /// Returns an error when the current tile does not exist or has no
    /// neighbors.
    pub fn step(
        &self,
        position: BoardPosition,
        chooser: &mut dyn JunctionChooser,
    ) -> Result<BoardPosition, BoardError> {
        if position.current >= self.len() {
            return Err(BoardError::MissingTile {
                index: position.current,
                len: self.len(),
            });
        }
        let candidates = self.candidates(position);
        let next = match candidates.as_slice() {
            [] => {
                return Err(BoardError::Stranded {
                    index: position.current,
                });
            }
            [only] => *only,
            many => {
                let picked = chooser.choose(self, position.current, many);
                if many.contains(&picked) {
                    picked
                } else {
                    log::warn!(
                        "junction chooser picked {picked} at tile {}, not a candidate; taking {}",
                        position.current,
                        many[0]
                    );
                    many[0]
                }
            }
        };
        Ok(BoardPosition::new(next, Some(position.current)))
    }

    /// Move `steps` tiles and report the landing tile's trigger.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NoSteps`] for a zero-step move and propagates
    /// the first failing [`BoardGraph::step`].
    pub fn advance(
        &self,
        start: BoardPosition,
        steps: u32,
        chooser: &mut dyn JunctionChooser,
    ) -> Result<MoveOutcome, BoardError> {
        if steps == 0 {
            return Err(BoardError::NoSteps);
        }
        let mut position = start;
        let mut path = Vec::with_capacity(usize::try_from(steps).unwrap_or(0));
        for _ in 0..steps {
            position = self.step(position, chooser)?;
            path.push(position.current);
        }
        let trigger = self
            .tile_at(position.current)
            .map(|t| t.kind)
            .ok_or(BoardError::MissingTile {
                index: position.current,
                len: self.len(),
            })?;
        Ok(MoveOutcome {
            start: start.current,
            path,
            position,
            trigger,
        })
    }

    /// Move a player's token in place.
    ///
    /// # Errors
    ///
    /// Propagates traversal errors; the player is left untouched on error.
    pub fn advance_player(
        &self,
        player: &mut Player,
        steps: u32,
        chooser: &mut dyn JunctionChooser,
    ) -> Result<MoveOutcome, BoardError> {
        let outcome = self.advance(BoardPosition::of(player), steps, chooser)?;
        player.current_tile = outcome.position.current;
        player.previous_tile = outcome.position.previous;
        Ok(outcome)
    }

    /// Tiles that cannot be reached from tile 0.
    #[must_use]
    pub fn unreachable_tiles(&self) -> Vec<usize> {
        if self.tiles.is_empty() {
            return Vec::new();
        }
        let mut seen = vec![false; self.tiles.len()];
        let mut queue = VecDeque::from([0usize]);
        seen[0] = true;
        while let Some(index) = queue.pop_front() {
            for &next in self.neighbors_of(index) {
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }
        seen.iter()
            .enumerate()
            .filter_map(|(i, reached)| (!reached).then_some(i))
            .collect()
    }
}
