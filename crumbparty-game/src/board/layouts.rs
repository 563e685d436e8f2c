//! Board files and the built-in boards shipped with the game.
use serde::{Deserialize, Serialize};

use super::{BoardError, BoardGraph, BoardTile, TileColor, TileType};

const MEADOW_BOARD: &str = include_str!("../../assets/boards/meadow.json");
const CROSSROADS_BOARD: &str = include_str!("../../assets/boards/crossroads.json");

const BUILTIN_BOARDS: [(&str, &str); 2] =
    [("meadow", MEADOW_BOARD), ("crossroads", CROSSROADS_BOARD)];

/// How a board maps authoring colors to tile behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorMap {
    #[serde(default = "ColorMap::default_green")]
    pub green: TileType,
    #[serde(default = "ColorMap::default_red")]
    pub red: TileType,
    #[serde(default = "ColorMap::default_blue")]
    pub blue: TileType,
}

impl ColorMap {
    #[must_use]
    pub const fn default_green() -> TileType {
        TileType::Shop
    }

    #[must_use]
    pub const fn default_red() -> TileType {
        TileType::Minigame
    }

    #[must_use]
    pub const fn default_blue() -> TileType {
        TileType::Regular
    }

    #[must_use]
    pub const fn resolve(&self, color: TileColor) -> TileType {
        match color {
            TileColor::Green => self.green,
            TileColor::Red => self.red,
            TileColor::Blue => self.blue,
        }
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        Self {
            green: Self::default_green(),
            red: Self::default_red(),
            blue: Self::default_blue(),
        }
    }
}

/// One tile as written in a board file. An explicit `type` wins over `color`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileSpec {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<TileColor>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TileType>,
}

/// Serializable description of a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSpec {
    pub name: String,
    #[serde(default)]
    pub colors: ColorMap,
    pub tiles: Vec<TileSpec>,
    #[serde(default)]
    pub connections: Vec<[usize; 2]>,
}

impl BoardSpec {
    /// Parse a board file.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Parse`] when the JSON does not describe a board.
    pub fn from_json(name: &str, json: &str) -> Result<Self, BoardError> {
        serde_json::from_str(json).map_err(|err| BoardError::Parse {
            name: name.to_string(),
            message: err.to_string(),
        })
    }

    /// Build the immutable graph, validating every tile and connection.
    ///
    /// # Errors
    ///
    /// Returns the first tile or connection that is malformed.
    pub fn build(&self) -> Result<BoardGraph, BoardError> {
        if self.tiles.is_empty() {
            return Err(BoardError::Empty);
        }
        let mut board = BoardGraph::new(self.name.clone());
        for (index, spec) in self.tiles.iter().enumerate() {
            if !(0.0..=1.0).contains(&spec.x) || !(0.0..=1.0).contains(&spec.y) {
                return Err(BoardError::OutOfBounds {
                    index,
                    x: spec.x,
                    y: spec.y,
                });
            }
            let kind = spec
                .kind
                .or_else(|| spec.color.map(|c| self.colors.resolve(c)))
                .ok_or(BoardError::UntypedTile { index })?;
            board.add_tile(BoardTile::new(spec.x, spec.y, kind));
        }
        for [a, b] in &self.connections {
            board.connect(*a, *b)?;
        }
        Ok(board)
    }
}

/// Names of the boards shipped with the game.
#[must_use]
pub fn names() -> Vec<&'static str> {
    BUILTIN_BOARDS.iter().map(|(name, _)| *name).collect()
}

/// Parse a built-in board file without building it.
///
/// # Errors
///
/// Returns [`BoardError::UnknownBoard`] for names not in [`names`].
pub fn builtin_spec(name: &str) -> Result<BoardSpec, BoardError> {
    let (_, json) = BUILTIN_BOARDS
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .ok_or_else(|| BoardError::UnknownBoard {
            name: name.to_string(),
        })?;
    BoardSpec::from_json(name, json)
}

/// Build one of the shipped boards by name.
///
/// # Errors
///
/// Returns an error for unknown names or malformed board files.
pub fn builtin(name: &str) -> Result<BoardGraph, BoardError> {
    builtin_spec(name)?.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_boards_are_well_formed() {
        for name in names() {
            let board = builtin(name).unwrap();
            assert!(!board.is_empty(), "{name} has tiles");
            assert!(board.unreachable_tiles().is_empty(), "{name} is connected");
            assert!(
                (0..board.len()).any(|i| board.is_junction(i)),
                "{name} has at least one junction"
            );
        }
    }

    #[test]
    fn meadow_uses_default_colors() {
        let board = builtin("meadow").unwrap();
        assert_eq!(board.len(), 16);
        assert_eq!(board.tile_at(0).unwrap().kind, TileType::Shop);
        assert_eq!(board.tile_at(2).unwrap().kind, TileType::Minigame);
        assert_eq!(board.tile_at(1).unwrap().kind, TileType::Regular);
        assert_eq!(board.neighbors_of(2), &[1, 3, 14]);
    }

    #[test]
    fn crossroads_overrides_color_mapping() {
        let board = builtin("Crossroads").unwrap();
        assert_eq!(board.tile_at(1).unwrap().kind, TileType::Minigame);
        assert_eq!(board.tile_at(3).unwrap().kind, TileType::Shop);
        assert_eq!(board.tile_at(10).unwrap().kind, TileType::Shop);
        assert_eq!(board.neighbors_of(10), &[9]);
    }

    #[test]
    fn unknown_board_is_reported() {
        assert_eq!(
            builtin("swamp"),
            Err(BoardError::UnknownBoard {
                name: "swamp".to_string()
            })
        );
    }

    #[test]
    fn bad_connection_fails_the_build() {
        let mut spec = builtin_spec("meadow").unwrap();
        spec.connections.push([3, 99]);
        assert_eq!(
            spec.build(),
            Err(BoardError::MissingTile { index: 99, len: 16 })
        );
    }

    #[test]
    fn tiles_need_a_type_and_a_sane_position() {
        let json = r#"{"name":"tiny","tiles":[{"x":0.5,"y":0.5}]}"#;
        let spec = BoardSpec::from_json("tiny", json).unwrap();
        assert_eq!(spec.build(), Err(BoardError::UntypedTile { index: 0 }));

        let json = r#"{"name":"tiny","tiles":[{"x":1.5,"y":0.5,"color":"red"}]}"#;
        let spec = BoardSpec::from_json("tiny", json).unwrap();
        assert!(matches!(
            spec.build(),
            Err(BoardError::OutOfBounds { index: 0, .. })
        ));

        let empty = BoardSpec::from_json("none", r#"{"name":"none","tiles":[]}"#).unwrap();
        assert_eq!(empty.build(), Err(BoardError::Empty));
        assert!(matches!(
            BoardSpec::from_json("junk", "not json"),
            Err(BoardError::Parse { .. })
        ));
    }
}
