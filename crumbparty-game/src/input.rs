//! Per-player input predicates consumed by the board and minigames.
//!
//! Key-to-player mapping lives outside the core; the core only asks whether a
//! player is holding a button (level-triggered) or pressed it this frame
//! (edge-triggered).
use serde::{Deserialize, Serialize};

use crate::player::{MAX_PLAYERS, PlayerId};

/// Logical buttons every player has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    Action,
}

impl Button {
    const fn mask(self) -> u8 {
        match self {
            Self::Up => 1,
            Self::Down => 1 << 1,
            Self::Left => 1 << 2,
            Self::Right => 1 << 3,
            Self::Action => 1 << 4,
        }
    }
}

/// Cardinal direction, used by movement and the memory sequence alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    #[must_use]
    pub const fn button(self) -> Button {
        match self {
            Self::Up => Button::Up,
            Self::Down => Button::Down,
            Self::Left => Button::Left,
            Self::Right => Button::Right,
        }
    }

    /// Unit vector in screen space (y grows downward).
    #[must_use]
    pub const fn vector(self) -> (f32, f32) {
        match self {
            Self::Up => (0.0, -1.0),
            Self::Down => (0.0, 1.0),
            Self::Left => (-1.0, 0.0),
            Self::Right => (1.0, 0.0),
        }
    }

    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Up => 'U',
            Self::Down => 'D',
            Self::Left => 'L',
            Self::Right => 'R',
        }
    }
}

/// Source of per-player button state for one frame.
///
/// Implementations must answer `false` for ids with no bound player rather
/// than panicking.
pub trait InputSource {
    /// Whether the button is currently held.
    fn pressing(&self, player: PlayerId, button: Button) -> bool;

    /// Whether the button went down this frame.
    fn just_pressed(&self, player: PlayerId, button: Button) -> bool;

    /// Level-triggered query keyed by a raw id; out-of-range ids read as released.
    fn pressing_raw(&self, raw_id: u8, button: Button) -> bool {
        match PlayerId::new(raw_id) {
            Some(player) => self.pressing(player, button),
            None => {
                log::debug!("input query for out-of-range player id {raw_id}");
                false
            }
        }
    }

    /// Edge-triggered query keyed by a raw id; out-of-range ids read as released.
    fn just_pressed_raw(&self, raw_id: u8, button: Button) -> bool {
        match PlayerId::new(raw_id) {
            Some(player) => self.just_pressed(player, button),
            None => {
                log::debug!("input query for out-of-range player id {raw_id}");
                false
            }
        }
    }

    /// Unit-length direction the player holds; opposing buttons cancel and
    /// nothing held reads `(0.0, 0.0)`.
    fn axis(&self, player: PlayerId) -> (f32, f32) {
        let (x, y) = Direction::ALL
            .iter()
            .filter(|dir| self.pressing(player, dir.button()))
            .fold((0.0_f32, 0.0_f32), |(x, y), dir| {
                let (dx, dy) = dir.vector();
                (x + dx, y + dy)
            });
        let len = x.hypot(y);
        if len > 0.0 {
            (x / len, y / len)
        } else {
            (0.0, 0.0)
        }
    }

    /// First direction pressed this frame, in `Direction::ALL` order.
    fn just_pressed_direction(&self, player: PlayerId) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|dir| self.just_pressed(player, dir.button()))
    }
}

/// Held-button masks for the current and previous frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    held: [u8; MAX_PLAYERS],
    previous: [u8; MAX_PLAYERS],
}

impl InputState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a button as held (or released) for the current frame.
    pub fn set(&mut self, player: PlayerId, button: Button, down: bool) {
        let Some(mask) = self.held.get_mut(player.slot()) else {
            return;
        };
        if down {
            *mask |= button.mask();
        } else {
            *mask &= !button.mask();
        }
    }

    pub fn press(&mut self, player: PlayerId, button: Button) {
        self.set(player, button, true);
    }

    pub fn release(&mut self, player: PlayerId, button: Button) {
        self.set(player, button, false);
    }

    /// Release every button of one player.
    pub fn release_all(&mut self, player: PlayerId) {
        if let Some(mask) = self.held.get_mut(player.slot()) {
            *mask = 0;
        }
    }

    /// Roll the current frame into history so edges fire exactly once.
    pub fn end_frame(&mut self) {
        self.previous = self.held;
    }

    fn masks(&self, player: PlayerId) -> Option<(u8, u8)> {
        let slot = player.slot();
        match (self.held.get(slot), self.previous.get(slot)) {
            (Some(held), Some(previous)) => Some((*held, *previous)),
            _ => {
                log::debug!("input query for unbound player {player}");
                None
            }
        }
    }
}

impl InputSource for InputState {
    fn pressing(&self, player: PlayerId, button: Button) -> bool {
        self.masks(player)
            .is_some_and(|(held, _)| held & button.mask() != 0)
    }

    fn just_pressed(&self, player: PlayerId, button: Button) -> bool {
        self.masks(player).is_some_and(|(held, previous)| {
            held & button.mask() != 0 && previous & button.mask() == 0
        })
    }
}

/// Input source with nothing pressed, for frames without players at the controls.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn pressing(&self, _player: PlayerId, _button: Button) -> bool {
        false
    }

    fn just_pressed(&self, _player: PlayerId, _button: Button) -> bool {
        false
    }
}
