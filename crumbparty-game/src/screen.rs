//! Descriptors handed to the navigation layer.
use serde::{Deserialize, Serialize};

/// Screen the surrounding application should present next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    Board,
    NextMinigame {
        name: String,
        instructions: String,
    },
    Results {
        minigame: String,
        placements: Vec<String>,
        crumbs: Vec<u32>,
    },
    Victory {
        winners: Vec<String>,
    },
}
