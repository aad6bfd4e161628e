use serde::{Deserialize, Serialize};

use crate::viewport::Coord;

/// What the user asked for, independent of the input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "intent")]
pub enum Intent {
    #[serde(rename = "move")]
    Move { dx: i32, dy: i32 },
    /// Select the cell under an aperture-relative position, e.g. a mouse click.
    #[serde(rename = "select")]
    Select { x: i32, y: i32 },
    #[serde(rename = "dig")]
    Dig,
    #[serde(rename = "toggle_flag")]
    ToggleFlag,
    #[serde(rename = "resize")]
    Resize { width: i32, height: i32 },
    #[serde(rename = "look")]
    Look,
    #[serde(rename = "help")]
    Help,
    #[serde(rename = "quit")]
    Quit,
}

impl Intent {
    pub const fn movement(delta: Coord) -> Self {
        Self::Move {
            dx: delta.0,
            dy: delta.1,
        }
    }

    /// Map a key name to an intent. Case is ignored.
    ///
    /// Movement accepts WASD, the arrow keys and vi keys (`hjkl`, with `yubn`
    /// for diagonals). Enter or `1` digs; `f`, `2` or a quote toggles a flag.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.to_lowercase();
        let intent = match key.as_str() {
            "w" | "k" | "up" => Self::movement((0, -1)),
            "a" | "h" | "left" => Self::movement((-1, 0)),
            "s" | "j" | "down" => Self::movement((0, 1)),
            "d" | "l" | "right" => Self::movement((1, 0)),
            "y" => Self::movement((-1, -1)),
            "u" => Self::movement((1, -1)),
            "b" => Self::movement((-1, 1)),
            "n" => Self::movement((1, 1)),
            "enter" | "1" => Self::Dig,
            "f" | "2" | "'" | "\"" => Self::ToggleFlag,
            "q" | "ctrl c" | "ctrl d" => Self::Quit,
            _ => return None,
        };
        Some(intent)
    }
}
