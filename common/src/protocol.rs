use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Board, BoardSize, Pos};

/// A request line sent from the client to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "command")]
pub enum ClientMessage {
    #[serde(rename = "look")]
    Look,
    #[serde(rename = "help")]
    Help,
    #[serde(rename = "bye")]
    Bye,
    #[serde(rename = "dig")]
    Dig { pos: Pos },
    #[serde(rename = "flag")]
    Flag { pos: Pos },
    #[serde(rename = "deflag")]
    Deflag { pos: Pos },
}

impl ClientMessage {
    /// The newline-terminated wire form of this command.
    pub fn render(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Look => f.write_str("look"),
            Self::Help => f.write_str("help"),
            Self::Bye => f.write_str("bye"),
            Self::Dig { pos } => write!(f, "dig {} {}", pos.x, pos.y),
            Self::Flag { pos } => write!(f, "flag {} {}", pos.x, pos.y),
            Self::Deflag { pos } => write!(f, "deflag {} {}", pos.x, pos.y),
        }
    }
}

/// A decoded frame from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Always the first frame on a connection.
    Greeting { size: BoardSize, players: usize },
    /// Full snapshot of the board, sized as announced by the greeting.
    BoardDump { board: Board },
    /// `BOOM!`
    Detonation,
    /// Any other line, without its terminator.
    StatusText { text: String },
}
