use std::collections::VecDeque;

use minesweeper_common::{
    models::{Board, BoardSize, Pos, Tile},
    protocol::{ClientMessage, ServerMessage},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::intent::Intent;
use crate::viewport::{Coord, Viewport};

/// Number of status lines kept for display.
pub const STATUS_HISTORY: usize = 64;

/// Lifecycle of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum Phase {
    /// No greeting yet.
    #[default]
    Waiting,
    /// Greeting received, first board not yet.
    Ready,
    /// A board is present and tiles may be dug or flagged.
    Live,
    /// `BOOM!` was received. Terminal for tile interaction.
    Detonated,
    /// The connection is gone.
    Closed,
}

/// Events emitted by a session as server messages and user input are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The greeting announced the board size and player count
    Initialized { size: BoardSize, players: usize },
    /// A fresh board dump replaced the local board
    BoardUpdated,
    /// The server reported a detonation
    Detonated,
    /// A free text line arrived (help output, errors)
    StatusText { text: String },
    /// Selection or aperture changed and the view should be redrawn
    ViewChanged,
    /// Connection was lost
    ConnectionLost { reason: Option<String> },
}

/// What the caller should do after an [`Intent`] was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Redraw,
    Send(ClientMessage),
    Quit,
}

/// Client-side state of one connection: the board mirror, the viewport and
/// the phase. All board content comes from the server; nothing is predicted.
#[derive(Debug, Clone, Default)]
pub struct Session {
    phase: Phase,
    size: Option<BoardSize>,
    players: usize,
    board: Option<Board>,
    viewport: Viewport,
    status: VecDeque<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn board_size(&self) -> Option<BoardSize> {
        self.size
    }

    pub fn players(&self) -> usize {
        self.players
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Recent status lines, oldest first.
    pub fn status_lines(&self) -> impl Iterator<Item = &str> {
        self.status.iter().map(String::as_str)
    }

    /// Tile under the selection, once a board has arrived.
    pub fn selected_tile(&self) -> Option<Tile> {
        let pos = self.viewport.selected_pos()?;
        self.board.as_ref()?.tile_at(pos).ok()
    }

    /// Apply a decoded server message.
    pub fn apply(&mut self, message: ServerMessage) -> Option<GameEvent> {
        if self.phase == Phase::Closed {
            return None;
        }

        match message {
            ServerMessage::Greeting { size, players } => {
                if self.phase != Phase::Waiting {
                    warn!("Ignoring repeated greeting");
                    return None;
                }
                info!(
                    "Received greeting: {}x{} board, {} players",
                    size.width, size.height, players
                );

                self.size = Some(size);
                self.players = players;
                self.viewport.on_greeting(size);
                self.phase = Phase::Ready;
                Some(GameEvent::Initialized { size, players })
            }
            ServerMessage::BoardDump { board } => {
                if self.size != Some(board.size()) {
                    warn!(
                        "Ignoring {}x{} board that does not match the greeting",
                        board.width(),
                        board.height()
                    );
                    return None;
                }
                debug!("Received board dump");

                self.board = Some(board);
                if self.phase == Phase::Ready {
                    self.phase = Phase::Live;
                }
                Some(GameEvent::BoardUpdated)
            }
            ServerMessage::Detonation => {
                info!("BOOM!");
                self.phase = Phase::Detonated;
                Some(GameEvent::Detonated)
            }
            ServerMessage::StatusText { text } => {
                if self.status.len() == STATUS_HISTORY {
                    self.status.pop_front();
                }
                self.status.push_back(text.clone());
                Some(GameEvent::StatusText { text })
            }
        }
    }

    /// The connection ended. Returns `None` if it was already closed.
    pub fn close(&mut self, reason: Option<String>) -> Option<GameEvent> {
        if self.phase == Phase::Closed {
            return None;
        }
        self.phase = Phase::Closed;
        Some(GameEvent::ConnectionLost { reason })
    }

    pub fn move_selection(&mut self, delta: Coord) -> bool {
        self.viewport.move_selection(delta)
    }

    pub fn resize_aperture(&mut self, size: Coord) -> bool {
        self.viewport.resize_aperture(size)
    }

    pub fn select_in_aperture(&mut self, coord: Coord) -> bool {
        self.viewport.select_in_aperture(coord)
    }

    fn live_selection(&self) -> Option<(Pos, Tile)> {
        if self.phase != Phase::Live {
            return None;
        }
        let pos = self.viewport.selected_pos()?;
        let tile = self.board.as_ref()?.tile_at(pos).ok()?;
        Some((pos, tile))
    }

    /// Command to dig the selected tile, if it can still be dug.
    pub fn dig(&self) -> Option<ClientMessage> {
        match self.live_selection()? {
            (pos, Tile::Untouched) => Some(ClientMessage::Dig { pos }),
            _ => None,
        }
    }

    /// Command to flag or deflag the selected tile, if either applies.
    pub fn toggle_flag(&self) -> Option<ClientMessage> {
        match self.live_selection()? {
            (pos, Tile::Untouched) => Some(ClientMessage::Flag { pos }),
            (pos, Tile::Flagged) => Some(ClientMessage::Deflag { pos }),
            (_, Tile::Dug { .. }) => None,
        }
    }

    pub fn handle_intent(&mut self, intent: Intent) -> Action {
        let redraw = |changed: bool| if changed { Action::Redraw } else { Action::None };

        match intent {
            Intent::Move { dx, dy } => redraw(self.move_selection((dx, dy))),
            Intent::Select { x, y } => redraw(self.select_in_aperture((x, y))),
            Intent::Resize { width, height } => redraw(self.resize_aperture((width, height))),
            Intent::Dig => self.dig().map_or(Action::None, Action::Send),
            Intent::ToggleFlag => self.toggle_flag().map_or(Action::None, Action::Send),
            Intent::Look => Action::Send(ClientMessage::Look),
            Intent::Help => Action::Send(ClientMessage::Help),
            Intent::Quit => Action::Quit,
        }
    }
}
