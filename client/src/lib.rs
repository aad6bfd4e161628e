//! Minesweeper Client Library
//!
//! This library provides a Rust client for the text-based multiplayer
//! minesweeper server. It keeps a local mirror of the (possibly very large)
//! board, a selection cursor with a scrolling window into the board, and a
//! minimap projection for renderers that want an overview.
//!
//! ## Usage
//!
//! ### High-Level Interface (Recommended)
//!
//! The `MinesweeperGame` struct manages the connection, applies server
//! messages in the background and publishes `GameEvent`s:
//!
//! ```rust,no_run
//! use minesweeper_client::{ClientConfig, GameEvent, MinesweeperGame};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let game = MinesweeperGame::new(ClientConfig::from_env());
//!     let (_, mut events) = game.subscribe().await;
//!
//!     game.connect().await?;
//!     game.resize_aperture((40, 20)).await;
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             GameEvent::BoardUpdated => {
//!                 game.move_selection((1, 1)).await;
//!                 game.dig().await?;
//!             }
//!             GameEvent::Detonated | GameEvent::ConnectionLost { .. } => break,
//!             _ => {}
//!         }
//!     }
//!
//!     game.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ### Low-Level Interface
//!
//! For more control, use `MinesweeperConnection` directly and keep your own
//! `Session`:
//!
//! ```rust,no_run
//! use minesweeper_client::{ClientMessage, MinesweeperConnection, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut connection = MinesweeperConnection::connect("localhost:4444").await?;
//!     let mut session = Session::new();
//!
//!     // Receive the greeting, then ask for the board
//!     if let Some(message) = connection.receive_message().await? {
//!         println!("Received: {:?}", session.apply(message));
//!     }
//!     connection.send_message(ClientMessage::Look)?;
//!
//!     connection.close().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod connection;
mod game;
mod intent;
mod relay;
mod session;
pub mod viewport;

pub use config::ClientConfig;
pub use connection::{MessageStream, MinesweeperConnection};
pub use game::MinesweeperGame;
pub use intent::Intent;
pub use relay::{EventBus, SubscriberId};
pub use session::{Action, GameEvent, Phase, STATUS_HISTORY, Session};
pub use viewport::{Coord, Minimap, Viewport};

// Re-export common types for convenience
pub use minesweeper_common::{
    decoder::StreamDecoder,
    error::{BoardError, ProtocolError, ProtocolErrorKind},
    models::*,
    protocol::*,
};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
