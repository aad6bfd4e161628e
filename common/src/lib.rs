//! Shared board model and wire protocol for the text minesweeper server.
//!
//! Everything in this crate is synchronous and free of I/O: bytes go into a
//! [`StreamDecoder`](decoder::StreamDecoder), typed
//! [`ServerMessage`](protocol::ServerMessage)s come out, and
//! [`ClientMessage`](protocol::ClientMessage)s render to request lines.
//!
//! ```
//! use minesweeper_common::{decoder::StreamDecoder, protocol::ServerMessage};
//!
//! let mut decoder = StreamDecoder::new();
//! let messages = decoder
//!     .feed(b"Welcome to Minesweeper. Board: 3 columns by 2 rows. Players: 1 including you. Type 'help' for help.\n")
//!     .unwrap();
//! assert!(matches!(messages[0], ServerMessage::Greeting { players: 1, .. }));
//!
//! let messages = decoder.feed(b"- F -\n  8 2\n").unwrap();
//! assert!(matches!(messages[0], ServerMessage::BoardDump { .. }));
//! ```

pub mod decoder;
pub mod error;
pub mod models;
pub mod parse;
pub mod protocol;
