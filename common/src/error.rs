use thiserror::Error;

/// Contract violations on [`Board`](crate::models::Board) construction and access.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Invalid board dimensions {width}x{height}")]
    InvalidDimension { width: usize, height: usize },
    #[error("Coordinates ({x}, {y}) are outside the board")]
    OutOfBounds { x: usize, y: usize },
    #[error("A tile cannot have {count} mined neighbours")]
    InvalidAdjacent { count: u8 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolErrorKind {
    #[error("first message is not a valid greeting")]
    InvalidGreeting,
    #[error("greeting announced a board with no tiles")]
    ZeroSizedBoard,
    #[error("greeting announced a {width}x{height} board, more tiles than a client can hold")]
    BoardTooLarge { width: usize, height: usize },
    #[error("board row {line} has the wrong number of tiles")]
    WrongSizeBoard { line: usize },
    #[error("invalid tile {glyph:?} at row {line}, column {column}")]
    InvalidTile {
        line: usize,
        column: usize,
        glyph: char,
    },
    #[error("board row {line} is not a space separated tile list")]
    MalformedRow { line: usize },
}

/// The server stream broke the grammar. Fatal to the connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("protocol violation: {kind}")]
pub struct ProtocolError {
    pub kind: ProtocolErrorKind,
    /// Buffer contents at the point the violation was detected.
    pub buffer: String,
}

impl ProtocolError {
    pub fn new(kind: ProtocolErrorKind, buffer: impl Into<String>) -> Self {
        Self {
            kind,
            buffer: buffer.into(),
        }
    }
}

pub type BoardResult<T> = core::result::Result<T, BoardError>;
pub type ProtocolResult<T> = core::result::Result<T, ProtocolError>;
