use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult};

/// Largest neighbour count a dug tile can report.
pub const MAX_ADJACENT: u8 = 8;

/// Most tiles a board may hold. Keeps every coordinate well inside `i32`.
pub const MAX_BOARD_TILES: usize = 1 << 24;

/// Number of mined neighbours of a dug tile, always in `0..=8`.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct Adjacent(u8);

impl Adjacent {
    pub const ZERO: Self = Self(0);

    pub const fn new(count: u8) -> Option<Self> {
        if count <= MAX_ADJACENT {
            Some(Self(count))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Adjacent {
    type Error = BoardError;

    fn try_from(count: u8) -> BoardResult<Self> {
        Self::new(count).ok_or(BoardError::InvalidAdjacent { count })
    }
}

impl From<Adjacent> for u8 {
    fn from(adjacent: Adjacent) -> Self {
        adjacent.0
    }
}

/// Server-reported state of a single tile.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq, Hash)]
#[serde(tag = "state")]
pub enum Tile {
    #[default]
    #[serde(rename = "untouched")]
    Untouched,
    #[serde(rename = "flagged")]
    Flagged,
    #[serde(rename = "dug")]
    Dug { adjacent: Adjacent },
}

impl Tile {
    /// A dug tile, or `None` if `adjacent` is not a possible neighbour count.
    pub const fn dug(adjacent: u8) -> Option<Self> {
        match Adjacent::new(adjacent) {
            Some(adjacent) => Some(Self::Dug { adjacent }),
            None => None,
        }
    }

    /// Decode a wire glyph. `' '` and `'0'` both mean a dug tile with no mined neighbours.
    pub fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '-' => Some(Self::Untouched),
            'F' => Some(Self::Flagged),
            ' ' => Some(Self::Dug {
                adjacent: Adjacent::ZERO,
            }),
            '0'..='8' => Self::dug(glyph as u8 - b'0'),
            _ => None,
        }
    }

    /// The glyph the server uses for this tile.
    pub fn glyph(self) -> char {
        match self {
            Self::Untouched => '-',
            Self::Flagged => 'F',
            Self::Dug { adjacent } if adjacent == Adjacent::ZERO => ' ',
            Self::Dug { adjacent } => char::from(b'0' + adjacent.get()),
        }
    }

    pub const fn is_untouched(self) -> bool {
        matches!(self, Self::Untouched)
    }

    pub const fn is_flagged(self) -> bool {
        matches!(self, Self::Flagged)
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Board dimensions as announced by the greeting.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoardSize {
    pub width: usize,
    pub height: usize,
}

impl BoardSize {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total tiles, or `None` if a board of this size cannot be built:
    /// either side is zero or the area exceeds [`MAX_BOARD_TILES`].
    pub fn tile_count(self) -> Option<usize> {
        self.width
            .checked_mul(self.height)
            .filter(|len| (1..=MAX_BOARD_TILES).contains(len))
    }
}

/// Dense local mirror of the server's board.
///
/// Tiles are stored row-major, `tiles[y * width + x]`. The board never
/// validates transitions: whatever the server reports is written as is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Board {
    /// Create an entirely untouched board.
    pub fn new(width: usize, height: usize) -> BoardResult<Self> {
        let len = BoardSize::new(width, height)
            .tile_count()
            .ok_or(BoardError::InvalidDimension { width, height })?;

        Ok(Self {
            width,
            height,
            tiles: vec![Tile::Untouched; len],
        })
    }

    /// Build a board from row-major tiles, which must fill `size` exactly.
    pub fn from_tiles(size: BoardSize, tiles: Vec<Tile>) -> BoardResult<Self> {
        let BoardSize { width, height } = size;
        if size.tile_count() != Some(tiles.len()) {
            return Err(BoardError::InvalidDimension { width, height });
        }

        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> BoardSize {
        BoardSize::new(self.width, self.height)
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    fn index(&self, x: usize, y: usize) -> BoardResult<usize> {
        if self.in_bounds(x, y) {
            Ok(y * self.width + x)
        } else {
            Err(BoardError::OutOfBounds { x, y })
        }
    }

    pub fn get(&self, x: usize, y: usize) -> BoardResult<Tile> {
        let index = self.index(x, y)?;
        Ok(self.tiles[index])
    }

    pub fn set(&mut self, x: usize, y: usize, tile: Tile) -> BoardResult<()> {
        let index = self.index(x, y)?;
        self.tiles[index] = tile;
        Ok(())
    }

    pub fn tile_at(&self, pos: Pos) -> BoardResult<Tile> {
        self.get(pos.x, pos.y)
    }

    /// Count the tiles in each state as `(untouched, flagged, dug)`.
    pub fn count_tiles(&self) -> (usize, usize, usize) {
        self.tiles
            .iter()
            .fold((0, 0, 0), |(untouched, flagged, dug), tile| match tile {
                Tile::Untouched => (untouched + 1, flagged, dug),
                Tile::Flagged => (untouched, flagged + 1, dug),
                Tile::Dug { .. } => (untouched, flagged, dug + 1),
            })
    }

    /// Render each row in the wire format, without line terminators.
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.tiles.chunks(self.width).map(|row| {
            let mut line = String::with_capacity(row.len() * 2);
            for (i, tile) in row.iter().enumerate() {
                if i > 0 {
                    line.push(' ');
                }
                line.push(tile.glyph());
            }
            line
        })
    }
}
