//! Selection cursor and visible window over a board that may be larger than
//! the screen.
//!
//! Three coordinate spaces are involved: board coordinates, aperture
//! coordinates (relative to the top-left cell of the visible window) and
//! minimap coordinates (the whole board scaled down to a small overview).
//! The aperture may extend past the board edges; renderers draw those cells
//! as a border.

use minesweeper_common::models::{BoardSize, MAX_BOARD_TILES, Pos};

/// A signed `(x, y)` cell coordinate or `(width, height)` extent.
pub type Coord = (i32, i32);

/// Width of the margin kept between the selection and the aperture edge.
const MARGIN: i32 = 1;

/// Board sides never exceed [`MAX_BOARD_TILES`], which is far below `i32::MAX`.
fn to_coord_dim(value: usize) -> i32 {
    value.min(MAX_BOARD_TILES) as i32
}

/// Move `origin` along one axis the least amount that keeps `selection` off
/// the outermost cells of an aperture `aperture` cells wide.
fn scroll_axis(origin: i32, selection: i32, aperture: i32) -> i32 {
    let relative = selection - origin;
    if relative < MARGIN {
        selection - MARGIN
    } else if relative > aperture - 1 - MARGIN {
        selection - (aperture - 1 - MARGIN)
    } else {
        origin
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Viewport {
    board_size: Coord,
    selection: Coord,
    origin: Coord,
    aperture: Coord,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board_size(&self) -> Coord {
        self.board_size
    }

    pub fn selection(&self) -> Coord {
        self.selection
    }

    /// The selection as a board position, once a board size is known.
    pub fn selected_pos(&self) -> Option<Pos> {
        let (x, y) = self.selection;
        if x < self.board_size.0 && y < self.board_size.1 {
            Some(Pos::new(usize::try_from(x).ok()?, usize::try_from(y).ok()?))
        } else {
            None
        }
    }

    /// Board coordinate shown in the top-left cell of the aperture.
    pub fn origin(&self) -> Coord {
        self.origin
    }

    pub fn aperture_size(&self) -> Coord {
        self.aperture
    }

    /// A new board size was announced; the selection returns to the corner.
    pub fn on_greeting(&mut self, size: BoardSize) {
        self.board_size = (to_coord_dim(size.width), to_coord_dim(size.height));
        self.selection = (0, 0);
        self.origin = (0, 0);
        self.refit();
    }

    /// Record the visible window size. Returns whether anything changed.
    pub fn resize_aperture(&mut self, size: Coord) -> bool {
        let size = (size.0.max(0), size.1.max(0));
        if size == self.aperture {
            return false;
        }

        self.aperture = size;
        self.refit();
        true
    }

    /// Move the selection by `delta`, clamped to the board. Returns whether
    /// the selection moved, which is also whether a redraw is needed.
    pub fn move_selection(&mut self, delta: Coord) -> bool {
        let (width, height) = self.board_size;
        if width <= 0 || height <= 0 {
            return false;
        }

        let candidate = (
            self.selection.0.saturating_add(delta.0).clamp(0, width - 1),
            self.selection.1.saturating_add(delta.1).clamp(0, height - 1),
        );
        if candidate == self.selection {
            return false;
        }

        self.selection = candidate;
        self.refit();
        true
    }

    /// Select the board cell under an aperture-relative coordinate, e.g. a mouse click.
    pub fn select_in_aperture(&mut self, coord: Coord) -> bool {
        let (x, y) = self.aperture_to_board(coord);
        self.move_selection((
            x.saturating_sub(self.selection.0),
            y.saturating_sub(self.selection.1),
        ))
    }

    pub fn fits_whole_board(&self) -> bool {
        self.board_size.0 <= self.aperture.0 && self.board_size.1 <= self.aperture.1
    }

    fn refit(&mut self) {
        if self.fits_whole_board() {
            self.origin = (0, 0);
        } else if self.aperture.0.min(self.aperture.1) < 2 * MARGIN + 1 {
            self.origin = self.selection;
        } else {
            self.origin = (
                scroll_axis(self.origin.0, self.selection.0, self.aperture.0),
                scroll_axis(self.origin.1, self.selection.1, self.aperture.1),
            );
        }
    }

    pub fn board_to_aperture(&self, coord: Coord) -> Coord {
        (
            coord.0.saturating_sub(self.origin.0),
            coord.1.saturating_sub(self.origin.1),
        )
    }

    pub fn aperture_to_board(&self, coord: Coord) -> Coord {
        (
            coord.0.saturating_add(self.origin.0),
            coord.1.saturating_add(self.origin.1),
        )
    }

    /// Whether a board coordinate is currently visible.
    pub fn in_aperture(&self, coord: Coord) -> bool {
        let (x, y) = self.board_to_aperture(coord);
        (0..self.aperture.0).contains(&x) && (0..self.aperture.1).contains(&y)
    }

    /// Project the board onto a minimap of `size` cells.
    ///
    /// Returns `None` when either the board or the minimap has no cells.
    pub fn minimap(&self, size: Coord) -> Option<Minimap> {
        let (mw, mh) = size;
        let (bw, bh) = self.board_size;
        if mw <= 0 || mh <= 0 || bw <= 0 || bh <= 0 {
            return None;
        }

        let scale = (f64::from(bw) / f64::from(mw), f64::from(bh) / f64::from(mh));
        let axis = |value: i32, scale: f64, limit: i32| {
            ((f64::from(value) / scale).round() as i32).clamp(0, limit - 1)
        };
        let selection = (
            axis(self.selection.0, scale.0, mw),
            axis(self.selection.1, scale.1, mh),
        );

        let mut inside = Vec::with_capacity(mw as usize * mh as usize);
        for y in 0..mh {
            for x in 0..mw {
                inside.push(self.in_aperture(Minimap::source(scale, (x, y))));
            }
        }

        Some(Minimap {
            size,
            scale,
            selection,
            inside,
        })
    }
}

/// A scaled-down overview of the board with the aperture marked on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimap {
    size: Coord,
    scale: (f64, f64),
    selection: Coord,
    inside: Vec<bool>,
}

impl Minimap {
    fn source(scale: (f64, f64), coord: Coord) -> Coord {
        (
            (f64::from(coord.0) * scale.0).round() as i32,
            (f64::from(coord.1) * scale.1).round() as i32,
        )
    }

    pub fn size(&self) -> Coord {
        self.size
    }

    /// Board cells per minimap cell along each axis.
    pub fn scale(&self) -> (f64, f64) {
        self.scale
    }

    /// The board cell a minimap cell represents.
    pub fn source_cell(&self, coord: Coord) -> Coord {
        Self::source(self.scale, coord)
    }

    /// Minimap cell holding the selection. Always exactly one cell.
    pub fn selection(&self) -> Coord {
        self.selection
    }

    /// Whether a minimap cell represents a board cell inside the aperture.
    pub fn is_inside_aperture(&self, coord: Coord) -> bool {
        let (x, y) = coord;
        if !(0..self.size.0).contains(&x) || !(0..self.size.1).contains(&y) {
            return false;
        }
        self.inside[(y * self.size.0 + x) as usize]
    }
}
