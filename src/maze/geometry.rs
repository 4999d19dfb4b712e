use crate::error::{MazeError, Result};
use crate::maze::Coord;

/// Placement of the maze on a character canvas.
///
/// The maze algorithms never look at this; it only tells a renderer where each
/// cell lives. Neighboring cells share their boundary line, so a cell spans
/// `cell_width + 1` columns and `cell_height + 1` rows including both edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Top-left corner of cell (0, 0)
    origin: (u16, u16),
    cell_width: u16,
    cell_height: u16,
}

/// Bounding box of a cell, edges inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x1: u16,
    pub y1: u16,
    pub x2: u16,
    pub y2: u16,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry {
            origin: (0, 0),
            cell_width: 4,
            cell_height: 2,
        }
    }
}

impl Geometry {
    pub fn new(origin: (u16, u16), cell_width: u16, cell_height: u16) -> Result<Self> {
        if cell_width == 0 || cell_height == 0 {
            return Err(MazeError::InvalidCellSize {
                width: cell_width,
                height: cell_height,
            });
        }
        Ok(Geometry {
            origin,
            cell_width,
            cell_height,
        })
    }

    pub fn origin(&self) -> (u16, u16) {
        self.origin
    }

    pub fn cell_width(&self) -> u16 {
        self.cell_width
    }

    pub fn cell_height(&self) -> u16 {
        self.cell_height
    }

    pub fn cell_rect(&self, coord: Coord) -> Rect {
        let (ox, oy) = self.origin;
        let x1 = ox.saturating_add(coord.0.saturating_mul(self.cell_width));
        let y1 = oy.saturating_add(coord.1.saturating_mul(self.cell_height));
        Rect {
            x1,
            y1,
            x2: x1.saturating_add(self.cell_width),
            y2: y1.saturating_add(self.cell_height),
        }
    }

    pub fn center(&self, coord: Coord) -> (u16, u16) {
        let rect = self.cell_rect(coord);
        (
            rect.x1 + (rect.x2 - rect.x1) / 2,
            rect.y1 + (rect.y2 - rect.y1) / 2,
        )
    }

    /// Canvas size (columns, rows) needed to draw a `cols` x `rows` maze.
    pub fn canvas_size(&self, cols: u16, rows: u16) -> (u16, u16) {
        let (ox, oy) = self.origin;
        (
            ox.saturating_add(cols.saturating_mul(self.cell_width))
                .saturating_add(1),
            oy.saturating_add(rows.saturating_mul(self.cell_height))
                .saturating_add(1),
        )
    }
}
