pub mod cell;
pub mod event;
pub mod geometry;

use std::fmt;
use std::ops::ControlFlow;

pub use cell::{Cell, Direction, Walls};
pub use event::{GridEvent, MoveKind, Phase, Visualizer};
pub use geometry::{Geometry, Rect};

use crate::error::{MazeError, Result};

/// Cell coordinate as (column, row), i.e. (x, y).
pub type Coord = (u16, u16);

/// A rectangular grid of cells, every wall present until something carves it.
pub struct Maze {
    cells: Box<[Cell]>,
    cols: u16,
    rows: u16,
    geometry: Geometry,
    visualizer: Option<Box<dyn Visualizer>>,
}

impl fmt::Debug for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Maze")
            .field("cols", &self.cols)
            .field("rows", &self.rows)
            .field("geometry", &self.geometry)
            .field("headless", &self.is_headless())
            .finish()
    }
}

impl Maze {
    /// Creates a fully walled maze with `cols` columns and `rows` rows.
    pub fn new(cols: u16, rows: u16) -> Result<Self> {
        if cols == 0 || rows == 0 {
            return Err(MazeError::InvalidDimensions { cols, rows });
        }
        let cells = vec![Cell::default(); cols as usize * rows as usize].into_boxed_slice();
        Ok(Maze {
            cells,
            cols,
            rows,
            geometry: Geometry::default(),
            visualizer: None,
        })
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Attaches a visualizer and sends it the whole grid as it currently is.
    pub fn with_visualizer(mut self, visualizer: impl Visualizer + 'static) -> Self {
        self.visualizer = Some(Box::new(visualizer));
        // Nothing to abort yet, a visualizer that already hung up just sees no more events
        let _ = self.emit(GridEvent::Initial {
            cols: self.cols,
            rows: self.rows,
            geometry: self.geometry,
        });
        for y in 0..self.rows {
            for x in 0..self.cols {
                if self.redraw((x, y), Phase::Carve).is_err() {
                    return self;
                }
            }
        }
        self
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn is_headless(&self) -> bool {
        self.visualizer.is_none()
    }

    /// Top-left cell, where solving starts.
    pub fn entrance(&self) -> Coord {
        (0, 0)
    }

    /// Bottom-right cell, where solving ends.
    pub fn exit(&self) -> Coord {
        (self.cols - 1, self.rows - 1)
    }

    fn ravel_index(&self, coord: Coord) -> usize {
        coord.1 as usize * self.cols as usize + coord.0 as usize
    }

    pub fn is_in_bounds(&self, coord: Coord) -> bool {
        coord.0 < self.cols && coord.1 < self.rows
    }

    pub fn get(&self, coord: Coord) -> Option<&Cell> {
        if self.is_in_bounds(coord) {
            Some(&self.cells[self.ravel_index(coord)])
        } else {
            None
        }
    }

    pub(crate) fn cell_mut(&mut self, coord: Coord) -> Result<&mut Cell> {
        if !self.is_in_bounds(coord) {
            return Err(MazeError::OutOfBounds { coord });
        }
        let idx = self.ravel_index(coord);
        Ok(&mut self.cells[idx])
    }

    /// Adjacent coordinate in `direction`, if it lies inside the grid.
    pub fn neighbor(&self, coord: Coord, direction: Direction) -> Option<Coord> {
        if !self.is_in_bounds(coord) {
            return None;
        }
        let (x, y) = coord;
        let next = match direction {
            Direction::Left => (x.checked_sub(1)?, y),
            Direction::Right => (x.checked_add(1)?, y),
            Direction::Up => (x, y.checked_sub(1)?),
            Direction::Down => (x, y.checked_add(1)?),
        };
        self.is_in_bounds(next).then_some(next)
    }

    /// In-bounds neighbors in left, right, up, down order, walls ignored.
    pub fn neighbors(&self, coord: Coord) -> impl Iterator<Item = (Direction, Coord)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |d| self.neighbor(coord, d).map(|n| (d, n)))
    }

    /// Removes the wall between `from` and its neighbor in `direction`, on both sides.
    /// Returns the neighbor's coordinate.
    pub fn carve(&mut self, from: Coord, direction: Direction) -> Result<Coord> {
        let to = self
            .neighbor(from, direction)
            .ok_or(MazeError::OutOfBounds { coord: from })?;
        self.cell_mut(from)?.remove_wall(direction);
        self.cell_mut(to)?.remove_wall(direction.opposite());
        Ok(to)
    }

    /// Clears the entrance's top wall and the exit's bottom wall.
    /// Calling it again changes nothing.
    pub fn open_entrance_and_exit(&mut self) -> Result<()> {
        let (entrance, exit) = (self.entrance(), self.exit());
        self.cell_mut(entrance)?.remove_wall(Direction::Up);
        self.redraw(entrance, Phase::Carve)?;
        self.cell_mut(exit)?.remove_wall(Direction::Down);
        self.redraw(exit, Phase::Carve)?;
        tracing::debug!(?entrance, ?exit, "Opened entrance and exit");
        Ok(())
    }

    /// Whether the maze can be entered at the entrance and left at the exit.
    pub fn is_open(&self) -> bool {
        !self[self.entrance()].has_wall(Direction::Up)
            && !self[self.exit()].has_wall(Direction::Down)
    }

    /// Forgets everything the solver explored. Generation marks are kept.
    pub fn reset_visited(&mut self) {
        self.cells.iter_mut().for_each(Cell::clear_visited);
    }

    /// Wall state of every cell in row-major order.
    pub fn walls(&self) -> Vec<Walls> {
        self.cells.iter().map(Cell::walls).collect()
    }

    /// Number of open walls between two cells of the grid.
    pub fn passage_count(&self) -> usize {
        let mut count = 0;
        for y in 0..self.rows {
            for x in 0..self.cols {
                let cell = &self[(x, y)];
                if x + 1 < self.cols && !cell.has_wall(Direction::Right) {
                    count += 1;
                }
                if y + 1 < self.rows && !cell.has_wall(Direction::Down) {
                    count += 1;
                }
            }
        }
        count
    }

    pub fn carved_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_carved()).count()
    }

    pub fn visited_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_visited()).count()
    }

    /// Hands an event to the visualizer, if any.
    pub(crate) fn emit(&mut self, event: GridEvent) -> Result<()> {
        match &mut self.visualizer {
            Some(visualizer) => match visualizer.notify(event) {
                ControlFlow::Continue(()) => Ok(()),
                ControlFlow::Break(()) => Err(MazeError::Aborted),
            },
            None => Ok(()),
        }
    }

    pub(crate) fn redraw(&mut self, coord: Coord, phase: Phase) -> Result<()> {
        if self.is_headless() {
            return Ok(());
        }
        let walls = self[coord].walls();
        self.emit(GridEvent::Cell {
            coord,
            walls,
            phase,
        })
    }
}

impl std::ops::Index<Coord> for Maze {
    type Output = Cell;

    fn index(&self, coord: Coord) -> &Self::Output {
        if !self.is_in_bounds(coord) {
            panic!("The given coordinate is out of bounds");
        }
        &self.cells[self.ravel_index(coord)]
    }
}

impl fmt::Display for Maze {
    /// Plain ASCII drawing. Cells explored by the solver are dotted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let horizontal = |f: &mut fmt::Formatter<'_>, y: u16, direction: Direction| -> fmt::Result {
            for x in 0..self.cols {
                let edge = if self[(x, y)].has_wall(direction) {
                    "---"
                } else {
                    "   "
                };
                write!(f, "+{}", edge)?;
            }
            writeln!(f, "+")
        };

        for y in 0..self.rows {
            horizontal(f, y, Direction::Up)?;
            let left = if self[(0, y)].has_wall(Direction::Left) {
                '|'
            } else {
                ' '
            };
            write!(f, "{}", left)?;
            for x in 0..self.cols {
                let cell = &self[(x, y)];
                let body = if cell.is_visited() { " . " } else { "   " };
                let right = if cell.has_wall(Direction::Right) {
                    '|'
                } else {
                    ' '
                };
                write!(f, "{}{}", body, right)?;
            }
            writeln!(f)?;
        }
        horizontal(f, self.rows - 1, Direction::Down)
    }
}
