use bitflags::bitflags;

bitflags! {
    /// Walls surrounding a cell. A set flag means the wall is present and impassable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Walls: u8 {
        const TOP = 0b0001;
        const RIGHT = 0b0010;
        const BOTTOM = 0b0100;
        const LEFT = 0b1000;
    }
}

/// One of the four cardinal directions on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Every direction, in the order the solver tries them.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// The wall of a cell that faces this direction.
    pub fn wall(self) -> Walls {
        match self {
            Direction::Left => Walls::LEFT,
            Direction::Right => Walls::RIGHT,
            Direction::Up => Walls::TOP,
            Direction::Down => Walls::BOTTOM,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// A single maze cell.
///
/// The generator and the solver keep separate marks, so solving never has to
/// reinterpret what generation left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    walls: Walls,
    /// Reached by the generator
    carved: bool,
    /// Explored by the solver
    visited: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            walls: Walls::all(),
            carved: false,
            visited: false,
        }
    }
}

impl Cell {
    pub fn walls(&self) -> Walls {
        self.walls
    }

    pub fn has_wall(&self, direction: Direction) -> bool {
        self.walls.contains(direction.wall())
    }

    pub fn is_carved(&self) -> bool {
        self.carved
    }

    pub fn is_visited(&self) -> bool {
        self.visited
    }

    pub(crate) fn remove_wall(&mut self, direction: Direction) {
        self.walls.remove(direction.wall());
    }

    pub(crate) fn mark_carved(&mut self) {
        self.carved = true;
    }

    pub(crate) fn mark_visited(&mut self) {
        self.visited = true;
    }

    pub(crate) fn clear_visited(&mut self) {
        self.visited = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cell_is_fully_walled() {
        let cell = Cell::default();
        assert_eq!(cell.walls(), Walls::all());
        assert!(Direction::ALL.iter().all(|&d| cell.has_wall(d)));
        assert!(!cell.is_carved());
        assert!(!cell.is_visited());
    }

    #[test]
    fn test_remove_wall_only_touches_one_side() {
        let mut cell = Cell::default();
        cell.remove_wall(Direction::Up);
        assert!(!cell.has_wall(Direction::Up));
        assert_eq!(cell.walls(), Walls::RIGHT | Walls::BOTTOM | Walls::LEFT);
        // Removing twice is a no-op
        cell.remove_wall(Direction::Up);
        assert_eq!(cell.walls(), Walls::RIGHT | Walls::BOTTOM | Walls::LEFT);
    }

    #[test]
    fn test_opposite_walls_face_each_other() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            assert_ne!(direction.wall(), direction.opposite().wall());
        }
    }
}
