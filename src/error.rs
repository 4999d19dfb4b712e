use thiserror::Error;

use crate::maze::Coord;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum MazeError {
    #[error("Maze dimensions must be at least 1x1, got {cols}x{rows}")]
    InvalidDimensions { cols: u16, rows: u16 },
    #[error("Cell size must be at least 1x1, got {width}x{height}")]
    InvalidCellSize { width: u16, height: u16 },
    #[error("Coordinate {coord:?} is out of bounds")]
    OutOfBounds { coord: Coord },
    #[error("Entrance or exit is still walled, open them before solving")]
    Sealed,
    #[error("Visualization requested to stop")]
    Aborted,
}

pub type Result<T> = core::result::Result<T, MazeError>;

impl From<MazeError> for std::io::Error {
    fn from(err: MazeError) -> Self {
        std::io::Error::other(err)
    }
}
