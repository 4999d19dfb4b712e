//! Perfect maze generation with a randomized recursive backtracker, and
//! depth-first solving from the top-left entrance to the bottom-right exit.
//!
//! Both algorithms report every change through an optional
//! [`Visualizer`](maze::Visualizer); without one they run headless.

pub mod app;
pub mod error;
pub mod generators;
pub mod maze;
pub mod solvers;

pub use error::{MazeError, Result};
