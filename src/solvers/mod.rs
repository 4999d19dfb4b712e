mod dfs;

pub use dfs::solve_dfs;

use crate::{
    error::{MazeError, Result},
    maze::{Coord, Maze},
};

/// Outcome of a search from the entrance to the exit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Solution {
    pub goal_reached: bool,
    /// Cells from the entrance to the exit, both included. Empty when the goal was not reached.
    pub path: Vec<Coord>,
}

impl Solution {
    /// Number of steps taken along the final path, backtracked steps not counted.
    pub fn forward_moves(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Solve the maze from its entrance to its exit.
///
/// Fails with `MazeError::Sealed` if the entrance or exit was never opened.
/// A maze without any route to the exit is not an error: check
/// `Solution::goal_reached`.
pub fn solve_maze(maze: &mut Maze) -> Result<Solution> {
    if !maze.is_open() {
        return Err(MazeError::Sealed);
    }
    let (start, goal) = (maze.entrance(), maze.exit());
    let solution = solve_dfs(maze, start, goal)?;
    tracing::debug!(
        goal_reached = solution.goal_reached,
        path_len = solution.path.len(),
        explored = maze.visited_count(),
        "Maze solved"
    );
    Ok(solution)
}
