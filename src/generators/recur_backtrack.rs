use rand::Rng;

use crate::{
    error::{MazeError, Result},
    maze::{Coord, Maze, Phase},
};

/// Randomized depth-first carving.
///
/// Walks from `start` into a uniformly chosen uncarved neighbor, knocking down
/// the wall in between, and backs up whenever a cell has no uncarved neighbor
/// left. Every cell reachable from `start` gets carved exactly once, so the
/// passages form a spanning tree of the grid. Boundary walls are never touched.
pub fn recursive_backtrack<R: Rng>(maze: &mut Maze, start: Coord, rng: &mut R) -> Result<()> {
    maze.cell_mut(start)?.mark_carved();

    // The stack holds the current carving path, deepest cell on top
    let mut stack = vec![start];

    while let Some(&cell) = stack.last() {
        let candidates = maze
            .neighbors(cell)
            .filter(|&(_, n)| !maze[n].is_carved())
            .collect::<Vec<_>>();

        if candidates.is_empty() {
            // Dead end, this cell's walls are final
            maze.redraw(cell, Phase::Carve).map_err(|e| aborted(e, maze))?;
            stack.pop();
            continue;
        }

        let (direction, _) = candidates[rng.random_range(0..candidates.len())];
        let neighbor = maze.carve(cell, direction)?;
        maze.redraw(cell, Phase::Carve).map_err(|e| aborted(e, maze))?;

        maze.cell_mut(neighbor)?.mark_carved();
        stack.push(neighbor);
    }

    tracing::debug!(
        cols = maze.cols(),
        rows = maze.rows(),
        passages = maze.passage_count(),
        "Maze generated"
    );
    Ok(())
}

fn aborted(err: MazeError, maze: &Maze) -> MazeError {
    tracing::warn!(carved = maze.carved_count(), "Maze generation aborted");
    err
}
