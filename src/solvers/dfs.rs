use crate::{
    error::{MazeError, Result},
    maze::{Coord, Direction, GridEvent, Maze, MoveKind, Phase},
    solvers::Solution,
};

struct Frame {
    coord: Coord,
    /// Index into `Direction::ALL` of the next direction to try
    next: usize,
}

/// Depth-first search with backtracking.
///
/// Directions are tried in the fixed order left, right, up, down. Every entered
/// cell stays visited, so no cell is ever entered twice and the search always
/// terminates. The search stops as soon as `goal` is entered.
pub fn solve_dfs(maze: &mut Maze, start: Coord, goal: Coord) -> Result<Solution> {
    if !maze.is_in_bounds(goal) {
        return Err(MazeError::OutOfBounds { coord: goal });
    }
    enter(maze, start)?;
    if start == goal {
        return Ok(Solution {
            goal_reached: true,
            path: vec![start],
        });
    }

    let mut stack = vec![Frame {
        coord: start,
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(direction) = Direction::ALL.get(frame.next).copied() else {
            // Every direction tried, give up on this cell
            let dead_end = frame.coord;
            stack.pop();
            if let Some(parent) = stack.last() {
                maze.emit(GridEvent::Move {
                    from: parent.coord,
                    to: dead_end,
                    kind: MoveKind::Backtrack,
                })?;
            }
            continue;
        };
        frame.next += 1;
        let from = frame.coord;

        if maze[from].has_wall(direction) {
            continue;
        }
        let Some(to) = maze.neighbor(from, direction) else {
            continue;
        };
        if maze[to].is_visited() {
            continue;
        }

        maze.emit(GridEvent::Move {
            from,
            to,
            kind: MoveKind::Forward,
        })?;
        enter(maze, to)?;
        stack.push(Frame { coord: to, next: 0 });

        if to == goal {
            return Ok(Solution {
                goal_reached: true,
                path: stack.iter().map(|f| f.coord).collect(),
            });
        }
    }

    Ok(Solution::default())
}

fn enter(maze: &mut Maze, coord: Coord) -> Result<()> {
    maze.cell_mut(coord)?.mark_visited();
    maze.redraw(coord, Phase::Solve)
}
