use std::collections::{HashSet, VecDeque};
use std::sync::mpsc;

use maze_solver::{
    MazeError,
    app::generate_and_solve,
    generators::generate_maze,
    maze::{Direction, GridEvent, Maze, MoveKind, Phase, Walls},
    solvers::solve_maze,
};

const SIZES: [(u16, u16); 7] = [(1, 1), (2, 1), (1, 5), (2, 2), (3, 3), (7, 4), (16, 9)];

fn generated(cols: u16, rows: u16, seed: u64) -> Maze {
    let mut maze = Maze::new(cols, rows).unwrap();
    generate_maze(&mut maze, Some(seed)).unwrap();
    maze
}

/// Cells reachable from (0, 0) through open walls.
fn reachable(maze: &Maze) -> usize {
    let mut seen = HashSet::from([(0, 0)]);
    let mut queue = VecDeque::from([(0, 0)]);
    while let Some(coord) = queue.pop_front() {
        for (direction, next) in maze.neighbors(coord) {
            if !maze[coord].has_wall(direction) && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen.len()
}

fn boundary_intact(maze: &Maze) -> bool {
    (0..maze.rows()).all(|y| {
        (0..maze.cols()).all(|x| {
            Direction::ALL
                .iter()
                .filter(|&&d| maze.neighbor((x, y), d).is_none())
                .all(|&d| maze[(x, y)].has_wall(d))
        })
    })
}

#[test]
fn test_generated_maze_is_a_spanning_tree() {
    for (cols, rows) in SIZES {
        for seed in 0..10 {
            let maze = generated(cols, rows, seed);
            let cells = cols as usize * rows as usize;
            // Connected with exactly n - 1 edges means no cycles
            assert_eq!(maze.passage_count(), cells - 1, "{cols}x{rows} seed {seed}");
            assert_eq!(reachable(&maze), cells, "{cols}x{rows} seed {seed}");
            assert_eq!(maze.carved_count(), cells);
        }
    }
}

#[test]
fn test_walls_are_symmetric() {
    for seed in 0..10 {
        let maze = generated(9, 6, seed);
        for y in 0..maze.rows() {
            for x in 0..maze.cols() {
                for (direction, neighbor) in maze.neighbors((x, y)) {
                    assert_eq!(
                        maze[(x, y)].has_wall(direction),
                        maze[neighbor].has_wall(direction.opposite()),
                        "({x}, {y}) {direction:?} seed {seed}"
                    );
                }
            }
        }
    }
}

#[test]
fn test_generation_keeps_the_boundary_closed() {
    for (cols, rows) in SIZES {
        assert!(boundary_intact(&generated(cols, rows, 3)));
    }
}

#[test]
fn test_same_seed_same_maze() {
    for (cols, rows) in SIZES {
        assert_eq!(
            generated(cols, rows, 1234).walls(),
            generated(cols, rows, 1234).walls()
        );
    }
}

#[test]
fn test_two_by_two_is_reproducible_and_seed_sensitive() {
    let seed = 2024;
    let first = generated(2, 2, seed).walls();
    assert_eq!(first, generated(2, 2, seed).walls());

    // A 2x2 grid only has a handful of spanning trees, so look at a run of seeds
    let distinct = (seed..seed + 16)
        .map(|s| generated(2, 2, s).walls())
        .collect::<HashSet<Vec<Walls>>>();
    assert!(distinct.len() > 1);
    assert_ne!(generated(20, 20, seed).walls(), generated(20, 20, seed + 1).walls());
}

#[test]
fn test_entrance_and_exit_only_touch_their_own_walls() {
    let mut maze = generated(6, 5, 8);
    let before = maze.walls();
    maze.open_entrance_and_exit().unwrap();
    let after = maze.walls();

    assert!(!maze[(0, 0)].has_wall(Direction::Up));
    assert!(!maze[(5, 4)].has_wall(Direction::Down));
    let changed: Vec<usize> = (0..before.len()).filter(|&i| before[i] != after[i]).collect();
    assert_eq!(changed, vec![0, before.len() - 1]);
    assert_eq!(before[0] - after[0], Walls::TOP);
    assert_eq!(before[29] - after[29], Walls::BOTTOM);
}

#[test]
fn test_every_generated_maze_is_solvable() {
    for (cols, rows) in SIZES {
        for seed in 0..10 {
            let mut maze = Maze::new(cols, rows).unwrap();
            let solution = generate_and_solve(&mut maze, Some(seed)).unwrap();
            assert!(solution.goal_reached, "{cols}x{rows} seed {seed}");
            assert_eq!(solution.path.first(), Some(&maze.entrance()));
            assert_eq!(solution.path.last(), Some(&maze.exit()));
            // Consecutive path cells are joined by an open wall
            for pair in solution.path.windows(2) {
                let (direction, _) = maze
                    .neighbors(pair[0])
                    .find(|&(_, n)| n == pair[1])
                    .expect("path cells must be adjacent");
                assert!(!maze[pair[0]].has_wall(direction));
            }
        }
    }
}

#[test]
fn test_visited_cells_only_grow() {
    let (tx, rx) = mpsc::channel();
    let mut maze = Maze::new(12, 8).unwrap().with_visualizer(tx);
    let solution = generate_and_solve(&mut maze, Some(77)).unwrap();
    assert!(solution.goal_reached);

    let mut entered = Vec::new();
    let mut forward = 0;
    let mut backtracked = 0;
    for event in rx.try_iter() {
        match event {
            GridEvent::Cell {
                coord,
                phase: Phase::Solve,
                ..
            } => entered.push(coord),
            GridEvent::Move {
                kind: MoveKind::Forward,
                ..
            } => forward += 1,
            GridEvent::Move {
                kind: MoveKind::Backtrack,
                ..
            } => backtracked += 1,
            _ => {}
        }
    }

    // No cell is entered twice, and all of them are still marked at the end
    let unique: HashSet<_> = entered.iter().copied().collect();
    assert_eq!(unique.len(), entered.len());
    assert_eq!(maze.visited_count(), entered.len());
    assert!(entered.iter().all(|&c| maze[c].is_visited()));
    assert!(solution.path.iter().all(|&c| maze[c].is_visited()));
    // Every undone step was taken first, and what remains is the path
    assert_eq!(forward - backtracked, solution.forward_moves());
}

#[test]
fn test_single_cell_maze() {
    let mut maze = Maze::new(1, 1).unwrap();
    generate_maze(&mut maze, Some(0)).unwrap();
    assert!(maze[(0, 0)].is_carved());
    assert_eq!(maze.passage_count(), 0);

    maze.open_entrance_and_exit().unwrap();
    assert_eq!(maze[(0, 0)].walls(), Walls::LEFT | Walls::RIGHT);

    maze.reset_visited();
    let solution = solve_maze(&mut maze).unwrap();
    assert!(solution.goal_reached);
    assert_eq!(solution.path, vec![(0, 0)]);
    assert_eq!(solution.forward_moves(), 0);
}

#[test]
fn test_three_by_three_path_length() {
    for seed in 0..25 {
        let mut maze = Maze::new(3, 3).unwrap();
        let solution = generate_and_solve(&mut maze, Some(seed)).unwrap();
        assert!(solution.goal_reached);
        // Manhattan distance from corner to corner is 4, a path never revisits a cell
        assert!(
            (4..=8).contains(&solution.forward_moves()),
            "seed {seed}: {} moves",
            solution.forward_moves()
        );
    }
}

#[test]
fn test_solving_a_sealed_maze_is_refused() {
    let mut maze = generated(4, 4, 9);
    assert_eq!(solve_maze(&mut maze), Err(MazeError::Sealed));
    assert_eq!(maze.visited_count(), 0);
}

#[test]
fn test_hand_built_maze_without_route() {
    // Two disconnected halves
    let mut maze = Maze::new(2, 2).unwrap();
    maze.carve((0, 0), Direction::Right).unwrap();
    maze.carve((0, 1), Direction::Right).unwrap();
    maze.open_entrance_and_exit().unwrap();

    let solution = solve_maze(&mut maze).unwrap();
    assert!(!solution.goal_reached);
    assert!(solution.path.is_empty());
    assert_eq!(maze.visited_count(), 2);
}

#[test]
fn test_zero_sized_maze_is_rejected() {
    assert_eq!(
        Maze::new(0, 0).unwrap_err(),
        MazeError::InvalidDimensions { cols: 0, rows: 0 }
    );
}
