use rand::{SeedableRng, rngs::StdRng};

mod recur_backtrack;

pub use recur_backtrack::recursive_backtrack;

use crate::{error::Result, maze::Maze};

/// Get a random number generator, optionally seeded for reproducibility.
pub fn get_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

/// Carve a perfect maze starting from the entrance.
/// The same seed on the same dimensions always yields the same maze.
pub fn generate_maze(maze: &mut Maze, seed: Option<u64>) -> Result<()> {
    let mut rng = get_rng(seed);
    let start = maze.entrance();
    recursive_backtrack(maze, start, &mut rng)
}
