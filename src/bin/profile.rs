use std::time::Instant;

use maze_solver::{app::generate_and_solve, maze::Maze};

/// Generate and solve a large maze repeatedly, draining events without drawing them.
fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args();
    args.next(); // Skip executable name
    let num_iters = args.next().and_then(|s| s.parse::<usize>().ok()).unwrap_or(1);
    let size = args.next().and_then(|s| s.parse::<u16>().ok()).unwrap_or(u8::MAX as u16);

    let (grid_event_tx, grid_event_rx) = std::sync::mpsc::sync_channel(1000);
    let drain_thread_handle = std::thread::spawn(move || grid_event_rx.iter().count());

    let started = Instant::now();
    for i in 0..num_iters {
        let mut maze = Maze::new(size, size)?.with_visualizer(grid_event_tx.clone());
        let solution = generate_and_solve(&mut maze, Some(i as u64))?;
        tracing::info!(
            iteration = i,
            path_len = solution.path.len(),
            explored = maze.visited_count(),
            "Iteration done"
        );
    }
    drop(grid_event_tx);

    let events = drain_thread_handle.join().expect("Drain thread panicked");
    tracing::info!(
        events,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Profiling finished"
    );
    Ok(())
}
