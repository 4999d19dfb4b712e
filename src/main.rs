use std::{path::PathBuf, time::Duration};

use clap::Parser;
use maze_solver::{
    app::{self, Config},
    maze::{Geometry, Maze},
};
use tracing_subscriber::EnvFilter;

/// Generate a perfect maze and watch a depth-first search find its way out.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of columns. Asked interactively when omitted together with --rows.
    #[arg(long, requires = "rows")]
    cols: Option<u16>,

    /// Number of rows. Asked interactively when omitted together with --cols.
    #[arg(long, requires = "cols")]
    rows: Option<u16>,

    /// Random seed, for reproducible mazes
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the animation and print the solved maze
    #[arg(long)]
    headless: bool,

    /// Terminal columns per cell
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(2..))]
    cell_width: u16,

    /// Terminal rows per cell
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u16).range(2..))]
    cell_height: u16,

    /// Pause after each drawn step, in microseconds
    #[arg(long, default_value_t = 5000)]
    refresh_micros: u64,

    /// Where to write logs while the terminal is taken over
    #[arg(long, default_value = "maze-solver.log")]
    log_file: PathBuf,
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();

    if args.headless {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
        return run_headless(&args);
    }

    // The terminal is in raw mode while animating, so logs go to a file
    let directory = args
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = args
        .log_file
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("maze-solver.log"));
    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    let config = Config {
        geometry: Geometry::new((0, 0), args.cell_width, args.cell_height)?,
        seed: args.seed,
        render_refresh_time: Duration::from_micros(args.refresh_micros),
        ..Config::default()
    };
    let dims = match (args.cols, args.rows) {
        (Some(cols), Some(rows)) => {
            // Fail before taking over the terminal
            Maze::new(cols, rows)?;
            Some((cols, rows))
        }
        _ => None,
    };

    let mut stdout = std::io::stdout();
    app::setup_terminal(&mut stdout)?;
    let result = app::run(&mut stdout, config, dims);
    app::restore_terminal(&mut stdout)?;
    if let Err(e) = &result {
        tracing::error!("Visualizer failed: {}", e);
    }
    result
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn run_headless(args: &Args) -> std::io::Result<()> {
    let mut maze = Maze::new(args.cols.unwrap_or(20), args.rows.unwrap_or(10))?;
    let solution = app::generate_and_solve(&mut maze, args.seed)?;
    print!("{}", maze);
    if solution.goal_reached {
        println!("Path found in {} moves.", solution.forward_moves());
    } else {
        println!("No path found.");
    }
    tracing::info!(
        explored = maze.visited_count(),
        path_len = solution.path.len(),
        "Headless run finished"
    );
    Ok(())
}
