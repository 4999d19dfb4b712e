mod renderer;

use std::{
    io::{Stdout, Write},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, Sender, SyncSender},
    },
    thread::JoinHandle,
    time::Duration,
};

use crossterm::{
    ExecutableCommand, QueueableCommand, cursor,
    event::{self, KeyCode},
    execute, queue,
    style::{self, Attribute, Color, Stylize},
    terminal::{self, ClearType},
};

pub use renderer::{Renderer, RendererStatus, supports_geometry};

use crate::{
    error::{MazeError, Result},
    generators::generate_maze,
    maze::{Geometry, GridEvent, Maze},
    solvers::{Solution, solve_maze},
};

enum UserInputEvent {
    KeyPress(event::KeyEvent),
    Resize,
}

#[derive(Debug)]
pub enum UserActionEvent {
    /// Pause the animation
    Pause,
    /// Resume the animation
    Resume,
    /// Terminal resize
    Resize,
    /// Increase animation speed
    SpeedUp,
    /// Decrease animation speed
    SlowDown,
    /// Cancel rendering
    Cancel,
}

/// Settings for one visualizer session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Where cells land on the terminal
    pub geometry: Geometry,
    /// Seed for the maze generator. `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Time the renderer waits after drawing each grid event
    pub render_refresh_time: Duration,
    /// Maximum number of grid events buffered between the compute and render threads
    pub max_events_in_channel_buffer: usize,
    /// Timeout for receiving input events, a.k.a. how often the main loop checks if rendering is done
    pub input_recv_timeout: Duration,
    /// Timeout for polling terminal events in the input thread
    pub user_input_event_poll_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geometry: Geometry::default(),
            seed: None,
            render_refresh_time: Duration::from_millis(5),
            max_events_in_channel_buffer: 1000,
            input_recv_timeout: Duration::from_millis(100),
            user_input_event_poll_timeout: Duration::from_millis(100),
        }
    }
}

/// Carve the maze, open its entrance and exit, and solve it.
pub fn generate_and_solve(maze: &mut Maze, seed: Option<u64>) -> Result<Solution> {
    generate_maze(maze, seed)?;
    maze.open_entrance_and_exit()?;
    maze.reset_visited();
    solve_maze(maze)
}

/// Set a panic hook to restore terminal state on panic
/// This ensures that the terminal is not left in raw mode or alternate screen on panic
/// even if the panic occurs in a different thread
fn set_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal(&mut std::io::stdout()); // ignore any errors as we are already failing
        hook(panic_info);
    }));
}

/// Setup terminal in raw mode and enter alternate screen
/// Also sets a panic hook to restore terminal on panic
pub fn setup_terminal(stdout: &mut Stdout) -> std::io::Result<()> {
    terminal::enable_raw_mode()?;
    set_panic_hook();
    execute!(
        stdout,
        terminal::EnterAlternateScreen,
        terminal::Clear(ClearType::All),
        cursor::Hide,
        cursor::MoveTo(0, 0)
    )?;
    Ok(())
}

/// Restore terminal to original state
/// Leave alternate screen and disable raw mode
pub fn restore_terminal(stdout: &mut Stdout) -> std::io::Result<()> {
    execute!(stdout, terminal::LeaveAlternateScreen, cursor::Show)?;
    terminal::disable_raw_mode()?;
    Ok(())
}

/// Entry point of the visualizer.
/// `dims` skips the dimension prompt when given as (cols, rows).
pub fn run(stdout: &mut Stdout, config: Config, dims: Option<(u16, u16)>) -> std::io::Result<()> {
    if !supports_geometry(&config.geometry) {
        return Err(MazeError::InvalidCellSize {
            width: config.geometry.cell_width(),
            height: config.geometry.cell_height(),
        }
        .into());
    }

    queue!(
        stdout,
        style::SetAttribute(Attribute::Reverse),
        style::PrintStyledContent("Maze Solver\r\n".with(Color::Yellow)),
        style::SetAttribute(Attribute::NoReverse),
    )?;
    stdout.flush()?;

    let (cols, rows) = match dims {
        Some(dims) => dims,
        None => match ask_maze_dimensions(stdout, config.geometry)? {
            Some(dims) => dims,
            None => return Ok(()),
        },
    };

    queue!(
        stdout,
        style::PrintStyledContent(
            "Controls:\r\n"
                .with(Color::Yellow)
                .attribute(Attribute::Bold)
        ),
        style::PrintStyledContent("  Enter: Pause/Resume animation\r\n".with(Color::Cyan)),
        style::PrintStyledContent("  ↑/↓: Speed up/slow down animation\r\n".with(Color::Cyan)),
        style::PrintStyledContent("  Esc: Exit\r\n\r\n".with(Color::Cyan)),
        style::PrintStyledContent(
            "Press Enter to start...\r\n"
                .with(Color::Blue)
                .attribute(Attribute::Bold)
        ),
    )?;
    stdout.flush()?;
    if !wait_for_keypress(KeyCode::Enter)? {
        return Ok(());
    }
    tracing::info!(cols, rows, seed = ?config.seed, "Starting visualization");

    // Flag to indicate other threads should stop. Set to true by the main thread on Esc key event.
    let should_stop = Arc::new(AtomicBool::new(false));

    let (user_input_event_tx, user_input_event_rx) = std::sync::mpsc::channel::<UserInputEvent>();
    let should_stop_for_input = should_stop.clone();
    let poll_timeout = config.user_input_event_poll_timeout;
    // Spawn a thread to listen for user input
    let input_thread_handle = std::thread::spawn(move || -> std::io::Result<()> {
        listen_to_user_input(user_input_event_tx, poll_timeout, &should_stop_for_input)
    });

    let (grid_event_tx, grid_event_rx) =
        std::sync::mpsc::sync_channel::<GridEvent>(config.max_events_in_channel_buffer);
    let (user_action_event_tx, user_action_event_rx) =
        std::sync::mpsc::channel::<UserActionEvent>();

    // Spawn a thread to listen for grid updates and render the maze
    let should_stop_for_render = should_stop.clone();
    let render_refresh_time = config.render_refresh_time;
    let render_thread_handle = std::thread::spawn(move || {
        Renderer::new(render_refresh_time).render(
            grid_event_rx,
            user_action_event_rx,
            &should_stop_for_render,
        )
    });

    // Spawn a thread to generate the maze and solve it
    let geometry = config.geometry;
    let seed = config.seed;
    let compute_thread_handle = std::thread::spawn(move || -> Result<Solution> {
        compute(cols, rows, geometry, seed, grid_event_tx)
    });

    // Main thread loop to listen for user input events during rendering
    let completed = app_loop(
        user_input_event_rx,
        user_action_event_tx,
        config.input_recv_timeout,
        render_thread_handle,
        should_stop,
    )?;

    // Wait for input thread to finish
    input_thread_handle.join().expect("Input thread panicked")?;

    // Wait for compute thread to finish
    let outcome = compute_thread_handle
        .join()
        .expect("Compute thread panicked");

    if let RendererStatus::Cancelled = completed {
        tracing::info!("Rendering was cancelled by user.");
        return Ok(());
    }

    let msg = match outcome? {
        Solution {
            goal_reached: true,
            path,
        } => format!("Path found in {} moves! ", path.len().saturating_sub(1)),
        _ => "No path found. ".to_string(),
    };
    stdout.execute(style::PrintStyledContent(
        msg.with(Color::Green).attribute(Attribute::Bold),
    ))?;
    stdout.execute(style::PrintStyledContent(
        "Press Esc to exit...\r"
            .with(Color::Blue)
            .attribute(Attribute::Bold),
    ))?;

    wait_for_keypress(KeyCode::Esc)?;
    Ok(())
}

/// Generate and solve the maze, streaming every change to the render thread.
fn compute(
    cols: u16,
    rows: u16,
    geometry: Geometry,
    seed: Option<u64>,
    grid_event_tx: SyncSender<GridEvent>,
) -> Result<Solution> {
    let mut maze = Maze::new(cols, rows)?
        .with_geometry(geometry)
        .with_visualizer(grid_event_tx);
    let outcome = generate_and_solve(&mut maze, seed);
    if let Err(e) = &outcome {
        tracing::info!("Compute thread stopped early: {}", e);
    }
    outcome
    // Maze is dropped here, as well as the grid_event_tx sender
}

/// App loop after starting input and render threads
fn app_loop(
    user_input_event_rx: Receiver<UserInputEvent>,
    user_action_event_tx: Sender<UserActionEvent>,
    input_recv_timeout: Duration,
    render_thread_handle: JoinHandle<std::io::Result<RendererStatus>>,
    should_stop: Arc<AtomicBool>,
) -> std::io::Result<RendererStatus> {
    tracing::info!("Started main app loop");
    // Flag to indicate if the animation is currently paused
    let mut is_paused = false;
    loop {
        // Check if render is done
        if render_thread_handle.is_finished() {
            // Signal threads to stop
            should_stop.store(true, Ordering::Release);
            break;
        }

        let event = match user_input_event_rx.recv_timeout(input_recv_timeout) {
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                // Input thread has exited
                break;
            }
            Ok(UserInputEvent::KeyPress(key_event)) => match key_event.code {
                KeyCode::Esc => {
                    tracing::debug!("[app loop] Esc key pressed, notifying renderer");
                    // Only fails if the render thread has exited already
                    user_action_event_tx.send(UserActionEvent::Cancel).ok();
                    should_stop.store(true, Ordering::Release);
                    break;
                }
                KeyCode::Enter => {
                    let event = if is_paused {
                        UserActionEvent::Resume
                    } else {
                        UserActionEvent::Pause
                    };
                    is_paused = !is_paused;
                    Some(event)
                }
                KeyCode::Up => Some(UserActionEvent::SpeedUp),
                KeyCode::Down => Some(UserActionEvent::SlowDown),
                _ => None,
            },
            Ok(UserInputEvent::Resize) => Some(UserActionEvent::Resize),
        };

        if let Some(event) = event
            && user_action_event_tx.send(event).is_err()
        {
            // Render thread has exited
            break;
        }
    }
    // Dropping the sender lets a paused renderer notice the loop is gone
    drop(user_action_event_tx);
    tracing::info!("Exiting main app loop");

    render_thread_handle.join().expect("Render thread panicked")
}

/// Listen for user input events (key presses and resize)
/// This function runs in a separate thread, and is the only place where user input is read
fn listen_to_user_input(
    user_input_event_tx: Sender<UserInputEvent>,
    event_poll_timeout: Duration,
    should_stop: &AtomicBool,
) -> std::io::Result<()> {
    loop {
        if should_stop.load(Ordering::Acquire) {
            return Ok(());
        }

        if !event::poll(event_poll_timeout)? {
            continue;
        }

        let input_event = match event::read()? {
            event::Event::Key(key_event) if key_event.kind == event::KeyEventKind::Press => {
                UserInputEvent::KeyPress(key_event)
            }
            event::Event::Resize(_, _) => UserInputEvent::Resize,
            _ => continue,
        };

        let should_exit = matches!(
            input_event,
            UserInputEvent::KeyPress(event::KeyEvent {
                code: KeyCode::Esc,
                ..
            })
        );

        if user_input_event_tx.send(input_event).is_err() {
            // Receiver has been dropped, exit the thread
            return Ok(());
        }

        if should_exit {
            tracing::debug!("[input loop] Esc key pressed, exiting");
            return Ok(());
        }
    }
}

/// Block until `key` is pressed.
/// Returns false if the user pressed Esc while waiting for another key.
fn wait_for_keypress(key: KeyCode) -> std::io::Result<bool> {
    loop {
        if let event::Event::Key(event::KeyEvent { code, kind, .. }) = event::read()?
            && kind == event::KeyEventKind::Press
        {
            if code == key {
                return Ok(true);
            }
            if code == KeyCode::Esc {
                return Ok(false);
            }
        }
    }
}

/// Get user input with real-time validation and feedback
/// Returns None if user cancels input with Esc
/// Returns Some(T) if user inputs a valid input and presses Enter, where T is the validated type
fn prompt_with_validation<F, T>(
    stdout: &mut Stdout,
    prompt: &str,
    validate: F,
) -> std::io::Result<Option<T>>
where
    F: Fn(&str) -> std::result::Result<T, String>,
{
    // Save cursor position so we can restore / redraw
    queue!(stdout, cursor::Hide, cursor::SavePosition)?;
    stdout.flush()?;

    let mut input = String::new();

    let value = loop {
        queue!(
            stdout,
            cursor::RestorePosition,
            terminal::Clear(ClearType::FromCursorDown)
        )?;
        stdout.queue(style::PrintStyledContent(
            prompt.with(Color::Cyan).attribute(Attribute::Bold),
        ))?;

        // Green while the input is acceptable, red otherwise
        let validation_result = validate(input.trim());
        let color = if validation_result.is_ok() {
            Color::Green
        } else {
            Color::Red
        };
        queue!(
            stdout,
            style::SetForegroundColor(color),
            style::Print(&input),
            style::ResetColor,
            style::Print(" \r\n")
        )?;

        if let Err(msg) = validation_result {
            stdout.queue(style::PrintStyledContent(
                msg.with(Color::DarkGrey).attribute(Attribute::Dim),
            ))?;
        }
        stdout.flush()?;

        if let event::Event::Key(event::KeyEvent { code, kind, .. }) = event::read()? {
            if kind != event::KeyEventKind::Press {
                continue;
            }
            match code {
                KeyCode::Enter => {
                    if let Ok(n) = validate(input.trim()) {
                        break Some(n);
                    }
                }
                KeyCode::Char(c) if !c.is_whitespace() && !c.is_control() => input.push(c),
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Esc => break None,
                _ => {}
            }
        }
    };

    queue!(
        stdout,
        cursor::RestorePosition,
        terminal::Clear(ClearType::FromCursorDown),
        cursor::Show
    )?;
    stdout.flush()?;

    Ok(value)
}

/// Largest number of cells that fit in `available` terminal columns or rows.
fn max_cells(available: u16, origin: u16, cell_size: u16) -> u16 {
    // One extra line for the closing edge
    available.saturating_sub(origin).saturating_sub(1) / cell_size.max(1)
}

/// Parse one maze dimension, an empty input meaning "as large as fits".
fn parse_dimension(s: &str, max_size: u16) -> std::result::Result<u16, String> {
    if max_size == 0 {
        return Err("The terminal is too small to fit even a single cell.".to_string());
    }
    if s.is_empty() {
        return Ok(max_size);
    }
    let error_msg = format!("Please enter a valid number between 1 and {}.", max_size);
    match s.parse::<u16>() {
        Ok(n) if (1..=max_size).contains(&n) => Ok(n),
        _ => Err(error_msg),
    }
}

/// Ask user for maze dimensions, bounded by what fits in the terminal
/// Returns None if user cancels input with Esc
/// Returns Some((cols, rows)) if user inputs valid dimensions
fn ask_maze_dimensions(
    stdout: &mut Stdout,
    geometry: Geometry,
) -> std::io::Result<Option<(u16, u16)>> {
    stdout.execute(style::PrintStyledContent(
        "Enter maze dimensions, or press Esc to exit. \
Leave empty to fill the current terminal.\r\n"
            .with(Color::Blue),
    ))?;

    let validate = |s: &str, is_width: bool| {
        let (origin_x, origin_y) = geometry.origin();
        let max_size = match terminal::size() {
            Ok((term_width, _)) if is_width => {
                max_cells(term_width, origin_x, geometry.cell_width())
            }
            // Reserve rows for the status line
            Ok((_, term_height)) => max_cells(
                term_height.saturating_sub(renderer::NUM_STATUS_ROWS),
                origin_y,
                geometry.cell_height(),
            ),
            // Fallback if terminal size cannot be determined
            Err(_) => u8::MAX as u16,
        };
        parse_dimension(s, max_size)
    };

    let cols = match prompt_with_validation(stdout, "Columns: ", |s| validate(s, true))? {
        Some(c) => c,
        None => return Ok(None),
    };
    stdout.execute(style::PrintStyledContent(
        format!("Columns set to {}\r\n", cols)
            .with(Color::Green)
            .attribute(Attribute::Bold),
    ))?;

    let rows = match prompt_with_validation(stdout, "Rows: ", |s| validate(s, false))? {
        Some(r) => r,
        None => return Ok(None),
    };
    stdout.execute(style::PrintStyledContent(
        format!("Rows set to {}\r\n", rows)
            .with(Color::Green)
            .attribute(Attribute::Bold),
    ))?;

    Ok(Some((cols, rows)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_cells_leaves_room_for_closing_edge() {
        assert_eq!(max_cells(81, 0, 4), 20);
        assert_eq!(max_cells(80, 0, 4), 19);
        assert_eq!(max_cells(10, 2, 2), 3);
        assert_eq!(max_cells(0, 0, 4), 0);
    }

    #[test]
    fn test_parse_dimension() {
        assert_eq!(parse_dimension("", 12), Ok(12));
        assert_eq!(parse_dimension("5", 12), Ok(5));
        assert!(parse_dimension("0", 12).is_err());
        assert!(parse_dimension("13", 12).is_err());
        assert!(parse_dimension("abc", 12).is_err());
        assert!(parse_dimension("", 0).is_err());
    }

    #[test]
    fn test_compute_streams_every_phase() {
        let (tx, rx) = std::sync::mpsc::sync_channel(100_000);
        let solution = compute(4, 3, Geometry::default(), Some(5), tx).unwrap();
        assert!(solution.goal_reached);

        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(
            events.first(),
            Some(GridEvent::Initial { cols: 4, rows: 3, .. })
        ));
        assert!(events.iter().any(|e| matches!(
            e,
            GridEvent::Cell {
                phase: crate::maze::Phase::Solve,
                ..
            }
        )));
        assert!(events.iter().any(|e| matches!(e, GridEvent::Move { .. })));
    }

    #[test]
    fn test_compute_stops_when_renderer_is_gone() {
        let (tx, rx) = std::sync::mpsc::sync_channel(16);
        drop(rx);
        assert_eq!(
            compute(4, 4, Geometry::default(), Some(1), tx),
            Err(crate::MazeError::Aborted)
        );
    }

    #[test]
    fn test_generate_and_solve_headless() {
        let mut maze = Maze::new(10, 7).unwrap();
        let solution = generate_and_solve(&mut maze, Some(42)).unwrap();
        assert!(solution.goal_reached);
        assert_eq!(solution.path.first(), Some(&(0, 0)));
        assert_eq!(solution.path.last(), Some(&(9, 6)));
        assert!(maze.is_open());
    }
}
