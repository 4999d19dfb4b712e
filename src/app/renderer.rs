use std::{
    io::{Stdout, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Receiver,
    },
    time::Duration,
};

use crossterm::{
    QueueableCommand, cursor, queue,
    style::{self, Attribute, Color, Stylize},
    terminal::{self, ClearType},
};
use unicode_truncate::UnicodeTruncateStr;

use crate::{
    app::UserActionEvent,
    error::MazeError,
    maze::{Coord, Geometry, GridEvent, MoveKind, Phase, Walls},
};

/// Terminal rows kept below the maze for the status line
pub const NUM_STATUS_ROWS: u16 = 1;
/// Smallest cell width or height that leaves room for an interior between two edges
pub const MIN_CELL_SIZE: u16 = 2;
const MIN_REFRESH_TIME: Duration = Duration::from_micros(50);
const MAX_REFRESH_TIME: Duration = Duration::from_millis(500);

const CORNER: char = '+';
const WALL_HORIZONTAL: char = '-';
const WALL_VERTICAL: char = '|';
const MOVE_HORIZONTAL: char = '─';
const MOVE_VERTICAL: char = '│';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererStatus {
    Completed,
    Cancelled,
}

/// What the renderer knows about the grid being drawn.
struct Canvas {
    cols: u16,
    rows: u16,
    geometry: Geometry,
    /// Last known walls of every cell, so the maze can be redrawn after a resize
    walls: Vec<Walls>,
    /// Every move drawn so far, in order
    moves: Vec<(Coord, Coord, MoveKind)>,
}

impl Canvas {
    fn size(&self) -> (u16, u16) {
        self.geometry.canvas_size(self.cols, self.rows)
    }
}

/// Whether cells of this size can be drawn with walls on all four sides.
pub fn supports_geometry(geometry: &Geometry) -> bool {
    geometry.cell_width() >= MIN_CELL_SIZE && geometry.cell_height() >= MIN_CELL_SIZE
}

pub struct Renderer<W: Write = Stdout> {
    /// Where drawing commands go, the terminal outside of tests
    out: W,
    canvas: Option<Canvas>,
    /// Time to wait after each drawn event
    render_refresh_time: Duration,
    /// Latest phase seen, shown in the status line
    phase: Option<Phase>,
    paused: bool,
}

impl Renderer<Stdout> {
    pub fn new(render_refresh_time: Duration) -> Self {
        Self::with_writer(std::io::stdout(), render_refresh_time)
    }
}

impl<W: Write> Renderer<W> {
    pub fn with_writer(out: W, render_refresh_time: Duration) -> Self {
        #[cfg(debug_assertions)]
        {
            use unicode_width::UnicodeWidthChar;
            for glyph in [
                CORNER,
                WALL_HORIZONTAL,
                WALL_VERTICAL,
                MOVE_HORIZONTAL,
                MOVE_VERTICAL,
            ] {
                assert_eq!(
                    glyph.width(),
                    Some(1),
                    "Each glyph must occupy exactly one character width."
                );
            }
        }

        Self {
            out,
            canvas: None,
            render_refresh_time: render_refresh_time.clamp(MIN_REFRESH_TIME, MAX_REFRESH_TIME),
            phase: None,
            paused: false,
        }
    }

    /// Render loop that processes events from the user action and grid event channels
    /// Returns Ok(Completed) once the grid event channel is closed
    /// Returns Ok(Cancelled) if the user cancelled rendering
    /// Returns Err if there was an I/O error
    pub fn render(
        &mut self,
        grid_event_rx: Receiver<GridEvent>,
        user_action_event_rx: Receiver<UserActionEvent>,
        should_stop: &AtomicBool,
    ) -> std::io::Result<RendererStatus> {
        queue!(self.out, terminal::Clear(ClearType::All), cursor::Hide)?;
        self.out.flush()?;

        loop {
            // Drain pending user actions without blocking
            while let Ok(action) = user_action_event_rx.try_recv() {
                if let Some(status) = self.handle_user_action(action, &user_action_event_rx)? {
                    return Ok(status);
                }
            }

            // Block while paused until something other than a pause comes in
            while self.paused {
                match user_action_event_rx.recv() {
                    Ok(action) => {
                        if let Some(status) =
                            self.handle_user_action(action, &user_action_event_rx)?
                        {
                            return Ok(status);
                        }
                    }
                    // App loop is gone, nobody can resume us
                    Err(_) => return Ok(RendererStatus::Cancelled),
                }
            }

            if should_stop.load(Ordering::Acquire) {
                return Ok(RendererStatus::Cancelled);
            }

            match grid_event_rx.recv() {
                Err(_) => {
                    // Channel disconnected, compute thread is done
                    break;
                }
                Ok(event) => {
                    if !self.render_grid_event(&event, &user_action_event_rx)? {
                        return Ok(RendererStatus::Cancelled);
                    }
                    std::thread::sleep(self.render_refresh_time);
                }
            }
        }

        // Move cursor below the maze after exiting
        let below = self.canvas.as_ref().map_or(0, |c| c.size().1);
        queue!(self.out, cursor::MoveTo(0, below), cursor::Show)?;
        self.out.flush()?;
        tracing::debug!("[render] grid event channel closed, rendering completed");
        Ok(RendererStatus::Completed)
    }

    /// Apply a user action. Returns a status when rendering has to stop.
    fn handle_user_action(
        &mut self,
        action: UserActionEvent,
        user_action_event_rx: &Receiver<UserActionEvent>,
    ) -> std::io::Result<Option<RendererStatus>> {
        tracing::debug!("Received user action event: {:?}", action);
        match action {
            UserActionEvent::Cancel => return Ok(Some(RendererStatus::Cancelled)),
            UserActionEvent::Pause => self.paused = true,
            UserActionEvent::Resume => self.paused = false,
            UserActionEvent::SpeedUp => {
                self.render_refresh_time =
                    (self.render_refresh_time / 2).max(MIN_REFRESH_TIME);
            }
            UserActionEvent::SlowDown => {
                self.render_refresh_time =
                    (self.render_refresh_time * 2).min(MAX_REFRESH_TIME);
            }
            UserActionEvent::Resize => {
                if !self.ensure_fits(user_action_event_rx)? {
                    return Ok(Some(RendererStatus::Cancelled));
                }
                self.redraw_all()?;
            }
        }
        self.draw_status()?;
        Ok(None)
    }

    /// Draw a single grid event.
    /// Returns Ok(false) if the user gave up waiting for a large enough terminal.
    fn render_grid_event(
        &mut self,
        event: &GridEvent,
        user_action_event_rx: &Receiver<UserActionEvent>,
    ) -> std::io::Result<bool> {
        match *event {
            GridEvent::Initial { .. } => {
                self.draw_event(event)?;
                if !self.ensure_fits(user_action_event_rx)? {
                    return Ok(false);
                }
                queue!(self.out, terminal::Clear(ClearType::All))?;
            }
            GridEvent::Cell { phase, .. } => {
                if self.phase != Some(phase) {
                    self.phase = Some(phase);
                    self.draw_status()?;
                }
                self.draw_event(event)?;
            }
            GridEvent::Move { .. } => self.draw_event(event)?,
        }
        self.out.flush()?;
        Ok(true)
    }

    /// Record a grid event on the canvas and draw it, without touching the status line.
    fn draw_event(&mut self, event: &GridEvent) -> std::io::Result<()> {
        match *event {
            GridEvent::Initial {
                cols,
                rows,
                geometry,
            } => {
                if !supports_geometry(&geometry) {
                    return Err(MazeError::InvalidCellSize {
                        width: geometry.cell_width(),
                        height: geometry.cell_height(),
                    }
                    .into());
                }
                self.canvas = Some(Canvas {
                    cols,
                    rows,
                    geometry,
                    walls: vec![Walls::all(); cols as usize * rows as usize],
                    moves: Vec::new(),
                });
                Ok(())
            }
            GridEvent::Cell {
                coord,
                walls,
                phase,
            } => {
                if let Some(canvas) = &mut self.canvas {
                    let idx = coord.1 as usize * canvas.cols as usize + coord.0 as usize;
                    if let Some(slot) = canvas.walls.get_mut(idx) {
                        *slot = walls;
                    }
                }
                self.draw_cell(coord, walls, phase)
            }
            GridEvent::Move { from, to, kind } => {
                if let Some(canvas) = &mut self.canvas {
                    canvas.moves.push((from, to, kind));
                }
                self.draw_move(from, to, kind)
            }
        }
    }

    fn geometry(&self) -> Option<Geometry> {
        self.canvas.as_ref().map(|c| c.geometry)
    }

    /// Draw the four edges of a cell. The inside is left alone so move lines survive.
    /// While solving, walls only ever stay put, so open edges are skipped too:
    /// a move line crosses the shared edge of the two cells it joins.
    fn draw_cell(&mut self, coord: Coord, walls: Walls, phase: Phase) -> std::io::Result<()> {
        let Some(geometry) = self.geometry() else {
            return Ok(());
        };
        let color = match phase {
            Phase::Carve => Color::White,
            Phase::Solve => Color::Grey,
        };
        let rect = geometry.cell_rect(coord);

        let paint_open = phase == Phase::Carve;

        for (y, wall) in [(rect.y1, Walls::TOP), (rect.y2, Walls::BOTTOM)] {
            let glyph = match walls.contains(wall) {
                true => WALL_HORIZONTAL,
                false if paint_open => ' ',
                false => continue,
            };
            for x in rect.x1 + 1..rect.x2 {
                self.put(x, y, glyph, color)?;
            }
        }
        for (x, wall) in [(rect.x1, Walls::LEFT), (rect.x2, Walls::RIGHT)] {
            let glyph = match walls.contains(wall) {
                true => WALL_VERTICAL,
                false if paint_open => ' ',
                false => continue,
            };
            for y in rect.y1 + 1..rect.y2 {
                self.put(x, y, glyph, color)?;
            }
        }
        for (x, y) in [
            (rect.x1, rect.y1),
            (rect.x2, rect.y1),
            (rect.x1, rect.y2),
            (rect.x2, rect.y2),
        ] {
            self.put(x, y, CORNER, Color::DarkGrey)?;
        }
        Ok(())
    }

    /// Draw the segment between two cell centers.
    fn draw_move(&mut self, from: Coord, to: Coord, kind: MoveKind) -> std::io::Result<()> {
        let Some(geometry) = self.geometry() else {
            return Ok(());
        };
        let color = match kind {
            MoveKind::Forward => Color::Red,
            MoveKind::Backtrack => Color::DarkGrey,
        };
        let (x1, y1) = geometry.center(from);
        let (x2, y2) = geometry.center(to);
        if y1 == y2 {
            for x in x1.min(x2)..=x1.max(x2) {
                self.put(x, y1, MOVE_HORIZONTAL, color)?;
            }
        } else {
            for y in y1.min(y2)..=y1.max(y2) {
                self.put(x1, y, MOVE_VERTICAL, color)?;
            }
        }
        Ok(())
    }

    fn put(&mut self, x: u16, y: u16, glyph: char, color: Color) -> std::io::Result<()> {
        queue!(
            self.out,
            cursor::MoveTo(x, y),
            style::PrintStyledContent(glyph.with(color))
        )
    }

    /// Repaint every cell and then every move drawn so far, in the order they were drawn.
    fn redraw_all(&mut self) -> std::io::Result<()> {
        let Some(canvas) = &self.canvas else {
            return Ok(());
        };
        let cols = canvas.cols;
        let cells = canvas.walls.clone();
        let moves = canvas.moves.clone();
        self.out.queue(terminal::Clear(ClearType::All))?;
        for (idx, walls) in cells.into_iter().enumerate() {
            let coord = ((idx % cols as usize) as u16, (idx / cols as usize) as u16);
            self.draw_cell(coord, walls, Phase::Carve)?;
        }
        for (from, to, kind) in moves {
            self.draw_move(from, to, kind)?;
        }
        self.out.flush()
    }

    fn draw_status(&mut self) -> std::io::Result<()> {
        let Some(canvas) = &self.canvas else {
            return Ok(());
        };
        let row = canvas.size().1;
        let (term_width, _) = terminal::size()?;
        let phase = match self.phase {
            Some(Phase::Carve) | None => "Generating",
            Some(Phase::Solve) => "Solving",
        };
        let state = if self.paused { " (paused)" } else { "" };
        let status = format!(
            "{}{} | {}x{} | {}µs per step",
            phase,
            state,
            canvas.cols,
            canvas.rows,
            self.render_refresh_time.as_micros()
        );
        let (status, _) = status.unicode_truncate(term_width as usize);
        queue!(
            self.out,
            cursor::MoveTo(0, row),
            terminal::Clear(ClearType::CurrentLine),
            style::PrintStyledContent(status.with(Color::Yellow).attribute(Attribute::Bold))
        )?;
        self.out.flush()
    }

    /// Wait until the terminal is large enough for the canvas and status line.
    /// Returns Ok(false) if the user cancelled instead of resizing.
    fn ensure_fits(
        &mut self,
        user_action_event_rx: &Receiver<UserActionEvent>,
    ) -> std::io::Result<bool> {
        let Some(canvas) = &self.canvas else {
            return Ok(true);
        };
        let (width, height) = canvas.size();
        let height = height.saturating_add(NUM_STATUS_ROWS);
        loop {
            let (term_width, term_height) = terminal::size()?;
            if term_width >= width && term_height >= height {
                return Ok(true);
            }
            tracing::debug!(
                term_width,
                term_height,
                width,
                height,
                "Terminal too small for the maze"
            );
            let msg = format!(
                "Terminal size is too small ({}x{}) for the maze ({}x{}). Please resize the terminal.\r\n",
                term_width, term_height, width, height
            );
            queue!(
                self.out,
                terminal::Clear(ClearType::All),
                cursor::MoveTo(0, 0),
                style::PrintStyledContent(msg.with(Color::Yellow).attribute(Attribute::Bold)),
                style::PrintStyledContent(
                    "Press Esc to exit...\r\n"
                        .with(Color::Blue)
                        .attribute(Attribute::Bold)
                )
            )?;
            self.out.flush()?;

            // Only a resize is worth checking again
            loop {
                match user_action_event_rx.recv() {
                    Ok(UserActionEvent::Resize) => break,
                    Ok(UserActionEvent::Cancel) | Err(_) => return Ok(false),
                    Ok(_) => continue,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{app::generate_and_solve, maze::Maze};

    /// Replays cursor moves and printed glyphs into a character grid, ignoring styling.
    fn screen(bytes: &[u8]) -> HashMap<(u16, u16), char> {
        let text = String::from_utf8_lossy(bytes);
        let mut chars = text.chars();
        let mut cursor = (0u16, 0u16);
        let mut screen = HashMap::new();
        while let Some(c) = chars.next() {
            if c != '\x1b' {
                screen.insert(cursor, c);
                cursor.0 += 1;
                continue;
            }
            if chars.next() != Some('[') {
                continue;
            }
            let mut params = String::new();
            let command = loop {
                match chars.next() {
                    Some(c) if c.is_ascii_alphabetic() => break Some(c),
                    Some(c) => params.push(c),
                    None => break None,
                }
            };
            if command == Some('H') {
                let (row, col) = params.split_once(';').unwrap_or((params.as_str(), "1"));
                cursor = (
                    col.parse::<u16>().unwrap() - 1,
                    row.parse::<u16>().unwrap() - 1,
                );
            }
        }
        screen
    }

    /// Generates and solves a maze, then feeds every event it produced to a buffer renderer.
    fn rendered(cols: u16, rows: u16, seed: u64) -> Renderer<Vec<u8>> {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut maze = Maze::new(cols, rows).unwrap().with_visualizer(tx);
        generate_and_solve(&mut maze, Some(seed)).unwrap();
        drop(maze);

        let mut renderer = Renderer::with_writer(Vec::new(), Duration::from_millis(5));
        for event in rx.iter() {
            renderer.draw_event(&event).unwrap();
        }
        renderer
    }

    #[test]
    fn test_path_is_unbroken_across_cell_edges() {
        // One corridor: cell (0, 0) spans x 0..=4, cell (1, 0) spans x 4..=8
        let renderer = rendered(2, 1, 0);
        let screen = screen(&renderer.out);

        for x in 2..=6 {
            assert_eq!(screen.get(&(x, 1)), Some(&MOVE_HORIZONTAL), "x = {x}");
        }
        assert_eq!(screen.get(&(0, 1)), Some(&WALL_VERTICAL));
        assert_eq!(screen.get(&(8, 1)), Some(&WALL_VERTICAL));
        // Entrance on top of (0, 0), wall on top of (1, 0)
        assert!((1..4).all(|x| screen.get(&(x, 0)) == Some(&' ')));
        assert!((5..8).all(|x| screen.get(&(x, 0)) == Some(&WALL_HORIZONTAL)));
    }

    #[test]
    fn test_redraw_restores_walls_and_moves() {
        let mut renderer = rendered(5, 4, 11);
        let before = screen(&renderer.out);
        assert!(before.values().any(|&c| c == MOVE_VERTICAL || c == MOVE_HORIZONTAL));

        renderer.out.clear();
        renderer.redraw_all().unwrap();
        assert_eq!(screen(&renderer.out), before);
    }

    #[test]
    fn test_cells_need_room_for_an_interior() {
        assert!(supports_geometry(&Geometry::default()));
        assert!(supports_geometry(&Geometry::new((0, 0), 2, 2).unwrap()));
        assert!(!supports_geometry(&Geometry::new((0, 0), 4, 1).unwrap()));
        assert!(!supports_geometry(&Geometry::new((0, 0), 1, 2).unwrap()));

        let mut renderer = Renderer::with_writer(Vec::<u8>::new(), Duration::from_millis(5));
        let err = renderer
            .draw_event(&GridEvent::Initial {
                cols: 3,
                rows: 3,
                geometry: Geometry::new((0, 0), 4, 1).unwrap(),
            })
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Other);
        assert!(renderer.canvas.is_none());
    }
}
