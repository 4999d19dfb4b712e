use std::ops::ControlFlow;
use std::sync::mpsc::{Sender, SyncSender};

use crate::maze::{Coord, Geometry, cell::Walls};

/// Which algorithm is touching a cell when it gets redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Generation carved a wall or finished with the cell
    Carve,
    /// The solver entered the cell
    Solve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// The solver stepped along an edge
    Forward,
    /// The solver retreated over an edge that led to a dead end
    Backtrack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEvent {
    Initial {
        cols: u16,
        rows: u16,
        geometry: Geometry,
    },
    Cell {
        coord: Coord,
        walls: Walls,
        phase: Phase,
    },
    Move {
        from: Coord,
        to: Coord,
        kind: MoveKind,
    },
}

/// Receives every change the maze goes through.
///
/// Returning `ControlFlow::Break` asks the running algorithm to stop; it
/// unwinds with `MazeError::Aborted` and leaves the maze consistent.
pub trait Visualizer: Send {
    fn notify(&mut self, event: GridEvent) -> ControlFlow<()>;
}

impl Visualizer for Sender<GridEvent> {
    fn notify(&mut self, event: GridEvent) -> ControlFlow<()> {
        match self.send(event) {
            Ok(()) => ControlFlow::Continue(()),
            // Receiver dropped, nobody is watching anymore
            Err(_) => ControlFlow::Break(()),
        }
    }
}

impl Visualizer for SyncSender<GridEvent> {
    fn notify(&mut self, event: GridEvent) -> ControlFlow<()> {
        match self.send(event) {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => ControlFlow::Break(()),
        }
    }
}
