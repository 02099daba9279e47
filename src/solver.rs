//! The solver protocol shared by every strategy.
//!
//! A solver never owns the maze: the caller keeps the [`Maze`] and hands it to
//! each call, so several solvers can take turns on one grid. Each `step`
//! moves exactly one cell and returns what happened as a [`Step`].

pub mod backtracker;
pub mod flooder;
pub mod walker;

use std::fmt::Write;

use log::info;
use smallvec::SmallVec;

use crate::cell::{Coord, Direction};
use crate::dead_ends::{DeadEndChecker, SharedDeadEnds};
use crate::error::{MazeError, Result};
use crate::grid::Maze;
use crate::Drawer;

pub use backtracker::{Backtracker, DirectionChoice};
pub use flooder::{Flooder, PathValue};
pub use walker::{Hand, Walker};

/// Outcome of a single solver step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub from: Coord,
    pub to: Coord,
    /// True when `to` was newly discovered, false for a retreat.
    pub forward: bool,
    /// Cells the dead-end engine gave up on during this step.
    pub dead_cells: Vec<Coord>,
    /// Branches abandoned during this step, each listed tip first.
    pub abandoned: Vec<Vec<Coord>>,
}

impl Step {
    pub(crate) fn forward(from: Coord, to: Coord, dead_cells: Vec<Coord>) -> Self {
        Self {
            from,
            to,
            forward: true,
            dead_cells,
            abandoned: Vec::new(),
        }
    }

    pub(crate) fn backward(from: Coord, to: Coord) -> Self {
        Self {
            from,
            to,
            forward: false,
            dead_cells: Vec::new(),
            abandoned: Vec::new(),
        }
    }
}

pub trait Solver {
    /// Registry name of the strategy, modifiers excluded.
    fn name(&self) -> &'static str;

    /// Clears solve-time state and marks the start cell visited, rebuilding
    /// any attached dead-end engine.
    fn reset(&mut self, maze: &mut Maze);

    /// Advances by one move.
    ///
    /// Fails with [`MazeError::AlreadySolved`] once the end cell is visited.
    fn step(&mut self, maze: &mut Maze) -> Result<Step>;

    /// Attaches a dead-end engine; dead neighbours stop being candidates.
    fn enable_efficiency(&mut self, dead_ends: SharedDeadEnds);

    /// Attaches the dead-branch penalty heuristic. Only flooders use it.
    fn enable_heuristic(&mut self) {}

    /// Appends progress text for status displays.
    fn fill_status(&self, status: &mut String);

    /// The current route from start to the active position.
    fn path(&self, maze: &Maze) -> Vec<Coord>;

    /// True once the end cell has been reached.
    fn is_solved(&self, maze: &Maze) -> bool;

    /// Steps until the end is reached, reporting every step to `drawer`.
    ///
    /// Returns the number of steps taken.
    fn solve(&mut self, maze: &mut Maze, drawer: &mut dyn Drawer) -> Result<usize> {
        let mut steps = 0;
        while !self.is_solved(maze) {
            let step = self.step(maze)?;
            for branch in &step.abandoned {
                drawer.draw_path(branch, false);
            }
            drawer.draw_step(step.from, step.to, step.forward);
            for &cell in &step.dead_cells {
                drawer.draw_dead_cell(cell, None);
            }
            steps += 1;
        }

        let path = self.path(maze);
        drawer.draw_path(&path, true);
        info!(
            "{} solved the maze in {} steps, path length {}",
            self.name(),
            steps,
            path.len()
        );
        Ok(steps)
    }
}

/// Bookkeeping shared by all strategies.
pub(crate) struct SolverCore {
    pub start: Coord,
    pub end: Coord,
    region: u8,
    dead_ends: Option<SharedDeadEnds>,
    pub forward_steps: usize,
    pub backward_steps: usize,
}

impl SolverCore {
    pub fn new(maze: &Maze) -> Self {
        Self {
            start: maze.start(),
            end: maze.end(),
            region: maze.cell(maze.start()).region(),
            dead_ends: None,
            forward_steps: 0,
            backward_steps: 0,
        }
    }

    /// Starts a fresh attempt. An attached engine is rebuilt, so siblings
    /// sharing it start over as well.
    pub fn reset(&mut self, maze: &mut Maze) {
        maze.clear_visited(self.region);
        maze.set_visited(self.start);
        self.forward_steps = 0;
        self.backward_steps = 0;

        if let Some(dead_ends) = &self.dead_ends {
            let end = dead_ends.borrow().end();
            *dead_ends.borrow_mut() = DeadEndChecker::with_endpoints(maze, self.start, end);
        }
    }

    pub fn is_solved(&self, maze: &Maze) -> bool {
        maze.is_visited(self.end)
    }

    pub fn ensure_unsolved(&self, maze: &Maze) -> Result<()> {
        if self.is_solved(maze) {
            return Err(MazeError::AlreadySolved);
        }
        Ok(())
    }

    pub fn attach(&mut self, dead_ends: SharedDeadEnds) {
        self.dead_ends = Some(dead_ends);
    }

    pub fn is_efficient(&self) -> bool {
        self.dead_ends.is_some()
    }

    pub fn is_dead(&self, cell: Coord) -> bool {
        self.dead_ends
            .as_ref()
            .is_some_and(|dead_ends| dead_ends.borrow().is_dead(cell))
    }

    /// Open walls of `coord` leading to unvisited, live cells.
    pub fn candidate_walls(
        &self,
        maze: &Maze,
        coord: Coord,
    ) -> SmallVec<[(Direction, Coord); 4]> {
        maze.cell(coord)
            .open_walls()
            .filter_map(|dir| maze.neighbor(coord, dir).map(|other| (dir, other)))
            .filter(|&(_, other)| !maze.is_visited(other) && !self.is_dead(other))
            .collect()
    }

    /// Marks `coord` visited; returns cells the engine gave up on as a result.
    pub fn visit(&mut self, maze: &mut Maze, coord: Coord) -> Vec<Coord> {
        maze.set_visited(coord);
        self.forward_steps += 1;
        match &self.dead_ends {
            Some(dead_ends) => dead_ends.borrow_mut().visit(coord),
            None => Vec::new(),
        }
    }

    pub fn fill_status(&self, status: &mut String) {
        let _ = writeln!(
            status,
            "{} forward steps, {} backward steps",
            self.forward_steps, self.backward_steps
        );
        if let Some(dead_ends) = &self.dead_ends {
            let _ = writeln!(status, "{} dead cells", dead_ends.borrow().dead_count());
        }
    }
}

/// A fixed cell distances are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Start,
    End,
    /// The cell mirroring the start through the grid centre.
    Opposite,
}

impl Reference {
    pub fn resolve(self, maze: &Maze, start: Coord, end: Coord) -> Coord {
        match self {
            Reference::Start => start,
            Reference::End => end,
            Reference::Opposite => (maze.width() - 1 - start.0, maze.height() - 1 - start.1),
        }
    }
}

/// Euclidean distance between two cells.
#[inline]
pub fn distance(a: Coord, b: Coord) -> f64 {
    let dx = a.0 as f64 - b.0 as f64;
    let dy = a.1 as f64 - b.1 as f64;
    (dx * dx + dy * dy).sqrt()
}
