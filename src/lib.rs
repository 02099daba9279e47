//! Maze Generation and Pathfinding Library
//!
//! Generates rectangular grid mazes as spanning trees, encodes them as short
//! replayable codes, and solves them step by step with a family of
//! interchangeable strategies (backtrackers, wall followers and flooders),
//! optionally pruned by an incremental dead-end engine.

pub mod cell;
pub mod code;
pub mod dead_ends;
pub mod error;
pub mod grid;
pub mod registry;
pub mod solver;

use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

pub use cell::{Coord, Direction, WallState};
pub use code::{Endpoints, MazeParams};
pub use dead_ends::{DeadEndChecker, SharedDeadEnds};
pub use error::{CodeError, MazeError, Result};
pub use grid::{Maze, Rect};
pub use registry::{SolverSpec, Strategy};
pub use solver::{Solver, Step};

/// Random generator handle shared by a maze and every solver stepping it.
///
/// Sibling mazes on one grid draw from the same sequence, so a single seed
/// reproduces the whole session.
pub type SharedRng = Rc<RefCell<dyn RngCore>>;

/// Builds a shared generator seeded once from `seed`.
pub fn shared_rng(seed: u64) -> SharedRng {
    share_rng(StdRng::seed_from_u64(seed))
}

/// Wraps any generator into a [`SharedRng`].
pub fn share_rng<R: RngCore + 'static>(rng: R) -> SharedRng {
    Rc::new(RefCell::new(rng))
}

/// Receiver for solver progress.
///
/// Called synchronously from [`Solver::solve`]; implementations paint,
/// record or ignore what they are given.
pub trait Drawer {
    /// One move between adjacent cells. `forward` is false for a retreat.
    fn draw_step(&mut self, from: Coord, to: Coord, forward: bool);

    /// A whole route: the solution when `forward`, an abandoned branch otherwise.
    fn draw_path(&mut self, _path: &[Coord], _forward: bool) {}

    /// A cell proven unable to reach the end.
    fn draw_dead_cell(&mut self, _cell: Coord, _distance: Option<u32>) {}
}

/// Drawer that discards everything.
pub struct NullDrawer;

impl Drawer for NullDrawer {
    fn draw_step(&mut self, _from: Coord, _to: Coord, _forward: bool) {}
}

/// Drawer that keeps every call for later inspection.
#[derive(Debug, Default)]
pub struct StepRecorder {
    pub steps: Vec<(Coord, Coord, bool)>,
    pub paths: Vec<(Vec<Coord>, bool)>,
    pub dead_cells: Vec<Coord>,
}

impl StepRecorder {
    pub fn forward_steps(&self) -> usize {
        self.steps.iter().filter(|step| step.2).count()
    }

    pub fn backward_steps(&self) -> usize {
        self.steps.len() - self.forward_steps()
    }
}

impl Drawer for StepRecorder {
    fn draw_step(&mut self, from: Coord, to: Coord, forward: bool) {
        self.steps.push((from, to, forward));
    }

    fn draw_path(&mut self, path: &[Coord], forward: bool) {
        self.paths.push((path.to_vec(), forward));
    }

    fn draw_dead_cell(&mut self, cell: Coord, _distance: Option<u32>) {
        self.dead_cells.push(cell);
    }
}
