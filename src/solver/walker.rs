//! Wall followers.
//!
//! A walker keeps one hand on the wall: it first tries to turn towards that
//! hand, then rotates away from it until a passage opens. On a tree maze this
//! walks the boundary of every side branch exactly once in each direction.

use std::fmt::Write;

use super::{Solver, SolverCore, Step};
use crate::cell::{Coord, Direction};
use crate::dead_ends::SharedDeadEnds;
use crate::error::{MazeError, Result};
use crate::grid::Maze;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    fn toward(self, dir: Direction) -> Direction {
        match self {
            Hand::Left => dir.turn_left(),
            Hand::Right => dir.turn_right(),
        }
    }

    fn away(self, dir: Direction) -> Direction {
        match self {
            Hand::Left => dir.turn_right(),
            Hand::Right => dir.turn_left(),
        }
    }
}

pub struct Walker {
    core: SolverCore,
    hand: Hand,
    position: Coord,
    facing: Direction,
    /// Route from the start to the current position.
    trail: Vec<Coord>,
}

impl Walker {
    pub fn new(maze: &mut Maze, hand: Hand) -> Self {
        let mut solver = Self {
            core: SolverCore::new(maze),
            hand,
            position: maze.start(),
            facing: Direction::East,
            trail: Vec::new(),
        };
        solver.reset(maze);
        solver
    }

    pub fn position(&self) -> Coord {
        self.position
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    /// The neighbour through `dir`, if the walker may enter it.
    ///
    /// Visited cells stay enterable so the walker can always retreat.
    fn passable(&self, maze: &Maze, dir: Direction) -> Option<Coord> {
        if !maze.is_open(self.position, dir) {
            return None;
        }
        maze.neighbor(self.position, dir)
            .filter(|&next| maze.is_visited(next) || !self.core.is_dead(next))
    }
}

impl Solver for Walker {
    fn name(&self) -> &'static str {
        match self.hand {
            Hand::Left => "LeftHandWalker",
            Hand::Right => "RightHandWalker",
        }
    }

    fn reset(&mut self, maze: &mut Maze) {
        self.core.reset(maze);
        self.position = self.core.start;
        self.facing = Direction::East;
        self.trail.clear();
        self.trail.push(self.core.start);
    }

    fn step(&mut self, maze: &mut Maze) -> Result<Step> {
        self.core.ensure_unsolved(maze)?;

        let mut dir = self.hand.toward(self.facing);
        let mut chosen = None;
        for _ in 0..Direction::ALL.len() {
            if let Some(next) = self.passable(maze, dir) {
                chosen = Some((dir, next));
                break;
            }
            dir = self.hand.away(dir);
        }
        let (dir, next) = chosen.ok_or(MazeError::Stuck)?;

        let from = self.position;
        self.position = next;
        self.facing = dir;

        if maze.is_visited(next) {
            self.core.backward_steps += 1;
            if self.trail.len() > 1 && self.trail[self.trail.len() - 2] == next {
                self.trail.pop();
            } else {
                self.trail.push(next);
            }
            return Ok(Step::backward(from, next));
        }

        let dead_cells = self.core.visit(maze, next);
        self.trail.push(next);
        Ok(Step::forward(from, next, dead_cells))
    }

    fn enable_efficiency(&mut self, dead_ends: SharedDeadEnds) {
        self.core.attach(dead_ends);
    }

    fn fill_status(&self, status: &mut String) {
        let _ = writeln!(
            status,
            "at {:?} facing {}",
            self.position,
            self.facing.name()
        );
        self.core.fill_status(status);
    }

    fn path(&self, _maze: &Maze) -> Vec<Coord> {
        self.trail.clone()
    }

    fn is_solved(&self, maze: &Maze) -> bool {
        self.core.is_solved(maze)
    }
}
