//! Depth-first search with an explicit stack.
//!
//! Each step either pushes one unvisited neighbour of the top cell or, when
//! the top has none left, pops it and reports the retreat.

use std::fmt::Write;

use rand::Rng;

use super::{distance, Reference, Solver, SolverCore, Step};
use crate::cell::{Coord, Direction};
use crate::dead_ends::SharedDeadEnds;
use crate::error::{MazeError, Result};
use crate::grid::Maze;
use crate::SharedRng;

/// How the next neighbour is picked among the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionChoice {
    Random,
    /// Smallest straight-line distance to the reference cell.
    Closest(Reference),
    /// Largest straight-line distance to the reference cell.
    Farthest(Reference),
}

impl DirectionChoice {
    pub fn label(self) -> &'static str {
        match self {
            DirectionChoice::Random => "RandomBacktracker",
            DirectionChoice::Closest(Reference::Start) => "CloseBacktracker",
            DirectionChoice::Farthest(Reference::Start) => "FarBacktracker",
            DirectionChoice::Closest(Reference::End) => "ProximityBacktracker",
            DirectionChoice::Farthest(Reference::End) => "RemoteBacktracker",
            DirectionChoice::Closest(Reference::Opposite) => "OpposedBacktracker",
            DirectionChoice::Farthest(Reference::Opposite) => "HomeboundBacktracker",
        }
    }
}

pub struct Backtracker {
    core: SolverCore,
    choice: DirectionChoice,
    rng: SharedRng,
    stack: Vec<Coord>,
}

impl Backtracker {
    pub fn new(maze: &mut Maze, choice: DirectionChoice) -> Self {
        let mut solver = Self {
            core: SolverCore::new(maze),
            choice,
            rng: maze.rng(),
            stack: Vec::new(),
        };
        solver.reset(maze);
        solver
    }

    /// Depth of the current route, start included.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn choose(&self, maze: &Maze, candidates: &[(Direction, Coord)]) -> Coord {
        let by_distance = |reference: Reference| {
            let target = reference.resolve(maze, self.core.start, self.core.end);
            move |a: &&(Direction, Coord), b: &&(Direction, Coord)| {
                distance(a.1, target).total_cmp(&distance(b.1, target))
            }
        };

        let picked = match self.choice {
            DirectionChoice::Random => {
                let index = self.rng.borrow_mut().gen_range(0..candidates.len());
                candidates.get(index)
            }
            DirectionChoice::Closest(reference) => {
                candidates.iter().min_by(by_distance(reference))
            }
            DirectionChoice::Farthest(reference) => {
                candidates.iter().max_by(by_distance(reference))
            }
        };
        // callers never pass an empty slice
        picked.map_or(candidates[0].1, |&(_, coord)| coord)
    }
}

impl Solver for Backtracker {
    fn name(&self) -> &'static str {
        self.choice.label()
    }

    fn reset(&mut self, maze: &mut Maze) {
        self.core.reset(maze);
        self.stack.clear();
        self.stack.push(self.core.start);
    }

    fn step(&mut self, maze: &mut Maze) -> Result<Step> {
        self.core.ensure_unsolved(maze)?;
        let top = *self.stack.last().ok_or(MazeError::Stuck)?;

        let candidates = self.core.candidate_walls(maze, top);
        if candidates.is_empty() {
            self.stack.pop();
            let back = *self.stack.last().ok_or(MazeError::Stuck)?;
            self.core.backward_steps += 1;
            return Ok(Step::backward(top, back));
        }

        let next = self.choose(maze, &candidates);
        let dead_cells = self.core.visit(maze, next);
        self.stack.push(next);
        Ok(Step::forward(top, next, dead_cells))
    }

    fn enable_efficiency(&mut self, dead_ends: SharedDeadEnds) {
        self.core.attach(dead_ends);
    }

    fn fill_status(&self, status: &mut String) {
        let _ = writeln!(status, "stack depth {}", self.stack.len());
        self.core.fill_status(status);
    }

    fn path(&self, _maze: &Maze) -> Vec<Coord> {
        self.stack.clone()
    }

    fn is_solved(&self, maze: &Maze) -> bool {
        self.core.is_solved(maze)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;
    use rustc_hash::FxHashSet;

    use super::*;
    use crate::{share_rng, DeadEndChecker, StepRecorder};

    fn serpentine() -> Maze {
        let mut maze = Maze::with_rng(4, 4, share_rng(StepRng::new(0, 0))).unwrap();
        maze.generate().unwrap();
        maze.set_endpoints((1, 1), (0, 3)).unwrap();
        maze
    }

    #[test]
    fn test_first_choice_walk_on_serpentine() {
        let mut maze = serpentine();
        let mut solver = Backtracker::new(&mut maze, DirectionChoice::Random);
        let mut recorder = StepRecorder::default();
        let steps = solver.solve(&mut maze, &mut recorder).unwrap();

        let expected = [
            ((1, 1), (2, 1), true),
            ((2, 1), (3, 1), true),
            ((3, 1), (3, 0), true),
            ((3, 0), (2, 0), true),
            ((2, 0), (1, 0), true),
            ((1, 0), (0, 0), true),
            ((0, 0), (1, 0), false),
            ((1, 0), (2, 0), false),
            ((2, 0), (3, 0), false),
            ((3, 0), (3, 1), false),
            ((3, 1), (2, 1), false),
            ((2, 1), (1, 1), false),
            ((1, 1), (0, 1), true),
            ((0, 1), (0, 2), true),
            ((0, 2), (1, 2), true),
            ((1, 2), (2, 2), true),
            ((2, 2), (3, 2), true),
            ((3, 2), (3, 3), true),
            ((3, 3), (2, 3), true),
            ((2, 3), (1, 3), true),
            ((1, 3), (0, 3), true),
        ];
        assert_eq!(steps, 21);
        assert_eq!(recorder.steps, expected);
        assert_eq!(recorder.forward_steps(), 15);
        assert_eq!(solver.depth(), 10);
        assert_eq!(
            recorder.paths.last().map(|(path, forward)| (path.len(), *forward)),
            Some((10, true))
        );
    }

    #[test]
    fn test_efficiency_leaves_open_grid_walk_unchanged() {
        // trajectories ignore walls, so no cell of a full 4x4 grid is ever cut off
        let mut maze = serpentine();
        let dead_ends = DeadEndChecker::shared(&maze);
        let mut solver = Backtracker::new(&mut maze, DirectionChoice::Random);
        solver.enable_efficiency(dead_ends.clone());
        let mut recorder = StepRecorder::default();
        let steps = solver.solve(&mut maze, &mut recorder).unwrap();

        assert_eq!(steps, 21);
        assert!(recorder.dead_cells.is_empty());
        assert_eq!(dead_ends.borrow().dead_count(), 15);
    }

    #[test]
    fn test_step_after_solve_fails() {
        let mut maze = serpentine();
        let mut solver = Backtracker::new(&mut maze, DirectionChoice::Closest(Reference::End));
        solver.solve(&mut maze, &mut crate::NullDrawer).unwrap();
        assert_eq!(solver.step(&mut maze), Err(MazeError::AlreadySolved));

        solver.reset(&mut maze);
        assert!(!solver.is_solved(&maze));
        assert_eq!(solver.path(&maze), vec![(1, 1)]);
    }

    #[test]
    fn test_same_seed_same_walk() {
        let run = || {
            let mut maze = Maze::new(12, 9, 31).unwrap();
            maze.generate().unwrap();
            maze.place_endpoints().unwrap();
            let mut solver = Backtracker::new(&mut maze, DirectionChoice::Random);
            let mut recorder = StepRecorder::default();
            solver.solve(&mut maze, &mut recorder).unwrap();
            recorder.steps
        };
        assert_eq!(run(), run());
    }

    /// Replays a random depth-first walk on `maze`, drawing from its generator.
    fn replay_random_walk(maze: &Maze) -> Vec<(Coord, Coord, bool)> {
        let rng = maze.rng();
        let mut seen: FxHashSet<Coord> = FxHashSet::default();
        seen.insert(maze.start());
        let mut stack = vec![maze.start()];
        let mut steps = Vec::new();

        while !seen.contains(&maze.end()) {
            let top = stack[stack.len() - 1];
            let open: Vec<Coord> = maze
                .cell(top)
                .open_walls()
                .filter_map(|dir| maze.neighbor(top, dir))
                .filter(|next| !seen.contains(next))
                .collect();
            if open.is_empty() {
                stack.pop();
                steps.push((top, stack[stack.len() - 1], false));
                continue;
            }
            let next = open[rng.borrow_mut().gen_range(0..open.len())];
            seen.insert(next);
            stack.push(next);
            steps.push((top, next, true));
        }
        steps
    }

    #[test]
    fn test_seeded_walk_follows_generator_draws() {
        for seed in [1, 8, 23, 40] {
            let placed = || {
                let mut maze = Maze::new(4, 4, seed).unwrap();
                maze.generate().unwrap();
                maze.place_endpoints().unwrap();
                maze
            };
            let mut maze = placed();
            let mut solver = Backtracker::new(&mut maze, DirectionChoice::Random);
            let mut recorder = StepRecorder::default();
            let steps = solver.solve(&mut maze, &mut recorder).unwrap();

            let expected = replay_random_walk(&placed());
            assert_eq!(recorder.steps, expected, "seed {seed}");
            assert_eq!(steps, expected.len());
            assert_eq!(solver.depth(), solver.path(&maze).len());
        }
    }

    #[test]
    fn test_closest_choice_prefers_nearer_neighbour() {
        let mut maze = serpentine();
        // both (2,1) and (0,1) are open from the start; (0,1) is nearer the end
        let mut solver = Backtracker::new(&mut maze, DirectionChoice::Closest(Reference::End));
        let step = solver.step(&mut maze).unwrap();
        assert_eq!(step.to, (0, 1));

        let mut far = Backtracker::new(&mut maze, DirectionChoice::Farthest(Reference::End));
        let step = far.step(&mut maze).unwrap();
        assert_eq!(step.to, (2, 1));
    }
}
