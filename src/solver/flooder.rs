//! Multi-tip explorers.
//!
//! A flooder grows a tree of paths from the start. Each step ranks the active
//! tips by a [`PathValue`], extends the chosen tip into one unvisited
//! neighbour and keeps both as tips. A tip with nowhere left to go is dropped,
//! and when no live path runs through it any more the branch leading to it is
//! abandoned back to the nearest fork that still has one.

use std::fmt::Write;

use log::{debug, warn};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::{distance, Reference, Solver, SolverCore, Step};
use crate::cell::{Coord, Direction};
use crate::dead_ends::SharedDeadEnds;
use crate::error::{MazeError, Result};
use crate::grid::Maze;
use crate::SharedRng;

/// Penalty added per abandoned branch when ranking by thickness.
const THICKNESS_PENALTY: f64 = 0.5;

/// Ranking of tips. Lower values are extended first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathValue {
    /// Any tip, uniformly.
    Random,
    /// The earliest registered tip.
    RoundRobin,
    /// Nearest the start.
    Close,
    /// Farthest from the start.
    Far,
    /// Nearest the end.
    Proximity,
    /// Nearest the cell mirroring the start.
    Opposed,
    /// Largest share of the flow from the start.
    Thickest,
    /// Smallest share of the flow from the start.
    Thinnest,
    /// Farthest from every other tip.
    Spreading,
}

impl PathValue {
    pub fn label(self) -> &'static str {
        match self {
            PathValue::Random => "RandomFlooder",
            PathValue::RoundRobin => "RoundRobinFlooder",
            PathValue::Close => "CloseFlooder",
            PathValue::Far => "FarFlooder",
            PathValue::Proximity => "ProximityFlooder",
            PathValue::Opposed => "OpposedFlooder",
            PathValue::Thickest => "ThickestFlooder",
            PathValue::Thinnest => "ThinnestFlooder",
            PathValue::Spreading => "SpreadingFlooder",
        }
    }

    pub fn weighted_label(self) -> &'static str {
        match self {
            PathValue::Random => "WeightedRandomFlooder",
            PathValue::RoundRobin => "WeightedRoundRobinFlooder",
            PathValue::Close => "WeightedCloseFlooder",
            PathValue::Far => "WeightedFarFlooder",
            PathValue::Proximity => "WeightedProximityFlooder",
            PathValue::Opposed => "WeightedOpposedFlooder",
            PathValue::Thickest => "WeightedThickestFlooder",
            PathValue::Thinnest => "WeightedThinnestFlooder",
            PathValue::Spreading => "WeightedSpreadingFlooder",
        }
    }

    /// Reference cell and sign for the distance-ranked values.
    fn reference(self) -> Option<(Reference, f64)> {
        match self {
            PathValue::Close => Some((Reference::Start, 1.0)),
            PathValue::Far => Some((Reference::Start, -1.0)),
            PathValue::Proximity => Some((Reference::End, 1.0)),
            PathValue::Opposed => Some((Reference::Opposite, 1.0)),
            _ => None,
        }
    }

    /// Whether tips carry a value the dead-branch penalty can shift.
    pub fn is_ranked(self) -> bool {
        !matches!(self, PathValue::Random | PathValue::RoundRobin)
    }
}

pub struct Flooder {
    core: SolverCore,
    value: PathValue,
    /// Share of the weight every tip keeps regardless of its value.
    weighting: Option<f64>,
    heuristic: bool,
    rng: SharedRng,
    target: Option<(Coord, f64)>,
    tips: Vec<Coord>,
    last: Coord,
    abandoned_cells: usize,
    // per cell, by maze index
    is_tip: Vec<bool>,
    parent: Vec<Option<usize>>,
    open_paths: Vec<u32>,
    branches: Vec<u32>,
    thickness: Vec<f64>,
    penalty: Vec<f64>,
    children: FxHashMap<usize, SmallVec<[usize; 3]>>,
}

impl Flooder {
    pub fn new(maze: &mut Maze, value: PathValue) -> Self {
        let mut solver = Self {
            core: SolverCore::new(maze),
            value,
            weighting: None,
            heuristic: false,
            rng: maze.rng(),
            target: None,
            tips: Vec::new(),
            last: maze.start(),
            abandoned_cells: 0,
            is_tip: Vec::new(),
            parent: Vec::new(),
            open_paths: Vec::new(),
            branches: Vec::new(),
            thickness: Vec::new(),
            penalty: Vec::new(),
            children: FxHashMap::default(),
        };
        solver.reset(maze);
        solver
    }

    /// Picks tips at random with weights falling linearly from 1 for the best
    /// value to `scale` for the worst, instead of always taking the best.
    pub fn with_weighting(mut self, scale: f64) -> Self {
        let clamped = scale.clamp(f64::EPSILON, 1.0);
        if clamped != scale {
            warn!("weighting scale {} clamped to {}", scale, clamped);
        }
        self.weighting = Some(clamped);
        self
    }

    pub fn value(&self) -> PathValue {
        self.value
    }

    pub fn tips(&self) -> &[Coord] {
        &self.tips
    }

    /// Distance from `coord` to the nearest tip other than the one in `skip`.
    fn separation(&self, coord: Coord, skip: usize) -> f64 {
        self.tips
            .iter()
            .enumerate()
            .filter(|&(slot, _)| slot != skip)
            .map(|(_, &tip)| distance(coord, tip))
            .min_by(f64::total_cmp)
            .unwrap_or(0.0)
    }

    fn penalty_unit(&self, maze: &Maze) -> f64 {
        match self.value {
            PathValue::Random | PathValue::RoundRobin => 0.0,
            PathValue::Thickest | PathValue::Thinnest => THICKNESS_PENALTY,
            _ => (maze.width() + maze.height()) as f64 / 8.0,
        }
    }

    fn tip_value(&self, maze: &Maze, slot: usize, unit: f64) -> f64 {
        let tip = self.tips[slot];
        let index = maze.index(tip);
        let base = match (self.value, self.target) {
            (_, Some((target, sign))) => sign * distance(tip, target),
            (PathValue::Thickest, _) => -self.thickness[index],
            (PathValue::Thinnest, _) => self.thickness[index],
            (PathValue::Spreading, _) => -self.separation(tip, slot),
            _ => 0.0,
        };
        if self.heuristic {
            base + self.penalty[index] * unit
        } else {
            base
        }
    }

    fn uniform(&self, count: usize) -> usize {
        self.rng.borrow_mut().gen_range(0..count)
    }

    fn select_tip(&self, maze: &Maze) -> usize {
        let count = self.tips.len();
        match self.value {
            PathValue::Random => return self.uniform(count),
            // tips keep their registration order
            PathValue::RoundRobin => return 0,
            _ => {}
        }

        let unit = self.penalty_unit(maze);
        let values: Vec<f64> = (0..count)
            .map(|slot| self.tip_value(maze, slot, unit))
            .collect();
        match self.weighting {
            Some(scale) => self.weighted_choice(&values, scale),
            None => (0..count)
                .min_by(|&a, &b| values[a].total_cmp(&values[b]))
                .unwrap_or(0),
        }
    }

    fn weighted_choice(&self, values: &[f64], scale: f64) -> usize {
        let best = values.iter().copied().fold(f64::INFINITY, f64::min);
        let worst = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let spread = worst - best;
        if spread.is_nan() || spread <= f64::EPSILON {
            return self.uniform(values.len());
        }

        let weights = values
            .iter()
            .map(|value| scale + (1.0 - scale) * (worst - value) / spread);
        match WeightedIndex::new(weights) {
            Ok(weighted) => weighted.sample(&mut *self.rng.borrow_mut()),
            Err(_) => self.uniform(values.len()),
        }
    }

    fn choose_direction(&self, slot: usize, candidates: &[(Direction, Coord)]) -> Coord {
        let picked = match (self.value, self.target) {
            (_, Some((target, sign))) => candidates.iter().min_by(|a, b| {
                (sign * distance(a.1, target)).total_cmp(&(sign * distance(b.1, target)))
            }),
            (PathValue::Spreading, _) => candidates.iter().max_by(|a, b| {
                self.separation(a.1, slot)
                    .total_cmp(&self.separation(b.1, slot))
            }),
            _ => candidates.get(self.uniform(candidates.len())),
        };
        // callers never pass an empty slice
        picked.map_or(candidates[0].1, |&(_, coord)| coord)
    }

    fn grow(&mut self, maze: &Maze, tip: Coord, next: Coord) {
        let (from, to) = (maze.index(tip), maze.index(next));
        self.parent[to] = Some(from);
        self.open_paths[from] += 1;
        self.children.entry(from).or_default().push(to);
        self.thickness[to] = self.thickness[from] / self.branches[from].max(1) as f64;
        self.penalty[to] = self.penalty[from];
        self.branches[to] = self.core.candidate_walls(maze, next).len().max(1) as u32;
        self.is_tip[to] = true;
        self.tips.push(next);
        self.last = next;
    }

    /// Drops the dead tip at `index` and, if nothing runs through it, the
    /// branch above it up to the nearest fork still in use.
    fn abandon(&mut self, maze: &Maze, index: usize) -> Option<Vec<Coord>> {
        self.is_tip[index] = false;
        if self.open_paths[index] > 0 {
            return None;
        }

        let mut branch = vec![maze.coord(index)];
        let mut current = index;
        let mut fork = None;
        while let Some(up) = self.parent[current] {
            self.open_paths[up] -= 1;
            if self.open_paths[up] > 0 || self.is_tip[up] {
                fork = Some(up);
                break;
            }
            branch.push(maze.coord(up));
            current = up;
        }

        self.abandoned_cells += branch.len();
        debug!(
            "abandoned a branch of {} cells ending at {:?}",
            branch.len(),
            branch[0]
        );
        if let Some(fork) = fork.filter(|_| self.heuristic) {
            self.penalize(fork);
        }
        Some(branch)
    }

    /// Raises the penalty of `fork` and everything grown from it.
    fn penalize(&mut self, fork: usize) {
        let mut pending = vec![fork];
        while let Some(index) = pending.pop() {
            self.penalty[index] += 1.0;
            if let Some(children) = self.children.get(&index) {
                pending.extend(children.iter().copied());
            }
        }
    }
}

impl Solver for Flooder {
    fn name(&self) -> &'static str {
        match self.weighting {
            Some(_) => self.value.weighted_label(),
            None => self.value.label(),
        }
    }

    fn reset(&mut self, maze: &mut Maze) {
        self.core.reset(maze);

        let count = maze.width() * maze.height();
        self.is_tip = vec![false; count];
        self.parent = vec![None; count];
        self.open_paths = vec![0; count];
        self.branches = vec![0; count];
        self.thickness = vec![0.0; count];
        self.penalty = vec![0.0; count];
        self.children.clear();

        let start = self.core.start;
        let index = maze.index(start);
        self.is_tip[index] = true;
        self.thickness[index] = 1.0;
        self.branches[index] = self.core.candidate_walls(maze, start).len().max(1) as u32;

        self.tips.clear();
        self.tips.push(start);
        self.last = start;
        self.abandoned_cells = 0;
        self.target = self.value.reference().map(|(reference, sign)| {
            (reference.resolve(maze, self.core.start, self.core.end), sign)
        });
    }

    fn step(&mut self, maze: &mut Maze) -> Result<Step> {
        self.core.ensure_unsolved(maze)?;

        let mut abandoned = Vec::new();
        loop {
            if self.tips.is_empty() {
                return Err(MazeError::Stuck);
            }
            let slot = self.select_tip(maze);
            let tip = self.tips[slot];

            let candidates = self.core.candidate_walls(maze, tip);
            if candidates.is_empty() {
                self.tips.remove(slot);
                if let Some(branch) = self.abandon(maze, maze.index(tip)) {
                    abandoned.push(branch);
                }
                continue;
            }

            let next = self.choose_direction(slot, &candidates);
            let dead_cells = self.core.visit(maze, next);
            self.grow(maze, tip, next);

            let mut step = Step::forward(tip, next, dead_cells);
            step.abandoned = abandoned;
            return Ok(step);
        }
    }

    fn enable_efficiency(&mut self, dead_ends: SharedDeadEnds) {
        self.core.attach(dead_ends);
    }

    fn enable_heuristic(&mut self) {
        self.heuristic = true;
    }

    fn fill_status(&self, status: &mut String) {
        let _ = writeln!(
            status,
            "{} active paths, {} abandoned cells",
            self.tips.len(),
            self.abandoned_cells
        );
        self.core.fill_status(status);
    }

    fn path(&self, maze: &Maze) -> Vec<Coord> {
        let tip = if self.core.is_solved(maze) {
            self.core.end
        } else {
            self.last
        };
        let mut index = maze.index(tip);
        let mut path = vec![tip];
        while let Some(up) = self.parent[index] {
            path.push(maze.coord(up));
            index = up;
        }
        path.reverse();
        path
    }

    fn is_solved(&self, maze: &Maze) -> bool {
        self.core.is_solved(maze)
    }
}
