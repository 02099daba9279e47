//! Incremental dead-end detection.
//!
//! Every playable cell carries a trajectory distance: the hop count to the end
//! cell through the plain 4-neighbourhood of live cells, ignoring walls. Real
//! walking distances can only be longer, so a cell without any trajectory can
//! never reach the end and is dead.
//!
//! Cells die when a solver visits them. A death can strand cells whose every
//! shortest trajectory ran through it; [`DeadEndChecker::visit`] finds those,
//! re-settles their distances and reports the ones left without a trajectory.

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::rc::Rc;

use log::debug;
use smallvec::SmallVec;

use crate::cell::{Coord, Direction};
use crate::grid::Maze;

/// Engine handle shared by sibling solvers stepping one grid.
pub type SharedDeadEnds = Rc<RefCell<DeadEndChecker>>;

const UNREACHABLE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Live,
    Dead,
    /// Lost every shorter neighbour during the current update.
    Recomputing,
}

pub struct DeadEndChecker {
    width: usize,
    end: usize,
    marks: Vec<Mark>,
    distances: Vec<u32>,
    /// Playable neighbours, pruned of dead ones as they are met.
    neighbors: Vec<SmallVec<[usize; 4]>>,
    dead_count: usize,
}

impl DeadEndChecker {
    /// Builds the distance field for `maze` towards its end cell and marks its
    /// start cell dead.
    pub fn new(maze: &Maze) -> Self {
        Self::with_endpoints(maze, maze.start(), maze.end())
    }

    /// Builds an engine ready to be handed to several solvers.
    pub fn shared(maze: &Maze) -> SharedDeadEnds {
        Rc::new(RefCell::new(Self::new(maze)))
    }

    pub fn with_endpoints(maze: &Maze, start: Coord, end: Coord) -> Self {
        let cell_count = maze.width() * maze.height();
        let mut neighbors = vec![SmallVec::new(); cell_count];
        let mut marks = vec![Mark::Dead; cell_count];

        for cell in maze.cells().filter(|cell| !cell.is_reserved()) {
            let index = maze.index(cell.coord());
            marks[index] = Mark::Live;
            neighbors[index] = Direction::ALL
                .into_iter()
                .filter_map(|dir| maze.neighbor(cell.coord(), dir))
                .filter(|&other| !maze.is_reserved(other))
                .map(|other| maze.index(other))
                .collect();
        }

        let mut checker = Self {
            width: maze.width(),
            end: maze.index(end),
            marks,
            distances: vec![UNREACHABLE; cell_count],
            neighbors,
            dead_count: 0,
        };
        checker.compute_distances();
        checker.visit(start);

        debug!(
            "dead-end engine ready: {} cells, {} dead, end at {:?}",
            cell_count, checker.dead_count, end
        );
        checker
    }

    /// Breadth-first distances from the end; live cells it cannot reach die.
    fn compute_distances(&mut self) {
        self.distances[self.end] = 0;
        let mut queue = VecDeque::from([self.end]);

        while let Some(index) = queue.pop_front() {
            let next = self.distances[index] + 1;
            for &other in &self.neighbors[index] {
                if self.distances[other] == UNREACHABLE {
                    self.distances[other] = next;
                    queue.push_back(other);
                }
            }
        }

        for index in 0..self.marks.len() {
            if self.marks[index] == Mark::Live && self.distances[index] == UNREACHABLE {
                self.marks[index] = Mark::Dead;
                self.dead_count += 1;
            }
        }
    }

    #[inline]
    fn index(&self, (x, y): Coord) -> usize {
        y * self.width + x
    }

    #[inline]
    fn coord(&self, index: usize) -> Coord {
        (index % self.width, index / self.width)
    }

    pub fn end(&self) -> Coord {
        self.coord(self.end)
    }

    /// True if `cell` was visited or has no trajectory to the end.
    pub fn is_dead(&self, cell: Coord) -> bool {
        self.marks[self.index(cell)] == Mark::Dead
    }

    /// Trajectory distance of a live cell.
    pub fn distance(&self, cell: Coord) -> Option<u32> {
        let index = self.index(cell);
        (self.marks[index] == Mark::Live).then_some(self.distances[index])
    }

    /// Number of dead playable cells, visited ones included.
    pub fn dead_count(&self) -> usize {
        self.dead_count
    }

    /// Marks `cell` dead and returns the other cells that lost their last
    /// trajectory as a result. Visiting the end cell or a dead cell is a no-op.
    pub fn visit(&mut self, cell: Coord) -> Vec<Coord> {
        let visited = self.index(cell);
        if visited == self.end || self.marks[visited] != Mark::Live {
            return Vec::new();
        }
        self.marks[visited] = Mark::Dead;
        self.dead_count += 1;

        let stranded = self.collect_stranded(visited);
        if stranded.is_empty() {
            return Vec::new();
        }
        self.resettle(&stranded);

        let mut newly_dead = Vec::new();
        for index in stranded {
            if self.marks[index] == Mark::Recomputing {
                self.marks[index] = Mark::Dead;
                self.distances[index] = UNREACHABLE;
                self.dead_count += 1;
                newly_dead.push(self.coord(index));
            }
        }
        newly_dead
    }

    /// Finds every live cell left without a strictly shorter live neighbour.
    ///
    /// Candidates are processed in non-decreasing distance order, so when a
    /// cell is checked all possible supporters one step closer are settled.
    fn collect_stranded(&mut self, visited: usize) -> Vec<usize> {
        let base = self.distances[visited];
        let mut queue: VecDeque<usize> = self.neighbors[visited]
            .iter()
            .copied()
            .filter(|&other| self.marks[other] == Mark::Live && self.distances[other] > base)
            .collect();
        let mut stranded = Vec::new();

        while let Some(index) = queue.pop_front() {
            if self.marks[index] != Mark::Live {
                continue;
            }
            self.prune_neighbors(index);

            let distance = self.distances[index];
            let supported = self.neighbors[index]
                .iter()
                .any(|&other| self.marks[other] == Mark::Live && self.distances[other] < distance);
            if supported {
                continue;
            }

            self.marks[index] = Mark::Recomputing;
            stranded.push(index);
            queue.extend(
                self.neighbors[index]
                    .iter()
                    .copied()
                    .filter(|&other| {
                        self.marks[other] == Mark::Live && self.distances[other] > distance
                    }),
            );
        }

        stranded
    }

    /// Re-settles stranded cells from their live boundary, shortest first.
    /// Cells the search never reaches stay `Recomputing`.
    fn resettle(&mut self, stranded: &[usize]) {
        let mut heap = BinaryHeap::new();

        for &index in stranded {
            let best = self.neighbors[index]
                .iter()
                .filter(|&&other| self.marks[other] == Mark::Live)
                .map(|&other| self.distances[other] + 1)
                .min()
                .unwrap_or(UNREACHABLE);
            self.distances[index] = best;
            if best != UNREACHABLE {
                heap.push(Reverse((best, index)));
            }
        }

        while let Some(Reverse((distance, index))) = heap.pop() {
            if self.marks[index] != Mark::Recomputing || distance > self.distances[index] {
                continue;
            }
            self.marks[index] = Mark::Live;

            let adjacent = self.neighbors[index].clone();
            for other in adjacent {
                if self.marks[other] == Mark::Recomputing && distance + 1 < self.distances[other] {
                    self.distances[other] = distance + 1;
                    heap.push(Reverse((distance + 1, other)));
                }
            }
        }
    }

    fn prune_neighbors(&mut self, index: usize) {
        let marks = &self.marks;
        self.neighbors[index].retain(|other| marks[*other] != Mark::Dead);
    }
}
