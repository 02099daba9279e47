//! Grid representation, spanning-tree generation and endpoint placement.
//!
//! The grid is a flat row-major array of [`Cell`]s. Every wall is stored on
//! both cells that share it; [`Maze::set_wall`] is the only writer and keeps
//! the two sides equal.

use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, warn};
use rand::{Rng, RngCore};
use smallvec::SmallVec;

use crate::cell::{Cell, Coord, Direction, WallState};
use crate::code::{self, MazeParams};
use crate::error::{MazeError, Result};
use crate::{shared_rng, SharedRng};

/// Smallest supported grid side.
pub const MIN_SIZE: usize = 2;
/// Largest supported grid side.
pub const MAX_SIZE: usize = 1024;

/// Placement retries before falling back to a deterministic choice.
const MAX_PLACEMENT_ATTEMPTS: usize = 1000;
/// Uniform draws summed per border offset.
const BORDER_DRAWS: usize = 2;
/// Probability of rejecting an end cell that is not dead-end shaped.
const DEAD_END_PREFERENCE: f64 = 0.9;

/// An axis-aligned block of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn contains(&self, (x, y): Coord) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// A rectangular maze.
pub struct Maze {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    start: Coord,
    end: Coord,
    travel: Direction,
    seed: Option<u64>,
    rng: SharedRng,
    reserved_areas: Vec<Rect>,
    generated: bool,
}

impl Maze {
    /// Creates an ungenerated grid driven by a generator seeded from `seed`.
    pub fn new(width: usize, height: usize, seed: u64) -> Result<Self> {
        let mut maze = Self::with_rng(width, height, shared_rng(seed))?;
        maze.seed = Some(seed);
        Ok(maze)
    }

    /// Creates an ungenerated grid driven by an existing generator.
    ///
    /// Such a maze has no seed and therefore no code.
    pub fn with_rng(width: usize, height: usize, rng: SharedRng) -> Result<Self> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&width) || !(MIN_SIZE..=MAX_SIZE).contains(&height) {
            return Err(MazeError::InvalidDimensions { width, height });
        }

        let cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| Cell::new(x, y)))
            .collect();

        Ok(Self {
            width,
            height,
            cells,
            start: (0, 0),
            end: (width - 1, height - 1),
            travel: Direction::East,
            seed: None,
            rng,
            reserved_areas: Vec::new(),
            generated: false,
        })
    }

    /// Rebuilds the maze a code describes: same seed, same walls, same endpoints.
    pub fn from_params(params: &MazeParams) -> Result<Self> {
        let mut maze = Self::new(params.width, params.height, params.seed)?;
        maze.generate()?;
        match &params.endpoints {
            Some(endpoints) => {
                maze.set_endpoints(endpoints.start, endpoints.end)?;
                maze.travel = endpoints.travel;
            }
            None => maze.place_endpoints()?,
        }
        Ok(maze)
    }

    /// Decodes a maze code and rebuilds the maze.
    pub fn from_code(maze_code: &str) -> Result<Self> {
        Self::from_params(&code::decode(maze_code)?)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Handle to the generator this maze was built with.
    pub fn rng(&self) -> SharedRng {
        Rc::clone(&self.rng)
    }

    #[inline]
    pub fn start(&self) -> Coord {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Coord {
        self.end
    }

    /// Direction of travel from start to end chosen at placement.
    pub fn travel_direction(&self) -> Direction {
        self.travel
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn reserved_areas(&self) -> &[Rect] {
        &self.reserved_areas
    }

    /// Converts `(x, y)` to a linear cell index.
    #[inline(always)]
    pub fn index(&self, (x, y): Coord) -> usize {
        y * self.width + x
    }

    /// Converts a linear cell index to `(x, y)`.
    #[inline(always)]
    pub fn coord(&self, index: usize) -> Coord {
        (index % self.width, index / self.width)
    }

    #[inline]
    pub fn contains(&self, (x, y): Coord) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    pub fn cell(&self, coord: Coord) -> &Cell {
        &self.cells[self.index(coord)]
    }

    #[inline]
    fn cell_mut(&mut self, coord: Coord) -> &mut Cell {
        let index = self.index(coord);
        &mut self.cells[index]
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// The adjacent cell in `dir`, or `None` past the border.
    #[inline]
    pub fn neighbor(&self, (x, y): Coord, dir: Direction) -> Option<Coord> {
        let (dx, dy) = dir.offset();
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        self.contains((nx, ny)).then_some((nx, ny))
    }

    #[inline]
    pub fn wall(&self, coord: Coord, dir: Direction) -> WallState {
        self.cell(coord).wall(dir)
    }

    #[inline]
    pub fn is_open(&self, coord: Coord, dir: Direction) -> bool {
        self.wall(coord, dir) == WallState::Open
    }

    /// Sets a wall on both cells that share it.
    pub(crate) fn set_wall(&mut self, coord: Coord, dir: Direction, state: WallState) {
        self.cell_mut(coord).set_wall(dir, state);
        if let Some(other) = self.neighbor(coord, dir) {
            self.cell_mut(other).set_wall(dir.opposite(), state);
        }
    }

    #[inline]
    pub fn is_reserved(&self, coord: Coord) -> bool {
        self.cell(coord).is_reserved()
    }

    /// Excludes a rectangle from the playable grid. Only allowed before generation.
    pub fn reserve_region(&mut self, area: Rect) -> Result<()> {
        if self.generated {
            return Err(MazeError::InvalidRegion {
                reason: "cannot reserve cells after generation".to_string(),
            });
        }
        if area.width == 0
            || area.height == 0
            || area.x + area.width > self.width
            || area.y + area.height > self.height
        {
            return Err(MazeError::InvalidRegion {
                reason: format!("{:?} does not fit a {}x{} grid", area, self.width, self.height),
            });
        }

        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                self.cell_mut((x, y)).set_reserved(true)?;
            }
        }
        self.reserved_areas.push(area);
        Ok(())
    }

    /// Excludes every cell for which `excluded` holds, e.g. the outside of an
    /// outline shape. Returns the number of newly reserved cells.
    pub fn reserve_where<F>(&mut self, excluded: F) -> Result<usize>
    where
        F: Fn(usize, usize) -> bool,
    {
        if self.generated {
            return Err(MazeError::InvalidRegion {
                reason: "cannot reserve cells after generation".to_string(),
            });
        }

        let mut count = 0;
        for cell in &mut self.cells {
            let (x, y) = cell.coord();
            if !cell.is_reserved() && excluded(x, y) {
                cell.set_reserved(true)?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Assigns a region id to a cell.
    pub fn set_region(&mut self, coord: Coord, region: u8) -> Result<()> {
        if !self.contains(coord) {
            return Err(MazeError::InvalidRegion {
                reason: format!("cell {:?} is outside the grid", coord),
            });
        }
        self.cell_mut(coord).set_region(region)
    }

    /// Number of non-reserved cells.
    pub fn playable_count(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_reserved()).count()
    }

    /// Resets every wall to its pre-generation state.
    ///
    /// The outer border and the boundary of reserved space are closed. Walls
    /// between two reserved cells, and border walls of reserved cells, are
    /// open so reserved blocks form one seamless area.
    fn initialize_walls(&mut self) {
        for index in 0..self.cells.len() {
            let coord = self.coord(index);
            let reserved = self.cells[index].is_reserved();

            for dir in Direction::ALL {
                let state = match self.neighbor(coord, dir) {
                    None if reserved => WallState::Open,
                    None => WallState::Closed,
                    Some(other) => match (reserved, self.is_reserved(other)) {
                        (true, true) => WallState::Open,
                        (false, false) => WallState::Undetermined,
                        _ => WallState::Closed,
                    },
                };
                self.cells[index].set_wall(dir, state);
            }
            self.cells[index].set_connected(false);
        }
    }

    /// Carves a spanning tree over all playable cells.
    ///
    /// Depth-first growth from a random cell: a popped cell resolves walls to
    /// already connected (or reserved) neighbours as closed, opens one random
    /// remaining candidate, and goes back on the stack if more candidates
    /// remain. Each cell is connected exactly once, through exactly one wall.
    pub fn generate(&mut self) -> Result<()> {
        self.initialize_walls();

        let playable: Vec<Coord> = self
            .cells
            .iter()
            .filter(|cell| !cell.is_reserved())
            .map(Cell::coord)
            .collect();
        if playable.is_empty() {
            return Err(MazeError::InvalidRegion {
                reason: "every cell is reserved".to_string(),
            });
        }

        let rng_handle = Rc::clone(&self.rng);
        let mut rng = rng_handle.borrow_mut();

        let root = playable[rng.gen_range(0..playable.len())];
        self.cell_mut(root).set_connected(true);
        let mut stack = vec![root];

        while let Some(coord) = stack.pop() {
            let mut candidates: SmallVec<[(Direction, Coord); 4]> = SmallVec::new();

            for dir in Direction::ALL {
                if self.wall(coord, dir) != WallState::Undetermined {
                    continue;
                }
                let Some(other) = self.neighbor(coord, dir) else {
                    continue;
                };
                let other_cell = self.cell(other);
                if other_cell.is_connected() || other_cell.is_reserved() {
                    // joining would close a cycle or leak into reserved space
                    self.set_wall(coord, dir, WallState::Closed);
                } else {
                    candidates.push((dir, other));
                }
            }

            if candidates.is_empty() {
                continue;
            }

            let (dir, other) = candidates.remove(rng.gen_range(0..candidates.len()));
            self.set_wall(coord, dir, WallState::Open);
            self.cell_mut(other).set_connected(true);

            if !candidates.is_empty() {
                stack.push(coord);
            }
            stack.push(other);
        }
        drop(rng);

        // cells cut off by an exclusion predicate can never be reached
        let mut orphaned = 0;
        for index in 0..self.cells.len() {
            let cell = &self.cells[index];
            if cell.is_reserved() || cell.is_connected() {
                continue;
            }
            self.cells[index].set_reserved(true)?;
            orphaned += 1;
        }
        if orphaned > 0 {
            debug!("reserved {} cells unreachable from the generation root", orphaned);
            self.initialize_reserved_boundaries();
        }

        self.generated = true;
        debug!(
            "generated {}x{} maze with {} playable cells",
            self.width,
            self.height,
            self.playable_count()
        );
        Ok(())
    }

    /// Re-applies the reserved wall rules after late reservations, leaving
    /// walls between playable cells untouched.
    fn initialize_reserved_boundaries(&mut self) {
        for index in 0..self.cells.len() {
            let coord = self.coord(index);
            if !self.cells[index].is_reserved() {
                continue;
            }
            for dir in Direction::ALL {
                let state = match self.neighbor(coord, dir) {
                    None => WallState::Open,
                    Some(other) if self.is_reserved(other) => WallState::Open,
                    Some(_) => WallState::Closed,
                };
                self.set_wall(coord, dir, state);
            }
        }
    }

    /// Picks start and end cells biased toward opposite edges.
    ///
    /// A travel direction is drawn first; start is placed near the edge it
    /// leaves from and end near the edge it heads to. End cells with fewer
    /// than three closed walls are usually rejected.
    pub fn place_endpoints(&mut self) -> Result<()> {
        if self.playable_count() < 2 {
            return Err(MazeError::InvalidEndpoints {
                reason: "a maze needs at least two playable cells".to_string(),
            });
        }

        let rng_handle = Rc::clone(&self.rng);
        let mut rng = rng_handle.borrow_mut();

        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let travel = Direction::ALL[rng.gen_range(0..4)];
            let (along, across) = match travel {
                Direction::East | Direction::West => (self.width, self.height),
                Direction::North | Direction::South => (self.height, self.width),
            };

            let near = border_offset(&mut *rng, along);
            let far = along - 1 - border_offset(&mut *rng, along);
            let start_across = rng.gen_range(0..across);
            let end_across = rng.gen_range(0..across);

            let (start, end) = match travel {
                Direction::East => ((near, start_across), (far, end_across)),
                Direction::West => ((far, start_across), (near, end_across)),
                Direction::South => ((start_across, near), (end_across, far)),
                Direction::North => ((start_across, far), (end_across, near)),
            };

            if !travels(start, end, travel) {
                continue;
            }
            if self.is_reserved(start) || self.is_reserved(end) {
                continue;
            }
            if self.cell(end).closed_walls() < 3 && rng.gen_bool(DEAD_END_PREFERENCE) {
                continue;
            }

            self.start = start;
            self.end = end;
            self.travel = travel;
            debug!("placed start {:?} and end {:?} heading {}", start, end, travel.name());
            return Ok(());
        }

        let mut playable = self.cells.iter().filter(|cell| !cell.is_reserved());
        let first = playable.next().map(Cell::coord);
        let last = playable.last().map(Cell::coord);
        let (Some(start), Some(end)) = (first, last) else {
            return Err(MazeError::InvalidEndpoints {
                reason: "a maze needs at least two playable cells".to_string(),
            });
        };
        warn!(
            "endpoint placement gave up after {} attempts, using {:?} -> {:?}",
            MAX_PLACEMENT_ATTEMPTS, start, end
        );
        self.start = start;
        self.end = end;
        self.travel = travel_between(start, end);
        Ok(())
    }

    /// Sets start and end explicitly.
    pub fn set_endpoints(&mut self, start: Coord, end: Coord) -> Result<()> {
        for (name, coord) in [("start", start), ("end", end)] {
            if !self.contains(coord) {
                return Err(MazeError::InvalidEndpoints {
                    reason: format!("{} {:?} is outside the grid", name, coord),
                });
            }
            if self.is_reserved(coord) {
                return Err(MazeError::InvalidEndpoints {
                    reason: format!("{} {:?} is reserved", name, coord),
                });
            }
        }
        if start == end {
            return Err(MazeError::InvalidEndpoints {
                reason: format!("start and end are both {:?}", start),
            });
        }

        self.start = start;
        self.end = end;
        self.travel = travel_between(start, end);
        Ok(())
    }

    #[inline]
    pub fn is_visited(&self, coord: Coord) -> bool {
        self.cell(coord).is_visited()
    }

    pub(crate) fn set_visited(&mut self, coord: Coord) {
        self.cell_mut(coord).set_visited(true);
    }

    /// Clears the visited flag of every cell in `region`.
    pub fn clear_visited(&mut self, region: u8) {
        for cell in &mut self.cells {
            if cell.region() == region {
                cell.set_visited(false);
            }
        }
    }

    /// True once the end cell has been reached.
    pub fn is_solved(&self) -> bool {
        self.is_visited(self.end)
    }

    /// Open walls between two playable cells, each counted once.
    pub fn open_wall_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| !cell.is_reserved())
            .map(|cell| {
                [Direction::East, Direction::South]
                    .into_iter()
                    .filter(|&dir| {
                        cell.is_open(dir)
                            && self
                                .neighbor(cell.coord(), dir)
                                .is_some_and(|other| !self.is_reserved(other))
                    })
                    .count()
            })
            .sum()
    }

    /// True if every shared wall reads the same from both sides.
    pub fn walls_consistent(&self) -> bool {
        self.cells.iter().all(|cell| {
            Direction::ALL.into_iter().all(|dir| {
                match self.neighbor(cell.coord(), dir) {
                    Some(other) => cell.wall(dir) == self.wall(other, dir.opposite()),
                    None => true,
                }
            })
        })
    }

    /// True if the open walls form a spanning tree over the playable cells.
    pub fn is_spanning_tree(&self) -> bool {
        let playable = self.playable_count();
        if playable == 0 || self.open_wall_count() != playable - 1 {
            return false;
        }

        // no open wall may lead out of the playable area
        for cell in self.cells.iter().filter(|cell| !cell.is_reserved()) {
            for dir in cell.open_walls() {
                match self.neighbor(cell.coord(), dir) {
                    Some(other) if !self.is_reserved(other) => {}
                    _ => return false,
                }
            }
        }

        let Some(root) = self.cells.iter().find(|cell| !cell.is_reserved()) else {
            return false;
        };
        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::from([root.coord()]);
        seen[self.index(root.coord())] = true;
        let mut reached = 1;

        while let Some(coord) = queue.pop_front() {
            for dir in self.cell(coord).open_walls() {
                let Some(other) = self.neighbor(coord, dir) else {
                    continue;
                };
                let index = self.index(other);
                if !seen[index] {
                    seen[index] = true;
                    reached += 1;
                    queue.push_back(other);
                }
            }
        }

        reached == playable
    }

    /// The parameters that reproduce this maze.
    pub fn params(&self) -> Result<MazeParams> {
        let seed = self.seed.ok_or(MazeError::Unseeded)?;
        Ok(MazeParams::new(seed, self.width, self.height))
    }

    /// The compact code for this maze.
    pub fn code(&self) -> Result<String> {
        code::encode(&self.params()?)
    }

    /// The legacy code, which also pins start, end and travel direction.
    pub fn legacy_code(&self) -> Result<String> {
        let params = self.params()?.with_endpoints(self.start, self.end, self.travel);
        code::encode_legacy(&params)
    }

    /// Formats the maze as text.
    ///
    /// Walls are `+`, `-` and `|`; `S` and `E` mark the endpoints and `#`
    /// reserved cells. Undecided walls show as `?`.
    pub fn format(&self) -> String {
        self.format_with_path(&[])
    }

    /// Formats the maze with `path` cells marked `*`.
    pub fn format_with_path(&self, path: &[Coord]) -> String {
        let mut on_path = vec![false; self.cells.len()];
        for &coord in path {
            if self.contains(coord) {
                on_path[self.index(coord)] = true;
            }
        }

        let horizontal = |state: WallState| match state {
            WallState::Open => ' ',
            WallState::Closed => '-',
            WallState::Undetermined => '?',
        };
        let vertical = |state: WallState| match state {
            WallState::Open => ' ',
            WallState::Closed => '|',
            WallState::Undetermined => '?',
        };

        let mut output = String::new();
        for y in 0..self.height {
            for x in 0..self.width {
                output.push('+');
                output.push(horizontal(self.wall((x, y), Direction::North)));
            }
            output.push_str("+\n");

            for x in 0..self.width {
                let coord = (x, y);
                output.push(vertical(self.wall(coord, Direction::West)));
                let content = if coord == self.start {
                    'S'
                } else if coord == self.end {
                    'E'
                } else if self.is_reserved(coord) {
                    '#'
                } else if on_path[self.index(coord)] {
                    '*'
                } else {
                    ' '
                };
                output.push(content);
            }
            output.push(vertical(self.wall((self.width - 1, y), Direction::East)));
            output.push('\n');
        }

        for x in 0..self.width {
            output.push('+');
            output.push(horizontal(self.wall((x, self.height - 1), Direction::South)));
        }
        output.push('+');

        output
    }
}

/// Distance of an endpoint from its edge: a sum of uniform draws folded into
/// a triangular shape peaking at the edge, clipped to a third of the extent.
fn border_offset(rng: &mut dyn RngCore, extent: usize) -> usize {
    let limit = (extent - 1) / 3;
    let half = BORDER_DRAWS as f64 / 2.0;
    let draw: f64 = (0..BORDER_DRAWS).map(|_| rng.gen::<f64>()).sum();
    let folded = (draw - half).abs() / half;
    ((folded * extent as f64) as usize).min(limit)
}

/// True if moving from `start` to `end` makes progress in `travel`.
fn travels(start: Coord, end: Coord, travel: Direction) -> bool {
    match travel {
        Direction::East => start.0 < end.0,
        Direction::West => start.0 > end.0,
        Direction::South => start.1 < end.1,
        Direction::North => start.1 > end.1,
    }
}

/// The dominant direction from `start` to `end`.
fn travel_between(start: Coord, end: Coord) -> Direction {
    let dx = end.0 as isize - start.0 as isize;
    let dy = end.1 as isize - start.1 as isize;
    if dx.abs() >= dy.abs() {
        if dx >= 0 {
            Direction::East
        } else {
            Direction::West
        }
    } else if dy > 0 {
        Direction::South
    } else {
        Direction::North
    }
}
