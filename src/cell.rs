//! Grid cells, wall states and compass directions.
//!
//! Coordinates are `(x, y)` with `x` growing east and `y` growing south, so
//! `North` is the row above.

use crate::error::{MazeError, Result};

/// A cell position as `(x, y)`.
pub type Coord = (usize, usize);

/// Highest region id a cell may carry. Region 0 is the primary maze.
pub const MAX_REGION: u8 = 15;

/// One of the four wall slots of a cell.
///
/// The discriminants double as wall slot indices and as the direction field
/// of legacy maze codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    East = 0,
    North = 1,
    West = 2,
    South = 3,
}

impl Direction {
    /// All directions in slot order, counter-clockwise from east.
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::North,
        Direction::West,
        Direction::South,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Direction::East => Direction::West,
            Direction::North => Direction::South,
            Direction::West => Direction::East,
            Direction::South => Direction::North,
        }
    }

    /// Rotates a quarter turn counter-clockwise.
    #[inline]
    pub const fn turn_left(self) -> Self {
        match self {
            Direction::East => Direction::North,
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
        }
    }

    /// Rotates a quarter turn clockwise.
    #[inline]
    pub const fn turn_right(self) -> Self {
        match self {
            Direction::East => Direction::South,
            Direction::North => Direction::East,
            Direction::West => Direction::North,
            Direction::South => Direction::West,
        }
    }

    /// Unit step `(dx, dy)` for this direction.
    #[inline]
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Direction::East => (1, 0),
            Direction::North => (0, -1),
            Direction::West => (-1, 0),
            Direction::South => (0, 1),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Direction::East => "east",
            Direction::North => "north",
            Direction::West => "west",
            Direction::South => "south",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallState {
    Open,
    Closed,
    /// Not yet decided by the generator.
    Undetermined,
}

/// A single grid position with its four wall slots and bookkeeping flags.
///
/// Walls are written only through [`crate::grid::Maze`], which keeps the two
/// sides of every shared wall equal.
#[derive(Debug, Clone)]
pub struct Cell {
    x: usize,
    y: usize,
    walls: [WallState; 4],
    /// Reached by the generator.
    connected: bool,
    /// Permanently excluded from the playable grid.
    reserved: bool,
    /// Reached by the current solve attempt.
    visited: bool,
    region: u8,
}

impl Cell {
    pub fn new(x: usize, y: usize) -> Self {
        Self {
            x,
            y,
            walls: [WallState::Undetermined; 4],
            connected: false,
            reserved: false,
            visited: false,
            region: 0,
        }
    }

    #[inline]
    pub fn coord(&self) -> Coord {
        (self.x, self.y)
    }

    #[inline]
    pub fn wall(&self, dir: Direction) -> WallState {
        self.walls[dir.index()]
    }

    #[inline]
    pub(crate) fn set_wall(&mut self, dir: Direction, state: WallState) {
        self.walls[dir.index()] = state;
    }

    #[inline]
    pub fn is_open(&self, dir: Direction) -> bool {
        self.wall(dir) == WallState::Open
    }

    /// Directions whose wall is open.
    pub fn open_walls(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(move |&dir| self.is_open(dir))
    }

    pub fn closed_walls(&self) -> usize {
        self.walls
            .iter()
            .filter(|&&state| state == WallState::Closed)
            .count()
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    #[inline]
    pub fn is_reserved(&self) -> bool {
        self.reserved
    }

    /// Sets the reserved flag. Reservation is permanent: clearing it fails.
    pub fn set_reserved(&mut self, reserved: bool) -> Result<()> {
        if !reserved && self.reserved {
            return Err(MazeError::InvalidRegion {
                reason: format!("cell ({}, {}) cannot be un-reserved", self.x, self.y),
            });
        }
        self.reserved = reserved;
        Ok(())
    }

    #[inline]
    pub fn is_visited(&self) -> bool {
        self.visited
    }

    pub(crate) fn set_visited(&mut self, visited: bool) {
        self.visited = visited;
    }

    #[inline]
    pub fn region(&self) -> u8 {
        self.region
    }

    pub fn set_region(&mut self, region: u8) -> Result<()> {
        if region > MAX_REGION {
            return Err(MazeError::InvalidRegion {
                reason: format!("region id {} exceeds {}", region, MAX_REGION),
            });
        }
        self.region = region;
        Ok(())
    }
}
