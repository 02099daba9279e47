//! Strategy registry.
//!
//! Every strategy has a CamelCase name. A solver name is a strategy name with
//! optional `Efficient` and `Heuristic` tags in front, in either order, e.g.
//! `EfficientHeuristicProximityFlooder`. Names match case-insensitively.

use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::dead_ends::{DeadEndChecker, SharedDeadEnds};
use crate::error::{MazeError, Result};
use crate::grid::Maze;
use crate::solver::{
    Backtracker, DirectionChoice, Flooder, Hand, PathValue, Reference, Solver, Walker,
};

const EFFICIENT_TAG: &str = "Efficient";
const HEURISTIC_TAG: &str = "Heuristic";

/// Weight the worst tip keeps relative to the best in weighted flooders.
const WEIGHTING_SCALE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    RandomBacktracker,
    CloseBacktracker,
    FarBacktracker,
    ProximityBacktracker,
    RemoteBacktracker,
    OpposedBacktracker,
    HomeboundBacktracker,
    LeftHandWalker,
    RightHandWalker,
    RandomFlooder,
    RoundRobinFlooder,
    CloseFlooder,
    FarFlooder,
    ProximityFlooder,
    OpposedFlooder,
    ThickestFlooder,
    ThinnestFlooder,
    SpreadingFlooder,
    WeightedProximityFlooder,
    WeightedOpposedFlooder,
    WeightedThickestFlooder,
}

impl Strategy {
    pub const ALL: [Strategy; 21] = [
        Strategy::RandomBacktracker,
        Strategy::CloseBacktracker,
        Strategy::FarBacktracker,
        Strategy::ProximityBacktracker,
        Strategy::RemoteBacktracker,
        Strategy::OpposedBacktracker,
        Strategy::HomeboundBacktracker,
        Strategy::LeftHandWalker,
        Strategy::RightHandWalker,
        Strategy::RandomFlooder,
        Strategy::RoundRobinFlooder,
        Strategy::CloseFlooder,
        Strategy::FarFlooder,
        Strategy::ProximityFlooder,
        Strategy::OpposedFlooder,
        Strategy::ThickestFlooder,
        Strategy::ThinnestFlooder,
        Strategy::SpreadingFlooder,
        Strategy::WeightedProximityFlooder,
        Strategy::WeightedOpposedFlooder,
        Strategy::WeightedThickestFlooder,
    ];

    /// Tip ranking of a flooder strategy.
    fn path_value(self) -> Option<PathValue> {
        let value = match self {
            Strategy::RandomFlooder => PathValue::Random,
            Strategy::RoundRobinFlooder => PathValue::RoundRobin,
            Strategy::CloseFlooder => PathValue::Close,
            Strategy::FarFlooder => PathValue::Far,
            Strategy::ProximityFlooder | Strategy::WeightedProximityFlooder => PathValue::Proximity,
            Strategy::OpposedFlooder | Strategy::WeightedOpposedFlooder => PathValue::Opposed,
            Strategy::ThickestFlooder | Strategy::WeightedThickestFlooder => PathValue::Thickest,
            Strategy::ThinnestFlooder => PathValue::Thinnest,
            Strategy::SpreadingFlooder => PathValue::Spreading,
            _ => return None,
        };
        Some(value)
    }

    fn is_weighted(self) -> bool {
        matches!(
            self,
            Strategy::WeightedProximityFlooder
                | Strategy::WeightedOpposedFlooder
                | Strategy::WeightedThickestFlooder
        )
    }

    fn direction_choice(self) -> Option<DirectionChoice> {
        let choice = match self {
            Strategy::RandomBacktracker => DirectionChoice::Random,
            Strategy::CloseBacktracker => DirectionChoice::Closest(Reference::Start),
            Strategy::FarBacktracker => DirectionChoice::Farthest(Reference::Start),
            Strategy::ProximityBacktracker => DirectionChoice::Closest(Reference::End),
            Strategy::RemoteBacktracker => DirectionChoice::Farthest(Reference::End),
            Strategy::OpposedBacktracker => DirectionChoice::Closest(Reference::Opposite),
            Strategy::HomeboundBacktracker => DirectionChoice::Farthest(Reference::Opposite),
            _ => return None,
        };
        Some(choice)
    }

    pub fn name(self) -> &'static str {
        match self {
            Strategy::RandomBacktracker => "RandomBacktracker",
            Strategy::CloseBacktracker => "CloseBacktracker",
            Strategy::FarBacktracker => "FarBacktracker",
            Strategy::ProximityBacktracker => "ProximityBacktracker",
            Strategy::RemoteBacktracker => "RemoteBacktracker",
            Strategy::OpposedBacktracker => "OpposedBacktracker",
            Strategy::HomeboundBacktracker => "HomeboundBacktracker",
            Strategy::LeftHandWalker => "LeftHandWalker",
            Strategy::RightHandWalker => "RightHandWalker",
            Strategy::RandomFlooder => "RandomFlooder",
            Strategy::RoundRobinFlooder => "RoundRobinFlooder",
            Strategy::CloseFlooder => "CloseFlooder",
            Strategy::FarFlooder => "FarFlooder",
            Strategy::ProximityFlooder => "ProximityFlooder",
            Strategy::OpposedFlooder => "OpposedFlooder",
            Strategy::ThickestFlooder => "ThickestFlooder",
            Strategy::ThinnestFlooder => "ThinnestFlooder",
            Strategy::SpreadingFlooder => "SpreadingFlooder",
            Strategy::WeightedProximityFlooder => "WeightedProximityFlooder",
            Strategy::WeightedOpposedFlooder => "WeightedOpposedFlooder",
            Strategy::WeightedThickestFlooder => "WeightedThickestFlooder",
        }
    }

    /// Wanders too aimlessly to make an interesting random pick.
    pub fn is_too_dumb(self) -> bool {
        matches!(
            self,
            Strategy::CloseBacktracker
                | Strategy::RemoteBacktracker
                | Strategy::HomeboundBacktracker
                | Strategy::CloseFlooder
                | Strategy::RoundRobinFlooder
        )
    }

    /// Heads for the end too directly to make an interesting random pick.
    pub fn is_too_smart(self) -> bool {
        matches!(self, Strategy::ProximityFlooder)
    }

    pub fn supports_heuristic(self) -> bool {
        self.path_value().is_some_and(PathValue::is_ranked)
    }

    /// Strategies eligible for a random pick.
    pub fn general_use() -> impl Iterator<Item = Strategy> {
        Strategy::ALL
            .into_iter()
            .filter(|strategy| !strategy.is_too_dumb() && !strategy.is_too_smart())
    }

    fn instantiate(self, maze: &mut Maze) -> Box<dyn Solver> {
        if let Some(choice) = self.direction_choice() {
            return Box::new(Backtracker::new(maze, choice));
        }
        match (self, self.path_value()) {
            (Strategy::RightHandWalker, _) => Box::new(Walker::new(maze, Hand::Right)),
            (strategy, Some(value)) if strategy.is_weighted() => {
                Box::new(Flooder::new(maze, value).with_weighting(WEIGHTING_SCALE))
            }
            (_, Some(value)) => Box::new(Flooder::new(maze, value)),
            // the left-hand walker is all that is left
            _ => Box::new(Walker::new(maze, Hand::Left)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = MazeError;

    fn from_str(name: &str) -> Result<Self> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| MazeError::UnknownStrategy {
                name: name.to_string(),
            })
    }
}

/// A strategy plus its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverSpec {
    pub strategy: Strategy,
    /// Prune candidates with a dead-end engine.
    pub efficient: bool,
    /// Penalize tips near abandoned branches. Flooders with ranked tips only.
    pub heuristic: bool,
}

impl SolverSpec {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            efficient: false,
            heuristic: false,
        }
    }

    pub fn efficient(mut self) -> Self {
        self.efficient = true;
        self
    }

    pub fn heuristic(mut self) -> Self {
        self.heuristic = true;
        self
    }

    /// A general-use strategy with random modifiers.
    pub fn random(rng: &mut dyn RngCore) -> Self {
        let candidates: Vec<Strategy> = Strategy::general_use().collect();
        let strategy = candidates
            .choose(rng)
            .copied()
            .unwrap_or(Strategy::RandomBacktracker);
        Self {
            strategy,
            efficient: rng.gen_bool(0.5),
            heuristic: strategy.supports_heuristic() && rng.gen_bool(0.5),
        }
    }

    /// Parses `name`, falling back to a random pick when it is missing or unknown.
    pub fn from_name(name: Option<&str>, rng: &mut dyn RngCore) -> Self {
        match name.map(str::parse::<SolverSpec>) {
            Some(Ok(spec)) => spec,
            Some(Err(err)) => {
                let spec = Self::random(rng);
                warn!("{}; using {} instead", err, spec);
                spec
            }
            None => Self::random(rng),
        }
    }

    /// Builds the solver, with its own dead-end engine when efficient.
    pub fn build(&self, maze: &mut Maze) -> Box<dyn Solver> {
        let dead_ends = self.efficient.then(|| DeadEndChecker::shared(maze));
        self.build_with(maze, dead_ends)
    }

    /// Builds the solver around an engine shared with sibling solvers.
    pub fn build_with(
        &self,
        maze: &mut Maze,
        dead_ends: Option<SharedDeadEnds>,
    ) -> Box<dyn Solver> {
        let mut solver = self.strategy.instantiate(maze);
        if let Some(dead_ends) = dead_ends.filter(|_| self.efficient) {
            solver.enable_efficiency(dead_ends);
        }
        if self.heuristic {
            if self.strategy.supports_heuristic() {
                solver.enable_heuristic();
            } else {
                warn!("{} has no use for the heuristic, ignoring it", self.strategy);
            }
        }
        debug!("built {}", self);
        solver
    }
}

impl fmt::Display for SolverSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.efficient {
            f.write_str(EFFICIENT_TAG)?;
        }
        if self.heuristic {
            f.write_str(HEURISTIC_TAG)?;
        }
        f.write_str(self.strategy.name())
    }
}

/// Splits `tag` off the front of `name`, ignoring ASCII case.
fn strip_tag<'a>(name: &'a str, tag: &str) -> Option<&'a str> {
    let head = name.get(..tag.len())?;
    head.eq_ignore_ascii_case(tag).then(|| &name[tag.len()..])
}

impl FromStr for SolverSpec {
    type Err = MazeError;

    fn from_str(name: &str) -> Result<Self> {
        let mut rest = name.trim();
        let (mut efficient, mut heuristic) = (false, false);
        loop {
            if let Some(tail) = strip_tag(rest, EFFICIENT_TAG).filter(|_| !efficient) {
                efficient = true;
                rest = tail;
            } else if let Some(tail) = strip_tag(rest, HEURISTIC_TAG).filter(|_| !heuristic) {
                heuristic = true;
                rest = tail;
            } else {
                break;
            }
        }

        let strategy = rest.parse::<Strategy>().map_err(|_| MazeError::UnknownStrategy {
            name: name.to_string(),
        })?;
        Ok(Self {
            strategy,
            efficient,
            heuristic,
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rustc_hash::FxHashSet;

    use super::*;
    use crate::{share_rng, NullDrawer, StepRecorder};

    type Moves = Vec<(crate::Coord, crate::Coord, bool)>;

    fn solve_all(maze_seed: u64, spec: SolverSpec) -> (Maze, Moves) {
        let mut maze = Maze::new(13, 9, maze_seed).unwrap();
        maze.generate().unwrap();
        maze.place_endpoints().unwrap();
        let mut solver = spec.build(&mut maze);
        let mut recorder = StepRecorder::default();
        solver.solve(&mut maze, &mut recorder).unwrap();
        assert!(solver.is_solved(&maze), "{spec}");
        assert_eq!(solver.step(&mut maze), Err(MazeError::AlreadySolved), "{spec}");
        (maze, recorder.steps)
    }

    #[test]
    fn test_names_are_unique_and_parse_back() {
        let names: FxHashSet<&str> = Strategy::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), Strategy::ALL.len());
        for strategy in Strategy::ALL {
            assert_eq!(strategy.name().parse::<Strategy>(), Ok(strategy));
            assert_eq!(
                strategy.name().to_ascii_lowercase().parse::<Strategy>(),
                Ok(strategy)
            );
        }
    }

    #[test]
    fn test_tags_parse_in_either_order() {
        let expected = SolverSpec::new(Strategy::ProximityFlooder).efficient().heuristic();
        assert_eq!(
            "EfficientHeuristicProximityFlooder".parse::<SolverSpec>(),
            Ok(expected)
        );
        assert_eq!(
            "heuristicEfficientProximityFlooder".parse::<SolverSpec>(),
            Ok(expected)
        );
        assert_eq!(expected.to_string(), "EfficientHeuristicProximityFlooder");
        assert_eq!(
            "EfficientLeftHandWalker".parse::<SolverSpec>(),
            Ok(SolverSpec::new(Strategy::LeftHandWalker).efficient())
        );
    }

    #[test]
    fn test_unknown_names_are_rejected() {
        assert!(matches!(
            "SidewaysFlooder".parse::<SolverSpec>(),
            Err(MazeError::UnknownStrategy { .. })
        ));
        assert!("EfficientEfficientRandomFlooder".parse::<SolverSpec>().is_err());
        assert!("Efficient".parse::<SolverSpec>().is_err());
    }

    #[test]
    fn test_random_fallback_skips_flagged_strategies() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let spec = SolverSpec::from_name(Some("NoSuchSolver"), &mut rng);
            assert!(!spec.strategy.is_too_dumb() && !spec.strategy.is_too_smart());
            assert!(!spec.heuristic || spec.strategy.supports_heuristic());
            let spec = SolverSpec::from_name(None, &mut rng);
            assert!(!spec.strategy.is_too_dumb() && !spec.strategy.is_too_smart());
        }
        let named = SolverSpec::from_name(Some("FarBacktracker"), &mut rng);
        assert_eq!(named, SolverSpec::new(Strategy::FarBacktracker));
    }

    #[test]
    fn test_heuristic_support() {
        assert!(Strategy::ThickestFlooder.supports_heuristic());
        assert!(Strategy::WeightedOpposedFlooder.supports_heuristic());
        assert!(!Strategy::RandomFlooder.supports_heuristic());
        assert!(!Strategy::RoundRobinFlooder.supports_heuristic());
        assert!(!Strategy::RandomBacktracker.supports_heuristic());
    }

    #[test]
    fn test_built_solver_reports_strategy_name() {
        let mut maze = Maze::new(6, 6, 2).unwrap();
        maze.generate().unwrap();
        maze.place_endpoints().unwrap();
        for strategy in Strategy::ALL {
            let solver = SolverSpec::new(strategy).efficient().build(&mut maze);
            assert_eq!(solver.name(), strategy.name());
        }
    }

    #[test]
    fn test_every_strategy_solves_with_connected_visits() {
        for seed in 0..6 {
            for strategy in Strategy::ALL {
                for efficient in [false, true] {
                    let mut spec = SolverSpec::new(strategy);
                    spec.efficient = efficient;
                    spec.heuristic = strategy.supports_heuristic();
                    let (maze, steps) = solve_all(seed, spec);

                    // every step crosses an open wall and only forward steps discover cells
                    let mut seen: FxHashSet<crate::Coord> = FxHashSet::default();
                    seen.insert(maze.start());
                    for &(from, to, forward) in &steps {
                        assert!(seen.contains(&from), "{spec} seed {seed}");
                        assert_eq!(!seen.contains(&to), forward, "{spec} seed {seed}");
                        seen.insert(to);
                        let open = crate::Direction::ALL.iter().any(|&dir| {
                            maze.neighbor(from, dir) == Some(to) && maze.is_open(from, dir)
                        });
                        assert!(open, "{spec} seed {seed}: {from:?} -> {to:?}");
                    }
                    assert!(seen.contains(&maze.end()));
                }
            }
        }
    }

    #[test]
    fn test_registered_choices_match_solver_names() {
        for strategy in Strategy::ALL {
            if let Some(choice) = strategy.direction_choice() {
                assert_eq!(choice.label(), strategy.name());
            }
        }
        assert_eq!(
            Strategy::HomeboundBacktracker.direction_choice(),
            Some(DirectionChoice::Farthest(Reference::Opposite))
        );
        assert!(Strategy::HomeboundBacktracker.is_too_dumb());
    }

    #[test]
    fn test_efficient_solvers_solve_again_after_reset() {
        for strategy in Strategy::ALL {
            let mut maze = Maze::new(10, 10, 8).unwrap();
            maze.generate().unwrap();
            maze.place_endpoints().unwrap();
            let spec = SolverSpec::new(strategy).efficient();
            let mut solver = spec.build(&mut maze);

            let first = solver.solve(&mut maze, &mut NullDrawer);
            assert!(first.is_ok(), "{spec}: {first:?}");
            solver.reset(&mut maze);
            assert!(!solver.is_solved(&maze), "{spec}");

            let second = solver.solve(&mut maze, &mut NullDrawer);
            assert!(second.is_ok(), "{spec}: {second:?}");
            assert!(solver.is_solved(&maze), "{spec}");
            let path = solver.path(&maze);
            assert_eq!(path.first(), Some(&maze.start()), "{spec}");
            assert_eq!(path.last(), Some(&maze.end()), "{spec}");
        }
    }

    /// The zero generator carves a single corridor through a 4x4 maze.
    fn serpentine() -> Maze {
        let mut maze = Maze::with_rng(4, 4, share_rng(StepRng::new(0, 0))).unwrap();
        maze.generate().unwrap();
        maze.set_endpoints((1, 1), (0, 3)).unwrap();
        maze
    }

    #[test]
    fn test_two_solvers_share_one_engine() {
        let mut maze = serpentine();
        let dead_ends = DeadEndChecker::shared(&maze);
        let mut leader = SolverSpec::new(Strategy::RandomBacktracker)
            .efficient()
            .build_with(&mut maze, Some(dead_ends.clone()));
        let mut follower = SolverSpec::new(Strategy::LeftHandWalker)
            .efficient()
            .build_with(&mut maze, Some(dead_ends.clone()));
        assert_eq!(dead_ends.borrow().dead_count(), 1);

        // the walker trails one cell behind the backtracker along the corridor
        let (mut leader_steps, mut follower_steps, mut discovered) = (0, 0, 0);
        loop {
            let lead = leader.step(&mut maze).unwrap();
            leader_steps += 1;
            if lead.forward {
                discovered += 1;
            }
            if maze.is_solved() {
                break;
            }
            assert_eq!(dead_ends.borrow().dead_count(), 1 + discovered);
            assert!(dead_ends.borrow().is_dead(lead.to));

            let follow = follower.step(&mut maze).unwrap();
            follower_steps += 1;
            assert_eq!(follow.to, lead.to);
            assert!(!follow.forward);
            assert_eq!(dead_ends.borrow().dead_count(), 1 + discovered);
        }

        assert_eq!(leader_steps, 21);
        assert_eq!(follower_steps, 20);
        assert_eq!(discovered, 15);
        // every cell but the end
        assert_eq!(dead_ends.borrow().dead_count(), 15);
        assert!(leader.is_solved(&maze) && follower.is_solved(&maze));

        let mut status = String::new();
        follower.fill_status(&mut status);
        assert!(status.contains("dead cells"), "{status}");
    }
}
