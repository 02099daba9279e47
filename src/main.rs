//! Maze Generator and Solver
//!
//! Generates grid mazes, prints them together with the short code that
//! reproduces them, and solves coded mazes with any registered strategy.

use std::fmt::Write;

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mazewalk::code::{self, COMPACT_MAX_SEED, MAX_CODE_SIZE, MIN_CODE_SIZE};
use mazewalk::{Maze, MazeParams, Result, SolverSpec, StepRecorder, Strategy};

const DEFAULT_WIDTH: usize = 20;
const DEFAULT_HEIGHT: usize = 12;

/// Generates grid mazes and watches strategies solve them.
#[derive(Parser)]
#[command(name = "mazewalk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a maze and print it with its code.
    Generate {
        #[arg(long, default_value_t = DEFAULT_WIDTH)]
        width: usize,
        #[arg(long, default_value_t = DEFAULT_HEIGHT)]
        height: usize,
        /// Random when omitted.
        #[arg(long)]
        seed: Option<u64>,
        /// Print the 12-letter code that also pins the endpoints.
        #[arg(long)]
        legacy: bool,
    },
    /// Print the maze a code describes.
    Decode { code: String },
    /// Solve the maze a code describes.
    Solve {
        code: String,
        /// Strategy name, optionally tagged, e.g. EfficientProximityFlooder.
        /// Unknown or missing names pick one at random.
        #[arg(long)]
        strategy: Option<String>,
        /// Seed for the random strategy pick.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List the registered strategies.
    List,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let output = match cli.command {
        Some(Command::Generate {
            width,
            height,
            seed,
            legacy,
        }) => {
            let seed = seed.unwrap_or_else(|| rand::thread_rng().gen_range(0..=COMPACT_MAX_SEED));
            run_generate(width, height, seed, legacy)
        }
        Some(Command::Decode { code }) => run_decode(&code),
        Some(Command::Solve {
            code,
            strategy,
            seed,
        }) => run_solve(&code, strategy.as_deref(), pick_rng(seed)),
        Some(Command::List) => Ok(run_list()),
        None => run_random(),
    };

    match output {
        Ok(text) => print!("{}", text),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn pick_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Generates a maze and formats it under its code.
fn run_generate(width: usize, height: usize, seed: u64, legacy: bool) -> Result<String> {
    let maze = Maze::from_params(&MazeParams::new(seed, width, height))?;
    let maze_code = if legacy {
        maze.legacy_code()
    } else {
        maze.code()
    };

    let mut out = String::new();
    match maze_code {
        Ok(maze_code) => {
            let _ = writeln!(out, "Code: {}", maze_code);
        }
        Err(e) => warn!("{}x{} maze seeded {} has no code: {}", width, height, seed, e),
    }
    let _ = writeln!(out, "{}", maze.format());
    Ok(out)
}

/// Decodes a code and formats the maze it describes.
fn run_decode(maze_code: &str) -> Result<String> {
    let params = code::decode(maze_code)?;
    let maze = Maze::from_params(&params)?;

    let mut out = format!(
        "Seed {}, {}x{}, start {:?}, end {:?}\n",
        params.seed,
        params.width,
        params.height,
        maze.start(),
        maze.end()
    );
    let _ = writeln!(out, "{}", maze.format());
    Ok(out)
}

/// Solves a coded maze and formats the solution with the solver status.
fn run_solve(maze_code: &str, strategy: Option<&str>, mut rng: StdRng) -> Result<String> {
    let mut maze = Maze::from_code(maze_code)?;
    let spec = SolverSpec::from_name(strategy, &mut rng);
    let mut solver = spec.build(&mut maze);

    let mut recorder = StepRecorder::default();
    let steps = solver.solve(&mut maze, &mut recorder)?;
    let path = solver.path(&maze);

    let mut out = format!("{} on {}\n", spec, maze_code.trim().to_ascii_uppercase());
    let _ = writeln!(out, "{}", maze.format_with_path(&path));
    let _ = writeln!(
        out,
        "{} steps ({} forward, {} back), path of {} cells",
        steps,
        recorder.forward_steps(),
        recorder.backward_steps(),
        path.len()
    );
    solver.fill_status(&mut out);
    Ok(out)
}

/// Lists every strategy with the flags that keep it out of random picks.
fn run_list() -> String {
    let mut out = String::new();
    for strategy in Strategy::ALL {
        let mut notes = Vec::new();
        if strategy.is_too_dumb() {
            notes.push("too dumb");
        }
        if strategy.is_too_smart() {
            notes.push("too smart");
        }
        if strategy.supports_heuristic() {
            notes.push("heuristic");
        }
        if notes.is_empty() {
            let _ = writeln!(out, "{}", strategy);
        } else {
            let _ = writeln!(out, "{} ({})", strategy, notes.join(", "));
        }
    }
    out
}

/// Generates a random maze and solves it with a random strategy.
fn run_random() -> Result<String> {
    let mut rng = StdRng::from_entropy();
    let seed = rng.gen_range(0..=COMPACT_MAX_SEED);
    let width = rng.gen_range(MIN_CODE_SIZE..=MAX_CODE_SIZE / 2) as usize;
    let height = rng.gen_range(MIN_CODE_SIZE..=MAX_CODE_SIZE / 4) as usize;
    let maze_code = code::encode(&MazeParams::new(seed, width, height))?;
    run_solve(&maze_code, None, rng)
}
