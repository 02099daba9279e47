//! Benchmarks for maze generation and solving.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mazewalk::{DeadEndChecker, Maze, MazeParams, NullDrawer, SolverSpec, Strategy};

fn placed_maze(width: usize, height: usize, seed: u64) -> Maze {
    Maze::from_params(&MazeParams::new(seed, width, height)).unwrap()
}

/// Benchmark generating and placing endpoints in a 64x64 maze.
fn bench_generate(c: &mut Criterion) {
    c.bench_function("generate_64x64", |b| {
        b.iter(|| placed_maze(black_box(64), 64, 7))
    });
}

/// Benchmark building the dead-end engine's distance field.
fn bench_dead_end_engine(c: &mut Criterion) {
    let maze = placed_maze(64, 64, 7);

    c.bench_function("dead_ends_64x64", |b| {
        b.iter(|| DeadEndChecker::new(black_box(&maze)))
    });
}

/// Benchmark full solves, plain and efficient.
fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_64x64");
    group.sample_size(20);
    for strategy in [
        Strategy::RandomBacktracker,
        Strategy::LeftHandWalker,
        Strategy::ProximityFlooder,
        Strategy::ThickestFlooder,
    ] {
        for spec in [SolverSpec::new(strategy), SolverSpec::new(strategy).efficient()] {
            group.bench_function(spec.to_string(), |b| {
                b.iter(|| {
                    let mut maze = placed_maze(64, 64, 7);
                    let mut solver = spec.build(&mut maze);
                    solver.solve(&mut maze, &mut NullDrawer).unwrap()
                })
            });
        }
    }
    group.finish();
}

/// Benchmark formatting a maze as text.
fn bench_format(c: &mut Criterion) {
    let maze = placed_maze(64, 64, 7);

    c.bench_function("format_64x64", |b| b.iter(|| black_box(&maze).format()));
}

criterion_group!(
    benches,
    bench_generate,
    bench_dead_end_engine,
    bench_solve,
    bench_format
);
criterion_main!(benches);
