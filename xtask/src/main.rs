use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the ride-geo workspace",
    long_about = "A unified CLI for CI checks, benchmarks, load tests and a demo\n\
                  run of the ride-geo command line tool."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run ride-geo against the bundled Bangalore sample data
    Demo,
    /// Run Criterion benchmarks
    Bench,
    /// Compare benchmarks: stash changes, create baseline, restore, compare
    BenchCompare,
    /// Run CI checks (fmt, clippy, tests, demo, benchmarks)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Run load tests (ignored tests in ride_core)
    LoadTest,
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Build and run the CLI demo
    Demo,
    /// Run benchmarks
    Bench,
    /// Run check + demo + bench
    All,
}

const CANDIDATES: &str = "crates/ride_cli/data/bangalore_candidates.json";
const RIDES: &str = "crates/ride_cli/data/bangalore_rides.json";
const MG_ROAD: &str = "12.9716,77.5946";
const KORAMANGALA: &str = "12.9352,77.6245";

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn spawn(program: &str, args: &[&str]) -> ExitStatus {
    eprintln!("+ {program} {}", args.join(" "));
    Command::new(program)
        .args(args)
        .status()
        .unwrap_or_else(|error| {
            eprintln!("failed to execute {program}: {error}");
            exit(1)
        })
}

fn run(program: &str, args: &[&str]) {
    let status = spawn(program, args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_cargo(args: &[&str]) {
    run("cargo", args);
}

fn run_git(args: &[&str]) {
    run("git", args);
}

fn ride_geo(args: &[&str]) {
    let mut cargo_args = vec!["run", "-q", "-p", "ride_cli", "--bin", "ride-geo", "--"];
    cargo_args.extend_from_slice(args);
    run_cargo(&cargo_args);
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test ride_core");
    run_cargo(&["test", "-p", "ride_core"]);

    step("Test ride_core (osrm)");
    run_cargo(&["test", "-p", "ride_core", "--features", "osrm"]);

    step("Test ride_cli");
    run_cargo(&["test", "-p", "ride_cli"]);
}

fn demo() {
    step("Distance MG Road -> Koramangala");
    ride_geo(&["distance", "--from", MG_ROAD, "--to", KORAMANGALA]);

    step("Curved route MG Road -> Koramangala");
    ride_geo(&["route", "--from", MG_ROAD, "--to", KORAMANGALA]);

    step("Candidates within 20 km of MG Road");
    ride_geo(&["match", "--origin", MG_ROAD, "--candidates", CANDIDATES]);

    step("Candidates within 5 km of MG Road (indexed)");
    ride_geo(&[
        "match",
        "--origin",
        MG_ROAD,
        "--candidates",
        CANDIDATES,
        "--radius",
        "5",
        "--indexed",
    ]);

    step("Compatible offers for request r1");
    ride_geo(&["score", "--rides", RIDES, "--ride-id", "r1"]);
}

fn ci_bench() {
    step("Run benchmarks");
    run_cargo(&["bench", "--package", "ride_core", "--bench", "performance"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo => demo(),
        Commands::Bench => {
            run_cargo(&["bench", "--package", "ride_core", "--bench", "performance"]);
        }
        Commands::BenchCompare => {
            let baseline_dir = Path::new("target/criterion");
            if baseline_dir.exists() {
                step("Removing existing benchmark data");
                if let Err(error) = std::fs::remove_dir_all(baseline_dir) {
                    eprintln!("failed to remove target/criterion: {error}");
                    exit(1);
                }
            }

            step("Stashing current changes");
            run_git(&[
                "stash",
                "push",
                "-m",
                "Temporary stash for benchmark comparison",
            ]);

            step("Running benchmark to create baseline");
            run_cargo(&[
                "bench",
                "--package",
                "ride_core",
                "--bench",
                "performance",
                "--",
                "--save-baseline",
                "main",
            ]);

            step("Reapplying changes");
            run_git(&["stash", "pop"]);

            step("Running benchmark comparing against baseline");
            run_cargo(&[
                "bench",
                "--package",
                "ride_core",
                "--bench",
                "performance",
                "--",
                "--baseline",
                "main",
            ]);

            eprintln!("\nDone! Check the output above to see performance comparison.");
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Demo => demo(),
                CiJob::Bench => ci_bench(),
                CiJob::All => {
                    ci_check();
                    demo();
                    ci_bench();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::LoadTest => {
            run_cargo(&[
                "test",
                "-p",
                "ride_core",
                "--test",
                "load_tests",
                "--",
                "--ignored",
            ]);
        }
    }
}
