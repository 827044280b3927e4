use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use u_timetable::generator::{self, GeneratorConfig};
use u_timetable::models::{Problem, Solution};
use u_timetable::scheduler::TimetableKpi;
use u_timetable::search::{self, LocalSearch, SearchConfig, TimeBudget, TracePoint};
use u_timetable::validation;

#[derive(Parser, Debug)]
#[command(name = "u-timetable", about = "Weekly class timetabling: solve/generate/check")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read a problem and print an optimized timetable
    Solve {
        /// Problem file (stdin if omitted)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Wall-clock budget, counted from process start
        #[arg(long, default_value_t = 9950)]
        time_limit_ms: u64,
        #[arg(long)]
        seed: Option<u64>,
        /// Independent searches run in parallel
        #[arg(long, default_value_t = 1)]
        restarts: usize,
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write an iteration/fatigue TSV log here
        #[arg(long)]
        trace: Option<PathBuf>,
    },

    /// Print a random problem
    Generate {
        #[arg(long)]
        seed: u64,
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check a timetable against its problem; exits with 1 on violations
    Check {
        #[arg(name = "PROBLEM")]
        problem: PathBuf,
        #[arg(name = "SOLUTION")]
        solution: PathBuf,
    },
}

/// Contents of the `--config` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct CliConfig {
    search: SearchConfig,
    generator: GeneratorConfig,
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let Some(path) = path else {
        return Ok(CliConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: CliConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config
        .search
        .validate()
        .with_context(|| format!("checking config {}", path.display()))?;
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            Ok(text)
        }
    }
}

fn write_trace(path: &Path, trace: &[TracePoint]) -> Result<()> {
    let mut text = String::from("Iteration\tFatigue\tBest\n");
    for point in trace {
        text.push_str(&format!(
            "{}\t{}\t{}\n",
            point.iteration, point.fatigue, point.best
        ));
    }
    fs::write(path, text).with_context(|| format!("writing trace {}", path.display()))
}

fn solve(
    start: Instant,
    input: Option<&Path>,
    time_limit: Duration,
    seed: Option<u64>,
    restarts: usize,
    config: Option<&Path>,
    trace: Option<&Path>,
) -> Result<()> {
    let problem = Problem::parse(&read_input(input)?).context("parsing problem")?;
    let problem = Arc::new(problem);
    info!(
        groups = problem.num_groups(),
        profs = problem.num_profs(),
        rooms = problem.num_rooms(),
        utilization = problem.room_utilization(),
        "problem loaded"
    );

    let mut config = load_config(config)?.search;
    if let Some(seed) = seed {
        config.seed = Some(seed);
    }
    if trace.is_some() && config.trace_interval == 0 {
        config.trace_interval = 100;
    }

    let outcome = if restarts > 1 {
        search::solve_parallel(Arc::clone(&problem), &config, restarts, || {
            TimeBudget::starting_at(start, time_limit)
        })?
    } else {
        let mut budget = TimeBudget::starting_at(start, time_limit);
        LocalSearch::new(config)?.solve(Arc::clone(&problem), &mut budget)?
    };

    let solution = outcome.best.to_solution();
    let kpi = TimetableKpi::calculate(&problem, &solution);
    info!(
        fatigue = kpi.total_fatigue,
        group_share = kpi.group_share(),
        idle_periods = kpi.group_idle_periods + kpi.prof_idle_periods,
        avg_daily_span = kpi.avg_daily_span,
        peak_room_utilization = kpi.peak_room_utilization,
        "timetable kpi"
    );
    if let Some(path) = trace {
        write_trace(path, &outcome.stats.trace)?;
    }

    let mut out = io::stdout().lock();
    write!(out, "{solution}")?;
    out.flush()?;
    info!(elapsed = ?start.elapsed(), "done");
    Ok(())
}

fn generate(seed: u64, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?.generator;
    let mut rng = SmallRng::seed_from_u64(seed);
    let problem = generator::generate(&config, &mut rng);
    print!("{problem}");
    Ok(())
}

fn check(problem: &Path, solution: &Path) -> Result<bool> {
    let problem = Problem::parse(&read_input(Some(problem))?).context("parsing problem")?;
    let solution =
        Solution::parse(&problem, &read_input(Some(solution))?).context("parsing solution")?;
    let violations = validation::validate(&problem, &solution);
    for violation in &violations {
        println!("{violation}");
    }
    if violations.is_empty() {
        info!(fatigue = solution.fatigue, "timetable is valid");
    } else {
        warn!(count = violations.len(), "timetable has violations");
    }
    Ok(violations.is_empty())
}

fn main() -> Result<ExitCode> {
    let start = Instant::now();
    enable_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Solve {
            input,
            time_limit_ms,
            seed,
            restarts,
            config,
            trace,
        } => solve(
            start,
            input.as_deref(),
            Duration::from_millis(time_limit_ms),
            seed,
            restarts,
            config.as_deref(),
            trace.as_deref(),
        )
        .map(|()| ExitCode::SUCCESS),
        Commands::Generate { seed, config } => {
            generate(seed, config.as_deref()).map(|()| ExitCode::SUCCESS)
        }
        Commands::Check { problem, solution } => Ok(if check(&problem, &solution)? {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        }),
    }
}
