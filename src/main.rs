//! group-testing - find infected people with as few pooled tests as possible
//!
//! Usage:
//!   group-testing                     # talk to a judge on stdin/stdout
//!   group-testing run --strategy fixed
//!   group-testing simulate --cases 20 --people 500 --seed 3

use std::io;
use std::process;

use clap::{Args, Parser, Subcommand};
use group_testing::simulate::{run_simulation, SimulationParams};
use group_testing::{run_session, LineJudge, SessionReport, SolverConfig, Strategy};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "group-testing")]
#[command(version)]
#[command(about = "Adaptive group testing solver")]
#[command(long_about = "Pools people into test groups using contact affinity and talks to a judge over stdin/stdout. Diagnostics go to stderr.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// More diagnostics on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Solve the cases a judge sends on stdin (default)
    Run(SolverArgs),
    /// Solve random cases against an in-process judge
    Simulate {
        #[command(flatten)]
        solver: SolverArgs,

        #[arg(long, default_value_t = 10)]
        cases: usize,

        #[arg(long, default_value_t = 200)]
        people: usize,

        #[arg(long, default_value_t = 300)]
        connections: usize,

        #[arg(long, default_value_t = 2)]
        initial_infected: usize,

        /// Chance that one contact passes the infection on, 0 to 1
        #[arg(long, default_value_t = 0.1, value_parser = parse_chance)]
        spread_chance: f64,

        /// Distance of the announced bounds from the true infected count
        #[arg(long, default_value_t = 2)]
        slack: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn parse_chance(value: &str) -> Result<f64, String> {
    let chance: f64 = value.parse().map_err(|_| format!("`{}` is not a number", value))?;
    if !(0.0..=1.0).contains(&chance) {
        return Err(format!("{} is not between 0 and 1", chance));
    }
    Ok(chance)
}

#[derive(Args, Clone)]
struct SolverArgs {
    /// auto, adaptive, fixed or bisect
    #[arg(short, long, default_value_t = Strategy::Auto)]
    strategy: Strategy,

    /// Spread levels in the affinity scores
    #[arg(long, default_value_t = 3)]
    levels: usize,

    /// Largest population for which affinity scores are built
    #[arg(long, default_value_t = 1100)]
    score_guard: usize,

    /// Largest population solved by bisection
    #[arg(long, default_value_t = 10)]
    bisect_threshold: usize,

    /// Group size of the fixed strategy
    #[arg(long, default_value_t = 4)]
    fixed_group_size: usize,

    /// Consecutive empty response lines tolerated (0 waits forever)
    #[arg(long, default_value_t = 10_000)]
    max_empty_reads: usize,
}

impl Default for SolverArgs {
    fn default() -> Self {
        let config = SolverConfig::default();
        SolverArgs {
            strategy: config.strategy,
            levels: config.levels,
            score_guard: config.score_guard,
            bisect_threshold: config.bisect_threshold,
            fixed_group_size: config.fixed_group_size,
            max_empty_reads: config.max_empty_reads.unwrap_or(0),
        }
    }
}

impl From<SolverArgs> for SolverConfig {
    fn from(args: SolverArgs) -> Self {
        SolverConfig {
            levels: args.levels,
            score_guard: args.score_guard,
            bisect_threshold: args.bisect_threshold,
            fixed_group_size: args.fixed_group_size,
            max_empty_reads: (args.max_empty_reads > 0).then_some(args.max_empty_reads),
            strategy: args.strategy,
            ..SolverConfig::default()
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command.unwrap_or_else(|| Command::Run(SolverArgs::default())) {
        Command::Run(args) => {
            let config = SolverConfig::from(args);
            let stdin = io::stdin();
            let stdout = io::stdout();
            let mut judge = LineJudge::new(stdin.lock(), stdout.lock())
                .with_max_empty_reads(config.max_empty_reads);
            run_session(&mut judge, &config)
        }
        Command::Simulate { solver, cases, people, connections, initial_infected, spread_chance, slack, seed } => {
            let params = SimulationParams { cases, people, connections, initial_infected, spread_chance, slack, seed };
            let report = run_simulation(&params, &SolverConfig::from(solver));
            if let Ok(report) = &report {
                print_simulation(&params, report);
            }
            report
        }
    };

    match result {
        Ok(report) if report.success() => {}
        Ok(_) => process::exit(1),
        Err(e) => {
            error!("protocol error: {}", e);
            process::exit(2);
        }
    }
}

fn print_simulation(params: &SimulationParams, report: &SessionReport) {
    report.log_summary();
    let population = params.cases * params.people;
    println!("cases:      {}", report.cases);
    println!("accepted:   {}", report.cases - report.failed.len());
    println!("rejected:   {}", report.failed.len());
    println!("tests:      {} ({} group, {} person)", report.total.tests(), report.total.group_tests, report.total.person_tests);
    if population > 0 {
        println!("per person: {:.3}", report.total.tests() as f64 / population as f64);
    }
}
