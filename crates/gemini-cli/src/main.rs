//! `gemini` — randomized differential workload runner.
//!
//! Synthesizes a random schema, applies it to the system under test and the
//! oracle, then drives parallel mutate/check workers and reports the summed
//! status. Cluster transport is pluggable behind the driver trait; this
//! binary wires the in-process reference driver for both endpoints, labeled
//! with the requested host names.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use gemini_generators::gen_schema;
use gemini_jobs::{run_mixed_job, JobConfig};
use gemini_store::{CancelToken, MemCluster, Store, StoreConfig};
use gemini_typedef::{PartitionRangeConfig, SchemaConfig};

#[derive(Parser)]
#[command(name = "gemini")]
#[command(about = "Automatic random differential testing for CQL-family databases")]
struct Cli {
    /// Host name of the cluster that is the system under test.
    #[arg(short = 't', long)]
    test_cluster: String,

    /// Host name of the cluster that provides correct answers.
    #[arg(short = 'o', long)]
    oracle_cluster: String,

    /// Maximum number of test iterations to run per worker.
    #[arg(short = 'm', long, default_value_t = 100)]
    max_tests: usize,

    /// Number of workers to run concurrently.
    #[arg(short = 'c', long, default_value_t = 10)]
    threads: usize,

    /// Maximum number of partition keys owned by each worker.
    #[arg(short = 'p', long, default_value_t = 50)]
    max_pk_per_thread: u64,

    /// PRNG seed value.
    #[arg(short = 's', long, default_value_t = 1)]
    seed: u64,

    /// Drop the schema before starting the test run.
    #[arg(short = 'd', long)]
    drop_schema: bool,

    /// Verbose output during the test run.
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Emit INSERT IF NOT EXISTS mutations.
    #[arg(long)]
    use_lwt: bool,

    /// Retries per mutation before it is reported as a write error.
    #[arg(long, default_value_t = 2)]
    max_mutation_retries: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!(seed = cli.seed, "starting");
    info!(test_cluster = %cli.test_cluster, oracle_cluster = %cli.oracle_cluster, "clusters");

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let schema = match gen_schema(&SchemaConfig::default(), &mut rng) {
        Ok(schema) => schema,
        Err(err) => {
            eprintln!("schema generation failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    let store = Store::new(
        MemCluster::new(cli.test_cluster.clone()),
        MemCluster::new(cli.oracle_cluster.clone()),
        StoreConfig {
            max_retries_mutate: cli.max_mutation_retries,
            retry_sleep: Duration::from_millis(10),
            use_server_side_timestamps: false,
        },
    );

    if cli.drop_schema {
        for stmt in schema.get_drop_schema() {
            debug!(%stmt, "drop schema");
        }
        if let Err(err) = store.drop_schema(&schema) {
            eprintln!("dropping schema failed: {err}");
            return ExitCode::FAILURE;
        }
    }
    for stmt in schema.get_create_schema() {
        debug!(%stmt, "create schema");
    }
    if let Err(err) = store.apply_schema(&schema) {
        eprintln!("applying schema failed: {err}");
        return ExitCode::FAILURE;
    }

    let cfg = JobConfig {
        threads: cli.threads,
        keys_per_thread: cli.max_pk_per_thread,
        iterations: cli.max_tests,
        seed: cli.seed,
        range_config: PartitionRangeConfig {
            use_lwt: cli.use_lwt,
            ..PartitionRangeConfig::default()
        },
    };
    let total = run_mixed_job(&schema, &store, &cfg, &CancelToken::new());

    println!("Results:");
    println!("\twrite ops: {}", total.write_ops);
    println!("\twrite errors: {}", total.write_errors);
    println!("\tread ops: {}", total.read_ops);
    println!("\tread errors: {}", total.read_errors);
    for ((system, op), count) in store.ops().snapshot() {
        debug!(system = %system, op = %op, count, "executed queries");
    }

    // Detected mismatches are logged and counted, not fatal: the run itself
    // completed.
    ExitCode::SUCCESS
}
