//! Spindle demo runner
//!
//! Runs the concurrency demonstrations and prints what each one observes.
//! With no subcommand, all four run in order.

use clap::{Parser, Subcommand};
use spindle_core::demo;
use spindle_core::{DemoConfig, Spawner, Transcript};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spindle")]
#[command(about = "Threads, delays and single-worker pools, demonstrated", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Seconds the delayed worker sleeps between its two lines
    #[arg(long, global = true, default_value_t = 3)]
    delay_secs: u64,

    /// Seconds to wait for a pool to drain before forcing termination
    #[arg(long, global = true, default_value_t = 3)]
    termination_wait_secs: u64,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Run every demonstration in order (default)
    All,

    /// Run a print task on the caller, then on a new thread
    Basic,

    /// Spawn a thread that sleeps between two lines
    Delayed,

    /// Submit two print tasks to a pool and shut it down
    FireAndForget,

    /// Compute values on the caller and through a pool
    WithResult,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // Stdout carries the transcript; diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = DemoConfig {
        delay: Duration::from_secs(cli.delay_secs),
        termination_wait: Duration::from_secs(cli.termination_wait_secs),
    };
    let spawner = Spawner::default();
    let transcript = Transcript::stdout();
    tracing::debug!(?config, "starting demos");

    match cli.command.unwrap_or(Commands::All) {
        Commands::All => demo::run_all(&config, &spawner, &transcript)?,

        Commands::Basic => {
            demo::thread_basic(&spawner, &transcript)?;
        }

        Commands::Delayed => {
            demo::thread_delayed(&spawner, &transcript, config.delay)?;
        }

        Commands::FireAndForget => {
            demo::pooled_task_fire_and_forget(&transcript, config.termination_wait)?;
        }

        Commands::WithResult => {
            demo::pooled_task_with_result(&transcript)?;
        }
    }

    // Unsupervised threads: report their faults, but they never fail the run
    let exits = spawner.join_all();
    for exit in &exits {
        if let Err(e) = &exit.outcome {
            eprintln!("Exception in thread \"{}\": {}", exit.name, e);
        }
    }
    tracing::debug!(threads = exits.len(), "joined detached threads");

    Ok(())
}
