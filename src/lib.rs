// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod supervisor;
pub mod task;
pub mod types;
pub mod wait;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::task::Tasks;
use crate::types::ExecutionMode;

pub use crate::supervisor::{ExecutionHandle, ProcessSupervisor, SELF_RUNNING_ENV, is_self_running};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the self re-exec guard
/// - config loading
/// - the supervisor in the selected execution mode
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    if is_self_running() {
        info!(
            marker = SELF_RUNNING_ENV,
            "running as a supervised self task; not bootstrapping tasks again"
        );
        return Ok(());
    }

    let cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading task file '{}'", args.config))?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let mode = if args.run_async {
        ExecutionMode::Async
    } else {
        cfg.supervisor.mode
    };

    let tasks = Arc::new(cfg.to_tasks());
    let supervisor =
        Arc::new(ProcessSupervisor::new().with_self_args(cfg.supervisor.self_args.clone()));

    info!(tasks = tasks.len(), ?mode, "supervisor starting");

    let outcome = tokio::select! {
        res = supervise(&supervisor, tasks, mode) => res.map_err(anyhow::Error::from),
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl+C").map(|()| {
                warn!("interrupted; stopping supervised processes");
            })
        }
    };

    // Children still alive here are either interrupted or orphaned by a
    // fail-fast error.
    supervisor.kill_all().await;

    info!("supervisor exiting");
    outcome
}

async fn supervise(
    supervisor: &Arc<ProcessSupervisor>,
    tasks: Arc<Tasks>,
    mode: ExecutionMode,
) -> errors::Result<()> {
    match mode {
        ExecutionMode::Sync => {
            supervisor.execute(&tasks).await?;
            supervisor.wait().await
        }
        ExecutionMode::Async => supervisor.execute_async(tasks).wait().await,
    }
}

/// Simple dry-run output: print tasks, edges and commands.
fn print_dry_run(cfg: &ConfigFile) {
    println!("procdag dry-run");
    println!("  supervisor.mode = {:?}", cfg.supervisor.mode);
    if !cfg.supervisor.self_args.is_empty() {
        println!("  supervisor.self_args = {:?}", cfg.supervisor.self_args);
    }
    println!();

    println!("tasks ({}):", cfg.task.len());
    for task in cfg.task.iter() {
        println!("  - {}", task.name);
        println!("      exec: {}", task.exec);
        if !task.args.is_empty() {
            println!("      args: {:?}", task.args);
        }
        if let Some(ref workdir) = task.workdir {
            println!("      workdir: {workdir}");
        }
        if !task.environ.is_empty() {
            println!("      environ: {:?}", task.environ);
        }
        if let Some(ref net) = task.network {
            println!("      network: {}", net.to_endpoint().url());
        }
        for dep in task.depends_on.iter() {
            println!("      depends_on: {} (waiter: {})", dep.target, dep.waiter);
        }
    }

    debug!("dry-run complete (no execution)");
}
