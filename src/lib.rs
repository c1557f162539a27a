// src/lib.rs

//! Dependency-driven task execution.
//!
//! Tasks declare the assets they produce and the tasks they require. Running
//! a task assembles its whole requirement graph, deduplicated by task name,
//! then runs bodies bottom-up: a body runs only when its requirements are
//! ready and its own assets are not.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod dag;
pub mod declare;
pub mod demo;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::future::Future;
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub use crate::catalog::{Catalog, reify, task_names};
pub use crate::dag::{Asset, AssetShape, Node, NodeKind, NodeShape};
pub use crate::declare::{Decl, Procedure, Run};
pub use crate::engine::{NodeOutcome, Options, invoke};
pub use crate::errors::StepwiseError;
pub use crate::types::Shape;

use crate::cli::CliArgs;
use crate::config::loader::load_or_default;

/// The asset(s) of `node`.
pub fn assets(node: &Node) -> AssetShape {
    node.assets()
}

/// The asset reference(s) of `node`, shaped like its assets.
pub fn refs(node: &Node) -> Value {
    node.refs()
}

/// Whether the asset(s) of `node` are ready.
pub fn ready(node: &Node) -> bool {
    node.ready()
}

/// The requirement(s) of `node`, in their declared shape.
pub fn requirements(node: &Node) -> NodeShape {
    node.requirements().clone()
}

/// Graphviz DOT text for the graph rooted at `node`.
pub fn graph(node: &Node) -> String {
    node.graph()
}

/// How long shutdown waits for task bodies abandoned by cancellation or a
/// timeout before leaving them behind.
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Drive `future` on a fresh multi-threaded runtime, then shut it down
/// within [`SHUTDOWN_GRACE`].
///
/// Dropping a runtime waits for every blocking task, including bodies the
/// run has abandoned, so a hung body would keep the process alive.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = rt.block_on(future);
    rt.shutdown_timeout(SHUTDOWN_GRACE);
    Ok(output)
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - task lookup in `catalog`
/// - Ctrl-C handling
/// - the run itself, and optional graph output
pub async fn run(args: CliArgs, catalog: &Catalog) -> Result<()> {
    if args.show {
        print_tasks(catalog);
        return Ok(());
    }

    let cfg = load_or_default(args.config.as_deref())?;
    let mut options = Options::from_config(&cfg);
    if args.dry_run {
        options.dry_run = true;
    }
    if let Some(workers) = args.workers {
        options.workers = workers as usize;
    }

    let taskname = args
        .task
        .as_deref()
        .ok_or_else(|| anyhow!("no task given; use --show to list tasks"))?;
    let task_args: Vec<Value> = args.args.iter().map(String::as_str).map(reify).collect();
    debug!(task = %taskname, args = ?task_args, ?options, "resolved invocation");
    let decl = catalog.build(taskname, &task_args)?;

    // Ctrl-C -> cancel the run; invoke returns once in-flight work is abandoned.
    // A second Ctrl-C exits immediately.
    let cancel = CancellationToken::new();
    options.cancel = cancel.clone();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            cancel.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        });
    }

    let root = invoke(decl, &options).await?;
    info!(task = %root.taskname(), ready = root.ready(), "run finished");

    if args.graph {
        println!("{}", root.graph());
    }
    Ok(())
}

fn print_tasks(catalog: &Catalog) {
    println!("Tasks:");
    for name in catalog.task_names() {
        match catalog.summary(&name) {
            Some(summary) => println!("  {name}: {summary}"),
            None => println!("  {name}"),
        }
    }
}
