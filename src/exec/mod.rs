// src/exec/mod.rs

//! Node execution layer.
//!
//! - [`evaluate`] evaluates one node: readiness checks, the body, and the
//!   readiness report, isolated on a blocking thread.
//! - [`worker`] runs a pool of workers that pull scheduled nodes from a
//!   shared channel and report completions back to the runtime.
//! - [`shell`] is a helper for task bodies that run shell commands.

pub mod evaluate;
pub mod shell;
pub mod worker;

pub use evaluate::{EvalContext, evaluate};
pub(crate) use evaluate::join_error_message;
pub use worker::spawn_workers;
