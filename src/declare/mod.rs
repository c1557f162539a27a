// src/declare/mod.rs

//! Task declarations and graph assembly.
//!
//! - [`procedure`] defines the [`Procedure`] protocol and the [`Decl`]
//!   builder most tasks are written with.
//! - [`assembly`] drives procedures into nodes through a per-run [`Run`]
//!   context that deduplicates tasks by name and rejects cycles.

pub mod assembly;
pub mod procedure;

pub use assembly::{Registry, Run};
pub use procedure::{Decl, Procedure};
