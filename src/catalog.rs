// src/catalog.rs

//! Named task constructors, so tasks can be picked at runtime by name.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::declare::Decl;
use crate::errors::{Result, StepwiseError};

/// Builds a task declaration from positional arguments.
pub type Constructor = Arc<dyn Fn(&[Value]) -> anyhow::Result<Decl> + Send + Sync>;

#[derive(Clone)]
struct Entry {
    doc: Option<String>,
    build: Constructor,
}

/// A set of task constructors keyed by public name.
///
/// Names starting with `_` can be built but are hidden from listings.
#[derive(Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<String, Entry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `build` under `name`. The first line of `doc` is what
    /// listings show.
    pub fn register(
        mut self,
        name: impl Into<String>,
        doc: impl Into<String>,
        build: impl Fn(&[Value]) -> anyhow::Result<Decl> + Send + Sync + 'static,
    ) -> Self {
        let doc = doc.into();
        self.entries.insert(
            name.into(),
            Entry {
                doc: (!doc.trim().is_empty()).then_some(doc),
                build: Arc::new(build),
            },
        );
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Call the constructor registered under `name`.
    pub fn build(&self, name: &str, args: &[Value]) -> Result<Decl> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| StepwiseError::TaskNotFound(name.to_string()))?;
        Ok((entry.build)(args)?)
    }

    /// First line of the description registered for `name`.
    pub fn summary(&self, name: &str) -> Option<&str> {
        self.entries
            .get(name)?
            .doc
            .as_deref()
            .and_then(|doc| doc.trim().lines().next())
    }

    /// Sorted names of the public tasks.
    pub fn task_names(&self) -> Vec<String> {
        self.entries
            .keys()
            .filter(|name| !name.starts_with('_'))
            .cloned()
            .collect()
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("tasks", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Sorted names of the public tasks in `catalog`.
pub fn task_names(catalog: &Catalog) -> Vec<String> {
    catalog.task_names()
}

/// Interpret a command-line argument: JSON if it parses, else a string.
pub fn reify(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}

/// Positional argument `index` as a string, for constructors.
pub fn arg_str(args: &[Value], index: usize) -> anyhow::Result<String> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
        None => anyhow::bail!("missing argument {}", index + 1),
    }
}
