// src/demo.rs

//! A small demo workflow: making a cup of tea.
//!
//! Everything lives under a base directory. The box of tea bags is an
//! external asset, so the workflow stalls until someone creates
//! `<basedir>/box-of-tea`. After the water is poured the tea needs
//! [`STEEP_TIME`] before sugar goes in, so a full cup takes a few
//! invocations.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::Context;
use tracing::info;

use crate::catalog::{Catalog, arg_str};
use crate::dag::Asset;
use crate::declare::Decl;
use crate::types::Shape;

pub const STEEP_TIME: Duration = Duration::from_secs(10);

/// The demo tasks, as exposed by the `stepwise` binary.
pub fn catalog() -> Catalog {
    Catalog::new()
        .register(
            "a_cup_of_tea",
            "A cup of steeped tea with sugar. Argument: base directory.",
            |args| Ok(a_cup_of_tea(arg_str(args, 0)?)),
        )
        .register("cup", "Just the cup. Argument: base directory.", |args| {
            Ok(cup(Path::new(&arg_str(args, 0)?)))
        })
        .register(
            "box_of_tea_bags",
            "Tea bags from the store. Argument: cup directory.",
            |args| Ok(box_of_tea_bags(Path::new(&arg_str(args, 0)?))),
        )
        .register(
            "steeped_tea",
            "Tea that has steeped long enough. Argument: cup directory.",
            |args| Ok(steeped_tea(Path::new(&arg_str(args, 0)?))),
        )
        .register(
            "steeped_tea_with_sugar",
            "Sugar added to steeped tea. Argument: cup directory.",
            |args| Ok(steeped_tea_with_sugar(Path::new(&arg_str(args, 0)?))),
        )
        .register(
            "steeping_tea",
            "Boiling water poured over the tea. Argument: cup directory.",
            |args| Ok(steeping_tea(Path::new(&arg_str(args, 0)?))),
        )
        .register(
            "tea_bag",
            "A tea bag in the cup. Argument: cup directory.",
            |args| Ok(tea_bag(Path::new(&arg_str(args, 0)?))),
        )
}

pub fn a_cup_of_tea(basedir: impl Into<PathBuf>) -> Decl {
    let basedir = basedir.into();
    Decl::collection("A cup of steeped tea with sugar").requires(move |run| {
        let cupdir = basedir.join("cup");
        Ok(Shape::List(vec![
            run.require(cup(&basedir))?,
            run.require(steeped_tea_with_sugar(&cupdir))?,
        ]))
    })
}

/// Get a cup to make the tea in.
pub fn cup(basedir: &Path) -> Decl {
    let path = basedir.join("cup");
    Decl::task(format!("The cup: {}", path.display()))
        .asset(Asset::path(&path))
        .no_requirements()
        .body(move || {
            std::fs::create_dir_all(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            Ok(())
        })
}

pub fn steeped_tea_with_sugar(cupdir: &Path) -> Decl {
    ingredient(cupdir, "sugar", "Steeped tea with sugar", Some(steeped_tea))
}

/// Give the tea time to steep.
pub fn steeped_tea(cupdir: &Path) -> Decl {
    let water = cupdir.join("water");
    let poured = water.clone();
    let cupdir = cupdir.to_path_buf();
    Decl::task(format!("Steeped tea in {}", cupdir.display()))
        .asset(Asset::anonymous(move || {
            steep_remaining(&poured).is_some_and(|left| left.is_zero())
        }))
        .requires(move |run| Ok(Shape::One(run.require(steeping_tea(&cupdir))?)))
        .body(move || {
            if let Some(left) = steep_remaining(&water) {
                info!("Tea steeping for {}s more", left.as_secs());
            }
            Ok(())
        })
}

/// How much longer the tea needs, or `None` if no water was poured yet.
fn steep_remaining(water: &Path) -> Option<Duration> {
    let poured = water.metadata().and_then(|m| m.modified()).ok()?;
    let elapsed = SystemTime::now()
        .duration_since(poured)
        .unwrap_or_default();
    Some(STEEP_TIME.saturating_sub(elapsed))
}

/// Pour boiling water over the tea.
pub fn steeping_tea(cupdir: &Path) -> Decl {
    ingredient(cupdir, "water", "Boiling water over the tea", Some(tea_bag))
}

/// Place a tea bag in the cup.
pub fn tea_bag(cupdir: &Path) -> Decl {
    ingredient(cupdir, "tea", "Tea bag", Some(box_of_tea_bags))
}

pub fn box_of_tea_bags(cupdir: &Path) -> Decl {
    let path = cupdir
        .parent()
        .map_or_else(|| PathBuf::from("box-of-tea"), |p| p.join("box-of-tea"));
    Decl::external(format!("Tea from store: {}", path.display())).asset(Asset::path(&path))
}

fn ingredient(cupdir: &Path, file: &str, name: &str, req: Option<fn(&Path) -> Decl>) -> Decl {
    let path = cupdir.join(file);
    let cupdir = cupdir.to_path_buf();
    Decl::task(format!("{name} in {}", cupdir.display()))
        .asset(Asset::path(&path))
        .requires(move |run| match req {
            Some(req) => Ok(Shape::One(run.require(req(&cupdir))?)),
            None => Ok(Shape::None),
        })
        .body(move || {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
            Ok(())
        })
}
