// src/dag/asset.rs

//! Assets: observable external state that tasks observe or produce.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::types::Shape;

/// Readiness predicate shared by every clone of an [`Asset`].
pub type Readiness = Arc<dyn Fn() -> bool + Send + Sync>;

/// A piece of external state, identified by `reference`, that is ready when
/// its predicate says so.
///
/// The engine never owns the state itself. It only asks the predicate, so the
/// predicate must be cheap and free of side effects.
#[derive(Clone)]
pub struct Asset {
    reference: Value,
    ready: Readiness,
}

/// The asset(s) declared by one task.
pub type AssetShape = Shape<Asset>;

impl Asset {
    pub fn new(
        reference: impl Into<Value>,
        ready: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            reference: reference.into(),
            ready: Arc::new(ready),
        }
    }

    /// An asset with no identity, ready when `ready` says so.
    pub fn anonymous(ready: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self::new(Value::Null, ready)
    }

    /// A filesystem path that is ready once it exists.
    pub fn path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let reference = path.to_string_lossy().into_owned();
        Self::new(reference, move || path.exists())
    }

    /// A regular file that is ready once it exists.
    pub fn file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let reference = path.to_string_lossy().into_owned();
        Self::new(reference, move || path.is_file())
    }

    pub fn reference(&self) -> &Value {
        &self.reference
    }

    /// Ask the predicate. Not cached; see [`crate::dag::Node::ready`].
    pub fn is_ready(&self) -> bool {
        (self.ready)()
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("reference", &self.reference)
            .finish_non_exhaustive()
    }
}

/// Asset references in the same shape as the assets: a scalar for one asset,
/// an array for a list, an object for a map, `null` for none.
pub fn refs(assets: &AssetShape) -> Value {
    match assets {
        Shape::None => Value::Null,
        Shape::One(asset) => asset.reference.clone(),
        Shape::List(items) => Value::Array(items.iter().map(|a| a.reference.clone()).collect()),
        Shape::Map(items) => Value::Object(
            items
                .iter()
                .map(|(k, a)| (k.clone(), a.reference.clone()))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use serde_json::json;

    use super::*;

    #[test]
    fn predicate_is_consulted_every_time() {
        let flag = Arc::new(AtomicBool::new(false));
        let observed = Arc::clone(&flag);
        let asset = Asset::new("flag", move || observed.load(Ordering::SeqCst));

        assert!(!asset.is_ready());
        flag.store(true, Ordering::SeqCst);
        assert!(asset.is_ready());
    }

    #[test]
    fn refs_mirror_the_asset_shape() {
        let a = Asset::new("a", || true);
        let b = Asset::new(2, || true);

        assert_eq!(refs(&Shape::None), Value::Null);
        assert_eq!(refs(&Shape::One(a.clone())), json!("a"));
        assert_eq!(refs(&Shape::List(vec![a.clone(), b.clone()])), json!(["a", 2]));

        let map: AssetShape = [("left", a), ("right", b)].into_iter().collect();
        assert_eq!(refs(&map), json!({"left": "a", "right": 2}));
    }

    #[test]
    fn path_asset_tracks_existence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("out.txt");
        let asset = Asset::file(&target);

        assert_eq!(asset.reference(), &json!(target.to_string_lossy()));
        assert!(!asset.is_ready());
        std::fs::write(&target, b"x").expect("write");
        assert!(asset.is_ready());
    }
}
