// src/types.rs

//! Shared value types.

use std::collections::BTreeMap;

/// A value, an ordered list of values, a name-keyed map of values, or
/// nothing.
///
/// Tasks declare both their assets and their requirements in one of these
/// shapes. The shape survives assembly, so a caller can look a requirement up
/// by the same key or index it was declared under.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape<T> {
    None,
    One(T),
    List(Vec<T>),
    Map(BTreeMap<String, T>),
}

impl<T> Default for Shape<T> {
    fn default() -> Self {
        Shape::None
    }
}

impl<T> Shape<T> {
    /// True only for the absent shape. An empty list or map is *declared*,
    /// even though it holds nothing; see [`Shape::is_empty`].
    pub fn is_none(&self) -> bool {
        matches!(self, Shape::None)
    }

    /// True if the shape holds no values at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of values held.
    pub fn len(&self) -> usize {
        match self {
            Shape::None => 0,
            Shape::One(_) => 1,
            Shape::List(items) => items.len(),
            Shape::Map(items) => items.len(),
        }
    }

    /// Iterate over the held values in declaration order (key order for maps).
    pub fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        match self {
            Shape::None => Box::new(std::iter::empty()),
            Shape::One(item) => Box::new(std::iter::once(item)),
            Shape::List(items) => Box::new(items.iter()),
            Shape::Map(items) => Box::new(items.values()),
        }
    }

    /// Apply `f` to every value, keeping keys and indices.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Shape<U> {
        match self {
            Shape::None => Shape::None,
            Shape::One(item) => Shape::One(f(item)),
            Shape::List(items) => Shape::List(items.iter().map(f).collect()),
            Shape::Map(items) => {
                Shape::Map(items.iter().map(|(k, v)| (k.clone(), f(v))).collect())
            }
        }
    }

    /// Value stored under `key` in a map shape.
    pub fn get(&self, key: &str) -> Option<&T> {
        match self {
            Shape::Map(items) => items.get(key),
            _ => None,
        }
    }

    /// Value at `index` in a list shape. A single value answers index 0.
    pub fn at(&self, index: usize) -> Option<&T> {
        match self {
            Shape::One(item) if index == 0 => Some(item),
            Shape::List(items) => items.get(index),
            _ => None,
        }
    }

    /// Collapse empty lists and maps to [`Shape::None`].
    pub fn normalized(self) -> Self {
        match self {
            Shape::List(items) if items.is_empty() => Shape::None,
            Shape::Map(items) if items.is_empty() => Shape::None,
            other => other,
        }
    }
}

impl<T> Shape<T> {
    /// Wrap every value in `Some`, for shapes that may also hold absent
    /// entries.
    pub fn into_present(self) -> Shape<Option<T>> {
        match self {
            Shape::None => Shape::None,
            Shape::One(item) => Shape::One(Some(item)),
            Shape::List(items) => Shape::List(items.into_iter().map(Some).collect()),
            Shape::Map(items) => {
                Shape::Map(items.into_iter().map(|(k, v)| (k, Some(v))).collect())
            }
        }
    }
}

impl<T> Shape<Option<T>> {
    /// Drop absent entries. Remaining map keys are untouched; list entries
    /// close up.
    pub fn compact(self) -> Shape<T> {
        match self {
            Shape::None | Shape::One(None) => Shape::None,
            Shape::One(Some(item)) => Shape::One(item),
            Shape::List(items) => Shape::List(items.into_iter().flatten().collect()),
            Shape::Map(items) => Shape::Map(
                items
                    .into_iter()
                    .filter_map(|(k, v)| v.map(|v| (k, v)))
                    .collect(),
            ),
        }
    }
}

impl<T> From<Vec<T>> for Shape<T> {
    fn from(items: Vec<T>) -> Self {
        Shape::List(items)
    }
}

impl<T> From<BTreeMap<String, T>> for Shape<T> {
    fn from(items: BTreeMap<String, T>) -> Self {
        Shape::Map(items)
    }
}

impl<T> From<Option<T>> for Shape<T> {
    fn from(item: Option<T>) -> Self {
        match item {
            Some(item) => Shape::One(item),
            None => Shape::None,
        }
    }
}

impl<K: Into<String>, T> FromIterator<(K, T)> for Shape<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        Shape::Map(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iter_flattens_every_variant() {
        let map: Shape<i32> = [("b", 2), ("a", 1)].into_iter().collect();
        assert_eq!(map.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(Shape::List(vec![3, 4]).iter().count(), 2);
        assert_eq!(Shape::One(5).iter().count(), 1);
        assert_eq!(Shape::<i32>::None.iter().count(), 0);
    }

    #[test]
    fn compact_keeps_remaining_keys() {
        let shape: Shape<Option<i32>> = [("x", Some(1)), ("y", None)].into_iter().collect();
        let shape = shape.compact();
        assert_eq!(shape.get("x"), Some(&1));
        assert_eq!(shape.get("y"), None);
        assert_eq!(shape.len(), 1);

        let list = Shape::List(vec![None, Some(7), None]).compact();
        assert_eq!(list.at(0), Some(&7));
        assert_eq!(Shape::One(None::<i32>).compact(), Shape::None);
    }

    #[test]
    fn present_values_survive_compaction() {
        let shape: Shape<i32> = [("x", 1), ("y", 2)].into_iter().collect();
        assert_eq!(shape.clone().into_present().compact(), shape);
    }

    #[test]
    fn empty_collections_normalize_to_none() {
        assert!(Shape::<i32>::List(vec![]).normalized().is_none());
        assert!(Shape::<i32>::Map(BTreeMap::new()).normalized().is_none());
        assert!(!Shape::List(vec![1]).normalized().is_none());
    }

    #[test]
    fn single_value_answers_index_zero() {
        let one = Shape::One("a");
        assert_eq!(one.at(0), Some(&"a"));
        assert_eq!(one.at(1), None);
        assert_eq!(one.get("a"), None);
    }
}
