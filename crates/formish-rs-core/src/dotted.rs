//! The dotted-key codec.
//!
//! HTML forms submit a flat mapping of dotted string keys to lists of
//! string values; the schema side wants a nested structure. This module
//! converts between the two: `one.two.0.three` addresses
//! `root["one"]["two"][0]["three"]`, where a segment that parses as a
//! non-negative integer selects a sequence rather than a mapping.
//!
//! Sequence indices must be contiguous from zero; assigning past the end
//! of a sequence is a [`DottedError::SparseIndex`] rather than an implicit
//! fill. Assigning a value to a path that already holds children (or vice
//! versa) is a [`DottedError::Conflict`].

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::{DottedError, DottedResult};
use crate::form_data::FormData;

/// Nested request-shaped data decoded from flat dotted keys.
///
/// Leaves are *multi-valued* lists of raw strings, matching HTML form
/// semantics where one key may repeat.
///
/// # Examples
///
/// ```
/// use formish_rs_core::{FormData, RawData};
///
/// let flat = FormData::parse("name=bob&pets.0=cat&pets.1=dog");
/// let nested = RawData::from_flat(&flat).unwrap();
/// assert_eq!(nested.get("pets.1").unwrap(), &RawData::value("dog"));
/// assert_eq!(nested.to_flat(), flat);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawData {
    /// A multi-valued leaf.
    Values(Vec<String>),
    /// Named children.
    Map(BTreeMap<String, RawData>),
    /// Indexed children, contiguous from zero.
    List(Vec<RawData>),
}

impl Default for RawData {
    fn default() -> Self {
        Self::empty_map()
    }
}

/// Parses a key segment as a sequence index.
pub fn segment_index(segment: &str) -> Option<usize> {
    segment.parse::<usize>().ok()
}

impl RawData {
    /// An empty mapping node.
    pub const fn empty_map() -> Self {
        Self::Map(BTreeMap::new())
    }

    /// A single-valued leaf.
    pub fn value(v: impl Into<String>) -> Self {
        Self::Values(vec![v.into()])
    }

    /// A multi-valued leaf.
    pub fn values<I, S>(vs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Values(vs.into_iter().map(Into::into).collect())
    }

    /// Decodes a flat dotted-key payload into nested data.
    ///
    /// Keys are processed deepest-first so that composite assignment
    /// happens before any shallower key could claim the same path as a
    /// plain value; within equal depth, segments compare numerically when
    /// both are indices so that sequence entries arrive in order.
    pub fn from_flat(flat: &FormData) -> DottedResult<Self> {
        let mut keys: Vec<&String> = flat.keys().collect();
        keys.sort_by(|a, b| key_order(a, b));
        let mut root = Self::empty_map();
        for key in keys {
            let values = flat.get_list(key).cloned().unwrap_or_default();
            root.set(key, Self::Values(values))?;
        }
        Ok(root)
    }

    /// Encodes nested data back to a flat dotted-key payload.
    ///
    /// Inverse of [`from_flat`](Self::from_flat) for any collision-free
    /// flat map.
    pub fn to_flat(&self) -> FormData {
        let mut out = FormData::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut FormData) {
        match self {
            Self::Values(vs) => out.set(prefix, vs.clone()),
            Self::Map(map) => {
                for (k, v) in map {
                    v.flatten_into(&join_key(prefix, k), out);
                }
            }
            Self::List(items) => {
                for (i, v) in items.iter().enumerate() {
                    v.flatten_into(&join_key(prefix, &i.to_string()), out);
                }
            }
        }
    }

    /// Resolves a dotted key to the node it addresses.
    pub fn get(&self, key: &str) -> DottedResult<&Self> {
        let mut node = self;
        for seg in key.split('.') {
            node = match node {
                Self::Map(map) => map.get(seg),
                Self::List(items) => segment_index(seg).and_then(|i| items.get(i)),
                Self::Values(_) => None,
            }
            .ok_or_else(|| DottedError::KeyNotFound {
                key: key.to_string(),
            })?;
        }
        Ok(node)
    }

    /// Like [`get`](Self::get) but returns `None` on a missing path.
    pub fn get_opt(&self, key: &str) -> Option<&Self> {
        self.get(key).ok()
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, key: &str) -> DottedResult<&mut Self> {
        let mut node = self;
        for seg in key.split('.') {
            node = match node {
                Self::Map(map) => map.get_mut(seg),
                Self::List(items) => segment_index(seg).and_then(|i| items.get_mut(i)),
                Self::Values(_) => None,
            }
            .ok_or_else(|| DottedError::KeyNotFound {
                key: key.to_string(),
            })?;
        }
        Ok(node)
    }

    /// Assigns `value` at a dotted key, creating intermediate containers.
    ///
    /// Whether an intermediate is a mapping or a sequence is decided by
    /// the following segment. Replacing a container with a plain value, or
    /// descending through a value, is a [`DottedError::Conflict`].
    pub fn set(&mut self, key: &str, value: Self) -> DottedResult<()> {
        let segs: Vec<&str> = key.split('.').collect();
        set_at(self, key, &segs, value)
    }

    /// Returns the node at `key`, first assigning `default` if the path
    /// does not exist yet.
    pub fn setdefault(&mut self, key: &str, default: Self) -> DottedResult<&mut Self> {
        if self.get_opt(key).is_none() {
            self.set(key, default)?;
        }
        self.get_mut(key)
    }

    /// The top-level keys of this node (map names or list indices).
    pub fn keys(&self) -> Vec<String> {
        match self {
            Self::Values(_) => Vec::new(),
            Self::Map(map) => map.keys().cloned().collect(),
            Self::List(items) => (0..items.len()).map(|i| i.to_string()).collect(),
        }
    }

    /// All dotted keys of the leaves below this node.
    pub fn dotted_keys(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_keys("", &mut out);
        out
    }

    fn collect_keys(&self, prefix: &str, out: &mut Vec<String>) {
        match self {
            Self::Values(_) => out.push(prefix.to_string()),
            Self::Map(map) => {
                for (k, v) in map {
                    v.collect_keys(&join_key(prefix, k), out);
                }
            }
            Self::List(items) => {
                for (i, v) in items.iter().enumerate() {
                    v.collect_keys(&join_key(prefix, &i.to_string()), out);
                }
            }
        }
    }

    /// The raw string values of a leaf node.
    pub fn as_values(&self) -> Option<&[String]> {
        match self {
            Self::Values(vs) => Some(vs),
            _ => None,
        }
    }

    /// The first raw string value of a leaf node.
    pub fn first(&self) -> Option<&str> {
        self.as_values().and_then(|vs| vs.first()).map(String::as_str)
    }

    /// Returns `true` for mapping and sequence nodes.
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::Map(_) | Self::List(_))
    }

    /// The number of direct children (or values, for a leaf).
    ///
    /// This is the cardinality a sequence observes under its dotted
    /// prefix: indexed entries for `name.0, name.1, ...` submissions,
    /// repeated values for `name=a&name=b` submissions.
    pub fn child_count(&self) -> usize {
        match self {
            Self::Values(vs) => vs.len(),
            Self::Map(map) => map.len(),
            Self::List(items) => items.len(),
        }
    }
}

fn join_key(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

/// Deepest keys first; equal depth compares segment-wise, numerically
/// where both segments are indices.
fn key_order(a: &str, b: &str) -> Ordering {
    let sa: Vec<&str> = a.split('.').collect();
    let sb: Vec<&str> = b.split('.').collect();
    sb.len().cmp(&sa.len()).then_with(|| {
        for (x, y) in sa.iter().zip(&sb) {
            let ord = match (segment_index(x), segment_index(y)) {
                (Some(i), Some(j)) => i.cmp(&j),
                _ => x.cmp(y),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    })
}

fn fresh_container(next_segment: &str) -> RawData {
    if segment_index(next_segment).is_some() {
        RawData::List(Vec::new())
    } else {
        RawData::empty_map()
    }
}

fn replace_leaf(slot: &mut RawData, full_key: &str, value: RawData) -> DottedResult<()> {
    if slot.is_container() && !value.is_container() {
        return Err(DottedError::Conflict {
            key: full_key.to_string(),
        });
    }
    *slot = value;
    Ok(())
}

fn descend(child: &mut RawData, full_key: &str, rest: &[&str], value: RawData) -> DottedResult<()> {
    if matches!(child, RawData::Values(_)) {
        return Err(DottedError::Conflict {
            key: full_key.to_string(),
        });
    }
    set_at(child, full_key, rest, value)
}

fn set_at(node: &mut RawData, full_key: &str, segs: &[&str], value: RawData) -> DottedResult<()> {
    let seg = segs[0];
    let rest = &segs[1..];
    if let Some(index) = segment_index(seg) {
        // An index segment turns a still-empty mapping into a sequence.
        if matches!(node, RawData::Map(map) if map.is_empty()) {
            *node = RawData::List(Vec::new());
        }
        let RawData::List(items) = node else {
            return Err(DottedError::Conflict {
                key: full_key.to_string(),
            });
        };
        match index.cmp(&items.len()) {
            Ordering::Greater => Err(DottedError::SparseIndex {
                key: full_key.to_string(),
                index,
            }),
            Ordering::Equal => {
                if rest.is_empty() {
                    items.push(value);
                } else {
                    let mut child = fresh_container(rest[0]);
                    set_at(&mut child, full_key, rest, value)?;
                    items.push(child);
                }
                Ok(())
            }
            Ordering::Less => {
                if rest.is_empty() {
                    replace_leaf(&mut items[index], full_key, value)
                } else {
                    descend(&mut items[index], full_key, rest, value)
                }
            }
        }
    } else {
        let RawData::Map(map) = node else {
            return Err(DottedError::Conflict {
                key: full_key.to_string(),
            });
        };
        if rest.is_empty() {
            match map.get_mut(seg) {
                Some(slot) => replace_leaf(slot, full_key, value),
                None => {
                    map.insert(seg.to_string(), value);
                    Ok(())
                }
            }
        } else {
            let child = map
                .entry(seg.to_string())
                .or_insert_with(|| fresh_container(rest[0]));
            descend(child, full_key, rest, value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(pairs: &[(&str, &str)]) -> FormData {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_from_flat_plain() {
        let nested = RawData::from_flat(&flat(&[("a", "1"), ("b", "2")])).unwrap();
        assert_eq!(nested.get("a").unwrap(), &RawData::value("1"));
        assert_eq!(nested.get("b").unwrap(), &RawData::value("2"));
    }

    #[test]
    fn test_from_flat_nested_maps() {
        let nested =
            RawData::from_flat(&flat(&[("a.a", "1"), ("a.b", "3"), ("b", "2")])).unwrap();
        assert_eq!(nested.get("a.a").unwrap(), &RawData::value("1"));
        assert_eq!(nested.get("a.b").unwrap(), &RawData::value("3"));
        assert_eq!(nested.get("b").unwrap(), &RawData::value("2"));
        assert!(nested.get("a").unwrap().is_container());
    }

    #[test]
    fn test_from_flat_deep() {
        let nested = RawData::from_flat(&flat(&[("a.a.a", "1"), ("a.b.a", "3")])).unwrap();
        assert_eq!(nested.get("a.a.a").unwrap(), &RawData::value("1"));
        assert_eq!(nested.get("a.b.a").unwrap(), &RawData::value("3"));
    }

    #[test]
    fn test_from_flat_sequences() {
        let nested =
            RawData::from_flat(&flat(&[("a.a.0", "1"), ("a.a.1", "3"), ("a.b", "2")])).unwrap();
        assert_eq!(
            nested.get("a.a").unwrap(),
            &RawData::List(vec![RawData::value("1"), RawData::value("3")])
        );
        assert_eq!(nested.get("a.a.1").unwrap(), &RawData::value("3"));
    }

    #[test]
    fn test_from_flat_sequence_of_maps() {
        let nested = RawData::from_flat(&flat(&[
            ("list.0.a", "1"),
            ("list.0.b", "2"),
            ("list.1.a", "3"),
            ("list.1.b", "4"),
        ]))
        .unwrap();
        assert_eq!(nested.get("list.0.a").unwrap(), &RawData::value("1"));
        assert_eq!(nested.get("list.1.b").unwrap(), &RawData::value("4"));
        assert_eq!(nested.get("list").unwrap().child_count(), 2);
    }

    #[test]
    fn test_from_flat_double_digit_indices_in_order() {
        let pairs: Vec<(String, String)> =
            (0..12).map(|i| (format!("x.{i}"), format!("v{i}"))).collect();
        let mut data = FormData::new();
        for (k, v) in &pairs {
            data.append(k.clone(), v.clone());
        }
        let nested = RawData::from_flat(&data).unwrap();
        assert_eq!(nested.get("x").unwrap().child_count(), 12);
        assert_eq!(nested.get("x.10").unwrap(), &RawData::value("v10"));
    }

    #[test]
    fn test_from_flat_prefix_conflict() {
        let err = RawData::from_flat(&flat(&[("a.a", "1"), ("b", "2"), ("a", "7")])).unwrap_err();
        assert!(matches!(err, DottedError::Conflict { .. }));
    }

    #[test]
    fn test_from_flat_multi_values() {
        let nested = RawData::from_flat(&flat(&[("x", "1"), ("x", "2")])).unwrap();
        assert_eq!(nested.get("x").unwrap(), &RawData::values(["1", "2"]));
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            flat(&[("a", "1"), ("b", "2")]),
            flat(&[("a.a", "1"), ("a.b", "3"), ("b", "2")]),
            flat(&[("a.a.0", "1"), ("a.a.1", "3"), ("a.b", "2")]),
            flat(&[("list.0.a", "1"), ("list.1.a", "3")]),
            flat(&[("x", "1"), ("x", "2"), ("y.0", "a"), ("y.1", "b")]),
        ];
        for case in cases {
            let nested = RawData::from_flat(&case).unwrap();
            assert_eq!(nested.to_flat(), case);
        }
    }

    #[test]
    fn test_get_missing() {
        let nested = RawData::from_flat(&flat(&[("a.b", "1")])).unwrap();
        assert!(matches!(
            nested.get("a.c"),
            Err(DottedError::KeyNotFound { .. })
        ));
        assert!(matches!(
            nested.get("a.b.c"),
            Err(DottedError::KeyNotFound { .. })
        ));
        assert_eq!(nested.get_opt("a.c"), None);
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut nested = RawData::empty_map();
        nested.set("list.0.a", RawData::value("x")).unwrap();
        assert_eq!(nested.get("list.0.a").unwrap(), &RawData::value("x"));
        nested.set("list.1.a", RawData::value("y")).unwrap();
        assert_eq!(nested.get("list").unwrap().child_count(), 2);
    }

    #[test]
    fn test_set_sparse_index_is_error() {
        let mut nested = RawData::empty_map();
        nested.set("x.0", RawData::value("a")).unwrap();
        let err = nested.set("x.2", RawData::value("c")).unwrap_err();
        assert_eq!(
            err,
            DottedError::SparseIndex {
                key: "x.2".into(),
                index: 2
            }
        );
    }

    #[test]
    fn test_set_through_leaf_is_conflict() {
        let mut nested = RawData::empty_map();
        nested.set("a", RawData::value("1")).unwrap();
        let err = nested.set("a.b", RawData::value("2")).unwrap_err();
        assert!(matches!(err, DottedError::Conflict { .. }));
    }

    #[test]
    fn test_set_replaces_existing_leaf() {
        let mut nested = RawData::empty_map();
        nested.set("a", RawData::value("1")).unwrap();
        nested.set("a", RawData::value("2")).unwrap();
        assert_eq!(nested.get("a").unwrap(), &RawData::value("2"));
    }

    #[test]
    fn test_index_into_map_is_conflict() {
        let mut nested = RawData::empty_map();
        nested.set("a.b", RawData::value("1")).unwrap();
        let err = nested.set("a.0", RawData::value("2")).unwrap_err();
        assert!(matches!(err, DottedError::Conflict { .. }));
    }

    #[test]
    fn test_setdefault() {
        let mut nested = RawData::empty_map();
        nested.set("a", RawData::value("1")).unwrap();
        let existing = nested.setdefault("a", RawData::value("9")).unwrap();
        assert_eq!(existing, &mut RawData::value("1"));
        let fresh = nested.setdefault("b.c", RawData::value("2")).unwrap();
        assert_eq!(fresh, &mut RawData::value("2"));
        assert_eq!(nested.get("b.c").unwrap(), &RawData::value("2"));
    }

    #[test]
    fn test_keys_and_dotted_keys() {
        let nested = RawData::from_flat(&flat(&[("a.a.0", "1"), ("a.a.1", "3"), ("b", "2")]))
            .unwrap();
        assert_eq!(nested.keys(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            nested.dotted_keys(),
            vec!["a.a.0".to_string(), "a.a.1".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_leaf_accessors() {
        let leaf = RawData::values(["1", "2"]);
        assert_eq!(leaf.as_values(), Some(&["1".to_string(), "2".to_string()][..]));
        assert_eq!(leaf.first(), Some("1"));
        assert_eq!(leaf.child_count(), 2);
        assert!(!leaf.is_container());
        assert_eq!(RawData::empty_map().first(), None);
    }

    #[test]
    fn test_structural_equality_after_normalization() {
        let a = RawData::from_flat(&flat(&[("a.b", "1"), ("a.c", "2")])).unwrap();
        let mut b = RawData::empty_map();
        b.set("a.c", RawData::value("2")).unwrap();
        b.set("a.b", RawData::value("1")).unwrap();
        assert_eq!(a, b);
    }
}
