//! Position-independent identity for headings.
//!
//! Slug ids change whenever a title is edited. A stable key is the dot-joined chain of
//! sibling indices from the top of the outline down to a heading, so it only changes when
//! the sibling order at some level changes. Per-node state such as "collapsed" is stored
//! against these keys.

use crate::heading::HeadingNode;
use std::collections::HashMap;
use std::hash::BuildHasher;

/// Stable keys for one parse, indexed both ways.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StableKeyIndex {
    /// Heading id to stable key.
    pub by_id: HashMap<String, String>,
    /// Stable key to heading id.
    pub by_key: HashMap<String, String>,
}

impl StableKeyIndex {
    #[must_use]
    /// Compute keys for `headings` and index them both ways.
    pub fn new(headings: &[HeadingNode]) -> Self {
        let by_id = compute_stable_keys(headings);
        let by_key = invert_stable_keys(&by_id);
        Self { by_id, by_key }
    }

    #[must_use]
    /// Key for a heading id.
    pub fn key(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    #[must_use]
    /// Heading id currently holding a key.
    pub fn id(&self, key: &str) -> Option<&str> {
        self.by_key.get(key).map(String::as_str)
    }
}

#[must_use]
/// Map each heading id to its sibling-index path, e.g. `0.2.1`.
///
/// A cyclic `parent_id` chain (never produced by the parser) is cut at the first repeated
/// heading, so it terminates, but keys inside the cycle may collide.
pub fn compute_stable_keys(headings: &[HeadingNode]) -> HashMap<String, String> {
    let mut siblings: HashMap<Option<&str>, Vec<&HeadingNode>> = HashMap::new();
    for h in headings {
        siblings.entry(h.parent_id.as_deref()).or_default().push(h);
    }
    let mut index_of: HashMap<&str, usize> = HashMap::new();
    for group in siblings.values_mut() {
        group.sort_by_key(|h| h.start);
        for (i, h) in group.iter().enumerate() {
            index_of.insert(h.id.as_str(), i);
        }
    }
    let by_id: HashMap<&str, &HeadingNode> = headings.iter().map(|h| (h.id.as_str(), h)).collect();

    headings
        .iter()
        .map(|h| {
            let mut path = vec![index_of.get(h.id.as_str()).copied().unwrap_or(0)];
            let mut current = h;
            let mut seen = vec![h.id.as_str()];
            while let Some(parent) = current.parent_id.as_deref().and_then(|p| by_id.get(p)) {
                if seen.contains(&parent.id.as_str()) {
                    break;
                }
                seen.push(parent.id.as_str());
                path.push(index_of.get(parent.id.as_str()).copied().unwrap_or(0));
                current = parent;
            }
            let key = path
                .iter()
                .rev()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(".");
            (h.id.clone(), key)
        })
        .collect()
}

#[must_use]
/// Invert an id-to-key map.
pub fn invert_stable_keys<S: BuildHasher>(keys: &HashMap<String, String, S>) -> HashMap<String, String> {
    keys.iter().map(|(id, key)| (key.clone(), id.clone())).collect()
}

#[cfg(test)]
#[path = "tests/stable_key.rs"]
mod tests;
