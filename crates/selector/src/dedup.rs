//! Order-preserving duplicate removal
//!
//! Node identity is whatever `Hash + Eq` the host gives its handles. Nothing
//! is written onto the nodes themselves: each scope keeps its own stamp table
//! and a pass counter, so one allocation serves every step of a query.

use ahash::AHashMap;
use std::hash::Hash;

/// Per-query "seen" bookkeeping
pub struct DedupScope<N> {
    pass: u32,
    stamps: AHashMap<N, u32>,
}

impl<N: Copy + Eq + Hash> DedupScope<N> {
    pub fn new() -> Self {
        Self {
            pass: 0,
            stamps: AHashMap::new(),
        }
    }

    /// Start a fresh pass; everything seen before is forgotten
    pub fn begin_pass(&mut self) {
        self.pass += 1;
    }

    /// True the first time `node` shows up in the current pass
    pub fn first_sighting(&mut self, node: N) -> bool {
        self.stamps.insert(node, self.pass) != Some(self.pass)
    }
}

impl<N: Copy + Eq + Hash> Default for DedupScope<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep the first occurrence of every node, preserving order
pub fn zip<N: Copy + Eq + Hash>(candidates: impl IntoIterator<Item = N>) -> Vec<N> {
    let mut scope = DedupScope::new();
    scope.begin_pass();
    candidates
        .into_iter()
        .filter(|&node| scope.first_sighting(node))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_keeps_first_occurrence() {
        assert_eq!(zip([3, 1, 3, 2, 1, 4]), vec![3, 1, 2, 4]);
        assert!(zip(Vec::<u32>::new()).is_empty());
    }

    #[test]
    fn test_passes_are_independent() {
        let mut scope = DedupScope::new();
        scope.begin_pass();
        assert!(scope.first_sighting(7u32));
        assert!(!scope.first_sighting(7));

        scope.begin_pass();
        assert!(scope.first_sighting(7));
        assert!(!scope.first_sighting(7));
    }
}
