use std::collections::HashMap;

use crate::branch::BranchIndex;
use crate::cache::Cached;
use crate::codec::Value;
use crate::window::WindowMap;

/// branch -> revision history of the existence flag. `Some(true)` means
/// the edge exists, `None` is the tombstone, exactly like attribute
/// histories.
type BranchWindows = HashMap<String, WindowMap<Option<bool>>>;
type IdxMap = HashMap<i64, BranchWindows>;
type NbrMap = HashMap<Value, IdxMap>;
type AdjMap = HashMap<Value, NbrMap>;

/// Cache of edge existence.
///
/// The forward index is `graph -> a -> b -> idx -> branch -> history`;
/// the predecessor index mirrors it as `graph -> b -> a -> ...`, so
/// incoming-edge queries cost O(fan-in) instead of a scan over every
/// origin node. Both indexes are written on every store.
#[derive(Debug, Clone, Default)]
pub struct EdgesCache {
    successors: HashMap<Value, AdjMap>,
    predecessors: HashMap<Value, AdjMap>,
}

impl EdgesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that edge `(a, b, idx)` exists (or doesn't) at
    /// `(branch, rev)`.
    pub fn store(
        &mut self,
        graph: Value,
        a: Value,
        b: Value,
        idx: i64,
        branch: &str,
        rev: i64,
        extant: bool,
    ) {
        let flag = if extant { Some(true) } else { None };
        self.successors
            .entry(graph.clone())
            .or_default()
            .entry(a.clone())
            .or_default()
            .entry(b.clone())
            .or_default()
            .entry(idx)
            .or_default()
            .entry(branch.to_string())
            .or_default()
            .set(rev, flag);
        self.predecessors
            .entry(graph)
            .or_default()
            .entry(b)
            .or_default()
            .entry(a)
            .or_default()
            .entry(idx)
            .or_default()
            .entry(branch.to_string())
            .or_default()
            .set(rev, flag);
    }

    /// Whether edge `(a, b, idx)` exists at `(branch, rev)`, falling back
    /// along the ancestry. An ancestor's answer is back-filled at the
    /// query point.
    pub fn retrieve(
        &mut self,
        graph: &Value,
        a: &Value,
        b: &Value,
        idx: i64,
        branch: &str,
        rev: i64,
        branches: &BranchIndex,
    ) -> Cached<bool> {
        let mut found: Option<(usize, Option<bool>)> = None;
        for (i, (br, r)) in branches.ancestry(branch, rev).enumerate() {
            let win = match self
                .successors
                .get_mut(graph)
                .and_then(|adj| adj.get_mut(a))
                .and_then(|nbrs| nbrs.get_mut(b))
                .and_then(|idxs| idxs.get_mut(&idx))
                .and_then(|hist| hist.get_mut(&br))
            {
                Some(win) => win,
                None => continue,
            };
            if let Some(flag) = win.get_effective(r) {
                found = Some((i, *flag));
                break;
            }
        }
        match found {
            Some((i, flag)) => {
                if i > 0 {
                    self.store(
                        graph.clone(),
                        a.clone(),
                        b.clone(),
                        idx,
                        branch,
                        rev,
                        flag == Some(true),
                    );
                }
                match flag {
                    Some(true) => Cached::Hit(true),
                    _ => Cached::Deleted,
                }
            }
            None => Cached::Miss,
        }
    }

    /// Destination nodes reachable from `a` by at least one extant edge,
    /// in `Value` order.
    pub fn successors_of(
        &mut self,
        graph: &Value,
        a: &Value,
        branch: &str,
        rev: i64,
        branches: &BranchIndex,
    ) -> Vec<Value> {
        let nbrs = match self.successors.get_mut(graph).and_then(|adj| adj.get_mut(a)) {
            Some(nbrs) => nbrs,
            None => return Vec::new(),
        };
        let mut out = Vec::new();
        for (b, idxs) in nbrs.iter_mut() {
            if any_extant(idxs, branch, rev, branches) {
                out.push(b.clone());
            }
        }
        out.sort();
        out
    }

    /// Origin nodes with at least one extant edge into `b`, in `Value`
    /// order. Served from the predecessor index.
    pub fn predecessors_of(
        &mut self,
        graph: &Value,
        b: &Value,
        branch: &str,
        rev: i64,
        branches: &BranchIndex,
    ) -> Vec<Value> {
        let origins = match self.predecessors.get_mut(graph).and_then(|adj| adj.get_mut(b)) {
            Some(origins) => origins,
            None => return Vec::new(),
        };
        let mut out = Vec::new();
        for (a, idxs) in origins.iter_mut() {
            if any_extant(idxs, branch, rev, branches) {
                out.push(a.clone());
            }
        }
        out.sort();
        out
    }

    /// Origin nodes with at least one extant outgoing edge, in `Value`
    /// order.
    pub fn origins_of(
        &mut self,
        graph: &Value,
        branch: &str,
        rev: i64,
        branches: &BranchIndex,
    ) -> Vec<Value> {
        let adj = match self.successors.get_mut(graph) {
            Some(adj) => adj,
            None => return Vec::new(),
        };
        let mut out = Vec::new();
        for (a, nbrs) in adj.iter_mut() {
            let extant = nbrs
                .values_mut()
                .any(|idxs| any_extant(idxs, branch, rev, branches));
            if extant {
                out.push(a.clone());
            }
        }
        out.sort();
        out
    }

    /// The indices of extant parallel edges between `a` and `b`,
    /// ascending.
    pub fn edge_indices(
        &mut self,
        graph: &Value,
        a: &Value,
        b: &Value,
        branch: &str,
        rev: i64,
        branches: &BranchIndex,
    ) -> Vec<i64> {
        let idxs = match self
            .successors
            .get_mut(graph)
            .and_then(|adj| adj.get_mut(a))
            .and_then(|nbrs| nbrs.get_mut(b))
        {
            Some(idxs) => idxs,
            None => return Vec::new(),
        };
        let mut out = Vec::new();
        for (idx, hist) in idxs.iter_mut() {
            if effective_flag(hist, branch, rev, branches) == Some(true) {
                out.push(*idx);
            }
        }
        out.sort_unstable();
        out
    }

    /// Drop everything cached for `graph`.
    pub fn purge_graph(&mut self, graph: &Value) {
        self.successors.remove(graph);
        self.predecessors.remove(graph);
    }
}

/// The decided existence flag for one parallel-edge history along the
/// ancestry: the first branch with a record at or before its clamped
/// revision answers.
fn effective_flag(
    hist: &mut BranchWindows,
    branch: &str,
    rev: i64,
    branches: &BranchIndex,
) -> Option<bool> {
    for (b, r) in branches.ancestry(branch, rev) {
        if let Some(win) = hist.get_mut(&b) {
            if let Some(flag) = win.get_effective(r) {
                return Some(flag == &Some(true));
            }
        }
    }
    None
}

/// Whether any parallel edge in `idxs` is extant at the query point.
fn any_extant(idxs: &mut IdxMap, branch: &str, rev: i64, branches: &BranchIndex) -> bool {
    idxs.values_mut()
        .any(|hist| effective_flag(hist, branch, rev, branches) == Some(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::MASTER;

    fn v(s: &str) -> Value {
        Value::from(s)
    }

    fn branches() -> BranchIndex {
        let mut idx = BranchIndex::new();
        idx.register("child", MASTER, 1).unwrap();
        idx
    }

    #[test]
    fn store_and_retrieve() {
        let idx = branches();
        let mut cache = EdgesCache::new();
        cache.store(v("g"), v("a"), v("b"), 0, MASTER, 0, true);

        assert_eq!(cache.retrieve(&v("g"), &v("a"), &v("b"), 0, MASTER, 0, &idx), Cached::Hit(true));
        // Direction matters at this layer.
        assert_eq!(cache.retrieve(&v("g"), &v("b"), &v("a"), 0, MASTER, 0, &idx), Cached::Miss);

        cache.store(v("g"), v("a"), v("b"), 0, MASTER, 2, false);
        assert_eq!(cache.retrieve(&v("g"), &v("a"), &v("b"), 0, MASTER, 2, &idx), Cached::Deleted);
        assert_eq!(cache.retrieve(&v("g"), &v("a"), &v("b"), 0, MASTER, 1, &idx), Cached::Hit(true));
    }

    #[test]
    fn child_branch_inherits_and_shadows() {
        let idx = branches();
        let mut cache = EdgesCache::new();
        cache.store(v("g"), v("a"), v("b"), 0, MASTER, 0, true);

        assert_eq!(cache.retrieve(&v("g"), &v("a"), &v("b"), 0, "child", 1, &idx), Cached::Hit(true));

        cache.store(v("g"), v("a"), v("b"), 0, "child", 1, false);
        assert_eq!(cache.retrieve(&v("g"), &v("a"), &v("b"), 0, "child", 1, &idx), Cached::Deleted);
        // Master is unaffected.
        assert_eq!(cache.retrieve(&v("g"), &v("a"), &v("b"), 0, MASTER, 1, &idx), Cached::Hit(true));
    }

    #[test]
    fn successor_and_predecessor_views() {
        let idx = branches();
        let mut cache = EdgesCache::new();
        cache.store(v("g"), v("a"), v("c"), 0, MASTER, 0, true);
        cache.store(v("g"), v("b"), v("c"), 0, MASTER, 0, true);
        cache.store(v("g"), v("d"), v("c"), 0, MASTER, 0, true);

        assert_eq!(cache.successors_of(&v("g"), &v("a"), MASTER, 0, &idx), vec![v("c")]);
        assert_eq!(
            cache.predecessors_of(&v("g"), &v("c"), MASTER, 0, &idx),
            vec![v("a"), v("b"), v("d")]
        );

        cache.store(v("g"), v("b"), v("c"), 0, MASTER, 1, false);
        assert_eq!(
            cache.predecessors_of(&v("g"), &v("c"), MASTER, 1, &idx),
            vec![v("a"), v("d")]
        );
        // The earlier revision still sees all three.
        assert_eq!(
            cache.predecessors_of(&v("g"), &v("c"), MASTER, 0, &idx),
            vec![v("a"), v("b"), v("d")]
        );
    }

    #[test]
    fn origins_follow_removals() {
        let idx = branches();
        let mut cache = EdgesCache::new();
        cache.store(v("g"), v("a"), v("b"), 0, MASTER, 0, true);
        cache.store(v("g"), v("c"), v("b"), 0, MASTER, 0, true);

        assert_eq!(cache.origins_of(&v("g"), MASTER, 0, &idx), vec![v("a"), v("c")]);

        cache.store(v("g"), v("c"), v("b"), 0, MASTER, 1, false);
        assert_eq!(cache.origins_of(&v("g"), MASTER, 1, &idx), vec![v("a")]);
        assert_eq!(cache.origins_of(&v("g"), MASTER, 0, &idx), vec![v("a"), v("c")]);
    }

    #[test]
    fn parallel_edges_are_independent() {
        let idx = branches();
        let mut cache = EdgesCache::new();
        cache.store(v("g"), v("a"), v("b"), 0, MASTER, 0, true);
        cache.store(v("g"), v("a"), v("b"), 1, MASTER, 0, true);

        assert_eq!(cache.edge_indices(&v("g"), &v("a"), &v("b"), MASTER, 0, &idx), vec![0, 1]);

        cache.store(v("g"), v("a"), v("b"), 0, MASTER, 1, false);
        assert_eq!(cache.edge_indices(&v("g"), &v("a"), &v("b"), MASTER, 1, &idx), vec![1]);
        // A node stays adjacent while any parallel edge survives.
        assert_eq!(cache.successors_of(&v("g"), &v("a"), MASTER, 1, &idx), vec![v("b")]);
    }
}
