use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::branch::BranchIndex;
use crate::cache::Cached;
use crate::codec::Value;
use crate::window::WindowMap;

/// Per-(key, branch) revision histories for one entity path.
type KeyHistories = HashMap<Value, HashMap<String, WindowMap<Option<Value>>>>;

/// Cache for one category of keyed, versioned data.
///
/// `P` is the identifying tuple of the entity: the graph name for graph
/// attributes and node existence, `(graph, node)` for node attributes,
/// `(graph, a, b, idx)` for edge attributes.
///
/// Two indexes are kept:
///
/// - `history`: path -> key -> branch -> revision history of
///   `Option<Value>`, where `None` is the tombstone;
/// - `extant`: path -> branch -> revision history of the set of keys
///   whose effective value is not a tombstone, maintained incrementally
///   and copy-on-write by every [`store`]. A write behind existing
///   snapshots is folded forward into every later snapshot up to the
///   key's next own revision in that branch, and the written key's
///   membership is re-derived in every materialized snapshot of the
///   branch's descendants, so no snapshot — own or inherited — ever
///   goes stale. A `(path, branch)` with no snapshot at all
///   reconstructs its first one straight from history.
///
/// Bulk warm-up replays rows through [`store`] in global revision
/// order, parents before children, so a snapshot exists at every
/// revision where the key set changed.
///
/// [`store`]: EntityCache::store
#[derive(Debug, Clone)]
pub struct EntityCache<P> {
    history: HashMap<P, KeyHistories>,
    extant: HashMap<P, HashMap<String, WindowMap<HashSet<Value>>>>,
}

impl<P> Default for EntityCache<P>
where
    P: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P> EntityCache<P>
where
    P: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self { history: HashMap::new(), extant: HashMap::new() }
    }

    /// Record `value` for `(path, key)` at `(branch, rev)`. `None` is the
    /// tombstone. Keeps the extant index current.
    pub fn store(
        &mut self,
        path: P,
        key: Value,
        branch: &str,
        rev: i64,
        value: Option<Value>,
        branches: &BranchIndex,
    ) {
        let key_win = self
            .history
            .entry(path.clone())
            .or_default()
            .entry(key.clone())
            .or_default()
            .entry(branch.to_string())
            .or_default();
        key_win.set(rev, value.clone());
        // The write governs the key until its own next revision in this
        // branch; snapshots in that span must fold it in.
        let next_own = key_win.rev_after(rev);

        self.forward_extant(&path, branch, rev, branches);
        let win = self
            .extant
            .get_mut(&path)
            .and_then(|m| m.get_mut(branch))
            .expect("forward_extant installed this window");
        // Copy-on-write: never mutate a set that older revisions share.
        let mut set = win.get_effective(rev).cloned().unwrap_or_default();
        if value.is_some() {
            set.insert(key.clone());
        } else {
            set.remove(&key);
        }
        win.set(rev, set);
        for (r, snapshot) in win.iter_mut() {
            if r > rev && next_own.map_or(true, |n| r < n) {
                if value.is_some() {
                    snapshot.insert(key.clone());
                } else {
                    snapshot.remove(&key);
                }
            }
        }

        self.repair_descendants(&path, &key, branch, branches);
    }

    /// Descendant branches may hold snapshots seeded by copying this
    /// branch's sets before the write existed; re-derive the written
    /// key's membership in each of them from history, so a copy never
    /// outlives an ancestor write that folds into it. A descendant's
    /// own record for the key still wins, since membership is recomputed
    /// through the full ancestry walk.
    fn repair_descendants(&mut self, path: &P, key: &Value, branch: &str, branches: &BranchIndex) {
        let others: Vec<(String, Vec<i64>)> = self
            .extant
            .get(path)
            .map(|m| {
                m.iter()
                    .filter(|(b, _)| branches.is_parent_of(branch, b))
                    .map(|(b, win)| (b.clone(), win.iter().map(|(r, _)| r).collect()))
                    .collect()
            })
            .unwrap_or_default();
        for (other, revs) in others {
            let mut membership = Vec::with_capacity(revs.len());
            for &r in &revs {
                membership.push(matches!(
                    self.effective(path, key, &other, r, branches),
                    Some((_, Some(_)))
                ));
            }
            if let Some(win) = self.extant.get_mut(path).and_then(|m| m.get_mut(&other)) {
                // iter_mut yields the same revision order the revs were
                // collected in; effective() never touches the extant
                // windows, so the two stay aligned.
                for ((_, snapshot), present) in win.iter_mut().zip(membership) {
                    if present {
                        snapshot.insert(key.clone());
                    } else {
                        snapshot.remove(key);
                    }
                }
            }
        }
    }

    /// The effective value of `(path, key)` at `(branch, rev)`, falling
    /// back along the ancestry. An answer found in an ancestor branch is
    /// back-filled at the query point before returning.
    pub fn retrieve(
        &mut self,
        path: &P,
        key: &Value,
        branch: &str,
        rev: i64,
        branches: &BranchIndex,
    ) -> Cached<Value> {
        match self.effective(path, key, branch, rev, branches) {
            Some((i, value)) => {
                if i > 0 {
                    log::trace!("cache back-fill at ({}, {})", branch, rev);
                    self.store(path.clone(), key.clone(), branch, rev, value.clone(), branches);
                }
                match value {
                    Some(v) => Cached::Hit(v),
                    None => Cached::Deleted,
                }
            }
            None => Cached::Miss,
        }
    }

    /// The keys with a non-tombstone effective value at `(branch, rev)`,
    /// in `Value` order.
    pub fn iter_keys(
        &mut self,
        path: &P,
        branch: &str,
        rev: i64,
        branches: &BranchIndex,
    ) -> Vec<Value> {
        self.forward_extant(path, branch, rev, branches);
        let mut keys: Vec<Value> = self
            .extant
            .get_mut(path)
            .and_then(|m| m.get_mut(branch))
            .and_then(|win| win.get_effective(rev))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// How many keys are extant at `(branch, rev)`.
    pub fn count_keys(
        &mut self,
        path: &P,
        branch: &str,
        rev: i64,
        branches: &BranchIndex,
    ) -> usize {
        self.forward_extant(path, branch, rev, branches);
        self.extant
            .get_mut(path)
            .and_then(|m| m.get_mut(branch))
            .and_then(|win| win.get_effective(rev))
            .map(|set| set.len())
            .unwrap_or(0)
    }

    /// Whether `key` is extant at `(branch, rev)`.
    pub fn contains(
        &mut self,
        path: &P,
        key: &Value,
        branch: &str,
        rev: i64,
        branches: &BranchIndex,
    ) -> bool {
        self.forward_extant(path, branch, rev, branches);
        self.extant
            .get_mut(path)
            .and_then(|m| m.get_mut(branch))
            .and_then(|win| win.get_effective(rev))
            .map(|set| set.contains(key))
            .unwrap_or(false)
    }

    /// Whether any history at all is cached for `path`.
    pub fn knows_path(&self, path: &P) -> bool {
        self.history.contains_key(path)
    }

    /// Drop every path the predicate matches, e.g. all paths of a
    /// deleted graph.
    pub fn purge_where<F>(&mut self, mut pred: F)
    where
        F: FnMut(&P) -> bool,
    {
        self.history.retain(|p, _| !pred(p));
        self.extant.retain(|p, _| !pred(p));
    }

    /// Walk the ancestry for the effective record of `(path, key)`.
    /// Returns the ancestry step it was found at and the record
    /// (tombstone included), or `None` when no branch in the chain has
    /// history at or before its clamped revision.
    fn effective(
        &mut self,
        path: &P,
        key: &Value,
        branch: &str,
        rev: i64,
        branches: &BranchIndex,
    ) -> Option<(usize, Option<Value>)> {
        for (i, (b, r)) in branches.ancestry(branch, rev).enumerate() {
            let win = match self
                .history
                .get_mut(path)
                .and_then(|keys| keys.get_mut(key))
                .and_then(|hist| hist.get_mut(&b))
            {
                Some(win) => win,
                None => continue,
            };
            if let Some(entry) = win.get_effective(r) {
                return Some((i, entry.clone()));
            }
            // History exists in this branch but starts after r; an
            // ancestor may still know the value.
        }
        None
    }

    /// Make sure `extant[path][branch]` has an entry at or before `rev`.
    /// Seeded by copying the nearest ancestor's known set, or, when no
    /// branch in the chain has one yet, reconstructed from history.
    fn forward_extant(&mut self, path: &P, branch: &str, rev: i64, branches: &BranchIndex) {
        if let Some(win) = self.extant.get_mut(path).and_then(|m| m.get_mut(branch)) {
            if win.get_effective(rev).is_some() {
                return;
            }
        }
        let mut seed: Option<HashSet<Value>> = None;
        for (b, r) in branches.ancestry(branch, rev) {
            if b == branch {
                continue;
            }
            if let Some(win) = self.extant.get_mut(path).and_then(|m| m.get_mut(&b)) {
                if let Some(set) = win.get_effective(r) {
                    seed = Some(set.clone());
                    break;
                }
            }
        }
        let seed = match seed {
            Some(set) => set,
            None => self.reconstruct(path, branch, rev, branches),
        };
        self.extant
            .entry(path.clone())
            .or_default()
            .entry(branch.to_string())
            .or_default()
            .set(rev, seed);
    }

    /// Compute the extant key set at `(branch, rev)` straight from
    /// history. Costs a walk per key; only runs the first time a
    /// `(path, branch)` is enumerated.
    fn reconstruct(
        &mut self,
        path: &P,
        branch: &str,
        rev: i64,
        branches: &BranchIndex,
    ) -> HashSet<Value> {
        let keys: Vec<Value> = self
            .history
            .get(path)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        let mut set = HashSet::new();
        for key in keys {
            if let Some((_, Some(_))) = self.effective(path, &key, branch, rev, branches) {
                set.insert(key);
            }
        }
        set
    }
}
