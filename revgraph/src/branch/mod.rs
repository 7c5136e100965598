//! Branch genealogy.
//!
//! Branches form a forest rooted at `master`, whose parent is itself at
//! revision 0. Every branch records the parent it forked from and the
//! parent revision at the fork point. The [`Ancestry`] iterator walks a
//! `(branch, rev)` query point back through that genealogy, which is how
//! every read falls back to inherited history.

use std::collections::HashMap;

use crate::error::{CResult, Error};

/// The root branch every store starts with.
pub const MASTER: &str = "master";

/// In-memory registry of `{branch -> (parent, parent_rev)}`.
#[derive(Debug, Clone)]
pub struct BranchIndex {
    parents: HashMap<String, (String, i64)>,
}

impl Default for BranchIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchIndex {
    pub fn new() -> Self {
        let mut parents = HashMap::new();
        parents.insert(MASTER.to_string(), (MASTER.to_string(), 0));
        Self { parents }
    }

    pub fn contains(&self, branch: &str) -> bool {
        self.parents.contains_key(branch)
    }

    /// The `(parent, parent_rev)` pair for a branch, if registered.
    pub fn parent_of(&self, branch: &str) -> Option<(&str, i64)> {
        self.parents.get(branch).map(|(p, r)| (p.as_str(), *r))
    }

    /// Record that `branch` forks from `parent` at `parent_rev`. The
    /// parent must already be registered; the branch must not be.
    pub fn register(&mut self, branch: &str, parent: &str, parent_rev: i64) -> CResult<()> {
        if !self.parents.contains_key(parent) {
            return Err(Error::Branch(format!("unknown parent branch {}", parent)));
        }
        if self.parents.contains_key(branch) {
            return Err(Error::Branch(format!("branch {} already exists", branch)));
        }
        log::debug!("branch {} forked from {} at rev {}", branch, parent, parent_rev);
        self.parents
            .insert(branch.to_string(), (parent.to_string(), parent_rev));
        Ok(())
    }

    /// All registered branches as `(branch, parent, parent_rev)` rows.
    pub fn all(&self) -> impl Iterator<Item = (&str, &str, i64)> {
        self.parents
            .iter()
            .map(|(b, (p, r))| (b.as_str(), p.as_str(), *r))
    }

    /// The finite sequence of `(branch, rev)` pairs from the query point
    /// back to `master`, clamping the revision to each fork point on the
    /// way down.
    pub fn ancestry(&self, branch: &str, rev: i64) -> Ancestry<'_> {
        Ancestry { index: self, next: Some((branch.to_string(), rev)) }
    }

    /// How many branches lie on the path from `branch` to master,
    /// endpoints included. Master itself has depth 1.
    pub fn depth(&self, branch: &str) -> usize {
        self.ancestry(branch, 0).count()
    }

    /// Whether `a` is a proper transitive ancestor of `b`.
    pub fn is_parent_of(&self, a: &str, b: &str) -> bool {
        let mut cur = b;
        while cur != MASTER {
            match self.parents.get(cur) {
                Some((parent, _)) => {
                    if parent == a {
                        return true;
                    }
                    cur = parent;
                }
                None => return false,
            }
        }
        false
    }
}

/// Iterator over a branch's genealogy; see [`BranchIndex::ancestry`].
pub struct Ancestry<'a> {
    index: &'a BranchIndex,
    next: Option<(String, i64)>,
}

impl<'a> Iterator for Ancestry<'a> {
    type Item = (String, i64);

    fn next(&mut self) -> Option<Self::Item> {
        let (branch, rev) = self.next.take()?;
        if branch != MASTER {
            self.next = self
                .index
                .parent_of(&branch)
                .map(|(parent, parent_rev)| (parent.to_string(), rev.min(parent_rev)));
        }
        Some((branch, rev))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lineage() -> BranchIndex {
        let mut idx = BranchIndex::new();
        idx.register("no_edge", MASTER, 1).unwrap();
        idx.register("triangle", "no_edge", 1).unwrap();
        idx.register("square", "triangle", 2).unwrap();
        idx
    }

    #[test]
    fn register_validates() {
        let mut idx = BranchIndex::new();
        assert!(idx.register("b1", "nope", 0).is_err());
        idx.register("b1", MASTER, 3).unwrap();
        assert!(idx.register("b1", MASTER, 3).is_err());
        assert!(idx.contains("b1"));
        assert_eq!(idx.parent_of("b1"), Some((MASTER, 3)));
    }

    #[test]
    fn ancestry_terminates_at_master() {
        let idx = lineage();
        let walk: Vec<_> = idx.ancestry("square", 5).collect();
        assert_eq!(
            walk,
            vec![
                ("square".to_string(), 5),
                ("triangle".to_string(), 2),
                ("no_edge".to_string(), 1),
                (MASTER.to_string(), 1),
            ]
        );

        // master yields itself exactly once.
        let walk: Vec<_> = idx.ancestry(MASTER, 7).collect();
        assert_eq!(walk, vec![(MASTER.to_string(), 7)]);

        assert_eq!(idx.depth(MASTER), 1);
        assert_eq!(idx.depth("square"), 4);
    }

    #[test]
    fn ancestry_clamps_to_fork_points() {
        let idx = lineage();
        // Querying below a fork point never looks past it.
        let walk: Vec<_> = idx.ancestry("square", 2).collect();
        assert_eq!(walk[1], ("triangle".to_string(), 2));
        assert_eq!(walk[2], ("no_edge".to_string(), 1));
    }

    #[test]
    fn parenthood_is_transitive_and_directed() {
        let idx = lineage();
        assert!(idx.is_parent_of(MASTER, "no_edge"));
        assert!(idx.is_parent_of(MASTER, "square"));
        assert!(idx.is_parent_of("no_edge", "triangle"));
        assert!(idx.is_parent_of("triangle", "square"));
        assert!(!idx.is_parent_of("square", MASTER));
        assert!(!idx.is_parent_of("triangle", "no_edge"));
        assert!(!idx.is_parent_of(MASTER, MASTER));
    }
}
