//! The engine and its public handle.
//!
//! [`GraphStore`] wraps the crate-private engine in an
//! `Arc<Mutex<..>>` shared with every [`Graph`](crate::graph::Graph),
//! node and edge view handed out. Handles never own data; they hold the
//! shared engine plus identifying keys and consult the engine's current
//! `(branch, rev)` cursor on every access.
//!
//! CURSOR
//! ======
//! The store is always positioned at a `(branch, rev)` pair, persisted
//! in the reserved globals and restored at open. Revisions advance only
//! by explicit assignment. Assigning an unknown branch name forks a new
//! branch off the current position; assigning a known branch demands
//! the current revision lie within that branch's extent, so a branch
//! can never be entered before the point it forked from its parent.
//!
//! CACHING
//! =======
//! By default the engine warms its in-memory caches from the database
//! at open and serves every read from them, hitting SQL only on a cold
//! miss. Opening with `Options { caching: false }` turns the caches off
//! entirely and every read runs the hi-rev query catalog along the
//! branch ancestry. The two modes answer identically; the test suite
//! runs the end-to-end scenarios under both.

pub(crate) mod core;
#[cfg(test)]
mod engine_test;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::codec::Value;
use crate::error::{CResult, Error};
use crate::graph::{Graph, GraphKind};
use crate::storage::SqlStore;

use self::core::Engine;

/// Store-wide options.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Serve reads from the in-memory caches (warmed at open) instead
    /// of running SQL per read.
    pub caching: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { caching: true }
    }
}

/// A versioned graph store. Cloning is cheap and shares the engine.
pub struct GraphStore {
    inner: Arc<Mutex<Engine>>,
}

impl Clone for GraphStore {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl GraphStore {
    /// Opens (or creates) a database file with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> CResult<Self> {
        Self::open_with(path, Options::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, options: Options) -> CResult<Self> {
        Self::from_store(SqlStore::open(path.as_ref())?, options)
    }

    /// Opens a fresh in-memory store with default options.
    pub fn open_in_memory() -> CResult<Self> {
        Self::open_in_memory_with(Options::default())
    }

    pub fn open_in_memory_with(options: Options) -> CResult<Self> {
        Self::from_store(SqlStore::open_in_memory()?, options)
    }

    fn from_store(store: SqlStore, options: Options) -> CResult<Self> {
        let engine = Engine::open(store, options.caching)?;
        Ok(Self { inner: Arc::new(Mutex::new(engine)) })
    }

    pub(crate) fn lock(&self) -> CResult<MutexGuard<'_, Engine>> {
        self.inner
            .lock()
            .map_err(|_| Error::Internal("engine mutex poisoned".to_string()))
    }

    // cursor

    pub fn branch(&self) -> CResult<String> {
        Ok(self.lock()?.branch().to_string())
    }

    /// Switch branches, creating the branch off the current position if
    /// the name is new.
    pub fn set_branch(&self, branch: &str) -> CResult<()> {
        self.lock()?.set_branch(branch)
    }

    pub fn rev(&self) -> CResult<i64> {
        Ok(self.lock()?.rev())
    }

    pub fn set_rev(&self, rev: i64) -> CResult<()> {
        self.lock()?.set_rev(rev)
    }

    /// The `(branch, rev)` pairs from the cursor back to master.
    pub fn active_branches(&self) -> CResult<Vec<(String, i64)>> {
        Ok(self.lock()?.active_branches())
    }

    /// Whether `parent` is a proper ancestor of `child`.
    pub fn is_parent_of(&self, parent: &str, child: &str) -> CResult<bool> {
        Ok(self.lock()?.is_parent_of(parent, child))
    }

    // graphs

    /// Create a graph and return its handle.
    pub fn new_graph<N: Into<Value>>(&self, name: N, kind: GraphKind) -> CResult<Graph> {
        let name = name.into();
        self.lock()?.new_graph(&name, kind)?;
        Ok(Graph::new(self.clone(), name, kind))
    }

    /// Handle to an existing graph.
    pub fn graph<N: Into<Value>>(&self, name: N) -> CResult<Graph> {
        let name = name.into();
        let kind = self.lock()?.graph_kind(&name)?;
        Ok(Graph::new(self.clone(), name, kind))
    }

    /// Drop a graph and everything attached to it, at every branch and
    /// revision.
    pub fn del_graph<N: Into<Value>>(&self, name: N) -> CResult<()> {
        self.lock()?.del_graph(&name.into())
    }

    /// All graphs with their kinds, by name.
    pub fn graphs(&self) -> CResult<Vec<(Value, GraphKind)>> {
        Ok(self.lock()?.graphs())
    }

    // globals

    pub fn global_get<K: Into<Value>>(&self, key: K) -> CResult<Value> {
        self.lock()?.global_get(&key.into())
    }

    pub fn global_set<K: Into<Value>, V: Into<Value>>(&self, key: K, value: V) -> CResult<()> {
        self.lock()?.global_set(&key.into(), &value.into())
    }

    pub fn global_del<K: Into<Value>>(&self, key: K) -> CResult<()> {
        self.lock()?.global_del(&key.into())
    }

    pub fn global_items(&self) -> CResult<Vec<(Value, Value)>> {
        self.lock()?.global_items()
    }

    // lifecycle

    /// Counts of graphs, branches, and globals.
    pub fn status(&self) -> CResult<crate::storage::Status> {
        self.lock()?.status()
    }

    /// Flush buffered writes and commit the open transaction.
    pub fn commit(&self) -> CResult<()> {
        self.lock()?.commit()
    }

    /// Flush, commit, and release the connection on drop.
    pub fn close(&self) -> CResult<()> {
        self.lock()?.close()
    }
}
