//! `revgraph` is a versioned graph store: it persists labeled graphs
//! (simple, directed, multi, directed-multi) together with the
//! key/value attributes on the graph, its nodes, and its edges, and
//! lets you read or mutate them *as they were* at any point in a
//! git-like branch tree.
//!
//! BRANCHES AND REVISIONS
//! ======================
//! History is organized in branches forking from a parent branch at a
//! parent revision, rooted at `master`. Within a branch, revisions are
//! integers that advance only by explicit assignment of the store's
//! cursor. A read at `(branch, r)` answers with the value at the
//! greatest revision at or before `r` in that branch; when the branch
//! never recorded the datum, the query transparently falls back through
//! the branch's ancestry. Deletion writes a tombstone revision, so the
//! past stays intact: rewind the cursor and the deleted value is back.
//!
//! For example, one key of one graph may hold these values across two
//! branches (x is a tombstone; `child` forked from `master` at rev 1):
//!
//! ```text
//! Rev     0    1    2    3
//! master  a         b
//! child            x    c
//! ```
//!
//! * At `(master, r)` the key reads `a` for r in 0..2 and `b` after.
//! * At `(child, 1)` nothing is recorded in `child`; the read falls
//!   back to `(master, 1)` and answers `a`.
//! * At `(child, 2)` the tombstone applies: the key is absent, even
//!   though `master` has `b`.
//! * At `(child, 3)` it reads `c`.
//!
//! STORAGE
//! =======
//! Everything lives in SQLite. Each branched table keys its rows by
//! `(..., branch, rev)` and reads run a hi-rev self-join picking the
//! most recent row per group at or before the queried revision; the
//! engine performs the ancestry walk above SQL. Writes buffer in a
//! per-table batcher that flushes before any read of the same table.
//! An in-memory multi-revision cache, warmed at open, answers reads
//! without SQL; cache and database always agree.
//!
//! ## Getting started
//!
//! ```rust
//! use revgraph::{GraphKind, GraphStore};
//!
//! fn main() -> revgraph::CResult<()> {
//!     let store = GraphStore::open_in_memory()?;
//!     let g = store.new_graph("friends", GraphKind::Graph)?;
//!
//!     g.add_node("alice")?;
//!     g.add_node("bob")?;
//!     g.add_edge("alice", "bob")?;
//!     g.edge("alice", "bob")?.set("since", 2011i64)?;
//!
//!     // Fork a branch and change history there.
//!     store.set_rev(1)?;
//!     store.set_branch("fallout")?;
//!     g.remove_edge("alice", "bob")?;
//!     assert!(!g.has_edge("alice", "bob")?);
//!
//!     // master is untouched.
//!     store.set_branch("master")?;
//!     assert!(g.has_edge("alice", "bob")?);
//!
//!     store.close()
//! }
//! ```

pub mod branch;
pub mod cache;
pub mod codec;
pub mod engine;
pub mod error;
pub mod graph;
pub mod storage;
pub mod window;

pub use codec::Value;
pub use engine::{GraphStore, Options};
pub use error::{CResult, Error};
pub use graph::{Edge, Graph, GraphKind, Node};
