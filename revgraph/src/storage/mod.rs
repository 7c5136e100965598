//! Persistence: the table schema, the parameterized query catalog, the
//! SQLite connection wrapper, and the write batcher.
//!
//! The relational encoding of time travel is the hi-rev self-join (see
//! [`queries`]): every branched table answers reads by grouping on its
//! logical key plus branch and taking the row with the greatest
//! revision at or before the queried one. The branch-ancestry walk
//! stays above this layer; persistence only ever answers for one
//! `(branch, rev)` at a time.

pub mod batch;
pub mod queries;
pub mod schema;
mod sqlite;

use serde_derive::{Deserialize, Serialize};

pub use sqlite::SqlStore;

/// A snapshot of what the store holds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Status {
    /// The name of the storage backend.
    pub name: String,

    /// The number of graphs.
    pub graphs: u64,

    /// The number of branches, master included.
    pub branches: u64,

    /// The number of global keys, the reserved cursor pair included.
    pub globals: u64,
}
