//! Table definitions.
//!
//! One table per entity category. Branched tables carry `(branch, rev)`
//! in their primary key; `value` columns are nullable because NULL is
//! the tombstone. String columns are length-limited to 50 as in the
//! reference schema (SQLite does not enforce the limit, the declaration
//! is kept for portability). Foreign keys are declared but, as in the
//! reference schema, not switched on.
//!
//! The whole batch is idempotent so it can run on every open; it also
//! seeds the root `master` branch row.

/// DDL for every table and index, plus the master branch seed.
pub const CREATE_ALL: &str = "
CREATE TABLE IF NOT EXISTS global (
    key VARCHAR(50) PRIMARY KEY,
    value VARCHAR(50)
);

CREATE TABLE IF NOT EXISTS branches (
    branch VARCHAR(50) PRIMARY KEY DEFAULT 'master',
    parent VARCHAR(50) DEFAULT 'master',
    parent_rev INTEGER DEFAULT 0,
    FOREIGN KEY(parent) REFERENCES branches(branch)
);

INSERT OR IGNORE INTO branches (branch, parent, parent_rev)
VALUES ('master', 'master', 0);

CREATE TABLE IF NOT EXISTS graphs (
    graph VARCHAR(50) PRIMARY KEY,
    type VARCHAR(50) DEFAULT 'Graph',
    CHECK (type IN ('Graph', 'DiGraph', 'MultiGraph', 'MultiDiGraph'))
);

CREATE TABLE IF NOT EXISTS graph_val (
    graph VARCHAR(50) NOT NULL,
    key VARCHAR(50) NOT NULL,
    branch VARCHAR(50) NOT NULL DEFAULT 'master',
    rev INTEGER NOT NULL DEFAULT 0,
    value VARCHAR(50),
    PRIMARY KEY (graph, key, branch, rev),
    FOREIGN KEY(graph) REFERENCES graphs(graph),
    FOREIGN KEY(branch) REFERENCES branches(branch)
);
CREATE INDEX IF NOT EXISTS graph_val_idx ON graph_val (graph, key);

CREATE TABLE IF NOT EXISTS nodes (
    graph VARCHAR(50) NOT NULL,
    node VARCHAR(50) NOT NULL,
    branch VARCHAR(50) NOT NULL DEFAULT 'master',
    rev INTEGER NOT NULL DEFAULT 0,
    extant BOOLEAN NOT NULL,
    PRIMARY KEY (graph, node, branch, rev),
    FOREIGN KEY(graph) REFERENCES graphs(graph),
    FOREIGN KEY(branch) REFERENCES branches(branch)
);
CREATE INDEX IF NOT EXISTS nodes_idx ON nodes (graph, node);

CREATE TABLE IF NOT EXISTS node_val (
    graph VARCHAR(50) NOT NULL,
    node VARCHAR(50) NOT NULL,
    key VARCHAR(50) NOT NULL,
    branch VARCHAR(50) NOT NULL DEFAULT 'master',
    rev INTEGER NOT NULL DEFAULT 0,
    value VARCHAR(50),
    PRIMARY KEY (graph, node, key, branch, rev),
    FOREIGN KEY(graph, node) REFERENCES nodes(graph, node),
    FOREIGN KEY(branch) REFERENCES branches(branch)
);
CREATE INDEX IF NOT EXISTS node_val_idx ON node_val (graph, node);

CREATE TABLE IF NOT EXISTS edges (
    graph VARCHAR(50) NOT NULL,
    nodeA VARCHAR(50) NOT NULL,
    nodeB VARCHAR(50) NOT NULL,
    idx INTEGER NOT NULL,
    branch VARCHAR(50) NOT NULL DEFAULT 'master',
    rev INTEGER NOT NULL DEFAULT 0,
    extant BOOLEAN NOT NULL,
    PRIMARY KEY (graph, nodeA, nodeB, idx, branch, rev),
    FOREIGN KEY(graph) REFERENCES graphs(graph),
    FOREIGN KEY(graph, nodeA) REFERENCES nodes(graph, node),
    FOREIGN KEY(graph, nodeB) REFERENCES nodes(graph, node),
    FOREIGN KEY(branch) REFERENCES branches(branch)
);
CREATE INDEX IF NOT EXISTS edges_idx ON edges (graph, nodeA, nodeB, idx);

CREATE TABLE IF NOT EXISTS edge_val (
    graph VARCHAR(50) NOT NULL,
    nodeA VARCHAR(50) NOT NULL,
    nodeB VARCHAR(50) NOT NULL,
    idx INTEGER NOT NULL,
    key VARCHAR(50) NOT NULL,
    branch VARCHAR(50) NOT NULL DEFAULT 'master',
    rev INTEGER NOT NULL DEFAULT 0,
    value VARCHAR(50),
    PRIMARY KEY (graph, nodeA, nodeB, idx, key, branch, rev),
    FOREIGN KEY(graph, nodeA, nodeB, idx) REFERENCES edges(graph, nodeA, nodeB, idx),
    FOREIGN KEY(branch) REFERENCES branches(branch)
);
CREATE INDEX IF NOT EXISTS edge_val_idx ON edge_val (graph, nodeA, nodeB, idx, key);
";
