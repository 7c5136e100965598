//! The query catalog: every piece of SQL the store runs, as named,
//! parameterized statements.
//!
//! Reads of branched tables use the hi-rev self-join: the table joined
//! against its own `GROUP BY (group-key, branch) MAX(rev)` restricted to
//! `rev <= ?`, so each group answers with its most recent row at or
//! before the queried revision. The branch-ancestry walk stays in the
//! engine, which runs these once per ancestor until a row comes back.

// presence counts

pub const CTBRANCH: &str = "SELECT COUNT(branch) FROM branches WHERE branch = ?1";
pub const CTGRAPH: &str = "SELECT COUNT(graph) FROM graphs WHERE graph = ?1";
pub const CTGLOBAL: &str = "SELECT COUNT(key) FROM global";

// enumerations

pub const ALLBRANCH: &str = "SELECT branch, parent, parent_rev FROM branches";
pub const GRAPHS_TYPES: &str = "SELECT graph, type FROM graphs";
pub const GLOBAL_ITEMS: &str = "SELECT key, value FROM global";

// global key/value

pub const GLOBAL_GET: &str = "SELECT value FROM global WHERE key = ?1";
pub const GLOBAL_INS: &str = "INSERT INTO global (key, value) VALUES (?1, ?2)";
pub const GLOBAL_UPD: &str = "UPDATE global SET value = ?1 WHERE key = ?2";
pub const GLOBAL_DEL: &str = "DELETE FROM global WHERE key = ?1";

// branch metadata

pub const NEW_BRANCH: &str =
    "INSERT INTO branches (branch, parent, parent_rev) VALUES (?1, ?2, ?3)";
pub const PARREV: &str = "SELECT parent_rev FROM branches WHERE branch = ?1";
pub const PARPARREV: &str = "SELECT parent, parent_rev FROM branches WHERE branch = ?1";

// graph lifecycle

pub const NEW_GRAPH: &str = "INSERT INTO graphs (graph, type) VALUES (?1, ?2)";
pub const GRAPH_TYPE: &str = "SELECT type FROM graphs WHERE graph = ?1";
pub const DEL_GRAPH: &str = "DELETE FROM graphs WHERE graph = ?1";
pub const DEL_GRAPH_VAL_GRAPH: &str = "DELETE FROM graph_val WHERE graph = ?1";
pub const DEL_NODE_VAL_GRAPH: &str = "DELETE FROM node_val WHERE graph = ?1";
pub const DEL_NODE_GRAPH: &str = "DELETE FROM nodes WHERE graph = ?1";
pub const DEL_EDGE_VAL_GRAPH: &str = "DELETE FROM edge_val WHERE graph = ?1";
pub const DEL_EDGE_GRAPH: &str = "DELETE FROM edges WHERE graph = ?1";

// graph_val: hi-rev reads and the paired insert/update

pub const GRAPH_VAL_GET: &str = "
SELECT graph_val.value FROM graph_val JOIN (
    SELECT graph, key, branch, MAX(rev) AS rev FROM graph_val
    WHERE graph = ?1 AND key = ?2 AND branch = ?3 AND rev <= ?4
    GROUP BY graph, key, branch
) hirev ON graph_val.graph = hirev.graph
       AND graph_val.key = hirev.key
       AND graph_val.branch = hirev.branch
       AND graph_val.rev = hirev.rev";

pub const GRAPH_VAL_ITEMS: &str = "
SELECT graph_val.key, graph_val.value FROM graph_val JOIN (
    SELECT graph, key, branch, MAX(rev) AS rev FROM graph_val
    WHERE graph = ?1 AND branch = ?2 AND rev <= ?3
    GROUP BY graph, key, branch
) hirev ON graph_val.graph = hirev.graph
       AND graph_val.key = hirev.key
       AND graph_val.branch = hirev.branch
       AND graph_val.rev = hirev.rev";

pub const GRAPH_VAL_INS: &str =
    "INSERT INTO graph_val (graph, key, branch, rev, value) VALUES (?1, ?2, ?3, ?4, ?5)";
pub const GRAPH_VAL_UPD: &str =
    "UPDATE graph_val SET value = ?1 WHERE graph = ?2 AND key = ?3 AND branch = ?4 AND rev = ?5";

// nodes: existence

pub const NODE_EXISTS: &str = "
SELECT nodes.extant FROM nodes JOIN (
    SELECT graph, node, branch, MAX(rev) AS rev FROM nodes
    WHERE graph = ?1 AND node = ?2 AND branch = ?3 AND rev <= ?4
    GROUP BY graph, node, branch
) hirev ON nodes.graph = hirev.graph
       AND nodes.node = hirev.node
       AND nodes.branch = hirev.branch
       AND nodes.rev = hirev.rev";

/// Extant flag included so the engine's seen-set can shadow ancestor
/// rows for nodes removed in a child branch.
pub const NODES_EXTANT: &str = "
SELECT nodes.node, nodes.extant FROM nodes JOIN (
    SELECT graph, node, branch, MAX(rev) AS rev FROM nodes
    WHERE graph = ?1 AND branch = ?2 AND rev <= ?3
    GROUP BY graph, node, branch
) hirev ON nodes.graph = hirev.graph
       AND nodes.node = hirev.node
       AND nodes.branch = hirev.branch
       AND nodes.rev = hirev.rev";

pub const EXIST_NODE_INS: &str =
    "INSERT INTO nodes (graph, node, branch, rev, extant) VALUES (?1, ?2, ?3, ?4, ?5)";
pub const EXIST_NODE_UPD: &str =
    "UPDATE nodes SET extant = ?1 WHERE graph = ?2 AND node = ?3 AND branch = ?4 AND rev = ?5";

// node_val

pub const NODE_VAL_GET: &str = "
SELECT node_val.value FROM node_val JOIN (
    SELECT graph, node, key, branch, MAX(rev) AS rev FROM node_val
    WHERE graph = ?1 AND node = ?2 AND key = ?3 AND branch = ?4 AND rev <= ?5
    GROUP BY graph, node, key, branch
) hirev ON node_val.graph = hirev.graph
       AND node_val.node = hirev.node
       AND node_val.key = hirev.key
       AND node_val.branch = hirev.branch
       AND node_val.rev = hirev.rev";

pub const NODE_VAL_ITEMS: &str = "
SELECT node_val.key, node_val.value FROM node_val JOIN (
    SELECT graph, node, key, branch, MAX(rev) AS rev FROM node_val
    WHERE graph = ?1 AND node = ?2 AND branch = ?3 AND rev <= ?4
    GROUP BY graph, node, key, branch
) hirev ON node_val.graph = hirev.graph
       AND node_val.node = hirev.node
       AND node_val.key = hirev.key
       AND node_val.branch = hirev.branch
       AND node_val.rev = hirev.rev";

pub const NODE_VAL_INS: &str = "
INSERT INTO node_val (graph, node, key, branch, rev, value)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
pub const NODE_VAL_UPD: &str = "
UPDATE node_val SET value = ?1
WHERE graph = ?2 AND node = ?3 AND key = ?4 AND branch = ?5 AND rev = ?6";

// edges: existence and the directed readers

pub const EDGE_EXISTS: &str = "
SELECT edges.extant FROM edges JOIN (
    SELECT graph, nodeA, nodeB, idx, branch, MAX(rev) AS rev FROM edges
    WHERE graph = ?1 AND nodeA = ?2 AND nodeB = ?3 AND idx = ?4
      AND branch = ?5 AND rev <= ?6
    GROUP BY graph, nodeA, nodeB, idx, branch
) hirev ON edges.graph = hirev.graph
       AND edges.nodeA = hirev.nodeA
       AND edges.nodeB = hirev.nodeB
       AND edges.idx = hirev.idx
       AND edges.branch = hirev.branch
       AND edges.rev = hirev.rev";

pub const EDGES_EXTANT: &str = "
SELECT edges.nodeA, edges.nodeB, edges.idx, edges.extant FROM edges JOIN (
    SELECT graph, nodeA, nodeB, idx, branch, MAX(rev) AS rev FROM edges
    WHERE graph = ?1 AND branch = ?2 AND rev <= ?3
    GROUP BY graph, nodeA, nodeB, idx, branch
) hirev ON edges.graph = hirev.graph
       AND edges.nodeA = hirev.nodeA
       AND edges.nodeB = hirev.nodeB
       AND edges.idx = hirev.idx
       AND edges.branch = hirev.branch
       AND edges.rev = hirev.rev";

/// Each row carries the parallel index so the engine can shadow
/// per-edge, not per-origin, while walking the ancestry.
pub const NODEAS: &str = "
SELECT edges.nodeA, edges.idx, edges.extant FROM edges JOIN (
    SELECT graph, nodeA, nodeB, idx, branch, MAX(rev) AS rev FROM edges
    WHERE graph = ?1 AND nodeB = ?2 AND branch = ?3 AND rev <= ?4
    GROUP BY graph, nodeA, nodeB, idx, branch
) hirev ON edges.graph = hirev.graph
       AND edges.nodeA = hirev.nodeA
       AND edges.nodeB = hirev.nodeB
       AND edges.idx = hirev.idx
       AND edges.branch = hirev.branch
       AND edges.rev = hirev.rev";

pub const NODEBS: &str = "
SELECT edges.nodeB, edges.idx, edges.extant FROM edges JOIN (
    SELECT graph, nodeA, nodeB, idx, branch, MAX(rev) AS rev FROM edges
    WHERE graph = ?1 AND nodeA = ?2 AND branch = ?3 AND rev <= ?4
    GROUP BY graph, nodeA, nodeB, idx, branch
) hirev ON edges.graph = hirev.graph
       AND edges.nodeA = hirev.nodeA
       AND edges.nodeB = hirev.nodeB
       AND edges.idx = hirev.idx
       AND edges.branch = hirev.branch
       AND edges.rev = hirev.rev";

pub const MULTI_EDGES: &str = "
SELECT edges.idx, edges.extant FROM edges JOIN (
    SELECT graph, nodeA, nodeB, idx, branch, MAX(rev) AS rev FROM edges
    WHERE graph = ?1 AND nodeA = ?2 AND nodeB = ?3 AND branch = ?4 AND rev <= ?5
    GROUP BY graph, nodeA, nodeB, idx, branch
) hirev ON edges.graph = hirev.graph
       AND edges.nodeA = hirev.nodeA
       AND edges.nodeB = hirev.nodeB
       AND edges.idx = hirev.idx
       AND edges.branch = hirev.branch
       AND edges.rev = hirev.rev";

pub const EDGE_EXIST_INS: &str = "
INSERT INTO edges (graph, nodeA, nodeB, idx, branch, rev, extant)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";
pub const EDGE_EXIST_UPD: &str = "
UPDATE edges SET extant = ?1
WHERE graph = ?2 AND nodeA = ?3 AND nodeB = ?4 AND idx = ?5 AND branch = ?6 AND rev = ?7";

// edge_val

pub const EDGE_VAL_GET: &str = "
SELECT edge_val.value FROM edge_val JOIN (
    SELECT graph, nodeA, nodeB, idx, key, branch, MAX(rev) AS rev FROM edge_val
    WHERE graph = ?1 AND nodeA = ?2 AND nodeB = ?3 AND idx = ?4 AND key = ?5
      AND branch = ?6 AND rev <= ?7
    GROUP BY graph, nodeA, nodeB, idx, key, branch
) hirev ON edge_val.graph = hirev.graph
       AND edge_val.nodeA = hirev.nodeA
       AND edge_val.nodeB = hirev.nodeB
       AND edge_val.idx = hirev.idx
       AND edge_val.key = hirev.key
       AND edge_val.branch = hirev.branch
       AND edge_val.rev = hirev.rev";

pub const EDGE_VAL_ITEMS: &str = "
SELECT edge_val.key, edge_val.value FROM edge_val JOIN (
    SELECT graph, nodeA, nodeB, idx, key, branch, MAX(rev) AS rev FROM edge_val
    WHERE graph = ?1 AND nodeA = ?2 AND nodeB = ?3 AND idx = ?4
      AND branch = ?5 AND rev <= ?6
    GROUP BY graph, nodeA, nodeB, idx, key, branch
) hirev ON edge_val.graph = hirev.graph
       AND edge_val.nodeA = hirev.nodeA
       AND edge_val.nodeB = hirev.nodeB
       AND edge_val.idx = hirev.idx
       AND edge_val.key = hirev.key
       AND edge_val.branch = hirev.branch
       AND edge_val.rev = hirev.rev";

pub const EDGE_VAL_INS: &str = "
INSERT INTO edge_val (graph, nodeA, nodeB, idx, key, branch, rev, value)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";
pub const EDGE_VAL_UPD: &str = "
UPDATE edge_val SET value = ?1
WHERE graph = ?2 AND nodeA = ?3 AND nodeB = ?4 AND idx = ?5 AND key = ?6
  AND branch = ?7 AND rev = ?8";

// bulk dumps, for cache warm-up

pub const GRAPH_VAL_DUMP: &str = "SELECT graph, key, branch, rev, value FROM graph_val";
pub const NODES_DUMP: &str = "SELECT graph, node, branch, rev, extant FROM nodes";
pub const NODE_VAL_DUMP: &str = "SELECT graph, node, key, branch, rev, value FROM node_val";
pub const EDGES_DUMP: &str = "SELECT graph, nodeA, nodeB, idx, branch, rev, extant FROM edges";
pub const EDGE_VAL_DUMP: &str =
    "SELECT graph, nodeA, nodeB, idx, key, branch, rev, value FROM edge_val";
