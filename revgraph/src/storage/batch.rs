use rusqlite::{params, Connection};

use crate::error::{CResult, Error};
use crate::storage::queries;

/// A pending `graph_val` row, already encoded for storage.
#[derive(Debug, Clone)]
pub struct GraphValRow {
    pub graph: String,
    pub key: String,
    pub branch: String,
    pub rev: i64,
    pub value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NodeRow {
    pub graph: String,
    pub node: String,
    pub branch: String,
    pub rev: i64,
    pub extant: bool,
}

#[derive(Debug, Clone)]
pub struct NodeValRow {
    pub graph: String,
    pub node: String,
    pub key: String,
    pub branch: String,
    pub rev: i64,
    pub value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EdgeRow {
    pub graph: String,
    pub node_a: String,
    pub node_b: String,
    pub idx: i64,
    pub branch: String,
    pub rev: i64,
    pub extant: bool,
}

#[derive(Debug, Clone)]
pub struct EdgeValRow {
    pub graph: String,
    pub node_a: String,
    pub node_b: String,
    pub idx: i64,
    pub key: String,
    pub branch: String,
    pub rev: i64,
    pub value: Option<String>,
}

/// Buffers pending inserts per table, in insertion order.
///
/// A buffer must be flushed before any read of its table and before
/// commit; flushing an empty buffer costs nothing. Flush order across
/// tables is free because the only foreign keys point at the `graphs`
/// and `branches` headers, which are written eagerly.
///
/// Each row is tried as an insert first; a uniqueness violation means
/// the same primary key was written earlier in the session, and the row
/// is reissued as an update.
#[derive(Debug, Default)]
pub struct WriteBatcher {
    graph_vals: Vec<GraphValRow>,
    nodes: Vec<NodeRow>,
    node_vals: Vec<NodeValRow>,
    edges: Vec<EdgeRow>,
    edge_vals: Vec<EdgeValRow>,
}

/// Run one row's insert, falling back to its update on a uniqueness
/// violation.
macro_rules! upsert {
    ($ins:expr, $ins_params:expr, $upd:expr, $upd_params:expr) => {
        match $ins.execute($ins_params) {
            Ok(_) => {}
            Err(err) => match Error::from(err) {
                Error::Integrity(_) => {
                    $upd.execute($upd_params)?;
                }
                other => return Err(other),
            },
        }
    };
}

impl WriteBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_graph_val(&mut self, row: GraphValRow) {
        self.graph_vals.push(row);
    }

    pub fn queue_node(&mut self, row: NodeRow) {
        self.nodes.push(row);
    }

    pub fn queue_node_val(&mut self, row: NodeValRow) {
        self.node_vals.push(row);
    }

    pub fn queue_edge(&mut self, row: EdgeRow) {
        self.edges.push(row);
    }

    pub fn queue_edge_val(&mut self, row: EdgeValRow) {
        self.edge_vals.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.graph_vals.is_empty()
            && self.nodes.is_empty()
            && self.node_vals.is_empty()
            && self.edges.is_empty()
            && self.edge_vals.is_empty()
    }

    pub fn flush_graph_vals(&mut self, conn: &Connection) -> CResult<()> {
        if self.graph_vals.is_empty() {
            return Ok(());
        }
        log::debug!("flushing {} graph_val rows", self.graph_vals.len());
        let mut ins = conn.prepare_cached(queries::GRAPH_VAL_INS)?;
        let mut upd = conn.prepare_cached(queries::GRAPH_VAL_UPD)?;
        for row in self.graph_vals.drain(..) {
            upsert!(
                ins,
                params![row.graph, row.key, row.branch, row.rev, row.value],
                upd,
                params![row.value, row.graph, row.key, row.branch, row.rev]
            );
        }
        Ok(())
    }

    pub fn flush_nodes(&mut self, conn: &Connection) -> CResult<()> {
        if self.nodes.is_empty() {
            return Ok(());
        }
        log::debug!("flushing {} node rows", self.nodes.len());
        let mut ins = conn.prepare_cached(queries::EXIST_NODE_INS)?;
        let mut upd = conn.prepare_cached(queries::EXIST_NODE_UPD)?;
        for row in self.nodes.drain(..) {
            upsert!(
                ins,
                params![row.graph, row.node, row.branch, row.rev, row.extant],
                upd,
                params![row.extant, row.graph, row.node, row.branch, row.rev]
            );
        }
        Ok(())
    }

    pub fn flush_node_vals(&mut self, conn: &Connection) -> CResult<()> {
        if self.node_vals.is_empty() {
            return Ok(());
        }
        log::debug!("flushing {} node_val rows", self.node_vals.len());
        let mut ins = conn.prepare_cached(queries::NODE_VAL_INS)?;
        let mut upd = conn.prepare_cached(queries::NODE_VAL_UPD)?;
        for row in self.node_vals.drain(..) {
            upsert!(
                ins,
                params![row.graph, row.node, row.key, row.branch, row.rev, row.value],
                upd,
                params![row.value, row.graph, row.node, row.key, row.branch, row.rev]
            );
        }
        Ok(())
    }

    pub fn flush_edges(&mut self, conn: &Connection) -> CResult<()> {
        if self.edges.is_empty() {
            return Ok(());
        }
        log::debug!("flushing {} edge rows", self.edges.len());
        let mut ins = conn.prepare_cached(queries::EDGE_EXIST_INS)?;
        let mut upd = conn.prepare_cached(queries::EDGE_EXIST_UPD)?;
        for row in self.edges.drain(..) {
            upsert!(
                ins,
                params![
                    row.graph, row.node_a, row.node_b, row.idx, row.branch, row.rev, row.extant
                ],
                upd,
                params![
                    row.extant, row.graph, row.node_a, row.node_b, row.idx, row.branch, row.rev
                ]
            );
        }
        Ok(())
    }

    pub fn flush_edge_vals(&mut self, conn: &Connection) -> CResult<()> {
        if self.edge_vals.is_empty() {
            return Ok(());
        }
        log::debug!("flushing {} edge_val rows", self.edge_vals.len());
        let mut ins = conn.prepare_cached(queries::EDGE_VAL_INS)?;
        let mut upd = conn.prepare_cached(queries::EDGE_VAL_UPD)?;
        for row in self.edge_vals.drain(..) {
            upsert!(
                ins,
                params![
                    row.graph, row.node_a, row.node_b, row.idx, row.key, row.branch, row.rev,
                    row.value
                ],
                upd,
                params![
                    row.value, row.graph, row.node_a, row.node_b, row.idx, row.key, row.branch,
                    row.rev
                ]
            );
        }
        Ok(())
    }

    pub fn flush_all(&mut self, conn: &Connection) -> CResult<()> {
        self.flush_nodes(conn)?;
        self.flush_edges(conn)?;
        self.flush_graph_vals(conn)?;
        self.flush_node_vals(conn)?;
        self.flush_edge_vals(conn)?;
        Ok(())
    }
}
