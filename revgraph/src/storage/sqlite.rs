use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::codec::{JsonCodec, Value};
use crate::error::{CResult, Error};
use crate::storage::batch::{
    EdgeRow, EdgeValRow, GraphValRow, NodeRow, NodeValRow, WriteBatcher,
};
use crate::storage::{queries, schema};

/// Wrapper around the SQLite connection that runs the query catalog.
///
/// Holds exactly one open transaction between `open` and
/// `commit`/`close`. Writes to the five branched tables buffer in the
/// [`WriteBatcher`]; every read method flushes its own table's buffer
/// first, so a read can never miss this session's writes. Graph and
/// branch headers are written eagerly since the batched tables'
/// foreign keys point at them.
///
/// Keys, values, and graph/node names cross this boundary as canonical
/// JSON text; the tombstone is SQL NULL. Branch names and revisions are
/// stored raw.
pub struct SqlStore {
    conn: Connection,
    batch: WriteBatcher,
    codec: JsonCodec,
}

impl SqlStore {
    /// Opens (or creates) a database file and begins the transaction.
    pub fn open(path: &Path) -> CResult<Self> {
        Self::from_conn(Connection::open(path)?)
    }

    /// Opens a fresh in-memory database.
    pub fn open_in_memory() -> CResult<Self> {
        Self::from_conn(Connection::open_in_memory()?)
    }

    fn from_conn(conn: Connection) -> CResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = OFF; BEGIN")?;
        Ok(Self { conn, batch: WriteBatcher::new(), codec: JsonCodec::new() })
    }

    /// Creates tables and indexes if missing and seeds the reserved
    /// globals. Safe to run on every open.
    pub fn init_schema(&mut self) -> CResult<()> {
        self.conn.execute_batch(schema::CREATE_ALL)?;
        if self.global_get(&Value::from("branch"))?.is_none() {
            self.global_set(&Value::from("branch"), &Value::from("master"))?;
        }
        if self.global_get(&Value::from("rev"))?.is_none() {
            self.global_set(&Value::from("rev"), &Value::from(0i64))?;
        }
        Ok(())
    }

    fn enc(&self, value: &Value) -> CResult<String> {
        self.codec.encode(value)
    }

    fn dec(&self, text: &str) -> CResult<Value> {
        self.codec.decode(text)
    }

    fn dec_opt(&self, text: Option<String>) -> CResult<Option<Value>> {
        match text {
            Some(t) => Ok(Some(self.dec(&t)?)),
            None => Ok(None),
        }
    }

    // global key/value

    pub fn global_get(&mut self, key: &Value) -> CResult<Option<Value>> {
        let key = self.enc(key)?;
        let mut stmt = self.conn.prepare_cached(queries::GLOBAL_GET)?;
        let row: Option<Option<String>> =
            stmt.query_row(params![key], |row| row.get(0)).optional()?;
        drop(stmt);
        match row {
            Some(text) => self.dec_opt(text),
            None => Ok(None),
        }
    }

    pub fn global_set(&mut self, key: &Value, value: &Value) -> CResult<()> {
        let key = self.enc(key)?;
        let value = self.enc(value)?;
        let ins = self
            .conn
            .prepare_cached(queries::GLOBAL_INS)?
            .execute(params![key, value]);
        match ins {
            Ok(_) => Ok(()),
            Err(err) => match Error::from(err) {
                Error::Integrity(_) => {
                    self.conn
                        .prepare_cached(queries::GLOBAL_UPD)?
                        .execute(params![value, key])?;
                    Ok(())
                }
                other => Err(other),
            },
        }
    }

    pub fn global_del(&mut self, key: &Value) -> CResult<()> {
        let key = self.enc(key)?;
        let n = self
            .conn
            .prepare_cached(queries::GLOBAL_DEL)?
            .execute(params![key])?;
        if n == 0 {
            return Err(Error::NotFound("global key not set".to_string()));
        }
        Ok(())
    }

    pub fn global_items(&mut self) -> CResult<Vec<(Value, Value)>> {
        let mut stmt = self.conn.prepare_cached(queries::GLOBAL_ITEMS)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (k, v) = row?;
            if let Some(v) = v {
                out.push((self.codec.decode(&k)?, self.codec.decode(&v)?));
            }
        }
        Ok(out)
    }

    pub fn ct_global(&mut self) -> CResult<i64> {
        let mut stmt = self.conn.prepare_cached(queries::CTGLOBAL)?;
        Ok(stmt.query_row([], |row| row.get(0))?)
    }

    // branches

    pub fn have_branch(&mut self, branch: &str) -> CResult<bool> {
        let mut stmt = self.conn.prepare_cached(queries::CTBRANCH)?;
        let n: i64 = stmt.query_row(params![branch], |row| row.get(0))?;
        Ok(n > 0)
    }

    pub fn all_branches(&mut self) -> CResult<Vec<(String, String, i64)>> {
        let mut stmt = self.conn.prepare_cached(queries::ALLBRANCH)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Eager insert; branch headers never buffer.
    pub fn new_branch(&mut self, branch: &str, parent: &str, parent_rev: i64) -> CResult<()> {
        self.conn
            .prepare_cached(queries::NEW_BRANCH)?
            .execute(params![branch, parent, parent_rev])?;
        Ok(())
    }

    pub fn parparrev(&mut self, branch: &str) -> CResult<(String, i64)> {
        let mut stmt = self.conn.prepare_cached(queries::PARPARREV)?;
        stmt.query_row(params![branch], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?
            .ok_or_else(|| Error::Branch(format!("unknown branch {}", branch)))
    }

    pub fn parrev(&mut self, branch: &str) -> CResult<i64> {
        let mut stmt = self.conn.prepare_cached(queries::PARREV)?;
        stmt.query_row(params![branch], |row| row.get(0))
            .optional()?
            .ok_or_else(|| Error::Branch(format!("unknown branch {}", branch)))
    }

    // graphs

    pub fn have_graph(&mut self, graph: &Value) -> CResult<bool> {
        let graph = self.enc(graph)?;
        let mut stmt = self.conn.prepare_cached(queries::CTGRAPH)?;
        let n: i64 = stmt.query_row(params![graph], |row| row.get(0))?;
        Ok(n > 0)
    }

    /// Eager insert; graph headers never buffer.
    pub fn new_graph(&mut self, graph: &Value, kind: &str) -> CResult<()> {
        let graph = self.enc(graph)?;
        self.conn
            .prepare_cached(queries::NEW_GRAPH)?
            .execute(params![graph, kind])?;
        Ok(())
    }

    pub fn graph_type(&mut self, graph: &Value) -> CResult<String> {
        let encoded = self.enc(graph)?;
        let mut stmt = self.conn.prepare_cached(queries::GRAPH_TYPE)?;
        stmt.query_row(params![encoded], |row| row.get(0))
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("no graph {}", graph)))
    }

    pub fn graphs_types(&mut self) -> CResult<Vec<(Value, String)>> {
        let mut stmt = self.conn.prepare_cached(queries::GRAPHS_TYPES)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (g, t) = row?;
            out.push((self.codec.decode(&g)?, t));
        }
        Ok(out)
    }

    /// Removes the graph header and every dependent row. Flushes all
    /// buffers first so no stale row for the graph lands afterwards.
    pub fn del_graph(&mut self, graph: &Value) -> CResult<()> {
        self.flush_all()?;
        let graph = self.enc(graph)?;
        for sql in [
            queries::DEL_EDGE_VAL_GRAPH,
            queries::DEL_NODE_VAL_GRAPH,
            queries::DEL_NODE_GRAPH,
            queries::DEL_EDGE_GRAPH,
            queries::DEL_GRAPH_VAL_GRAPH,
            queries::DEL_GRAPH,
        ] {
            self.conn.prepare_cached(sql)?.execute(params![graph])?;
        }
        Ok(())
    }

    // graph_val

    pub fn graph_val_set(
        &mut self,
        graph: &Value,
        key: &Value,
        branch: &str,
        rev: i64,
        value: Option<&Value>,
    ) -> CResult<()> {
        let row = GraphValRow {
            graph: self.enc(graph)?,
            key: self.enc(key)?,
            branch: branch.to_string(),
            rev,
            value: value.map(|v| self.enc(v)).transpose()?,
        };
        self.batch.queue_graph_val(row);
        Ok(())
    }

    /// The effective row at `(branch, rev)`: `None` when the branch has
    /// no row at or before `rev`, `Some(None)` when the row is a
    /// tombstone.
    pub fn graph_val_get(
        &mut self,
        graph: &Value,
        key: &Value,
        branch: &str,
        rev: i64,
    ) -> CResult<Option<Option<Value>>> {
        self.flush_graph_vals()?;
        let graph = self.enc(graph)?;
        let key = self.enc(key)?;
        let mut stmt = self.conn.prepare_cached(queries::GRAPH_VAL_GET)?;
        let row: Option<Option<String>> = stmt
            .query_row(params![graph, key, branch, rev], |row| row.get(0))
            .optional()?;
        drop(stmt);
        match row {
            Some(text) => Ok(Some(self.dec_opt(text)?)),
            None => Ok(None),
        }
    }

    /// Every key's effective row at `(branch, rev)`, tombstones
    /// included so the caller's seen-set can shadow ancestors.
    pub fn graph_val_items(
        &mut self,
        graph: &Value,
        branch: &str,
        rev: i64,
    ) -> CResult<Vec<(Value, Option<Value>)>> {
        self.flush_graph_vals()?;
        let graph = self.enc(graph)?;
        let mut stmt = self.conn.prepare_cached(queries::GRAPH_VAL_ITEMS)?;
        let rows = stmt.query_map(params![graph, branch, rev], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (k, v) = row?;
            out.push((self.codec.decode(&k)?, match v {
                Some(t) => Some(self.codec.decode(&t)?),
                None => None,
            }));
        }
        Ok(out)
    }

    pub fn graph_val_dump(&mut self) -> CResult<Vec<(Value, Value, String, i64, Option<Value>)>> {
        self.flush_graph_vals()?;
        let mut stmt = self.conn.prepare_cached(queries::GRAPH_VAL_DUMP)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (g, k, b, r, v) = row?;
            out.push((
                self.codec.decode(&g)?,
                self.codec.decode(&k)?,
                b,
                r,
                match v {
                    Some(t) => Some(self.codec.decode(&t)?),
                    None => None,
                },
            ));
        }
        Ok(out)
    }

    // nodes

    pub fn exist_node(
        &mut self,
        graph: &Value,
        node: &Value,
        branch: &str,
        rev: i64,
        extant: bool,
    ) -> CResult<()> {
        let row = NodeRow {
            graph: self.enc(graph)?,
            node: self.enc(node)?,
            branch: branch.to_string(),
            rev,
            extant,
        };
        self.batch.queue_node(row);
        Ok(())
    }

    pub fn node_exists(
        &mut self,
        graph: &Value,
        node: &Value,
        branch: &str,
        rev: i64,
    ) -> CResult<Option<bool>> {
        self.flush_nodes()?;
        let graph = self.enc(graph)?;
        let node = self.enc(node)?;
        let mut stmt = self.conn.prepare_cached(queries::NODE_EXISTS)?;
        Ok(stmt
            .query_row(params![graph, node, branch, rev], |row| row.get(0))
            .optional()?)
    }

    pub fn nodes_extant(
        &mut self,
        graph: &Value,
        branch: &str,
        rev: i64,
    ) -> CResult<Vec<(Value, bool)>> {
        self.flush_nodes()?;
        let graph = self.enc(graph)?;
        let mut stmt = self.conn.prepare_cached(queries::NODES_EXTANT)?;
        let rows = stmt.query_map(params![graph, branch, rev], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (n, x) = row?;
            out.push((self.codec.decode(&n)?, x));
        }
        Ok(out)
    }

    pub fn nodes_dump(&mut self) -> CResult<Vec<(Value, Value, String, i64, bool)>> {
        self.flush_nodes()?;
        let mut stmt = self.conn.prepare_cached(queries::NODES_DUMP)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, bool>(4)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (g, n, b, r, x) = row?;
            out.push((self.codec.decode(&g)?, self.codec.decode(&n)?, b, r, x));
        }
        Ok(out)
    }

    // node_val

    pub fn node_val_set(
        &mut self,
        graph: &Value,
        node: &Value,
        key: &Value,
        branch: &str,
        rev: i64,
        value: Option<&Value>,
    ) -> CResult<()> {
        let row = NodeValRow {
            graph: self.enc(graph)?,
            node: self.enc(node)?,
            key: self.enc(key)?,
            branch: branch.to_string(),
            rev,
            value: value.map(|v| self.enc(v)).transpose()?,
        };
        self.batch.queue_node_val(row);
        Ok(())
    }

    pub fn node_val_get(
        &mut self,
        graph: &Value,
        node: &Value,
        key: &Value,
        branch: &str,
        rev: i64,
    ) -> CResult<Option<Option<Value>>> {
        self.flush_node_vals()?;
        let graph = self.enc(graph)?;
        let node = self.enc(node)?;
        let key = self.enc(key)?;
        let mut stmt = self.conn.prepare_cached(queries::NODE_VAL_GET)?;
        let row: Option<Option<String>> = stmt
            .query_row(params![graph, node, key, branch, rev], |row| row.get(0))
            .optional()?;
        drop(stmt);
        match row {
            Some(text) => Ok(Some(self.dec_opt(text)?)),
            None => Ok(None),
        }
    }

    pub fn node_val_items(
        &mut self,
        graph: &Value,
        node: &Value,
        branch: &str,
        rev: i64,
    ) -> CResult<Vec<(Value, Option<Value>)>> {
        self.flush_node_vals()?;
        let graph = self.enc(graph)?;
        let node = self.enc(node)?;
        let mut stmt = self.conn.prepare_cached(queries::NODE_VAL_ITEMS)?;
        let rows = stmt.query_map(params![graph, node, branch, rev], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (k, v) = row?;
            out.push((self.codec.decode(&k)?, match v {
                Some(t) => Some(self.codec.decode(&t)?),
                None => None,
            }));
        }
        Ok(out)
    }

    pub fn node_val_dump(
        &mut self,
    ) -> CResult<Vec<(Value, Value, Value, String, i64, Option<Value>)>> {
        self.flush_node_vals()?;
        let mut stmt = self.conn.prepare_cached(queries::NODE_VAL_DUMP)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (g, n, k, b, r, v) = row?;
            out.push((
                self.codec.decode(&g)?,
                self.codec.decode(&n)?,
                self.codec.decode(&k)?,
                b,
                r,
                match v {
                    Some(t) => Some(self.codec.decode(&t)?),
                    None => None,
                },
            ));
        }
        Ok(out)
    }

    // edges

    pub fn exist_edge(
        &mut self,
        graph: &Value,
        node_a: &Value,
        node_b: &Value,
        idx: i64,
        branch: &str,
        rev: i64,
        extant: bool,
    ) -> CResult<()> {
        let row = EdgeRow {
            graph: self.enc(graph)?,
            node_a: self.enc(node_a)?,
            node_b: self.enc(node_b)?,
            idx,
            branch: branch.to_string(),
            rev,
            extant,
        };
        self.batch.queue_edge(row);
        Ok(())
    }

    pub fn edge_exists(
        &mut self,
        graph: &Value,
        node_a: &Value,
        node_b: &Value,
        idx: i64,
        branch: &str,
        rev: i64,
    ) -> CResult<Option<bool>> {
        self.flush_edges()?;
        let graph = self.enc(graph)?;
        let node_a = self.enc(node_a)?;
        let node_b = self.enc(node_b)?;
        let mut stmt = self.conn.prepare_cached(queries::EDGE_EXISTS)?;
        Ok(stmt
            .query_row(params![graph, node_a, node_b, idx, branch, rev], |row| row.get(0))
            .optional()?)
    }

    /// `(origin, idx, extant)` rows for edges into `node_b`.
    pub fn node_as(
        &mut self,
        graph: &Value,
        node_b: &Value,
        branch: &str,
        rev: i64,
    ) -> CResult<Vec<(Value, i64, bool)>> {
        self.flush_edges()?;
        let graph = self.enc(graph)?;
        let node_b = self.enc(node_b)?;
        let mut stmt = self.conn.prepare_cached(queries::NODEAS)?;
        let rows = stmt.query_map(params![graph, node_b, branch, rev], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, bool>(2)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (a, idx, x) = row?;
            out.push((self.codec.decode(&a)?, idx, x));
        }
        Ok(out)
    }

    /// `(destination, idx, extant)` rows for edges out of `node_a`.
    pub fn node_bs(
        &mut self,
        graph: &Value,
        node_a: &Value,
        branch: &str,
        rev: i64,
    ) -> CResult<Vec<(Value, i64, bool)>> {
        self.flush_edges()?;
        let graph = self.enc(graph)?;
        let node_a = self.enc(node_a)?;
        let mut stmt = self.conn.prepare_cached(queries::NODEBS)?;
        let rows = stmt.query_map(params![graph, node_a, branch, rev], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, bool>(2)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (b, idx, x) = row?;
            out.push((self.codec.decode(&b)?, idx, x));
        }
        Ok(out)
    }

    /// `(origin, destination, idx, extant)` rows for every edge in the
    /// graph, for enumerating nodes with outgoing edges.
    pub fn edges_extant(
        &mut self,
        graph: &Value,
        branch: &str,
        rev: i64,
    ) -> CResult<Vec<(Value, Value, i64, bool)>> {
        self.flush_edges()?;
        let graph = self.enc(graph)?;
        let mut stmt = self.conn.prepare_cached(queries::EDGES_EXTANT)?;
        let rows = stmt.query_map(params![graph, branch, rev], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, bool>(3)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (a, b, idx, x) = row?;
            out.push((self.codec.decode(&a)?, self.codec.decode(&b)?, idx, x));
        }
        Ok(out)
    }

    /// `(idx, extant)` rows for parallel edges between two nodes.
    pub fn multi_edges(
        &mut self,
        graph: &Value,
        node_a: &Value,
        node_b: &Value,
        branch: &str,
        rev: i64,
    ) -> CResult<Vec<(i64, bool)>> {
        self.flush_edges()?;
        let graph = self.enc(graph)?;
        let node_a = self.enc(node_a)?;
        let node_b = self.enc(node_b)?;
        let mut stmt = self.conn.prepare_cached(queries::MULTI_EDGES)?;
        let rows = stmt.query_map(params![graph, node_a, node_b, branch, rev], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, bool>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn edges_dump(&mut self) -> CResult<Vec<(Value, Value, Value, i64, String, i64, bool)>> {
        self.flush_edges()?;
        let mut stmt = self.conn.prepare_cached(queries::EDGES_DUMP)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, bool>(6)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (g, a, b, i, br, r, x) = row?;
            out.push((
                self.codec.decode(&g)?,
                self.codec.decode(&a)?,
                self.codec.decode(&b)?,
                i,
                br,
                r,
                x,
            ));
        }
        Ok(out)
    }

    // edge_val

    #[allow(clippy::too_many_arguments)]
    pub fn edge_val_set(
        &mut self,
        graph: &Value,
        node_a: &Value,
        node_b: &Value,
        idx: i64,
        key: &Value,
        branch: &str,
        rev: i64,
        value: Option<&Value>,
    ) -> CResult<()> {
        let row = EdgeValRow {
            graph: self.enc(graph)?,
            node_a: self.enc(node_a)?,
            node_b: self.enc(node_b)?,
            idx,
            key: self.enc(key)?,
            branch: branch.to_string(),
            rev,
            value: value.map(|v| self.enc(v)).transpose()?,
        };
        self.batch.queue_edge_val(row);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn edge_val_get(
        &mut self,
        graph: &Value,
        node_a: &Value,
        node_b: &Value,
        idx: i64,
        key: &Value,
        branch: &str,
        rev: i64,
    ) -> CResult<Option<Option<Value>>> {
        self.flush_edge_vals()?;
        let graph = self.enc(graph)?;
        let node_a = self.enc(node_a)?;
        let node_b = self.enc(node_b)?;
        let key = self.enc(key)?;
        let mut stmt = self.conn.prepare_cached(queries::EDGE_VAL_GET)?;
        let row: Option<Option<String>> = stmt
            .query_row(params![graph, node_a, node_b, idx, key, branch, rev], |row| {
                row.get(0)
            })
            .optional()?;
        drop(stmt);
        match row {
            Some(text) => Ok(Some(self.dec_opt(text)?)),
            None => Ok(None),
        }
    }

    pub fn edge_val_items(
        &mut self,
        graph: &Value,
        node_a: &Value,
        node_b: &Value,
        idx: i64,
        branch: &str,
        rev: i64,
    ) -> CResult<Vec<(Value, Option<Value>)>> {
        self.flush_edge_vals()?;
        let graph = self.enc(graph)?;
        let node_a = self.enc(node_a)?;
        let node_b = self.enc(node_b)?;
        let mut stmt = self.conn.prepare_cached(queries::EDGE_VAL_ITEMS)?;
        let rows = stmt.query_map(params![graph, node_a, node_b, idx, branch, rev], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (k, v) = row?;
            out.push((self.codec.decode(&k)?, match v {
                Some(t) => Some(self.codec.decode(&t)?),
                None => None,
            }));
        }
        Ok(out)
    }

    #[allow(clippy::type_complexity)]
    pub fn edge_val_dump(
        &mut self,
    ) -> CResult<Vec<(Value, Value, Value, i64, Value, String, i64, Option<Value>)>> {
        self.flush_edge_vals()?;
        let mut stmt = self.conn.prepare_cached(queries::EDGE_VAL_DUMP)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (g, a, b, i, k, br, r, v) = row?;
            out.push((
                self.codec.decode(&g)?,
                self.codec.decode(&a)?,
                self.codec.decode(&b)?,
                i,
                self.codec.decode(&k)?,
                br,
                r,
                match v {
                    Some(t) => Some(self.codec.decode(&t)?),
                    None => None,
                },
            ));
        }
        Ok(out)
    }

    /// Counts of what the database holds right now.
    pub fn status(&mut self) -> CResult<super::Status> {
        Ok(super::Status {
            name: "sqlite".to_string(),
            graphs: self.graphs_types()?.len() as u64,
            branches: self.all_branches()?.len() as u64,
            globals: self.ct_global()? as u64,
        })
    }

    // flushing and transaction control

    pub fn flush_graph_vals(&mut self) -> CResult<()> {
        self.batch.flush_graph_vals(&self.conn)
    }

    pub fn flush_nodes(&mut self) -> CResult<()> {
        self.batch.flush_nodes(&self.conn)
    }

    pub fn flush_node_vals(&mut self) -> CResult<()> {
        self.batch.flush_node_vals(&self.conn)
    }

    pub fn flush_edges(&mut self) -> CResult<()> {
        self.batch.flush_edges(&self.conn)
    }

    pub fn flush_edge_vals(&mut self) -> CResult<()> {
        self.batch.flush_edge_vals(&self.conn)
    }

    pub fn flush_all(&mut self) -> CResult<()> {
        self.batch.flush_all(&self.conn)
    }

    /// Flushes, commits the open transaction, and begins the next one.
    pub fn commit(&mut self) -> CResult<()> {
        self.flush_all()?;
        self.conn.execute_batch("COMMIT")?;
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    /// Flushes and commits; the connection closes on drop.
    pub fn close(&mut self) -> CResult<()> {
        self.flush_all()?;
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }
}
