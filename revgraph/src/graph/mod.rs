//! The graph façade: lightweight handles over the shared engine.
//!
//! A [`Graph`] and the [`Node`] and [`Edge`] views it hands out hold
//! the shared engine plus identifying keys, never data. Every access
//! consults the engine at its *current* `(branch, rev)` cursor, so the
//! same handle answers differently after the cursor moves — that is the
//! point. Reads of absent things fail with `NotFound`; writes silently
//! create the enclosing path (setting an edge attribute brings both
//! endpoints and the edge itself into existence).
//!
//! Undirected kinds store each edge once, under the endpoint pair
//! ordered by value, and answer adjacency symmetrically from the
//! forward and predecessor indexes. Parallel edges exist only on the
//! multi kinds; everywhere else the index is pinned to 0.

#[cfg(test)]
mod graph_test;

use std::fmt;

use crate::codec::Value;
use crate::engine::GraphStore;
use crate::error::{CResult, Error};

/// The four graph kinds, as stored in the `graphs` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphKind {
    Graph,
    DiGraph,
    MultiGraph,
    MultiDiGraph,
}

impl GraphKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphKind::Graph => "Graph",
            GraphKind::DiGraph => "DiGraph",
            GraphKind::MultiGraph => "MultiGraph",
            GraphKind::MultiDiGraph => "MultiDiGraph",
        }
    }

    /// Whether edge direction is significant.
    pub fn is_directed(&self) -> bool {
        matches!(self, GraphKind::DiGraph | GraphKind::MultiDiGraph)
    }

    /// Whether parallel edges are allowed.
    pub fn is_multi(&self) -> bool {
        matches!(self, GraphKind::MultiGraph | GraphKind::MultiDiGraph)
    }
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GraphKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Graph" => Ok(GraphKind::Graph),
            "DiGraph" => Ok(GraphKind::DiGraph),
            "MultiGraph" => Ok(GraphKind::MultiGraph),
            "MultiDiGraph" => Ok(GraphKind::MultiDiGraph),
            other => Err(Error::Value(format!("unknown graph type {}", other))),
        }
    }
}

/// Handle to one stored graph.
#[derive(Clone)]
pub struct Graph {
    store: GraphStore,
    name: Value,
    kind: GraphKind,
}

impl Graph {
    pub(crate) fn new(store: GraphStore, name: Value, kind: GraphKind) -> Self {
        Self { store, name, kind }
    }

    pub fn name(&self) -> &Value {
        &self.name
    }

    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    /// The stored orientation of an endpoint pair: as given when
    /// directed, ordered by value when not.
    fn order(&self, u: Value, v: Value) -> (Value, Value) {
        if self.kind.is_directed() || u <= v {
            (u, v)
        } else {
            (v, u)
        }
    }

    fn check_idx(&self, idx: i64) -> CResult<()> {
        if idx != 0 && !self.kind.is_multi() {
            return Err(Error::Value(format!(
                "{} does not allow parallel edges",
                self.kind
            )));
        }
        if idx < 0 {
            return Err(Error::Value(format!("negative edge index {}", idx)));
        }
        Ok(())
    }

    // graph attributes

    pub fn get<K: Into<Value>>(&self, key: K) -> CResult<Value> {
        self.store.lock()?.graph_val_get(&self.name, &key.into())
    }

    pub fn set<K: Into<Value>, V: Into<Value>>(&self, key: K, value: V) -> CResult<()> {
        self.store
            .lock()?
            .graph_val_set(&self.name, &key.into(), &value.into())
    }

    pub fn del<K: Into<Value>>(&self, key: K) -> CResult<()> {
        self.store.lock()?.graph_val_del(&self.name, &key.into())
    }

    pub fn keys(&self) -> CResult<Vec<Value>> {
        self.store.lock()?.graph_val_keys(&self.name)
    }

    pub fn contains_key<K: Into<Value>>(&self, key: K) -> CResult<bool> {
        self.store.lock()?.graph_val_contains(&self.name, &key.into())
    }

    pub fn attr_count(&self) -> CResult<usize> {
        self.store.lock()?.graph_val_count(&self.name)
    }

    /// The effective attribute mapping, by key.
    pub fn items(&self) -> CResult<Vec<(Value, Value)>> {
        let keys = self.keys()?;
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.get(key.clone())?;
            out.push((key, value));
        }
        Ok(out)
    }

    // nodes

    /// Declare the node extant and return its view.
    pub fn add_node<N: Into<Value>>(&self, node: N) -> CResult<Node> {
        let node = node.into();
        self.store.lock()?.exist_node(&self.name, &node, true)?;
        Ok(Node { store: self.store.clone(), graph: self.name.clone(), node })
    }

    /// Declare the node gone. Incident edge records stay; they drop out
    /// of adjacency together with the node.
    pub fn remove_node<N: Into<Value>>(&self, node: N) -> CResult<()> {
        let node = node.into();
        let mut engine = self.store.lock()?;
        if !engine.node_exists(&self.name, &node)? {
            return Err(Error::NotFound(format!("no node {}", node)));
        }
        engine.exist_node(&self.name, &node, false)
    }

    pub fn has_node<N: Into<Value>>(&self, node: N) -> CResult<bool> {
        self.store.lock()?.node_exists(&self.name, &node.into())
    }

    /// Nodes extant at the cursor, by value.
    pub fn nodes(&self) -> CResult<Vec<Value>> {
        self.store.lock()?.nodes_extant(&self.name)
    }

    pub fn node_count(&self) -> CResult<usize> {
        self.store.lock()?.nodes_count(&self.name)
    }

    /// View of an existing node.
    pub fn node<N: Into<Value>>(&self, node: N) -> CResult<Node> {
        let node = node.into();
        if !self.has_node(node.clone())? {
            return Err(Error::NotFound(format!("no node {}", node)));
        }
        Ok(Node { store: self.store.clone(), graph: self.name.clone(), node })
    }

    // edges

    /// Add an edge, creating missing endpoints. On multi kinds this
    /// allocates the first free parallel index; otherwise the index is
    /// 0 and the edge is replaced if already present.
    pub fn add_edge<U: Into<Value>, V: Into<Value>>(&self, u: U, v: V) -> CResult<Edge> {
        let (a, b) = self.order(u.into(), v.into());
        let idx = if self.kind.is_multi() {
            let taken = self.store.lock()?.edge_indices(&self.name, &a, &b)?;
            let mut idx = taken.len() as i64;
            while taken.contains(&idx) {
                idx += 1;
            }
            idx
        } else {
            0
        };
        self.add_ordered_edge(a, b, idx)
    }

    /// Add an edge at an explicit parallel index (multi kinds only,
    /// except index 0).
    pub fn add_edge_at<U: Into<Value>, V: Into<Value>>(
        &self,
        u: U,
        v: V,
        idx: i64,
    ) -> CResult<Edge> {
        self.check_idx(idx)?;
        let (a, b) = self.order(u.into(), v.into());
        self.add_ordered_edge(a, b, idx)
    }

    fn add_ordered_edge(&self, a: Value, b: Value, idx: i64) -> CResult<Edge> {
        let mut engine = self.store.lock()?;
        if !engine.node_exists(&self.name, &a)? {
            engine.exist_node(&self.name, &a, true)?;
        }
        if !engine.node_exists(&self.name, &b)? {
            engine.exist_node(&self.name, &b, true)?;
        }
        engine.exist_edge(&self.name, &a, &b, idx, true)?;
        drop(engine);
        Ok(Edge { store: self.store.clone(), graph: self.name.clone(), a, b, idx })
    }

    /// Remove an edge: index 0 on plain kinds, the highest parallel
    /// index on multi kinds.
    pub fn remove_edge<U: Into<Value>, V: Into<Value>>(&self, u: U, v: V) -> CResult<()> {
        let (a, b) = self.order(u.into(), v.into());
        let mut engine = self.store.lock()?;
        let indices = engine.edge_indices(&self.name, &a, &b)?;
        let idx = *indices
            .last()
            .ok_or_else(|| Error::NotFound(format!("no edge {} -> {}", a, b)))?;
        engine.exist_edge(&self.name, &a, &b, idx, false)
    }

    /// Remove the edge at an explicit parallel index.
    pub fn remove_edge_at<U: Into<Value>, V: Into<Value>>(
        &self,
        u: U,
        v: V,
        idx: i64,
    ) -> CResult<()> {
        self.check_idx(idx)?;
        let (a, b) = self.order(u.into(), v.into());
        let mut engine = self.store.lock()?;
        if !engine.edge_exists(&self.name, &a, &b, idx)? {
            return Err(Error::NotFound(format!("no edge {} -> {} [{}]", a, b, idx)));
        }
        engine.exist_edge(&self.name, &a, &b, idx, false)
    }

    /// Whether any edge connects `u` to `v` at the cursor.
    pub fn has_edge<U: Into<Value>, V: Into<Value>>(&self, u: U, v: V) -> CResult<bool> {
        let (a, b) = self.order(u.into(), v.into());
        Ok(!self.store.lock()?.edge_indices(&self.name, &a, &b)?.is_empty())
    }

    pub fn has_edge_at<U: Into<Value>, V: Into<Value>>(
        &self,
        u: U,
        v: V,
        idx: i64,
    ) -> CResult<bool> {
        self.check_idx(idx)?;
        let (a, b) = self.order(u.into(), v.into());
        self.store.lock()?.edge_exists(&self.name, &a, &b, idx)
    }

    /// View of the edge at index 0.
    pub fn edge<U: Into<Value>, V: Into<Value>>(&self, u: U, v: V) -> CResult<Edge> {
        self.edge_at(u, v, 0)
    }

    /// View of the edge at an explicit parallel index.
    pub fn edge_at<U: Into<Value>, V: Into<Value>>(&self, u: U, v: V, idx: i64) -> CResult<Edge> {
        self.check_idx(idx)?;
        let (a, b) = self.order(u.into(), v.into());
        if !self.store.lock()?.edge_exists(&self.name, &a, &b, idx)? {
            return Err(Error::NotFound(format!("no edge {} -> {} [{}]", a, b, idx)));
        }
        Ok(Edge { store: self.store.clone(), graph: self.name.clone(), a, b, idx })
    }

    /// The extant parallel-edge indices between two nodes, ascending.
    pub fn edge_indices<U: Into<Value>, V: Into<Value>>(&self, u: U, v: V) -> CResult<Vec<i64>> {
        let (a, b) = self.order(u.into(), v.into());
        self.store.lock()?.edge_indices(&self.name, &a, &b)
    }

    /// Nodes reachable from `u` along an edge. On undirected kinds this
    /// is the full neighborhood.
    pub fn successors<N: Into<Value>>(&self, u: N) -> CResult<Vec<Value>> {
        let u = u.into();
        let mut engine = self.store.lock()?;
        let mut out = engine.successors(&self.name, &u)?;
        if !self.kind.is_directed() {
            // The stored orientation is ordered, so neighbors on the
            // other side live in the predecessor index.
            let back = engine.predecessors(&self.name, &u)?;
            out.extend(back);
            out.sort();
            out.dedup();
        }
        Ok(out)
    }

    /// Nodes with an edge into `v`. Same as [`successors`] on
    /// undirected kinds.
    ///
    /// [`successors`]: Graph::successors
    pub fn predecessors<N: Into<Value>>(&self, v: N) -> CResult<Vec<Value>> {
        let v = v.into();
        if !self.kind.is_directed() {
            return self.successors(v);
        }
        self.store.lock()?.predecessors(&self.name, &v)
    }

    /// Tombstone every edge, node, and graph attribute at the cursor.
    /// The graph itself (and its name) stays.
    pub fn clear(&self) -> CResult<()> {
        let nodes = self.nodes()?;
        {
            let mut engine = self.store.lock()?;
            for u in engine.edge_origins(&self.name)? {
                for v in engine.successors(&self.name, &u)? {
                    for idx in engine.edge_indices(&self.name, &u, &v)? {
                        engine.exist_edge(&self.name, &u, &v, idx, false)?;
                    }
                }
            }
            for u in &nodes {
                engine.exist_node(&self.name, u, false)?;
            }
        }
        for key in self.keys()? {
            self.del(key)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// View of one node's attributes.
#[derive(Clone)]
pub struct Node {
    store: GraphStore,
    graph: Value,
    node: Value,
}

impl Node {
    pub fn name(&self) -> &Value {
        &self.node
    }

    pub fn get<K: Into<Value>>(&self, key: K) -> CResult<Value> {
        self.store.lock()?.node_val_get(&self.graph, &self.node, &key.into())
    }

    /// Set an attribute, bringing the node into existence if needed.
    pub fn set<K: Into<Value>, V: Into<Value>>(&self, key: K, value: V) -> CResult<()> {
        let mut engine = self.store.lock()?;
        if !engine.node_exists(&self.graph, &self.node)? {
            engine.exist_node(&self.graph, &self.node, true)?;
        }
        engine.node_val_set(&self.graph, &self.node, &key.into(), &value.into())
    }

    pub fn del<K: Into<Value>>(&self, key: K) -> CResult<()> {
        self.store.lock()?.node_val_del(&self.graph, &self.node, &key.into())
    }

    pub fn keys(&self) -> CResult<Vec<Value>> {
        self.store.lock()?.node_val_keys(&self.graph, &self.node)
    }

    pub fn contains_key<K: Into<Value>>(&self, key: K) -> CResult<bool> {
        self.store
            .lock()?
            .node_val_contains(&self.graph, &self.node, &key.into())
    }

    pub fn items(&self) -> CResult<Vec<(Value, Value)>> {
        let keys = self.keys()?;
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.get(key.clone())?;
            out.push((key, value));
        }
        Ok(out)
    }

    /// Set several attributes, skipping ones already at the wanted
    /// value.
    pub fn update<I>(&self, pairs: I) -> CResult<()>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        for (key, value) in pairs {
            match self.get(key.clone()) {
                Ok(existing) if existing == value => continue,
                Ok(_) | Err(Error::NotFound(_)) => self.set(key, value)?,
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

/// View of one edge's attributes. Holds the stored orientation.
#[derive(Clone)]
pub struct Edge {
    store: GraphStore,
    graph: Value,
    a: Value,
    b: Value,
    idx: i64,
}

impl Edge {
    pub fn node_a(&self) -> &Value {
        &self.a
    }

    pub fn node_b(&self) -> &Value {
        &self.b
    }

    pub fn idx(&self) -> i64 {
        self.idx
    }

    pub fn get<K: Into<Value>>(&self, key: K) -> CResult<Value> {
        self.store
            .lock()?
            .edge_val_get(&self.graph, &self.a, &self.b, self.idx, &key.into())
    }

    /// Set an attribute, bringing the edge and both endpoints into
    /// existence if needed.
    pub fn set<K: Into<Value>, V: Into<Value>>(&self, key: K, value: V) -> CResult<()> {
        let mut engine = self.store.lock()?;
        if !engine.node_exists(&self.graph, &self.a)? {
            engine.exist_node(&self.graph, &self.a, true)?;
        }
        if !engine.node_exists(&self.graph, &self.b)? {
            engine.exist_node(&self.graph, &self.b, true)?;
        }
        if !engine.edge_exists(&self.graph, &self.a, &self.b, self.idx)? {
            engine.exist_edge(&self.graph, &self.a, &self.b, self.idx, true)?;
        }
        engine.edge_val_set(&self.graph, &self.a, &self.b, self.idx, &key.into(), &value.into())
    }

    pub fn del<K: Into<Value>>(&self, key: K) -> CResult<()> {
        self.store
            .lock()?
            .edge_val_del(&self.graph, &self.a, &self.b, self.idx, &key.into())
    }

    pub fn keys(&self) -> CResult<Vec<Value>> {
        self.store
            .lock()?
            .edge_val_keys(&self.graph, &self.a, &self.b, self.idx)
    }

    pub fn contains_key<K: Into<Value>>(&self, key: K) -> CResult<bool> {
        self.store
            .lock()?
            .edge_val_contains(&self.graph, &self.a, &self.b, self.idx, &key.into())
    }

    pub fn items(&self) -> CResult<Vec<(Value, Value)>> {
        let keys = self.keys()?;
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.get(key.clone())?;
            out.push((key, value));
        }
        Ok(out)
    }

    /// Set several attributes, skipping ones already at the wanted
    /// value.
    pub fn update<I>(&self, pairs: I) -> CResult<()>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        for (key, value) in pairs {
            match self.get(key.clone()) {
                Ok(existing) if existing == value => continue,
                Ok(_) | Err(Error::NotFound(_)) => self.set(key, value)?,
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}
