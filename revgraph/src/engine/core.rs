use std::collections::{HashMap, HashSet};

use crate::branch::{BranchIndex, MASTER};
use crate::cache::{Cached, EdgesCache, EntityCache};
use crate::codec::Value;
use crate::error::{CResult, Error};
use crate::graph::GraphKind;
use crate::storage::{SqlStore, Status};

/// Path types for the attribute caches.
type NodePath = (Value, Value);
type EdgePath = (Value, Value, Value, i64);

/// The orchestrator: owns the store, the branch genealogy, the caches
/// and the `(branch, rev)` cursor, and serves every operation the
/// façade consumes.
///
/// With caching enabled (the default), the whole database is warmed
/// into the caches at open and reads are served from memory, falling
/// back to storage only on a cold miss, whose answer is back-filled.
/// With caching disabled every read walks the ancestry against the
/// hi-rev query catalog. Both paths answer identically.
pub(crate) struct Engine {
    store: SqlStore,
    branches: BranchIndex,
    caching: bool,
    branch: String,
    rev: i64,
    kinds: HashMap<Value, GraphKind>,
    graph_vals: EntityCache<Value>,
    node_vals: EntityCache<NodePath>,
    edge_vals: EntityCache<EdgePath>,
    nodes: EntityCache<Value>,
    edges: EdgesCache,
}

impl Engine {
    /// Initializes the schema, loads branch genealogy, graph headers
    /// and the cursor, and (when caching) warms the caches from the
    /// dump queries.
    pub fn open(mut store: SqlStore, caching: bool) -> CResult<Self> {
        store.init_schema()?;

        let mut branches = BranchIndex::new();
        let mut rows = store.all_branches()?;
        rows.retain(|(b, _, _)| b != MASTER);
        // Parents may come after children in table order; keep passing
        // over the remainder until the forest closes.
        while !rows.is_empty() {
            let before = rows.len();
            let mut rest = Vec::new();
            for (b, p, r) in rows {
                if branches.contains(&p) {
                    branches.register(&b, &p, r)?;
                } else {
                    rest.push((b, p, r));
                }
            }
            rows = rest;
            if rows.len() == before {
                return Err(Error::Branch("branches table is not a forest".to_string()));
            }
        }

        let branch = match store.global_get(&Value::from("branch"))? {
            Some(Value::Str(b)) => b,
            _ => return Err(Error::Persistence("global 'branch' missing".to_string())),
        };
        let rev = match store.global_get(&Value::from("rev"))? {
            Some(Value::Int(r)) => r,
            _ => return Err(Error::Persistence("global 'rev' missing".to_string())),
        };

        let mut kinds = HashMap::new();
        for (graph, kind) in store.graphs_types()? {
            kinds.insert(graph, kind.parse::<GraphKind>()?);
        }

        let mut engine = Self {
            store,
            branches,
            caching,
            branch,
            rev,
            kinds,
            graph_vals: EntityCache::new(),
            node_vals: EntityCache::new(),
            edge_vals: EntityCache::new(),
            nodes: EntityCache::new(),
            edges: EdgesCache::new(),
        };
        if caching {
            engine.warm_caches()?;
        }
        Ok(engine)
    }

    /// Bulk-load every branched table into the caches.
    ///
    /// Rows replay through the caches' `store` in global revision
    /// order, parents before children, so the derived extant indexes
    /// come out exactly as if the history had been written live. Edge
    /// existence keeps no derived index and loads unordered.
    fn warm_caches(&mut self) -> CResult<()> {
        enum Row {
            GraphVal(Value, Value, Option<Value>),
            Node(Value, Value, bool),
            NodeVal(Value, Value, Value, Option<Value>),
            EdgeVal(Value, Value, Value, i64, Value, Option<Value>),
        }

        let mut rows: Vec<(i64, usize, String, Row)> = Vec::new();
        for (graph, key, branch, rev, value) in self.store.graph_val_dump()? {
            let depth = self.branches.depth(&branch);
            rows.push((rev, depth, branch, Row::GraphVal(graph, key, value)));
        }
        for (graph, node, branch, rev, extant) in self.store.nodes_dump()? {
            let depth = self.branches.depth(&branch);
            rows.push((rev, depth, branch, Row::Node(graph, node, extant)));
        }
        for (graph, node, key, branch, rev, value) in self.store.node_val_dump()? {
            let depth = self.branches.depth(&branch);
            rows.push((rev, depth, branch, Row::NodeVal(graph, node, key, value)));
        }
        for (graph, a, b, idx, key, branch, rev, value) in self.store.edge_val_dump()? {
            let depth = self.branches.depth(&branch);
            rows.push((rev, depth, branch, Row::EdgeVal(graph, a, b, idx, key, value)));
        }
        rows.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
        log::debug!("warming caches from {} rows", rows.len());

        for (rev, _, branch, row) in rows {
            match row {
                Row::GraphVal(graph, key, value) => {
                    self.graph_vals.store(graph, key, &branch, rev, value, &self.branches)
                }
                Row::Node(graph, node, extant) => self.nodes.store(
                    graph,
                    node,
                    &branch,
                    rev,
                    existence(extant),
                    &self.branches,
                ),
                Row::NodeVal(graph, node, key, value) => self.node_vals.store(
                    (graph, node),
                    key,
                    &branch,
                    rev,
                    value,
                    &self.branches,
                ),
                Row::EdgeVal(graph, a, b, idx, key, value) => self.edge_vals.store(
                    (graph, a, b, idx),
                    key,
                    &branch,
                    rev,
                    value,
                    &self.branches,
                ),
            }
        }

        for (graph, a, b, idx, branch, rev, extant) in self.store.edges_dump()? {
            self.edges.store(graph, a, b, idx, &branch, rev, extant);
        }
        Ok(())
    }

    // cursor

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn rev(&self) -> i64 {
        self.rev
    }

    /// Move the cursor within the current branch. The revision may not
    /// go below the branch's fork point (or 0 on master).
    pub fn set_rev(&mut self, rev: i64) -> CResult<()> {
        if rev < 0 {
            return Err(Error::Value(format!("negative revision {}", rev)));
        }
        if self.branch != MASTER {
            let (_, parent_rev) = self
                .branches
                .parent_of(&self.branch)
                .ok_or_else(|| Error::Branch(format!("unknown branch {}", self.branch)))?;
            if rev < parent_rev {
                return Err(Error::Value(format!(
                    "revision {} is before the start of branch {} (forked at {})",
                    rev, self.branch, parent_rev
                )));
            }
        }
        self.store
            .global_set(&Value::from("rev"), &Value::Int(rev))?;
        self.rev = rev;
        Ok(())
    }

    /// Move the cursor to another branch. Switching to an unknown name
    /// creates it as a child of the current branch at the current
    /// revision; switching to a known branch requires the current
    /// revision to be within its extent.
    pub fn set_branch(&mut self, branch: &str) -> CResult<()> {
        if branch == self.branch {
            return Ok(());
        }
        if self.branches.contains(branch) {
            let (_, parent_rev) = self.branches.parent_of(branch).unwrap();
            if self.rev < parent_rev {
                return Err(Error::Value(format!(
                    "revision {} is before the start of branch {} (forked at {})",
                    self.rev, branch, parent_rev
                )));
            }
        } else {
            let (parent, parent_rev) = (self.branch.clone(), self.rev);
            self.branches.register(branch, &parent, parent_rev)?;
            self.store.new_branch(branch, &parent, parent_rev)?;
        }
        self.store
            .global_set(&Value::from("branch"), &Value::from(branch))?;
        self.branch = branch.to_string();
        Ok(())
    }

    /// The ancestry of the cursor, from here back to master.
    pub fn active_branches(&self) -> Vec<(String, i64)> {
        self.branches.ancestry(&self.branch, self.rev).collect()
    }

    pub fn is_parent_of(&self, parent: &str, child: &str) -> bool {
        self.branches.is_parent_of(parent, child)
    }

    // graph management

    pub fn new_graph(&mut self, name: &Value, kind: GraphKind) -> CResult<()> {
        if self.kinds.contains_key(name) {
            return Err(Error::Value(format!("graph {} already exists", name)));
        }
        self.store.new_graph(name, kind.as_str())?;
        self.kinds.insert(name.clone(), kind);
        Ok(())
    }

    pub fn graph_kind(&mut self, name: &Value) -> CResult<GraphKind> {
        match self.kinds.get(name) {
            Some(kind) => Ok(*kind),
            None => Err(Error::NotFound(format!("no graph {}", name))),
        }
    }

    /// Drop the graph's header and all its rows, and purge everything
    /// cached for it so a later graph under the same name starts clean.
    pub fn del_graph(&mut self, name: &Value) -> CResult<()> {
        if self.kinds.remove(name).is_none() {
            return Err(Error::NotFound(format!("no graph {}", name)));
        }
        self.store.del_graph(name)?;
        self.graph_vals.purge_where(|g| g == name);
        self.nodes.purge_where(|g| g == name);
        self.node_vals.purge_where(|(g, _)| g == name);
        self.edge_vals.purge_where(|(g, _, _, _)| g == name);
        self.edges.purge_graph(name);
        Ok(())
    }

    pub fn graphs(&self) -> Vec<(Value, GraphKind)> {
        let mut out: Vec<_> = self.kinds.iter().map(|(g, k)| (g.clone(), *k)).collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    // globals

    pub fn global_get(&mut self, key: &Value) -> CResult<Value> {
        self.store
            .global_get(key)?
            .ok_or_else(|| Error::NotFound(format!("global {} not set", key)))
    }

    pub fn global_set(&mut self, key: &Value, value: &Value) -> CResult<()> {
        self.store.global_set(key, value)
    }

    pub fn global_del(&mut self, key: &Value) -> CResult<()> {
        self.store.global_del(key)
    }

    pub fn global_items(&mut self) -> CResult<Vec<(Value, Value)>> {
        self.store.global_items()
    }

    // graph attributes

    pub fn graph_val_set(&mut self, graph: &Value, key: &Value, value: &Value) -> CResult<()> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            self.graph_vals.store(
                graph.clone(),
                key.clone(),
                &branch,
                rev,
                Some(value.clone()),
                &self.branches,
            );
        }
        self.store.graph_val_set(graph, key, &branch, rev, Some(value))
    }

    pub fn graph_val_del(&mut self, graph: &Value, key: &Value) -> CResult<()> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            self.graph_vals
                .store(graph.clone(), key.clone(), &branch, rev, None, &self.branches);
        }
        self.store.graph_val_set(graph, key, &branch, rev, None)
    }

    pub fn graph_val_get(&mut self, graph: &Value, key: &Value) -> CResult<Value> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            match self.graph_vals.retrieve(graph, key, &branch, rev, &self.branches) {
                Cached::Hit(v) => return Ok(v),
                Cached::Deleted => return Err(deleted(key)),
                Cached::Miss => {}
            }
        }
        let walk = self.active_branches();
        for (b, r) in walk {
            match self.store.graph_val_get(graph, key, &b, r)? {
                Some(Some(v)) => {
                    if self.caching {
                        self.graph_vals.store(
                            graph.clone(),
                            key.clone(),
                            &branch,
                            rev,
                            Some(v.clone()),
                            &self.branches,
                        );
                    }
                    return Ok(v);
                }
                Some(None) => return Err(deleted(key)),
                None => continue,
            }
        }
        Err(never_set(key))
    }

    pub fn graph_val_keys(&mut self, graph: &Value) -> CResult<Vec<Value>> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            return Ok(self.graph_vals.iter_keys(graph, &branch, rev, &self.branches));
        }
        let walk = self.active_branches();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (b, r) in walk {
            for (key, value) in self.store.graph_val_items(graph, &b, r)? {
                if seen.insert(key.clone()) && value.is_some() {
                    out.push(key);
                }
            }
        }
        out.sort();
        Ok(out)
    }

    pub fn graph_val_contains(&mut self, graph: &Value, key: &Value) -> CResult<bool> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            return Ok(self.graph_vals.contains(graph, key, &branch, rev, &self.branches));
        }
        match self.graph_val_get(graph, key) {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn graph_val_count(&mut self, graph: &Value) -> CResult<usize> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            return Ok(self.graph_vals.count_keys(graph, &branch, rev, &self.branches));
        }
        Ok(self.graph_val_keys(graph)?.len())
    }

    // node existence

    pub fn exist_node(&mut self, graph: &Value, node: &Value, extant: bool) -> CResult<()> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            self.nodes.store(
                graph.clone(),
                node.clone(),
                &branch,
                rev,
                existence(extant),
                &self.branches,
            );
        }
        self.store.exist_node(graph, node, &branch, rev, extant)
    }

    pub fn node_exists(&mut self, graph: &Value, node: &Value) -> CResult<bool> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            match self.nodes.retrieve(graph, node, &branch, rev, &self.branches) {
                Cached::Hit(_) => return Ok(true),
                Cached::Deleted => return Ok(false),
                Cached::Miss => {}
            }
        }
        let walk = self.active_branches();
        for (b, r) in walk {
            if let Some(extant) = self.store.node_exists(graph, node, &b, r)? {
                if self.caching {
                    self.nodes.store(
                        graph.clone(),
                        node.clone(),
                        &branch,
                        rev,
                        existence(extant),
                        &self.branches,
                    );
                }
                return Ok(extant);
            }
        }
        Ok(false)
    }

    pub fn nodes_extant(&mut self, graph: &Value) -> CResult<Vec<Value>> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            return Ok(self.nodes.iter_keys(graph, &branch, rev, &self.branches));
        }
        let walk = self.active_branches();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (b, r) in walk {
            for (node, extant) in self.store.nodes_extant(graph, &b, r)? {
                if seen.insert(node.clone()) && extant {
                    out.push(node);
                }
            }
        }
        out.sort();
        Ok(out)
    }

    pub fn nodes_count(&mut self, graph: &Value) -> CResult<usize> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            return Ok(self.nodes.count_keys(graph, &branch, rev, &self.branches));
        }
        Ok(self.nodes_extant(graph)?.len())
    }

    // node attributes

    pub fn node_val_set(
        &mut self,
        graph: &Value,
        node: &Value,
        key: &Value,
        value: &Value,
    ) -> CResult<()> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            self.node_vals.store(
                (graph.clone(), node.clone()),
                key.clone(),
                &branch,
                rev,
                Some(value.clone()),
                &self.branches,
            );
        }
        self.store.node_val_set(graph, node, key, &branch, rev, Some(value))
    }

    pub fn node_val_del(&mut self, graph: &Value, node: &Value, key: &Value) -> CResult<()> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            self.node_vals.store(
                (graph.clone(), node.clone()),
                key.clone(),
                &branch,
                rev,
                None,
                &self.branches,
            );
        }
        self.store.node_val_set(graph, node, key, &branch, rev, None)
    }

    pub fn node_val_get(&mut self, graph: &Value, node: &Value, key: &Value) -> CResult<Value> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        let path = (graph.clone(), node.clone());
        if self.caching {
            match self.node_vals.retrieve(&path, key, &branch, rev, &self.branches) {
                Cached::Hit(v) => return Ok(v),
                Cached::Deleted => return Err(deleted(key)),
                Cached::Miss => {}
            }
        }
        let walk = self.active_branches();
        for (b, r) in walk {
            match self.store.node_val_get(graph, node, key, &b, r)? {
                Some(Some(v)) => {
                    if self.caching {
                        self.node_vals.store(
                            path,
                            key.clone(),
                            &branch,
                            rev,
                            Some(v.clone()),
                            &self.branches,
                        );
                    }
                    return Ok(v);
                }
                Some(None) => return Err(deleted(key)),
                None => continue,
            }
        }
        Err(never_set(key))
    }

    pub fn node_val_keys(&mut self, graph: &Value, node: &Value) -> CResult<Vec<Value>> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        let path = (graph.clone(), node.clone());
        if self.caching {
            return Ok(self.node_vals.iter_keys(&path, &branch, rev, &self.branches));
        }
        let walk = self.active_branches();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (b, r) in walk {
            for (key, value) in self.store.node_val_items(graph, node, &b, r)? {
                if seen.insert(key.clone()) && value.is_some() {
                    out.push(key);
                }
            }
        }
        out.sort();
        Ok(out)
    }

    pub fn node_val_contains(&mut self, graph: &Value, node: &Value, key: &Value) -> CResult<bool> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            let path = (graph.clone(), node.clone());
            return Ok(self.node_vals.contains(&path, key, &branch, rev, &self.branches));
        }
        match self.node_val_get(graph, node, key) {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    // edge existence

    pub fn exist_edge(
        &mut self,
        graph: &Value,
        a: &Value,
        b: &Value,
        idx: i64,
        extant: bool,
    ) -> CResult<()> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            self.edges
                .store(graph.clone(), a.clone(), b.clone(), idx, &branch, rev, extant);
        }
        self.store.exist_edge(graph, a, b, idx, &branch, rev, extant)
    }

    pub fn edge_exists(&mut self, graph: &Value, a: &Value, b: &Value, idx: i64) -> CResult<bool> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            match self.edges.retrieve(graph, a, b, idx, &branch, rev, &self.branches) {
                Cached::Hit(_) => return Ok(true),
                Cached::Deleted => return Ok(false),
                Cached::Miss => {}
            }
        }
        let walk = self.active_branches();
        for (br, r) in walk {
            if let Some(extant) = self.store.edge_exists(graph, a, b, idx, &br, r)? {
                if self.caching {
                    self.edges
                        .store(graph.clone(), a.clone(), b.clone(), idx, &branch, rev, extant);
                }
                return Ok(extant);
            }
        }
        Ok(false)
    }

    /// Destinations reachable from `a`, as stored; orientation handling
    /// for undirected graphs lives in the façade.
    pub fn successors(&mut self, graph: &Value, a: &Value) -> CResult<Vec<Value>> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            return Ok(self.edges.successors_of(graph, a, &branch, rev, &self.branches));
        }
        // The first branch with a record for a given (node, idx) pair
        // decides that edge; the node is adjacent if any pair decided
        // extant.
        let walk = self.active_branches();
        let mut decided = HashSet::new();
        let mut out = Vec::new();
        for (b, r) in walk {
            for (dest, idx, extant) in self.store.node_bs(graph, a, &b, r)? {
                if decided.insert((dest.clone(), idx)) && extant {
                    out.push(dest);
                }
            }
        }
        out.sort();
        out.dedup();
        Ok(out)
    }

    /// Origins with an edge into `b`, as stored.
    pub fn predecessors(&mut self, graph: &Value, b: &Value) -> CResult<Vec<Value>> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            return Ok(self.edges.predecessors_of(graph, b, &branch, rev, &self.branches));
        }
        let walk = self.active_branches();
        let mut decided = HashSet::new();
        let mut out = Vec::new();
        for (br, r) in walk {
            for (orig, idx, extant) in self.store.node_as(graph, b, &br, r)? {
                if decided.insert((orig.clone(), idx)) && extant {
                    out.push(orig);
                }
            }
        }
        out.sort();
        out.dedup();
        Ok(out)
    }

    /// Nodes with at least one outgoing edge, as stored.
    pub fn edge_origins(&mut self, graph: &Value) -> CResult<Vec<Value>> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            return Ok(self.edges.origins_of(graph, &branch, rev, &self.branches));
        }
        let walk = self.active_branches();
        let mut decided = HashSet::new();
        let mut out = Vec::new();
        for (br, r) in walk {
            for (a, b, idx, extant) in self.store.edges_extant(graph, &br, r)? {
                if decided.insert((a.clone(), b, idx)) && extant {
                    out.push(a);
                }
            }
        }
        out.sort();
        out.dedup();
        Ok(out)
    }

    /// Extant parallel-edge indices between `a` and `b`, ascending.
    pub fn edge_indices(&mut self, graph: &Value, a: &Value, b: &Value) -> CResult<Vec<i64>> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            return Ok(self.edges.edge_indices(graph, a, b, &branch, rev, &self.branches));
        }
        let walk = self.active_branches();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (br, r) in walk {
            for (idx, extant) in self.store.multi_edges(graph, a, b, &br, r)? {
                if seen.insert(idx) && extant {
                    out.push(idx);
                }
            }
        }
        out.sort_unstable();
        Ok(out)
    }

    // edge attributes

    #[allow(clippy::too_many_arguments)]
    pub fn edge_val_set(
        &mut self,
        graph: &Value,
        a: &Value,
        b: &Value,
        idx: i64,
        key: &Value,
        value: &Value,
    ) -> CResult<()> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            self.edge_vals.store(
                (graph.clone(), a.clone(), b.clone(), idx),
                key.clone(),
                &branch,
                rev,
                Some(value.clone()),
                &self.branches,
            );
        }
        self.store
            .edge_val_set(graph, a, b, idx, key, &branch, rev, Some(value))
    }

    pub fn edge_val_del(
        &mut self,
        graph: &Value,
        a: &Value,
        b: &Value,
        idx: i64,
        key: &Value,
    ) -> CResult<()> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            self.edge_vals.store(
                (graph.clone(), a.clone(), b.clone(), idx),
                key.clone(),
                &branch,
                rev,
                None,
                &self.branches,
            );
        }
        self.store.edge_val_set(graph, a, b, idx, key, &branch, rev, None)
    }

    pub fn edge_val_get(
        &mut self,
        graph: &Value,
        a: &Value,
        b: &Value,
        idx: i64,
        key: &Value,
    ) -> CResult<Value> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        let path = (graph.clone(), a.clone(), b.clone(), idx);
        if self.caching {
            match self.edge_vals.retrieve(&path, key, &branch, rev, &self.branches) {
                Cached::Hit(v) => return Ok(v),
                Cached::Deleted => return Err(deleted(key)),
                Cached::Miss => {}
            }
        }
        let walk = self.active_branches();
        for (br, r) in walk {
            match self.store.edge_val_get(graph, a, b, idx, key, &br, r)? {
                Some(Some(v)) => {
                    if self.caching {
                        self.edge_vals.store(
                            path,
                            key.clone(),
                            &branch,
                            rev,
                            Some(v.clone()),
                            &self.branches,
                        );
                    }
                    return Ok(v);
                }
                Some(None) => return Err(deleted(key)),
                None => continue,
            }
        }
        Err(never_set(key))
    }

    pub fn edge_val_keys(
        &mut self,
        graph: &Value,
        a: &Value,
        b: &Value,
        idx: i64,
    ) -> CResult<Vec<Value>> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        let path = (graph.clone(), a.clone(), b.clone(), idx);
        if self.caching {
            return Ok(self.edge_vals.iter_keys(&path, &branch, rev, &self.branches));
        }
        let walk = self.active_branches();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (br, r) in walk {
            for (key, value) in self.store.edge_val_items(graph, a, b, idx, &br, r)? {
                if seen.insert(key.clone()) && value.is_some() {
                    out.push(key);
                }
            }
        }
        out.sort();
        Ok(out)
    }

    pub fn edge_val_contains(
        &mut self,
        graph: &Value,
        a: &Value,
        b: &Value,
        idx: i64,
        key: &Value,
    ) -> CResult<bool> {
        let (branch, rev) = (self.branch.clone(), self.rev);
        if self.caching {
            let path = (graph.clone(), a.clone(), b.clone(), idx);
            return Ok(self.edge_vals.contains(&path, key, &branch, rev, &self.branches));
        }
        match self.edge_val_get(graph, a, b, idx, key) {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    // lifecycle

    pub fn status(&mut self) -> CResult<Status> {
        self.store.status()
    }

    pub fn commit(&mut self) -> CResult<()> {
        self.store.commit()
    }

    pub fn close(&mut self) -> CResult<()> {
        self.store.close()
    }
}

/// Existence as a history record: present is a marker value, absent is
/// the tombstone, so removed entities drop out of the extant index the
/// same way deleted keys do.
fn existence(extant: bool) -> Option<Value> {
    if extant {
        Some(Value::Bool(true))
    } else {
        None
    }
}

fn deleted(key: &Value) -> Error {
    Error::NotFound(format!("key {} set, then deleted", key))
}

fn never_set(key: &Value) -> Error {
    Error::NotFound(format!("key {} never set", key))
}
