use pretty_assertions::assert_eq;

use crate::codec::Value;
use crate::engine::{GraphStore, Options};
use crate::error::Error;
use crate::graph::GraphKind;

fn v(s: &str) -> Value {
    Value::from(s)
}

fn i(n: i64) -> Value {
    Value::Int(n)
}

/// Run a scenario once with caching and once without.
fn both_modes(test: impl Fn(GraphStore)) {
    for caching in [true, false] {
        let store = GraphStore::open_in_memory_with(Options { caching }).unwrap();
        test(store);
    }
}

#[test]
fn triangle_across_branches() {
    both_modes(|store| {
        let g = store.new_graph("test", GraphKind::Graph).unwrap();

        // (master, 0): two nodes and one edge.
        g.add_node(0i64).unwrap();
        assert!(g.has_node(0i64).unwrap());
        g.add_node(1i64).unwrap();
        assert!(g.has_node(1i64).unwrap());
        g.add_edge(0i64, 1i64).unwrap();
        assert!(g.successors(0i64).unwrap().contains(&i(1)));
        assert!(g.successors(1i64).unwrap().contains(&i(0)));

        store.set_rev(1).unwrap();
        assert!(g.has_node(0i64).unwrap());
        assert!(g.has_node(1i64).unwrap());

        // Fork no_edge at (master, 1) and take the edge away there.
        store.set_branch("no_edge").unwrap();
        assert!(g.has_edge(0i64, 1i64).unwrap());
        g.remove_edge(0i64, 1i64).unwrap();
        assert!(g.has_node(0i64).unwrap());
        assert!(g.has_node(1i64).unwrap());
        assert!(!g.has_edge(0i64, 1i64).unwrap());
        assert!(!g.successors(0i64).unwrap().contains(&i(1)));

        // Fork triangle off no_edge and build the full cycle.
        store.set_branch("triangle").unwrap();
        g.add_node(2i64).unwrap();
        assert!(g.has_node(2i64).unwrap());
        g.add_edge(0i64, 1i64).unwrap();
        g.add_edge(1i64, 2i64).unwrap();
        g.add_edge(2i64, 0i64).unwrap();
        for (a, b) in [(0i64, 1i64), (1, 2), (2, 0)] {
            assert!(g.has_edge(a, b).unwrap(), "edge {} -> {}", a, b);
            assert!(g.has_edge(b, a).unwrap(), "edge {} -> {}", b, a);
        }

        // Lineage: triangle descends from no_edge descends from master.
        assert!(store.is_parent_of("master", "no_edge").unwrap());
        assert!(store.is_parent_of("master", "triangle").unwrap());
        assert!(store.is_parent_of("no_edge", "triangle").unwrap());
        assert!(!store.is_parent_of("triangle", "no_edge").unwrap());

        // Back at (master, 0): the edge is there, node 2 is not.
        store.set_branch("master").unwrap();
        store.set_rev(0).unwrap();
        assert!(g.has_edge(0i64, 1i64).unwrap());
        assert!(!g.has_node(2i64).unwrap());
        assert_eq!(g.nodes().unwrap(), vec![i(0), i(1)]);

        // And in no_edge at rev 1, the edge is still gone.
        store.set_rev(1).unwrap();
        store.set_branch("no_edge").unwrap();
        assert!(!g.has_edge(0i64, 1i64).unwrap());
        assert!(matches!(g.edge(0i64, 1i64), Err(Error::NotFound(_))));
    });
}

#[test]
fn undirected_edges_are_symmetric() {
    both_modes(|store| {
        let g = store.new_graph("ug", GraphKind::Graph).unwrap();
        g.add_edge("b", "a").unwrap();

        // Both orientations answer, whichever way the edge was added.
        assert!(g.has_edge("a", "b").unwrap());
        assert!(g.has_edge("b", "a").unwrap());
        assert_eq!(g.successors("a").unwrap(), vec![v("b")]);
        assert_eq!(g.successors("b").unwrap(), vec![v("a")]);
        assert_eq!(g.predecessors("a").unwrap(), vec![v("b")]);

        // Attributes live on the one stored edge.
        g.edge("a", "b").unwrap().set("w", 1i64).unwrap();
        assert_eq!(g.edge("b", "a").unwrap().get("w").unwrap(), i(1));

        g.remove_edge("a", "b").unwrap();
        assert!(!g.has_edge("b", "a").unwrap());
    });
}

#[test]
fn directed_edges_are_not() {
    both_modes(|store| {
        let g = store.new_graph("dg", GraphKind::DiGraph).unwrap();
        g.add_edge("a", "b").unwrap();

        assert!(g.has_edge("a", "b").unwrap());
        assert!(!g.has_edge("b", "a").unwrap());
        assert_eq!(g.successors("a").unwrap(), vec![v("b")]);
        assert_eq!(g.successors("b").unwrap(), vec![]);
        assert_eq!(g.predecessors("b").unwrap(), vec![v("a")]);
        assert_eq!(g.predecessors("a").unwrap(), vec![]);
    });
}

#[test]
fn add_edge_creates_missing_endpoints() {
    both_modes(|store| {
        let g = store.new_graph("g", GraphKind::DiGraph).unwrap();
        g.add_edge("u", "w").unwrap();
        assert!(g.has_node("u").unwrap());
        assert!(g.has_node("w").unwrap());

        // Setting an attribute through a view creates the path too.
        let e = g.add_edge("x", "y").unwrap();
        e.set("k", "v").unwrap();
        assert!(g.has_node("x").unwrap());
        assert_eq!(g.edge("x", "y").unwrap().get("k").unwrap(), v("v"));
    });
}

#[test]
fn multi_edge_independence() {
    both_modes(|store| {
        let g = store.new_graph("m", GraphKind::MultiDiGraph).unwrap();

        // (rev 0) two parallel edges with distinct attributes.
        let e0 = g.add_edge_at("a", "b", 0).unwrap();
        e0.set("k", "x").unwrap();
        let e1 = g.add_edge_at("a", "b", 1).unwrap();
        e1.set("k", "y").unwrap();

        assert_eq!(g.edge_indices("a", "b").unwrap(), vec![0, 1]);
        assert_eq!(g.edge_at("a", "b", 0).unwrap().get("k").unwrap(), v("x"));
        assert_eq!(g.edge_at("a", "b", 1).unwrap().get("k").unwrap(), v("y"));

        // (rev 1) removing index 0 leaves index 1 untouched.
        store.set_rev(1).unwrap();
        g.remove_edge_at("a", "b", 0).unwrap();
        assert!(!g.has_edge_at("a", "b", 0).unwrap());
        assert!(g.has_edge_at("a", "b", 1).unwrap());
        assert_eq!(g.edge_indices("a", "b").unwrap(), vec![1]);
        assert_eq!(g.edge_at("a", "b", 1).unwrap().get("k").unwrap(), v("y"));
        assert!(matches!(g.edge_at("a", "b", 0), Err(Error::NotFound(_))));
        // The node pair is still adjacent through the surviving edge.
        assert!(g.has_edge("a", "b").unwrap());

        // (rev 0) both still present in the past.
        store.set_rev(0).unwrap();
        assert_eq!(g.edge_indices("a", "b").unwrap(), vec![0, 1]);
        assert_eq!(g.edge_at("a", "b", 0).unwrap().get("k").unwrap(), v("x"));
    });
}

#[test]
fn add_edge_allocates_free_parallel_index() {
    both_modes(|store| {
        let g = store.new_graph("m", GraphKind::MultiGraph).unwrap();
        assert_eq!(g.add_edge("a", "b").unwrap().idx(), 0);
        assert_eq!(g.add_edge("a", "b").unwrap().idx(), 1);
        assert_eq!(g.add_edge("a", "b").unwrap().idx(), 2);

        // A freed middle index is skipped: allocation starts at the
        // extant count and bumps past collisions.
        store.set_rev(1).unwrap();
        g.remove_edge_at("a", "b", 1).unwrap();
        assert_eq!(g.add_edge("a", "b").unwrap().idx(), 3);
    });
}

#[test]
fn parallel_edges_rejected_on_plain_kinds() {
    both_modes(|store| {
        let g = store.new_graph("g", GraphKind::Graph).unwrap();
        g.add_edge("a", "b").unwrap();
        assert!(matches!(g.add_edge_at("a", "b", 1), Err(Error::Value(_))));
        assert!(matches!(g.has_edge_at("a", "b", 2), Err(Error::Value(_))));
        // add_edge on a plain kind replaces rather than stacking.
        assert_eq!(g.add_edge("a", "b").unwrap().idx(), 0);
        assert_eq!(g.edge_indices("a", "b").unwrap(), vec![0]);
    });
}

#[test]
fn predecessor_view_tracks_removals() {
    both_modes(|store| {
        let g = store.new_graph("pred", GraphKind::DiGraph).unwrap();
        g.add_edge("a", "c").unwrap();
        g.add_edge("b", "c").unwrap();
        g.add_edge("d", "c").unwrap();

        assert_eq!(g.predecessors("c").unwrap(), vec![v("a"), v("b"), v("d")]);

        store.set_rev(1).unwrap();
        g.remove_edge("b", "c").unwrap();
        assert_eq!(g.predecessors("c").unwrap(), vec![v("a"), v("d")]);

        store.set_rev(0).unwrap();
        assert_eq!(g.predecessors("c").unwrap(), vec![v("a"), v("b"), v("d")]);
    });
}

#[test]
fn node_attributes() {
    both_modes(|store| {
        let g = store.new_graph("g", GraphKind::Graph).unwrap();
        let n = g.add_node("n").unwrap();
        n.set("color", "red").unwrap();
        n.set("size", 3i64).unwrap();

        assert_eq!(n.get("color").unwrap(), v("red"));
        assert_eq!(n.keys().unwrap(), vec![v("color"), v("size")]);
        assert!(n.contains_key("size").unwrap());
        assert_eq!(n.items().unwrap(), vec![(v("color"), v("red")), (v("size"), i(3))]);

        store.set_rev(1).unwrap();
        n.del("color").unwrap();
        assert!(matches!(n.get("color"), Err(Error::NotFound(_))));
        assert_eq!(n.keys().unwrap(), vec![v("size")]);

        store.set_rev(0).unwrap();
        assert_eq!(n.get("color").unwrap(), v("red"));
    });
}

#[test]
fn node_removal_guards() {
    both_modes(|store| {
        let g = store.new_graph("g", GraphKind::Graph).unwrap();
        g.add_node("n").unwrap();
        store.set_rev(1).unwrap();
        g.remove_node("n").unwrap();
        assert!(!g.has_node("n").unwrap());
        assert!(matches!(g.node("n"), Err(Error::NotFound(_))));
        assert!(matches!(g.remove_node("n"), Err(Error::NotFound(_))));

        // Still there in the past.
        store.set_rev(0).unwrap();
        assert!(g.has_node("n").unwrap());
        assert_eq!(g.node_count().unwrap(), 1);
    });
}

#[test]
fn update_skips_unchanged_values() {
    both_modes(|store| {
        let g = store.new_graph("g", GraphKind::Graph).unwrap();
        let n = g.add_node("n").unwrap();
        n.set("keep", 1i64).unwrap();
        n.update(vec![(v("keep"), i(1)), (v("new"), i(2))]).unwrap();
        assert_eq!(n.items().unwrap(), vec![(v("keep"), i(1)), (v("new"), i(2))]);
    });
}

#[test]
fn clear_tombstones_everything() {
    both_modes(|store| {
        let g = store.new_graph("g", GraphKind::DiGraph).unwrap();
        g.set("title", "before").unwrap();
        g.add_edge("a", "b").unwrap();
        g.add_edge("b", "c").unwrap();

        store.set_rev(1).unwrap();
        g.clear().unwrap();
        assert_eq!(g.nodes().unwrap(), vec![]);
        assert!(!g.has_edge("a", "b").unwrap());
        assert_eq!(g.keys().unwrap(), vec![]);

        // History survives underneath.
        store.set_rev(0).unwrap();
        assert_eq!(g.nodes().unwrap(), vec![v("a"), v("b"), v("c")]);
        assert!(g.has_edge("a", "b").unwrap());
        assert_eq!(g.get("title").unwrap(), v("before"));
    });
}

#[test]
fn storage_round_trip_vector() {
    // Scalars, very large integers, unicode, lists and maps, stored on
    // the graph, a node, and an edge of every graph kind.
    let test_keys: Vec<Value> = vec![
        i(0),
        i(1),
        i(10),
        i(10_000_000_000),
        Value::Int(i64::MAX),
        v("spam"),
        v("eggs"),
        v("ham"),
        v("💧"),
        v("🔑"),
        v("𐦖"),
        Value::List(vec![v("spam"), v("eggs"), v("ham")]),
    ];
    let test_values: Vec<Value> = {
        let mut vs = test_keys.clone();
        vs.push(Value::map(vec![
            (v("foo"), v("bar")),
            (i(0), i(1)),
            (v("💧"), v("🔑")),
        ]));
        vs.push(Value::List(vec![
            Value::List(vec![v("spam"), i(1)]),
            Value::map(vec![(v("eggs"), Value::Float(0.5))]),
        ]));
        vs
    };

    for kind in [
        GraphKind::Graph,
        GraphKind::DiGraph,
        GraphKind::MultiGraph,
        GraphKind::MultiDiGraph,
    ] {
        both_modes(|store| {
            let g = store.new_graph("testgraph", kind).unwrap();
            g.add_node(0i64).unwrap();
            g.add_node(1i64).unwrap();
            g.add_edge(0i64, 1i64).unwrap();
            let n = g.node(0i64).unwrap();
            let e = g.edge(0i64, 1i64).unwrap();

            for key in &test_keys {
                for value in &test_values {
                    g.set(key.clone(), value.clone()).unwrap();
                    assert!(g.contains_key(key.clone()).unwrap());
                    assert_eq!(g.get(key.clone()).unwrap(), *value);
                    g.del(key.clone()).unwrap();
                    assert!(!g.contains_key(key.clone()).unwrap());

                    n.set(key.clone(), value.clone()).unwrap();
                    assert!(n.contains_key(key.clone()).unwrap());
                    assert_eq!(n.get(key.clone()).unwrap(), *value);
                    n.del(key.clone()).unwrap();
                    assert!(!n.contains_key(key.clone()).unwrap());

                    e.set(key.clone(), value.clone()).unwrap();
                    assert!(e.contains_key(key.clone()).unwrap());
                    assert_eq!(e.get(key.clone()).unwrap(), *value);
                    e.del(key.clone()).unwrap();
                    assert!(!e.contains_key(key.clone()).unwrap());
                }
            }
            store.del_graph("testgraph").unwrap();
        });
    }
}

#[test]
fn graph_attr_count() {
    both_modes(|store| {
        let g = store.new_graph("g", GraphKind::Graph).unwrap();
        g.set("a", 1i64).unwrap();
        g.set("b", 2i64).unwrap();
        assert_eq!(g.attr_count().unwrap(), 2);
        store.set_rev(1).unwrap();
        g.del("a").unwrap();
        assert_eq!(g.attr_count().unwrap(), 1);
    });
}
