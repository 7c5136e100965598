use pretty_assertions::assert_eq;

use crate::codec::Value;
use crate::engine::{GraphStore, Options};
use crate::error::Error;
use crate::graph::GraphKind;

fn v(s: &str) -> Value {
    Value::from(s)
}

/// Run a scenario once with caching and once without.
fn both_modes(test: impl Fn(GraphStore)) {
    for caching in [true, false] {
        let store = GraphStore::open_in_memory_with(Options { caching }).unwrap();
        test(store);
    }
}

#[test]
fn cursor_starts_at_master_zero() {
    both_modes(|store| {
        assert_eq!(store.branch().unwrap(), "master");
        assert_eq!(store.rev().unwrap(), 0);
        assert_eq!(store.active_branches().unwrap(), vec![("master".to_string(), 0)]);
    });
}

#[test]
fn cursor_round_trips_through_globals() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cursor.db");
    {
        let store = GraphStore::open(&path).unwrap();
        store.set_rev(4).unwrap();
        store.set_branch("side").unwrap();
        store.close().unwrap();
    }
    let store = GraphStore::open(&path).unwrap();
    assert_eq!(store.branch().unwrap(), "side");
    assert_eq!(store.rev().unwrap(), 4);
    assert_eq!(
        store.active_branches().unwrap(),
        vec![("side".to_string(), 4), ("master".to_string(), 4)]
    );
}

#[test]
fn assigning_unknown_branch_creates_it() {
    both_modes(|store| {
        store.set_rev(2).unwrap();
        store.set_branch("b1").unwrap();
        assert_eq!(store.branch().unwrap(), "b1");
        assert!(store.is_parent_of("master", "b1").unwrap());

        store.set_branch("b2").unwrap();
        assert!(store.is_parent_of("b1", "b2").unwrap());
        assert!(store.is_parent_of("master", "b2").unwrap());
        assert!(!store.is_parent_of("b2", "b1").unwrap());
    });
}

#[test]
fn parent_rev_guard() {
    both_modes(|store| {
        // Fork b1 at (master, 5).
        store.set_rev(5).unwrap();
        store.set_branch("b1").unwrap();
        store.set_branch("master").unwrap();

        // From (master, 3) the branch may not be entered.
        store.set_rev(3).unwrap();
        match store.set_branch("b1") {
            Err(Error::Value(_)) => {}
            other => panic!("expected Value error, got {:?}", other),
        }

        // Nor may the cursor back out of a branch's extent.
        store.set_rev(5).unwrap();
        store.set_branch("b1").unwrap();
        match store.set_rev(4) {
            Err(Error::Value(_)) => {}
            other => panic!("expected Value error, got {:?}", other),
        }
        assert_eq!(store.rev().unwrap(), 5);
    });
}

#[test]
fn tombstone_resurrection() {
    both_modes(|store| {
        let g = store.new_graph("g", GraphKind::Graph).unwrap();
        g.set("x", 1i64).unwrap();
        store.set_rev(1).unwrap();
        g.del("x").unwrap();
        store.set_rev(2).unwrap();
        g.set("x", 2i64).unwrap();

        store.set_rev(0).unwrap();
        assert_eq!(g.get("x").unwrap(), Value::Int(1));
        store.set_rev(1).unwrap();
        match g.get("x") {
            Err(Error::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert!(!g.contains_key("x").unwrap());
        assert_eq!(g.keys().unwrap(), vec![]);
        store.set_rev(2).unwrap();
        assert_eq!(g.get("x").unwrap(), Value::Int(2));
        assert_eq!(g.keys().unwrap(), vec![v("x")]);
    });
}

#[test]
fn monotone_revisions_within_branch() {
    both_modes(|store| {
        let g = store.new_graph("g", GraphKind::Graph).unwrap();
        store.set_rev(1).unwrap();
        g.set("x", "lo").unwrap();
        store.set_rev(5).unwrap();
        g.set("x", "hi").unwrap();

        for (rev, want) in [(1, "lo"), (2, "lo"), (4, "lo"), (5, "hi"), (9, "hi")] {
            store.set_rev(rev).unwrap();
            assert_eq!(g.get("x").unwrap(), v(want), "at rev {}", rev);
        }
        store.set_rev(0).unwrap();
        assert!(g.get("x").is_err());
    });
}

#[test]
fn child_branch_inherits_until_shadowed() {
    both_modes(|store| {
        let g = store.new_graph("g", GraphKind::Graph).unwrap();
        g.set("x", "parental").unwrap();
        store.set_rev(1).unwrap();
        store.set_branch("child").unwrap();

        // Inherited from master through the ancestry walk.
        assert_eq!(g.get("x").unwrap(), v("parental"));
        assert_eq!(g.keys().unwrap(), vec![v("x")]);

        // A write in the child shadows it from then on.
        store.set_rev(2).unwrap();
        g.set("x", "mine").unwrap();
        assert_eq!(g.get("x").unwrap(), v("mine"));
        store.set_rev(1).unwrap();
        assert_eq!(g.get("x").unwrap(), v("parental"));

        // Master never sees the child's value.
        store.set_branch("master").unwrap();
        store.set_rev(9).unwrap();
        assert_eq!(g.get("x").unwrap(), v("parental"));
    });
}

#[test]
fn retroactive_master_write_reaches_enumerations_in_child() {
    both_modes(|store| {
        let g = store.new_graph("g", GraphKind::Graph).unwrap();
        store.set_rev(5).unwrap();
        g.set("a", 1i64).unwrap();

        // Fork at (master, 5) and enumerate there, which materializes
        // the child's view of the key set.
        store.set_branch("child").unwrap();
        assert_eq!(g.keys().unwrap(), vec![v("a")]);

        // Rewind master behind the fork point and write a new key.
        store.set_branch("master").unwrap();
        store.set_rev(3).unwrap();
        g.set("c", 2i64).unwrap();

        // The child inherits the retroactive write: point reads,
        // enumeration, membership and counting all see it.
        store.set_rev(5).unwrap();
        store.set_branch("child").unwrap();
        assert_eq!(g.keys().unwrap(), vec![v("a"), v("c")]);
        assert_eq!(g.get("c").unwrap(), Value::Int(2));
        assert!(g.contains_key("c").unwrap());
        assert_eq!(g.attr_count().unwrap(), 2);

        // Deleting it in the child shadows the inherited value without
        // touching master.
        store.set_rev(6).unwrap();
        g.del("c").unwrap();
        assert_eq!(g.keys().unwrap(), vec![v("a")]);
        store.set_rev(5).unwrap();
        assert_eq!(g.keys().unwrap(), vec![v("a"), v("c")]);
        store.set_branch("master").unwrap();
        assert_eq!(g.keys().unwrap(), vec![v("a"), v("c")]);
    });
}

#[test]
fn writes_in_master_after_fork_are_invisible() {
    both_modes(|store| {
        let g = store.new_graph("g", GraphKind::Graph).unwrap();
        store.set_rev(1).unwrap();
        store.set_branch("child").unwrap();
        store.set_branch("master").unwrap();
        // Written in master after the fork point.
        store.set_rev(3).unwrap();
        g.set("late", true).unwrap();

        store.set_branch("child").unwrap();
        store.set_rev(3).unwrap();
        // The child forked at rev 1 and must not see a master write at 3.
        assert!(g.get("late").is_err());
        assert!(!g.contains_key("late").unwrap());
    });
}

#[test]
fn globals_are_not_branched() {
    both_modes(|store| {
        store.global_set("answer", 42i64).unwrap();
        store.set_rev(7).unwrap();
        store.set_branch("elsewhere").unwrap();
        assert_eq!(store.global_get("answer").unwrap(), Value::Int(42));

        let items = store.global_items().unwrap();
        // branch + rev + answer
        assert_eq!(items.len(), 3);
        store.global_del("answer").unwrap();
        assert!(store.global_get("answer").is_err());
    });
}

#[test]
fn graph_lifecycle() {
    both_modes(|store| {
        store.new_graph("a", GraphKind::DiGraph).unwrap();
        store.new_graph("b", GraphKind::MultiGraph).unwrap();
        assert!(matches!(
            store.new_graph("a", GraphKind::Graph),
            Err(Error::Value(_))
        ));

        assert_eq!(
            store.graphs().unwrap(),
            vec![(v("a"), GraphKind::DiGraph), (v("b"), GraphKind::MultiGraph)]
        );
        assert_eq!(store.graph("a").unwrap().kind(), GraphKind::DiGraph);

        store.del_graph("a").unwrap();
        assert!(store.graph("a").is_err());
        assert_eq!(store.graphs().unwrap().len(), 1);
    });
}

#[test]
fn deleted_graph_leaves_no_history_behind() {
    both_modes(|store| {
        let g = store.new_graph("g", GraphKind::Graph).unwrap();
        g.set("x", 1i64).unwrap();
        g.add_node("n").unwrap();
        store.del_graph("g").unwrap();

        // A new graph under the same name starts empty.
        let g = store.new_graph("g", GraphKind::Graph).unwrap();
        assert!(g.get("x").is_err());
        assert!(!g.has_node("n").unwrap());
        assert_eq!(g.nodes().unwrap(), vec![]);
    });
}

#[test]
fn status_counts() {
    both_modes(|store| {
        store.new_graph("a", GraphKind::Graph).unwrap();
        store.new_graph("b", GraphKind::DiGraph).unwrap();
        store.set_rev(1).unwrap();
        store.set_branch("side").unwrap();
        store.global_set("extra", 1i64).unwrap();

        let status = store.status().unwrap();
        assert_eq!(status.name, "sqlite");
        assert_eq!(status.graphs, 2);
        assert_eq!(status.branches, 2);
        // branch + rev + extra
        assert_eq!(status.globals, 3);
    });
}

#[test]
fn commit_then_reopen_without_caching_agrees() {
    // Build a branched history with the cache on, then read the same
    // database with the cache off and expect identical answers.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agree.db");
    {
        let store = GraphStore::open(&path).unwrap();
        let g = store.new_graph("g", GraphKind::DiGraph).unwrap();
        g.add_node(0i64).unwrap();
        g.add_node(1i64).unwrap();
        g.add_edge(0i64, 1i64).unwrap();
        g.edge(0i64, 1i64).unwrap().set("w", 5i64).unwrap();
        g.set("title", "base").unwrap();
        store.set_rev(1).unwrap();
        store.set_branch("alt").unwrap();
        g.remove_edge(0i64, 1i64).unwrap();
        g.set("title", "altered").unwrap();
        store.close().unwrap();
    }
    for caching in [true, false] {
        let store = GraphStore::open_with(&path, Options { caching }).unwrap();
        let g = store.graph("g").unwrap();

        assert_eq!(store.branch().unwrap(), "alt");
        assert!(!g.has_edge(0i64, 1i64).unwrap());
        assert_eq!(g.get("title").unwrap(), v("altered"));

        store.set_branch("master").unwrap();
        store.set_rev(0).unwrap();
        assert!(g.has_edge(0i64, 1i64).unwrap());
        assert_eq!(g.edge(0i64, 1i64).unwrap().get("w").unwrap(), Value::Int(5));
        assert_eq!(g.get("title").unwrap(), v("base"));
        assert_eq!(g.nodes().unwrap(), vec![Value::Int(0), Value::Int(1)]);
    }
}

#[test]
fn random_ops_against_model() {
    // Random attribute writes and deletes at random revisions on two
    // branches, checked against a naive in-memory model, then checked
    // again from a cold cacheless reopen.
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap;

    const NUM_OPS: usize = 400;
    const KEYS: [&str; 5] = ["a", "b", "c", "d", "e"];
    const FORK_REV: i64 = 10;

    let seed: u64 = rand::thread_rng().gen();
    let mut rng: rand::rngs::StdRng = SeedableRng::seed_from_u64(seed);
    println!("seed = {}", seed);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("random.db");

    // model[branch][key] = history of (rev, Option<value>)
    let mut model: BTreeMap<&str, BTreeMap<String, BTreeMap<i64, Option<i64>>>> = BTreeMap::new();
    model.insert("master", BTreeMap::new());
    model.insert("fork", BTreeMap::new());

    // The model's effective read, ancestry walk included.
    fn lookup(
        model: &BTreeMap<&str, BTreeMap<String, BTreeMap<i64, Option<i64>>>>,
        branch: &str,
        key: &str,
        rev: i64,
    ) -> Option<i64> {
        let mut at = (branch, rev);
        loop {
            if let Some(hist) = model[at.0].get(key) {
                if let Some((_, entry)) = hist.range(..=at.1).next_back() {
                    return *entry;
                }
            }
            if at.0 == "master" {
                return None;
            }
            at = ("master", at.1.min(FORK_REV));
        }
    }

    {
        let store = GraphStore::open(&path).unwrap();
        let g = store.new_graph("g", GraphKind::Graph).unwrap();
        store.set_rev(FORK_REV).unwrap();
        store.set_branch("fork").unwrap();
        store.set_branch("master").unwrap();

        for _ in 0..NUM_OPS {
            let branch = if rng.gen_bool(0.5) { "master" } else { "fork" };
            let min_rev = if branch == "fork" { FORK_REV } else { 0 };
            let rev = rng.gen_range(min_rev..min_rev + 20);
            let key = KEYS[rng.gen_range(0..KEYS.len())];
            // Enter the target branch first; entering "fork" requires
            // the cursor to be at or past the fork revision.
            if store.branch().unwrap() != branch {
                if branch == "fork" && store.rev().unwrap() < FORK_REV {
                    store.set_rev(FORK_REV).unwrap();
                }
                store.set_branch(branch).unwrap();
            }
            store.set_rev(rev).unwrap();

            let hist = model
                .get_mut(branch)
                .unwrap()
                .entry(key.to_string())
                .or_default();
            if rng.gen_bool(0.25) {
                g.del(key).unwrap();
                hist.insert(rev, None);
            } else {
                let value: i64 = rng.gen_range(0..1000);
                g.set(key, value).unwrap();
                hist.insert(rev, Some(value));
            }

            // Spot-check a random read.
            let check_key = KEYS[rng.gen_range(0..KEYS.len())];
            let check_rev = rng.gen_range(min_rev..min_rev + 20);
            store.set_rev(check_rev).unwrap();
            let got = match g.get(check_key) {
                Ok(Value::Int(i)) => Some(i),
                Ok(other) => panic!("unexpected value {:?}", other),
                Err(Error::NotFound(_)) => None,
                Err(err) => panic!("{}", err),
            };
            assert_eq!(
                got,
                lookup(&model, store.branch().unwrap().as_str(), check_key, check_rev),
                "key {} at ({}, {})",
                check_key,
                store.branch().unwrap(),
                check_rev
            );
        }
        store.close().unwrap();
    }

    // Full comparison from a cold reopen, with and without caching.
    for caching in [true, false] {
        let store = GraphStore::open_with(&path, Options { caching }).unwrap();
        let g = store.graph("g").unwrap();
        for branch in ["master", "fork"] {
            let min_rev = if branch == "fork" { FORK_REV } else { 0 };
            store.set_rev(min_rev + 20).unwrap();
            store.set_branch(branch).unwrap();
            for rev in min_rev..min_rev + 20 {
                store.set_rev(rev).unwrap();
                for key in KEYS {
                    let want = lookup(&model, branch, key, rev);
                    let got = match g.get(key) {
                        Ok(Value::Int(i)) => Some(i),
                        Ok(other) => panic!("unexpected value {:?}", other),
                        Err(Error::NotFound(_)) => None,
                        Err(err) => panic!("{}", err),
                    };
                    assert_eq!(got, want, "caching={} key {} at ({}, {})", caching, key, branch, rev);
                }
                // Key enumeration agrees with the model too.
                let mut want_keys: Vec<Value> = KEYS
                    .iter()
                    .filter(|k| lookup(&model, branch, k, rev).is_some())
                    .map(|k| v(k))
                    .collect();
                want_keys.sort();
                assert_eq!(g.keys().unwrap(), want_keys, "caching={} at ({}, {})", caching, branch, rev);
            }
        }
    }
}
