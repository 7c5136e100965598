use revgraph::error::Error;
use revgraph::{GraphKind, GraphStore};

fn main() {
    init_logging();
    println!("Hello, revgraph!");

    run().unwrap();

    println!("Bye~");
}

fn init_logging() {
    let logger = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}] [{}] {}", record.level(), record.target(), message))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stderr());

    if logger.apply().is_err() {
        eprintln!("logger has already been set");
    }
}

fn run() -> Result<(), Error> {
    let store = GraphStore::open_in_memory()?;
    let g = store.new_graph("demo", GraphKind::Graph)?;

    // (master, 0): two nodes and the edge between them.
    g.add_node(0i64)?;
    g.add_node(1i64)?;
    g.add_edge(0i64, 1i64)?;
    g.edge(0i64, 1i64)?.set("weight", 10i64)?;

    // Fork a branch at rev 1 and take the edge away there.
    store.set_rev(1)?;
    store.set_branch("no_edge")?;
    g.remove_edge(0i64, 1i64)?;

    // Fork another branch off no_edge and close the triangle.
    store.set_branch("triangle")?;
    g.add_node(2i64)?;
    g.add_edge(0i64, 1i64)?;
    g.add_edge(1i64, 2i64)?;
    g.add_edge(2i64, 0i64)?;

    for branch in ["master", "no_edge", "triangle"] {
        store.set_branch(branch)?;
        println!(
            "({}, {}): nodes {:?}, neighbors of 0: {:?}",
            branch,
            store.rev()?,
            g.nodes()?,
            g.successors(0i64)?
        );
    }

    // Time travel: at (master, 0) the original state is intact.
    store.set_branch("master")?;
    store.set_rev(0)?;
    assert!(g.has_edge(0i64, 1i64)?);
    assert_eq!(g.edge(0i64, 1i64)?.get("weight")?, 10i64.into());
    println!("(master, 0): edge 0-1 weight {}", g.edge(0i64, 1i64)?.get("weight")?);

    store.close()
}
