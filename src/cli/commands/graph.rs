use crate::cli::output::OutputMode;
use crate::cli::repo;
use anyhow::Result;
use clap::Subcommand;
use cv_graph::GraphStore;

#[derive(Subcommand)]
pub enum GraphAction {
    /// Callers and callees within N hops of a symbol
    Neighbors {
        name: String,
        #[arg(long, default_value_t = 2)]
        depth: u32,
        #[arg(long, default_value_t = 100)]
        max: usize,
    },
    /// Shortest path between two symbols/files
    Path {
        from: String,
        to: String,
        #[arg(long = "max-depth", default_value_t = 6)]
        max_depth: u32,
    },
    /// Blast radius of changing a symbol
    Impact {
        name: String,
        #[arg(long = "max-depth", default_value_t = 3)]
        max_depth: u32,
    },
    /// Direct callers of a symbol
    Callers { name: String },
    /// Direct callees of a symbol
    Callees { name: String },
    /// Runs the `key:value` filter escape hatch
    Query { text: String },
}

fn load_graph(root: &std::path::Path) -> GraphStore {
    GraphStore::load(&root.join(".cv").join("graph.json")).unwrap_or_default()
}

pub fn run(action: GraphAction, mode: OutputMode) -> Result<()> {
    let root = repo::require_initialized_repo()?;
    let repo_id = repo::repo_id_for(&root);
    let graph = load_graph(&root);

    match action {
        GraphAction::Neighbors { name, depth, max } => {
            let result = graph.get_neighborhood(&repo_id, &name, depth, max)?;
            mode.emit(&result, || {
                for n in &result.nodes {
                    println!("{:>3}  {:<10?}  {}", n.distance, n.node.kind, n.node.name);
                }
            });
        }
        GraphAction::Path { from, to, max_depth } => {
            let result = graph.find_path(&repo_id, &from, &to, max_depth)?;
            mode.emit(&result, || {
                if result.found {
                    let names: Vec<&str> = result.nodes.iter().map(|n| n.name.as_str()).collect();
                    println!("{}", names.join(" -> "));
                } else {
                    println!("no path found within {max_depth} hops");
                }
            });
        }
        GraphAction::Impact { name, max_depth } => {
            let result = graph.get_impact_analysis(&repo_id, &name, max_depth)?;
            mode.emit(&result, || {
                println!("direct callers: {}", result.direct_callers.len());
                for n in &result.direct_callers {
                    println!("  {}", n.name);
                }
                println!("transitive callers: {}", result.transitive_callers.len());
                println!("affected files: {}", result.affected_files.len());
                for f in &result.affected_files {
                    println!("  {f}");
                }
            });
        }
        GraphAction::Callers { name } => {
            let result = graph.get_callers(&repo_id, &name)?;
            mode.emit(&result, || {
                for n in &result {
                    println!("{}", n.name);
                }
            });
        }
        GraphAction::Callees { name } => {
            let result = graph.get_callees(&repo_id, &name)?;
            mode.emit(&result, || {
                for n in &result {
                    println!("{}", n.name);
                }
            });
        }
        GraphAction::Query { text } => {
            let parsed = cv_graph::query::parse(&text)?;
            let result = cv_graph::query::run(&graph, &repo_id, &parsed, &Default::default())?;
            mode.emit(&result, || {
                for n in &result {
                    println!("{:?}  {}", n.kind, n.name);
                }
            });
        }
    }
    Ok(())
}
