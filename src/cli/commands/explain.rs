use crate::cli::output::OutputMode;
use crate::cli::{ai, repo};
use anyhow::Result;
use colored::Colorize;
use cv_graph::GraphStore;
use cv_semantic::{SemanticConfig, SemanticGraphService};

pub async fn run(target: String, mode: OutputMode) -> Result<()> {
    let root = repo::require_initialized_repo()?;
    let repo_id = repo::repo_id_for(&root);

    let graph = GraphStore::load(&root.join(".cv").join("graph.json")).unwrap_or_default();
    let profiles = ai::build_llm_profiles()?;
    let vector = ai::build_vector_store(&root, profiles)?;
    let cfg = SemanticConfig::from_repo_root(&root);
    let service = SemanticGraphService::new(&graph, &vector, repo_id, cfg);

    let context = service.get_comprehensive_context(&target, None).await?;

    mode.emit(&context, || {
        match &context.neighborhood {
            Some(n) => println!("{} {} nodes, {} edges within 2 hops", "neighborhood:".bold(), n.nodes.len(), n.edges.len()),
            None => println!("{} not found in graph", "neighborhood:".bold().dimmed()),
        }
        match &context.impact {
            Some(i) => println!(
                "{} {} direct callers, {} transitive, {} files affected",
                "impact:".bold(),
                i.direct_callers.len(),
                i.transitive_callers.len(),
                i.affected_files.len()
            ),
            None => println!("{} not found in graph", "impact:".bold().dimmed()),
        }
        println!("{} {} semantically similar hits", "similar:".bold(), context.similar.len());
        for hit in context.similar.iter().take(5) {
            let file = hit.payload.get("file").and_then(|v| v.as_str()).unwrap_or("?");
            println!("  {:.2}  {file}", hit.score);
        }
    });
    Ok(())
}
