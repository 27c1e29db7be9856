use anyhow::{Context, Result};
use clap::Parser;
use kubegraph::input::load_objects;
use kubegraph::{build_graph, Config};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kubegraph-stats")]
#[command(about = "Print node and relationship counts for a batch of manifests")]
struct Args {
    /// Manifest files or directories
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Scope for objects without a cluster name
    #[arg(short, long)]
    cluster: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let config = Config::load()?;
    let cluster = args.cluster.as_deref().unwrap_or(config.cluster()).to_string();

    let mut objects = Vec::new();
    for path in &args.input {
        objects.extend(
            load_objects(path)
                .with_context(|| format!("Failed to load objects from {}", path.display()))?,
        );
    }

    let (graph, errors) = build_graph(&cluster, &objects, || {});

    let mut kinds: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, node) in graph.nodes.iter() {
        *kinds.entry(node.kind.as_str()).or_default() += 1;
    }
    let mut labels: BTreeMap<&str, usize> = BTreeMap::new();
    for rel in graph.relationships.iter_sorted() {
        *labels.entry(rel.label.as_str()).or_default() += 1;
    }

    println!("\n=== kubegraph Statistics ===\n");
    println!("Objects: {}", objects.len());
    println!("Nodes: {}", graph.nodes.len());
    println!("Relationships: {}", graph.relationships.len());
    println!(
        "Extraction errors: {}",
        errors.as_ref().map(|e| e.len()).unwrap_or(0)
    );

    println!("\nNodes by kind:\n");
    println!("{:-<40}", "");
    println!("{:<30} {:>9}", "Kind", "Count");
    println!("{:-<40}", "");
    for (kind, count) in &kinds {
        println!("{:<30} {:>9}", kind, count);
    }

    println!("\nRelationships by label:\n");
    println!("{:-<40}", "");
    println!("{:<30} {:>9}", "Label", "Count");
    println!("{:-<40}", "");
    for (label, count) in &labels {
        println!("{:<30} {:>9}", label, count);
    }

    if let Some(errors) = errors {
        println!("\nErrors:\n");
        for e in errors.iter() {
            println!("  {}", e);
        }
    }

    Ok(())
}
