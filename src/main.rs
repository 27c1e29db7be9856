use anyhow::{Context, Result};
use clap::Parser;
use kubegraph::input::load_objects;
use kubegraph::{build_graph, Config, Format};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "kubegraph")]
#[command(about = "Build a relationship graph of cluster resources and export it as Cypher or Graphviz")]
struct Args {
    /// Manifest files or directories (JSON or YAML, `List` documents are flattened)
    #[arg(short, long, required = true, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Output format (overrides output.format in kubegraph.toml)
    #[arg(short = 'f', long, value_enum)]
    output_format: Option<Format>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Scope for objects without a cluster name (overrides graph.cluster)
    #[arg(short, long)]
    cluster: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", config.logging.level.as_str())
    ).init();

    // Config is loaded before the logger exists.
    match &config.source {
        Some(path) => log::debug!("Loaded configuration from {}", path.display()),
        None => log::debug!("No config file found, using default configuration"),
    }

    let format = match args.output_format {
        Some(format) => format,
        None => config.output_format()?,
    };
    let cluster = args.cluster.as_deref().unwrap_or(config.cluster()).to_string();
    let output = args.output.or_else(|| config.output.path.clone());

    let mut objects = Vec::new();
    for path in &args.input {
        let loaded = load_objects(path)
            .with_context(|| format!("Failed to load objects from {}", path.display()))?;
        objects.extend(loaded);
    }

    if objects.is_empty() {
        log::warn!("No objects found in the given inputs");
    }

    let total = objects.len();
    let start = Instant::now();
    let mut processed = 0usize;
    let (graph, errors) = build_graph(&cluster, &objects, || {
        processed += 1;
        if processed % 500 == 0 || processed == total {
            log::info!("[{}/{}] objects processed", processed, total);
        }
    });

    if let Some(errors) = &errors {
        for e in errors.iter() {
            log::warn!("{}", e);
        }
        log::warn!("{} object(s) failed extraction; their generic nodes were kept", errors.len());
    }

    match &output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            graph.write_to(&mut writer, format)?;
            writer.flush()?;
            log::info!("Wrote {} output to {}", format, path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            graph.write_to(&mut lock, format)?;
            lock.flush()?;
        }
    }

    log::info!(
        "Done: {} nodes, {} relationships in {:?}",
        graph.nodes.len(),
        graph.relationships.len(),
        start.elapsed()
    );

    Ok(())
}
