//! scripture-graph CLI: rebuild and export the cross-reference graph.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::Result;

use scripture_graph::citation::{CitationTables, ReferenceParser};
use scripture_graph::config::PipelineConfig;
use scripture_graph::corpus::{CorpusEntry, epub::EpubArchive, read_directory};
use scripture_graph::embed::load_embedder;
use scripture_graph::graph::{CrossRefGraph, SimilarityAugmenter};
use scripture_graph::graph::export::{Snapshot, connections, navigation_tree, write_json};
use scripture_graph::pipeline::rebuild;

#[derive(Parser)]
#[command(
    name = "scripture-graph",
    version,
    about = "Scripture cross-reference graph builder"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the graph from EPUB archives or directories of pages.
    Build {
        /// EPUB files or directories of XHTML pages, read in order.
        #[arg(long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output graph snapshot (JSON).
        #[arg(long)]
        output: PathBuf,

        /// Pipeline configuration (TOML).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Leave topic nodes and their edges out of the graph.
        #[arg(long)]
        no_topics: bool,

        /// Skip the shared-neighbor similarity pass.
        #[arg(long)]
        skip_jaccard: bool,

        /// Skip the text similarity pass.
        #[arg(long)]
        skip_semantic: bool,

        /// Sentence model for the text pass, e.g. "bge-small-en-v1.5".
        #[arg(long)]
        model: Option<String>,
    },

    /// Re-run similarity augmentation on an existing graph snapshot.
    Augment {
        #[arg(long)]
        input: PathBuf,

        /// Output snapshot. Defaults to overwriting the input.
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Drop all suggested edges before augmenting.
        #[arg(long)]
        reset: bool,

        #[arg(long)]
        skip_semantic: bool,

        #[arg(long)]
        model: Option<String>,
    },

    /// Write per-verse connections from a graph snapshot.
    Connections {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },

    /// Write the navigation tree from a graph snapshot.
    Tree {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },

    /// Parse a citation string and print its targets.
    Parse {
        /// Citation text, e.g. "Prov. 22:1 (1-3); 23:2".
        text: String,

        /// Replacement citation tables (TOML).
        #[arg(long)]
        tables: Option<PathBuf>,
    },

    /// Show node and edge counts of a graph snapshot.
    Stats {
        #[arg(long)]
        input: PathBuf,
    },

    /// Write the default pipeline configuration.
    Config {
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            config,
            no_topics,
            skip_jaccard,
            skip_semantic,
            model,
        } => {
            let mut config = load_config(config.as_deref(), skip_semantic, model)?;
            if no_topics {
                config.graph.include_topics = false;
            }
            if skip_jaccard {
                config.similarity.run_jaccard = false;
            }

            let entries = read_inputs(&input)?;
            let result = rebuild(&entries, &config)?;
            Snapshot::from_graph(&result.graph).write(&output)?;

            let counts = result.graph.edge_counts();
            println!("Pages:        {}", entries.len());
            println!("Verses:       {}", result.aggregate.verses);
            println!("Topics:       {}", result.aggregate.topics);
            println!("Nodes:        {}", result.build.nodes);
            println!("Edges:        {}", counts.canonical);
            println!("Duplicates:   {}", result.build.duplicates);
            println!("Jaccard:      {} pairs", result.augment.jaccard_pairs);
            println!("Semantic:     {} pairs", result.augment.semantic_pairs);
            println!("Wrote {}", output.display());
        }

        Commands::Augment {
            input,
            output,
            config,
            reset,
            skip_semantic,
            model,
        } => {
            let config = load_config(config.as_deref(), skip_semantic, model)?;
            let embedder = if config.similarity.run_semantic {
                Some(load_embedder(&config.similarity.model)?)
            } else {
                None
            };
            let mut graph = load_graph(&input)?;
            if reset {
                let removed = graph.clear_suggested();
                println!("Removed:      {removed} suggested edges");
            }
            let augmenter = match &embedder {
                Some(embedder) => SimilarityAugmenter::new(&config.similarity, embedder.as_ref()),
                None => SimilarityAugmenter::structural(&config.similarity),
            };
            let report = augmenter.augment(&mut graph)?;
            let output = output.unwrap_or(input);
            Snapshot::from_graph(&graph).write(&output)?;
            println!("Jaccard:      {} pairs", report.jaccard_pairs);
            println!("Semantic:     {} pairs", report.semantic_pairs);
            println!("Wrote {}", output.display());
        }

        Commands::Connections { input, output } => {
            let graph = load_graph(&input)?;
            let conns = connections(&graph);
            write_json(&output, &conns)?;
            println!("Wrote {} verses to {}", conns.len(), output.display());
        }

        Commands::Tree { input, output } => {
            let graph = load_graph(&input)?;
            let tree = navigation_tree(&graph);
            write_json(&output, &tree)?;
            println!("Wrote {}", output.display());
        }

        Commands::Parse { text, tables } => {
            let tables = match tables {
                Some(path) => CitationTables::load(&path),
                None => CitationTables::bundled(),
            }?;
            let parser = ReferenceParser::new(tables)?;
            let targets = parser.parse(&text)?;
            if targets.is_empty() {
                println!("(ignored)");
            }
            for target in targets {
                println!("{target}");
            }
        }

        Commands::Stats { input } => {
            let graph = load_graph(&input)?;
            let verses = graph.nodes().filter(|n| n.is_verse()).count();
            let counts = graph.edge_counts();
            println!("Nodes:        {}", graph.node_count());
            println!("  verses:     {verses}");
            println!("  topics:     {}", graph.node_count() - verses);
            println!("Edges:        {}", graph.edge_count());
            println!("  canonical:  {}", counts.canonical);
            println!("  jaccard:    {}", counts.jaccard);
            println!("  use:        {}", counts.use_);
        }

        Commands::Config { output } => {
            PipelineConfig::default().save(&output)?;
            println!("Wrote {}", output.display());
        }
    }

    Ok(())
}

/// Read every input in order: directories page by page, files as EPUBs.
fn read_inputs(inputs: &[PathBuf]) -> Result<Vec<CorpusEntry>> {
    let mut entries = Vec::new();
    for input in inputs {
        if input.is_dir() {
            entries.extend(read_directory(input)?);
        } else {
            let mut archive = EpubArchive::open(input)?;
            entries.extend(archive.entries()?);
        }
    }
    if entries.is_empty() {
        return Err(miette::miette!("no pages found in the given inputs"));
    }
    Ok(entries)
}

/// The pipeline configuration with command-line overrides applied.
fn load_config(
    path: Option<&Path>,
    skip_semantic: bool,
    model: Option<String>,
) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if skip_semantic {
        config.similarity.run_semantic = false;
    }
    if let Some(model) = model {
        config.similarity.model = model;
    }
    Ok(config)
}

fn load_graph(path: &Path) -> Result<CrossRefGraph> {
    Ok(Snapshot::read(path)?.into_graph()?)
}
