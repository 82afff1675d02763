//! ddigraph CLI
//!
//! - `build`: offline batch job, source event store to `DDI_GRAPH`/`DDI_NODES`
//! - `query`: seeded subgraph + layout, printed as a JSON network view
//! - `reactions` / `timeline`: analytics over the reaction view
//! - `summarize`: reaction summary through the configured provider
//!
//! Results go to stdout as JSON; logs and diagnostics go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use ddigraph_graph::reactions::{indication_report, monthly_severity};
use ddigraph_graph::{spring_layout, NetworkView};
use ddigraph_storage::{load_graph_file, open_source, read_reaction_records, run_batch};
use ddigraph_summarize::{summarize_or_fallback, ReactionSummarizer, SummarizerConfig};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;

use config::PipelineConfig;

#[derive(Parser)]
#[command(name = "ddigraph")]
#[command(author, version, about = "Drug co-occurrence graphs from adverse-event reports")]
struct Cli {
    /// JSON config file (`storage`, `query`, `layout` sections).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging unless RUST_LOG is set.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the co-occurrence graph and persist it
    Build {
        /// Source event store
        #[arg(long)]
        source: Option<PathBuf>,
        /// Output graph database
        #[arg(long)]
        out: Option<PathBuf>,
        /// Exposure table name
        #[arg(long)]
        table: Option<String>,
    },

    /// Extract and lay out the subgraph around seed drugs
    Query {
        /// Graph database written by `build`
        #[arg(long)]
        graph: Option<PathBuf>,
        /// Seed drug (repeatable)
        #[arg(long = "seed", required = true)]
        seeds: Vec<String>,
        /// Neighbors kept per seed
        #[arg(short, long)]
        k: Option<usize>,
        /// Layout RNG seed
        #[arg(long)]
        layout_seed: Option<u64>,
    },

    /// Reaction profile for an indication
    Reactions {
        #[arg(long)]
        source: Option<PathBuf>,
        #[arg(long)]
        indication: String,
        /// Restrict reactions to one drug
        #[arg(long)]
        drug: Option<String>,
    },

    /// Monthly report counts by seriousness for the given drugs
    Timeline {
        #[arg(long)]
        source: Option<PathBuf>,
        #[arg(long = "drug", required = true)]
        drugs: Vec<String>,
    },

    /// Summarize a reaction
    Summarize {
        reaction: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = PipelineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Build { source, out, table } => {
            if let Some(source) = source {
                config.storage.source_db = source;
            }
            if let Some(out) = out {
                config.storage.graph_db = out;
            }
            if let Some(table) = table {
                config.storage.drugs_table = table;
            }
            cmd_build(&config)
        }
        Commands::Query {
            graph,
            seeds,
            k,
            layout_seed,
        } => {
            if let Some(graph) = graph {
                config.storage.graph_db = graph;
            }
            if let Some(k) = k {
                config.query.top_k = k;
            }
            if let Some(seed) = layout_seed {
                config.layout.seed = seed;
            }
            cmd_query(&config, &seeds)
        }
        Commands::Reactions {
            source,
            indication,
            drug,
        } => {
            if let Some(source) = source {
                config.storage.source_db = source;
            }
            cmd_reactions(&config, &indication, drug.as_deref())
        }
        Commands::Timeline { source, drugs } => {
            if let Some(source) = source {
                config.storage.source_db = source;
            }
            cmd_timeline(&config, &drugs)
        }
        Commands::Summarize { reaction } => cmd_summarize(&reaction),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "ddigraph=debug" } else { "ddigraph=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_build(config: &PipelineConfig) -> Result<()> {
    eprintln!(
        "{} {}",
        "Building".green().bold(),
        config.storage.source_db.display()
    );
    let outcome = run_batch(&config.storage).with_context(|| {
        format!(
            "graph build from {} failed",
            config.storage.source_db.display()
        )
    })?;
    eprintln!(
        "{} {} ({} edges, {} nodes)",
        "wrote".green().bold(),
        outcome.graph_db.display().to_string().bold(),
        outcome.report.edges,
        outcome.report.nodes
    );
    print_json(&outcome)
}

fn cmd_query(config: &PipelineConfig, seeds: &[String]) -> Result<()> {
    let view = query_view(config, seeds)?;
    for unknown in &view.unknown_seeds {
        eprintln!("{} unknown seed drug `{unknown}`", "warning:".yellow().bold());
    }
    print_json(&view)
}

fn query_view(config: &PipelineConfig, seeds: &[String]) -> Result<NetworkView> {
    let graph = load_graph_file(&config.storage.graph_db).with_context(|| {
        format!(
            "failed to load graph from {}",
            config.storage.graph_db.display()
        )
    })?;
    let subgraph = graph.subgraph(seeds, &config.query);
    let placed = spring_layout(&subgraph, &config.layout);
    Ok(NetworkView::new(&subgraph, &placed))
}

fn cmd_reactions(config: &PipelineConfig, indication: &str, drug: Option<&str>) -> Result<()> {
    let conn = open_source(&config.storage.source_db)?;
    let records = read_reaction_records(&conn, &config.storage.reactions_view)
        .context("failed to read reaction records")?;
    print_json(&indication_report(&records, indication, drug))
}

fn cmd_timeline(config: &PipelineConfig, drugs: &[String]) -> Result<()> {
    let conn = open_source(&config.storage.source_db)?;
    let records = read_reaction_records(&conn, &config.storage.reactions_view)
        .context("failed to read reaction records")?;
    print_json(&monthly_severity(&records, drugs))
}

fn cmd_summarize(reaction: &str) -> Result<()> {
    let provider = summarizer(&SummarizerConfig::from_env());
    let summary = summarize_or_fallback(provider.as_deref(), reaction);
    println!("{summary}");
    Ok(())
}

#[cfg(feature = "llm-openai")]
fn summarizer(config: &SummarizerConfig) -> Option<Box<dyn ReactionSummarizer>> {
    match ddigraph_summarize::OpenAiSummarizer::from_config(config) {
        Ok(provider) => provider.map(|p| Box::new(p) as Box<dyn ReactionSummarizer>),
        Err(err) => {
            tracing::warn!(error = %err, "summarizer disabled");
            None
        }
    }
}

#[cfg(not(feature = "llm-openai"))]
fn summarizer(_config: &SummarizerConfig) -> Option<Box<dyn ReactionSummarizer>> {
    None
}
