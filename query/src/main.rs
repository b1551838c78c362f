use anyhow::Result;
use clap::{Parser, Subcommand};
use sitesearch_core::SearchIndex;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "sitesearch-query")]
#[command(about = "Query a prebuilt documentation search index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a search against an index payload
    Run {
        /// Path to the index payload (searchindex.js or .json)
        #[arg(long)]
        index: String,
        /// Maximum number of hits to print
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Emit hits as JSON lines instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Query text
        query: Vec<String>,
    },
    /// Print summary statistics for an index payload
    Inspect {
        /// Path to the index payload
        #[arg(long)]
        index: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { index, limit, json, query } => {
            run_query(&index, limit, json, &query.join(" "))
        }
        Commands::Inspect { index } => inspect(&index),
    }
}

fn run_query(index: &str, limit: usize, json: bool, query: &str) -> Result<()> {
    let idx = SearchIndex::load_file(index)?;
    let hits = idx.search(query);
    let total = hits.len();
    for hit in hits.into_iter().take(limit) {
        if json {
            println!("{}", serde_json::to_string(&hit)?);
        } else {
            let location = match &hit.anchor {
                Some(anchor) => format!("{}#{}", hit.docname, anchor),
                None => hit.docname.clone(),
            };
            let heading = hit.section_title.as_deref().unwrap_or(&hit.title);
            println!("{:>6.1}  {location}  {heading}", hit.score);
        }
    }
    tracing::info!(total, query, "search complete");
    Ok(())
}

fn inspect(index: &str) -> Result<()> {
    let idx = SearchIndex::load_file(index)?;
    println!("documents: {}", idx.num_docs());
    println!("terms:     {}", idx.num_terms());
    println!("sections:  {}", idx.num_sections());
    for doc in idx.docs() {
        println!("  {}  {}  ({})", doc.docname, doc.title, doc.filename);
    }
    Ok(())
}
