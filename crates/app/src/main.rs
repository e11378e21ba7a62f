use chrono::Utc;
use clap::{Parser, Subcommand};
use docsearch_core::{
    ingest_folder, DocumentStore, PlainTextExtractor, SearchConfig, SearchPipeline,
    SearchRequest,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "docsearch", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON file overriding tokenizer, encoder and scoring defaults
    #[arg(long, env = "DOCSEARCH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Index a folder in memory and run one or more queries against it.
    Search {
        /// Folder that contains documents recursively.
        #[arg(long)]
        folder: PathBuf,
        /// Search query; repeat to run several queries on the same index.
        #[arg(long, required = true)]
        query: Vec<String>,
        /// Print hits as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Print the score breakdown for each hit.
        #[arg(long, default_value_t = false)]
        explain: bool,
    },
    /// Show tokens, concept expansion and the encoded vector for a text.
    Inspect {
        #[arg(long)]
        text: String,
    },
    /// Index a folder and print corpus term statistics.
    Stats {
        #[arg(long)]
        folder: PathBuf,
        /// Number of terms to print.
        #[arg(long, default_value = "20")]
        top: usize,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SearchConfig> {
    match path {
        Some(path) => SearchConfig::from_json_file(path)
            .map_err(|error| anyhow::anyhow!("{}: {error}", path.display())),
        None => Ok(SearchConfig::default()),
    }
}

async fn index_folder(
    pipeline: &SearchPipeline,
    store: &DocumentStore,
    folder: &Path,
) -> anyhow::Result<()> {
    let report = ingest_folder(pipeline, store, &PlainTextExtractor, folder)
        .await
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    if !report.skipped.is_empty() {
        warn!(
            "skipped_files={} for folder={}",
            report.skipped.len(),
            folder.display()
        );
        for skipped in report.skipped {
            warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped file");
        }
    }

    info!(folder = %folder.display(), documents = report.stored.len(), "folder indexed");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let pipeline = SearchPipeline::new(config);
    let store = DocumentStore::new();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        dimensions = pipeline.dimensions(),
        "docsearch boot"
    );

    match cli.command {
        Command::Search {
            folder,
            query,
            json,
            explain,
        } => {
            index_folder(&pipeline, &store, &folder).await?;
            pipeline.refresh_statistics(&store);

            for text in query {
                let hits = pipeline.search(&store, &SearchRequest::new(text.as_str()));

                if json {
                    println!("{}", serde_json::to_string_pretty(&hits)?);
                    continue;
                }

                println!("query: {text} ({} hits)", hits.len());
                for hit in hits {
                    println!(
                        "[{}] score={:.4} document_id={} file={}",
                        hit.search_type, hit.score, hit.document_id, hit.filename
                    );
                    for section in &hit.matched_sections {
                        println!("  > {}", section.highlighted);
                        println!("    context: {}", section.context);
                    }
                    if explain {
                        let breakdown = &hit.explanation;
                        println!(
                            "  explain: semantic={:.4} effective_semantic={:.4} keyword={:.4} filename={} keywords={} sentences={}",
                            breakdown.semantic,
                            breakdown.effective_semantic,
                            breakdown.keyword,
                            breakdown.filename_matched,
                            breakdown.keyword_matches,
                            breakdown.sentence_matches
                        );
                    }
                }
            }
        }
        Command::Inspect { text } => {
            let inspection = pipeline.inspect(&text);
            println!("tokens: {}", inspection.tokens.join(" "));
            println!("expanded: {}", inspection.expanded_terms.join(" "));
            println!("concepts: {}", inspection.concepts.join(" "));
            println!("keywords: {}", inspection.keywords.join(" "));
            for (term, frequency) in &inspection.encoding.term_frequency {
                println!("tf: {term}={frequency:.4}");
            }
            let buckets = inspection
                .encoding
                .vector
                .iter()
                .enumerate()
                .filter(|(_, value)| **value != 0.0)
                .map(|(bucket, value)| format!("{bucket}:{value:.4}"))
                .collect::<Vec<_>>();
            println!("vector: {}", buckets.join(" "));
        }
        Command::Stats { folder, top } => {
            index_folder(&pipeline, &store, &folder).await?;
            pipeline.refresh_statistics(&store);

            let statistics = store.term_statistics();
            println!(
                "documents={} vocabulary={}",
                statistics.total_documents(),
                statistics.vocabulary().len()
            );
            for (term, frequency) in statistics.most_common(top) {
                let idf = statistics.idf(&term).unwrap_or_default();
                println!("{term}: df={frequency} idf={idf:.4}");
            }
        }
    }

    Ok(())
}
