mod app;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use echorag_core::config::Config;
use echorag_hybrid::{Ingestor, NewDocument, TimeWindow, INSUFFICIENT_CONTEXT_MSG};

use crate::app::App;

/// Ingest documents and run hybrid retrieval over them.
#[derive(Parser, Debug)]
#[command(name = "echorag", author, version, about, long_about = None)]
struct Args {
    /// Directory holding config.toml; relative data paths resolve against it
    #[arg(short, long, default_value = ".")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest one file, or every .txt/.md file under a directory
    Ingest {
        path: PathBuf,
        /// Override the filetype derived from the file extension
        #[arg(long)]
        filetype: Option<String>,
    },
    /// Retrieve ranked passages for a question
    Query {
        question: String,
        #[arg(short, long)]
        k: Option<usize>,
        /// Only documents newer than this: 24h, 7d, 2w or all
        #[arg(short, long, default_value = "all")]
        window: TimeWindow,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Retrieve and print the assembled context blocks
    Context {
        question: String,
        #[arg(short, long)]
        k: Option<usize>,
        #[arg(short, long, default_value = "all")]
        window: TimeWindow,
    },
    /// Delete a document from the store and both indexes
    Delete { doc_id: String },
    /// Print stored headings for the given documents, or for all of them
    Headings { doc_ids: Vec<String> },
    /// Re-index documents left pending by an interrupted ingestion
    Repair {
        /// Also rebuild the heading index of every document
        #[arg(long)]
        headings: bool,
    },
    /// List documents, newest first
    List,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let settings = Config::load_from(&args.config_dir)?.settings()?;
    let app = App::open(settings).await?;

    match args.command {
        Commands::Ingest { path, filetype } => ingest(&app.ingestor(), &path, filetype.as_deref()).await,
        Commands::Query { question, k, window, json } => {
            let result = app.retriever()?.retrieve(&question, k, window).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }
            println!("intent: {}  queries: {:?}", result.intent, result.queries);
            if !result.has_relevant_content() {
                println!("{INSUFFICIENT_CONTEXT_MSG}");
                return Ok(());
            }
            for (i, hit) in result.hits.iter().enumerate() {
                let rerank = hit.rerank_score.map(|s| format!("  rerank={s:.1}")).unwrap_or_default();
                println!(
                    "\n{:>2}. score={:.5}{rerank}  {} #{}  [{}]",
                    i + 1,
                    hit.score,
                    hit.source.filename,
                    hit.source.chunk_index,
                    hit.chunk_id
                );
                println!("    {}", preview(&hit.text, 240));
            }
            Ok(())
        }
        Commands::Context { question, k, window } => {
            let retriever = app.retriever()?;
            let result = retriever.retrieve(&question, k, window).await?;
            if !result.has_relevant_content() {
                println!("{INSUFFICIENT_CONTEXT_MSG}");
                return Ok(());
            }
            for block in retriever.build_context(&question, &result.hits).await {
                println!("--- {:?} {} ({})", block.kind, block.chunk_id, block.source.filename);
                println!("{}\n", block.text);
            }
            Ok(())
        }
        Commands::Delete { doc_id } => {
            if app.ingestor().delete_document(&doc_id).await? {
                println!("deleted {doc_id}");
            } else {
                println!("no document {doc_id}");
            }
            Ok(())
        }
        Commands::Headings { doc_ids } => {
            let ingestor = app.ingestor();
            let doc_ids = if doc_ids.is_empty() {
                ingestor.list_documents()?.into_iter().map(|d| d.id).collect()
            } else {
                doc_ids
            };
            for row in ingestor.headings_for_docs(&doc_ids)? {
                println!("{}\t{}\t{}", row.doc_id, row.chunk_index, row.heading_text);
            }
            Ok(())
        }
        Commands::Repair { headings } => {
            let ingestor = app.ingestor();
            let repaired = ingestor.repair().await?;
            println!("repaired {} document(s)", repaired.len());
            if headings {
                println!("stored {} heading(s)", ingestor.backfill_headings()?);
            }
            Ok(())
        }
        Commands::List => {
            for doc in app.ingestor().list_documents()? {
                println!("{}\t{}\t{}\t{}", doc.id, doc.created_at.to_rfc3339(), doc.filetype, doc.filename);
            }
            Ok(())
        }
    }
}

fn filetype_for(path: &Path) -> String {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "" | "txt" => "text".to_string(),
        "md" | "markdown" => "markdown".to_string(),
        other => other.to_string(),
    }
}

fn is_ingestible(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("txt" | "md"))
}

async fn ingest_file(ingestor: &Ingestor, path: &Path, filetype: Option<&str>) -> Result<()> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let filename = path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let filetype = filetype.map_or_else(|| filetype_for(path), str::to_string);
    match ingestor.ingest(NewDocument::new(filename, filetype, text)).await? {
        Some(report) => tracing::info!(
            path = %path.display(),
            doc_id = %report.doc_id,
            doc_type = %report.doc_type,
            chunks = report.chunks,
            "ingested"
        ),
        None => tracing::info!(path = %path.display(), "empty, skipped"),
    }
    Ok(())
}

async fn ingest(ingestor: &Ingestor, path: &Path, filetype: Option<&str>) -> Result<()> {
    if path.is_file() {
        return ingest_file(ingestor, path, filetype).await;
    }

    let files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file() && is_ingestible(e.path()))
        .map(walkdir::DirEntry::into_path)
        .collect();

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    let mut failed = 0usize;
    for file in &files {
        pb.set_message(file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());
        if let Err(e) = ingest_file(ingestor, file, filetype).await {
            failed += 1;
            tracing::warn!(path = %file.display(), error = %format!("{e:#}"), "ingest failed");
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");
    println!("ingested {} of {} file(s) from {}", files.len() - failed, files.len(), path.display());
    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{cut}…")
}
