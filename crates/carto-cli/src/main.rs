//! carto-cli: CLI entry point for the carto analysis server.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use ignore::WalkBuilder;

use carto_core::CrudReport;
use carto_server::{assemble::assemble, worklist_of, NullAnalyzer, SemanticAnalyzer, Server};
use carto_syntax::SourceStore;

#[derive(Parser)]
#[command(name = "carto", about = "Structural analysis server for Go projects")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the JSON-RPC server (stdio)
    Serve,

    /// Load a project directory, analyze it once, and print the report
    Analyze {
        /// Project root (defaults to the current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // stdout carries JSON only; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve => {
            let server = Server::new(Box::new(NullAnalyzer));
            server.run()?;
        }
        Commands::Analyze { path } => {
            let root = path.unwrap_or_else(|| PathBuf::from("."));
            run_analyze(root)?;
        }
    }
    Ok(())
}

fn run_analyze(root: PathBuf) -> Result<(), Box<dyn Error>> {
    let root = root.canonicalize()?;
    let store = SourceStore::new(root.clone());

    let loaded = load_go_files(&store, &root)?;
    tracing::info!("loaded {loaded} Go files from {}", root.display());

    let report = build_report(&store)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Walk the project and stream every Go file into the store, skipping
/// hidden and gitignored entries. Returns the number of files loaded.
fn load_go_files(store: &SourceStore, root: &Path) -> Result<usize, Box<dyn Error>> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .build();

    let mut loaded = 0usize;
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!("Walk error: {err}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("go") {
            continue;
        }

        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!("Failed to read {}: {err}", path.display());
                continue;
            }
        };
        store.put_file(path, content)?;
        loaded += 1;
    }

    Ok(loaded)
}

fn build_report(store: &SourceStore) -> Result<CrudReport, Box<dyn Error>> {
    let snapshot = store.snapshot()?;
    let analyzer = NullAnalyzer;
    let summary = analyzer.analyze(&snapshot)?;
    let resolution = carto_syntax::resolve(&snapshot, &worklist_of(&summary));
    Ok(assemble(&summary, &resolution, snapshot.table()))
}
