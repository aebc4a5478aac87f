//! trie CLI - build, inspect and compare canonical decoder tables
//!
//! Every command prints a single JSON value on stdout; logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use opcode_trie::ops::Diff;
use opcode_trie::store::{build_trie, read_document, read_records, write_document};
use opcode_trie::trie::{depth, format_path, lookup};
use opcode_trie::{
    accept_sequences, from_dict, to_dict, unique_nodes, AcceptInfo, Config, ConflictPolicy,
    NodeCache, NodeId, TrieDocument,
};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "trie")]
#[command(about = "Build, minimize and diff canonical decoder tables")]
#[command(version)]
struct Cli {
    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Config file (defaults to ~/.config/opcode-trie/config.json if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a canonical table document from JSON Lines path records
    Build {
        /// Records file, one {"path": [...], "input_rr": ..., "output_rr": ...} per line
        input: PathBuf,
        /// Output document (.zst for compressed)
        #[arg(short, long)]
        output: PathBuf,
        /// Let later records replace conflicting earlier ones
        #[arg(long)]
        overwrite: bool,
        /// Indent the written document
        #[arg(long)]
        pretty: bool,
    },

    /// Show size and fingerprint of a table document
    Stats {
        /// Table document
        document: PathBuf,
    },

    /// List accepting paths in traversal order
    Accepts {
        /// Table document
        document: PathBuf,
        /// Maximum number of paths to return
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the accept value at one path
    Lookup {
        /// Table document
        document: PathBuf,
        /// Path labels
        path: Vec<String>,
    },

    /// Show paths whose accept values differ between two documents
    Diff {
        /// Previous revision
        old: PathBuf,
        /// New revision
        new: PathBuf,
        /// Exit with status 1 if the tables differ
        #[arg(long)]
        check: bool,
    },

    /// Merge two documents into one holding the paths of both
    Union {
        /// First document
        first: PathBuf,
        /// Second document
        second: PathBuf,
        /// Output document (.zst for compressed)
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Build {
            input,
            output: out_path,
            overwrite,
            pretty,
        } => {
            let policy = if overwrite {
                ConflictPolicy::Overwrite
            } else {
                config.conflict_policy
            };
            let records = read_records(&input)
                .with_context(|| format!("Failed to read records from {}", input.display()))?;
            let tree = build_trie(&records, policy)?;

            let mut cache = NodeCache::new();
            let root = cache.merge(&tree);
            let fingerprint = cache.fingerprint(root)?;
            let doc = to_dict(cache.node(root)).with_fingerprint(fingerprint);

            let mut options = config.write_options();
            options.pretty |= pretty;
            write_document(&out_path, &doc, &options)?;
            info!(records = records.len(), "built table");

            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "records": records.len(),
                    "raw_nodes": unique_nodes(&tree).len(),
                    "canonical_nodes": doc.node_count(),
                    "fingerprint": fingerprint.to_hex(),
                    "output": out_path.display().to_string()
                }),
            )?;
        }

        Commands::Stats { document } => {
            let mut cache = NodeCache::new();
            let root = load(&document, &mut cache)?;
            let node = cache.node(root);
            output(
                &cli.format,
                &serde_json::json!({
                    "nodes": unique_nodes(node).len(),
                    "accepts": accept_sequences(node).count(),
                    "depth": depth(node),
                    "fingerprint": cache.fingerprint(root)?.to_hex()
                }),
            )?;
        }

        Commands::Accepts { document, limit } => {
            let mut cache = NodeCache::new();
            let root = load(&document, &mut cache)?;
            let items: Vec<_> = accept_sequences(cache.node(root))
                .take(limit.unwrap_or(usize::MAX))
                .map(|(accept, path)| {
                    serde_json::json!({
                        "path": path,
                        "input_rr": accept.input_rr,
                        "output_rr": accept.output_rr
                    })
                })
                .collect();
            output(
                &cli.format,
                &serde_json::json!({
                    "count": items.len(),
                    "accepts": items
                }),
            )?;
        }

        Commands::Lookup { document, path } => {
            let mut cache = NodeCache::new();
            let root = load(&document, &mut cache)?;
            match lookup(cache.node(root), path.as_slice()) {
                Some(accept) => {
                    output(
                        &cli.format,
                        &serde_json::json!({
                            "path": path,
                            "input_rr": accept.input_rr,
                            "output_rr": accept.output_rr
                        }),
                    )?;
                }
                None => {
                    output(
                        &cli.format,
                        &serde_json::json!({
                            "status": "error",
                            "message": format!("No accept at path [{}]", format_path(path.as_slice()))
                        }),
                    )?;
                    std::process::exit(1);
                }
            }
        }

        Commands::Diff { old, new, check } => {
            // Both sides share one cache so unchanged subtrees are skipped
            let mut cache = NodeCache::new();
            let old_root = load(&old, &mut cache)?;
            let new_root = load(&new, &mut cache)?;

            let diff = Diff::collect(
                cache.node(old_root),
                cache.node(new_root),
                cache.empty_node(),
            );
            let entries: Vec<_> = diff
                .entries
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "path": e.path,
                        "kind": e.kind(),
                        "old": e.left,
                        "new": e.right
                    })
                })
                .collect();
            output(
                &cli.format,
                &serde_json::json!({
                    "identical": diff.is_empty(),
                    "added": diff.added_count(),
                    "removed": diff.removed_count(),
                    "modified": diff.modified_count(),
                    "changes": entries
                }),
            )?;

            if check && !diff.is_empty() {
                std::process::exit(1);
            }
        }

        Commands::Union {
            first,
            second,
            output: out_path,
        } => {
            let mut cache = NodeCache::new();
            let a = load(&first, &mut cache)?;
            let b = load(&second, &mut cache)?;
            let root = cache.union(a, b)?;

            let fingerprint = cache.fingerprint(root)?;
            let doc = to_dict(cache.node(root)).with_fingerprint(fingerprint);
            write_document(&out_path, &doc, &config.write_options())?;

            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "canonical_nodes": doc.node_count(),
                    "fingerprint": fingerprint.to_hex(),
                    "output": out_path.display().to_string()
                }),
            )?;
        }
    }

    Ok(())
}

fn load(path: &Path, cache: &mut NodeCache) -> anyhow::Result<NodeId> {
    let doc: TrieDocument<AcceptInfo> = read_document(path)
        .with_context(|| format!("Failed to read document {}", path.display()))?;
    let root = from_dict(&doc, cache)
        .with_context(|| format!("Invalid document {}", path.display()))?;
    Ok(root)
}

fn output(format: &OutputFormat, value: &serde_json::Value) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(value)?);
        }
        OutputFormat::Text => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
    }
    Ok(())
}
