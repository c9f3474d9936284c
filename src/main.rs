//! mdoutline: inspect markdown outlines and preview tree reconciliation.
#![allow(clippy::multiple_crate_versions)]
// No public repository yet, so the metadata lint cannot be satisfied.
#![allow(clippy::cargo_common_metadata)]

use clap::{Parser, Subcommand};
use mdoutline::heading::compute_heading_sections_with;
use mdoutline::reconcile::needs_rebuild;
use mdoutline::{
    build_tree, config, extract_content_tree, logging, ContentNode, Error, HeadingNode,
    MemoryTree, Reconciler, StableKeyIndex,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mdoutline")]
#[command(about = "Markdown outline extraction and tree reconciliation", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Heading id scheme (slug or positional), overriding the config file
    #[arg(long, global = true, value_name = "STRATEGY")]
    ids: Option<String>,

    /// Label for headings with a blank title, overriding the config file
    #[arg(long, global = true)]
    placeholder: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the heading outline of a document
    Outline {
        /// Markdown file
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Emit `node_tree` JSON instead of an indented listing
        #[arg(long)]
        json: bool,
    },
    /// Print the informal structure under a heading (or before the first heading)
    Content {
        /// Markdown file
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Heading id whose body to scan
        #[arg(long)]
        heading: Option<String>,

        /// Emit JSON instead of an indented listing
        #[arg(long)]
        json: bool,
    },
    /// Print the stable key of every heading
    Keys {
        /// Markdown file
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Show the tree operations that turn OLD's outline into NEW's
    Diff {
        /// Document before the edit
        old: PathBuf,
        /// Document after the edit
        new: PathBuf,

        /// Let the tree move nodes instead of removing and re-adding them
        #[arg(long = "move")]
        allow_move: bool,
    },
}

fn document_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string())
}

fn print_content(nodes: &[ContentNode], depth: usize) {
    for node in nodes {
        let marker = match node.meta {
            Some(meta) if meta.done => "[x] ",
            Some(_) => "[ ] ",
            None => "",
        };
        println!("{}- {marker}{}", "  ".repeat(depth), node.label);
        print_content(&node.children, depth + 1);
    }
}

fn find_heading<'a>(headings: &'a [HeadingNode], id: &str) -> Option<&'a HeadingNode> {
    headings.iter().find(|h| h.id == id)
}

fn main() -> Result<(), Error> {
    logging::init();
    let args = Args::parse();
    let mut cfg = config::Config::load();

    // Override config with command line args
    if let Some(ids) = args.ids {
        cfg.id_strategy = ids;
    }
    if let Some(placeholder) = args.placeholder {
        cfg.placeholder_label = placeholder;
    }

    match args.command {
        Command::Outline { path, json } => {
            let text = cfg.read_document(&path)?;
            let headings = cfg.parser().parse(&text);
            let tree = build_tree(&headings, &document_name(&path));
            if json {
                println!("{}", tree.to_node_tree_json()?);
            } else {
                tree.walk(|node, depth| {
                    println!("{}{} [{}]", "  ".repeat(depth), node.topic, node.id);
                });
            }
        }
        Command::Content {
            path,
            heading,
            json,
        } => {
            let text = cfg.read_document(&path)?;
            let headings = cfg.parser().parse(&text);
            let (start, end) = match heading {
                Some(id) => {
                    let Some(h) = find_heading(&headings, &id) else {
                        eprintln!("No heading with id {id}");
                        return Ok(());
                    };
                    (h.heading_text_end + 1, h.end)
                }
                None => (0, headings.first().map_or(text.chars().count(), |h| h.start)),
            };
            let nodes = extract_content_tree(&text, start, end);
            if json {
                println!("{}", serde_json::to_string_pretty(&nodes)?);
            } else {
                print_content(&nodes, 0);
            }
        }
        Command::Keys { path } => {
            let text = cfg.read_document(&path)?;
            let headings = cfg.parser().parse(&text);
            let keys = StableKeyIndex::new(&headings);
            for h in &headings {
                println!("{}\t{}", h.id, keys.key(&h.id).unwrap_or("?"));
            }
        }
        Command::Diff {
            old,
            new,
            allow_move,
        } => {
            let name = document_name(&new);
            // Two different texts: never let the length-keyed cache answer for the second.
            let prev = compute_heading_sections_with(&cfg.read_document(&old)?, cfg.id_strategy());
            let next = compute_heading_sections_with(&cfg.read_document(&new)?, cfg.id_strategy());
            if needs_rebuild(&prev, &next, &name) {
                println!("# root changed: a host would rebuild the tree");
            }
            let mut tree = MemoryTree::from_outline(&build_tree(&prev, &name));
            tree.supports_move = allow_move;
            let reconciler = Reconciler::new(&name, &cfg.placeholder_label);
            let report = reconciler.reconcile(&prev, &next, &mut tree)?;
            for op in &tree.log {
                println!("{op}");
            }
            println!(
                "# removed {} added {} updated {} reparented {} restored {} failed {}",
                report.removed,
                report.added,
                report.updated,
                report.reparented,
                report.restored,
                report.failures
            );
        }
    }

    Ok(())
}
