use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docnav_config::Config;
use docnav_engine::{CorpusOptions, DocsRoot, ElementType, Error, IoError, Position, ScanOptions, Workspace};
use serde_json::{Value, json};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "docnav")]
#[command(about = "Navigate and edit AsciiDoc and Markdown documentation by section")]
struct Cli {
    /// Documentation root; falls back to PROJECT_PATH, the config file, then the current directory
    #[arg(long, global = true)]
    docs_root: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the section outline
    Structure {
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Print one section read from disk
    Section { path: String },
    /// List sections at a heading level
    Level { level: usize },
    /// Search section titles and content
    Search {
        query: String,
        #[arg(long)]
        scope: Option<String>,
        #[arg(long, default_value_t = false)]
        case_sensitive: bool,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// List code blocks, tables, images, diagrams, admonitions and lists
    Elements {
        #[arg(long = "type")]
        element_type: Option<String>,
        #[arg(long)]
        section: Option<String>,
    },
    /// Project metadata, or metadata for one section
    Metadata { path: Option<String> },
    /// Check the tree for orphaned files, unclosed blocks and broken includes
    Validate,
    /// Replace a section's content
    Update {
        path: String,
        /// New content, or `-` to read stdin
        #[arg(long)]
        content: String,
        #[arg(long, default_value_t = false)]
        no_preserve_title: bool,
        #[arg(long)]
        expected_hash: Option<String>,
    },
    /// Insert content before, after or at the end of a section
    Insert {
        path: String,
        #[arg(long)]
        position: String,
        /// Content to insert, or `-` to read stdin
        #[arg(long)]
        content: String,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{output:#}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let (code, output) = failure(&err);
            println!("{output:#}");
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<Value> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Ignoring config file {}: {e}", Config::config_path().display());
            None
        }
    };
    let docs_root = docnav_config::resolve_docs_root(cli.docs_root, config.as_ref())?;
    log::info!("Using docs root {}", docs_root.display());

    let options = corpus_options(config.as_ref());
    let docs = DocsRoot::new(&docs_root, options)
        .with_context(|| format!("Invalid docs root '{}'", docs_root.display()))?;
    let mut workspace = Workspace::open(docs)?;
    for warning in workspace.build_warnings() {
        log::warn!("Index: {warning}");
    }

    let output = match cli.command {
        Command::Structure { max_depth } => serde_json::to_value(workspace.index().get_structure(max_depth))?,
        Command::Section { path } => serde_json::to_value(workspace.read_section(&path)?)?,
        Command::Level { level } => {
            let sections: Vec<Value> = workspace
                .index()
                .get_sections_at_level(level)
                .into_iter()
                .map(|s| json!({"path": s.path, "title": s.title, "location": s.source_location}))
                .collect();
            json!({"level": level, "sections": sections, "count": sections.len()})
        }
        Command::Search {
            query,
            scope,
            case_sensitive,
            limit,
        } => {
            let results = workspace
                .index()
                .search(&query, scope.as_deref(), case_sensitive, limit);
            json!({"query": query, "results": results, "total_results": results.len()})
        }
        Command::Elements { element_type, section } => {
            let element_type = element_type
                .map(|t| t.parse::<ElementType>())
                .transpose()
                .map_err(|e| Error::Validation(e.to_string()))?;
            let elements = workspace.index().get_elements(element_type, section.as_deref());
            let mut listed = Vec::with_capacity(elements.len());
            for element in elements {
                let mut value = serde_json::to_value(element)?;
                value["preview"] = json!(element.preview());
                listed.push(value);
            }
            json!({"elements": listed, "count": listed.len()})
        }
        Command::Metadata { path } => match path {
            Some(path) => serde_json::to_value(docnav_engine::services::section_metadata(workspace.index(), &path)?)?,
            None => serde_json::to_value(docnav_engine::services::project_metadata(workspace.index()))?,
        },
        Command::Validate => serde_json::to_value(workspace.validate()?)?,
        Command::Update {
            path,
            content,
            no_preserve_title,
            expected_hash,
        } => {
            let content = read_content(content)?;
            let outcome =
                workspace.update_section(&path, &content, !no_preserve_title, expected_hash.as_deref())?;
            let mut value = serde_json::to_value(outcome)?;
            value["success"] = json!(true);
            value
        }
        Command::Insert {
            path,
            position,
            content,
        } => {
            let position: Position = position.parse()?;
            let content = read_content(content)?;
            let outcome = workspace.insert_content(&path, position, &content)?;
            let mut value = serde_json::to_value(outcome)?;
            value["success"] = json!(true);
            value
        }
    };
    Ok(output)
}

fn corpus_options(config: Option<&Config>) -> CorpusOptions {
    let Some(config) = config else {
        return CorpusOptions::default();
    };
    CorpusOptions {
        scan: ScanOptions {
            respect_gitignore: config.respect_gitignore,
            include_hidden: config.include_hidden,
        },
        max_include_depth: config.max_include_depth,
        skip_files: config.skip_files.clone(),
    }
}

/// `-` reads the content from stdin.
fn read_content(content: String) -> Result<String> {
    if content != "-" {
        return Ok(content);
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read content from stdin")?;
    Ok(buffer)
}

/// Exit code and JSON body for a failed command.
fn failure(err: &anyhow::Error) -> (u8, Value) {
    let mut body = json!({"success": false, "error": format!("{err:#}")});
    let Some(engine) = err.downcast_ref::<Error>() else {
        return (1, body);
    };

    let code = match engine {
        Error::NotFound { suggestions, .. } => {
            body["suggestions"] = json!(suggestions);
            3
        }
        Error::Io(IoError::NotFound(_)) => 3,
        Error::Io(IoError::InvalidDocsRoot(_)) => 1,
        Error::Conflict { current_hash, .. } => {
            body["current_hash"] = json!(current_hash);
            4
        }
        Error::Validation(_) | Error::InvalidPosition(_) => 4,
        Error::Io(_) => 5,
        Error::CircularInclude { .. } => 1,
    };
    (code, body)
}
