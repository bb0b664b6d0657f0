//! Command handlers for the recall CLI.

use crate::output::*;
use recall::chat::ChatClient;
use recall::import::{import_from_json, import_from_markdown, ImportStats};
use recall::{Config, Error, MemoryStore};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Minimum similarity for memories handed to the chat model.
const CHAT_MIN_SCORE: f32 = 0.2;

struct SearchContext<'a> {
    query: &'a str,
    limit: usize,
    tags: Option<Vec<String>>,
    min_score: f32,
}

/// Commands supported by recall CLI.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Add a new memory
    Add {
        /// Memory text content
        text: String,

        /// Comma-separated tags
        #[arg(short = 't', long)]
        tags: Option<String>,
    },
    /// Search memories semantically
    Search {
        /// Search query text
        query: String,

        /// Maximum number of results (default: search_limit from config)
        #[arg(short = 'l', long)]
        limit: Option<usize>,

        /// Only search memories with any of these comma-separated tags
        #[arg(short = 't', long)]
        tags: Option<String>,

        /// Minimum similarity score (default: min_score from config)
        #[arg(short = 'm', long, allow_negative_numbers = true)]
        min_score: Option<f32>,
    },
    /// List recent memories
    List {
        /// Maximum number of results
        #[arg(short = 'l', long, default_value = "10")]
        limit: usize,

        /// Only list memories with any of these comma-separated tags
        #[arg(short = 't', long)]
        tags: Option<String>,
    },
    /// Show one memory
    Get {
        /// Memory ID
        id: i64,
    },
    /// Change a memory's text and/or tags
    Update {
        /// Memory ID
        id: i64,

        /// New content (re-embedded)
        #[arg(long)]
        text: Option<String>,

        /// Replacement comma-separated tags
        #[arg(short = 't', long)]
        tags: Option<String>,
    },
    /// Delete a memory by ID
    Delete {
        /// Memory ID
        id: i64,
    },
    /// Import memories from markdown files or a JSON export
    Import {
        /// Markdown file, directory of markdown files, or JSON export
        path: PathBuf,

        /// Treat PATH as a JSON export
        #[arg(long)]
        json: bool,
    },
    /// Export all memories to JSON
    Export {
        /// Output file
        output: PathBuf,
    },
    /// Show memory statistics
    Stats,
    /// Ask a question answered from your memories
    Chat {
        /// Question to answer
        question: String,

        /// Max memories to include as context
        #[arg(short = 'l', long, default_value = "10")]
        limit: usize,

        /// Anthropic model (default: chat_model from config)
        #[arg(short = 'm', long)]
        model: Option<String>,
    },
    /// Print version information
    Version,
}

/// Execute a CLI command.
pub fn execute(
    command: &Commands,
    store: &mut MemoryStore,
    config: &Config,
    json: bool,
) -> Result<ExitCode, Error> {
    match command {
        Commands::Add { text, tags } => {
            handle_add(store, text, parse_tags(tags.as_deref()).unwrap_or_default(), json)
        }
        Commands::Search {
            query,
            limit,
            tags,
            min_score,
        } => handle_search(
            store,
            SearchContext {
                query,
                limit: limit.unwrap_or(config.search_limit),
                tags: parse_tags(tags.as_deref()),
                min_score: min_score.unwrap_or(config.min_score),
            },
            json,
        ),
        Commands::List { limit, tags } => {
            handle_list(store, *limit, parse_tags(tags.as_deref()), json)
        }
        Commands::Get { id } => handle_get(store, *id, json),
        Commands::Update { id, text, tags } => handle_update(
            store,
            *id,
            text.as_deref(),
            parse_tags(tags.as_deref()),
            json,
        ),
        Commands::Delete { id } => handle_delete(store, *id, json),
        Commands::Import { path, json: is_json } => handle_import(store, path, *is_json, json),
        Commands::Export { output } => handle_export(store, output, json),
        Commands::Stats => handle_stats(store, json),
        Commands::Chat {
            question,
            limit,
            model,
        } => handle_chat(
            store,
            question,
            *limit,
            model.as_deref().unwrap_or(&config.chat_model),
            json,
        ),
        Commands::Version => Ok(handle_version(json)),
    }
}

/// Split a comma-separated tag argument, trimming each tag and dropping
/// empty ones.
fn parse_tags(raw: Option<&str>) -> Option<Vec<String>> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    })
}

fn handle_add(
    store: &mut MemoryStore,
    text: &str,
    tags: Vec<String>,
    json: bool,
) -> Result<ExitCode, Error> {
    let memory = store.add(text, &tags)?;
    if json {
        print_json(&AddResponse {
            status: "added",
            id: memory.id,
            tags: memory.tags,
        });
    } else {
        println!("Added memory #{}", memory.id);
        if !memory.tags.is_empty() {
            println!("  Tags: {}", memory.tags.join(", "));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_search(
    store: &mut MemoryStore,
    opts: SearchContext<'_>,
    json: bool,
) -> Result<ExitCode, Error> {
    let memories = store.search(opts.query, opts.limit, opts.tags.as_deref(), opts.min_score)?;
    if json {
        print_json(&SearchResponse {
            results: memories.into_iter().map(MemoryItem::from).collect(),
        });
        return Ok(ExitCode::SUCCESS);
    }

    if memories.is_empty() {
        println!("No matching memories found.");
        return Ok(ExitCode::SUCCESS);
    }
    println!("Found {} matches:\n", memories.len());
    for memory in memories {
        let mut header = format!(
            "#{} [score: {:.2}] {}",
            memory.id,
            memory.score.unwrap_or(0.0),
            memory.created_at.format("%Y-%m-%d %H:%M")
        );
        if !memory.tags.is_empty() {
            header.push_str(&format!(" [{}]", memory.tags.join(", ")));
        }
        println!("{}\n  {}\n", header, truncate(&memory.content, 200));
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_list(
    store: &mut MemoryStore,
    limit: usize,
    tags: Option<Vec<String>>,
    json: bool,
) -> Result<ExitCode, Error> {
    let memories = store.list(limit, tags.as_deref())?;
    let total = store.count()?;
    if json {
        print_json(&ListResponse {
            total,
            memories: memories.into_iter().map(MemoryItem::from).collect(),
        });
        return Ok(ExitCode::SUCCESS);
    }

    if memories.is_empty() {
        println!("No memories found.");
        return Ok(ExitCode::SUCCESS);
    }
    println!("Recent memories ({} total)", total);
    for memory in memories {
        println!(
            "{:>6}  {}  {:<60}  {}",
            memory.id,
            memory.created_at.format("%Y-%m-%d %H:%M"),
            truncate(&memory.content, 60),
            format_tags(&memory.tags)
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_get(store: &mut MemoryStore, id: i64, json: bool) -> Result<ExitCode, Error> {
    let memory = store.get(id)?.ok_or(Error::NotFound(id))?;
    if json {
        print_json(&MemoryItem::from(memory));
    } else {
        println!("ID: {}", memory.id);
        println!("Content: {}", memory.content);
        println!("Tags: {}", format_tags(&memory.tags));
        println!("Created: {}", memory.created_at.to_rfc3339());
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_update(
    store: &mut MemoryStore,
    id: i64,
    text: Option<&str>,
    tags: Option<Vec<String>>,
    json: bool,
) -> Result<ExitCode, Error> {
    if !store.update(id, text, tags.as_deref())? {
        return Err(Error::NotFound(id));
    }
    if json {
        print_json(&StatusResponse {
            status: "updated",
            id,
        });
    } else {
        println!("Updated memory #{}", id);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_delete(store: &mut MemoryStore, id: i64, json: bool) -> Result<ExitCode, Error> {
    if !store.delete(id)? {
        return Err(Error::NotFound(id));
    }
    if json {
        print_json(&StatusResponse {
            status: "deleted",
            id,
        });
    } else {
        println!("Deleted memory #{}", id);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_import(
    store: &mut MemoryStore,
    path: &Path,
    is_json: bool,
    json: bool,
) -> Result<ExitCode, Error> {
    let stats: ImportStats = if is_json {
        import_from_json(store, path)?
    } else {
        import_from_markdown(store, path)?
    };

    if json {
        print_json(&ImportResponse {
            status: "imported",
            files: stats.files,
            imported: stats.imported,
        });
    } else if is_json {
        println!("Imported {} memories from JSON", stats.imported);
    } else if stats.files == 0 {
        println!("No markdown files found.");
    } else if stats.imported == 0 {
        println!("No suitable content found to import.");
    } else {
        println!(
            "Imported {} memories from {} files",
            stats.imported, stats.files
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_export(store: &mut MemoryStore, output: &Path, json: bool) -> Result<ExitCode, Error> {
    let records = store.export()?;
    let body = serde_json::to_string_pretty(&records)?;
    std::fs::write(output, body)?;

    if json {
        print_json(&ExportResponse {
            status: "exported",
            exported: records.len(),
            path: output.display().to_string(),
        });
    } else {
        println!(
            "Exported {} memories to {}",
            records.len(),
            output.display()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_stats(store: &mut MemoryStore, json: bool) -> Result<ExitCode, Error> {
    let count = store.count()?;
    let size_bytes = std::fs::metadata(store.path())
        .map(|m| m.len())
        .unwrap_or(0);
    let size_kb = size_bytes as f64 / 1024.0;

    if json {
        print_json(&StatsResponse {
            memories: count,
            database: store.path().display().to_string(),
            size_kb,
        });
    } else {
        println!("Memories: {}", count);
        println!("Database: {}", store.path().display());
        println!("Size: {:.1} KB", size_kb);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_chat(
    store: &mut MemoryStore,
    question: &str,
    limit: usize,
    model: &str,
    json: bool,
) -> Result<ExitCode, Error> {
    let client = ChatClient::from_env(model)?;
    let memories = store.search(question, limit, None, CHAT_MIN_SCORE)?;
    if !json && !memories.is_empty() {
        eprintln!("Found {} relevant memories", memories.len());
    }

    let answer = client.ask(question, &memories)?;
    if json {
        print_json(&ChatResponse {
            model: client.model().to_string(),
            memories_used: memories.len(),
            answer,
        });
    } else {
        println!("{}", answer);
    }
    Ok(ExitCode::SUCCESS)
}

pub fn handle_version(json: bool) -> ExitCode {
    if json {
        print_json(&serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "name": env!("CARGO_PKG_NAME")
        }));
    } else {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags(None), None);
        assert_eq!(
            parse_tags(Some(" work, ideas ,,")),
            Some(vec!["work".to_string(), "ideas".to_string()])
        );
        assert_eq!(parse_tags(Some("")), Some(vec![]));
    }
}
