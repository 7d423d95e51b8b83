//! Command handlers for CLI subcommands.

use std::fs;
use std::path::Path;

use devagent_core::{classify, find_mentions, AgentSettings, Mention};
use devagent_session::{AgentSession, RequestTicket};
use tracing::info;

use crate::cli::Commands;

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Execute a one-shot CLI command.
pub fn execute(command: Commands, settings: AgentSettings) -> Result<()> {
    match command {
        Commands::Ask { prompt, file } => {
            runtime()?.block_on(cmd_ask(settings, prompt.join(" "), file.as_deref()))
        }
        Commands::Upload { path, command } => {
            runtime()?.block_on(cmd_upload(settings, &path, command.join(" ")))
        }
        Commands::Mentions { path, pick } => {
            runtime()?.block_on(cmd_mentions(settings, &path, pick))
        }
        Commands::Classify { text } => {
            println!("{}", classify(&text.join(" ")));
            Ok(())
        }
        Commands::Repl => {
            // REPL is handled separately in main
            Ok(())
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Runtime::new()?)
}

async fn cmd_ask(settings: AgentSettings, prompt: String, file: Option<&Path>) -> Result<()> {
    let session = AgentSession::new(settings);

    if let Some(path) = file {
        let content = read_file(path)?;
        session
            .set_current_file(path.display().to_string(), content)
            .await;
    }

    info!(prompt = %prompt, "asking agent");
    print_reply(session.submit(prompt).await?).await
}

async fn cmd_upload(settings: AgentSettings, path: &Path, command: String) -> Result<()> {
    let content = read_file(path)?;
    let session = AgentSession::new(settings);

    let ticket = session
        .submit_upload(file_name(path), content, command)
        .await?;
    print_reply(ticket).await
}

async fn cmd_mentions(settings: AgentSettings, path: &Path, pick: Option<usize>) -> Result<()> {
    let content = read_file(path)?;
    let mentions = find_mentions(&content);

    let mention = match select_mention(&mentions, pick)? {
        Some(mention) => mention,
        None if mentions.is_empty() => {
            println!("No @dev-agent mentions found in {}", path.display());
            return Ok(());
        }
        None => {
            for line in format_mentions(&content, &mentions) {
                println!("{}", line);
            }
            println!();
            println!("Re-run with --pick <n> to run one.");
            return Ok(());
        }
    };

    let session = AgentSession::new(settings);
    let ticket = session
        .submit_mention(
            mention.command.clone(),
            content.clone(),
            path.display().to_string(),
        )
        .await?;
    print_reply(ticket).await
}

async fn print_reply(ticket: RequestTicket) -> Result<()> {
    let reply = ticket.wait().await?;
    println!("{}", reply);
    Ok(())
}

/// Choose the mention to run.
///
/// A single mention is picked automatically; with several, `pick` (numbered
/// from 1) is required. `Ok(None)` means there is nothing to run yet.
pub fn select_mention(mentions: &[Mention], pick: Option<usize>) -> Result<Option<&Mention>> {
    match pick {
        Some(n) => mentions
            .get(n.wrapping_sub(1))
            .map(Some)
            .ok_or_else(|| format!("No mention #{}; found {}", n, mentions.len()).into()),
        None if mentions.len() == 1 => Ok(mentions.first()),
        None => Ok(None),
    }
}

/// Numbered one-line summaries of `mentions`.
pub fn format_mentions(content: &str, mentions: &[Mention]) -> Vec<String> {
    mentions
        .iter()
        .enumerate()
        .map(|(i, m)| {
            format!(
                "  {}. {}  (line {})",
                i + 1,
                m.command,
                line_of(content, m.range.start)
            )
        })
        .collect()
}

/// 1-based line number of a byte offset.
pub fn line_of(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    content.as_bytes()[..offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// Read a text file, naming the path on failure.
pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| format!("Failed to read file {}: {}", path.display(), e).into())
}

/// Last path component, or the whole path if it has none.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
