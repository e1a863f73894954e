//! Interactive REPL — the terminal transport for the bot service.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! Every line goes through [`BotService::handle_message`] with chat id `cli`,
//! so `#track:<name>` and `/track ...` work exactly as on any other transport.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use crate::helpers;
use crate::service::BotService;

/// Chat id used for terminal input.
pub const CLI_CHAT_ID: &str = "cli";

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Run the interactive REPL loop until exit, Ctrl+C or Ctrl+D.
///
/// `initial_track`, when set, is selected before the first prompt.
pub async fn run(
    service: Arc<BotService>,
    history_path: PathBuf,
    initial_track: Option<&str>,
) -> Result<()> {
    helpers::print_banner();

    if let Some(track) = initial_track {
        let reply = service
            .handle_message(CLI_CHAT_ID, &format!("/track set {track}"))
            .await;
        println!("{}", reply);
    }

    let mut editor = create_editor(&history_path)?;

    loop {
        // Readline blocks; keep the scheduler and heartbeat tasks running.
        let input = match tokio::task::block_in_place(|| editor.readline("You: ")) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            println!("\nGoodbye!");
            break;
        }

        let _ = editor.add_history_entry(&input);

        debug!(input = trimmed, "processing input");
        helpers::print_thinking();
        let reply = service.handle_message(CLI_CHAT_ID, trimmed).await;
        helpers::clear_thinking();
        helpers::print_response(&reply);
    }

    save_history(&mut editor, &history_path);
    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor(history_path: &Path) -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    if history_path.exists() {
        let _ = editor.load_history(history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>, path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(path) {
        debug!("failed to save history: {e}");
    }
}

/// REPL history file inside the config root.
pub fn history_path(config_root: &Path) -> PathBuf {
    config_root.join("history").join("cli_history")
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
