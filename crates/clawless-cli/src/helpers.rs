//! Shared CLI helpers — response printing, banner, timestamps.

use chrono::{Local, TimeZone};
use colored::Colorize;

/// Print an agent response to stdout.
pub fn print_response(response: &str) {
    println!();
    println!("{}", "Clawless".cyan().bold());
    if response.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{response}");
    }
    println!();
}

/// Print output that did not come from the user's own turn (jobs, heartbeat).
pub fn print_notice(source: &str, text: &str) {
    println!();
    println!("{}", format!("[{source}]").yellow().bold());
    println!("{text}");
    println!();
}

/// Print the banner shown at REPL start.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "Clawless".cyan().bold(), version.dimmed());
    println!(
        "{}",
        "Type a message (add #track:<name> to switch tracks), or \"exit\" to quit.".dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder.
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

/// Format a Unix timestamp (seconds) as a local datetime string.
pub fn format_timestamp(secs: i64) -> String {
    match Local.timestamp_opt(secs, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        _ => "—".to_string(),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
