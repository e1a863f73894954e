//! `clawless job` — manage scheduled prompts from the CLI.
//!
//! - `clawless job list` — list jobs with their next run
//! - `clawless job add --cron EXPR --prompt TEXT [--track NAME]` — add a job
//! - `clawless job remove <ID>` — remove a job
//! - `clawless job enable <ID> [--disable]` — enable/disable a job
//!
//! A running `clawless serve` picks changes up on its next reload.

use anyhow::Result;
use chrono::Local;
use clap::Subcommand;
use colored::Colorize;

use clawless_cron::{Job, JobPayload, JobStore};

// ─────────────────────────────────────────────
// Subcommand enum
// ─────────────────────────────────────────────

/// Job subcommands.
#[derive(Subcommand)]
pub enum JobCommands {
    /// List scheduled jobs
    List,

    /// Add a new scheduled job
    Add {
        /// Crontab expression, e.g. "0 9 * * 1-5"
        #[arg(short, long)]
        cron: String,

        /// Prompt sent to the agent when the job fires
        #[arg(short, long)]
        prompt: String,

        /// Track the prompt and reply are recorded in
        #[arg(short, long)]
        track: Option<String>,
    },

    /// Remove a scheduled job by ID
    Remove {
        job_id: i64,
    },

    /// Enable or disable a job
    Enable {
        job_id: i64,

        /// Disable instead of enable
        #[arg(long, default_value_t = false)]
        disable: bool,
    },
}

// ─────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────

/// Dispatch a job subcommand.
pub fn dispatch(jobs: &JobStore, cmd: JobCommands) -> Result<()> {
    match cmd {
        JobCommands::List => list_jobs(jobs),
        JobCommands::Add { cron, prompt, track } => {
            let payload = JobPayload {
                prompt,
                track_name: track,
            };
            let id = jobs.add(&cron, &payload)?;
            println!("  {} Added job {}", "✓".green(), id.to_string().cyan());
            Ok(())
        }
        JobCommands::Remove { job_id } => {
            if jobs.remove(job_id)? {
                println!("  {} Removed job {}", "✓".green(), job_id.to_string().cyan());
            } else {
                println!("  {} Job {} not found", "✗".red(), job_id);
            }
            Ok(())
        }
        JobCommands::Enable { job_id, disable } => {
            if jobs.set_enabled(job_id, !disable)? {
                let label = if disable { "Disabled" } else { "Enabled" };
                println!("  {} {} job {}", "✓".green(), label, job_id.to_string().cyan());
            } else {
                println!("  {} Job {} not found", "✗".red(), job_id);
            }
            Ok(())
        }
    }
}

/// Next fire time in local time, or "—" when disabled or unschedulable.
fn next_run(job: &Job) -> String {
    if !job.enabled {
        return "—".to_string();
    }
    job.schedule()
        .ok()
        .and_then(|s| s.upcoming(Local).next())
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "—".to_string())
}

fn list_jobs(jobs: &JobStore) -> Result<()> {
    let all = jobs.list()?;
    if all.is_empty() {
        println!("  No scheduled jobs.");
        return Ok(());
    }

    println!();
    println!("{}", "  Scheduled Jobs".cyan().bold());
    println!();
    println!(
        "  {:<5} {:<16} {:<10} {:<10} {:<18} {}",
        "ID".bold(),
        "Schedule".bold(),
        "Track".bold(),
        "Status".bold(),
        "Next Run".bold(),
        "Prompt".bold(),
    );
    println!("  {}", "─".repeat(80));

    for job in &all {
        let status = if job.enabled {
            "enabled".green().to_string()
        } else {
            "disabled".dimmed().to_string()
        };
        println!(
            "  {:<5} {:<16} {:<10} {:<10} {:<18} {}",
            job.id,
            job.cron_spec,
            job.payload.track_name.as_deref().unwrap_or("default"),
            status,
            next_run(job),
            job.payload.prompt
        );
    }
    println!();
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
