//! Clawless CLI — entry point.
//!
//! # Commands
//!
//! - `clawless onboard` — initialize config root, path roots and templates
//! - `clawless chat [-m MESSAGE] [-t TRACK]` — single-shot or REPL chat
//! - `clawless serve` — REPL plus scheduler plus heartbeat
//! - `clawless track ...` — manage tracks
//! - `clawless job ...` — manage scheduled prompts
//! - `clawless tools` — list registered tools
//! - `clawless heartbeat` — run one heartbeat now

mod helpers;
mod job_cmd;
mod logging;
mod onboard;
mod repl;
mod runtime;
mod service;
mod track_cmd;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{error, info};

use clawless_core::config::load_config;
use clawless_core::heartbeat::{HeartbeatService, OnAlertFn, OnHeartbeatFn};
use clawless_cron::{Job, OnJobFn, SchedulerService};

use crate::repl::CLI_CHAT_ID;
use crate::runtime::Runtime;
use crate::service::BotService;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Clawless — a tool-augmented assistant with persistent conversation tracks
#[derive(Parser)]
#[command(name = "clawless", version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration, path roots and templates
    Onboard,

    /// Chat with the agent (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Track to talk in
        #[arg(short, long)]
        track: Option<String>,
    },

    /// Run the REPL together with the scheduler and the heartbeat
    Serve,

    /// Manage conversation tracks
    Track {
        #[command(subcommand)]
        action: track_cmd::TrackCommands,
    },

    /// Manage scheduled prompts
    Job {
        #[command(subcommand)]
        action: job_cmd::JobCommands,
    },

    /// List the registered tools
    Tools,

    /// Run one heartbeat now, ignoring active hours
    Heartbeat,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Onboard = cli.command {
        logging::init_logging(cli.verbose, None);
        return onboard::run();
    }

    let config = load_config(None);
    let session_log = matches!(
        cli.command,
        Commands::Chat { .. } | Commands::Serve | Commands::Heartbeat
    );
    let shared_root = config.paths.shared_root();
    let _guard = logging::init_logging(cli.verbose, session_log.then_some(shared_root.as_path()));
    let runtime = Runtime::from_config(config)?;

    match cli.command {
        Commands::Onboard => Ok(()),
        Commands::Chat { message, track } => run_chat(&runtime, message, track).await,
        Commands::Serve => run_serve(&runtime).await,
        Commands::Track { action } => track_cmd::dispatch(&runtime.tracks(), action),
        Commands::Job { action } => job_cmd::dispatch(&runtime.jobs(), action),
        Commands::Tools => list_tools(&runtime).await,
        Commands::Heartbeat => run_heartbeat(&runtime).await,
    }
}

// ─────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────

async fn run_chat(runtime: &Runtime, message: Option<String>, track: Option<String>) -> Result<()> {
    let service = Arc::new(runtime.bot_service().await?);

    match message {
        Some(msg) => {
            if let Some(ref track) = track {
                service
                    .handle_message(CLI_CHAT_ID, &format!("/track set {track}"))
                    .await;
            }
            info!("processing single message");
            let reply = service.handle_message(CLI_CHAT_ID, &msg).await;
            helpers::print_response(&reply);
            Ok(())
        }
        None => {
            let history = repl::history_path(&runtime.config.paths.config_root());
            repl::run(service, history, track.as_deref()).await
        }
    }
}

// ─────────────────────────────────────────────
// Serve
// ─────────────────────────────────────────────

fn heartbeat_service(runtime: &Runtime, service: Arc<BotService>) -> HeartbeatService {
    let on_heartbeat: OnHeartbeatFn = Arc::new(move |prompt| {
        let service = service.clone();
        Box::pin(async move { service.agent_call(&prompt, Some("default")).await })
    });
    HeartbeatService::new(
        runtime.config.heartbeat.clone(),
        runtime.config.paths.shared_root(),
        on_heartbeat,
    )
}

async fn run_serve(runtime: &Runtime) -> Result<()> {
    let service = Arc::new(runtime.bot_service().await?);

    let on_job: OnJobFn = {
        let service = service.clone();
        Arc::new(move |job: Job| {
            let service = service.clone();
            Box::pin(async move {
                let reply = service
                    .agent_call(&job.payload.prompt, job.payload.track_name.as_deref())
                    .await?;
                helpers::print_notice(&format!("job {}", job.id), &reply);
                Ok(reply)
            })
        })
    };
    let scheduler = Arc::new(SchedulerService::new(runtime.jobs(), on_job));

    let mut heartbeat = heartbeat_service(runtime, service.clone());
    let on_alert: OnAlertFn = Arc::new(|message| {
        Box::pin(async move { helpers::print_notice("heartbeat", &message) })
    });
    heartbeat.set_on_alert(on_alert);
    let heartbeat = Arc::new(heartbeat);

    let jobs = runtime.jobs().list()?;
    println!();
    println!("  Tools:     {}", service.agent().tools().len());
    println!(
        "  Jobs:      {} ({} enabled)",
        jobs.len(),
        jobs.iter().filter(|j| j.enabled).count()
    );
    if runtime.config.heartbeat.enabled {
        println!("  Heartbeat: every {}m", runtime.config.heartbeat.interval_minutes.max(1));
    } else {
        println!("  Heartbeat: disabled");
    }
    info!(tools = service.agent().tools().len(), jobs = jobs.len(), "serve starting");

    let scheduler_task = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.start().await })
    };
    let heartbeat_task = {
        let heartbeat = heartbeat.clone();
        tokio::spawn(async move { heartbeat.start().await })
    };

    let history = repl::history_path(&runtime.config.paths.config_root());
    let result = repl::run(service, history, None).await;

    info!("shutting down");
    scheduler.stop();
    heartbeat.stop();
    for (name, task) in [("scheduler", scheduler_task), ("heartbeat", heartbeat_task)] {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(service = name, error = %e, "service error"),
            Err(e) => error!(service = name, error = %e, "service task panicked"),
        }
    }
    result
}

// ─────────────────────────────────────────────
// Tools / heartbeat
// ─────────────────────────────────────────────

async fn list_tools(runtime: &Runtime) -> Result<()> {
    let registry = runtime.tools().await;
    println!();
    for tool in registry.list() {
        println!("  {:<32} {}", tool.name().cyan(), tool.description());
    }
    println!();
    println!("  {} tools", registry.len());
    Ok(())
}

async fn run_heartbeat(runtime: &Runtime) -> Result<()> {
    let service = Arc::new(runtime.bot_service().await?);
    let heartbeat = heartbeat_service(runtime, service);
    let outcome = heartbeat.trigger_now().await?;
    if outcome.suppressed {
        info!("heartbeat suppressed");
        println!("  {} nothing needs attention", "✓".green());
    } else {
        info!(length = outcome.message.len(), "heartbeat message");
        helpers::print_notice("heartbeat", &outcome.message);
    }
    Ok(())
}
