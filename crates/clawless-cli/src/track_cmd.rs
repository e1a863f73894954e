//! `clawless track` — inspect and manage conversation tracks.
//!
//! - `clawless track list` — all tracks with their last activity
//! - `clawless track set <NAME>` — make a track the active one
//! - `clawless track rename <OLD> <NEW>`
//! - `clawless track archive <NAME>` — delete a track and its history
//! - `clawless track show <NAME> [-n N]` — recent messages

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;

use clawless_core::session::{SessionState, TrackManager};
use clawless_core::types::Role;

use crate::helpers::format_timestamp;

/// Track subcommands.
#[derive(Subcommand)]
pub enum TrackCommands {
    /// List tracks
    List,

    /// Make a track the active one (created if missing)
    Set {
        name: String,
    },

    /// Rename a track
    Rename {
        old: String,
        new: String,
    },

    /// Delete a track with its messages and memories (irreversible)
    Archive {
        name: String,
    },

    /// Show the most recent messages of a track
    Show {
        name: String,

        /// Number of messages
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
}

/// Dispatch a track subcommand.
pub fn dispatch(tracks: &TrackManager, cmd: TrackCommands) -> Result<()> {
    match cmd {
        TrackCommands::List => list_tracks(tracks),
        TrackCommands::Set { name } => {
            let mut state = SessionState::restore(tracks.store())?;
            let track = tracks.get_or_create(&name)?;
            tracks.mark_active(&mut state, track.id)?;
            println!("  {} Active track set to {}", "✓".green(), name.cyan());
            Ok(())
        }
        TrackCommands::Rename { old, new } => {
            let Some(track) = tracks.get_by_name(&old)? else {
                bail!("Track not found: {old}");
            };
            tracks.rename(track.id, &new)?;
            println!("  {} Renamed {} to {}", "✓".green(), old, new.cyan());
            Ok(())
        }
        TrackCommands::Archive { name } => {
            let Some(track) = tracks.get_by_name(&name)? else {
                bail!("Track not found: {name}");
            };
            tracks.archive(track.id)?;
            println!("  {} Archived track {}", "✓".green(), name);
            Ok(())
        }
        TrackCommands::Show { name, limit } => show_track(tracks, &name, limit),
    }
}

fn list_tracks(tracks: &TrackManager) -> Result<()> {
    let all = tracks.list_tracks()?;
    if all.is_empty() {
        println!("  No tracks yet.");
        return Ok(());
    }
    let state = SessionState::restore(tracks.store())?;

    println!();
    println!("  {:<3}{:<24} {:<18} {}", "", "Name".bold(), "Last active".bold(), "Summary".bold());
    println!("  {}", "─".repeat(70));
    for track in all {
        let marker = if state.last_track_id == Some(track.id) { "*" } else { "" };
        println!(
            "  {:<3}{:<24} {:<18} {}",
            marker.green(),
            track.name,
            format_timestamp(track.last_active),
            track.summary.dimmed()
        );
    }
    println!();
    Ok(())
}

fn show_track(tracks: &TrackManager, name: &str, limit: usize) -> Result<()> {
    let Some(track) = tracks.get_by_name(name)? else {
        bail!("Track not found: {name}");
    };
    let messages = tracks.recent_messages(track.id, limit)?;

    println!();
    println!("{}", format!("  Track {}", track.name).cyan().bold());
    if !track.summary.is_empty() {
        println!("  {}", track.summary.dimmed());
    }
    println!();
    for message in messages {
        let label = match message.role {
            Role::User => "you".green(),
            Role::Assistant => "bot".cyan(),
            Role::System => "sys".dimmed(),
        };
        println!("  {:>3}: {}", label, message.content);
    }
    println!();
    Ok(())
}
