//! Bot service — the per-message pipeline around the agent.
//!
//! route → track → persist the user turn → agent → persist the reply.
//! Scheduled jobs and heartbeats reach the agent through [`BotService::agent_call`].

use std::sync::Mutex;

use anyhow::Result;
use tracing::{error, info};

use clawless_agent::Agent;
use clawless_core::config::AgentConfig;
use clawless_core::router::Router;
use clawless_core::session::{SessionState, TrackManager};
use clawless_core::types::{Message, Role};
use clawless_core::utils::truncate_string;

const TRACK_USAGE: &str =
    "Usage: /track list | /track set <name> | /track rename <old> <new> | /track archive <name>";

/// Longest text echoed into `recv`/`send` log events.
const LOG_PREVIEW_CHARS: usize = 200;

pub struct BotService {
    agent: Agent,
    tracks: TrackManager,
    router: Router,
    state: Mutex<SessionState>,
    history_limit: usize,
    default_track: String,
}

impl BotService {
    pub fn new(
        agent: Agent,
        tracks: TrackManager,
        router: Router,
        state: SessionState,
        config: &AgentConfig,
    ) -> Self {
        Self {
            agent,
            tracks,
            router,
            state: Mutex::new(state),
            history_limit: config.history_limit,
            default_track: config.default_track.clone(),
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn tracks(&self) -> &TrackManager {
        &self.tracks
    }

    /// Run `f` with the session pointers locked.
    fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> Result<R>) -> Result<R> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("session state lock poisoned"))?;
        f(&mut state)
    }

    /// Handle one inbound message and return the reply.
    ///
    /// Never fails: an error is logged and becomes `"Error: <msg>"`.
    pub async fn handle_message(&self, chat_id: &str, text: &str) -> String {
        info!(chat_id, text = %truncate_string(text, LOG_PREVIEW_CHARS), "recv");
        let reply = match self.process(chat_id, text).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(chat_id, error = %e, "error");
                format!("Error: {e}")
            }
        };
        info!(chat_id, text = %truncate_string(&reply, LOG_PREVIEW_CHARS), "send");
        reply
    }

    async fn process(&self, chat_id: &str, text: &str) -> Result<String> {
        let store = self.tracks.store().clone();
        self.with_state(|state| state.record_chat(&store, chat_id))?;

        let routed = self.router.route(text);
        if routed.text.starts_with("/track") {
            return self.track_command(&routed.text);
        }

        let track_name = match routed.track_name {
            Some(name) => name,
            None => self
                .with_state(|state| self.tracks.get_last_active(state))?
                .map(|t| t.name)
                .unwrap_or_else(|| self.default_track.clone()),
        };

        let track = self.tracks.get_or_create(&track_name)?;
        self.with_state(|state| self.tracks.mark_active(state, track.id))?;

        // Persist before the agent runs so a failing tool keeps the user turn.
        self.tracks.append_message(track.id, Role::User, &routed.text)?;
        let history = self.tracks.recent_messages(track.id, self.history_limit)?;

        let reply = self.agent.run(&track.summary, &history).await?;
        self.tracks.append_message(track.id, Role::Assistant, &reply)?;
        Ok(reply)
    }

    /// `/track list|set|rename|archive`.
    fn track_command(&self, text: &str) -> Result<String> {
        let parts: Vec<&str> = text.split_whitespace().collect();
        match parts.as_slice() {
            ["/track"] | ["/track", "list", ..] => {
                let tracks = self.tracks.list_tracks()?;
                if tracks.is_empty() {
                    return Ok("No tracks yet.".to_string());
                }
                let names: Vec<String> = tracks.into_iter().map(|t| t.name).collect();
                Ok(format!("Tracks: {}", names.join(", ")))
            }
            ["/track", "set", name, ..] => {
                let track = self.tracks.get_or_create(name)?;
                self.with_state(|state| self.tracks.mark_active(state, track.id))?;
                Ok(format!("Active track set to {name}."))
            }
            ["/track", "rename", old, new, ..] => match self.tracks.get_by_name(old)? {
                Some(track) => {
                    self.tracks.rename(track.id, new)?;
                    Ok(format!("Renamed {old} to {new}."))
                }
                None => Ok(format!("Track not found: {old}")),
            },
            ["/track", "archive", name, ..] => match self.tracks.get_by_name(name)? {
                Some(track) => {
                    self.tracks.archive(track.id)?;
                    Ok(format!("Archived track {name}."))
                }
                None => Ok(format!("Track not found: {name}")),
            },
            _ => Ok(TRACK_USAGE.to_string()),
        }
    }

    /// Run the agent on a standalone prompt (jobs, heartbeat).
    ///
    /// Only the prompt is sent; both turns are appended to the track afterwards.
    pub async fn agent_call(&self, prompt: &str, track_name: Option<&str>) -> Result<String> {
        let name = track_name
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.default_track);
        let track = self.tracks.get_or_create(name)?;
        self.with_state(|state| self.tracks.mark_active(state, track.id))?;

        let reply = self
            .agent
            .run(&track.summary, &[Message::user(prompt)])
            .await?;
        self.tracks.append_message(track.id, Role::User, prompt)?;
        self.tracks.append_message(track.id, Role::Assistant, &reply)?;
        Ok(reply)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
