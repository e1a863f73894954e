//! Heartbeat service: periodic unattended agent check.
//!
//! Every `intervalMinutes` the configured prompt (plus the contents of the
//! checklist file in the shared root, when present) is sent to the agent.
//! A reply of exactly `HEARTBEAT_OK` is suppressed; anything else is handed
//! to the alert callback. Ticks outside `activeHours` are skipped.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Timelike;
use tokio::sync::Notify;
use tracing::{debug, error, info};

use crate::config::{active_hours_contains, HeartbeatConfig};

// ─────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────

/// Reply that means "nothing needs attention".
pub const HEARTBEAT_OK_TOKEN: &str = "HEARTBEAT_OK";

// ─────────────────────────────────────────────
// Callback types
// ─────────────────────────────────────────────

/// Callback invoked on each heartbeat tick.
///
/// Receives the full heartbeat prompt and returns the agent's response.
pub type OnHeartbeatFn = Arc<
    dyn Fn(String) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send>>
        + Send
        + Sync,
>;

/// Callback receiving a non-suppressed heartbeat response.
pub type OnAlertFn = Arc<dyn Fn(String) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Result of one heartbeat run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeartbeatOutcome {
    pub message: String,
    pub suppressed: bool,
}

impl HeartbeatOutcome {
    fn from_response(response: String) -> Self {
        let suppressed = response.trim() == HEARTBEAT_OK_TOKEN;
        Self {
            message: response,
            suppressed,
        }
    }
}

// ─────────────────────────────────────────────
// HeartbeatService
// ─────────────────────────────────────────────

pub struct HeartbeatService {
    config: HeartbeatConfig,
    /// Directory the checklist path is relative to.
    shared_root: PathBuf,
    on_heartbeat: OnHeartbeatFn,
    on_alert: Option<OnAlertFn>,
    shutdown: Arc<Notify>,
}

impl HeartbeatService {
    pub fn new(config: HeartbeatConfig, shared_root: PathBuf, on_heartbeat: OnHeartbeatFn) -> Self {
        Self {
            config,
            shared_root,
            on_heartbeat,
            on_alert: None,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Set where non-suppressed responses are delivered.
    pub fn set_on_alert(&mut self, callback: OnAlertFn) {
        self.on_alert = Some(callback);
    }

    fn checklist_path(&self) -> PathBuf {
        self.shared_root.join(&self.config.checklist_path)
    }

    /// The configured prompt, with the checklist appended when non-empty.
    pub fn build_prompt(&self) -> String {
        let checklist = std::fs::read_to_string(self.checklist_path()).unwrap_or_default();
        if checklist.is_empty() {
            self.config.prompt.clone()
        } else {
            format!("{}\n\nHEARTBEAT.md:\n{}", self.config.prompt, checklist)
        }
    }

    /// Run one heartbeat as if the local time were `minute_of_day`.
    ///
    /// Outside the active window the agent is not called and the outcome is
    /// an empty, suppressed message.
    pub async fn run_heartbeat(&self, minute_of_day: u32) -> anyhow::Result<HeartbeatOutcome> {
        if !active_hours_contains(self.config.active_hours.as_deref(), minute_of_day)? {
            debug!(minute_of_day, "heartbeat outside active hours");
            return Ok(HeartbeatOutcome {
                message: String::new(),
                suppressed: true,
            });
        }
        self.execute().await
    }

    /// Run one heartbeat immediately, ignoring the active window.
    pub async fn trigger_now(&self) -> anyhow::Result<HeartbeatOutcome> {
        self.execute().await
    }

    async fn execute(&self) -> anyhow::Result<HeartbeatOutcome> {
        let response = (self.on_heartbeat)(self.build_prompt()).await?;
        Ok(HeartbeatOutcome::from_response(response))
    }

    /// Start the heartbeat loop. Returns when `stop()` is called.
    pub async fn start(&self) -> anyhow::Result<()> {
        if !self.config.enabled {
            info!("heartbeat disabled");
            self.shutdown.notified().await;
            return Ok(());
        }

        let interval_s = self.config.interval_minutes.max(1) * 60;
        info!(interval_s, "heartbeat service started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(std::time::Duration::from_secs(interval_s)) => {
                    let now = chrono::Local::now();
                    self.tick(now.hour() * 60 + now.minute()).await;
                }
                _ = self.shutdown.notified() => {
                    info!("heartbeat service shutting down");
                    return Ok(());
                }
            }
        }
    }

    /// Stop the heartbeat loop.
    pub fn stop(&self) {
        info!("stopping heartbeat service");
        self.shutdown.notify_one();
    }

    async fn tick(&self, minute_of_day: u32) {
        match self.run_heartbeat(minute_of_day).await {
            Ok(outcome) if outcome.suppressed => {
                info!("heartbeat suppressed");
            }
            Ok(outcome) => {
                info!(length = outcome.message.len(), "heartbeat message");
                if let Some(ref alert) = self.on_alert {
                    alert(outcome.message).await;
                }
            }
            Err(e) => {
                error!(error = %e, "heartbeat execution failed");
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn replying(reply: &'static str) -> OnHeartbeatFn {
        Arc::new(move |_prompt| Box::pin(async move { Ok(reply.to_string()) }))
    }

    fn capturing(seen: Arc<Mutex<Vec<String>>>) -> OnHeartbeatFn {
        Arc::new(move |prompt| {
            let seen = seen.clone();
            Box::pin(async move {
                seen.lock().unwrap().push(prompt);
                Ok("OK".to_string())
            })
        })
    }

    fn config() -> HeartbeatConfig {
        HeartbeatConfig {
            enabled: true,
            interval_minutes: 30,
            active_hours: None,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_ok_is_suppressed() {
        let dir = tempfile::tempdir().unwrap();
        let service = HeartbeatService::new(config(), dir.path().to_path_buf(), replying(" HEARTBEAT_OK\n"));
        let outcome = service.run_heartbeat(600).await.unwrap();
        assert!(outcome.suppressed);
    }

    #[tokio::test]
    async fn test_other_reply_not_suppressed() {
        let dir = tempfile::tempdir().unwrap();
        let service =
            HeartbeatService::new(config(), dir.path().to_path_buf(), replying("HEARTBEAT_OK, but also X"));
        let outcome = service.run_heartbeat(600).await.unwrap();
        assert!(!outcome.suppressed);
        assert_eq!(outcome.message, "HEARTBEAT_OK, but also X");
    }

    #[tokio::test]
    async fn test_checklist_appended_to_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("HEARTBEAT.md"), "Check backlog").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let service = HeartbeatService::new(config(), dir.path().to_path_buf(), capturing(seen.clone()));

        service.run_heartbeat(600).await.unwrap();

        let prompts = seen.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with(&config().prompt));
        assert!(prompts[0].ends_with("\n\nHEARTBEAT.md:\nCheck backlog"));
    }

    #[test]
    fn test_prompt_without_checklist() {
        let dir = tempfile::tempdir().unwrap();
        let service = HeartbeatService::new(config(), dir.path().to_path_buf(), replying("x"));
        assert_eq!(service.build_prompt(), config().prompt);
    }

    #[tokio::test]
    async fn test_outside_active_hours_skips_agent() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let callback: OnHeartbeatFn = Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok("alert".to_string()) })
        });
        let cfg = HeartbeatConfig {
            active_hours: Some("09:00-17:00".into()),
            ..config()
        };
        let service = HeartbeatService::new(cfg, dir.path().to_path_buf(), callback);

        let outcome = service.run_heartbeat(20 * 60).await.unwrap();
        assert!(outcome.suppressed);
        assert_eq!(outcome.message, "");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let outcome = service.run_heartbeat(10 * 60).await.unwrap();
        assert!(!outcome.suppressed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_trigger_now_ignores_window() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = HeartbeatConfig {
            active_hours: Some("00:00-00:00".into()),
            ..config()
        };
        let service = HeartbeatService::new(cfg, dir.path().to_path_buf(), replying("ping"));
        assert_eq!(service.trigger_now().await.unwrap().message, "ping");
    }

    #[tokio::test]
    async fn test_tick_delivers_alert() {
        let dir = tempfile::tempdir().unwrap();
        let alerts = Arc::new(Mutex::new(Vec::new()));
        let sink = alerts.clone();
        let mut service = HeartbeatService::new(config(), dir.path().to_path_buf(), replying("disk almost full"));
        service.set_on_alert(Arc::new(move |msg| {
            let sink = sink.clone();
            Box::pin(async move {
                sink.lock().unwrap().push(msg);
            })
        }));

        service.tick(600).await;
        assert_eq!(*alerts.lock().unwrap(), vec!["disk almost full".to_string()]);
    }

    #[tokio::test]
    async fn test_tick_suppressed_sends_no_alert() {
        let dir = tempfile::tempdir().unwrap();
        let alerts = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = alerts.clone();
        let mut service = HeartbeatService::new(config(), dir.path().to_path_buf(), replying("HEARTBEAT_OK"));
        service.set_on_alert(Arc::new(move |msg| {
            let sink = sink.clone();
            Box::pin(async move {
                sink.lock().unwrap().push(msg);
            })
        }));

        service.tick(600).await;
        assert!(alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stop_exits_loop() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(HeartbeatService::new(config(), dir.path().to_path_buf(), replying("x")));

        let svc = service.clone();
        let handle = tokio::spawn(async move { svc.start().await });

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        service.stop();

        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_disabled_parks_until_stop() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = HeartbeatConfig {
            enabled: false,
            ..config()
        };
        let service = Arc::new(HeartbeatService::new(cfg, dir.path().to_path_buf(), replying("x")));

        let svc = service.clone();
        let handle = tokio::spawn(async move { svc.start().await });

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        service.stop();

        assert!(handle.await.unwrap().is_ok());
    }
}
