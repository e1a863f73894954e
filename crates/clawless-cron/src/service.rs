//! Scheduler service — runs rows of the `jobs` table on their crontab specs.
//!
//! The loop sleeps until the earliest next fire among enabled jobs, runs the
//! ones that came due through the `on_job` callback, and reloads the table
//! on every wake. Sleeps are capped at [`RELOAD_INTERVAL_S`] so edits made by
//! another process (e.g. `clawless job add`) are picked up.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use cron::Schedule;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::jobs::{Job, JobStore};

/// Upper bound on one sleep of the timer loop.
pub const RELOAD_INTERVAL_S: u64 = 60;

// ─────────────────────────────────────────────
// Job callback type
// ─────────────────────────────────────────────

/// Callback invoked when a job fires. Returns the agent's reply.
pub type OnJobFn =
    Arc<dyn Fn(Job) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send>> + Send + Sync>;

/// An enabled job with its parsed schedule.
#[derive(Clone, Debug)]
struct ScheduledJob {
    job: Job,
    schedule: Schedule,
}

/// Earliest fire time strictly after `since`.
fn next_fire<Tz: TimeZone>(jobs: &[ScheduledJob], since: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    jobs.iter()
        .filter_map(|j| j.schedule.after(since).next())
        .min()
}

/// Jobs with a fire time in `(since, now]`.
fn due_jobs<Tz: TimeZone>(
    jobs: &[ScheduledJob],
    since: &DateTime<Tz>,
    now: &DateTime<Tz>,
) -> Vec<Job> {
    jobs.iter()
        .filter(|j| j.schedule.after(since).next().is_some_and(|t| t <= *now))
        .map(|j| j.job.clone())
        .collect()
}

// ─────────────────────────────────────────────
// SchedulerService
// ─────────────────────────────────────────────

pub struct SchedulerService {
    jobs: JobStore,
    on_job: OnJobFn,
    /// Shutdown signal.
    shutdown: Arc<Notify>,
    /// Re-arm signal (jobs added or modified in this process).
    rearm: Arc<Notify>,
}

impl SchedulerService {
    pub fn new(jobs: JobStore, on_job: OnJobFn) -> Self {
        Self {
            jobs,
            on_job,
            shutdown: Arc::new(Notify::new()),
            rearm: Arc::new(Notify::new()),
        }
    }

    /// Reload the table and recompute the next wake-up.
    pub fn rearm(&self) {
        self.rearm.notify_one();
    }

    /// Stop the scheduler.
    pub fn stop(&self) {
        info!("stopping scheduler");
        self.shutdown.notify_one();
    }

    /// Enabled jobs with a valid spec.
    fn load(&self) -> Vec<ScheduledJob> {
        let jobs = match self.jobs.list() {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(error = %e, "failed to load jobs");
                return Vec::new();
            }
        };
        jobs.into_iter()
            .filter(|job| job.enabled)
            .filter_map(|job| match job.schedule() {
                Ok(schedule) => Some(ScheduledJob { job, schedule }),
                Err(e) => {
                    warn!(id = job.id, error = %e, "skipping job with invalid spec");
                    None
                }
            })
            .collect()
    }

    /// Start the scheduler loop. Returns when `stop()` is called.
    pub async fn start(&self) -> anyhow::Result<()> {
        info!("scheduler started");
        let mut since = Local::now();

        loop {
            let jobs = self.load();
            let cap = Duration::from_secs(RELOAD_INTERVAL_S);
            let delay = next_fire(&jobs, &since)
                .map(|t| (t - Local::now()).to_std().unwrap_or(Duration::ZERO))
                .map_or(cap, |d| d.min(cap));

            debug!(jobs = jobs.len(), sleep_ms = delay.as_millis() as u64, "scheduler armed");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let now = Local::now();
                    let due = due_jobs(&jobs, &since, &now);
                    since = now;
                    for job in due {
                        self.run_job(job).await;
                    }
                }
                _ = self.rearm.notified() => {
                    debug!("scheduler re-armed");
                }
                _ = self.shutdown.notified() => {
                    info!("scheduler shutting down");
                    return Ok(());
                }
            }
        }
    }

    async fn run_job(&self, job: Job) {
        let id = job.id;
        info!(id, spec = %job.cron_spec, "running job");
        match (self.on_job)(job).await {
            Ok(reply) => info!(id, length = reply.len(), "job finished"),
            Err(e) => error!(id, error = %e, "job failed"),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
