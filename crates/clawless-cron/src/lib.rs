//! Clawless Cron — scheduled agent prompts.
//!
//! - [`jobs`]: the `jobs` table and crontab spec parsing
//! - [`service`]: the timer loop that fires due jobs

pub mod jobs;
pub mod service;

pub use jobs::{parse_cron_spec, Job, JobPayload, JobStore};
pub use service::{OnJobFn, SchedulerService};
