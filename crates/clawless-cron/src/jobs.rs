//! Job persistence: the `jobs` table and crontab spec handling.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use cron::Schedule;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use clawless_core::store::Store;

// ─────────────────────────────────────────────
// Crontab specs
// ─────────────────────────────────────────────

const DAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Parse a 5-field crontab expression (`min hour dom month dow`).
///
/// Day-of-week numbers follow crontab (`0` and `7` are Sunday) and are
/// rewritten to day names before handing the spec to the `cron` crate,
/// which counts from Sunday = 1 and wants a leading seconds field.
pub fn parse_cron_spec(spec: &str) -> Result<Schedule> {
    let fields: Vec<&str> = spec.split_whitespace().collect();
    if fields.len() != 5 {
        bail!("cron spec must have 5 fields, got {}: {:?}", fields.len(), spec);
    }
    let dow = crontab_day_of_week(fields[4])?;
    let expr = format!("0 {} {} {} {} {}", fields[0], fields[1], fields[2], fields[3], dow);
    Schedule::from_str(&expr).with_context(|| format!("invalid cron spec: {:?}", spec))
}

fn crontab_day_of_week(field: &str) -> Result<String> {
    let items = field
        .split(',')
        .map(|item| {
            let (base, step) = match item.split_once('/') {
                Some((base, step)) => (base, Some(step)),
                None => (item, None),
            };
            if let Some(days) = expand_range_to_sunday(base, step)? {
                return Ok(days);
            }
            let base = base
                .split('-')
                .map(day_name)
                .collect::<Result<Vec<_>>>()?
                .join("-");
            Ok(match step {
                Some(step) => format!("{}/{}", base, step),
                None => base,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(items.join(","))
}

/// `N-7` ends on Sunday, which the `cron` crate would read as a descending
/// range, so it is spelled out as a list of day names.
fn expand_range_to_sunday(base: &str, step: Option<&str>) -> Result<Option<String>> {
    let Some((lo, hi)) = base.split_once('-') else {
        return Ok(None);
    };
    let (Ok(lo), Ok(7)) = (lo.parse::<usize>(), hi.parse::<usize>()) else {
        return Ok(None);
    };
    if lo > 7 {
        bail!("day of week out of range: {}", lo);
    }
    let step = match step {
        Some(step) => step
            .parse::<usize>()
            .ok()
            .filter(|s| *s > 0)
            .with_context(|| format!("invalid day-of-week step: {:?}", step))?,
        None => 1,
    };

    let mut days: Vec<&str> = Vec::new();
    for n in (lo..=7).step_by(step) {
        let day = DAY_NAMES[n % 7];
        if !days.contains(&day) {
            days.push(day);
        }
    }
    Ok(Some(days.join(",")))
}

fn day_name(token: &str) -> Result<String> {
    match token.parse::<usize>() {
        Ok(n) if n <= 7 => Ok(DAY_NAMES[n % 7].to_string()),
        Ok(n) => bail!("day of week out of range: {}", n),
        Err(_) => Ok(token.to_string()),
    }
}

// ─────────────────────────────────────────────
// Job
// ─────────────────────────────────────────────

/// What a job does when it fires.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPayload {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_name: Option<String>,
}

/// One row of the `jobs` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    pub id: i64,
    pub cron_spec: String,
    pub payload: JobPayload,
    pub enabled: bool,
}

impl Job {
    /// The parsed schedule for this job's spec.
    pub fn schedule(&self) -> Result<Schedule> {
        parse_cron_spec(&self.cron_spec)
    }
}

type RawJob = (i64, String, String, bool);

fn raw_from_row(row: &Row<'_>) -> rusqlite::Result<RawJob> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn decode((id, cron_spec, payload, enabled): RawJob) -> Result<Job> {
    let payload = serde_json::from_str(&payload)
        .with_context(|| format!("job {} has a malformed payload", id))?;
    Ok(Job {
        id,
        cron_spec,
        payload,
        enabled,
    })
}

// ─────────────────────────────────────────────
// JobStore
// ─────────────────────────────────────────────

/// Owns the `jobs` table.
#[derive(Clone, Debug)]
pub struct JobStore {
    store: Arc<Store>,
}

impl JobStore {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// All jobs by id. Rows with a malformed payload are skipped.
    pub fn list(&self) -> Result<Vec<Job>> {
        let raw = {
            let conn = self.store.conn()?;
            let mut stmt =
                conn.prepare("SELECT id, cron_spec, payload, enabled FROM jobs ORDER BY id")?;
            let rows = stmt
                .query_map([], raw_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let mut jobs = Vec::with_capacity(raw.len());
        for row in raw {
            match decode(row) {
                Ok(job) => jobs.push(job),
                Err(e) => warn!(error = %e, "skipping job"),
            }
        }
        Ok(jobs)
    }

    pub fn get(&self, id: i64) -> Result<Option<Job>> {
        let raw = {
            let conn = self.store.conn()?;
            conn.query_row(
                "SELECT id, cron_spec, payload, enabled FROM jobs WHERE id = ?1",
                params![id],
                raw_from_row,
            )
            .optional()?
        };
        raw.map(decode).transpose()
    }

    /// Validate and insert a job. Returns the new id.
    pub fn add(&self, cron_spec: &str, payload: &JobPayload) -> Result<i64> {
        parse_cron_spec(cron_spec)?;
        if payload.prompt.trim().is_empty() {
            bail!("job prompt must not be empty");
        }
        let spec = cron_spec.split_whitespace().collect::<Vec<_>>().join(" ");
        let payload_json = serde_json::to_string(payload)?;

        let conn = self.store.conn()?;
        conn.execute(
            "INSERT INTO jobs (cron_spec, payload, enabled) VALUES (?1, ?2, 1)",
            params![spec, payload_json],
        )?;
        let id = conn.last_insert_rowid();
        info!(id, spec = %spec, "added job");
        Ok(id)
    }

    /// Returns whether a row was deleted.
    pub fn remove(&self, id: i64) -> Result<bool> {
        let conn = self.store.conn()?;
        let removed = conn.execute("DELETE FROM jobs WHERE id = ?1", params![id])? > 0;
        if removed {
            info!(id, "removed job");
        }
        Ok(removed)
    }

    /// Returns whether the job exists.
    pub fn set_enabled(&self, id: i64, enabled: bool) -> Result<bool> {
        let conn = self.store.conn()?;
        let updated =
            conn.execute("UPDATE jobs SET enabled = ?1 WHERE id = ?2", params![enabled, id])?;
        Ok(updated > 0)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
