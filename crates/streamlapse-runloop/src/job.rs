//! Cron jobs and the job set derived from a config snapshot.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone};
use cron::Schedule;
use tracing::{debug, warn};

use streamlapse_config::{normalize_cron, Config};

use crate::error::{RunLoopError, RunLoopResult};

/// ID of the housekeeping job.
pub const HOUSEKEEPING_JOB_ID: &str = "housekeeping";

/// ID of the heartbeat job.
pub const HEARTBEAT_JOB_ID: &str = "heartbeat";

/// What a job does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Capture,
    Housekeeping,
    Heartbeat,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Capture => write!(f, "capture"),
            JobKind::Housekeeping => write!(f, "housekeeping"),
            JobKind::Heartbeat => write!(f, "heartbeat"),
        }
    }
}

/// A parsed cron expression bound to a job. Immutable once built.
#[derive(Debug, Clone)]
pub struct CronJob {
    id: String,
    kind: JobKind,
    expression: String,
    schedule: Schedule,
}

impl CronJob {
    /// Parse `expression` (5 fields, or 6/7 with seconds).
    pub fn parse(id: impl Into<String>, kind: JobKind, expression: &str) -> RunLoopResult<Self> {
        let id = id.into();
        let schedule: Schedule =
            normalize_cron(expression)
                .parse()
                .map_err(|e: cron::error::Error| RunLoopError::InvalidCron {
                    id: id.clone(),
                    expression: expression.to_string(),
                    reason: e.to_string(),
                })?;
        Ok(Self {
            id,
            kind,
            expression: expression.to_string(),
            schedule,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Expression as configured.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First occurrence strictly after `after`, in `after`'s time zone.
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.schedule.after(after).next()
    }
}

/// Capture jobs in configured order, then the housekeeping and heartbeat jobs.
///
/// Every member parsed successfully; invalid entries never get in.
#[derive(Debug, Clone, Default)]
pub struct JobSet {
    captures: Vec<CronJob>,
    housekeeping: Option<CronJob>,
    heartbeat: Option<CronJob>,
}

impl JobSet {
    pub fn new(
        captures: Vec<CronJob>,
        housekeeping: Option<CronJob>,
        heartbeat: Option<CronJob>,
    ) -> Self {
        Self {
            captures,
            housekeeping,
            heartbeat,
        }
    }

    /// Build the job set for `config`, dropping and logging entries whose
    /// cron expression does not parse.
    pub fn from_config(config: &Config) -> Self {
        let captures = config
            .schedules
            .iter()
            .filter_map(|entry| keep_valid(CronJob::parse(&entry.id, JobKind::Capture, &entry.cron)))
            .collect();

        let housekeeping = keep_valid(CronJob::parse(
            HOUSEKEEPING_JOB_ID,
            JobKind::Housekeeping,
            &config.housekeeping.cron,
        ));

        let heartbeat = if config.daemon.heartbeat_cron.trim().is_empty() {
            None
        } else {
            keep_valid(CronJob::parse(
                HEARTBEAT_JOB_ID,
                JobKind::Heartbeat,
                &config.daemon.heartbeat_cron,
            ))
        };

        let set = Self::new(captures, housekeeping, heartbeat);
        debug!("Job set built with {} job(s)", set.len());
        set
    }

    /// Jobs in tie-break order.
    pub fn iter(&self) -> impl Iterator<Item = &CronJob> {
        self.captures
            .iter()
            .chain(self.housekeeping.iter())
            .chain(self.heartbeat.iter())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.iter().any(|job| job.id() == id)
    }

    /// Earliest occurrence strictly after `now` across all jobs.
    pub fn next_fire_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.iter().filter_map(|job| job.next_after(now)).min()
    }

    /// Jobs due at `now`, paired with the occurrence that made them due.
    ///
    /// A job is due when it has an occurrence in `(now - grace, now]`. Missed
    /// occurrences inside the window coalesce into the latest one. Several
    /// jobs can be due in the same firing.
    pub fn due_jobs<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        grace: Duration,
    ) -> Vec<(&CronJob, DateTime<Tz>)> {
        let window = TimeDelta::from_std(grace).unwrap_or_else(|_| TimeDelta::zero());
        self.due_since(&(now.clone() - window), now)
    }

    /// Every job with an occurrence in `(from, now]`, paired with the latest
    /// such occurrence.
    pub fn due_since<Tz: TimeZone>(
        &self,
        from: &DateTime<Tz>,
        now: &DateTime<Tz>,
    ) -> Vec<(&CronJob, DateTime<Tz>)> {
        self.iter()
            .filter_map(|job| {
                let occurrence = job
                    .schedule
                    .after(from)
                    .take_while(|at| at <= now)
                    .last()?;
                Some((job, occurrence))
            })
            .collect()
    }

    /// The next `count` occurrences of every job after `now`.
    pub fn upcoming<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        count: usize,
    ) -> Vec<(&CronJob, Vec<DateTime<Tz>>)> {
        self.iter()
            .map(|job| (job, job.schedule.after(now).take(count).collect()))
            .collect()
    }
}

fn keep_valid(parsed: RunLoopResult<CronJob>) -> Option<CronJob> {
    match parsed {
        Ok(job) => Some(job),
        Err(e) => {
            warn!("Dropping job: {}", e);
            None
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
