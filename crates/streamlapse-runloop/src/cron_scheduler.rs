//! Single-deadline cron scheduler.
//!
//! One sleep covers every job: the scheduler keeps the earliest upcoming
//! occurrence across the job set, sleeps until it, dispatches whatever is due
//! and re-arms. Reloads and explicit re-arms wake the loop through a
//! [`Notify`] so the deadline is recomputed immediately.

use std::collections::HashMap;
use std::future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use streamlapse_config::Config;

use crate::job::{CronJob, JobSet};

/// Runs a job when it fires.
///
/// Called on its own task, so a slow or panicking job never blocks the
/// scheduler or other jobs.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn run_job(&self, job: CronJob, config: Arc<Config>, scheduled_for: DateTime<Local>);
}

struct ScheduleState {
    jobs: Arc<JobSet>,
    config: Arc<Config>,
    next_fire: Option<DateTime<Local>>,
    /// Last dispatched occurrence per job ID.
    dispatched: HashMap<String, DateTime<Local>>,
}

pub struct CronScheduler {
    state: Mutex<ScheduleState>,
    handler: Arc<dyn JobHandler>,
    rearmed: Notify,
}

impl CronScheduler {
    pub fn new(config: Arc<Config>, handler: Arc<dyn JobHandler>) -> Arc<Self> {
        let jobs = Arc::new(JobSet::from_config(&config));
        let scheduler = Arc::new(Self {
            state: Mutex::new(ScheduleState {
                jobs,
                config,
                next_fire: None,
                dispatched: HashMap::new(),
            }),
            handler,
            rearmed: Notify::new(),
        });
        scheduler.rearm_at(Local::now());
        scheduler
    }

    /// Config snapshot the current job set was built from.
    pub fn config(&self) -> Arc<Config> {
        self.state.lock().config.clone()
    }

    pub fn jobs(&self) -> Arc<JobSet> {
        self.state.lock().jobs.clone()
    }

    /// The single pending deadline, if any job has an upcoming occurrence.
    pub fn next_fire(&self) -> Option<DateTime<Local>> {
        self.state.lock().next_fire
    }

    /// Swap in a new config and its job set, then re-arm.
    ///
    /// Jobs already running keep the snapshot they started with.
    pub fn reload(&self, config: Arc<Config>) -> Option<DateTime<Local>> {
        let jobs = Arc::new(JobSet::from_config(&config));
        {
            let mut state = self.state.lock();
            state.dispatched.retain(|id, _| jobs.contains(id));
            state.jobs = jobs;
            state.config = config;
        }
        let next = self.rearm();
        info!(
            "Schedule reloaded with {} job(s), next fire {}",
            self.jobs().len(),
            describe(next)
        );
        next
    }

    /// Recompute the deadline from the wall clock and wake the run loop.
    pub fn rearm(&self) -> Option<DateTime<Local>> {
        self.rearm_at(Local::now())
    }

    pub fn rearm_at(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        let next = self.recompute(&now);
        self.rearmed.notify_one();
        next
    }

    fn recompute(&self, now: &DateTime<Local>) -> Option<DateTime<Local>> {
        let mut state = self.state.lock();
        state.next_fire = state.jobs.next_fire_after(now);
        debug!("Next fire: {}", describe(state.next_fire));
        state.next_fire
    }

    /// Dispatch every job due at `now`, then recompute the deadline.
    ///
    /// Returns the IDs of the dispatched jobs. An occurrence is dispatched at
    /// most once, however many times the loop wakes inside its grace window.
    /// A wake-up later than the grace window (suspend, stalled runtime) still
    /// dispatches the armed occurrence, coalesced with anything missed since
    /// into the latest occurrence per job.
    pub fn tick(&self, now: DateTime<Local>) -> Vec<String> {
        let (due, config, grace_start) = {
            let mut state = self.state.lock();
            let grace = TimeDelta::from_std(state.config.daemon.grace())
                .unwrap_or_else(|_| TimeDelta::zero());
            let grace_start = now - grace;
            let from = match state.next_fire {
                Some(armed) if armed <= now => grace_start.min(armed - TimeDelta::seconds(1)),
                _ => grace_start,
            };
            let jobs = state.jobs.clone();
            let mut due = Vec::new();
            for (job, occurrence) in jobs.due_since(&from, &now) {
                if matches!(state.dispatched.get(job.id()), Some(last) if occurrence <= *last) {
                    continue;
                }
                state.dispatched.insert(job.id().to_string(), occurrence);
                due.push((job.clone(), occurrence));
            }
            (due, state.config.clone(), grace_start)
        };

        let ids = due.iter().map(|(job, _)| job.id().to_string()).collect();
        for (job, occurrence) in due {
            if occurrence <= grace_start {
                warn!(
                    "Job {} missed its slot at {}, running late at {}",
                    job.id(),
                    occurrence.format("%Y-%m-%d %H:%M:%S"),
                    now.format("%Y-%m-%d %H:%M:%S")
                );
            }
            self.dispatch(job, config.clone(), occurrence);
        }
        self.recompute(&now);
        ids
    }

    fn dispatch(&self, job: CronJob, config: Arc<Config>, scheduled_for: DateTime<Local>) {
        debug!("Dispatching job {} ({}) for {}", job.id(), job.kind(), scheduled_for);
        let id = job.id().to_string();
        let handler = self.handler.clone();
        let run = tokio::spawn(async move {
            handler.run_job(job, config, scheduled_for).await;
        });
        tokio::spawn(async move {
            if let Err(e) = run.await {
                if e.is_panic() {
                    error!("Job {} panicked: {}", id, e);
                }
            }
        });
    }

    /// Run until `shutdown` is cancelled.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        info!("Scheduler started, next fire {}", describe(self.next_fire()));
        loop {
            let deadline = self.next_fire();
            let sleep = async {
                match deadline {
                    Some(at) => tokio::time::sleep(delay_until(at)).await,
                    None => future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = self.rearmed.notified() => continue,
                _ = sleep => {
                    self.tick(Local::now());
                }
            }
        }
        info!("Scheduler stopped");
    }
}

fn delay_until(at: DateTime<Local>) -> Duration {
    (at - Local::now()).to_std().unwrap_or(Duration::ZERO)
}

fn describe(at: Option<DateTime<Local>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "none".to_string())
}

#[cfg(test)]
#[path = "cron_scheduler_tests.rs"]
mod tests;
