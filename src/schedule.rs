//! Cron-driven job table polled by the run loop.
//!
//! The scheduler owns every `(schedule, job)` pair and the next trigger time
//! of each. It never sleeps or spawns anything itself: the caller passes the
//! current time to [`Scheduler::due`] and runs whatever comes back.

use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use cron::Schedule;
use tracing::{debug, error, info};

use crate::error::{Result, StockError};
use crate::pass::PassOutcome;
use crate::report::ReportFlavor;

struct ScheduledJob<Z: TimeZone> {
    job: ReportFlavor,
    expression: String,
    schedule: Schedule,
    next: Option<DateTime<Z>>,
}

/// Trigger table for the recurring passes.
pub struct Scheduler<Z: TimeZone> {
    jobs: Vec<ScheduledJob<Z>>,
}

impl<Z: TimeZone> Default for Scheduler<Z> {
    fn default() -> Self {
        Self { jobs: Vec::new() }
    }
}

impl<Z: TimeZone> Scheduler<Z> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `job` to run on the cron `expression` (seconds field
    /// included), first firing strictly after `now`.
    pub fn add(&mut self, expression: &str, job: ReportFlavor, now: &DateTime<Z>) -> Result<()> {
        let schedule = Schedule::from_str(expression).map_err(|error| StockError::Schedule {
            expression: expression.to_string(),
            message: error.to_string(),
        })?;
        let next = schedule.after(now).next();
        info!(job = %job, schedule = expression, "job scheduled");
        self.jobs.push(ScheduledJob {
            job,
            expression: expression.to_string(),
            schedule,
            next,
        });
        Ok(())
    }

    /// Jobs whose trigger time has passed, in registration order. Each
    /// returned job is rescheduled to its first trigger after `now`, so a
    /// job fires at most once per call even if several triggers were missed.
    pub fn due(&mut self, now: &DateTime<Z>) -> Vec<ReportFlavor> {
        let mut fired = Vec::new();
        for entry in &mut self.jobs {
            let is_due = entry.next.as_ref().is_some_and(|next| next <= now);
            if is_due {
                fired.push(entry.job);
                entry.next = entry.schedule.after(now).next();
                debug!(job = %entry.job, schedule = %entry.expression, "job due");
            }
        }
        fired
    }

    /// Runs every job that is due at `now` through `run`, one after the
    /// other. A failed pass is logged and does not stop the jobs after it;
    /// the failed job waits for its next trigger like any other.
    pub fn run_due<F>(
        &mut self,
        now: &DateTime<Z>,
        mut run: F,
    ) -> Vec<(ReportFlavor, Result<PassOutcome>)>
    where
        F: FnMut(ReportFlavor) -> Result<PassOutcome>,
    {
        self.due(now)
            .into_iter()
            .map(|job| {
                let result = run(job);
                match &result {
                    Ok(outcome) => info!(report = %job, %outcome, "pass finished"),
                    Err(fault) if fault.is_transport() => {
                        error!(report = %job, error = %fault, "pass failed: transport fault")
                    }
                    Err(fault) => error!(report = %job, error = %fault, "pass failed"),
                }
                (job, result)
            })
            .collect()
    }

    /// Earliest pending trigger across all jobs.
    pub fn next_trigger(&self) -> Option<DateTime<Z>> {
        self.jobs
            .iter()
            .filter_map(|entry| entry.next.clone())
            .min()
    }

    /// The next `count` trigger times of every job after `now`.
    pub fn upcoming(&self, now: &DateTime<Z>, count: usize) -> Vec<(ReportFlavor, DateTime<Z>)> {
        let mut upcoming: Vec<(ReportFlavor, DateTime<Z>)> = self
            .jobs
            .iter()
            .flat_map(|entry| {
                entry
                    .schedule
                    .after(now)
                    .take(count)
                    .map(move |time| (entry.job, time))
            })
            .collect();
        upcoming.sort_by(|lhs, rhs| lhs.1.cmp(&rhs.1));
        upcoming
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
