//! # Scheduler
//!
//! Drives a [`CycleRunner`] on a cron schedule. At most one job exists per
//! scheduler; starting a new one stops the old one first.
//!
//! ## Tick Semantics
//!
//! - Cycles never overlap. A tick that comes due while a cycle is still in
//!   flight is skipped and counted, including when the in-flight cycle
//!   belongs to a job that has since been replaced.
//! - A tick that errors or panics is counted as failed and logged. The timer
//!   keeps running.
//! - [`Scheduler::stop`] cancels future ticks only. An in-flight cycle
//!   finishes in the background. A tick is dispatched only while its job is
//!   still the current one, so no cycle starts after `stop` or `start`
//!   returns on behalf of a replaced job.
//! - Timers run on Tokio's clock. Each job pins the wall-clock time it was
//!   started at to a Tokio [`Instant`], and cron instants are mapped onto
//!   that timeline.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use xca_core::NetworkName;

use crate::cron::CronSchedule;
use crate::error::SchedulerError;
use crate::orchestrator::{CrossChainAnchoringResult, CycleRunner};

/// What a job anchors and how often.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub network_a: NetworkName,
    pub network_b: NetworkName,
    pub interval: CronSchedule,
}

/// How a tick ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOutcome {
    /// Both legs landed.
    Succeeded,
    /// One leg landed.
    PartialFailure,
    /// No leg landed, the cycle could not start, or it panicked.
    Failed,
}

impl TickOutcome {
    fn of(result: &CrossChainAnchoringResult) -> Self {
        match result.successful_legs() {
            2 => Self::Succeeded,
            0 => Self::Failed,
            _ => Self::PartialFailure,
        }
    }
}

/// Tick counters, shared by every job of one scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickCounters {
    /// Ticks ending in `succeeded` or `partial_failure`.
    pub completed: u64,
    /// Ticks ending in `failed`.
    pub failed: u64,
    /// Ticks dropped because a cycle was still in flight.
    pub skipped: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<TickOutcome>,
}

impl TickCounters {
    fn record(&mut self, outcome: TickOutcome, at: DateTime<Utc>) {
        match outcome {
            TickOutcome::Failed => self.failed += 1,
            TickOutcome::Succeeded | TickOutcome::PartialFailure => self.completed += 1,
        }
        self.last_tick_at = Some(at);
        self.last_outcome = Some(outcome);
    }
}

/// Point-in-time view of a scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub enabled: bool,
    pub config: Option<SchedulerConfig>,
    pub job_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub next_tick_at: Option<DateTime<Utc>>,
    pub ticks: TickCounters,
}

/// Wall-clock time as seen through Tokio's clock.
#[derive(Debug, Clone, Copy)]
struct JobClock {
    wall: DateTime<Utc>,
    instant: Instant,
}

impl JobClock {
    fn start() -> Self {
        Self {
            wall: Utc::now(),
            instant: Instant::now(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.instant.elapsed())
            .ok()
            .and_then(|elapsed| self.wall.checked_add_signed(elapsed))
            .unwrap_or(self.wall)
    }

    /// The Tokio instant at which `at` falls due. Past times map to the start.
    fn deadline(&self, at: DateTime<Utc>) -> Instant {
        self.instant + (at - self.wall).to_std().unwrap_or_default()
    }
}

#[derive(Debug)]
struct ActiveJob {
    job_id: Uuid,
    config: SchedulerConfig,
    started_at: DateTime<Utc>,
    next_tick_at: Arc<Mutex<Option<DateTime<Utc>>>>,
    cancel: CancellationToken,
}

/// Result of trying to begin a tick.
#[derive(Debug)]
enum TickClaim {
    /// The job was stopped or replaced.
    Retired,
    /// A cycle is still in flight.
    Busy,
    /// The gate is held until the cycle ends.
    Ready(OwnedMutexGuard<()>),
}

/// Shared between the scheduler and its job tasks.
struct Shared {
    runner: Arc<dyn CycleRunner>,
    /// Held for the duration of each cycle.
    tick_gate: Arc<tokio::sync::Mutex<()>>,
    counters: Mutex<TickCounters>,
    slot: Mutex<Option<ActiveJob>>,
}

impl Shared {
    /// Claim the tick for `job_id`. The slot lock is held across the check
    /// and the gate acquisition, so `stop` and `start` either land before
    /// the claim (and retire it) or after it.
    fn claim_tick(&self, job_id: Uuid) -> TickClaim {
        let slot = self.slot.lock();
        let current = slot
            .as_ref()
            .is_some_and(|job| job.job_id == job_id && !job.cancel.is_cancelled());
        if !current {
            return TickClaim::Retired;
        }
        match Arc::clone(&self.tick_gate).try_lock_owned() {
            Ok(guard) => TickClaim::Ready(guard),
            Err(_) => TickClaim::Busy,
        }
    }
}

/// Owns at most one recurring anchoring job.
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("job", &*self.shared.slot.lock())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new(runner: Arc<dyn CycleRunner>) -> Self {
        Self {
            shared: Arc::new(Shared {
                runner,
                tick_gate: Arc::new(tokio::sync::Mutex::new(())),
                counters: Mutex::new(TickCounters::default()),
                slot: Mutex::new(None),
            }),
        }
    }

    /// Replace any running job with one for `config`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, config: SchedulerConfig) -> Result<SchedulerStatus, SchedulerError> {
        self.shared
            .runner
            .validate_pair(&config.network_a, &config.network_b)?;
        let clock = JobClock::start();
        let first_tick = config
            .interval
            .next_after(clock.wall)
            .ok_or_else(|| SchedulerError::Exhausted(config.interval.to_string()))?;

        let job = ActiveJob {
            job_id: Uuid::new_v4(),
            config,
            started_at: clock.wall,
            next_tick_at: Arc::new(Mutex::new(Some(first_tick))),
            cancel: CancellationToken::new(),
        };

        {
            let mut slot = self.shared.slot.lock();
            if let Some(previous) = slot.take() {
                previous.cancel.cancel();
                tracing::info!(job_id = %previous.job_id, "replacing scheduled anchoring job");
            }
            tokio::spawn(run_job(
                Arc::clone(&self.shared),
                job.job_id,
                job.config.clone(),
                clock,
                Arc::clone(&job.next_tick_at),
                job.cancel.clone(),
            ));
            tracing::info!(
                job_id = %job.job_id,
                network_a = %job.config.network_a,
                network_b = %job.config.network_b,
                interval = %job.config.interval,
                "scheduled anchoring started"
            );
            *slot = Some(job);
        }
        Ok(self.status())
    }

    /// Cancel future ticks. Returns the stopped job's config.
    pub fn stop(&self) -> Result<SchedulerConfig, SchedulerError> {
        let job = {
            let mut slot = self.shared.slot.lock();
            let job = slot.take().ok_or(SchedulerError::NotRunning)?;
            job.cancel.cancel();
            job
        };
        tracing::info!(job_id = %job.job_id, "scheduled anchoring stopped");
        Ok(job.config)
    }

    pub fn is_running(&self) -> bool {
        self.shared.slot.lock().is_some()
    }

    pub fn status(&self) -> SchedulerStatus {
        let ticks = self.shared.counters.lock().clone();
        match &*self.shared.slot.lock() {
            Some(job) => SchedulerStatus {
                enabled: true,
                config: Some(job.config.clone()),
                job_id: Some(job.job_id),
                started_at: Some(job.started_at),
                next_tick_at: *job.next_tick_at.lock(),
                ticks,
            },
            None => SchedulerStatus {
                enabled: false,
                config: None,
                job_id: None,
                started_at: None,
                next_tick_at: None,
                ticks,
            },
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(job) = self.shared.slot.lock().take() {
            job.cancel.cancel();
        }
    }
}

async fn run_job(
    shared: Arc<Shared>,
    job_id: Uuid,
    config: SchedulerConfig,
    clock: JobClock,
    next_tick_at: Arc<Mutex<Option<DateTime<Utc>>>>,
    cancel: CancellationToken,
) {
    loop {
        let Some(next) = config.interval.next_after(clock.now()) else {
            tracing::warn!(%job_id, interval = %config.interval, "schedule exhausted");
            *next_tick_at.lock() = None;
            break;
        };
        *next_tick_at.lock() = Some(next);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep_until(clock.deadline(next)) => {}
        }

        let guard = match shared.claim_tick(job_id) {
            TickClaim::Ready(guard) => guard,
            TickClaim::Busy => {
                tracing::warn!(%job_id, "tick skipped: previous cycle still in flight");
                shared.counters.lock().skipped += 1;
                continue;
            }
            TickClaim::Retired => break,
        };

        let tick_shared = Arc::clone(&shared);
        let (a, b) = (config.network_a.clone(), config.network_b.clone());
        tokio::spawn(async move {
            let _guard = guard;
            let runner = Arc::clone(&tick_shared.runner);
            let cycle = tokio::spawn(async move { runner.run_cycle(&a, &b).await }).await;
            let outcome = match cycle {
                Ok(Ok(result)) => {
                    let outcome = TickOutcome::of(&result);
                    if outcome != TickOutcome::Succeeded {
                        tracing::warn!(%job_id, cycle_id = %result.cycle_id, ?outcome, "scheduled cycle incomplete");
                    }
                    outcome
                }
                Ok(Err(e)) => {
                    tracing::error!(%job_id, error = %e, "scheduled cycle failed");
                    TickOutcome::Failed
                }
                Err(e) => {
                    tracing::error!(%job_id, error = %e, "scheduled cycle panicked");
                    TickOutcome::Failed
                }
            };
            tick_shared.counters.lock().record(outcome, clock.now());
        });
    }
    tracing::debug!(%job_id, "scheduler loop exited");
}
