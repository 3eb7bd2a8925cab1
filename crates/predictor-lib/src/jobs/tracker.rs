//! Job slot state machine
//!
//! Each slot moves `idle -> running -> {succeeded, failed}` where the terminal
//! shapes are `running == false` with either `completed_at` or `last_error`
//! set. Both slots live behind a single mutex so the exclusion check and the
//! `running` flip happen in one critical section; two racing starts can never
//! both observe an idle board.

use super::{JobKind, JobOutcome, JobRunner, JobState};
use crate::error::Error;
use crate::observability::ServiceMetrics;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info};

#[derive(Debug, Default)]
struct JobBoard {
    dataset: JobState,
    training: JobState,
}

impl JobBoard {
    fn slot(&self, kind: JobKind) -> &JobState {
        match kind {
            JobKind::Dataset => &self.dataset,
            JobKind::Training => &self.training,
        }
    }

    fn slot_mut(&mut self, kind: JobKind) -> &mut JobState {
        match kind {
            JobKind::Dataset => &mut self.dataset,
            JobKind::Training => &mut self.training,
        }
    }

    fn check_idle(&self, kind: JobKind) -> Result<(), Error> {
        if self.slot(kind).running {
            return Err(Error::Conflict(format!("{kind} already in progress")));
        }
        let other = kind.other();
        if self.slot(other).running {
            return Err(Error::Conflict(format!(
                "cannot start {kind} while {other} is in progress"
            )));
        }
        Ok(())
    }
}

/// Tracker for the two maintenance job slots
#[derive(Clone)]
pub struct JobTracker {
    board: Arc<Mutex<JobBoard>>,
    metrics: ServiceMetrics,
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTracker {
    pub fn new() -> Self {
        Self {
            board: Arc::new(Mutex::new(JobBoard::default())),
            metrics: ServiceMetrics::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, JobBoard> {
        self.board.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start the job of `kind`, delegating the work to `runner`.
    ///
    /// Returns immediately after flipping the slot to running; the job body
    /// executes on a spawned task. Fails with [`Error::Conflict`] when either
    /// slot is already running. Job-body failures are never returned here;
    /// they land in the slot and surface through [`status`](Self::status).
    pub fn start(&self, kind: JobKind, runner: Arc<dyn JobRunner>) -> Result<(), Error> {
        {
            let mut board = self.lock();
            board.check_idle(kind)?;
            *board.slot_mut(kind) = JobState {
                running: true,
                progress: 0,
                step: match kind {
                    JobKind::Training => "Initializing".to_string(),
                    JobKind::Dataset => String::new(),
                },
                message: format!("Starting {kind}..."),
                started_at: Some(Utc::now()),
                completed_at: None,
                last_error: None,
            };
        }

        info!(job = %kind, "Job started");
        self.metrics.inc_job_runs(kind);

        // Spawn point is kept in one place so a cancellation token could be
        // threaded through later.
        let tracker = self.clone();
        tokio::spawn(async move {
            tracker.run_job(kind, runner).await;
        });

        Ok(())
    }

    /// Read-only snapshot of a slot; safe to poll while the job runs
    pub fn status(&self, kind: JobKind) -> JobState {
        self.lock().slot(kind).clone()
    }

    /// Whether the slot for `kind` is running
    pub fn is_running(&self, kind: JobKind) -> bool {
        self.lock().slot(kind).running
    }

    /// Same conflict check as [`start`](Self::start) without flipping the
    /// slot. Callers that order job conflicts ahead of other preconditions
    /// resolve them here first; `start` re-checks under the same lock, so the
    /// eventual flip stays race-free.
    pub fn ensure_idle(&self, kind: JobKind) -> Result<(), Error> {
        self.lock().check_idle(kind)
    }

    /// Whether either slot is running
    pub fn is_any_running(&self) -> bool {
        let board = self.lock();
        board.dataset.running || board.training.running
    }

    fn update(&self, kind: JobKind, apply: impl FnOnce(&mut JobState)) {
        apply(self.lock().slot_mut(kind));
    }

    async fn run_job(self, kind: JobKind, runner: Arc<dyn JobRunner>) {
        match kind {
            JobKind::Dataset => self.update(kind, |s| {
                s.progress = 10;
                s.message = "Generating samples...".to_string();
            }),
            JobKind::Training => {
                self.update(kind, |s| {
                    s.progress = 10;
                    s.step = "Loading Data".to_string();
                    s.message = "Loading dataset...".to_string();
                });
                self.update(kind, |s| {
                    s.progress = 20;
                    s.step = "Training Models".to_string();
                    s.message = "Training regression models...".to_string();
                });
            }
        }

        let outcome = match tokio::task::spawn_blocking(move || runner.run(kind)).await {
            Ok(outcome) => outcome,
            Err(e) => JobOutcome::failure(format!("job body panicked: {e}")),
        };

        if outcome.success {
            info!(job = %kind, "Job completed");
            self.update(kind, |s| {
                s.running = false;
                s.progress = 100;
                if kind == JobKind::Training {
                    s.step = "Complete".to_string();
                }
                s.message = format!("{kind} completed successfully");
                s.completed_at = Some(Utc::now());
            });
        } else {
            error!(job = %kind, error = %outcome.diagnostic, "Job failed");
            self.metrics.inc_job_failures(kind);
            self.update(kind, |s| {
                s.running = false;
                if kind == JobKind::Training {
                    s.step = "Failed".to_string();
                }
                s.message = format!("{kind} failed");
                s.last_error = Some(if outcome.diagnostic.is_empty() {
                    format!("{kind} failed")
                } else {
                    outcome.diagnostic
                });
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct InstantRunner {
        succeed: bool,
    }

    impl JobRunner for InstantRunner {
        fn run(&self, kind: JobKind) -> JobOutcome {
            if self.succeed {
                JobOutcome::success()
            } else {
                JobOutcome::failure(format!("{kind} script exited with status 1"))
            }
        }
    }

    /// Blocks until `release` flips, to hold a slot in the running state
    struct GatedRunner {
        release: Arc<AtomicBool>,
    }

    impl JobRunner for GatedRunner {
        fn run(&self, _kind: JobKind) -> JobOutcome {
            while !self.release.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(1));
            }
            JobOutcome::success()
        }
    }

    struct PanicRunner;

    impl JobRunner for PanicRunner {
        fn run(&self, _kind: JobKind) -> JobOutcome {
            panic!("runner exploded");
        }
    }

    async fn wait_until_idle(tracker: &JobTracker, kind: JobKind) -> JobState {
        for _ in 0..500 {
            let state = tracker.status(kind);
            if !state.running {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("job never left the running state");
    }

    #[tokio::test]
    async fn successful_job_reaches_terminal_success_shape() {
        let tracker = JobTracker::new();
        tracker
            .start(JobKind::Dataset, Arc::new(InstantRunner { succeed: true }))
            .unwrap();

        let state = wait_until_idle(&tracker, JobKind::Dataset).await;
        assert_eq!(state.progress, 100);
        assert!(state.completed_at.is_some());
        assert!(state.last_error.is_none());
        assert!(state.started_at.is_some());
    }

    #[tokio::test]
    async fn failed_job_records_error_and_no_completion() {
        let tracker = JobTracker::new();
        tracker
            .start(JobKind::Training, Arc::new(InstantRunner { succeed: false }))
            .unwrap();

        let state = wait_until_idle(&tracker, JobKind::Training).await;
        assert!(state.last_error.is_some());
        assert!(state.completed_at.is_none());
        assert_eq!(state.step, "Failed");
        assert!(state.last_error.unwrap().contains("status 1"));
    }

    #[tokio::test]
    async fn running_flag_is_set_before_start_returns() {
        let tracker = JobTracker::new();
        let release = Arc::new(AtomicBool::new(false));
        tracker
            .start(
                JobKind::Dataset,
                Arc::new(GatedRunner {
                    release: release.clone(),
                }),
            )
            .unwrap();

        // Observable synchronously, without yielding to the job task
        assert!(tracker.is_running(JobKind::Dataset));
        let state = tracker.status(JobKind::Dataset);
        assert!(state.running);
        assert!(state.completed_at.is_none());

        release.store(true, Ordering::SeqCst);
        wait_until_idle(&tracker, JobKind::Dataset).await;
    }

    #[tokio::test]
    async fn same_kind_start_conflicts_while_running() {
        let tracker = JobTracker::new();
        let release = Arc::new(AtomicBool::new(false));
        tracker
            .start(
                JobKind::Training,
                Arc::new(GatedRunner {
                    release: release.clone(),
                }),
            )
            .unwrap();

        let err = tracker
            .start(JobKind::Training, Arc::new(InstantRunner { succeed: true }))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        release.store(true, Ordering::SeqCst);
        wait_until_idle(&tracker, JobKind::Training).await;
    }

    #[tokio::test]
    async fn cross_kind_start_conflicts_while_running() {
        let tracker = JobTracker::new();
        let release = Arc::new(AtomicBool::new(false));
        tracker
            .start(
                JobKind::Dataset,
                Arc::new(GatedRunner {
                    release: release.clone(),
                }),
            )
            .unwrap();

        let err = tracker
            .start(JobKind::Training, Arc::new(InstantRunner { succeed: true }))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert!(!tracker.is_running(JobKind::Training));

        release.store(true, Ordering::SeqCst);
        wait_until_idle(&tracker, JobKind::Dataset).await;
    }

    #[tokio::test]
    async fn ensure_idle_reports_conflict_without_claiming_the_slot() {
        let tracker = JobTracker::new();
        assert!(tracker.ensure_idle(JobKind::Training).is_ok());

        let release = Arc::new(AtomicBool::new(false));
        tracker
            .start(
                JobKind::Dataset,
                Arc::new(GatedRunner {
                    release: release.clone(),
                }),
            )
            .unwrap();

        let err = tracker.ensure_idle(JobKind::Training).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert!(!tracker.is_running(JobKind::Training));

        release.store(true, Ordering::SeqCst);
        wait_until_idle(&tracker, JobKind::Dataset).await;
        assert!(tracker.ensure_idle(JobKind::Training).is_ok());
    }

    #[tokio::test]
    async fn concurrent_starts_admit_exactly_one() {
        let tracker = JobTracker::new();
        let release = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let tracker = tracker.clone();
            let runner = Arc::new(GatedRunner {
                release: release.clone(),
            });
            handles.push(tokio::spawn(async move {
                tracker.start(JobKind::Training, runner).is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);

        release.store(true, Ordering::SeqCst);
        wait_until_idle(&tracker, JobKind::Training).await;
    }

    #[tokio::test]
    async fn slot_can_restart_after_completion() {
        let tracker = JobTracker::new();
        tracker
            .start(JobKind::Dataset, Arc::new(InstantRunner { succeed: false }))
            .unwrap();
        let failed = wait_until_idle(&tracker, JobKind::Dataset).await;
        assert!(failed.last_error.is_some());

        // A new start resets the failed shape
        tracker
            .start(JobKind::Dataset, Arc::new(InstantRunner { succeed: true }))
            .unwrap();
        let state = wait_until_idle(&tracker, JobKind::Dataset).await;
        assert!(state.last_error.is_none());
        assert_eq!(state.progress, 100);
    }

    #[tokio::test]
    async fn panicking_runner_is_recorded_as_failure() {
        let tracker = JobTracker::new();
        tracker
            .start(JobKind::Dataset, Arc::new(PanicRunner))
            .unwrap();

        let state = wait_until_idle(&tracker, JobKind::Dataset).await;
        assert!(state.last_error.unwrap().contains("panicked"));
        assert!(state.completed_at.is_none());
    }

    #[tokio::test]
    async fn dataset_slot_has_no_step_label() {
        let tracker = JobTracker::new();
        tracker
            .start(JobKind::Dataset, Arc::new(InstantRunner { succeed: true }))
            .unwrap();

        let state = wait_until_idle(&tracker, JobKind::Dataset).await;
        assert!(state.step.is_empty());
    }
}
