// src/backend/local.rs

use super::{Backend, JobId, JobResult, JobStatus};
use crate::circuits::Circuit;
use crate::core::QkdError;
use crate::simulation::Simulator;
use std::collections::HashMap;
use tracing::debug;

const LOCAL_BACKEND_NAME: &str = "local_statevector_simulator";

struct LocalJob {
    polls: u32,
    cancelled: bool,
    outcome: Result<JobResult, String>,
}

/// Runs jobs on the in-crate simulator.
///
/// Circuits execute at submission. With `latency_polls = n` the job reports
/// `QUEUED` and then `RUNNING` for its first `n` status checks before it
/// reports a final status, mimicking a shared remote device. A job is
/// forgotten once its final result has been fetched.
pub struct LocalBackend {
    simulator: Simulator,
    latency_polls: u32,
    max_experiments: Option<usize>,
    fail_with: Option<String>,
    next_id: u64,
    jobs: HashMap<JobId, LocalJob>,
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new(Simulator::new())
    }
}

impl LocalBackend {
    /// Wraps a simulator. Jobs complete on the first status check.
    pub fn new(simulator: Simulator) -> Self {
        Self {
            simulator,
            latency_polls: 0,
            max_experiments: None,
            fail_with: None,
            next_id: 0,
            jobs: HashMap::new(),
        }
    }

    /// Backend with a seeded simulator.
    pub fn seeded(seed: u64) -> Self {
        Self::new(Simulator::with_seed(seed))
    }

    /// Number of non-final status checks before a job finishes.
    pub fn with_latency_polls(mut self, polls: u32) -> Self {
        self.latency_polls = polls;
        self
    }

    /// Caps the number of circuits per job.
    pub fn with_max_experiments(mut self, max: usize) -> Self {
        self.max_experiments = Some(max);
        self
    }

    /// Makes every job end in `ERROR` with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Number of jobs submitted so far.
    pub fn submitted_jobs(&self) -> usize {
        self.next_id as usize
    }

    /// Number of jobs whose result has not been fetched yet.
    pub fn retained_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Cancels a job that has not reported a final status yet. Later
    /// status checks report `CANCELLED`.
    pub fn cancel(&mut self, job: JobId) -> Result<(), QkdError> {
        let latency = self.latency_polls;
        let entry = self.jobs.get_mut(&job).ok_or(QkdError::UnknownJob { job_id: job.0 })?;
        if entry.polls > latency {
            return Err(QkdError::InvalidOperation {
                message: format!("Job {} has already finished", job),
            });
        }
        entry.cancelled = true;
        debug!(%job, "cancelled job");
        Ok(())
    }

    fn job(&self, job: JobId) -> Result<&LocalJob, QkdError> {
        self.jobs.get(&job).ok_or(QkdError::UnknownJob { job_id: job.0 })
    }
}

impl Backend for LocalBackend {
    fn name(&self) -> &str {
        LOCAL_BACKEND_NAME
    }

    fn max_experiments(&self) -> Option<usize> {
        self.max_experiments
    }

    fn submit(&mut self, circuits: &[Circuit], shots: usize) -> Result<JobId, QkdError> {
        if let Some(max) = self.max_experiments {
            if circuits.len() > max {
                return Err(QkdError::InvalidOperation {
                    message: format!("Job holds {} circuits but {} accepts at most {}", circuits.len(), LOCAL_BACKEND_NAME, max),
                });
            }
        }

        let job_id = JobId(self.next_id);
        self.next_id += 1;

        let outcome = match &self.fail_with {
            Some(message) => Err(message.clone()),
            None => self
                .simulator
                .run_all(circuits, shots)
                .map(|counts| JobResult {
                    job_id,
                    backend: LOCAL_BACKEND_NAME.to_string(),
                    names: circuits.iter().map(|c| c.name().map(str::to_string)).collect(),
                    counts,
                })
                .map_err(|e| e.to_string()),
        };
        debug!(%job_id, circuits = circuits.len(), shots, "submitted job");

        self.jobs.insert(job_id, LocalJob { polls: 0, cancelled: false, outcome });
        Ok(job_id)
    }

    fn status(&mut self, job: JobId) -> Result<JobStatus, QkdError> {
        let latency = self.latency_polls;
        let entry = self.jobs.get_mut(&job).ok_or(QkdError::UnknownJob { job_id: job.0 })?;
        let status = if entry.cancelled {
            JobStatus::Cancelled
        } else if entry.polls < latency {
            if entry.polls < latency.div_ceil(2) {
                JobStatus::Queued
            } else {
                JobStatus::Running
            }
        } else if entry.outcome.is_ok() {
            JobStatus::Done
        } else {
            JobStatus::Error
        };
        entry.polls = entry.polls.saturating_add(1);
        Ok(status)
    }

    fn result(&mut self, job: JobId) -> Result<JobResult, QkdError> {
        let entry = self.job(job)?;
        if entry.cancelled {
            self.jobs.remove(&job);
            return Err(QkdError::JobFailed { job_id: job.0, message: "job was cancelled".to_string() });
        }
        // A job is finished once a status check has reported its final state.
        if entry.polls <= self.latency_polls {
            return Err(QkdError::InvalidOperation {
                message: format!("Job {} has not finished", job),
            });
        }
        let entry = self.jobs.remove(&job).ok_or(QkdError::UnknownJob { job_id: job.0 })?;
        entry.outcome.map_err(|message| QkdError::JobFailed { job_id: job.0, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::CircuitBuilder;
    use crate::operations::Gate;

    fn flip_circuit() -> Circuit {
        CircuitBuilder::named("flip").gate(Gate::X, 0).measure(0, 0).build()
    }

    #[test]
    fn test_immediate_job_is_done_on_first_poll() -> Result<(), QkdError> {
        let mut backend = LocalBackend::seeded(1);
        let job = backend.submit(&[flip_circuit()], 10)?;
        assert_eq!(backend.status(job)?, JobStatus::Done);
        let result = backend.result(job)?;
        assert_eq!(result.counts_for("flip").map(|c| c.get("1")), Some(10));
        Ok(())
    }

    #[test]
    fn test_latency_walks_through_queue_states() -> Result<(), QkdError> {
        let mut backend = LocalBackend::seeded(1).with_latency_polls(4);
        let job = backend.submit(&[flip_circuit()], 1)?;
        let seen: Vec<JobStatus> = (0..5).map(|_| backend.status(job)).collect::<Result<_, _>>()?;
        assert_eq!(
            seen,
            vec![JobStatus::Queued, JobStatus::Queued, JobStatus::Running, JobStatus::Running, JobStatus::Done]
        );
        Ok(())
    }

    #[test]
    fn test_result_before_completion_is_rejected() -> Result<(), QkdError> {
        let mut backend = LocalBackend::seeded(1).with_latency_polls(2);
        let job = backend.submit(&[flip_circuit()], 1)?;
        assert!(backend.result(job).is_err());
        backend.status(job)?;
        assert!(backend.result(job).is_err());
        Ok(())
    }

    #[test]
    fn test_failing_backend_and_unknown_job() -> Result<(), QkdError> {
        let mut backend = LocalBackend::seeded(1).failing("device offline");
        let job = backend.submit(&[flip_circuit()], 1)?;
        assert_eq!(backend.status(job)?, JobStatus::Error);
        assert_eq!(
            backend.result(job),
            Err(QkdError::JobFailed { job_id: job.0, message: "device offline".to_string() })
        );
        assert_eq!(backend.status(JobId(99)), Err(QkdError::UnknownJob { job_id: 99 }));
        Ok(())
    }

    #[test]
    fn test_fetched_results_are_evicted() -> Result<(), QkdError> {
        let mut backend = LocalBackend::seeded(1);
        let job = backend.submit(&[flip_circuit()], 2)?;
        backend.status(job)?;
        assert_eq!(backend.retained_jobs(), 1);
        backend.result(job)?;
        assert_eq!(backend.retained_jobs(), 0);
        assert_eq!(backend.submitted_jobs(), 1);
        assert_eq!(backend.result(job), Err(QkdError::UnknownJob { job_id: job.0 }));
        Ok(())
    }

    #[test]
    fn test_cancelled_job_reports_cancelled() -> Result<(), QkdError> {
        let mut backend = LocalBackend::seeded(1).with_latency_polls(3);
        let job = backend.submit(&[flip_circuit()], 1)?;
        assert_eq!(backend.status(job)?, JobStatus::Queued);
        backend.cancel(job)?;
        assert_eq!(backend.status(job)?, JobStatus::Cancelled);
        assert!(JobStatus::Cancelled.is_final());
        assert!(matches!(backend.result(job), Err(QkdError::JobFailed { .. })));
        assert_eq!(backend.cancel(JobId(7)), Err(QkdError::UnknownJob { job_id: 7 }));
        Ok(())
    }

    #[test]
    fn test_finished_job_cannot_be_cancelled() -> Result<(), QkdError> {
        let mut backend = LocalBackend::seeded(1);
        let job = backend.submit(&[flip_circuit()], 1)?;
        assert_eq!(backend.status(job)?, JobStatus::Done);
        assert!(matches!(backend.cancel(job), Err(QkdError::InvalidOperation { .. })));
        Ok(())
    }

    #[test]
    fn test_oversized_job_rejected() {
        let mut backend = LocalBackend::seeded(1).with_max_experiments(1);
        let circuits = vec![flip_circuit(), flip_circuit()];
        assert!(matches!(backend.submit(&circuits, 1), Err(QkdError::InvalidOperation { .. })));
    }
}
