// src/backend/monitor.rs

use super::{Backend, JobId, JobResult, JobStatus};
use crate::circuits::Circuit;
use crate::config::PollConfig;
use crate::core::QkdError;
use crate::simulation::Counts;
use std::thread;
use tracing::{debug, debug_span, info, info_span, warn};

/// Polls `job` until it reaches a final status or the countdown runs out.
///
/// Each iteration checks the status once and sleeps `poll.interval()` if the
/// job is still pending. After `poll.max_polls` checks the wait is abandoned.
///
/// # Errors
/// * `QkdError::JobFailed` if the job ends in `ERROR` or `CANCELLED`.
/// * `QkdError::JobTimeout` if the countdown reaches zero first.
pub fn wait_for_completion<B: Backend + ?Sized>(
    backend: &mut B,
    job: JobId,
    poll: &PollConfig,
) -> Result<JobResult, QkdError> {
    let max_polls = poll.max_polls.max(1);
    let interval = poll.interval();
    let span = debug_span!("wait", %job, max_polls);
    let _guard = span.enter();
    let mut remaining = max_polls;

    loop {
        let status = backend.status(job)?;
        remaining -= 1;
        debug!(%job, %status, remaining, "polled job status");

        match status {
            JobStatus::Done => return backend.result(job),
            JobStatus::Error => {
                let err = match backend.result(job) {
                    Err(err) => err,
                    Ok(_) => QkdError::JobFailed {
                        job_id: job.0,
                        message: "backend reported an error status".to_string(),
                    },
                };
                warn!(%job, error = %err, "job failed");
                return Err(err);
            }
            JobStatus::Cancelled => {
                warn!(%job, "job cancelled");
                return Err(QkdError::JobFailed {
                    job_id: job.0,
                    message: "job was cancelled".to_string(),
                });
            }
            _ => {}
        }

        if remaining == 0 {
            warn!(%job, polls = max_polls, "job is taking too long, giving up");
            return Err(QkdError::JobTimeout { job_id: job.0, polls: max_polls });
        }
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }
}

/// Submits `circuits` as one job and waits for its result.
pub fn execute<B: Backend + ?Sized>(
    backend: &mut B,
    circuits: &[Circuit],
    shots: usize,
    poll: &PollConfig,
) -> Result<JobResult, QkdError> {
    let job = backend.submit(circuits, shots)?;
    info!(%job, backend = backend.name(), circuits = circuits.len(), "job submitted");
    wait_for_completion(backend, job, poll)
}

/// Runs `circuits` as a sequence of jobs and concatenates the counts.
///
/// Each job holds at most `batch_size` circuits, further capped by the
/// backend's own per-job limit. Counts come back in the order of `circuits`.
pub fn execute_batched<B: Backend + ?Sized>(
    backend: &mut B,
    circuits: &[Circuit],
    shots: usize,
    batch_size: usize,
    poll: &PollConfig,
) -> Result<Vec<Counts>, QkdError> {
    let limit = backend.max_experiments().unwrap_or(usize::MAX);
    let batch = batch_size.min(limit).max(1);
    let total_batches = circuits.len().div_ceil(batch);
    let span = info_span!("batched", backend = backend.name(), circuits = circuits.len(), batch);
    let _guard = span.enter();

    let mut all_counts = Vec::with_capacity(circuits.len());
    for (i, chunk) in circuits.chunks(batch).enumerate() {
        debug!(batch = i + 1, of = total_batches, size = chunk.len(), "running batch");
        let result = execute(backend, chunk, shots, poll)?;
        all_counts.extend(result.counts);
    }
    Ok(all_counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalBackend;
    use crate::circuits::CircuitBuilder;
    use crate::operations::Gate;

    fn instant_poll(max_polls: u32) -> PollConfig {
        PollConfig { interval_ms: 0, max_polls }
    }

    #[test]
    fn test_waits_through_latency() -> Result<(), QkdError> {
        let mut backend = LocalBackend::seeded(2).with_latency_polls(3);
        let circuit = CircuitBuilder::new().gate(Gate::X, 0).measure(0, 0).build();
        let result = execute(&mut backend, &[circuit], 5, &instant_poll(4))?;
        assert_eq!(result.counts[0].get("1"), 5);
        Ok(())
    }

    #[test]
    fn test_times_out_after_countdown() -> Result<(), QkdError> {
        let mut backend = LocalBackend::seeded(2).with_latency_polls(10);
        let circuit = CircuitBuilder::new().measure(0, 0).build();
        let err = execute(&mut backend, &[circuit], 1, &instant_poll(3)).unwrap_err();
        assert_eq!(err, QkdError::JobTimeout { job_id: 0, polls: 3 });
        Ok(())
    }

    /// Reports a fixed sequence of statuses, repeating the last one.
    struct ScriptedBackend {
        statuses: Vec<JobStatus>,
        polls: usize,
    }

    impl Backend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        fn max_experiments(&self) -> Option<usize> {
            None
        }

        fn submit(&mut self, _circuits: &[Circuit], _shots: usize) -> Result<JobId, QkdError> {
            Ok(JobId(5))
        }

        fn status(&mut self, _job: JobId) -> Result<JobStatus, QkdError> {
            let idx = self.polls.min(self.statuses.len() - 1);
            self.polls += 1;
            Ok(self.statuses[idx])
        }

        fn result(&mut self, job: JobId) -> Result<JobResult, QkdError> {
            Ok(JobResult { job_id: job, backend: self.name().to_string(), names: vec![], counts: vec![] })
        }
    }

    #[test]
    fn test_cancelled_job_fails() {
        let mut backend = ScriptedBackend {
            statuses: vec![JobStatus::Initializing, JobStatus::Queued, JobStatus::Cancelled],
            polls: 0,
        };
        let err = wait_for_completion(&mut backend, JobId(5), &instant_poll(10)).unwrap_err();
        assert_eq!(err, QkdError::JobFailed { job_id: 5, message: "job was cancelled".to_string() });
        assert_eq!(backend.polls, 3);
    }

    #[test]
    fn test_initializing_and_validating_keep_polling() {
        let mut backend = ScriptedBackend {
            statuses: vec![JobStatus::Initializing, JobStatus::Validating],
            polls: 0,
        };
        let err = wait_for_completion(&mut backend, JobId(5), &instant_poll(4)).unwrap_err();
        assert_eq!(err, QkdError::JobTimeout { job_id: 5, polls: 4 });
        assert_eq!(backend.polls, 4);
    }

    #[test]
    fn test_done_after_validation() -> Result<(), QkdError> {
        let mut backend = ScriptedBackend {
            statuses: vec![JobStatus::Initializing, JobStatus::Validating, JobStatus::Running, JobStatus::Done],
            polls: 0,
        };
        let result = wait_for_completion(&mut backend, JobId(5), &instant_poll(4))?;
        assert_eq!(result.job_id, JobId(5));
        Ok(())
    }

    #[test]
    fn test_local_cancellation_ends_wait() -> Result<(), QkdError> {
        let mut backend = LocalBackend::seeded(2).with_latency_polls(5);
        let circuit = CircuitBuilder::new().measure(0, 0).build();
        let job = backend.submit(&[circuit], 1)?;
        backend.cancel(job)?;
        let err = wait_for_completion(&mut backend, job, &instant_poll(3)).unwrap_err();
        assert_eq!(err, QkdError::JobFailed { job_id: job.0, message: "job was cancelled".to_string() });
        Ok(())
    }

    #[test]
    fn test_job_error_is_surfaced() {
        let mut backend = LocalBackend::seeded(2).failing("calibration in progress");
        let circuit = CircuitBuilder::new().measure(0, 0).build();
        let err = execute(&mut backend, &[circuit], 1, &instant_poll(3)).unwrap_err();
        assert_eq!(
            err,
            QkdError::JobFailed { job_id: 0, message: "calibration in progress".to_string() }
        );
    }
}
