// src/backend/mod.rs

//! Job-based execution of circuits.
//!
//! A [`Backend`] accepts a list of circuits as one job and reports the job's
//! progress through [`JobStatus`]. Callers poll until the status is final and
//! then fetch the per-circuit counts. [`LocalBackend`] runs jobs on the
//! in-crate [`Simulator`](crate::simulation::Simulator) and can mimic a
//! queued remote device.

mod local;
mod monitor;

pub use local::LocalBackend;
pub use monitor::{execute, execute_batched, wait_for_completion};

use crate::circuits::Circuit;
use crate::core::QkdError;
use crate::simulation::Counts;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Lifecycle of a job on a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Accepted, not yet queued.
    Initializing,
    /// Waiting for the device.
    Queued,
    /// Circuits are being validated.
    Validating,
    /// Circuits are executing.
    Running,
    /// Finished; results are available.
    Done,
    /// Finished with an error.
    Error,
    /// Cancelled before completion.
    Cancelled,
}

impl JobStatus {
    /// `true` once the status can no longer change.
    pub fn is_final(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error | JobStatus::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobStatus::Initializing => "INITIALIZING",
            JobStatus::Queued => "QUEUED",
            JobStatus::Validating => "VALIDATING",
            JobStatus::Running => "RUNNING",
            JobStatus::Done => "DONE",
            JobStatus::Error => "ERROR",
            JobStatus::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

/// Per-circuit results of a finished job, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    /// The job these results belong to.
    pub job_id: JobId,
    /// Name of the backend that ran the job.
    pub backend: String,
    /// Circuit names, parallel to `counts`.
    pub names: Vec<Option<String>>,
    /// One histogram per submitted circuit.
    pub counts: Vec<Counts>,
}

impl JobResult {
    /// Counts for the first circuit carrying `name`.
    pub fn counts_for(&self, name: &str) -> Option<&Counts> {
        self.names
            .iter()
            .position(|n| n.as_deref() == Some(name))
            .and_then(|i| self.counts.get(i))
    }
}

/// Something that runs batches of circuits as jobs.
pub trait Backend {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Largest number of circuits accepted in one job, if limited.
    fn max_experiments(&self) -> Option<usize>;

    /// Submits `circuits`, each to be run for `shots` shots.
    fn submit(&mut self, circuits: &[Circuit], shots: usize) -> Result<JobId, QkdError>;

    /// Current status of `job`. Each call counts as one poll.
    fn status(&mut self, job: JobId) -> Result<JobStatus, QkdError>;

    /// Results of a finished job. A backend may release the job once its
    /// final result has been handed out.
    ///
    /// Returns `QkdError::JobFailed` for jobs that ended in error or were
    /// cancelled.
    fn result(&mut self, job: JobId) -> Result<JobResult, QkdError>;
}
