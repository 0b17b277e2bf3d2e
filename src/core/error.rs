//! Error handling logic

use thiserror::Error;

/// Errors raised while building circuits, running jobs, or post-processing
/// measurement data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QkdError {
    /// The state vector lost normalization during simulation.
    #[error("Incoherence Violation: {message}")]
    Incoherence {
        /// Incoherence failure message
        message: String,
    },

    /// An operation referenced a qubit or classical bit outside the circuit.
    #[error("Reference Violation: {message}")]
    ReferenceViolation {
        /// ReferenceViolation failure message
        message: String,
    },

    /// An applied operation is inconsistent with the circuit or state.
    #[error("Invalid Operation: {message}")]
    InvalidOperation {
        /// InvalidOperation failure message
        message: String,
    },

    /// The backend reported that a job finished in an error state.
    #[error("Job {job_id} failed: {message}")]
    JobFailed {
        /// Backend job identifier.
        job_id: u64,
        /// Backend supplied reason.
        message: String,
    },

    /// The poll countdown ran out before the job reached a final status.
    #[error("Job {job_id} still not finished after {polls} status checks")]
    JobTimeout {
        /// Backend job identifier.
        job_id: u64,
        /// Number of status checks made before giving up.
        polls: u32,
    },

    /// A job id that the backend never issued.
    #[error("Unknown job {job_id}")]
    UnknownJob {
        /// Backend job identifier.
        job_id: u64,
    },

    /// Alice's and Bob's per-trial lists differ in length.
    #[error("Alice has {alice} entries but Bob has {bob}")]
    LengthMismatch {
        /// Length of Alice's list.
        alice: usize,
        /// Length of Bob's list.
        bob: usize,
    },

    /// A CHSH setting combination was never measured.
    #[error("No samples for setting combination {combination}")]
    InsufficientStatistics {
        /// Combination label, e.g. `A1B3`.
        combination: String,
    },

    /// Key-dependent statistics were requested for an empty sifted key.
    #[error("Sifted key is empty")]
    EmptyKey,

    /// A counts entry could not be decoded into party results.
    #[error("Malformed outcome '{outcome}'")]
    MalformedOutcome {
        /// The offending outcome string.
        outcome: String,
    },

    /// Configuration could not be read or is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Config failure message
        message: String,
    },
}
