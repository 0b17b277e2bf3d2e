// src/lib.rs

//! `e91` - Entanglement-based quantum key distribution
//!
//! Alice and Bob share singlet pairs, measure them in randomly chosen bases,
//! keep the results from matching bases as a secret key, and use the
//! remaining results to test the CHSH inequality. A violation close to
//! `-2√2` shows the pairs were still entangled; an intercept-resend
//! eavesdropper pushes the value back inside the classical bound and leaves
//! errors in the key.
//!
//! The crate contains the small circuit layer the protocol runs on (gates,
//! measurements, a state-vector simulator, and a job-based backend with
//! polling) and the classical post-processing.

pub mod core;
pub mod operations;
pub mod circuits;
pub mod simulation;
pub mod validation;
pub mod backend;
pub mod config;
pub mod protocol;

pub use crate::core::{CLASSICAL_CHSH_BOUND, ClbitId, QkdError, QubitId, StateVector, TSIRELSON_BOUND};
pub use crate::operations::{Gate, Operation};
pub use crate::circuits::{Circuit, CircuitBuilder};
pub use crate::simulation::{Counts, Simulator};
pub use crate::backend::{Backend, JobId, JobResult, JobStatus, LocalBackend};
pub use crate::config::{PollConfig, ProtocolConfig};
pub use crate::protocol::{ProtocolReport, Trial, run_protocol};
pub use crate::validation::{check_normalization, validate_state};

// Example 1: A full run without an eavesdropper.
/// ```
/// use e91::{LocalBackend, PollConfig, ProtocolConfig, run_protocol};
///
/// let config = ProtocolConfig {
///     singlets: 1000,
///     seed: Some(2024),
///     poll: PollConfig { interval_ms: 0, max_polls: 3 },
///     ..ProtocolConfig::default()
/// };
/// let mut backend = LocalBackend::seeded(config.backend_seed().unwrap());
/// let report = run_protocol(&config, &mut backend).unwrap();
///
/// // Singlet statistics violate the CHSH bound and the keys agree.
/// assert!(report.chsh_value() < -2.0);
/// assert_eq!(report.mismatches, 0);
/// assert_eq!(report.alice_key, report.bob_key);
/// ```
#[doc(hidden)]
const _: () = ();

// Example 2: One trial circuit, printed and executed directly.
/// ```
/// use e91::protocol::{AliceSetting, BobSetting, Trial, stages};
/// use e91::Simulator;
///
/// let trial = Trial { alice: AliceSetting::A3, bob: BobSetting::B2, eve: None };
/// let circuit = stages::trial_circuit(&trial);
/// println!("{}", circuit);
///
/// // Both parties measure Z: the outcomes are always opposite.
/// let counts = Simulator::with_seed(1).run(&circuit, 100).unwrap();
/// assert_eq!(counts.get("00") + counts.get("11"), 0);
/// ```
#[doc(hidden)]
const _: () = ();
