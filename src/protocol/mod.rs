// src/protocol/mod.rs

//! The E91 protocol driver and its classical post-processing.
//!
//! A run draws random settings for every singlet, executes one single-shot
//! circuit per singlet on a [`Backend`], decodes the outcomes into ±1
//! results, and then:
//!
//! * computes the CHSH correlation from the (X|Z) × (W|V) trials,
//! * sifts the key from the (W, W) and (Z, Z) trials,
//! * with an eavesdropper, measures how much of the key Eve holds.

pub mod basis;
pub mod chsh;
pub mod eavesdropper;
pub mod sifting;
pub mod stages;

pub use basis::{AliceSetting, Basis, BobSetting, is_key_pair};
pub use chsh::{ChshStatistics, PatternCounts, chsh_correlation};
pub use eavesdropper::{EveKnowledge, EveStrategy, estimate_eve_knowledge};
pub use sifting::{MeasurementRecord, PairOutcome, SiftedKey, decode_outcome, sift};

use crate::backend::{Backend, execute_batched};
use crate::config::ProtocolConfig;
use crate::core::{ClbitId, QkdError, QubitId, TSIRELSON_BOUND};
use crate::simulation::Counts;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, info_span, warn};

/// Alice's half of the pair.
pub const ALICE_QUBIT: QubitId = QubitId(0);
/// Bob's half of the pair.
pub const BOB_QUBIT: QubitId = QubitId(1);
/// Alice's measurement result.
pub const ALICE_CLBIT: ClbitId = ClbitId(0);
/// Bob's measurement result.
pub const BOB_CLBIT: ClbitId = ClbitId(1);
/// Eve's measurement of Alice's qubit.
pub const EVE_ALICE_CLBIT: ClbitId = ClbitId(2);
/// Eve's measurement of Bob's qubit.
pub const EVE_BOB_CLBIT: ClbitId = ClbitId(3);

/// Settings used for one singlet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trial {
    /// Alice's setting.
    pub alice: AliceSetting,
    /// Bob's setting.
    pub bob: BobSetting,
    /// Eve's strategy, if she intercepts this pair.
    pub eve: Option<EveStrategy>,
}

impl Trial {
    /// Independent uniform settings for Alice and Bob, plus a random Eve
    /// strategy when `eavesdropper` is set.
    pub fn random<R: Rng>(rng: &mut R, eavesdropper: bool) -> Self {
        let alice = AliceSetting::random(rng);
        let bob = BobSetting::random(rng);
        let eve = eavesdropper.then(|| EveStrategy::random(rng));
        Self { alice, bob, eve }
    }

    /// Circuit label such as `A2B1` or `A2B1_EWW`.
    pub fn label(&self) -> String {
        match self.eve {
            Some(eve) => format!("A{}B{}_E{}", self.alice.index(), self.bob.index(), eve),
            None => format!("A{}B{}", self.alice.index(), self.bob.index()),
        }
    }
}

/// Builds the per-trial record from single-shot counts.
pub fn record_from_counts(trials: &[Trial], counts: &[Counts]) -> Result<MeasurementRecord, QkdError> {
    if trials.len() != counts.len() {
        return Err(QkdError::LengthMismatch { alice: trials.len(), bob: counts.len() });
    }
    let mut record = MeasurementRecord::default();
    for (trial, counts) in trials.iter().zip(counts) {
        let outcome = counts
            .most_frequent()
            .ok_or_else(|| QkdError::MalformedOutcome { outcome: String::new() })?;
        record.push(trial.alice, trial.bob, decode_outcome(outcome, trial.eve.is_some())?);
    }
    Ok(record)
}

/// Summary of one protocol run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolReport {
    /// Number of singlets used.
    pub singlets: usize,
    /// Whether Eve intercepted the pairs.
    pub eavesdropper: bool,
    /// CHSH tallies and value.
    pub chsh: ChshStatistics,
    /// Sifted key length.
    pub key_length: usize,
    /// Positions where Alice's and Bob's keys differ.
    pub mismatches: usize,
    /// Alice's key as a bit string.
    pub alice_key: String,
    /// Bob's key as a bit string.
    pub bob_key: String,
    /// Eve's share of each key, when she was present and a key was sifted.
    pub eve_knowledge: Option<EveKnowledge>,
}

impl ProtocolReport {
    /// The CHSH correlation value.
    pub fn chsh_value(&self) -> f64 {
        self.chsh.value
    }

    /// `true` if the run violated the CHSH bound, i.e. entanglement survived.
    pub fn entanglement_confirmed(&self) -> bool {
        self.chsh.violates_classical_bound()
    }
}

impl fmt::Display for ProtocolReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "E91 run over {} singlets{}", self.singlets, if self.eavesdropper { " (with Eve)" } else { "" })?;
        writeln!(f, "CHSH correlation value: {:.3}", self.chsh.value)?;
        writeln!(f, "  (ideal singlet: {:.3}, classical bound: ±2)", -TSIRELSON_BOUND)?;
        writeln!(f, "Length of the key: {}", self.key_length)?;
        writeln!(f, "Number of mismatching bits: {}", self.mismatches)?;
        if let Some(knowledge) = &self.eve_knowledge {
            writeln!(f, "Eve's knowledge of Alice's key: {:.2} %", knowledge.alice * 100.0)?;
            writeln!(f, "Eve's knowledge of Bob's key: {:.2} %", knowledge.bob * 100.0)?;
        }
        if self.entanglement_confirmed() {
            write!(f, "CHSH bound violated: the key can be trusted")
        } else {
            write!(f, "CHSH bound respected: the channel was disturbed, discard the key")
        }
    }
}

/// Runs the protocol end to end on `backend`.
///
/// Settings are drawn from `config.seed` when given. Measurement randomness
/// belongs to the backend, so a fully reproducible run needs a seeded backend
/// as well (see [`ProtocolConfig::backend_seed`]).
///
/// # Errors
/// Configuration, job, and decoding errors propagate; a run too short to
/// sample every CHSH setting pair fails with
/// `QkdError::InsufficientStatistics`.
pub fn run_protocol<B: Backend + ?Sized>(config: &ProtocolConfig, backend: &mut B) -> Result<ProtocolReport, QkdError> {
    config.validate()?;
    let span = info_span!("e91", singlets = config.singlets, eavesdropper = config.eavesdropper);
    let _guard = span.enter();

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let trials: Vec<Trial> = (0..config.singlets).map(|_| Trial::random(&mut rng, config.eavesdropper)).collect();
    let circuits = stages::trial_circuits(&trials);
    debug!(circuits = circuits.len(), backend = backend.name(), "built trial circuits");

    let counts = execute_batched(backend, &circuits, 1, config.batch_size, &config.poll)?;
    let record = record_from_counts(&trials, &counts)?;

    let chsh = ChshStatistics::from_record(&record)?;
    let key = sift(&record)?;
    let mismatches = key.mismatches();

    let eve_knowledge = if config.eavesdropper {
        if key.is_empty() {
            warn!("no key bits were sifted, Eve's knowledge is undefined");
            None
        } else {
            Some(estimate_eve_knowledge(&key)?)
        }
    } else {
        None
    };

    info!(
        chsh = chsh.value,
        key_length = key.len(),
        mismatches,
        violated = chsh.violates_classical_bound(),
        "protocol finished"
    );

    Ok(ProtocolReport {
        singlets: config.singlets,
        eavesdropper: config.eavesdropper,
        key_length: key.len(),
        mismatches,
        alice_key: key.alice_bits(),
        bob_key: key.bob_bits(),
        chsh,
        eve_knowledge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalBackend;
    use crate::config::PollConfig;

    fn config(singlets: usize, eavesdropper: bool, seed: u64) -> ProtocolConfig {
        ProtocolConfig {
            singlets,
            eavesdropper,
            seed: Some(seed),
            batch_size: 64,
            poll: PollConfig { interval_ms: 0, max_polls: 5 },
        }
    }

    #[test]
    fn test_trial_labels() {
        let trial = Trial { alice: AliceSetting::A3, bob: BobSetting::B2, eve: None };
        assert_eq!(trial.label(), "A3B2");
        assert_eq!(Trial { eve: Some(EveStrategy::WW), ..trial }.label(), "A3B2_EWW");
    }

    #[test]
    fn test_record_from_counts_rejects_uneven_input() {
        let trial = Trial { alice: AliceSetting::A1, bob: BobSetting::B1, eve: None };
        assert!(matches!(
            record_from_counts(&[trial], &[]),
            Err(QkdError::LengthMismatch { alice: 1, bob: 0 })
        ));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() -> Result<(), QkdError> {
        let cfg = config(120, false, 3);
        let a = run_protocol(&cfg, &mut LocalBackend::seeded(4))?;
        let b = run_protocol(&cfg, &mut LocalBackend::seeded(4))?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn test_too_few_singlets_lack_statistics() {
        let cfg = config(1, false, 3);
        assert!(matches!(
            run_protocol(&cfg, &mut LocalBackend::seeded(4)),
            Err(QkdError::InsufficientStatistics { .. })
        ));
    }
}
