// src/protocol/sifting.rs

//! Turning raw outcomes into ±1 results and sifting the shared key.

use super::basis::{AliceSetting, BobSetting, is_key_pair};
use super::{ALICE_CLBIT, BOB_CLBIT, EVE_ALICE_CLBIT, EVE_BOB_CLBIT};
use crate::core::QkdError;
use crate::simulation::outcome_bit;
use serde::{Deserialize, Serialize};

/// Maps a measured bit to a spin value: 0 → −1, 1 → +1.
pub fn spin(bit: u8) -> i8 {
    if bit == 1 { 1 } else { -1 }
}

/// Maps a spin value back to a key bit: −1 → 0, +1 → 1.
pub fn bit(spin: i8) -> u8 {
    u8::from(spin > 0)
}

/// ±1 results of one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairOutcome {
    /// Alice's result.
    pub alice: i8,
    /// Bob's result.
    pub bob: i8,
    /// Eve's results on Alice's and Bob's qubits.
    pub eve: Option<(i8, i8)>,
}

/// Decodes a single-shot outcome string into party results.
///
/// Alice's bit is c0 and Bob's c1; with `with_eve`, Eve's bits are c2
/// (Alice's qubit) and c3 (Bob's qubit).
pub fn decode_outcome(outcome: &str, with_eve: bool) -> Result<PairOutcome, QkdError> {
    let alice = spin(outcome_bit(outcome, ALICE_CLBIT)?);
    let bob = spin(outcome_bit(outcome, BOB_CLBIT)?);
    let eve = if with_eve {
        Some((
            spin(outcome_bit(outcome, EVE_ALICE_CLBIT)?),
            spin(outcome_bit(outcome, EVE_BOB_CLBIT)?),
        ))
    } else {
        None
    };
    Ok(PairOutcome { alice, bob, eve })
}

/// Per-trial choices and results of one protocol run.
///
/// All lists are indexed by trial and must have the same length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeasurementRecord {
    /// Alice's setting per trial.
    pub alice_choices: Vec<AliceSetting>,
    /// Bob's setting per trial.
    pub bob_choices: Vec<BobSetting>,
    /// Alice's ±1 result per trial.
    pub alice_results: Vec<i8>,
    /// Bob's ±1 result per trial.
    pub bob_results: Vec<i8>,
    /// Eve's ±1 results per trial, when she was present.
    pub eve_results: Option<Vec<(i8, i8)>>,
}

impl MeasurementRecord {
    /// Number of trials.
    pub fn len(&self) -> usize {
        self.alice_choices.len()
    }

    /// `true` if no trials were recorded.
    pub fn is_empty(&self) -> bool {
        self.alice_choices.is_empty()
    }

    /// Appends one trial.
    pub fn push(&mut self, alice: AliceSetting, bob: BobSetting, outcome: PairOutcome) {
        self.alice_choices.push(alice);
        self.bob_choices.push(bob);
        self.alice_results.push(outcome.alice);
        self.bob_results.push(outcome.bob);
        if let Some(eve) = outcome.eve {
            self.eve_results.get_or_insert_with(Vec::new).push(eve);
        }
    }

    /// Checks that every list has one entry per trial.
    pub fn validate(&self) -> Result<(), QkdError> {
        let n = self.alice_choices.len();
        if self.bob_choices.len() != n {
            return Err(QkdError::LengthMismatch { alice: n, bob: self.bob_choices.len() });
        }
        if self.alice_results.len() != self.bob_results.len() {
            return Err(QkdError::LengthMismatch {
                alice: self.alice_results.len(),
                bob: self.bob_results.len(),
            });
        }
        if self.alice_results.len() != n {
            return Err(QkdError::LengthMismatch { alice: n, bob: self.alice_results.len() });
        }
        if let Some(eve) = &self.eve_results {
            if eve.len() != n {
                return Err(QkdError::LengthMismatch { alice: n, bob: eve.len() });
            }
        }
        Ok(())
    }
}

/// Key bits kept after sifting, as ±1 values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SiftedKey {
    /// Alice's key.
    pub alice: Vec<i8>,
    /// Bob's key (his results negated).
    pub bob: Vec<i8>,
    /// Eve's guesses for (Alice's bit, Bob's bit).
    pub eve: Option<Vec<(i8, i8)>>,
}

impl SiftedKey {
    /// Key length.
    pub fn len(&self) -> usize {
        self.alice.len()
    }

    /// `true` if no bits survived sifting.
    pub fn is_empty(&self) -> bool {
        self.alice.is_empty()
    }

    /// Positions where Alice's and Bob's bits differ.
    pub fn mismatches(&self) -> usize {
        self.alice.iter().zip(&self.bob).filter(|(a, b)| a != b).count()
    }

    /// Alice's key as a `0`/`1` string.
    pub fn alice_bits(&self) -> String {
        render_bits(&self.alice)
    }

    /// Bob's key as a `0`/`1` string.
    pub fn bob_bits(&self) -> String {
        render_bits(&self.bob)
    }
}

fn render_bits(spins: &[i8]) -> String {
    spins.iter().map(|s| if bit(*s) == 1 { '1' } else { '0' }).collect()
}

/// Keeps the trials where both parties measured the same observable.
///
/// The singlet makes those results anti-correlated, so Bob's key bit is his
/// result negated. Eve's guess for Bob's bit is negated the same way.
pub fn sift(record: &MeasurementRecord) -> Result<SiftedKey, QkdError> {
    record.validate()?;

    let mut key = SiftedKey {
        eve: record.eve_results.as_ref().map(|_| Vec::new()),
        ..SiftedKey::default()
    };
    for i in 0..record.len() {
        if !is_key_pair(record.alice_choices[i], record.bob_choices[i]) {
            continue;
        }
        key.alice.push(record.alice_results[i]);
        key.bob.push(-record.bob_results[i]);
        if let (Some(eve_key), Some(eve)) = (key.eve.as_mut(), record.eve_results.as_ref()) {
            let (on_alice, on_bob) = eve[i];
            eve_key.push((on_alice, -on_bob));
        }
    }
    Ok(key)
}
