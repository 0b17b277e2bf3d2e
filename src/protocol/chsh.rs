// src/protocol/chsh.rs

//! CHSH correlation over the non-key setting pairs.

use super::basis::{AliceSetting, BobSetting};
use super::sifting::MeasurementRecord;
use crate::core::{CLASSICAL_CHSH_BOUND, QkdError};
use serde::{Deserialize, Serialize};

/// Setting pairs entering the CHSH sum, with their signs:
/// `E(a1,b1) − E(a1,b3) + E(a3,b1) + E(a3,b3)`.
const CHSH_TERMS: [(AliceSetting, BobSetting, f64); 4] = [
    (AliceSetting::A1, BobSetting::B1, 1.0),
    (AliceSetting::A1, BobSetting::B3, -1.0),
    (AliceSetting::A3, BobSetting::B1, 1.0),
    (AliceSetting::A3, BobSetting::B3, 1.0),
];

/// Outcome tallies for one setting pair, indexed as
/// `[(−1,−1), (+1,−1), (−1,+1), (+1,+1)]` for (Alice, Bob).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PatternCounts(pub [usize; 4]);

impl PatternCounts {
    fn record(&mut self, alice: i8, bob: i8) {
        let idx = usize::from(alice > 0) + 2 * usize::from(bob > 0);
        self.0[idx] += 1;
    }

    /// Number of samples.
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Mean of the product of both results, `None` without samples.
    pub fn expectation(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let [mm, pm, mp, pp] = self.0;
        Some((mm as f64 - pm as f64 - mp as f64 + pp as f64) / total as f64)
    }
}

/// Tallies and expectations for the four CHSH setting pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChshStatistics {
    /// Tallies in the order A1B1, A1B3, A3B1, A3B3.
    pub counts: [PatternCounts; 4],
    /// Expectation values in the same order.
    pub expectations: [f64; 4],
    /// The CHSH correlation value.
    pub value: f64,
}

impl ChshStatistics {
    /// Tallies the CHSH setting pairs of `record`.
    ///
    /// # Errors
    /// * `QkdError::LengthMismatch` for uneven lists.
    /// * `QkdError::InsufficientStatistics` if a pair was never measured.
    pub fn from_record(record: &MeasurementRecord) -> Result<Self, QkdError> {
        record.validate()?;

        let mut counts = [PatternCounts::default(); 4];
        for i in 0..record.len() {
            let (a, b) = (record.alice_choices[i], record.bob_choices[i]);
            if let Some(term) = CHSH_TERMS.iter().position(|(ta, tb, _)| *ta == a && *tb == b) {
                counts[term].record(record.alice_results[i], record.bob_results[i]);
            }
        }

        let mut expectations = [0.0; 4];
        let mut value = 0.0;
        for (term, (a, b, sign)) in CHSH_TERMS.iter().enumerate() {
            let e = counts[term].expectation().ok_or_else(|| QkdError::InsufficientStatistics {
                combination: format!("A{}B{}", a.index(), b.index()),
            })?;
            expectations[term] = e;
            value += sign * e;
        }

        Ok(Self { counts, expectations, value })
    }

    /// `true` when |CHSH| exceeds the local hidden-variable bound of 2.
    pub fn violates_classical_bound(&self) -> bool {
        self.value.abs() > CLASSICAL_CHSH_BOUND
    }
}

/// CHSH correlation value of `record`.
pub fn chsh_correlation(record: &MeasurementRecord) -> Result<f64, QkdError> {
    ChshStatistics::from_record(record).map(|stats| stats.value)
}
