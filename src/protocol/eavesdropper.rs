// src/protocol/eavesdropper.rs

//! Eve's intercept-resend attack and how much of the key it reveals.

use super::basis::Basis;
use super::sifting::SiftedKey;
use crate::core::QkdError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which observable Eve measures on both qubits of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EveStrategy {
    /// W on Alice's qubit and W on Bob's.
    WW,
    /// Z on Alice's qubit and Z on Bob's.
    ZZ,
}

impl EveStrategy {
    /// Basis Eve uses on each qubit.
    pub fn basis(&self) -> Basis {
        match self {
            EveStrategy::WW => Basis::W,
            EveStrategy::ZZ => Basis::Z,
        }
    }

    /// WW or ZZ with equal probability.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) { EveStrategy::WW } else { EveStrategy::ZZ }
    }
}

impl fmt::Display for EveStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EveStrategy::WW => f.write_str("WW"),
            EveStrategy::ZZ => f.write_str("ZZ"),
        }
    }
}

/// Fraction of sifted key bits Eve guessed correctly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EveKnowledge {
    /// Agreement with Alice's key.
    pub alice: f64,
    /// Agreement with Bob's key.
    pub bob: f64,
}

/// Compares Eve's guesses with both parties' keys.
///
/// # Errors
/// * `QkdError::EmptyKey` when no bits were sifted.
/// * `QkdError::InvalidOperation` when the key carries no eavesdropper record.
pub fn estimate_eve_knowledge(key: &SiftedKey) -> Result<EveKnowledge, QkdError> {
    let eve = key.eve.as_ref().ok_or_else(|| QkdError::InvalidOperation {
        message: "Sifted key has no eavesdropper record".to_string(),
    })?;
    if key.is_empty() {
        return Err(QkdError::EmptyKey);
    }
    if eve.len() != key.len() {
        return Err(QkdError::LengthMismatch { alice: key.len(), bob: eve.len() });
    }

    let len = key.len() as f64;
    let alice_hits = eve.iter().zip(&key.alice).filter(|((guess, _), bit)| guess == *bit).count();
    let bob_hits = eve.iter().zip(&key.bob).filter(|((_, guess), bit)| guess == *bit).count();

    Ok(EveKnowledge {
        alice: alice_hits as f64 / len,
        bob: bob_hits as f64 / len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knowledge_counts_matching_guesses() -> Result<(), QkdError> {
        let key = SiftedKey {
            alice: vec![1, -1, 1, 1],
            bob: vec![1, -1, -1, 1],
            eve: Some(vec![(1, 1), (1, -1), (1, 1), (-1, -1)]),
        };
        let knowledge = estimate_eve_knowledge(&key)?;
        assert_eq!(knowledge, EveKnowledge { alice: 0.5, bob: 0.5 });
        Ok(())
    }

    #[test]
    fn test_knowledge_needs_key_and_record() {
        let empty = SiftedKey { alice: vec![], bob: vec![], eve: Some(vec![]) };
        assert_eq!(estimate_eve_knowledge(&empty), Err(QkdError::EmptyKey));
        let no_eve = SiftedKey { alice: vec![1], bob: vec![1], eve: None };
        assert!(matches!(estimate_eve_knowledge(&no_eve), Err(QkdError::InvalidOperation { .. })));
    }
}
