// src/simulation/results.rs
use crate::core::{ClbitId, QkdError};
use std::collections::HashMap;
use std::fmt;

/// Histogram of classical-register outcomes over the shots of one circuit.
///
/// Keys are bit strings with the highest classical bit first, so bit 0 is the
/// rightmost character (`"0110"` means c3=0, c2=1, c1=1, c0=0).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Counts {
    counts: HashMap<String, usize>,
}

impl Counts {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds one occurrence of `outcome`.
    pub(crate) fn record(&mut self, outcome: String) {
        *self.counts.entry(outcome).or_insert(0) += 1;
    }

    /// Number of times `outcome` was observed.
    pub fn get(&self, outcome: &str) -> usize {
        self.counts.get(outcome).copied().unwrap_or(0)
    }

    /// Total number of shots.
    pub fn shots(&self) -> usize {
        self.counts.values().sum()
    }

    /// The most frequent outcome. Ties resolve to the lexicographically
    /// smallest string so the choice is stable.
    pub fn most_frequent(&self) -> Option<&str> {
        self.counts
            .iter()
            .max_by(|(ka, va), (kb, vb)| va.cmp(vb).then_with(|| kb.cmp(ka)))
            .map(|(k, _)| k.as_str())
    }

    /// All outcomes and their counts.
    pub fn all(&self) -> &HashMap<String, usize> {
        &self.counts
    }
}

impl FromIterator<(String, usize)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, usize)>>(iter: I) -> Self {
        let mut counts = Counts::new();
        for (outcome, n) in iter {
            *counts.counts.entry(outcome).or_insert(0) += n;
        }
        counts
    }
}

/// Reads classical bit `clbit` out of an outcome string.
pub fn outcome_bit(outcome: &str, clbit: ClbitId) -> Result<u8, QkdError> {
    let malformed = || QkdError::MalformedOutcome { outcome: outcome.to_string() };
    let idx = outcome.len().checked_sub(clbit.index() + 1).ok_or_else(malformed)?;
    match outcome.as_bytes().get(idx) {
        Some(b'0') => Ok(0),
        Some(b'1') => Ok(1),
        _ => Err(malformed()),
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sorted: Vec<_> = self.counts.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        write!(f, "{{")?;
        for (i, (outcome, n)) in sorted.into_iter().enumerate() {
            write!(f, "{}'{}': {}", if i > 0 { ", " } else { "" }, outcome, n)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_bit_reads_from_the_right() {
        assert_eq!(outcome_bit("0110", ClbitId(0)), Ok(0));
        assert_eq!(outcome_bit("0110", ClbitId(1)), Ok(1));
        assert_eq!(outcome_bit("0110", ClbitId(2)), Ok(1));
        assert_eq!(outcome_bit("0110", ClbitId(3)), Ok(0));
        assert!(outcome_bit("01", ClbitId(2)).is_err());
        assert!(outcome_bit("0x", ClbitId(0)).is_err());
    }

    #[test]
    fn test_most_frequent_and_display() {
        let counts: Counts = vec![("01".to_string(), 3), ("10".to_string(), 5), ("01".to_string(), 2)]
            .into_iter()
            .collect();
        assert_eq!(counts.shots(), 10);
        assert_eq!(counts.get("01"), 5);
        assert_eq!(counts.most_frequent(), Some("01"));
        assert_eq!(counts.to_string(), "{'01': 5, '10': 5}");
    }
}
