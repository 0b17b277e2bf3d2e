// src/core/qubit.rs

use std::fmt;

/// Index of a qubit within a circuit.
///
/// Qubit 0 is the most significant position of the simulated state vector,
/// so the basis state `|q0 q1 ...>` reads left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QubitId(pub usize);

impl QubitId {
    /// Position of this qubit inside the circuit's register.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// Index of a classical bit receiving a measurement outcome.
///
/// Outcome strings list classical bits from the highest index down to bit 0,
/// so bit 0 is the rightmost character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClbitId(pub usize);

impl ClbitId {
    /// Position of this bit inside the classical register.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ClbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}
