// src/operations/mod.rs

//! Gates and circuit operations.
//!
//! The gate set is the one the E91 measurement circuits need: Pauli X and Z,
//! Hadamard, the S and T phase gates with their inverses, and a general phase
//! shift. Operations place gates on qubits, condition them on a control
//! qubit, or measure a qubit into a classical bit.

use crate::core::{ClbitId, QubitId};
use num_complex::Complex;
use num_traits::Zero;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};

/// A single-qubit unitary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gate {
    /// Identity.
    I,
    /// Pauli X (bit flip).
    X,
    /// Pauli Z (phase flip).
    Z,
    /// Hadamard.
    H,
    /// Phase π/2.
    S,
    /// Phase −π/2.
    Sdg,
    /// Phase π/4.
    T,
    /// Phase −π/4.
    Tdg,
    /// Phase `e^(iθ)` on `|1>`.
    Phase(f64),
}

impl Gate {
    /// The 2x2 matrix in the `{|0>, |1>}` basis.
    pub fn matrix(&self) -> [[Complex<f64>; 2]; 2] {
        let one = Complex::new(1.0, 0.0);
        let zero = Complex::zero();
        match self {
            Gate::I => [[one, zero], [zero, one]],
            Gate::X => [[zero, one], [one, zero]],
            Gate::Z => [[one, zero], [zero, -one]],
            Gate::H => [
                [Complex::new(FRAC_1_SQRT_2, 0.0), Complex::new(FRAC_1_SQRT_2, 0.0)],
                [Complex::new(FRAC_1_SQRT_2, 0.0), Complex::new(-FRAC_1_SQRT_2, 0.0)],
            ],
            Gate::S => phase_matrix(std::f64::consts::FRAC_PI_2),
            Gate::Sdg => phase_matrix(-std::f64::consts::FRAC_PI_2),
            Gate::T => phase_matrix(FRAC_PI_4),
            Gate::Tdg => phase_matrix(-FRAC_PI_4),
            Gate::Phase(theta) => phase_matrix(*theta),
        }
    }

    /// The adjoint gate, so that `g` followed by `g.inverse()` is the identity.
    pub fn inverse(&self) -> Gate {
        match self {
            Gate::S => Gate::Sdg,
            Gate::Sdg => Gate::S,
            Gate::T => Gate::Tdg,
            Gate::Tdg => Gate::T,
            Gate::Phase(theta) => Gate::Phase(-theta),
            other => *other,
        }
    }

    /// Short label used in circuit diagrams.
    pub fn symbol(&self) -> &'static str {
        match self {
            Gate::I => "I",
            Gate::X => "X",
            Gate::Z => "Z",
            Gate::H => "H",
            Gate::S => "S",
            Gate::Sdg => "S†",
            Gate::T => "T",
            Gate::Tdg => "T†",
            Gate::Phase(_) => "P",
        }
    }
}

/// `diag(1, e^(iθ))`
fn phase_matrix(theta: f64) -> [[Complex<f64>; 2]; 2] {
    [
        [Complex::new(1.0, 0.0), Complex::zero()],
        [Complex::zero(), Complex::new(theta.cos(), theta.sin())],
    ]
}

/// One step of a circuit.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Apply `gate` to `target`.
    Gate {
        /// Qubit the gate acts on.
        target: QubitId,
        /// The unitary applied.
        gate: Gate,
    },

    /// Apply `gate` to `target` when `control` is `|1>`.
    ///
    /// `Gate::X` gives the CNOT used to entangle the singlet pair.
    Controlled {
        /// Qubit whose `|1>` component enables the gate.
        control: QubitId,
        /// Qubit the gate acts on.
        target: QubitId,
        /// The unitary applied to the target.
        gate: Gate,
    },

    /// Projective measurement of `target` in the computational basis,
    /// writing the outcome into `clbit`. The state collapses.
    Measure {
        /// Measured qubit.
        target: QubitId,
        /// Classical bit receiving the outcome.
        clbit: ClbitId,
    },
}

impl Operation {
    /// Shorthand for [`Operation::Gate`].
    pub fn gate(gate: Gate, target: usize) -> Self {
        Operation::Gate { target: QubitId(target), gate }
    }

    /// Shorthand for a CNOT.
    pub fn cnot(control: usize, target: usize) -> Self {
        Operation::Controlled {
            control: QubitId(control),
            target: QubitId(target),
            gate: Gate::X,
        }
    }

    /// Shorthand for [`Operation::Measure`].
    pub fn measure(target: usize, clbit: usize) -> Self {
        Operation::Measure { target: QubitId(target), clbit: ClbitId(clbit) }
    }

    /// Returns all qubits the operation touches.
    pub fn involved_qubits(&self) -> Vec<QubitId> {
        match self {
            Operation::Gate { target, .. } => vec![*target],
            Operation::Controlled { control, target, .. } => vec![*control, *target],
            Operation::Measure { target, .. } => vec![*target],
        }
    }

    /// Returns the classical bit written by the operation, if any.
    pub fn written_clbit(&self) -> Option<ClbitId> {
        match self {
            Operation::Measure { clbit, .. } => Some(*clbit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mat_mul(a: &[[Complex<f64>; 2]; 2], b: &[[Complex<f64>; 2]; 2]) -> [[Complex<f64>; 2]; 2] {
        let mut out = [[Complex::zero(); 2]; 2];
        for r in 0..2 {
            for c in 0..2 {
                out[r][c] = a[r][0] * b[0][c] + a[r][1] * b[1][c];
            }
        }
        out
    }

    #[test]
    fn test_gate_times_inverse_is_identity() {
        for gate in [Gate::X, Gate::Z, Gate::H, Gate::S, Gate::T, Gate::Tdg, Gate::Phase(0.3)] {
            let product = mat_mul(&gate.inverse().matrix(), &gate.matrix());
            for r in 0..2 {
                for c in 0..2 {
                    let expected = if r == c { 1.0 } else { 0.0 };
                    assert!((product[r][c] - Complex::new(expected, 0.0)).norm() < 1e-12, "{:?}", gate);
                }
            }
        }
    }

    #[test]
    fn test_involved_qubits() {
        assert_eq!(Operation::cnot(0, 1).involved_qubits(), vec![QubitId(0), QubitId(1)]);
        assert_eq!(Operation::measure(1, 3).written_clbit(), Some(ClbitId(3)));
        assert_eq!(Operation::gate(Gate::H, 0).written_clbit(), None);
    }
}
