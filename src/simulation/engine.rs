// src/simulation/engine.rs
use crate::core::constants::qkd_constants::AMPLITUDE_TOLERANCE;
use crate::core::{ClbitId, QkdError, QubitId, StateVector};
use crate::operations::Operation;
use num_complex::Complex;
use num_traits::Zero;
use rand::Rng;

/// State-vector engine executing one shot of a circuit.
pub(crate) struct SimulationEngine {
    state: StateVector,
    num_qubits: usize,
    /// Classical register, indexed by clbit.
    clbits: Vec<u8>,
}

impl SimulationEngine {
    /// Initializes `|0...0>` over `num_qubits` qubits and a zeroed classical register.
    pub(crate) fn init(num_qubits: usize, num_clbits: usize) -> Result<Self, QkdError> {
        if num_qubits == 0 {
            return Err(QkdError::InvalidOperation {
                message: "Cannot initialize simulation engine with zero qubits".to_string(),
            });
        }
        if num_qubits >= usize::BITS as usize {
            return Err(QkdError::InvalidOperation {
                message: format!("{} qubits overflow the state vector dimension", num_qubits),
            });
        }
        Ok(Self {
            state: StateVector::zero_state(num_qubits),
            num_qubits,
            clbits: vec![0; num_clbits],
        })
    }

    #[cfg(test)]
    pub(crate) fn set_state(&mut self, state: StateVector) -> Result<(), QkdError> {
        if state.dim() != self.state.dim() {
            return Err(QkdError::InvalidOperation {
                message: format!(
                    "Cannot set state: provided dimension {} does not match engine dimension {}",
                    state.dim(),
                    self.state.dim()
                ),
            });
        }
        self.state = state;
        Ok(())
    }

    pub(crate) fn state(&self) -> &StateVector {
        &self.state
    }

    /// Applies one operation. Measurements draw from `rng`.
    pub(crate) fn apply<R: Rng>(&mut self, op: &Operation, rng: &mut R) -> Result<(), QkdError> {
        match op {
            Operation::Gate { target, gate } => {
                let idx = self.check_qubit(target)?;
                self.apply_single_qubit_gate(idx, &gate.matrix());
            }
            Operation::Controlled { control, target, gate } => {
                let control_idx = self.check_qubit(control)?;
                let target_idx = self.check_qubit(target)?;
                if control_idx == target_idx {
                    return Err(QkdError::InvalidOperation {
                        message: "Control and target qubits cannot be the same for controlled operation"
                            .to_string(),
                    });
                }
                self.apply_controlled_gate(control_idx, target_idx, &gate.matrix());
            }
            Operation::Measure { target, clbit } => {
                let idx = self.check_qubit(target)?;
                let bit = self.measure(idx, rng)?;
                self.write_clbit(*clbit, bit)?;
            }
        }
        Ok(())
    }

    /// Classical register rendered with the highest bit first.
    pub(crate) fn classical_outcome(&self) -> String {
        self.clbits.iter().rev().map(|b| if *b == 1 { '1' } else { '0' }).collect()
    }

    fn check_qubit(&self, qubit: &QubitId) -> Result<usize, QkdError> {
        if qubit.index() < self.num_qubits {
            Ok(qubit.index())
        } else {
            Err(QkdError::ReferenceViolation {
                message: format!("Qubit {} not found in a {}-qubit register", qubit, self.num_qubits),
            })
        }
    }

    fn write_clbit(&mut self, clbit: ClbitId, bit: u8) -> Result<(), QkdError> {
        let len = self.clbits.len();
        let slot = self.clbits.get_mut(clbit.index()).ok_or_else(|| QkdError::ReferenceViolation {
            message: format!("Classical bit {} not found in a {}-bit register", clbit, len),
        })?;
        *slot = bit;
        Ok(())
    }

    /// Bit mask of qubit `idx` inside a basis-state index.
    fn mask(&self, idx: usize) -> usize {
        1 << (self.num_qubits - 1 - idx)
    }

    fn apply_single_qubit_gate(&mut self, target_idx: usize, matrix: &[[Complex<f64>; 2]; 2]) {
        let mask = self.mask(target_idx);
        let amps = self.state.vector_mut();
        for i0 in 0..amps.len() {
            if i0 & mask != 0 {
                continue;
            }
            let i1 = i0 | mask;
            let (psi_0, psi_1) = (amps[i0], amps[i1]);
            amps[i0] = matrix[0][0] * psi_0 + matrix[0][1] * psi_1;
            amps[i1] = matrix[1][0] * psi_0 + matrix[1][1] * psi_1;
        }
    }

    /// Applies `matrix` to the target on the subspace where the control is `|1>`.
    fn apply_controlled_gate(&mut self, control_idx: usize, target_idx: usize, matrix: &[[Complex<f64>; 2]; 2]) {
        let c_mask = self.mask(control_idx);
        let t_mask = self.mask(target_idx);
        let amps = self.state.vector_mut();
        for i0 in 0..amps.len() {
            if i0 & c_mask == 0 || i0 & t_mask != 0 {
                continue;
            }
            let i1 = i0 | t_mask;
            let (psi_0, psi_1) = (amps[i0], amps[i1]);
            amps[i0] = matrix[0][0] * psi_0 + matrix[0][1] * psi_1;
            amps[i1] = matrix[1][0] * psi_0 + matrix[1][1] * psi_1;
        }
    }

    /// Born-rule measurement of one qubit followed by collapse and renormalization.
    fn measure<R: Rng>(&mut self, idx: usize, rng: &mut R) -> Result<u8, QkdError> {
        let mask = self.mask(idx);
        let p_one: f64 = self
            .state
            .vector()
            .iter()
            .enumerate()
            .filter(|(k, _)| k & mask != 0)
            .map(|(_, c)| c.norm_sqr())
            .sum();
        let p_one = p_one.clamp(0.0, 1.0);

        let outcome: u8 = if rng.random::<f64>() < p_one { 1 } else { 0 };
        let p_selected = if outcome == 1 { p_one } else { 1.0 - p_one };
        if p_selected < AMPLITUDE_TOLERANCE {
            return Err(QkdError::Incoherence {
                message: format!("Selected measurement outcome has negligible probability {}", p_selected),
            });
        }

        let scale = 1.0 / p_selected.sqrt();
        for (k, amp) in self.state.vector_mut().iter_mut().enumerate() {
            let bit = u8::from(k & mask != 0);
            if bit == outcome {
                *amp *= scale;
            } else {
                *amp = Complex::zero();
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::Gate;
    use crate::validation::check_normalization;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f64::consts::FRAC_1_SQRT_2;

    const TEST_TOLERANCE: f64 = 1e-9;

    fn assert_complex_vec_approx_equal(actual: &[Complex<f64>], expected: &[Complex<f64>], context: &str) {
        assert_eq!(actual.len(), expected.len(), "Vector length mismatch - {}", context);
        for i in 0..actual.len() {
            let dist_sq = (actual[i] - expected[i]).norm_sqr();
            assert!(
                dist_sq < TEST_TOLERANCE * TEST_TOLERANCE,
                "Vector mismatch at index {} - Actual: {}, Expected: {}, Context: {}",
                i,
                actual[i],
                expected[i],
                context
            );
        }
    }

    #[test]
    fn test_singlet_preparation_amplitudes() -> Result<(), QkdError> {
        let mut rng = StdRng::seed_from_u64(1);
        let mut engine = SimulationEngine::init(2, 0)?;
        for op in [
            Operation::gate(Gate::X, 0),
            Operation::gate(Gate::X, 1),
            Operation::gate(Gate::H, 0),
            Operation::cnot(0, 1),
        ] {
            engine.apply(&op, &mut rng)?;
        }
        let zero = Complex::zero();
        let expected = vec![
            zero,
            Complex::new(FRAC_1_SQRT_2, 0.0),
            Complex::new(-FRAC_1_SQRT_2, 0.0),
            zero,
        ];
        assert_complex_vec_approx_equal(engine.state().vector(), &expected, "singlet");
        Ok(())
    }

    #[test]
    fn test_measure_basis_state_is_deterministic() -> Result<(), QkdError> {
        let mut rng = StdRng::seed_from_u64(7);
        let mut engine = SimulationEngine::init(2, 2)?;
        let mut amps = vec![Complex::zero(); 4];
        amps[2] = Complex::new(1.0, 0.0); // |10>
        engine.set_state(StateVector::new(amps))?;
        engine.apply(&Operation::measure(0, 0), &mut rng)?;
        engine.apply(&Operation::measure(1, 1), &mut rng)?;
        assert_eq!(engine.classical_outcome(), "01");
        Ok(())
    }

    #[test]
    fn test_measurement_collapses_entangled_partner() -> Result<(), QkdError> {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let mut engine = SimulationEngine::init(2, 2)?;
            engine.apply(&Operation::gate(Gate::H, 0), &mut rng)?;
            engine.apply(&Operation::cnot(0, 1), &mut rng)?;
            engine.apply(&Operation::measure(0, 0), &mut rng)?;
            check_normalization(engine.state(), None)?;
            engine.apply(&Operation::measure(1, 1), &mut rng)?;
            let outcome = engine.classical_outcome();
            assert!(outcome == "00" || outcome == "11", "Bell pair gave {}", outcome);
        }
        Ok(())
    }

    #[test]
    fn test_controlled_gate_on_spectator_register() -> Result<(), QkdError> {
        let mut rng = StdRng::seed_from_u64(3);
        let mut engine = SimulationEngine::init(3, 0)?;
        engine.apply(&Operation::gate(Gate::X, 1), &mut rng)?;
        engine.apply(&Operation::cnot(1, 2), &mut rng)?;
        // |010> -> |011>
        assert!((engine.state().probability(3) - 1.0).abs() < TEST_TOLERANCE);
        Ok(())
    }

    #[test]
    fn test_invalid_references() -> Result<(), QkdError> {
        let mut rng = StdRng::seed_from_u64(0);
        let mut engine = SimulationEngine::init(1, 1)?;
        assert!(matches!(
            engine.apply(&Operation::gate(Gate::H, 1), &mut rng),
            Err(QkdError::ReferenceViolation { .. })
        ));
        assert!(matches!(
            engine.apply(&Operation::measure(0, 4), &mut rng),
            Err(QkdError::ReferenceViolation { .. })
        ));
        let mut two = SimulationEngine::init(2, 0)?;
        assert!(matches!(
            two.apply(&Operation::cnot(1, 1), &mut rng),
            Err(QkdError::InvalidOperation { .. })
        ));
        assert!(SimulationEngine::init(0, 0).is_err());
        Ok(())
    }
}
