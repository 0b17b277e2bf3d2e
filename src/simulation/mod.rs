// src/simulation/mod.rs

//! Executes [`Circuit`]s shot by shot on a state-vector engine.

mod results;
pub(crate) mod engine;

pub use results::{Counts, outcome_bit};

use crate::circuits::Circuit;
use crate::core::QkdError;
use crate::validation::check_normalization;
use engine::SimulationEngine;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Runs circuits and collects measurement histograms.
///
/// Every shot starts from `|0...0>`. Measurement randomness comes from an
/// internal `StdRng`, so a seeded simulator replays the same outcomes.
pub struct Simulator {
    rng: StdRng,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    /// Creates a simulator seeded from the operating system.
    pub fn new() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }

    /// Creates a simulator with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Runs `circuit` for `shots` shots.
    ///
    /// # Returns
    /// * `Ok(Counts)` keyed by classical-register outcome.
    /// * `Err(QkdError)` if an operation references a missing qubit or bit,
    ///   or the state loses normalization.
    pub fn run(&mut self, circuit: &Circuit, shots: usize) -> Result<Counts, QkdError> {
        let mut counts = Counts::new();
        if circuit.is_empty() {
            return Ok(counts);
        }

        for _ in 0..shots {
            let mut engine = SimulationEngine::init(circuit.num_qubits(), circuit.num_clbits())?;
            for op in circuit.operations() {
                engine.apply(op, &mut self.rng)?;
            }
            check_normalization(engine.state(), None)?;
            counts.record(engine.classical_outcome());
        }
        Ok(counts)
    }

    /// Runs each circuit in order, one `Counts` per circuit.
    pub fn run_all(&mut self, circuits: &[Circuit], shots: usize) -> Result<Vec<Counts>, QkdError> {
        circuits.iter().map(|c| self.run(c, shots)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::CircuitBuilder;
    use crate::operations::Gate;

    #[test]
    fn test_seeded_runs_repeat() -> Result<(), QkdError> {
        let circuit = CircuitBuilder::new().gate(Gate::H, 0).measure(0, 0).build();
        let a = Simulator::with_seed(11).run(&circuit, 64)?;
        let b = Simulator::with_seed(11).run(&circuit, 64)?;
        assert_eq!(a, b);
        assert_eq!(a.shots(), 64);
        Ok(())
    }

    #[test]
    fn test_hadamard_statistics_are_balanced() -> Result<(), QkdError> {
        let circuit = CircuitBuilder::new().gate(Gate::H, 0).measure(0, 0).build();
        let counts = Simulator::with_seed(5).run(&circuit, 4000)?;
        let ones = counts.get("1") as f64 / 4000.0;
        assert!((ones - 0.5).abs() < 0.05, "P(1) = {}", ones);
        Ok(())
    }

    #[test]
    fn test_unmeasured_circuit_reports_empty_register() -> Result<(), QkdError> {
        let circuit = CircuitBuilder::new().gate(Gate::X, 0).build();
        let counts = Simulator::with_seed(0).run(&circuit, 3)?;
        assert_eq!(counts.get(""), 3);
        Ok(())
    }
}
