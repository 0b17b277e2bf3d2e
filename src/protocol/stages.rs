// src/protocol/stages.rs

//! Circuit fragments for one E91 trial.

use super::basis::{AliceSetting, Basis, BobSetting};
use super::eavesdropper::EveStrategy;
use super::{ALICE_CLBIT, ALICE_QUBIT, BOB_CLBIT, BOB_QUBIT, EVE_ALICE_CLBIT, EVE_BOB_CLBIT, Trial};
use crate::circuits::{Circuit, CircuitBuilder};
use crate::core::{ClbitId, QubitId};
use crate::operations::{Gate, Operation};
use std::collections::HashMap;

/// Prepares the singlet (|01> − |10>)/√2 on Alice's and Bob's qubits.
pub fn singlet() -> Circuit {
    let (a, b) = (ALICE_QUBIT.index(), BOB_QUBIT.index());
    CircuitBuilder::named("singlet")
        .gate(Gate::X, a)
        .gate(Gate::X, b)
        .gate(Gate::H, a)
        .cnot(a, b)
        .build()
}

/// Rotation plus computational-basis measurement of `basis` on one qubit.
pub fn measure_in_basis(basis: Basis, qubit: QubitId, clbit: ClbitId) -> Vec<Operation> {
    let mut ops: Vec<Operation> = basis
        .rotation()
        .iter()
        .map(|gate| Operation::Gate { target: qubit, gate: *gate })
        .collect();
    ops.push(Operation::Measure { target: qubit, clbit });
    ops
}

/// Alice's measurement stage.
pub fn alice_measurement(setting: AliceSetting) -> Circuit {
    let mut circuit = Circuit::named(format!("A{}", setting.index()));
    circuit.add_operations(measure_in_basis(setting.basis(), ALICE_QUBIT, ALICE_CLBIT));
    circuit
}

/// Bob's measurement stage.
pub fn bob_measurement(setting: BobSetting) -> Circuit {
    let mut circuit = Circuit::named(format!("B{}", setting.index()));
    circuit.add_operations(measure_in_basis(setting.basis(), BOB_QUBIT, BOB_CLBIT));
    circuit
}

/// Eve's intercept-resend stage.
///
/// Eve measures both qubits in her basis (Alice's into c2, Bob's into c3)
/// and rotates them back, so each qubit is passed on in the eigenstate of
/// her observable that she observed.
pub fn eve_measurement(strategy: EveStrategy) -> Circuit {
    let basis = strategy.basis();
    let mut circuit = Circuit::named(format!("E{}", strategy));
    for (qubit, clbit) in [(ALICE_QUBIT, EVE_ALICE_CLBIT), (BOB_QUBIT, EVE_BOB_CLBIT)] {
        circuit.add_operations(measure_in_basis(basis, qubit, clbit));
        circuit.add_operations(
            basis
                .unrotation()
                .into_iter()
                .map(|gate| Operation::Gate { target: qubit, gate }),
        );
    }
    circuit
}

/// Full circuit for one trial: singlet, optional Eve, then Alice and Bob.
pub fn trial_circuit(trial: &Trial) -> Circuit {
    let mut circuit = singlet();
    if let Some(strategy) = trial.eve {
        circuit = circuit.compose(&eve_measurement(strategy));
    }
    circuit = circuit
        .compose(&alice_measurement(trial.alice))
        .compose(&bob_measurement(trial.bob));
    circuit.set_name(trial.label());
    circuit
}

/// One circuit per trial, building each distinct setting combination once.
pub fn trial_circuits(trials: &[Trial]) -> Vec<Circuit> {
    let mut templates: HashMap<Trial, Circuit> = HashMap::new();
    trials
        .iter()
        .map(|trial| templates.entry(*trial).or_insert_with(|| trial_circuit(trial)).clone())
        .collect()
}
