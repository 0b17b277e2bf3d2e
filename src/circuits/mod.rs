// src/circuits/mod.rs

//! Ordered sequences of [`Operation`]s and a builder for them.
//!
//! Circuits are composed by appending: the E91 driver glues a singlet
//! preparation, an optional eavesdropper stage, and the two parties'
//! measurement stages into one circuit per trial.

use crate::core::ClbitId;
use crate::operations::{Gate, Operation};
use std::collections::BTreeSet;
use std::fmt;

/// An ordered list of operations over a qubit register and a classical register.
///
/// Register sizes are derived from the highest qubit and classical bit index
/// any operation mentions.
#[derive(Clone, PartialEq, Default)]
pub struct Circuit {
    name: Option<String>,
    operations: Vec<Operation>,
    num_qubits: usize,
    num_clbits: usize,
}

impl Circuit {
    /// Creates a new, empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty circuit carrying a name, used to label job results.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Appends an operation, growing the registers if needed.
    pub fn add_operation(&mut self, op: Operation) {
        for qubit in op.involved_qubits() {
            self.num_qubits = self.num_qubits.max(qubit.index() + 1);
        }
        if let Some(clbit) = op.written_clbit() {
            self.num_clbits = self.num_clbits.max(clbit.index() + 1);
        }
        self.operations.push(op);
    }

    /// Appends operations from an iterator.
    pub fn add_operations<I>(&mut self, ops: I)
    where
        I: IntoIterator<Item = Operation>,
    {
        for op in ops {
            self.add_operation(op);
        }
    }

    /// Returns a new circuit running `self` and then `other` on the same registers.
    ///
    /// The result keeps `self`'s name, or takes `other`'s if `self` has none.
    pub fn compose(&self, other: &Circuit) -> Circuit {
        let mut combined = self.clone();
        combined.add_operations(other.operations.iter().cloned());
        if combined.name.is_none() {
            combined.name = other.name.clone();
        }
        combined
    }

    /// Sets or replaces the circuit name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// The circuit name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of qubits in the register.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of classical bits in the register.
    pub fn num_clbits(&self) -> usize {
        self.num_clbits
    }

    /// Classical bits written by at least one measurement.
    pub fn used_clbits(&self) -> BTreeSet<ClbitId> {
        self.operations.iter().filter_map(|op| op.written_clbit()).collect()
    }

    /// The ordered operations.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Total number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// `true` if the circuit has no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

//-------------------------------------------------------------------------
// Circuit Builder
//-------------------------------------------------------------------------

/// Method-chaining constructor for [`Circuit`].
#[derive(Default)]
pub struct CircuitBuilder {
    circuit: Circuit,
}

impl CircuitBuilder {
    /// Creates a new, empty CircuitBuilder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a builder for a named circuit.
    pub fn named(name: impl Into<String>) -> Self {
        Self { circuit: Circuit::named(name) }
    }

    /// Adds a single operation.
    pub fn add_op(mut self, op: Operation) -> Self {
        self.circuit.add_operation(op);
        self
    }

    /// Adds multiple operations.
    pub fn add_ops<I>(mut self, ops: I) -> Self
    where
        I: IntoIterator<Item = Operation>,
    {
        self.circuit.add_operations(ops);
        self
    }

    /// Applies `gate` to qubit `target`.
    pub fn gate(self, gate: Gate, target: usize) -> Self {
        self.add_op(Operation::gate(gate, target))
    }

    /// Applies a CNOT.
    pub fn cnot(self, control: usize, target: usize) -> Self {
        self.add_op(Operation::cnot(control, target))
    }

    /// Measures `target` into `clbit`.
    pub fn measure(self, target: usize, clbit: usize) -> Self {
        self.add_op(Operation::measure(target, clbit))
    }

    /// Finalizes the construction process and returns the built `Circuit`.
    pub fn build(self) -> Circuit {
        self.circuit
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.name.as_deref().unwrap_or("circuit");
        if self.operations.is_empty() {
            return writeln!(f, "{}[0 operations on 0 qubits]", title);
        }

        let ops = &self.operations;
        let num_ops = ops.len();
        let num_rows = self.num_qubits;

        let label_width = format!("q{}", num_rows.saturating_sub(1)).len();
        let label_padding = " ".repeat(label_width + 2);

        const GATE_WIDTH: usize = 7;
        const WIRE: &str = "───────";
        const V_WIRE: char = '│';
        const H_WIRE: char = '─';

        // op_grid[row][time] holds the cell text, v_connect[row][time] the
        // connector drawn below that row.
        let mut op_grid: Vec<Vec<String>> = vec![vec![WIRE.to_string(); num_ops]; num_rows];
        let mut v_connect: Vec<Vec<char>> = vec![vec![' '; num_ops]; num_rows];

        fn format_gate(symbol: &str) -> String {
            let slen = symbol.chars().count();
            if slen >= GATE_WIDTH {
                symbol.chars().take(GATE_WIDTH).collect()
            } else {
                let total_dashes = GATE_WIDTH - slen;
                let pre_dashes = total_dashes / 2;
                let post_dashes = total_dashes - pre_dashes;
                format!(
                    "{}{}{}",
                    H_WIRE.to_string().repeat(pre_dashes),
                    symbol,
                    H_WIRE.to_string().repeat(post_dashes)
                )
            }
        }

        for (t, op) in ops.iter().enumerate() {
            match op {
                Operation::Gate { target, gate } => {
                    if *gate != Gate::I {
                        op_grid[target.index()][t] = format_gate(gate.symbol());
                    }
                }
                Operation::Controlled { control, target, gate } => {
                    let (r_ctrl, r_tgt) = (control.index(), target.index());
                    op_grid[r_ctrl][t] = format_gate("@");
                    op_grid[r_tgt][t] = format_gate(gate.symbol());
                    let r_min = r_ctrl.min(r_tgt);
                    let r_max = r_ctrl.max(r_tgt);
                    for row_vec in v_connect.iter_mut().take(r_max).skip(r_min) {
                        row_vec[t] = V_WIRE;
                    }
                }
                Operation::Measure { target, clbit } => {
                    op_grid[target.index()][t] = format_gate(&format!("M{}", clbit.index()));
                }
            }
        }

        writeln!(
            f,
            "{}[{} operations on {} qubits, {} clbits]",
            title, num_ops, num_rows, self.num_clbits
        )?;
        for r in 0..num_rows {
            let label = format!("q{}: ", r);
            write!(f, "{:<width$}", label, width = label_width + 2)?;
            writeln!(f, "{}", op_grid[r].join(""))?;

            if r < num_rows - 1 {
                write!(f, "{}", label_padding)?;
                for t in 0..num_ops {
                    let connector = v_connect[r][t];
                    let padding_needed = GATE_WIDTH.saturating_sub(1);
                    let pre_pad = padding_needed / 2;
                    let post_pad = padding_needed - pre_pad;
                    write!(f, "{}{}{}", " ".repeat(pre_pad), connector, " ".repeat(post_pad))?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_grow_with_operations() {
        let circuit = CircuitBuilder::new().gate(Gate::H, 0).cnot(0, 1).measure(1, 3).build();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_clbits(), 4);
        assert_eq!(circuit.used_clbits().len(), 1);
    }

    #[test]
    fn test_compose_appends_and_keeps_first_name() {
        let prep = CircuitBuilder::named("prep").gate(Gate::X, 0).build();
        let meas = CircuitBuilder::named("meas").measure(0, 0).build();
        let combined = prep.compose(&meas);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined.name(), Some("prep"));
        assert_eq!(combined.operations()[1], Operation::measure(0, 0));

        let unnamed = Circuit::new().compose(&meas);
        assert_eq!(unnamed.name(), Some("meas"));
    }

    #[test]
    fn test_display_marks_gates_and_measurements() {
        let circuit = CircuitBuilder::named("bell").gate(Gate::H, 0).cnot(0, 1).measure(1, 1).build();
        let text = circuit.to_string();
        assert!(text.starts_with("bell[3 operations on 2 qubits, 2 clbits]"));
        assert!(text.contains('H'));
        assert!(text.contains('@'));
        assert!(text.contains("M1"));
        assert!(text.contains('│'));
    }
}
