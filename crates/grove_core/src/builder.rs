//! Circuit builder for Grove
//!
//! Provides a fluent builder pattern for constructing quantum circuits
//! with convenient methods for common operations.

use crate::circuit::Circuit;
use crate::error::{GroveError, GroveResult};
use crate::gate::Gate;
use crate::types::{Angle, QubitId};

/// Fluent circuit builder (consuming self pattern)
///
/// Invalid gates do not panic: the first construction error is kept and
/// returned by [`build`](CircuitBuilder::build).
pub struct CircuitBuilder {
    circuit: Circuit,
    error: Option<GroveError>,
}

impl CircuitBuilder {
    // ========================================================================
    // Constructor
    // ========================================================================

    /// Create a new circuit builder
    pub fn new(num_qubits: usize) -> Self {
        Self {
            circuit: Circuit::new(num_qubits),
            error: None,
        }
    }

    /// Create with circuit name
    pub fn with_name(num_qubits: usize, name: impl Into<String>) -> Self {
        Self {
            circuit: Circuit::new(num_qubits).with_name(name),
            error: None,
        }
    }

    /// Add an arbitrary gate
    pub fn gate(mut self, gate: Gate) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.circuit.push(gate) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Append every gate of another circuit of the same width
    pub fn append(mut self, other: &Circuit) -> Self {
        if other.num_qubits() != self.circuit.num_qubits() {
            if self.error.is_none() {
                self.error = Some(GroveError::WidthMismatch {
                    left: self.circuit.num_qubits(),
                    right: other.num_qubits(),
                });
            }
            return self;
        }
        for gate in other.gates() {
            self = self.gate(gate.clone());
        }
        self
    }

    // ========================================================================
    // Single-Qubit Gates (Non-Parameterized)
    // ========================================================================

    /// Add Hadamard gate
    pub fn h(self, qubit: QubitId) -> Self {
        self.gate(Gate::H(qubit))
    }

    /// Add Pauli-X gate
    pub fn x(self, qubit: QubitId) -> Self {
        self.gate(Gate::X(qubit))
    }

    /// Add Pauli-Y gate
    pub fn y(self, qubit: QubitId) -> Self {
        self.gate(Gate::Y(qubit))
    }

    /// Add Pauli-Z gate
    pub fn z(self, qubit: QubitId) -> Self {
        self.gate(Gate::Z(qubit))
    }

    /// Add S gate
    pub fn s(self, qubit: QubitId) -> Self {
        self.gate(Gate::S(qubit))
    }

    /// Add T gate
    pub fn t(self, qubit: QubitId) -> Self {
        self.gate(Gate::T(qubit))
    }

    /// Add T-dagger gate
    pub fn tdg(self, qubit: QubitId) -> Self {
        self.gate(Gate::Tdg(qubit))
    }

    /// Add SX gate
    pub fn sx(self, qubit: QubitId) -> Self {
        self.gate(Gate::Sx(qubit))
    }

    // ========================================================================
    // Single-Qubit Parameterized Gates
    // ========================================================================

    /// Add Rx rotation
    pub fn rx(self, qubit: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Rx(qubit, angle))
    }

    /// Add Ry rotation
    pub fn ry(self, qubit: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Ry(qubit, angle))
    }

    /// Add Rz rotation
    pub fn rz(self, qubit: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Rz(qubit, angle))
    }

    /// Add phase gate
    pub fn p(self, qubit: QubitId, lambda: Angle) -> Self {
        self.gate(Gate::P(qubit, lambda))
    }

    /// Add U gate (general single-qubit)
    pub fn u(self, qubit: QubitId, theta: Angle, phi: Angle, lambda: Angle) -> Self {
        self.gate(Gate::U(qubit, theta, phi, lambda))
    }

    // ========================================================================
    // Multi-Qubit Gates
    // ========================================================================

    /// Add CNOT gate
    pub fn cnot(self, control: QubitId, target: QubitId) -> Self {
        self.gate(Gate::Cnot(control, target))
    }

    /// Alias for cnot
    pub fn cx(self, control: QubitId, target: QubitId) -> Self {
        self.cnot(control, target)
    }

    /// Add CZ gate
    pub fn cz(self, control: QubitId, target: QubitId) -> Self {
        self.gate(Gate::Cz(control, target))
    }

    /// Add SWAP gate
    pub fn swap(self, qubit1: QubitId, qubit2: QubitId) -> Self {
        self.gate(Gate::Swap(qubit1, qubit2))
    }

    /// Add Toffoli (CCX) gate
    pub fn ccx(self, c1: QubitId, c2: QubitId, target: QubitId) -> Self {
        self.gate(Gate::Ccx(c1, c2, target))
    }

    /// Add a multi-controlled X
    ///
    /// Picks the smallest gate for the control count: X, CX, CCX, then MCX.
    pub fn mcx(self, controls: &[QubitId], target: QubitId) -> Self {
        match controls {
            [] => self.x(target),
            [c] => self.cnot(*c, target),
            [c1, c2] => self.ccx(*c1, *c2, target),
            _ => self.gate(Gate::Mcx {
                controls: controls.to_vec(),
                target,
            }),
        }
    }

    // ========================================================================
    // Measurement and Control
    // ========================================================================

    /// Measure a qubit into a classical bit
    pub fn measure(self, qubit: QubitId, clbit: usize) -> Self {
        self.gate(Gate::Measure(qubit, clbit))
    }

    /// Add measurement on all qubits
    pub fn measure_all(self) -> Self {
        self.gate(Gate::MeasureAll)
    }

    /// Add barrier across the whole register
    pub fn barrier(self) -> Self {
        let qubits: Vec<QubitId> = (0..self.circuit.num_qubits()).collect();
        self.gate(Gate::Barrier(qubits))
    }

    // ========================================================================
    // Layer Operations
    // ========================================================================

    /// Apply H to every qubit
    pub fn h_layer(mut self) -> Self {
        for q in 0..self.circuit.num_qubits() {
            self = self.h(q);
        }
        self
    }

    /// Apply X to every qubit
    pub fn x_layer(mut self) -> Self {
        for q in 0..self.circuit.num_qubits() {
            self = self.x(q);
        }
        self
    }

    /// Apply Ry rotations (one angle per qubit)
    pub fn ry_layer(mut self, angles: &[Angle]) -> Self {
        for (q, &angle) in angles.iter().enumerate() {
            self = self.ry(q, angle);
        }
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Finish, returning the first construction error if any
    pub fn build(self) -> GroveResult<Circuit> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.circuit),
        }
    }

    /// Get current circuit (for inspection)
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.circuit.num_qubits()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let circuit = CircuitBuilder::new(3)
            .h(0)
            .cnot(0, 1)
            .cnot(1, 2)
            .measure_all()
            .build()
            .unwrap();

        assert_eq!(circuit.num_qubits(), 3);
        assert_eq!(circuit.gate_count(), 4);
    }

    #[test]
    fn test_builder_layers() {
        let circuit = CircuitBuilder::new(4).h_layer().x_layer().build().unwrap();
        assert_eq!(circuit.count_1q(), 8);
        assert_eq!(circuit.depth(), 2);
    }

    #[test]
    fn test_builder_reports_first_error() {
        let result = CircuitBuilder::new(2).h(0).cnot(0, 4).cnot(1, 1).build();
        assert_eq!(
            result,
            Err(GroveError::GateQubitMismatch {
                qubit: 4,
                num_qubits: 2
            })
        );
    }

    #[test]
    fn test_mcx_specialization() {
        let c = CircuitBuilder::new(5)
            .mcx(&[], 0)
            .mcx(&[0], 1)
            .mcx(&[0, 1], 2)
            .mcx(&[0, 1, 2, 3], 4)
            .build()
            .unwrap();

        let names: Vec<&str> = c.gates().iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["x", "cx", "ccx", "mcx"]);
    }

    #[test]
    fn test_append() {
        let inner = CircuitBuilder::new(2).h(0).build().unwrap();
        let outer = CircuitBuilder::new(2)
            .append(&inner)
            .append(&inner)
            .build()
            .unwrap();
        assert_eq!(outer.gate_count(), 2);

        let wide = Circuit::new(3);
        assert!(CircuitBuilder::new(2).append(&wide).build().is_err());
    }
}
