//! Quantum circuit structure for Grove
//!
//! A `Circuit` is an immutable gate sequence over a fixed register. It is
//! produced by [`CircuitBuilder`](crate::builder::CircuitBuilder) or
//! [`Circuit::from_gates`]; composition returns a new circuit.

use crate::error::{GroveError, GroveResult};
use crate::gate::Gate;
use crate::topology::Topology;
use crate::types::QubitId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Quantum circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Number of qubits (also the number of classical bits)
    num_qubits: usize,

    /// Gate sequence
    gates: Vec<Gate>,

    /// Optional circuit name
    name: Option<String>,
}

impl Circuit {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create an empty circuit (the identity)
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            gates: Vec::new(),
            name: None,
        }
    }

    /// Create from a vector of gates, validating every gate
    pub fn from_gates(num_qubits: usize, gates: Vec<Gate>) -> GroveResult<Self> {
        for gate in &gates {
            gate.validate(num_qubits)?;
        }
        Ok(Self {
            num_qubits,
            gates,
            name: None,
        })
    }

    /// Attach a name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a validated gate (builder use only)
    pub(crate) fn push(&mut self, gate: Gate) -> GroveResult<()> {
        gate.validate(self.num_qubits)?;
        self.gates.push(gate);
        Ok(())
    }

    /// New circuit running `self` then `other`
    pub fn compose(&self, other: &Circuit) -> GroveResult<Circuit> {
        if other.num_qubits != self.num_qubits {
            return Err(GroveError::WidthMismatch {
                left: self.num_qubits,
                right: other.num_qubits,
            });
        }
        let mut gates = Vec::with_capacity(self.gates.len() + other.gates.len());
        gates.extend(self.gates.iter().cloned());
        gates.extend(other.gates.iter().cloned());
        Ok(Self {
            num_qubits: self.num_qubits,
            gates,
            name: self.name.clone(),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of classical readout bits (always the qubit count)
    pub fn num_clbits(&self) -> usize {
        self.num_qubits
    }

    /// Get gates
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Get circuit name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Check if circuit is empty
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Gates that act on the state vector (no barriers or measurements)
    pub fn unitary_gates(&self) -> impl Iterator<Item = &Gate> {
        self.gates.iter().filter(|g| g.is_unitary())
    }

    // ========================================================================
    // Circuit Analysis
    // ========================================================================

    /// Calculate circuit depth (longest path)
    ///
    /// Barriers align their qubits but add no layer.
    pub fn depth(&self) -> usize {
        let mut qubit_depths = vec![0usize; self.num_qubits];

        for gate in &self.gates {
            let qubits = match gate {
                Gate::MeasureAll => (0..self.num_qubits).collect(),
                Gate::Barrier(qs) if qs.is_empty() => (0..self.num_qubits).collect(),
                _ => gate.qubits(),
            };
            let max_depth = qubits
                .iter()
                .filter_map(|&q| qubit_depths.get(q))
                .max()
                .copied()
                .unwrap_or(0);
            let next = if gate.is_barrier() {
                max_depth
            } else {
                max_depth + 1
            };
            for &q in &qubits {
                if q < self.num_qubits {
                    qubit_depths[q] = next;
                }
            }
        }

        qubit_depths.into_iter().max().unwrap_or(0)
    }

    /// Get total gate count (barriers excluded)
    pub fn gate_count(&self) -> usize {
        self.gates.iter().filter(|g| !g.is_barrier()).count()
    }

    /// Count single-qubit gates
    pub fn count_1q(&self) -> usize {
        self.gates.iter().filter(|g| g.is_single_qubit()).count()
    }

    /// Count two-qubit gates
    pub fn count_2q(&self) -> usize {
        self.gates.iter().filter(|g| g.is_two_qubit()).count()
    }

    /// Count gates on three or more qubits
    pub fn count_multi(&self) -> usize {
        self.gates.iter().filter(|g| g.is_multi_qubit()).count()
    }

    /// Count measurement operations
    pub fn count_measurements(&self) -> usize {
        self.gates.iter().filter(|g| g.is_measurement()).count()
    }

    /// Operation histogram keyed by gate name
    pub fn count_ops(&self) -> BTreeMap<String, usize> {
        let mut ops = BTreeMap::new();
        for gate in &self.gates {
            *ops.entry(gate.name().to_string()).or_insert(0) += 1;
        }
        ops
    }

    /// Get qubits used in the circuit
    pub fn used_qubits(&self) -> HashSet<QubitId> {
        self.gates.iter().flat_map(|g| g.qubits()).collect()
    }

    /// Get two-qubit gate pairs (for topology validation)
    pub fn two_qubit_pairs(&self) -> Vec<(QubitId, QubitId)> {
        self.gates
            .iter()
            .filter(|g| g.is_two_qubit())
            .filter_map(|g| {
                let qs = g.qubits();
                if qs.len() >= 2 {
                    Some((qs[0], qs[1]))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Qubit read into each classical bit
    ///
    /// A circuit without measurements reads qubit `i` into bit `i`.
    /// Bits never written stay `None` and read as `0`.
    pub fn measurement_map(&self) -> Vec<Option<QubitId>> {
        if self.count_measurements() == 0 {
            return (0..self.num_qubits).map(Some).collect();
        }
        let mut map = vec![None; self.num_clbits()];
        for gate in &self.gates {
            match gate {
                Gate::MeasureAll => {
                    for (c, slot) in map.iter_mut().enumerate() {
                        *slot = Some(c);
                    }
                }
                Gate::Measure(q, c) => {
                    if let Some(slot) = map.get_mut(*c) {
                        *slot = Some(*q);
                    }
                }
                _ => {}
            }
        }
        map
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate circuit against a topology
    pub fn validate(&self, topology: &Topology) -> GroveResult<()> {
        topology.validate_circuit(self)
    }

    // ========================================================================
    // QASM Conversion
    // ========================================================================

    /// Convert to OpenQASM 2.0 string
    pub fn to_qasm(&self) -> String {
        let mut lines = Vec::new();

        lines.push("OPENQASM 2.0;".to_string());
        lines.push("include \"qelib1.inc\";".to_string());
        lines.push(String::new());

        lines.push(format!("qreg q[{}];", self.num_qubits));
        lines.push(format!("creg c[{}];", self.num_clbits()));
        lines.push(String::new());

        for gate in &self.gates {
            lines.push(gate.to_qasm());
        }

        lines.join("\n")
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit({} qubits, {} gates)",
            self.num_qubits,
            self.gate_count()
        )?;
        writeln!(f, "  Depth: {}", self.depth())?;
        writeln!(f, "  1Q gates: {}", self.count_1q())?;
        writeln!(f, "  2Q gates: {}", self.count_2q())?;
        if self.count_multi() > 0 {
            writeln!(f, "  3Q+ gates: {}", self.count_multi())?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
