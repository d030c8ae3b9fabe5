//! Quantum gate definitions for Grove
//!
//! The gate enum covers the logical gates Grover circuits are written in
//! (H, X, multi-controlled X) and the native gates device rewrites emit
//! (`u`, `rz`, `sx`, `x`, `cx`, `cz`).

use crate::error::{GroveError, GroveResult};
use crate::types::{Angle, ClbitId, QubitId};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};
use std::fmt;

/// Row-major 2×2 complex matrix of a single-qubit gate
pub type Matrix2 = [[Complex64; 2]; 2];

/// Quantum gate enumeration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    // ========================================================================
    // Single-Qubit Gates (Non-Parameterized)
    // ========================================================================
    /// Hadamard gate
    H(QubitId),

    /// Pauli-X gate (NOT)
    X(QubitId),

    /// Pauli-Y gate
    Y(QubitId),

    /// Pauli-Z gate
    Z(QubitId),

    /// S gate (sqrt(Z))
    S(QubitId),

    /// S-dagger gate (inverse of S)
    Sdg(QubitId),

    /// T gate (fourth root of Z)
    T(QubitId),

    /// T-dagger gate (inverse of T)
    Tdg(QubitId),

    /// SX gate (sqrt(X))
    Sx(QubitId),

    // ========================================================================
    // Single-Qubit Parameterized Rotation Gates
    // ========================================================================
    /// Rotation around X-axis
    Rx(QubitId, Angle),

    /// Rotation around Y-axis
    Ry(QubitId, Angle),

    /// Rotation around Z-axis
    Rz(QubitId, Angle),

    /// Phase gate P(λ) = diag(1, e^{iλ})
    P(QubitId, Angle),

    /// General single-qubit rotation U(θ, φ, λ)
    U(QubitId, Angle, Angle, Angle),

    // ========================================================================
    // Multi-Qubit Gates
    // ========================================================================
    /// Controlled-NOT (CX): control, target
    Cnot(QubitId, QubitId),

    /// Controlled-Z
    Cz(QubitId, QubitId),

    /// SWAP gate
    Swap(QubitId, QubitId),

    /// Toffoli (CCX): control, control, target
    Ccx(QubitId, QubitId, QubitId),

    /// Multi-controlled X with an arbitrary control set
    Mcx {
        /// Control qubits
        controls: Vec<QubitId>,
        /// Target qubit
        target: QubitId,
    },

    // ========================================================================
    // Measurement and Control
    // ========================================================================
    /// Measure a qubit into a classical bit
    Measure(QubitId, ClbitId),

    /// Measure qubit `i` into classical bit `i` for every qubit
    MeasureAll,

    /// Barrier (ordering only)
    Barrier(Vec<QubitId>),
}

impl Gate {
    // ========================================================================
    // Gate Properties
    // ========================================================================

    /// Get qubits involved in this gate
    pub fn qubits(&self) -> Vec<QubitId> {
        match self {
            Gate::H(q)
            | Gate::X(q)
            | Gate::Y(q)
            | Gate::Z(q)
            | Gate::S(q)
            | Gate::Sdg(q)
            | Gate::T(q)
            | Gate::Tdg(q)
            | Gate::Sx(q)
            | Gate::Rx(q, _)
            | Gate::Ry(q, _)
            | Gate::Rz(q, _)
            | Gate::P(q, _)
            | Gate::U(q, _, _, _)
            | Gate::Measure(q, _) => vec![*q],

            Gate::Cnot(c, t) | Gate::Cz(c, t) | Gate::Swap(c, t) => vec![*c, *t],

            Gate::Ccx(c1, c2, t) => vec![*c1, *c2, *t],
            Gate::Mcx { controls, target } => {
                let mut qs = controls.clone();
                qs.push(*target);
                qs
            }

            Gate::MeasureAll => vec![], // Applied to all qubits
            Gate::Barrier(qs) => qs.clone(),
        }
    }

    /// Check if gate is single-qubit unitary
    pub fn is_single_qubit(&self) -> bool {
        matches!(
            self,
            Gate::H(_)
                | Gate::X(_)
                | Gate::Y(_)
                | Gate::Z(_)
                | Gate::S(_)
                | Gate::Sdg(_)
                | Gate::T(_)
                | Gate::Tdg(_)
                | Gate::Sx(_)
                | Gate::Rx(_, _)
                | Gate::Ry(_, _)
                | Gate::Rz(_, _)
                | Gate::P(_, _)
                | Gate::U(_, _, _, _)
        )
    }

    /// Check if gate acts on exactly two qubits
    pub fn is_two_qubit(&self) -> bool {
        match self {
            Gate::Cnot(_, _) | Gate::Cz(_, _) | Gate::Swap(_, _) => true,
            Gate::Mcx { controls, .. } => controls.len() == 1,
            _ => false,
        }
    }

    /// Check if gate acts on three or more qubits
    pub fn is_multi_qubit(&self) -> bool {
        match self {
            Gate::Ccx(_, _, _) => true,
            Gate::Mcx { controls, .. } => controls.len() >= 2,
            _ => false,
        }
    }

    /// Check if gate is parameterized
    pub fn is_parameterized(&self) -> bool {
        matches!(
            self,
            Gate::Rx(_, _) | Gate::Ry(_, _) | Gate::Rz(_, _) | Gate::P(_, _) | Gate::U(_, _, _, _)
        )
    }

    /// Check if gate is measurement
    pub fn is_measurement(&self) -> bool {
        matches!(self, Gate::Measure(_, _) | Gate::MeasureAll)
    }

    /// Check if gate is a barrier
    pub fn is_barrier(&self) -> bool {
        matches!(self, Gate::Barrier(_))
    }

    /// Check if gate changes the state vector
    pub fn is_unitary(&self) -> bool {
        !self.is_measurement() && !self.is_barrier()
    }

    /// Gate category name, used as the noise-model key
    pub fn name(&self) -> &'static str {
        match self {
            Gate::H(_) => "h",
            Gate::X(_) => "x",
            Gate::Y(_) => "y",
            Gate::Z(_) => "z",
            Gate::S(_) => "s",
            Gate::Sdg(_) => "sdg",
            Gate::T(_) => "t",
            Gate::Tdg(_) => "tdg",
            Gate::Sx(_) => "sx",
            Gate::Rx(_, _) => "rx",
            Gate::Ry(_, _) => "ry",
            Gate::Rz(_, _) => "rz",
            Gate::P(_, _) => "p",
            Gate::U(_, _, _, _) => "u",
            Gate::Cnot(_, _) => "cx",
            Gate::Cz(_, _) => "cz",
            Gate::Swap(_, _) => "swap",
            Gate::Ccx(_, _, _) => "ccx",
            Gate::Mcx { .. } => "mcx",
            Gate::Measure(_, _) | Gate::MeasureAll => "measure",
            Gate::Barrier(_) => "barrier",
        }
    }

    // ========================================================================
    // Validation & Relabelling
    // ========================================================================

    /// Check qubit indices against a register of `num_qubits`
    ///
    /// Every index must be in range and no qubit may appear twice
    /// (control/target overlap).
    pub fn validate(&self, num_qubits: usize) -> GroveResult<()> {
        let qubits = self.qubits();
        for &q in &qubits {
            if q >= num_qubits {
                return Err(GroveError::GateQubitMismatch {
                    qubit: q,
                    num_qubits,
                });
            }
        }
        if !self.is_barrier() {
            let mut seen = HashSet::with_capacity(qubits.len());
            for &q in &qubits {
                if !seen.insert(q) {
                    return Err(GroveError::DuplicateQubit {
                        gate: self.name().to_string(),
                        qubit: q,
                    });
                }
            }
        }
        Ok(())
    }

    /// Same gate with every qubit index passed through `map`
    ///
    /// Classical bits of measurements are kept.
    pub fn remap<F: Fn(QubitId) -> QubitId>(&self, map: F) -> Gate {
        match self {
            Gate::H(q) => Gate::H(map(*q)),
            Gate::X(q) => Gate::X(map(*q)),
            Gate::Y(q) => Gate::Y(map(*q)),
            Gate::Z(q) => Gate::Z(map(*q)),
            Gate::S(q) => Gate::S(map(*q)),
            Gate::Sdg(q) => Gate::Sdg(map(*q)),
            Gate::T(q) => Gate::T(map(*q)),
            Gate::Tdg(q) => Gate::Tdg(map(*q)),
            Gate::Sx(q) => Gate::Sx(map(*q)),
            Gate::Rx(q, a) => Gate::Rx(map(*q), *a),
            Gate::Ry(q, a) => Gate::Ry(map(*q), *a),
            Gate::Rz(q, a) => Gate::Rz(map(*q), *a),
            Gate::P(q, a) => Gate::P(map(*q), *a),
            Gate::U(q, t, p, l) => Gate::U(map(*q), *t, *p, *l),
            Gate::Cnot(c, t) => Gate::Cnot(map(*c), map(*t)),
            Gate::Cz(c, t) => Gate::Cz(map(*c), map(*t)),
            Gate::Swap(a, b) => Gate::Swap(map(*a), map(*b)),
            Gate::Ccx(c1, c2, t) => Gate::Ccx(map(*c1), map(*c2), map(*t)),
            Gate::Mcx { controls, target } => Gate::Mcx {
                controls: controls.iter().map(|&c| map(c)).collect(),
                target: map(*target),
            },
            Gate::Measure(q, c) => Gate::Measure(map(*q), *c),
            Gate::MeasureAll => Gate::MeasureAll,
            Gate::Barrier(qs) => Gate::Barrier(qs.iter().map(|&q| map(q)).collect()),
        }
    }

    // ========================================================================
    // Matrices
    // ========================================================================

    /// 2×2 unitary of a single-qubit gate
    pub fn matrix(&self) -> Option<Matrix2> {
        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        let i = Complex64::new(0.0, 1.0);

        let m = match self {
            Gate::H(_) => {
                let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
                [[h, h], [h, -h]]
            }
            Gate::X(_) => [[zero, one], [one, zero]],
            Gate::Y(_) => [[zero, -i], [i, zero]],
            Gate::Z(_) => [[one, zero], [zero, -one]],
            Gate::S(_) => [[one, zero], [zero, i]],
            Gate::Sdg(_) => [[one, zero], [zero, -i]],
            Gate::T(_) => [[one, zero], [zero, Complex64::from_polar(1.0, FRAC_PI_4)]],
            Gate::Tdg(_) => [[one, zero], [zero, Complex64::from_polar(1.0, -FRAC_PI_4)]],
            Gate::Sx(_) => {
                let a = Complex64::new(0.5, 0.5);
                let b = Complex64::new(0.5, -0.5);
                [[a, b], [b, a]]
            }
            Gate::Rx(_, theta) => {
                let (s, c) = (theta / 2.0).sin_cos();
                [
                    [Complex64::new(c, 0.0), Complex64::new(0.0, -s)],
                    [Complex64::new(0.0, -s), Complex64::new(c, 0.0)],
                ]
            }
            Gate::Ry(_, theta) => {
                let (s, c) = (theta / 2.0).sin_cos();
                [
                    [Complex64::new(c, 0.0), Complex64::new(-s, 0.0)],
                    [Complex64::new(s, 0.0), Complex64::new(c, 0.0)],
                ]
            }
            Gate::Rz(_, theta) => [
                [Complex64::from_polar(1.0, -theta / 2.0), zero],
                [zero, Complex64::from_polar(1.0, theta / 2.0)],
            ],
            Gate::P(_, lambda) => [[one, zero], [zero, Complex64::from_polar(1.0, *lambda)]],
            Gate::U(_, theta, phi, lambda) => u_matrix(*theta, *phi, *lambda),
            _ => return None,
        };
        Some(m)
    }

    /// Decompose into (controls, target, 2×2 unitary applied when all controls are set)
    ///
    /// Covers every unitary gate except SWAP.
    pub fn controlled_form(&self) -> Option<(Vec<QubitId>, QubitId, Matrix2)> {
        let x = Gate::X(0).matrix()?;
        match self {
            Gate::Cnot(c, t) => Some((vec![*c], *t, x)),
            Gate::Cz(c, t) => Some((vec![*c], *t, Gate::Z(0).matrix()?)),
            Gate::Ccx(c1, c2, t) => Some((vec![*c1, *c2], *t, x)),
            Gate::Mcx { controls, target } => Some((controls.clone(), *target, x)),
            g if g.is_single_qubit() => {
                let q = g.qubits()[0];
                Some((Vec::new(), q, g.matrix()?))
            }
            _ => None,
        }
    }

    /// Convert to OpenQASM 2.0 string
    pub fn to_qasm(&self) -> String {
        match self {
            Gate::H(q) => format!("h q[{}];", q),
            Gate::X(q) => format!("x q[{}];", q),
            Gate::Y(q) => format!("y q[{}];", q),
            Gate::Z(q) => format!("z q[{}];", q),
            Gate::S(q) => format!("s q[{}];", q),
            Gate::Sdg(q) => format!("sdg q[{}];", q),
            Gate::T(q) => format!("t q[{}];", q),
            Gate::Tdg(q) => format!("tdg q[{}];", q),
            Gate::Sx(q) => format!("sx q[{}];", q),

            Gate::Rx(q, theta) => format!("rx({}) q[{}];", theta, q),
            Gate::Ry(q, theta) => format!("ry({}) q[{}];", theta, q),
            Gate::Rz(q, theta) => format!("rz({}) q[{}];", theta, q),
            Gate::P(q, lambda) => format!("p({}) q[{}];", lambda, q),
            Gate::U(q, theta, phi, lambda) => {
                format!("u({},{},{}) q[{}];", theta, phi, lambda, q)
            }

            Gate::Cnot(c, t) => format!("cx q[{}],q[{}];", c, t),
            Gate::Cz(c, t) => format!("cz q[{}],q[{}];", c, t),
            Gate::Swap(a, b) => format!("swap q[{}],q[{}];", a, b),
            Gate::Ccx(c1, c2, t) => format!("ccx q[{}],q[{}],q[{}];", c1, c2, t),
            Gate::Mcx { controls, target } => {
                let qubits: Vec<String> = controls
                    .iter()
                    .chain(std::iter::once(target))
                    .map(|q| format!("q[{}]", q))
                    .collect();
                format!("mcx {};", qubits.join(","))
            }

            Gate::Measure(q, c) => format!("measure q[{}] -> c[{}];", q, c),
            Gate::MeasureAll => "measure q -> c;".to_string(),
            Gate::Barrier(qs) => {
                if qs.is_empty() {
                    "barrier q;".to_string()
                } else {
                    let qubits: Vec<String> = qs.iter().map(|q| format!("q[{}]", q)).collect();
                    format!("barrier {};", qubits.join(","))
                }
            }
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_qasm())
    }
}

// ============================================================================
// Matrix Helpers
// ============================================================================

/// Matrix of U(θ, φ, λ)
pub fn u_matrix(theta: Angle, phi: Angle, lambda: Angle) -> Matrix2 {
    let (s, c) = (theta / 2.0).sin_cos();
    [
        [
            Complex64::new(c, 0.0),
            -Complex64::from_polar(s, lambda),
        ],
        [
            Complex64::from_polar(s, phi),
            Complex64::from_polar(c, phi + lambda),
        ],
    ]
}

/// Product `a · b` (apply `b` first, then `a`)
pub fn matmul(a: &Matrix2, b: &Matrix2) -> Matrix2 {
    let mut out = [[Complex64::new(0.0, 0.0); 2]; 2];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = a[r][0] * b[0][c] + a[r][1] * b[1][c];
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn is_unitary(m: &Matrix2) -> bool {
        // M · M† = I
        let adj = [
            [m[0][0].conj(), m[1][0].conj()],
            [m[0][1].conj(), m[1][1].conj()],
        ];
        let p = matmul(m, &adj);
        (p[0][0] - 1.0).norm() < 1e-12
            && (p[1][1] - 1.0).norm() < 1e-12
            && p[0][1].norm() < 1e-12
            && p[1][0].norm() < 1e-12
    }

    #[test]
    fn test_gate_qubits() {
        assert_eq!(Gate::H(0).qubits(), vec![0]);
        assert_eq!(Gate::Cnot(0, 1).qubits(), vec![0, 1]);
        assert_eq!(Gate::Ccx(0, 1, 2).qubits(), vec![0, 1, 2]);
        let mcx = Gate::Mcx {
            controls: vec![0, 1, 2],
            target: 3,
        };
        assert_eq!(mcx.qubits(), vec![0, 1, 2, 3]);
        assert!(mcx.is_multi_qubit());
    }

    #[test]
    fn test_gate_classification() {
        assert!(Gate::H(0).is_single_qubit());
        assert!(!Gate::H(0).is_two_qubit());

        assert!(Gate::Cnot(0, 1).is_two_qubit());
        assert!(!Gate::Cnot(0, 1).is_single_qubit());

        assert!(Gate::Rx(0, 1.0).is_parameterized());
        assert!(!Gate::H(0).is_parameterized());
        assert!(!Gate::Barrier(vec![0]).is_unitary());
        assert!(!Gate::Measure(0, 0).is_unitary());
    }

    #[test]
    fn test_validate_range_and_overlap() {
        assert!(Gate::Cnot(0, 1).validate(2).is_ok());
        assert_eq!(
            Gate::Cnot(0, 2).validate(2),
            Err(GroveError::GateQubitMismatch {
                qubit: 2,
                num_qubits: 2
            })
        );
        assert!(matches!(
            Gate::Cnot(1, 1).validate(2),
            Err(GroveError::DuplicateQubit { qubit: 1, .. })
        ));
        let overlap = Gate::Mcx {
            controls: vec![0, 1],
            target: 1,
        };
        assert!(overlap.validate(3).unwrap_err().is_circuit_error());
    }

    #[test]
    fn test_matrices_are_unitary() {
        let gates = [
            Gate::H(0),
            Gate::Y(0),
            Gate::Sx(0),
            Gate::T(0),
            Gate::Rx(0, 0.3),
            Gate::Ry(0, 1.1),
            Gate::Rz(0, -0.7),
            Gate::U(0, 0.4, 1.2, -2.0),
        ];
        for g in &gates {
            assert!(is_unitary(&g.matrix().unwrap()), "{} not unitary", g);
        }
        assert!(Gate::Cnot(0, 1).matrix().is_none());
    }

    #[test]
    fn test_sx_squared_is_x() {
        let sx = Gate::Sx(0).matrix().unwrap();
        let x = Gate::X(0).matrix().unwrap();
        let sx2 = matmul(&sx, &sx);
        for r in 0..2 {
            for c in 0..2 {
                assert!((sx2[r][c] - x[r][c]).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn test_remap() {
        let g = Gate::Mcx {
            controls: vec![0, 1],
            target: 2,
        };
        let mapped = g.remap(|q| q + 3);
        assert_eq!(mapped.qubits(), vec![3, 4, 5]);
        assert_eq!(Gate::Measure(1, 0).remap(|q| q * 2), Gate::Measure(2, 0));
    }

    #[test]
    fn test_gate_to_qasm() {
        assert_eq!(Gate::H(0).to_qasm(), "h q[0];");
        assert_eq!(Gate::Cnot(0, 1).to_qasm(), "cx q[0],q[1];");
        assert_eq!(Gate::Measure(2, 1).to_qasm(), "measure q[2] -> c[1];");
        let mcx = Gate::Mcx {
            controls: vec![0, 1, 2],
            target: 3,
        };
        assert_eq!(mcx.to_qasm(), "mcx q[0],q[1],q[2],q[3];");
    }
}
