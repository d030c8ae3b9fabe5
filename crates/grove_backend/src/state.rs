//! State-vector engine
//!
//! Dense pure-state evolution over `2^n` complex amplitudes.
//!
//! Qubit `q` of an `n`-qubit register is bit `n - 1 - q` of the basis
//! index, so qubit 0 is the most significant bit and the index whose
//! binary digits spell a bitstring is that bitstring's basis state.

use grove_core::circuit::Circuit;
use grove_core::constants::sim::{MAX_QUBITS, NORM_TOLERANCE};
use grove_core::error::{GroveError, GroveResult};
use grove_core::gate::{Gate, Matrix2};
use grove_core::types::QubitId;
use grove_noise::Pauli;
use num_complex::Complex64;
use std::fmt;

/// Pure state of an `n`-qubit register
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    num_qubits: usize,
    amplitudes: Vec<Complex64>,
}

impl StateVector {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// All-zero basis state `|0…0⟩`
    pub fn new(num_qubits: usize) -> GroveResult<Self> {
        if num_qubits > MAX_QUBITS {
            return Err(GroveError::QubitLimitExceeded {
                requested: num_qubits,
                max: MAX_QUBITS,
            });
        }
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Ok(Self {
            num_qubits,
            amplitudes,
        })
    }

    /// Basis state `|index⟩`
    pub fn basis(num_qubits: usize, index: usize) -> GroveResult<Self> {
        let mut state = Self::new(num_qubits)?;
        if index >= state.dimension() {
            return Err(GroveError::QubitOutOfRange {
                qubit: index,
                max: state.dimension() - 1,
            });
        }
        state.amplitudes[0] = Complex64::new(0.0, 0.0);
        state.amplitudes[index] = Complex64::new(1.0, 0.0);
        Ok(state)
    }

    /// Wrap raw amplitudes; the length must be a power of two and the norm 1
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> GroveResult<Self> {
        let len = amplitudes.len();
        if len == 0 || !len.is_power_of_two() {
            return Err(GroveError::InternalError(format!(
                "amplitude vector length {} is not a power of two",
                len
            )));
        }
        let state = Self {
            num_qubits: len.trailing_zeros() as usize,
            amplitudes,
        };
        state.check_norm()?;
        Ok(state)
    }

    /// Evolve `|0…0⟩` through every unitary gate of `circuit`
    pub fn run(circuit: &Circuit) -> GroveResult<Self> {
        let mut state = Self::new(circuit.num_qubits())?;
        state.evolve(circuit.unitary_gates())?;
        Ok(state)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Register width
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of amplitudes (`2^n`)
    pub fn dimension(&self) -> usize {
        self.amplitudes.len()
    }

    /// Raw amplitudes
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Amplitude of basis state `index`
    pub fn amplitude(&self, index: usize) -> Option<Complex64> {
        self.amplitudes.get(index).copied()
    }

    /// Probability of basis state `index`
    pub fn probability(&self, index: usize) -> f64 {
        self.amplitudes.get(index).map_or(0.0, |a| a.norm_sqr())
    }

    /// `|amplitude|²` for every basis state
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    /// Total probability
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum()
    }

    /// Inner product `⟨self|other⟩`
    pub fn inner(&self, other: &StateVector) -> GroveResult<Complex64> {
        if self.num_qubits != other.num_qubits {
            return Err(GroveError::WidthMismatch {
                left: self.num_qubits,
                right: other.num_qubits,
            });
        }
        Ok(self
            .amplitudes
            .iter()
            .zip(&other.amplitudes)
            .map(|(a, b)| a.conj() * b)
            .sum())
    }

    // ========================================================================
    // Evolution
    // ========================================================================

    /// Apply one gate
    ///
    /// Barriers and measurements leave the state untouched. The norm is
    /// checked afterwards; drift beyond tolerance is reported, never
    /// renormalized.
    pub fn apply(&mut self, gate: &Gate) -> GroveResult<()> {
        gate.validate(self.num_qubits)?;

        match gate {
            Gate::Barrier(_) | Gate::Measure(_, _) | Gate::MeasureAll => return Ok(()),
            Gate::Swap(a, b) => self.apply_swap(*a, *b),
            _ => {
                let (controls, target, matrix) = gate.controlled_form().ok_or_else(|| {
                    GroveError::InternalError(format!("no matrix form for '{}'", gate.name()))
                })?;
                self.apply_controlled(&controls, target, &matrix);
            }
        }

        self.check_norm()
    }

    /// Apply a sequence of gates
    pub fn evolve<'a, I>(&mut self, gates: I) -> GroveResult<()>
    where
        I: IntoIterator<Item = &'a Gate>,
    {
        for gate in gates {
            self.apply(gate)?;
        }
        Ok(())
    }

    /// Apply a Pauli string, one entry per qubit in `qubits`
    pub fn apply_paulis(&mut self, qubits: &[QubitId], paulis: &[Pauli]) -> GroveResult<()> {
        for (&q, &p) in qubits.iter().zip(paulis) {
            if let Some(gate) = p.to_gate(q) {
                self.apply(&gate)?;
            }
        }
        Ok(())
    }

    fn mask(&self, qubit: QubitId) -> usize {
        1 << (self.num_qubits - 1 - qubit)
    }

    /// `matrix` on `target` wherever every control bit is set
    fn apply_controlled(&mut self, controls: &[QubitId], target: QubitId, matrix: &Matrix2) {
        let control_mask = controls.iter().fold(0, |m, &c| m | self.mask(c));
        let target_mask = self.mask(target);

        for i in 0..self.amplitudes.len() {
            if i & target_mask != 0 || i & control_mask != control_mask {
                continue;
            }
            let j = i | target_mask;
            let (a, b) = (self.amplitudes[i], self.amplitudes[j]);
            self.amplitudes[i] = matrix[0][0] * a + matrix[0][1] * b;
            self.amplitudes[j] = matrix[1][0] * a + matrix[1][1] * b;
        }
    }

    fn apply_swap(&mut self, q1: QubitId, q2: QubitId) {
        let (m1, m2) = (self.mask(q1), self.mask(q2));
        for i in 0..self.amplitudes.len() {
            // Visit each pair once, from the |1_q1 0_q2⟩ side
            if i & m1 != 0 && i & m2 == 0 {
                self.amplitudes.swap(i, i ^ m1 ^ m2);
            }
        }
    }

    fn check_norm(&self) -> GroveResult<()> {
        let norm = self.norm_sqr();
        if (norm - 1.0).abs() > NORM_TOLERANCE || !norm.is_finite() {
            return Err(GroveError::NumericalInstability { norm });
        }
        Ok(())
    }
}

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StateVector({} qubits, norm={:.12})",
            self.num_qubits,
            self.norm_sqr()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
