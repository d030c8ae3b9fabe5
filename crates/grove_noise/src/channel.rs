//! Depolarizing channel
//!
//! Stochastic (trajectory) form of the depolarizing channel: with
//! probability `p` a uniformly random Pauli string, identity included, is
//! applied to the gate's qubits. Averaged over draws this is
//! `ρ → (1 − p)ρ + p·I/d`.

use grove_core::error::{GroveError, GroveResult};
use grove_core::gate::Gate;
use grove_core::types::QubitId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Pauli
// ============================================================================

/// Single-qubit Pauli operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pauli {
    /// Identity
    I,
    /// Bit flip
    X,
    /// Bit and phase flip
    Y,
    /// Phase flip
    Z,
}

impl Pauli {
    const ALL: [Pauli; 4] = [Pauli::I, Pauli::X, Pauli::Y, Pauli::Z];

    /// Gate applying this Pauli to `qubit` (`None` for identity)
    pub fn to_gate(self, qubit: QubitId) -> Option<Gate> {
        match self {
            Pauli::I => None,
            Pauli::X => Some(Gate::X(qubit)),
            Pauli::Y => Some(Gate::Y(qubit)),
            Pauli::Z => Some(Gate::Z(qubit)),
        }
    }

    /// Draw uniformly from {I, X, Y, Z}
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..4)]
    }
}

// ============================================================================
// DepolarizingChannel
// ============================================================================

/// Depolarizing error attached to a 1- or 2-qubit gate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepolarizingChannel {
    /// Error probability in [0, 1)
    error_rate: f64,

    /// Number of qubits the channel acts on (1 or 2)
    num_qubits: usize,
}

impl DepolarizingChannel {
    /// Create a validated channel
    pub fn new(error_rate: f64, num_qubits: usize) -> GroveResult<Self> {
        let channel = Self {
            error_rate,
            num_qubits,
        };
        channel.validate()?;
        Ok(channel)
    }

    /// Single-qubit channel
    pub fn single(error_rate: f64) -> GroveResult<Self> {
        Self::new(error_rate, 1)
    }

    /// Two-qubit channel
    pub fn two_qubit(error_rate: f64) -> GroveResult<Self> {
        Self::new(error_rate, 2)
    }

    /// Check rate and arity
    pub fn validate(&self) -> GroveResult<()> {
        if !(0.0..1.0).contains(&self.error_rate) || self.error_rate.is_nan() {
            return Err(GroveError::InvalidErrorRate(self.error_rate));
        }
        if !(1..=2).contains(&self.num_qubits) {
            return Err(GroveError::InvalidNoiseModel(format!(
                "depolarizing channel arity must be 1 or 2, got {}",
                self.num_qubits
            )));
        }
        Ok(())
    }

    /// Error probability
    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// Arity
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Channel that never fires
    pub fn is_trivial(&self) -> bool {
        self.error_rate == 0.0
    }

    /// Sample one application
    ///
    /// Returns the Pauli string to apply when the channel fires, one entry
    /// per qubit in gate order. The string may be all-identity.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec<Pauli>> {
        if self.is_trivial() || rng.gen::<f64>() >= self.error_rate {
            return None;
        }
        Some((0..self.num_qubits).map(|_| Pauli::random(rng)).collect())
    }

    /// Like [`sample`](Self::sample), but always consumes one uniform and
    /// one Pauli per qubit
    ///
    /// Streams seeded alike then fire at rate `p` on a subset of the gates
    /// they fire on at any higher rate, with the same Pauli strings.
    pub fn sample_coupled<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec<Pauli>> {
        let u = rng.gen::<f64>();
        let paulis: Vec<Pauli> = (0..self.num_qubits).map(|_| Pauli::random(rng)).collect();
        (u < self.error_rate).then_some(paulis)
    }
}

impl fmt::Display for DepolarizingChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "depolarizing_{}q(p={:.2e})", self.num_qubits, self.error_rate)
    }
}

// ============================================================================
// Tests
// ============================================================================
