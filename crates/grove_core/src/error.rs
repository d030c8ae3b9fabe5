//! Error types for Grove
//!
//! One error enum for every crate in the workspace, grouped by the layer
//! that raises it.

// Error variant fields are self-documenting via error messages
#![allow(missing_docs)]

use thiserror::Error;

/// Main error type for Grove
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GroveError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Probability value out of range [0, 1]
    #[error("Invalid probability {0}: must be in range [0, 1]")]
    InvalidProbability(f64),

    /// Depolarizing error rate out of range [0, 1)
    #[error("Invalid error rate {0}: must be in range [0, 1)")]
    InvalidErrorRate(f64),

    /// Invalid bitstring format
    #[error("Invalid bitstring '{0}': must contain only '0' and '1'")]
    InvalidBitstring(String),

    /// Empty target bitstring
    #[error("Bitstring must contain at least one bit")]
    EmptyBitstring,

    /// Shot count must be positive
    #[error("Invalid shot count {0}: must be at least 1")]
    InvalidShots(u64),

    /// Register too large for the state-vector engine
    #[error("Requested {requested} qubits exceeds the supported maximum of {max}")]
    QubitLimitExceeded { requested: usize, max: usize },

    // ========================================================================
    // Circuit Errors
    // ========================================================================
    /// Qubit index beyond a register or device
    #[error("Qubit {qubit} out of range: max is {max}")]
    QubitOutOfRange { qubit: usize, max: usize },

    /// Gate on non-existent qubit
    #[error("Gate references qubit {qubit} but circuit has only {num_qubits} qubits")]
    GateQubitMismatch { qubit: usize, num_qubits: usize },

    /// Same qubit used twice by one gate (e.g. control equals target)
    #[error("Gate '{gate}' uses qubit {qubit} more than once")]
    DuplicateQubit { gate: String, qubit: usize },

    /// Circuits with different widths cannot be composed
    #[error("Cannot compose a {right}-qubit circuit onto a {left}-qubit circuit")]
    WidthMismatch { left: usize, right: usize },

    /// Topology violation (qubits not connected)
    #[error("Topology violation: qubits {q1} and {q2} are not connected")]
    TopologyViolation { q1: usize, q2: usize },

    // ========================================================================
    // Topology Errors
    // ========================================================================
    /// Device has no connected region large enough for the circuit
    #[error("Topology '{topology}' has no connected region of {needed} qubits")]
    InsufficientConnectivity { topology: String, needed: usize },

    // ========================================================================
    // Numerical Errors
    // ========================================================================
    /// State norm drifted beyond tolerance
    #[error("Numerical instability: state norm {norm:.12} deviates from 1")]
    NumericalInstability { norm: f64 },

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// Gate outside a backend's native set (backend compatibility)
    #[error("Gate '{gate}' is not supported by backend '{backend}'")]
    UnsupportedGate { gate: String, backend: String },

    /// Unknown device or backend name
    #[error("Backend '{0}' not available")]
    BackendNotAvailable(String),

    /// Noise model inconsistent with the gates it is applied to
    #[error("Invalid noise model: {0}")]
    InvalidNoiseModel(String),

    // ========================================================================
    // Configuration & I/O Errors
    // ========================================================================
    /// Configuration validation error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(String),

    /// File I/O error
    #[error("File error: {0}")]
    FileError(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type alias for Grove operations
pub type GroveResult<T> = Result<T, GroveError>;

// ============================================================================
// Error Conversion Helpers
// ============================================================================

impl From<serde_json::Error> for GroveError {
    fn from(err: serde_json::Error) -> Self {
        GroveError::JsonError(err.to_string())
    }
}

impl From<std::io::Error> for GroveError {
    fn from(err: std::io::Error) -> Self {
        GroveError::FileError(err.to_string())
    }
}

// ============================================================================
// Error Helpers
// ============================================================================

impl GroveError {
    /// Check if a sweep may record this error and continue with the next point
    pub fn is_recoverable(&self) -> bool {
        self.is_backend_compatibility()
            || matches!(self, GroveError::InsufficientConnectivity { .. })
    }

    /// Check if error is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            GroveError::InvalidProbability(_)
                | GroveError::InvalidErrorRate(_)
                | GroveError::InvalidBitstring(_)
                | GroveError::EmptyBitstring
                | GroveError::InvalidShots(_)
                | GroveError::QubitLimitExceeded { .. }
        )
    }

    /// Check if error is a circuit construction error
    pub fn is_circuit_error(&self) -> bool {
        matches!(
            self,
            GroveError::QubitOutOfRange { .. }
                | GroveError::GateQubitMismatch { .. }
                | GroveError::DuplicateQubit { .. }
                | GroveError::WidthMismatch { .. }
                | GroveError::TopologyViolation { .. }
        )
    }

    /// Check if error means a circuit cannot run on a given backend
    pub fn is_backend_compatibility(&self) -> bool {
        matches!(
            self,
            GroveError::UnsupportedGate { .. } | GroveError::BackendNotAvailable(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GroveError::InvalidProbability(1.5);
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn test_gate_qubit_mismatch() {
        let err = GroveError::GateQubitMismatch {
            qubit: 10,
            num_qubits: 7,
        };
        assert!(err.to_string().contains("10"));
        assert!(err.to_string().contains("7"));
    }

    #[test]
    fn test_is_recoverable() {
        let err = GroveError::UnsupportedGate {
            gate: "ecr".into(),
            backend: "linear_8".into(),
        };
        assert!(err.is_recoverable());
        assert!(err.is_backend_compatibility());
        assert!(!GroveError::NumericalInstability { norm: 1.1 }.is_recoverable());
    }

    #[test]
    fn test_is_validation_error() {
        assert!(GroveError::EmptyBitstring.is_validation_error());
        assert!(GroveError::InvalidShots(0).is_validation_error());
        assert!(!GroveError::ConfigError("test".into()).is_validation_error());
    }

    #[test]
    fn test_is_circuit_error() {
        let err = GroveError::DuplicateQubit {
            gate: "cx".into(),
            qubit: 1,
        };
        assert!(err.is_circuit_error());
        assert!(!err.is_validation_error());
    }
}
