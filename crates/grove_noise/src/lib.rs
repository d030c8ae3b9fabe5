//! # Grove Noise
//!
//! Depolarizing channels and gate-keyed noise models.
//!
//! ## Quick Start
//!
//! ```rust
//! use grove_noise::prelude::*;
//! use grove_core::Gate;
//!
//! // 0.1% on single-qubit `u`, 1% on `cx`
//! let model = NoiseModel::depolarizing_split(0.001, 0.01).unwrap();
//! println!("{}", model);
//!
//! let cx = model.channel_for(&Gate::Cnot(0, 1)).unwrap().unwrap();
//! assert_eq!(cx.num_qubits(), 2);
//!
//! // Gates without an entry pass through
//! assert!(model.channel_for(&Gate::H(0)).unwrap().is_none());
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Depolarizing channel and Pauli sampling
pub mod channel;

/// Gate-keyed noise model
pub mod noise_model;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{DepolarizingChannel, Pauli};
pub use noise_model::NoiseModel;

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases

    pub use crate::channel::{DepolarizingChannel, Pauli};
    pub use crate::noise_model::NoiseModel;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use grove_core::prelude::*;

    #[test]
    fn test_grover_circuit_has_no_native_noise_before_rewrite() {
        // The logical circuit uses h/x/ccx, none of which carry channels
        let model = NoiseModel::depolarizing(0.05).unwrap();
        let circuit = build_search_circuit_with_iterations(&Bitstring::parse("101").unwrap(), 2).unwrap();
        assert!((model.error_free_probability(&circuit) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_custom_native_set_model() {
        let model = NoiseModel::ideal()
            .with_gate_error("sx", DepolarizingChannel::single(2e-4).unwrap())
            .with_gate_error("cz", DepolarizingChannel::two_qubit(6e-3).unwrap())
            .with_readout_error(0.01);

        assert!(model.validate().is_ok());
        assert!(model.channel_for(&Gate::Cz(0, 1)).unwrap().is_some());
        assert!(model.channel_for(&Gate::Rz(0, 1.0)).unwrap().is_none());
        assert!(!model.is_ideal());
    }
}
