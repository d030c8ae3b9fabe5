//! # Grove Core
//!
//! Core types, circuits, topology and Grover circuit construction.
//!
//! ## Quick Start
//!
//! ```rust
//! use grove_core::prelude::*;
//!
//! // Build a simple circuit
//! let circuit = CircuitBuilder::new(3)
//!     .h(0)
//!     .cnot(0, 1)
//!     .cnot(1, 2)
//!     .measure_all()
//!     .build()
//!     .unwrap();
//!
//! println!("{}", circuit);
//! println!("{}", circuit.to_qasm());
//! ```
//!
//! ## Grover Search Circuit
//!
//! ```rust
//! use grove_core::prelude::*;
//!
//! let target = Bitstring::parse("101").unwrap();
//! let k = grover::optimal_iterations(target.len());
//! let circuit = build_search_circuit_with_iterations(&target, k).unwrap();
//!
//! assert_eq!(k, 2);
//! assert_eq!(circuit.num_qubits(), 3);
//! assert_eq!(circuit.count_ops()["ccx"], 4);
//! ```
//!
//! ## Topology Validation
//!
//! ```rust
//! use grove_core::prelude::*;
//!
//! let topo = Topology::linear(5);
//! let circuit = CircuitBuilder::new(5)
//!     .cnot(0, 1)
//!     .cnot(1, 2)
//!     .build()
//!     .unwrap();
//!
//! assert!(topo.validate_circuit(&circuit).is_ok());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Core types
pub mod types;

/// Constants
pub mod constants;

/// Error types
pub mod error;

/// Quantum gates
pub mod gate;

/// Circuit structure
pub mod circuit;

/// Circuit builder
pub mod builder;

/// Qubit topology
pub mod topology;

/// Oracle, diffusion and search circuits
pub mod grover;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::CircuitBuilder;
pub use circuit::Circuit;
pub use constants::{grover as grover_params, sim, stats, sweep};
pub use error::{GroveError, GroveResult};
pub use gate::{Gate, Matrix2};
pub use grover::{
    build_diffusion, build_oracle, build_search_circuit, build_search_circuit_with_iterations,
};
pub use topology::Topology;
pub use types::{Angle, Bitstring, ClbitId, Counts, QubitId};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use grove_core::prelude::*;
    //! ```

    pub use crate::builder::CircuitBuilder;
    pub use crate::circuit::Circuit;
    pub use crate::constants::{grover, sim, stats, sweep};
    pub use crate::error::{GroveError, GroveResult};
    pub use crate::gate::{Gate, Matrix2};
    pub use crate::grover::{
        build_diffusion, build_oracle, build_search_circuit, build_search_circuit_with_iterations,
    };
    pub use crate::topology::Topology;
    pub use crate::types::{Angle, Bitstring, ClbitId, Counts, QubitId};
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_grover_circuit_matches_topology_after_measure() {
        let target = Bitstring::parse("1011").unwrap();
        let circuit = build_search_circuit(&target).unwrap();

        // Wide gates never validate against a coupling map directly
        assert!(Topology::all_to_all(4).validate_circuit(&circuit).is_err());
        assert_eq!(circuit.measurement_map(), vec![Some(0), Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_depth_grows_with_iterations() {
        let target = Bitstring::parse("101").unwrap();
        let one = build_search_circuit_with_iterations(&target, 1).unwrap();
        let three = build_search_circuit_with_iterations(&target, 3).unwrap();
        assert!(three.depth() > one.depth());
        assert_eq!(three.count_multi(), 3 * one.count_multi());
    }

    #[test]
    fn test_constants() {
        assert_eq!(stats::DEFAULT_SHOTS, 8192);
        assert_eq!(stats::SWEEP_SHOTS, 4096);
        assert!((sim::NORM_TOLERANCE - 1e-9).abs() < 1e-20);
        assert_eq!(sweep::QUBIT_COUNTS, [3, 4, 5, 6]);
    }

    #[test]
    fn test_linear_chain_finding() {
        let topo = Topology::linear(7);

        let chain = topo.find_linear_chain(7).unwrap();
        assert_eq!(chain.len(), 7);

        for i in 0..chain.len() - 1 {
            assert!(
                topo.is_connected(chain[i], chain[i + 1]),
                "Chain broken at {} -> {}",
                chain[i],
                chain[i + 1]
            );
        }
    }
}
