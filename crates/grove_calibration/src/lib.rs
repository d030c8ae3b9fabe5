//! # Grove Calibration
//!
//! Device profiles (coupling map, native gates, calibrated error rates) and
//! the topology-aware rewrite that fits logical circuits onto them.
//!
//! ## Quick Start
//!
//! ```rust
//! use grove_calibration::prelude::*;
//! use grove_core::prelude::*;
//!
//! let device = DeviceProfile::by_name("heavy_hex_7").unwrap();
//! let circuit = build_search_circuit(&Bitstring::parse("101").unwrap()).unwrap();
//!
//! let fitted = fit_to_topology(&circuit, &device).unwrap();
//! println!("depth {} -> {}", circuit.depth(), fitted.depth());
//!
//! // Every gate is native and every CX sits on a coupling
//! assert!(fitted.circuit().gates().iter().all(|g| device.native_gates().admits(g)));
//! assert!(fitted.topology().unwrap().validate_circuit(fitted.circuit()).is_ok());
//! ```
//!
//! ## Calibrated Noise
//!
//! ```rust
//! use grove_calibration::prelude::*;
//!
//! let model = DeviceProfile::grid_3x3().noise_model().unwrap();
//! assert!(model.channel("cz").is_some());
//! assert!(model.channel("rz").is_none());
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Device profiles and native gate sets
pub mod device;

/// Topology-aware rewriting
pub mod transpiler;

// ============================================================================
// Re-exports
// ============================================================================

pub use device::{DeviceCalibration, DeviceProfile, NativeGateSet};
pub use transpiler::{fit_to_topology, TranspiledCircuit, Transpiler};

// ============================================================================
// Prelude
// ============================================================================

/// Convenient imports for common use cases
pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use grove_calibration::prelude::*;
    //! ```

    pub use crate::device::{DeviceCalibration, DeviceProfile, NativeGateSet};
    pub use crate::transpiler::{fit_to_topology, TranspiledCircuit, Transpiler};
}

// ============================================================================
// Integration Tests
// ============================================================================
