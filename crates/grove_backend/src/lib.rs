//! # Grove Backend
//!
//! State-vector engine, measurement sampling, the ideal, noisy and
//! device-calibrated simulators, and Hellinger fidelity.
//!
//! ## Quick Start
//!
//! ```rust
//! use grove_backend::prelude::*;
//! use grove_core::prelude::*;
//!
//! let target = Bitstring::parse("101").unwrap();
//! let circuit = build_search_circuit(&target).unwrap();
//!
//! let ideal = IdealSimulator::new().with_seed(42);
//! let result = ideal.execute(&circuit, 8192).unwrap();
//!
//! assert_eq!(result.most_frequent().unwrap().0, "101");
//! assert!(result.success_probability(&target) > 0.85);
//! ```
//!
//! ## Noisy Simulation
//!
//! ```rust
//! use grove_backend::prelude::*;
//! use grove_core::prelude::*;
//!
//! let target = Bitstring::parse("101").unwrap();
//! let circuit = build_search_circuit(&target).unwrap();
//!
//! // 1-qubit error 0.001, 2-qubit error 0.01
//! let mut rng = seeded_rng(Some(42));
//! let ideal = IdealSimulator::new().execute_with_rng(&circuit, 4096, &mut rng).unwrap();
//! let noisy = NoisySimulator::depolarizing(0.001, 0.01)
//!     .unwrap()
//!     .execute_with_rng(&circuit, 4096, &mut rng)
//!     .unwrap();
//!
//! let f = hellinger_fidelity(&ideal.counts, &noisy.counts, 4096).unwrap();
//! println!("F = {:.6}", f);
//! assert!(f > 0.85);
//! ```
//!
//! ## Device-Calibrated Simulation
//!
//! ```rust
//! use grove_backend::prelude::*;
//! use grove_core::prelude::*;
//!
//! let circuit = build_search_circuit(&Bitstring::parse("1011").unwrap()).unwrap();
//! let device = DeviceSimulator::by_name("linear_8").unwrap().with_seed(7);
//!
//! let result = device.execute(&circuit, 1024).unwrap();
//! println!("{} swaps, depth {}", result.metadata.swaps_inserted, result.metadata.executed_depth);
//! assert_eq!(result.total_counts(), 1024);
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Seedable random source
pub mod rng;

/// State-vector engine
pub mod state;

/// Measurement sampling
pub mod sampler;

/// Execution types and backend trait
pub mod execution;

/// Ideal simulator
pub mod ideal;

/// Noisy trajectory simulator
pub mod noisy;

/// Device-calibrated simulator
pub mod calibrated;

/// Hellinger fidelity
pub mod fidelity;

// ============================================================================
// Re-exports
// ============================================================================

pub use calibrated::DeviceSimulator;
pub use execution::{Backend, ExecutionMetadata, ExecutionResult};
pub use fidelity::{distribution_fidelity, hellinger_fidelity, result_fidelity};
pub use ideal::{ideal_distribution, run_ideal, IdealSimulator};
pub use noisy::{ensure_native, run_noisy, NoisySimulator};
pub use rng::{seeded_rng, SimRng};
pub use sampler::MeasurementSampler;
pub use state::StateVector;

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use grove_backend::prelude::*;
    //! ```

    pub use crate::calibrated::DeviceSimulator;
    pub use crate::execution::{Backend, ExecutionMetadata, ExecutionResult};
    pub use crate::fidelity::{distribution_fidelity, hellinger_fidelity, result_fidelity};
    pub use crate::ideal::{ideal_distribution, run_ideal, IdealSimulator};
    pub use crate::noisy::{run_noisy, NoisySimulator};
    pub use crate::rng::{seeded_rng, SimRng};
    pub use crate::state::StateVector;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use approx::assert_abs_diff_eq;
    use grove_calibration::{fit_to_topology, DeviceProfile};
    use grove_core::prelude::*;

    fn search(target: &str) -> Circuit {
        build_search_circuit(&Bitstring::parse(target).unwrap()).unwrap()
    }

    #[test]
    fn test_rewrite_preserves_distribution_on_every_preset() {
        let mut circuits = vec![search("101"), search("1011")];
        for n in sweep::QUBIT_COUNTS {
            circuits.push(build_search_circuit(&Bitstring::ones(n).unwrap()).unwrap());
        }

        for name in DeviceProfile::PRESETS {
            let device = DeviceProfile::by_name(name).unwrap();
            for circuit in &circuits {
                let fitted = fit_to_topology(circuit, &device).unwrap();
                let expected = ideal_distribution(circuit).unwrap();
                let actual = ideal_distribution(fitted.circuit()).unwrap();

                assert_abs_diff_eq!(distribution_fidelity(&expected, &actual), 1.0, epsilon = 1e-9);
                for (key, p) in &expected {
                    let q = actual.get(key).copied().unwrap_or(0.0);
                    assert_abs_diff_eq!(*p, q, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_backends_behind_trait_objects() {
        let backends: Vec<Box<dyn Backend>> = vec![
            Box::new(IdealSimulator::new().with_seed(42)),
            Box::new(NoisySimulator::depolarizing(0.001, 0.01).unwrap().with_seed(42)),
            Box::new(DeviceSimulator::by_name("grid_3x3").unwrap().with_seed(42)),
        ];

        let circuit = search("101");
        for backend in &backends {
            let result = backend.execute(&circuit, 2048).unwrap();
            assert_eq!(result.total_counts(), 2048);
            assert_eq!(result.metadata.backend, backend.name());
            assert_eq!(result.most_frequent().unwrap().0, "101", "{}", backend.name());
        }
    }

    #[test]
    fn test_noise_degrades_fidelity_monotonically() {
        let circuit = search("101");
        let mut rng = seeded_rng(Some(42));
        let ideal = run_ideal(&circuit, 4096, &mut rng).unwrap();

        let fidelities: Vec<f64> = [0.0, 0.01, 0.05, 0.2]
            .iter()
            .map(|&p| {
                let noisy = NoisySimulator::depolarizing(p, p)
                    .unwrap()
                    .execute_with_rng(&circuit, 4096, &mut rng)
                    .unwrap();
                hellinger_fidelity(&ideal, &noisy.counts, 4096).unwrap()
            })
            .collect();

        assert!(fidelities[0] > 0.99, "{:?}", fidelities);
        for pair in fidelities.windows(2) {
            assert!(pair[1] < pair[0], "{:?}", fidelities);
        }
    }

    #[test]
    fn test_batch_execution() {
        let backend = IdealSimulator::new().with_seed(42);
        let circuits: Vec<Circuit> = ["00", "01", "10", "11"].iter().map(|t| search(t)).collect();

        let results = backend.execute_batch(&circuits, 100).unwrap();
        assert_eq!(results.len(), 4);
        for result in &results {
            assert_eq!(result.shots, 100);
        }
    }

    #[test]
    fn test_result_serializes() {
        let result = IdealSimulator::new().with_seed(1).execute(&search("11"), 64).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let back: ExecutionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
