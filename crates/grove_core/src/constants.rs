//! Constants for Grove
//!
//! Grover parameters, simulation limits, and sweep defaults.
//! Sweep defaults reproduce the reference benchmark runs.

// ============================================================================
// Grover Constants
// ============================================================================

pub mod grover {
    //! Grover search parameters

    use std::f64::consts::PI;

    /// Optimal iteration count `round(π/4 · √(2^n))`, never below 1
    pub fn optimal_iterations(num_qubits: usize) -> usize {
        let space = 2f64.powi(num_qubits as i32);
        let k = (PI / 4.0 * space.sqrt()).round() as usize;
        k.max(1)
    }

    /// Noiseless success probability after `iterations` rounds with one marked state
    ///
    /// `sin²((2k + 1)·θ)` with `sin θ = 1/√N`.
    pub fn theoretical_success(num_qubits: usize, iterations: usize) -> f64 {
        let space = 2f64.powi(num_qubits as i32);
        let theta = (1.0 / space.sqrt()).asin();
        ((2 * iterations + 1) as f64 * theta).sin().powi(2)
    }
}

// ============================================================================
// Simulation Constants
// ============================================================================

pub mod sim {
    //! State-vector simulation limits

    /// Maximum allowed deviation of the state norm from 1
    pub const NORM_TOLERANCE: f64 = 1e-9;

    /// Largest register the state-vector engine accepts
    pub const MAX_QUBITS: usize = 24;

    /// Amplitude magnitude treated as zero by decompositions
    pub const ZERO_TOLERANCE: f64 = 1e-12;

    /// Angle tolerance for dropping identity rotations
    pub const ANGLE_TOLERANCE: f64 = 1e-10;
}

// ============================================================================
// Statistics Constants
// ============================================================================

pub mod stats {
    //! Sampling defaults

    /// Shots for a single ideal-vs-noisy experiment
    pub const DEFAULT_SHOTS: u64 = 8192;

    /// Shots per point in sweeps
    pub const SWEEP_SHOTS: u64 = 4096;
}

// ============================================================================
// Sweep Constants
// ============================================================================

pub mod sweep {
    //! Default sweep ranges

    /// Lowest depolarizing rate in the noise sweep
    pub const NOISE_RATE_MIN: f64 = 1e-4;

    /// Highest depolarizing rate in the noise sweep
    pub const NOISE_RATE_MAX: f64 = 1e-1;

    /// Number of log-spaced noise points
    pub const NOISE_POINTS: usize = 10;

    /// Qubit counts of the scalability sweep
    pub const QUBIT_COUNTS: [usize; 4] = [3, 4, 5, 6];

    /// Target of the single experiment and the noise sweep
    pub const EXPERIMENT_TARGET: &str = "101";

    /// Target of the topology sweep
    pub const TOPOLOGY_TARGET: &str = "1011";

    /// `points` values spaced evenly in log10 between `min` and `max` inclusive
    pub fn logspace(min: f64, max: f64, points: usize) -> Vec<f64> {
        match points {
            0 => Vec::new(),
            1 => vec![min],
            _ => {
                let (lo, hi) = (min.log10(), max.log10());
                let step = (hi - lo) / (points - 1) as f64;
                (0..points)
                    .map(|i| 10f64.powf(lo + step * i as f64))
                    .collect()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_optimal_iterations() {
        assert_eq!(grover::optimal_iterations(1), 1);
        assert_eq!(grover::optimal_iterations(3), 2);
        assert_eq!(grover::optimal_iterations(4), 3);
        assert_eq!(grover::optimal_iterations(5), 4);
        assert_eq!(grover::optimal_iterations(6), 6);
    }

    #[test]
    fn test_theoretical_success() {
        let p = grover::theoretical_success(3, 2);
        assert!((p - 0.9453).abs() < 1e-3);
        assert!((grover::theoretical_success(2, 1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_logspace() {
        let points = sweep::logspace(1e-4, 1e-1, 10);
        assert_eq!(points.len(), 10);
        assert_relative_eq!(points[0], 1e-4, max_relative = 1e-12);
        assert_relative_eq!(points[9], 1e-1, max_relative = 1e-12);
        assert_relative_eq!(points[3], 1e-3, max_relative = 1e-12);
        assert!(points.windows(2).all(|w| w[0] < w[1]));
        assert!(sweep::logspace(1e-3, 1e-2, 0).is_empty());
    }
}
