//! Result records
//!
//! Immutable outputs of each experiment, created once per run and handed
//! to the reporter.

use grove_core::types::Counts;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

fn probability(count: u64, shots: u64) -> f64 {
    if shots == 0 {
        0.0
    } else {
        count as f64 / shots as f64
    }
}

// ============================================================================
// Single Experiment
// ============================================================================

/// One row of the per-state comparison table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRow {
    /// Measured bitstring
    pub state: String,
    /// Ideal count
    pub ideal_count: u64,
    /// Ideal probability
    pub ideal_probability: f64,
    /// Noisy count
    pub noisy_count: u64,
    /// Noisy probability
    pub noisy_probability: f64,
}

/// Ideal vs noisy run of one search circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    /// Marked bitstring
    pub target: String,
    /// Register width
    pub num_qubits: usize,
    /// Grover iterations
    pub iterations: usize,
    /// Shots per simulator
    pub shots: u64,
    /// Noisy backend name
    pub backend: String,
    /// Depth of the logical circuit
    pub circuit_depth: usize,
    /// Depth of the circuit the noisy backend executed
    pub executed_depth: usize,
    /// Two-qubit gates the noisy backend executed
    pub two_qubit_gates: usize,
    /// Ideal histogram
    pub ideal_counts: Counts,
    /// Noisy histogram
    pub noisy_counts: Counts,
    /// P(target) without noise
    pub ideal_success: f64,
    /// P(target) with noise
    pub noisy_success: f64,
    /// Hellinger fidelity between the histograms
    pub fidelity: f64,
}

impl ExperimentRecord {
    /// Rows over every state seen by either run, sorted by bitstring
    pub fn rows(&self) -> Vec<StateRow> {
        let states: BTreeSet<&String> = self
            .ideal_counts
            .keys()
            .chain(self.noisy_counts.keys())
            .collect();

        states
            .into_iter()
            .map(|state| {
                let ideal_count = self.ideal_counts.get(state).copied().unwrap_or(0);
                let noisy_count = self.noisy_counts.get(state).copied().unwrap_or(0);
                StateRow {
                    state: state.clone(),
                    ideal_count,
                    ideal_probability: probability(ideal_count, self.shots),
                    noisy_count,
                    noisy_probability: probability(noisy_count, self.shots),
                }
            })
            .collect()
    }
}

// ============================================================================
// Noise Sweep
// ============================================================================

/// One error rate of the noise sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseSweepRecord {
    /// Depolarizing rate on every `u` and `cx`
    pub error_rate: f64,
    /// Marked bitstring
    pub target: String,
    /// Grover iterations
    pub iterations: usize,
    /// Shots
    pub shots: u64,
    /// Depth of the executed circuit
    pub executed_depth: usize,
    /// Two-qubit gates in the executed circuit
    pub two_qubit_gates: usize,
    /// P(target)
    pub success_probability: f64,
    /// Hellinger fidelity against the ideal baseline
    pub fidelity: f64,
    /// Noisy histogram
    pub counts: Counts,
}

// ============================================================================
// Topology Sweep
// ============================================================================

/// One device of the topology sweep
///
/// A device that cannot run the circuit keeps its row with `error` set
/// and no metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyRecord {
    /// Backend name
    pub device: String,
    /// Marked bitstring
    pub target: String,
    /// Shots
    pub shots: u64,
    /// Hellinger fidelity against the shared ideal baseline
    pub fidelity: Option<f64>,
    /// P(target)
    pub success_probability: Option<f64>,
    /// Depth of the executed circuit
    pub executed_depth: Option<usize>,
    /// Two-qubit gates in the executed circuit
    pub two_qubit_gates: Option<usize>,
    /// SWAPs inserted by routing
    pub swaps_inserted: Option<usize>,
    /// Why the device was skipped
    pub error: Option<String>,
}

impl TopologyRecord {
    /// Row for a device that was skipped
    pub fn failed(device: &str, target: &str, shots: u64, error: String) -> Self {
        Self {
            device: device.to_string(),
            target: target.to_string(),
            shots,
            fidelity: None,
            success_probability: None,
            executed_depth: None,
            two_qubit_gates: None,
            swaps_inserted: None,
            error: Some(error),
        }
    }

    /// Whether the device ran
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Highest-fidelity device of a topology sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestTopology {
    /// Device name
    pub name: String,
    /// Its fidelity
    pub fidelity: f64,
    /// Target of the swept circuit
    pub target: String,
}

impl fmt::Display for BestTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Best Performing Topology: {}", self.name)?;
        writeln!(f, "Fidelity: {:.6}", self.fidelity)?;
        writeln!(f, "Circuit Target: {}", self.target)
    }
}

/// Topology sweep outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySweep {
    /// Marked bitstring
    pub target: String,
    /// One record per device, in sweep order
    pub records: Vec<TopologyRecord>,
    /// Winner, if any device ran
    pub best: Option<BestTopology>,
}

// ============================================================================
// Scalability Study
// ============================================================================

/// One register size of the scalability study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalabilityRecord {
    /// Register width
    pub n_qubits: usize,
    /// Search space size `2^n`
    #[serde(rename = "N_states")]
    pub n_states: usize,
    /// Marked bitstring
    pub target: String,
    /// Grover iterations
    pub k_optimal: usize,
    /// Depth of the logical circuit
    pub original_depth: usize,
    /// Depth after fitting to the device
    pub transpiled_depth: usize,
    /// Two-qubit entanglers after fitting
    pub cnot_count: usize,
    /// P(target) without noise
    pub ideal_success: f64,
    /// P(target) on the device
    pub noisy_success: f64,
    /// Hellinger fidelity between the histograms
    pub fidelity: f64,
}

// ============================================================================
// Full Run
// ============================================================================

/// Every record of a full benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchReport {
    /// Seed used
    pub seed: Option<u64>,
    /// Single experiment
    pub experiment: ExperimentRecord,
    /// Noise sweep, ascending rate
    pub noise_sweep: Vec<NoiseSweepRecord>,
    /// Topology comparison
    pub topology: TopologySweep,
    /// Scalability study, in configured order
    pub scalability: Vec<ScalabilityRecord>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u64)]) -> Counts {
        pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_rows_cover_union() {
        let record = ExperimentRecord {
            target: "11".into(),
            num_qubits: 2,
            iterations: 1,
            shots: 10,
            backend: "test".into(),
            circuit_depth: 5,
            executed_depth: 9,
            two_qubit_gates: 2,
            ideal_counts: counts(&[("11", 10)]),
            noisy_counts: counts(&[("01", 1), ("11", 9)]),
            ideal_success: 1.0,
            noisy_success: 0.9,
            fidelity: 0.9,
        };

        let rows = record.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].state, "01");
        assert_eq!(rows[0].ideal_count, 0);
        assert_eq!(rows[0].noisy_probability, 0.1);
        assert_eq!(rows[1].ideal_probability, 1.0);
    }

    #[test]
    fn test_best_topology_text() {
        let best = BestTopology {
            name: "linear_8".into(),
            fidelity: 0.91234567,
            target: "1011".into(),
        };
        assert_eq!(
            best.to_string(),
            "Best Performing Topology: linear_8\nFidelity: 0.912346\nCircuit Target: 1011\n"
        );
    }

    #[test]
    fn test_failed_record() {
        let record = TopologyRecord::failed("dev", "101", 100, "unsupported".into());
        assert!(!record.is_ok());
        assert!(record.fidelity.is_none());
    }

    #[test]
    fn test_scalability_field_names() {
        let record = ScalabilityRecord {
            n_qubits: 3,
            n_states: 8,
            target: "111".into(),
            k_optimal: 2,
            original_depth: 20,
            transpiled_depth: 80,
            cnot_count: 24,
            ideal_success: 0.94,
            noisy_success: 0.7,
            fidelity: 0.9,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"N_states\":8"));
    }
}
