//! Backend execution types and traits
//!
//! Defines the interface every simulator variant implements and the
//! histogram-plus-metadata result they return.

use crate::rng::{seeded_rng, SimRng};
use grove_core::circuit::Circuit;
use grove_core::error::GroveResult;
use grove_core::types::{Bitstring, Counts};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Result of circuit execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement counts (bitstring -> count)
    pub counts: Counts,

    /// Number of shots executed
    pub shots: u64,

    /// Execution metadata
    pub metadata: ExecutionMetadata,
}

/// Execution metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Backend name
    pub backend: String,

    /// Seed used (if any)
    pub seed: Option<u64>,

    /// Wall-clock execution time in milliseconds
    pub execution_time_ms: Option<u64>,

    /// Depth of the circuit actually executed
    pub executed_depth: usize,

    /// Two-qubit gates in the circuit actually executed
    pub executed_two_qubit_gates: usize,

    /// Gate counts by name in the circuit actually executed
    pub executed_ops: BTreeMap<String, usize>,

    /// SWAPs inserted by routing
    pub swaps_inserted: usize,
}

impl ExecutionMetadata {
    /// Metadata describing the executed `circuit`
    pub fn for_circuit(backend: &str, circuit: &Circuit) -> Self {
        Self {
            backend: backend.to_string(),
            executed_depth: circuit.depth(),
            executed_two_qubit_gates: circuit.count_2q(),
            executed_ops: circuit.count_ops(),
            ..Default::default()
        }
    }
}

impl ExecutionResult {
    /// Create new execution result
    pub fn new(counts: Counts, shots: u64, backend: &str) -> Self {
        Self {
            counts,
            shots,
            metadata: ExecutionMetadata {
                backend: backend.to_string(),
                ..Default::default()
            },
        }
    }

    /// Replace the metadata
    pub fn with_metadata(mut self, metadata: ExecutionMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Get total count (equals shots)
    pub fn total_counts(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Get count of a specific bitstring
    pub fn count(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Get probability of a specific bitstring (0 for an empty result)
    pub fn probability(&self, bitstring: &str) -> f64 {
        if self.shots == 0 {
            return 0.0;
        }
        self.count(bitstring) as f64 / self.shots as f64
    }

    /// Probability of measuring `target`
    pub fn success_probability(&self, target: &Bitstring) -> f64 {
        self.probability(&target.to_string())
    }

    /// Get most frequent bitstring (lexicographically first on ties)
    pub fn most_frequent(&self) -> Option<(&String, u64)> {
        self.counts
            .iter()
            .fold(None, |best: Option<(&String, u64)>, (bs, &count)| match best {
                Some((_, c)) if c >= count => best,
                _ => Some((bs, count)),
            })
    }

    /// Number of distinct outcomes observed
    pub fn unique_outcomes(&self) -> usize {
        self.counts.len()
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExecutionResult(backend={}, shots={}, unique={}",
            self.metadata.backend,
            self.shots,
            self.counts.len()
        )?;
        if let Some((bs, count)) = self.most_frequent() {
            write!(f, ", top={}:{}", bs, count)?;
        }
        write!(f, ")")
    }
}

/// Simulated backend
///
/// Sweeps depend only on this trait. `execute` seeds a fresh generator
/// from the backend's own seed; `execute_with_rng` draws from the caller's
/// generator so one seed can drive a whole sweep.
pub trait Backend: Send + Sync {
    /// Get backend name
    fn name(&self) -> &str;

    /// Seed used by [`Backend::execute`] (`None` draws from entropy)
    fn seed(&self) -> Option<u64> {
        None
    }

    /// Execute a circuit, sampling from `rng`
    fn execute_with_rng(
        &self,
        circuit: &Circuit,
        shots: u64,
        rng: &mut SimRng,
    ) -> GroveResult<ExecutionResult>;

    /// Execute a circuit with the backend's own seed
    fn execute(&self, circuit: &Circuit, shots: u64) -> GroveResult<ExecutionResult> {
        let mut rng = seeded_rng(self.seed());
        let mut result = self.execute_with_rng(circuit, shots, &mut rng)?;
        result.metadata.seed = self.seed();
        Ok(result)
    }

    /// Execute multiple circuits (batch)
    fn execute_batch(&self, circuits: &[Circuit], shots: u64) -> GroveResult<Vec<ExecutionResult>> {
        let mut rng = seeded_rng(self.seed());
        circuits
            .iter()
            .map(|c| self.execute_with_rng(c, shots, &mut rng))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
