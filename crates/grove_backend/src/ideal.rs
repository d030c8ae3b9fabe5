//! Ideal (noise-free) simulator

use crate::execution::{Backend, ExecutionMetadata, ExecutionResult};
use crate::rng::SimRng;
use crate::sampler::{check_shots, MeasurementSampler};
use crate::state::StateVector;
use grove_core::circuit::Circuit;
use grove_core::error::GroveResult;
use grove_core::types::Counts;
use std::collections::BTreeMap;
use std::time::Instant;

/// Evolve once, then sample `shots` outcomes from `|amplitude|²`
pub fn run_ideal(circuit: &Circuit, shots: u64, rng: &mut SimRng) -> GroveResult<Counts> {
    check_shots(shots)?;
    let state = StateVector::run(circuit)?;
    MeasurementSampler::new(circuit).sample(&state.probabilities(), shots, rng)
}

/// Exact outcome distribution of `circuit` over histogram keys
pub fn ideal_distribution(circuit: &Circuit) -> GroveResult<BTreeMap<String, f64>> {
    let state = StateVector::run(circuit)?;
    Ok(MeasurementSampler::new(circuit).distribution(&state.probabilities()))
}

/// Noise-free state-vector backend
#[derive(Debug, Clone)]
pub struct IdealSimulator {
    name: String,
    seed: Option<u64>,
}

impl Default for IdealSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdealSimulator {
    /// Create ideal simulator
    pub fn new() -> Self {
        Self {
            name: "ideal_simulator".to_string(),
            seed: None,
        }
    }

    /// Set seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set backend name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl Backend for IdealSimulator {
    fn name(&self) -> &str {
        &self.name
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn execute_with_rng(
        &self,
        circuit: &Circuit,
        shots: u64,
        rng: &mut SimRng,
    ) -> GroveResult<ExecutionResult> {
        let start = Instant::now();
        let counts = run_ideal(circuit, shots, rng)?;

        let mut metadata = ExecutionMetadata::for_circuit(&self.name, circuit);
        metadata.execution_time_ms = Some(start.elapsed().as_millis() as u64);
        log::debug!("{}: {} shots on {} qubits", self.name, shots, circuit.num_qubits());

        Ok(ExecutionResult::new(counts, shots, &self.name).with_metadata(metadata))
    }
}

// ============================================================================
// Tests
// ============================================================================
