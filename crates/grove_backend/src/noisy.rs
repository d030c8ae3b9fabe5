//! Noisy simulator
//!
//! Per-shot Monte Carlo trajectories. After each gate the noise model's
//! channel for that gate fires with its error rate and applies a uniformly
//! random Pauli string to the gate's qubits; averaged over shots this is
//! the depolarizing channel.
//!
//! Depolarizing events do not depend on the state, so a shot first draws
//! all of its events. A shot with no effective event is a draw from the
//! ideal distribution. Otherwise the trajectory resumes from the last
//! cached ideal state before its first event.
//!
//! Each noisy shot seeds two private streams from the caller's generator,
//! one for its error events and one for its outcome and readout. Every
//! channel consumes the same draws whether or not it fires, so two runs
//! seeded alike at different error rates share their shots: the errors at
//! the lower rate are a subset of those at the higher rate.

use crate::execution::{Backend, ExecutionMetadata, ExecutionResult};
use crate::rng::SimRng;
use crate::sampler::{check_shots, draw_index, weighted_index, MeasurementSampler};
use crate::state::StateVector;
use grove_calibration::{NativeGateSet, Transpiler};
use grove_core::circuit::Circuit;
use grove_core::error::{GroveError, GroveResult};
use grove_core::gate::Gate;
use grove_core::types::Counts;
use grove_noise::{NoiseModel, Pauli};
use rand::distributions::Distribution;
use rand::{Rng, SeedableRng};
use std::time::Instant;

/// Upper bound on cached ideal states per circuit
const MAX_CHECKPOINTS: usize = 16;

// ============================================================================
// Trajectory Engine
// ============================================================================

/// Sample `shots` noisy outcomes of `circuit` under `noise_model`
///
/// Gates are keyed into the model by name; gates without an entry are
/// noiseless. Readout error, if any, is applied to every measured bit.
pub fn run_noisy(
    circuit: &Circuit,
    noise_model: &NoiseModel,
    shots: u64,
    rng: &mut SimRng,
) -> GroveResult<Counts> {
    check_shots(shots)?;
    noise_model.validate()?;

    let gates: Vec<&Gate> = circuit.unitary_gates().collect();
    let channels = gates
        .iter()
        .map(|g| noise_model.channel_for(g))
        .collect::<GroveResult<Vec<_>>>()?;

    // Ideal checkpoints: checkpoints[c] is the state before gate c * stride
    let stride = gates.len().div_ceil(MAX_CHECKPOINTS).max(1);
    let mut checkpoints = Vec::with_capacity(MAX_CHECKPOINTS + 1);
    let mut state = StateVector::new(circuit.num_qubits())?;
    for (i, gate) in gates.iter().enumerate() {
        if i % stride == 0 {
            checkpoints.push(state.clone());
        }
        state.apply(gate)?;
    }
    if checkpoints.is_empty() {
        checkpoints.push(state.clone());
    }
    let probabilities = state.probabilities();
    let sampler = MeasurementSampler::new(circuit).with_readout_error(noise_model.readout_error());
    let mut counts = Counts::new();

    if channels.iter().flatten().all(|c| c.is_trivial()) {
        let ideal = weighted_index(&probabilities)?;
        for _ in 0..shots {
            let index = ideal.sample(rng);
            *counts.entry(sampler.read(index, rng)).or_insert(0) += 1;
        }
        return Ok(counts);
    }

    let mut noisy_shots = 0u64;
    let mut events: Vec<(usize, Vec<Pauli>)> = Vec::new();

    for _ in 0..shots {
        let mut event_rng = SimRng::seed_from_u64(rng.gen());
        let mut outcome_rng = SimRng::seed_from_u64(rng.gen());

        events.clear();
        for (i, channel) in channels.iter().enumerate() {
            if let Some(paulis) = channel.and_then(|c| c.sample_coupled(&mut event_rng)) {
                if paulis.iter().any(|&p| p != Pauli::I) {
                    events.push((i, paulis));
                }
            }
        }

        let index = match events.first() {
            None => draw_index(&probabilities, &mut outcome_rng),
            Some(&(first, _)) => {
                noisy_shots += 1;
                let start = (first / stride) * stride;
                let mut trajectory = checkpoints[first / stride].clone();
                let mut pending = events.iter().peekable();
                for (i, gate) in gates.iter().enumerate().skip(start) {
                    trajectory.apply(gate)?;
                    while let Some((_, paulis)) = pending.next_if(|(at, _)| *at == i) {
                        trajectory.apply_paulis(&gate.qubits(), paulis)?;
                    }
                }
                draw_index(&trajectory.probabilities(), &mut outcome_rng)
            }
        };

        *counts.entry(sampler.read(index, &mut outcome_rng)).or_insert(0) += 1;
    }

    log::debug!(
        "{} of {} shots hit at least one gate error ({} gates, {} checkpoints)",
        noisy_shots,
        shots,
        gates.len(),
        checkpoints.len()
    );
    Ok(counts)
}

/// Fail unless every gate of `circuit` is in `native`
pub fn ensure_native(circuit: &Circuit, native: &NativeGateSet, backend: &str) -> GroveResult<()> {
    match circuit.gates().iter().find(|g| !native.admits(g)) {
        Some(gate) => Err(GroveError::UnsupportedGate {
            gate: gate.name().to_string(),
            backend: backend.to_string(),
        }),
        None => Ok(()),
    }
}

// ============================================================================
// NoisySimulator
// ============================================================================

/// Uncalibrated noisy backend
///
/// With a basis set, circuits are first rewritten into it (all-to-all
/// connectivity) so the noise model's gate keys match what executes.
#[derive(Debug, Clone)]
pub struct NoisySimulator {
    name: String,
    noise_model: NoiseModel,
    basis: Option<NativeGateSet>,
    seed: Option<u64>,
}

impl NoisySimulator {
    /// Run circuits as given under `noise_model`
    pub fn new(noise_model: NoiseModel) -> Self {
        Self {
            name: "noisy_simulator".to_string(),
            noise_model,
            basis: None,
            seed: None,
        }
    }

    /// Depolarizing `u`/`cx` noise with circuits rewritten to that basis
    pub fn depolarizing(error_1q: f64, error_2q: f64) -> GroveResult<Self> {
        Ok(Self::new(NoiseModel::depolarizing_split(error_1q, error_2q)?)
            .with_basis(NativeGateSet::u_cx()))
    }

    /// Rewrite circuits into `basis` before execution
    pub fn with_basis(mut self, basis: NativeGateSet) -> Self {
        self.basis = Some(basis);
        self
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

    /// Noise model in use
    pub fn noise_model(&self) -> &NoiseModel {
        &self.noise_model
    }

    /// Native basis circuits are rewritten into, if any
    pub fn basis(&self) -> Option<&NativeGateSet> {
        self.basis.as_ref()
    }
}

impl Backend for NoisySimulator {
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

        let executed = match &self.basis {
            Some(basis) => {
                let rewritten = Transpiler::basis_only(basis.clone(), self.name.as_str())
                    .run(circuit)?
                    .into_circuit();
                ensure_native(&rewritten, basis, &self.name)?;
                rewritten
            }
            None => circuit.clone(),
        };

        let counts = run_noisy(&executed, &self.noise_model, shots, rng)?;

        let mut metadata = ExecutionMetadata::for_circuit(&self.name, &executed);
        metadata.execution_time_ms = Some(start.elapsed().as_millis() as u64);
        Ok(ExecutionResult::new(counts, shots, &self.name).with_metadata(metadata))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fidelity::hellinger_fidelity;
    use crate::ideal::run_ideal;
    use crate::rng::seeded_rng;
    use grove_core::builder::CircuitBuilder;
    use grove_core::grover::build_search_circuit;
    use grove_core::types::Bitstring;
    use grove_noise::DepolarizingChannel;

    fn search_101() -> Circuit {
        build_search_circuit(&Bitstring::parse("101").unwrap()).unwrap()
    }

    #[test]
    fn test_zero_noise_matches_ideal_stream() {
        // With no channels every shot is an ideal draw
        let circuit = search_101();
        let ideal = run_ideal(&circuit, 2000, &mut seeded_rng(Some(42))).unwrap();
        let noisy = run_noisy(&circuit, &NoiseModel::ideal(), 2000, &mut seeded_rng(Some(42))).unwrap();
        assert_eq!(ideal, noisy);
    }

    #[test]
    fn test_high_noise_approaches_uniform() {
        let sim = NoisySimulator::depolarizing(0.9, 0.9).unwrap().with_seed(42);
        let result = sim.execute(&search_101(), 8000).unwrap();

        assert_eq!(result.unique_outcomes(), 8);
        for (key, &count) in &result.counts {
            let p = count as f64 / 8000.0;
            assert!((p - 0.125).abs() < 0.03, "P({}) = {}", key, p);
        }
    }

    #[test]
    fn test_representative_noise_scenario() {
        let target = Bitstring::parse("101").unwrap();
        let circuit = search_101();
        let mut rng = seeded_rng(Some(42));

        let ideal = run_ideal(&circuit, 8192, &mut rng).unwrap();
        let noisy = NoisySimulator::depolarizing(0.001, 0.01)
            .unwrap()
            .execute_with_rng(&circuit, 8192, &mut rng)
            .unwrap();

        let p_ideal = ideal[&target.to_string()] as f64 / 8192.0;
        let p_noisy = noisy.success_probability(&target);
        let fidelity = hellinger_fidelity(&ideal, &noisy.counts, 8192).unwrap();

        assert!(p_ideal >= 0.85, "ideal {}", p_ideal);
        assert!(p_noisy >= 0.40 && p_noisy < p_ideal, "noisy {}", p_noisy);
        assert!((0.85..=1.0).contains(&fidelity), "fidelity {}", fidelity);
    }

    #[test]
    fn test_rewrite_keys_noise_to_basis() {
        let sim = NoisySimulator::depolarizing(0.001, 0.01).unwrap().with_seed(7);
        let result = sim.execute(&search_101(), 256).unwrap();
        let ops = &result.metadata.executed_ops;
        assert!(ops.contains_key("u") && ops.contains_key("cx"));
        assert!(!ops.contains_key("ccx") && !ops.contains_key("h"));
    }

    #[test]
    fn test_arity_mismatch_surfaces() {
        let model = NoiseModel::ideal().with_gate_error("cx", DepolarizingChannel::single(0.1).unwrap());
        let circuit = CircuitBuilder::new(2).cx(0, 1).build().unwrap();
        let err = run_noisy(&circuit, &model, 10, &mut seeded_rng(Some(42))).unwrap_err();
        assert!(matches!(err, GroveError::InvalidNoiseModel(_)));
    }

    #[test]
    fn test_ensure_native() {
        let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).build().unwrap();
        let err = ensure_native(&circuit, &NativeGateSet::rz_sx_cx(), "dev").unwrap_err();
        assert_eq!(
            err,
            GroveError::UnsupportedGate {
                gate: "h".into(),
                backend: "dev".into()
            }
        );
        assert!(err.is_backend_compatibility());
    }

    #[test]
    fn test_readout_error_only() {
        // Deterministic |11⟩ with 50% flips per bit: uniform over 2 bits
        let circuit = CircuitBuilder::new(2).x(0).x(1).measure_all().build().unwrap();
        let model = NoiseModel::ideal().with_readout_error(0.5);
        let counts = run_noisy(&circuit, &model, 8000, &mut seeded_rng(Some(42))).unwrap();
        assert_eq!(counts.len(), 4);
        for &c in counts.values() {
            assert!((c as f64 / 8000.0 - 0.25).abs() < 0.03);
        }
    }

    #[test]
    fn test_seed_reproducibility() {
        let a = NoisySimulator::depolarizing(0.02, 0.05).unwrap().with_seed(42);
        let b = NoisySimulator::depolarizing(0.02, 0.05).unwrap().with_seed(42);
        let circuit = search_101();
        assert_eq!(
            a.execute(&circuit, 300).unwrap().counts,
            b.execute(&circuit, 300).unwrap().counts
        );
    }
}
