//! Benchmark suite
//!
//! Drives the simulators across noise rates, devices and register sizes.
//! Every run method seeds its own generator from the suite seed, so each
//! sweep is reproducible regardless of what ran before it.

use crate::config::{
    BenchConfig, ExperimentConfig, NoiseSweepConfig, ScalabilityConfig, TopologySweepConfig,
};
use crate::records::{
    BenchReport, BestTopology, ExperimentRecord, NoiseSweepRecord, ScalabilityRecord,
    TopologyRecord, TopologySweep,
};
use grove_backend::{
    hellinger_fidelity, run_ideal, run_noisy, seeded_rng, Backend, DeviceSimulator,
    ExecutionResult, IdealSimulator, NoisySimulator, SimRng,
};
use grove_core::constants::grover;
use grove_core::error::GroveResult;
use grove_core::grover::build_search_circuit;
use grove_core::types::{Bitstring, Counts};
use rand::Rng;

fn success(counts: &Counts, target: &Bitstring, shots: u64) -> f64 {
    counts.get(&target.to_string()).copied().unwrap_or(0) as f64 / shots as f64
}

/// Benchmark suite
#[derive(Debug, Clone)]
pub struct BenchSuite {
    seed: Option<u64>,
}

impl Default for BenchSuite {
    fn default() -> Self {
        Self::new()
    }
}

impl BenchSuite {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Suite seeded with 42
    pub fn new() -> Self {
        Self { seed: Some(42) }
    }

    /// Suite with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    /// Suite drawing from entropy
    pub fn unseeded() -> Self {
        Self { seed: None }
    }

    /// Suite using the seed of `config`
    pub fn from_config(config: &BenchConfig) -> Self {
        Self { seed: config.seed }
    }

    /// Seed in use
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn rng(&self) -> SimRng {
        seeded_rng(self.seed)
    }

    // ========================================================================
    // Single Experiment
    // ========================================================================

    /// Ideal run vs the configured device
    pub fn run_experiment(&self, config: &ExperimentConfig) -> GroveResult<ExperimentRecord> {
        config.validate()?;
        let device = DeviceSimulator::by_name(&config.device)?;
        self.run_experiment_on(&config.target()?, config.shots, &device)
    }

    /// Ideal run vs `backend`
    pub fn run_experiment_on(
        &self,
        target: &Bitstring,
        shots: u64,
        backend: &dyn Backend,
    ) -> GroveResult<ExperimentRecord> {
        let circuit = build_search_circuit(target)?;
        let mut rng = self.rng();

        let ideal = run_ideal(&circuit, shots, &mut rng)?;
        let noisy = backend.execute_with_rng(&circuit, shots, &mut rng)?;
        let fidelity = hellinger_fidelity(&ideal, &noisy.counts, shots)?;

        let record = ExperimentRecord {
            target: target.to_string(),
            num_qubits: target.len(),
            iterations: grover::optimal_iterations(target.len()),
            shots,
            backend: backend.name().to_string(),
            circuit_depth: circuit.depth(),
            executed_depth: noisy.metadata.executed_depth,
            two_qubit_gates: noisy.metadata.executed_two_qubit_gates,
            ideal_success: success(&ideal, target, shots),
            noisy_success: success(&noisy.counts, target, shots),
            ideal_counts: ideal,
            noisy_counts: noisy.counts,
            fidelity,
        };

        log::info!(
            "experiment {} on {}: P ideal {:.4}, P noisy {:.4}, F {:.6}",
            record.target,
            record.backend,
            record.ideal_success,
            record.noisy_success,
            record.fidelity
        );
        Ok(record)
    }

    // ========================================================================
    // Noise Sweep
    // ========================================================================

    /// Depolarizing sweep on `u`/`cx`, fidelity against one ideal baseline
    ///
    /// Every point replays the same per-shot streams, so a shot that errs at
    /// one rate errs at every higher rate as well.
    pub fn run_noise_sweep(&self, config: &NoiseSweepConfig) -> GroveResult<Vec<NoiseSweepRecord>> {
        config.validate()?;
        let target = config.target()?;
        let circuit = build_search_circuit(&target)?;
        let mut rng = self.rng();

        let ideal = run_ideal(&circuit, config.shots, &mut rng)?;
        let point_seed: u64 = rng.gen();

        let mut records = Vec::with_capacity(config.points);
        for rate in config.rates() {
            let mut point_rng = seeded_rng(Some(point_seed));
            let result = NoisySimulator::depolarizing(rate, rate)?
                .execute_with_rng(&circuit, config.shots, &mut point_rng)?;

            let record = NoiseSweepRecord {
                error_rate: rate,
                target: target.to_string(),
                iterations: grover::optimal_iterations(target.len()),
                shots: config.shots,
                executed_depth: result.metadata.executed_depth,
                two_qubit_gates: result.metadata.executed_two_qubit_gates,
                success_probability: result.success_probability(&target),
                fidelity: hellinger_fidelity(&ideal, &result.counts, config.shots)?,
                counts: result.counts,
            };
            log::info!(
                "noise sweep p={:.4}: success {:.4}, F {:.6}",
                rate,
                record.success_probability,
                record.fidelity
            );
            records.push(record);
        }
        Ok(records)
    }

    // ========================================================================
    // Topology Sweep
    // ========================================================================

    /// Run `target`'s search on every backend against one ideal baseline
    ///
    /// Backends that cannot run the circuit are recorded and skipped; any
    /// other failure aborts the sweep.
    pub fn run_topology_sweep(
        &self,
        target: &Bitstring,
        shots: u64,
        backends: &[Box<dyn Backend>],
    ) -> GroveResult<TopologySweep> {
        let circuit = build_search_circuit(target)?;
        let mut rng = self.rng();
        let ideal = IdealSimulator::new().execute_with_rng(&circuit, shots, &mut rng)?;

        let records = backends
            .iter()
            .map(|backend| {
                let outcome = backend.execute_with_rng(&circuit, shots, &mut rng);
                topology_record(backend.name(), target, &ideal, outcome)
            })
            .collect::<GroveResult<Vec<_>>>()?;

        Ok(finish_topology_sweep(target, records))
    }

    /// Topology sweep over named device profiles
    ///
    /// The configuration is validated first, as in [`run_all`](Self::run_all):
    /// an unknown device name fails the sweep before anything runs.
    pub fn run_topology_sweep_by_name(
        &self,
        config: &TopologySweepConfig,
    ) -> GroveResult<TopologySweep> {
        config.validate()?;
        let target = config.target()?;
        let circuit = build_search_circuit(&target)?;
        let mut rng = self.rng();
        let ideal = IdealSimulator::new().execute_with_rng(&circuit, config.shots, &mut rng)?;

        let records = config
            .devices
            .iter()
            .map(|name| {
                let outcome = DeviceSimulator::by_name(name)
                    .and_then(|device| device.execute_with_rng(&circuit, config.shots, &mut rng));
                topology_record(name, &target, &ideal, outcome)
            })
            .collect::<GroveResult<Vec<_>>>()?;

        Ok(finish_topology_sweep(&target, records))
    }

    // ========================================================================
    // Scalability Study
    // ========================================================================

    /// All-ones search for each register size on the configured device
    pub fn run_scalability(&self, config: &ScalabilityConfig) -> GroveResult<Vec<ScalabilityRecord>> {
        config.validate()?;
        let device = DeviceSimulator::by_name(&config.device)?;
        let mut rng = self.rng();

        let mut records = Vec::with_capacity(config.qubit_counts.len());
        for &n in &config.qubit_counts {
            let target = Bitstring::ones(n)?;
            let circuit = build_search_circuit(&target)?;
            let fitted = device.transpile(&circuit)?;

            let ideal = run_ideal(&circuit, config.shots, &mut rng)?;
            let noisy = run_noisy(fitted.circuit(), device.noise_model(), config.shots, &mut rng)?;

            let record = ScalabilityRecord {
                n_qubits: n,
                n_states: 1 << n,
                target: target.to_string(),
                k_optimal: grover::optimal_iterations(n),
                original_depth: circuit.depth(),
                transpiled_depth: fitted.depth(),
                cnot_count: fitted.two_qubit_count(),
                ideal_success: success(&ideal, &target, config.shots),
                noisy_success: success(&noisy, &target, config.shots),
                fidelity: hellinger_fidelity(&ideal, &noisy, config.shots)?,
            };
            log::info!(
                "scalability n={}: depth {} -> {}, {} two-qubit gates, F {:.4}",
                n,
                record.original_depth,
                record.transpiled_depth,
                record.cnot_count,
                record.fidelity
            );
            records.push(record);
        }
        Ok(records)
    }

    // ========================================================================
    // Full Run
    // ========================================================================

    /// Every experiment of `config`
    pub fn run_all(&self, config: &BenchConfig) -> GroveResult<BenchReport> {
        config.validate()?;
        Ok(BenchReport {
            seed: self.seed,
            experiment: self.run_experiment(&config.experiment)?,
            noise_sweep: self.run_noise_sweep(&config.noise_sweep)?,
            topology: self.run_topology_sweep_by_name(&config.topology_sweep)?,
            scalability: self.run_scalability(&config.scalability)?,
        })
    }
}

/// Record for one backend, or the error if it is not a compatibility failure
fn topology_record(
    name: &str,
    target: &Bitstring,
    ideal: &ExecutionResult,
    outcome: GroveResult<ExecutionResult>,
) -> GroveResult<TopologyRecord> {
    match outcome {
        Ok(result) => {
            let fidelity = hellinger_fidelity(&ideal.counts, &result.counts, ideal.shots)?;
            log::info!("topology {}: F {:.6}", name, fidelity);
            Ok(TopologyRecord {
                device: name.to_string(),
                target: target.to_string(),
                shots: result.shots,
                fidelity: Some(fidelity),
                success_probability: Some(result.success_probability(target)),
                executed_depth: Some(result.metadata.executed_depth),
                two_qubit_gates: Some(result.metadata.executed_two_qubit_gates),
                swaps_inserted: Some(result.metadata.swaps_inserted),
                error: None,
            })
        }
        Err(err) if err.is_recoverable() => {
            log::warn!("topology {} skipped: {}", name, err);
            Ok(TopologyRecord::failed(
                name,
                &target.to_string(),
                ideal.shots,
                err.to_string(),
            ))
        }
        Err(err) => Err(err),
    }
}

fn finish_topology_sweep(target: &Bitstring, records: Vec<TopologyRecord>) -> TopologySweep {
    let target = target.to_string();
    let best = select_best(&records, &target);
    if let Some(best) = &best {
        log::info!("best topology {} (F {:.6})", best.name, best.fidelity);
    }
    TopologySweep {
        target,
        records,
        best,
    }
}

/// Highest-fidelity record; on a tie the earlier record wins
pub fn select_best(records: &[TopologyRecord], target: &str) -> Option<BestTopology> {
    let mut best: Option<(&str, f64)> = None;
    for record in records {
        if let Some(fidelity) = record.fidelity {
            if best.map_or(true, |(_, f)| fidelity > f) {
                best = Some((record.device.as_str(), fidelity));
            }
        }
    }
    best.map(|(name, fidelity)| BestTopology {
        name: name.to_string(),
        fidelity,
        target: target.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use grove_core::circuit::Circuit;
    use grove_core::error::GroveError;

    /// Backend returning a fixed histogram
    struct FixedBackend {
        name: &'static str,
        counts: Vec<(&'static str, u64)>,
    }

    impl Backend for FixedBackend {
        fn name(&self) -> &str {
            self.name
        }

        fn execute_with_rng(
            &self,
            _circuit: &Circuit,
            shots: u64,
            _rng: &mut SimRng,
        ) -> GroveResult<ExecutionResult> {
            let counts = self.counts.iter().map(|&(k, v)| (k.to_string(), v)).collect();
            Ok(ExecutionResult::new(counts, shots, self.name))
        }
    }

    /// Backend that rejects every circuit
    struct Incompatible;

    impl Backend for Incompatible {
        fn name(&self) -> &str {
            "ecr_only"
        }

        fn execute_with_rng(&self, _: &Circuit, _: u64, _: &mut SimRng) -> GroveResult<ExecutionResult> {
            Err(GroveError::UnsupportedGate {
                gate: "cx".into(),
                backend: "ecr_only".into(),
            })
        }
    }

    /// Backend that fails numerically
    struct Broken;

    impl Backend for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn execute_with_rng(&self, _: &Circuit, _: u64, _: &mut SimRng) -> GroveResult<ExecutionResult> {
            Err(GroveError::NumericalInstability { norm: 2.0 })
        }
    }

    /// Fidelity against the "101" search rises with `hits` over 500..1000
    fn fixed(name: &'static str, hits: u64) -> Box<dyn Backend> {
        Box::new(FixedBackend {
            name,
            counts: vec![("101", hits), ("000", 1000 - hits)],
        })
    }

    #[test]
    fn test_experiment_scenario() {
        let suite = BenchSuite::with_seed(42);
        let noisy = NoisySimulator::depolarizing(0.001, 0.01).unwrap();
        let target = Bitstring::parse("101").unwrap();

        let record = suite.run_experiment_on(&target, 8192, &noisy).unwrap();
        assert_eq!(record.iterations, 2);
        assert!(record.ideal_success >= 0.85);
        assert!(record.noisy_success >= 0.40 && record.noisy_success < record.ideal_success);
        assert!((0.85..=1.0).contains(&record.fidelity));
        assert_eq!(record.ideal_counts.values().sum::<u64>(), 8192);
    }

    #[test]
    fn test_experiment_on_device() {
        let config = ExperimentConfig::default().with_shots(1024);
        let record = BenchSuite::new().run_experiment(&config).unwrap();
        assert_eq!(record.backend, "heavy_hex_7");
        assert!(record.executed_depth > record.circuit_depth);
    }

    #[test]
    fn test_noise_sweep_degrades() {
        let config = NoiseSweepConfig::default().with_points(4).with_shots(2048);
        let records = BenchSuite::with_seed(42).run_noise_sweep(&config).unwrap();

        assert_eq!(records.len(), 4);
        assert!(records[0].fidelity > 0.98, "F at 1e-4 = {}", records[0].fidelity);
        assert!(records[3].fidelity < records[0].fidelity);
        assert!(records[3].success_probability < records[0].success_probability);
        for r in &records {
            assert_eq!(r.counts.values().sum::<u64>(), 2048);
        }
    }

    #[test]
    fn test_default_noise_sweep_never_improves() {
        let records = BenchSuite::with_seed(42)
            .run_noise_sweep(&NoiseSweepConfig::default())
            .unwrap();
        let fidelities: Vec<f64> = records.iter().map(|r| r.fidelity).collect();

        assert_eq!(records.len(), 10);
        assert!(
            records.windows(2).all(|w| w[1].fidelity <= w[0].fidelity),
            "{:?}",
            fidelities
        );
    }

    #[test]
    fn test_sweeps_are_reproducible() {
        let config = NoiseSweepConfig::default().with_points(2).with_shots(256);
        let a = BenchSuite::with_seed(5).run_noise_sweep(&config).unwrap();
        let b = BenchSuite::with_seed(5).run_noise_sweep(&config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_select_best_strict() {
        let target = Bitstring::parse("101").unwrap();
        let backends = vec![fixed("low", 600), fixed("first", 900), fixed("second", 900)];
        let sweep = BenchSuite::new()
            .run_topology_sweep(&target, 1000, &backends)
            .unwrap();

        let best = sweep.best.unwrap();
        assert_eq!(best.name, "first");
        assert_eq!(best.target, "101");
        assert_eq!(sweep.records.len(), 3);
    }

    #[test]
    fn test_select_best_distinct() {
        let target = Bitstring::parse("101").unwrap();
        let backends = vec![fixed("a", 600), fixed("b", 950), fixed("c", 800)];
        let sweep = BenchSuite::new()
            .run_topology_sweep(&target, 1000, &backends)
            .unwrap();
        assert_eq!(sweep.best.unwrap().name, "b");
    }

    #[test]
    fn test_incompatible_backend_is_skipped() {
        let target = Bitstring::parse("101").unwrap();
        let backends: Vec<Box<dyn Backend>> = vec![Box::new(Incompatible), fixed("ok", 900)];
        let sweep = BenchSuite::new()
            .run_topology_sweep(&target, 1000, &backends)
            .unwrap();

        assert!(!sweep.records[0].is_ok());
        assert!(sweep.records[0].error.as_ref().unwrap().contains("not supported"));
        assert_eq!(sweep.best.unwrap().name, "ok");
    }

    #[test]
    fn test_fatal_backend_error_aborts() {
        let target = Bitstring::parse("101").unwrap();
        let backends: Vec<Box<dyn Backend>> = vec![fixed("ok", 900), Box::new(Broken)];
        let err = BenchSuite::new()
            .run_topology_sweep(&target, 1000, &backends)
            .unwrap_err();
        assert!(matches!(err, GroveError::NumericalInstability { .. }));
    }

    #[test]
    fn test_topology_sweep_by_name() {
        let config = TopologySweepConfig::default()
            .with_devices(&["heavy_hex_7", "linear_8", "all_to_all_4"])
            .with_shots(1024);
        let sweep = BenchSuite::with_seed(42).run_topology_sweep_by_name(&config).unwrap();

        assert_eq!(sweep.records.len(), 3);
        assert!(sweep.records.iter().all(|r| r.is_ok()));
        assert_eq!(sweep.records[2].swaps_inserted, Some(0));
        assert!(sweep.best.is_some());
    }

    #[test]
    fn test_topology_sweep_by_name_rejects_unknown_device() {
        let config = TopologySweepConfig::default()
            .with_devices(&["heavy_hex_7", "nowhere"])
            .with_shots(64);
        let err = BenchSuite::with_seed(42)
            .run_topology_sweep_by_name(&config)
            .unwrap_err();
        assert_eq!(err, GroveError::BackendNotAvailable("nowhere".into()));
    }

    #[test]
    fn test_scalability_grows_with_n() {
        let config = ScalabilityConfig::default().with_shots(512);
        let records = BenchSuite::with_seed(42).run_scalability(&config).unwrap();

        assert_eq!(records.len(), 4);
        for pair in records.windows(2) {
            assert!(pair[1].transpiled_depth >= pair[0].transpiled_depth);
            assert!(pair[1].cnot_count >= pair[0].cnot_count);
        }
        assert_eq!(records[0].n_states, 8);
        assert_eq!(records[0].target, "111");
        assert_eq!(records[3].k_optimal, 6);
    }

    #[test]
    fn test_scalability_too_wide_for_device() {
        let config = ScalabilityConfig::default().with_qubit_counts(&[8]).with_shots(16);
        let err = BenchSuite::new().run_scalability(&config).unwrap_err();
        assert!(matches!(err, GroveError::InsufficientConnectivity { .. }));
    }

    #[test]
    fn test_select_best_ignores_failures() {
        let records = vec![
            TopologyRecord::failed("x", "1", 1, "e".into()),
            TopologyRecord::failed("y", "1", 1, "e".into()),
        ];
        assert!(select_best(&records, "1").is_none());
    }
}
