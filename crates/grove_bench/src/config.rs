//! Benchmark configuration
//!
//! One section per experiment, each with defaults matching the standard
//! Grover study and a `validate` pass run before anything executes.

use grove_calibration::DeviceProfile;
use grove_core::constants::{sim, stats, sweep};
use grove_core::error::{GroveError, GroveResult};
use grove_core::types::Bitstring;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn check_target(target: &str) -> GroveResult<Bitstring> {
    let bits = Bitstring::parse(target)?;
    if bits.len() > sim::MAX_QUBITS {
        return Err(GroveError::QubitLimitExceeded {
            requested: bits.len(),
            max: sim::MAX_QUBITS,
        });
    }
    Ok(bits)
}

fn check_shots(section: &str, shots: u64) -> GroveResult<()> {
    if shots == 0 {
        return Err(GroveError::ConfigError(format!("{}: shots must be > 0", section)));
    }
    Ok(())
}

fn check_device(name: &str) -> GroveResult<()> {
    DeviceProfile::by_name(name).map(|_| ())
}

// ============================================================================
// Single Experiment
// ============================================================================

/// Ideal vs device-calibrated run of one search circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Marked bitstring
    pub target: String,

    /// Shots per simulator
    pub shots: u64,

    /// Device profile for the noisy run
    pub device: String,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            target: sweep::EXPERIMENT_TARGET.to_string(),
            shots: stats::DEFAULT_SHOTS,
            device: "heavy_hex_7".to_string(),
        }
    }
}

impl ExperimentConfig {
    /// Set target
    pub fn with_target(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    /// Set shots
    pub fn with_shots(mut self, shots: u64) -> Self {
        self.shots = shots;
        self
    }

    /// Set device
    pub fn with_device(mut self, device: &str) -> Self {
        self.device = device.to_string();
        self
    }

    /// Parsed target
    pub fn target(&self) -> GroveResult<Bitstring> {
        check_target(&self.target)
    }

    /// Validate configuration
    pub fn validate(&self) -> GroveResult<()> {
        self.target()?;
        check_shots("experiment", self.shots)?;
        check_device(&self.device)
    }
}

// ============================================================================
// Noise Sweep
// ============================================================================

/// Depolarizing error rate sweep over a log-spaced range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSweepConfig {
    /// Marked bitstring
    pub target: String,

    /// Smallest error rate (inclusive)
    pub rate_min: f64,

    /// Largest error rate (inclusive)
    pub rate_max: f64,

    /// Number of rates
    pub points: usize,

    /// Shots per point
    pub shots: u64,
}

impl Default for NoiseSweepConfig {
    fn default() -> Self {
        Self {
            target: sweep::EXPERIMENT_TARGET.to_string(),
            rate_min: sweep::NOISE_RATE_MIN,
            rate_max: sweep::NOISE_RATE_MAX,
            points: sweep::NOISE_POINTS,
            shots: stats::SWEEP_SHOTS,
        }
    }
}

impl NoiseSweepConfig {
    /// Set target
    pub fn with_target(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    /// Set rate range
    pub fn with_range(mut self, rate_min: f64, rate_max: f64) -> Self {
        self.rate_min = rate_min;
        self.rate_max = rate_max;
        self
    }

    /// Set number of points
    pub fn with_points(mut self, points: usize) -> Self {
        self.points = points;
        self
    }

    /// Set shots
    pub fn with_shots(mut self, shots: u64) -> Self {
        self.shots = shots;
        self
    }

    /// Parsed target
    pub fn target(&self) -> GroveResult<Bitstring> {
        check_target(&self.target)
    }

    /// Error rates in ascending order
    pub fn rates(&self) -> Vec<f64> {
        sweep::logspace(self.rate_min, self.rate_max, self.points)
    }

    /// Validate configuration
    pub fn validate(&self) -> GroveResult<()> {
        self.target()?;
        check_shots("noise_sweep", self.shots)?;
        if !(self.rate_min > 0.0 && self.rate_max < 1.0 && self.rate_min <= self.rate_max) {
            return Err(GroveError::ConfigError(format!(
                "noise_sweep: need 0 < rate_min <= rate_max < 1, got [{}, {}]",
                self.rate_min, self.rate_max
            )));
        }
        if self.points == 0 {
            return Err(GroveError::ConfigError("noise_sweep: points must be > 0".into()));
        }
        Ok(())
    }
}

// ============================================================================
// Topology Sweep
// ============================================================================

/// One circuit run across several device profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologySweepConfig {
    /// Marked bitstring
    pub target: String,

    /// Device profiles in comparison order
    pub devices: Vec<String>,

    /// Shots per device
    pub shots: u64,
}

impl Default for TopologySweepConfig {
    fn default() -> Self {
        Self {
            target: sweep::TOPOLOGY_TARGET.to_string(),
            devices: DeviceProfile::PRESETS.iter().map(|s| s.to_string()).collect(),
            shots: stats::SWEEP_SHOTS,
        }
    }
}

impl TopologySweepConfig {
    /// Set target
    pub fn with_target(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    /// Set devices
    pub fn with_devices(mut self, devices: &[&str]) -> Self {
        self.devices = devices.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set shots
    pub fn with_shots(mut self, shots: u64) -> Self {
        self.shots = shots;
        self
    }

    /// Parsed target
    pub fn target(&self) -> GroveResult<Bitstring> {
        check_target(&self.target)
    }

    /// Validate configuration
    pub fn validate(&self) -> GroveResult<()> {
        self.target()?;
        check_shots("topology_sweep", self.shots)?;
        if self.devices.is_empty() {
            return Err(GroveError::ConfigError("topology_sweep: no devices".into()));
        }
        self.devices.iter().try_for_each(|d| check_device(d))
    }
}

// ============================================================================
// Scalability Study
// ============================================================================

/// All-ones search over increasing register sizes on one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalabilityConfig {
    /// Register sizes in run order
    pub qubit_counts: Vec<usize>,

    /// Device profile for the noisy runs
    pub device: String,

    /// Shots per size
    pub shots: u64,
}

impl Default for ScalabilityConfig {
    fn default() -> Self {
        Self {
            qubit_counts: sweep::QUBIT_COUNTS.to_vec(),
            device: "heavy_hex_7".to_string(),
            shots: stats::SWEEP_SHOTS,
        }
    }
}

impl ScalabilityConfig {
    /// Set register sizes
    pub fn with_qubit_counts(mut self, counts: &[usize]) -> Self {
        self.qubit_counts = counts.to_vec();
        self
    }

    /// Set device
    pub fn with_device(mut self, device: &str) -> Self {
        self.device = device.to_string();
        self
    }

    /// Set shots
    pub fn with_shots(mut self, shots: u64) -> Self {
        self.shots = shots;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> GroveResult<()> {
        check_shots("scalability", self.shots)?;
        if self.qubit_counts.is_empty() {
            return Err(GroveError::ConfigError("scalability: no qubit counts".into()));
        }
        if let Some(&n) = self
            .qubit_counts
            .iter()
            .find(|&&n| n == 0 || n > sim::MAX_QUBITS)
        {
            return Err(GroveError::ConfigError(format!(
                "scalability: qubit count {} outside 1..={}",
                n,
                sim::MAX_QUBITS
            )));
        }
        check_device(&self.device)
    }
}

// ============================================================================
// Full Benchmark
// ============================================================================

/// Every experiment plus the seed that drives them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Seed for every sampling path (`None` draws from entropy)
    pub seed: Option<u64>,

    /// Single ideal vs noisy experiment
    pub experiment: ExperimentConfig,

    /// Noise rate sweep
    pub noise_sweep: NoiseSweepConfig,

    /// Topology comparison
    pub topology_sweep: TopologySweepConfig,

    /// Qubit-count study
    pub scalability: ScalabilityConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            seed: Some(42),
            experiment: ExperimentConfig::default(),
            noise_sweep: NoiseSweepConfig::default(),
            topology_sweep: TopologySweepConfig::default(),
            scalability: ScalabilityConfig::default(),
        }
    }
}

impl BenchConfig {
    /// Reduced shot counts for smoke runs
    pub fn quick() -> Self {
        Self {
            experiment: ExperimentConfig::default().with_shots(1024),
            noise_sweep: NoiseSweepConfig::default().with_points(4).with_shots(512),
            topology_sweep: TopologySweepConfig::default().with_shots(512),
            scalability: ScalabilityConfig::default()
                .with_qubit_counts(&[3, 4])
                .with_shots(512),
            ..Self::default()
        }
    }

    /// Set seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Draw from entropy
    pub fn unseeded(mut self) -> Self {
        self.seed = None;
        self
    }

    /// Validate every section
    pub fn validate(&self) -> GroveResult<()> {
        self.experiment.validate()?;
        self.noise_sweep.validate()?;
        self.topology_sweep.validate()?;
        self.scalability.validate()
    }

    // ========================================================================
    // JSON
    // ========================================================================

    /// Parse and validate from JSON; missing fields take defaults
    pub fn from_json_str(json: &str) -> GroveResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> GroveResult<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> GroveResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write as JSON to `path`
    pub fn save_json(&self, path: impl AsRef<Path>) -> GroveResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = BenchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.experiment.target, "101");
        assert_eq!(config.experiment.shots, 8192);
        assert_eq!(config.topology_sweep.target, "1011");
        assert_eq!(config.topology_sweep.devices, vec!["heavy_hex_7", "linear_8", "grid_3x3"]);
        assert_eq!(config.scalability.qubit_counts, vec![3, 4, 5, 6]);
        assert!(BenchConfig::quick().validate().is_ok());
    }

    #[test]
    fn test_noise_rates() {
        let rates = NoiseSweepConfig::default().rates();
        assert_eq!(rates.len(), 10);
        assert!((rates[0] - 1e-4).abs() < 1e-12);
        assert!((rates[9] - 1e-1).abs() < 1e-12);
        assert!(rates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_validation_rejects() {
        assert!(ExperimentConfig::default().with_target("10a").validate().is_err());
        assert!(ExperimentConfig::default().with_target("").validate().is_err());
        assert!(ExperimentConfig::default().with_shots(0).validate().is_err());
        assert!(matches!(
            ExperimentConfig::default().with_device("nowhere").validate(),
            Err(GroveError::BackendNotAvailable(_))
        ));
        assert!(NoiseSweepConfig::default().with_range(0.0, 0.1).validate().is_err());
        assert!(NoiseSweepConfig::default().with_range(0.1, 0.01).validate().is_err());
        assert!(NoiseSweepConfig::default().with_range(1e-3, 1.0).validate().is_err());
        assert!(NoiseSweepConfig::default().with_points(0).validate().is_err());
        assert!(TopologySweepConfig::default().with_devices(&[]).validate().is_err());
        assert!(ScalabilityConfig::default().with_qubit_counts(&[]).validate().is_err());
        assert!(ScalabilityConfig::default().with_qubit_counts(&[3, 0]).validate().is_err());
        assert!(ScalabilityConfig::default().with_qubit_counts(&[25]).validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = BenchConfig::quick().with_seed(7);
        let json = config.to_json().unwrap();
        assert_eq!(BenchConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config =
            BenchConfig::from_json_str(r#"{"seed": null, "noise_sweep": {"points": 3}}"#).unwrap();
        assert_eq!(config.seed, None);
        assert_eq!(config.noise_sweep.points, 3);
        assert_eq!(config.noise_sweep.shots, 4096);
        assert_eq!(config.experiment, ExperimentConfig::default());
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            BenchConfig::from_json_str("{not json"),
            Err(GroveError::JsonError(_))
        ));
        assert!(matches!(
            BenchConfig::from_json_str(r#"{"experiment": {"shots": 0}}"#),
            Err(GroveError::ConfigError(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join("grove_bench_config_test.json");
        let config = BenchConfig::default();
        config.save_json(&path).unwrap();
        assert_eq!(BenchConfig::from_json_file(&path).unwrap(), config);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            BenchConfig::from_json_file("/nonexistent/grove.json"),
            Err(GroveError::FileError(_))
        ));
    }
}
