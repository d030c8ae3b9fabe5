//! Noise model for Grove
//!
//! Maps a gate category (the gate's name, e.g. `"u"` or `"cx"`) to a
//! depolarizing channel. Gates without an entry pass through noiselessly.
//! An optional readout error flips each measured bit independently.

use crate::channel::DepolarizingChannel;
use grove_core::circuit::Circuit;
use grove_core::error::{GroveError, GroveResult};
use grove_core::gate::Gate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Gate-keyed noise model
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NoiseModel {
    /// Channel per gate name
    gate_errors: BTreeMap<String, DepolarizingChannel>,

    /// Probability of flipping each measured bit
    readout_error: f64,
}

impl NoiseModel {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create ideal (noiseless) model
    pub fn ideal() -> Self {
        Self::default()
    }

    /// Uniform depolarizing noise on the `u` / `cx` basis
    ///
    /// The same rate is attached to the single-qubit `u` gate and the
    /// two-qubit `cx` gate.
    pub fn depolarizing(error_rate: f64) -> GroveResult<Self> {
        Self::depolarizing_split(error_rate, error_rate)
    }

    /// Depolarizing noise with separate 1q (`u`) and 2q (`cx`) rates
    pub fn depolarizing_split(error_1q: f64, error_2q: f64) -> GroveResult<Self> {
        Ok(Self::ideal()
            .with_gate_error("u", DepolarizingChannel::single(error_1q)?)
            .with_gate_error("cx", DepolarizingChannel::two_qubit(error_2q)?))
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Attach a channel to a gate category
    pub fn with_gate_error(mut self, gate: impl Into<String>, channel: DepolarizingChannel) -> Self {
        self.gate_errors.insert(gate.into(), channel);
        self
    }

    /// Set readout error
    pub fn with_readout_error(mut self, error: f64) -> Self {
        self.readout_error = error;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get readout error rate
    pub fn readout_error(&self) -> f64 {
        self.readout_error
    }

    /// Channel registered for a gate name
    pub fn channel(&self, gate_name: &str) -> Option<&DepolarizingChannel> {
        self.gate_errors.get(gate_name)
    }

    /// Gate names carrying a channel
    pub fn gate_names(&self) -> impl Iterator<Item = &str> {
        self.gate_errors.keys().map(String::as_str)
    }

    /// True when no gate or readout error can occur
    pub fn is_ideal(&self) -> bool {
        self.readout_error == 0.0 && self.gate_errors.values().all(|c| c.is_trivial())
    }

    /// Channel to apply after `gate`
    ///
    /// `Ok(None)` means pass-through. A channel whose arity differs from the
    /// gate's qubit count is a configuration error.
    pub fn channel_for(&self, gate: &Gate) -> GroveResult<Option<&DepolarizingChannel>> {
        let Some(channel) = self.gate_errors.get(gate.name()) else {
            return Ok(None);
        };
        let arity = gate.qubits().len();
        if channel.num_qubits() != arity {
            return Err(GroveError::InvalidNoiseModel(format!(
                "channel for '{}' acts on {} qubits but the gate has {}",
                gate.name(),
                channel.num_qubits(),
                arity
            )));
        }
        Ok(Some(channel))
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate all channels and the readout error
    pub fn validate(&self) -> GroveResult<()> {
        for channel in self.gate_errors.values() {
            channel.validate()?;
        }
        if !(0.0..=1.0).contains(&self.readout_error) {
            return Err(GroveError::InvalidProbability(self.readout_error));
        }
        Ok(())
    }

    // ========================================================================
    // Derived Quantities
    // ========================================================================

    /// Probability that a run of `circuit` sees no gate error at all
    pub fn error_free_probability(&self, circuit: &Circuit) -> f64 {
        circuit
            .unitary_gates()
            .filter_map(|g| self.gate_errors.get(g.name()))
            .map(|c| 1.0 - c.error_rate())
            .product()
    }
}

impl fmt::Display for NoiseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ideal() {
            return write!(f, "NoiseModel(ideal)");
        }
        let entries: Vec<String> = self
            .gate_errors
            .iter()
            .map(|(name, c)| format!("{}={:.2e}", name, c.error_rate()))
            .collect();
        write!(
            f,
            "NoiseModel({}, RO={:.4})",
            entries.join(", "),
            self.readout_error
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use grove_core::builder::CircuitBuilder;

    #[test]
    fn test_noise_model_ideal() {
        let model = NoiseModel::ideal();
        assert!(model.is_ideal());
        assert!(model.channel_for(&Gate::Cnot(0, 1)).unwrap().is_none());
        assert_eq!(model.to_string(), "NoiseModel(ideal)");
    }

    #[test]
    fn test_depolarizing_keys() {
        let model = NoiseModel::depolarizing_split(0.001, 0.01).unwrap();
        let names: Vec<&str> = model.gate_names().collect();
        assert_eq!(names, vec!["cx", "u"]);

        let cx = model.channel_for(&Gate::Cnot(0, 1)).unwrap().unwrap();
        assert_eq!(cx.num_qubits(), 2);
        assert!((cx.error_rate() - 0.01).abs() < 1e-12);

        // Unlisted gate categories pass through
        assert!(model.channel_for(&Gate::H(0)).unwrap().is_none());
        assert!(model.channel_for(&Gate::Rz(0, 0.3)).unwrap().is_none());
    }

    #[test]
    fn test_depolarizing_rejects_bad_rate() {
        assert!(NoiseModel::depolarizing(1.0).is_err());
        assert!(NoiseModel::depolarizing(-1e-3).is_err());
    }

    #[test]
    fn test_arity_mismatch_is_an_error() {
        let model = NoiseModel::ideal()
            .with_gate_error("cx", DepolarizingChannel::single(0.01).unwrap());
        assert!(matches!(
            model.channel_for(&Gate::Cnot(0, 1)),
            Err(GroveError::InvalidNoiseModel(_))
        ));
    }

    #[test]
    fn test_validate_readout() {
        let model = NoiseModel::ideal().with_readout_error(1.5);
        assert_eq!(model.validate(), Err(GroveError::InvalidProbability(1.5)));
        assert!(NoiseModel::ideal().with_readout_error(0.02).validate().is_ok());
        assert!(!NoiseModel::ideal().with_readout_error(0.02).is_ideal());
    }

    #[test]
    fn test_error_free_probability() {
        let model = NoiseModel::depolarizing_split(0.1, 0.2).unwrap();
        let circuit = CircuitBuilder::new(2)
            .u(0, 0.1, 0.0, 0.0)
            .cx(0, 1)
            .h(1)
            .measure_all()
            .build()
            .unwrap();

        let p = model.error_free_probability(&circuit);
        assert!((p - 0.9 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_serde_roundtrip() {
        let model = NoiseModel::depolarizing(0.005)
            .unwrap()
            .with_readout_error(0.01);
        let json = serde_json::to_string(&model).unwrap();
        let back: NoiseModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }
}
