//! Device profiles
//!
//! A device is a named coupling map, a native gate set and calibrated
//! error rates. The presets stand in for hardware with distinct
//! connectivity and gate families.

use grove_core::error::{GroveError, GroveResult};
use grove_core::gate::Gate;
use grove_core::topology::Topology;
use grove_noise::{DepolarizingChannel, NoiseModel};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gate names executed natively by a device
///
/// Measurement and barriers are always admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeGateSet {
    /// Single-qubit basis gates
    pub single_qubit: Vec<String>,

    /// Two-qubit entangler
    pub entangler: String,
}

impl NativeGateSet {
    /// Create from gate names
    pub fn new(single_qubit: &[&str], entangler: &str) -> Self {
        Self {
            single_qubit: single_qubit.iter().map(|s| s.to_string()).collect(),
            entangler: entangler.to_string(),
        }
    }

    /// `u` + `cx`
    pub fn u_cx() -> Self {
        Self::new(&["u"], "cx")
    }

    /// `u` + `cz`
    pub fn u_cz() -> Self {
        Self::new(&["u"], "cz")
    }

    /// IBM-style `rz`, `sx`, `x` + `cx`
    pub fn rz_sx_cx() -> Self {
        Self::new(&["rz", "sx", "x"], "cx")
    }

    /// Check a gate name
    pub fn contains(&self, name: &str) -> bool {
        self.entangler == name || self.single_qubit.iter().any(|g| g == name)
    }

    /// Check whether a gate can run without rewriting
    pub fn admits(&self, gate: &Gate) -> bool {
        gate.is_measurement() || gate.is_barrier() || self.contains(gate.name())
    }

    /// All gate names
    pub fn names(&self) -> Vec<&str> {
        self.single_qubit
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.entangler.as_str()))
            .collect()
    }
}

impl fmt::Display for NativeGateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names().join(", "))
    }
}

/// Calibrated error rates, uniform across the device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceCalibration {
    /// Depolarizing rate of physical single-qubit gates
    pub error_1q: f64,
    /// Depolarizing rate of the entangler
    pub error_2q: f64,
    /// Bit-flip probability at readout
    pub readout_error: f64,
}

impl DeviceCalibration {
    /// Create calibration
    pub fn new(error_1q: f64, error_2q: f64, readout_error: f64) -> Self {
        Self {
            error_1q,
            error_2q,
            readout_error,
        }
    }

    /// Check ranges
    pub fn validate(&self) -> GroveResult<()> {
        for rate in [self.error_1q, self.error_2q] {
            if !(0.0..1.0).contains(&rate) {
                return Err(GroveError::InvalidErrorRate(rate));
            }
        }
        if !(0.0..=1.0).contains(&self.readout_error) {
            return Err(GroveError::InvalidProbability(self.readout_error));
        }
        Ok(())
    }
}

/// Named device: topology, native gates and calibration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    name: String,
    topology: Topology,
    native_gates: NativeGateSet,
    calibration: DeviceCalibration,
}

impl DeviceProfile {
    /// Names accepted by [`DeviceProfile::by_name`] (plus `all_to_all_<n>`)
    pub const PRESETS: [&'static str; 3] = ["heavy_hex_7", "linear_8", "grid_3x3"];

    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a device profile
    pub fn new(
        name: impl Into<String>,
        topology: Topology,
        native_gates: NativeGateSet,
        calibration: DeviceCalibration,
    ) -> GroveResult<Self> {
        calibration.validate()?;
        Ok(Self {
            name: name.into(),
            topology,
            native_gates,
            calibration,
        })
    }

    /// 7-qubit heavy-hex cell, IBM-style `rz`/`sx`/`x` + `cx`
    pub fn heavy_hex_7() -> Self {
        Self {
            name: "heavy_hex_7".to_string(),
            topology: Topology::heavy_hex(),
            native_gates: NativeGateSet::rz_sx_cx(),
            calibration: DeviceCalibration::new(2.5e-4, 7.5e-3, 1.5e-2),
        }
    }

    /// 8-qubit linear chain, `u` + `cx`
    pub fn linear_8() -> Self {
        Self {
            name: "linear_8".to_string(),
            topology: Topology::linear(8),
            native_gates: NativeGateSet::u_cx(),
            calibration: DeviceCalibration::new(4e-4, 1.2e-2, 2e-2),
        }
    }

    /// 3×3 square grid, `u` + `cz`
    pub fn grid_3x3() -> Self {
        Self {
            name: "grid_3x3".to_string(),
            topology: Topology::grid(3, 3),
            native_gates: NativeGateSet::u_cz(),
            calibration: DeviceCalibration::new(2e-4, 6e-3, 1e-2),
        }
    }

    /// Fully connected `n`-qubit device, `u` + `cx`, no readout error
    pub fn all_to_all(n: usize) -> Self {
        Self {
            name: format!("all_to_all_{}", n),
            topology: Topology::all_to_all(n),
            native_gates: NativeGateSet::u_cx(),
            calibration: DeviceCalibration::new(1e-3, 1e-2, 0.0),
        }
    }

    /// Look up a preset by name
    pub fn by_name(name: &str) -> GroveResult<Self> {
        match name {
            "heavy_hex_7" => Ok(Self::heavy_hex_7()),
            "linear_8" => Ok(Self::linear_8()),
            "grid_3x3" => Ok(Self::grid_3x3()),
            _ => name
                .strip_prefix("all_to_all_")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|&n| n > 0)
                .map(Self::all_to_all)
                .ok_or_else(|| GroveError::BackendNotAvailable(name.to_string())),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Device name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Coupling map
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Native gate set
    pub fn native_gates(&self) -> &NativeGateSet {
        &self.native_gates
    }

    /// Calibrated rates
    pub fn calibration(&self) -> DeviceCalibration {
        self.calibration
    }

    /// Number of physical qubits
    pub fn num_qubits(&self) -> usize {
        self.topology.num_qubits()
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// Noise model from the calibration
    ///
    /// Every native single-qubit gate except the virtual `rz` and the
    /// entangler carry a depolarizing channel.
    pub fn noise_model(&self) -> GroveResult<NoiseModel> {
        let mut model = NoiseModel::ideal().with_readout_error(self.calibration.readout_error);
        for gate in &self.native_gates.single_qubit {
            if gate == "rz" {
                continue;
            }
            model = model.with_gate_error(
                gate.as_str(),
                DepolarizingChannel::single(self.calibration.error_1q)?,
            );
        }
        model = model.with_gate_error(
            self.native_gates.entangler.as_str(),
            DepolarizingChannel::two_qubit(self.calibration.error_2q)?,
        );
        model.validate()?;
        Ok(model)
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device({}, {}Q, basis={}, 1Q={:.1e}, 2Q={:.1e}, RO={:.3})",
            self.name,
            self.num_qubits(),
            self.native_gates,
            self.calibration.error_1q,
            self.calibration.error_2q,
            self.calibration.readout_error
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
