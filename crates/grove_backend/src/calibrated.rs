//! Device-calibrated simulator
//!
//! Fits each circuit onto a device profile, then runs the noisy trajectory
//! engine with the device's calibrated noise model.

use crate::execution::{Backend, ExecutionMetadata, ExecutionResult};
use crate::noisy::{ensure_native, run_noisy};
use crate::rng::SimRng;
use grove_calibration::{fit_to_topology, DeviceProfile, TranspiledCircuit};
use grove_core::circuit::Circuit;
use grove_core::error::GroveResult;
use grove_noise::NoiseModel;
use std::time::Instant;

/// Noisy backend bound to one device profile
#[derive(Debug, Clone)]
pub struct DeviceSimulator {
    device: DeviceProfile,
    noise_model: NoiseModel,
    seed: Option<u64>,
}

impl DeviceSimulator {
    /// Simulator for `device`
    pub fn new(device: DeviceProfile) -> GroveResult<Self> {
        let noise_model = device.noise_model()?;
        Ok(Self {
            device,
            noise_model,
            seed: None,
        })
    }

    /// Simulator for a preset device name
    pub fn by_name(name: &str) -> GroveResult<Self> {
        Self::new(DeviceProfile::by_name(name)?)
    }

    /// Set seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Device profile
    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    /// Calibrated noise model
    pub fn noise_model(&self) -> &NoiseModel {
        &self.noise_model
    }

    /// Rewrite `circuit` for this device without running it
    pub fn transpile(&self, circuit: &Circuit) -> GroveResult<TranspiledCircuit> {
        let fitted = fit_to_topology(circuit, &self.device)?;
        ensure_native(fitted.circuit(), self.device.native_gates(), self.device.name())?;
        Ok(fitted)
    }
}

impl Backend for DeviceSimulator {
    fn name(&self) -> &str {
        self.device.name()
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
        let fitted = self.transpile(circuit)?;

        log::debug!(
            "{}: layout {:?}, {} swaps, depth {}, {} two-qubit gates",
            self.device.name(),
            fitted.layout(),
            fitted.swaps_inserted(),
            fitted.depth(),
            fitted.two_qubit_count()
        );

        let counts = run_noisy(fitted.circuit(), &self.noise_model, shots, rng)?;

        let mut metadata = ExecutionMetadata::for_circuit(self.device.name(), fitted.circuit());
        metadata.swaps_inserted = fitted.swaps_inserted();
        metadata.execution_time_ms = Some(start.elapsed().as_millis() as u64);
        Ok(ExecutionResult::new(counts, shots, self.device.name()).with_metadata(metadata))
    }
}

// ============================================================================
// Tests
// ============================================================================
