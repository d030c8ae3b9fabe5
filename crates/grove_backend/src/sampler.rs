//! Measurement sampling
//!
//! Turns basis-state probabilities into a histogram keyed by classical
//! bits (bit 0 first), honouring the circuit's qubit→clbit routing and an
//! optional readout bit-flip probability.

use grove_core::circuit::Circuit;
use grove_core::error::{GroveError, GroveResult};
use grove_core::types::{Counts, QubitId};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::collections::BTreeMap;

/// Sampler bound to one circuit's readout layout
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSampler {
    num_qubits: usize,
    clbit_sources: Vec<Option<QubitId>>,
    readout_error: f64,
}

impl MeasurementSampler {
    /// Sampler reading `circuit`'s measured qubits
    pub fn new(circuit: &Circuit) -> Self {
        Self {
            num_qubits: circuit.num_qubits(),
            clbit_sources: circuit.measurement_map(),
            readout_error: 0.0,
        }
    }

    /// Flip each read bit with probability `error`
    pub fn with_readout_error(mut self, error: f64) -> Self {
        self.readout_error = error;
        self
    }

    /// Number of classical bits in a key
    pub fn num_clbits(&self) -> usize {
        self.clbit_sources.len()
    }

    /// Histogram key of basis state `index`, without readout error
    pub fn key(&self, index: usize) -> String {
        self.clbit_sources
            .iter()
            .map(|src| match src {
                Some(q) if self.bit(index, *q) => '1',
                _ => '0',
            })
            .collect()
    }

    /// Histogram key of basis state `index` with readout flips applied
    pub fn read<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> String {
        if self.readout_error <= 0.0 {
            return self.key(index);
        }
        self.clbit_sources
            .iter()
            .map(|src| {
                let bit = src.is_some_and(|q| self.bit(index, q));
                let flipped = rng.gen::<f64>() < self.readout_error;
                if bit != flipped {
                    '1'
                } else {
                    '0'
                }
            })
            .collect()
    }

    /// Exact outcome distribution over histogram keys (readout error ignored)
    pub fn distribution(&self, probabilities: &[f64]) -> BTreeMap<String, f64> {
        let mut dist = BTreeMap::new();
        for (index, &p) in probabilities.iter().enumerate() {
            if p > 0.0 {
                *dist.entry(self.key(index)).or_insert(0.0) += p;
            }
        }
        dist
    }

    /// Draw `shots` outcomes from `probabilities`
    pub fn sample<R: Rng + ?Sized>(
        &self,
        probabilities: &[f64],
        shots: u64,
        rng: &mut R,
    ) -> GroveResult<Counts> {
        check_shots(shots)?;
        let weights = weighted_index(probabilities)?;

        let mut counts = Counts::new();
        for _ in 0..shots {
            let index = weights.sample(rng);
            *counts.entry(self.read(index, rng)).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn bit(&self, index: usize, qubit: QubitId) -> bool {
        (index >> (self.num_qubits - 1 - qubit)) & 1 == 1
    }
}

/// Reject a zero shot count
pub fn check_shots(shots: u64) -> GroveResult<()> {
    if shots == 0 {
        return Err(GroveError::InvalidShots(shots));
    }
    Ok(())
}

/// Categorical distribution over basis indices
pub(crate) fn weighted_index(probabilities: &[f64]) -> GroveResult<WeightedIndex<f64>> {
    WeightedIndex::new(probabilities).map_err(|_| GroveError::NumericalInstability {
        norm: probabilities.iter().sum(),
    })
}

/// Single draw by cumulative scan
pub(crate) fn draw_index<R: Rng + ?Sized>(probabilities: &[f64], rng: &mut R) -> usize {
    let r: f64 = rng.gen();
    let mut cumulative = 0.0;
    for (index, &p) in probabilities.iter().enumerate() {
        cumulative += p;
        if r < cumulative {
            return index;
        }
    }
    // Rounding left r above the final sum: take the last non-zero entry
    probabilities
        .iter()
        .rposition(|&p| p > 0.0)
        .unwrap_or(probabilities.len().saturating_sub(1))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;
    use approx::assert_abs_diff_eq;
    use grove_core::builder::CircuitBuilder;

    #[test]
    fn test_keys_follow_measurement_map() {
        // q0 -> c1, q1 -> c0
        let circuit = CircuitBuilder::new(2)
            .measure(0, 1)
            .measure(1, 0)
            .build()
            .unwrap();
        let sampler = MeasurementSampler::new(&circuit);
        // index 0b10: q0 = 1, q1 = 0
        assert_eq!(sampler.key(0b10), "01");
        assert_eq!(sampler.key(0b01), "10");
    }

    #[test]
    fn test_unmeasured_circuit_reads_all() {
        let circuit = CircuitBuilder::new(3).h(0).build().unwrap();
        let sampler = MeasurementSampler::new(&circuit);
        assert_eq!(sampler.num_clbits(), 3);
        assert_eq!(sampler.key(0b101), "101");
    }

    #[test]
    fn test_sample_totals_and_support() {
        let circuit = CircuitBuilder::new(2).measure_all().build().unwrap();
        let sampler = MeasurementSampler::new(&circuit);
        let mut rng = seeded_rng(Some(42));

        let counts = sampler.sample(&[0.5, 0.0, 0.0, 0.5], 4000, &mut rng).unwrap();
        assert_eq!(counts.values().sum::<u64>(), 4000);
        assert_eq!(counts.keys().cloned().collect::<Vec<_>>(), vec!["00", "11"]);
        let p00 = counts["00"] as f64 / 4000.0;
        assert!((p00 - 0.5).abs() < 0.05, "P(00) = {}", p00);
    }

    #[test]
    fn test_zero_shots_rejected() {
        let circuit = CircuitBuilder::new(1).build().unwrap();
        let mut rng = seeded_rng(Some(42));
        let err = MeasurementSampler::new(&circuit)
            .sample(&[1.0, 0.0], 0, &mut rng)
            .unwrap_err();
        assert_eq!(err, GroveError::InvalidShots(0));
    }

    #[test]
    fn test_readout_error_flips_bits() {
        let circuit = CircuitBuilder::new(1).measure_all().build().unwrap();
        let sampler = MeasurementSampler::new(&circuit).with_readout_error(0.2);
        let mut rng = seeded_rng(Some(42));

        let counts = sampler.sample(&[1.0, 0.0], 10_000, &mut rng).unwrap();
        let flipped = counts.get("1").copied().unwrap_or(0) as f64 / 10_000.0;
        assert!((flipped - 0.2).abs() < 0.02, "flip rate = {}", flipped);
    }

    #[test]
    fn test_distribution_marginalizes() {
        // Only q1 measured into c0
        let circuit = CircuitBuilder::new(2).measure(1, 0).build().unwrap();
        let sampler = MeasurementSampler::new(&circuit);
        let dist = sampler.distribution(&[0.1, 0.2, 0.3, 0.4]);
        // c1 is never written and reads 0
        assert_abs_diff_eq!(dist["00"], 0.1 + 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(dist["10"], 0.2 + 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_draw_index_edge() {
        let mut rng = seeded_rng(Some(7));
        for _ in 0..100 {
            assert_eq!(draw_index(&[0.0, 0.0, 1.0, 0.0], &mut rng), 2);
        }
    }
}
