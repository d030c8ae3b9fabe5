//! Hellinger fidelity between measurement histograms

use crate::execution::ExecutionResult;
use grove_core::error::{GroveError, GroveResult};
use grove_core::types::Counts;
use std::collections::BTreeMap;

/// Hellinger fidelity `(Σ √(pa·pb))²` of two histograms of `shots` shots each
///
/// Bitstrings missing from either histogram count as probability 0, so
/// only keys present in both contribute.
pub fn hellinger_fidelity(a: &Counts, b: &Counts, shots: u64) -> GroveResult<f64> {
    if shots == 0 {
        return Err(GroveError::InvalidShots(shots));
    }
    let shots = shots as f64;
    let bc: f64 = a
        .iter()
        .filter_map(|(key, &ca)| b.get(key).map(|&cb| (ca as f64 / shots * cb as f64 / shots).sqrt()))
        .sum();
    Ok((bc * bc).min(1.0))
}

/// Hellinger fidelity of two execution results, each normalized by its own shots
pub fn result_fidelity(a: &ExecutionResult, b: &ExecutionResult) -> GroveResult<f64> {
    if a.shots == 0 || b.shots == 0 {
        return Err(GroveError::InvalidShots(0));
    }
    let (sa, sb) = (a.shots as f64, b.shots as f64);
    let bc: f64 = a
        .counts
        .iter()
        .filter_map(|(key, &ca)| b.counts.get(key).map(|&cb| (ca as f64 / sa * cb as f64 / sb).sqrt()))
        .sum();
    Ok((bc * bc).min(1.0))
}

/// Hellinger fidelity of two exact distributions
pub fn distribution_fidelity(p: &BTreeMap<String, f64>, q: &BTreeMap<String, f64>) -> f64 {
    let bc: f64 = p
        .iter()
        .filter_map(|(key, &pa)| q.get(key).map(|&pb| (pa * pb).max(0.0).sqrt()))
        .sum();
    (bc * bc).min(1.0)
}

// ============================================================================
// Tests
// ============================================================================
