//! Grover circuit construction
//!
//! Oracle, diffusion and full search circuits over an `n`-qubit register.
//! Character `i` of the target addresses qubit `i`.

use crate::builder::CircuitBuilder;
use crate::circuit::Circuit;
use crate::constants::{grover, sim};
use crate::error::{GroveError, GroveResult};
use crate::types::{Bitstring, QubitId};

fn check_width(num_qubits: usize) -> GroveResult<()> {
    if num_qubits == 0 {
        return Err(GroveError::EmptyBitstring);
    }
    if num_qubits > sim::MAX_QUBITS {
        return Err(GroveError::QubitLimitExceeded {
            requested: num_qubits,
            max: sim::MAX_QUBITS,
        });
    }
    Ok(())
}

/// Flip the phase of |1…1⟩: H on the last qubit around a multi-controlled X
fn phase_flip_all_ones(builder: CircuitBuilder) -> CircuitBuilder {
    let n = builder.num_qubits();
    let last = n - 1;
    let controls: Vec<QubitId> = (0..last).collect();
    builder.h(last).mcx(&controls, last).h(last)
}

/// Oracle flipping the sign of the target basis state only
pub fn build_oracle(target: &Bitstring) -> GroveResult<Circuit> {
    let n = target.len();
    check_width(n)?;

    let zeros: Vec<QubitId> = target
        .iter()
        .enumerate()
        .filter(|(_, bit)| !bit)
        .map(|(q, _)| q)
        .collect();

    let mut builder = CircuitBuilder::with_name(n, format!("oracle_{}", target));
    for &q in &zeros {
        builder = builder.x(q);
    }
    builder = phase_flip_all_ones(builder);
    for &q in &zeros {
        builder = builder.x(q);
    }
    builder.build()
}

/// Diffusion (inversion about the mean)
///
/// Realizes `2|s⟩⟨s| − I` up to a global phase of −1.
pub fn build_diffusion(num_qubits: usize) -> GroveResult<Circuit> {
    check_width(num_qubits)?;

    let builder = CircuitBuilder::with_name(num_qubits, "diffusion")
        .h_layer()
        .x_layer();
    phase_flip_all_ones(builder).x_layer().h_layer().build()
}

/// Search circuit with an explicit iteration count
///
/// Uniform superposition, `iterations` rounds of oracle then diffusion
/// separated by barriers, then measurement of every qubit.
pub fn build_search_circuit_with_iterations(
    target: &Bitstring,
    iterations: usize,
) -> GroveResult<Circuit> {
    let n = target.len();
    let oracle = build_oracle(target)?;
    let diffusion = build_diffusion(n)?;

    let mut builder = CircuitBuilder::with_name(n, format!("grover_{}", target)).h_layer();
    for _ in 0..iterations {
        builder = builder
            .barrier()
            .append(&oracle)
            .barrier()
            .append(&diffusion);
    }
    builder.barrier().measure_all().build()
}

/// Full search circuit for `target`
///
/// Runs `round(π/4 · √2ⁿ)` iterations (at least one), the count that
/// maximizes the marked amplitude.
pub fn build_search_circuit(target: &Bitstring) -> GroveResult<Circuit> {
    build_search_circuit_with_iterations(target, grover::optimal_iterations(target.len()))
}

// ============================================================================
// Tests
// ============================================================================
