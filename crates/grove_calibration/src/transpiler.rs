//! Topology-aware circuit rewriting
//!
//! Rewrites a logical circuit into a device's native gate set on a
//! connected region of its coupling map:
//!
//! 1. decompose wide gates into single-qubit gates, CX and phase blocks
//! 2. place logical qubits on a connected region of the device
//! 3. route: phase blocks whose qubits lie on a path become a parity
//!    network of neighbour CX; everything else swaps toward the next CX,
//!    scoring candidate swaps against the CX that follow
//! 4. fuse runs of single-qubit gates and emit them in the native basis
//!
//! Measurements follow the qubit mapping, so the classical bits of the
//! rewritten circuit read out the same logical qubits as the original.

use crate::device::{DeviceProfile, NativeGateSet};
use grove_core::circuit::Circuit;
use grove_core::constants::sim::{ANGLE_TOLERANCE, ZERO_TOLERANCE};
use grove_core::error::{GroveError, GroveResult};
use grove_core::gate::{matmul, Gate, Matrix2};
use grove_core::topology::Topology;
use grove_core::types::QubitId;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

// ============================================================================
// TranspiledCircuit
// ============================================================================

/// Output of [`Transpiler::run`]
#[derive(Debug, Clone, PartialEq)]
pub struct TranspiledCircuit {
    circuit: Circuit,
    topology: Option<Topology>,
    layout: Vec<QubitId>,
    final_mapping: Vec<QubitId>,
    swaps_inserted: usize,
}

impl TranspiledCircuit {
    /// Rewritten circuit, indexed by region qubit
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Take the rewritten circuit
    pub fn into_circuit(self) -> Circuit {
        self.circuit
    }

    /// Region coupling map the circuit respects (`None` without a device)
    pub fn topology(&self) -> Option<&Topology> {
        self.topology.as_ref()
    }

    /// Device qubit initially holding each logical qubit
    pub fn layout(&self) -> &[QubitId] {
        &self.layout
    }

    /// Device qubit holding each logical qubit at the end
    pub fn final_mapping(&self) -> &[QubitId] {
        &self.final_mapping
    }

    /// Number of SWAPs routing inserted
    pub fn swaps_inserted(&self) -> usize {
        self.swaps_inserted
    }

    /// Depth of the rewritten circuit
    pub fn depth(&self) -> usize {
        self.circuit.depth()
    }

    /// Entangling gates in the rewritten circuit
    pub fn two_qubit_count(&self) -> usize {
        self.circuit.count_2q()
    }
}

// ============================================================================
// Native basis
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum SingleBasis {
    U,
    RzSx { has_x: bool },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Entangler {
    Cx,
    Cz,
}

// ============================================================================
// Transpiler
// ============================================================================

/// Circuit rewriter for one device (or one native gate set)
#[derive(Debug, Clone)]
pub struct Transpiler {
    native: NativeGateSet,
    topology: Option<Topology>,
    backend: String,
}

impl Transpiler {
    /// Rewriter honouring a device's native set and coupling map
    pub fn for_device(device: &DeviceProfile) -> Self {
        Self {
            native: device.native_gates().clone(),
            topology: Some(device.topology().clone()),
            backend: device.name().to_string(),
        }
    }

    /// Rewriter for a native set with all-to-all connectivity
    pub fn basis_only(native: NativeGateSet, backend: impl Into<String>) -> Self {
        Self {
            native,
            topology: None,
            backend: backend.into(),
        }
    }

    /// Target native set
    pub fn native_gates(&self) -> &NativeGateSet {
        &self.native
    }

    /// Rewrite `circuit`
    pub fn run(&self, circuit: &Circuit) -> GroveResult<TranspiledCircuit> {
        let (single, entangler) = self.resolve_basis()?;
        let n = circuit.num_qubits();

        let (layout, region) = match &self.topology {
            Some(topology) => {
                let qubits = topology.connected_region(n).ok_or_else(|| {
                    GroveError::InsufficientConnectivity {
                        topology: topology.name().to_string(),
                        needed: n,
                    }
                })?;
                let region = topology.induced(&qubits);
                (qubits, Some(region))
            }
            None => ((0..n).collect(), None),
        };

        let lowered = decompose(circuit);
        let mut router = Router::new(n, region.as_ref());
        let routed = router.route(&lowered)?;
        let swaps_inserted = router.swaps;
        let final_mapping = router.placement.phys.iter().map(|&p| layout[p]).collect();
        let native = translate(n, &routed, single, entangler);

        let mut rewritten = Circuit::from_gates(n, native)?;
        if let Some(name) = circuit.name() {
            rewritten = rewritten.with_name(name);
        }

        log::debug!(
            "rewrote {}-qubit circuit for '{}': depth {} -> {}, {} swaps",
            n,
            self.backend,
            circuit.depth(),
            rewritten.depth(),
            swaps_inserted
        );

        Ok(TranspiledCircuit {
            circuit: rewritten,
            topology: region,
            layout,
            final_mapping,
            swaps_inserted,
        })
    }

    fn resolve_basis(&self) -> GroveResult<(SingleBasis, Entangler)> {
        let unsupported = |gate: &str| GroveError::UnsupportedGate {
            gate: gate.to_string(),
            backend: self.backend.clone(),
        };

        let entangler = match self.native.entangler.as_str() {
            "cx" => Entangler::Cx,
            "cz" => Entangler::Cz,
            other => return Err(unsupported(other)),
        };

        let single = if self.native.contains("u") {
            SingleBasis::U
        } else if self.native.contains("rz") && self.native.contains("sx") {
            SingleBasis::RzSx {
                has_x: self.native.contains("x"),
            }
        } else {
            let first = self.native.single_qubit.first().map(String::as_str);
            return Err(unsupported(first.unwrap_or("u")));
        };

        Ok((single, entangler))
    }
}

/// Rewrite `circuit` for `device`
pub fn fit_to_topology(circuit: &Circuit, device: &DeviceProfile) -> GroveResult<TranspiledCircuit> {
    Transpiler::for_device(device).run(circuit)
}

// ============================================================================
// Decomposition
// ============================================================================

/// Gate stream between decomposition and routing
#[derive(Debug, Clone, PartialEq)]
enum Lowered {
    /// Single-qubit gate, CX, measurement or barrier
    Gate(Gate),
    /// Phase `lambda` on the all-ones state of `qubits`
    Phase { qubits: Vec<QubitId>, lambda: f64 },
}

/// Lower every gate to single-qubit gates, CX, phase blocks, measurements
/// and barriers
///
/// A circuit without measurements gets a full readout appended.
fn decompose(circuit: &Circuit) -> Vec<Lowered> {
    let n = circuit.num_qubits();
    let mut out = Vec::with_capacity(circuit.gates().len() * 3);

    for gate in circuit.gates() {
        match gate {
            Gate::Cz(c, t) => out.extend([
                Lowered::Gate(Gate::H(*t)),
                Lowered::Gate(Gate::Cnot(*c, *t)),
                Lowered::Gate(Gate::H(*t)),
            ]),
            Gate::Swap(a, b) => out.extend([
                Lowered::Gate(Gate::Cnot(*a, *b)),
                Lowered::Gate(Gate::Cnot(*b, *a)),
                Lowered::Gate(Gate::Cnot(*a, *b)),
            ]),
            Gate::Ccx(c1, c2, t) => controlled_x(&[*c1, *c2], *t, &mut out),
            Gate::Mcx { controls, target } => controlled_x(controls, *target, &mut out),
            Gate::MeasureAll => out.extend((0..n).map(|q| Lowered::Gate(Gate::Measure(q, q)))),
            other => out.push(Lowered::Gate(other.clone())),
        }
    }

    if circuit.count_measurements() == 0 {
        out.extend((0..n).map(|q| Lowered::Gate(Gate::Measure(q, q))));
    }
    out
}

/// X on `target` when every control is set: `H · phase(π) · H`
fn controlled_x(controls: &[QubitId], target: QubitId, out: &mut Vec<Lowered>) {
    match controls {
        [] => out.push(Lowered::Gate(Gate::X(target))),
        [c] => out.push(Lowered::Gate(Gate::Cnot(*c, target))),
        _ => {
            let mut qubits = controls.to_vec();
            qubits.push(target);
            out.push(Lowered::Gate(Gate::H(target)));
            out.push(Lowered::Phase { qubits, lambda: PI });
            out.push(Lowered::Gate(Gate::H(target)));
        }
    }
}

/// Phase `λ` on the all-ones state of `qubits`
///
/// Gray-code phase polynomial: every non-empty subset parity receives
/// `±λ / 2^(m-1)`, using `2^m - 2` CX for `m` qubits.
fn multi_controlled_phase(qubits: &[QubitId], lambda: f64, out: &mut Vec<Gate>) {
    let m = qubits.len();
    if m == 0 {
        return;
    }
    let scale = lambda / (1usize << (m - 1)) as f64;

    for j in (0..m).rev() {
        let target = qubits[j];
        let mut prev = 0usize;
        for i in 0..(1usize << j) {
            let gray = i ^ (i >> 1);
            if i > 0 {
                let changed = (gray ^ prev).trailing_zeros() as usize;
                out.push(Gate::Cnot(qubits[changed], target));
            }
            out.push(Gate::P(target, parity_sign(gray.count_ones() + 1) * scale));
            prev = gray;
        }
        if j >= 1 {
            out.push(Gate::Cnot(qubits[j - 1], target));
        }
    }
}

/// Sign of a parity term in the phase polynomial of size `weight`
fn parity_sign(weight: u32) -> f64 {
    if weight % 2 == 1 {
        1.0
    } else {
        -1.0
    }
}

// ============================================================================
// Parity networks
// ============================================================================

/// Widest phase block lowered as a parity network
const MAX_NETWORK_QUBITS: usize = 6;

/// Partial networks kept per search step
const NETWORK_BEAM: usize = 32;

#[derive(Debug, Clone)]
struct Walk {
    wires: Vec<u32>,
    covered: Vec<bool>,
    count: usize,
    node: Option<usize>,
    last: Option<(usize, usize)>,
}

/// CX network over a line of `m` wires using only neighbouring pairs
///
/// Wire `i` starts out holding variable `i`. Every non-empty parity of the
/// variables appears on some wire along the way, and the wires end up
/// holding a permutation of the variables. Beam search in two stages:
/// cover all parities, then bring the total weight back down to `m`.
fn parity_network(m: usize) -> Option<Vec<(usize, usize)>> {
    if m < 2 {
        return Some(Vec::new());
    }
    let full = 1usize << m;
    let moves: Vec<(usize, usize)> = (1..m).flat_map(|i| [(i - 1, i), (i, i - 1)]).collect();
    let weight = |wires: &[u32]| wires.iter().map(|w| w.count_ones()).sum::<u32>();

    // (parent, CX) per search node
    let mut trail: Vec<(Option<usize>, (usize, usize))> = Vec::new();

    let wires: Vec<u32> = (0..m).map(|i| 1 << i).collect();
    let mut covered = vec![false; full];
    for &w in &wires {
        covered[w as usize] = true;
    }
    let mut beam = vec![Walk {
        wires,
        covered,
        count: m,
        node: None,
        last: None,
    }];

    let mut finished = None;
    for _ in 0..64 * full {
        if let Some(walk) = beam.iter().find(|w| w.count == full - 1) {
            finished = Some(walk.clone());
            break;
        }

        let mut seen = HashSet::new();
        let mut next = Vec::new();
        for walk in &beam {
            for &(c, t) in &moves {
                if walk.last == Some((c, t)) {
                    continue;
                }
                let mut wires = walk.wires.clone();
                wires[t] ^= wires[c];
                let mut covered = walk.covered.clone();
                let mut count = walk.count;
                if !covered[wires[t] as usize] {
                    covered[wires[t] as usize] = true;
                    count += 1;
                }
                if !seen.insert((wires.clone(), covered.clone())) {
                    continue;
                }
                let key = (Reverse(count), uncovered_gap(&wires, &covered), weight(&wires));
                next.push((
                    key,
                    Walk {
                        wires,
                        covered,
                        count,
                        node: walk.node,
                        last: Some((c, t)),
                    },
                ));
            }
        }

        next.sort_by_key(|(key, _)| *key);
        beam.clear();
        for (_, mut walk) in next.into_iter().take(NETWORK_BEAM) {
            if let Some(step) = walk.last {
                trail.push((walk.node, step));
                walk.node = Some(trail.len() - 1);
            }
            beam.push(walk);
        }
    }
    let walk = finished?;

    let mut seen: HashSet<Vec<u32>> = HashSet::from([walk.wires.clone()]);
    let mut beam = vec![(walk.wires, walk.node, None)];
    let mut end = None;
    for _ in 0..4 * m * m {
        if let Some((_, node, _)) = beam.iter().find(|(wires, _, _)| weight(wires) == m as u32) {
            end = Some(*node);
            break;
        }

        let mut next = Vec::new();
        for (wires, node, last) in &beam {
            for &(c, t) in &moves {
                if *last == Some((c, t)) {
                    continue;
                }
                let mut wires = wires.clone();
                wires[t] ^= wires[c];
                if seen.insert(wires.clone()) {
                    next.push((weight(&wires), wires, *node, (c, t)));
                }
            }
        }

        next.sort_by_key(|(w, ..)| *w);
        beam.clear();
        for (_, wires, node, step) in next.into_iter().take(NETWORK_BEAM) {
            trail.push((node, step));
            beam.push((wires, Some(trail.len() - 1), Some(step)));
        }
    }

    let mut node = end?;
    let mut steps = Vec::new();
    while let Some(at) = node {
        let (parent, step) = trail[at];
        steps.push(step);
        node = parent;
    }
    steps.reverse();
    Some(steps)
}

/// Fewest variables any wire must flip to reach an uncovered parity
fn uncovered_gap(wires: &[u32], covered: &[bool]) -> u32 {
    (1..covered.len())
        .filter(|&u| !covered[u])
        .flat_map(|u| wires.iter().map(move |&w| (w ^ u as u32).count_ones()))
        .min()
        .unwrap_or(u32::MAX)
}

// ============================================================================
// Routing
// ============================================================================

/// Upcoming CX considered when scoring a swap
const LOOKAHEAD: usize = 8;

/// Weight decay per lookahead step
const LOOKAHEAD_DECAY: f64 = 0.5;

/// Logical-to-region assignment
#[derive(Debug, Clone)]
struct Placement {
    /// Logical qubit -> region qubit
    phys: Vec<QubitId>,
    /// Region qubit -> logical qubit
    log_at: Vec<QubitId>,
}

impl Placement {
    fn identity(n: usize) -> Self {
        Self {
            phys: (0..n).collect(),
            log_at: (0..n).collect(),
        }
    }

    fn swap(&mut self, a: QubitId, b: QubitId) {
        let (la, lb) = (self.log_at[a], self.log_at[b]);
        self.log_at.swap(a, b);
        self.phys[la] = b;
        self.phys[lb] = a;
    }
}

/// Region coupling map with precomputed hop distances
struct Coupling<'a> {
    topology: Option<&'a Topology>,
    distances: Vec<Vec<usize>>,
    neighbors: Vec<Vec<QubitId>>,
}

impl<'a> Coupling<'a> {
    fn new(topology: Option<&'a Topology>) -> Self {
        let (distances, neighbors) = match topology {
            Some(t) => (
                t.distances(),
                (0..t.num_qubits()).map(|q| t.neighbors(q)).collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        Self {
            topology,
            distances,
            neighbors,
        }
    }

    fn adjacent(&self, a: QubitId, b: QubitId) -> bool {
        self.topology.is_none() || self.distances[a][b] == 1
    }

    fn distance(&self, a: QubitId, b: QubitId) -> usize {
        match self.topology {
            Some(_) => self.distances[a][b],
            None => usize::from(a != b),
        }
    }

    /// Swap next to the front CX that shortens it, scored with lookahead
    ///
    /// Score is the new front distance plus the decayed mean distance of
    /// the upcoming CX pairs; ties keep the first candidate.
    fn best_swap(
        &self,
        placement: &Placement,
        front: (QubitId, QubitId),
        ahead: &[(QubitId, QubitId)],
    ) -> Option<(QubitId, QubitId)> {
        let (pc, pt) = (placement.phys[front.0], placement.phys[front.1]);
        let current = self.distance(pc, pt);
        let mut best: Option<(f64, (QubitId, QubitId))> = None;

        for p in [pc, pt] {
            for &nb in self.neighbors.get(p)? {
                let moved = |q: QubitId| match q {
                    q if q == p => nb,
                    q if q == nb => p,
                    q => q,
                };
                let front_distance = self.distance(moved(pc), moved(pt));
                if front_distance >= current {
                    continue;
                }
                let lookahead = ahead
                    .iter()
                    .enumerate()
                    .map(|(i, &(a, b))| {
                        let d = self.distance(moved(placement.phys[a]), moved(placement.phys[b]));
                        LOOKAHEAD_DECAY.powi(i as i32) * d as f64
                    })
                    .sum::<f64>()
                    / ahead.len().max(1) as f64;
                let score = front_distance as f64 + lookahead;
                if best.map_or(true, |(s, _)| score < s) {
                    best = Some((score, (p, nb)));
                }
            }
        }
        best.map(|(_, swap)| swap)
    }

    /// Map `gates` onto the region, swapping until every CX is coupled
    ///
    /// Returns the number of swaps inserted.
    fn route_block(&self, placement: &mut Placement, gates: &[Gate], out: &mut Vec<Gate>) -> GroveResult<usize> {
        let mut swaps = 0;
        for (i, gate) in gates.iter().enumerate() {
            match gate {
                Gate::Cnot(c, t) => {
                    let ahead: Vec<(QubitId, QubitId)> = gates[i + 1..]
                        .iter()
                        .filter_map(|g| match g {
                            Gate::Cnot(a, b) => Some((*a, *b)),
                            _ => None,
                        })
                        .take(LOOKAHEAD)
                        .collect();

                    while !self.adjacent(placement.phys[*c], placement.phys[*t]) {
                        let (a, b) = self.best_swap(placement, (*c, *t), &ahead).ok_or_else(|| {
                            GroveError::TopologyViolation {
                                q1: placement.phys[*c],
                                q2: placement.phys[*t],
                            }
                        })?;
                        out.extend([Gate::Cnot(a, b), Gate::Cnot(b, a), Gate::Cnot(a, b)]);
                        placement.swap(a, b);
                        swaps += 1;
                    }
                    out.push(Gate::Cnot(placement.phys[*c], placement.phys[*t]));
                }
                Gate::Measure(q, c) => out.push(Gate::Measure(placement.phys[*q], *c)),
                other => out.push(other.remap(|q| placement.phys[q])),
            }
        }
        Ok(swaps)
    }
}

struct Router<'a> {
    coupling: Coupling<'a>,
    placement: Placement,
    swaps: usize,
    /// Parity networks by width
    networks: HashMap<usize, Option<Vec<(usize, usize)>>>,
}

impl<'a> Router<'a> {
    fn new(n: usize, topology: Option<&'a Topology>) -> Self {
        Self {
            coupling: Coupling::new(topology),
            placement: Placement::identity(n),
            swaps: 0,
            networks: HashMap::new(),
        }
    }

    fn route(&mut self, ops: &[Lowered]) -> GroveResult<Vec<Gate>> {
        let mut out = Vec::with_capacity(ops.len() * 2);
        let mut pending = Vec::new();

        for op in ops {
            match op {
                Lowered::Gate(gate) => pending.push(gate.clone()),
                Lowered::Phase { qubits, lambda } => {
                    self.flush(&mut pending, &mut out)?;
                    self.route_phase(qubits, *lambda, &mut out)?;
                }
            }
        }
        self.flush(&mut pending, &mut out)?;
        Ok(out)
    }

    fn flush(&mut self, pending: &mut Vec<Gate>, out: &mut Vec<Gate>) -> GroveResult<()> {
        self.swaps += self.coupling.route_block(&mut self.placement, pending, out)?;
        pending.clear();
        Ok(())
    }

    /// Lower a phase block with whichever of the routed Gray code and the
    /// parity network along the block's qubits needs fewer CX
    fn route_phase(&mut self, qubits: &[QubitId], lambda: f64, out: &mut Vec<Gate>) -> GroveResult<()> {
        let mut gray = Vec::new();
        multi_controlled_phase(qubits, lambda, &mut gray);

        let mut placement = self.placement.clone();
        let mut routed = Vec::with_capacity(gray.len());
        let swaps = self.coupling.route_block(&mut placement, &gray, &mut routed)?;

        if swaps > 0 {
            let gray_cost = routed.iter().filter(|g| matches!(g, Gate::Cnot(..))).count();
            if let Some(path) = self.network_path(qubits) {
                if let Some(network) = self.network(qubits.len()) {
                    if network.len() < gray_cost {
                        self.emit_network(&path, &network, lambda, out);
                        return Ok(());
                    }
                }
            }
        }

        self.placement = placement;
        self.swaps += swaps;
        out.extend(routed);
        Ok(())
    }

    /// Region qubits of `qubits` in an order that forms a coupled path
    fn network_path(&self, qubits: &[QubitId]) -> Option<Vec<QubitId>> {
        let topology = self.coupling.topology?;
        if !(3..=MAX_NETWORK_QUBITS).contains(&qubits.len()) {
            return None;
        }
        let positions: Vec<QubitId> = qubits.iter().map(|&q| self.placement.phys[q]).collect();
        topology.path_through(&positions)
    }

    fn network(&mut self, m: usize) -> Option<Vec<(usize, usize)>> {
        self.networks.entry(m).or_insert_with(|| parity_network(m)).clone()
    }

    /// Emit `network` along `path` with each parity's phase on first
    /// appearance, then follow the permutation it leaves behind
    fn emit_network(&mut self, path: &[QubitId], network: &[(usize, usize)], lambda: f64, out: &mut Vec<Gate>) {
        let m = path.len();
        let scale = lambda / (1usize << (m - 1)) as f64;
        let mut wires: Vec<u32> = (0..m).map(|i| 1 << i).collect();
        let mut phased = vec![false; 1 << m];

        let mut phase = |wire: usize, parity: u32, out: &mut Vec<Gate>| {
            if !std::mem::replace(&mut phased[parity as usize], true) {
                out.push(Gate::P(path[wire], parity_sign(parity.count_ones()) * scale));
            }
        };
        for (i, &w) in wires.iter().enumerate() {
            phase(i, w, out);
        }
        for &(c, t) in network {
            wires[t] ^= wires[c];
            out.push(Gate::Cnot(path[c], path[t]));
            phase(t, wires[t], out);
        }

        let held: Vec<QubitId> = path.iter().map(|&p| self.placement.log_at[p]).collect();
        for (i, w) in wires.iter().enumerate() {
            let logical = held[w.trailing_zeros() as usize];
            self.placement.phys[logical] = path[i];
            self.placement.log_at[path[i]] = logical;
        }
    }
}

// ============================================================================
// Native translation
// ============================================================================

fn hadamard() -> Matrix2 {
    let h = num_complex::Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0);
    [[h, h], [h, -h]]
}

/// Fuse single-qubit runs and emit the native basis
fn translate(n: usize, gates: &[Gate], single: SingleBasis, entangler: Entangler) -> Vec<Gate> {
    let mut pending: Vec<Option<Matrix2>> = vec![None; n];
    let mut out = Vec::with_capacity(gates.len());

    fn absorb(pending: &mut [Option<Matrix2>], q: QubitId, m: Matrix2) {
        pending[q] = Some(match pending[q] {
            Some(prev) => matmul(&m, &prev),
            None => m,
        });
    }

    let flush = |pending: &mut [Option<Matrix2>], q: QubitId, out: &mut Vec<Gate>| {
        if let Some(m) = pending[q].take() {
            emit_single(q, &m, single, out);
        }
    };

    for gate in gates {
        match gate {
            Gate::Cnot(c, t) => match entangler {
                Entangler::Cx => {
                    flush(&mut pending, *c, &mut out);
                    flush(&mut pending, *t, &mut out);
                    out.push(Gate::Cnot(*c, *t));
                }
                Entangler::Cz => {
                    absorb(&mut pending, *t, hadamard());
                    flush(&mut pending, *c, &mut out);
                    flush(&mut pending, *t, &mut out);
                    out.push(Gate::Cz(*c, *t));
                    pending[*t] = Some(hadamard());
                }
            },
            Gate::Measure(q, _) => {
                flush(&mut pending, *q, &mut out);
                out.push(gate.clone());
            }
            Gate::Barrier(qs) => {
                for &q in qs {
                    flush(&mut pending, q, &mut out);
                }
                out.push(gate.clone());
            }
            g => {
                if let Some(m) = g.matrix() {
                    absorb(&mut pending, g.qubits()[0], m);
                }
            }
        }
    }

    for q in 0..n {
        flush(&mut pending, q, &mut out);
    }
    out
}

/// Euler angles `(θ, φ, λ)` with `m = e^{iα}·U(θ, φ, λ)`
fn euler_angles(m: &Matrix2) -> (f64, f64, f64) {
    let (a00, a01, a10, a11) = (m[0][0], m[0][1], m[1][0], m[1][1]);
    let theta = 2.0 * a10.norm().atan2(a00.norm());

    if a10.norm() < ZERO_TOLERANCE {
        let alpha = a00.arg();
        (theta, 0.0, a11.arg() - alpha)
    } else if a00.norm() < ZERO_TOLERANCE {
        let alpha = (-a01).arg();
        (theta, a10.arg() - alpha, 0.0)
    } else {
        let alpha = a00.arg();
        (theta, a10.arg() - alpha, (-a01).arg() - alpha)
    }
}

/// Angle folded into (-π, π]
fn wrap_angle(angle: f64) -> f64 {
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    } else if a <= -PI {
        a += TAU;
    }
    a
}

fn is_zero_angle(angle: f64) -> bool {
    wrap_angle(angle).abs() < ANGLE_TOLERANCE
}

fn push_rz(q: QubitId, angle: f64, out: &mut Vec<Gate>) {
    if !is_zero_angle(angle) {
        out.push(Gate::Rz(q, wrap_angle(angle)));
    }
}

fn emit_single(q: QubitId, m: &Matrix2, basis: SingleBasis, out: &mut Vec<Gate>) {
    let (theta, phi, lambda) = euler_angles(m);

    if theta.abs() < ANGLE_TOLERANCE {
        match basis {
            SingleBasis::U if !is_zero_angle(phi + lambda) => {
                out.push(Gate::U(q, 0.0, 0.0, wrap_angle(phi + lambda)))
            }
            SingleBasis::U => {}
            SingleBasis::RzSx { .. } => push_rz(q, phi + lambda, out),
        }
        return;
    }

    match basis {
        SingleBasis::U => out.push(Gate::U(q, theta, wrap_angle(phi), wrap_angle(lambda))),
        SingleBasis::RzSx { has_x } => {
            if has_x && (theta - PI).abs() < ANGLE_TOLERANCE && is_zero_angle(phi - lambda - PI) {
                out.push(Gate::X(q));
            } else if (theta - FRAC_PI_2).abs() < ANGLE_TOLERANCE {
                push_rz(q, lambda - FRAC_PI_2, out);
                out.push(Gate::Sx(q));
                push_rz(q, phi + FRAC_PI_2, out);
            } else {
                push_rz(q, lambda, out);
                out.push(Gate::Sx(q));
                push_rz(q, theta + PI, out);
                out.push(Gate::Sx(q));
                push_rz(q, phi + PI, out);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use grove_core::builder::CircuitBuilder;
    use grove_core::gate::u_matrix;
    use grove_core::grover::build_search_circuit;
    use grove_core::types::Bitstring;
    use num_complex::Complex64;

    fn product(gates: &[Gate]) -> Matrix2 {
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        gates
            .iter()
            .fold([[one, zero], [zero, one]], |acc, g| matmul(&g.matrix().unwrap(), &acc))
    }

    fn equal_up_to_phase(a: &Matrix2, b: &Matrix2) -> bool {
        let (r, c) = if a[0][0].norm() > 0.5 { (0, 0) } else { (1, 0) };
        let phase = a[r][c] / b[r][c];
        (0..2).all(|i| (0..2).all(|j| (a[i][j] - phase * b[i][j]).norm() < 1e-9))
    }

    fn all_native(circuit: &Circuit, native: &NativeGateSet) -> bool {
        circuit.gates().iter().all(|g| native.admits(g))
    }

    #[test]
    fn test_euler_roundtrip_rz_sx() {
        let samples = [
            (0.3, 1.1, -0.4),
            (FRAC_PI_2, 0.2, 0.9),
            (PI, 0.0, PI),
            (PI, 0.7, -1.3),
            (2.5, -2.9, 3.0),
            (0.0, 0.4, 0.5),
        ];
        for (theta, phi, lambda) in samples {
            let m = u_matrix(theta, phi, lambda);
            let mut gates = Vec::new();
            emit_single(0, &m, SingleBasis::RzSx { has_x: true }, &mut gates);
            assert!(
                equal_up_to_phase(&product(&gates), &m),
                "U({}, {}, {}) -> {:?}",
                theta,
                phi,
                lambda,
                gates
            );
            assert!(gates.iter().all(|g| matches!(g, Gate::Rz(..) | Gate::Sx(_) | Gate::X(_))));
        }
    }

    #[test]
    fn test_euler_roundtrip_u() {
        let h = Gate::H(0).matrix().unwrap();
        let t = Gate::T(0).matrix().unwrap();
        let m = matmul(&h, &matmul(&t, &h));
        let mut gates = Vec::new();
        emit_single(0, &m, SingleBasis::U, &mut gates);
        assert_eq!(gates.len(), 1);
        assert!(equal_up_to_phase(&product(&gates), &m));
    }

    #[test]
    fn test_identity_run_is_dropped() {
        let h = Gate::H(0).matrix().unwrap();
        let mut gates = Vec::new();
        emit_single(0, &matmul(&h, &h), SingleBasis::U, &mut gates);
        emit_single(0, &matmul(&h, &h), SingleBasis::RzSx { has_x: true }, &mut gates);
        assert!(gates.is_empty());
    }

    #[test]
    fn test_x_shortcut() {
        let mut gates = Vec::new();
        emit_single(0, &Gate::X(0).matrix().unwrap(), SingleBasis::RzSx { has_x: true }, &mut gates);
        assert_eq!(gates, vec![Gate::X(0)]);
    }

    #[test]
    fn test_gray_code_cx_count() {
        for m in 1..=6usize {
            let qubits: Vec<QubitId> = (0..m).collect();
            let mut gates = Vec::new();
            multi_controlled_phase(&qubits, PI, &mut gates);
            let cx = gates.iter().filter(|g| matches!(g, Gate::Cnot(..))).count();
            assert_eq!(cx, (1 << m) - 2);
        }
    }

    #[test]
    fn test_decompose_counts() {
        let circuit = Circuit::from_gates(
            4,
            vec![
                Gate::Ccx(0, 1, 2),
                Gate::Mcx {
                    controls: vec![0, 1, 2],
                    target: 3,
                },
                Gate::Swap(0, 3),
            ],
        )
        .unwrap();
        let ops = decompose(&circuit);
        let blocks: Vec<usize> = ops
            .iter()
            .filter_map(|op| match op {
                Lowered::Phase { qubits, .. } => Some(qubits.len()),
                Lowered::Gate(_) => None,
            })
            .collect();
        assert_eq!(blocks, vec![3, 4]);

        let gates: Vec<&Gate> = ops
            .iter()
            .filter_map(|op| match op {
                Lowered::Gate(g) => Some(g),
                Lowered::Phase { .. } => None,
            })
            .collect();
        assert_eq!(gates.iter().filter(|g| matches!(g, Gate::Cnot(..))).count(), 3);
        // Readout appended for unmeasured circuits
        assert_eq!(gates.iter().filter(|g| g.is_measurement()).count(), 4);
    }

    /// Phase picked up by basis state `x` and where its bits end up
    fn trace_basis(gates: &[Gate], x: usize, m: usize) -> (f64, Vec<bool>) {
        let mut bits: Vec<bool> = (0..m).map(|q| (x >> q) & 1 == 1).collect();
        let mut phase = 0.0;
        for gate in gates {
            match gate {
                Gate::Cnot(c, t) => bits[*t] ^= bits[*c],
                Gate::P(q, angle) if bits[*q] => phase += angle,
                _ => {}
            }
        }
        (phase, bits)
    }

    #[test]
    fn test_parity_network_flips_all_ones() {
        for (m, bound) in [(3, 8), (4, 21), (5, 48)] {
            let network = parity_network(m).unwrap();
            assert!(network.len() <= bound, "m = {}: {} CX", m, network.len());
            assert!(network.iter().all(|&(c, t)| c.abs_diff(t) == 1));

            let line = Topology::linear(m);
            let path: Vec<QubitId> = (0..m).collect();
            let mut router = Router::new(m, Some(&line));
            let mut gates = Vec::new();
            router.emit_network(&path, &network, PI, &mut gates);

            for x in 0..(1usize << m) {
                let (phase, bits) = trace_basis(&gates, x, m);
                let expected = if x == (1 << m) - 1 { PI } else { 0.0 };
                assert!(is_zero_angle(phase - expected), "m = {}, x = {:b}", m, x);
                // Each logical bit is found where the placement says
                for q in 0..m {
                    assert_eq!(bits[router.placement.phys[q]], (x >> q) & 1 == 1);
                }
            }
        }
    }

    #[test]
    fn test_search_routes_without_swaps() {
        // Six phase blocks of four qubits
        let target = Bitstring::parse("1011").unwrap();
        for device in [DeviceProfile::heavy_hex_7(), DeviceProfile::linear_8()] {
            let out = fit_to_topology(&build_search_circuit(&target).unwrap(), &device).unwrap();
            assert_eq!(out.swaps_inserted(), 0, "{}", device.name());
            assert!(out.two_qubit_count() <= 6 * 21, "{}: {}", device.name(), out.two_qubit_count());
            assert!(out.topology().unwrap().validate_circuit(out.circuit()).is_ok());
        }

        let three = Bitstring::parse("101").unwrap();
        let out = fit_to_topology(&build_search_circuit(&three).unwrap(), &DeviceProfile::linear_8()).unwrap();
        assert_eq!(out.swaps_inserted(), 0);
        assert!(out.two_qubit_count() <= 4 * 8);
    }

    #[test]
    fn test_phase_block_off_path_is_routed() {
        // No six-qubit path exists on the heavy-hex cell
        let circuit = Circuit::from_gates(
            6,
            vec![Gate::Mcx {
                controls: vec![0, 1, 2, 3, 4],
                target: 5,
            }],
        )
        .unwrap();
        let out = fit_to_topology(&circuit, &DeviceProfile::heavy_hex_7()).unwrap();
        assert!(out.swaps_inserted() > 0);
        assert!(out.topology().unwrap().validate_circuit(out.circuit()).is_ok());
        assert_eq!(out.two_qubit_count(), 62 + 3 * out.swaps_inserted());
    }

    #[test]
    fn test_swap_choice_looks_ahead() {
        // cx(0, 2) on a line can move either end
        let line = Topology::linear(4);
        let coupling = Coupling::new(Some(&line));
        let placement = Placement::identity(4);
        let swap = coupling.best_swap(&placement, (0, 2), &[(2, 3)]).unwrap();
        assert_eq!(swap, (0, 1));

        // Moving 2 onto 1 also brings 1 next to 3
        let swap = coupling.best_swap(&placement, (0, 2), &[(1, 3)]).unwrap();
        assert_eq!(swap, (2, 1));
    }

    #[test]
    fn test_fit_respects_heavy_hex() {
        let device = DeviceProfile::heavy_hex_7();
        let circuit = build_search_circuit(&Bitstring::parse("1011").unwrap()).unwrap();
        let out = fit_to_topology(&circuit, &device).unwrap();

        assert_eq!(out.circuit().num_qubits(), 4);
        assert!(all_native(out.circuit(), device.native_gates()));
        let region = out.topology().unwrap();
        assert!(region.validate_circuit(out.circuit()).is_ok());
        assert_eq!(out.layout().len(), 4);
        assert!(out.layout().iter().all(|&q| q < device.num_qubits()));
    }

    #[test]
    fn test_fit_grid_uses_cz() {
        let device = DeviceProfile::grid_3x3();
        let circuit = build_search_circuit(&Bitstring::parse("101").unwrap()).unwrap();
        let out = fit_to_topology(&circuit, &device).unwrap();

        assert!(all_native(out.circuit(), device.native_gates()));
        assert!(out.circuit().count_ops().contains_key("cz"));
        assert!(!out.circuit().count_ops().contains_key("cx"));
    }

    #[test]
    fn test_routing_inserts_swaps_on_line() {
        let device = DeviceProfile::linear_8();
        let circuit = CircuitBuilder::new(4)
            .cx(0, 3)
            .measure_all()
            .build()
            .unwrap();
        let out = fit_to_topology(&circuit, &device).unwrap();

        assert_eq!(out.swaps_inserted(), 2);
        assert_eq!(out.two_qubit_count(), 2 * 3 + 1);
        // Control walked from region qubit 0 to 2
        assert_eq!(out.final_mapping()[0], out.layout()[2]);
        // Measurements follow the mapping
        let measured: Vec<(QubitId, usize)> = out
            .circuit()
            .gates()
            .iter()
            .filter_map(|g| match g {
                Gate::Measure(q, c) => Some((*q, *c)),
                _ => None,
            })
            .collect();
        assert!(measured.contains(&(2, 0)));
        assert!(measured.contains(&(0, 1)));
    }

    #[test]
    fn test_too_wide_for_device() {
        let circuit = CircuitBuilder::new(8).h_layer().build().unwrap();
        let err = fit_to_topology(&circuit, &DeviceProfile::heavy_hex_7()).unwrap_err();
        assert!(matches!(err, GroveError::InsufficientConnectivity { needed: 8, .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_unknown_entangler_is_unsupported() {
        let native = NativeGateSet::new(&["rz", "sx", "x"], "ecr");
        let circuit = CircuitBuilder::new(2).cx(0, 1).build().unwrap();
        let err = Transpiler::basis_only(native, "eagle").run(&circuit).unwrap_err();
        assert_eq!(
            err,
            GroveError::UnsupportedGate {
                gate: "ecr".into(),
                backend: "eagle".into()
            }
        );
        assert!(err.is_backend_compatibility());
    }

    #[test]
    fn test_basis_only_keeps_width_and_routing_free() {
        let circuit = CircuitBuilder::new(3)
            .h(0)
            .cx(0, 2)
            .measure_all()
            .build()
            .unwrap();
        let out = Transpiler::basis_only(NativeGateSet::u_cx(), "ideal")
            .run(&circuit)
            .unwrap();
        assert_eq!(out.swaps_inserted(), 0);
        assert!(out.topology().is_none());
        assert_eq!(out.layout(), &[0, 1, 2]);
        assert_eq!(out.circuit().count_ops()["u"], 1);
        assert_eq!(out.circuit().count_ops()["cx"], 1);
    }
}
