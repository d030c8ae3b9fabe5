//! Device coupling graphs
//!
//! Undirected coupling maps for the preset devices, hop distances for
//! routing, and the path and region searches used by layout.

use crate::circuit::Circuit;
use crate::error::{GroveError, GroveResult};
use crate::types::QubitId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Distance reported between qubits in different components
pub const UNREACHABLE: usize = usize::MAX;

/// Undirected coupling graph of a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    name: String,
    num_qubits: usize,
    edges: Vec<(QubitId, QubitId)>,
}

impl Topology {
    // ========================================================================
    // Constructors
    // ========================================================================

    fn from_edges(name: String, num_qubits: usize, edges: Vec<(QubitId, QubitId)>) -> Self {
        Self {
            name,
            num_qubits,
            edges,
        }
    }

    /// Chain `0-1-…-(n-1)`
    pub fn linear(n: usize) -> Self {
        let edges = (1..n).map(|q| (q - 1, q)).collect();
        Self::from_edges(format!("linear_{}", n), n, edges)
    }

    /// Square lattice, row-major numbering
    pub fn grid(rows: usize, cols: usize) -> Self {
        let mut edges = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let q = r * cols + c;
                if c + 1 < cols {
                    edges.push((q, q + 1));
                }
                if r + 1 < rows {
                    edges.push((q, q + cols));
                }
            }
        }
        Self::from_edges(format!("grid_{}x{}", rows, cols), rows * cols, edges)
    }

    /// Seven-qubit heavy-hex cell: `0-1-2`, `1-3-5`, `4-5-6`
    pub fn heavy_hex() -> Self {
        let edges = vec![(0, 1), (1, 2), (1, 3), (3, 5), (4, 5), (5, 6)];
        Self::from_edges("heavy_hex_7".to_string(), 7, edges)
    }

    /// Every pair coupled
    pub fn all_to_all(n: usize) -> Self {
        let edges = (0..n)
            .flat_map(|a| (a + 1..n).map(move |b| (a, b)))
            .collect();
        Self::from_edges(format!("all_to_all_{}", n), n, edges)
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Topology name
    pub fn name(&self) -> &str {
        &self.name
    }

    // ========================================================================
    // Connectivity
    // ========================================================================

    /// Whether a two-qubit gate may act on `a` and `b` directly
    pub fn is_connected(&self, a: QubitId, b: QubitId) -> bool {
        self.edges
            .iter()
            .any(|&(x, y)| (x, y) == (a, b) || (y, x) == (a, b))
    }

    /// Qubits coupled to `qubit`, ascending
    pub fn neighbors(&self, qubit: QubitId) -> Vec<QubitId> {
        let mut out: Vec<QubitId> = self
            .edges
            .iter()
            .filter_map(|&(a, b)| match qubit {
                q if q == a => Some(b),
                q if q == b => Some(a),
                _ => None,
            })
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    fn adjacency(&self) -> Vec<Vec<QubitId>> {
        (0..self.num_qubits).map(|q| self.neighbors(q)).collect()
    }

    /// All-pairs hop counts ([`UNREACHABLE`] across components)
    pub fn distances(&self) -> Vec<Vec<usize>> {
        let adj = self.adjacency();
        (0..self.num_qubits)
            .map(|source| {
                let mut dist = vec![UNREACHABLE; self.num_qubits];
                let mut queue = VecDeque::from([source]);
                dist[source] = 0;
                while let Some(q) = queue.pop_front() {
                    for &next in &adj[q] {
                        if dist[next] == UNREACHABLE {
                            dist[next] = dist[q] + 1;
                            queue.push_back(next);
                        }
                    }
                }
                dist
            })
            .collect()
    }

    /// Whether every qubit can reach every other
    pub fn is_fully_connected(&self) -> bool {
        self.distances()
            .first()
            .map_or(true, |row| row.iter().all(|&d| d != UNREACHABLE))
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Fail on the first gate the coupling map cannot execute
    pub fn validate_circuit(&self, circuit: &Circuit) -> GroveResult<()> {
        if circuit.num_qubits() > self.num_qubits {
            return Err(GroveError::QubitOutOfRange {
                qubit: circuit.num_qubits() - 1,
                max: self.num_qubits.saturating_sub(1),
            });
        }

        for (q1, q2) in circuit.two_qubit_pairs() {
            if !self.is_connected(q1, q2) {
                return Err(GroveError::TopologyViolation { q1, q2 });
            }
        }

        // Couplings are pairwise; wider gates never run directly
        if let Some(gate) = circuit.gates().iter().find(|g| g.is_multi_qubit()) {
            let qs = gate.qubits();
            return Err(GroveError::TopologyViolation {
                q1: qs[0],
                q2: qs[1],
            });
        }

        Ok(())
    }

    // ========================================================================
    // Paths and Regions
    // ========================================================================

    /// Depth-first search for a simple path of `length` qubits drawn from `allowed`
    fn extend_path(
        &self,
        adj: &[Vec<QubitId>],
        allowed: &[bool],
        path: &mut Vec<QubitId>,
        used: &mut [bool],
        length: usize,
    ) -> bool {
        if path.len() == length {
            return true;
        }
        let Some(&last) = path.last() else {
            return false;
        };
        for &next in &adj[last] {
            if allowed[next] && !used[next] {
                used[next] = true;
                path.push(next);
                if self.extend_path(adj, allowed, path, used, length) {
                    return true;
                }
                path.pop();
                used[next] = false;
            }
        }
        false
    }

    fn search_path(&self, starts: &[QubitId], allowed: &[bool], length: usize) -> Option<Vec<QubitId>> {
        let adj = self.adjacency();
        for &start in starts {
            let mut used = vec![false; self.num_qubits];
            let mut path = vec![start];
            used[start] = true;
            if self.extend_path(&adj, allowed, &mut path, &mut used, length) {
                return Some(path);
            }
        }
        None
    }

    /// Order `qubits` so that neighbours in the order are coupled
    ///
    /// `None` when the qubits do not lie on a common simple path.
    pub fn path_through(&self, qubits: &[QubitId]) -> Option<Vec<QubitId>> {
        if qubits.iter().any(|&q| q >= self.num_qubits) {
            return None;
        }
        let mut allowed = vec![false; self.num_qubits];
        for &q in qubits {
            allowed[q] = true;
        }
        match qubits {
            [] => Some(Vec::new()),
            _ => self.search_path(qubits, &allowed, qubits.len()),
        }
    }

    /// A simple path visiting `length` qubits
    pub fn find_linear_chain(&self, length: usize) -> Option<Vec<QubitId>> {
        if length > self.num_qubits {
            return None;
        }
        if length == 0 {
            return Some(Vec::new());
        }
        let starts: Vec<QubitId> = (0..self.num_qubits).collect();
        self.search_path(&starts, &vec![true; self.num_qubits], length)
    }

    /// Connected set of `size` qubits, a chain when one exists
    ///
    /// Without a chain, takes the first breadth-first ball that reaches
    /// `size` qubits.
    pub fn connected_region(&self, size: usize) -> Option<Vec<QubitId>> {
        if size == 0 || size > self.num_qubits {
            return None;
        }
        if let Some(chain) = self.find_linear_chain(size) {
            return Some(chain);
        }

        let adj = self.adjacency();
        (0..self.num_qubits).find_map(|start| {
            let mut seen = vec![false; self.num_qubits];
            let mut order = Vec::with_capacity(size);
            let mut queue = VecDeque::from([start]);
            seen[start] = true;
            while let Some(q) = queue.pop_front() {
                order.push(q);
                if order.len() == size {
                    return Some(order);
                }
                for &next in &adj[q] {
                    if !seen[next] {
                        seen[next] = true;
                        queue.push_back(next);
                    }
                }
            }
            None
        })
    }

    /// Sub-graph on `qubits`, relabelled `0..qubits.len()` in the given order
    pub fn induced(&self, qubits: &[QubitId]) -> Self {
        let index = |q: QubitId| qubits.iter().position(|&x| x == q);
        let edges = self
            .edges
            .iter()
            .filter_map(|&(a, b)| Some((index(a)?, index(b)?)))
            .collect();
        Self::from_edges(
            format!("{}[{}q]", self.name, qubits.len()),
            qubits.len(),
            edges,
        )
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} qubits, {} couplings)",
            self.name,
            self.num_qubits,
            self.edges.len()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
