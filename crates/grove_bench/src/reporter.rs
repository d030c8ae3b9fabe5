//! Benchmark reporting
//!
//! Renders result records as CSV, Markdown, plain text and JSON. Writing
//! the strings to disk is left to the caller.

use crate::records::{
    BenchReport, BestTopology, ExperimentRecord, NoiseSweepRecord, ScalabilityRecord,
    TopologyRecord,
};
use grove_core::error::GroveResult;

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Markdown tables
    Markdown,
    /// JSON
    Json,
    /// Plain text summary
    Text,
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}

fn opt_fixed(value: Option<f64>, places: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.*}", places, v))
}

/// Benchmark reporter
pub struct Reporter;

impl Reporter {
    // ========================================================================
    // Format Converters
    // ========================================================================

    /// Render a full run in `format`
    pub fn report(report: &BenchReport, format: ReportFormat) -> GroveResult<String> {
        match format {
            ReportFormat::Markdown => Ok(Self::to_markdown(report)),
            ReportFormat::Json => Self::to_json(report),
            ReportFormat::Text => Ok(Self::to_text(report)),
        }
    }

    /// Pretty-printed JSON of a full run
    pub fn to_json(report: &BenchReport) -> GroveResult<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    /// Markdown summary of a full run
    pub fn to_markdown(report: &BenchReport) -> String {
        let mut out = String::from("# Grover Benchmark Results\n\n");
        if let Some(seed) = report.seed {
            out.push_str(&format!("Seed: {}\n\n", seed));
        }

        let e = &report.experiment;
        out.push_str("## Ideal vs Noisy\n\n");
        out.push_str(&format!(
            "- **Target**: {} ({} qubits, {} iterations)\n",
            e.target, e.num_qubits, e.iterations
        ));
        out.push_str(&format!("- **Backend**: {}\n", e.backend));
        out.push_str(&format!("- **Shots**: {}\n", e.shots));
        out.push_str(&format!(
            "- **Depth**: {} logical, {} executed ({} two-qubit gates)\n",
            e.circuit_depth, e.executed_depth, e.two_qubit_gates
        ));
        out.push_str(&format!(
            "- **Success**: {:.2}% ideal, {:.2}% noisy\n",
            e.ideal_success * 100.0,
            e.noisy_success * 100.0
        ));
        out.push_str(&format!("- **Hellinger Fidelity**: {:.6}\n\n", e.fidelity));

        out.push_str("## Noise Sensitivity\n\n");
        out.push_str("| Error Rate | Success | Fidelity | Depth | 2Q Gates |\n");
        out.push_str("|------------|---------|----------|-------|----------|\n");
        for r in &report.noise_sweep {
            out.push_str(&format!(
                "| {:.4} | {:.4} | {:.6} | {} | {} |\n",
                r.error_rate, r.success_probability, r.fidelity, r.executed_depth, r.two_qubit_gates
            ));
        }

        out.push_str(&format!(
            "\n## Topology Comparison (target {})\n\n",
            report.topology.target
        ));
        out.push_str("| Device | Fidelity | Success | Depth | 2Q Gates | Swaps | Status |\n");
        out.push_str("|--------|----------|---------|-------|----------|-------|--------|\n");
        for r in &report.topology.records {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                r.device,
                opt_fixed(r.fidelity, 6),
                opt_fixed(r.success_probability, 4),
                opt(r.executed_depth),
                opt(r.two_qubit_gates),
                opt(r.swaps_inserted),
                r.error.as_deref().unwrap_or("ok")
            ));
        }
        if let Some(best) = &report.topology.best {
            out.push_str(&format!(
                "\n**Best**: {} (fidelity {:.6})\n",
                best.name, best.fidelity
            ));
        }

        out.push_str("\n## Scalability\n\n");
        out.push_str("| n | N | k | Depth | Transpiled | 2Q Gates | Ideal | Noisy | Fidelity |\n");
        out.push_str("|---|---|---|-------|------------|----------|-------|-------|----------|\n");
        for r in &report.scalability {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {:.4} | {:.4} | {:.4} |\n",
                r.n_qubits,
                r.n_states,
                r.k_optimal,
                r.original_depth,
                r.transpiled_depth,
                r.cnot_count,
                r.ideal_success,
                r.noisy_success,
                r.fidelity
            ));
        }

        out
    }

    /// Plain text summary of a full run
    pub fn to_text(report: &BenchReport) -> String {
        let e = &report.experiment;
        let mut out = String::from("Grover Benchmark Results\n========================\n\n");

        out.push_str(&format!(
            "Target |{}> on {}: success {:.2}% ideal / {:.2}% noisy, fidelity {:.6}\n",
            e.target,
            e.backend,
            e.ideal_success * 100.0,
            e.noisy_success * 100.0,
            e.fidelity
        ));

        if let (Some(first), Some(last)) = (report.noise_sweep.first(), report.noise_sweep.last()) {
            out.push_str(&format!(
                "Noise sweep: {} points, success {:.4} at p={:.4} down to {:.4} at p={:.4}\n",
                report.noise_sweep.len(),
                first.success_probability,
                first.error_rate,
                last.success_probability,
                last.error_rate
            ));
        }

        let ran = report.topology.records.iter().filter(|r| r.is_ok()).count();
        out.push_str(&format!(
            "Topologies: {} of {} ran\n",
            ran,
            report.topology.records.len()
        ));
        if let Some(best) = &report.topology.best {
            out.push_str(&Self::best_topology_text(best));
        }

        out.push_str("Scalability:\n");
        for r in &report.scalability {
            out.push_str(&format!(
                "  n={} depth {} -> {}, {} two-qubit gates, fidelity {:.4}\n",
                r.n_qubits, r.original_depth, r.transpiled_depth, r.cnot_count, r.fidelity
            ));
        }

        out
    }

    // ========================================================================
    // Record Files
    // ========================================================================

    /// Per-state comparison table followed by the summary block
    pub fn experiment_csv(record: &ExperimentRecord) -> String {
        let mut out = String::from(
            "Quantum State,Ideal Counts,Ideal Probability,Noisy Counts,Noisy Probability\n",
        );
        for row in record.rows() {
            out.push_str(&format!(
                "{},{},{:.4},{},{:.4}\n",
                row.state, row.ideal_count, row.ideal_probability, row.noisy_count, row.noisy_probability
            ));
        }

        out.push('\n');
        out.push_str("Metric,Value\n");
        out.push_str(&format!("Total Shots,{}\n", record.shots));
        out.push_str(&format!("Hellinger Fidelity,{:.6}\n", record.fidelity));
        out.push_str(&format!("Target State,{}\n", record.target));
        out.push_str(&format!("Success Probability (Ideal),{:.4}\n", record.ideal_success));
        out.push_str(&format!("Success Probability (Noisy),{:.4}\n", record.noisy_success));
        out
    }

    /// One row per error rate
    pub fn noise_sweep_csv(records: &[NoiseSweepRecord]) -> String {
        let mut out = String::from(
            "error_rate,target,iterations,shots,executed_depth,two_qubit_gates,success_probability,fidelity\n",
        );
        for r in records {
            out.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                r.error_rate,
                r.target,
                r.iterations,
                r.shots,
                r.executed_depth,
                r.two_qubit_gates,
                r.success_probability,
                r.fidelity
            ));
        }
        out
    }

    /// One row per device; skipped devices leave the metrics empty
    pub fn topology_csv(records: &[TopologyRecord]) -> String {
        let mut out = String::from(
            "device,target,shots,fidelity,success_probability,executed_depth,two_qubit_gates,swaps_inserted,error\n",
        );
        for r in records {
            out.push_str(&format!(
                "{},{},{},{},{},{},{},{},{}\n",
                r.device,
                r.target,
                r.shots,
                opt(r.fidelity),
                opt(r.success_probability),
                opt(r.executed_depth),
                opt(r.two_qubit_gates),
                opt(r.swaps_inserted),
                r.error.as_deref().map(|e| e.replace(',', ";")).unwrap_or_default()
            ));
        }
        out
    }

    /// One row per register size
    pub fn scalability_csv(records: &[ScalabilityRecord]) -> String {
        let mut out = String::from(
            "n_qubits,N_states,target,k_optimal,original_depth,transpiled_depth,cnot_count,ideal_success,noisy_success,fidelity\n",
        );
        for r in records {
            out.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{}\n",
                r.n_qubits,
                r.n_states,
                r.target,
                r.k_optimal,
                r.original_depth,
                r.transpiled_depth,
                r.cnot_count,
                r.ideal_success,
                r.noisy_success,
                r.fidelity
            ));
        }
        out
    }

    /// Three-line best topology summary
    pub fn best_topology_text(best: &BestTopology) -> String {
        best.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
