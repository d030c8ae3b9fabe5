//! # Grove Bench
//!
//! Noise, topology and scalability studies of Grover search, with the
//! records and reports they produce.
//!
//! ## Quick Start
//!
//! ```rust
//! use grove_bench::prelude::*;
//!
//! let suite = BenchSuite::with_seed(42);
//! let config = NoiseSweepConfig::default().with_points(3).with_shots(512);
//!
//! let records = suite.run_noise_sweep(&config).unwrap();
//! println!("{}", Reporter::noise_sweep_csv(&records));
//! assert!(records[2].fidelity < records[0].fidelity);
//! ```
//!
//! ## Topology Comparison
//!
//! ```rust
//! use grove_bench::prelude::*;
//!
//! let config = TopologySweepConfig::default().with_shots(512);
//! let sweep = BenchSuite::with_seed(42).run_topology_sweep_by_name(&config).unwrap();
//!
//! let best = sweep.best.unwrap();
//! print!("{}", Reporter::best_topology_text(&best));
//! assert_eq!(best.target, "1011");
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use grove_bench::prelude::*;
//!
//! let config = BenchConfig::from_json_str(r#"{"seed": 7, "scalability": {"qubit_counts": [3, 4]}}"#)
//!     .unwrap();
//! assert_eq!(config.seed, Some(7));
//! assert_eq!(config.scalability.shots, 4096);
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Experiment configuration
pub mod config;

/// Result records
pub mod records;

/// Benchmark suite
pub mod suite;

/// Reporting
pub mod reporter;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{
    BenchConfig, ExperimentConfig, NoiseSweepConfig, ScalabilityConfig, TopologySweepConfig,
};
pub use records::{
    BenchReport, BestTopology, ExperimentRecord, NoiseSweepRecord, ScalabilityRecord, StateRow,
    TopologyRecord, TopologySweep,
};
pub use reporter::{ReportFormat, Reporter};
pub use suite::{select_best, BenchSuite};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use grove_bench::prelude::*;
    //! ```

    pub use crate::config::{
        BenchConfig, ExperimentConfig, NoiseSweepConfig, ScalabilityConfig, TopologySweepConfig,
    };
    pub use crate::records::{
        BenchReport, BestTopology, ExperimentRecord, NoiseSweepRecord, ScalabilityRecord,
        TopologyRecord, TopologySweep,
    };
    pub use crate::reporter::{ReportFormat, Reporter};
    pub use crate::suite::{select_best, BenchSuite};
}

// ============================================================================
// Integration Tests
// ============================================================================
