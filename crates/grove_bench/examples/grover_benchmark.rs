//! Grover Benchmark
//!
//! Runs the ideal vs noisy experiment, the noise sweep, the topology
//! comparison and the scalability study, then writes every report.
//!
//! Usage: `cargo run --example grover_benchmark -- [config.json] [out_dir]`

use anyhow::Context;
use grove_bench::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => BenchConfig::from_json_file(&path)
            .with_context(|| format!("loading config from {}", path))?,
        None => BenchConfig::default(),
    };
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "benchmarks".to_string()));

    println!("Grover Benchmark");
    println!("================\n");
    println!("Seed: {:?}", config.seed);
    println!(
        "Experiment: target {} on {} ({} shots)",
        config.experiment.target, config.experiment.device, config.experiment.shots
    );
    println!(
        "Noise sweep: {} rates in [{}, {}]",
        config.noise_sweep.points, config.noise_sweep.rate_min, config.noise_sweep.rate_max
    );
    println!("Topologies: {:?}", config.topology_sweep.devices);
    println!("Qubit counts: {:?}\n", config.scalability.qubit_counts);

    let start = Instant::now();
    let report = BenchSuite::from_config(&config).run_all(&config)?;
    println!("{}", Reporter::to_text(&report));
    println!("Finished in {:.2}s", start.elapsed().as_secs_f64());

    fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let files = [
        ("grover_benchmark.csv", Reporter::experiment_csv(&report.experiment)),
        ("noise_sweep.csv", Reporter::noise_sweep_csv(&report.noise_sweep)),
        ("topology_comparison.csv", Reporter::topology_csv(&report.topology.records)),
        ("scalability_study.csv", Reporter::scalability_csv(&report.scalability)),
        ("report.md", Reporter::to_markdown(&report)),
        ("report.json", Reporter::to_json(&report)?),
    ];
    for (name, contents) in files {
        let path = out_dir.join(name);
        fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
        println!("Saved {}", path.display());
    }
    if let Some(best) = &report.topology.best {
        let path = out_dir.join("best_topology.txt");
        fs::write(&path, Reporter::best_topology_text(best))?;
        println!("Saved {}", path.display());
    }

    Ok(())
}
