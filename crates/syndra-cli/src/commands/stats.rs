//! Stats command implementation.

use std::collections::BTreeMap;

use anyhow::Result;
use console::style;
use serde::Serialize;

use syndra_ir::Circuit;

use super::common::load_circuit;

/// Summary of a circuit, counting repetitions.
#[derive(Debug, Serialize)]
struct CircuitStats {
    qubits: u32,
    ticks: u64,
    measurements: u64,
    detectors: u64,
    observables: u64,
    gates: BTreeMap<String, u64>,
}

impl CircuitStats {
    fn of(circuit: &Circuit) -> Self {
        let mut gates = circuit.gate_counts();
        let detectors = gates.remove("DETECTOR").unwrap_or(0);
        let observables = gates.remove("OBSERVABLE_INCLUDE").unwrap_or(0);
        gates.remove("TICK");
        gates.remove("QUBIT_COORDS");
        gates.remove("SHIFT_COORDS");
        Self {
            qubits: circuit.num_qubits(),
            ticks: circuit.num_ticks(),
            measurements: circuit.num_measurements(),
            detectors,
            observables,
            gates,
        }
    }
}

/// Execute the stats command.
pub fn execute(input: &str, format: &str) -> Result<()> {
    let circuit = load_circuit(input)?;
    let stats = CircuitStats::of(&circuit);

    match format.to_lowercase().as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
        "table" => print_table(input, &stats),
        other => anyhow::bail!("Unknown format: '{other}'. Available: table, json"),
    }
    Ok(())
}

fn print_table(input: &str, stats: &CircuitStats) {
    println!("{} {}", style("Circuit:").bold(), style(input).green());
    println!("  Qubits:       {}", stats.qubits);
    println!("  Ticks:        {}", stats.ticks);
    println!("  Measurements: {}", stats.measurements);
    println!("  Detectors:    {}", stats.detectors);
    println!("  Observables:  {}", stats.observables);
    println!();
    println!("{}", style("Gate counts:").bold());
    let width = stats.gates.keys().map(String::len).max().unwrap_or(0);
    for (name, count) in &stats.gates {
        println!("  {:<width$}  {:>8}", style(name).cyan(), count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_split_annotations() {
        let circuit: Circuit = "QUBIT_COORDS(0, 0) 0\nR 0 1\nTICK\nREPEAT 3 {\n    M 0 1\n    DETECTOR rec[-1]\n    TICK\n}\nOBSERVABLE_INCLUDE(0) rec[-1]\n"
            .parse()
            .unwrap();
        let stats = CircuitStats::of(&circuit);
        assert_eq!(stats.qubits, 2);
        assert_eq!(stats.ticks, 4);
        assert_eq!(stats.measurements, 6);
        assert_eq!(stats.detectors, 3);
        assert_eq!(stats.observables, 1);
        assert!(!stats.gates.contains_key("TICK"));
    }
}
