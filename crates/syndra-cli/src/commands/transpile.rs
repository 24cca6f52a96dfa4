//! Transpile command implementation.

use anyhow::Result;
use console::style;

use syndra_compile::PassManagerBuilder;

use super::common::{load_circuit, write_circuit};

/// Execute the transpile command.
pub fn execute(
    input: &str,
    output: Option<&str>,
    z_basis: bool,
    optimization_level: u8,
) -> Result<()> {
    let mut circuit = load_circuit(input)?;
    eprintln!(
        "{} Transpiling {} ({} operations, {} ticks)",
        style("→").cyan().bold(),
        style(input).green(),
        circuit.len(),
        circuit.num_ticks()
    );

    let (pm, mut props) = PassManagerBuilder::new()
        .with_optimization_level(optimization_level)
        .with_z_basis(z_basis)
        .build();

    eprintln!(
        "  Running {} passes (level {}): {}",
        pm.len(),
        optimization_level,
        pm.pass_names().join(", ")
    );
    pm.run(&mut circuit, &mut props)?;

    eprintln!(
        "{} Transpilation complete: {} operations, {} ticks",
        style("✓").green().bold(),
        circuit.len(),
        circuit.num_ticks()
    );

    write_circuit(&circuit, output)
}
