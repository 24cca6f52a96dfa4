//! Noise command implementation.

use anyhow::Result;
use console::style;

use syndra_compile::{NoiseInjectionPass, Pass, PropertySet};

use super::common::{get_noise_model, load_circuit, write_circuit};

/// Execute the noise command.
pub fn execute(
    input: &str,
    output: Option<&str>,
    noise: &str,
    immune: &[u32],
    strict: bool,
) -> Result<()> {
    let mut circuit = load_circuit(input)?;
    let mut model = get_noise_model(noise)?;
    model.strict |= strict;

    eprintln!(
        "{} Adding {} noise to {}",
        style("→").cyan().bold(),
        style(noise).yellow(),
        style(input).green()
    );
    if !immune.is_empty() {
        eprintln!("  Immune qubits: {immune:?}");
    }

    let ops_before = circuit.len();
    let mut props = PropertySet::new()
        .with_noise(model)
        .with_immune_qubits(immune.iter().copied());
    NoiseInjectionPass::new().run(&mut circuit, &mut props)?;

    eprintln!(
        "{} Noise added: {} -> {} operations",
        style("✓").green().bold(),
        ops_before,
        circuit.len()
    );

    write_circuit(&circuit, output)
}
