//! Generate command implementation.

use anyhow::Result;
use console::style;
use tracing::debug;

use syndra_compile::{MemoryExperiment, make_code_capacity_circuit, make_phenomenological_circuit};
use syndra_ir::CheckStyle;

use super::common::{get_noise_rule, load_document, write_circuit};

/// Execute the generate command.
pub fn execute(
    experiment: &str,
    noise: Option<&str>,
    rounds: Option<u64>,
    kind: &str,
    check_style: Option<&str>,
    output: Option<&str>,
) -> Result<()> {
    let mut spec: MemoryExperiment = load_document(experiment)?;
    if let Some(noise) = noise {
        spec.noise = get_noise_rule(noise)?;
    }
    if let Some(rounds) = rounds {
        spec.rounds = rounds;
    }
    if let Some(s) = check_style {
        spec.style = get_check_style(s)?;
    }

    eprintln!(
        "{} Generating {} memory experiment from {}",
        style("→").cyan().bold(),
        style(kind).yellow(),
        style(experiment).green()
    );
    debug!(
        "{} tiles, {} rounds, {:?}",
        spec.patch.tiles().len(),
        spec.rounds,
        spec.style
    );

    let circuit = match kind.to_lowercase().as_str() {
        "phenomenological" | "pheno" => make_phenomenological_circuit(&spec)?,
        "code-capacity" | "code_capacity" => make_code_capacity_circuit(&spec)?,
        other => anyhow::bail!(
            "Unknown experiment kind: '{other}'. Available: phenomenological, code-capacity"
        ),
    };

    eprintln!(
        "{} Generated {} qubits, {} measurements",
        style("✓").green().bold(),
        circuit.num_qubits(),
        circuit.num_measurements()
    );

    write_circuit(&circuit, output)
}

/// Map a CLI style name onto a [`CheckStyle`].
fn get_check_style(name: &str) -> Result<CheckStyle> {
    match name.to_lowercase().as_str() {
        "mpp" | "product" => Ok(CheckStyle::ProductMeasurement),
        "ancilla" => Ok(CheckStyle::AncillaControlled),
        other => anyhow::bail!("Unknown check style: '{other}'. Available: mpp, ancilla"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_style_names() {
        assert_eq!(get_check_style("MPP").unwrap(), CheckStyle::ProductMeasurement);
        assert_eq!(get_check_style("ancilla").unwrap(), CheckStyle::AncillaControlled);
        assert!(get_check_style("lattice-surgery").is_err());
    }
}
