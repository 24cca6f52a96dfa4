//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use syndra_ir::{Circuit, NoiseModel, NoiseRule};

/// Load a circuit from a text file.
pub fn load_circuit(path: &str) -> Result<Circuit> {
    let source = read_source(path)?;
    source
        .parse()
        .map_err(|e| anyhow::anyhow!("Parse error in {path}: {e}"))
}

/// Write a circuit to `output`, or to stdout when no path is given.
pub fn write_circuit(circuit: &Circuit, output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => fs::write(path, circuit.to_string())
            .with_context(|| format!("Failed to write file: {path}")),
        None => {
            print!("{circuit}");
            Ok(())
        }
    }
}

/// Load a JSON or YAML document, chosen by extension (JSON by default).
pub fn load_document<T: DeserializeOwned>(path: &str) -> Result<T> {
    let source = read_source(path)?;
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml_ng::from_str(&source)
            .with_context(|| format!("Invalid YAML in {path}")),
        _ => serde_json::from_str(&source).with_context(|| format!("Invalid JSON in {path}")),
    }
}

fn read_source(path: &str) -> Result<String> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))
}

/// Split `name:<p>` into the preset name and its strength.
fn parse_preset(spec: &str) -> Option<Result<(String, f64)>> {
    let (name, p) = spec.split_once(':')?;
    let parsed = p
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid noise strength in '{spec}'"))
        .and_then(|p| {
            if (0.0..=1.0).contains(&p) {
                Ok(p)
            } else {
                anyhow::bail!("Noise strength {p} is outside [0, 1]")
            }
        });
    Some(parsed.map(|p| (name.trim().to_lowercase(), p)))
}

/// Resolve a noise model from a preset (`uniform:<p>`, `si1000:<p>`) or a
/// JSON/YAML file.
pub fn get_noise_model(spec: &str) -> Result<NoiseModel> {
    let model = match parse_preset(spec) {
        Some(preset) => {
            let (name, p) = preset?;
            match name.as_str() {
                "uniform" | "depolarizing" => NoiseModel::uniform_depolarizing(p),
                "si1000" => NoiseModel::si1000(p),
                other => {
                    anyhow::bail!("Unknown noise model: '{other}'. Available: uniform, si1000")
                }
            }
        }
        None => load_document(spec)?,
    };
    model
        .validate()
        .with_context(|| format!("Invalid noise model '{spec}'"))?;
    Ok(model)
}

/// Resolve a per-round noise rule from a preset, `none`, or a JSON/YAML file.
///
/// `uniform:<p>` depolarizes every data qubit and flips every result with
/// probability `p`; `bitflip:<p>` applies only `X_ERROR(p)`.
pub fn get_noise_rule(spec: &str) -> Result<NoiseRule> {
    let rule = match parse_preset(spec) {
        Some(preset) => {
            let (name, p) = preset?;
            match name.as_str() {
                "uniform" | "depolarizing" => {
                    NoiseRule::after([("DEPOLARIZE1", p)]).with_flip_result(p)
                }
                "bitflip" => NoiseRule::after([("X_ERROR", p)]),
                other => anyhow::bail!("Unknown noise rule: '{other}'. Available: uniform, bitflip"),
            }
        }
        None if spec.eq_ignore_ascii_case("none") => NoiseRule::default(),
        None => load_document(spec)?,
    };
    rule.validate()
        .with_context(|| format!("Invalid noise rule '{spec}'"))?;
    Ok(rule)
}
