//! Pass manager for orchestrating compilation.

use tracing::{debug, info, instrument};

use syndra_ir::{Circuit, NoiseModel};

use crate::error::CompileResult;
use crate::pass::Pass;
use crate::passes::{LocalOptimization, MomentVerification, NoiseInjectionPass, ZBasisTranslation};
use crate::property::PropertySet;

/// Manages and executes a sequence of compilation passes.
pub struct PassManager {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Names of the passes, in execution order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run all passes on the given circuit.
    #[instrument(skip(self, circuit, properties))]
    pub fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> CompileResult<()> {
        info!(
            "Running pass manager with {} passes on circuit with {} qubits",
            self.passes.len(),
            circuit.num_qubits()
        );

        for pass in &self.passes {
            if pass.should_run(circuit, properties) {
                debug!("Running pass: {}", pass.name());
                pass.run(circuit, properties)?;
                debug!("Pass {} completed, ops: {}", pass.name(), circuit.len());
            } else {
                debug!("Skipping pass: {}", pass.name());
            }
        }

        info!(
            "Pass manager completed, ticks: {}, measurements: {}",
            circuit.num_ticks(),
            circuit.num_measurements()
        );

        Ok(())
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating pass managers with preset configurations.
pub struct PassManagerBuilder {
    /// Optimization level (0-3).
    optimization_level: u8,
    /// Whether to translate into Z-basis interactions.
    z_basis: bool,
    /// Compilation properties.
    properties: PropertySet,
}

impl PassManagerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            optimization_level: 1,
            z_basis: false,
            properties: PropertySet::new(),
        }
    }

    /// Set the optimization level.
    ///
    /// - Level 0: No optimization, no verification
    /// - Level 1 and above: Local layer fusion followed by moment verification (default)
    #[must_use]
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        self.optimization_level = level.min(3);
        self
    }

    /// Inject noise from `model`.
    #[must_use]
    pub fn with_noise(mut self, model: NoiseModel) -> Self {
        self.properties.noise_model = Some(model);
        self
    }

    /// Translate into Z-basis interactions after noise injection.
    #[must_use]
    pub fn with_z_basis(mut self, enabled: bool) -> Self {
        self.z_basis = enabled;
        self
    }

    /// Exclude qubits from noise.
    #[must_use]
    pub fn with_immune_qubits(mut self, qubits: impl IntoIterator<Item = u32>) -> Self {
        self.properties.immune_qubits.extend(qubits);
        self
    }

    /// Fix the qubits that receive idle noise.
    #[must_use]
    pub fn with_system_qubits(mut self, qubits: impl IntoIterator<Item = u32>) -> Self {
        self.properties.system_qubits = Some(qubits.into_iter().collect());
        self
    }

    /// Replace the properties wholesale.
    #[must_use]
    pub fn with_properties(mut self, properties: PropertySet) -> Self {
        self.properties = properties;
        self
    }

    /// Build the pass manager and return it with the properties.
    pub fn build(self) -> (PassManager, PropertySet) {
        let mut pm = PassManager::new();

        if self.properties.noise_model.is_some() {
            pm.add_pass(NoiseInjectionPass::new());
        }

        if self.z_basis {
            pm.add_pass(ZBasisTranslation);
        }

        if self.optimization_level >= 1 {
            pm.add_pass(LocalOptimization);
        }

        // Verification goes last so it sees the output of every rewrite.
        if self.optimization_level >= 1 {
            pm.add_pass(MomentVerification);
        }

        (pm, self.properties)
    }
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::VerificationResult;

    #[test]
    fn test_empty_pass_manager() {
        let pm = PassManager::new();
        assert!(pm.is_empty());
        assert_eq!(pm.len(), 0);
    }

    #[test]
    fn test_pass_manager_run() {
        let pm = PassManager::new();
        let mut props = PropertySet::new();
        let mut circuit: Circuit = "H 0\nTICK\nCX 0 1\n".parse().unwrap();
        pm.run(&mut circuit, &mut props).unwrap();
        assert_eq!(circuit.len(), 3);
    }

    #[test]
    fn test_pass_manager_builder() {
        let (pm, props) = PassManagerBuilder::new()
            .with_optimization_level(2)
            .with_noise(NoiseModel::si1000(0.001))
            .with_z_basis(true)
            .with_immune_qubits([7])
            .build();

        assert_eq!(
            pm.pass_names(),
            vec![
                "NoiseInjection",
                "ZBasisTranslation",
                "LocalOptimization",
                "moment_verification"
            ]
        );
        assert!(props.noise_model.is_some());
        assert!(props.immune_qubits.contains(&7));
    }

    #[test]
    fn test_level_zero_without_noise_is_empty() {
        let (pm, _) = PassManagerBuilder::new().with_optimization_level(0).build();
        assert!(pm.is_empty());
    }

    #[test]
    fn test_pipeline_records_verification() {
        let (pm, mut props) = PassManagerBuilder::new()
            .with_noise(NoiseModel::uniform_depolarizing(0.001))
            .build();
        let mut circuit: Circuit = "R 0 1\nTICK\nCX 0 1\nTICK\nM 0 1\n".parse().unwrap();
        pm.run(&mut circuit, &mut props).unwrap();
        let result = props.get::<VerificationResult>().unwrap();
        assert!(result.passed);
        assert_eq!(result.measurements_found, 2);
        assert!(circuit.gates_used().contains("DEPOLARIZE2"));
    }
}
