//! Parameters of a batch of chain analyses.

use crate::e2e::exact::DEFAULT_HYPERPERIODS;
use crate::e2e::mixed::CutRegistry;
use crate::perturb::Perturbation;

/// Execution-time ratios of the best-case profiles analyzed by default.
pub const DEFAULT_BCET_RATIOS: [f64; 5] = [1.0, 0.5, 0.3, 0.1, 0.0];

/// Base seed used unless the caller picks one.
pub const DEFAULT_SEED: u64 = 314_159;

/// Configuration of the [batch](crate::batch) pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// For every ratio, the exact analysis compares the worst-case
    /// schedule with a schedule in which all execution times are
    /// scaled by the ratio.
    pub bcet_ratios: Vec<f64>,
    /// How many hyperperiods after the largest phase the exact
    /// analysis searches.
    pub exact_hyperperiods: u64,
    /// Closed-form analyses used by the cut-based mixed-chain analysis.
    pub cut_registry: CutRegistry,
    /// If set, every task set is perturbed before it is analyzed.
    pub perturbation: Option<Perturbation>,
    /// Base seed from which every unit derives its own generator.
    pub seed: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            bcet_ratios: DEFAULT_BCET_RATIOS.to_vec(),
            exact_hyperperiods: DEFAULT_HYPERPERIODS,
            cut_registry: CutRegistry::default(),
            perturbation: None,
            seed: DEFAULT_SEED,
        }
    }
}

impl AnalysisConfig {
    pub fn with_seed(self, seed: u64) -> Self {
        AnalysisConfig { seed, ..self }
    }

    pub fn with_perturbation(self, perturbation: Perturbation) -> Self {
        AnalysisConfig {
            perturbation: Some(perturbation),
            ..self
        }
    }

    pub fn with_bcet_ratios(self, ratios: impl Into<Vec<f64>>) -> Self {
        AnalysisConfig {
            bcet_ratios: ratios.into(),
            ..self
        }
    }
}
