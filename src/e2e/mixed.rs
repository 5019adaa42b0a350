/*! Chains that mix communication policies or release patterns.

Two strategies are offered:

- [cut_based] cuts the chain into maximal runs that agree on both
  communication policy and release pattern, bounds every run with the
  closed-form analysis registered for its combination, and adds up
  the run bounds. Interaction across the cuts is lost.
- [principle_based] cuts only where the release pattern changes and
  applies the per-link propagation rules within each run, so that a
  change of communication policy costs nothing extra. */

use std::collections::HashMap;

use tracing::trace;

use crate::chain::CauseEffectChain;
use crate::task::{Communication, ReleaseKind};
use crate::time::Duration;

use super::{output_delay, periodic, propagation_delay, AnalysisError, ClosedForm};

/// Which closed-form analysis bounds a homogeneous run of a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutRegistry {
    analyses: HashMap<(Communication, ReleaseKind), ClosedForm>,
}

impl CutRegistry {
    /// A registry without any analysis.
    pub fn empty() -> Self {
        CutRegistry {
            analyses: HashMap::new(),
        }
    }

    /// Register `analysis` for runs with the given combination,
    /// replacing any previous registration.
    pub fn with(mut self, communication: Communication, release: ReleaseKind, analysis: ClosedForm) -> Self {
        self.analyses.insert((communication, release), analysis);
        self
    }

    pub fn get(&self, communication: Communication, release: ReleaseKind) -> Option<ClosedForm> {
        self.analyses.get(&(communication, release)).copied()
    }
}

impl Default for CutRegistry {
    fn default() -> Self {
        CutRegistry::empty()
            .with(Communication::Implicit, ReleaseKind::Sporadic, ClosedForm::Duerr)
            .with(Communication::Let, ReleaseKind::Sporadic, ClosedForm::LetSporadic)
            .with(Communication::Implicit, ReleaseKind::Periodic, ClosedForm::Kloda)
            .with(Communication::Let, ReleaseKind::Periodic, ClosedForm::LetPeriodic)
    }
}

/// Sum of the closed-form bounds of the homogeneous runs of `chain`.
pub fn cut_based(chain: &CauseEffectChain, registry: &CutRegistry) -> Result<Duration, AnalysisError> {
    let mut total = 0;
    for run in chain.cut() {
        // runs are homogeneous, so the first task speaks for all
        let first = run.first();
        let (communication, release) = (first.communication(), first.release().kind());
        let analysis = registry
            .get(communication, release)
            .ok_or(AnalysisError::UnhandledCombination {
                communication,
                release,
            })?;
        let bound = analysis.analyze(&run)?;
        trace!(%analysis, tasks = run.len(), bound, "bounded run");
        total += bound;
    }
    Ok(total)
}

/// Sum of the per-run bounds, cutting only where the release pattern
/// changes.
pub fn principle_based(chain: &CauseEffectChain) -> Result<Duration, AnalysisError> {
    let mut total = 0;
    for run in chain.cut_by_release() {
        total += match run.first().release().kind() {
            ReleaseKind::Periodic => periodic::sweep(&run)?,
            ReleaseKind::Sporadic => sporadic_run(&run)?,
        };
    }
    Ok(total)
}

fn sporadic_run(run: &CauseEffectChain) -> Result<Duration, AnalysisError> {
    let base = run.base();
    let mut total = 0;
    for (this, next) in run.links() {
        total += this.max_iat() + propagation_delay(base, this, next)?;
    }
    let last = run.last();
    Ok(total + last.max_iat() + output_delay(base, last)?)
}
