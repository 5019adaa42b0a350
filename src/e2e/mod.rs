/*! End-to-end latency analysis of cause-effect chains.

This module bounds the maximum reaction time of a [CauseEffectChain]:
the longest time from an external event sampled by the first task of
the chain until the last task has produced an output based on it.

The closed-form analyses ([sporadic], [periodic]) each support one
combination of communication policy and release pattern. Chains that
mix policies or release patterns are handled in [mixed], either by
cutting them into homogeneous runs or by applying the per-link
propagation rules directly. The [exact] analysis operates on
simulated schedules instead of bounds.

All analyses except the LET ones require the worst-case response times
of the base task set to be known (see
[TaskSet::compute_response_times]). */

use derive_more::Display;
use thiserror::Error;

use crate::chain::{CauseEffectChain, ChainError};
use crate::simulator::SimulationError;
use crate::task::{Communication, ReleaseKind, Task, TaskId};
use crate::taskset::TaskSet;
use crate::time::Duration;

pub mod exact;
pub mod mixed;
pub mod periodic;
pub mod sporadic;

/// Failures of a chain analysis. These affect only the chain under
/// analysis.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("no worst-case response time known for task {task}")]
    WcrtUnavailable { task: TaskId },
    #[error("no analysis for {communication} communication with {release} release")]
    UnhandledCombination {
        communication: Communication,
        release: ReleaseKind,
    },
    #[error("task {task} is not periodic")]
    NotPeriodic { task: TaskId },
    #[error("schedule ends before job {job} of task {task}")]
    ScheduleExhausted { task: TaskId, job: u64 },
    #[error("no complete job chain in the analysis window")]
    EmptyWindow,
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// The closed-form analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ClosedForm {
    /// Davare et al. (DAC 2007): every task contributes its maximum
    /// inter-arrival time plus its response time.
    #[display(fmt = "Davare")]
    Davare,
    /// Dürr et al. (CASES 2019): like Davare, but the response time of
    /// a task that precedes a lower-priority task is not counted.
    #[display(fmt = "Duerr")]
    Duerr,
    /// Kloda et al. (RTAS 2018): exact release propagation for
    /// periodic tasks with implicit communication.
    #[display(fmt = "Kloda")]
    Kloda,
    #[display(fmt = "LET-sporadic")]
    LetSporadic,
    #[display(fmt = "LET-periodic")]
    LetPeriodic,
}

impl ClosedForm {
    pub fn analyze(self, chain: &CauseEffectChain) -> Result<Duration, AnalysisError> {
        match self {
            ClosedForm::Davare => sporadic::davare(chain),
            ClosedForm::Duerr => sporadic::duerr(chain),
            ClosedForm::Kloda => periodic::kloda(chain),
            ClosedForm::LetSporadic => sporadic::let_sporadic(chain),
            ClosedForm::LetPeriodic => periodic::let_periodic(chain),
        }
    }
}

/// The cached worst-case response time of `tsk` in `base`.
pub(crate) fn wcrt(base: &TaskSet, tsk: &Task) -> Result<Duration, AnalysisError> {
    base.response_time(tsk.id())
        .ok_or(AnalysisError::WcrtUnavailable { task: tsk.id() })
}

/// How much later than the release of a job of `this` the next job of
/// `next` must be released to be guaranteed to consume its output.
///
/// - LET: the output is visible at the deadline of `this`.
/// - implicit to implicit: if `this` has the higher priority, any job
///   of `next` released no earlier than `this` runs after it;
///   otherwise the output may appear as late as the response time.
/// - implicit to LET: the output may appear as late as the response
///   time of `this`.
pub(crate) fn propagation_delay(
    base: &TaskSet,
    this: &Task,
    next: &Task,
) -> Result<Duration, AnalysisError> {
    match (this.communication(), next.communication()) {
        (Communication::Let, _) => Ok(this.deadline()),
        (Communication::Implicit, Communication::Implicit)
            if base.has_higher_priority(this.id(), next.id()) =>
        {
            Ok(0)
        }
        (Communication::Implicit, _) => wcrt(base, this),
    }
}

/// How long after its release a job of the last task of a chain may
/// produce its output.
pub(crate) fn output_delay(base: &TaskSet, last: &Task) -> Result<Duration, AnalysisError> {
    match last.communication() {
        Communication::Let => Ok(last.deadline()),
        Communication::Implicit => wcrt(base, last),
    }
}

/// Fail unless every task of the chain uses the given communication
/// policy.
pub(crate) fn require_communication(
    chain: &CauseEffectChain,
    communication: Communication,
) -> Result<(), AnalysisError> {
    match chain.tasks().find(|tsk| tsk.communication() != communication) {
        Some(tsk) => Err(AnalysisError::UnhandledCombination {
            communication: tsk.communication(),
            release: tsk.release().kind(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests;
