/*! Bounds for chains of periodic tasks.

For periodic tasks the release times are known, so a signal can be
propagated job by job: starting from a job of the first task, the
next task's consuming job is the first one released at or after the
producing job's release plus its [propagation delay](super::propagation_delay).
The bound is the longest such propagation observed over one
hyperperiod after all tasks have been released at least once. */

use crate::chain::CauseEffectChain;
use crate::task::{Communication, Task};
use crate::time::Duration;

use super::{output_delay, propagation_delay, require_communication, AnalysisError};

/// Kloda bound for periodic chains with implicit communication.
pub fn kloda(chain: &CauseEffectChain) -> Result<Duration, AnalysisError> {
    require_communication(chain, Communication::Implicit)?;
    sweep(chain)
}

/// Bound for periodic chains with LET communication.
pub fn let_periodic(chain: &CauseEffectChain) -> Result<Duration, AnalysisError> {
    require_communication(chain, Communication::Let)?;
    sweep(chain)
}

fn period_and_phase(tsk: &Task) -> Result<(Duration, Duration), AnalysisError> {
    let release = tsk.release();
    release
        .period()
        .zip(release.phase())
        .ok_or(AnalysisError::NotPeriodic { task: tsk.id() })
}

/// Maximum reaction time of a periodic chain with arbitrary
/// communication policies, following the per-link propagation rules.
pub(crate) fn sweep(chain: &CauseEffectChain) -> Result<Duration, AnalysisError> {
    let base = chain.base();
    for tsk in chain.tasks() {
        period_and_phase(tsk)?;
    }
    let (period, phase) = period_and_phase(chain.first())?;
    let hyperperiod = base.hyperperiod().unwrap_or(period);
    let max_phase = base.max_phase();

    let links = chain
        .links()
        .map(|(this, next)| propagation_delay(base, this, next).map(|delay| (next, delay)))
        .collect::<Result<Vec<_>, _>>()?;
    let tail = output_delay(base, chain.last())?;

    let mut latency = 0;
    for m in 0.. {
        // the external event arrives just after job `m` has sampled
        let event = phase + m * period;
        if event > max_phase + hyperperiod {
            break;
        }
        let mut release = event + period;
        if release < max_phase {
            continue;
        }
        for (next, delay) in &links {
            release = next
                .release()
                .release_at_or_after(release + delay)
                .ok_or(AnalysisError::NotPeriodic { task: next.id() })?;
        }
        latency = latency.max(release + tail - event);
    }
    Ok(latency)
}
