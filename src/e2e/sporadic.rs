//! Closed-form bounds that make no assumption about release times
//! beyond the maximum inter-arrival time of each task.

use itertools::Itertools;

use crate::chain::CauseEffectChain;
use crate::task::Communication;
use crate::time::Duration;

use super::{require_communication, wcrt, AnalysisError};

/// Davare bound for chains with implicit communication:
/// `Σ (max_iat + wcrt)`.
pub fn davare(chain: &CauseEffectChain) -> Result<Duration, AnalysisError> {
    require_communication(chain, Communication::Implicit)?;
    chain
        .tasks()
        .map(|tsk| -> Result<Duration, AnalysisError> {
            Ok(tsk.max_iat() + wcrt(chain.base(), tsk)?)
        })
        .sum()
}

/// Dürr bound for chains with implicit communication. A task whose
/// successor has lower priority contributes only its maximum
/// inter-arrival time.
pub fn duerr(chain: &CauseEffectChain) -> Result<Duration, AnalysisError> {
    require_communication(chain, Communication::Implicit)?;
    let base = chain.base();
    let links = chain
        .links()
        .map(|(this, next)| -> Result<Duration, AnalysisError> {
            let response = if base.has_higher_priority(this.id(), next.id()) {
                0
            } else {
                wcrt(base, this)?
            };
            Ok(this.max_iat() + response)
        })
        .fold_ok(0, |acc, x| acc + x)?;
    let last = chain.last();
    Ok(links + last.max_iat() + wcrt(base, last)?)
}

/// Bound for chains with LET communication: `Σ (max_iat + deadline)`.
pub fn let_sporadic(chain: &CauseEffectChain) -> Result<Duration, AnalysisError> {
    require_communication(chain, Communication::Let)?;
    Ok(chain.tasks().map(|tsk| tsk.max_iat() + tsk.deadline()).sum())
}
