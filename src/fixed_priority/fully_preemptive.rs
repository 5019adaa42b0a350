use crate::demand::RequestBound;
use crate::fixed_point::{self, SearchFailure};
use crate::task::Task;
use crate::time::Duration;

use super::Unschedulable;

/// Bound the response time of `task` under fully-preemptive
/// fixed-priority scheduling on a dedicated uniprocessor, where
/// `interference` models the demand of all higher-priority tasks.
///
/// The bound is the least fixed point of
///
/// `r = wcet + interference(r)`,
///
/// found by iterating from `r = wcet`. The search is abandoned as soon
/// as an iterate exceeds the task's deadline, in which case the task
/// is reported as [Unschedulable::DeadlineExceeded]. Tasks with a WCET
/// of zero are rejected with [Unschedulable::ZeroWcet].
pub fn response_time<RBF>(task: &Task, interference: &RBF) -> Result<Duration, Unschedulable>
where
    RBF: RequestBound + ?Sized,
{
    let wcet = task.wcet();
    if wcet == 0 {
        return Err(Unschedulable::ZeroWcet { task: task.id() });
    }
    let deadline = task.deadline();
    fixed_point::search(wcet, deadline, |r| wcet + interference.service_needed(r)).map_err(
        |SearchFailure::DivergenceLimitExceeded { reached, .. }| Unschedulable::DeadlineExceeded {
            task: task.id(),
            deadline,
            response_time: reached,
        },
    )
}
