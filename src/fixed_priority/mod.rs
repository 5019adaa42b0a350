/*! Response-time analysis for *fixed-priority* (**FP**) scheduling

This module provides the classic time-demand analysis (TDA) for
fully-preemptive fixed-priority scheduling on a dedicated uniprocessor,
and the per-task-set driver that caches its results in a [TaskSet].

## Citation

The analysis is the response-time recurrence due to:

- M. Joseph and P. Pandya, “Finding Response Times in a Real-Time System”, *The Computer Journal*, 29(5), pp.&nbsp;390--395, 1986.
 */

use thiserror::Error;
use tracing::debug;

use crate::task::TaskId;
use crate::taskset::TaskSet;
use crate::time::Duration;

pub mod fully_preemptive;

/// Reasons for which a task set is deemed unschedulable. Callers are
/// expected to discard the offending task set (and everything derived
/// from it), not to abort.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum Unschedulable {
    /// Tasks without execution demand are not supported.
    #[error("task {task} has a WCET of zero")]
    ZeroWcet { task: TaskId },
    /// The response-time recurrence exceeded the task's deadline.
    #[error("response time of task {task} reached {response_time}, exceeding its deadline {deadline}")]
    DeadlineExceeded {
        task: TaskId,
        deadline: Duration,
        response_time: Duration,
    },
}

impl TaskSet {
    /// Compute and cache the worst-case response time of every task,
    /// each under interference from all tasks of higher priority.
    ///
    /// On failure the cache is left untouched.
    pub fn compute_response_times(&mut self) -> Result<(), Unschedulable> {
        let wcrts = (0..self.len())
            .map(|prio| {
                let tasks = self.tasks();
                let wcrt = fully_preemptive::response_time(&tasks[prio], &tasks[..prio])?;
                debug!(task = %tasks[prio].id(), prio, wcrt, "response time converged");
                Ok(Some(wcrt))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.response_times = wcrts;
        Ok(())
    }
}
