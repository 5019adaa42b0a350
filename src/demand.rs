/*! Processor demand.

This module provides the trait [RequestBound], which bounds the amount
of processor time requested by one task, or by a collection of tasks,
in an interval of a given length. The fixed-priority response-time
analysis uses it to bound higher-priority interference. */

use auto_impl::auto_impl;

use crate::arrival::ArrivalBound;
use crate::task::Task;
use crate::time::{Duration, Time};

/// The general interface for processor demand.
#[auto_impl(&, Box, Rc)]
pub trait RequestBound {
    /// Bound the total amount of service needed in an interval of length `delta`.
    fn service_needed(&self, delta: Duration) -> Time;
}

/// The canonical request-bound function of a task: every job that
/// can be released in the interval requests its WCET.
impl RequestBound for Task {
    fn service_needed(&self, delta: Duration) -> Time {
        self.number_arrivals(delta) * self.wcet()
    }
}

/// The cumulative demand of a collection of tasks, e.g., of all tasks
/// with higher priority than the task under analysis.
impl<T: RequestBound> RequestBound for [T] {
    fn service_needed(&self, delta: Duration) -> Time {
        self.iter().map(|rbf| rbf.service_needed(delta)).sum()
    }
}
