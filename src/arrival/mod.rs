/*! Bounds on the number of job releases in an interval.

The interference term of the fixed-priority response-time analysis
needs, for every higher-priority task, the maximum number of jobs that
can be released in a window of a given length. This module provides
the trait [ArrivalBound] for this purpose and implements it for the
release patterns of the task model. */

use auto_impl::auto_impl;

use crate::task::{Release, Task};
use crate::time::{divide_with_ceil, Duration};

/// The main interface for models describing arrival processes.
#[auto_impl(&, Box, Rc)]
pub trait ArrivalBound {
    /// Bound the number of jobs released in any half-open interval of
    /// length `delta`.
    fn number_arrivals(&self, delta: Duration) -> u64;
}

/// Both sporadic and periodic tasks release at most one job per
/// minimum inter-arrival time. For a periodic task the bound is
/// attained by a synchronous release, irrespective of its phase.
impl ArrivalBound for Release {
    fn number_arrivals(&self, delta: Duration) -> u64 {
        divide_with_ceil(delta, self.min_iat())
    }
}

impl ArrivalBound for Task {
    fn number_arrivals(&self, delta: Duration) -> u64 {
        self.release().number_arrivals(delta)
    }
}
