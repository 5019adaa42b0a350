use crate::time::Duration;

use thiserror::Error;

/// Error type returned when a fixed point search fails.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq, PartialOrd)]
pub enum SearchFailure {
    /// No fixed point found below the given divergence threshold.
    #[error("no fixed point less than {limit} found (iteration reached {reached})")]
    DivergenceLimitExceeded { limit: Duration, reached: Duration },
}

pub type SearchResult = Result<Duration, SearchFailure>;

/// Conduct an iterative search for the least fixed point of
/// `workload`, starting from `initial` and giving up as soon as an
/// iterate exceeds `divergence_limit`.
///
/// For a monotone `workload` with `workload(initial) >= initial`, the
/// sequence of iterates is non-decreasing, and the search either
/// converges to the least fixed point above `initial` or diverges.
pub fn search<RHS>(initial: Duration, divergence_limit: Duration, workload: RHS) -> SearchResult
where
    RHS: Fn(Duration) -> Duration,
{
    let mut assumed_response_time = initial;
    while assumed_response_time <= divergence_limit {
        let response_time_bound = workload(assumed_response_time);
        if response_time_bound <= assumed_response_time {
            // we have converged
            return Ok(response_time_bound);
        } else {
            // continue iterating
            assumed_response_time = response_time_bound
        }
    }
    // if we get here, we failed to converge => no solution
    Err(SearchFailure::DivergenceLimitExceeded {
        limit: divergence_limit,
        reached: assumed_response_time,
    })
}
