/*! Exact local analysis of periodic chains with implicit communication.

Rather than bounding response times, this analysis looks at two
simulated schedules of the base task set: one in which every job takes
its worst-case execution time and one with a best-case execution-time
profile. A signal is propagated through the chain as a sequence of job
indices, one per task ("abstract representation"), using the latest
write of every producing job (worst case) and the earliest read of
every consuming job (best case).

Both schedules must have been produced from the base set of the chain
under analysis, so that priorities index the same tasks. */

use tracing::trace;

use crate::chain::CauseEffectChain;
use crate::simulator::{JobRecord, Schedule};
use crate::task::{Communication, ReleaseKind, Task};
use crate::taskset::TaskSet;
use crate::time::{Duration, Instant};

use super::{require_communication, AnalysisError};

/// The number of hyperperiods after the largest phase that are
/// searched by default.
pub const DEFAULT_HYPERPERIODS: u64 = 2;

/// Exact analysis over a pair of schedules.
#[derive(Debug, Clone, Copy)]
pub struct ExactAnalysis<'s> {
    worst: &'s Schedule,
    best: &'s Schedule,
    hyperperiods: u64,
}

impl<'s> ExactAnalysis<'s> {
    /// Analyze chains against the worst-case schedule `worst` and the
    /// best-case schedule `best`, searching `hyperperiods` hyperperiods
    /// after the largest phase.
    pub fn new(worst: &'s Schedule, best: &'s Schedule, hyperperiods: u64) -> Self {
        ExactAnalysis {
            worst,
            best,
            hyperperiods,
        }
    }

    fn check(&self, chain: &CauseEffectChain) -> Result<(), AnalysisError> {
        require_communication(chain, Communication::Implicit)?;
        match chain
            .tasks()
            .find(|tsk| tsk.release().kind() != ReleaseKind::Periodic)
        {
            Some(tsk) => Err(AnalysisError::NotPeriodic { task: tsk.id() }),
            None => Ok(()),
        }
    }

    fn window_end(&self, base: &TaskSet) -> Instant {
        base.max_phase() + self.hyperperiods * self.worst.hyperperiod()
    }

    /// Maximum reaction time of `chain`: the longest time from an
    /// external event until the first output of the last task that is
    /// based on it.
    pub fn reaction_time(&self, chain: &CauseEffectChain) -> Result<Duration, AnalysisError> {
        self.check(chain)?;
        let base = chain.base();
        let first = chain.first();
        let first_prio = chain.priorities()[0];
        let max_phase = base.max_phase();
        let end = self.window_end(base);

        let mut latency = None;
        for m in 0.. {
            let sampled = nth_release(first, m)?;
            if sampled > end {
                break;
            }
            // the job after `m` is the first to see the event
            if nth_release(first, m + 1)? < max_phase {
                continue;
            }
            let mut idx = m + 1;
            for (step, (this, next)) in chain.links().enumerate() {
                let (this_prio, next_prio) = (chain.priorities()[step], chain.priorities()[step + 1]);
                let producer = lookup(self.worst, this_prio, this, idx)?;
                let ready = if base.has_higher_priority(this.id(), next.id()) {
                    producer.release
                } else {
                    producer.write
                };
                idx = self
                    .best
                    .count_before(next_prio, ready, |job| job.read)
                    .ok_or(AnalysisError::ScheduleExhausted {
                        task: next.id(),
                        job: idx,
                    })?;
            }
            let last_prio = chain.priorities()[chain.len() - 1];
            let output = lookup(self.worst, last_prio, chain.last(), idx)?.write;
            let input = lookup(self.best, first_prio, first, m)?.read;
            let length = output - input;
            trace!(job = m, length, "forward job chain");
            latency = latency.max(Some(length));
        }
        latency.ok_or(AnalysisError::EmptyWindow)
    }

    /// Maximum data age of `chain`: the longest time from the instant
    /// the first task samples an input until the last output of the
    /// last task that is based on it.
    pub fn data_age(&self, chain: &CauseEffectChain) -> Result<Duration, AnalysisError> {
        self.check(chain)?;
        let base = chain.base();
        let last = chain.last();
        let last_prio = chain.priorities()[chain.len() - 1];
        let end = self.window_end(base);
        let reversed = chain.reversed();

        let mut age = None;
        'jobs: for k in 0.. {
            if nth_release(last, k)? > end {
                break;
            }
            let mut idx = k;
            for (step, (this, prev)) in reversed.links().enumerate() {
                let (this_prio, prev_prio) =
                    (reversed.priorities()[step], reversed.priorities()[step + 1]);
                let consumer = lookup(self.best, this_prio, this, idx)?;
                let key: fn(&JobRecord) -> Instant =
                    if base.has_higher_priority(prev.id(), this.id()) {
                        |job| job.release
                    } else {
                        |job| job.write
                    };
                let producers = self
                    .worst
                    .count_until(prev_prio, consumer.read, key)
                    .ok_or(AnalysisError::ScheduleExhausted {
                        task: prev.id(),
                        job: idx,
                    })?;
                match producers.checked_sub(1) {
                    Some(producer) => idx = producer,
                    // no data has reached this job yet
                    None => continue 'jobs,
                }
            }
            let first_prio = chain.priorities()[0];
            let input = lookup(self.best, first_prio, chain.first(), idx)?.read;
            let output = lookup(self.worst, last_prio, last, k)?.write;
            let length = output - input;
            trace!(job = k, length, "backward job chain");
            age = age.max(Some(length));
        }
        age.ok_or(AnalysisError::EmptyWindow)
    }
}

fn nth_release(tsk: &Task, n: u64) -> Result<Instant, AnalysisError> {
    tsk.release()
        .nth_release(n)
        .ok_or(AnalysisError::NotPeriodic { task: tsk.id() })
}

fn lookup(sched: &Schedule, prio: usize, tsk: &Task, n: u64) -> Result<JobRecord, AnalysisError> {
    sched.job(prio, n).ok_or(AnalysisError::ScheduleExhausted {
        task: tsk.id(),
        job: n,
    })
}
