/*! Event-driven simulation of fixed-priority preemptive scheduling.

The simulator advances from event to event (job releases and job
completions) rather than tick by tick and records, for every job of
every task, the instants at which the job reads its inputs and writes
its outputs. The resulting [Schedule] is what the exact chain analysis
operates on.

Only periodic task sets can be simulated: sporadic tasks have no
release times to replay. */

use thiserror::Error;
use tracing::{debug, trace};

use crate::task::{Communication, ReleaseKind, Task, TaskId};
use crate::taskset::TaskSet;
use crate::time::{divide_with_ceil, Duration, Instant};

/// Errors raised while building a schedule.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SimulationError {
    /// A job was still pending when the next job of the same task was
    /// released. The job indices of the schedule would no longer match
    /// the release pattern.
    #[error("job {job} of task {task} still pending at the next release ({at})")]
    Desync { task: TaskId, job: u64, at: Instant },
    #[error("task {task} is not periodic and cannot be simulated")]
    NotPeriodic { task: TaskId },
}

/// Lifecycle of a pending job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Released,
    Running,
    Preempted,
    Completed,
}

/// The observable events of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobRecord {
    pub release: Instant,
    /// When the job reads its inputs.
    pub read: Instant,
    /// When the outputs of the job become visible.
    pub write: Instant,
}

impl JobRecord {
    fn shifted(&self, offset: Duration) -> Self {
        JobRecord {
            release: self.release + offset,
            read: self.read + offset,
            write: self.write + offset,
        }
    }

    fn of(tsk: &Task, release: Instant, start: Instant, finish: Instant) -> Self {
        match tsk.communication() {
            Communication::Implicit => JobRecord {
                release,
                read: start,
                write: finish,
            },
            Communication::Let => JobRecord {
                release,
                read: release,
                write: release + tsk.deadline(),
            },
        }
    }
}

/// The recorded jobs of every task of a task set, indexed by priority
/// and then by job number (starting at zero).
///
/// Beyond the recorded jobs, the schedule is assumed to repeat with
/// the hyperperiod: lookups past the end are answered by going back
/// an integral number of hyperperiods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    hyperperiod: Duration,
    periods: Vec<Duration>,
    jobs: Vec<Vec<JobRecord>>,
}

impl Schedule {
    pub fn hyperperiod(&self) -> Duration {
        self.hyperperiod
    }

    /// Number of tasks covered by the schedule.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// The recorded jobs of the task with the given priority.
    pub fn jobs(&self, priority: usize) -> &[JobRecord] {
        self.jobs.get(priority).map_or(&[], Vec::as_slice)
    }

    fn jobs_per_hyperperiod(&self, priority: usize) -> u64 {
        self.hyperperiod / self.periods[priority]
    }

    /// The `n`-th job of the task with the given priority, wrapping
    /// around whole hyperperiods if `n` lies beyond the recorded jobs.
    /// Returns `None` if less than one hyperperiod has been recorded.
    pub fn job(&self, priority: usize, n: u64) -> Option<JobRecord> {
        let jobs = self.jobs.get(priority)?;
        let stored = jobs.len() as u64;
        if n < stored {
            return Some(jobs[n as usize]);
        }
        let per_hp = self.jobs_per_hyperperiod(priority);
        if per_hp == 0 || stored < per_hp {
            return None;
        }
        let wraps = (n - stored) / per_hp + 1;
        let idx = n - wraps * per_hp;
        Some(jobs[idx as usize].shifted(wraps * self.hyperperiod))
    }

    /// The number of jobs of the task with the given priority for which
    /// `key` lies strictly before `t`, i.e., the index of the first job
    /// with `key(job) >= t`.
    pub fn count_before<K>(&self, priority: usize, t: Instant, key: K) -> Option<u64>
    where
        K: Fn(&JobRecord) -> Instant,
    {
        self.count_where(priority, t, |job, t| key(job) < t)
    }

    /// The number of jobs of the task with the given priority for which
    /// `key` lies at or before `t`.
    pub fn count_until<K>(&self, priority: usize, t: Instant, key: K) -> Option<u64>
    where
        K: Fn(&JobRecord) -> Instant,
    {
        self.count_where(priority, t, |job, t| key(job) <= t)
    }

    // `pred` must be monotone in job order, which holds for every key
    // since jobs of one task never overtake each other.
    fn count_where<P>(&self, priority: usize, t: Instant, pred: P) -> Option<u64>
    where
        P: Fn(&JobRecord, Instant) -> bool,
    {
        let jobs = self.jobs.get(priority)?;
        let last = jobs.last()?;
        let per_hp = self.jobs_per_hyperperiod(priority);
        let (mut t, mut extra) = (t, 0);
        while pred(last, t) {
            if per_hp == 0 || (jobs.len() as u64) < per_hp || t < self.hyperperiod {
                return None;
            }
            t -= self.hyperperiod;
            extra += per_hp;
        }
        Some(jobs.partition_point(|job| pred(job, t)) as u64 + extra)
    }
}

/// The length of the interval that must be simulated so that every
/// chain analysis finds a full hyperperiod of steady-state behavior,
/// given an upper bound on the latency of any chain of interest.
pub fn scheduling_interval(ts: &TaskSet, chain_bound: Duration) -> Result<Duration, SimulationError> {
    let (hyperperiod, max_period) = periodic_parameters(ts)?;
    Ok(2 * hyperperiod + ts.max_phase() + chain_bound + max_period)
}

fn periodic_parameters(ts: &TaskSet) -> Result<(Duration, Duration), SimulationError> {
    if let Some(tsk) = ts.iter().find(|tsk| tsk.release().kind() != ReleaseKind::Periodic) {
        return Err(SimulationError::NotPeriodic { task: tsk.id() });
    }
    // a non-empty, all-periodic set has both
    let hyperperiod = ts.hyperperiod().unwrap_or(0);
    let max_period = ts.max_period().unwrap_or(0);
    Ok((hyperperiod, max_period))
}

/// Number of jobs of the lowest-priority task that must complete.
fn jobs_to_complete(ts: &TaskSet, interval: Duration) -> u64 {
    let lowest = ts.lowest_priority_task();
    divide_with_ceil(interval, lowest.min_iat()).max(1)
}

#[derive(Debug)]
struct PendingJob {
    number: u64,
    release: Instant,
    remaining: Duration,
    start: Option<Instant>,
    state: JobState,
}

/// Simulate the task set under fixed-priority preemptive scheduling,
/// with every job executing for exactly the WCET of its task, until
/// the lowest-priority task has completed enough jobs to cover
/// `interval`.
pub fn simulate(ts: &TaskSet, interval: Duration) -> Result<Schedule, SimulationError> {
    let (hyperperiod, _) = periodic_parameters(ts)?;
    let tasks = ts.tasks();
    let lowest = tasks.len() - 1;
    let target = jobs_to_complete(ts, interval);

    let mut released = vec![0u64; tasks.len()];
    let mut next_release: Vec<Instant> = tasks
        .iter()
        .map(|tsk| tsk.release().phase().unwrap_or(0))
        .collect();
    let mut pending: Vec<Option<PendingJob>> = tasks.iter().map(|_| None).collect();
    let mut jobs: Vec<Vec<JobRecord>> = vec![Vec::new(); tasks.len()];
    let mut now: Instant = 0;

    loop {
        for (prio, tsk) in tasks.iter().enumerate() {
            if next_release[prio] > now {
                continue;
            }
            if let Some(job) = &pending[prio] {
                return Err(SimulationError::Desync {
                    task: tsk.id(),
                    job: job.number,
                    at: next_release[prio],
                });
            }
            trace!(task = %tsk.id(), job = released[prio], at = now, "released");
            pending[prio] = Some(PendingJob {
                number: released[prio],
                release: next_release[prio],
                remaining: tsk.wcet(),
                start: None,
                state: JobState::Released,
            });
            released[prio] += 1;
            next_release[prio] += tsk.min_iat();
        }

        let Some(prio) = pending.iter().position(Option::is_some) else {
            // idle until the next release
            now = next_release.iter().copied().min().unwrap_or(now);
            continue;
        };
        let tsk = &tasks[prio];
        // the running job can only be disturbed by releases of tasks
        // of higher or equal priority
        let horizon = next_release[..=prio].iter().copied().min().unwrap_or(Instant::MAX);
        let Some(job) = pending[prio].as_mut() else {
            continue;
        };
        if job.state != JobState::Running {
            trace!(task = %tsk.id(), job = job.number, at = now, "dispatched");
            job.state = JobState::Running;
        }
        let start = *job.start.get_or_insert(now);
        let finish = now + job.remaining;
        if finish <= horizon {
            now = finish;
            job.state = JobState::Completed;
            trace!(task = %tsk.id(), job = job.number, at = now, "completed");
            jobs[prio].push(JobRecord::of(tsk, job.release, start, finish));
            pending[prio] = None;
            if prio == lowest && jobs[prio].len() as u64 >= target {
                break;
            }
        } else {
            job.remaining -= horizon - now;
            now = horizon;
            job.state = JobState::Preempted;
            trace!(task = %tsk.id(), job = job.number, at = now, "preempted");
        }
    }

    debug!(
        tasks = tasks.len(),
        end = now,
        jobs = jobs.iter().map(Vec::len).sum::<usize>(),
        "simulation finished"
    );
    Ok(Schedule {
        hyperperiod,
        periods: tasks.iter().map(Task::min_iat).collect(),
        jobs,
    })
}

/// The schedule of a task set whose jobs take no time at all: every
/// job starts and completes at its release. It covers the same
/// interval as [simulate] would.
pub fn zero_execution_schedule(ts: &TaskSet, interval: Duration) -> Result<Schedule, SimulationError> {
    let (hyperperiod, _) = periodic_parameters(ts)?;
    let lowest = ts.lowest_priority_task().release();
    let end = lowest
        .nth_release(jobs_to_complete(ts, interval) - 1)
        .unwrap_or(0);
    let jobs = ts
        .iter()
        .map(|tsk| {
            (0..)
                .map_while(|n| tsk.release().nth_release(n).filter(|&r| r <= end))
                .map(|release| JobRecord::of(tsk, release, release, release))
                .collect()
        })
        .collect();
    Ok(Schedule {
        hyperperiod,
        periods: ts.iter().map(Task::min_iat).collect(),
        jobs,
    })
}

/// The schedule of the task set with all execution times scaled by
/// `ratio`. A ratio of zero yields the analytic zero-execution
/// schedule without simulating.
pub fn schedule_profile(ts: &TaskSet, ratio: f64, interval: Duration) -> Result<Schedule, SimulationError> {
    if ratio <= 0.0 {
        zero_execution_schedule(ts, interval)
    } else {
        simulate(&ts.with_execution_ratio(ratio), interval)
    }
}
