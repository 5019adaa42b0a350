/*! The task model.

A [Task] is described by four orthogonal features, each a closed sum
type:

- its [Release] pattern (sporadic or periodic),
- its [Deadline] (arbitrary, constrained, or implicit),
- its [Execution] time bounds (best case and worst case), and
- its [Communication] policy (implicit or LET).

All invariants relating these features are checked when a task is
constructed; a task that exists is always valid. Tasks never change
after construction. Scenario-specific variants are obtained through
the `with_*` methods, which return modified copies. */

use derive_more::{Display, From, Into};
use thiserror::Error;

use crate::time::{divide_with_ceil, Duration, Instant, Time};

/// Identity of a task. Identities are stable across copies of a task,
/// so that analyses can refer to "the same" task in different
/// scenarios of one base task set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display(fmt = "T{}", _0)]
pub struct TaskId(pub u32);

/// Violations of the invariants of the task model. These are always
/// fatal at construction time.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum ConstraintViolation {
    /// Inter-arrival times (and periods) must be strictly positive.
    #[error("inter-arrival times must be positive (min {min_iat}, max {max_iat})")]
    ZeroInterArrival { min_iat: Duration, max_iat: Duration },
    /// The minimum inter-arrival time must not exceed the maximum one.
    #[error("minimum inter-arrival time {min_iat} exceeds maximum inter-arrival time {max_iat}")]
    InterArrivalOrder { min_iat: Duration, max_iat: Duration },
    /// The best-case execution time must not exceed the worst case.
    #[error("bcet {bcet} exceeds wcet {wcet}")]
    ExecutionOrder { bcet: Duration, wcet: Duration },
    /// A constrained deadline must not exceed the minimum inter-arrival time.
    #[error("constrained deadline {deadline} exceeds minimum inter-arrival time {min_iat}")]
    DeadlineExceedsInterArrival { deadline: Duration, min_iat: Duration },
    #[error("task {task} has no release pattern")]
    MissingRelease { task: TaskId },
    #[error("task {task} has no execution-time bounds")]
    MissingExecution { task: TaskId },
}

/// Coarse classification of release patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ReleaseKind {
    #[display(fmt = "sporadic")]
    Sporadic,
    #[display(fmt = "periodic")]
    Periodic,
}

/// The release pattern of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Consecutive releases are separated by at least `min_iat` and
    /// at most `max_iat` time units.
    Sporadic { min_iat: Duration, max_iat: Duration },
    /// The `n`-th job (counting from zero) is released at exactly
    /// `phase + n * period`.
    Periodic { period: Duration, phase: Instant },
}

impl Release {
    /// Minimum separation of two consecutive releases.
    pub fn min_iat(&self) -> Duration {
        match *self {
            Release::Sporadic { min_iat, .. } => min_iat,
            Release::Periodic { period, .. } => period,
        }
    }

    /// Maximum separation of two consecutive releases.
    pub fn max_iat(&self) -> Duration {
        match *self {
            Release::Sporadic { max_iat, .. } => max_iat,
            Release::Periodic { period, .. } => period,
        }
    }

    pub fn kind(&self) -> ReleaseKind {
        match self {
            Release::Sporadic { .. } => ReleaseKind::Sporadic,
            Release::Periodic { .. } => ReleaseKind::Periodic,
        }
    }

    /// The period, if the release pattern is periodic.
    pub fn period(&self) -> Option<Duration> {
        match *self {
            Release::Periodic { period, .. } => Some(period),
            Release::Sporadic { .. } => None,
        }
    }

    /// The phase (offset of the first release), if the release
    /// pattern is periodic.
    pub fn phase(&self) -> Option<Instant> {
        match *self {
            Release::Periodic { phase, .. } => Some(phase),
            Release::Sporadic { .. } => None,
        }
    }

    /// Release time of the `n`-th job (first job: `n = 0`) of a
    /// periodic release pattern.
    pub fn nth_release(&self, n: u64) -> Option<Instant> {
        match *self {
            Release::Periodic { period, phase } => Some(phase + n * period),
            Release::Sporadic { .. } => None,
        }
    }

    /// The earliest release at or after `t` of a periodic release
    /// pattern. Instants before the first release map to the first
    /// release.
    pub fn release_at_or_after(&self, t: Instant) -> Option<Instant> {
        match *self {
            Release::Periodic { phase, .. } if t <= phase => Some(phase),
            Release::Periodic { period, phase } => {
                Some(phase + divide_with_ceil(t - phase, period) * period)
            }
            Release::Sporadic { .. } => None,
        }
    }

    fn validate(&self) -> Result<(), ConstraintViolation> {
        let (min_iat, max_iat) = (self.min_iat(), self.max_iat());
        if min_iat == 0 || max_iat == 0 {
            Err(ConstraintViolation::ZeroInterArrival { min_iat, max_iat })
        } else if min_iat > max_iat {
            Err(ConstraintViolation::InterArrivalOrder { min_iat, max_iat })
        } else {
            Ok(())
        }
    }

    fn scaled(&self, factor: u64) -> Self {
        match *self {
            Release::Sporadic { min_iat, max_iat } => Release::Sporadic {
                min_iat: min_iat * factor,
                max_iat: max_iat * factor,
            },
            Release::Periodic { period, phase } => Release::Periodic {
                period: period * factor,
                phase: phase * factor,
            },
        }
    }
}

/// The relative deadline of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Any relative deadline.
    Arbitrary(Duration),
    /// A relative deadline no larger than the minimum inter-arrival time.
    Constrained(Duration),
    /// The relative deadline equals the minimum inter-arrival time.
    /// The value is derived from the release pattern, never stored.
    Implicit,
}

impl Deadline {
    /// The value of the deadline for a task with the given release pattern.
    pub fn value(&self, release: &Release) -> Duration {
        match *self {
            Deadline::Arbitrary(dl) | Deadline::Constrained(dl) => dl,
            Deadline::Implicit => release.min_iat(),
        }
    }

    fn validate(&self, release: &Release) -> Result<(), ConstraintViolation> {
        match *self {
            Deadline::Constrained(deadline) if deadline > release.min_iat() => {
                Err(ConstraintViolation::DeadlineExceedsInterArrival {
                    deadline,
                    min_iat: release.min_iat(),
                })
            }
            _ => Ok(()),
        }
    }

    fn scaled(&self, factor: u64) -> Self {
        match *self {
            Deadline::Arbitrary(dl) => Deadline::Arbitrary(dl * factor),
            Deadline::Constrained(dl) => Deadline::Constrained(dl * factor),
            Deadline::Implicit => Deadline::Implicit,
        }
    }
}

/// Best-case and worst-case execution time of every job of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execution {
    bcet: Duration,
    wcet: Duration,
}

impl Execution {
    pub fn new(bcet: Duration, wcet: Duration) -> Result<Self, ConstraintViolation> {
        if bcet > wcet {
            Err(ConstraintViolation::ExecutionOrder { bcet, wcet })
        } else {
            Ok(Execution { bcet, wcet })
        }
    }

    /// Execution time bounds of a task whose jobs always take `wcet`.
    pub fn exact(wcet: Duration) -> Self {
        Execution { bcet: wcet, wcet }
    }

    pub fn bcet(&self) -> Duration {
        self.bcet
    }

    pub fn wcet(&self) -> Duration {
        self.wcet
    }

    /// Scale both bounds by `ratio`, rounding up, so that a non-zero
    /// bound never becomes zero for a positive ratio.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    pub fn with_ratio(&self, ratio: f64) -> Self {
        debug_assert!(ratio >= 0.0);
        let scale = |x: Duration| (ratio * x as f64).ceil() as Time;
        Execution {
            bcet: scale(self.bcet),
            wcet: scale(self.wcet),
        }
    }
}

/// Communication policy of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Communication {
    /// Inputs are read when a job starts, outputs are written when it
    /// completes.
    #[display(fmt = "implicit")]
    Implicit,
    /// Logical execution time: inputs are read at the release,
    /// outputs are written at the absolute deadline.
    #[display(fmt = "LET")]
    Let,
}

/// A single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    release: Release,
    deadline: Deadline,
    execution: Execution,
    communication: Communication,
}

impl Task {
    /// Construct a task, checking all invariants of the task model.
    pub fn new(
        id: TaskId,
        release: Release,
        deadline: Deadline,
        execution: Execution,
        communication: Communication,
    ) -> Result<Self, ConstraintViolation> {
        release.validate()?;
        deadline.validate(&release)?;
        Ok(Task {
            id,
            release,
            deadline,
            execution,
            communication,
        })
    }

    /// Start building a task with the given identity.
    pub fn builder(id: u32) -> TaskBuilder {
        TaskBuilder::new(TaskId(id))
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn release(&self) -> &Release {
        &self.release
    }

    pub fn deadline_model(&self) -> &Deadline {
        &self.deadline
    }

    /// The relative deadline of the task.
    pub fn deadline(&self) -> Duration {
        self.deadline.value(&self.release)
    }

    pub fn execution(&self) -> &Execution {
        &self.execution
    }

    pub fn communication(&self) -> Communication {
        self.communication
    }

    pub fn min_iat(&self) -> Duration {
        self.release.min_iat()
    }

    pub fn max_iat(&self) -> Duration {
        self.release.max_iat()
    }

    pub fn bcet(&self) -> Duration {
        self.execution.bcet
    }

    pub fn wcet(&self) -> Duration {
        self.execution.wcet
    }

    /// The share of processor time the task may claim in the long run.
    #[allow(clippy::cast_precision_loss)]
    pub fn utilization(&self) -> f64 {
        self.wcet() as f64 / self.min_iat() as f64
    }

    /// A copy of this task with a different release pattern.
    pub fn with_release(&self, release: Release) -> Result<Self, ConstraintViolation> {
        Task::new(
            self.id,
            release,
            self.deadline,
            self.execution,
            self.communication,
        )
    }

    /// A copy of this task with a different deadline.
    pub fn with_deadline(&self, deadline: Deadline) -> Result<Self, ConstraintViolation> {
        Task::new(
            self.id,
            self.release,
            deadline,
            self.execution,
            self.communication,
        )
    }

    /// A copy of this task with a different communication policy.
    pub fn with_communication(&self, communication: Communication) -> Self {
        Task {
            communication,
            ..self.clone()
        }
    }

    /// A copy of this task with different execution-time bounds.
    pub fn with_execution(&self, execution: Execution) -> Self {
        Task {
            execution,
            ..self.clone()
        }
    }

    /// A copy of this task with all time-valued parameters multiplied
    /// by `factor`.
    pub fn scaled(&self, factor: u64) -> Self {
        Task {
            release: self.release.scaled(factor),
            deadline: self.deadline.scaled(factor),
            execution: Execution {
                bcet: self.execution.bcet * factor,
                wcet: self.execution.wcet * factor,
            },
            ..self.clone()
        }
    }
}

/// Incremental construction of a [Task]. Release pattern and
/// execution time are mandatory; the deadline defaults to
/// [Deadline::Implicit] and the communication policy to
/// [Communication::Implicit].
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    id: TaskId,
    release: Option<Release>,
    deadline: Deadline,
    bcet: Option<Duration>,
    wcet: Option<Duration>,
    communication: Communication,
}

impl TaskBuilder {
    fn new(id: TaskId) -> Self {
        TaskBuilder {
            id,
            release: None,
            deadline: Deadline::Implicit,
            bcet: None,
            wcet: None,
            communication: Communication::Implicit,
        }
    }

    pub fn periodic(mut self, period: Duration, phase: Instant) -> Self {
        self.release = Some(Release::Periodic { period, phase });
        self
    }

    pub fn sporadic(mut self, min_iat: Duration, max_iat: Duration) -> Self {
        self.release = Some(Release::Sporadic { min_iat, max_iat });
        self
    }

    pub fn release(mut self, release: Release) -> Self {
        self.release = Some(release);
        self
    }

    pub fn deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set the worst-case execution time. Unless set separately, the
    /// best-case execution time equals the worst case.
    pub fn wcet(mut self, wcet: Duration) -> Self {
        self.wcet = Some(wcet);
        self
    }

    pub fn bcet(mut self, bcet: Duration) -> Self {
        self.bcet = Some(bcet);
        self
    }

    pub fn communication(mut self, communication: Communication) -> Self {
        self.communication = communication;
        self
    }

    pub fn implicit_communication(self) -> Self {
        self.communication(Communication::Implicit)
    }

    pub fn let_communication(self) -> Self {
        self.communication(Communication::Let)
    }

    pub fn build(self) -> Result<Task, ConstraintViolation> {
        let release = self
            .release
            .ok_or(ConstraintViolation::MissingRelease { task: self.id })?;
        let wcet = self
            .wcet
            .ok_or(ConstraintViolation::MissingExecution { task: self.id })?;
        let execution = Execution::new(self.bcet.unwrap_or(wcet), wcet)?;
        Task::new(
            self.id,
            release,
            self.deadline,
            execution,
            self.communication,
        )
    }
}

/// Whether a feature takes the same value across a collection of tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Homogeneity<T> {
    Uniform(T),
    Mixed,
}

impl<T: PartialEq> Homogeneity<T> {
    /// Classify a sequence of feature values. Returns `None` for an
    /// empty sequence.
    pub fn of(values: impl IntoIterator<Item = T>) -> Option<Self> {
        let mut values = values.into_iter();
        let first = values.next()?;
        if values.all(|v| v == first) {
            Some(Homogeneity::Uniform(first))
        } else {
            Some(Homogeneity::Mixed)
        }
    }
}

#[cfg(test)]
mod tests;
