/*! Task sets under fixed-priority scheduling.

A [TaskSet] is an ordered sequence of tasks in which the order *is*
the priority order: the task at index 0 has the highest priority.
Priorities are therefore unique. The set caches the worst-case
response times computed by the response-time analysis (see
[compute_response_times](TaskSet::compute_response_times)). */

use std::collections::HashMap;

use thiserror::Error;

use crate::task::{Communication, ConstraintViolation, Homogeneity, ReleaseKind, Task, TaskId};
use crate::time::{lcm, Duration, Instant};

/// Errors in the construction of a task set.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ModelError {
    #[error("a task set must contain at least one task")]
    EmptyTaskSet,
    #[error("task {task} appears more than once")]
    DuplicateTask { task: TaskId },
    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),
}

/// An ordered, non-empty collection of tasks sharing one processor.
#[derive(Debug, Clone)]
pub struct TaskSet {
    tasks: Vec<Task>,
    index: HashMap<TaskId, usize>,
    pub(crate) response_times: Vec<Option<Duration>>,
}

impl TaskSet {
    /// Create a task set from tasks given in decreasing priority order.
    pub fn new(tasks: Vec<Task>) -> Result<Self, ModelError> {
        if tasks.is_empty() {
            return Err(ModelError::EmptyTaskSet);
        }
        let mut index = HashMap::with_capacity(tasks.len());
        for (prio, tsk) in tasks.iter().enumerate() {
            if index.insert(tsk.id(), prio).is_some() {
                return Err(ModelError::DuplicateTask { task: tsk.id() });
            }
        }
        let response_times = vec![None; tasks.len()];
        Ok(TaskSet {
            tasks,
            index,
            response_times,
        })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Always `false`: task sets are never empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter()
    }

    /// All tasks in decreasing priority order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The task with the given priority (index).
    pub fn get(&self, priority: usize) -> Option<&Task> {
        self.tasks.get(priority)
    }

    /// Look up a task by its identity.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.priority(id).map(|prio| &self.tasks[prio])
    }

    /// The priority of a task, i.e., its index in the set. Numerically
    /// smaller values denote higher priorities.
    pub fn priority(&self, id: TaskId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.index.contains_key(&id)
    }

    /// Does task `a` have strictly higher priority than task `b`?
    /// Tasks that are not members of the set have no priority.
    pub fn has_higher_priority(&self, a: TaskId, b: TaskId) -> bool {
        match (self.priority(a), self.priority(b)) {
            (Some(pa), Some(pb)) => pa < pb,
            _ => false,
        }
    }

    /// The task with the lowest priority.
    pub fn lowest_priority_task(&self) -> &Task {
        &self.tasks[self.tasks.len() - 1]
    }

    /// Total utilization, i.e., the sum of `wcet / min_iat` over all tasks.
    pub fn utilization(&self) -> f64 {
        self.tasks.iter().map(Task::utilization).sum()
    }

    /// Least common multiple of the periods of all periodic tasks, or
    /// `None` if no task is periodic.
    pub fn hyperperiod(&self) -> Option<Duration> {
        self.periods().reduce(lcm)
    }

    /// The largest phase of any periodic task (zero if there is none).
    pub fn max_phase(&self) -> Instant {
        self.tasks
            .iter()
            .filter_map(|tsk| tsk.release().phase())
            .max()
            .unwrap_or(0)
    }

    /// The largest period of any periodic task.
    pub fn max_period(&self) -> Option<Duration> {
        self.periods().max()
    }

    /// The number of distinct periods among the periodic tasks.
    pub fn distinct_periods(&self) -> usize {
        let mut periods: Vec<_> = self.periods().collect();
        periods.sort_unstable();
        periods.dedup();
        periods.len()
    }

    fn periods(&self) -> impl Iterator<Item = Duration> + '_ {
        self.tasks.iter().filter_map(|tsk| tsk.release().period())
    }

    /// Do all tasks share one communication policy?
    pub fn communication(&self) -> Homogeneity<Communication> {
        Homogeneity::of(self.tasks.iter().map(Task::communication)).unwrap_or(Homogeneity::Mixed)
    }

    /// Do all tasks share one kind of release pattern?
    pub fn release_kind(&self) -> Homogeneity<ReleaseKind> {
        Homogeneity::of(self.tasks.iter().map(|tsk| tsk.release().kind()))
            .unwrap_or(Homogeneity::Mixed)
    }

    /// The cached worst-case response time of a task, if the
    /// response-time analysis has been run on this set.
    pub fn response_time(&self, id: TaskId) -> Option<Duration> {
        self.priority(id).and_then(|prio| self.response_times[prio])
    }

    /// Have the response times of all tasks been computed?
    pub fn has_response_times(&self) -> bool {
        self.response_times.iter().all(Option::is_some)
    }

    /// A copy of this set in which every task has been replaced by
    /// `f(task)`. Priorities are preserved; cached response times
    /// are not, since they may no longer be valid.
    pub fn map_tasks<F>(&self, f: F) -> Result<Self, ModelError>
    where
        F: FnMut(&Task) -> Result<Task, ConstraintViolation>,
    {
        let tasks = self.tasks.iter().map(f).collect::<Result<Vec<_>, _>>()?;
        TaskSet::new(tasks)
    }

    /// A copy of this set with all time-valued parameters multiplied
    /// by `factor`.
    pub fn scaled(&self, factor: u64) -> Self {
        self.with_tasks(self.tasks.iter().map(|tsk| tsk.scaled(factor)).collect())
    }

    /// A copy of this set in which both execution-time bounds of
    /// every task are scaled by `ratio` (rounding up).
    pub fn with_execution_ratio(&self, ratio: f64) -> Self {
        self.with_tasks(
            self.tasks
                .iter()
                .map(|tsk| tsk.with_execution(tsk.execution().with_ratio(ratio)))
                .collect(),
        )
    }

    // Same identities in the same order, so the index can be reused.
    fn with_tasks(&self, tasks: Vec<Task>) -> Self {
        debug_assert!(tasks.iter().map(Task::id).eq(self.tasks.iter().map(Task::id)));
        TaskSet {
            tasks,
            index: self.index.clone(),
            response_times: vec![None; self.tasks.len()],
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;
    use crate::tests::{periodic, sporadic};

    fn example() -> TaskSet {
        TaskSet::new(vec![
            periodic(1, 10, 1, 1),
            periodic(2, 20, 10, 2),
            periodic(3, 50, 5, 5),
        ])
        .unwrap()
    }

    #[test]
    fn order_is_priority() {
        let ts = example();
        assert_eq!(ts.priority(TaskId(1)), Some(0));
        assert_eq!(ts.priority(TaskId(3)), Some(2));
        assert_eq!(ts.priority(TaskId(4)), None);
        assert!(ts.has_higher_priority(TaskId(1), TaskId(2)));
        assert!(!ts.has_higher_priority(TaskId(2), TaskId(1)));
        assert!(!ts.has_higher_priority(TaskId(2), TaskId(2)));
        assert_eq!(ts.lowest_priority_task().id(), TaskId(3));
    }

    #[test]
    fn derived_properties() {
        let ts = example();
        assert_eq!(ts.hyperperiod(), Some(100));
        assert_eq!(ts.max_phase(), 10);
        assert_eq!(ts.max_period(), Some(50));
        assert_eq!(ts.distinct_periods(), 3);
        assert_approx_eq!(ts.utilization(), 0.3);
        assert_eq!(ts.communication(), Homogeneity::Uniform(Communication::Implicit));
        assert_eq!(ts.release_kind(), Homogeneity::Uniform(ReleaseKind::Periodic));
    }

    #[test]
    fn sporadic_tasks_have_no_hyperperiod() {
        let ts = TaskSet::new(vec![sporadic(1, 10, 20, 1)]).unwrap();
        assert_eq!(ts.hyperperiod(), None);
        assert_eq!(ts.max_phase(), 0);
        let ts = TaskSet::new(vec![sporadic(1, 10, 20, 1), periodic(2, 30, 0, 1)]).unwrap();
        assert_eq!(ts.hyperperiod(), Some(30));
        assert_eq!(ts.release_kind(), Homogeneity::Mixed);
    }

    #[test]
    fn rejects_invalid_sets() {
        assert_eq!(TaskSet::new(vec![]).unwrap_err(), ModelError::EmptyTaskSet);
        assert_eq!(
            TaskSet::new(vec![periodic(1, 10, 0, 1), periodic(1, 20, 0, 1)]).unwrap_err(),
            ModelError::DuplicateTask { task: TaskId(1) }
        );
    }

    #[test]
    fn copies_do_not_touch_the_original() {
        let ts = example();
        let let_ts = ts
            .map_tasks(|tsk| Ok(tsk.with_communication(Communication::Let)))
            .unwrap();
        assert_eq!(let_ts.communication(), Homogeneity::Uniform(Communication::Let));
        assert_eq!(ts.communication(), Homogeneity::Uniform(Communication::Implicit));

        let half = ts.with_execution_ratio(0.5);
        assert_eq!(half.get(2).unwrap().wcet(), 3);
        assert_eq!(ts.get(2).unwrap().wcet(), 5);

        let big = ts.scaled(1000);
        assert_eq!(big.hyperperiod(), Some(100_000));
        assert_eq!(big.max_phase(), 10_000);
        assert_eq!(big.priority(TaskId(2)), Some(1));
    }
}
