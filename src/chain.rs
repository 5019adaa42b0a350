/*! Cause-effect chains.

A [CauseEffectChain] is an ordered sequence of tasks through which a
signal propagates. All tasks of a chain are drawn from one base
[TaskSet], which the chain borrows: priorities and response times are
properties of the base set, not of the chain. */

use itertools::Itertools;
use thiserror::Error;

use crate::task::{Communication, Homogeneity, ReleaseKind, Task, TaskId};
use crate::taskset::TaskSet;

/// Errors in the construction of a cause-effect chain.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ChainError {
    #[error("a cause-effect chain must contain at least one task")]
    Empty,
    #[error("task {task} is not a member of the base task set")]
    NotAMember { task: TaskId },
}

/// A non-empty sequence of tasks of one base task set.
#[derive(Debug, Clone)]
pub struct CauseEffectChain<'a> {
    base: &'a TaskSet,
    // priorities (indices into `base`) in chain order
    members: Vec<usize>,
}

impl<'a> CauseEffectChain<'a> {
    /// Create a chain of the tasks identified by `ids` (in chain
    /// order), all of which must be members of `base`.
    pub fn new(
        base: &'a TaskSet,
        ids: impl IntoIterator<Item = TaskId>,
    ) -> Result<Self, ChainError> {
        let members = ids
            .into_iter()
            .map(|id| base.priority(id).ok_or(ChainError::NotAMember { task: id }))
            .collect::<Result<Vec<_>, _>>()?;
        if members.is_empty() {
            Err(ChainError::Empty)
        } else {
            Ok(CauseEffectChain { base, members })
        }
    }

    /// The task set all tasks of the chain belong to.
    pub fn base(&self) -> &'a TaskSet {
        self.base
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always `false`: chains are never empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The tasks of the chain in chain order.
    pub fn tasks(&self) -> impl Iterator<Item = &'a Task> + '_ {
        let tasks = self.base.tasks();
        self.members.iter().map(move |&prio| &tasks[prio])
    }

    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks().map(Task::id)
    }

    /// Priorities of the tasks of the chain in chain order.
    pub fn priorities(&self) -> &[usize] {
        &self.members
    }

    pub fn first(&self) -> &'a Task {
        &self.base.tasks()[self.members[0]]
    }

    pub fn last(&self) -> &'a Task {
        &self.base.tasks()[self.members[self.members.len() - 1]]
    }

    /// All pairs of consecutive tasks, i.e., every point at which data
    /// is handed from one task to the next.
    pub fn links(&self) -> impl Iterator<Item = (&'a Task, &'a Task)> + '_ {
        self.tasks().tuple_windows()
    }

    /// The same tasks in reverse order.
    pub fn reversed(&self) -> Self {
        CauseEffectChain {
            base: self.base,
            members: self.members.iter().rev().copied().collect(),
        }
    }

    /// Cut the chain into maximal contiguous runs of tasks that agree
    /// on `key`. Cutting a chain that is homogeneous with respect to
    /// `key` yields the chain itself.
    pub fn cut_by<K, F>(&self, mut key: F) -> Vec<Self>
    where
        K: PartialEq,
        F: FnMut(&Task) -> K,
    {
        let tasks = self.base.tasks();
        let groups = self
            .members
            .iter()
            .group_by(|&&prio| key(&tasks[prio]));
        let mut runs = Vec::new();
        for (_, run) in &groups {
            runs.push(CauseEffectChain {
                base: self.base,
                members: run.copied().collect(),
            });
        }
        runs
    }

    /// Cut the chain wherever the communication policy or the kind of
    /// release pattern changes.
    pub fn cut(&self) -> Vec<Self> {
        self.cut_by(|tsk| (tsk.communication(), tsk.release().kind()))
    }

    /// Cut the chain wherever the kind of release pattern changes.
    pub fn cut_by_release(&self) -> Vec<Self> {
        self.cut_by(|tsk| tsk.release().kind())
    }

    pub fn communication(&self) -> Homogeneity<Communication> {
        Homogeneity::of(self.tasks().map(Task::communication)).unwrap_or(Homogeneity::Mixed)
    }

    pub fn release_kind(&self) -> Homogeneity<ReleaseKind> {
        Homogeneity::of(self.tasks().map(|tsk| tsk.release().kind())).unwrap_or(Homogeneity::Mixed)
    }
}

impl PartialEq for CauseEffectChain<'_> {
    /// Two chains are equal if they consist of the same tasks of the
    /// same base set in the same order.
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.base, other.base) && self.members == other.members
    }
}
