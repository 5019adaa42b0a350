/*! Randomized scenario perturbation.

A [Perturbation] turns one base task set into a scenario in which some
tasks communicate with LET semantics and some periodic tasks are
released sporadically instead. The base set is never modified: every
scenario is a copy. The random number generator is owned by the
caller, so that the same generator state always yields the same
scenario. */

use rand::Rng;

use crate::task::{Communication, ConstraintViolation, Release, Task};
use crate::taskset::{ModelError, TaskSet};

/// Probabilities with which individual tasks are perturbed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perturbation {
    /// Probability that a task switches to LET communication.
    pub let_probability: f64,
    /// Probability that a periodic task is released sporadically.
    pub sporadic_probability: f64,
    /// A sporadic replacement of a periodic task with period `p` has
    /// `min_iat = p` and `max_iat = ceil(p * (1 + jitter))`.
    pub jitter: f64,
}

impl Default for Perturbation {
    fn default() -> Self {
        Perturbation {
            let_probability: 0.5,
            sporadic_probability: 0.5,
            jitter: 0.5,
        }
    }
}

impl Perturbation {
    /// A perturbed copy of `base`.
    pub fn apply<R: Rng>(&self, base: &TaskSet, rng: &mut R) -> Result<TaskSet, ModelError> {
        base.map_tasks(|tsk| self.perturb_task(tsk, rng))
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    fn perturb_task<R: Rng>(
        &self,
        tsk: &Task,
        rng: &mut R,
    ) -> Result<Task, ConstraintViolation> {
        // draw both decisions for every task so that the random stream
        // does not depend on the task parameters
        let to_let = rng.gen_bool(self.let_probability);
        let to_sporadic = rng.gen_bool(self.sporadic_probability);

        let tsk = if to_let {
            tsk.with_communication(Communication::Let)
        } else {
            tsk.clone()
        };
        match *tsk.release() {
            Release::Periodic { period, .. } if to_sporadic => {
                let max_iat = (period as f64 * (1.0 + self.jitter)).ceil() as u64;
                tsk.with_release(Release::Sporadic {
                    min_iat: period,
                    max_iat: max_iat.max(period),
                })
            }
            _ => Ok(tsk),
        }
    }
}
