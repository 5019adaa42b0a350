/*! Sources of analysis units.

Task sets and cause-effect chains are produced by generators outside of
this crate (e.g., benchmark-based task-set generation and random chain
sampling). This module fixes their interfaces and the loop that turns
them into keyed [Unit]s for the [batch](crate::batch) pipeline. */

use derive_more::Display;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::task::TaskId;
use crate::taskset::{ModelError, TaskSet};

/// Chains are only sampled from task sets with at least this many
/// distinct periods.
pub const MIN_DISTINCT_PERIODS: usize = 3;

/// Failures of task-set generation.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GenerationError {
    #[error("utilization {target} not reached within {attempts} attempts")]
    UtilizationUnreachable { target: f64, attempts: usize },
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Identifies one task set of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display(fmt = "{}/U{}%/#{}", generator, utilization, run)]
pub struct SetKey {
    /// Kind of generator that produced the set.
    pub generator: &'static str,
    /// Target utilization in percent.
    pub utilization: u32,
    pub run: u32,
}

impl SetKey {
    /// A seed for randomness specific to this set, derived from a base
    /// seed. Equal keys always yield equal seeds.
    pub fn seed(&self, base: u64) -> u64 {
        let mut seed = base ^ 0xcbf2_9ce4_8422_2325;
        for byte in self
            .generator
            .bytes()
            .chain(self.utilization.to_le_bytes())
            .chain(self.run.to_le_bytes())
        {
            seed = (seed ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3);
        }
        seed
    }
}

/// A task set together with the chains to analyze on it. Chains are
/// given as sequences of task identities so that the unit owns all of
/// its data.
#[derive(Debug, Clone)]
pub struct Unit {
    pub key: SetKey,
    pub taskset: TaskSet,
    pub chains: Vec<Vec<TaskId>>,
}

/// Produces task sets with a given utilization.
pub trait TaskSetGenerator {
    /// Short name of the generator, used in [SetKey]s.
    fn kind(&self) -> &'static str;

    /// One attempt at generating a task set whose utilization matches
    /// `utilization` within the generator's tolerance. `Ok(None)`
    /// signals a miss.
    fn attempt<R: Rng>(&self, utilization: f64, rng: &mut R) -> Result<Option<TaskSet>, ModelError>;
}

/// Samples cause-effect chains from a task set.
pub trait ChainGenerator {
    fn chains<R: Rng>(&self, ts: &TaskSet, rng: &mut R) -> Vec<Vec<TaskId>>;
}

/// Call `generator` until it hits the target utilization, giving up
/// after `max_attempts` attempts.
pub fn generate_taskset<G, R>(
    generator: &G,
    utilization: f64,
    max_attempts: usize,
    rng: &mut R,
) -> Result<TaskSet, GenerationError>
where
    G: TaskSetGenerator,
    R: Rng,
{
    for _ in 0..max_attempts {
        if let Some(ts) = generator.attempt(utilization, rng)? {
            return Ok(ts);
        }
    }
    Err(GenerationError::UtilizationUnreachable {
        target: utilization,
        attempts: max_attempts,
    })
}

/// Generate `runs` units for every utilization (in percent). Task sets
/// that cannot be generated and task sets with too few distinct
/// periods are skipped.
pub fn generate_units<G, C, R>(
    tasksets: &G,
    chains: &C,
    utilizations: &[u32],
    runs: u32,
    max_attempts: usize,
    rng: &mut R,
) -> Vec<Unit>
where
    G: TaskSetGenerator,
    C: ChainGenerator,
    R: Rng,
{
    let mut units = Vec::new();
    for &utilization in utilizations {
        for run in 0..runs {
            let key = SetKey {
                generator: tasksets.kind(),
                utilization,
                run,
            };
            let target = f64::from(utilization) / 100.0;
            let taskset = match generate_taskset(tasksets, target, max_attempts, rng) {
                Ok(ts) => ts,
                Err(err) => {
                    warn!(%key, %err, "task set generation failed");
                    continue;
                }
            };
            if taskset.distinct_periods() < MIN_DISTINCT_PERIODS {
                debug!(%key, periods = taskset.distinct_periods(), "too few distinct periods");
                continue;
            }
            let chains = chains.chains(&taskset, rng);
            units.push(Unit {
                key,
                taskset,
                chains,
            });
        }
    }
    units
}
