/*! Parallel evaluation of many analysis units.

The pipeline has two phases separated by a barrier:

1. Every [Unit] is prepared independently: its task set is optionally
   perturbed, its response times are computed and, if all of its tasks
   are periodic, it is simulated with the worst-case and every
   configured best-case execution-time profile. A unit that fails here
   is dropped as a whole.
2. Every chain of every prepared unit is analyzed independently. A
   failing chain does not affect any other chain.

Both phases run on the `rayon` thread pool. All results carry explicit
keys; nothing depends on the order in which they are produced. */

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::iter::Either;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::chain::CauseEffectChain;
use crate::config::AnalysisConfig;
use crate::e2e::exact::ExactAnalysis;
use crate::e2e::{mixed, sporadic, AnalysisError};
use crate::fixed_priority::Unschedulable;
use crate::simulator::{schedule_profile, scheduling_interval, simulate, Schedule, SimulationError};
use crate::source::{SetKey, Unit};
use crate::task::{Communication, Homogeneity, ReleaseKind, TaskId};
use crate::taskset::{ModelError, TaskSet};
use crate::time::Duration;

/// Reasons for dropping a whole unit.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UnitError {
    #[error("perturbation failed: {0}")]
    Model(#[from] ModelError),
    #[error(transparent)]
    Unschedulable(#[from] Unschedulable),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// Identifies one chain of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainKey {
    pub set: SetKey,
    /// Position of the chain in its unit.
    pub chain: usize,
}

/// Exact bounds for one best-case profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExactBound {
    pub bcet_ratio: f64,
    pub reaction_time: Duration,
    pub data_age: Duration,
}

/// All bounds computed for one chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainReport {
    /// Only for chains with implicit communication throughout.
    pub davare: Option<Duration>,
    pub cut_based: Duration,
    pub principle_based: Duration,
    /// Only for periodic chains with implicit communication.
    pub exact: Vec<ExactBound>,
}

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub dropped: Vec<(SetKey, UnitError)>,
    pub chains: Vec<(ChainKey, Result<ChainReport, AnalysisError>)>,
}

impl BatchResult {
    /// The reports of all successfully analyzed chains.
    pub fn reports(&self) -> impl Iterator<Item = (&ChainKey, &ChainReport)> + '_ {
        self.chains
            .iter()
            .filter_map(|(key, res)| res.as_ref().ok().map(|rep| (key, rep)))
    }
}

struct Schedules {
    worst: Schedule,
    best: Vec<(f64, Schedule)>,
}

struct Prepared {
    key: SetKey,
    taskset: TaskSet,
    chains: Vec<Vec<TaskId>>,
    schedules: Option<Schedules>,
}

/// Analyze all chains of all units.
pub fn run(units: Vec<Unit>, config: &AnalysisConfig) -> BatchResult {
    let total = units.len();
    let (prepared, dropped): (Vec<_>, Vec<_>) = units
        .into_par_iter()
        .map(|unit| {
            let key = unit.key;
            prepare(unit, config).map_err(|err| (key, err))
        })
        .partition_map(|res| match res {
            Ok(unit) => Either::Left(unit),
            Err(failure) => Either::Right(failure),
        });
    for (key, err) in &dropped {
        warn!(%key, %err, "dropping task set");
    }

    let chains: Vec<_> = prepared
        .par_iter()
        .flat_map_iter(|unit| {
            unit.chains.iter().enumerate().map(move |(idx, ids)| {
                let key = ChainKey {
                    set: unit.key,
                    chain: idx,
                };
                (key, analyze_chain(unit, ids, config))
            })
        })
        .collect();
    for (key, res) in &chains {
        if let Err(err) = res {
            warn!(set = %key.set, chain = key.chain, %err, "chain analysis failed");
        }
    }

    info!(
        units = total,
        dropped = dropped.len(),
        chains = chains.len(),
        failed = chains.iter().filter(|(_, res)| res.is_err()).count(),
        "batch finished"
    );
    BatchResult { dropped, chains }
}

fn prepare(unit: Unit, config: &AnalysisConfig) -> Result<Prepared, UnitError> {
    let Unit {
        key,
        taskset,
        chains,
    } = unit;
    let mut taskset = match &config.perturbation {
        Some(perturbation) => {
            let mut rng = StdRng::seed_from_u64(key.seed(config.seed));
            perturbation.apply(&taskset, &mut rng)?
        }
        None => taskset,
    };
    taskset.compute_response_times()?;

    let schedules = match taskset.release_kind() {
        Homogeneity::Uniform(ReleaseKind::Periodic) => Some(simulate_profiles(&taskset, &chains, config)?),
        _ => None,
    };
    debug!(%key, tasks = taskset.len(), chains = chains.len(), simulated = schedules.is_some(), "unit prepared");
    Ok(Prepared {
        key,
        taskset,
        chains,
        schedules,
    })
}

fn simulate_profiles(
    ts: &TaskSet,
    chains: &[Vec<TaskId>],
    config: &AnalysisConfig,
) -> Result<Schedules, SimulationError> {
    // chains that cannot be bounded fail again, with context, later on
    let margin = chains
        .iter()
        .filter_map(|ids| {
            let chain = CauseEffectChain::new(ts, ids.iter().copied()).ok()?;
            mixed::principle_based(&chain).ok()
        })
        .max()
        .unwrap_or(0);
    let interval = scheduling_interval(ts, margin)?;
    let worst = simulate(ts, interval)?;
    let best = config
        .bcet_ratios
        .iter()
        .map(|&ratio| schedule_profile(ts, ratio, interval).map(|sched| (ratio, sched)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Schedules { worst, best })
}

fn analyze_chain(
    unit: &Prepared,
    ids: &[TaskId],
    config: &AnalysisConfig,
) -> Result<ChainReport, AnalysisError> {
    let chain = CauseEffectChain::new(&unit.taskset, ids.iter().copied())?;
    let implicit = chain.communication() == Homogeneity::Uniform(Communication::Implicit);
    let davare = if implicit {
        Some(sporadic::davare(&chain)?)
    } else {
        None
    };
    let exact = match &unit.schedules {
        Some(schedules) if implicit => schedules
            .best
            .iter()
            .map(|(ratio, best)| -> Result<ExactBound, AnalysisError> {
                let exact = ExactAnalysis::new(&schedules.worst, best, config.exact_hyperperiods);
                Ok(ExactBound {
                    bcet_ratio: *ratio,
                    reaction_time: exact.reaction_time(&chain)?,
                    data_age: exact.data_age(&chain)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => Vec::new(),
    };
    Ok(ChainReport {
        davare,
        cut_based: mixed::cut_based(&chain, &config.cut_registry)?,
        principle_based: mixed::principle_based(&chain)?,
        exact,
    })
}
