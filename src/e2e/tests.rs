use crate::chain::CauseEffectChain;
use crate::e2e::exact::{ExactAnalysis, DEFAULT_HYPERPERIODS};
use crate::e2e::mixed::{cut_based, principle_based, CutRegistry};
use crate::e2e::periodic::{kloda, let_periodic};
use crate::e2e::sporadic::{davare, duerr, let_sporadic};
use crate::e2e::{AnalysisError, ClosedForm};
use crate::simulator::{schedule_profile, scheduling_interval, simulate};
use crate::task::{Communication, ReleaseKind, TaskId};
use crate::taskset::TaskSet;

use crate::tests::{let_task, periodic, sporadic};

fn analyzed(tasks: Vec<crate::task::Task>) -> TaskSet {
    let mut ts = TaskSet::new(tasks).unwrap();
    ts.compute_response_times().unwrap();
    ts
}

fn chain<'a>(ts: &'a TaskSet, ids: &[u32]) -> CauseEffectChain<'a> {
    CauseEffectChain::new(ts, ids.iter().map(|&id| TaskId(id))).unwrap()
}

// A {max_iat 10, wcrt 1} and B {max_iat 20, wcrt 3}, A has higher priority.
fn sporadic_implicit() -> TaskSet {
    analyzed(vec![sporadic(1, 10, 10, 1), sporadic(2, 20, 20, 2)])
}

fn periodic_implicit() -> TaskSet {
    analyzed(vec![periodic(1, 10, 0, 1), periodic(2, 20, 0, 2)])
}

#[test]
fn response_times_of_examples() {
    let ts = sporadic_implicit();
    assert_eq!(ts.response_time(TaskId(1)), Some(1));
    assert_eq!(ts.response_time(TaskId(2)), Some(3));
}

#[test]
fn davare_is_order_invariant() {
    let ts = sporadic_implicit();
    assert_eq!(davare(&chain(&ts, &[1, 2])), Ok(34));
    assert_eq!(davare(&chain(&ts, &[2, 1])), Ok(34));
}

#[test]
fn duerr_exploits_priorities() {
    let ts = sporadic_implicit();
    assert_eq!(duerr(&chain(&ts, &[1, 2])), Ok(33));
    assert_eq!(duerr(&chain(&ts, &[2, 1])), Ok(34));
    assert_eq!(duerr(&chain(&ts, &[2])), Ok(23));
}

#[test]
fn let_sporadic_uses_deadlines() {
    let ts = TaskSet::new(vec![
        let_task(sporadic(1, 10, 10, 1), 7),
        let_task(sporadic(2, 20, 20, 2), 8),
    ])
    .unwrap();
    // no response times needed
    assert_eq!(let_sporadic(&chain(&ts, &[1, 2])), Ok(45));
    assert_eq!(let_sporadic(&chain(&ts, &[2, 1])), Ok(45));
}

#[test]
fn kloda_depends_on_direction() {
    let ts = periodic_implicit();
    assert_eq!(kloda(&chain(&ts, &[1, 2])), Ok(23));
    assert_eq!(kloda(&chain(&ts, &[2, 1])), Ok(31));
    // a single task looks the same in both directions
    let single = chain(&ts, &[1]);
    assert_eq!(kloda(&single), kloda(&single.reversed()));
    assert_eq!(kloda(&single), Ok(11));
}

#[test]
fn let_periodic_depends_on_direction() {
    let ts = TaskSet::new(vec![
        let_task(periodic(1, 10, 0, 1), 7),
        let_task(periodic(2, 20, 0, 2), 8),
    ])
    .unwrap();
    assert_eq!(let_periodic(&chain(&ts, &[1, 2])), Ok(38));
    assert_eq!(let_periodic(&chain(&ts, &[2, 1])), Ok(37));
}

#[test]
fn phases_shift_the_window() {
    let ts = analyzed(vec![periodic(1, 10, 5, 1), periodic(2, 20, 0, 2)]);
    // an event just after A samples at 15 is read at 25 and leaves B at 40 + 3
    assert_eq!(kloda(&chain(&ts, &[1, 2])), Ok(28));
}

#[test]
fn response_times_are_required() {
    let ts = TaskSet::new(vec![sporadic(1, 10, 10, 1), sporadic(2, 20, 20, 2)]).unwrap();
    let ch = chain(&ts, &[1, 2]);
    let missing = Err(AnalysisError::WcrtUnavailable { task: TaskId(1) });
    assert_eq!(davare(&ch), missing);
    assert_eq!(duerr(&ch.reversed()), Err(AnalysisError::WcrtUnavailable { task: TaskId(2) }));
}

#[test]
fn closed_forms_check_their_domain() {
    let ts = sporadic_implicit();
    let ch = chain(&ts, &[1, 2]);
    assert_eq!(
        let_sporadic(&ch),
        Err(AnalysisError::UnhandledCombination {
            communication: Communication::Implicit,
            release: ReleaseKind::Sporadic,
        })
    );
    assert_eq!(
        kloda(&ch),
        Err(AnalysisError::NotPeriodic { task: TaskId(1) })
    );
    assert_eq!(ClosedForm::Duerr.analyze(&ch), duerr(&ch));
    assert_eq!(ClosedForm::LetPeriodic.to_string(), "LET-periodic");
}

fn mixed_periodic() -> TaskSet {
    analyzed(vec![
        periodic(1, 10, 0, 1),
        let_task(periodic(2, 20, 0, 2), 8),
    ])
}

#[test]
fn cutting_at_communication_changes_costs() {
    let ts = mixed_periodic();
    let ch = chain(&ts, &[1, 2]);
    // Kloda(A) = 11 plus LET-periodic(B) = 28
    assert_eq!(cut_based(&ch, &CutRegistry::default()), Ok(39));
    assert_eq!(principle_based(&ch), Ok(38));
}

#[test]
fn cut_based_needs_registered_analysis() {
    let ts = mixed_periodic();
    let ch = chain(&ts, &[1, 2]);
    let registry = CutRegistry::empty().with(
        Communication::Implicit,
        ReleaseKind::Periodic,
        ClosedForm::Kloda,
    );
    assert_eq!(
        cut_based(&ch, &registry),
        Err(AnalysisError::UnhandledCombination {
            communication: Communication::Let,
            release: ReleaseKind::Periodic,
        })
    );
    let registry = registry.with(Communication::Let, ReleaseKind::Periodic, ClosedForm::LetPeriodic);
    assert_eq!(cut_based(&ch, &registry), Ok(39));
}

#[test]
fn mixed_release_patterns() {
    let ts = analyzed(vec![
        sporadic(1, 10, 15, 1),
        periodic(2, 20, 0, 2),
        periodic(3, 40, 0, 4),
    ]);
    let ch = chain(&ts, &[1, 2, 3]);
    let runs = ch.cut_by_release();
    assert_eq!(runs.len(), 2);
    // sporadic run: 15 + wcrt(T1)
    // periodic run: T2 has higher priority than T3
    let expected = 15 + 1 + kloda(&runs[1]).unwrap();
    assert_eq!(principle_based(&ch), Ok(expected));
    assert_eq!(cut_based(&ch, &CutRegistry::default()), Ok(expected));
}

#[test]
fn homogeneous_chains_agree() {
    let ts = sporadic_implicit();
    let ch = chain(&ts, &[1, 2]);
    assert_eq!(cut_based(&ch, &CutRegistry::default()), duerr(&ch));
    assert_eq!(principle_based(&ch), duerr(&ch));
    let ts = periodic_implicit();
    let ch = chain(&ts, &[2, 1]);
    assert_eq!(principle_based(&ch), kloda(&ch));
}

fn schedules(ts: &TaskSet, ratio: f64) -> (crate::simulator::Schedule, crate::simulator::Schedule) {
    let interval = scheduling_interval(ts, 100).unwrap();
    let worst = simulate(ts, interval).unwrap();
    let best = schedule_profile(ts, ratio, interval).unwrap();
    (worst, best)
}

#[test]
fn exact_reaction_time() {
    let ts = periodic_implicit();
    let (worst, best) = schedules(&ts, 0.5);
    let exact = ExactAnalysis::new(&worst, &best, DEFAULT_HYPERPERIODS);
    assert_eq!(exact.reaction_time(&chain(&ts, &[1, 2])), Ok(23));
    assert_eq!(exact.reaction_time(&chain(&ts, &[2, 1])), Ok(30));
}

#[test]
fn exact_data_age() {
    let ts = periodic_implicit();
    let (worst, best) = schedules(&ts, 0.5);
    let exact = ExactAnalysis::new(&worst, &best, DEFAULT_HYPERPERIODS);
    assert_eq!(exact.data_age(&chain(&ts, &[1, 2])), Ok(3));
    assert_eq!(exact.data_age(&chain(&ts, &[2, 1])), Ok(20));
}

#[test]
fn pessimism_ordering() {
    let ts = periodic_implicit();
    let (worst, best) = schedules(&ts, 1.0);
    let exact = ExactAnalysis::new(&worst, &best, DEFAULT_HYPERPERIODS);
    for ids in [[1, 2], [2, 1]] {
        let ch = chain(&ts, &ids);
        let cut = cut_based(&ch, &CutRegistry::default()).unwrap();
        let principle = principle_based(&ch).unwrap();
        let exact = exact.reaction_time(&ch).unwrap();
        assert!(cut >= principle);
        assert!(principle >= exact);
    }
}

#[test]
fn exact_analysis_rejects_let() {
    let ts = mixed_periodic();
    let (worst, best) = schedules(&ts, 1.0);
    let exact = ExactAnalysis::new(&worst, &best, DEFAULT_HYPERPERIODS);
    assert_eq!(
        exact.reaction_time(&chain(&ts, &[1, 2])),
        Err(AnalysisError::UnhandledCombination {
            communication: Communication::Let,
            release: ReleaseKind::Periodic,
        })
    );
}

#[test]
fn bounds_scale_with_time_grid() {
    let ts = periodic_implicit();
    let mut big = ts.scaled(1000);
    big.compute_response_times().unwrap();
    for ids in [[1, 2], [2, 1]] {
        let small_ch = chain(&ts, &ids);
        let big_ch = chain(&big, &ids);
        let small = [davare(&small_ch), kloda(&small_ch), principle_based(&small_ch)];
        let large = [davare(&big_ch), kloda(&big_ch), principle_based(&big_ch)];
        for (s, l) in small.iter().zip(&large) {
            assert_eq!(s.map(|x| x * 1000), *l);
        }
    }
}
