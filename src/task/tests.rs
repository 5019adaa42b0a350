use crate::task::{
    Communication, ConstraintViolation, Deadline, Execution, Homogeneity, Release, ReleaseKind,
    Task, TaskId,
};

#[test]
fn periodic_is_constrained_sporadic() {
    let t = Task::builder(1).periodic(10, 3).wcet(2).build().unwrap();
    assert_eq!(t.min_iat(), 10);
    assert_eq!(t.max_iat(), 10);
    assert_eq!(t.release().kind(), ReleaseKind::Periodic);
    assert_eq!(t.release().phase(), Some(3));
    assert_eq!(t.communication(), Communication::Implicit);
    assert_eq!(t.bcet(), 2);
}

#[test]
fn implicit_deadline_is_derived() {
    let t = Task::builder(1).sporadic(5, 10).wcet(1).build().unwrap();
    assert_eq!(t.deadline(), 5);
    let t = t.with_release(Release::Sporadic { min_iat: 8, max_iat: 9 }).unwrap();
    assert_eq!(t.deadline(), 8);
    assert_eq!(*t.deadline_model(), Deadline::Implicit);
}

#[test]
fn execution_order_is_checked() {
    assert_eq!(
        Execution::new(3, 2),
        Err(ConstraintViolation::ExecutionOrder { bcet: 3, wcet: 2 })
    );
    let res = Task::builder(1).periodic(10, 0).bcet(5).wcet(4).build();
    assert_eq!(res, Err(ConstraintViolation::ExecutionOrder { bcet: 5, wcet: 4 }));
    assert!(Execution::new(0, 0).is_ok());
}

#[test]
fn inter_arrival_order_is_checked() {
    let res = Task::builder(1).sporadic(20, 10).wcet(1).build();
    assert_eq!(
        res,
        Err(ConstraintViolation::InterArrivalOrder {
            min_iat: 20,
            max_iat: 10
        })
    );
    let res = Task::builder(1).periodic(0, 0).wcet(1).build();
    assert_eq!(
        res,
        Err(ConstraintViolation::ZeroInterArrival {
            min_iat: 0,
            max_iat: 0
        })
    );
}

#[test]
fn constrained_deadline_is_checked() {
    let res = Task::builder(1)
        .sporadic(10, 20)
        .deadline(Deadline::Constrained(11))
        .wcet(1)
        .build();
    assert_eq!(
        res,
        Err(ConstraintViolation::DeadlineExceedsInterArrival {
            deadline: 11,
            min_iat: 10
        })
    );
    // an arbitrary deadline may exceed the inter-arrival time
    let t = Task::builder(1)
        .sporadic(10, 20)
        .deadline(Deadline::Arbitrary(11))
        .wcet(1)
        .build()
        .unwrap();
    assert_eq!(t.deadline(), 11);
    // shrinking the inter-arrival time below the deadline must fail
    let t = t.with_deadline(Deadline::Constrained(9)).unwrap();
    assert!(t.with_release(Release::Periodic { period: 5, phase: 0 }).is_err());
}

#[test]
fn missing_features_are_reported() {
    assert_eq!(
        Task::builder(7).wcet(1).build(),
        Err(ConstraintViolation::MissingRelease { task: TaskId(7) })
    );
    assert_eq!(
        Task::builder(7).periodic(10, 0).build(),
        Err(ConstraintViolation::MissingExecution { task: TaskId(7) })
    );
}

#[test]
fn copies_keep_identity() {
    let t = Task::builder(4).periodic(10, 0).wcet(2).build().unwrap();
    let u = t.with_communication(Communication::Let);
    assert_eq!(t.id(), u.id());
    assert_eq!(t.communication(), Communication::Implicit);
    assert_eq!(u.communication(), Communication::Let);
    assert_eq!(u.deadline(), 10);
}

#[test]
fn release_arithmetic() {
    let r = Release::Periodic { period: 10, phase: 3 };
    assert_eq!(r.nth_release(0), Some(3));
    assert_eq!(r.nth_release(4), Some(43));
    assert_eq!(r.release_at_or_after(0), Some(3));
    assert_eq!(r.release_at_or_after(3), Some(3));
    assert_eq!(r.release_at_or_after(4), Some(13));
    assert_eq!(r.release_at_or_after(13), Some(13));
    let s = Release::Sporadic { min_iat: 10, max_iat: 20 };
    assert_eq!(s.release_at_or_after(4), None);
    assert_eq!(s.period(), None);
}

#[test]
fn execution_ratio_rounds_up() {
    let e = Execution::new(3, 7).unwrap();
    assert_eq!(e.with_ratio(1.0), e);
    assert_eq!(e.with_ratio(0.5), Execution::new(2, 4).unwrap());
    assert_eq!(e.with_ratio(0.1), Execution::new(1, 1).unwrap());
    assert_eq!(e.with_ratio(0.0), Execution::new(0, 0).unwrap());
}

#[test]
fn scaling_multiplies_all_times() {
    let t = Task::builder(1)
        .periodic(10, 2)
        .deadline(Deadline::Constrained(8))
        .bcet(1)
        .wcet(3)
        .build()
        .unwrap();
    let u = t.scaled(100);
    assert_eq!(u.release().period(), Some(1000));
    assert_eq!(u.release().phase(), Some(200));
    assert_eq!(u.deadline(), 800);
    assert_eq!((u.bcet(), u.wcet()), (100, 300));
    assert_eq!(u.utilization(), t.utilization());
}

#[test]
fn homogeneity() {
    assert_eq!(
        Homogeneity::of([Communication::Let, Communication::Let]),
        Some(Homogeneity::Uniform(Communication::Let))
    );
    assert_eq!(
        Homogeneity::of([Communication::Let, Communication::Implicit]),
        Some(Homogeneity::Mixed)
    );
    assert_eq!(Homogeneity::<Communication>::of([]), None);
}
