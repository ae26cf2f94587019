//! Integration test: composition strategies.
//!
//! Validates the selector switch hand-off order, retry of a blocked child,
//! joint completion of aggregates, containment of failing and panicking
//! children, and forced acquisition.

use std::sync::Arc;

use bread_common::diagnostics::{Diagnostics, RecordingSink};
use bread_core::prelude::*;

use crate::common::{Counted, Script, scripted, trail};

// ── Continuous-Selectable ───────────────────────────────────────────

#[test]
fn selector_switch_hands_off_in_order() {
    let sink = Arc::new(RecordingSink::new());
    let u = scripted("U", Script::Forever, &sink);
    let a = scripted("A", Script::Forever, &sink);
    let b = scripted("B", Script::Forever, &sink);
    let selector = Arc::new(ManualSelector::new("mode", 2).unwrap());

    let options: Vec<Arc<dyn Task>> = vec![a.clone(), b.clone()];
    let follow = ContinuousSelectable::task("follow", selector.clone(), u.clone(), options, false)
        .unwrap()
        .with_diagnostics(Diagnostics::null());
    let ctx = ExecutionContext::new("main");
    let units = ["U", "A", "B"];

    follow.start(&ctx).unwrap();
    follow.update(&ctx).unwrap();
    assert_eq!(trail(&sink, &units), ["U acquired", "U.start", "U.update"]);

    sink.clear();
    selector.set(Some(0));
    follow.update(&ctx).unwrap();
    assert_eq!(
        trail(&sink, &units),
        ["U.clean", "U released", "A acquired", "A.start", "A.update"]
    );

    sink.clear();
    selector.set(Some(1));
    follow.update(&ctx).unwrap();
    assert_eq!(
        trail(&sink, &units),
        ["A.clean", "A released", "B acquired", "B.start", "B.update"]
    );

    sink.clear();
    follow.clean(&ctx).unwrap();
    assert_eq!(trail(&sink, &units), ["B.clean", "B released"]);
    assert_eq!(a.state(), TaskState::Interrupted);
    assert!(u.is_ready() && a.is_ready() && b.is_ready());
}

#[test]
fn switch_back_restarts_previous_child() {
    let sink = Arc::new(RecordingSink::new());
    let u = scripted("U", Script::Forever, &sink);
    let a = scripted("A", Script::FinishAfter(1), &sink);
    let selector = Arc::new(ManualSelector::new("mode", 1).unwrap());
    let options: Vec<Arc<dyn Task>> = vec![a.clone()];
    let follow = ContinuousSelectable::task("follow", selector.clone(), u, options, false)
        .unwrap()
        .with_diagnostics(Diagnostics::null());
    let ctx = ExecutionContext::new("main");

    selector.set(Some(0));
    follow.start(&ctx).unwrap();
    follow.update(&ctx).unwrap();
    assert_eq!(a.state(), TaskState::Finished);

    // A finished child stays active until the selection changes.
    assert_eq!(follow.update(&ctx).unwrap(), Progress::Continue);

    selector.set(None);
    follow.update(&ctx).unwrap();
    selector.set(Some(0));
    follow.update(&ctx).unwrap();
    assert_eq!(a.state(), TaskState::Finished);
    assert_eq!(
        trail(&sink, &["A"]).iter().filter(|s| *s == "A.start").count(),
        2
    );
}

#[test]
fn child_owned_elsewhere_is_not_started() {
    let sink = Arc::new(RecordingSink::new());
    let u = scripted("U", Script::Forever, &sink);
    let a = scripted("A", Script::Forever, &sink);
    let selector = Arc::new(ManualSelector::new("mode", 1).unwrap());
    let options: Vec<Arc<dyn Task>> = vec![a.clone()];
    let follow = ContinuousSelectable::task("follow", selector.clone(), u, options, false)
        .unwrap()
        .with_diagnostics(Diagnostics::null());
    let ctx = ExecutionContext::new("main");
    let other = ExecutionContext::new("teleop");

    assert!(a.ownership().unwrap().acquire(Some(&other), false));
    selector.set(Some(0));
    follow.start(&ctx).unwrap();
    follow.update(&ctx).unwrap();

    // A refuses to start for a context that does not own it.
    assert!(a.is_ready());
    assert_eq!(a.state(), TaskState::NotStarted);
    assert!(a.ownership().unwrap().is_owned_by(Some(&other)));
    assert_eq!(follow.state(), TaskState::Running);

    // Once the other context lets go, the next cycles take A over.
    a.ownership().unwrap().release(Some(&other)).unwrap();
    for _ in 0..5 {
        follow.update(&ctx).unwrap();
    }
    assert_eq!(a.state(), TaskState::Running);
    assert!(a.ownership().unwrap().is_owned_by(Some(&ctx)));
    assert_eq!(
        trail(&sink, &["A"]).iter().filter(|s| *s == "A.start").count(),
        1
    );
    assert_eq!(
        trail(&sink, &["A"]).iter().filter(|s| *s == "A.update").count(),
        5
    );
}

// ── Aggregate ───────────────────────────────────────────────────────

#[test]
fn aggregate_completes_jointly_and_polls_every_child() {
    let sink = Arc::new(RecordingSink::new());
    let counters: Vec<Arc<Counted>> = [1, 2, 3]
        .into_iter()
        .map(|n| Counted::wrap(scripted(&format!("child{n}"), Script::FinishAfter(n), &sink)))
        .collect();
    let children: Vec<Arc<dyn Task>> = counters
        .iter()
        .map(|c| c.clone() as Arc<dyn Task>)
        .collect();
    let agg = Aggregate::task("all", children, false)
        .unwrap()
        .with_diagnostics(Diagnostics::null());
    let ctx = ExecutionContext::new("main");

    agg.start(&ctx).unwrap();
    assert_eq!(agg.update(&ctx).unwrap(), Progress::Continue);
    assert_eq!(agg.update(&ctx).unwrap(), Progress::Continue);
    assert_eq!(agg.update(&ctx).unwrap(), Progress::Done);

    for counter in &counters {
        assert_eq!(counter.updates(), 3, "{} polled", counter.name());
        assert_eq!(counter.state(), TaskState::Finished);
    }
    agg.clean(&ctx).unwrap();
}

#[test]
fn aggregate_starts_all_before_updating_any() {
    let sink = Arc::new(RecordingSink::new());
    let a = scripted("A", Script::FinishAfter(1), &sink);
    let b = scripted("B", Script::FinishAfter(1), &sink);
    let agg = Aggregate::task("all", vec![a as Arc<dyn Task>, b as Arc<dyn Task>], false)
        .unwrap()
        .with_diagnostics(Diagnostics::null());
    let ctx = ExecutionContext::new("main");

    agg.start(&ctx).unwrap();
    agg.update(&ctx).unwrap();
    agg.clean(&ctx).unwrap();

    assert_eq!(
        trail(&sink, &["A", "B"]),
        [
            "A acquired",
            "B acquired",
            "A.start",
            "B.start",
            "A.update",
            "B.update",
            "A.clean",
            "B.clean",
            "A released",
            "B released",
        ]
    );
}

#[test]
fn failing_child_does_not_stop_aggregate() {
    let sink = Arc::new(RecordingSink::new());
    let c = Counted::wrap(scripted("C", Script::FailOnPoll(1), &sink));
    let d = Counted::wrap(scripted("D", Script::FinishAfter(3), &sink));
    let children: Vec<Arc<dyn Task>> = vec![c.clone(), d.clone()];
    let agg = Aggregate::task("all", children, false)
        .unwrap()
        .with_diagnostics(Diagnostics::null());
    let ctx = ExecutionContext::new("main");

    agg.start(&ctx).unwrap();
    assert_eq!(agg.update(&ctx).unwrap(), Progress::Continue);
    assert_eq!(c.state(), TaskState::Errored);

    assert_eq!(agg.update(&ctx).unwrap(), Progress::Continue);
    assert_eq!(agg.update(&ctx).unwrap(), Progress::Failed);
    assert_eq!(d.updates(), 3);
    assert_eq!(d.state(), TaskState::Finished);
    assert_eq!(agg.state(), TaskState::Errored);

    agg.clean(&ctx).unwrap();
    assert!(c.ownership().unwrap().is_owned_by(None));
}

#[test]
fn panicking_child_does_not_unwind_aggregate() {
    let sink = Arc::new(RecordingSink::new());
    let bad: Arc<dyn Task> = Arc::new(
        FnTask::new(|_| {
            let samples: Vec<f64> = Vec::new();
            Ok(Progress::from_done(samples[0] > 0.0))
        })
        .into_procedure("bad")
        .unwrap()
        .with_diagnostics(Diagnostics::null()),
    );
    let ok = Counted::wrap(scripted("ok", Script::FinishAfter(2), &sink));
    let agg = Aggregate::task("all", vec![bad.clone(), ok.clone() as Arc<dyn Task>], false)
        .unwrap()
        .with_diagnostics(Diagnostics::null());
    let ctx = ExecutionContext::new("main");

    agg.start(&ctx).unwrap();
    assert_eq!(agg.update(&ctx).unwrap(), Progress::Continue);
    assert_eq!(bad.state(), TaskState::Errored);
    assert_eq!(agg.update(&ctx).unwrap(), Progress::Failed);
    assert_eq!(ok.updates(), 2);
    assert_eq!(ok.state(), TaskState::Finished);

    agg.clean(&ctx).unwrap();
    assert!(bad.is_ready());
    assert!(bad.ownership().unwrap().is_owned_by(None));
}

#[test]
fn nested_aggregates_release_everything() {
    let sink = Arc::new(RecordingSink::new());
    let arm = Arc::new(OwnableUnit::new("arm").unwrap());
    let reach: Arc<dyn Task> = Arc::new(
        FnTask::new(|_| Ok(Progress::Done))
            .depends_on(UnitRef::plain(arm.clone()))
            .into_procedure("reach")
            .unwrap()
            .with_diagnostics(Diagnostics::null()),
    );
    let wave: Arc<dyn Task> = scripted("wave", Script::FinishAfter(2), &sink);
    let inner = Arc::new(
        Aggregate::task("inner", vec![reach, wave], false)
            .unwrap()
            .with_diagnostics(Diagnostics::null()),
    );
    let outer = Aggregate::task("outer", vec![inner.clone() as Arc<dyn Task>], false)
        .unwrap()
        .with_diagnostics(Diagnostics::null());
    let ctx = ExecutionContext::new("main");

    let summary = run(
        &outer,
        &ctx,
        &RunOptions::default().with_update_delay(std::time::Duration::from_millis(1)),
    )
    .unwrap();
    assert_eq!(summary.outcome, Some(Progress::Done));
    assert_eq!(summary.polls, 2);
    assert!(arm.guard().is_owned_by(None));
    assert!(inner.ownership().unwrap().is_owned_by(None));
}

// ── Single-Shot-Selectable ──────────────────────────────────────────

#[test]
fn single_shot_runs_once_through_runner() {
    let sink = Arc::new(RecordingSink::new());
    let u = scripted("U", Script::FinishAfter(1), &sink);
    let a = scripted("A", Script::FinishAfter(2), &sink);
    let b = scripted("B", Script::FinishAfter(1), &sink);
    let selector = Arc::new(ManualSelector::new("mode", 2).unwrap());
    selector.set(Some(1));
    let options: Vec<Arc<dyn Task>> = vec![a, b];
    let once = SingleShotSelectable::task("once", selector, u, options, false)
        .unwrap()
        .with_diagnostics(Diagnostics::null());
    let ctx = ExecutionContext::new("main");

    let summary = run(
        &once,
        &ctx,
        &RunOptions::default().with_update_delay(std::time::Duration::from_millis(1)),
    )
    .unwrap();
    assert_eq!(summary.outcome, Some(Progress::Done));
    // The runner takes every child up front; only B is driven.
    assert_eq!(
        trail(&sink, &["B"]),
        ["B acquired", "B.start", "B.update", "B.clean", "B released"]
    );
    assert_eq!(
        trail(&sink, &["U", "A"]),
        ["A acquired", "U acquired", "A released", "U released"]
    );
}

// ── Forced acquisition ──────────────────────────────────────────────

#[test]
fn forced_acquisition_overrides_owner() {
    let x = OwnableUnit::new("X").unwrap();
    let t1 = ExecutionContext::new("t1");
    let t2 = ExecutionContext::new("t2");

    assert!(x.guard().acquire(Some(&t1), false));
    assert!(x.guard().acquire(Some(&t2), true));
    assert!(x.guard().is_owned_by(Some(&t2)));
    assert!(!x.guard().is_owned_by(Some(&t1)));
}

#[test]
fn forced_aggregate_takes_children_from_another_context() {
    let sink = Arc::new(RecordingSink::new());
    let a = scripted("A", Script::FinishAfter(1), &sink);
    let teleop = ExecutionContext::new("teleop");
    assert!(a.ownership().unwrap().acquire(Some(&teleop), false));

    let agg = Aggregate::task("all", vec![a.clone() as Arc<dyn Task>], true)
        .unwrap()
        .with_diagnostics(Diagnostics::null());
    let ctx = ExecutionContext::new("main");
    agg.start(&ctx).unwrap();

    assert!(a.ownership().unwrap().is_owned_by(Some(&ctx)));
    assert_eq!(agg.update(&ctx).unwrap(), Progress::Done);
}
