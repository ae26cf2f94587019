//! Integration test: runners on dedicated threads.
//!
//! Validates interruption, release of ownership held by a thread that
//! exited or panicked, contained hook panics, and two runners competing
//! for one unit.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bread_common::diagnostics::Diagnostics;
use bread_core::prelude::*;

const WAIT_LIMIT: Duration = Duration::from_secs(5);

fn fast_runner() -> TaskRunner {
    TaskRunner::new(RunOptions::default().with_update_delay(Duration::from_millis(2)))
}

/// Spin until `cond` holds; panics after [`WAIT_LIMIT`].
fn wait_for(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + WAIT_LIMIT;
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}

fn motor() -> Arc<OwnableUnit> {
    Arc::new(
        OwnableUnit::new("motor")
            .unwrap()
            .with_diagnostics(Diagnostics::null()),
    )
}

#[test]
fn interrupt_stops_a_forever_task() {
    let motor = motor();
    let task = Arc::new(
        FnTask::new(|_| Ok(Progress::Continue))
            .depends_on(UnitRef::plain(motor.clone()))
            .into_procedure("patrol")
            .unwrap()
            .with_diagnostics(Diagnostics::null()),
    );

    let handle = fast_runner().spawn(task.clone()).unwrap();
    wait_for("patrol to run", || task.state() == TaskState::Running);
    assert!(motor.guard().is_owned_by(Some(handle.context())));
    assert!(!handle.is_finished());

    handle.interrupt();
    let summary = handle.join().unwrap();
    assert!(summary.started);
    assert!(summary.interrupted);
    assert_eq!(summary.outcome, None);
    assert_eq!(summary.final_state, TaskState::Interrupted);
    assert!(task.is_ready());
    assert!(task.ownership().unwrap().is_owned_by(None));
    assert!(motor.guard().is_owned_by(None));
}

#[test]
fn units_kept_by_an_exited_thread_are_free() {
    let spare = motor();
    let held = spare.clone();
    let task = Arc::new(
        FnTask::new(|_| Ok(Progress::Done))
            .on_start(move |cx| {
                // Taken outside the dependency graph and never released.
                held.guard().acquire(Some(cx.context()), false);
                Ok(())
            })
            .into_procedure("grab")
            .unwrap()
            .with_diagnostics(Diagnostics::null()),
    );

    let handle = fast_runner().spawn(task).unwrap();
    let runner_ctx = handle.context().clone();
    let summary = handle.join().unwrap();
    assert_eq!(summary.outcome, Some(Progress::Done));

    assert!(!runner_ctx.is_alive());
    assert_eq!(spare.guard().owner(), None);
    let main = ExecutionContext::new("main");
    assert!(spare.guard().acquire(Some(&main), false));
}

#[test]
fn panicking_hook_fails_the_run_and_frees_dependencies() {
    let motor = motor();
    let task = Arc::new(
        FnTask::new(|_| panic!("encoder fault"))
            .depends_on(UnitRef::plain(motor.clone()))
            .into_procedure("faulty")
            .unwrap()
            .with_diagnostics(Diagnostics::null()),
    );

    let summary = fast_runner().spawn(task.clone()).unwrap().join().unwrap();
    assert_eq!(summary.outcome, Some(Progress::Failed));
    assert_eq!(summary.polls, 1);
    assert_eq!(summary.final_state, TaskState::Errored);

    assert_eq!(motor.guard().owner(), None);
    assert_eq!(task.ownership().unwrap().owner(), None);
    assert!(task.is_ready());
}

/// Task whose own `update` unwinds, outside any hook.
struct Unguarded {
    motor: Arc<OwnableUnit>,
}

impl Unit for Unguarded {
    fn name(&self) -> &str {
        "unguarded"
    }

    fn dependencies(&self) -> UnitMap {
        std::iter::once(UnitRef::plain(self.motor.clone())).collect()
    }
}

impl Task for Unguarded {
    fn start(&self, _ctx: &ExecutionContext) -> Result<(), TaskError> {
        Ok(())
    }

    fn update(&self, _ctx: &ExecutionContext) -> Result<Progress, TaskError> {
        panic!("driver fault")
    }

    fn clean(&self, _ctx: &ExecutionContext) -> Result<(), TaskError> {
        Ok(())
    }

    fn is_ready(&self) -> bool {
        false
    }

    fn state(&self) -> TaskState {
        TaskState::Running
    }
}

#[test]
fn unwinding_task_is_reported_and_frees_dependencies() {
    let motor = motor();
    let task = Arc::new(Unguarded {
        motor: motor.clone(),
    });

    let handle = fast_runner().spawn(task).unwrap();
    let err = handle.join().unwrap_err();
    assert!(matches!(&err, RunError::Panicked { task } if task == "unguarded"));
    assert_eq!(err.to_string(), "runner thread for `unguarded` panicked");
    assert_eq!(motor.guard().owner(), None);
}

#[test]
fn second_runner_cannot_drive_an_owned_unit() {
    let motor = motor();
    let task_for = |name: &str| {
        let checked = motor.clone();
        Arc::new(
            FnTask::new(move |cx| {
                checked.check_access(cx.context())?;
                Ok(Progress::Continue)
            })
            .depends_on(UnitRef::plain(motor.clone()))
            .into_procedure(name)
            .unwrap()
            .with_diagnostics(Diagnostics::null()),
        )
    };
    let first = task_for("first");
    let second = task_for("second");
    let runner = fast_runner();

    let first_handle = runner.spawn(first.clone()).unwrap();
    wait_for("first to run", || first.state() == TaskState::Running);
    assert!(motor.guard().is_owned_by(Some(first_handle.context())));

    let second_summary = runner.spawn(second.clone()).unwrap().join().unwrap();
    assert_eq!(second_summary.outcome, Some(Progress::Failed));
    assert_eq!(second_summary.polls, 1);
    assert_eq!(second_summary.final_state, TaskState::Errored);
    assert!(motor.guard().is_owned_by(Some(first_handle.context())));

    first_handle.interrupt();
    let first_summary = first_handle.join().unwrap();
    assert!(first_summary.interrupted);
    assert!(first_summary.polls >= 1);
    assert_eq!(motor.guard().owner(), None);
}

#[test]
fn runner_from_config_uses_its_delay() {
    let config = bread_common::config::RunnerConfig {
        update_delay_ms: 3,
        force_acquisition: true,
    };
    let runner = TaskRunner::from_config(&config);
    assert_eq!(runner.options().update_delay, Duration::from_millis(3));
    assert!(runner.options().force_acquisition);

    let motor = motor();
    let holder = ExecutionContext::new("holder");
    assert!(motor.guard().acquire(Some(&holder), false));
    let mut polls = 0;
    let task = Arc::new(
        FnTask::new(move |_| {
            polls += 1;
            Ok(Progress::from_done(polls == 2))
        })
        .depends_on(UnitRef::plain(motor.clone()))
        .into_procedure("override")
        .unwrap()
        .with_diagnostics(Diagnostics::null()),
    );

    let summary = runner.spawn(task).unwrap().join().unwrap();
    assert_eq!(summary.outcome, Some(Progress::Done));
    assert_eq!(summary.polls, 2);
    assert!(!motor.guard().is_owned_by(Some(&holder)));
}
