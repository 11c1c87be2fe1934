mod common;

use common::{Log, init_test_logging};
use readyloop::{Error, Executor, FutureState, Phase, Task, Waker, progress_fn, spawn};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[test]
fn test_completed_task_never_polls_reactor() {
    init_test_logging();
    let mut executor = Executor::new(8).unwrap();
    let task = Task::new(progress_fn(|_, _| FutureState::Completed));

    executor.spawn(&task).unwrap();
    assert!(task.is_active());
    assert_eq!(executor.active_count(), 1);

    executor.run().unwrap();

    let stats = executor.stats();
    assert_eq!(stats.batches, 1);
    assert_eq!(stats.progress_calls, 1);
    assert_eq!(stats.reactor_polls, 0, "nothing should block on the reactor");
    assert_eq!(executor.active_count(), 0);
    assert!(!task.is_active());
}

#[test]
fn test_spawn_active_task_is_noop() {
    let mut executor = Executor::new(8).unwrap();
    let task = Task::new(progress_fn(|_, _| FutureState::Completed));

    executor.spawn(&task).unwrap();
    executor.spawn(&task).unwrap();
    executor.spawn(&task).unwrap();

    assert_eq!(executor.active_count(), 1);
    assert_eq!(executor.queued(), 1);

    executor.run().unwrap();

    assert_eq!(executor.stats().progress_calls, 1);
}

#[test]
fn test_completed_task_can_be_spawned_again() {
    let mut executor = Executor::new(8).unwrap();
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    let task = Task::new(progress_fn(move |_, _| {
        counter.set(counter.get() + 1);
        FutureState::Completed
    }));

    executor.spawn(&task).unwrap();
    executor.run().unwrap();
    executor.spawn(&task).unwrap();
    executor.run().unwrap();

    assert_eq!(runs.get(), 2);
}

#[test]
fn test_wake_after_completion_is_noop() {
    let mut executor = Executor::new(8).unwrap();
    let slot: Rc<RefCell<Option<Waker>>> = Rc::default();
    let stored = slot.clone();
    let task = Task::new(progress_fn(move |_, waker| {
        *stored.borrow_mut() = Some(waker.clone());
        FutureState::Completed
    }));

    executor.spawn(&task).unwrap();
    executor.run().unwrap();

    let waker = slot.borrow_mut().take().expect("waker stored");
    waker.wake_by_ref();
    waker.wake();

    assert_eq!(executor.queued(), 0);
    assert!(!executor.is_queued(&task));
    assert_eq!(executor.stats().wakes, 0);
    assert_eq!(executor.turn().unwrap(), Phase::Done);
}

#[test]
fn test_repeated_wakes_queue_task_once() {
    let mut executor = Executor::new(8).unwrap();
    let mut polls = 0;
    let task = Task::new(progress_fn(move |_, waker| {
        polls += 1;
        if polls > 1 {
            return FutureState::Completed;
        }
        for _ in 0..5 {
            waker.wake_by_ref();
        }
        FutureState::Pending
    }));

    executor.spawn(&task).unwrap();

    assert_eq!(executor.turn().unwrap(), Phase::Draining);
    assert_eq!(executor.queued(), 1);
    assert!(executor.is_queued(&task));

    executor.run().unwrap();

    let stats = executor.stats();
    assert_eq!(stats.progress_calls, 2);
    assert_eq!(stats.wakes, 1);
    assert_eq!(stats.reactor_polls, 0);
}

#[test]
fn test_self_wake_is_deferred_to_next_batch() {
    let mut executor = Executor::new(8).unwrap();
    let log = Log::default();

    let first_log = log.clone();
    let mut first_polls = 0;
    let first = Task::new(progress_fn(move |_, waker| {
        first_polls += 1;
        first_log.push(format!("first:{first_polls}"));
        if first_polls == 1 {
            waker.wake_by_ref();
            return FutureState::Pending;
        }
        FutureState::Completed
    }));

    let second_log = log.clone();
    let second = Task::new(progress_fn(move |_, _| {
        second_log.push("second:1");
        FutureState::Completed
    }));

    executor.spawn(&first).unwrap();
    executor.spawn(&second).unwrap();
    executor.run().unwrap();

    assert_eq!(log.entries(), vec!["first:1", "second:1", "first:2"]);
    assert_eq!(executor.stats().batches, 2);
}

#[test]
fn test_self_wake_then_complete_leaves_queue_empty() {
    let mut executor = Executor::new(8).unwrap();
    let task = Task::new(progress_fn(|_, waker| {
        waker.wake_by_ref();
        FutureState::Completed
    }));

    executor.spawn(&task).unwrap();
    assert_eq!(executor.turn().unwrap(), Phase::Draining);

    assert_eq!(executor.queued(), 0);
    assert_eq!(executor.turn().unwrap(), Phase::Done);
    assert_eq!(executor.stats().progress_calls, 1);
}

#[test]
fn test_failed_task_is_retired() {
    let mut executor = Executor::new(8).unwrap();
    let task = Task::new(progress_fn(|_, _| FutureState::Failed));

    executor.spawn(&task).unwrap();
    executor.run().unwrap();

    assert!(!task.is_active());
    assert_eq!(executor.active_count(), 0);
}

#[test]
fn test_pending_task_without_wake_stays_active() {
    let mut executor = Executor::new(8).unwrap();
    let task = Task::new(progress_fn(|_, _| FutureState::Pending));

    executor.spawn(&task).unwrap();
    assert_eq!(executor.turn().unwrap(), Phase::Draining);

    // run() would now block in the reactor forever
    assert!(task.is_active());
    assert_eq!(executor.active_count(), 1);
    assert_eq!(executor.queued(), 0);

    // something outside the task can still revive it
    executor.waker(&task).wake();
    assert_eq!(executor.queued(), 1);
}

#[test]
fn test_spawn_into_full_queue_is_flagged() {
    init_test_logging();
    let mut executor = Executor::new(1).unwrap();
    let log = Log::default();

    let late_log = log.clone();
    let late = Task::new(progress_fn(move |_, _| {
        late_log.push("late");
        FutureState::Completed
    }));

    let late_waker = executor.waker(&late);
    let early_log = log.clone();
    let early = Task::new(progress_fn(move |_, _| {
        early_log.push("early");
        late_waker.wake_by_ref();
        FutureState::Completed
    }));

    executor.spawn(&early).unwrap();
    let err = executor.spawn(&late).unwrap_err();

    assert!(matches!(err, Error::QueueOverflow { capacity: 1 }));
    assert!(late.is_active(), "overflowing task stays active");
    assert!(!executor.is_queued(&late));
    assert_eq!(executor.active_count(), 2);
    assert_eq!(executor.stats().dropped, 1);

    executor.run().unwrap();

    assert_eq!(log.entries(), vec!["early", "late"]);
    assert!(!late.is_active());
}

#[test]
fn test_wake_into_full_queue_is_counted() {
    let mut executor = Executor::new(1).unwrap();
    let log = Log::default();

    let child_log = log.clone();
    let child = Task::new(progress_fn(move |_, _| {
        child_log.push("child");
        FutureState::Completed
    }));

    let mut polls = 0;
    let parent_log = log.clone();
    let parent = Task::new(progress_fn(move |_, waker| {
        polls += 1;
        parent_log.push(format!("parent:{polls}"));
        if polls == 1 {
            spawn(&child).unwrap();
            // the child took the only slot
            waker.wake_by_ref();
            return FutureState::Pending;
        }
        FutureState::Completed
    }));

    executor.spawn(&parent).unwrap();
    executor.turn().unwrap();

    assert_eq!(executor.stats().dropped, 1);
    assert_eq!(executor.queued(), 1);

    // the dropped wake leaves the parent active but unqueued
    assert_eq!(executor.turn().unwrap(), Phase::Draining);
    assert_eq!(log.entries(), vec!["parent:1", "child"]);
    assert!(parent.is_active());
    assert_eq!(executor.active_count(), 1);
    assert_eq!(executor.queued(), 0);
}

#[test]
fn test_spawn_from_inside_progress() {
    let mut executor = Executor::new(8).unwrap();
    let log = Log::default();

    let child_log = log.clone();
    let child = Task::new(progress_fn(move |_, _| {
        child_log.push("child");
        FutureState::Completed
    }));

    let parent_log = log.clone();
    let parent = Task::new(progress_fn(move |_, _| {
        parent_log.push("parent");
        spawn(&child).unwrap();
        FutureState::Completed
    }));

    executor.spawn(&parent).unwrap();
    executor.run().unwrap();

    assert_eq!(log.entries(), vec!["parent", "child"]);
    assert_eq!(executor.stats().batches, 2);
}

#[test]
fn test_spawn_outside_runtime_fails() {
    let task = Task::new(progress_fn(|_, _| FutureState::Completed));

    let err = spawn(&task).unwrap_err();

    assert!(matches!(err, Error::NoRuntime));
    assert!(!task.is_active());
}

#[test]
fn test_spawned_task_outlives_callers_handle() {
    let mut executor = Executor::new(8).unwrap();
    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();

    let mut polls = 0;
    let task = Task::new(progress_fn(move |_, waker| {
        polls += 1;
        if polls == 1 {
            waker.wake_by_ref();
            return FutureState::Pending;
        }
        flag.set(true);
        FutureState::Completed
    }));

    executor.spawn(&task).unwrap();
    drop(task);
    executor.run().unwrap();

    assert!(ran.get());
}

#[test]
fn test_dropping_executor_deactivates_tasks() {
    let executor = Executor::new(8).unwrap();
    let task = Task::new(progress_fn(|_, _| FutureState::Completed));

    executor.spawn(&task).unwrap();
    let waker = executor.waker(&task);
    drop(executor);

    assert!(!task.is_active());
    waker.wake();

    let mut other = Executor::new(8).unwrap();
    other.spawn(&task).unwrap();
    other.run().unwrap();
    assert_eq!(other.stats().progress_calls, 1);
}

#[test]
fn test_waker_identity() {
    let executor = Executor::new(8).unwrap();
    let other = Executor::new(8).unwrap();
    let first = Task::new(progress_fn(|_, _| FutureState::Completed));
    let second = Task::new(progress_fn(|_, _| FutureState::Completed));

    let waker = executor.waker(&first);

    assert_eq!(waker.task_id(), first.id());
    assert!(waker.will_wake(&waker.clone()));
    assert!(waker.will_wake(&executor.waker(&first)));
    assert!(!waker.will_wake(&executor.waker(&second)));
    assert!(!waker.will_wake(&other.waker(&first)));
}

#[test]
fn test_empty_executor_is_done() {
    let mut executor = Executor::new(8).unwrap();

    assert_eq!(executor.turn().unwrap(), Phase::Done);
    executor.run().unwrap();
    assert_eq!(executor.stats(), Default::default());
}

#[test]
fn test_wake_from_other_executor_is_ignored() {
    let mut first = Executor::new(8).unwrap();
    let mut second = Executor::new(8).unwrap();
    let task = Task::new(progress_fn(|_, _| FutureState::Completed));

    let foreign = first.waker(&task);
    second.spawn(&task).unwrap();
    foreign.wake();

    assert_eq!(first.queued(), 0);
    assert_eq!(first.stats().wakes, 0);
    assert_eq!(first.turn().unwrap(), Phase::Done);
    assert!(task.is_active());

    second.run().unwrap();

    assert_eq!(second.active_count(), 0);
    assert_eq!(second.stats().progress_calls, 1);
    assert!(!task.is_active());
}

#[test]
fn test_waker_from_previous_executor_leaves_respawned_task_alone() {
    let mut first = Executor::new(8).unwrap();
    let mut second = Executor::new(8).unwrap();
    let slot: Rc<RefCell<Option<Waker>>> = Rc::default();
    let stored = slot.clone();
    let task = Task::new(progress_fn(move |_, waker| {
        *stored.borrow_mut() = Some(waker.clone());
        FutureState::Completed
    }));

    first.spawn(&task).unwrap();
    first.run().unwrap();
    let old_waker = slot.borrow_mut().take().expect("waker stored");

    second.spawn(&task).unwrap();
    old_waker.wake_by_ref();

    assert!(!first.is_queued(&task));
    assert_eq!(first.turn().unwrap(), Phase::Done);
    assert_eq!(first.stats().progress_calls, 1);

    second.run().unwrap();

    assert_eq!(second.stats().progress_calls, 1);
    assert_eq!(second.active_count(), 0);
}
