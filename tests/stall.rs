//! `Error::BatchIncomplete` and `Error::Stalled` detection.

mod support;

use loadq::{Error, Queue};
use support::{Flaky, Staller};

#[test]
fn a_handler_that_leaves_futures_unsatisfied_is_reported() {
    let queue = Queue::new();
    let _a = queue.ensure_in_queue(Flaky::new("a")).unwrap();
    let _b = queue.ensure_in_queue(Flaky::new("b")).unwrap();

    let err = queue.drain().unwrap_err();
    match err {
        Error::BatchIncomplete {
            expected, actual, ..
        } => {
            assert_eq!(expected, 2);
            assert_eq!(actual, 0);
        }
        other => panic!("expected BatchIncomplete, got {other:?}"),
    }
}

#[test]
fn pending_futures_survive_an_abandoned_pass_for_the_next_drain_call() {
    let queue = Queue::new();
    let _a = queue.ensure_in_queue(Flaky::new("c")).unwrap();

    assert!(queue.drain().is_err());
    assert!(!queue.is_empty(), "the incomplete group is left pending");
}

#[test]
fn a_handler_that_registers_new_work_instead_of_satisfying_its_group_stalls() {
    let queue = Queue::new();
    let _a = queue.ensure_in_queue(Staller::new(queue.clone(), 0)).unwrap();

    let err = queue.drain().unwrap_err();
    assert!(matches!(err, Error::Stalled), "expected Stalled, got {err:?}");
    assert!(!queue.is_empty(), "the original future and its replacement are both still pending");
}

#[test]
fn scoped_queue_discards_anything_left_pending_when_the_block_exits() {
    let queue = Queue::new();
    queue.with_scoped_queue(|| {
        let _inner = queue.ensure_in_queue(Flaky::new("scoped")).unwrap();
        assert!(!queue.is_empty());
    });
    assert!(queue.is_empty(), "scoped pending work is discarded on scope exit");
}
