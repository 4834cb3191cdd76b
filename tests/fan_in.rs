//! `Multi` / `MultiMap` fan-in over a collection of child futures.

mod support;

use std::collections::BTreeMap;
use std::sync::Arc;

use loadq::combinators::{Multi, MultiMap};
use loadq::{Completable, Queue};
use support::LoadUser;

#[test]
fn fan_in_completes_once_every_child_completes() {
    let queue = Queue::new();
    let children: Vec<Arc<dyn Completable<Option<String>>>> = (0..4)
        .map(|id| queue.ensure_in_queue(LoadUser::new(id)).unwrap() as Arc<dyn Completable<Option<String>>>)
        .collect();

    let multi = Multi::new(children);
    assert!(!multi.satisfied());

    queue.drain().unwrap();

    assert!(multi.satisfied());
    let result = multi.result().unwrap();
    assert_eq!(
        result,
        vec![
            Some("user-0".to_string()),
            Some("user-1".to_string()),
            Some("user-2".to_string()),
            Some("user-3".to_string()),
        ]
    );
}

#[test]
fn fan_in_preserves_input_order_not_completion_order() {
    let queue = Queue::new();
    // Two separate batching keys so nothing forces a particular completion
    // order between them; Multi must still report results positionally.
    let a = queue.ensure_in_queue(LoadUser::new(100)).unwrap();
    let b = queue.ensure_in_queue(LoadUser::new(1)).unwrap();

    let multi = Multi::new(vec![
        b.clone() as Arc<dyn Completable<Option<String>>>,
        a.clone() as Arc<dyn Completable<Option<String>>>,
    ]);

    queue.drain().unwrap();

    assert_eq!(
        multi.result().unwrap(),
        vec![Some("user-1".to_string()), Some("user-100".to_string())]
    );
}

#[test]
fn empty_fan_in_completes_synchronously() {
    let multi: Arc<Multi<Option<String>>> = Multi::new(Vec::new());
    assert!(multi.satisfied());
    assert_eq!(multi.result().unwrap(), Vec::<Option<String>>::new());
}

#[test]
fn keyed_fan_in_preserves_key_set() {
    let queue = Queue::new();
    let mut children: BTreeMap<&'static str, Arc<dyn Completable<Option<String>>>> = BTreeMap::new();
    children.insert("alice", queue.ensure_in_queue(LoadUser::new(1)).unwrap());
    children.insert("bob", queue.ensure_in_queue(LoadUser::new(2)).unwrap());

    let multi = MultiMap::new(children);
    queue.drain().unwrap();

    let result = multi.result().unwrap();
    assert_eq!(result.get("alice"), Some(&Some("user-1".to_string())));
    assert_eq!(result.get("bob"), Some(&Some("user-2".to_string())));
}

#[test]
fn fan_in_of_fan_ins_composes() {
    let queue = Queue::new();
    let inner_a = Multi::new(vec![
        queue.ensure_in_queue(LoadUser::new(1)).unwrap() as Arc<dyn Completable<Option<String>>>
    ]);
    let inner_b = Multi::new(vec![
        queue.ensure_in_queue(LoadUser::new(2)).unwrap() as Arc<dyn Completable<Option<String>>>
    ]);

    let outer: Arc<Multi<Vec<Option<String>>>> = Multi::new(vec![
        inner_a as Arc<dyn Completable<Vec<Option<String>>>>,
        inner_b as Arc<dyn Completable<Vec<Option<String>>>>,
    ]);

    queue.drain().unwrap();

    assert_eq!(
        outer.result().unwrap(),
        vec![
            vec![Some("user-1".to_string())],
            vec![Some("user-2".to_string())],
        ]
    );
}
