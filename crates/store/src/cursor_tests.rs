// SPDX-License-Identifier: MIT

use super::*;
use crate::store::Store;
use serde_json::json;

#[test]
fn get_and_set_round_trip_through_a_cursor() {
    let store = Store::new();
    let node = store.at("a/b");
    node.set(json!(42)).unwrap();
    assert_eq!(node.get().unwrap(), Some(json!(42)));
}

#[test]
fn set_quiet_does_not_notify() {
    let store = Store::new();
    let seen = std::sync::Arc::new(std::sync::Mutex::new(0usize));
    let counter = std::sync::Arc::clone(&seen);
    store
        .subscribe("a", crate::subscribe::SubscribeOptions::default(), move |events| {
            *counter.lock().unwrap() += events.len();
        })
        .unwrap();
    store.at("a/b").set_quiet(json!(1)).unwrap();
    assert_eq!(*seen.lock().unwrap(), 0);
}

#[test]
fn children_and_dump_forward_to_the_store() {
    let store = Store::new();
    store.at("a/x").set(json!(1)).unwrap();
    store.at("a/y").set(json!(2)).unwrap();
    let node = store.at("a");
    assert_eq!(node.children(None).unwrap(), vec!["x".to_string(), "y".to_string()]);
    let dumped = node.dump().unwrap();
    assert_eq!(dumped.len(), 2);
}

#[test]
fn append_returns_the_new_childs_path() {
    let store = Store::new();
    let list = store.at("queue");
    let p0 = list.append(None).unwrap();
    assert_eq!(p0, "queue/#0");
    assert_eq!(store.get(&p0).unwrap(), None);
}

#[test]
fn remove_through_a_cursor_clears_its_value() {
    let store = Store::new();
    let node = store.at("a");
    node.set(json!("gone")).unwrap();
    node.remove().unwrap();
    assert_eq!(node.get().unwrap(), None);
}

#[test]
fn parent_path_walks_up_one_segment() {
    let store = Store::new();
    let node = store.at("a/b/c");
    assert_eq!(node.parent_path(), Some("a/b".to_string()));
    assert_eq!(store.at("").parent_path(), None);
}
