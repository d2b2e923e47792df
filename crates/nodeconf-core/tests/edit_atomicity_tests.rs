//! Edit atomicity
//!
//! An edit either lands completely or leaves the destination as it was.
//!
//! ## Scenarios Covered
//!
//! - A backend rejecting `end_edit` at the edit root: nothing visible
//! - A type mismatch halfway through a copy: earlier entries rolled back
//! - A duplicate key after new entries were created: rolled back
//! - A rejected `set`: the old value stays

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use nodeconf_core::meta::MetaBuilder;
use nodeconf_core::node::extend::Extend;
use nodeconf_core::node::json::JsonReader;
use nodeconf_core::node::tree::TreeNode;
use nodeconf_core::{NodeError, Selection, Value};
use serde_json::json;

fn robin() -> serde_json::Value {
    json!({"bird": [{"id": 1, "name": "robin", "wingspan": 10}]})
}

fn rejecting_root(tree: &TreeNode) -> Selection {
    let node = Extend::new(tree.node())
        .on_end_edit(|base, r| {
            if r.edit_root {
                return Err(NodeError::BackendRejected {
                    op: "end_edit".to_string(),
                    reason: "device offline".to_string(),
                });
            }
            base.end_edit(r)
        })
        .node();
    Selection::new(bird_module(), node).unwrap()
}

#[test]
fn test_rejected_end_edit_discards_whole_edit() {
    // GIVEN: a backend that refuses to commit
    let tree = TreeNode::from_json(robin());
    let root = rejecting_root(&tree);
    let incoming = JsonReader::from_value(json!({"bird": [
        {"id": 1, "wingspan": 11},
        {"id": 2, "name": "wren", "wingspan": 5}
    ]}));

    // WHEN: upserting
    let err = root.upsert_from(incoming.node()).unwrap_err();

    // THEN: the rejection surfaces and no write is visible
    assert!(matches!(err, NodeError::BackendRejected { .. }));
    assert_eq!(tree.to_json(), robin());
}

#[test]
fn test_rejected_insert_creates_nothing() {
    let tree = TreeNode::from_json(json!({"bird": []}));
    let module = bird_module();
    let root = rejecting_root(&tree);

    let incoming = JsonReader::from_value(robin());
    assert!(root.insert_from(incoming.node()).is_err());

    assert_eq!(tree.to_json(), json!({"bird": []}));
    let plain = Selection::new(module, tree.node()).unwrap();
    assert!(matches!(
        plain.find("bird=1").unwrap_err(),
        NodeError::DataNotFound { .. }
    ));
}

#[test]
fn test_type_mismatch_mid_copy_rolls_back() {
    // GIVEN: a source whose second new entry has a bad wingspan
    let (root, tree) = tree_selection(bird_module(), robin());
    let incoming = JsonReader::from_value(json!({"bird": [
        {"id": 2, "name": "wren", "wingspan": 5},
        {"id": 3, "name": "heron", "wingspan": "wide"}
    ]}));

    // WHEN: upserting
    let err = root.upsert_from(incoming.node()).unwrap_err();

    // THEN: the error surfaces and the wren never appears
    assert!(matches!(err, NodeError::TypeMismatch { ref ident, .. } if ident == "wingspan"));
    assert_eq!(tree.to_json(), robin());
}

#[test]
fn test_duplicate_after_new_entries_rolls_back() {
    let (root, tree) = tree_selection(bird_module(), robin());
    let incoming = JsonReader::from_value(json!({"bird": [
        {"id": 2, "name": "wren"},
        {"id": 1, "name": "robin again"}
    ]}));

    let err = root.insert_from(incoming.node()).unwrap_err();

    assert!(matches!(err, NodeError::DuplicateEntry { .. }));
    assert_eq!(tree.to_json(), robin());
}

#[test]
fn test_failed_set_keeps_old_value() {
    // GIVEN: a leaf at the root of a rejecting backend
    let module = MetaBuilder::module("device")
        .definition(MetaBuilder::leaf("label", "string"))
        .build()
        .unwrap();
    let tree = TreeNode::from_json(json!({"label": "old"}));
    let node = Extend::new(tree.node())
        .on_end_edit(|_, _| {
            Err(NodeError::BackendRejected {
                op: "end_edit".to_string(),
                reason: "device offline".to_string(),
            })
        })
        .node();
    let root = Selection::new(module, node).unwrap();

    // WHEN: setting the leaf
    let err = root.set("label", "new").unwrap_err();

    // THEN: the old value stays
    assert!(matches!(err, NodeError::BackendRejected { .. }));
    assert_eq!(root.get("label").unwrap(), Some(Value::from("old")));
    assert_eq!(tree.to_json(), json!({"label": "old"}));
}
