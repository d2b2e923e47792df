#![allow(clippy::unwrap_used, clippy::expect_used)]

use nodeconf_core::core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_ERR_CODE, FIELD_ERR_IDENT, FIELD_ERR_PATH,
};
use nodeconf_core::errors::NodeError;
use nodeconf_core::logging_facility::test_capture::{init_test_capture, CapturedEvent};
use nodeconf_core::meta::MetaBuilder;
use nodeconf_core::node::tree::TreeNode;
use nodeconf_core::snapshot::{restore, save};
use nodeconf_core::{log_op_end, log_op_error, log_op_start, MetaRef, Selection};
use serde_json::json;

fn is(e: &CapturedEvent, op: &str, event: &str, path: &str) -> bool {
    e.op.as_deref() == Some(op) && e.event.as_deref() == Some(event) && e.field("path") == Some(path)
}

fn module(container: &str) -> MetaRef {
    MetaBuilder::module("logtest")
        .definition(
            MetaBuilder::container(container).definition(MetaBuilder::leaf("label", "string")),
        )
        .build()
        .unwrap()
}

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    capture.assert_event_exists(op_name, EVENT_START);
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let ends = capture.events_for(op_name);
    assert_eq!(ends.len(), 1, "Should have exactly one end event");
    assert_eq!(ends[0].event.as_deref(), Some(EVENT_END));
    assert_eq!(ends[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = NodeError::DuplicateEntry {
        ident: "hobbies".to_string(),
        key: vec!["birding".to_string()],
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let events = capture.events_for(op_name);
    assert_eq!(events.len(), 1, "Should have exactly one error event");
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END_ERROR));
    assert_eq!(events[0].field("err_code"), Some("ERR_ALREADY_EXISTS"));
    assert_eq!(events[0].level, tracing::Level::ERROR);
}

#[test]
fn test_find_logs_one_start_and_one_end() {
    // GIVEN: a container only this test selects
    let capture = init_test_capture();
    let tree = TreeNode::from_json(json!({"find-unique-4": {"label": "x"}}));
    let root = Selection::new(module("find-unique-4"), tree.node()).unwrap();

    // WHEN: finding it
    root.find("find-unique-4").unwrap();

    // THEN: exactly one start and one end for that path
    let starts = capture.count_events(|e| is(e, "find", EVENT_START, "find-unique-4"));
    let ends = capture.count_events(|e| is(e, "find", EVENT_END, "find-unique-4"));
    let errors = capture.count_events(|e| is(e, "find", EVENT_END_ERROR, "find-unique-4"));
    assert_eq!((starts, ends, errors), (1, 1, 0));
}

#[test]
fn test_failed_find_logs_error_not_end() {
    let capture = init_test_capture();
    let root = Selection::new(module("find-unique-5"), TreeNode::new().node()).unwrap();

    let err = root.find("find-unique-5").unwrap_err();

    assert!(matches!(err, NodeError::DataNotFound { .. }));
    let failure = capture
        .events()
        .into_iter()
        .find(|e| is(e, "find", EVENT_END_ERROR, "find-unique-5"))
        .expect("Should have error event");
    assert_eq!(failure.field("err_code"), Some("ERR_NOT_FOUND"));
    assert_eq!(
        capture.count_events(|e| is(e, "find", EVENT_END, "find-unique-5")),
        0
    );
}

#[test]
fn test_error_event_names_failing_ident() {
    // GIVEN: a root whose schema has no "nope" definition
    let capture = init_test_capture();
    let root = Selection::new(module("find-unique-8"), TreeNode::new().node()).unwrap();

    // WHEN: finding it
    let err = root.find("nope").unwrap_err();

    // THEN: the error event carries the ident the lookup failed on
    assert!(matches!(err, NodeError::SchemaNotFound { .. }));
    let failure = capture
        .events()
        .into_iter()
        .find(|e| is(e, "find", EVENT_END_ERROR, "nope"))
        .expect("Should have error event");
    assert_eq!(failure.field(FIELD_ERR_IDENT), Some("nope"));
    assert_eq!(failure.field(FIELD_ERR_CODE), Some("ERR_SCHEMA_NOT_FOUND"));
}

#[test]
fn test_error_event_omits_absent_location() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_9";

    log_op_error!(
        op_name,
        NodeError::MalformedSnapshot {
            reason: "no data".to_string()
        },
        duration_ms = 1
    );

    let events = capture.events_for(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].field(FIELD_ERR_PATH), None);
    assert_eq!(events[0].field(FIELD_ERR_IDENT), None);
}

#[test]
fn test_edit_logs_strategy() {
    let capture = init_test_capture();
    let tree = TreeNode::from_json(json!({"edit-unique-6": {"label": "x"}}));
    let root = Selection::new(module("edit-unique-6"), tree.node()).unwrap();
    let sel = root.find("edit-unique-6").unwrap();

    sel.upsert_into(TreeNode::new().node()).unwrap();

    let end = capture
        .events()
        .into_iter()
        .find(|e| is(e, "edit", EVENT_END, "edit-unique-6"))
        .expect("Should have edit end event");
    assert_eq!(end.field("strategy"), Some("upsert"));
}

#[test]
fn test_snapshot_ops_are_logged() {
    let capture = init_test_capture();
    let tree = TreeNode::from_json(json!({"snapshot-unique-7": {"label": "x"}}));
    let root = Selection::new(module("snapshot-unique-7"), tree.node()).unwrap();

    let doc = save(&root.find("snapshot-unique-7").unwrap()).unwrap();
    restore(&doc).unwrap();

    assert_eq!(
        capture.count_events(|e| is(e, "snapshot_save", EVENT_END, "snapshot-unique-7")),
        1
    );
    assert_eq!(
        capture.count_events(|e| {
            e.op.as_deref() == Some("snapshot_restore")
                && e.event.as_deref() == Some(EVENT_END)
                && e.field("ident") == Some("snapshot-unique-7")
        }),
        1
    );
}
