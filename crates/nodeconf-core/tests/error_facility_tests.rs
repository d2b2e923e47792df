#![allow(clippy::unwrap_used, clippy::expect_used)]

use nodeconf_core::errors::{ExError, ExErrorKind, NodeError};

#[test]
fn test_schema_not_found_distinct_from_data_not_found() {
    let schema: ExError = NodeError::SchemaNotFound {
        parent: "test".to_string(),
        ident: "nope".to_string(),
    }
    .into();
    let data: ExError = NodeError::DataNotFound {
        path: "hockey".to_string(),
    }
    .into();

    assert_eq!(schema.kind(), ExErrorKind::SchemaNotFound);
    assert_eq!(data.kind(), ExErrorKind::NotFound);
    assert_ne!(schema.code(), data.code());
    assert_eq!(data.path(), Some("hockey"));
}

#[test]
fn test_type_mismatch_structured_fields() {
    let err = NodeError::TypeMismatch {
        ident: "wingspan".to_string(),
        expected: "int32".to_string(),
        reason: "got non-numeric value wide".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::TypeMismatch);
    assert_eq!(ex_err.code(), "ERR_TYPE_MISMATCH");
    assert_eq!(ex_err.ident(), Some("wingspan"));
    assert!(ex_err.message().contains("int32"));
}

#[test]
fn test_backend_rejected_carries_op() {
    let err = NodeError::BackendRejected {
        op: "end_edit".to_string(),
        reason: "device offline".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::BackendRejected);
    assert_eq!(ex_err.op(), Some("end_edit"));
    assert_eq!(ex_err.message(), "device offline");
    assert!(ex_err.kind().is_retryable());
}

#[test]
fn test_duplicate_entry_is_already_exists() {
    let err = NodeError::DuplicateEntry {
        ident: "hobbies".to_string(),
        key: vec!["birding".to_string()],
    };

    assert_eq!(err.kind(), ExErrorKind::AlreadyExists);
    assert!(err.to_string().contains("birding"));
}

#[test]
fn test_malformed_snapshot_kind() {
    let err = NodeError::MalformedSnapshot {
        reason: "data has no member 'hobbies'".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.code(), "ERR_MALFORMED_SNAPSHOT");
    assert!(ex_err.message().contains("hobbies"));
}

#[test]
fn test_serde_errors_map_to_serialization() {
    let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();

    let err: NodeError = parse_err.into();

    assert_eq!(err.kind(), ExErrorKind::Serialization);
}

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (ExErrorKind::SchemaNotFound, "ERR_SCHEMA_NOT_FOUND"),
        (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
        (ExErrorKind::InvalidPath, "ERR_INVALID_PATH"),
        (ExErrorKind::InvalidSchema, "ERR_INVALID_SCHEMA"),
        (ExErrorKind::TypeMismatch, "ERR_TYPE_MISMATCH"),
        (ExErrorKind::ReadOnly, "ERR_READ_ONLY"),
        (ExErrorKind::AlreadyExists, "ERR_ALREADY_EXISTS"),
        (ExErrorKind::BackendRejected, "ERR_BACKEND_REJECTED"),
        (ExErrorKind::MalformedSnapshot, "ERR_MALFORMED_SNAPSHOT"),
        (ExErrorKind::Io, "ERR_IO"),
        (ExErrorKind::Serialization, "ERR_SERIALIZATION"),
        (ExErrorKind::Persistence, "ERR_PERSISTENCE"),
        (ExErrorKind::Internal, "ERR_INTERNAL"),
    ];

    for (kind, expected_code) in kinds {
        assert_eq!(kind.code(), expected_code);
    }
}
