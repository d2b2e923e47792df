//! Error handling for nodeconf-store
//!
//! Wraps nodeconf-core ExError with store-specific helpers

use nodeconf_core::errors::{ExError, ExErrorKind, NodeError};
use std::path::Path;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a serialization error
pub fn serialization_error(operation: &str, reason: impl std::fmt::Display) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(operation.to_string())
        .with_message(reason.to_string())
}

/// Create a missing document error
pub fn document_missing(operation: &str, path: &Path) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op(operation.to_string())
        .with_path(path.display().to_string())
        .with_message("No stored document")
}

/// Create an invalid document name error
pub fn invalid_name(operation: &str, name: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidPath)
        .with_op(operation.to_string())
        .with_ident(name.to_string())
        .with_message(reason.to_string())
}

/// Create a configuration error
pub fn config_error(reason: impl std::fmt::Display) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("load_config")
        .with_message(format!("Invalid store configuration: {}", reason))
}

/// Attach the store operation to an engine error
pub fn from_node(operation: &str, err: NodeError) -> ExError {
    ExError::from(err).with_op(operation.to_string())
}
