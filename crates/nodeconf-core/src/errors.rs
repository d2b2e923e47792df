use thiserror::Error;

/// Result type alias using NodeError
pub type Result<T> = std::result::Result<T, NodeError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers can match on without
/// depending on the message text of the underlying error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Resolution
    SchemaNotFound,
    NotFound,
    InvalidPath,
    InvalidSchema,

    // Values
    TypeMismatch,
    ReadOnly,

    // Editing
    AlreadyExists,
    BackendRejected,

    // Snapshot
    MalformedSnapshot,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::SchemaNotFound => "ERR_SCHEMA_NOT_FOUND",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvalidPath => "ERR_INVALID_PATH",
            ExErrorKind::InvalidSchema => "ERR_INVALID_SCHEMA",
            ExErrorKind::TypeMismatch => "ERR_TYPE_MISMATCH",
            ExErrorKind::ReadOnly => "ERR_READ_ONLY",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::BackendRejected => "ERR_BACKEND_REJECTED",
            ExErrorKind::MalformedSnapshot => "ERR_MALFORMED_SNAPSHOT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether retrying the same call could succeed.
    ///
    /// Nothing in the engine retries on its own; this only informs callers
    /// layering their own retry policy around backend calls.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExErrorKind::BackendRejected | ExErrorKind::Io)
    }
}

/// Canonical structured error type
///
/// Carries the classification plus enough context (operation, selection
/// path, offending ident) to diagnose a failure from a log line alone.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    path: Option<String>,
    ident: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            path: None,
            ident: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add selection path context
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add schema ident context
    pub fn with_ident(mut self, ident: impl Into<String>) -> Self {
        self.ident = Some(ident.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the selection path context, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Get the schema ident context, if any
    pub fn ident(&self) -> Option<&str> {
        self.ident.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        if let Some(ident) = &self.ident {
            write!(f, " (ident: {})", ident)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for schema resolution, data access, editing and snapshots
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    // ===== Resolution Errors =====
    /// No definition with this ident exists under the parent definition
    #[error("Schema definition '{ident}' not found under '{parent}'")]
    SchemaNotFound { parent: String, ident: String },

    /// The schema resolves but the data node has nothing there
    #[error("No data at '{path}'")]
    DataNotFound { path: String },

    /// A path segment cannot be applied at the current position
    #[error("Invalid path segment '{segment}': {reason}")]
    InvalidPath { segment: String, reason: String },

    /// A definition violates a structural rule of the schema model
    #[error("Invalid schema definition '{ident}': {reason}")]
    InvalidSchema { ident: String, reason: String },

    // ===== Value Errors =====
    /// A value does not satisfy the leaf's declared type
    #[error("Value for '{ident}' does not satisfy type {expected}: {reason}")]
    TypeMismatch {
        ident: String,
        expected: String,
        reason: String,
    },

    /// The backend does not accept writes for this field
    #[error("Field '{ident}' is read-only")]
    ReadOnly { ident: String },

    /// Key leaves of an existing list entry cannot change
    #[error("Key field '{ident}' of an existing list entry cannot be changed")]
    KeyImmutable { ident: String },

    // ===== Edit Errors =====
    /// Insert found an entry with the same key already present
    #[error("List '{ident}' already has an entry with key {key:?}")]
    DuplicateEntry { ident: String, key: Vec<String> },

    /// A backend refused a begin/end edit or its side effect failed
    #[error("Edit rejected by backend during {op}: {reason}")]
    BackendRejected { op: String, reason: String },

    // ===== Snapshot Errors =====
    /// A snapshot document does not have the required shape
    #[error("Malformed snapshot document: {reason}")]
    MalformedSnapshot { reason: String },

    // ===== IO Errors =====
    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Reading or writing a stream failed
    #[error("IO error: {0}")]
    Io(String),
}

impl NodeError {
    /// Shorthand for the stable error kind of this error
    pub fn kind(&self) -> ExErrorKind {
        ExError::from(self.clone()).kind()
    }
}

impl From<NodeError> for ExError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::SchemaNotFound { parent, ident } => {
                ExError::new(ExErrorKind::SchemaNotFound)
                    .with_path(parent)
                    .with_ident(ident)
                    .with_message("Schema definition not found")
            }

            NodeError::DataNotFound { path } => ExError::new(ExErrorKind::NotFound)
                .with_path(path)
                .with_message("No data at path"),

            NodeError::InvalidPath { segment, reason } => ExError::new(ExErrorKind::InvalidPath)
                .with_ident(segment)
                .with_message(reason),

            NodeError::InvalidSchema { ident, reason } => {
                ExError::new(ExErrorKind::InvalidSchema)
                    .with_ident(ident)
                    .with_message(reason)
            }

            NodeError::TypeMismatch {
                ident,
                expected,
                reason,
            } => ExError::new(ExErrorKind::TypeMismatch)
                .with_ident(ident)
                .with_message(format!("expected {}: {}", expected, reason)),

            NodeError::ReadOnly { ident } => ExError::new(ExErrorKind::ReadOnly)
                .with_ident(ident)
                .with_message("Field is read-only"),

            NodeError::KeyImmutable { ident } => ExError::new(ExErrorKind::ReadOnly)
                .with_ident(ident)
                .with_message("Key fields are immutable once an entry exists"),

            NodeError::DuplicateEntry { ident, key } => ExError::new(ExErrorKind::AlreadyExists)
                .with_ident(ident)
                .with_message(format!("Entry with key {:?} already exists", key)),

            NodeError::BackendRejected { op, reason } => {
                ExError::new(ExErrorKind::BackendRejected)
                    .with_op(op)
                    .with_message(reason)
            }

            NodeError::MalformedSnapshot { reason } => {
                ExError::new(ExErrorKind::MalformedSnapshot).with_message(reason)
            }

            NodeError::Serialization(msg) => {
                ExError::new(ExErrorKind::Serialization).with_message(msg)
            }

            NodeError::Io(msg) => ExError::new(ExErrorKind::Io).with_message(msg),
        }
    }
}

impl From<serde_json::Error> for NodeError {
    fn from(err: serde_json::Error) -> Self {
        NodeError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for NodeError {
    fn from(err: std::io::Error) -> Self {
        NodeError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_not_found_maps_to_its_own_kind() {
        let err = NodeError::SchemaNotFound {
            parent: "hobbies".to_string(),
            ident: "nope".to_string(),
        };
        let ex: ExError = err.into();
        assert_eq!(ex.kind(), ExErrorKind::SchemaNotFound);
        assert_eq!(ex.code(), "ERR_SCHEMA_NOT_FOUND");
        assert_eq!(ex.ident(), Some("nope"));
        assert_eq!(ex.path(), Some("hobbies"));
    }

    #[test]
    fn test_key_immutable_is_read_only_kind() {
        let err = NodeError::KeyImmutable {
            ident: "name".to_string(),
        };
        assert_eq!(err.kind(), ExErrorKind::ReadOnly);
    }

    #[test]
    fn test_display_includes_source() {
        let inner = ExError::new(ExErrorKind::Io).with_message("disk full");
        let outer = ExError::new(ExErrorKind::Persistence)
            .with_op("file_store_write")
            .with_source(inner);
        let text = outer.to_string();
        assert!(text.starts_with("[ERR_PERSISTENCE]"));
        assert!(text.contains("file_store_write"));
        assert!(text.contains("disk full"));
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ExErrorKind::BackendRejected.is_retryable());
        assert!(!ExErrorKind::SchemaNotFound.is_retryable());
        assert!(!ExErrorKind::MalformedSnapshot.is_retryable());
    }
}
