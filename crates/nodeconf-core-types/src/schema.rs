//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names identical across every operation that
//! logs through the `log_op_*` macros.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Selection context
pub const FIELD_PATH: &str = "path";
pub const FIELD_IDENT: &str = "ident";
pub const FIELD_KIND: &str = "kind";
pub const FIELD_STRATEGY: &str = "strategy";

// Persistence context
pub const FIELD_NAMESPACE: &str = "namespace";
pub const FIELD_MODULE: &str = "module";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";
pub const FIELD_ERR_PATH: &str = "err_path";
pub const FIELD_ERR_IDENT: &str = "err_ident";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
