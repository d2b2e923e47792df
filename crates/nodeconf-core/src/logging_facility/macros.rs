//! Canonical logging macros
//!
//! Every engine operation that can fail logs one `start` event and exactly
//! one of `end` / `end_error`. Callers pass the schema location they act on
//! (`path`, `ident`, or `namespace` + `module`) as trailing fields; error
//! events also carry the location the error itself names, which can be
//! deeper than the caller's.

/// Shared body of the `log_op_*` macros
#[doc(hidden)]
#[macro_export]
macro_rules! __log_op_event {
    ($level:ident, $op:expr, $event:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $event,
            $($($field)*)?
        )
    };
}

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use nodeconf_core::log_op_start;
/// log_op_start!("find");
/// log_op_start!("find", path = "hobbies=birding");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(
            info,
            $op,
            $crate::core_types::schema::EVENT_START
            $(, $($field)*)?
        )
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use nodeconf_core::log_op_end;
/// log_op_end!("find", duration_ms = 3);
/// log_op_end!("edit", duration_ms = 3, strategy = "upsert", path = "hobbies");
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(
            info,
            $op,
            $crate::core_types::schema::EVENT_END,
            duration_ms = $duration
            $(, $($field)*)?
        )
    };
}

/// Log an operation error
///
/// Accepts anything convertible into `ExError`. The error's own path and
/// ident are recorded as `err_path` / `err_ident` when it has them.
///
/// # Example
///
/// ```
/// # use nodeconf_core::{log_op_error, errors::NodeError};
/// let err = NodeError::DataNotFound { path: "hobbies".to_string() };
/// log_op_error!("find", err, duration_ms = 10, path = "hobbies");
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__log_op_event!(
            error,
            $op,
            $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_path = ex_err.path(),
            err_ident = ex_err.ident()
            $(, $($field)*)?
        )
    }};
}
