//! nodeconf Core - schema-bound configuration data engine
//!
//! This crate provides the foundational pieces for navigating and editing
//! configuration data through a schema, including:
//! - The schema (meta) model with resolution rules and a validating builder
//! - Typed values and exact coercion to leaf formats
//! - The `Node` capability trait with in-memory, reflective, streaming and
//!   decorating backends
//! - Path-based selection and transactional subtree edits
//! - The self-describing snapshot codec (schema plus data in one document)

pub mod errors;
pub mod logging_facility;
pub mod meta;
pub mod node;
pub mod selection;
pub mod snapshot;
pub mod value;

pub use nodeconf_core_types as core_types;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, NodeError, Result};
pub use meta::{Format, Kind, Meta, MetaBuilder, MetaRef};
pub use node::{Node, NodeRef};
pub use selection::{Selection, Strategy};
pub use snapshot::{restore, restore_str, save, SnapshotDocument};
pub use value::Value;
