//! Schema (meta) model
//!
//! An immutable tree of definitions, built and validated once through
//! [`MetaBuilder`] (or loaded from the JSON definitions form) and shared by
//! every selection over it.

pub mod codec;
pub mod definition;
pub mod format;

pub use codec::load_module;
pub use definition::{Kind, Meta, MetaBuilder, MetaRef};
pub use format::{DataType, Format};
