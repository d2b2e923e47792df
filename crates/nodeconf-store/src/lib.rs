//! nodeconf store - file persistence for selections
//!
//! Provides:
//! - `FileStore`: one pretty-printed JSON document per namespace and module
//! - Atomic writes (temp file then rename)
//! - `StoreConfig` loaded from TOML

pub mod atomic;
pub mod config;
pub mod errors;
pub mod file_store;

pub use config::StoreConfig;
pub use errors::Result;
pub use file_store::FileStore;
