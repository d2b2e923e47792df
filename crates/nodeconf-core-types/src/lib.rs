//! Core types shared across nodeconf facilities
//!
//! This crate provides the canonical structured-logging vocabulary used by
//! both the error facility and the logging facility of `nodeconf-core`:
//!
//! - **Schema constants**: canonical field keys and event names

pub mod schema;
