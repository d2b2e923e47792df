//! nodeconf device - call-home registration exposed as a data node
//!
//! A device calls home to a management endpoint. Its options are edited
//! through the `call-home` container like any other configuration, and a
//! committed edit re-registers the device with the new options.

pub mod call_home;
pub mod errors;
pub mod node;
pub mod options;

pub use call_home::{CallHome, Registrar};
pub use errors::{DeviceError, Result};
pub use node::{call_home_meta, call_home_node};
pub use options::Options;
