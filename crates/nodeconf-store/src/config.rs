//! Store configuration
//!
//! ```toml
//! var_dir = "/var/lib/nodeconf"
//! ```

use crate::errors::{config_error, io_error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_var_dir() -> PathBuf {
    PathBuf::from("./var")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory holding one document per namespace and module
    #[serde(default = "default_var_dir")]
    pub var_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            var_dir: default_var_dir(),
        }
    }
}

impl StoreConfig {
    /// Parse a TOML configuration
    ///
    /// # Errors
    ///
    /// `ERR_PERSISTENCE` when the text is not valid TOML or names unknown
    /// settings.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(config_error)
    }

    /// Load a TOML configuration file
    ///
    /// # Errors
    ///
    /// `ERR_IO` when the file cannot be read, otherwise as
    /// [`StoreConfig::from_toml_str`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| io_error("load_config", e))?;
        Self::from_toml_str(&text)
    }
}
