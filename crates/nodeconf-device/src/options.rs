//! Call-home options and their record binding

use crate::errors::Result;
use nodeconf_core::node::reflect::{Accessor, Record};
use nodeconf_core::Value;
use serde::{Deserialize, Serialize};

/// Where and how often a device registers itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Options {
    pub device_id: String,
    pub address: String,
    pub endpoint: String,
    pub update_frequency_ms: u64,
}

impl Options {
    /// Parse options from TOML, using the schema's kebab-case names
    ///
    /// ```
    /// use nodeconf_device::Options;
    ///
    /// let options = Options::from_toml_str(r#"
    /// device-id = "car-1"
    /// address = "mgmt.example:8080"
    /// update-frequency-ms = 30000
    /// "#).unwrap();
    /// assert_eq!(options.update_frequency_ms, 30000);
    /// assert!(options.endpoint.is_empty());
    /// ```
    ///
    /// # Errors
    ///
    /// `DeviceError::Config` for invalid TOML or unknown value types.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

fn text(value: Value) -> std::result::Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(format!("expected text, got {}", other)),
    }
}

impl Record for Options {
    fn accessors() -> Vec<Accessor<Self>> {
        vec![
            Accessor::read_write(
                "device_id",
                |o: &Options| Some(Value::from(o.device_id.clone())),
                |o: &mut Options, v: Value| {
                    o.device_id = text(v)?;
                    Ok(())
                },
            ),
            Accessor::read_write(
                "address",
                |o: &Options| Some(Value::from(o.address.clone())),
                |o: &mut Options, v: Value| {
                    o.address = text(v)?;
                    Ok(())
                },
            ),
            Accessor::read_write(
                "endpoint",
                |o: &Options| Some(Value::from(o.endpoint.clone())),
                |o: &mut Options, v: Value| {
                    o.endpoint = text(v)?;
                    Ok(())
                },
            ),
            Accessor::read_write(
                "update_frequency_ms",
                |o: &Options| Some(Value::UInt(o.update_frequency_ms)),
                |o: &mut Options, v: Value| match v {
                    Value::UInt(ms) => {
                        o.update_frequency_ms = ms;
                        Ok(())
                    }
                    Value::Int(ms) => {
                        o.update_frequency_ms =
                            u64::try_from(ms).map_err(|_| format!("{} is negative", ms))?;
                        Ok(())
                    }
                    other => Err(format!("expected milliseconds, got {}", other)),
                },
            ),
        ]
    }
}
