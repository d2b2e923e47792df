use nodeconf_core::errors::{ExError, ExErrorKind};
use thiserror::Error;

/// Result type alias using DeviceError
pub type Result<T> = std::result::Result<T, DeviceError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// Options that can never register, whatever the endpoint says
    #[error("Invalid call-home options: {reason}")]
    InvalidOptions { reason: String },

    /// The registrar could not complete the registration
    #[error("Registration with '{address}' failed: {reason}")]
    Registration { address: String, reason: String },

    /// Options file could not be parsed
    #[error("Invalid options document: {0}")]
    Config(String),
}

impl From<DeviceError> for ExError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::InvalidOptions { reason } => ExError::new(ExErrorKind::TypeMismatch)
                .with_op("call_home_apply")
                .with_message(reason),
            DeviceError::Registration { address, reason } => {
                ExError::new(ExErrorKind::BackendRejected)
                    .with_op("call_home_apply")
                    .with_path(address)
                    .with_message(reason)
            }
            DeviceError::Config(msg) => ExError::new(ExErrorKind::Serialization)
                .with_op("load_options")
                .with_message(msg),
        }
    }
}

impl From<toml::de::Error> for DeviceError {
    fn from(err: toml::de::Error) -> Self {
        DeviceError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_failure_is_backend_rejected() {
        let ex: ExError = DeviceError::Registration {
            address: "mgmt:8080".to_string(),
            reason: "connection refused".to_string(),
        }
        .into();
        assert_eq!(ex.kind(), ExErrorKind::BackendRejected);
        assert_eq!(ex.path(), Some("mgmt:8080"));
        assert!(ex.kind().is_retryable());
    }
}
