//! Logging initialization module

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Environment variable selecting the logging profile
pub const PROFILE_ENV: &str = "NODECONF_LOG_PROFILE";

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output for development
    Development,
    /// JSON structured output for production
    Production,
    /// Test capture mode for deterministic testing
    Test,
}

impl Profile {
    /// Parse a profile name (`development`, `production`, `test`)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Profile::Development),
            "production" | "prod" => Some(Profile::Production),
            "test" => Some(Profile::Test),
            _ => None,
        }
    }

    /// Profile named by `NODECONF_LOG_PROFILE`, falling back to Development
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV)
            .ok()
            .and_then(|name| Self::parse(&name))
            .unwrap_or(Profile::Development)
    }

    fn default_directive(&self) -> &'static str {
        match self {
            Profile::Development => "nodeconf=debug",
            Profile::Production => "nodeconf=info",
            Profile::Test => "nodeconf=trace",
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Call once at application startup. `RUST_LOG` overrides the profile's
/// default filter directive.
///
/// # Profiles
///
/// - **Development**: Human-readable logs with debug level
/// - **Production**: JSON structured logs with info level
/// - **Test**: Bare registry; tests attach a capture layer instead
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(profile.default_directive()));
        match profile {
            Profile::Development => {
                tracing_subscriber::fmt().with_env_filter(filter).init();
            }
            Profile::Production => {
                tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(filter)
                    .init();
            }
            Profile::Test => {
                // Test capture is initialized separately via init_test_capture()
                let _ = tracing_subscriber::registry().try_init();
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init(Profile::Test);
        init(Profile::Test);
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("production"), Some(Profile::Production));
        assert_eq!(Profile::parse(" Dev "), Some(Profile::Development));
        assert_eq!(Profile::parse("test"), Some(Profile::Test));
        assert_eq!(Profile::parse("verbose"), None);
    }
}
