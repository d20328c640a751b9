//! # Register Configuration
//!
//! Configuration for the collaborator endpoints and the tax recompute
//! timing.
//!
//! ## Configuration File Format
//! ```toml
//! # register.toml (loaded by the embedding application)
//! [backoffice]
//! url = "https://backoffice.local/api"
//! request_timeout_secs = 15
//!
//! [tax]
//! debounce_ms = 400        # quiet period before a recompute fires
//! call_timeout_secs = 10   # abort window for a hung tax call
//! ```
//!
//! The embedding application owns where the values come from (file, env,
//! database); this crate only defines the shape, the defaults, and the
//! bounds.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{RegisterError, RegisterResult};

/// Bounds for the tax debounce quiet period, in milliseconds.
///
/// Below 300 ms the register hammers the tax service on every keystroke;
/// above 500 ms the totals visibly lag the cart.
pub const TAX_DEBOUNCE_MIN_MS: u64 = 300;
pub const TAX_DEBOUNCE_MAX_MS: u64 = 500;

/// Register configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterConfig {
    /// Base URL of the backoffice API hosting the tax, sales, and returns
    /// endpoints.
    pub backoffice_url: String,

    /// Per-request timeout for checkout/returns collaborator calls.
    pub request_timeout_secs: u64,

    /// Quiet period after the last cart mutation before the tax
    /// recompute fires.
    pub tax_debounce_ms: u64,

    /// Abort window for an in-flight tax call, so a hung request cannot
    /// block the next one from landing.
    pub tax_call_timeout_secs: u64,
}

impl Default for RegisterConfig {
    fn default() -> Self {
        RegisterConfig {
            backoffice_url: "http://127.0.0.1:8470/api".to_string(),
            request_timeout_secs: 15,
            tax_debounce_ms: 400,
            tax_call_timeout_secs: 10,
        }
    }
}

impl RegisterConfig {
    /// Validates the configuration.
    ///
    /// ## Rules
    /// - backoffice URL must be present and http(s)
    /// - the tax debounce must stay inside [300, 500] ms
    /// - timeouts must be positive
    pub fn validate(&self) -> RegisterResult<()> {
        if self.backoffice_url.trim().is_empty() {
            return Err(RegisterError::InvalidConfig(
                "backoffice URL is required".into(),
            ));
        }

        if !self.backoffice_url.starts_with("http://") && !self.backoffice_url.starts_with("https://")
        {
            return Err(RegisterError::InvalidConfig(format!(
                "backoffice URL must be http(s): {}",
                self.backoffice_url
            )));
        }

        if !(TAX_DEBOUNCE_MIN_MS..=TAX_DEBOUNCE_MAX_MS).contains(&self.tax_debounce_ms) {
            return Err(RegisterError::InvalidConfig(format!(
                "tax debounce must be between {} and {} ms, got {}",
                TAX_DEBOUNCE_MIN_MS, TAX_DEBOUNCE_MAX_MS, self.tax_debounce_ms
            )));
        }

        if self.request_timeout_secs == 0 || self.tax_call_timeout_secs == 0 {
            return Err(RegisterError::InvalidConfig(
                "timeouts must be positive".into(),
            ));
        }

        Ok(())
    }

    /// The tax debounce quiet period as a Duration.
    pub fn tax_debounce(&self) -> Duration {
        Duration::from_millis(self.tax_debounce_ms)
    }

    /// The tax call abort window as a Duration.
    pub fn tax_call_timeout(&self) -> Duration {
        Duration::from_secs(self.tax_call_timeout_secs)
    }

    /// The checkout/returns request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RegisterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tax_debounce(), Duration::from_millis(400));
    }

    #[test]
    fn test_debounce_bounds() {
        let mut config = RegisterConfig::default();

        config.tax_debounce_ms = 300;
        assert!(config.validate().is_ok());
        config.tax_debounce_ms = 500;
        assert!(config.validate().is_ok());

        config.tax_debounce_ms = 299;
        assert!(config.validate().is_err());
        config.tax_debounce_ms = 501;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_url_required() {
        let mut config = RegisterConfig::default();

        config.backoffice_url = "".into();
        assert!(config.validate().is_err());

        config.backoffice_url = "ftp://nope".into();
        assert!(config.validate().is_err());

        config.backoffice_url = "https://backoffice.local/api".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = RegisterConfig::default();
        config.tax_call_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
