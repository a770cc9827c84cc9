//! Routing service configuration.
//!
//! Defaults are embedded at compile time from `services/osrm.toml`.
//! `OSRM_BASE_URL` and `OSRM_TIMEOUT_SECS` override them at runtime.

use std::time::Duration;

use serde::Deserialize;

use crate::{RetryPolicy, RouteError};

const EMBEDDED_TOML: &str = include_str!("../services/osrm.toml");

/// Where and how to request routes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoutingConfig {
    /// Service root, e.g. `"http://router.project-osrm.org"`.
    pub base_url: String,
    /// OSRM profile segment of the URL.
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Per-attempt request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_profile() -> String {
    "driving".to_owned()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl RoutingConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Config`] if the TOML is malformed or fails
    /// [`Self::validate`].
    pub fn from_toml(toml_str: &str) -> Result<Self, RouteError> {
        let config: Self = toml::de::from_str(toml_str).map_err(|e| RouteError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// The configuration compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Config`] if the embedded TOML is invalid.
    pub fn embedded() -> Result<Self, RouteError> {
        Self::from_toml(EMBEDDED_TOML)
    }

    /// The embedded configuration with environment overrides applied.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Config`] if the embedded TOML or an override
    /// is invalid.
    pub fn from_env() -> Result<Self, RouteError> {
        Self::embedded()?.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `OSRM_BASE_URL` and `OSRM_TIMEOUT_SECS` as read by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Config`] if an override is invalid.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, RouteError> {
        if let Some(url) = lookup("OSRM_BASE_URL") {
            self.base_url = url;
        }
        if let Some(secs) = lookup("OSRM_TIMEOUT_SECS") {
            self.timeout_secs = secs.trim().parse().map_err(|e| RouteError::Config {
                message: format!("OSRM_TIMEOUT_SECS '{secs}': {e}"),
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks that the values can actually be used.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<(), RouteError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(RouteError::Config {
                message: format!("base_url must be an http(s) URL, got '{}'", self.base_url),
            });
        }
        if self.profile.is_empty() || self.profile.contains('/') {
            return Err(RouteError::Config {
                message: format!("invalid profile '{}'", self.profile),
            });
        }
        if self.timeout_secs == 0 {
            return Err(RouteError::Config {
                message: "timeout_secs must be positive".to_owned(),
            });
        }
        if !self.retry.backoff_factor.is_finite() || self.retry.backoff_factor < 0.0 {
            return Err(RouteError::Config {
                message: format!(
                    "retry.backoff_factor must be a non-negative number, got {}",
                    self.retry.backoff_factor
                ),
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_matches_default_policy() {
        let config = RoutingConfig::embedded().unwrap();
        assert_eq!(config.base_url, "http://router.project-osrm.org");
        assert_eq!(config.profile, "driving");
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn retry_table_is_optional() {
        let config = RoutingConfig::from_toml("base_url = \"http://localhost:5000\"").unwrap();
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn env_overrides_apply() {
        let config = RoutingConfig::embedded()
            .unwrap()
            .with_overrides(|key| match key {
                "OSRM_BASE_URL" => Some("https://osrm.example.org".to_owned()),
                "OSRM_TIMEOUT_SECS" => Some("5".to_owned()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.base_url, "https://osrm.example.org");
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn rejects_bad_timeout_override() {
        let err = RoutingConfig::embedded()
            .unwrap()
            .with_overrides(|key| (key == "OSRM_TIMEOUT_SECS").then(|| "soon".to_owned()))
            .unwrap_err();
        assert!(matches!(err, RouteError::Config { .. }));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = RoutingConfig::from_toml("base_url = \"router.project-osrm.org\"").unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn rejects_negative_backoff() {
        let err = RoutingConfig::from_toml(
            "base_url = \"http://localhost\"\n[retry]\nbackoff_factor = -1.0\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("backoff_factor"));
    }
}
