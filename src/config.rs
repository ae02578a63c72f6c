// ⚙️ Portal Configuration
//
// Everything has a default, so the portal runs with no environment at all.
// `from_env` lets a demo override the accepted pair, the simulated
// settlement latency and the server bind address.

use crate::error::{PortalError, PortalResult};
use crate::session::Credentials;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default accepted EB number
pub const DEFAULT_EB_NUMBER: &str = "123123123";

/// Default accepted password
pub const DEFAULT_PASSWORD: &str = "admin";

/// Simulated payment processing time
pub const DEFAULT_SETTLEMENT_DELAY: Duration = Duration::from_millis(2000);

/// Usage (kWh) that fills the usage bar completely
pub const DEFAULT_USAGE_CEILING_KWH: u32 = 400;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

pub const ENV_SETTLEMENT_MS: &str = "PORTAL_SETTLEMENT_MS";
pub const ENV_BIND: &str = "PORTAL_BIND";
pub const ENV_EB_NUMBER: &str = "PORTAL_EB_NUMBER";
pub const ENV_PASSWORD: &str = "PORTAL_PASSWORD";
pub const ENV_LOG_FILE: &str = "PORTAL_LOG_FILE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalConfig {
    /// The single credential pair the login gate accepts
    pub accepted: Credentials,

    /// How long a payment stays in flight before it settles
    #[serde(with = "duration_millis")]
    pub settlement_delay: Duration,

    pub usage_ceiling_kwh: u32,

    /// Address for the HTTP server (server mode only)
    pub bind_addr: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        PortalConfig {
            accepted: Credentials::new(DEFAULT_EB_NUMBER, DEFAULT_PASSWORD),
            settlement_delay: DEFAULT_SETTLEMENT_DELAY,
            usage_ceiling_kwh: DEFAULT_USAGE_CEILING_KWH,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl PortalConfig {
    /// Defaults overridden by `PORTAL_*` environment variables
    pub fn from_env() -> PortalResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, but reads variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> PortalResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = PortalConfig::default();

        if let Some(raw) = lookup(ENV_SETTLEMENT_MS) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                PortalError::Config(format!("{} must be milliseconds, got {:?}", ENV_SETTLEMENT_MS, raw))
            })?;
            config.settlement_delay = Duration::from_millis(millis);
        }

        if let Some(addr) = lookup(ENV_BIND) {
            if addr.trim().is_empty() {
                return Err(PortalError::Config(format!("{} is empty", ENV_BIND)));
            }
            config.bind_addr = addr.trim().to_string();
        }

        match (lookup(ENV_EB_NUMBER), lookup(ENV_PASSWORD)) {
            (None, None) => {}
            (Some(identifier), Some(secret)) => {
                if identifier.is_empty() || secret.is_empty() {
                    return Err(PortalError::Config(
                        "accepted credentials must not be empty".to_string(),
                    ));
                }
                config.accepted = Credentials::new(identifier, secret);
            }
            _ => {
                return Err(PortalError::Config(format!(
                    "{} and {} must be set together",
                    ENV_EB_NUMBER, ENV_PASSWORD
                )))
            }
        }

        Ok(config)
    }
}

pub(crate) mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_demo_portal() {
        let config = PortalConfig::default();
        assert_eq!(config.accepted.identifier, "123123123");
        assert_eq!(config.accepted.secret, "admin");
        assert_eq!(config.settlement_delay, Duration::from_secs(2));
        assert_eq!(config.usage_ceiling_kwh, 400);
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let config = PortalConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, PortalConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = PortalConfig::from_lookup(lookup_from(&[
            (ENV_SETTLEMENT_MS, "50"),
            (ENV_BIND, "127.0.0.1:8080"),
            (ENV_EB_NUMBER, "999"),
            (ENV_PASSWORD, "secret"),
        ]))
        .unwrap();

        assert_eq!(config.settlement_delay, Duration::from_millis(50));
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.accepted, Credentials::new("999", "secret"));
    }

    #[test]
    fn test_invalid_delay_rejected() {
        let result = PortalConfig::from_lookup(lookup_from(&[(ENV_SETTLEMENT_MS, "soon")]));
        assert!(matches!(result, Err(PortalError::Config(_))));
    }

    #[test]
    fn test_half_credential_override_rejected() {
        let result = PortalConfig::from_lookup(lookup_from(&[(ENV_EB_NUMBER, "999")]));
        assert!(matches!(result, Err(PortalError::Config(_))));
    }

    #[test]
    fn test_config_json_uses_millis() {
        let json = serde_json::to_value(PortalConfig::default()).unwrap();
        assert_eq!(json["settlement_delay"], 2000);
    }
}
