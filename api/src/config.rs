use nodelink_rpc_core::error::{RpcError, RpcResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Facade settings. Durations are expressed in milliseconds when (de)serialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ApiConfig {
    /// Upper bound of every call issued by the built-in subscription handlers
    #[serde(with = "millis")]
    pub request_timeout: Duration,
    /// Period of the polling subscription handlers
    #[serde(with = "millis")]
    pub poll_interval: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { request_timeout: DEFAULT_REQUEST_TIMEOUT, poll_interval: DEFAULT_POLL_INTERVAL }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> RpcResult<()> {
        if self.request_timeout.is_zero() {
            return Err(RpcError::Configuration("request-timeout must be greater than zero".to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(RpcError::Configuration("poll-interval must be greater than zero".to_string()));
        }
        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_toml() {
        let config: ApiConfig = toml::from_str("poll-interval = 250").unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_durations_are_rejected() {
        let config = ApiConfig { poll_interval: Duration::ZERO, ..Default::default() };
        assert!(matches!(config.validate(), Err(RpcError::Configuration(_))));
        let config = ApiConfig { request_timeout: Duration::ZERO, ..Default::default() };
        assert!(matches!(config.validate(), Err(RpcError::Configuration(_))));
    }
}
