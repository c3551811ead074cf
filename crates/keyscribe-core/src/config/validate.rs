//! Configuration validation with range and format checks.

use crate::error::ConfigError;
use crate::output::OutputFormat;
use std::net::SocketAddr;

use super::Config;

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.proxy.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "proxy.bind must be a socket address, got {:?}",
                self.proxy.bind
            )));
        }
        if !self.proxy.route.starts_with('/') || self.proxy.route == "/generate" {
            return Err(ConfigError::ValidationError(
                "proxy.route must start with '/' and must not be /generate".into(),
            ));
        }
        if !is_http_url(&self.proxy.upstream_url) {
            return Err(ConfigError::ValidationError(
                "proxy.upstream_url must be an http(s) URL".into(),
            ));
        }
        if !is_http_url(&self.client.proxy_url) {
            return Err(ConfigError::ValidationError(
                "client.proxy_url must be an http(s) URL".into(),
            ));
        }
        if self.proxy.timeout_ms == Some(0) {
            return Err(ConfigError::ValidationError(
                "proxy.timeout_ms must be > 0 when set".into(),
            ));
        }
        if self.client.timeout_ms == Some(0) {
            return Err(ConfigError::ValidationError(
                "client.timeout_ms must be > 0 when set".into(),
            ));
        }
        if self.models.caption.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "models.caption must not be empty".into(),
            ));
        }
        if self.models.keyphrase.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "models.keyphrase must not be empty".into(),
            ));
        }
        if self.limits.max_upload_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_upload_mb must be > 0".into(),
            ));
        }
        if OutputFormat::parse(&self.output.format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be text, json or jsonl, got {:?}",
                self.output.format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_bind() {
        let mut config = Config::default();
        config.proxy.bind = "localhost".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("proxy.bind"));
    }

    #[test]
    fn test_validate_rejects_route_without_slash() {
        let mut config = Config::default();
        config.proxy.route = "image-proxy".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("proxy.route"));
    }

    #[test]
    fn test_validate_rejects_non_http_upstream() {
        let mut config = Config::default();
        config.proxy.upstream_url = "ftp://example.com".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("upstream_url"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.client.timeout_ms = Some(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("client.timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_unknown_output_format() {
        let mut config = Config::default();
        config.output.format = "yaml".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output.format"));
    }

    #[test]
    fn test_validate_rejects_blank_model() {
        let mut config = Config::default();
        config.models.keyphrase = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("models.keyphrase"));
    }
}
