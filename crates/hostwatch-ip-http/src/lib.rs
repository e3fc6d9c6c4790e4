// # HTTP External IP Lookup
//
// This crate resolves the host's externally visible address by asking a
// public IP-echo service over HTTPS.
//
// ## Architecture
//
// One GET per lookup against the family-specific endpoint. The service
// answers `{"ip": "<string>"}` with HTTP 200; anything else (transport
// failure, non-success status, malformed body) is an error which the
// coordinator swallows, keeping the prior value.
//
// ## Endpoints
//
// The defaults are api.ipify.org (v4) and api64.ipify.org (v6); both
// URLs are configuration, not constants, so a deployment can point at
// any compatible echo service.

use async_trait::async_trait;
use hostwatch_core::config::LookupConfig;
use hostwatch_core::traits::{ExternalIpLookup, IpFamily};
use hostwatch_core::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Response body of a compatible IP-echo service
#[derive(Debug, Deserialize)]
struct EchoBody {
    ip: String,
}

/// HTTPS-based external IP lookup
pub struct HttpIpLookup {
    /// v4 endpoint
    v4_url: String,

    /// v6 endpoint
    v6_url: String,

    /// HTTP client (shared connection pool, request timeout applied)
    client: reqwest::Client,
}

impl HttpIpLookup {
    /// Create a lookup from configuration
    pub fn new(config: &LookupConfig) -> Self {
        Self::with_urls(
            config.v4_url.clone(),
            config.v6_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Create a lookup with explicit endpoints and timeout
    pub fn with_urls(v4_url: String, v6_url: String, timeout: Duration) -> Self {
        Self {
            v4_url,
            v6_url,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    fn url_for(&self, family: IpFamily) -> &str {
        match family {
            IpFamily::V4 => &self.v4_url,
            IpFamily::V6 => &self.v6_url,
        }
    }
}

#[async_trait]
impl ExternalIpLookup for HttpIpLookup {
    async fn lookup(&self, family: IpFamily) -> Result<String> {
        let url = self.url_for(family);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::http(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::http(format!("HTTP {}", response.status())));
        }

        let body: EchoBody = response
            .json()
            .await
            .map_err(|e| Error::http(format!("malformed body: {}", e)))?;

        debug!(%family, address = %body.ip, "external address resolved");
        Ok(body.ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_body_parses() {
        let body: EchoBody = serde_json::from_str(r#"{"ip":"1.2.3.4"}"#).unwrap();
        assert_eq!(body.ip, "1.2.3.4");
    }

    #[test]
    fn echo_body_without_ip_field_fails() {
        let result: std::result::Result<EchoBody, _> =
            serde_json::from_str(r#"{"address":"1.2.3.4"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn url_selection_follows_family() {
        let lookup = HttpIpLookup::with_urls(
            "https://v4.example/json".to_string(),
            "https://v6.example/json".to_string(),
            Duration::from_secs(10),
        );
        assert_eq!(lookup.url_for(IpFamily::V4), "https://v4.example/json");
        assert_eq!(lookup.url_for(IpFamily::V6), "https://v6.example/json");
    }

    #[test]
    fn default_config_builds() {
        let config = LookupConfig::default();
        let lookup = HttpIpLookup::new(&config);
        assert!(lookup.url_for(IpFamily::V4).contains("ipify"));
    }
}
