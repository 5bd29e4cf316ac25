use std::sync::Arc;

use crate::error::QuerierError;
use crate::querier::OutgoingRequest;
use crate::transport::{TokenTransferMethod, TransferSelectorInput};

/// One core host: `{domain, base_path}`. The querier round-robins over the
/// configured list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    domain: String,
    base_path: String,
}

impl Host {
    /// `domain` includes the scheme (e.g. `http://localhost:3567`);
    /// `base_path` may be empty. Trailing slashes are normalized away.
    pub fn new(domain: impl Into<String>, base_path: impl Into<String>) -> Self {
        let domain = domain.into().trim_end_matches('/').to_owned();
        let mut base_path = base_path.into().trim_end_matches('/').to_owned();
        if !base_path.is_empty() && !base_path.starts_with('/') {
            base_path.insert(0, '/');
        }
        Self { domain, base_path }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}{}", self.domain, self.base_path, path)
    }
}

/// Hook invoked immediately before every outbound attempt (retries
/// included); may rewrite URL, headers, params, or body.
pub type NetworkInterceptor = Arc<dyn Fn(OutgoingRequest) -> OutgoingRequest + Send + Sync>;

/// Selects the token transport for a call. Given per-request context,
/// returns `Header`, `Cookie`, or `Any`.
pub type TransferMethodSelector =
    Arc<dyn Fn(&TransferSelectorInput) -> TokenTransferMethod + Send + Sync>;

/// SDK configuration, supplied by the embedding application at init time.
#[derive(Clone)]
pub struct SdkConfig {
    /// Core hosts, rotated over per attempt. Must be non-empty.
    pub hosts: Vec<Host>,
    /// Static API key sent as the `api-key` header when set.
    pub api_key: Option<String>,
    /// Recipe id sent as the `rid` header when set (multi-recipe cores).
    pub recipe_id: Option<String>,
    /// Disables the per-call GET response cache globally.
    pub disable_core_call_cache: bool,
    pub token_transfer_selector: Option<TransferMethodSelector>,
    pub network_interceptor: Option<NetworkInterceptor>,
}

impl SdkConfig {
    pub fn new(hosts: Vec<Host>) -> Self {
        Self {
            hosts,
            api_key: None,
            recipe_id: None,
            disable_core_call_cache: false,
            token_transfer_selector: None,
            network_interceptor: None,
        }
    }

    pub fn validate(&self) -> Result<(), QuerierError> {
        if self.hosts.is_empty() {
            return Err(QuerierError::Config(
                "at least one core host is required".into(),
            ));
        }
        if let Some(key) = &self.api_key {
            if key.trim().is_empty() {
                return Err(QuerierError::Config("api_key must not be blank".into()));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for SdkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkConfig")
            .field("hosts", &self.hosts)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("recipe_id", &self.recipe_id)
            .field("disable_core_call_cache", &self.disable_core_call_cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_normalization() {
        let host = Host::new("http://localhost:3567/", "base/");
        assert_eq!(host.url_for("/session"), "http://localhost:3567/base/session");

        let host = Host::new("https://core.example.com", "");
        assert_eq!(host.url_for("/handshake"), "https://core.example.com/handshake");
    }

    #[test]
    fn test_empty_hosts_rejected() {
        let config = SdkConfig::new(vec![]);
        assert!(matches!(config.validate(), Err(QuerierError::Config(_))));
    }

    #[test]
    fn test_blank_api_key_rejected() {
        let mut config = SdkConfig::new(vec![Host::new("http://localhost:3567", "")]);
        config.api_key = Some("  ".into());
        assert!(matches!(config.validate(), Err(QuerierError::Config(_))));
    }
}
