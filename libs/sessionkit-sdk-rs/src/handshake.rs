use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;

use sessionkit_types::HandshakeResponse;

use crate::context::UserContext;
use crate::error::QuerierError;
use crate::querier::Querier;
use crate::util::now_millis;

/// Core-reported verification material and session policy.
#[derive(Debug, Clone)]
pub struct HandshakeInfo {
    pub jwt_signing_public_key: String,
    /// Epoch milliseconds.
    pub jwt_signing_public_key_expiry_time: u64,
    pub anti_csrf_enabled: bool,
    pub access_token_blacklisting_enabled: bool,
    pub access_token_validity: u64,
    pub refresh_token_validity: u64,
}

impl HandshakeInfo {
    /// Whether the cached signing key is past its expiry. An expired key
    /// disables local verification until fresher material arrives.
    pub fn key_expired(&self) -> bool {
        self.jwt_signing_public_key_expiry_time <= now_millis()
    }
}

/// Lazily-initialized cache of [`HandshakeInfo`], one per SDK instance.
///
/// There is deliberately no single-flight guard on initialization:
/// concurrent cold-start callers may each fetch and the last write wins.
/// That is safe because a fetched value only ever improves on the previous
/// one, and every caller still ends up with a valid instance.
pub struct HandshakeCache {
    inner: RwLock<Option<HandshakeInfo>>,
}

impl HandshakeCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Current info, fetching from the core's handshake endpoint if absent.
    pub async fn get(
        &self,
        querier: &Querier,
        ctx: &UserContext,
    ) -> Result<HandshakeInfo, QuerierError> {
        if let Some(info) = self.inner.read().await.clone() {
            return Ok(info);
        }

        let response = querier.send_post("/handshake", json!({}), ctx).await?;
        let parsed: HandshakeResponse = serde_json::from_value(response)
            .map_err(|e| QuerierError::BadResponse(format!("handshake response: {e}")))?;
        let info = HandshakeInfo {
            jwt_signing_public_key: parsed.jwt_signing_public_key,
            jwt_signing_public_key_expiry_time: parsed.jwt_signing_public_key_expiry_time,
            anti_csrf_enabled: parsed.anti_csrf_enabled,
            access_token_blacklisting_enabled: parsed.access_token_blacklisting_enabled,
            access_token_validity: parsed.access_token_validity,
            refresh_token_validity: parsed.refresh_token_validity,
        };
        debug!(
            key_expiry = info.jwt_signing_public_key_expiry_time,
            anti_csrf = info.anti_csrf_enabled,
            "fetched handshake info from core"
        );

        *self.inner.write().await = Some(info.clone());
        Ok(info)
    }

    /// Patch in the key material a session call just returned. Callers only
    /// pass values freshly received from the core, so the supplied pair is
    /// always taken as-is.
    pub async fn update_key_info(&self, new_key: &str, new_expiry: u64) {
        if let Some(info) = self.inner.write().await.as_mut() {
            if info.jwt_signing_public_key != new_key
                || info.jwt_signing_public_key_expiry_time != new_expiry
            {
                debug!(key_expiry = new_expiry, "updated signing key from session response");
            }
            info.jwt_signing_public_key = new_key.to_owned();
            info.jwt_signing_public_key_expiry_time = new_expiry;
        }
    }

    /// Seed the cache without a network call. Used at init by deployments
    /// that pin key material, and by tests.
    pub async fn seed(&self, info: HandshakeInfo) {
        *self.inner.write().await = Some(info);
    }

    /// Drop the cached instance. Test lifecycle hook.
    pub async fn reset(&self) {
        *self.inner.write().await = None;
    }
}

impl Default for HandshakeCache {
    fn default() -> Self {
        Self::new()
    }
}
