use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol status reported by the core on session endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Ok,
    Unauthorised,
    TryRefreshToken,
    TokenTheftDetected,
    /// Forward compatibility: a status string this SDK does not know.
    #[serde(other)]
    Unknown,
}

/// A token plus the transport attributes the core wants applied to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub token: String,
    /// Epoch milliseconds.
    pub expiry: u64,
    /// Epoch milliseconds.
    pub created_time: u64,
    pub cookie_path: String,
    pub cookie_secure: bool,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub same_site: Option<String>,
}

/// Identity of a session as the core reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub handle: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userDataInJWT", default)]
    pub user_data_in_jwt: Value,
}

/// Response body of the create and refresh endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrRefreshResponse {
    pub status: SessionStatus,
    pub session: SessionInfo,
    pub access_token: TokenInfo,
    pub refresh_token: TokenInfo,
    pub id_refresh_token: TokenInfo,
    #[serde(default)]
    pub anti_csrf_token: Option<String>,
    #[serde(default)]
    pub jwt_signing_public_key: Option<String>,
    #[serde(default)]
    pub jwt_signing_public_key_expiry_time: Option<u64>,
}

/// Response body of the verify endpoint. `session` and `access_token` are
/// present only on `OK`; `access_token` only when the core re-minted one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub status: SessionStatus,
    #[serde(default)]
    pub session: Option<SessionInfo>,
    #[serde(default)]
    pub access_token: Option<TokenInfo>,
    #[serde(default)]
    pub jwt_signing_public_key: Option<String>,
    #[serde(default)]
    pub jwt_signing_public_key_expiry_time: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response body of the handshake endpoint: the core's current verification
/// material and session policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeResponse {
    pub status: SessionStatus,
    pub jwt_signing_public_key: String,
    pub jwt_signing_public_key_expiry_time: u64,
    pub anti_csrf_enabled: bool,
    pub access_token_blacklisting_enabled: bool,
    pub access_token_validity: u64,
    pub refresh_token_validity: u64,
}
