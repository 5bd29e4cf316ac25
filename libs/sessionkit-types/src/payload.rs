use serde_json::Value;

use crate::CodecError;

/// Decoded access-token payload.
///
/// Built from raw JSON with defensive sanitization: the core and the SDK may
/// run different protocol versions, so a field of the wrong type is treated
/// as absent rather than trusted, and an absent mandatory field is a
/// structural failure that forces a core round-trip.
#[derive(Debug, Clone)]
pub struct AccessTokenPayload {
    pub session_handle: String,
    pub user_id: String,
    pub refresh_token_hash_1: String,
    /// Present only when this access token was minted by a refresh.
    /// `None` means it is an original, never-refreshed token.
    pub parent_refresh_token_hash_1: Option<String>,
    /// Opaque user data; the SDK stores and returns it, never interprets it.
    pub user_data: Value,
    pub anti_csrf_token: Option<String>,
    /// Epoch milliseconds.
    pub expiry_time: u64,
    /// Epoch milliseconds.
    pub time_created: u64,
}

impl AccessTokenPayload {
    /// Parse a raw payload object, sanitizing field by field.
    pub fn from_value(raw: &Value) -> Result<Self, CodecError> {
        let session_handle = sanitize_string(raw, "sessionHandle")
            .ok_or(CodecError::MissingField("sessionHandle"))?;
        let user_id =
            sanitize_string(raw, "userId").ok_or(CodecError::MissingField("userId"))?;
        let refresh_token_hash_1 = sanitize_string(raw, "refreshTokenHash1")
            .ok_or(CodecError::MissingField("refreshTokenHash1"))?;
        let user_data = raw
            .get("userData")
            .cloned()
            .ok_or(CodecError::MissingField("userData"))?;
        let expiry_time =
            sanitize_number(raw, "expiryTime").ok_or(CodecError::MissingField("expiryTime"))?;
        let time_created =
            sanitize_number(raw, "timeCreated").ok_or(CodecError::MissingField("timeCreated"))?;

        Ok(Self {
            session_handle,
            user_id,
            refresh_token_hash_1,
            parent_refresh_token_hash_1: sanitize_string(raw, "parentRefreshTokenHash1"),
            user_data,
            anti_csrf_token: sanitize_string(raw, "antiCsrfToken"),
            expiry_time,
            time_created,
        })
    }

    /// An original token is one the core issued at session creation,
    /// as opposed to one minted by a refresh.
    pub fn is_original(&self) -> bool {
        self.parent_refresh_token_hash_1.is_none()
    }
}

fn sanitize_string(raw: &Value, field: &str) -> Option<String> {
    raw.get(field)?.as_str().map(|s| s.trim().to_owned())
}

fn sanitize_number(raw: &Value, field: &str) -> Option<u64> {
    raw.get(field)?.as_u64()
}
