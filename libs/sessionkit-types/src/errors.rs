use thiserror::Error;

/// Access-token codec errors.
///
/// Every variant is structural: it means the token could not be trusted
/// locally, not that the session is invalid. The protocol layer downgrades
/// all of these to a "try refresh" outcome and falls back to a core-side
/// verification.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Token is not three dot-separated base64url segments.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Header segment does not match the canonical token header.
    /// Usually means a protocol version mismatch, not forgery.
    #[error("Unexpected token header")]
    HeaderMismatch,

    /// Signature did not verify against the supplied public key.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// A mandatory payload field is absent or has the wrong type.
    #[error("Missing or invalid payload field: {0}")]
    MissingField(&'static str),

    /// Token expiry is in the past.
    #[error("Token has expired")]
    Expired,

    /// Key material could not be used.
    #[error("Invalid public key: {0}")]
    InvalidKey(String),
}
