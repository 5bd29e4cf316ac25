use thiserror::Error;

/// Failures of the network layer.
///
/// Everything here is GENERAL-class from the protocol's point of view:
/// fatal to the current call but not an authentication verdict.
#[derive(Debug, Error)]
pub enum QuerierError {
    /// Every configured host refused or dropped the connection.
    #[error("No core host reachable after {hosts_tried} attempts: {last_error}")]
    NoCoreAvailable {
        hosts_tried: usize,
        last_error: String,
    },

    /// The core kept rate-limiting after all retries. Carries the core's
    /// error body verbatim.
    #[error("Core rate limited the request (status {status}): {body}")]
    RateLimited { status: u16, body: String },

    /// Non-2xx response other than rate limiting. Not retried.
    #[error("Core responded with status {status}: {body}")]
    CoreError { status: u16, body: String },

    /// The core and this SDK share no API version. Non-retryable
    /// configuration error.
    #[error("No mutually supported API version (core: {core_versions:?}, sdk: {sdk_versions:?})")]
    IncompatibleCoreVersion {
        core_versions: Vec<String>,
        sdk_versions: Vec<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The core answered 2xx with a body this SDK cannot interpret.
    #[error("Unexpected response from core: {0}")]
    BadResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Session protocol outcomes that are not success.
///
/// Modeled as named variants rather than a status field so callers have to
/// handle each case: clear tokens on `Unauthorised`, attempt a refresh on
/// `TryRefreshToken`, treat `TokenTheftDetected` as a security incident.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session is invalid or gone. Client-side tokens should be cleared.
    #[error("Unauthorised: {message}")]
    Unauthorised { message: String },

    /// Access token is stale or unverifiable but the session may still be
    /// salvageable via the refresh token. Tokens are not cleared.
    #[error("Access token must be refreshed: {message}")]
    TryRefreshToken { message: String },

    /// The core detected reuse of an already-rotated refresh token.
    #[error("Token theft detected for session {session_handle} (user {user_id})")]
    TokenTheftDetected {
        session_handle: String,
        user_id: String,
    },

    /// Core unreachable, misconfiguration, version incompatibility.
    #[error(transparent)]
    General(#[from] QuerierError),
}

impl SessionError {
    pub(crate) fn bad_response(context: impl Into<String>) -> Self {
        SessionError::General(QuerierError::BadResponse(context.into()))
    }
}
