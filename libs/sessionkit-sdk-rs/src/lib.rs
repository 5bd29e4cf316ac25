//! Rust SDK for the SessionKit session core.
//!
//! This SDK drives a SessionKit core service from Rust backends: it creates,
//! verifies, refreshes, and revokes sessions, and turns the results into
//! framework-agnostic cookie/header instructions.
//!
//! # Features
//!
//! - **Local verification** - Verify access tokens against cached signing
//!   keys, skipping the network entirely on the hot path
//! - **Theft detection** - Refresh-token reuse surfaces as
//!   [`SessionError::TokenTheftDetected`]
//! - **Multi-host querier** - Round-robin over core hosts with failover,
//!   rate-limit retries, and API version negotiation
//!
//! # Example
//!
//! ```rust,ignore
//! use sessionkit_sdk::{Host, SdkConfig, SessionClient, UserContext};
//!
//! let client = SessionClient::new(SdkConfig::new(vec![
//!     Host::new("https://core.example.com", ""),
//! ]))?;
//!
//! let ctx = UserContext::new();
//! let verified = client.get_session(access_token, None, true, &ctx).await?;
//! println!("User ID: {}", verified.session.user_id);
//! ```

mod config;
mod context;
mod error;
mod handshake;
mod querier;
mod session;
mod transport;
mod util;

pub use config::{Host, NetworkInterceptor, SdkConfig, TransferMethodSelector};
pub use context::UserContext;
pub use error::{QuerierError, SessionError};
pub use handshake::{HandshakeCache, HandshakeInfo};
pub use querier::{OutgoingRequest, Querier, SUPPORTED_API_VERSIONS};
pub use session::{CreatedSession, Session, SessionClient, VerifiedSession};
pub use transport::{
    clear_token_instructions, default_transfer_method, extract_token, refresh_transport_plan,
    require_access_token, set_access_token_instruction, set_token_instructions, RefreshPlan,
    RequestInfo, TokenInstruction, TokenTransferMethod, TokenType, TransferSelectorInput,
    ACCESS_TOKEN_COOKIE, ACCESS_TOKEN_HEADER, ANTI_CSRF_HEADER, AUTH_MODE_HEADER,
    AUTHORIZATION_HEADER, REFRESH_TOKEN_COOKIE, REFRESH_TOKEN_HEADER,
};

// Re-export shared types for convenience
pub use sessionkit_types::{
    decode_and_verify, decode_unverified, AccessTokenPayload, CodecError,
    CreateOrRefreshResponse, SessionInfo, SessionStatus, TokenInfo, VerifyResponse,
};
