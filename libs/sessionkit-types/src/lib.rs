//! Shared types and token primitives for SessionKit.
//!
//! This crate provides:
//! - The access-token payload structure and its defensive parsing rules
//! - The three-segment signed token codec (`decode_and_verify`)
//! - Wire types for the core's session API responses
//! - The codec error taxonomy

mod codec;
mod errors;
mod payload;
mod responses;

pub use codec::{decode_and_verify, decode_unverified, mint_token, public_key_to_pem, TOKEN_VERSION};
pub use errors::CodecError;
pub use payload::AccessTokenPayload;
pub use responses::{
    CreateOrRefreshResponse, HandshakeResponse, SessionInfo, SessionStatus, TokenInfo,
    VerifyResponse,
};
