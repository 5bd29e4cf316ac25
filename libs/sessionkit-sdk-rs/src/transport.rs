//! Token transport rules: how access/refresh tokens travel between the
//! client and the embedding application (cookies vs headers), and how the
//! two transports are reconciled when both carry tokens.

use sessionkit_types::TokenInfo;

use crate::error::SessionError;

pub const ACCESS_TOKEN_COOKIE: &str = "sk_access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "sk_refresh_token";
pub const ACCESS_TOKEN_HEADER: &str = "sk-access-token";
pub const REFRESH_TOKEN_HEADER: &str = "sk-refresh-token";
pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const AUTH_MODE_HEADER: &str = "auth-mode";
pub const ANTI_CSRF_HEADER: &str = "anti-csrf";

/// How tokens travel for a given call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTransferMethod {
    Cookie,
    Header,
    /// Either transport accepted; the header value wins when both are
    /// present.
    Any,
}

impl TokenTransferMethod {
    /// Parse a client-advertised `auth-mode` header. Unknown values mean no
    /// preference.
    pub fn from_auth_mode(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "cookie" => Self::Cookie,
            "header" => Self::Header,
            _ => Self::Any,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    fn cookie_name(self) -> &'static str {
        match self {
            Self::Access => ACCESS_TOKEN_COOKIE,
            Self::Refresh => REFRESH_TOKEN_COOKIE,
        }
    }

    fn header_name(self) -> &'static str {
        match self {
            Self::Access => ACCESS_TOKEN_HEADER,
            Self::Refresh => REFRESH_TOKEN_HEADER,
        }
    }
}

/// Context handed to the configured transfer-method selector.
#[derive(Debug, Clone)]
pub struct TransferSelectorInput {
    /// True for create-session calls, false for verify/refresh.
    pub for_create_new_session: bool,
    /// Raw `auth-mode` header from the request, when present.
    pub auth_mode_header: Option<String>,
}

/// Default selector: honor the client's `auth-mode` header, otherwise
/// accept either transport.
pub fn default_transfer_method(input: &TransferSelectorInput) -> TokenTransferMethod {
    input
        .auth_mode_header
        .as_deref()
        .map(TokenTransferMethod::from_auth_mode)
        .unwrap_or(TokenTransferMethod::Any)
}

/// Framework-agnostic view of an incoming request. Implement this for your
/// framework's request type; the SDK only ever reads headers and cookies.
pub trait RequestInfo {
    fn get_header(&self, name: &str) -> Option<String>;
    fn get_cookie(&self, name: &str) -> Option<String>;
}

/// Transport mutation the caller's adapter must apply to its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenInstruction {
    SetCookie {
        name: &'static str,
        value: String,
        /// Epoch milliseconds.
        expiry: u64,
        path: String,
        domain: Option<String>,
        secure: bool,
    },
    ClearCookie {
        name: &'static str,
    },
    SetHeader {
        name: &'static str,
        value: String,
    },
    ClearHeader {
        name: &'static str,
    },
}

fn token_from_header(req: &impl RequestInfo, token_type: TokenType) -> Option<String> {
    if token_type == TokenType::Access {
        if let Some(auth) = req.get_header(AUTHORIZATION_HEADER) {
            if let Some(token) = auth.strip_prefix("Bearer ") {
                return Some(token.trim().to_owned());
            }
        }
    }
    req.get_header(token_type.header_name())
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
}

fn token_from_cookie(req: &impl RequestInfo, token_type: TokenType) -> Option<String> {
    req.get_cookie(token_type.cookie_name())
        .filter(|t| !t.is_empty())
}

/// Look for a token in the transports `allowed` permits. Returns the token
/// and the transport it actually came from. With `Any`, the header value is
/// authoritative when both transports carry a token.
pub fn extract_token(
    req: &impl RequestInfo,
    token_type: TokenType,
    allowed: TokenTransferMethod,
) -> Option<(String, TokenTransferMethod)> {
    match allowed {
        TokenTransferMethod::Header => {
            token_from_header(req, token_type).map(|t| (t, TokenTransferMethod::Header))
        }
        TokenTransferMethod::Cookie => {
            token_from_cookie(req, token_type).map(|t| (t, TokenTransferMethod::Cookie))
        }
        TokenTransferMethod::Any => token_from_header(req, token_type)
            .map(|t| (t, TokenTransferMethod::Header))
            .or_else(|| {
                token_from_cookie(req, token_type).map(|t| (t, TokenTransferMethod::Cookie))
            }),
    }
}

/// Access token required by the resolved transport, or `Unauthorised`.
pub fn require_access_token(
    req: &impl RequestInfo,
    allowed: TokenTransferMethod,
) -> Result<(String, TokenTransferMethod), SessionError> {
    extract_token(req, TokenType::Access, allowed).ok_or_else(|| SessionError::Unauthorised {
        message: "no access token found in the required transport".into(),
    })
}

/// Resolved plan for a refresh call.
#[derive(Debug)]
pub struct RefreshPlan {
    pub refresh_token: String,
    /// The transport the session continues on: `Cookie` or `Header`.
    pub used: TokenTransferMethod,
    /// Instructions clearing the transport the session does *not* continue
    /// on, so the two transports never diverge into half-sessions.
    pub clear: Vec<TokenInstruction>,
}

/// Decide which transport a refresh proceeds on.
///
/// With `Any`, whichever single transport carries a refresh token is used
/// exclusively and the other is cleared; when both carry one, the header is
/// authoritative and the cookie copy is cleared.
pub fn refresh_transport_plan(
    req: &impl RequestInfo,
    allowed: TokenTransferMethod,
) -> Result<RefreshPlan, SessionError> {
    let header_token = token_from_header(req, TokenType::Refresh);
    let cookie_token = token_from_cookie(req, TokenType::Refresh);

    let (refresh_token, used) = match allowed {
        TokenTransferMethod::Header => (header_token, TokenTransferMethod::Header),
        TokenTransferMethod::Cookie => (cookie_token.clone(), TokenTransferMethod::Cookie),
        TokenTransferMethod::Any => match (&header_token, &cookie_token) {
            (Some(t), _) => (Some(t.clone()), TokenTransferMethod::Header),
            (None, Some(t)) => (Some(t.clone()), TokenTransferMethod::Cookie),
            (None, None) => (None, TokenTransferMethod::Any),
        },
    };

    let refresh_token = refresh_token.ok_or_else(|| SessionError::Unauthorised {
        message: "no refresh token found in the required transport".into(),
    })?;

    // In Any mode the session continues on one transport exclusively; the
    // other side is cleared so the two can never diverge into half-sessions.
    let clear = match (allowed, used) {
        (TokenTransferMethod::Any, TokenTransferMethod::Header) => {
            clear_token_instructions(TokenTransferMethod::Cookie)
        }
        (TokenTransferMethod::Any, TokenTransferMethod::Cookie) => {
            clear_token_instructions(TokenTransferMethod::Header)
        }
        _ => Vec::new(),
    };

    Ok(RefreshPlan {
        refresh_token,
        used,
        clear,
    })
}

/// Instructions attaching a fresh token bundle via the given transport.
/// `Any` resolves to headers, the modern default.
pub fn set_token_instructions(
    access: &TokenInfo,
    refresh: &TokenInfo,
    method: TokenTransferMethod,
) -> Vec<TokenInstruction> {
    match method {
        TokenTransferMethod::Cookie => vec![
            TokenInstruction::SetCookie {
                name: ACCESS_TOKEN_COOKIE,
                value: access.token.clone(),
                expiry: access.expiry,
                path: access.cookie_path.clone(),
                domain: access.domain.clone(),
                secure: access.cookie_secure,
            },
            TokenInstruction::SetCookie {
                name: REFRESH_TOKEN_COOKIE,
                value: refresh.token.clone(),
                expiry: refresh.expiry,
                path: refresh.cookie_path.clone(),
                domain: refresh.domain.clone(),
                secure: refresh.cookie_secure,
            },
        ],
        TokenTransferMethod::Header | TokenTransferMethod::Any => vec![
            TokenInstruction::SetHeader {
                name: ACCESS_TOKEN_HEADER,
                value: access.token.clone(),
            },
            TokenInstruction::SetHeader {
                name: REFRESH_TOKEN_HEADER,
                value: refresh.token.clone(),
            },
        ],
    }
}

/// Instruction re-attaching just the access token, for verify calls where
/// the core re-minted one mid-session.
pub fn set_access_token_instruction(
    access: &TokenInfo,
    method: TokenTransferMethod,
) -> TokenInstruction {
    match method {
        TokenTransferMethod::Cookie => TokenInstruction::SetCookie {
            name: ACCESS_TOKEN_COOKIE,
            value: access.token.clone(),
            expiry: access.expiry,
            path: access.cookie_path.clone(),
            domain: access.domain.clone(),
            secure: access.cookie_secure,
        },
        TokenTransferMethod::Header | TokenTransferMethod::Any => TokenInstruction::SetHeader {
            name: ACCESS_TOKEN_HEADER,
            value: access.token.clone(),
        },
    }
}

/// Instructions clearing every token the given transport may hold. Used on
/// `Unauthorised` and on the unused side of a refresh.
pub fn clear_token_instructions(method: TokenTransferMethod) -> Vec<TokenInstruction> {
    match method {
        TokenTransferMethod::Cookie => vec![
            TokenInstruction::ClearCookie {
                name: ACCESS_TOKEN_COOKIE,
            },
            TokenInstruction::ClearCookie {
                name: REFRESH_TOKEN_COOKIE,
            },
        ],
        TokenTransferMethod::Header => vec![
            TokenInstruction::ClearHeader {
                name: ACCESS_TOKEN_HEADER,
            },
            TokenInstruction::ClearHeader {
                name: REFRESH_TOKEN_HEADER,
            },
        ],
        TokenTransferMethod::Any => {
            let mut all = clear_token_instructions(TokenTransferMethod::Cookie);
            all.extend(clear_token_instructions(TokenTransferMethod::Header));
            all
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MockRequest {
        headers: HashMap<String, String>,
        cookies: HashMap<String, String>,
    }

    impl MockRequest {
        fn with_header(mut self, name: &str, value: &str) -> Self {
            self.headers.insert(name.to_owned(), value.to_owned());
            self
        }

        fn with_cookie(mut self, name: &str, value: &str) -> Self {
            self.cookies.insert(name.to_owned(), value.to_owned());
            self
        }
    }

    impl RequestInfo for MockRequest {
        fn get_header(&self, name: &str) -> Option<String> {
            self.headers.get(name).cloned()
        }

        fn get_cookie(&self, name: &str) -> Option<String> {
            self.cookies.get(name).cloned()
        }
    }

    #[test]
    fn test_auth_mode_parsing() {
        assert_eq!(
            TokenTransferMethod::from_auth_mode(" Cookie "),
            TokenTransferMethod::Cookie
        );
        assert_eq!(
            TokenTransferMethod::from_auth_mode("header"),
            TokenTransferMethod::Header
        );
        assert_eq!(
            TokenTransferMethod::from_auth_mode("whatever"),
            TokenTransferMethod::Any
        );
    }

    #[test]
    fn test_bearer_header_extraction() {
        let req = MockRequest::default().with_header(AUTHORIZATION_HEADER, "Bearer tok-1");
        let (token, used) =
            extract_token(&req, TokenType::Access, TokenTransferMethod::Any).unwrap();
        assert_eq!(token, "tok-1");
        assert_eq!(used, TokenTransferMethod::Header);
    }

    #[test]
    fn test_header_wins_when_both_present_in_any_mode() {
        let req = MockRequest::default()
            .with_header(AUTHORIZATION_HEADER, "Bearer from-header")
            .with_cookie(ACCESS_TOKEN_COOKIE, "from-cookie");
        let (token, used) =
            extract_token(&req, TokenType::Access, TokenTransferMethod::Any).unwrap();
        assert_eq!(token, "from-header");
        assert_eq!(used, TokenTransferMethod::Header);
    }

    #[test]
    fn test_cookie_mode_ignores_header() {
        let req = MockRequest::default()
            .with_header(AUTHORIZATION_HEADER, "Bearer from-header")
            .with_cookie(ACCESS_TOKEN_COOKIE, "from-cookie");
        let (token, used) =
            extract_token(&req, TokenType::Access, TokenTransferMethod::Cookie).unwrap();
        assert_eq!(token, "from-cookie");
        assert_eq!(used, TokenTransferMethod::Cookie);
    }

    #[test]
    fn test_missing_required_token_is_unauthorised() {
        let req = MockRequest::default().with_cookie(ACCESS_TOKEN_COOKIE, "tok");
        let err = require_access_token(&req, TokenTransferMethod::Header).unwrap_err();
        assert!(matches!(err, SessionError::Unauthorised { .. }));
    }

    #[test]
    fn test_refresh_plan_single_transport_clears_other() {
        let req = MockRequest::default().with_cookie(REFRESH_TOKEN_COOKIE, "rt-cookie");
        let plan = refresh_transport_plan(&req, TokenTransferMethod::Any).unwrap();
        assert_eq!(plan.refresh_token, "rt-cookie");
        assert_eq!(plan.used, TokenTransferMethod::Cookie);
        assert_eq!(
            plan.clear,
            clear_token_instructions(TokenTransferMethod::Header)
        );
    }

    #[test]
    fn test_refresh_plan_both_transports_header_wins() {
        let req = MockRequest::default()
            .with_header(REFRESH_TOKEN_HEADER, "rt-header")
            .with_cookie(REFRESH_TOKEN_COOKIE, "rt-cookie");
        let plan = refresh_transport_plan(&req, TokenTransferMethod::Any).unwrap();
        assert_eq!(plan.refresh_token, "rt-header");
        assert_eq!(plan.used, TokenTransferMethod::Header);
        assert_eq!(
            plan.clear,
            clear_token_instructions(TokenTransferMethod::Cookie)
        );
    }

    #[test]
    fn test_refresh_plan_no_token_is_unauthorised() {
        let req = MockRequest::default();
        let err = refresh_transport_plan(&req, TokenTransferMethod::Any).unwrap_err();
        assert!(matches!(err, SessionError::Unauthorised { .. }));
    }

    #[test]
    fn test_set_instructions_cookie_transport() {
        let token = |t: &str, path: &str| TokenInfo {
            token: t.into(),
            expiry: 99,
            created_time: 1,
            cookie_path: path.into(),
            cookie_secure: true,
            domain: None,
            same_site: Some("lax".into()),
        };
        let instructions = set_token_instructions(
            &token("at", "/"),
            &token("rt", "/auth/refresh"),
            TokenTransferMethod::Cookie,
        );
        assert_eq!(instructions.len(), 2);
        match &instructions[1] {
            TokenInstruction::SetCookie { name, value, path, .. } => {
                assert_eq!(*name, REFRESH_TOKEN_COOKIE);
                assert_eq!(value, "rt");
                assert_eq!(path, "/auth/refresh");
            }
            other => panic!("expected SetCookie, got {other:?}"),
        }
    }
}
