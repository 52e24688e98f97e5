use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use super::session::parse_session_cookie;
use crate::state::AppState;

/// Per-request view the gate works from: just the session token, if the
/// client sent one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub session_token: Option<String>,
}

#[cfg(test)]
impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            session_token: Some(token.into()),
        }
    }
}

impl RequestContext {
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Self {
        let session_token = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .find_map(|raw| parse_session_cookie(raw, cookie_name));
        Self { session_token }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(RequestContext::from_headers(
            &parts.headers,
            &state.config.session.cookie_name,
        ))
    }
}
