use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{
    context::RequestContext,
    errors::{GateError, ValidationKind},
    gate::Authenticated,
};
use crate::state::AppState;

/// JSON request body whose rejections surface as `GateError` responses
/// instead of axum's plain-text ones.
pub struct FormJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for FormJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(FormJson(value)),
            Err(rejection) => {
                debug!(error = %rejection.body_text(), "request body rejected");
                Err(ValidationKind::MalformedRequest.into())
            }
        }
    }
}

/// Extracts an authenticated session, sending anonymous visitors back to the
/// public index. Also refreshes the session's idle clock.
pub struct CurrentSession(pub Authenticated);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ctx = RequestContext::from_headers(&parts.headers, &state.config.session.cookie_name);

        let current = state
            .gate
            .current_session(&ctx)
            .await
            .map_err(IntoResponse::into_response)?
            .ok_or_else(|| Redirect::to("/").into_response())?;

        if let Err(e) = state.gate.touch(&ctx).await {
            warn!(error = %e, "refreshing session idle clock failed");
        }

        Ok(CurrentSession(current))
    }
}
