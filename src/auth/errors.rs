use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

/// Why a form was rejected. Registration checks run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationKind {
    #[error("missing field")]
    MissingField,
    #[error("invalid email")]
    InvalidEmail,
    #[error("invalid username")]
    InvalidUsername,
    #[error("password mismatch")]
    PasswordMismatch,
    #[error("password too short")]
    PasswordTooShort,
    #[error("terms not accepted")]
    TermsNotAccepted,
    /// Body was not JSON of the expected shape.
    #[error("malformed request")]
    MalformedRequest,
}

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("{0}")]
    Validation(#[from] ValidationKind),

    /// Unknown identifier and wrong password both end up here.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("duplicate user")]
    Conflict,

    #[error("infrastructure error: {0:#}")]
    Infrastructure(#[from] anyhow::Error),
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            GateError::Validation(_) => StatusCode::BAD_REQUEST,
            GateError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            GateError::Conflict => StatusCode::CONFLICT,
            GateError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the end user.
    pub fn public_message(&self) -> String {
        match self {
            GateError::Validation(kind) => kind.to_string(),
            GateError::InvalidCredentials => "Invalid credentials".into(),
            GateError::Conflict => "Username or email already registered".into(),
            GateError::Infrastructure(_) => "Something went wrong, please try again later".into(),
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        if let GateError::Infrastructure(e) = &self {
            error!(error = %format!("{e:#}"), "infrastructure failure");
        }
        let body = Json(serde_json::json!({
            "error": self.public_message()
        }));
        (self.status(), body).into_response()
    }
}
