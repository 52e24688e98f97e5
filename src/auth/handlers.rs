use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        context::RequestContext,
        dto::{LoginRequest, LoginResponse, PublicUser, RegisterRequest},
        errors::GateError,
        extractors::FormJson,
        session::{removal_cookie, session_cookie},
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout).post(logout))
        .route("/auth/check", get(check))
}

/// Public index: signed-in visitors are sent to their landing area.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response, GateError> {
    match state.gate.current_session(&ctx).await? {
        Some(current) => Ok(Redirect::to(current.landing().path()).into_response()),
        None => Ok(Json(serde_json::json!({ "authenticated": false })).into_response()),
    }
}

/// GET /auth/check
/// Reports whether the request carries a live session
#[instrument(skip(state, ctx))]
pub async fn check(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<serde_json::Value>, GateError> {
    let authenticated = state.gate.is_authenticated(&ctx).await?;
    Ok(Json(serde_json::json!({ "authenticated": authenticated })))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    FormJson(payload): FormJson<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), GateError> {
    let user = state.gate.register(payload).await?;
    Ok((StatusCode::CREATED, Json(PublicUser::from(&user))))
}

#[instrument(skip(state, ctx, payload))]
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    FormJson(payload): FormJson<LoginRequest>,
) -> Result<impl IntoResponse, GateError> {
    let outcome = state
        .gate
        .login(&ctx, payload.identifier(), &payload.password)
        .await?;
    let cookie = session_cookie(&state.config.session, &outcome.token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(LoginResponse {
            redirect_to: outcome.landing.path(),
            role: outcome.user.role,
        }),
    ))
}

#[instrument(skip(state, ctx))]
pub async fn logout(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<impl IntoResponse, GateError> {
    state.gate.logout(&ctx).await?;
    let cookie = removal_cookie(&state.config.session);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(serde_json::json!({ "success": true })),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{HeaderValue, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::app::build_app;
    use crate::auth::test_support::MemoryUserRepository;
    use crate::state::AppState;

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn ana_form() -> serde_json::Value {
        serde_json::json!({
            "full_name": "Ana Ruiz",
            "username": "aruiz",
            "email": "ana@example.com",
            "password": "secret123",
            "password_confirm": "secret123",
            "phone": "5551234",
            "country": "MX",
            "terms_accepted": true,
            "role": "administrator"
        })
    }

    /// `name=value` pair from a Set-Cookie header.
    fn cookie_pair(res: &axum::response::Response) -> String {
        let raw = res
            .headers()
            .get("set-cookie")
            .expect("set-cookie")
            .to_str()
            .unwrap();
        raw.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn anonymous_index_is_public() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["authenticated"], false);
    }

    #[tokio::test]
    async fn register_login_index_logout_flow() {
        let app = build_app(AppState::fake());

        let res = app
            .clone()
            .oneshot(json_request("/register", ana_form()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = body_json(res).await;
        assert_eq!(body["role"], "student");
        assert!(body.get("password_hash").is_none());

        let res = app
            .clone()
            .oneshot(json_request(
                "/login",
                serde_json::json!({ "email": "ana@example.com", "password": "secret123" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = cookie_pair(&res);
        assert!(cookie.starts_with("edugate_session="));
        let raw = res.headers()["set-cookie"].to_str().unwrap().to_string();
        assert!(raw.contains("HttpOnly"));
        let body = body_json(res).await;
        assert_eq!(body["redirect_to"], "/student");
        assert_eq!(body["role"], "student");

        let mut req = Request::builder().uri("/").body(Body::empty()).unwrap();
        req.headers_mut()
            .insert("cookie", HeaderValue::from_str(&cookie).unwrap());
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()["location"], "/student");

        let mut req = Request::builder()
            .method("POST")
            .uri("/logout")
            .body(Body::empty())
            .unwrap();
        req.headers_mut()
            .insert("cookie", HeaderValue::from_str(&cookie).unwrap());
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers()["set-cookie"]
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));

        let mut req = Request::builder().uri("/").body(Body::empty()).unwrap();
        req.headers_mut()
            .insert("cookie", HeaderValue::from_str(&cookie).unwrap());
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn check_reports_session_state() {
        let app = build_app(AppState::fake());
        app.clone()
            .oneshot(json_request("/register", ana_form()))
            .await
            .unwrap();
        let res = app
            .clone()
            .oneshot(json_request(
                "/login",
                serde_json::json!({ "username": "aruiz", "password": "secret123" }),
            ))
            .await
            .unwrap();
        let cookie = cookie_pair(&res);

        let res = app
            .clone()
            .oneshot(Request::builder().uri("/auth/check").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(res).await["authenticated"], false);

        let mut req = Request::builder().uri("/auth/check").body(Body::empty()).unwrap();
        req.headers_mut()
            .insert("cookie", HeaderValue::from_str(&cookie).unwrap());
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(body_json(res).await["authenticated"], true);
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let app = build_app(AppState::fake());
        app.clone()
            .oneshot(json_request("/register", ana_form()))
            .await
            .unwrap();

        let res = app
            .oneshot(json_request(
                "/login",
                serde_json::json!({ "identifier": "ana@example.com", "password": "wrongpass" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().get("set-cookie").is_none());
        assert_eq!(body_json(res).await["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn validation_and_conflict_statuses() {
        let users = Arc::new(MemoryUserRepository::default());
        let app = build_app(AppState::fake_with(users.clone()));

        let mut short = ana_form();
        short["password"] = "short1".into();
        short["password_confirm"] = "short1".into();
        let res = app
            .clone()
            .oneshot(json_request("/register", short))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["error"], "password too short");
        assert_eq!(users.count().await, 0);

        let res = app
            .clone()
            .oneshot(json_request("/register", ana_form()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = app
            .oneshot(json_request("/register", ana_form()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn login_with_missing_password_is_a_validation_error() {
        let app = build_app(AppState::fake());
        app.clone()
            .oneshot(json_request("/register", ana_form()))
            .await
            .unwrap();

        let res = app
            .clone()
            .oneshot(json_request(
                "/login",
                serde_json::json!({ "identifier": "ana@example.com" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(res.headers().get("set-cookie").is_none());
        assert_eq!(body_json(res).await["error"], "missing field");

        let res = app
            .oneshot(json_request(
                "/login",
                serde_json::json!({
                    "email": "ana@example.com",
                    "username": "aruiz",
                    "password": "secret123"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_bodies_get_json_errors() {
        let app = build_app(AppState::fake());

        let res = app
            .clone()
            .oneshot(json_request(
                "/register",
                serde_json::json!({ "terms_accepted": "yes" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["error"], "malformed request");

        let req = Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["error"], "malformed request");
    }

    #[tokio::test]
    async fn username_shaped_like_email_is_rejected() {
        let users = Arc::new(MemoryUserRepository::default());
        let app = build_app(AppState::fake_with(users.clone()));

        let mut form = ana_form();
        form["username"] = "someone@example.com".into();
        let res = app
            .oneshot(json_request("/register", form))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["error"], "invalid username");
        assert_eq!(users.count().await, 0);
    }
}
