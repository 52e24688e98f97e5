use axum::{
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    auth::{extractors::CurrentSession, landing::Landing, PublicUser},
    state::AppState,
};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin))
        .route("/teacher", get(teacher))
        .route("/student", get(student))
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub area: Landing,
    pub user: PublicUser,
}

/// Serves `area` to sessions whose role lands there; everyone else is sent
/// to the area they may reach.
fn enter(area: Landing, CurrentSession(current): CurrentSession) -> Response {
    let allowed = current.landing();
    if allowed != area {
        debug!(user_id = %current.user.id, ?area, ?allowed, "area not reachable for role");
        return Redirect::to(allowed.path()).into_response();
    }
    Json(DashboardResponse {
        area,
        user: PublicUser::from(&current.user),
    })
    .into_response()
}

#[instrument(skip_all)]
pub async fn admin(current: CurrentSession) -> Response {
    enter(Landing::Admin, current)
}

#[instrument(skip_all)]
pub async fn teacher(current: CurrentSession) -> Response {
    enter(Landing::Teacher, current)
}

#[instrument(skip_all)]
pub async fn student(current: CurrentSession) -> Response {
    enter(Landing::Student, current)
}
