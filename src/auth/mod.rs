use crate::state::AppState;
use axum::Router;

pub mod context;
mod dto;
pub mod errors;
pub(crate) mod extractors;
pub mod gate;
pub mod handlers;
pub mod landing;
mod password;
pub mod repo;
mod repo_types;
pub mod session;
pub mod session_store;
#[cfg(test)]
pub(crate) mod test_support;
mod validation;

pub use dto::PublicUser;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
