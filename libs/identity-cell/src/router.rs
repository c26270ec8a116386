use axum::{routing::post, Router};

use crate::handlers;

pub fn identity_routes() -> Router {
    Router::new().route("/resolve", post(handlers::resolve_identity))
}
