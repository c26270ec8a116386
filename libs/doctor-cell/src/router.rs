use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers;
use crate::DoctorState;

/// Doctor directory routes. Authentication is layered on by the application
/// router, so every handler can rely on an `Identity` extension being present.
pub fn doctor_routes(state: Arc<DoctorState>) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/", post(handlers::add_doctor))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route("/{doctor_id}", delete(handlers::remove_doctor))
        .with_state(state)
}
