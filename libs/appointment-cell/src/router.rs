use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers;
use crate::AppointmentState;

/// Appointment routes. Authentication is layered on by the application
/// router, so every handler can rely on an `Identity` extension being present.
pub fn appointment_routes(state: Arc<AppointmentState>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/", get(handlers::list_appointments))
        .route("/stream", get(handlers::stream_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}", delete(handlers::delete_appointment))
        .route("/{appointment_id}/transition", post(handlers::transition_appointment))
        .with_state(state)
}
