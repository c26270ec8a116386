use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use appointment_cell::router::appointment_routes;
use appointment_cell::AppointmentState;
use doctor_cell::router::doctor_routes;
use doctor_cell::DoctorState;
use identity_cell::extractor::identity_middleware;
use identity_cell::router::identity_routes;
use identity_cell::IdentityState;

pub fn create_router(
    identity_state: Arc<IdentityState>,
    doctor_state: Arc<DoctorState>,
    appointment_state: Arc<AppointmentState>,
) -> Router {
    // Everything except the liveness probe sits behind the identity
    // middleware, so handlers always see a resolved Identity extension.
    let protected_routes = Router::new()
        .nest("/identity", identity_routes())
        .nest("/doctors", doctor_routes(doctor_state))
        .nest("/appointments", appointment_routes(appointment_state))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&identity_state),
            identity_middleware,
        ));

    Router::new()
        .route("/", get(|| async { "Rajana Hospital API is running!" }))
        .merge(protected_routes)
}
