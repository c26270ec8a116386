use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::AppointmentState;
use doctor_cell::DoctorState;
use identity_cell::IdentityState;
use shared_config::AppConfig;
use shared_database::Collection;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Rajana Hospital API server");

    let config = Arc::new(AppConfig::from_env());

    // The three record collections are the only shared mutable state; every
    // cell borrows the subset it needs.
    let identities = Arc::new(Collection::new("identities"));
    let doctors = Arc::new(Collection::new("doctors"));
    let appointments = Arc::new(Collection::new("appointments"));

    let identity_state = Arc::new(IdentityState {
        config: Arc::clone(&config),
        identities,
        doctors: Arc::clone(&doctors),
    });
    let doctor_state = Arc::new(DoctorState {
        doctors: Arc::clone(&doctors),
    });
    let appointment_state = Arc::new(AppointmentState {
        appointments,
        doctors,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(identity_state, doctor_state, appointment_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
