pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use services::directory::{DoctorDirectoryService, LinkOutcome};

use std::sync::Arc;

use shared_database::Collection;

/// Shared state for the doctor directory routes.
pub struct DoctorState {
    pub doctors: Arc<Collection<uuid::Uuid, models::DoctorProfile>>,
}
