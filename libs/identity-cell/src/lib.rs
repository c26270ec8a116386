pub mod extractor;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use services::resolver::IdentityResolverService;

use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::Collection;
use shared_models::auth::Identity;

use doctor_cell::DoctorProfile;

/// Shared state for identity resolution: the persisted identity records plus
/// the doctor directory consulted during role assignment.
pub struct IdentityState {
    pub config: Arc<AppConfig>,
    pub identities: Arc<Collection<String, Identity>>,
    pub doctors: Arc<Collection<uuid::Uuid, DoctorProfile>>,
}
