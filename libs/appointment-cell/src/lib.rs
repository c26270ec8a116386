pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;

use std::sync::Arc;

use shared_database::Collection;
use uuid::Uuid;

use doctor_cell::DoctorProfile;

/// Shared state for the appointment routes: the appointment records plus the
/// doctor directory consulted at booking time.
pub struct AppointmentState {
    pub appointments: Arc<Collection<Uuid, models::Appointment>>,
    pub doctors: Arc<Collection<Uuid, DoctorProfile>>,
}
