use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use shared_database::{Collection, StoreError};
use shared_models::auth::{Identity, Role};

use doctor_cell::services::directory::DoctorDirectoryService;
use doctor_cell::DoctorProfile;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest, ViewScope,
    TIME_SLOTS,
};
use crate::AppointmentState;

/// Create/read side of the appointment store. Status changes are not exposed
/// here; they go through the lifecycle service exclusively.
pub struct AppointmentBookingService {
    appointments: Arc<Collection<Uuid, Appointment>>,
    directory: DoctorDirectoryService,
}

impl AppointmentBookingService {
    pub fn new(state: &AppointmentState) -> Self {
        Self::with_parts(Arc::clone(&state.appointments), Arc::clone(&state.doctors))
    }

    pub fn with_parts(
        appointments: Arc<Collection<Uuid, Appointment>>,
        doctors: Arc<Collection<Uuid, DoctorProfile>>,
    ) -> Self {
        Self {
            appointments,
            directory: DoctorDirectoryService::new(doctors),
        }
    }

    /// Book an appointment for the calling patient. The owning uid is taken
    /// from the authenticated identity, never from the payload, so a client
    /// cannot book on behalf of someone else.
    pub async fn book_appointment(
        &self,
        identity: &Identity,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        if identity.role != Role::Patient {
            return Err(AppointmentError::Forbidden(
                "Only patients can book appointments".to_string(),
            ));
        }

        self.validate_booking_request(&request)?;

        let doctor = self
            .directory
            .get_doctor(request.doctor_id)
            .await
            .map_err(|_| AppointmentError::DoctorNotFound)?;

        if !doctor.available {
            return Err(AppointmentError::DoctorUnavailable);
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_uid: identity.uid.clone(),
            patient_name: identity.display_name.clone(),
            patient_contact: request.patient_contact.trim().to_string(),
            doctor_id: doctor.id,
            doctor_name: doctor.name.clone(),
            date: request.date,
            time: request.time,
            reason: request.reason.trim().to_string(),
            status: AppointmentStatus::Pending,
            remarks: None,
            created_at: now,
            updated_at: now,
        };

        self.appointments
            .insert(appointment.id, appointment.clone())
            .await
            .map_err(|e| AppointmentError::StoreError(e.to_string()))?;

        info!(
            "Patient {} booked appointment {} with doctor {}",
            identity.uid, appointment.id, doctor.id
        );
        Ok(appointment)
    }

    pub async fn list(&self, scope: &ViewScope) -> Vec<Appointment> {
        let mut appointments: Vec<Appointment> = self
            .appointments
            .find(|a| scope.includes(a))
            .await
            .into_iter()
            .map(|stored| stored.record)
            .collect();

        // Newest bookings first, matching the dashboard ordering.
        appointments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        appointments
    }

    pub async fn list_for_patient(&self, uid: &str) -> Vec<Appointment> {
        self.list(&ViewScope::Patient(uid.to_string())).await
    }

    pub async fn list_for_doctor(&self, doctor_id: Uuid) -> Vec<Appointment> {
        self.list(&ViewScope::Doctor(doctor_id)).await
    }

    pub async fn list_all(&self) -> Vec<Appointment> {
        self.list(&ViewScope::Admin).await
    }

    /// Fetch a single appointment. Readable only by the owning patient, the
    /// doctor of record, or an admin; everyone else gets `NotFound` so the
    /// record's existence is not leaked.
    pub async fn get(&self, id: Uuid, identity: &Identity) -> Result<Appointment, AppointmentError> {
        let stored = self.appointments.get(&id).await.ok_or(AppointmentError::NotFound)?;

        if !Self::can_view(&stored.record, identity) {
            return Err(AppointmentError::NotFound);
        }

        Ok(stored.record)
    }

    pub async fn delete(&self, id: Uuid, identity: &Identity) -> Result<(), AppointmentError> {
        if !identity.is_admin() {
            return Err(AppointmentError::Forbidden(
                "Only an admin may delete appointments".to_string(),
            ));
        }

        match self.appointments.remove(&id).await {
            Ok(_) => {
                info!("Admin {} deleted appointment {}", identity.uid, id);
                Ok(())
            }
            Err(StoreError::NotFound) => Err(AppointmentError::NotFound),
            Err(e) => Err(AppointmentError::StoreError(e.to_string())),
        }
    }

    pub fn can_view(appointment: &Appointment, identity: &Identity) -> bool {
        identity.is_admin()
            || appointment.patient_uid == identity.uid
            || identity.is_doctor_of(appointment.doctor_id)
    }

    fn validate_booking_request(&self, request: &BookAppointmentRequest) -> Result<(), AppointmentError> {
        if request.reason.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "A reason for the visit is required".to_string(),
            ));
        }
        if request.patient_contact.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "A contact number is required".to_string(),
            ));
        }
        if !TIME_SLOTS.contains(&request.time.as_str()) {
            return Err(AppointmentError::ValidationError(format!(
                "Unknown time slot: {}",
                request.time
            )));
        }

        Ok(())
    }
}
