use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{Collection, StoreError};
use shared_models::auth::Identity;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::services::booking::AppointmentBookingService;
use crate::AppointmentState;

/// The appointment state machine. Centralizing all status writes here is what
/// keeps a patient client (or a buggy doctor client) from jumping straight to
/// `completed` or reviving a cancelled record.
pub struct AppointmentLifecycleService {
    appointments: Arc<Collection<Uuid, Appointment>>,
}

impl AppointmentLifecycleService {
    pub fn new(state: &AppointmentState) -> Self {
        Self::with_parts(Arc::clone(&state.appointments))
    }

    pub fn with_parts(appointments: Arc<Collection<Uuid, Appointment>>) -> Self {
        Self { appointments }
    }

    /// Legal next statuses for a given current status. `rescheduled`,
    /// `completed` and `cancelled` are terminal; a rescheduled appointment is
    /// rebooked as a new record, never reopened.
    pub fn valid_transitions(current: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current {
            AppointmentStatus::Pending => &[
                AppointmentStatus::Confirmed,
                AppointmentStatus::Rescheduled,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Confirmed => &[
                AppointmentStatus::Completed,
                AppointmentStatus::Rescheduled,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Rescheduled
            | AppointmentStatus::Completed
            | AppointmentStatus::Cancelled => &[],
        }
    }

    pub fn is_legal(current: AppointmentStatus, target: AppointmentStatus) -> bool {
        Self::valid_transitions(current).contains(&target)
    }

    /// Apply a status transition. Only the doctor of record or an admin may
    /// transition; the read-validate-write cycle is guarded by a version
    /// check so two racing callers cannot both win against the same state.
    pub async fn transition(
        &self,
        appointment_id: Uuid,
        target: AppointmentStatus,
        identity: &Identity,
        remarks: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        let stored = self
            .appointments
            .get(&appointment_id)
            .await
            .ok_or(AppointmentError::NotFound)?;
        let current = stored.record.status;

        if !identity.is_admin() && !identity.is_doctor_of(stored.record.doctor_id) {
            // The owning patient learns they may not transition; anyone else
            // is not even told the record exists.
            if AppointmentBookingService::can_view(&stored.record, identity) {
                return Err(AppointmentError::Forbidden(
                    "Only the doctor of record or an admin may change appointment status"
                        .to_string(),
                ));
            }
            return Err(AppointmentError::NotFound);
        }

        // Idempotent retry: re-requesting the current status is a no-op
        // success, so a client resending after a dropped ack sees no error
        // and no spurious updated_at bump.
        if current == target {
            debug!(
                "Appointment {} already {}, treating transition as no-op",
                appointment_id, target
            );
            return Ok(stored.record);
        }

        if !Self::is_legal(current, target) {
            warn!(
                "Rejected illegal transition {} -> {} on appointment {}",
                current, target, appointment_id
            );
            return Err(AppointmentError::InvalidTransition {
                from: current,
                to: target,
            });
        }

        let remarks = remarks.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        if target == AppointmentStatus::Rescheduled && remarks.is_none() {
            return Err(AppointmentError::ValidationError(
                "Rescheduling requires remarks for the patient".to_string(),
            ));
        }

        let mut updated = stored.record.clone();
        updated.status = target;
        if remarks.is_some() {
            updated.remarks = remarks;
        }
        updated.updated_at = Utc::now();

        match self
            .appointments
            .update(&appointment_id, stored.version, updated)
            .await
        {
            Ok(committed) => {
                info!(
                    "Appointment {} transitioned {} -> {} by {}",
                    appointment_id, current, target, identity.uid
                );
                Ok(committed.record)
            }
            // Someone else committed first; the caller must re-read and
            // decide against fresh state rather than have us guess.
            Err(StoreError::VersionMismatch { .. }) => Err(AppointmentError::Conflict),
            Err(StoreError::NotFound) => Err(AppointmentError::NotFound),
            Err(e) => Err(AppointmentError::StoreError(e.to_string())),
        }
    }
}
