use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_models::auth::Identity;
use shared_models::error::AppError;

/// Bookable half-hour slots, matching the front-end picker.
pub const TIME_SLOTS: [&str; 12] = [
    "09:00 AM", "09:30 AM", "10:00 AM", "10:30 AM", "11:00 AM", "11:30 AM",
    "02:00 PM", "02:30 PM", "03:00 PM", "03:30 PM", "04:00 PM", "04:30 PM",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    /// Always the uid of the identity that created the booking; never taken
    /// from the request payload.
    pub patient_uid: String,
    pub patient_name: String,
    pub patient_contact: String,
    pub doctor_id: Uuid,
    /// Snapshot of the doctor's name at creation time. Deliberately not a
    /// live join, so later renames don't rewrite history.
    pub doctor_name: String,
    pub date: NaiveDate,
    pub time: String,
    pub reason: String,
    pub status: AppointmentStatus,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Rescheduled,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    pub reason: String,
    pub patient_contact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub target_status: AppointmentStatus,
    pub remarks: Option<String>,
}

/// A role-scoped view over the appointment set. Built from the wire form
/// (`mine` | `doctor:<id>` | `all`) only after the caller's identity has been
/// checked against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewScope {
    Patient(String),
    Doctor(Uuid),
    Admin,
}

impl ViewScope {
    /// Parse and authorize a scope parameter against the caller. `mine` is
    /// always the caller's own uid; the other scopes need doctor-of-record
    /// or admin standing.
    pub fn authorize(param: &str, identity: &Identity) -> Result<Self, AppointmentError> {
        match param {
            "mine" => Ok(ViewScope::Patient(identity.uid.clone())),
            "all" => {
                if identity.is_admin() {
                    Ok(ViewScope::Admin)
                } else {
                    Err(AppointmentError::Forbidden(
                        "Only an admin may view all appointments".to_string(),
                    ))
                }
            }
            other => {
                let doctor_id = other
                    .strip_prefix("doctor:")
                    .and_then(|id| id.parse::<Uuid>().ok())
                    .ok_or_else(|| {
                        AppointmentError::ValidationError(format!("Invalid scope: {}", other))
                    })?;

                if identity.is_admin() || identity.is_doctor_of(doctor_id) {
                    Ok(ViewScope::Doctor(doctor_id))
                } else {
                    Err(AppointmentError::Forbidden(
                        "Not authorized for this doctor's appointments".to_string(),
                    ))
                }
            }
        }
    }

    pub fn includes(&self, appointment: &Appointment) -> bool {
        match self {
            ViewScope::Patient(uid) => appointment.patient_uid == *uid,
            ViewScope::Doctor(id) => appointment.doctor_id == *id,
            ViewScope::Admin => true,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Doctor is not accepting appointments")]
    DoctorUnavailable,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Appointment was modified concurrently, retry with fresh state")]
    Conflict,

    #[error("Store error: {0}")]
    StoreError(String),
}

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
            AppointmentError::DoctorUnavailable => {
                AppError::ValidationError("Doctor is not accepting appointments".to_string())
            }
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::InvalidTransition { from, to } => {
                AppError::InvalidTransition(format!("{} -> {}", from, to))
            }
            AppointmentError::Forbidden(msg) => AppError::Forbidden(msg),
            AppointmentError::Conflict => AppError::Conflict(
                "Appointment was modified concurrently, retry with fresh state".to_string(),
            ),
            AppointmentError::StoreError(msg) => AppError::Unavailable(msg),
        }
    }
}
