use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_models::auth::Identity;
use shared_models::error::AppError;

use crate::models::{AddDoctorRequest, DoctorError};
use crate::services::directory::DoctorDirectoryService;
use crate::DoctorState;

impl From<DoctorError> for AppError {
    fn from(e: DoctorError) -> Self {
        match e {
            DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::AlreadyExists(email) => {
                AppError::Conflict(format!("Doctor with email {} already exists", email))
            }
            DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
            DoctorError::StoreError(msg) => AppError::Unavailable(msg),
        }
    }
}

/// List the doctor directory. Any authenticated caller may read it; the
/// booking form is populated from this list.
#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<DoctorState>>,
    Extension(_identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    let directory = DoctorDirectoryService::new(Arc::clone(&state.doctors));
    let doctors = directory.list_doctors().await;

    Ok(Json(json!({
        "doctors": doctors,
        "count": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<DoctorState>>,
    Extension(_identity): Extension<Identity>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let directory = DoctorDirectoryService::new(Arc::clone(&state.doctors));
    let doctor = directory.get_doctor(doctor_id).await?;

    Ok(Json(json!({ "doctor": doctor })))
}

/// Seed a doctor profile. Admin only; this is the explicit role-grant path
/// that replaces any email-pattern guessing at login time.
#[axum::debug_handler]
pub async fn add_doctor(
    State(state): State<Arc<DoctorState>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<AddDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    if !identity.is_admin() {
        return Err(AppError::Forbidden(
            "Only an admin may add doctor profiles".to_string(),
        ));
    }

    let directory = DoctorDirectoryService::new(Arc::clone(&state.doctors));
    let doctor = directory.add_doctor(request).await?;

    info!("Admin {} added doctor profile {}", identity.uid, doctor.id);

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn remove_doctor(
    State(state): State<Arc<DoctorState>>,
    Extension(identity): Extension<Identity>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !identity.is_admin() {
        return Err(AppError::Forbidden(
            "Only an admin may remove doctor profiles".to_string(),
        ));
    }

    let directory = DoctorDirectoryService::new(Arc::clone(&state.doctors));
    directory.remove_doctor(doctor_id).await?;

    info!("Admin {} removed doctor profile {}", identity.uid, doctor_id);

    Ok(Json(json!({ "success": true })))
}
