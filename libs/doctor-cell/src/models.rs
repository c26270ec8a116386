use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directory record describing a doctor, independent of whether that doctor
/// has ever logged in. Seeded by an admin; linked to an identity on the
/// doctor's first login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorProfile {
    pub id: Uuid,
    /// Written at most once, when a principal with a matching contact email
    /// first authenticates. First writer wins.
    pub identity_uid: Option<String>,
    pub name: String,
    pub specialty: String,
    pub contact_email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDoctorRequest {
    pub name: String,
    pub specialty: String,
    pub contact_email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub available: Option<bool>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Doctor with email {0} already exists")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    StoreError(String),
}
