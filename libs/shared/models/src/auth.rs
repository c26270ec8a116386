use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

/// The authenticated caller as attested by the identity provider.
/// Carries no role: roles are assigned by the identity resolver, never
/// read back from the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Doctor => write!(f, "doctor"),
            Role::Patient => write!(f, "patient"),
        }
    }
}

/// The persisted principal-to-role binding. Exactly one per uid, created on
/// first successful login and immutable afterwards except `display_name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    /// Set when this identity is linked to a doctor profile.
    pub doctor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_doctor_of(&self, doctor_id: Uuid) -> bool {
        self.role == Role::Doctor && self.doctor_id == Some(doctor_id)
    }
}
