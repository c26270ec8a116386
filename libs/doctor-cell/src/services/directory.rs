use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{Collection, StoreError};

use crate::models::{AddDoctorRequest, DoctorError, DoctorProfile};

/// Outcome of attempting to link a profile to an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// This caller wrote the link.
    Linked,
    /// The link to the same uid was already present; nothing written.
    AlreadyLinked,
    /// The profile is already claimed by a different identity.
    ClaimedByOther,
}

pub struct DoctorDirectoryService {
    doctors: Arc<Collection<Uuid, DoctorProfile>>,
}

impl DoctorDirectoryService {
    pub fn new(doctors: Arc<Collection<Uuid, DoctorProfile>>) -> Self {
        Self { doctors }
    }

    pub async fn add_doctor(&self, request: AddDoctorRequest) -> Result<DoctorProfile, DoctorError> {
        let name = request.name.trim();
        let specialty = request.specialty.trim();
        let email = request.contact_email.trim().to_lowercase();

        if name.is_empty() {
            return Err(DoctorError::ValidationError("Doctor name is required".to_string()));
        }
        if specialty.is_empty() {
            return Err(DoctorError::ValidationError("Specialty is required".to_string()));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(DoctorError::ValidationError(
                "A valid contact email is required".to_string(),
            ));
        }

        if self.find_by_email(&email).await.is_some() {
            return Err(DoctorError::AlreadyExists(email));
        }

        let now = Utc::now();
        let profile = DoctorProfile {
            id: Uuid::new_v4(),
            identity_uid: None,
            name: name.to_string(),
            specialty: specialty.to_string(),
            contact_email: email,
            phone: request.phone,
            bio: request.bio,
            available: request.available.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        self.doctors
            .insert(profile.id, profile.clone())
            .await
            .map_err(|e| DoctorError::StoreError(e.to_string()))?;

        info!("Seeded doctor profile {} ({})", profile.id, profile.name);
        Ok(profile)
    }

    pub async fn list_doctors(&self) -> Vec<DoctorProfile> {
        let mut doctors: Vec<DoctorProfile> = self
            .doctors
            .find(|_| true)
            .await
            .into_iter()
            .map(|stored| stored.record)
            .collect();

        doctors.sort_by(|a, b| a.name.cmp(&b.name));
        doctors
    }

    pub async fn get_doctor(&self, id: Uuid) -> Result<DoctorProfile, DoctorError> {
        self.doctors
            .get(&id)
            .await
            .map(|stored| stored.record)
            .ok_or(DoctorError::NotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> Option<DoctorProfile> {
        self.doctors
            .find(|d| d.contact_email.eq_ignore_ascii_case(email))
            .await
            .into_iter()
            .map(|stored| stored.record)
            .next()
    }

    /// Link a profile to the identity that just authenticated with its
    /// contact email. The link is written at most once: a resolver losing the
    /// race re-reads and observes the winner's link instead of overwriting.
    pub async fn link_identity(&self, doctor_id: Uuid, uid: &str) -> Result<LinkOutcome, DoctorError> {
        loop {
            let stored = self.doctors.get(&doctor_id).await.ok_or(DoctorError::NotFound)?;

            match stored.record.identity_uid.as_deref() {
                Some(existing) if existing == uid => return Ok(LinkOutcome::AlreadyLinked),
                Some(existing) => {
                    warn!(
                        "Doctor profile {} already claimed by identity {}, not overwriting",
                        doctor_id, existing
                    );
                    return Ok(LinkOutcome::ClaimedByOther);
                }
                None => {}
            }

            let mut profile = stored.record;
            profile.identity_uid = Some(uid.to_string());
            profile.updated_at = Utc::now();

            match self.doctors.update(&doctor_id, stored.version, profile).await {
                Ok(_) => {
                    info!("Linked doctor profile {} to identity {}", doctor_id, uid);
                    return Ok(LinkOutcome::Linked);
                }
                Err(StoreError::VersionMismatch { .. }) => {
                    debug!("Lost profile-link race for doctor {}, re-reading", doctor_id);
                    continue;
                }
                Err(StoreError::NotFound) => return Err(DoctorError::NotFound),
                Err(e) => return Err(DoctorError::StoreError(e.to_string())),
            }
        }
    }

    pub async fn remove_doctor(&self, id: Uuid) -> Result<(), DoctorError> {
        match self.doctors.remove(&id).await {
            Ok(_) => {
                info!("Removed doctor profile {}", id);
                Ok(())
            }
            Err(StoreError::NotFound) => Err(DoctorError::NotFound),
            Err(e) => Err(DoctorError::StoreError(e.to_string())),
        }
    }
}
