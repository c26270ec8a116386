use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{Collection, StoreError};
use shared_models::auth::{Identity, Principal, Role};

use doctor_cell::services::directory::{DoctorDirectoryService, LinkOutcome};
use doctor_cell::DoctorProfile;

use crate::models::IdentityError;
use crate::IdentityState;

/// Assigns a role and profile linkage to an authenticated principal, exactly
/// once per uid. Resolution is an ordered cascade; the first matching rule
/// wins and the result is persisted before it is returned.
///
/// The legacy email-pattern fallback that promoted arbitrary signups to the
/// doctor role is deliberately absent: doctor role is granted only through an
/// admin-seeded profile whose contact email matches.
pub struct IdentityResolverService {
    admin_email: String,
    identities: Arc<Collection<String, Identity>>,
    directory: DoctorDirectoryService,
}

impl IdentityResolverService {
    pub fn new(state: &IdentityState) -> Self {
        Self::with_parts(
            state.config.admin_email.clone(),
            Arc::clone(&state.identities),
            Arc::clone(&state.doctors),
        )
    }

    pub fn with_parts(
        admin_email: String,
        identities: Arc<Collection<String, Identity>>,
        doctors: Arc<Collection<Uuid, DoctorProfile>>,
    ) -> Self {
        Self {
            admin_email,
            identities,
            directory: DoctorDirectoryService::new(doctors),
        }
    }

    pub async fn resolve(&self, principal: &Principal) -> Result<Identity, IdentityError> {
        // Rule 1: an already-persisted identity is returned unchanged.
        if let Some(existing) = self.identities.get(&principal.uid).await {
            debug!("Identity {} already resolved as {}", principal.uid, existing.record.role);
            return Ok(existing.record);
        }

        let identity = self.assign_role(principal).await?;

        match self.identities.insert(principal.uid.clone(), identity.clone()).await {
            Ok(stored) => {
                info!(
                    "Resolved new identity {} ({}) as {}",
                    stored.record.uid, stored.record.email, stored.record.role
                );
                Ok(stored.record)
            }
            // A concurrent resolve for the same principal won the insert;
            // return its record so both callers observe the same identity.
            Err(StoreError::AlreadyExists) => self
                .identities
                .get(&principal.uid)
                .await
                .map(|stored| stored.record)
                .ok_or_else(|| {
                    IdentityError::StoreError("identity vanished after insert race".to_string())
                }),
            Err(e) => Err(IdentityError::StoreError(e.to_string())),
        }
    }

    async fn assign_role(&self, principal: &Principal) -> Result<Identity, IdentityError> {
        let now = Utc::now();

        // Rule 2: the reserved administrator address.
        if principal.email.eq_ignore_ascii_case(&self.admin_email) {
            return Ok(Identity {
                uid: principal.uid.clone(),
                email: principal.email.clone(),
                display_name: principal
                    .display_name
                    .clone()
                    .unwrap_or_else(|| "Admin".to_string()),
                role: Role::Admin,
                doctor_id: None,
                created_at: now,
            });
        }

        // Rule 3: a seeded doctor profile with this contact email. The link
        // is first-writer-wins; a profile already claimed by another identity
        // does not match.
        if let Some(profile) = self.directory.find_by_email(&principal.email).await {
            let outcome = self
                .directory
                .link_identity(profile.id, &principal.uid)
                .await
                .map_err(|e| IdentityError::StoreError(e.to_string()))?;

            match outcome {
                LinkOutcome::Linked | LinkOutcome::AlreadyLinked => {
                    return Ok(Identity {
                        uid: principal.uid.clone(),
                        email: principal.email.clone(),
                        display_name: profile.name.clone(),
                        role: Role::Doctor,
                        doctor_id: Some(profile.id),
                        created_at: now,
                    });
                }
                LinkOutcome::ClaimedByOther => {
                    debug!(
                        "Profile {} matching {} is claimed elsewhere, continuing cascade",
                        profile.id, principal.email
                    );
                }
            }
        }

        // Default rule: everyone else is a patient.
        Ok(Identity {
            uid: principal.uid.clone(),
            email: principal.email.clone(),
            display_name: principal
                .display_name
                .clone()
                .unwrap_or_else(|| principal.email.clone()),
            role: Role::Patient,
            doctor_id: None,
            created_at: now,
        })
    }
}
