use std::sync::Arc;

use uuid::Uuid;

use doctor_cell::models::AddDoctorRequest;
use doctor_cell::services::directory::DoctorDirectoryService;
use doctor_cell::DoctorProfile;
use identity_cell::services::resolver::IdentityResolverService;
use shared_database::Collection;
use shared_models::auth::{Identity, Principal, Role};

const ADMIN_EMAIL: &str = "admin@rajana.com";

struct Fixture {
    identities: Arc<Collection<String, Identity>>,
    doctors: Arc<Collection<Uuid, DoctorProfile>>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            identities: Arc::new(Collection::new("identities")),
            doctors: Arc::new(Collection::new("doctors")),
        }
    }

    fn resolver(&self) -> IdentityResolverService {
        IdentityResolverService::with_parts(
            ADMIN_EMAIL.to_string(),
            Arc::clone(&self.identities),
            Arc::clone(&self.doctors),
        )
    }

    async fn seed_doctor(&self, name: &str, email: &str) -> DoctorProfile {
        DoctorDirectoryService::new(Arc::clone(&self.doctors))
            .add_doctor(AddDoctorRequest {
                name: name.to_string(),
                specialty: "Cardiology".to_string(),
                contact_email: email.to_string(),
                phone: None,
                bio: None,
                available: Some(true),
            })
            .await
            .unwrap()
    }
}

fn principal(uid: &str, email: &str, name: Option<&str>) -> Principal {
    Principal {
        uid: uid.to_string(),
        email: email.to_string(),
        display_name: name.map(|n| n.to_string()),
    }
}

#[tokio::test]
async fn first_login_with_reserved_admin_address_creates_admin() {
    let fixture = Fixture::new();
    let resolver = fixture.resolver();

    let identity = resolver
        .resolve(&principal("uid-admin", "Admin@Rajana.com", None))
        .await
        .unwrap();

    assert_eq!(identity.role, Role::Admin);
    assert_eq!(identity.display_name, "Admin");

    // Exactly one record exists for that uid afterwards.
    let all = fixture.identities.find(|_| true).await;
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn resolve_is_idempotent() {
    let fixture = Fixture::new();
    let resolver = fixture.resolver();
    let p = principal("uid-1", "pat@example.com", Some("Pat"));

    let first = resolver.resolve(&p).await.unwrap();
    let second = resolver.resolve(&p).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(fixture.identities.find(|_| true).await.len(), 1);
}

#[tokio::test]
async fn matching_doctor_profile_grants_doctor_role_and_links_profile() {
    let fixture = Fixture::new();
    let doctor = fixture.seed_doctor("Dr. Sarah Johnson", "sarah@rajana.com").await;
    let resolver = fixture.resolver();

    let identity = resolver
        .resolve(&principal("uid-doc", "sarah@rajana.com", Some("Sarah")))
        .await
        .unwrap();

    assert_eq!(identity.role, Role::Doctor);
    assert_eq!(identity.doctor_id, Some(doctor.id));
    // Display name comes from the profile, not the token.
    assert_eq!(identity.display_name, "Dr. Sarah Johnson");

    let linked = fixture.doctors.get(&doctor.id).await.unwrap().record;
    assert_eq!(linked.identity_uid.as_deref(), Some("uid-doc"));
}

#[tokio::test]
async fn unknown_email_defaults_to_patient() {
    let fixture = Fixture::new();
    let resolver = fixture.resolver();

    let identity = resolver
        .resolve(&principal("uid-2", "someone@example.com", Some("Someone")))
        .await
        .unwrap();

    assert_eq!(identity.role, Role::Patient);
    assert_eq!(identity.doctor_id, None);
}

#[tokio::test]
async fn doctor_like_email_without_profile_is_not_promoted() {
    // The legacy substring heuristic would have made this signup a doctor.
    let fixture = Fixture::new();
    let resolver = fixture.resolver();

    let identity = resolver
        .resolve(&principal("uid-3", "dr.fake.doctor@rajana.com", None))
        .await
        .unwrap();

    assert_eq!(identity.role, Role::Patient);
}

#[tokio::test]
async fn profile_claimed_by_another_identity_falls_through_to_patient() {
    let fixture = Fixture::new();
    let doctor = fixture.seed_doctor("Dr. Sarah Johnson", "shared@rajana.com").await;
    let resolver = fixture.resolver();

    let first = resolver
        .resolve(&principal("uid-first", "shared@rajana.com", None))
        .await
        .unwrap();
    assert_eq!(first.role, Role::Doctor);

    // A second, different principal presenting the same contact email must
    // not steal the profile link.
    let second = resolver
        .resolve(&principal("uid-second", "shared@rajana.com", None))
        .await
        .unwrap();
    assert_eq!(second.role, Role::Patient);

    let linked = fixture.doctors.get(&doctor.id).await.unwrap().record;
    assert_eq!(linked.identity_uid.as_deref(), Some("uid-first"));
}

#[tokio::test]
async fn concurrent_resolves_for_same_principal_converge() {
    let fixture = Fixture::new();
    let resolver_a = fixture.resolver();
    let resolver_b = fixture.resolver();
    let p = principal("uid-race", "race@example.com", Some("Race"));

    let (a, b) = tokio::join!(resolver_a.resolve(&p), resolver_b.resolve(&p));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a, b);
    assert_eq!(fixture.identities.find(|_| true).await.len(), 1);
}
