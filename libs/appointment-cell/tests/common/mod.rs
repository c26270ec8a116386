#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use appointment_cell::models::{Appointment, BookAppointmentRequest};
use appointment_cell::services::booking::AppointmentBookingService;
use appointment_cell::services::lifecycle::AppointmentLifecycleService;
use appointment_cell::services::projection::LiveViewService;
use doctor_cell::models::AddDoctorRequest;
use doctor_cell::services::directory::DoctorDirectoryService;
use doctor_cell::DoctorProfile;
use shared_database::Collection;
use shared_models::auth::{Identity, Role};

pub struct TestWorld {
    pub appointments: Arc<Collection<Uuid, Appointment>>,
    pub doctors: Arc<Collection<Uuid, DoctorProfile>>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self {
            appointments: Arc::new(Collection::new("appointments")),
            doctors: Arc::new(Collection::new("doctors")),
        }
    }

    pub fn booking(&self) -> AppointmentBookingService {
        AppointmentBookingService::with_parts(
            Arc::clone(&self.appointments),
            Arc::clone(&self.doctors),
        )
    }

    pub fn lifecycle(&self) -> AppointmentLifecycleService {
        AppointmentLifecycleService::with_parts(Arc::clone(&self.appointments))
    }

    pub fn live_views(&self) -> LiveViewService {
        LiveViewService::with_parts(Arc::clone(&self.appointments))
    }

    pub async fn seed_doctor(&self, name: &str, email: &str, available: bool) -> DoctorProfile {
        DoctorDirectoryService::new(Arc::clone(&self.doctors))
            .add_doctor(AddDoctorRequest {
                name: name.to_string(),
                specialty: "General Medicine".to_string(),
                contact_email: email.to_string(),
                phone: None,
                bio: None,
                available: Some(available),
            })
            .await
            .unwrap()
    }
}

pub struct DoctorAndPatient {
    pub doctor: Identity,
    pub patient: Identity,
}

pub fn patient(uid: &str, name: &str) -> Identity {
    Identity {
        uid: uid.to_string(),
        email: format!("{}@example.com", uid),
        display_name: name.to_string(),
        role: Role::Patient,
        doctor_id: None,
        created_at: Utc::now(),
    }
}

pub fn doctor_identity(profile: &DoctorProfile) -> Identity {
    Identity {
        uid: format!("uid-{}", profile.id),
        email: profile.contact_email.clone(),
        display_name: profile.name.clone(),
        role: Role::Doctor,
        doctor_id: Some(profile.id),
        created_at: Utc::now(),
    }
}

pub fn admin() -> Identity {
    Identity {
        uid: "uid-admin".to_string(),
        email: "admin@rajana.com".to_string(),
        display_name: "Admin".to_string(),
        role: Role::Admin,
        doctor_id: None,
        created_at: Utc::now(),
    }
}

pub fn booking_request(doctor_id: Uuid) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id,
        date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        time: "10:00 AM".to_string(),
        reason: "Routine checkup".to_string(),
        patient_contact: "555-0100".to_string(),
    }
}
