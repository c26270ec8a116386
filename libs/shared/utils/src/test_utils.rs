use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::Principal;

pub struct TestConfig {
    pub admin_email: String,
    pub jwt_secret: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            admin_email: "admin@rajana.com".to_string(),
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            admin_email: self.admin_email.clone(),
            jwt_secret: self.jwt_secret.clone(),
            port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestPrincipal {
    pub uid: String,
    pub email: String,
    pub name: String,
}

impl Default for TestPrincipal {
    fn default() -> Self {
        Self {
            uid: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            name: "Test User".to_string(),
        }
    }
}

impl TestPrincipal {
    pub fn new(email: &str, name: &str) -> Self {
        Self {
            uid: Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: name.to_string(),
        }
    }

    pub fn admin() -> Self {
        Self::new("admin@rajana.com", "Admin")
    }

    pub fn to_principal(&self) -> Principal {
        Principal {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: Some(self.name.clone()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(principal: &TestPrincipal, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let claims = json!({
            "sub": principal.uid,
            "email": principal.email,
            "name": principal.name,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
        let claims_b64 = URL_SAFE_NO_PAD.encode(claims.to_string());
        let signing_input = format!("{}.{}", header_b64, claims_b64);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(signing_input.as_bytes());
        let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", signing_input, signature_b64)
    }

    pub fn create_expired_token(principal: &TestPrincipal, secret: &str) -> String {
        Self::create_test_token(principal, secret, Some(-1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::validate_token;

    #[test]
    fn minted_token_round_trips_through_validation() {
        let config = TestConfig::default();
        let test_principal = TestPrincipal::new("patient@example.com", "Pat Patient");

        let token = JwtTestUtils::create_test_token(&test_principal, &config.jwt_secret, None);
        let principal = validate_token(&token, &config.jwt_secret).unwrap();

        assert_eq!(principal.uid, test_principal.uid);
        assert_eq!(principal.email, "patient@example.com");
        assert_eq!(principal.display_name.as_deref(), Some("Pat Patient"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = TestConfig::default();
        let test_principal = TestPrincipal::default();

        let token = JwtTestUtils::create_expired_token(&test_principal, &config.jwt_secret);
        assert!(validate_token(&token, &config.jwt_secret).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let config = TestConfig::default();
        let test_principal = TestPrincipal::default();

        let mut token = JwtTestUtils::create_test_token(&test_principal, &config.jwt_secret, None);
        token.push('x');
        assert!(validate_token(&token, &config.jwt_secret).is_err());
    }
}
