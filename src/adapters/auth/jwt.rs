//! HS256 JWT identity verifier.
//!
//! Tokens carry the subject in an `id` claim and the account role in a
//! `role` claim, signed with a shared secret by the account service.
//!
//! ```text
//! { "id": "64f1...", "role": "driver", "iat": 1700000000, "exp": 1700086400 }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::domain::foundation::{AuthError, AuthenticatedUser, Role, SubjectId};
use crate::ports::IdentityVerifier;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    id: String,
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
    exp: i64,
}

/// Verifies HS256 tokens signed with the configured secret.
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(secret: &Secret<String>, leeway_secs: u64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_secs;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(bytes),
            encoding_key: EncodingKey::from_secret(bytes),
            validation,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.leeway_secs)
    }

    /// Mint a token for `user` valid for `ttl`.
    ///
    /// Credential issuance belongs to the account service; this exists for
    /// tests and local tooling that need a token the verifier accepts.
    pub fn issue(&self, user: &AuthenticatedUser, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            id: user.id.as_str().to_string(),
            role: user.role.as_str().to_string(),
            iat: Some(now),
            exp: now + ttl.as_secs() as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::service_unavailable(format!("token signing failed: {}", e)))
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<Claims>(credential, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    tracing::debug!("JWT rejected: {}", e);
                    AuthError::InvalidToken
                }
            },
        )?;

        let id = SubjectId::new(data.claims.id).map_err(|_| AuthError::InvalidToken)?;
        let role: Role = data.claims.role.parse().map_err(|_| {
            tracing::debug!(subject_id = %id, "JWT carries unknown role");
            AuthError::InvalidToken
        })?;

        Ok(AuthenticatedUser::new(id, role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

    fn verifier() -> JwtIdentityVerifier {
        JwtIdentityVerifier::new(&Secret::new(SECRET.to_string()), 0)
    }

    fn driver() -> AuthenticatedUser {
        AuthenticatedUser::new(SubjectId::new("driver-1").unwrap(), Role::Driver)
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn issued_token_verifies_to_same_identity() {
        let v = verifier();
        let token = v.issue(&driver(), Duration::from_secs(3600)).unwrap();

        let user = v.verify(&token).await.unwrap();

        assert_eq!(user, driver());
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let claims = Claims {
            id: "driver-1".into(),
            role: "driver".into(),
            iat: None,
            exp: Utc::now().timestamp() - 3600,
        };

        let result = verifier().verify(&sign(&claims, SECRET)).await;

        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid() {
        let claims = Claims {
            id: "driver-1".into(),
            role: "driver".into(),
            iat: None,
            exp: Utc::now().timestamp() + 3600,
        };

        let result = verifier()
            .verify(&sign(&claims, "some-other-secret-also-32-bytes-long"))
            .await;

        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn unknown_role_is_invalid() {
        let claims = Claims {
            id: "simulator".into(),
            role: "superuser".into(),
            iat: None,
            exp: Utc::now().timestamp() + 3600,
        };

        let result = verifier().verify(&sign(&claims, SECRET)).await;

        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn garbage_is_invalid() {
        assert!(matches!(
            verifier().verify("not.a.jwt").await,
            Err(AuthError::InvalidToken)
        ));
    }
}
