//! Signed, expiring session tokens (HS256 JWT)

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::core::error::TokenError;
use crate::models::user::Role;
use crate::utils::time::current_timestamp_millis;

/// Claims embedded in every issued token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User email
    pub sub: String,
    /// Role name as issued; compared case-insensitively
    pub role: String,
    /// Seconds since the epoch
    pub iat: i64,
    /// Seconds since the epoch
    pub exp: i64,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_ms: i64,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl_ms: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_ms,
        }
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    pub fn issue(&self, email: &str, role: Role) -> Result<String, TokenError> {
        self.issue_at(email, role, current_timestamp_millis())
    }

    pub fn issue_at(&self, email: &str, role: Role, now_ms: i64) -> Result<String, TokenError> {
        let claims = Claims {
            sub: email.to_string(),
            role: role.as_str().to_string(),
            iat: now_ms / 1000,
            exp: (now_ms + self.ttl_ms) / 1000,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign token");
            TokenError::Signing(e.to_string())
        })
    }

    /// Verifies the signature and structure; expiry is checked by `check_at`
    pub fn claims(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            })
    }

    /// Full check: signature, subject and expiry
    pub fn check_at(
        &self,
        token: &str,
        expected_email: &str,
        now_ms: i64,
    ) -> Result<Claims, TokenError> {
        let claims = self.claims(token)?;
        if claims.sub != expected_email {
            return Err(TokenError::SubjectMismatch);
        }
        if now_ms / 1000 >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Fails closed on any problem, malformed input included
    pub fn validate(&self, token: &str, expected_email: &str) -> bool {
        self.validate_at(token, expected_email, current_timestamp_millis())
    }

    pub fn validate_at(&self, token: &str, expected_email: &str, now_ms: i64) -> bool {
        self.check_at(token, expected_email, now_ms).is_ok()
    }

    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        self.claims(token).map(|claims| claims.sub)
    }

    pub fn extract_role(&self, token: &str) -> Result<Role, TokenError> {
        let claims = self.claims(token)?;
        claims.role.parse().map_err(TokenError::Malformed)
    }

    /// Subject-agnostic check used by the access gate
    pub fn authenticate(&self, token: &str) -> Result<Claims, TokenError> {
        let subject = self.extract_subject(token)?;
        self.check_at(token, &subject, current_timestamp_millis())
    }
}
