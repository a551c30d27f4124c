// Token issuing/verification and password hashing.
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::authz::{Principal, Role};
use crate::config::config;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(principal: Principal) -> Self {
        let now = Utc::now();
        let expiry_hours = config().security.jwt_expiry_hours;
        Self {
            sub: principal.id,
            role: principal.role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(expiry_hours as i64)).timestamp(),
        }
    }

    pub fn principal(&self) -> Principal {
        Principal {
            id: self.sub,
            role: self.role,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("Invalid token")]
    InvalidToken,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Password hashing failed")]
    Hashing,
}

pub fn issue_token(principal: Principal) -> Result<String, AuthError> {
    let secret = &config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &Claims::new(principal), &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn verify_token(token: &str) -> Result<Claims, AuthError> {
    let secret = &config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|_| AuthError::InvalidToken)?;
    Ok(data.claims)
}

pub fn hash_password(plain: &str) -> Result<String, AuthError> {
    bcrypt::hash(plain, bcrypt::DEFAULT_COST).map_err(|_| AuthError::Hashing)
}

/// Comparison failures count as a mismatch rather than an error.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_and_keep_the_principal() {
        let principal = Principal {
            id: Uuid::new_v4(),
            role: Role::Publisher,
        };
        let token = issue_token(principal).unwrap();
        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.principal(), principal);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let principal = Principal {
            id: Uuid::new_v4(),
            role: Role::User,
        };
        let token = issue_token(principal).unwrap();
        let mut forged = token.clone();
        forged.truncate(token.len() - 2);
        assert!(verify_token(&forged).is_err());
        assert!(verify_token("not.a.token").is_err());
    }

    #[test]
    fn password_hashes_verify_and_reject() {
        let hash = hash_password("123456").unwrap();
        assert!(verify_password("123456", &hash));
        assert!(!verify_password("12345x", &hash));
        assert!(!verify_password("123456", "not-a-bcrypt-hash"));
    }
}
