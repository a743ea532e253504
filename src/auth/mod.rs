use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Bearer token payload. `sub` is the owner of every record the caller touches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, expiry_hours: u64) -> Result<Self, JwtError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(JwtError::InvalidExpiry(expiry_hours))?;

        Ok(Self {
            sub: user_id,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Token lifetime of {0} hours is out of range")]
    InvalidExpiry(u64),
    #[error("Invalid JWT secret")]
    InvalidSecret,
    #[error("Invalid or expired token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verify signature and expiry, returning the decoded claims
pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(JwtError::InvalidToken)?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_subject() {
        let user = Uuid::new_v4();
        let token = generate_jwt(&Claims::new(user, 1).unwrap(), "secret").unwrap();
        let claims = validate_jwt(&token, "secret").unwrap();
        assert_eq!(claims.sub, user);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_foreign_secret() {
        let token = generate_jwt(&Claims::new(Uuid::new_v4(), 1).unwrap(), "secret").unwrap();
        assert!(matches!(validate_jwt(&token, "other"), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn rejects_expired_token() {
        let now = Utc::now().timestamp();
        let claims = Claims { sub: Uuid::new_v4(), iat: now - 7200, exp: now - 3600 };
        let token = generate_jwt(&claims, "secret").unwrap();
        assert!(validate_jwt(&token, "secret").is_err());
    }

    #[test]
    fn refuses_empty_secret() {
        assert!(matches!(
            generate_jwt(&Claims::new(Uuid::new_v4(), 1).unwrap(), ""),
            Err(JwtError::InvalidSecret)
        ));
    }

    #[test]
    fn out_of_range_expiry_is_an_error() {
        assert!(matches!(
            Claims::new(Uuid::new_v4(), u64::MAX),
            Err(JwtError::InvalidExpiry(u64::MAX))
        ));
        assert!(matches!(
            Claims::new(Uuid::new_v4(), i64::MAX as u64),
            Err(JwtError::InvalidExpiry(_))
        ));
    }
}
