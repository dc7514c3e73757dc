use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Opaque user identity
    pub exp: i64,
    pub iat: i64,
}

/// Verifies bearer tokens issued by the identity provider. Signing happens
/// there, with the shared `JWT_SECRET`.
pub struct JwtService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            validation: Validation::default(),
        }
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(AppError::Auth("Token has no subject".to_string()));
        }

        Ok(token_data.claims)
    }
}
