//! Verifies token signatures, expiry, issuer, and type.
//!
//! Pure verification. Revocation is checked by the caller.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::de::DeserializeOwned;

use parkhub_core::config::AuthConfig;

use super::claims::{AccessClaims, RefreshClaims, TokenType};
use crate::error::{AuthError, AuthResult};

/// Validates HS256 tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.jwt_leeway_seconds;
        validation.set_issuer(&[config.jwt_issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Verify an access token.
    pub fn verify_access(&self, token: &str) -> AuthResult<AccessClaims> {
        let claims: AccessClaims = self.decode(token)?;
        if claims.token_type != TokenType::Access {
            return Err(AuthError::TokenInvalid);
        }
        Ok(claims)
    }

    /// Verify a refresh token.
    pub fn verify_refresh(&self, token: &str) -> AuthResult<RefreshClaims> {
        let claims: RefreshClaims = self.decode(token)?;
        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::TokenInvalid);
        }
        Ok(claims)
    }

    fn decode<T: DeserializeOwned>(&self, token: &str) -> AuthResult<T> {
        decode::<T>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            })
    }
}
