use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::AuthConfig, error::AppError, models::AppState};

/// Cookie the identity provider sets for same-origin pages
pub const SESSION_COOKIE: &str = "__session";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("request carries no session token")]
    MissingToken,

    #[error("no token verification key is configured")]
    NotConfigured,

    #[error("invalid verification key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    #[error("session token rejected: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: u64,
}

#[derive(Clone)]
struct Verifier {
    key: DecodingKey,
    validation: Validation,
}

/// Verifies session tokens issued by the external identity provider.
#[derive(Clone)]
pub struct Authenticator {
    verifiers: Arc<Vec<Verifier>>,
}

impl Authenticator {
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let mut verifiers = Vec::new();

        if let Some(pem) = &config.public_key_pem {
            let key = DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(AuthError::InvalidKey)?;
            verifiers.push(Verifier {
                key,
                validation: validation(Algorithm::RS256, config.issuer.as_deref()),
            });
        }

        if let Some(secret) = &config.secret {
            verifiers.push(Verifier {
                key: DecodingKey::from_secret(secret.as_bytes()),
                validation: validation(Algorithm::HS256, config.issuer.as_deref()),
            });
        }

        Ok(Self {
            verifiers: Arc::new(verifiers),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.verifiers.is_empty()
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut last_error = AuthError::NotConfigured;

        for verifier in self.verifiers.iter() {
            match jsonwebtoken::decode::<SessionClaims>(token, &verifier.key, &verifier.validation) {
                Ok(data) => return Ok(data.claims),
                Err(e) => last_error = AuthError::InvalidToken(e),
            }
        }

        Err(last_error)
    }

    /// Bearer header first, then the session cookie.
    pub fn extract_token(headers: &HeaderMap) -> Option<String> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());

        if let Some(token) = bearer {
            return Some(token.to_string());
        }

        CookieJar::from_headers(headers)
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|t| !t.is_empty())
    }
}

fn validation(algorithm: Algorithm, issuer: Option<&str>) -> Validation {
    let mut validation = Validation::new(algorithm);
    if let Some(issuer) = issuer {
        validation.set_issuer(&[issuer]);
    }
    validation
}

/// The authenticated caller. Extracting it rejects with 401 before any body
/// extractor runs.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub user_id: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = Authenticator::extract_token(&parts.headers)
            .ok_or(AppError::Unauthorized(AuthError::MissingToken))?;

        let claims = state.auth.verify(&token).map_err(AppError::Unauthorized)?;

        Ok(CallerIdentity { user_id: claims.sub })
    }
}
