use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};

/// Verified identity behind a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub username: String,
}

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_identity(&self, credential: &str) -> AppResult<Identity>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub username: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// HS256 token verification.
pub struct JwtIdentityResolver {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: Option<String>,
}

impl JwtIdentityResolver {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }

        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
        }
    }

    /// Mint a token. Used by the `issue_token` binary and by tests.
    pub fn issue_token(&self, identity: &Identity, ttl: Duration) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.email.clone(),
            email: identity.email.clone(),
            username: identity.username.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, "failed to sign token");
            AppError::Internal
        })
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn resolve_identity(&self, credential: &str) -> AppResult<Identity> {
        let claims = decode::<Claims>(credential, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AppError::Unauthenticated
            })?
            .claims;

        if claims.email.is_empty() {
            return Err(AppError::Unauthenticated);
        }

        Ok(Identity {
            email: claims.email,
            username: claims.username,
        })
    }
}

/// Fixed token table, used by the in-memory backend and tests.
#[derive(Debug, Default, Clone)]
pub struct StaticIdentityResolver {
    tokens: HashMap<String, Identity>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve_identity(&self, credential: &str) -> AppResult<Identity> {
        self.tokens
            .get(credential)
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}
