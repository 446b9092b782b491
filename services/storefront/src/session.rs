//! Bearer token inspection and renewal
//!
//! Tokens are issued by the shop backend and signed with a shared HMAC secret.
//! The signature is checked here before any claim is trusted; expiry is left
//! to [`SessionManager::ensure_fresh`] so expired tokens can still be renewed.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{info, warn};

use common::models::Role;

use crate::{
    backend::BackendClient,
    error::{ApiError, ApiResult},
};

/// Claims read from a backend-issued token
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// User name
    pub sub: String,
    pub exp: i64,
    #[serde(default, alias = "user_id", rename = "userId")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
    /// Either a single role or a list, depending on the issuer
    #[serde(default)]
    pub roles: Option<serde_json::Value>,
}

impl Claims {
    /// ADMIN when any role claim says so, USER otherwise
    pub fn role(&self) -> Role {
        let mut names: Vec<&str> = self.role.as_deref().into_iter().collect();
        match &self.roles {
            Some(serde_json::Value::String(role)) => names.push(role),
            Some(serde_json::Value::Array(roles)) => {
                names.extend(roles.iter().filter_map(|r| r.as_str()))
            }
            _ => {}
        }

        if names.iter().any(|name| name.parse::<Role>() == Ok(Role::Admin)) {
            Role::Admin
        } else {
            Role::User
        }
    }
}

/// Verify the token signature and read its claims; expiry is not checked
pub fn decode_claims(token: &str, key: &DecodingKey) -> ApiResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp", "sub"]);

    jsonwebtoken::decode::<Claims>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            ApiError::Unauthorized
        })
}

/// A token that is safe to forward, plus its claims
#[derive(Debug, Clone)]
pub struct FreshToken {
    pub token: String,
    pub claims: Claims,
    /// Set when the token was exchanged during this request
    pub refreshed: bool,
}

/// Keeps bearer tokens valid by refreshing them shortly before expiry
#[derive(Clone)]
pub struct SessionManager {
    backend: BackendClient,
    key: DecodingKey,
    renew_threshold_secs: i64,
}

impl SessionManager {
    pub fn new(backend: BackendClient, key: DecodingKey, renew_threshold_secs: i64) -> Self {
        Self {
            backend,
            key,
            renew_threshold_secs,
        }
    }

    /// Return a usable token for the request
    ///
    /// Tokens outside the renew threshold pass through untouched. Tokens close
    /// to expiry are exchanged; if that fails the old token is kept. Expired
    /// tokens that cannot be exchanged end the session.
    pub async fn ensure_fresh(&self, token: &str, now: DateTime<Utc>) -> ApiResult<FreshToken> {
        let claims = decode_claims(token, &self.key)?;
        let remaining = claims.exp - now.timestamp();

        if remaining > self.renew_threshold_secs {
            return Ok(FreshToken {
                token: token.to_string(),
                claims,
                refreshed: false,
            });
        }

        match self.backend.refresh_token(token).await {
            Ok(new_token) => {
                let new_claims = decode_claims(&new_token, &self.key)?;
                info!(user = %new_claims.sub, "Refreshed session token");
                Ok(FreshToken {
                    token: new_token,
                    claims: new_claims,
                    refreshed: true,
                })
            }
            Err(e) if remaining > 0 => {
                warn!(user = %claims.sub, "Token refresh failed, keeping current token: {}", e);
                Ok(FreshToken {
                    token: token.to_string(),
                    claims,
                    refreshed: false,
                })
            }
            Err(e) => {
                warn!(user = %claims.sub, "Expired token could not be refreshed: {}", e);
                Err(ApiError::Unauthorized)
            }
        }
    }
}
