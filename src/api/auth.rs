//! Bearer token authentication.
//!
//! Callers send `Authorization: Bearer <jwt>` signed with HS256. The token
//! only names the caller; the identity (and the admin flag) is reloaded from
//! the store on every request.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::response::ApiErrorResponse;
use super::state::AppState;
use crate::config::AuthConfig;
use crate::error::{RosterError, RosterResult};
use crate::models::{CallerIdentity, Role};

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Which id field names the caller.
    pub user_type: Role,
    /// Set for leads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<i64>,
    /// Set for employees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emp_id: Option<i64>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Claims for a lead expiring at `exp`.
    pub fn lead(lead_id: i64, exp: i64) -> Self {
        Self {
            user_type: Role::Lead,
            lead_id: Some(lead_id),
            emp_id: None,
            exp,
        }
    }

    /// Claims for an employee expiring at `exp`.
    pub fn employee(emp_id: i64, exp: i64) -> Self {
        Self {
            user_type: Role::Employee,
            lead_id: None,
            emp_id: Some(emp_id),
            exp,
        }
    }

    /// The id matching `user_type`.
    pub fn subject(&self) -> RosterResult<i64> {
        let id = match self.user_type {
            Role::Lead => self.lead_id,
            Role::Employee => self.emp_id,
        };
        id.ok_or_else(|| RosterError::Unauthorized {
            reason: "Token does not name a user".to_string(),
        })
    }
}

/// Signs claims with the configured key.
pub fn issue_token(claims: &Claims, config: &AuthConfig) -> RosterResult<String> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(config.signing_key.as_bytes()),
    )
    .map_err(|e| RosterError::Validation {
        message: format!("Failed to sign token: {}", e),
    })
}

/// Verifies the signature and expiry of a token.
pub fn verify_token(token: &str, config: &AuthConfig) -> RosterResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = config.leeway_seconds;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.signing_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| RosterError::Unauthorized {
        reason: "Invalid or expired token".to_string(),
    })
}

/// The identified caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub CallerIdentity);

#[axum::async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = authenticate(parts, state).await.map_err(|err| {
            warn!(path = %parts.uri.path(), error = %err, "Authentication failed");
            ApiErrorResponse::from(err)
        })?;
        Ok(Caller(identity))
    }
}

async fn authenticate(parts: &Parts, state: &AppState) -> RosterResult<CallerIdentity> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| RosterError::Unauthorized {
            reason: "Missing Authorization header".to_string(),
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| RosterError::Unauthorized {
            reason: "Invalid Authorization format. Expected: Bearer <token>".to_string(),
        })?;

    let claims = verify_token(token, state.auth())?;
    state.service().identify(claims.user_type, claims.subject()?).await
}
