//! Identity and access: password hashing, bearer tokens and the extractors
//! that resolve the caller for each request.
//!
//! Handlers receive the caller explicitly through [`AuthUser`] (or the
//! role-gated [`AdminUser`] / [`StaffUser`]); there is no ambient session.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kampus_shared::types::Role;
use kampus_store::StoreError;

use crate::api::AppState;
use crate::error::ServerError;

// ---------------------------------------------------------------------------
// Passwords
// ---------------------------------------------------------------------------

/// Hash a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ServerError> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| ServerError::Internal(format!("salt encoding failed: {e}")))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServerError::Internal(format!("password hashing failed: {e}")))
}

/// `false` for a wrong password and for a malformed stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing and verification keys plus the token lifetime.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, ServerError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServerError::Internal(format!("token signing failed: {e}")))
    }

    /// The user id carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<Uuid, ServerError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| ServerError::Unauthorized("Not authorized, token failed".into()))?;
        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| ServerError::Unauthorized("Not authorized, token failed".into()))
    }
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Caller with the `admin` role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

/// Caller with the `admin` or `moderator` role.
#[derive(Debug, Clone)]
pub struct StaffUser(pub AuthUser);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ServerError::Unauthorized("Not authorized, no token".into()))?;
        let user_id = state.tokens.verify(token)?;

        let user = {
            let db = state.db.lock().await;
            match db.get_user(user_id) {
                Ok(user) => user,
                Err(StoreError::NotFound) => {
                    return Err(ServerError::Unauthorized("User no longer exists".into()))
                }
                Err(e) => return Err(e.into()),
            }
        };

        if !user.is_active {
            return Err(ServerError::Unauthorized("Account has been deactivated".into()));
        }

        Ok(AuthUser {
            id: user.id,
            role: user.role,
            name: user.name,
            email: user.email,
        })
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ServerError::Forbidden("Admin access required".into()));
        }
        Ok(AdminUser(user))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for StaffUser {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.is_staff() {
            return Err(ServerError::Forbidden("Staff access required".into()));
        }
        Ok(StaffUser(user))
    }
}
