//! Credentials, session tokens and the per-request caller.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use crm::finance::Side;
use entity::{user, user_role};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiError, ApiResult};

pub const SESSION_COOKIE: &str = "bpo_session";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_minutes: i64,
}

impl AuthConfig {
    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.jwt_secret.as_bytes())
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.jwt_secret.as_bytes())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub org: Uuid,
    pub roles: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Operator,
    Client,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Operator => "OPERATOR",
            UserRole::Client => "CLIENT",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(UserRole::Admin),
            "OPERATOR" => Some(UserRole::Operator),
            "CLIENT" => Some(UserRole::Client),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            UserRole::Admin => 3,
            UserRole::Operator => 2,
            UserRole::Client => 1,
        }
    }
}

impl From<user_role::Role> for UserRole {
    fn from(value: user_role::Role) -> Self {
        match value {
            user_role::Role::Admin => UserRole::Admin,
            user_role::Role::Operator => UserRole::Operator,
            user_role::Role::Client => UserRole::Client,
        }
    }
}

impl From<UserRole> for user_role::Role {
    fn from(value: UserRole) -> Self {
        match value {
            UserRole::Admin => user_role::Role::Admin,
            UserRole::Operator => user_role::Role::Operator,
            UserRole::Client => user_role::Role::Client,
        }
    }
}

/// The authenticated caller. Built once per request and handed to services.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub org_id: Uuid,
    pub roles: Vec<UserRole>,
}

impl CurrentUser {
    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.iter().any(|r| r.level() >= role.level())
    }

    pub fn side(&self) -> Side {
        if self.has_role(UserRole::Operator) {
            Side::Bpo
        } else {
            Side::Client
        }
    }

    pub fn require(&self, role: UserRole) -> ApiResult<()> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden("insufficient permissions"))
        }
    }
}

pub fn issue_token(
    user_id: Uuid,
    org_id: Uuid,
    roles: &[UserRole],
    config: &AuthConfig,
) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(Duration::minutes(config.session_ttl_minutes))
        .unwrap_or(now)
        .timestamp() as usize;
    let claims = SessionClaims {
        sub: user_id,
        org: org_id,
        roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
        exp,
        iat: now.timestamp() as usize,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &config.encoding_key())
}

pub fn decode_token(
    token: &str,
    config: &AuthConfig,
) -> jsonwebtoken::errors::Result<SessionClaims> {
    jsonwebtoken::decode::<SessionClaims>(token, &config.decoding_key(), &Validation::default())
        .map(|data| data.claims)
}

/// Bearer header first, then the session cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(rest) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|text| text.strip_prefix("Bearer "))
    {
        return Some(rest.trim().to_string());
    }
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|part| {
        part.trim()
            .strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

/// Resolve the caller from request headers. `Ok(None)` means anonymous.
///
/// Roles and the active flag are re-read on every request, so disabling a
/// user or changing roles takes effect before the token expires.
pub async fn authenticate(
    db: &DatabaseConnection,
    config: &AuthConfig,
    headers: &HeaderMap,
) -> ApiResult<Option<CurrentUser>> {
    let Some(token) = extract_token(headers) else {
        return Ok(None);
    };
    let claims = decode_token(&token, config).map_err(|_| ApiError::Unauthenticated)?;
    let Some(model) = user::Entity::find_by_id(claims.sub).one(db).await? else {
        return Err(ApiError::Unauthenticated);
    };
    if !model.is_active || model.org_id != claims.org {
        return Err(ApiError::Unauthenticated);
    }
    let roles = load_roles(db, model.id).await?;
    Ok(Some(CurrentUser {
        user_id: model.id,
        org_id: model.org_id,
        roles,
    }))
}

pub async fn load_roles(db: &DatabaseConnection, user_id: Uuid) -> ApiResult<Vec<UserRole>> {
    let rows = user_role::Entity::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .all(db)
        .await?;
    let mut roles: Vec<UserRole> = rows.into_iter().map(|row| row.role.into()).collect();
    roles.sort_by_key(|r| std::cmp::Reverse(r.level()));
    Ok(roles)
}

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ApiError::internal(format!("hash error: {err}")))
}

pub fn verify_password(password: &str, stored_hash: &str) -> ApiResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| ApiError::internal(format!("invalid password hash: {err}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn session_cookie(token: &str, ttl_minutes: i64) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE,
        token,
        ttl_minutes.max(0) * 60
    )
}

pub fn cleared_session_cookie() -> String {
    format!("{}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE)
}
