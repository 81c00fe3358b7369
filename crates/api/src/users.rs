//! Sign-in and user administration.

use std::collections::HashMap;

use chrono::Utc;
use crm::prospect::normalize_email;
use entity::{user, user_role, user_secret};
use sea_orm::{
    prelude::DateTimeWithTimeZone, ActiveModelTrait, ActiveValue::Set, ColumnTrait,
    ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{self, AuthConfig, CurrentUser, UserRole},
    ApiError, ApiResult,
};

const MIN_PASSWORD: usize = 8;
const MAX_DISPLAY_NAME: usize = 100;

#[derive(Clone, Debug, Serialize)]
pub struct UserView {
    #[serde(flatten)]
    pub user: user::Model,
    pub roles: Vec<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignedIn {
    pub token: String,
    pub expires_in_minutes: i64,
    pub user: UserView,
}

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub roles: Vec<UserRole>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserPatch {
    pub display_name: Option<String>,
    pub is_active: Option<bool>,
    pub roles: Option<Vec<UserRole>>,
    pub password: Option<String>,
}

fn validate_display_name(value: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("display_name is required"));
    }
    if trimmed.chars().count() > MAX_DISPLAY_NAME {
        return Err(ApiError::validation(format!(
            "display_name must be <= {MAX_DISPLAY_NAME} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_password(value: &str) -> ApiResult<&str> {
    if value.chars().count() < MIN_PASSWORD {
        return Err(ApiError::validation(format!(
            "password must have at least {MIN_PASSWORD} characters"
        )));
    }
    Ok(value)
}

fn dedup_roles(roles: Vec<UserRole>) -> ApiResult<Vec<UserRole>> {
    let mut unique: Vec<UserRole> = Vec::new();
    for role in roles {
        if !unique.contains(&role) {
            unique.push(role);
        }
    }
    if unique.is_empty() {
        return Err(ApiError::validation("roles must include at least one entry"));
    }
    Ok(unique)
}

#[instrument(name = "bpo.auth.login", skip_all)]
pub async fn login(
    db: &DatabaseConnection,
    config: &AuthConfig,
    credentials: Credentials,
) -> ApiResult<SignedIn> {
    let email = normalize_email(&credentials.email).map_err(|_| ApiError::InvalidCredentials)?;
    let Some(model) = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?
    else {
        return Err(ApiError::InvalidCredentials);
    };
    let Some(secret) = user_secret::Entity::find_by_id(model.id).one(db).await? else {
        return Err(ApiError::InvalidCredentials);
    };
    if !auth::verify_password(&credentials.password, &secret.password_hash)? {
        return Err(ApiError::InvalidCredentials);
    }
    if !model.is_active {
        return Err(ApiError::Forbidden("account disabled"));
    }
    let roles = auth::load_roles(db, model.id).await?;
    let token = auth::issue_token(model.id, model.org_id, &roles, config)
        .map_err(|err| ApiError::internal(format!("failed to issue session token: {err}")))?;
    tracing::info!(user_id = %model.id, "signed in");
    Ok(SignedIn {
        token,
        expires_in_minutes: config.session_ttl_minutes,
        user: UserView { user: model, roles },
    })
}

pub async fn me(db: &DatabaseConnection, user: &CurrentUser) -> ApiResult<UserView> {
    let model = user::Entity::find_by_id(user.user_id)
        .one(db)
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    Ok(UserView {
        user: model,
        roles: user.roles.clone(),
    })
}

#[instrument(name = "bpo.users.list", skip_all, fields(org = %user.org_id))]
pub async fn list(db: &DatabaseConnection, user: &CurrentUser) -> ApiResult<Vec<UserView>> {
    user.require(UserRole::Admin)?;
    let records = user::Entity::find()
        .filter(user::Column::OrgId.eq(user.org_id))
        .order_by_asc(user::Column::Email)
        .all(db)
        .await?;
    let ids: Vec<Uuid> = records.iter().map(|u| u.id).collect();
    let mut role_map: HashMap<Uuid, Vec<UserRole>> = HashMap::new();
    if !ids.is_empty() {
        for row in user_role::Entity::find()
            .filter(user_role::Column::UserId.is_in(ids))
            .all(db)
            .await?
        {
            role_map.entry(row.user_id).or_default().push(row.role.into());
        }
    }
    Ok(records
        .into_iter()
        .map(|model| {
            let mut roles = role_map.remove(&model.id).unwrap_or_default();
            roles.sort_by_key(|r| std::cmp::Reverse(r.level()));
            UserView { user: model, roles }
        })
        .collect())
}

#[instrument(name = "bpo.users.create", skip_all, fields(org = %user.org_id))]
pub async fn create(
    db: &DatabaseConnection,
    user: &CurrentUser,
    input: NewUser,
) -> ApiResult<UserView> {
    user.require(UserRole::Admin)?;
    let email = normalize_email(&input.email)?;
    let display_name = validate_display_name(&input.display_name)?;
    let password_hash = auth::hash_password(validate_password(&input.password)?)?;
    let roles = dedup_roles(input.roles)?;
    let taken = user::Entity::find()
        .filter(user::Column::Email.eq(email.clone()))
        .one(db)
        .await?;
    if taken.is_some() {
        return Err(ApiError::Conflict(format!("{email} is already registered")));
    }
    let model = insert_user(
        db,
        user.org_id,
        &email,
        &display_name,
        &password_hash,
        &roles,
        Some(user.user_id),
    )
    .await?;
    Ok(UserView { user: model, roles })
}

/// Insert a user with its secret and roles in one transaction.
pub(crate) async fn insert_user(
    db: &DatabaseConnection,
    org_id: Uuid,
    email: &str,
    display_name: &str,
    password_hash: &str,
    roles: &[UserRole],
    set_by: Option<Uuid>,
) -> ApiResult<user::Model> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    let txn = db.begin().await?;
    let model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        org_id: Set(org_id),
        email: Set(email.to_string()),
        display_name: Set(display_name.to_string()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    user_secret::ActiveModel {
        user_id: Set(model.id),
        password_hash: Set(password_hash.to_string()),
        set_by: Set(set_by),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    insert_roles(&txn, model.id, roles).await?;
    txn.commit().await?;
    Ok(model)
}

async fn insert_roles<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    roles: &[UserRole],
) -> ApiResult<()> {
    for role in roles {
        user_role::ActiveModel {
            user_id: Set(user_id),
            role: Set((*role).into()),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

#[instrument(name = "bpo.users.update", skip_all, fields(org = %user.org_id, user_id = %id))]
pub async fn update(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: Uuid,
    patch: UserPatch,
) -> ApiResult<UserView> {
    user.require(UserRole::Admin)?;
    let display_name = patch
        .display_name
        .as_deref()
        .map(validate_display_name)
        .transpose()?;
    let password_hash = patch
        .password
        .as_deref()
        .map(|p| validate_password(p).and_then(auth::hash_password))
        .transpose()?;
    let roles = patch.roles.map(dedup_roles).transpose()?;
    if id == user.user_id {
        if patch.is_active == Some(false) {
            return Err(ApiError::validation("cannot deactivate yourself"));
        }
        if roles.as_ref().is_some_and(|r| !r.contains(&UserRole::Admin)) {
            return Err(ApiError::validation("cannot drop your own admin role"));
        }
    }

    let now: DateTimeWithTimeZone = Utc::now().into();
    let txn = db.begin().await?;
    let existing = user::Entity::find_by_id(id)
        .filter(user::Column::OrgId.eq(user.org_id))
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    let mut active: user::ActiveModel = existing.into();
    if let Some(name) = display_name {
        active.display_name = Set(name);
    }
    if let Some(is_active) = patch.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(now);
    let model = active.update(&txn).await?;
    if let Some(hash) = password_hash {
        user_secret::Entity::delete_by_id(id).exec(&txn).await?;
        user_secret::ActiveModel {
            user_id: Set(id),
            password_hash: Set(hash),
            set_by: Set(Some(user.user_id)),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
    }
    if let Some(roles) = &roles {
        user_role::Entity::delete_many()
            .filter(user_role::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        insert_roles(&txn, id, roles).await?;
    }
    let stored_roles = user_role::Entity::find()
        .filter(user_role::Column::UserId.eq(id))
        .all(&txn)
        .await?;
    txn.commit().await?;
    let mut roles: Vec<UserRole> = stored_roles.into_iter().map(|row| row.role.into()).collect();
    roles.sort_by_key(|r| std::cmp::Reverse(r.level()));
    Ok(UserView { user: model, roles })
}
