//! Financial configuration: groups, categories and bank accounts.

use chrono::Utc;
use crm::{finance::chart_name, money};
use entity::{
    financial_account, financial_category,
    financial_group::{self, GroupKind},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{CurrentUser, UserRole},
    ApiError, ApiResult,
};

#[derive(Debug, Deserialize)]
pub struct GroupInput {
    pub name: String,
    pub kind: GroupKind,
}

#[derive(Debug, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub group_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryFilter {
    pub group_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AccountInput {
    pub name: String,
    pub bank: Option<String>,
    pub agency: Option<String>,
    pub account_number: Option<String>,
    #[serde(default)]
    pub opening_balance_cents: i64,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn find_group(
    db: &DatabaseConnection,
    org_id: Uuid,
    id: Uuid,
) -> ApiResult<financial_group::Model> {
    financial_group::Entity::find_by_id(id)
        .filter(financial_group::Column::OrgId.eq(org_id))
        .one(db)
        .await?
        .ok_or(ApiError::NotFound("group"))
}

async fn find_category(
    db: &DatabaseConnection,
    org_id: Uuid,
    id: Uuid,
) -> ApiResult<financial_category::Model> {
    financial_category::Entity::find_by_id(id)
        .filter(financial_category::Column::OrgId.eq(org_id))
        .one(db)
        .await?
        .ok_or(ApiError::NotFound("category"))
}

async fn find_account(
    db: &DatabaseConnection,
    org_id: Uuid,
    id: Uuid,
) -> ApiResult<financial_account::Model> {
    financial_account::Entity::find_by_id(id)
        .filter(financial_account::Column::OrgId.eq(org_id))
        .one(db)
        .await?
        .ok_or(ApiError::NotFound("account"))
}

pub async fn list_groups(
    db: &DatabaseConnection,
    user: &CurrentUser,
) -> ApiResult<Vec<financial_group::Model>> {
    Ok(financial_group::Entity::find()
        .filter(financial_group::Column::OrgId.eq(user.org_id))
        .order_by_asc(financial_group::Column::Name)
        .all(db)
        .await?)
}

#[instrument(name = "bpo.chart.create_group", skip_all, fields(org = %user.org_id))]
pub async fn create_group(
    db: &DatabaseConnection,
    user: &CurrentUser,
    input: GroupInput,
) -> ApiResult<financial_group::Model> {
    user.require(UserRole::Operator)?;
    let name = chart_name(&input.name)?;
    Ok(financial_group::ActiveModel {
        id: Set(Uuid::new_v4()),
        org_id: Set(user.org_id),
        name: Set(name),
        kind: Set(input.kind),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?)
}

pub async fn update_group(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: Uuid,
    input: GroupInput,
) -> ApiResult<financial_group::Model> {
    user.require(UserRole::Operator)?;
    let name = chart_name(&input.name)?;
    let mut active: financial_group::ActiveModel = find_group(db, user.org_id, id).await?.into();
    active.name = Set(name);
    active.kind = Set(input.kind);
    Ok(active.update(db).await?)
}

/// Groups that still classify categories stay.
#[instrument(name = "bpo.chart.delete_group", skip_all, fields(org = %user.org_id, group_id = %id))]
pub async fn delete_group(db: &DatabaseConnection, user: &CurrentUser, id: Uuid) -> ApiResult<()> {
    user.require(UserRole::Operator)?;
    let group = find_group(db, user.org_id, id).await?;
    let in_use = financial_category::Entity::find()
        .filter(financial_category::Column::GroupId.eq(group.id))
        .count(db)
        .await?;
    if in_use > 0 {
        return Err(ApiError::Conflict(format!(
            "group has {in_use} categories; move or delete them first"
        )));
    }
    financial_group::Entity::delete_by_id(group.id).exec(db).await?;
    Ok(())
}

pub async fn list_categories(
    db: &DatabaseConnection,
    user: &CurrentUser,
    filter: CategoryFilter,
) -> ApiResult<Vec<financial_category::Model>> {
    let mut query = financial_category::Entity::find()
        .filter(financial_category::Column::OrgId.eq(user.org_id));
    if let Some(group_id) = filter.group_id {
        query = query.filter(financial_category::Column::GroupId.eq(group_id));
    }
    Ok(query
        .order_by_asc(financial_category::Column::Name)
        .all(db)
        .await?)
}

#[instrument(name = "bpo.chart.create_category", skip_all, fields(org = %user.org_id))]
pub async fn create_category(
    db: &DatabaseConnection,
    user: &CurrentUser,
    input: CategoryInput,
) -> ApiResult<financial_category::Model> {
    user.require(UserRole::Operator)?;
    let name = chart_name(&input.name)?;
    let group = find_group(db, user.org_id, input.group_id).await?;
    Ok(financial_category::ActiveModel {
        id: Set(Uuid::new_v4()),
        org_id: Set(user.org_id),
        group_id: Set(group.id),
        name: Set(name),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?)
}

pub async fn update_category(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: Uuid,
    input: CategoryInput,
) -> ApiResult<financial_category::Model> {
    user.require(UserRole::Operator)?;
    let name = chart_name(&input.name)?;
    let group = find_group(db, user.org_id, input.group_id).await?;
    let mut active: financial_category::ActiveModel =
        find_category(db, user.org_id, id).await?.into();
    active.name = Set(name);
    active.group_id = Set(group.id);
    Ok(active.update(db).await?)
}

pub async fn delete_category(db: &DatabaseConnection, user: &CurrentUser, id: Uuid) -> ApiResult<()> {
    user.require(UserRole::Operator)?;
    let category = find_category(db, user.org_id, id).await?;
    financial_category::Entity::delete_by_id(category.id)
        .exec(db)
        .await?;
    Ok(())
}

pub async fn list_accounts(
    db: &DatabaseConnection,
    user: &CurrentUser,
) -> ApiResult<Vec<financial_account::Model>> {
    Ok(financial_account::Entity::find()
        .filter(financial_account::Column::OrgId.eq(user.org_id))
        .order_by_asc(financial_account::Column::Name)
        .all(db)
        .await?)
}

#[instrument(name = "bpo.chart.create_account", skip_all, fields(org = %user.org_id))]
pub async fn create_account(
    db: &DatabaseConnection,
    user: &CurrentUser,
    input: AccountInput,
) -> ApiResult<financial_account::Model> {
    user.require(UserRole::Operator)?;
    let name = chart_name(&input.name)?;
    let opening_balance_cents = money::bounded("opening_balance", input.opening_balance_cents)?;
    let now = Utc::now();
    Ok(financial_account::ActiveModel {
        id: Set(Uuid::new_v4()),
        org_id: Set(user.org_id),
        name: Set(name),
        bank: Set(blank_to_none(input.bank)),
        agency: Set(blank_to_none(input.agency)),
        account_number: Set(blank_to_none(input.account_number)),
        opening_balance_cents: Set(opening_balance_cents),
        is_active: Set(input.is_active),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await?)
}

pub async fn update_account(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: Uuid,
    input: AccountInput,
) -> ApiResult<financial_account::Model> {
    user.require(UserRole::Operator)?;
    let name = chart_name(&input.name)?;
    let opening_balance_cents = money::bounded("opening_balance", input.opening_balance_cents)?;
    let mut active: financial_account::ActiveModel =
        find_account(db, user.org_id, id).await?.into();
    active.name = Set(name);
    active.bank = Set(blank_to_none(input.bank));
    active.agency = Set(blank_to_none(input.agency));
    active.account_number = Set(blank_to_none(input.account_number));
    active.opening_balance_cents = Set(opening_balance_cents);
    active.is_active = Set(input.is_active);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(db).await?)
}

pub async fn delete_account(db: &DatabaseConnection, user: &CurrentUser, id: Uuid) -> ApiResult<()> {
    user.require(UserRole::Operator)?;
    let account = find_account(db, user.org_id, id).await?;
    financial_account::Entity::delete_by_id(account.id)
        .exec(db)
        .await?;
    Ok(())
}
