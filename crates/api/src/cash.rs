//! Cash movements and balance summaries.

use chrono::{NaiveDate, Utc};
use crm::{
    finance::{self, validate_movement_amount, CashSummary, MovementKind},
    money,
};
use entity::{cash_movement, financial_account, financial_category, financial_register};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Select,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{CurrentUser, UserRole},
    ApiError, ApiResult,
};

#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub account_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl MovementFilter {
    fn check(&self) -> ApiResult<()> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => {
                Err(ApiError::validation("from must be on or before to"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewMovement {
    pub kind: MovementKind,
    pub description: String,
    pub amount_cents: i64,
    pub occurred_on: NaiveDate,
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub register_id: Option<Uuid>,
}

fn scoped(org_id: Uuid, account_id: Option<Uuid>) -> Select<cash_movement::Entity> {
    let query = cash_movement::Entity::find().filter(cash_movement::Column::OrgId.eq(org_id));
    match account_id {
        Some(account_id) => query.filter(cash_movement::Column::AccountId.eq(account_id)),
        None => query,
    }
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

#[instrument(name = "bpo.cash.list", skip_all, fields(org = %user.org_id))]
pub async fn list(
    db: &DatabaseConnection,
    user: &CurrentUser,
    filter: MovementFilter,
) -> ApiResult<Vec<cash_movement::Model>> {
    filter.check()?;
    let mut query = scoped(user.org_id, filter.account_id);
    if let Some(from) = filter.from {
        query = query.filter(cash_movement::Column::OccurredOn.gte(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(cash_movement::Column::OccurredOn.lte(to));
    }
    Ok(query
        .order_by_asc(cash_movement::Column::OccurredOn)
        .order_by_asc(cash_movement::Column::CreatedAt)
        .all(db)
        .await?)
}

#[instrument(name = "bpo.cash.create", skip_all, fields(org = %user.org_id))]
pub async fn create(
    db: &DatabaseConnection,
    user: &CurrentUser,
    input: NewMovement,
) -> ApiResult<cash_movement::Model> {
    let amount_cents = validate_movement_amount(input.amount_cents)?;
    let description = input.description.trim();
    if description.is_empty() {
        return Err(crm::CrmError::Required {
            field: "description",
        }
        .into());
    }
    if let Some(id) = input.account_id {
        find_account(db, user.org_id, id).await?;
    }
    if let Some(id) = input.category_id {
        financial_category::Entity::find_by_id(id)
            .filter(financial_category::Column::OrgId.eq(user.org_id))
            .one(db)
            .await?
            .ok_or(ApiError::NotFound("category"))?;
    }
    if let Some(id) = input.register_id {
        financial_register::Entity::find_by_id(id)
            .filter(financial_register::Column::OrgId.eq(user.org_id))
            .one(db)
            .await?
            .ok_or(ApiError::NotFound("register"))?;
    }
    let model = cash_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        org_id: Set(user.org_id),
        kind: Set(input.kind.into()),
        description: Set(description.to_string()),
        amount_cents: Set(amount_cents),
        occurred_on: Set(input.occurred_on),
        account_id: Set(input.account_id),
        category_id: Set(input.category_id),
        register_id: Set(input.register_id),
        created_by: Set(Some(user.user_id)),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?;
    Ok(model)
}

#[instrument(name = "bpo.cash.delete", skip_all, fields(org = %user.org_id, movement_id = %id))]
pub async fn delete(db: &DatabaseConnection, user: &CurrentUser, id: Uuid) -> ApiResult<()> {
    user.require(UserRole::Operator)?;
    let result = cash_movement::Entity::delete_many()
        .filter(cash_movement::Column::Id.eq(id))
        .filter(cash_movement::Column::OrgId.eq(user.org_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound("movement"));
    }
    Ok(())
}

/// Totals for the period. The opening balance is the account's opening balance
/// (all accounts when none is given) plus everything that moved before `from`.
#[instrument(name = "bpo.cash.summary", skip_all, fields(org = %user.org_id))]
pub async fn summary(
    db: &DatabaseConnection,
    user: &CurrentUser,
    filter: MovementFilter,
) -> ApiResult<CashSummary> {
    filter.check()?;
    let base = match filter.account_id {
        Some(id) => find_account(db, user.org_id, id).await?.opening_balance_cents,
        None => money::sum(
            "opening_balance",
            financial_account::Entity::find()
                .filter(financial_account::Column::OrgId.eq(user.org_id))
                .all(db)
                .await?
                .iter()
                .map(|account| account.opening_balance_cents),
        )?,
    };
    let movements = scoped(user.org_id, filter.account_id).all(db).await?;
    let (before, within): (Vec<_>, Vec<_>) = movements
        .into_iter()
        .filter(|m| filter.to.map_or(true, |to| m.occurred_on <= to))
        .partition(|m| filter.from.is_some_and(|from| m.occurred_on < from));
    let opening = finance::summarize(base, pairs(before))?.balance_cents;
    Ok(finance::summarize(opening, pairs(within))?)
}

fn pairs(movements: Vec<cash_movement::Model>) -> impl Iterator<Item = (MovementKind, i64)> {
    movements
        .into_iter()
        .map(|m| (MovementKind::from(m.kind), m.amount_cents))
}
