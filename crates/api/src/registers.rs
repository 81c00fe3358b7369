//! Accounts payable/receivable and their reconciliation by the BPO team.

use chrono::{NaiveDate, Utc};
use crm::finance::{ensure_register_editable, RegisterForm, RegisterKind, ValidRegister};
use entity::{financial_account, financial_category, financial_register};
use sea_orm::{
    prelude::DateTimeWithTimeZone, ActiveModelTrait, ActiveValue::Set, ColumnTrait,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{CurrentUser, UserRole},
    page_bounds, ApiError, ApiResult, Page,
};

#[derive(Debug, Default, Deserialize)]
pub struct RegisterFilter {
    pub kind: Option<RegisterKind>,
    pub validated: Option<bool>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    #[serde(flatten)]
    pub form: RegisterForm,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ValidationInput {
    pub validated: bool,
    pub note: Option<String>,
}

async fn find_scoped(
    db: &DatabaseConnection,
    org_id: Uuid,
    id: Uuid,
) -> ApiResult<financial_register::Model> {
    financial_register::Entity::find_by_id(id)
        .filter(financial_register::Column::OrgId.eq(org_id))
        .one(db)
        .await?
        .ok_or(ApiError::NotFound("register"))
}

/// Category and account references must point into the caller's organization.
async fn check_links(
    db: &DatabaseConnection,
    org_id: Uuid,
    category_id: Option<Uuid>,
    account_id: Option<Uuid>,
) -> ApiResult<()> {
    if let Some(id) = category_id {
        financial_category::Entity::find_by_id(id)
            .filter(financial_category::Column::OrgId.eq(org_id))
            .one(db)
            .await?
            .ok_or(ApiError::NotFound("category"))?;
    }
    if let Some(id) = account_id {
        financial_account::Entity::find_by_id(id)
            .filter(financial_account::Column::OrgId.eq(org_id))
            .one(db)
            .await?
            .ok_or(ApiError::NotFound("account"))?;
    }
    Ok(())
}

#[instrument(name = "bpo.registers.list", skip_all, fields(org = %user.org_id))]
pub async fn list(
    db: &DatabaseConnection,
    user: &CurrentUser,
    filter: RegisterFilter,
) -> ApiResult<Page<financial_register::Model>> {
    if let (Some(from), Some(to)) = (filter.due_from, filter.due_to) {
        if from > to {
            return Err(ApiError::validation("due_from must be on or before due_to"));
        }
    }
    let (limit, offset) = page_bounds(filter.limit, filter.offset);
    let mut query = financial_register::Entity::find()
        .filter(financial_register::Column::OrgId.eq(user.org_id));
    if let Some(kind) = filter.kind {
        query = query.filter(
            financial_register::Column::Kind.eq(financial_register::RegisterKind::from(kind)),
        );
    }
    if let Some(validated) = filter.validated {
        query = query.filter(financial_register::Column::Validated.eq(validated));
    }
    if let Some(from) = filter.due_from {
        query = query.filter(financial_register::Column::DueDate.gte(from));
    }
    if let Some(to) = filter.due_to {
        query = query.filter(financial_register::Column::DueDate.lte(to));
    }
    let total = query.clone().count(db).await?;
    let items = query
        .order_by_asc(financial_register::Column::DueDate)
        .order_by_asc(financial_register::Column::CreatedAt)
        .limit(limit)
        .offset(offset)
        .all(db)
        .await?;
    Ok(Page {
        items,
        total,
        limit,
        offset,
    })
}

pub async fn get(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: Uuid,
) -> ApiResult<financial_register::Model> {
    find_scoped(db, user.org_id, id).await
}

#[instrument(name = "bpo.registers.create", skip_all, fields(org = %user.org_id))]
pub async fn create(
    db: &DatabaseConnection,
    user: &CurrentUser,
    input: RegisterInput,
) -> ApiResult<financial_register::Model> {
    let valid = input.form.validate()?;
    check_links(db, user.org_id, input.category_id, input.account_id).await?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    let mut active = financial_register::ActiveModel {
        id: Set(Uuid::new_v4()),
        org_id: Set(user.org_id),
        side: Set(user.side().into()),
        validated: Set(false),
        validated_by: Set(None),
        validated_at: Set(None),
        validation_note: Set(None),
        created_by: Set(Some(user.user_id)),
        created_at: Set(now),
        ..Default::default()
    };
    assign(&mut active, valid, input.category_id, input.account_id, user, now);
    let model = active.insert(db).await?;
    tracing::info!(register_id = %model.id, side = ?model.side, "register created");
    Ok(model)
}

#[instrument(name = "bpo.registers.update", skip_all, fields(org = %user.org_id, register_id = %id))]
pub async fn update(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: Uuid,
    input: RegisterInput,
) -> ApiResult<financial_register::Model> {
    let existing = find_scoped(db, user.org_id, id).await?;
    ensure_register_editable(existing.validated, user.side())?;
    let valid = input.form.validate()?;
    check_links(db, user.org_id, input.category_id, input.account_id).await?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    let mut active: financial_register::ActiveModel = existing.into();
    assign(&mut active, valid, input.category_id, input.account_id, user, now);
    Ok(active.update(db).await?)
}

fn assign(
    active: &mut financial_register::ActiveModel,
    valid: ValidRegister,
    category_id: Option<Uuid>,
    account_id: Option<Uuid>,
    user: &CurrentUser,
    now: DateTimeWithTimeZone,
) {
    active.kind = Set(valid.kind.into());
    active.description = Set(valid.description);
    active.value_cents = Set(valid.value_cents);
    active.due_date = Set(valid.due_date);
    active.issue_date = Set(valid.issue_date);
    active.payment_method = Set(valid.payment_method.map(Into::into));
    active.recurrence = Set(valid.recurrence.into());
    active.counterparty = Set(valid.counterparty);
    active.category_id = Set(category_id);
    active.account_id = Set(account_id);
    active.updated_by = Set(Some(user.user_id));
    active.updated_at = Set(now);
}

#[instrument(name = "bpo.registers.delete", skip_all, fields(org = %user.org_id, register_id = %id))]
pub async fn delete(db: &DatabaseConnection, user: &CurrentUser, id: Uuid) -> ApiResult<()> {
    let existing = find_scoped(db, user.org_id, id).await?;
    ensure_register_editable(existing.validated, user.side())?;
    financial_register::Entity::delete_by_id(existing.id)
        .exec(db)
        .await?;
    Ok(())
}

/// Mark a register as reconciled, or undo it. BPO side only.
#[instrument(name = "bpo.registers.set_validation", skip_all, fields(org = %user.org_id, register_id = %id, validated = input.validated))]
pub async fn set_validation(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: Uuid,
    input: ValidationInput,
) -> ApiResult<financial_register::Model> {
    user.require(UserRole::Operator)?;
    let existing = find_scoped(db, user.org_id, id).await?;
    let note = input
        .note
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let now: DateTimeWithTimeZone = Utc::now().into();
    let mut active: financial_register::ActiveModel = existing.into();
    active.validated = Set(input.validated);
    if input.validated {
        active.validated_by = Set(Some(user.user_id));
        active.validated_at = Set(Some(now));
    } else {
        active.validated_by = Set(None);
        active.validated_at = Set(None);
    }
    active.validation_note = Set(note);
    active.updated_by = Set(Some(user.user_id));
    active.updated_at = Set(now);
    Ok(active.update(db).await?)
}
