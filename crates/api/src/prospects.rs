//! Prospect pipeline: CRUD, board and stage transitions.

use chrono::Utc;
use crm::{
    prospect::{ensure_deletable, pricing_update, PricingUpdate, ProspectForm},
    Board, Plan, Stage, Transition,
};
use entity::{onboarding_item, prospect, prospect_stage_history};
use sea_orm::{
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, Func, LikeExpr},
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{CurrentUser, UserRole},
    page_bounds, ApiError, ApiResult, Page,
};

#[derive(Debug, Default, Deserialize)]
pub struct ProspectFilter {
    pub stage: Option<Stage>,
    pub q: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewProspect {
    #[serde(flatten)]
    pub form: ProspectForm,
    pub plan: Option<Plan>,
    pub monthly_value_cents: Option<i64>,
    pub service_areas: Option<Vec<String>>,
    pub stage: Option<Stage>,
}

/// Partial edit. Absent fields keep their value; an empty string clears an
/// optional field.
#[derive(Debug, Default, Deserialize)]
pub struct ProspectPatch {
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_role: Option<String>,
    pub company_name: Option<String>,
    pub tax_id: Option<String>,
    pub segment: Option<String>,
    pub origin: Option<String>,
    pub notes: Option<String>,
    pub plan: Option<Plan>,
    pub monthly_value_cents: Option<i64>,
    pub service_areas: Option<Vec<String>>,
    pub stage: Option<Stage>,
    /// Recorded on the stage history row when `stage` changes.
    pub note: Option<String>,
}

impl ProspectPatch {
    fn touches_fields(&self) -> bool {
        self.contact_name.is_some()
            || self.contact_email.is_some()
            || self.contact_phone.is_some()
            || self.contact_role.is_some()
            || self.company_name.is_some()
            || self.tax_id.is_some()
            || self.segment.is_some()
            || self.origin.is_some()
            || self.notes.is_some()
    }

    fn merged_form(&self, existing: &prospect::Model) -> ProspectForm {
        ProspectForm {
            contact_name: self
                .contact_name
                .clone()
                .unwrap_or_else(|| existing.contact_name.clone()),
            contact_email: self.contact_email.clone().or(existing.contact_email.clone()),
            contact_phone: self.contact_phone.clone().or(existing.contact_phone.clone()),
            contact_role: self.contact_role.clone().or(existing.contact_role.clone()),
            company_name: self
                .company_name
                .clone()
                .unwrap_or_else(|| existing.company_name.clone()),
            tax_id: self.tax_id.clone().or(existing.tax_id.clone()),
            segment: self.segment.clone().or(existing.segment.clone()),
            origin: self.origin.clone().or(existing.origin.clone()),
            notes: self.notes.clone().or(existing.notes.clone()),
        }
    }
}

/// Outcome of a stage transition request.
#[derive(Clone, Debug)]
pub struct StageMove {
    pub prospect: prospect::Model,
    pub changed: bool,
}

pub(crate) async fn find_scoped<C: ConnectionTrait>(
    conn: &C,
    org_id: Uuid,
    id: Uuid,
) -> ApiResult<prospect::Model> {
    prospect::Entity::find_by_id(id)
        .filter(prospect::Column::OrgId.eq(org_id))
        .one(conn)
        .await?
        .ok_or(ApiError::NotFound("prospect"))
}

/// Case-insensitive substring pattern; `%` and `_` in the query match literally.
fn contains_pattern(q: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(q.len() + 2);
    pattern.push('%');
    for c in q.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape('\\')
}

#[instrument(name = "bpo.prospects.list", skip_all, fields(org = %user.org_id))]
pub async fn list(
    db: &DatabaseConnection,
    user: &CurrentUser,
    filter: ProspectFilter,
) -> ApiResult<Page<prospect::Model>> {
    user.require(UserRole::Operator)?;
    let (limit, offset) = page_bounds(filter.limit, filter.offset);
    let mut query = prospect::Entity::find().filter(prospect::Column::OrgId.eq(user.org_id));
    if let Some(stage) = filter.stage {
        query = query.filter(prospect::Column::Stage.eq(prospect::Stage::from(stage)));
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = contains_pattern(q);
        query = query.filter(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(prospect::Column::ContactName))).like(pattern.clone()))
                .add(Expr::expr(Func::lower(Expr::col(prospect::Column::CompanyName))).like(pattern)),
        );
    }
    let total = query.clone().count(db).await?;
    let items = query
        .order_by_desc(prospect::Column::UpdatedAt)
        .order_by_asc(prospect::Column::Id)
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

pub async fn get(db: &DatabaseConnection, user: &CurrentUser, id: Uuid) -> ApiResult<prospect::Model> {
    user.require(UserRole::Operator)?;
    find_scoped(db, user.org_id, id).await
}

#[instrument(name = "bpo.prospects.create", skip_all, fields(org = %user.org_id))]
pub async fn create(
    db: &DatabaseConnection,
    user: &CurrentUser,
    input: NewProspect,
) -> ApiResult<prospect::Model> {
    user.require(UserRole::Operator)?;
    let form = input.form.validate()?;
    let (plan, monthly_value_cents, areas) =
        match pricing_update(input.plan, input.monthly_value_cents, input.service_areas)? {
            PricingUpdate::Untouched => (None, 0, Vec::new()),
            PricingUpdate::FromPlan(terms) => {
                (Some(terms.plan.into()), terms.monthly_value_cents, terms.area_keys())
            }
            PricingUpdate::Manual {
                monthly_value_cents,
                service_areas,
            } => (None, monthly_value_cents.unwrap_or(0), service_areas.unwrap_or_default()),
        };
    let stage = input.stage.unwrap_or(Stage::INITIAL);
    let now: DateTimeWithTimeZone = Utc::now().into();
    let id = Uuid::new_v4();

    let txn = db.begin().await?;
    let model = prospect::ActiveModel {
        id: Set(id),
        org_id: Set(user.org_id),
        contact_name: Set(form.contact_name),
        contact_email: Set(form.contact_email),
        contact_phone: Set(form.contact_phone),
        contact_role: Set(form.contact_role),
        company_name: Set(form.company_name),
        tax_id: Set(form.tax_id),
        segment: Set(form.segment),
        plan: Set(plan),
        monthly_value_cents: Set(monthly_value_cents),
        service_areas: Set(json!(areas)),
        stage: Set(stage.into()),
        origin: Set(form.origin),
        notes: Set(form.notes),
        created_by: Set(Some(user.user_id)),
        updated_by: Set(Some(user.user_id)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    record_history(&txn, &model, None, stage, now, user.user_id, None).await?;
    txn.commit().await?;
    tracing::info!(prospect_id = %model.id, stage = %stage, "prospect created");
    Ok(model)
}

#[instrument(name = "bpo.prospects.update", skip_all, fields(org = %user.org_id, prospect_id = %id))]
pub async fn update(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: Uuid,
    patch: ProspectPatch,
) -> ApiResult<prospect::Model> {
    user.require(UserRole::Operator)?;
    let pricing = pricing_update(
        patch.plan,
        patch.monthly_value_cents,
        patch.service_areas.clone(),
    )?;
    let txn = db.begin().await?;
    let existing = find_scoped(&txn, user.org_id, id).await?;
    let now: DateTimeWithTimeZone = Utc::now().into();

    let mut current = existing.clone();
    if patch.touches_fields() || pricing != PricingUpdate::Untouched {
        let form = patch.merged_form(&existing).validate()?;
        let mut active: prospect::ActiveModel = existing.into();
        active.contact_name = Set(form.contact_name);
        active.contact_email = Set(form.contact_email);
        active.contact_phone = Set(form.contact_phone);
        active.contact_role = Set(form.contact_role);
        active.company_name = Set(form.company_name);
        active.tax_id = Set(form.tax_id);
        active.segment = Set(form.segment);
        active.origin = Set(form.origin);
        active.notes = Set(form.notes);
        match pricing {
            PricingUpdate::Untouched => {}
            PricingUpdate::FromPlan(terms) => {
                active.plan = Set(Some(terms.plan.into()));
                active.monthly_value_cents = Set(terms.monthly_value_cents);
                active.service_areas = Set(json!(terms.area_keys()));
            }
            PricingUpdate::Manual {
                monthly_value_cents,
                service_areas,
            } => {
                if let Some(value) = monthly_value_cents {
                    active.monthly_value_cents = Set(value);
                }
                if let Some(areas) = service_areas {
                    active.service_areas = Set(json!(areas));
                }
            }
        }
        active.updated_at = Set(now);
        active.updated_by = Set(Some(user.user_id));
        current = active.update(&txn).await?;
    }

    if let Some(stage) = patch.stage {
        current = apply_stage(&txn, user, current, stage, patch.note, now).await?.prospect;
    }
    txn.commit().await?;
    Ok(current)
}

/// Move a prospect to `stage`. Same-stage requests succeed without writing.
#[instrument(name = "bpo.prospects.move_stage", skip_all, fields(org = %user.org_id, prospect_id = %id, to = %stage))]
pub async fn move_stage(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: Uuid,
    stage: Stage,
    note: Option<String>,
) -> ApiResult<StageMove> {
    user.require(UserRole::Operator)?;
    let txn = db.begin().await?;
    let existing = find_scoped(&txn, user.org_id, id).await?;
    let outcome = apply_stage(&txn, user, existing, stage, note, Utc::now().into()).await?;
    txn.commit().await?;
    Ok(outcome)
}

async fn apply_stage<C: ConnectionTrait>(
    conn: &C,
    user: &CurrentUser,
    existing: prospect::Model,
    stage: Stage,
    note: Option<String>,
    now: DateTimeWithTimeZone,
) -> ApiResult<StageMove> {
    let (from, to) = match crm::transition(existing.stage.into(), stage) {
        Transition::Unchanged => {
            return Ok(StageMove {
                prospect: existing,
                changed: false,
            })
        }
        Transition::Move { from, to } => (from, to),
    };
    let mut active: prospect::ActiveModel = existing.into();
    active.stage = Set(to.into());
    active.updated_at = Set(now);
    active.updated_by = Set(Some(user.user_id));
    let updated = active.update(conn).await?;
    let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    record_history(conn, &updated, Some(from), to, now, user.user_id, note).await?;
    tracing::info!(prospect_id = %updated.id, %from, %to, "prospect stage changed");
    Ok(StageMove {
        prospect: updated,
        changed: true,
    })
}

async fn record_history<C: ConnectionTrait>(
    conn: &C,
    prospect: &prospect::Model,
    from: Option<Stage>,
    to: Stage,
    at: DateTimeWithTimeZone,
    by: Uuid,
    note: Option<String>,
) -> ApiResult<()> {
    let row = prospect_stage_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        org_id: Set(prospect.org_id),
        prospect_id: Set(prospect.id),
        from_stage: Set(from.map(Into::into)),
        to_stage: Set(to.into()),
        changed_at: Set(at),
        changed_by: Set(Some(by)),
        note: Set(note),
    };
    prospect_stage_history::Entity::insert(row)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

#[instrument(name = "bpo.prospects.delete", skip_all, fields(org = %user.org_id, prospect_id = %id))]
pub async fn delete(db: &DatabaseConnection, user: &CurrentUser, id: Uuid) -> ApiResult<()> {
    user.require(UserRole::Operator)?;
    let txn = db.begin().await?;
    let existing = find_scoped(&txn, user.org_id, id).await?;
    ensure_deletable(existing.stage.into())?;
    onboarding_item::Entity::delete_many()
        .filter(onboarding_item::Column::ProspectId.eq(id))
        .exec(&txn)
        .await?;
    prospect_stage_history::Entity::delete_many()
        .filter(prospect_stage_history::Column::ProspectId.eq(id))
        .exec(&txn)
        .await?;
    prospect::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    Ok(())
}

/// Every prospect of the caller's organization, bucketed by stage.
#[instrument(name = "bpo.prospects.board", skip_all, fields(org = %user.org_id))]
pub async fn board(db: &DatabaseConnection, user: &CurrentUser) -> ApiResult<Board<prospect::Model>> {
    user.require(UserRole::Operator)?;
    let records = prospect::Entity::find()
        .filter(prospect::Column::OrgId.eq(user.org_id))
        .order_by_asc(prospect::Column::CreatedAt)
        .order_by_asc(prospect::Column::Id)
        .all(db)
        .await?;
    Ok(crm::partition(records)?)
}

pub async fn history(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: Uuid,
) -> ApiResult<Vec<prospect_stage_history::Model>> {
    user.require(UserRole::Operator)?;
    find_scoped(db, user.org_id, id).await?;
    Ok(prospect_stage_history::Entity::find()
        .filter(prospect_stage_history::Column::ProspectId.eq(id))
        .order_by_asc(prospect_stage_history::Column::ChangedAt)
        .all(db)
        .await?)
}
