//! Onboarding checklist for signed clients.

use chrono::Utc;
use crm::onboarding::{self, Progress, CHECKLIST};
use entity::onboarding_item;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{CurrentUser, UserRole},
    prospects::find_scoped,
    ApiError, ApiResult,
};

#[derive(Clone, Debug, Serialize)]
pub struct Checklist {
    pub prospect_id: Uuid,
    pub items: Vec<onboarding_item::Model>,
    pub progress: Progress,
}

impl Checklist {
    fn new(prospect_id: Uuid, items: Vec<onboarding_item::Model>) -> Self {
        let progress = onboarding::progress(items.iter().map(|item| item.done));
        Self {
            prospect_id,
            items,
            progress,
        }
    }
}

async fn load_items<C: ConnectionTrait>(
    conn: &C,
    prospect_id: Uuid,
) -> ApiResult<Vec<onboarding_item::Model>> {
    Ok(onboarding_item::Entity::find()
        .filter(onboarding_item::Column::ProspectId.eq(prospect_id))
        .order_by_asc(onboarding_item::Column::Position)
        .all(conn)
        .await?)
}

/// Load the checklist, creating the template rows the first time it is opened.
#[instrument(name = "bpo.onboarding.checklist", skip_all, fields(org = %user.org_id, prospect_id = %prospect_id))]
pub async fn checklist(
    db: &DatabaseConnection,
    user: &CurrentUser,
    prospect_id: Uuid,
) -> ApiResult<Checklist> {
    user.require(UserRole::Operator)?;
    match materialize(db, user, prospect_id).await {
        // Another request created the rows between our read and insert.
        Err(ApiError::Conflict(_)) => {
            tracing::debug!("onboarding checklist created concurrently");
            let items = load_items(db, prospect_id).await?;
            Ok(Checklist::new(prospect_id, items))
        }
        other => other,
    }
}

async fn materialize(
    db: &DatabaseConnection,
    user: &CurrentUser,
    prospect_id: Uuid,
) -> ApiResult<Checklist> {
    let txn = db.begin().await?;
    let client = find_scoped(&txn, user.org_id, prospect_id).await?;
    onboarding::ensure_client(client.stage.into())?;
    let mut items = load_items(&txn, prospect_id).await?;
    if items.is_empty() {
        for (position, (key, label)) in CHECKLIST.iter().enumerate() {
            let item = onboarding_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                org_id: Set(user.org_id),
                prospect_id: Set(prospect_id),
                key: Set((*key).to_string()),
                label: Set((*label).to_string()),
                position: Set(position as i32),
                done: Set(false),
                done_at: Set(None),
                done_by: Set(None),
            }
            .insert(&txn)
            .await?;
            items.push(item);
        }
        tracing::info!(items = items.len(), "onboarding checklist created");
    }
    txn.commit().await?;
    Ok(Checklist::new(prospect_id, items))
}

#[instrument(name = "bpo.onboarding.toggle", skip_all, fields(org = %user.org_id, prospect_id = %prospect_id, key = %key, done))]
pub async fn toggle(
    db: &DatabaseConnection,
    user: &CurrentUser,
    prospect_id: Uuid,
    key: &str,
    done: bool,
) -> ApiResult<Checklist> {
    if onboarding::item_label(key).is_none() {
        return Err(ApiError::NotFound("onboarding item"));
    }
    // Materializes the template when needed and checks the prospect is a client.
    checklist(db, user, prospect_id).await?;

    let txn = db.begin().await?;
    let item = onboarding_item::Entity::find()
        .filter(onboarding_item::Column::ProspectId.eq(prospect_id))
        .filter(onboarding_item::Column::OrgId.eq(user.org_id))
        .filter(onboarding_item::Column::Key.eq(key))
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound("onboarding item"))?;
    if item.done != done {
        let mut active: onboarding_item::ActiveModel = item.into();
        active.done = Set(done);
        if done {
            active.done_at = Set(Some(Utc::now().into()));
            active.done_by = Set(Some(user.user_id));
        } else {
            active.done_at = Set(None);
            active.done_by = Set(None);
        }
        active.update(&txn).await?;
    }
    let items = load_items(&txn, prospect_id).await?;
    txn.commit().await?;
    Ok(Checklist::new(prospect_id, items))
}
