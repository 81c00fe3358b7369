//! GraphQL view of the pipeline: `bpo { me plans pipelineBoard prospectStageHistory }`
//! plus the `moveProspectStage` mutation.

use std::sync::Arc;

use async_graphql::{
    Context, EmptySubscription, ErrorExtensions, Object, Schema, SimpleObject, ID,
};
use chrono::{DateTime, Utc};
use crm::{Plan, ServiceArea, Stage};
use entity::{prospect, prospect_stage_history};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{auth::CurrentUser, prospects, users, ApiError, ApiResult};

pub type BpoSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(db: Arc<DatabaseConnection>) -> BpoSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(db)
        .finish()
}

pub struct QueryRoot;
pub struct MutationRoot;

#[Object]
impl QueryRoot {
    async fn bpo(&self) -> BpoQuery {
        BpoQuery
    }
}

#[Object]
impl MutationRoot {
    async fn bpo(&self) -> BpoMutation {
        BpoMutation
    }
}

#[derive(Default)]
pub struct BpoQuery;

#[derive(Default)]
pub struct BpoMutation;

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Me")]
pub struct MeNode {
    pub id: ID,
    pub org_id: ID,
    pub email: String,
    pub display_name: String,
    pub roles: Vec<String>,
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Plan")]
pub struct PlanNode {
    pub plan: Plan,
    pub label: String,
    pub monthly_value_cents: i64,
    pub areas: Vec<ServiceArea>,
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Prospect")]
pub struct ProspectNode {
    pub id: ID,
    pub contact_name: String,
    pub contact_email: Option<String>,
    pub company_name: String,
    pub plan: Option<Plan>,
    pub monthly_value_cents: i64,
    pub service_areas: Vec<String>,
    pub stage: Stage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<prospect::Model> for ProspectNode {
    fn from(model: prospect::Model) -> Self {
        let service_areas = model.service_area_keys();
        Self {
            id: ID::from(model.id.to_string()),
            contact_name: model.contact_name,
            contact_email: model.contact_email,
            company_name: model.company_name,
            plan: model.plan.map(Into::into),
            monthly_value_cents: model.monthly_value_cents,
            service_areas,
            stage: model.stage.into(),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "BoardColumn")]
pub struct ColumnNode {
    pub stage: Stage,
    pub label: String,
    pub count: i32,
    pub total_value_cents: i64,
    pub prospects: Vec<ProspectNode>,
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "PipelineBoard")]
pub struct BoardNode {
    pub columns: Vec<ColumnNode>,
    pub total_count: i32,
    pub total_value_cents: i64,
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "StageChange")]
pub struct StageHistoryNode {
    pub id: ID,
    pub from_stage: Option<Stage>,
    pub to_stage: Stage,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Option<ID>,
    pub note: Option<String>,
}

impl From<prospect_stage_history::Model> for StageHistoryNode {
    fn from(model: prospect_stage_history::Model) -> Self {
        Self {
            id: ID::from(model.id.to_string()),
            from_stage: model.from_stage.map(Into::into),
            to_stage: model.to_stage.into(),
            changed_at: model.changed_at.into(),
            changed_by: model.changed_by.map(|id| ID::from(id.to_string())),
            note: model.note,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct MoveStagePayload {
    pub prospect: ProspectNode,
    /// False when the prospect already was in the requested stage.
    pub changed: bool,
}

#[Object]
impl BpoQuery {
    async fn me(&self, ctx: &Context<'_>) -> async_graphql::Result<MeNode> {
        let (db, user) = scope(ctx)?;
        let view = users::me(db.as_ref(), &user).await.map_err(|e| e.extend())?;
        Ok(MeNode {
            id: ID::from(view.user.id.to_string()),
            org_id: ID::from(view.user.org_id.to_string()),
            email: view.user.email,
            display_name: view.user.display_name,
            roles: view.roles.iter().map(|r| r.as_str().to_string()).collect(),
        })
    }

    async fn plans(&self) -> Vec<PlanNode> {
        Plan::ALL
            .iter()
            .map(|plan| {
                let terms = plan.terms();
                PlanNode {
                    plan: *plan,
                    label: plan.label().to_string(),
                    monthly_value_cents: terms.monthly_value_cents,
                    areas: terms.areas.to_vec(),
                }
            })
            .collect()
    }

    async fn pipeline_board(&self, ctx: &Context<'_>) -> async_graphql::Result<BoardNode> {
        let (db, user) = scope(ctx)?;
        let board = prospects::board(db.as_ref(), &user)
            .await
            .map_err(|e| e.extend())?;
        let total_count = board.total_count() as i32;
        let total_value_cents = board
            .total_value_cents()
            .map_err(|e| ApiError::from(e).extend())?;
        let columns = board
            .columns
            .into_iter()
            .map(|column| ColumnNode {
                stage: column.stage,
                label: column.stage.label().to_string(),
                count: column.count as i32,
                total_value_cents: column.total_value_cents,
                prospects: column.cards.into_iter().map(ProspectNode::from).collect(),
            })
            .collect();
        Ok(BoardNode {
            columns,
            total_count,
            total_value_cents,
        })
    }

    async fn prospect_stage_history(
        &self,
        ctx: &Context<'_>,
        prospect_id: ID,
    ) -> async_graphql::Result<Vec<StageHistoryNode>> {
        let (db, user) = scope(ctx)?;
        let id = parse_id(&prospect_id).map_err(|e| e.extend())?;
        let rows = prospects::history(db.as_ref(), &user, id)
            .await
            .map_err(|e| e.extend())?;
        Ok(rows.into_iter().map(StageHistoryNode::from).collect())
    }
}

#[Object]
impl BpoMutation {
    async fn move_prospect_stage(
        &self,
        ctx: &Context<'_>,
        id: ID,
        stage: Stage,
        note: Option<String>,
    ) -> async_graphql::Result<MoveStagePayload> {
        let (db, user) = scope(ctx)?;
        let id = parse_id(&id).map_err(|e| e.extend())?;
        let outcome = prospects::move_stage(db.as_ref(), &user, id, stage, note)
            .await
            .map_err(|e| e.extend())?;
        Ok(MoveStagePayload {
            prospect: outcome.prospect.into(),
            changed: outcome.changed,
        })
    }
}

fn scope(ctx: &Context<'_>) -> async_graphql::Result<(Arc<DatabaseConnection>, CurrentUser)> {
    let db = ctx
        .data::<Arc<DatabaseConnection>>()
        .cloned()
        .map_err(|_| ApiError::internal("schema built without a database").extend())?;
    let user = ctx
        .data::<CurrentUser>()
        .cloned()
        .map_err(|_| ApiError::Unauthenticated.extend())?;
    Ok((db, user))
}

fn parse_id(id: &ID) -> ApiResult<Uuid> {
    Uuid::parse_str(id.as_str()).map_err(|_| ApiError::validation("invalid id"))
}
