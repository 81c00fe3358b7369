use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "prospect")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub org_id: Uuid,
    pub contact_name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_role: Option<String>,
    pub company_name: String,
    pub tax_id: Option<String>,
    pub segment: Option<String>,
    pub plan: Option<Plan>,
    pub monthly_value_cents: i64,
    /// Array of service area keys.
    pub service_areas: Json,
    pub stage: Stage,
    pub origin: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn service_area_keys(&self) -> Vec<String> {
        self.service_areas
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl crm::StageCard for Model {
    fn card_id(&self) -> Uuid {
        self.id
    }

    fn card_stage(&self) -> Option<crm::Stage> {
        Some(self.stage.into())
    }

    fn card_value_cents(&self) -> i64 {
        self.monthly_value_cents
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::org::Entity",
        from = "Column::OrgId",
        to = "super::org::Column::Id"
    )]
    Org,
    #[sea_orm(has_many = "super::prospect_stage_history::Entity")]
    StageHistory,
    #[sea_orm(has_many = "super::onboarding_item::Entity")]
    OnboardingItem,
}

impl Related<super::org::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Org.def()
    }
}

impl Related<super::prospect_stage_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StageHistory.def()
    }
}

impl Related<super::onboarding_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OnboardingItem.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "contacted")]
    Contacted,
    #[sea_orm(string_value = "contract_sent")]
    ContractSent,
    #[sea_orm(string_value = "signed")]
    Signed,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<Stage> for crm::Stage {
    fn from(value: Stage) -> Self {
        match value {
            Stage::Pending => crm::Stage::Pending,
            Stage::Contacted => crm::Stage::Contacted,
            Stage::ContractSent => crm::Stage::ContractSent,
            Stage::Signed => crm::Stage::Signed,
            Stage::Rejected => crm::Stage::Rejected,
        }
    }
}

impl From<crm::Stage> for Stage {
    fn from(value: crm::Stage) -> Self {
        match value {
            crm::Stage::Pending => Stage::Pending,
            crm::Stage::Contacted => Stage::Contacted,
            crm::Stage::ContractSent => Stage::ContractSent,
            crm::Stage::Signed => Stage::Signed,
            crm::Stage::Rejected => Stage::Rejected,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[sea_orm(string_value = "controle")]
    Controle,
    #[sea_orm(string_value = "gerencial")]
    Gerencial,
    #[sea_orm(string_value = "avancado")]
    Avancado,
}

impl From<Plan> for crm::Plan {
    fn from(value: Plan) -> Self {
        match value {
            Plan::Controle => crm::Plan::Controle,
            Plan::Gerencial => crm::Plan::Gerencial,
            Plan::Avancado => crm::Plan::Avancado,
        }
    }
}

impl From<crm::Plan> for Plan {
    fn from(value: crm::Plan) -> Self {
        match value {
            crm::Plan::Controle => Plan::Controle,
            crm::Plan::Gerencial => Plan::Gerencial,
            crm::Plan::Avancado => Plan::Avancado,
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
