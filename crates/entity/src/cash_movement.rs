use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize)]
#[sea_orm(table_name = "cash_movement")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub org_id: Uuid,
    pub kind: MovementKind,
    pub description: String,
    pub amount_cents: i64,
    pub occurred_on: Date,
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    /// Register settled by this movement, if any.
    pub register_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::financial_account::Entity",
        from = "Column::AccountId",
        to = "super::financial_account::Column::Id",
        on_delete = "SetNull"
    )]
    Account,
    #[sea_orm(
        belongs_to = "super::financial_register::Entity",
        from = "Column::RegisterId",
        to = "super::financial_register::Column::Id",
        on_delete = "SetNull"
    )]
    Register,
}

impl Related<super::financial_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::financial_register::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Register.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    #[sea_orm(string_value = "inflow")]
    Inflow,
    #[sea_orm(string_value = "outflow")]
    Outflow,
}

impl From<MovementKind> for crm::finance::MovementKind {
    fn from(value: MovementKind) -> Self {
        match value {
            MovementKind::Inflow => crm::finance::MovementKind::Inflow,
            MovementKind::Outflow => crm::finance::MovementKind::Outflow,
        }
    }
}

impl From<crm::finance::MovementKind> for MovementKind {
    fn from(value: crm::finance::MovementKind) -> Self {
        match value {
            crm::finance::MovementKind::Inflow => MovementKind::Inflow,
            crm::finance::MovementKind::Outflow => MovementKind::Outflow,
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
