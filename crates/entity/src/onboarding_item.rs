use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize)]
#[sea_orm(table_name = "onboarding_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub org_id: Uuid,
    #[sea_orm(indexed)]
    pub prospect_id: Uuid,
    pub key: String,
    pub label: String,
    pub position: i32,
    pub done: bool,
    pub done_at: Option<DateTimeWithTimeZone>,
    pub done_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::prospect::Entity",
        from = "Column::ProspectId",
        to = "super::prospect::Column::Id",
        on_delete = "Cascade"
    )]
    Prospect,
}

impl Related<super::prospect::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Prospect.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
