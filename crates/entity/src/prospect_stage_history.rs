use sea_orm::entity::prelude::*;
use serde::Serialize;

use super::prospect::Stage;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize)]
#[sea_orm(table_name = "prospect_stage_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub org_id: Uuid,
    #[sea_orm(indexed)]
    pub prospect_id: Uuid,
    pub from_stage: Option<Stage>,
    pub to_stage: Stage,
    pub changed_at: DateTimeWithTimeZone,
    pub changed_by: Option<Uuid>,
    pub note: Option<String>,
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
