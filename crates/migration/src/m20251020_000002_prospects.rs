use sea_orm_migration::prelude::*;

const STAGES: [&str; 5] = ["pending", "contacted", "contract_sent", "signed", "rejected"];
const PLANS: [&str; 3] = ["controle", "gerencial", "avancado"];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Org {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Prospect {
    Table,
    Id,
    OrgId,
    ContactName,
    ContactEmail,
    ContactPhone,
    ContactRole,
    CompanyName,
    TaxId,
    Segment,
    Plan,
    MonthlyValueCents,
    ServiceAreas,
    Stage,
    Origin,
    Notes,
    CreatedBy,
    UpdatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProspectStageHistory {
    Table,
    Id,
    OrgId,
    ProspectId,
    FromStage,
    ToStage,
    ChangedAt,
    ChangedBy,
    Note,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Prospect::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Prospect::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Prospect::OrgId).uuid().not_null())
                    .col(ColumnDef::new(Prospect::ContactName).string_len(160).not_null())
                    .col(ColumnDef::new(Prospect::ContactEmail).string())
                    .col(ColumnDef::new(Prospect::ContactPhone).string_len(32))
                    .col(ColumnDef::new(Prospect::ContactRole).string_len(64))
                    .col(ColumnDef::new(Prospect::CompanyName).string_len(160).not_null())
                    .col(ColumnDef::new(Prospect::TaxId).string_len(14))
                    .col(ColumnDef::new(Prospect::Segment).string_len(64))
                    .col(ColumnDef::new(Prospect::Plan).string_len(16))
                    .col(
                        ColumnDef::new(Prospect::MonthlyValueCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Prospect::ServiceAreas).json().not_null())
                    .col(
                        ColumnDef::new(Prospect::Stage)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Prospect::Origin).string_len(64))
                    .col(ColumnDef::new(Prospect::Notes).text())
                    .col(ColumnDef::new(Prospect::CreatedBy).uuid())
                    .col(ColumnDef::new(Prospect::UpdatedBy).uuid())
                    .col(
                        ColumnDef::new(Prospect::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Prospect::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Prospect::Stage).is_in(STAGES))
                    .check(
                        Expr::col(Prospect::Plan)
                            .is_null()
                            .or(Expr::col(Prospect::Plan).is_in(PLANS)),
                    )
                    .check(Expr::col(Prospect::MonthlyValueCents).gte(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prospect_org")
                            .from(Prospect::Table, Prospect::OrgId)
                            .to(Org::Table, Org::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_prospect_org_stage")
                    .table(Prospect::Table)
                    .col(Prospect::OrgId)
                    .col(Prospect::Stage)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProspectStageHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProspectStageHistory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProspectStageHistory::OrgId).uuid().not_null())
                    .col(
                        ColumnDef::new(ProspectStageHistory::ProspectId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProspectStageHistory::FromStage).string_len(32))
                    .col(
                        ColumnDef::new(ProspectStageHistory::ToStage)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProspectStageHistory::ChangedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ProspectStageHistory::ChangedBy).uuid())
                    .col(ColumnDef::new(ProspectStageHistory::Note).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prospect_stage_history_prospect")
                            .from(ProspectStageHistory::Table, ProspectStageHistory::ProspectId)
                            .to(Prospect::Table, Prospect::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_prospect_stage_history_prospect")
                    .table(ProspectStageHistory::Table)
                    .col(ProspectStageHistory::ProspectId)
                    .col(ProspectStageHistory::ChangedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProspectStageHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Prospect::Table).to_owned())
            .await
    }
}
