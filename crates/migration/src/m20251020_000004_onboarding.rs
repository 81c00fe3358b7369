use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Prospect {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum OnboardingItem {
    Table,
    Id,
    OrgId,
    ProspectId,
    Key,
    Label,
    Position,
    Done,
    DoneAt,
    DoneBy,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OnboardingItem::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OnboardingItem::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OnboardingItem::OrgId).uuid().not_null())
                    .col(ColumnDef::new(OnboardingItem::ProspectId).uuid().not_null())
                    .col(ColumnDef::new(OnboardingItem::Key).string_len(64).not_null())
                    .col(ColumnDef::new(OnboardingItem::Label).string().not_null())
                    .col(ColumnDef::new(OnboardingItem::Position).integer().not_null())
                    .col(
                        ColumnDef::new(OnboardingItem::Done)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(OnboardingItem::DoneAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(OnboardingItem::DoneBy).uuid())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_onboarding_item_prospect")
                            .from(OnboardingItem::Table, OnboardingItem::ProspectId)
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
                    .name("idx_onboarding_item_prospect_key")
                    .table(OnboardingItem::Table)
                    .col(OnboardingItem::ProspectId)
                    .col(OnboardingItem::Key)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OnboardingItem::Table).to_owned())
            .await
    }
}
