use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Org {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum FinancialGroup {
    Table,
    Id,
    OrgId,
    Name,
    Kind,
    CreatedAt,
}

#[derive(DeriveIden)]
enum FinancialCategory {
    Table,
    Id,
    OrgId,
    GroupId,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum FinancialAccount {
    Table,
    Id,
    OrgId,
    Name,
    Bank,
    Agency,
    AccountNumber,
    OpeningBalanceCents,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FinancialRegister {
    Table,
    Id,
    OrgId,
    Kind,
    Description,
    ValueCents,
    DueDate,
    IssueDate,
    PaymentMethod,
    Recurrence,
    Counterparty,
    CategoryId,
    AccountId,
    Side,
    Validated,
    ValidatedBy,
    ValidatedAt,
    ValidationNote,
    CreatedBy,
    UpdatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CashMovement {
    Table,
    Id,
    OrgId,
    Kind,
    Description,
    AmountCents,
    OccurredOn,
    AccountId,
    CategoryId,
    RegisterId,
    CreatedBy,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FinancialGroup::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FinancialGroup::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FinancialGroup::OrgId).uuid().not_null())
                    .col(ColumnDef::new(FinancialGroup::Name).string_len(120).not_null())
                    .col(ColumnDef::new(FinancialGroup::Kind).string_len(16).not_null())
                    .col(
                        ColumnDef::new(FinancialGroup::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(FinancialGroup::Kind).is_in(["revenue", "expense"]))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_financial_group_org")
                            .from(FinancialGroup::Table, FinancialGroup::OrgId)
                            .to(Org::Table, Org::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FinancialCategory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FinancialCategory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FinancialCategory::OrgId).uuid().not_null())
                    .col(ColumnDef::new(FinancialCategory::GroupId).uuid().not_null())
                    .col(
                        ColumnDef::new(FinancialCategory::Name)
                            .string_len(120)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialCategory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_financial_category_group")
                            .from(FinancialCategory::Table, FinancialCategory::GroupId)
                            .to(FinancialGroup::Table, FinancialGroup::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FinancialAccount::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FinancialAccount::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FinancialAccount::OrgId).uuid().not_null())
                    .col(ColumnDef::new(FinancialAccount::Name).string_len(120).not_null())
                    .col(ColumnDef::new(FinancialAccount::Bank).string_len(120))
                    .col(ColumnDef::new(FinancialAccount::Agency).string_len(16))
                    .col(ColumnDef::new(FinancialAccount::AccountNumber).string_len(32))
                    .col(
                        ColumnDef::new(FinancialAccount::OpeningBalanceCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FinancialAccount::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(FinancialAccount::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(FinancialAccount::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_financial_account_org")
                            .from(FinancialAccount::Table, FinancialAccount::OrgId)
                            .to(Org::Table, Org::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FinancialRegister::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FinancialRegister::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FinancialRegister::OrgId).uuid().not_null())
                    .col(ColumnDef::new(FinancialRegister::Kind).string_len(16).not_null())
                    .col(
                        ColumnDef::new(FinancialRegister::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialRegister::ValueCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FinancialRegister::DueDate).date().not_null())
                    .col(ColumnDef::new(FinancialRegister::IssueDate).date())
                    .col(ColumnDef::new(FinancialRegister::PaymentMethod).string_len(32))
                    .col(
                        ColumnDef::new(FinancialRegister::Recurrence)
                            .string_len(16)
                            .not_null()
                            .default("once"),
                    )
                    .col(ColumnDef::new(FinancialRegister::Counterparty).string())
                    .col(ColumnDef::new(FinancialRegister::CategoryId).uuid())
                    .col(ColumnDef::new(FinancialRegister::AccountId).uuid())
                    .col(ColumnDef::new(FinancialRegister::Side).string_len(16).not_null())
                    .col(
                        ColumnDef::new(FinancialRegister::Validated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(FinancialRegister::ValidatedBy).uuid())
                    .col(ColumnDef::new(FinancialRegister::ValidatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(FinancialRegister::ValidationNote).text())
                    .col(ColumnDef::new(FinancialRegister::CreatedBy).uuid())
                    .col(ColumnDef::new(FinancialRegister::UpdatedBy).uuid())
                    .col(
                        ColumnDef::new(FinancialRegister::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(FinancialRegister::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(FinancialRegister::Kind).is_in(["payable", "receivable"]))
                    .check(Expr::col(FinancialRegister::Side).is_in(["bpo", "client"]))
                    .check(Expr::col(FinancialRegister::ValueCents).gt(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_financial_register_org")
                            .from(FinancialRegister::Table, FinancialRegister::OrgId)
                            .to(Org::Table, Org::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_financial_register_category")
                            .from(FinancialRegister::Table, FinancialRegister::CategoryId)
                            .to(FinancialCategory::Table, FinancialCategory::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_financial_register_account")
                            .from(FinancialRegister::Table, FinancialRegister::AccountId)
                            .to(FinancialAccount::Table, FinancialAccount::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_financial_register_org_due")
                    .table(FinancialRegister::Table)
                    .col(FinancialRegister::OrgId)
                    .col(FinancialRegister::DueDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CashMovement::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashMovement::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CashMovement::OrgId).uuid().not_null())
                    .col(ColumnDef::new(CashMovement::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(CashMovement::Description).string().not_null())
                    .col(
                        ColumnDef::new(CashMovement::AmountCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashMovement::OccurredOn).date().not_null())
                    .col(ColumnDef::new(CashMovement::AccountId).uuid())
                    .col(ColumnDef::new(CashMovement::CategoryId).uuid())
                    .col(ColumnDef::new(CashMovement::RegisterId).uuid())
                    .col(ColumnDef::new(CashMovement::CreatedBy).uuid())
                    .col(
                        ColumnDef::new(CashMovement::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(CashMovement::Kind).is_in(["inflow", "outflow"]))
                    .check(Expr::col(CashMovement::AmountCents).gt(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cash_movement_org")
                            .from(CashMovement::Table, CashMovement::OrgId)
                            .to(Org::Table, Org::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cash_movement_account")
                            .from(CashMovement::Table, CashMovement::AccountId)
                            .to(FinancialAccount::Table, FinancialAccount::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cash_movement_register")
                            .from(CashMovement::Table, CashMovement::RegisterId)
                            .to(FinancialRegister::Table, FinancialRegister::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_cash_movement_org_date")
                    .table(CashMovement::Table)
                    .col(CashMovement::OrgId)
                    .col(CashMovement::OccurredOn)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            CashMovement::Table.into_iden(),
            FinancialRegister::Table.into_iden(),
            FinancialAccount::Table.into_iden(),
            FinancialCategory::Table.into_iden(),
            FinancialGroup::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}
