use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize)]
#[sea_orm(table_name = "financial_register")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub org_id: Uuid,
    pub kind: RegisterKind,
    pub description: String,
    pub value_cents: i64,
    pub due_date: Date,
    pub issue_date: Option<Date>,
    pub payment_method: Option<PaymentMethod>,
    pub recurrence: Recurrence,
    pub counterparty: Option<String>,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub side: Side,
    pub validated: bool,
    pub validated_by: Option<Uuid>,
    pub validated_at: Option<DateTimeWithTimeZone>,
    pub validation_note: Option<String>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::financial_category::Entity",
        from = "Column::CategoryId",
        to = "super::financial_category::Column::Id",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::financial_account::Entity",
        from = "Column::AccountId",
        to = "super::financial_account::Column::Id",
        on_delete = "SetNull"
    )]
    Account,
}

impl Related<super::financial_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::financial_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum RegisterKind {
    #[sea_orm(string_value = "payable")]
    Payable,
    #[sea_orm(string_value = "receivable")]
    Receivable,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[sea_orm(string_value = "bpo")]
    Bpo,
    #[sea_orm(string_value = "client")]
    Client,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "pix")]
    Pix,
    #[sea_orm(string_value = "boleto")]
    Boleto,
    #[sea_orm(string_value = "transferencia")]
    Transferencia,
    #[sea_orm(string_value = "cartao_credito")]
    CartaoCredito,
    #[sea_orm(string_value = "cartao_debito")]
    CartaoDebito,
    #[sea_orm(string_value = "dinheiro")]
    Dinheiro,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[sea_orm(string_value = "once")]
    Once,
    #[sea_orm(string_value = "weekly")]
    Weekly,
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "quarterly")]
    Quarterly,
    #[sea_orm(string_value = "yearly")]
    Yearly,
}

impl From<RegisterKind> for crm::finance::RegisterKind {
    fn from(value: RegisterKind) -> Self {
        match value {
            RegisterKind::Payable => crm::finance::RegisterKind::Payable,
            RegisterKind::Receivable => crm::finance::RegisterKind::Receivable,
        }
    }
}

impl From<crm::finance::RegisterKind> for RegisterKind {
    fn from(value: crm::finance::RegisterKind) -> Self {
        match value {
            crm::finance::RegisterKind::Payable => RegisterKind::Payable,
            crm::finance::RegisterKind::Receivable => RegisterKind::Receivable,
        }
    }
}

impl From<Side> for crm::finance::Side {
    fn from(value: Side) -> Self {
        match value {
            Side::Bpo => crm::finance::Side::Bpo,
            Side::Client => crm::finance::Side::Client,
        }
    }
}

impl From<crm::finance::Side> for Side {
    fn from(value: crm::finance::Side) -> Self {
        match value {
            crm::finance::Side::Bpo => Side::Bpo,
            crm::finance::Side::Client => Side::Client,
        }
    }
}

impl From<crm::finance::PaymentMethod> for PaymentMethod {
    fn from(value: crm::finance::PaymentMethod) -> Self {
        use crm::finance::PaymentMethod as Domain;
        match value {
            Domain::Pix => PaymentMethod::Pix,
            Domain::Boleto => PaymentMethod::Boleto,
            Domain::Transferencia => PaymentMethod::Transferencia,
            Domain::CartaoCredito => PaymentMethod::CartaoCredito,
            Domain::CartaoDebito => PaymentMethod::CartaoDebito,
            Domain::Dinheiro => PaymentMethod::Dinheiro,
        }
    }
}

impl From<crm::finance::Recurrence> for Recurrence {
    fn from(value: crm::finance::Recurrence) -> Self {
        use crm::finance::Recurrence as Domain;
        match value {
            Domain::Once => Recurrence::Once,
            Domain::Weekly => Recurrence::Weekly,
            Domain::Monthly => Recurrence::Monthly,
            Domain::Quarterly => Recurrence::Quarterly,
            Domain::Yearly => Recurrence::Yearly,
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
