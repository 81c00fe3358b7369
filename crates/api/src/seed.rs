//! Default organization and demo data for local environments.

use chrono::{Duration, NaiveDate, Utc};
use crm::{
    finance::{MovementKind, PaymentMethod, Recurrence, RegisterForm, RegisterKind},
    prospect::ProspectForm,
    Plan, Stage,
};
use entity::{
    cash_movement, financial_account, financial_category, financial_group, financial_register,
    org, prospect, user,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{self, CurrentUser, UserRole},
    cash::{self, NewMovement},
    chart::{self, AccountInput, CategoryInput, GroupInput},
    prospects::{self, NewProspect},
    registers::{self, RegisterInput},
    users, ApiError, ApiResult,
};

/// Password shared by every demo account.
pub const DEMO_PASSWORD: &str = "elevalucro123";

pub struct SeededRecords {
    pub org: org::Model,
    pub users: Vec<user::Model>,
    pub prospects: Vec<prospect::Model>,
    pub groups: Vec<financial_group::Model>,
    pub categories: Vec<financial_category::Model>,
    pub accounts: Vec<financial_account::Model>,
    pub registers: Vec<financial_register::Model>,
    pub movements: Vec<cash_movement::Model>,
}

impl SeededRecords {
    pub fn user_email(&self, email: &str) -> Option<&user::Model> {
        self.users.iter().find(|u| u.email == email)
    }

    pub fn prospect_company(&self, company: &str) -> Option<&prospect::Model> {
        self.prospects.iter().find(|p| p.company_name == company)
    }

    pub fn category_named(&self, name: &str) -> Option<&financial_category::Model> {
        self.categories.iter().find(|c| c.name == name)
    }
}

/// Look up the organization by slug, creating it when missing.
pub async fn ensure_default_org(
    db: &DatabaseConnection,
    slug: &str,
    name: &str,
) -> ApiResult<org::Model> {
    if let Some(existing) = org::Entity::find()
        .filter(org::Column::Slug.eq(slug))
        .one(db)
        .await?
    {
        return Ok(existing);
    }
    let created = org::ActiveModel {
        id: Set(Uuid::new_v4()),
        slug: Set(slug.to_string()),
        name: Set(name.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?;
    tracing::info!(org = %created.id, slug, "organization created");
    Ok(created)
}

async fn seed_user(
    db: &DatabaseConnection,
    org: &org::Model,
    email: &str,
    display_name: &str,
    roles: &[UserRole],
) -> ApiResult<user::Model> {
    let hash = auth::hash_password(DEMO_PASSWORD)?;
    users::insert_user(db, org.id, email, display_name, &hash, roles, None).await
}

fn acting(user: &user::Model, roles: &[UserRole]) -> CurrentUser {
    CurrentUser {
        user_id: user.id,
        org_id: user.org_id,
        roles: roles.to_vec(),
    }
}

fn lead(contact: &str, company: &str, email: &str) -> ProspectForm {
    ProspectForm {
        contact_name: contact.into(),
        contact_email: Some(email.into()),
        company_name: company.into(),
        origin: Some("indicacao".into()),
        ..Default::default()
    }
}

fn bill(
    kind: RegisterKind,
    description: &str,
    value_cents: i64,
    due_date: NaiveDate,
    counterparty: &str,
) -> RegisterForm {
    RegisterForm {
        kind,
        description: description.into(),
        value_cents,
        due_date: Some(due_date),
        issue_date: None,
        payment_method: Some(PaymentMethod::Boleto),
        recurrence: Recurrence::Monthly,
        counterparty: Some(counterparty.into()),
    }
}

/// Populate `org` with demo users, a pipeline and a small chart of accounts.
/// Refuses to run twice against the same organization.
#[instrument(name = "bpo.seed.demo", skip_all, fields(org = %org.id))]
pub async fn seed_demo(db: &DatabaseConnection, org: &org::Model) -> ApiResult<SeededRecords> {
    let already = user::Entity::find()
        .filter(user::Column::OrgId.eq(org.id))
        .one(db)
        .await?;
    if already.is_some() {
        return Err(ApiError::Conflict(format!(
            "organization {} already has users; seed skipped",
            org.slug
        )));
    }

    let admin = seed_user(db, org, "admin@elevalucro.test", "Ana Admin", &[UserRole::Admin]).await?;
    let operator = seed_user(
        db,
        org,
        "operador@elevalucro.test",
        "Otavio Operador",
        &[UserRole::Operator],
    )
    .await?;
    let client = seed_user(
        db,
        org,
        "cliente@elevalucro.test",
        "Clara Cliente",
        &[UserRole::Client],
    )
    .await?;
    let as_operator = acting(&operator, &[UserRole::Operator]);
    let as_client = acting(&client, &[UserRole::Client]);

    let pipeline = [
        ("Joana Silva", "Padaria Pao Quente", "joana@paoquente.test", Stage::Pending, Some(Plan::Controle)),
        ("Marcos Lima", "Oficina Lima", "marcos@oficinalima.test", Stage::Contacted, None),
        ("Beatriz Souza", "Clinica Sorriso", "bia@sorriso.test", Stage::ContractSent, Some(Plan::Gerencial)),
        ("Rafael Costa", "Costa Engenharia", "rafael@costaeng.test", Stage::Signed, Some(Plan::Avancado)),
        ("Helena Dias", "Mercado Dias", "helena@mercadodias.test", Stage::Rejected, None),
    ];
    let mut seeded_prospects = Vec::with_capacity(pipeline.len());
    for (contact, company, email, stage, plan) in pipeline {
        let record = prospects::create(
            db,
            &as_operator,
            NewProspect {
                form: lead(contact, company, email),
                plan,
                monthly_value_cents: plan.is_none().then_some(80_000),
                service_areas: None,
                stage: Some(stage),
            },
        )
        .await?;
        seeded_prospects.push(record);
    }

    let revenue = chart::create_group(
        db,
        &as_operator,
        GroupInput {
            name: "Receitas operacionais".into(),
            kind: financial_group::GroupKind::Revenue,
        },
    )
    .await?;
    let expenses = chart::create_group(
        db,
        &as_operator,
        GroupInput {
            name: "Despesas administrativas".into(),
            kind: financial_group::GroupKind::Expense,
        },
    )
    .await?;
    let mut categories = Vec::new();
    for (name, group) in [
        ("Venda de servicos", &revenue),
        ("Aluguel", &expenses),
        ("Folha de pagamento", &expenses),
    ] {
        categories.push(
            chart::create_category(
                db,
                &as_operator,
                CategoryInput {
                    name: name.into(),
                    group_id: group.id,
                },
            )
            .await?,
        );
    }
    let account = chart::create_account(
        db,
        &as_operator,
        AccountInput {
            name: "Conta movimento".into(),
            bank: Some("Banco do Brasil".into()),
            agency: Some("1234".into()),
            account_number: Some("56789-0".into()),
            opening_balance_cents: 1_500_000,
            is_active: true,
        },
    )
    .await?;

    let today = Utc::now().date_naive();
    let rent = registers::create(
        db,
        &as_client,
        RegisterInput {
            form: bill(RegisterKind::Payable, "Aluguel da sala", 320_000, today + Duration::days(5), "Imobiliaria Centro"),
            category_id: Some(categories[1].id),
            account_id: Some(account.id),
        },
    )
    .await?;
    let invoice = registers::create(
        db,
        &as_operator,
        RegisterInput {
            form: bill(RegisterKind::Receivable, "Mensalidade de consultoria", 450_000, today + Duration::days(10), "Costa Engenharia"),
            category_id: Some(categories[0].id),
            account_id: Some(account.id),
        },
    )
    .await?;

    let mut movements = Vec::new();
    for (kind, description, amount, days_ago, category) in [
        (MovementKind::Inflow, "Recebimento de cliente", 250_000, 6, &categories[0]),
        (MovementKind::Outflow, "Pagamento de folha", 180_000, 3, &categories[2]),
    ] {
        movements.push(
            cash::create(
                db,
                &as_operator,
                NewMovement {
                    kind,
                    description: description.into(),
                    amount_cents: amount,
                    occurred_on: today - Duration::days(days_ago),
                    account_id: Some(account.id),
                    category_id: Some(category.id),
                    register_id: None,
                },
            )
            .await?,
        );
    }

    tracing::info!(
        users = 3,
        prospects = seeded_prospects.len(),
        "demo data seeded"
    );
    Ok(SeededRecords {
        org: org.clone(),
        users: vec![admin, operator, client],
        prospects: seeded_prospects,
        groups: vec![revenue, expenses],
        categories,
        accounts: vec![account],
        registers: vec![rent, invoice],
        movements,
    })
}
