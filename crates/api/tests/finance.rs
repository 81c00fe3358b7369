mod common;

use api::{
    cash::{self, MovementFilter, NewMovement},
    chart::{self, AccountInput, CategoryFilter, CategoryInput, GroupInput},
    registers::{self, RegisterFilter, RegisterInput, ValidationInput},
    ApiError,
};
use chrono::NaiveDate;
use common::TestContext;
use crm::{
    finance::{MovementKind, Recurrence, RegisterForm, RegisterKind},
    money::MAX_MONEY_CENTS,
};
use entity::{cash_movement, financial_group::GroupKind, financial_register};
use sea_orm::{ActiveModelTrait, ActiveValue::Set};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn payable(description: &str, value_cents: i64, due: u32) -> RegisterInput {
    RegisterInput {
        form: RegisterForm {
            kind: RegisterKind::Payable,
            description: description.into(),
            value_cents,
            due_date: Some(day(due)),
            issue_date: None,
            payment_method: None,
            recurrence: Recurrence::Once,
            counterparty: None,
        },
        category_id: None,
        account_id: None,
    }
}

fn movement(kind: MovementKind, amount_cents: i64, on: u32, account_id: Option<uuid::Uuid>) -> NewMovement {
    NewMovement {
        kind,
        description: "lancamento".into(),
        amount_cents,
        occurred_on: day(on),
        account_id,
        category_id: None,
        register_id: None,
    }
}

#[tokio::test]
async fn registers_record_the_creating_side() {
    let ctx = TestContext::new().await;
    let from_client = registers::create(ctx.conn(), &ctx.client, payable("Energia", 12_000, 10))
        .await
        .unwrap();
    assert_eq!(from_client.side, financial_register::Side::Client);
    assert!(!from_client.validated);

    let from_bpo = registers::create(ctx.conn(), &ctx.operator, payable("Agua", 8_000, 12))
        .await
        .unwrap();
    assert_eq!(from_bpo.side, financial_register::Side::Bpo);
}

#[tokio::test]
async fn register_form_rules_block_writes() {
    let ctx = TestContext::new().await;
    let zero = registers::create(ctx.conn(), &ctx.operator, payable("Zero", 0, 10))
        .await
        .unwrap_err();
    assert_eq!(zero.code(), "VALIDATION");

    let mut backwards = payable("Datas", 100, 5);
    backwards.form.issue_date = Some(day(6));
    let err = registers::create(ctx.conn(), &ctx.operator, backwards)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION");

    let page = registers::list(ctx.conn(), &ctx.operator, RegisterFilter::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn only_bpo_validates_and_clients_cannot_touch_validated_registers() {
    let ctx = TestContext::new().await;
    let register = registers::create(ctx.conn(), &ctx.client, payable("Aluguel", 300_000, 5))
        .await
        .unwrap();

    let denied = registers::set_validation(
        ctx.conn(),
        &ctx.client,
        register.id,
        ValidationInput {
            validated: true,
            note: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(denied.code(), "FORBIDDEN");

    let validated = registers::set_validation(
        ctx.conn(),
        &ctx.operator,
        register.id,
        ValidationInput {
            validated: true,
            note: Some("conferido com extrato".into()),
        },
    )
    .await
    .unwrap();
    assert!(validated.validated);
    assert_eq!(validated.validated_by, Some(ctx.operator.user_id));
    assert!(validated.validated_at.is_some());

    let locked = registers::update(ctx.conn(), &ctx.client, register.id, payable("Aluguel", 1, 5))
        .await
        .unwrap_err();
    assert_eq!(locked.code(), "CONFLICT");
    let locked = registers::delete(ctx.conn(), &ctx.client, register.id)
        .await
        .unwrap_err();
    assert_eq!(locked.code(), "CONFLICT");

    let edited = registers::update(
        ctx.conn(),
        &ctx.operator,
        register.id,
        payable("Aluguel sala 2", 310_000, 5),
    )
    .await
    .unwrap();
    assert_eq!(edited.value_cents, 310_000);
    assert!(edited.validated);

    let reopened = registers::set_validation(
        ctx.conn(),
        &ctx.operator,
        register.id,
        ValidationInput {
            validated: false,
            note: None,
        },
    )
    .await
    .unwrap();
    assert!(!reopened.validated);
    assert_eq!(reopened.validated_by, None);
}

#[tokio::test]
async fn register_filters_and_tenancy() {
    let ctx = TestContext::new().await;
    registers::create(ctx.conn(), &ctx.operator, payable("Marco", 100, 1))
        .await
        .unwrap();
    let late = registers::create(ctx.conn(), &ctx.operator, payable("Fim", 100, 28))
        .await
        .unwrap();

    let page = registers::list(
        ctx.conn(),
        &ctx.operator,
        RegisterFilter {
            due_from: Some(day(15)),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, late.id);

    let outsider = ctx.other_org_operator().await;
    assert_eq!(
        registers::get(ctx.conn(), &outsider, late.id).await.unwrap_err(),
        ApiError::NotFound("register")
    );
    let theirs = registers::list(ctx.conn(), &outsider, RegisterFilter::default())
        .await
        .unwrap();
    assert_eq!(theirs.total, 0);
}

#[tokio::test]
async fn cash_summary_rolls_earlier_movements_into_opening_balance() {
    let ctx = TestContext::new().await;
    let account = chart::create_account(
        ctx.conn(),
        &ctx.operator,
        AccountInput {
            name: "Conta principal".into(),
            bank: Some("  ".into()),
            agency: None,
            account_number: None,
            opening_balance_cents: 10_000,
            is_active: true,
        },
    )
    .await
    .unwrap();
    assert_eq!(account.bank, None);

    for input in [
        movement(MovementKind::Inflow, 5_000, 1, Some(account.id)),
        movement(MovementKind::Outflow, 2_000, 10, Some(account.id)),
        movement(MovementKind::Inflow, 700, 12, Some(account.id)),
        movement(MovementKind::Inflow, 99_999, 11, None),
    ] {
        cash::create(ctx.conn(), &ctx.client, input).await.unwrap();
    }

    let summary = cash::summary(
        ctx.conn(),
        &ctx.operator,
        MovementFilter {
            account_id: Some(account.id),
            from: Some(day(5)),
            to: Some(day(31)),
        },
    )
    .await
    .unwrap();
    assert_eq!(summary.opening_balance_cents, 15_000);
    assert_eq!(summary.inflow_cents, 700);
    assert_eq!(summary.outflow_cents, 2_000);
    assert_eq!(summary.balance_cents, 13_700);

    let listed = cash::list(
        ctx.conn(),
        &ctx.operator,
        MovementFilter {
            account_id: Some(account.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(listed.len(), 3);
}

#[tokio::test]
async fn cash_rules() {
    let ctx = TestContext::new().await;
    let err = cash::create(ctx.conn(), &ctx.operator, movement(MovementKind::Inflow, 0, 1, None))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION");

    let created = cash::create(ctx.conn(), &ctx.client, movement(MovementKind::Outflow, 50, 1, None))
        .await
        .unwrap();
    let denied = cash::delete(ctx.conn(), &ctx.client, created.id).await.unwrap_err();
    assert_eq!(denied.code(), "FORBIDDEN");
    cash::delete(ctx.conn(), &ctx.operator, created.id).await.unwrap();
    assert_eq!(
        cash::delete(ctx.conn(), &ctx.operator, created.id).await.unwrap_err(),
        ApiError::NotFound("movement")
    );
}

#[tokio::test]
async fn amounts_beyond_the_money_bound_are_rejected() {
    let ctx = TestContext::new().await;
    let err = cash::create(
        ctx.conn(),
        &ctx.client,
        movement(MovementKind::Inflow, i64::MAX, 1, None),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "VALIDATION");

    let err = registers::create(ctx.conn(), &ctx.client, payable("Obra", MAX_MONEY_CENTS + 1, 10))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION");

    let err = chart::create_account(
        ctx.conn(),
        &ctx.operator,
        AccountInput {
            name: "Conta estourada".into(),
            bank: None,
            agency: None,
            account_number: None,
            opening_balance_cents: i64::MIN,
            is_active: true,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "VALIDATION");

    let largest = cash::create(
        ctx.conn(),
        &ctx.client,
        movement(MovementKind::Inflow, MAX_MONEY_CENTS, 1, None),
    )
    .await
    .unwrap();
    assert_eq!(largest.amount_cents, MAX_MONEY_CENTS);
}

#[tokio::test]
async fn cash_summary_reports_overflow_instead_of_panicking() {
    let ctx = TestContext::new().await;
    for _ in 0..2 {
        let created = cash::create(
            ctx.conn(),
            &ctx.client,
            movement(MovementKind::Inflow, 1, 1, None),
        )
        .await
        .unwrap();
        let mut legacy: cash_movement::ActiveModel = created.into();
        legacy.amount_cents = Set(i64::MAX);
        legacy.update(ctx.conn()).await.unwrap();
    }

    let err = cash::summary(ctx.conn(), &ctx.operator, MovementFilter::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION");
}

#[tokio::test]
async fn chart_of_accounts_rules() {
    let ctx = TestContext::new().await;
    let denied = chart::create_group(
        ctx.conn(),
        &ctx.client,
        GroupInput {
            name: "Receitas".into(),
            kind: GroupKind::Revenue,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(denied.code(), "FORBIDDEN");

    let group = chart::create_group(
        ctx.conn(),
        &ctx.operator,
        GroupInput {
            name: "Despesas".into(),
            kind: GroupKind::Expense,
        },
    )
    .await
    .unwrap();
    let category = chart::create_category(
        ctx.conn(),
        &ctx.operator,
        CategoryInput {
            name: "Aluguel".into(),
            group_id: group.id,
        },
    )
    .await
    .unwrap();

    let outsider = ctx.other_org_operator().await;
    let foreign_group = chart::create_category(
        ctx.conn(),
        &outsider,
        CategoryInput {
            name: "Invasao".into(),
            group_id: group.id,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(foreign_group, ApiError::NotFound("group"));

    let in_use = chart::delete_group(ctx.conn(), &ctx.operator, group.id)
        .await
        .unwrap_err();
    assert_eq!(in_use.code(), "CONFLICT");

    let listed = chart::list_categories(
        ctx.conn(),
        &ctx.client,
        CategoryFilter {
            group_id: Some(group.id),
        },
    )
    .await
    .unwrap();
    assert_eq!(listed.len(), 1);

    chart::delete_category(ctx.conn(), &ctx.operator, category.id)
        .await
        .unwrap();
    chart::delete_group(ctx.conn(), &ctx.operator, group.id)
        .await
        .unwrap();
    assert!(chart::list_groups(ctx.conn(), &ctx.operator)
        .await
        .unwrap()
        .is_empty());
}
