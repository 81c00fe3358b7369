mod common;

use api::{
    prospects::{self, NewProspect, ProspectFilter, ProspectPatch},
    ApiError,
};
use std::time::Duration;

use common::TestContext;
use crm::{prospect::ProspectForm, Plan, Stage};
use entity::prospect;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};

fn form(contact: &str, company: &str) -> ProspectForm {
    ProspectForm {
        contact_name: contact.into(),
        company_name: company.into(),
        ..Default::default()
    }
}

async fn create(ctx: &TestContext, company: &str, stage: Stage, value: i64) -> prospect::Model {
    prospects::create(
        ctx.conn(),
        &ctx.operator,
        NewProspect {
            form: form("Contato", company),
            monthly_value_cents: Some(value),
            stage: Some(stage),
            ..Default::default()
        },
    )
    .await
    .expect("prospect created")
}

#[tokio::test]
async fn create_with_plan_derives_value_and_areas() {
    let ctx = TestContext::new().await;
    let created = prospects::create(
        ctx.conn(),
        &ctx.operator,
        NewProspect {
            form: form("Joana", "Padaria"),
            plan: Some(Plan::Gerencial),
            monthly_value_cents: Some(1),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(created.stage, prospect::Stage::Pending);
    assert_eq!(created.monthly_value_cents, 130_000);
    assert_eq!(created.service_area_keys(), Plan::Gerencial.terms().area_keys());

    let history = prospects::history(ctx.conn(), &ctx.operator, created.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].from_stage, None);
    assert_eq!(history[0].to_stage, prospect::Stage::Pending);
}

#[tokio::test]
async fn invalid_form_blocks_the_write() {
    let ctx = TestContext::new().await;
    let err = prospects::create(
        ctx.conn(),
        &ctx.operator,
        NewProspect {
            form: form("  ", "Padaria"),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "VALIDATION");
    let page = prospects::list(ctx.conn(), &ctx.operator, ProspectFilter::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn changing_plan_overwrites_manual_edits() {
    let ctx = TestContext::new().await;
    let record = create(&ctx, "Oficina", Stage::Contacted, 55_000).await;
    let updated = prospects::update(
        ctx.conn(),
        &ctx.operator,
        record.id,
        ProspectPatch {
            plan: Some(Plan::Avancado),
            monthly_value_cents: Some(10),
            service_areas: Some(vec!["dre".into()]),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.plan, Some(Plan::Avancado.into()));
    assert_eq!(updated.monthly_value_cents, 170_000);
    assert_eq!(updated.service_area_keys(), Plan::Avancado.terms().area_keys());
    assert_eq!(updated.stage, prospect::Stage::Contacted);
}

#[tokio::test]
async fn same_stage_move_is_a_silent_no_op() {
    let ctx = TestContext::new().await;
    let record = create(&ctx, "Clinica", Stage::Pending, 0).await;
    let before = prospects::get(ctx.conn(), &ctx.operator, record.id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let outcome = prospects::move_stage(ctx.conn(), &ctx.operator, record.id, Stage::Pending, None)
        .await
        .unwrap();
    assert!(!outcome.changed);
    let stored = prospects::get(ctx.conn(), &ctx.operator, record.id).await.unwrap();
    assert_eq!(stored.updated_at, before.updated_at);
    assert_eq!(stored.updated_by, before.updated_by);
    let history = prospects::history(ctx.conn(), &ctx.operator, record.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn stage_move_records_history_with_note() {
    let ctx = TestContext::new().await;
    let record = create(&ctx, "Mercado", Stage::Pending, 0).await;
    let before = prospects::get(ctx.conn(), &ctx.operator, record.id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let outcome = prospects::move_stage(
        ctx.conn(),
        &ctx.operator,
        record.id,
        Stage::ContractSent,
        Some(" proposta enviada ".into()),
    )
    .await
    .unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.prospect.stage, prospect::Stage::ContractSent);
    assert_eq!(outcome.prospect.updated_by, Some(ctx.operator.user_id));
    let stored = prospects::get(ctx.conn(), &ctx.operator, record.id).await.unwrap();
    assert!(stored.updated_at > before.updated_at);
    assert_eq!(stored.stage, prospect::Stage::ContractSent);

    let history = prospects::history(ctx.conn(), &ctx.operator, record.id)
        .await
        .unwrap();
    let last = history.last().unwrap();
    assert_eq!(last.from_stage, Some(prospect::Stage::Pending));
    assert_eq!(last.to_stage, prospect::Stage::ContractSent);
    assert_eq!(last.note.as_deref(), Some("proposta enviada"));
}

#[tokio::test]
async fn board_partitions_in_creation_order() {
    let ctx = TestContext::new().await;
    let p1 = create(&ctx, "P1", Stage::Pending, 100).await;
    let p2 = create(&ctx, "P2", Stage::Signed, 200).await;
    let p3 = create(&ctx, "P3", Stage::Pending, 300).await;

    let board = prospects::board(ctx.conn(), &ctx.operator).await.unwrap();
    let pending: Vec<_> = board.column(Stage::Pending).cards.iter().map(|p| p.id).collect();
    assert_eq!(pending, vec![p1.id, p3.id]);
    assert_eq!(board.column(Stage::Pending).total_value_cents, 400);
    let signed: Vec<_> = board.column(Stage::Signed).cards.iter().map(|p| p.id).collect();
    assert_eq!(signed, vec![p2.id]);
    assert_eq!(board.column(Stage::Contacted).count, 0);
    assert_eq!(board.column(Stage::Rejected).count, 0);
    assert_eq!(board.total_count(), 3);
}

#[tokio::test]
async fn board_totals_that_overflow_fail_cleanly() {
    let ctx = TestContext::new().await;
    for company in ["Grande", "Enorme"] {
        let created = create(&ctx, company, Stage::Pending, 1).await;
        let mut legacy: prospect::ActiveModel = created.into();
        legacy.monthly_value_cents = Set(i64::MAX);
        legacy.update(ctx.conn()).await.unwrap();
    }
    let err = prospects::board(ctx.conn(), &ctx.operator).await.unwrap_err();
    assert_eq!(err.code(), "VALIDATION");

    let oversized = prospects::create(
        ctx.conn(),
        &ctx.operator,
        NewProspect {
            form: form("Contato", "Excesso"),
            monthly_value_cents: Some(i64::MAX),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(oversized.code(), "VALIDATION");
}

#[tokio::test]
async fn signed_prospects_cannot_be_deleted() {
    let ctx = TestContext::new().await;
    let signed = create(&ctx, "Assinado", Stage::Signed, 0).await;
    let err = prospects::delete(ctx.conn(), &ctx.operator, signed.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONFLICT");

    let pending = create(&ctx, "Pendente", Stage::Pending, 0).await;
    prospects::delete(ctx.conn(), &ctx.operator, pending.id)
        .await
        .unwrap();
    assert_eq!(
        prospects::get(ctx.conn(), &ctx.operator, pending.id)
            .await
            .unwrap_err(),
        ApiError::NotFound("prospect")
    );
}

#[tokio::test]
async fn other_tenants_see_nothing() {
    let ctx = TestContext::new().await;
    let record = create(&ctx, "Privado", Stage::Pending, 0).await;
    let outsider = ctx.other_org_operator().await;

    assert_eq!(
        prospects::get(ctx.conn(), &outsider, record.id).await.unwrap_err(),
        ApiError::NotFound("prospect")
    );
    assert_eq!(
        prospects::move_stage(ctx.conn(), &outsider, record.id, Stage::Signed, None)
            .await
            .unwrap_err(),
        ApiError::NotFound("prospect")
    );
    let board = prospects::board(ctx.conn(), &outsider).await.unwrap();
    assert_eq!(board.total_count(), 0);
}

#[tokio::test]
async fn clients_cannot_reach_the_pipeline() {
    let ctx = TestContext::new().await;
    let err = prospects::board(ctx.conn(), &ctx.client).await.unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");
}

#[tokio::test]
async fn search_matches_contact_or_company() {
    let ctx = TestContext::new().await;
    create(&ctx, "Costa Engenharia", Stage::Pending, 0).await;
    create(&ctx, "Padaria Central", Stage::Contacted, 0).await;
    let page = prospects::list(
        ctx.conn(),
        &ctx.operator,
        ProspectFilter {
            q: Some("ENGENH".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].company_name, "Costa Engenharia");

    let by_stage = prospects::list(
        ctx.conn(),
        &ctx.operator,
        ProspectFilter {
            stage: Some(Stage::Contacted),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(by_stage.total, 1);
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
    let ctx = TestContext::new().await;
    create(&ctx, "100% Digital", Stage::Pending, 0).await;
    create(&ctx, "Auto_Pecas", Stage::Pending, 0).await;
    create(&ctx, "Padaria Central", Stage::Pending, 0).await;

    let search = |q: &str| {
        prospects::list(
            ctx.conn(),
            &ctx.operator,
            ProspectFilter {
                q: Some(q.into()),
                ..Default::default()
            },
        )
    };
    let percent = search("%").await.unwrap();
    assert_eq!(percent.total, 1);
    assert_eq!(percent.items[0].company_name, "100% Digital");
    let underscore = search("_").await.unwrap();
    assert_eq!(underscore.total, 1);
    assert_eq!(underscore.items[0].company_name, "Auto_Pecas");
    assert_eq!(search("o_p").await.unwrap().total, 1);
    assert_eq!(search("a_c").await.unwrap().total, 0);
    assert_eq!(search("\\").await.unwrap().total, 0);
}
