mod common;

use api::{
    graphql::build_schema,
    prospects::{self, NewProspect},
};
use async_graphql::{Request, Variables};
use common::TestContext;
use crm::{prospect::ProspectForm, Stage};
use serde_json::json;

async fn seed_prospect(ctx: &TestContext, company: &str, stage: Stage, value: i64) -> String {
    prospects::create(
        ctx.conn(),
        &ctx.operator,
        NewProspect {
            form: ProspectForm {
                contact_name: "Contato".into(),
                company_name: company.into(),
                ..Default::default()
            },
            monthly_value_cents: Some(value),
            stage: Some(stage),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .id
    .to_string()
}

#[tokio::test]
async fn pipeline_board_groups_by_stage() {
    let ctx = TestContext::new().await;
    seed_prospect(&ctx, "P1", Stage::Pending, 10_000).await;
    seed_prospect(&ctx, "P2", Stage::Signed, 20_000).await;
    seed_prospect(&ctx, "P3", Stage::Pending, 30_000).await;
    let schema = build_schema(ctx.db.clone());

    let query = r#"
        query Board {
            bpo {
                pipelineBoard {
                    totalCount
                    totalValueCents
                    columns { stage label count totalValueCents prospects { companyName } }
                }
            }
        }
    "#;
    let resp = schema
        .execute(Request::new(query).data(ctx.operator.clone()))
        .await;
    assert!(resp.errors.is_empty(), "errors: {:?}", resp.errors);
    let board = resp.data.into_json().unwrap()["bpo"]["pipelineBoard"].clone();
    assert_eq!(board["totalCount"], 3);
    assert_eq!(board["totalValueCents"], 60_000);
    let columns = board["columns"].as_array().unwrap();
    let stages: Vec<_> = columns.iter().map(|c| c["stage"].clone()).collect();
    assert_eq!(
        stages,
        vec![
            json!("PENDING"),
            json!("CONTACTED"),
            json!("CONTRACT_SENT"),
            json!("SIGNED"),
            json!("REJECTED")
        ]
    );
    assert_eq!(columns[0]["totalValueCents"], 40_000);
    assert_eq!(
        columns[0]["prospects"],
        json!([{ "companyName": "P1" }, { "companyName": "P3" }])
    );
}

#[tokio::test]
async fn move_stage_mutation_reports_changes() {
    let ctx = TestContext::new().await;
    let id = seed_prospect(&ctx, "Movido", Stage::Pending, 0).await;
    let schema = build_schema(ctx.db.clone());
    let mutation = r#"
        mutation Move($id: ID!, $stage: ProspectStage!) {
            bpo {
                moveProspectStage(id: $id, stage: $stage, note: "ligacao feita") {
                    changed
                    prospect { stage }
                }
            }
        }
    "#;

    let moved = schema
        .execute(
            Request::new(mutation)
                .variables(Variables::from_json(json!({ "id": id, "stage": "CONTACTED" })))
                .data(ctx.operator.clone()),
        )
        .await;
    assert!(moved.errors.is_empty(), "errors: {:?}", moved.errors);
    let payload = moved.data.into_json().unwrap()["bpo"]["moveProspectStage"].clone();
    assert_eq!(payload, json!({ "changed": true, "prospect": { "stage": "CONTACTED" } }));

    let again = schema
        .execute(
            Request::new(mutation)
                .variables(Variables::from_json(json!({ "id": id, "stage": "CONTACTED" })))
                .data(ctx.operator.clone()),
        )
        .await;
    let payload = again.data.into_json().unwrap()["bpo"]["moveProspectStage"].clone();
    assert_eq!(payload["changed"], false);

    let history = schema
        .execute(
            Request::new(
                r#"query H($id: ID!) { bpo { prospectStageHistory(prospectId: $id) { fromStage toStage note } } }"#,
            )
            .variables(Variables::from_json(json!({ "id": id })))
            .data(ctx.operator.clone()),
        )
        .await;
    let rows = history.data.into_json().unwrap()["bpo"]["prospectStageHistory"].clone();
    assert_eq!(
        rows,
        json!([
            { "fromStage": null, "toStage": "PENDING", "note": null },
            { "fromStage": "PENDING", "toStage": "CONTACTED", "note": "ligacao feita" }
        ])
    );
}

#[tokio::test]
async fn errors_carry_codes() {
    let ctx = TestContext::new().await;
    let schema = build_schema(ctx.db.clone());

    let anonymous = schema
        .execute(Request::new("{ bpo { pipelineBoard { totalCount } } }"))
        .await;
    let code = anonymous.errors[0]
        .extensions
        .as_ref()
        .and_then(|ext| ext.get("code"))
        .cloned();
    assert_eq!(code, Some(async_graphql::Value::from("UNAUTHENTICATED")));

    let missing = schema
        .execute(
            Request::new(
                r#"mutation { bpo { moveProspectStage(id: "00000000-0000-0000-0000-000000000000", stage: SIGNED) { changed } } }"#,
            )
            .data(ctx.operator.clone()),
        )
        .await;
    let code = missing.errors[0]
        .extensions
        .as_ref()
        .and_then(|ext| ext.get("code"))
        .cloned();
    assert_eq!(code, Some(async_graphql::Value::from("NOT_FOUND")));

    let forbidden = schema
        .execute(Request::new("{ bpo { pipelineBoard { totalCount } } }").data(ctx.client.clone()))
        .await;
    assert_eq!(forbidden.errors[0].message, "insufficient permissions");
}

#[tokio::test]
async fn plans_and_me() {
    let ctx = TestContext::new().await;
    let schema = build_schema(ctx.db.clone());
    let resp = schema
        .execute(
            Request::new("{ bpo { me { email roles } plans { plan monthlyValueCents areas } } }")
                .data(ctx.admin.clone()),
        )
        .await;
    assert!(resp.errors.is_empty(), "errors: {:?}", resp.errors);
    let data = resp.data.into_json().unwrap();
    assert_eq!(data["bpo"]["me"]["email"], "admin@bpo.test");
    assert_eq!(data["bpo"]["me"]["roles"], json!(["ADMIN"]));
    let plans = data["bpo"]["plans"].as_array().unwrap();
    assert_eq!(plans[0]["plan"], "CONTROLE");
    assert_eq!(plans[0]["monthlyValueCents"], 95_000);
    assert!(plans[2]["areas"].as_array().unwrap().len() > plans[0]["areas"].as_array().unwrap().len());
}
