mod common;

use api::{
    auth::UserRole,
    users::{self, Credentials, NewUser, UserPatch},
    ApiError,
};
use common::TestContext;
use chrono::Utc;
use entity::{user, user_secret};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use uuid::Uuid;

#[tokio::test]
async fn admin_creates_users_and_resets_passwords() {
    let ctx = TestContext::new().await;

    let created = users::create(
        ctx.conn(),
        &ctx.admin,
        NewUser {
            email: "  Nova@BPO.test ".into(),
            display_name: "Nova Operadora".into(),
            password: "senha-inicial".into(),
            roles: vec![UserRole::Operator, UserRole::Operator],
        },
    )
    .await
    .unwrap();
    assert_eq!(created.user.email, "nova@bpo.test");
    assert_eq!(created.roles, vec![UserRole::Operator]);
    let secret = user_secret::Entity::find_by_id(created.user.id)
        .one(ctx.conn())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(secret.set_by, Some(ctx.admin.user_id));

    users::update(
        ctx.conn(),
        &ctx.admin,
        ctx.operator.user_id,
        UserPatch {
            password: Some("senha-renovada".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let signed_in = users::login(
        ctx.conn(),
        &ctx.auth,
        Credentials {
            email: "operador@bpo.test".into(),
            password: "senha-renovada".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(signed_in.user.user.id, ctx.operator.user_id);
    let secret = user_secret::Entity::find_by_id(ctx.operator.user_id)
        .one(ctx.conn())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(secret.set_by, Some(ctx.admin.user_id));
}

#[tokio::test]
async fn user_management_rules() {
    let ctx = TestContext::new().await;

    let short = users::create(
        ctx.conn(),
        &ctx.admin,
        NewUser {
            email: "curta@bpo.test".into(),
            display_name: "Curta".into(),
            password: "1234".into(),
            roles: vec![UserRole::Client],
        },
    )
    .await
    .unwrap_err();
    assert_eq!(short.code(), "VALIDATION");

    let no_roles = users::create(
        ctx.conn(),
        &ctx.admin,
        NewUser {
            email: "sem-papel@bpo.test".into(),
            display_name: "Sem papel".into(),
            password: "senha-valida".into(),
            roles: Vec::new(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(no_roles.code(), "VALIDATION");

    let self_disable = users::update(
        ctx.conn(),
        &ctx.admin,
        ctx.admin.user_id,
        UserPatch {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(self_disable.code(), "VALIDATION");

    let demote_self = users::update(
        ctx.conn(),
        &ctx.admin,
        ctx.admin.user_id,
        UserPatch {
            roles: Some(vec![UserRole::Operator]),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(demote_self.code(), "VALIDATION");

    assert_eq!(
        users::list(ctx.conn(), &ctx.operator).await.unwrap_err(),
        ApiError::Forbidden("insufficient permissions")
    );

    let outsider = ctx.other_org_operator().await;
    let hidden = users::update(
        ctx.conn(),
        &ctx.admin,
        outsider.user_id,
        UserPatch {
            display_name: Some("Invasor".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(hidden, ApiError::NotFound("user"));
}

#[tokio::test]
async fn concurrent_duplicate_email_is_a_conflict() {
    let ctx = TestContext::new().await;
    let now = Utc::now();
    // Same row a racing create would insert after both passed the email check.
    let err = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        org_id: Set(ctx.org.id),
        email: Set("operador@bpo.test".into()),
        display_name: Set("Duplicada".into()),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(ctx.conn())
    .await
    .unwrap_err();
    let err = ApiError::from(err);
    assert_eq!(err.code(), "CONFLICT");
    assert_eq!(err.status(), axum::http::StatusCode::CONFLICT);

    let sequential = users::create(
        ctx.conn(),
        &ctx.admin,
        NewUser {
            email: "OPERADOR@bpo.test".into(),
            display_name: "Duplicada".into(),
            password: "senha-valida".into(),
            roles: vec![UserRole::Operator],
        },
    )
    .await
    .unwrap_err();
    assert_eq!(sequential.code(), "CONFLICT");
}
