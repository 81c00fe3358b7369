#![allow(dead_code)]

use std::sync::Arc;

use api::{
    auth::{self, AuthConfig, CurrentUser, UserRole},
    seed, AppState,
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use entity::{org, user, user_role, user_secret};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, Database, DatabaseConnection};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "senha-de-teste";

pub struct TestContext {
    pub db: Arc<DatabaseConnection>,
    pub auth: Arc<AuthConfig>,
    pub org: org::Model,
    pub admin: CurrentUser,
    pub operator: CurrentUser,
    pub client: CurrentUser,
}

impl TestContext {
    pub async fn new() -> Self {
        let conn = Database::connect("sqlite::memory:")
            .await
            .expect("sqlite connects");
        Migrator::up(&conn, None).await.expect("migrations apply");
        let org = seed::ensure_default_org(&conn, "elevalucro", "ElevaLucro")
            .await
            .expect("org created");
        let admin = insert_user(&conn, org.id, "admin@bpo.test", UserRole::Admin).await;
        let operator = insert_user(&conn, org.id, "operador@bpo.test", UserRole::Operator).await;
        let client = insert_user(&conn, org.id, "cliente@bpo.test", UserRole::Client).await;
        Self {
            db: Arc::new(conn),
            auth: Arc::new(AuthConfig {
                jwt_secret: "integration-secret".into(),
                session_ttl_minutes: 60,
            }),
            org,
            admin,
            operator,
            client,
        }
    }

    pub fn conn(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    pub fn router(&self) -> Router {
        api::router(AppState::new(self.db.clone(), self.auth.clone()))
    }

    pub fn token(&self, user: &CurrentUser) -> String {
        auth::issue_token(user.user_id, user.org_id, &user.roles, &self.auth).expect("token issued")
    }

    /// A second tenant with its own operator.
    pub async fn other_org_operator(&self) -> CurrentUser {
        let other = seed::ensure_default_org(self.conn(), "outra", "Outra BPO")
            .await
            .expect("second org");
        insert_user(self.conn(), other.id, "operador@outra.test", UserRole::Operator).await
    }
}

/// Users get a placeholder hash; tests that sign in set a real one.
pub async fn insert_user(
    db: &DatabaseConnection,
    org_id: Uuid,
    email: &str,
    role: UserRole,
) -> CurrentUser {
    let now = Utc::now();
    let model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        org_id: Set(org_id),
        email: Set(email.to_string()),
        display_name: Set(email.split('@').next().unwrap_or(email).to_string()),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await
    .expect("user inserted");
    user_secret::ActiveModel {
        user_id: Set(model.id),
        password_hash: Set("unset".into()),
        set_by: Set(None),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await
    .expect("secret inserted");
    user_role::ActiveModel {
        user_id: Set(model.id),
        role: Set(role.into()),
    }
    .insert(db)
    .await
    .expect("role inserted");
    CurrentUser {
        user_id: model.id,
        org_id,
        roles: vec![role],
    }
}

pub async fn set_password(db: &DatabaseConnection, user_id: Uuid, password: &str) {
    user_secret::ActiveModel {
        user_id: Set(user_id),
        password_hash: Set(auth::hash_password(password).expect("hash")),
        set_by: Set(None),
        updated_at: Set(Utc::now().into()),
    }
    .update(db)
    .await
    .expect("password stored");
}

pub struct Reply {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request builds");
    let response = app.clone().oneshot(request).await.expect("router responds");
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    Reply {
        status,
        set_cookie,
        body,
    }
}
