//! HTTP surface: JSON envelopes under `/api`, GraphQL and health.

use std::sync::Arc;

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::{FromRequest, FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use crm::{Plan, PlanTerms};
use entity::{
    cash_movement, financial_account, financial_category, financial_group, financial_register,
    prospect, prospect_stage_history,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{self, AuthConfig, CurrentUser},
    cash::{self, MovementFilter, NewMovement},
    chart::{self, AccountInput, CategoryFilter, CategoryInput, GroupInput},
    error::Envelope,
    graphql::{build_schema, BpoSchema},
    onboarding::{self, Checklist},
    prospects::{self, NewProspect, ProspectFilter, ProspectPatch},
    registers::{self, RegisterFilter, RegisterInput, ValidationInput},
    users::{self, Credentials, NewUser, SignedIn, UserPatch, UserView},
    ApiError, ApiResult, Page,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub auth: Arc<AuthConfig>,
    pub schema: BpoSchema,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, auth: Arc<AuthConfig>) -> Self {
        let schema = build_schema(db.clone());
        Self { db, auth, schema }
    }
}

/// `Json` whose rejections render as a validation envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        auth::authenticate(&state.db, &state.auth, &parts.headers)
            .await?
            .ok_or(ApiError::Unauthenticated)
    }
}

type Reply<T> = ApiResult<Json<Envelope<T>>>;
type Created<T> = ApiResult<(StatusCode, Json<Envelope<T>>)>;

fn reply<T>(data: T) -> Reply<T> {
    Ok(Json(Envelope::ok(data)))
}

fn created<T>(data: T) -> Created<T> {
    Ok((StatusCode::CREATED, Json(Envelope::ok(data))))
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: Uuid,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/graphql", get(graphql_handler).post(graphql_handler))
        .route("/graphiql", get(graphiql))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/plans", get(plans))
        .route("/api/prospects", get(list_prospects).post(create_prospect))
        .route("/api/prospects/board", get(prospect_board))
        .route(
            "/api/prospects/{id}",
            get(get_prospect)
                .patch(update_prospect)
                .delete(delete_prospect),
        )
        .route("/api/prospects/{id}/history", get(prospect_history))
        .route("/api/prospects/{id}/onboarding", get(onboarding_checklist))
        .route("/api/prospects/{id}/onboarding/{key}", put(toggle_onboarding))
        .route("/api/registers", get(list_registers).post(create_register))
        .route(
            "/api/registers/{id}",
            get(get_register).put(update_register).delete(delete_register),
        )
        .route("/api/registers/{id}/validation", put(validate_register))
        .route("/api/cash", get(list_movements).post(create_movement))
        .route("/api/cash/summary", get(cash_summary))
        .route("/api/cash/{id}", delete(delete_movement))
        .route("/api/groups", get(list_groups).post(create_group))
        .route("/api/groups/{id}", put(update_group).delete(delete_group))
        .route("/api/categories", get(list_categories).post(create_category))
        .route(
            "/api/categories/{id}",
            put(update_category).delete(delete_category),
        )
        .route("/api/accounts", get(list_accounts).post(create_account))
        .route("/api/accounts/{id}", put(update_account).delete(delete_account))
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/{id}", patch(update_user))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = state.db.ping().await.is_ok();
    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            ok: db_ok,
            db_ok,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = request.into_inner();
    match auth::authenticate(&state.db, &state.auth, &headers).await {
        Ok(Some(user)) => request = request.data(user),
        Ok(None) => {}
        Err(err) => tracing::debug!(error = %err, "graphql request left anonymous"),
    }
    state.schema.execute(request).await.into()
}

async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> ApiResult<impl IntoResponse> {
    let signed_in: SignedIn = users::login(&state.db, &state.auth, credentials).await?;
    let cookie = auth::session_cookie(&signed_in.token, state.auth.session_ttl_minutes);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(Envelope::ok(signed_in)),
    ))
}

#[derive(Serialize)]
struct SignedOut {
    signed_out: bool,
}

async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, auth::cleared_session_cookie())],
        Json(Envelope::ok(SignedOut { signed_out: true })),
    )
}

async fn me(State(state): State<AppState>, user: CurrentUser) -> Reply<UserView> {
    reply(users::me(&state.db, &user).await?)
}

#[derive(Serialize)]
pub struct PlanView {
    #[serde(flatten)]
    pub terms: PlanTerms,
    pub label: &'static str,
}

async fn plans(_user: CurrentUser) -> Reply<Vec<PlanView>> {
    reply(
        Plan::ALL
            .iter()
            .map(|plan| PlanView {
                terms: plan.terms(),
                label: plan.label(),
            })
            .collect(),
    )
}

async fn list_prospects(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(filter): ApiQuery<ProspectFilter>,
) -> Reply<Page<prospect::Model>> {
    reply(prospects::list(&state.db, &user, filter).await?)
}

async fn create_prospect(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<NewProspect>,
) -> Created<prospect::Model> {
    created(prospects::create(&state.db, &user, input).await?)
}

#[derive(Serialize)]
pub struct BoardView {
    pub columns: Vec<crm::Column<prospect::Model>>,
    pub total_count: usize,
    pub total_value_cents: i64,
}

async fn prospect_board(State(state): State<AppState>, user: CurrentUser) -> Reply<BoardView> {
    let board = prospects::board(&state.db, &user).await?;
    reply(BoardView {
        total_count: board.total_count(),
        total_value_cents: board.total_value_cents()?,
        columns: board.columns,
    })
}

async fn get_prospect(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<prospect::Model> {
    reply(prospects::get(&state.db, &user, id).await?)
}

async fn update_prospect(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<ProspectPatch>,
) -> Reply<prospect::Model> {
    reply(prospects::update(&state.db, &user, id, patch).await?)
}

async fn delete_prospect(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<Deleted> {
    prospects::delete(&state.db, &user, id).await?;
    reply(Deleted { id })
}

async fn prospect_history(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<Vec<prospect_stage_history::Model>> {
    reply(prospects::history(&state.db, &user, id).await?)
}

async fn onboarding_checklist(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<Checklist> {
    reply(onboarding::checklist(&state.db, &user, id).await?)
}

#[derive(Deserialize)]
struct ToggleInput {
    done: bool,
}

async fn toggle_onboarding(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath((id, key)): ApiPath<(Uuid, String)>,
    ApiJson(input): ApiJson<ToggleInput>,
) -> Reply<Checklist> {
    reply(onboarding::toggle(&state.db, &user, id, &key, input.done).await?)
}

async fn list_registers(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(filter): ApiQuery<RegisterFilter>,
) -> Reply<Page<financial_register::Model>> {
    reply(registers::list(&state.db, &user, filter).await?)
}

async fn create_register(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Created<financial_register::Model> {
    created(registers::create(&state.db, &user, input).await?)
}

async fn get_register(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<financial_register::Model> {
    reply(registers::get(&state.db, &user, id).await?)
}

async fn update_register(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Reply<financial_register::Model> {
    reply(registers::update(&state.db, &user, id, input).await?)
}

async fn delete_register(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<Deleted> {
    registers::delete(&state.db, &user, id).await?;
    reply(Deleted { id })
}

async fn validate_register(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<ValidationInput>,
) -> Reply<financial_register::Model> {
    reply(registers::set_validation(&state.db, &user, id, input).await?)
}

async fn list_movements(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(filter): ApiQuery<MovementFilter>,
) -> Reply<Vec<cash_movement::Model>> {
    reply(cash::list(&state.db, &user, filter).await?)
}

async fn create_movement(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<NewMovement>,
) -> Created<cash_movement::Model> {
    created(cash::create(&state.db, &user, input).await?)
}

async fn cash_summary(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(filter): ApiQuery<MovementFilter>,
) -> Reply<crm::finance::CashSummary> {
    reply(cash::summary(&state.db, &user, filter).await?)
}

async fn delete_movement(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<Deleted> {
    cash::delete(&state.db, &user, id).await?;
    reply(Deleted { id })
}

async fn list_groups(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Reply<Vec<financial_group::Model>> {
    reply(chart::list_groups(&state.db, &user).await?)
}

async fn create_group(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<GroupInput>,
) -> Created<financial_group::Model> {
    created(chart::create_group(&state.db, &user, input).await?)
}

async fn update_group(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<GroupInput>,
) -> Reply<financial_group::Model> {
    reply(chart::update_group(&state.db, &user, id, input).await?)
}

async fn delete_group(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<Deleted> {
    chart::delete_group(&state.db, &user, id).await?;
    reply(Deleted { id })
}

async fn list_categories(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(filter): ApiQuery<CategoryFilter>,
) -> Reply<Vec<financial_category::Model>> {
    reply(chart::list_categories(&state.db, &user, filter).await?)
}

async fn create_category(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Created<financial_category::Model> {
    created(chart::create_category(&state.db, &user, input).await?)
}

async fn update_category(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Reply<financial_category::Model> {
    reply(chart::update_category(&state.db, &user, id, input).await?)
}

async fn delete_category(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<Deleted> {
    chart::delete_category(&state.db, &user, id).await?;
    reply(Deleted { id })
}

async fn list_accounts(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Reply<Vec<financial_account::Model>> {
    reply(chart::list_accounts(&state.db, &user).await?)
}

async fn create_account(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<AccountInput>,
) -> Created<financial_account::Model> {
    created(chart::create_account(&state.db, &user, input).await?)
}

async fn update_account(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<AccountInput>,
) -> Reply<financial_account::Model> {
    reply(chart::update_account(&state.db, &user, id, input).await?)
}

async fn delete_account(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Reply<Deleted> {
    chart::delete_account(&state.db, &user, id).await?;
    reply(Deleted { id })
}

async fn list_users(State(state): State<AppState>, user: CurrentUser) -> Reply<Vec<UserView>> {
    reply(users::list(&state.db, &user).await?)
}

async fn create_user(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<NewUser>,
) -> Created<UserView> {
    created(users::create(&state.db, &user, input).await?)
}

async fn update_user(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> Reply<UserView> {
    reply(users::update(&state.db, &user, id, patch).await?)
}
