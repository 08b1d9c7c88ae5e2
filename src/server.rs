use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::error::{KeystoneError, Result};
use crate::persist::{self, UserRepository};
use crate::security::{SecurityHeaders, security_headers};
use crate::settings::Settings;
use crate::usecase::{
    CreateUser, CreateUserInput, DeleteUser, DeleteUserInput, DeleteUserOutput, FindUser,
    FindUserInput, ListUsers, ListUsersInput, UpdateUser, UpdateUserInput, UseCase, UserOutput,
};

#[derive(Clone)]
pub struct AppState {
    repository: Arc<UserRepository>,
    security: SecurityHeaders,
}

impl AppState {
    pub fn new(repository: Arc<UserRepository>, security: SecurityHeaders) -> Self {
        Self { repository, security }
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct UpdateBody {
    pub name: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub enum ApiError {
    Keystone(KeystoneError),
    Join(String),
}

impl From<KeystoneError> for ApiError {
    fn from(e: KeystoneError) -> Self {
        Self::Keystone(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            Self::Keystone(e) => {
                let status = match e {
                    KeystoneError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    KeystoneError::NotFound { .. } => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
            Self::Join(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        warn!(%msg, code = %status.as_u16(), "request error");
        let body = ErrorResponse {
            status: "error".into(),
            error: msg,
        };
        (status, Json(body)).into_response()
    }
}

// Use cases are synchronous and may block on storage, so they run on the
// blocking pool.
async fn run<U>(op: &'static str, use_case: U, input: U::Input) -> std::result::Result<U::Output, ApiError>
where
    U: UseCase + Send + 'static,
    U::Input: Send + 'static,
    U::Output: Send + 'static,
{
    let started = Instant::now();
    let output = tokio::task::spawn_blocking(move || use_case.execute(input))
        .await
        .map_err(|e| {
            warn!(error = %e, op, "Join error");
            ApiError::Join(format!("Join error: {e}"))
        })??;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(op, ms = elapsed_ms, "request complete");
    Ok(output)
}

async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> std::result::Result<(StatusCode, Json<UserOutput>), ApiError> {
    let output = run("create_user", CreateUser::new(state.repository), input).await?;
    Ok((StatusCode::CREATED, Json(output)))
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> std::result::Result<Json<Vec<UserOutput>>, ApiError> {
    let input = ListUsersInput {
        name_contains: query.name,
        email: query.email,
        limit: query.limit,
    };
    Ok(Json(run("list_users", ListUsers::new(state.repository), input).await?))
}

async fn find_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<UserOutput>, ApiError> {
    let input = FindUserInput { id };
    Ok(Json(run("find_user", FindUser::new(state.repository), input).await?))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateBody>,
) -> std::result::Result<Json<UserOutput>, ApiError> {
    let input = UpdateUserInput {
        id,
        name: body.name,
        email: body.email,
    };
    Ok(Json(run("update_user", UpdateUser::new(state.repository), input).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<DeleteUserOutput>, ApiError> {
    let input = DeleteUserInput { id };
    Ok(Json(run("delete_user", DeleteUser::new(state.repository), input).await?))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".into() })
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    let security = state.security;
    Router::new()
        .route("/health", get(health))
        .route("/v1/users", get(list_users).post(create_user))
        .route(
            "/v1/users/:id",
            get(find_user).put(update_user).delete(delete_user),
        )
        .with_state(state)
        .layer(cors)
        // outermost, so rejections and unmatched routes are decorated too
        .layer(middleware::from_fn_with_state(security, security_headers))
}

/// Opens storage for the configured mode and serves until Ctrl-C.
pub async fn serve(settings: &Settings) -> Result<()> {
    let repository = persist::open(&settings.persistence_mode())?;
    let state = AppState::new(repository, settings.security_headers());
    let listener = tokio::net::TcpListener::bind(&settings.bind).await?;
    info!(bind = %settings.bind, environment = ?settings.environment, "keystone listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "could not listen for shutdown signal");
            }
        })
        .await?;
    info!("keystone stopped");
    Ok(())
}
