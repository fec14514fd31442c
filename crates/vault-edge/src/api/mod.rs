use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::{
    auth::{Role, User},
    proxy,
    views::{AccountsView, ComplianceView, NavigationView},
    AppState,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/session/unlock", post(unlock))
        .route("/session/lock", post(lock))
        .route("/session/gate", get(gate))
        .route("/session/login", post(login))
        .route("/session/me", get(me))
        .route("/session/logout", post(logout))
        .route("/views/navigation", get(navigation_view))
        .route("/views/compliance/:account_id", get(compliance_view))
        .route(
            "/views/compliance/:account_id/evaluate",
            post(evaluate_compliance),
        )
        .route("/views/accounts", get(accounts_view))
        .route("/views/accounts/:id", get(account_view))
        .route(proxy::MOUNT, proxied())
        .route("/api/", proxied())
        .route("/api/*path", proxied())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn proxied() -> MethodRouter<AppState> {
    get(proxy::handle)
        .post(proxy::handle)
        .put(proxy::handle)
        .patch(proxy::handle)
        .delete(proxy::handle)
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "vault-edge",
        "backend": state.config.backend_url,
    }))
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("incorrect password")]
    IncorrectPassword,

    #[error("email and password are required")]
    MissingCredentials,

    #[error("missing bearer token")]
    MissingToken,

    #[error("unknown session")]
    UnknownSession,
}

impl SessionError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCredentials => StatusCode::BAD_REQUEST,
            Self::IncorrectPassword | Self::MissingToken | Self::UnknownSession => {
                StatusCode::UNAUTHORIZED
            }
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::IncorrectPassword => "Incorrect password",
            Self::MissingCredentials => "Email and password are required",
            Self::MissingToken => "missing bearer",
            Self::UnknownSession => "invalid token",
        };
        (self.status_code(), body).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    token: String,
}

pub async fn unlock(
    State(state): State<AppState>,
    Json(req): Json<UnlockRequest>,
) -> Result<Json<TokenResponse>, SessionError> {
    state
        .sessions
        .unlock(&req.password, &state.config.gate_password)
        .await
        .map(|token| Json(TokenResponse { token }))
        .ok_or(SessionError::IncorrectPassword)
}

pub async fn lock(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, SessionError> {
    let token = bearer(&headers).ok_or(SessionError::MissingToken)?;
    state.sessions.lock(&token).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn gate(State(state): State<AppState>, headers: HeaderMap) -> Json<serde_json::Value> {
    let unlocked = match bearer(&headers) {
        Some(token) => state.sessions.is_unlocked(&token).await,
        None => false,
    };
    Json(serde_json::json!({ "unlocked": unlocked }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
    role: Role,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    token: String,
    user: User,
    landing: &'static str,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, SessionError> {
    let (token, user) = state
        .sessions
        .login(&req.email, &req.password, req.role)
        .await
        .ok_or(SessionError::MissingCredentials)?;
    Ok(Json(LoginResponse {
        token,
        landing: user.role.landing(),
        user,
    }))
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<User>, SessionError> {
    let token = bearer(&headers).ok_or(SessionError::MissingToken)?;
    state
        .sessions
        .get(&token)
        .await
        .map(Json)
        .ok_or(SessionError::UnknownSession)
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, SessionError> {
    let token = bearer(&headers).ok_or(SessionError::MissingToken)?;
    if state.sessions.logout(&token).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(SessionError::UnknownSession)
    }
}

pub async fn navigation_view(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let view = NavigationView::mount(state.backend.clone(), q.get("account_identifier").cloned()).await;
    Json(view.snapshot().await).into_response()
}

pub async fn compliance_view(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let view = ComplianceView::mount(state.backend.clone(), account_id).await;
    if let Some(framework_id) = q.get("framework_id") {
        view.fetch_rules(Some(framework_id)).await;
    }
    Json(view.snapshot().await).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct EvaluateBody {
    #[serde(default)]
    framework_id: Option<String>,
    #[serde(default)]
    force_evaluation: bool,
}

pub async fn evaluate_compliance(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(body): Json<EvaluateBody>,
) -> Response {
    let view = ComplianceView::mount(state.backend.clone(), account_id).await;
    match view.evaluate(body.framework_id, body.force_evaluation).await {
        Ok(evaluation) => Json(serde_json::json!({
            "evaluation": evaluation,
            "view": view.snapshot().await,
        }))
        .into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({
                "error": e.to_string(),
                "view": view.snapshot().await,
            })),
        )
            .into_response(),
    }
}

pub async fn accounts_view(State(state): State<AppState>) -> Response {
    let view = AccountsView::mount(state.backend.clone()).await;
    Json(view.snapshot().await).into_response()
}

pub async fn account_view(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let view = AccountsView::mount(state.backend.clone()).await;
    view.select(&id).await;
    Json(view.snapshot().await).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(ToString::to_string)
}
