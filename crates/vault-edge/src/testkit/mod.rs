//! In-process stand-in for the backend API, bound on an ephemeral port.

use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::{
    auth::SessionStore, client::BackendClient, config::EdgeConfig, upstream::HttpUpstream,
    AppState,
};

/// How long the `slow` fixtures stall before answering.
pub const SLOW: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    None,
    Rules,
    Everything,
}

pub struct TestBackend {
    pub base_url: String,
}

pub async fn spawn_echo_backend() -> TestBackend {
    spawn_backend(Fault::None).await
}

pub async fn spawn_backend(fault: Fault) -> TestBackend {
    let app = if fault == Fault::Everything {
        Router::new().fallback(|| async {
            (StatusCode::INTERNAL_SERVER_ERROR, "backend exploded")
        })
    } else {
        routes(fault)
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    TestBackend {
        base_url: format!("http://{addr}"),
    }
}

/// Edge state wired to `backend_url` with every other setting at its default.
pub fn state_for(backend_url: &str) -> AppState {
    let config = EdgeConfig {
        backend_url: backend_url.to_string(),
        ..EdgeConfig::default()
    };
    AppState {
        upstream: Arc::new(HttpUpstream::new(config.upstream_timeout()).expect("http upstream")),
        backend: BackendClient::from_config(&config).expect("backend client"),
        sessions: SessionStore::default(),
        config: Arc::new(config),
    }
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    listener.local_addr().expect("local addr")
}

fn routes(fault: Fault) -> Router {
    Router::new()
        .route("/api", any(echo))
        .route("/api/echo", any(echo))
        .route("/api/echo/*rest", any(echo))
        .route("/api/moved", get(moved))
        .route("/api/teapot", get(teapot))
        .route("/api/tenant/navigation/data", get(navigation))
        .route("/api/compliance/frameworks", get(frameworks))
        .route("/api/compliance/rules", get(rules))
        .route("/api/compliance/scores/:account_id", get(scores))
        .route("/api/compliance/dashboard/:account_id", get(dashboard))
        .route("/api/compliance/evaluate", post(evaluate))
        .route("/api/accounts", get(accounts))
        .route("/api/accounts/:id", get(account_detail))
        .with_state(fault)
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let header_names: Vec<String> = headers.keys().map(|k| k.as_str().to_string()).collect();
    (
        [
            (header::SET_COOKIE, "backend-session=1"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        Json(json!({
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query(),
            "content_type": headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            "headers": header_names,
            "body": String::from_utf8_lossy(&body),
        })),
    )
        .into_response()
}

async fn moved() -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, "/api/echo")],
        "moved",
    )
        .into_response()
}

async fn teapot() -> Response {
    (
        StatusCode::IM_A_TEAPOT,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "short and stout",
    )
        .into_response()
}

async fn navigation(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let account = q.get("account_identifier").cloned();
    if account.as_deref() == Some("slow") {
        tokio::time::sleep(SLOW).await;
    }
    if account.as_deref() == Some("refused") {
        return Json(json!({"success": false, "data": null}));
    }
    let total_assets = if account.is_some() { 7 } else { 42 };
    let badge = account.unwrap_or_else(|| total_assets.to_string());
    Json(json!({
        "success": true,
        "data": {
            "inventory": {
                "total_assets": total_assets,
                "protected_assets": 30,
                "unprotected_assets": 12,
                "coverage_percentage": 71.4,
                "service_counts": {"ec2": 20, "rds": 22},
                "badge": badge
            },
            "recovery_posture": {
                "recovery_score": 82.5,
                "backup_coverage": 71.4,
                "total_scans": 9,
                "completed_scans": 8,
                "success_rate": 88.9,
                "avg_recent_score": 80.0,
                "badge": "82%"
            },
            "discovery": {"total_accounts": 3, "active_accounts": 2, "badge": "3"},
            "compliance": {
                "compliance_score": 64.0,
                "audit_reports": 1,
                "policies": 12,
                "badge": "64%"
            },
            "drift": {"drift_issues": 4, "critical_drift": 1, "warning_drift": 3, "badge": "4"},
            "recovery_testing": {
                "total_tests": 5,
                "passed_tests": 4,
                "failed_tests": 1,
                "success_rate": 80.0,
                "badge": "5"
            }
        }
    }))
}

async fn frameworks() -> Json<Value> {
    Json(json!([
        {
            "id": "fw-cis",
            "name": "CIS AWS Foundations",
            "version": "1.5",
            "description": "CIS benchmark",
            "enabled": true,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-02T00:00:00Z"
        },
        {
            "id": "fw-soc2",
            "name": "SOC 2",
            "enabled": true,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        }
    ]))
}

async fn rules(State(fault): State<Fault>, Query(q): Query<HashMap<String, String>>) -> Response {
    if fault == Fault::Rules {
        return (StatusCode::SERVICE_UNAVAILABLE, "rules offline").into_response();
    }
    if q.get("framework_id").map(String::as_str) == Some("slow") {
        tokio::time::sleep(SLOW).await;
    }
    let all = vec![
        rule("r-1", "fw-cis", "critical"),
        rule("r-2", "fw-cis", "high"),
        rule("r-3", "fw-soc2", "medium"),
    ];
    let filtered: Vec<Value> = match q.get("framework_id") {
        Some(fw) => all
            .into_iter()
            .filter(|r| r["framework_id"] == fw.as_str())
            .collect(),
        None => all,
    };
    Json(Value::Array(filtered)).into_response()
}

fn rule(id: &str, framework_id: &str, severity: &str) -> Value {
    json!({
        "id": id,
        "rule_id": format!("{id}-key"),
        "framework_id": framework_id,
        "category": "storage",
        "description": "S3 buckets are encrypted",
        "resource_type": "s3_bucket",
        "field_path": "encryption.enabled",
        "operator": "equals",
        "expected_value": true,
        "severity": severity,
        "enabled": true,
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-01T00:00:00Z"
    })
}

async fn scores(Path(account_id): Path<String>) -> Json<Value> {
    if account_id == "slow" {
        tokio::time::sleep(SLOW).await;
    }
    Json(json!([
        {
            "framework_id": "fw-cis",
            "framework_name": format!("CIS for {account_id}"),
            "compliance_score": 75.0,
            "total_rules": 4,
            "passed_rules": 3,
            "failed_rules": 1,
            "evaluation_date": "2025-03-01T12:00:00Z",
            "categories": {"storage": {"score": 75.0, "total": 4, "passed": 3, "failed": 1}}
        }
    ]))
}

async fn dashboard(Path(account_id): Path<String>) -> Json<Value> {
    Json(json!({
        "frameworks": [
            {
                "id": "fw-cis",
                "name": "CIS AWS Foundations",
                "version": "1.5",
                "total_rules": 2,
                "enabled_rules": 2,
                "last_evaluation": "2025-03-01T12:00:00Z",
                "average_score": 75.0
            }
        ],
        "recent_evaluations": [
            {
                "id": "ev-1",
                "account_id": account_id,
                "framework_id": "fw-cis",
                "evaluation_date": "2025-03-01T12:00:00Z",
                "total_rules": 4,
                "passed_rules": 3,
                "failed_rules": 1,
                "compliance_score": 75.0,
                "evaluation_data": {"resources": 10},
                "created_at": "2025-03-01T12:00:00Z"
            }
        ],
        "overall_score": 75.0,
        "critical_issues": 1,
        "total_resources_evaluated": 10
    }))
}

async fn evaluate(Json(body): Json<Value>) -> Response {
    if body["account_id"] == "rejected" {
        return (StatusCode::UNPROCESSABLE_ENTITY, "no such account").into_response();
    }
    Json(json!({
        "success": true,
        "evaluation_id": "ev-2",
        "compliance_score": 80.0,
        "total_rules": 5,
        "passed_rules": 4,
        "failed_rules": 1,
        "message": format!(
            "framework={} force={}",
            body["framework_id"].as_str().unwrap_or("all"),
            body["force_evaluation"]
        )
    }))
    .into_response()
}

async fn accounts() -> Json<Value> {
    Json(json!([
        {
            "id": "acc-1",
            "provider": "aws",
            "account_identifier": "123456789012",
            "name": "prod",
            "primary_region": "eu-west-1",
            "connection_status": "connected"
        },
        {
            "id": "acc-2",
            "provider": "gcp",
            "account_identifier": "vault-demo",
            "connection_status": "unknown"
        }
    ]))
}

async fn account_detail(Path(id): Path<String>) -> Response {
    if id == "slow" {
        tokio::time::sleep(SLOW).await;
    }
    if id != "acc-1" {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Account not found"}))).into_response();
    }
    Json(json!({
        "id": "acc-1",
        "provider": "aws",
        "account_identifier": "123456789012",
        "name": "prod",
        "primary_region": "eu-west-1",
        "aws_role_arn": "arn:aws:iam::123456789012:role/RecoveryVault-DiscoveryRole",
        "discovery_enabled": true,
        "discovery_options": {"regions": ["eu-west-1"]},
        "discovery_frequency": "Every 6 hours",
        "preferred_time_utc": "02:00",
        "connection_status": "connected"
    }))
    .into_response()
}
