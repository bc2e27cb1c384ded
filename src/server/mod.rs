use crate::audit::{AuditRecord, ValidationOutcome};
use crate::config::Config;
use crate::dispatcher::{Dispatcher, Payload};
use crate::{Error, Result};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::info;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request body for `POST /proxy/execute`.
#[derive(Debug, Deserialize)]
pub struct ProxyRequest {
    #[serde(rename = "operationType")]
    pub operation_type: String,
    #[serde(default)]
    pub payload: Payload,
}

/// Successful proxy response envelope.
#[derive(Debug, Serialize)]
pub struct ProxyResponse {
    pub success: bool,
    pub data: Value,
    #[serde(rename = "requestId")]
    pub request_id: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    #[serde(rename = "requestId")]
    request_id: String,
}

pub struct AppState {
    pub dispatcher: Dispatcher,
}

/// Build the proxy router: the execute endpoint, a health check, and
/// request/response tracing.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/proxy/execute", post(execute))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until SIGINT/SIGTERM.
pub async fn serve(config: &Config, state: Arc<AppState>) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Internal(format!("failed to bind {addr}: {e}")))?;

    info!(%addr, "proxy listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(format!("server error: {e}")))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("received SIGINT, shutting down"),
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("received ctrl-c, shutting down");
    }
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

async fn execute(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ProxyRequest>,
) -> Response {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), |v| v.to_string());

    let started = Instant::now();
    let operation = request.operation_type.as_str();
    let provider = state.dispatcher.provider_name();

    let result = state.dispatcher.dispatch(operation, &request.payload).await;
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

    let response = match result {
        Ok(data) => {
            audit_success(&request_id, operation, provider, latency_ms).emit();

            let body = ProxyResponse {
                success: true,
                data,
                request_id: request_id.clone(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            audit_failure(&request_id, operation, provider, latency_ms, &err);

            let (status, message, details) = error_response(&err);
            let body = ErrorBody {
                error: message,
                details,
                request_id: request_id.clone(),
            };
            (status, Json(body)).into_response()
        }
    };

    with_request_id(response, &request_id)
}

/// Audit record for a completed dispatch. The upstream status never crosses
/// the provider boundary on success, so the record carries no status code.
fn audit_success(request_id: &str, operation: &str, provider: &str, latency_ms: f64) -> AuditRecord {
    AuditRecord::new(request_id, operation)
        .validation(ValidationOutcome::passed())
        .provider(provider)
        .target(format!("{provider}:{operation}"))
        .latency_ms(latency_ms)
        .outcome("success")
}

fn audit_failure(request_id: &str, operation: &str, provider: &str, latency_ms: f64, err: &Error) {
    let mut record = AuditRecord::new(request_id, operation)
        .latency_ms(latency_ms)
        .outcome("error")
        .error(err.to_string());

    match err {
        Error::UnknownOperation { .. } => {
            record = record.validation(ValidationOutcome::failed(vec![err.to_string()]));
        }
        Error::Validation { missing_fields } => {
            let reasons = missing_fields
                .iter()
                .map(|f| format!("missing required field {f}"))
                .collect();
            record = record.validation(ValidationOutcome::failed(reasons));
        }
        Error::Upstream { source, .. } => {
            record = record
                .validation(ValidationOutcome::passed())
                .provider(provider)
                .target(format!("{provider}:{operation}"))
                .upstream_status(source.status())
                .upstream_kind(source.kind());
        }
        _ => {
            record = record.provider(provider);
        }
    }

    record.emit();
}

/// Transport mapping of the failure taxonomy: caller errors are 400,
/// a fatal upstream 404 passes through, every other upstream failure is a
/// bad gateway, and the rest is on us.
fn error_response(err: &Error) -> (StatusCode, String, Option<Value>) {
    match err {
        Error::UnknownOperation { .. } => (StatusCode::BAD_REQUEST, err.to_string(), None),
        Error::Validation { missing_fields } => (
            StatusCode::BAD_REQUEST,
            "validation failed".to_string(),
            Some(json!({ "missingFields": missing_fields })),
        ),
        Error::Upstream { source, attempts } => {
            if source.status() == Some(404) {
                (StatusCode::NOT_FOUND, source.to_string(), None)
            } else {
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream request failed".to_string(),
                    Some(json!({
                        "kind": source.kind(),
                        "upstreamStatus": source.status(),
                        "attempts": attempts,
                    })),
                )
            }
        }
        Error::Internal(_) | Error::Config(_) | Error::InvalidConfig { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error".to_string(),
            None,
        ),
    }
}

fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
