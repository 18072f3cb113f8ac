// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the action guard service.
//!
//! The site's browser shell calls `/admit` before sending a comment, reply,
//! reaction or report to the managed backend, and uses `/ids` to mint and
//! resolve the obfuscated row IDs that appear in article URLs.

use crate::clock::Clock;
use crate::config::Config;
use crate::ids::IdCodec;
use crate::limiter::{AdmissionLimiter, AdmissionResult};
use crate::metrics::Metrics;
use crate::notice::{Language, Notice};
use crate::policy::{ActionKey, PolicyTable};
use crate::storage::Storage;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Limiter over type-erased storage and clock.
pub type SharedLimiter = AdmissionLimiter<Arc<dyn Storage>, Arc<dyn Clock>>;

/// Shared application state.
pub struct AppState {
    /// Serializes check-and-append within this process. Only locked from
    /// blocking threads, since file-backed storage writes synchronously.
    pub limiter: Mutex<SharedLimiter>,
    pub policies: PolicyTable,
    pub codec: IdCodec,
    pub metrics: Metrics,
    pub config: Config,
}

impl AppState {
    /// Assemble state from validated configuration.
    pub fn new(
        config: Config,
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let policies = config.policy_table()?;
        let codec = IdCodec::new(&config.ids.salt, config.ids.min_length)?;
        let metrics = Metrics::new()?;
        Ok(Self {
            limiter: Mutex::new(AdmissionLimiter::with_clock(storage, clock)),
            policies,
            codec,
            metrics,
            config,
        })
    }
}

/// Drop stale history entries off the async runtime.
pub async fn prune(state: Arc<AppState>) -> usize {
    let result = task::spawn_blocking(move || {
        let limiter = state.limiter.blocking_lock();
        let now = limiter.clock().now_ms();
        limiter.prune(&state.policies, now)
    })
    .await;
    result.unwrap_or_else(|err| {
        warn!(error = %err, "Prune aborted");
        0
    })
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Admission request from the browser shell.
#[derive(Debug, Deserialize)]
pub struct AdmitRequest {
    pub action: String,
    #[serde(default)]
    pub lang: Language,
}

/// Admission decision.
#[derive(Debug, Serialize)]
pub struct AdmitResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Encoded row ID.
#[derive(Debug, Serialize)]
pub struct IdResponse {
    pub id: u64,
    pub hash: String,
}

fn error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code,
        }),
    )
        .into_response()
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/admit", post(admit))
        .route("/ids/encode/:id", get(encode_id))
        .route("/ids/decode/:hash", get(decode_id));

    if state.config.metrics.enabled {
        router = router.route(&state.config.metrics.path, get(metrics));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "action-guard",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Check whether a reader action may proceed right now.
pub async fn admit(State(state): State<Arc<AppState>>, Json(req): Json<AdmitRequest>) -> Response {
    let key = match ActionKey::new(req.action.as_str()) {
        Ok(key) => key,
        Err(err) => {
            warn!(action = %req.action, error = %err, "Invalid action key");
            return error(StatusCode::BAD_REQUEST, "INVALID_ACTION", err.to_string());
        }
    };

    let result = {
        let state = state.clone();
        let key = key.clone();
        task::spawn_blocking(move || {
            let limiter = state.limiter.blocking_lock();
            let now = limiter.clock().now_ms();
            limiter.admit_action(&state.policies, &key, now)
        })
        .await
    };

    let result = match result {
        Ok(result) => result,
        Err(err) => {
            warn!(action = %key, error = %err, "Admission check aborted");
            return error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "ADMISSION_FAILED",
                "Admission check failed",
            );
        }
    };

    let Some(result) = result else {
        debug!(action = %key, "No policy for action");
        return error(
            StatusCode::NOT_FOUND,
            "UNKNOWN_ACTION",
            format!("No admission policy for action {key}"),
        );
    };

    state.metrics.record(key.as_str(), result.is_allowed());

    let body = match result {
        AdmissionResult::Allowed { remaining } => AdmitResponse {
            allowed: true,
            remaining: Some(remaining),
            retry_after_ms: None,
            retry_after_secs: None,
            message: None,
        },
        AdmissionResult::Denied { retry_after } => {
            let notice = Notice::new(retry_after, req.lang);
            info!(
                action = %key,
                retry_after_ms = result.retry_after_ms(),
                "Action rate limited"
            );
            AdmitResponse {
                allowed: false,
                remaining: None,
                retry_after_ms: Some(result.retry_after_ms()),
                retry_after_secs: Some(notice.wait_secs()),
                message: Some(notice.message()),
            }
        }
    };

    // 200 either way; denial is an answer, not a failure
    (StatusCode::OK, Json(body)).into_response()
}

/// Encode a row ID for use in a URL.
pub async fn encode_id(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> Json<IdResponse> {
    Json(IdResponse {
        id,
        hash: state.codec.encode(id),
    })
}

/// Resolve an obfuscated ID back to its row ID.
pub async fn decode_id(State(state): State<Arc<AppState>>, Path(hash): Path<String>) -> Response {
    match state.codec.decode(&hash) {
        Ok(id) => Json(IdResponse { id, hash }).into_response(),
        Err(err) => {
            debug!(%hash, error = %err, "Rejected encoded ID");
            error(StatusCode::BAD_REQUEST, "INVALID_ID", err.to_string())
        }
    }
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "METRICS_UNAVAILABLE",
            err.to_string(),
        ),
    }
}
