use crate::AppState;
use crate::models::scan_result::{ScanResult, VersionSupport};
use crate::services::scanner::{ScanError, scan_domain, scan_protocol_support};
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProbeRequest {
    pub domain: String,
    /// Also probe TLS 1.0/1.1/1.2 one at a time on separate connections.
    #[serde(default)]
    pub protocols: bool,
}

#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    #[serde(flatten)]
    pub scan: ScanResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocols: Option<Vec<VersionSupport>>,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Probes one domain. The blocking handshake runs off the async runtime,
/// holding a permit from the shared limiter for its whole duration.
pub async fn probe_domain(
    State(state): State<AppState>,
    Json(payload): Json<ProbeRequest>,
) -> Response {
    let permit = match state.limiter.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "shutting down".to_string(),
                "unavailable",
            );
        }
    };

    let config = state.config.clone();
    let domain = payload.domain.trim().to_string();
    info!(domain = %domain, protocols = payload.protocols, "probe requested");

    let joined = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        let scan = scan_domain(&domain, &config)?;
        let protocols = if payload.protocols {
            Some(scan_protocol_support(&domain, &config)?)
        } else {
            None
        };
        Ok::<_, ScanError>(ProbeResponse { scan, protocols })
    })
    .await;

    match joined {
        Ok(Ok(response)) => (StatusCode::OK, Json(response)).into_response(),
        Ok(Err(e)) => {
            warn!(error = %e, kind = e.kind(), "probe failed");
            let status = match e {
                ScanError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            };
            error_response(status, e.to_string(), e.kind())
        }
        Err(e) => {
            error!(error = %e, "probe task panicked");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
                "internal",
            )
        }
    }
}

fn error_response(status: StatusCode, message: String, kind: &str) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message, "kind": kind })),
    )
        .into_response()
}
