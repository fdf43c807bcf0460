//! Axum routes for the conversion webhook.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::capability::Shape;
use crate::hub::{resolve_family_hub, CacheStats};
use crate::review::{ConversionReview, ReviewError};
use crate::scheme::Scheme;

use super::middleware::{record_conversion_metrics, record_hub_resolution};
use super::state::ServiceState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// One registered version of a family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Schema version.
    pub version: String,
    /// Role in conversion. Absent if the type failed to instantiate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Shape>,
}

/// A registered kind family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyInfo {
    /// API group.
    pub group: String,
    /// Resource kind.
    pub kind: String,
    /// Versions in priority order.
    pub versions: Vec<VersionInfo>,
    /// Hub version, if one resolves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hub: Option<String>,
}

/// Registered kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindsResponse {
    /// Scheme fingerprint.
    pub scheme_fingerprint: String,
    /// Every registered family.
    pub families: Vec<FamilyInfo>,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Scheme fingerprint.
    pub scheme_fingerprint: String,
    /// Registered kind identifiers.
    pub kind_count: usize,
    /// Registered kind families.
    pub family_count: usize,
    /// Hub cache counters.
    pub hub_cache: CacheStats,
    /// Seconds since startup.
    pub uptime_seconds: i64,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always `alive`.
    pub status: String,
}

/// Readiness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Whether the service can convert.
    pub ready: bool,
    /// Why not, when not ready.
    pub details: Option<String>,
}

/// Structured error response with correlation ID for tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Correlation ID (from X-Cloud-Trace-Context when present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            correlation_id: None,
            details: None,
        }
    }

    /// Add a correlation ID to the error.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        tracing::warn!(
            code = %self.code,
            error = %self.error,
            correlation_id = ?self.correlation_id,
            "Request error"
        );
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

fn correlation_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-Cloud-Trace-Context")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split('/').next())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn review_error(err: ReviewError, headers: &HeaderMap, uid: Option<&str>) -> ErrorResponse {
    let mut response = ErrorResponse::new(err.code(), err.to_string());
    if let Some(id) = correlation_id(headers) {
        response = response.with_correlation_id(id);
    }
    if let Some(uid) = uid {
        response = response.with_details(format!("request uid {uid}"));
    }
    response
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Answer a conversion review.
///
/// Conversion failures are reported in-band with 200. Only reviews that
/// cannot be answered at all get a 400.
async fn convert_handler(
    State(state): State<Arc<ServiceState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ConversionReview>, ErrorResponse> {
    let start = Instant::now();

    let review: ConversionReview =
        serde_json::from_slice(&body).map_err(|e| review_error(e.into(), &headers, None))?;
    let (uid, desired, objects) = review
        .request
        .as_ref()
        .map(|r| (Some(r.uid.clone()), r.desired_api_version.clone(), r.objects.len()))
        .unwrap_or_default();

    let reply = state
        .handler
        .review(review)
        .map_err(|e| review_error(e, &headers, uid.as_deref()))?;

    let success = reply.response.as_ref().is_some_and(|r| r.result.is_success());
    record_conversion_metrics(&desired, objects, success, start.elapsed().as_millis() as u64);
    record_hub_resolution(&state.handler.cache_stats());

    Ok(Json(reply))
}

fn describe_families(scheme: &Scheme) -> Vec<FamilyInfo> {
    scheme
        .families()
        .into_iter()
        .map(|family| {
            let versions = scheme
                .versions_of(&family)
                .into_iter()
                .map(|gvk| VersionInfo {
                    shape: scheme.capabilities(&gvk).ok().map(|c| c.shape()),
                    version: gvk.version,
                })
                .collect();
            let hub = resolve_family_hub(scheme, &family)
                .ok()
                .map(|hub| hub.group_version_kind().version);

            FamilyInfo {
                group: family.group,
                kind: family.kind,
                versions,
                hub,
            }
        })
        .collect()
}

/// List registered kind families.
async fn kinds_handler(State(state): State<Arc<ServiceState>>) -> Json<KindsResponse> {
    let scheme = state.scheme();
    Json(KindsResponse {
        scheme_fingerprint: scheme.fingerprint().to_string(),
        families: describe_families(scheme),
    })
}

/// Health check endpoint (detailed).
async fn health_handler(State(state): State<Arc<ServiceState>>) -> Json<HealthResponse> {
    let scheme = state.scheme();

    Json(HealthResponse {
        status: if scheme.is_empty() { "degraded" } else { "healthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        scheme_fingerprint: scheme.fingerprint().to_string(),
        kind_count: scheme.len(),
        family_count: scheme.families().len(),
        hub_cache: state.handler.cache_stats(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Liveness probe endpoint.
///
/// Does NOT check dependencies. Returns 200 if the process is alive.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 503 when no kinds are registered.
async fn readiness_handler(
    State(state): State<Arc<ServiceState>>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    if state.scheme().is_empty() {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                details: Some("No kinds registered".to_string()),
            }),
        ));
    }

    Ok(Json(ReadinessResponse {
        ready: true,
        details: None,
    }))
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the conversion webhook.
pub fn create_router(state: ServiceState) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Conversion
        .route("/convert", post(convert_handler))
        .route("/kinds", get(kinds_handler))
        // Health checks
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .with_state(state)
}
