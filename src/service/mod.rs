//! Conversion Webhook Service
//!
//! Exposes the conversion handler as the HTTP endpoint the Kubernetes API
//! server calls for custom resource conversion.
//!
//! ## Endpoints
//!
//! - `POST /convert` - Answer a `ConversionReview`
//! - `GET /kinds` - Registered kind families, versions and hubs
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe

pub mod config;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use middleware::{metrics_middleware, record_conversion_metrics, record_hub_resolution};
pub use routes::create_router;
pub use state::ServiceState;
