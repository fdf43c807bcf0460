//! Conversion review handling.
//!
//! Wire types for the Kubernetes `ConversionReview` envelope and the
//! [`ConversionHandler`] that converts a batch of raw objects to the desired
//! API version.
//!
//! ## Wire Format
//!
//! ```json
//! {
//!   "apiVersion": "apiextensions.k8s.io/v1",
//!   "kind": "ConversionReview",
//!   "request": {
//!     "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
//!     "desiredAPIVersion": "jobs.example.org/v2",
//!     "objects": [{"apiVersion": "jobs.example.org/v1", "kind": "ExternalJob", ...}]
//!   }
//! }
//! ```
//!
//! The reply echoes `apiVersion`/`kind`, drops `request`, and carries
//! `response: {uid, convertedObjects, result: {status, message}}`.
//!
//! ## Batch Semantics
//!
//! Objects are converted in order. The first failure aborts the batch: the
//! response carries a single `Failure` result naming the failing index and no
//! converted objects.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConversionError;
use crate::hub::{CacheConfig, CacheStats};
use crate::router::ConversionRouter;
use crate::scheme::Scheme;
use crate::types::gvk::GroupVersion;

/// `apiVersion` values accepted for the review envelope.
pub const SUPPORTED_REVIEW_VERSIONS: [&str; 2] = ["apiextensions.k8s.io/v1", "apiextensions.k8s.io/v1beta1"];

/// `kind` of the review envelope.
pub const REVIEW_KIND: &str = "ConversionReview";

// ============================================================================
// Wire Types
// ============================================================================

/// Conversion review envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReview {
    /// Envelope API version.
    #[serde(default)]
    pub api_version: String,
    /// Envelope kind (`ConversionReview`).
    #[serde(default)]
    pub kind: String,
    /// Request, present on the way in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ConversionRequest>,
    /// Response, present on the way out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ConversionResponse>,
}

impl ConversionReview {
    /// Wrap a request in a `apiextensions.k8s.io/v1` envelope.
    pub fn for_request(request: ConversionRequest) -> Self {
        Self {
            api_version: SUPPORTED_REVIEW_VERSIONS[0].to_string(),
            kind: REVIEW_KIND.to_string(),
            request: Some(request),
            response: None,
        }
    }
}

/// A batch of objects to convert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Request identifier, echoed in the response.
    #[serde(default)]
    pub uid: String,
    /// Target `group/version`.
    #[serde(rename = "desiredAPIVersion")]
    pub desired_api_version: String,
    /// Raw objects, each carrying `apiVersion` and `kind`.
    #[serde(default)]
    pub objects: Vec<serde_json::Value>,
}

/// Result of a batch conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    /// Identifier copied from the request.
    pub uid: String,
    /// Converted objects in input order. Empty on failure.
    #[serde(default)]
    pub converted_objects: Vec<serde_json::Value>,
    /// Outcome.
    pub result: Status,
}

/// Outcome of a batch conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    /// `Success` or `Failure`.
    pub status: StatusKind,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Batch status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    /// Every object converted.
    Success,
    /// The batch was aborted.
    Failure,
}

impl Status {
    /// Successful outcome.
    pub fn success() -> Self {
        Self {
            status: StatusKind::Success,
            message: None,
        }
    }

    /// Failed outcome with a message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: StatusKind::Failure,
            message: Some(message.into()),
        }
    }

    /// Whether the batch succeeded.
    pub fn is_success(&self) -> bool {
        self.status == StatusKind::Success
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A review that cannot be answered in-band.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// The body is not a valid review document.
    #[error("malformed conversion review: {0}")]
    Json(#[from] serde_json::Error),

    /// The review carries no request.
    #[error("conversion review has no request")]
    MissingRequest,

    /// The envelope is not a supported `ConversionReview`.
    #[error("unsupported review {api_version:?}, kind {kind:?}")]
    UnsupportedReview {
        /// Envelope API version received.
        api_version: String,
        /// Envelope kind received.
        kind: String,
    },
}

impl ReviewError {
    /// Short machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Json(_) => "MALFORMED_REVIEW",
            Self::MissingRequest => "MISSING_REQUEST",
            Self::UnsupportedReview { .. } => "UNSUPPORTED_REVIEW",
        }
    }
}

/// Failure of one object within a batch.
#[derive(Debug, thiserror::Error)]
#[error("error converting object {index}: {cause}")]
pub struct BatchError {
    /// Position of the failing object in the request.
    pub index: usize,
    /// Underlying failure.
    #[source]
    pub cause: ConversionError,
}

// ============================================================================
// Handler
// ============================================================================

/// Converts review batches using a [`ConversionRouter`].
#[derive(Debug)]
pub struct ConversionHandler {
    router: ConversionRouter,
}

impl ConversionHandler {
    /// Create a handler around a router.
    pub fn new(router: ConversionRouter) -> Self {
        Self { router }
    }

    /// Create a handler for a scheme with the given hub cache configuration.
    pub fn with_scheme(scheme: Arc<Scheme>, cache: CacheConfig) -> Self {
        Self::new(ConversionRouter::with_cache_config(scheme, cache))
    }

    /// The underlying router.
    pub fn router(&self) -> &ConversionRouter {
        &self.router
    }

    /// The scheme objects are decoded against.
    pub fn scheme(&self) -> &Arc<Scheme> {
        self.router.scheme()
    }

    /// Hub cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.router.cache_stats()
    }

    /// Convert every object to `desired_api_version`, stopping at the first failure.
    pub fn convert_batch(
        &self,
        desired_api_version: &str,
        objects: &[serde_json::Value],
    ) -> Result<Vec<serde_json::Value>, BatchError> {
        let mut converted = Vec::with_capacity(objects.len());

        for (index, raw) in objects.iter().enumerate() {
            let value = self
                .convert_object(desired_api_version, raw)
                .map_err(|cause| BatchError { index, cause })?;
            converted.push(value);
        }

        Ok(converted)
    }

    fn convert_object(
        &self,
        desired_api_version: &str,
        raw: &serde_json::Value,
    ) -> Result<serde_json::Value, ConversionError> {
        let scheme = self.scheme();
        let source = scheme.decode(raw)?;
        let from = source.group_version_kind();
        let to = GroupVersion::parse(desired_api_version)?.with_kind(from.kind.clone());

        debug!(from = %from, to = %to, "converting object");

        let destination = self.router.convert_into(&*source, &to)?;
        Ok(scheme.encode(&*destination)?)
    }

    /// Answer a conversion request. Never fails: errors become a `Failure` result.
    pub fn handle(&self, request: &ConversionRequest) -> ConversionResponse {
        match self.convert_batch(&request.desired_api_version, &request.objects) {
            Ok(converted_objects) => {
                info!(
                    uid = %request.uid,
                    desired = %request.desired_api_version,
                    objects = converted_objects.len(),
                    "conversion request succeeded"
                );
                ConversionResponse {
                    uid: request.uid.clone(),
                    converted_objects,
                    result: Status::success(),
                }
            }
            Err(e) => {
                warn!(
                    uid = %request.uid,
                    desired = %request.desired_api_version,
                    index = e.index,
                    code = e.cause.code(),
                    error = %e,
                    "conversion request failed"
                );
                ConversionResponse {
                    uid: request.uid.clone(),
                    converted_objects: Vec::new(),
                    result: Status::failure(e.to_string()),
                }
            }
        }
    }

    /// Answer a decoded review envelope.
    pub fn review(&self, review: ConversionReview) -> Result<ConversionReview, ReviewError> {
        if !SUPPORTED_REVIEW_VERSIONS.contains(&review.api_version.as_str()) || review.kind != REVIEW_KIND {
            return Err(ReviewError::UnsupportedReview {
                api_version: review.api_version,
                kind: review.kind,
            });
        }
        let request = review.request.ok_or(ReviewError::MissingRequest)?;
        let response = self.handle(&request);

        Ok(ConversionReview {
            api_version: review.api_version,
            kind: review.kind,
            request: None,
            response: Some(response),
        })
    }

    /// Answer a raw review body.
    pub fn review_bytes(&self, body: &[u8]) -> Result<ConversionReview, ReviewError> {
        let review: ConversionReview = serde_json::from_slice(body)?;
        self.review(review)
    }
}
