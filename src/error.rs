//! Error taxonomy for conversion.
//!
//! - [`ConversionError`]: every way a single object conversion can fail.
//! - [`SchemeError`]: registry lookup, instantiation, decoding and encoding,
//!   always tagged with the offending kind identifier.
//! - [`MappingError`]: returned by per-resource field mapping code.
//!
//! No failure here is fatal to the process. Each is a per-call result.

use std::fmt;

use crate::types::gvk::{GroupVersionKind, KindFamily};

/// Which endpoint of a spoke-to-spoke conversion lacks the convertible capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingEndpoint {
    /// Only the source.
    Source,
    /// Only the destination.
    Destination,
    /// Neither endpoint is convertible.
    Both,
}

impl MissingEndpoint {
    /// Classify from the two capability flags. `None` when both are convertible.
    pub fn from_flags(source_convertible: bool, destination_convertible: bool) -> Option<Self> {
        match (source_convertible, destination_convertible) {
            (true, true) => None,
            (false, true) => Some(Self::Source),
            (true, false) => Some(Self::Destination),
            (false, false) => Some(Self::Both),
        }
    }
}

impl fmt::Display for MissingEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Destination => write!(f, "destination"),
            Self::Both => write!(f, "source and destination"),
        }
    }
}

/// Error returned by resource-specific conversion code.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MappingError {
    /// The hub handed to the conversion is not the type the spoke maps to.
    #[error("unsupported hub type: expected {expected}, found {found}")]
    UnexpectedHub {
        /// Hub the spoke knows how to map to.
        expected: GroupVersionKind,
        /// Hub actually supplied.
        found: GroupVersionKind,
    },

    /// A field could not be mapped.
    #[error("field {field}: {reason}")]
    InvalidField {
        /// Field path (e.g. `spec.runAt`).
        field: String,
        /// Why the mapping failed.
        reason: String,
    },
}

impl MappingError {
    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error type for type registry operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemeError {
    /// No type is registered for the identifier.
    #[error("no type registered for {0}")]
    NotRegistered(GroupVersionKind),

    /// The registered constructor failed.
    #[error("failed to instantiate {gvk}: {reason}")]
    Instantiation {
        /// Identifier being instantiated.
        gvk: GroupVersionKind,
        /// Constructor failure.
        reason: String,
    },

    /// Two types were registered for the same identifier.
    #[error("{gvk} registered twice ({existing} and {duplicate})")]
    DuplicateKind {
        /// Identifier registered twice.
        gvk: GroupVersionKind,
        /// Type registered first.
        existing: &'static str,
        /// Type registered second.
        duplicate: &'static str,
    },

    /// The identifier is malformed.
    #[error("invalid kind identifier {gvk}: {reason}")]
    InvalidKind {
        /// Offending identifier.
        gvk: GroupVersionKind,
        /// What is wrong with it.
        reason: String,
    },

    /// An `apiVersion` string could not be parsed.
    #[error("invalid apiVersion {api_version:?}: {reason}")]
    InvalidApiVersion {
        /// Offending string.
        api_version: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A raw object lacks `apiVersion` or `kind`.
    #[error("object is missing {0}")]
    MissingTypeMeta(&'static str),

    /// Raw bytes are not a JSON document, or its `apiVersion`/`kind` header is not a pair of strings.
    #[error("malformed object: {0}")]
    Malformed(#[source] serde_json::Error),

    /// A raw object failed to deserialize into its registered type.
    #[error("failed to decode {gvk}: {cause}")]
    Decode {
        /// Identifier the object claimed.
        gvk: GroupVersionKind,
        /// Deserialization failure.
        #[source]
        cause: serde_json::Error,
    },

    /// An object failed to serialize.
    #[error("failed to encode {gvk}: {cause}")]
    Encode {
        /// Identifier of the object.
        gvk: GroupVersionKind,
        /// Serialization failure.
        #[source]
        cause: serde_json::Error,
    },

    /// A kind family has zero or several hubs.
    #[error("kind family {family} must have exactly one hub, found {}", format_hubs(.hubs))]
    HubMisconfigured {
        /// Misconfigured family.
        family: KindFamily,
        /// Hubs found (empty when none).
        hubs: Vec<GroupVersionKind>,
    },
}

fn format_hubs(hubs: &[GroupVersionKind]) -> String {
    if hubs.is_empty() {
        return "none".to_string();
    }
    hubs.iter()
        .map(|h| h.api_version())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error type for object conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Source and destination share a kind identifier.
    #[error("conversion is not allowed between same type {type_name} ({gvk})")]
    SameVersionConversion {
        /// Shared identifier.
        gvk: GroupVersionKind,
        /// Rust type of the source.
        type_name: &'static str,
    },

    /// The family has no hub and neither endpoint is one.
    #[error("no hub version defined for kind family {family}")]
    NoHubDefined {
        /// Family searched.
        family: KindFamily,
    },

    /// The family has more than one hub.
    #[error("multiple hub versions defined for kind family {family}: {}", format_hubs(.hubs))]
    MultipleHubsDefined {
        /// Family searched.
        family: KindFamily,
        /// Every hub found, in version priority order.
        hubs: Vec<GroupVersionKind>,
    },

    /// The destination is a hub but the source cannot convert to it.
    #[error("{type_name} ({gvk}) is not convertible to the hub")]
    SourceNotConvertible {
        /// Source identifier.
        gvk: GroupVersionKind,
        /// Rust type of the source.
        type_name: &'static str,
    },

    /// The source is a hub but the destination cannot convert from it.
    #[error("{type_name} ({gvk}) is not convertible from the hub")]
    DestinationNotConvertible {
        /// Destination identifier.
        gvk: GroupVersionKind,
        /// Rust type of the destination.
        type_name: &'static str,
    },

    /// Spoke-to-spoke conversion requires both endpoints to be convertible.
    #[error("{from} and {to} both need to be convertible ({missing} is not)")]
    BothEndpointsMustBeConvertible {
        /// Source identifier.
        from: GroupVersionKind,
        /// Destination identifier.
        to: GroupVersionKind,
        /// Which endpoint lacks the capability.
        missing: MissingEndpoint,
    },

    /// The source failed to convert into the hub.
    #[error("{type_name} failed to convert to hub version {hub}: {cause}")]
    SourceToHubFailed {
        /// Rust type of the source.
        type_name: &'static str,
        /// Hub identifier.
        hub: GroupVersionKind,
        /// Mapping failure.
        #[source]
        cause: MappingError,
    },

    /// The destination failed to populate itself from the hub.
    #[error("{type_name} failed to convert from hub version {hub}: {cause}")]
    HubToDestinationFailed {
        /// Rust type of the destination.
        type_name: &'static str,
        /// Hub identifier.
        hub: GroupVersionKind,
        /// Mapping failure.
        #[source]
        cause: MappingError,
    },

    /// Mapping failure on a direct hub conversion.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Registry failure, passed through unchanged.
    #[error(transparent)]
    Scheme(#[from] SchemeError),
}

impl ConversionError {
    /// Short machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SameVersionConversion { .. } => "SAME_VERSION_CONVERSION",
            Self::NoHubDefined { .. } => "NO_HUB_DEFINED",
            Self::MultipleHubsDefined { .. } => "MULTIPLE_HUBS_DEFINED",
            Self::SourceNotConvertible { .. } => "SOURCE_NOT_CONVERTIBLE",
            Self::DestinationNotConvertible { .. } => "DESTINATION_NOT_CONVERTIBLE",
            Self::BothEndpointsMustBeConvertible { .. } => "BOTH_ENDPOINTS_MUST_BE_CONVERTIBLE",
            Self::SourceToHubFailed { .. } => "SOURCE_TO_HUB_FAILED",
            Self::HubToDestinationFailed { .. } => "HUB_TO_DESTINATION_FAILED",
            Self::Mapping(_) => "MAPPING_FAILED",
            Self::Scheme(_) => "SCHEME_ERROR",
        }
    }

    /// Whether the error reflects a registry misconfiguration rather than bad input.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::NoHubDefined { .. }
                | Self::MultipleHubsDefined { .. }
                | Self::Scheme(SchemeError::HubMisconfigured { .. })
                | Self::Scheme(SchemeError::DuplicateKind { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn gvk(version: &str) -> GroupVersionKind {
        GroupVersionKind::new("jobs.example.org", version, "ExternalJob")
    }

    #[test]
    fn test_missing_endpoint_from_flags() {
        assert_eq!(MissingEndpoint::from_flags(true, true), None);
        assert_eq!(MissingEndpoint::from_flags(false, true), Some(MissingEndpoint::Source));
        assert_eq!(MissingEndpoint::from_flags(true, false), Some(MissingEndpoint::Destination));
        assert_eq!(MissingEndpoint::from_flags(false, false), Some(MissingEndpoint::Both));
    }

    #[test]
    fn test_wrapped_errors_keep_cause() {
        let err = ConversionError::SourceToHubFailed {
            type_name: "v1::ExternalJob",
            hub: gvk("v2"),
            cause: MappingError::invalid_field("spec.runAt", "not a timestamp"),
        };
        let source = err.source().expect("cause is exposed as source");
        assert_eq!(source.to_string(), "field spec.runAt: not a timestamp");
        assert_eq!(err.code(), "SOURCE_TO_HUB_FAILED");
    }

    #[test]
    fn test_multiple_hubs_message_lists_hubs() {
        let err = ConversionError::MultipleHubsDefined {
            family: gvk("v1").family(),
            hubs: vec![gvk("v2"), gvk("v1")],
        };
        assert!(err.to_string().contains("jobs.example.org/v2, jobs.example.org/v1"));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_scheme_error_passes_through() {
        let err: ConversionError = SchemeError::NotRegistered(gvk("v9")).into();
        assert_eq!(err.to_string(), "no type registered for jobs.example.org/v9, Kind=ExternalJob");
        assert!(!err.is_configuration_error());
    }
}
