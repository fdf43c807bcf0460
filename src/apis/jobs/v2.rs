//! `jobs.example.org/v2`: the hub version of `ExternalJob`.

use serde::{Deserialize, Serialize};

use crate::types::meta::ObjectMeta;
use crate::types::object::{Hub, Resource};

/// Desired state of an external job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalJobSpec {
    /// When the job should run.
    #[serde(default)]
    pub schedule_at: String,
}

/// Observed state of an external job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalJobStatus {}

/// External job, hub version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalJob {
    /// Object metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Desired state.
    #[serde(default)]
    pub spec: ExternalJobSpec,
    /// Observed state.
    #[serde(default)]
    pub status: ExternalJobStatus,
}

impl Hub for ExternalJob {}

impl Resource for ExternalJob {
    const GROUP: &'static str = super::GROUP;
    const VERSION: &'static str = "v2";
    const KIND: &'static str = super::EXTERNAL_JOB;

    fn as_hub(&self) -> Option<&dyn Hub> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{is_convertible, is_hub};

    #[test]
    fn test_is_hub_only() {
        let job = ExternalJob::default();
        assert!(is_hub(&job));
        assert!(!is_convertible(&job));
    }

    #[test]
    fn test_wire_field_names() {
        let job: ExternalJob = serde_json::from_value(serde_json::json!({
            "metadata": {"name": "obj-1"},
            "spec": {"scheduleAt": "2024-01-01T00:00:00Z"},
        }))
        .unwrap();
        assert_eq!(job.spec.schedule_at, "2024-01-01T00:00:00Z");
        assert_eq!(job.metadata.name.as_deref(), Some("obj-1"));
    }
}
