//! `jobs.example.org/v1`: a spoke version of `ExternalJob`.
//!
//! Converts to and from [`v2::ExternalJob`](super::v2::ExternalJob) by
//! copying metadata and mapping `spec.runAt` onto `spec.scheduleAt`.

use serde::{Deserialize, Serialize};

use super::v2;
use crate::error::MappingError;
use crate::types::meta::ObjectMeta;
use crate::types::object::{hub_mut, hub_ref, Convertible, Resource, VersionedObject};

/// Desired state of an external job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalJobSpec {
    /// When the job should run.
    #[serde(default)]
    pub run_at: String,
}

/// Observed state of an external job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalJobStatus {}

/// External job, v1.
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

impl Convertible for ExternalJob {
    fn convert_to(&self, hub: &mut dyn VersionedObject) -> Result<(), MappingError> {
        let job = hub_mut::<v2::ExternalJob>(hub)?;
        job.metadata = self.metadata.clone();
        job.spec.schedule_at = self.spec.run_at.clone();
        Ok(())
    }

    fn convert_from(&mut self, hub: &dyn VersionedObject) -> Result<(), MappingError> {
        let job = hub_ref::<v2::ExternalJob>(hub)?;
        self.metadata = job.metadata.clone();
        self.spec.run_at = job.spec.schedule_at.clone();
        Ok(())
    }
}

impl Resource for ExternalJob {
    const GROUP: &'static str = super::GROUP;
    const VERSION: &'static str = "v1";
    const KIND: &'static str = super::EXTERNAL_JOB;

    fn as_convertible(&self) -> Option<&dyn Convertible> {
        Some(self)
    }

    fn as_convertible_mut(&mut self) -> Option<&mut dyn Convertible> {
        Some(self)
    }
}
