//! `jobs.example.org` API group.
//!
//! | Version | Role  | Schedule field    |
//! |---------|-------|-------------------|
//! | `v1`    | spoke | `spec.runAt`      |
//! | `v2`    | hub   | `spec.scheduleAt` |

pub mod v1;
pub mod v2;

use crate::scheme::SchemeBuilder;

/// API group name.
pub const GROUP: &str = "jobs.example.org";

/// Kind served by this group.
pub const EXTERNAL_JOB: &str = "ExternalJob";

/// Register every version of the group.
pub fn add_to_scheme(builder: SchemeBuilder) -> SchemeBuilder {
    builder.register::<v1::ExternalJob>().register::<v2::ExternalJob>()
}
