//! Built-in resource definitions.
//!
//! Each API group lives in its own module with one submodule per version and
//! an `add_to_scheme` function registering every version of the group.

pub mod jobs;

use crate::error::SchemeError;
use crate::scheme::Scheme;

/// Build a validated scheme with every built-in resource registered.
pub fn default_scheme() -> Result<Scheme, SchemeError> {
    jobs::add_to_scheme(Scheme::builder()).build()
}
