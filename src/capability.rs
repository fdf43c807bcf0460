//! Capability probes.
//!
//! Pure O(1) checks on a versioned instance. No registry lookup involved.

use serde::{Deserialize, Serialize};

use crate::types::object::VersionedObject;

/// Whether the instance carries the hub marker.
pub fn is_hub(obj: &dyn VersionedObject) -> bool {
    obj.hub_capability().is_some()
}

/// Whether the instance can convert to and from the hub.
pub fn is_convertible(obj: &dyn VersionedObject) -> bool {
    obj.convertible().is_some()
}

/// How a version takes part in hub-and-spoke conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Carries the hub marker (with or without convertible).
    Hub,
    /// Convertible, not a hub.
    Spoke,
    /// Neither. Cannot take part in conversion except as an identity.
    Inert,
}

/// Snapshot of both capability probes for one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Hub marker present.
    pub hub: bool,
    /// Convertible capability present.
    pub convertible: bool,
}

impl Capabilities {
    /// Probe an instance.
    pub fn of(obj: &dyn VersionedObject) -> Self {
        Self {
            hub: is_hub(obj),
            convertible: is_convertible(obj),
        }
    }

    /// Classify the instance.
    pub fn shape(&self) -> Shape {
        if self.hub {
            Shape::Hub
        } else if self.convertible {
            Shape::Spoke
        } else {
            Shape::Inert
        }
    }
}
