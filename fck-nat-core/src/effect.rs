//! Effect - A single provisioning step recorded as a value

use crate::resource::{Resource, ResourceId};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Look up an existing resource (data source)
    Read(Resource),
    /// Create a new resource
    Create(Resource),
}

impl Effect {
    pub fn resource(&self) -> &Resource {
        match self {
            Effect::Read(r) | Effect::Create(r) => r,
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.resource().id
    }

    /// Returns whether this Effect changes infrastructure
    pub fn is_mutating(&self) -> bool {
        matches!(self, Effect::Create(_))
    }
}
