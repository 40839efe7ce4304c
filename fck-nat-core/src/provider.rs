//! Provider - Trait abstracting resource provisioning
//!
//! A Provisioner accepts resource descriptions and hands back references to
//! them. Whether it records them into a plan, renders a template or calls a
//! cloud API is up to the implementation; callers only see the reference.

use crate::resource::{Resource, ResourceId, ResourceRef};

/// Error type for Provisioner operations
#[derive(Debug)]
pub struct ProviderError {
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}] {}", id, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resource_id: None,
            cause: None,
        }
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Collaborator that provisions resources
///
/// Each call either fully succeeds, returning a stable reference, or fails
/// without side effects. Implementations do not retry.
pub trait Provisioner {
    /// Name of this Provisioner (e.g., "synth")
    fn name(&self) -> &'static str;

    /// Provision a resource, returning a reference to its identifier
    fn provision(&mut self, resource: Resource) -> ProviderResult<ResourceRef>;

    /// Look up an existing resource (data source), returning a reference to its identifier
    fn lookup(&mut self, resource: Resource) -> ProviderResult<ResourceRef>;
}

/// Provisioner implementation for Box<dyn Provisioner>
/// This enables dynamic dispatch for Provisioners
impl Provisioner for Box<dyn Provisioner> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn provision(&mut self, resource: Resource) -> ProviderResult<ResourceRef> {
        (**self).provision(resource)
    }

    fn lookup(&mut self, resource: Resource) -> ProviderResult<ResourceRef> {
        (**self).lookup(resource)
    }
}
