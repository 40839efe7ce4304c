//! Plan - Collection of Effects
//!
//! A Plan is an ordered list of Effects produced by a synthesis pass.
//! Order follows the order in which resources were provisioned, so every
//! resource appears after the resources it refers to.

use crate::effect::Effect;
use crate::resource::Resource;
use crate::schema::SchemaRegistry;
use crate::template;

/// Plan containing Effects in provisioning order
#[derive(Debug, Clone, Default)]
pub struct Plan {
    effects: Vec<Effect>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Number of mutating Effects
    pub fn mutation_count(&self) -> usize {
        self.effects.iter().filter(|e| e.is_mutating()).count()
    }

    /// Find a resource by binding name
    pub fn find(&self, binding: &str) -> Option<&Resource> {
        self.effects
            .iter()
            .map(Effect::resource)
            .find(|r| r.id.name == binding)
    }

    /// All resources of the given type, in provisioning order
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a Resource> + 'a {
        self.effects
            .iter()
            .map(Effect::resource)
            .filter(move |r| r.id.resource_type == resource_type)
    }

    /// Generate a summary of the Plan for display
    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for effect in &self.effects {
            match effect {
                Effect::Read(_) => summary.read += 1,
                Effect::Create(_) => summary.create += 1,
            }
        }
        summary
    }

    /// Render as a CloudFormation-style template
    pub fn to_template(&self, schemas: &SchemaRegistry) -> serde_json::Value {
        template::render(self, schemas)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub read: usize,
    pub create: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Plan: {} to create, {} to look up",
            self.create, self.read
        )
    }
}
