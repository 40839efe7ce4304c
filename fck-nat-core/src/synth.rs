//! Synthesizer - Provisioner that records resources into a Plan
//!
//! Each provisioned resource is validated against its schema, checked for
//! duplicate bindings and dangling references, and appended to the plan as an
//! Effect. The returned reference points at the schema's identifier attribute.

use std::collections::HashSet;

use log::debug;

use crate::effect::Effect;
use crate::plan::Plan;
use crate::provider::{ProviderError, ProviderResult, Provisioner};
use crate::resource::{Resource, ResourceRef};
use crate::schema::SchemaRegistry;

#[derive(Debug, Default)]
pub struct Synthesizer {
    plan: Plan,
    schemas: SchemaRegistry,
    bindings: HashSet<String>,
}

impl Synthesizer {
    pub fn new(schemas: SchemaRegistry) -> Self {
        Self {
            plan: Plan::new(),
            schemas,
            bindings: HashSet::new(),
        }
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn into_plan(self) -> Plan {
        self.plan
    }

    fn record(&mut self, resource: Resource) -> ProviderResult<ResourceRef> {
        let binding = resource.id.name.clone();

        if self.bindings.contains(&binding) {
            return Err(
                ProviderError::new(format!("binding '{}' is already defined", binding))
                    .for_resource(resource.id),
            );
        }

        let mut dangling: Vec<_> = resource
            .dependencies()
            .into_iter()
            .filter(|dep| !self.bindings.contains(dep))
            .collect();
        if !dangling.is_empty() {
            dangling.sort();
            return Err(ProviderError::new(format!(
                "reference to undefined binding(s): {}",
                dangling.join(", ")
            ))
            .for_resource(resource.id));
        }

        let identifier = match self.schemas.get(&resource.id.resource_type) {
            Some(schema) => {
                if let Err(errors) = schema.validate(&resource.attributes) {
                    let messages: Vec<_> = errors.iter().map(|e| e.to_string()).collect();
                    return Err(ProviderError::new(messages.join("; ")).for_resource(resource.id));
                }
                schema.identifier.clone()
            }
            None => "id".to_string(),
        };

        debug!("synthesized {}", resource.id);
        self.bindings.insert(binding.clone());
        let effect = if resource.is_data_source() {
            Effect::Read(resource)
        } else {
            Effect::Create(resource)
        };
        self.plan.add(effect);

        Ok(ResourceRef::new(binding, identifier))
    }
}

impl Provisioner for Synthesizer {
    fn name(&self) -> &'static str {
        "synth"
    }

    fn provision(&mut self, resource: Resource) -> ProviderResult<ResourceRef> {
        self.record(resource)
    }

    fn lookup(&mut self, resource: Resource) -> ProviderResult<ResourceRef> {
        self.record(resource.with_read_only(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeSchema, AttributeType, ResourceSchema};

    fn registry() -> SchemaRegistry {
        vec![
            ResourceSchema::new("security_group")
                .attribute(AttributeSchema::new("vpc_id", AttributeType::String).required()),
            ResourceSchema::new("ami").with_identifier("image_id"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn provision_records_create_effect() {
        let mut synth = Synthesizer::new(registry());
        let sg = synth
            .provision(Resource::new("security_group", "sg").with_attribute("vpc_id", "vpc-1"))
            .unwrap();

        assert_eq!(sg, ResourceRef::new("sg", "id"));
        assert!(matches!(synth.plan().effects()[0], Effect::Create(_)));
    }

    #[test]
    fn lookup_records_read_effect_with_schema_identifier() {
        let mut synth = Synthesizer::new(registry());
        let ami = synth.lookup(Resource::new("ami", "nat_ami")).unwrap();

        assert_eq!(ami, ResourceRef::new("nat_ami", "image_id"));
        let plan = synth.into_plan();
        assert!(matches!(&plan.effects()[0], Effect::Read(r) if r.is_data_source()));
    }

    #[test]
    fn duplicate_binding_is_rejected() {
        let mut synth = Synthesizer::new(SchemaRegistry::new());
        synth.provision(Resource::new("route", "r")).unwrap();
        let err = synth.provision(Resource::new("route", "r")).unwrap_err();

        assert!(err.message.contains("already defined"));
        assert_eq!(synth.plan().effects().len(), 1);
    }

    #[test]
    fn dangling_reference_is_rejected() {
        let mut synth = Synthesizer::new(SchemaRegistry::new());
        let err = synth
            .provision(
                Resource::new("route", "r")
                    .with_attribute("network_interface_id", ResourceRef::new("eni", "id")),
            )
            .unwrap_err();

        assert!(err.message.contains("eni"));
        assert!(synth.plan().is_empty());
    }

    #[test]
    fn schema_violation_is_rejected() {
        let mut synth = Synthesizer::new(registry());
        let err = synth
            .provision(Resource::new("security_group", "sg"))
            .unwrap_err();

        assert!(err.message.contains("vpc_id"));
        assert!(synth.plan().is_empty());
    }
}
