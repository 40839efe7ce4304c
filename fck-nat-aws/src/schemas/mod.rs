//! Resource schemas and builders for the resources a NAT instance needs

pub mod autoscaling;
pub mod ec2;
pub mod iam;
pub mod ssm;
pub mod types;

use fck_nat_core::schema::{ResourceSchema, SchemaRegistry};

/// Returns all schemas
pub fn all_schemas() -> Vec<ResourceSchema> {
    let mut schemas = Vec::new();
    schemas.extend(ec2::schemas());
    schemas.extend(iam::schemas());
    schemas.extend(autoscaling::schemas());
    schemas.extend(ssm::schemas());
    schemas
}

/// Registry of all schemas, for use with a synthesizer
pub fn registry() -> SchemaRegistry {
    all_schemas().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_schema_has_a_provider_type() {
        for schema in all_schemas() {
            assert!(
                schema.provider_type.is_some(),
                "{} has no provider type",
                schema.resource_type
            );
        }
    }

    #[test]
    fn registry_holds_each_type_once() {
        assert_eq!(registry().len(), all_schemas().len());
    }
}
