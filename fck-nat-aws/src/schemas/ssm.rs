//! SSM parameter schema

use fck_nat_core::resource::{Resource, Value};
use fck_nat_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

/// Returns the schema for SSM Parameter. `Ref` yields the parameter name and
/// there is no `Arn` attribute, so references stay on `id`.
pub fn parameter_schema() -> ResourceSchema {
    ResourceSchema::new("ssm_parameter")
        .with_description("An SSM Parameter Store string parameter")
        .with_provider_type("AWS::SSM::Parameter")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_provider_name("Name"),
        )
        .attribute(
            AttributeSchema::new("type", AttributeType::Enum(vec!["String".to_string()]))
                .with_default(Value::from("String"))
                .with_provider_name("Type"),
        )
        .attribute(
            AttributeSchema::new("value", AttributeType::String)
                .required()
                .with_provider_name("Value"),
        )
        .attribute(
            AttributeSchema::new("description", AttributeType::String)
                .with_provider_name("Description"),
        )
}

pub fn string_parameter(
    binding: impl Into<String>,
    name: impl Into<String>,
    value: impl Into<String>,
    description: &str,
) -> Resource {
    Resource::new("ssm_parameter", binding)
        .with_attribute("name", name.into())
        .with_attribute("type", "String")
        .with_attribute("value", value.into())
        .with_attribute("description", description)
}

/// Returns all SSM schemas
pub fn schemas() -> Vec<ResourceSchema> {
    vec![parameter_schema()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_parameter_validates() {
        let param = string_parameter("cw", "/fck-nat/cloudwatch", "{}", "agent config");
        assert!(parameter_schema().validate(&param.attributes).is_ok());
        assert_eq!(parameter_schema().identifier, "id");
    }
}
