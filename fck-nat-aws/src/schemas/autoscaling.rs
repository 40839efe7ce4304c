//! Auto Scaling resource schemas and builders

use fck_nat_core::resource::{Resource, ResourceRef, Value};
use fck_nat_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

/// Returns the schema for Auto Scaling Group
pub fn auto_scaling_group_schema() -> ResourceSchema {
    ResourceSchema::new("auto_scaling_group")
        .with_description("An EC2 Auto Scaling group")
        .with_provider_type("AWS::AutoScaling::AutoScalingGroup")
        .attribute(
            AttributeSchema::new(
                "vpc_zone_identifier",
                AttributeType::List(Box::new(AttributeType::String)),
            )
            .required()
            .with_description("Subnets the group launches instances into")
            .with_provider_name("VPCZoneIdentifier"),
        )
        .attribute(
            AttributeSchema::new("min_size", AttributeType::Int)
                .required()
                .with_provider_name("MinSize"),
        )
        .attribute(
            AttributeSchema::new("max_size", types::positive_int())
                .required()
                .with_provider_name("MaxSize"),
        )
        .attribute(
            AttributeSchema::new("desired_capacity", AttributeType::Int)
                .with_provider_name("DesiredCapacity"),
        )
        .attribute(
            AttributeSchema::new("launch_template_id", AttributeType::String)
                .required()
                .with_provider_name("LaunchTemplateId"),
        )
        .attribute(
            AttributeSchema::new("launch_template_version", AttributeType::String)
                .required()
                .with_provider_name("LaunchTemplateVersion"),
        )
        .attribute(
            AttributeSchema::new(
                "metrics_granularity",
                AttributeType::Enum(vec!["1Minute".to_string()]),
            )
            .with_description("Group metrics collection; all metrics are enabled")
            .with_provider_name("MetricsCollection"),
        )
}

/// A single-instance group that keeps one NAT instance alive in a subnet
pub fn single_instance_group(
    name: impl Into<String>,
    subnet_id: Value,
    launch_template: &ResourceRef,
) -> Resource {
    Resource::new("auto_scaling_group", name)
        .with_attribute("vpc_zone_identifier", Value::List(vec![subnet_id]))
        .with_attribute("min_size", 1i64)
        .with_attribute("max_size", 1i64)
        .with_attribute("desired_capacity", 1i64)
        .with_attribute("launch_template_id", launch_template)
        .with_attribute(
            "launch_template_version",
            Value::ResourceRef(
                launch_template.binding.clone(),
                "latest_version_number".to_string(),
            ),
        )
        .with_attribute("metrics_granularity", "1Minute")
}

/// Returns all Auto Scaling schemas
pub fn schemas() -> Vec<ResourceSchema> {
    vec![auto_scaling_group_schema()]
}
