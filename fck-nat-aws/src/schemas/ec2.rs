//! EC2 resource schemas and builders
//!
//! Based on the CloudFormation AWS::EC2::* resource specifications.

use fck_nat_core::resource::{Resource, Value};
use fck_nat_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::types::{instance_type, port_number, protocol};

fn string_list() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::String))
}

/// Returns the schema for an AMI lookup (data source)
pub fn ami_schema() -> ResourceSchema {
    ResourceSchema::new("ami")
        .with_description("Newest machine image matching a name pattern")
        .with_provider_type("AWS::EC2::Image")
        .with_identifier("image_id")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Image name pattern, wildcards allowed")
                .with_provider_name("Name"),
        )
        .attribute(
            AttributeSchema::new("owners", string_list())
                .required()
                .with_description("Account ids allowed to own the image")
                .with_provider_name("Owners"),
        )
}

pub fn ami(name: impl Into<String>, pattern: &str, owners: &[String]) -> Resource {
    Resource::new("ami", name)
        .with_attribute("name", pattern)
        .with_attribute("owners", owners.to_vec())
        .with_read_only(true)
}

/// Returns the schema for Security Group
pub fn security_group_schema() -> ResourceSchema {
    ResourceSchema::new("security_group")
        .with_description("An AWS VPC Security Group")
        .with_provider_type("AWS::EC2::SecurityGroup")
        .attribute(
            AttributeSchema::new("vpc_id", AttributeType::String)
                .required()
                .with_description("VPC to create the Security Group in")
                .with_provider_name("VpcId"),
        )
        .attribute(
            AttributeSchema::new("group_description", AttributeType::String)
                .required()
                .with_description("Description of the Security Group")
                .with_provider_name("GroupDescription"),
        )
}

pub fn security_group(name: impl Into<String>, vpc_id: Value, description: &str) -> Resource {
    Resource::new("security_group", name)
        .with_attribute("vpc_id", vpc_id)
        .with_attribute("group_description", description)
}

/// Returns the schema for Security Group Ingress Rule
pub fn security_group_ingress_schema() -> ResourceSchema {
    ResourceSchema::new("security_group_ingress")
        .with_description("An inbound rule for an AWS VPC Security Group")
        .with_provider_type("AWS::EC2::SecurityGroupIngress")
        .attribute(
            AttributeSchema::new("group_id", AttributeType::String)
                .required()
                .with_description("Security Group the rule belongs to")
                .with_provider_name("GroupId"),
        )
        .attribute(
            AttributeSchema::new("ip_protocol", protocol())
                .required()
                .with_description("Protocol (tcp, udp, icmp, or -1 for all)")
                .with_provider_name("IpProtocol"),
        )
        .attribute(
            AttributeSchema::new("from_port", port_number())
                .with_description("Start of port range")
                .with_provider_name("FromPort"),
        )
        .attribute(
            AttributeSchema::new("to_port", port_number())
                .with_description("End of port range")
                .with_provider_name("ToPort"),
        )
        .attribute(
            AttributeSchema::new("cidr_ip", types::cidr())
                .required()
                .with_description("CIDR block to allow")
                .with_provider_name("CidrIp"),
        )
        .attribute(
            AttributeSchema::new("description", AttributeType::String)
                .with_provider_name("Description"),
        )
}

/// Returns the schema for Network Interface
pub fn network_interface_schema() -> ResourceSchema {
    ResourceSchema::new("network_interface")
        .with_description("An elastic network interface")
        .with_provider_type("AWS::EC2::NetworkInterface")
        .attribute(
            AttributeSchema::new("subnet_id", AttributeType::String)
                .required()
                .with_description("Subnet to create the interface in")
                .with_provider_name("SubnetId"),
        )
        .attribute(
            AttributeSchema::new("source_dest_check", AttributeType::Bool)
                .with_description("Must be false for an interface that forwards traffic")
                .with_provider_name("SourceDestCheck"),
        )
        .attribute(
            AttributeSchema::new("group_set", string_list())
                .with_description("Security Groups attached to the interface")
                .with_provider_name("GroupSet"),
        )
}

/// Interface for a NAT instance: forwarding requires source/destination checks off
pub fn nat_network_interface(
    name: impl Into<String>,
    subnet_id: Value,
    security_group: Value,
) -> Resource {
    Resource::new("network_interface", name)
        .with_attribute("subnet_id", subnet_id)
        .with_attribute("source_dest_check", false)
        .with_attribute("group_set", Value::List(vec![security_group]))
}

/// Returns the schema for Launch Template
pub fn launch_template_schema() -> ResourceSchema {
    ResourceSchema::new("launch_template")
        .with_description("An EC2 launch template")
        .with_provider_type("AWS::EC2::LaunchTemplate")
        .attribute(
            AttributeSchema::new("instance_type", instance_type())
                .required()
                .with_provider_name("InstanceType"),
        )
        .attribute(
            AttributeSchema::new("image_id", AttributeType::String)
                .required()
                .with_provider_name("ImageId"),
        )
        .attribute(
            AttributeSchema::new("security_group_ids", string_list())
                .with_provider_name("SecurityGroupIds"),
        )
        .attribute(
            AttributeSchema::new("iam_instance_profile", AttributeType::String)
                .required()
                .with_description("Instance profile wrapping the NAT role")
                .with_provider_name("IamInstanceProfile"),
        )
        .attribute(
            AttributeSchema::new("user_data", AttributeType::String)
                .with_description("Bootstrap script")
                .with_provider_name("UserData"),
        )
        .attribute(
            AttributeSchema::new("key_name", AttributeType::String)
                .with_description("Key pair granting SSH access")
                .with_provider_name("KeyName"),
        )
}

/// Returns the schema for Route
pub fn route_schema() -> ResourceSchema {
    ResourceSchema::new("route")
        .with_description("A route in a subnet's route table")
        .with_provider_type("AWS::EC2::Route")
        .attribute(
            AttributeSchema::new("route_table_id", AttributeType::String)
                .required()
                .with_description("The ID of the route table for the route.")
                .with_provider_name("RouteTableId"),
        )
        .attribute(
            AttributeSchema::new("destination_cidr_block", types::cidr())
                .required()
                .with_description("The IPv4 CIDR address block used for the destination match.")
                .with_provider_name("DestinationCidrBlock"),
        )
        .attribute(
            AttributeSchema::new("network_interface_id", AttributeType::String)
                .with_description("The ID of a network interface.")
                .with_provider_name("NetworkInterfaceId"),
        )
        .attribute(
            AttributeSchema::new("enables_internet_connectivity", AttributeType::Bool)
                .with_description("Whether the route target provides internet access"),
        )
}

/// Default route sending all IPv4 traffic to a network interface
pub fn default_route(
    name: impl Into<String>,
    route_table_id: Value,
    network_interface_id: Value,
) -> Resource {
    Resource::new("route", name)
        .with_attribute("route_table_id", route_table_id)
        .with_attribute("destination_cidr_block", "0.0.0.0/0")
        .with_attribute("network_interface_id", network_interface_id)
        .with_attribute("enables_internet_connectivity", true)
}

/// Returns all EC2-related schemas
pub fn schemas() -> Vec<ResourceSchema> {
    vec![
        ami_schema(),
        security_group_schema(),
        security_group_ingress_schema(),
        network_interface_schema(),
        launch_template_schema(),
        route_schema(),
    ]
}
