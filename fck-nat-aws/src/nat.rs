//! NAT provider - Provisions fck-nat instances and routes private subnets to them
//!
//! `configure_nat` runs in three phases:
//!
//! 1. validate the configuration and provision the shared resources (image
//!    lookup, security group, role, instance profile, telemetry parameter)
//! 2. for every egress subnet provision a network interface, a launch
//!    template and a single-instance auto scaling group, and register the
//!    interface as the zone's gateway
//! 3. for every private subnet install a default route to the gateway picked
//!    for its zone
//!
//! The address pool is checked before anything is provisioned. Once phase 1
//! starts, provisioner failures propagate as they are; nothing is rolled back.

use std::collections::HashMap;

use heck::ToSnakeCase;
use log::{debug, info};

use fck_nat_core::provider::Provisioner;
use fck_nat_core::resource::{Resource, ResourceRef, Value};

use crate::cloudwatch::{self, default_cloudwatch_config};
use crate::connections::Connections;
use crate::error::{NatError, NatResult};
use crate::pref_set::PrefSet;
use crate::props::{MachineImage, NatInstanceProps, SshCredential};
use crate::schemas::iam::{PolicyStatement, RoleBuilder};
use crate::schemas::{autoscaling, ec2, iam, ssm};
use crate::user_data::UserData;

/// Description of the shared NAT security group
pub const SECURITY_GROUP_DESCRIPTION: &str = "Security Group for NAT instances";

/// Name of the inline policy that lets instances claim their interface
pub const ENI_POLICY_NAME: &str = "attachNatEniPolicy";

const SSM_MANAGED_POLICY: &str = "AmazonSSMManagedEC2InstanceDefaultPolicy";
const CLOUDWATCH_MANAGED_POLICY: &str = "CloudWatchAgentServerPolicy";
const EC2_SERVICE_PRINCIPAL: &str = "ec2.amazonaws.com";

/// A subnet taking part in NAT configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SubnetSpec {
    /// Name used to derive binding names
    pub name: String,
    pub subnet_id: Value,
    pub availability_zone: String,
    pub route_table_id: Value,
}

impl SubnetSpec {
    pub fn new(
        name: impl Into<String>,
        subnet_id: impl Into<Value>,
        availability_zone: impl Into<String>,
        route_table_id: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            subnet_id: subnet_id.into(),
            availability_zone: availability_zone.into(),
            route_table_id: route_table_id.into(),
        }
    }

    fn binding(&self, suffix: &str) -> String {
        format!("{}_{}", self.name.to_snake_case(), suffix)
    }
}

/// Inputs to `configure_nat`
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigureNatOptions {
    pub vpc_id: Value,
    /// Egress subnets, one NAT instance each
    pub nat_subnets: Vec<SubnetSpec>,
    /// Subnets routed through the NAT instances
    pub private_subnets: Vec<SubnetSpec>,
}

/// A registered gateway: the zone and the interface serving it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub az: String,
    pub gateway_id: ResourceRef,
}

/// Capabilities a VPC needs from a NAT implementation
pub trait NatProvider {
    /// Provision NAT instances in `nat_subnets` and route `private_subnets` through them
    fn configure_nat(
        &mut self,
        provisioner: &mut dyn Provisioner,
        options: &ConfigureNatOptions,
    ) -> NatResult<()>;

    /// Route one private subnet through the gateway for its zone
    fn configure_subnet(
        &mut self,
        provisioner: &mut dyn Provisioner,
        subnet: &SubnetSpec,
    ) -> NatResult<ResourceRef>;

    /// Every (zone, gateway) registration, in egress subnet order
    fn configured_gateways(&self) -> NatResult<Vec<GatewayConfig>>;

    fn security_group(&self) -> NatResult<&Value>;

    fn connections(&mut self) -> NatResult<&mut Connections>;
}

/// NAT provider backed by fck-nat instances
#[derive(Debug)]
pub struct FckNatInstanceProvider {
    props: NatInstanceProps,
    gateways: PrefSet<ResourceRef>,
    role: Option<ResourceRef>,
    security_group: Option<Value>,
    connections: Option<Connections>,
    auto_scaling_groups: Option<Vec<ResourceRef>>,
}

/// Resources shared by every NAT instance
struct SharedResources {
    image: Value,
    security_group: Value,
    instance_profile: ResourceRef,
    cloudwatch_param: Option<Value>,
}

impl FckNatInstanceProvider {
    pub fn new(props: NatInstanceProps) -> Self {
        Self {
            props,
            gateways: PrefSet::new(),
            role: None,
            security_group: None,
            connections: None,
            auto_scaling_groups: None,
        }
    }

    pub fn props(&self) -> &NatInstanceProps {
        &self.props
    }

    /// The role attached to the NAT instances
    pub fn role(&self) -> NatResult<&ResourceRef> {
        self.role
            .as_ref()
            .ok_or_else(|| NatError::not_configured("role"))
    }

    /// The auto scaling groups, one per egress subnet
    pub fn auto_scaling_groups(&self) -> NatResult<&[ResourceRef]> {
        self.auto_scaling_groups
            .as_deref()
            .ok_or_else(|| NatError::not_configured("autoScalingGroups"))
    }

    fn validate(&self, options: &ConfigureNatOptions) -> NatResult<()> {
        if let Some(pool) = &self.props.eip_pool
            && pool.len() < options.nat_subnets.len()
        {
            return Err(NatError::configuration(format!(
                "If specifying an EIP pool, the size of the pool must be greater than or equal \
                 to the number of egress subnets in the target VPC ({} < {})",
                pool.len(),
                options.nat_subnets.len()
            )));
        }
        unique_bindings(&options.nat_subnets)?;
        unique_bindings(&options.private_subnets)?;
        Ok(())
    }

    fn provision_shared(
        &mut self,
        provisioner: &mut dyn Provisioner,
        options: &ConfigureNatOptions,
    ) -> NatResult<SharedResources> {
        let image = match self.props.machine_image.clone().unwrap_or_default() {
            MachineImage::Generic { ami_id } => Value::String(ami_id),
            MachineImage::Lookup { name, owners } => {
                Value::from(provisioner.lookup(ec2::ami("nat_ami", &name, &owners))?)
            }
        };

        let security_group = match &self.props.security_group {
            Some(group_id) => Value::from(group_id.as_str()),
            None => Value::from(provisioner.provision(ec2::security_group(
                "nat_security_group",
                options.vpc_id.clone(),
                SECURITY_GROUP_DESCRIPTION,
            ))?),
        };
        self.security_group = Some(security_group.clone());
        self.connections = Some(Connections::new(
            "nat_security_group",
            vec![security_group.clone()],
        ));

        let cloudwatch_param = if self.props.enable_cloudwatch {
            Some(self.provision_cloudwatch_param(provisioner)?)
        } else {
            None
        };

        let role = provisioner.provision(self.role_resource(cloudwatch_param.as_ref()))?;
        let instance_profile = provisioner.provision(iam::instance_profile(
            "nat_instance_profile",
            Value::from(&role),
        ))?;
        self.role = Some(role);

        Ok(SharedResources {
            image,
            security_group,
            instance_profile,
            cloudwatch_param,
        })
    }

    /// The supplied parameter name, or a new parameter holding the default config
    fn provision_cloudwatch_param(&self, provisioner: &mut dyn Provisioner) -> NatResult<Value> {
        match &self.props.cloudwatch_config_param {
            Some(name) => Ok(Value::from(name.as_str())),
            None => {
                let param = provisioner.provision(ssm::string_parameter(
                    "nat_cloudwatch_config",
                    cloudwatch::PARAMETER_NAME,
                    default_cloudwatch_config().to_string(),
                    "CloudWatch agent configuration for fck-nat instances",
                ))?;
                Ok(Value::from(param))
            }
        }
    }

    fn role_resource(&self, cloudwatch_param: Option<&Value>) -> Resource {
        let mut role = RoleBuilder::new("nat_role", EC2_SERVICE_PRINCIPAL).inline_policy(
            ENI_POLICY_NAME,
            PolicyStatement::allow([
                "ec2:AttachNetworkInterface",
                "ec2:ModifyNetworkInterfaceAttribute",
            ])
            .on_all(),
        );

        if self.props.eip_pool.is_some() {
            role = role.inline_policy(
                ENI_POLICY_NAME,
                PolicyStatement::allow(["ec2:AssociateAddress", "ec2:DisassociateAddress"])
                    .on_all(),
            );
        }

        if self.props.ssm_enabled() {
            role = role.managed_policy(SSM_MANAGED_POLICY);
        }

        if let Some(param) = cloudwatch_param {
            role = role.managed_policy(CLOUDWATCH_MANAGED_POLICY).inline_policy(
                ENI_POLICY_NAME,
                PolicyStatement::allow(["ssm:GetParameter"]).on(parameter_arn(param)),
            );
        }

        role.build()
    }

    fn provision_instance(
        &self,
        provisioner: &mut dyn Provisioner,
        shared: &SharedResources,
        subnet: &SubnetSpec,
        eip: Option<String>,
    ) -> NatResult<(ResourceRef, ResourceRef)> {
        let interface = provisioner.provision(ec2::nat_network_interface(
            subnet.binding("fck_nat_interface"),
            subnet.subnet_id.clone(),
            shared.security_group.clone(),
        ))?;

        let user_data = UserData::for_nat_instance(
            &interface,
            eip.as_deref(),
            shared.cloudwatch_param.as_ref(),
        );

        let key_name = match &self.props.ssh {
            SshCredential::None => None,
            SshCredential::KeyName(name) | SshCredential::KeyPair(name) => Some(name.as_str()),
        };

        let launch_template = provisioner.provision(
            Resource::new("launch_template", subnet.binding("fck_nat_launch_template"))
                .with_attribute("instance_type", self.props.instance_type.as_str())
                .with_attribute("image_id", shared.image.clone())
                .with_attribute(
                    "security_group_ids",
                    Value::List(vec![shared.security_group.clone()]),
                )
                .with_attribute("iam_instance_profile", &shared.instance_profile)
                .with_attribute("user_data", user_data.render())
                .with_optional_attribute("key_name", key_name),
        )?;

        let group = provisioner.provision(autoscaling::single_instance_group(
            subnet.binding("fck_nat_asg"),
            subnet.subnet_id.clone(),
            &launch_template,
        ))?;

        debug!(
            "NAT instance for {} ({}) uses interface {}",
            subnet.name, subnet.availability_zone, interface
        );
        Ok((interface, group))
    }
}

impl NatProvider for FckNatInstanceProvider {
    fn configure_nat(
        &mut self,
        provisioner: &mut dyn Provisioner,
        options: &ConfigureNatOptions,
    ) -> NatResult<()> {
        self.validate(options)?;

        info!(
            "configuring fck-nat with {} via {}",
            self.props.instance_type,
            provisioner.name()
        );
        let shared = self.provision_shared(provisioner, options)?;

        info!(
            "provisioning {} NAT instance(s)",
            options.nat_subnets.len()
        );
        let mut eip_pool = self.props.eip_pool.clone();
        let mut groups = Vec::with_capacity(options.nat_subnets.len());
        for subnet in &options.nat_subnets {
            let eip = eip_pool.as_mut().and_then(Vec::pop);
            let (interface, group) = self.provision_instance(provisioner, &shared, subnet, eip)?;
            groups.push(group);
            self.gateways
                .add(subnet.availability_zone.clone(), interface);
        }
        self.auto_scaling_groups = Some(groups);

        info!(
            "routing {} private subnet(s)",
            options.private_subnets.len()
        );
        for subnet in &options.private_subnets {
            self.configure_subnet(provisioner, subnet)?;
        }
        Ok(())
    }

    fn configure_subnet(
        &mut self,
        provisioner: &mut dyn Provisioner,
        subnet: &SubnetSpec,
    ) -> NatResult<ResourceRef> {
        let gateway = self.gateways.pick(&subnet.availability_zone)?.clone();
        debug!(
            "routing {} ({}) through {}",
            subnet.name, subnet.availability_zone, gateway
        );

        let route = provisioner.provision(ec2::default_route(
            subnet.binding("default_route"),
            subnet.route_table_id.clone(),
            Value::from(gateway),
        ))?;
        Ok(route)
    }

    fn configured_gateways(&self) -> NatResult<Vec<GatewayConfig>> {
        if self.auto_scaling_groups.is_none() {
            return Err(NatError::not_configured("configuredGateways"));
        }
        Ok(self
            .gateways
            .values()
            .iter()
            .map(|(az, gateway_id)| GatewayConfig {
                az: az.clone(),
                gateway_id: gateway_id.clone(),
            })
            .collect())
    }

    fn security_group(&self) -> NatResult<&Value> {
        self.security_group
            .as_ref()
            .ok_or_else(|| NatError::not_configured("securityGroup"))
    }

    fn connections(&mut self) -> NatResult<&mut Connections> {
        self.connections
            .as_mut()
            .ok_or_else(|| NatError::not_configured("connections"))
    }
}

/// Subnet names must stay distinct once snake-cased, since bindings derive from them
fn unique_bindings(subnets: &[SubnetSpec]) -> NatResult<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for subnet in subnets {
        let key = subnet.name.to_snake_case();
        if let Some(previous) = seen.insert(key.clone(), &subnet.name) {
            return Err(NatError::configuration(format!(
                "Subnet names '{}' and '{}' both map to binding prefix '{}'",
                previous, subnet.name, key
            )));
        }
    }
    Ok(())
}

/// ARN of an SSM parameter, given its name or a reference to a created one
fn parameter_arn(param: &Value) -> Value {
    match param {
        Value::ResourceRef(binding, attr) => Value::String(format!(
            "arn:aws:ssm:*:*:parameter/${{{}.{}}}",
            binding, attr
        )),
        other => Value::String(format!(
            "arn:aws:ssm:*:*:parameter/{}",
            other.to_string().trim_start_matches('/')
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::InstanceType;
    use crate::schemas;
    use fck_nat_core::effect::Effect;
    use fck_nat_core::provider::{ProviderError, ProviderResult};
    use fck_nat_core::synth::Synthesizer;

    fn props() -> NatInstanceProps {
        NatInstanceProps::new(InstanceType::new("t4g.micro").unwrap())
    }

    fn subnet(name: &str, az: &str) -> SubnetSpec {
        SubnetSpec::new(
            name,
            format!("subnet-{}", name),
            az,
            format!("rtb-{}", name),
        )
    }

    fn options(nat: &[(&str, &str)], private: &[(&str, &str)]) -> ConfigureNatOptions {
        ConfigureNatOptions {
            vpc_id: Value::from("vpc-1"),
            nat_subnets: nat.iter().map(|(n, az)| subnet(n, az)).collect(),
            private_subnets: private.iter().map(|(n, az)| subnet(n, az)).collect(),
        }
    }

    fn synth() -> Synthesizer {
        Synthesizer::new(schemas::registry())
    }

    fn route_target(synth: &Synthesizer, binding: &str) -> Value {
        synth.plan().find(binding).unwrap().attributes["network_interface_id"].clone()
    }

    fn eni(binding: &str) -> Value {
        Value::ResourceRef(binding.to_string(), "id".to_string())
    }

    #[test]
    fn same_zone_gateway_is_preferred() {
        let mut provider = FckNatInstanceProvider::new(props());
        let mut synth = synth();
        provider
            .configure_nat(
                &mut synth,
                &options(
                    &[("public-a", "us-east-1a"), ("public-b", "us-east-1b")],
                    &[("private-a", "us-east-1a"), ("private-b", "us-east-1b")],
                ),
            )
            .unwrap();

        assert_eq!(
            route_target(&synth, "private_a_default_route"),
            eni("public_a_fck_nat_interface")
        );
        assert_eq!(
            route_target(&synth, "private_b_default_route"),
            eni("public_b_fck_nat_interface")
        );
    }

    #[test]
    fn zone_without_gateway_falls_back_round_robin() {
        let mut provider = FckNatInstanceProvider::new(props());
        let mut synth = synth();
        provider
            .configure_nat(
                &mut synth,
                &options(
                    &[("public-a", "us-east-1a")],
                    &[("private-c", "us-east-1c"), ("private-d", "us-east-1d")],
                ),
            )
            .unwrap();

        for route in ["private_c_default_route", "private_d_default_route"] {
            assert_eq!(route_target(&synth, route), eni("public_a_fck_nat_interface"));
        }
    }

    #[test]
    fn eip_pool_too_small_provisions_nothing() {
        let mut provider = FckNatInstanceProvider::new(
            props().with_eip_pool(vec!["eipalloc-1".to_string()]),
        );
        let mut synth = synth();
        let err = provider
            .configure_nat(
                &mut synth,
                &options(&[("a", "us-east-1a"), ("b", "us-east-1b")], &[]),
            )
            .unwrap_err();

        assert!(matches!(err, NatError::Configuration(_)));
        assert!(synth.plan().is_empty());
        assert!(provider.role().is_err());
    }

    #[test]
    fn colliding_subnet_names_provision_nothing() {
        let mut provider = FckNatInstanceProvider::new(props());
        let mut synth = synth();
        let err = provider
            .configure_nat(
                &mut synth,
                &options(&[("public-a", "us-east-1a"), ("Public A", "us-east-1b")], &[]),
            )
            .unwrap_err();

        assert!(matches!(err, NatError::Configuration(_)));
        assert!(err.to_string().contains("public_a"));
        assert!(synth.plan().is_empty());

        let err = provider
            .configure_nat(
                &mut synth,
                &options(
                    &[("public-a", "us-east-1a")],
                    &[("private_b", "us-east-1b"), ("private-b", "us-east-1b")],
                ),
            )
            .unwrap_err();
        assert!(matches!(err, NatError::Configuration(_)));
        assert!(synth.plan().is_empty());
    }

    #[test]
    fn egress_and_private_names_may_coincide() {
        let mut provider = FckNatInstanceProvider::new(props());
        let mut synth = synth();
        provider
            .configure_nat(&mut synth, &options(&[("a", "us-east-1a")], &[("a", "us-east-1a")]))
            .unwrap();
        assert!(synth.plan().find("a_default_route").is_some());
    }

    #[test]
    fn eip_pool_is_consumed_from_the_end() {
        let mut provider = FckNatInstanceProvider::new(props().with_eip_pool(vec![
            "eipalloc-1".to_string(),
            "eipalloc-2".to_string(),
        ]));
        let mut synth = synth();
        provider
            .configure_nat(
                &mut synth,
                &options(&[("a", "us-east-1a"), ("b", "us-east-1b")], &[]),
            )
            .unwrap();

        let user_data = |binding: &str| {
            synth.plan().find(binding).unwrap().attributes["user_data"]
                .as_str()
                .unwrap()
                .to_string()
        };
        assert!(user_data("a_fck_nat_launch_template").contains("eip_id=eipalloc-2"));
        assert!(user_data("b_fck_nat_launch_template").contains("eip_id=eipalloc-1"));
    }

    #[test]
    fn accessors_fail_before_configuration() {
        let mut provider = FckNatInstanceProvider::new(props());

        let err = provider.role().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Pass the FckNatInstanceProvider to a Vpc before accessing 'role'"
        );
        assert!(matches!(provider.security_group(), Err(NatError::State(_))));
        assert!(matches!(provider.connections(), Err(NatError::State(_))));
        assert!(matches!(provider.auto_scaling_groups(), Err(NatError::State(_))));
        assert!(matches!(provider.configured_gateways(), Err(NatError::State(_))));
    }

    #[test]
    fn configure_subnet_before_configure_nat_is_empty_collection() {
        let mut provider = FckNatInstanceProvider::new(props());
        let mut synth = synth();
        let err = provider
            .configure_subnet(&mut synth, &subnet("private-a", "us-east-1a"))
            .unwrap_err();
        assert!(matches!(err, NatError::EmptyCollection));
    }

    #[test]
    fn supplied_security_group_is_not_created() {
        let mut provider =
            FckNatInstanceProvider::new(props().with_security_group("sg-existing"));
        let mut synth = synth();
        provider
            .configure_nat(&mut synth, &options(&[("a", "us-east-1a")], &[]))
            .unwrap();

        assert!(synth.plan().find("nat_security_group").is_none());
        assert_eq!(provider.security_group().unwrap(), &Value::from("sg-existing"));
        let eni = synth.plan().find("a_fck_nat_interface").unwrap();
        assert_eq!(
            eni.attributes["group_set"],
            Value::List(vec![Value::from("sg-existing")])
        );
    }

    #[test]
    fn default_image_is_looked_up() {
        let mut provider = FckNatInstanceProvider::new(props());
        let mut synth = synth();
        provider
            .configure_nat(&mut synth, &options(&[("a", "us-east-1a")], &[]))
            .unwrap();

        assert!(matches!(synth.plan().effects()[0], Effect::Read(_)));
        let template = synth.plan().find("a_fck_nat_launch_template").unwrap();
        assert_eq!(
            template.attributes["image_id"],
            Value::ResourceRef("nat_ami".to_string(), "image_id".to_string())
        );
    }

    #[test]
    fn generic_image_skips_lookup() {
        let mut provider = FckNatInstanceProvider::new(props().with_machine_image(
            MachineImage::Generic {
                ami_id: "ami-123".to_string(),
            },
        ));
        let mut synth = synth();
        provider
            .configure_nat(&mut synth, &options(&[("a", "us-east-1a")], &[]))
            .unwrap();

        assert_eq!(synth.plan().summary().read, 0);
        let template = synth.plan().find("a_fck_nat_launch_template").unwrap();
        assert_eq!(template.attributes["image_id"], Value::from("ami-123"));
    }

    #[test]
    fn ssm_policy_follows_toggle() {
        let managed = |props: NatInstanceProps| {
            let mut provider = FckNatInstanceProvider::new(props);
            let mut synth = synth();
            provider
                .configure_nat(&mut synth, &options(&[("a", "us-east-1a")], &[]))
                .unwrap();
            synth
                .plan()
                .find("nat_role")
                .unwrap()
                .attributes
                .get("managed_policy_arns")
                .cloned()
        };

        let ssm_arn = Value::from(format!("arn:aws:iam::aws:policy/{}", SSM_MANAGED_POLICY));
        assert_eq!(managed(props()), Some(Value::List(vec![ssm_arn.clone()])));
        assert_eq!(
            managed(props().with_ssm(true)),
            Some(Value::List(vec![ssm_arn]))
        );
        assert_eq!(managed(props().with_ssm(false)), None);
    }

    #[test]
    fn cloudwatch_creates_default_parameter() {
        let mut provider = FckNatInstanceProvider::new(props().with_cloudwatch(None));
        let mut synth = synth();
        provider
            .configure_nat(&mut synth, &options(&[("a", "us-east-1a")], &[]))
            .unwrap();

        let param = synth.plan().find("nat_cloudwatch_config").unwrap();
        assert_eq!(
            param.attributes["name"],
            Value::from(cloudwatch::PARAMETER_NAME)
        );
        let user_data = synth.plan().find("a_fck_nat_launch_template").unwrap().attributes
            ["user_data"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(user_data.contains("cwagent_enabled=true"));
        assert!(user_data.contains("cwagent_cfg_param_name=${nat_cloudwatch_config.id}"));
    }

    #[test]
    fn parameter_arn_for_names_and_references() {
        assert_eq!(
            parameter_arn(&Value::from("/ops/cw-config")),
            Value::from("arn:aws:ssm:*:*:parameter/ops/cw-config")
        );
        assert_eq!(
            parameter_arn(&Value::ResourceRef(
                "nat_cloudwatch_config".to_string(),
                "id".to_string()
            )),
            Value::from("arn:aws:ssm:*:*:parameter/${nat_cloudwatch_config.id}")
        );
    }

    #[test]
    fn cloudwatch_uses_supplied_parameter() {
        let mut provider = FckNatInstanceProvider::new(
            props().with_cloudwatch(Some("/ops/cw-config".to_string())),
        );
        let mut synth = synth();
        provider
            .configure_nat(&mut synth, &options(&[("a", "us-east-1a")], &[]))
            .unwrap();

        assert!(synth.plan().find("nat_cloudwatch_config").is_none());
        let user_data = synth.plan().find("a_fck_nat_launch_template").unwrap().attributes
            ["user_data"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(user_data.contains("cwagent_cfg_param_name=/ops/cw-config"));
    }

    #[test]
    fn connections_add_ingress_to_nat_group() {
        let mut provider = FckNatInstanceProvider::new(props());
        let mut synth = synth();
        provider
            .configure_nat(&mut synth, &options(&[("a", "us-east-1a")], &[]))
            .unwrap();

        let rules = provider
            .connections()
            .unwrap()
            .allow_from(
                &mut synth,
                &crate::connections::Peer::ipv4("10.0.0.0/16"),
                crate::connections::Port::AllTraffic,
                "from vpc",
            )
            .unwrap();
        let rule = synth.plan().find(&rules[0].binding).unwrap();
        assert_eq!(
            rule.attributes["group_id"],
            Value::ResourceRef("nat_security_group".to_string(), "id".to_string())
        );
    }

    struct FailingProvisioner {
        fail_on: &'static str,
        provisioned: Vec<String>,
    }

    impl Provisioner for FailingProvisioner {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn provision(&mut self, resource: Resource) -> ProviderResult<ResourceRef> {
            if resource.id.resource_type == self.fail_on {
                return Err(ProviderError::new("quota exceeded").for_resource(resource.id));
            }
            self.provisioned.push(resource.id.name.clone());
            Ok(ResourceRef::new(resource.id.name, "id"))
        }

        fn lookup(&mut self, resource: Resource) -> ProviderResult<ResourceRef> {
            Ok(ResourceRef::new(resource.id.name, "image_id"))
        }
    }

    #[test]
    fn provisioner_failure_propagates() {
        let mut provider = FckNatInstanceProvider::new(props());
        let mut provisioner = FailingProvisioner {
            fail_on: "launch_template",
            provisioned: Vec::new(),
        };
        let err = provider
            .configure_nat(&mut provisioner, &options(&[("a", "us-east-1a")], &[]))
            .unwrap_err();

        match err {
            NatError::Provider(e) => assert_eq!(e.message, "quota exceeded"),
            other => panic!("expected provider error, got {:?}", other),
        }
        assert_eq!(
            provisioner.provisioned.last().map(String::as_str),
            Some("a_fck_nat_interface")
        );
        assert!(provider.configured_gateways().is_err());
    }

    #[test]
    fn subnet_names_are_snake_cased() {
        let mut provider = FckNatInstanceProvider::new(props());
        let mut synth = synth();
        provider
            .configure_nat(
                &mut synth,
                &options(&[("Public A", "us-east-1a")], &[("Private A", "us-east-1a")]),
            )
            .unwrap();

        assert!(synth.plan().find("public_a_fck_nat_interface").is_some());
        assert!(synth.plan().find("public_a_fck_nat_asg").is_some());
        assert!(synth.plan().find("private_a_default_route").is_some());
    }
}
