//! Properties for a fck-nat instance

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::NatError;

/// The AMI name used for the default image lookup
pub const AMI_NAME: &str = "fck-nat-al2023-*-arm64-ebs";

/// The AMI owner used for the default image lookup
pub const AMI_OWNER: &str = "568608671756";

static INSTANCE_TYPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9-]*\.[a-z0-9]+$").expect("instance type pattern is valid")
});

/// EC2 instance type such as `t4g.micro`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceType(String);

impl InstanceType {
    pub fn new(name: impl Into<String>) -> Result<Self, NatError> {
        let name = name.into();
        if INSTANCE_TYPE_PATTERN.is_match(&name) {
            Ok(Self(name))
        } else {
            Err(NatError::configuration(format!(
                "invalid instance type '{}', expected <family>.<size> such as t4g.micro",
                name
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Machine image for NAT instances
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineImage {
    /// Look up the newest image matching `name` owned by one of `owners`
    Lookup { name: String, owners: Vec<String> },
    /// A specific AMI id
    Generic { ami_id: String },
}

impl Default for MachineImage {
    /// Latest fck-nat image
    fn default() -> Self {
        Self::Lookup {
            name: AMI_NAME.to_string(),
            owners: vec![AMI_OWNER.to_string()],
        }
    }
}

/// SSH access to NAT instances
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SshCredential {
    /// No SSH access will be possible
    #[default]
    None,
    /// Name of an EC2 key pair (legacy launch template field)
    KeyName(String),
    /// Key pair reference
    KeyPair(String),
}

/// Properties for a fck-nat instance
#[derive(Debug, Clone)]
pub struct NatInstanceProps {
    pub instance_type: InstanceType,
    /// Defaults to the latest fck-nat image
    pub machine_image: Option<MachineImage>,
    pub ssh: SshCredential,
    /// Pre-existing security group id; a new group is created otherwise
    pub security_group: Option<String>,
    /// EIP allocation ids; must hold at least one entry per egress subnet
    pub eip_pool: Option<Vec<String>>,
    /// Unset means enabled
    pub enable_ssm: Option<bool>,
    pub enable_cloudwatch: bool,
    /// Existing SSM parameter holding the CloudWatch agent configuration
    pub cloudwatch_config_param: Option<String>,
}

impl NatInstanceProps {
    pub fn new(instance_type: InstanceType) -> Self {
        Self {
            instance_type,
            machine_image: None,
            ssh: SshCredential::None,
            security_group: None,
            eip_pool: None,
            enable_ssm: None,
            enable_cloudwatch: false,
            cloudwatch_config_param: None,
        }
    }

    pub fn with_machine_image(mut self, image: MachineImage) -> Self {
        self.machine_image = Some(image);
        self
    }

    pub fn with_ssh(mut self, ssh: SshCredential) -> Self {
        self.ssh = ssh;
        self
    }

    pub fn with_security_group(mut self, group_id: impl Into<String>) -> Self {
        self.security_group = Some(group_id.into());
        self
    }

    pub fn with_eip_pool(mut self, pool: Vec<String>) -> Self {
        self.eip_pool = Some(pool);
        self
    }

    pub fn with_ssm(mut self, enabled: bool) -> Self {
        self.enable_ssm = Some(enabled);
        self
    }

    pub fn with_cloudwatch(mut self, config_param: Option<String>) -> Self {
        self.enable_cloudwatch = true;
        self.cloudwatch_config_param = config_param;
        self
    }

    pub fn ssm_enabled(&self) -> bool {
        self.enable_ssm.unwrap_or(true)
    }
}

/// Serialized form of `NatInstanceProps`, as read from a stack file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NatInstanceConfig {
    pub instance_type: String,
    #[serde(default)]
    pub ami_id: Option<String>,
    #[serde(default)]
    pub ami_name: Option<String>,
    #[serde(default)]
    pub ami_owners: Option<Vec<String>>,
    #[serde(default)]
    pub key_name: Option<String>,
    #[serde(default)]
    pub key_pair: Option<String>,
    #[serde(default)]
    pub security_group: Option<String>,
    #[serde(default)]
    pub eip_pool: Option<Vec<String>>,
    #[serde(default)]
    pub enable_ssm: Option<bool>,
    #[serde(default)]
    pub enable_cloudwatch: bool,
    #[serde(default)]
    pub cloudwatch_config_param: Option<String>,
}

impl TryFrom<NatInstanceConfig> for NatInstanceProps {
    type Error = NatError;

    fn try_from(config: NatInstanceConfig) -> Result<Self, Self::Error> {
        let ssh = match (config.key_name, config.key_pair) {
            (Some(_), Some(_)) => {
                return Err(NatError::configuration(
                    "key_name and key_pair are mutually exclusive, set only one of them",
                ));
            }
            (Some(name), None) => SshCredential::KeyName(name),
            (None, Some(pair)) => SshCredential::KeyPair(pair),
            (None, None) => SshCredential::None,
        };

        let machine_image = match (config.ami_id, config.ami_name) {
            (Some(_), Some(_)) => {
                return Err(NatError::configuration(
                    "ami_id and ami_name are mutually exclusive, set only one of them",
                ));
            }
            (Some(ami_id), None) => Some(MachineImage::Generic { ami_id }),
            (None, Some(name)) => Some(MachineImage::Lookup {
                name,
                owners: config
                    .ami_owners
                    .unwrap_or_else(|| vec![AMI_OWNER.to_string()]),
            }),
            (None, None) => None,
        };

        if !config.enable_cloudwatch && config.cloudwatch_config_param.is_some() {
            return Err(NatError::configuration(
                "cloudwatch_config_param requires enable_cloudwatch = true",
            ));
        }

        Ok(Self {
            instance_type: InstanceType::new(config.instance_type)?,
            machine_image,
            ssh,
            security_group: config.security_group,
            eip_pool: config.eip_pool,
            enable_ssm: config.enable_ssm,
            enable_cloudwatch: config.enable_cloudwatch,
            cloudwatch_config_param: config.cloudwatch_config_param,
        })
    }
}
