//! Stack file: the TOML description of a VPC's NAT setup

use std::fs;
use std::path::Path;

use serde::Deserialize;

use fck_nat_aws::schemas;
use fck_nat_aws::{
    ConfigureNatOptions, FckNatInstanceProvider, NatError, NatInstanceConfig, NatInstanceProps,
    NatProvider, Peer, Port, SubnetSpec,
};
use fck_nat_core::resource::Value;
use fck_nat_core::synth::Synthesizer;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackFile {
    pub vpc_id: String,
    pub nat: NatInstanceConfig,
    #[serde(default)]
    pub nat_subnets: Vec<SubnetEntry>,
    #[serde(default)]
    pub private_subnets: Vec<SubnetEntry>,
    #[serde(default)]
    pub allow_from: Vec<AllowFromEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubnetEntry {
    pub name: String,
    pub subnet_id: String,
    pub availability_zone: String,
    pub route_table_id: String,
}

/// Ingress rule on the NAT security group
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllowFromEntry {
    pub cidr: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<SubnetEntry> for SubnetSpec {
    fn from(entry: SubnetEntry) -> Self {
        SubnetSpec::new(
            entry.name,
            entry.subnet_id,
            entry.availability_zone,
            entry.route_table_id,
        )
    }
}

/// A validated stack, ready to synthesize
#[derive(Debug)]
pub struct Stack {
    pub props: NatInstanceProps,
    pub options: ConfigureNatOptions,
    pub allow_from: Vec<(Peer, String)>,
}

impl Stack {
    /// Read and validate a stack file
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let file: StackFile =
            toml::from_str(content).map_err(|e| format!("Parse error: {}", e))?;
        Self::try_from(file).map_err(|e| e.to_string())
    }

    /// Run the NAT provider against a fresh synthesizer
    pub fn synthesize(&self) -> Result<Synthesizer, NatError> {
        let mut synth = Synthesizer::new(schemas::registry());
        let mut provider = FckNatInstanceProvider::new(self.props.clone());
        provider.configure_nat(&mut synth, &self.options)?;

        let connections = provider.connections()?;
        for (peer, description) in &self.allow_from {
            connections.allow_from(&mut synth, peer, Port::AllTraffic, description)?;
        }
        Ok(synth)
    }
}

impl TryFrom<StackFile> for Stack {
    type Error = NatError;

    fn try_from(file: StackFile) -> Result<Self, Self::Error> {
        if file.nat_subnets.is_empty() {
            return Err(NatError::configuration("at least one nat_subnets entry is required"));
        }

        let props = NatInstanceProps::try_from(file.nat)?;
        let options = ConfigureNatOptions {
            vpc_id: Value::String(file.vpc_id),
            nat_subnets: file.nat_subnets.into_iter().map(SubnetSpec::from).collect(),
            private_subnets: file
                .private_subnets
                .into_iter()
                .map(SubnetSpec::from)
                .collect(),
        };
        let allow_from = file
            .allow_from
            .into_iter()
            .map(|entry| {
                let description = entry
                    .description
                    .unwrap_or_else(|| format!("from {}", entry.cidr));
                (Peer::Ipv4(entry.cidr), description)
            })
            .collect();

        Ok(Self {
            props,
            options,
            allow_from,
        })
    }
}
