//! Connections - Ingress management for the NAT security group

use std::fmt;

use fck_nat_core::provider::{ProviderResult, Provisioner};
use fck_nat_core::resource::{Resource, ResourceRef, Value};

/// Source of inbound traffic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Peer {
    Ipv4(String),
    AnyIpv4,
}

impl Peer {
    pub fn ipv4(cidr: impl Into<String>) -> Self {
        Self::Ipv4(cidr.into())
    }

    pub fn cidr(&self) -> &str {
        match self {
            Peer::Ipv4(cidr) => cidr,
            Peer::AnyIpv4 => "0.0.0.0/0",
        }
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cidr())
    }
}

/// Protocol and port range of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    AllTraffic,
    Tcp(u16),
    Udp(u16),
    TcpRange(u16, u16),
}

impl Port {
    fn protocol(&self) -> &'static str {
        match self {
            Port::AllTraffic => "-1",
            Port::Tcp(_) | Port::TcpRange(_, _) => "tcp",
            Port::Udp(_) => "udp",
        }
    }

    fn range(&self) -> (i64, i64) {
        match *self {
            Port::AllTraffic => (-1, -1),
            Port::Tcp(p) | Port::Udp(p) => (i64::from(p), i64::from(p)),
            Port::TcpRange(from, to) => (i64::from(from), i64::from(to)),
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::AllTraffic => write!(f, "All Traffic"),
            Port::Tcp(p) => write!(f, "TCP {}", p),
            Port::Udp(p) => write!(f, "UDP {}", p),
            Port::TcpRange(from, to) => write!(f, "TCP {}-{}", from, to),
        }
    }
}

/// Security groups whose ingress rules are managed together
#[derive(Debug, Clone)]
pub struct Connections {
    name: String,
    security_groups: Vec<Value>,
    rules: usize,
}

impl Connections {
    pub fn new(name: impl Into<String>, security_groups: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            security_groups,
            rules: 0,
        }
    }

    pub fn security_groups(&self) -> &[Value] {
        &self.security_groups
    }

    /// Provision one ingress rule per security group
    pub fn allow_from(
        &mut self,
        provisioner: &mut dyn Provisioner,
        peer: &Peer,
        port: Port,
        description: &str,
    ) -> ProviderResult<Vec<ResourceRef>> {
        let (from_port, to_port) = port.range();
        let mut rules = Vec::with_capacity(self.security_groups.len());

        for group in &self.security_groups {
            let binding = format!("{}_ingress_{}", self.name, self.rules);
            self.rules += 1;

            let rule = Resource::new("security_group_ingress", binding)
                .with_attribute("group_id", group.clone())
                .with_attribute("ip_protocol", port.protocol())
                .with_attribute("from_port", from_port)
                .with_attribute("to_port", to_port)
                .with_attribute("cidr_ip", peer.cidr())
                .with_attribute("description", description);
            rules.push(provisioner.provision(rule)?);
        }

        log::debug!("allowed {} from {} on {} group(s)", port, peer, rules.len());
        Ok(rules)
    }
}
